//! Error taxonomy for the planner.
//!
//! Malformed business data never reaches this module: bad numbers, cycles,
//! cities and prices degrade to zero/empty values where they are read.
//! What remains are structural failures (nothing usable in the inputs,
//! unreadable files, rejected parameters) and the per-sheet skip signal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    /// No sheet of any workbook produced stock or sales rows
    NoValidRows = 1001,
    /// Workbook file missing or not a readable xlsx
    WorkbookRead = 1002,
    /// Writing the exported plan failed
    Export = 1003,
    /// A configuration value is out of range
    InvalidParameter = 1004,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::NoValidRows => "input_error",
            ErrorCode::WorkbookRead | ErrorCode::Export => "io_error",
            ErrorCode::InvalidParameter => "validation_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("no valid rows found in {workbooks} workbook(s)")]
    NoValidRows { workbooks: usize },

    #[error("failed to read workbook {path:?}: {message}")]
    WorkbookRead { path: PathBuf, message: String },

    #[error("failed to export plan to {path:?}: {message}")]
    Export { path: PathBuf, message: String },

    #[error("parameter '{parameter}' {message}")]
    InvalidParameter { parameter: String, message: String },
}

impl PlannerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PlannerError::NoValidRows { .. } => ErrorCode::NoValidRows,
            PlannerError::WorkbookRead { .. } => ErrorCode::WorkbookRead,
            PlannerError::Export { .. } => ErrorCode::Export,
            PlannerError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
        }
    }

    pub fn invalid_parameter(parameter: &str, message: impl Into<String>) -> Self {
        PlannerError::InvalidParameter {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }
}

/// Why a sheet contributed nothing. Skips are logged and counted, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Empty,
    MissingSkuColumn,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "sheet has no rows"),
            SkipReason::MissingSkuColumn => write!(f, "no SKU column in header"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_categories() {
        let err = PlannerError::NoValidRows { workbooks: 2 };
        assert_eq!(err.code(), ErrorCode::NoValidRows);
        assert_eq!(err.code().category(), "input_error");
        assert_eq!(err.to_string(), "no valid rows found in 2 workbook(s)");
    }

    #[test]
    fn invalid_parameter_message_names_parameter() {
        let err = PlannerError::invalid_parameter("coverage_factor", "must be positive");
        assert_eq!(err.to_string(), "parameter 'coverage_factor' must be positive");
        assert_eq!(err.code().code(), 1004);
    }
}
