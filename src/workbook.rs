use crate::error::PlannerError;
use crate::model::{CellValue, WorkbookId};
use crate::utils::{hash_path_metadata, path_to_forward_slashes};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use umya_spreadsheet::reader::xlsx;
use umya_spreadsheet::{Cell, Worksheet};

pub type Row = Vec<Option<CellValue>>;

/// One sheet as a dense 2-D grid: `rows[0]` is the header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Builds a grid from header-keyed records. Header order is the order in
    /// which keys are first seen across the records.
    pub fn from_records(name: impl Into<String>, records: &[IndexMap<String, CellValue>]) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
        if headers.is_empty() {
            return Self::new(name, Vec::new());
        }

        let mut rows = Vec::with_capacity(records.len() + 1);
        rows.push(
            headers
                .iter()
                .map(|h| Some(CellValue::Text(h.clone())))
                .collect(),
        );
        for record in records {
            rows.push(headers.iter().map(|h| record.get(h).cloned()).collect());
        }
        Self::new(name, rows)
    }

    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn data_rows(&self) -> &[Row] {
        if self.rows.len() > 1 {
            &self.rows[1..]
        } else {
            &[]
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data_rows().is_empty()
    }
}

/// Ordered list of sheets, as supplied by whichever reader produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// A workbook read from disk together with its fingerprint.
#[derive(Debug, Clone)]
pub struct LoadedWorkbook {
    pub id: WorkbookId,
    pub path: PathBuf,
    pub workbook: Workbook,
}

impl LoadedWorkbook {
    pub fn load(path: &Path) -> Result<Self, PlannerError> {
        let read_err = |message: String| PlannerError::WorkbookRead {
            path: path.to_path_buf(),
            message,
        };
        let metadata = fs::metadata(path).map_err(|e| read_err(e.to_string()))?;
        let id = WorkbookId(hash_path_metadata(path, &metadata));
        let spreadsheet = xlsx::read(path).map_err(|e| read_err(e.to_string()))?;

        let sheets = spreadsheet
            .get_sheet_collection()
            .iter()
            .map(sheet_to_grid)
            .collect::<Vec<_>>();

        tracing::info!(
            workbook_id = %id,
            path = %path_to_forward_slashes(path),
            sheets = sheets.len(),
            "workbook loaded"
        );

        Ok(Self {
            id,
            path: path.to_path_buf(),
            workbook: Workbook::new(sheets),
        })
    }
}

pub fn cell_to_value(cell: &Cell) -> Option<CellValue> {
    if let Some(number) = cell.get_value_number() {
        return Some(CellValue::Number(number));
    }

    let raw = cell.get_value();
    if raw.trim().is_empty() {
        return None;
    }

    let lower = raw.to_ascii_lowercase();
    if lower == "true" {
        return Some(CellValue::Bool(true));
    }
    if lower == "false" {
        return Some(CellValue::Bool(false));
    }

    Some(CellValue::Text(raw.to_string()))
}

fn sheet_to_grid(sheet: &Worksheet) -> Sheet {
    let (max_col, max_row) = sheet.get_highest_column_and_row();
    let mut rows = Vec::with_capacity(max_row as usize);
    for row in 1..=max_row {
        let cells: Row = (1..=max_col)
            .map(|col| sheet.get_cell((col, row)).and_then(cell_to_value))
            .collect();
        rows.push(cells);
    }
    // Trailing blank rows carry nothing and would count as data rows.
    while rows
        .last()
        .map(|r: &Row| r.iter().all(Option::is_none))
        .unwrap_or(false)
    {
        rows.pop();
    }
    Sheet::new(sheet.get_name().to_string(), rows)
}
