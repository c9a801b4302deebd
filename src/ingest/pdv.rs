//! Point-of-sale code to city lookup, read from a small two-column text
//! table whose delimiter is not known in advance.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const DELIMITER_CANDIDATES: &[u8] = b",;=\t|";
const SNIFF_LINES: usize = 10;

static CITY_WITH_STATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)\s*[-/(]\s*([A-Za-z]{2})\)?$").expect("valid city/state pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdvCity {
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Default)]
pub struct PdvLookup {
    entries: HashMap<String, PdvCity>,
}

impl PdvLookup {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads the table at `path`. Any failure degrades to an empty lookup.
    pub fn from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let lookup = Self::parse(&contents);
                tracing::info!(
                    path = %path.display(),
                    entries = lookup.len(),
                    "point-of-sale lookup loaded"
                );
                lookup
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "point-of-sale lookup unreadable, continuing without cities");
                Self::empty()
            }
        }
    }

    pub fn parse(contents: &str) -> Self {
        let delimiter = sniff_delimiter(contents);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(delimiter)
            .from_reader(contents.as_bytes());

        let mut entries = HashMap::new();
        for (idx, record) in reader.records().enumerate() {
            let Ok(record) = record else { continue };
            let code = record.get(0).unwrap_or("").trim();
            if code.is_empty() {
                continue;
            }
            if idx == 0 && looks_like_header(code) {
                continue;
            }
            let raw_city = record.get(1).unwrap_or("").trim();
            let explicit_state = record.get(2).map(str::trim).unwrap_or("");
            entries.insert(code.to_string(), split_city_state(raw_city, explicit_state));
        }
        Self { entries }
    }

    pub fn insert(&mut self, code: impl Into<String>, city: PdvCity) {
        self.entries.insert(code.into().trim().to_string(), city);
    }

    pub fn get(&self, code: &str) -> Option<&PdvCity> {
        self.entries.get(code.trim())
    }

    pub fn city_for(&self, code: &str) -> Option<&str> {
        self.get(code).map(|entry| entry.city.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Picks the candidate delimiter present on the most of the first lines,
/// breaking ties by total occurrences and then by candidate order.
fn sniff_delimiter(contents: &str) -> u8 {
    let lines: Vec<&str> = contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let mut best = (b',', 0usize, 0usize);
    for &candidate in DELIMITER_CANDIDATES {
        let ch = candidate as char;
        let lines_with = lines.iter().filter(|l| l.contains(ch)).count();
        let total: usize = lines.iter().map(|l| l.matches(ch).count()).sum();
        if (lines_with, total) > (best.1, best.2) {
            best = (candidate, lines_with, total);
        }
    }
    best.0
}

fn looks_like_header(first_field: &str) -> bool {
    !first_field.chars().any(|c| c.is_ascii_digit())
}

fn split_city_state(raw_city: &str, explicit_state: &str) -> PdvCity {
    if !explicit_state.is_empty() {
        return PdvCity {
            city: raw_city.to_string(),
            state: explicit_state.to_uppercase(),
        };
    }
    match CITY_WITH_STATE.captures(raw_city) {
        Some(caps) if !caps[1].trim().is_empty() => PdvCity {
            city: caps[1].trim().to_string(),
            state: caps[2].to_uppercase(),
        },
        _ => PdvCity {
            city: raw_city.to_string(),
            state: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_semicolon_and_drops_header() {
        let lookup = PdvLookup::parse("PDV;Cidade\n1001;Curitiba - PR\n1002;Londrina/PR\n");
        assert_eq!(lookup.len(), 2);
        assert_eq!(
            lookup.get("1001"),
            Some(&PdvCity {
                city: "Curitiba".into(),
                state: "PR".into()
            })
        );
        assert_eq!(lookup.city_for(" 1002 "), Some("Londrina"));
    }

    #[test]
    fn numeric_first_row_is_data() {
        let lookup = PdvLookup::parse("1001=Maringa\n1002=Cascavel\n");
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.city_for("1001"), Some("Maringa"));
    }

    #[test]
    fn tab_and_pipe_tables() {
        let tabbed = PdvLookup::parse("1001\tPonta Grossa\tpr\n");
        assert_eq!(tabbed.get("1001").unwrap().state, "PR");
        let piped = PdvLookup::parse("codigo|cidade\n77|Foz do Iguacu (PR)\n");
        assert_eq!(piped.get("77").unwrap().city, "Foz do Iguacu");
    }

    #[test]
    fn unreadable_file_degrades_to_empty() {
        let lookup = PdvLookup::from_path(Path::new("/nonexistent/pdv.csv"));
        assert!(lookup.is_empty());
    }
}
