use crate::model::CellValue;
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static DOT_THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,3}(\.\d{3})+$").expect("valid thousands pattern"));

/// Case, accent and whitespace insensitive form of a header or label.
///
/// NFKD-decomposes, drops combining marks, lowercases, collapses runs of
/// whitespace to a single space and trims.
pub fn normalize_text(raw: &str) -> String {
    let stripped: String = raw
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a possibly locale-formatted number (`"1.234,56"`, `"R$ 10,5"`,
/// `"12%"`). Returns `None` when nothing numeric is left.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%' && *c != '\u{a0}')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let has_comma = cleaned.contains(',');
    let has_dot = cleaned.contains('.');
    let canonical = match (has_comma, has_dot) {
        (true, true) => {
            let last_comma = cleaned.rfind(',').unwrap_or(0);
            let last_dot = cleaned.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (true, false) => {
            if cleaned.matches(',').count() > 1 {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (false, true) if DOT_THOUSANDS.is_match(&cleaned) => cleaned.replace('.', ""),
        _ => cleaned,
    };

    canonical.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric value of a cell, `0.0` for anything missing or unparsable.
pub fn coerce_number(cell: Option<&CellValue>) -> f64 {
    match cell {
        Some(CellValue::Number(n)) if n.is_finite() => *n,
        Some(CellValue::Text(s)) => parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Like [`coerce_number`] but clamped at zero, for quantities.
pub fn coerce_quantity(cell: Option<&CellValue>) -> f64 {
    coerce_number(cell).max(0.0)
}

pub fn system_time_to_datetime(time: SystemTime) -> Option<DateTime<Utc>> {
    Some(DateTime::<Utc>::from(time))
}

fn hash_path_metadata_digest(path: &Path, metadata: &Metadata) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(metadata.len().to_le_bytes());
    if let Ok(modified) = metadata.modified() {
        if let Some(dt) = system_time_to_datetime(modified) {
            hasher.update(dt.to_rfc3339_opts(SecondsFormat::Micros, true).as_bytes());
        }
    }
    hasher.finalize().into()
}

const WORKBOOK_ID_TOKEN_LEN: usize = 10;
const SHORT_ID_ALPHABET: &[u8] = b"23456789abcdefghijkmnpqrstuvwxyz";

fn encode_base32_u64_prefix(value: u64, len: usize) -> String {
    let mut out = String::with_capacity(len);
    for i in 0..len {
        let shift = 64 - (i + 1) * 5;
        let idx = ((value >> shift) & 31) as usize;
        out.push(SHORT_ID_ALPHABET[idx] as char);
    }
    out
}

/// Stable fingerprint of an input file, recorded next to exported plans.
pub fn hash_path_metadata(path: &Path, metadata: &Metadata) -> String {
    let digest = hash_path_metadata_digest(path, metadata);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let value = u64::from_be_bytes(bytes);

    format!(
        "wb-{}",
        encode_base32_u64_prefix(value, WORKBOOK_ID_TOKEN_LEN)
    )
}

pub fn path_to_forward_slashes(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if raw.contains('\\') {
        raw.replace('\\', "/")
    } else {
        raw.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_case_and_spacing() {
        assert_eq!(normalize_text("  Estoque   ATUAL "), "estoque atual");
        assert_eq!(normalize_text("Descrição"), "descricao");
        assert_eq!(normalize_text("Trânsito\tEstq"), "transito estq");
        assert_eq!(normalize_text("estoque_atual"), "estoque_atual");
    }

    #[test]
    fn parses_brazilian_locale_numbers() {
        assert_eq!(parse_number("1.234,56"), Some(1234.56));
        assert_eq!(parse_number("R$ 10,50"), Some(10.5));
        assert_eq!(parse_number("1.234"), Some(1234.0));
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("40%"), Some(40.0));
        assert_eq!(parse_number("-3"), Some(-3.0));
    }

    #[test]
    fn garbage_is_not_a_number() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("   "), None);
    }

    #[test]
    fn coercion_defaults_to_zero() {
        assert_eq!(coerce_number(None), 0.0);
        assert_eq!(coerce_number(Some(&CellValue::Text("abc".into()))), 0.0);
        assert_eq!(coerce_number(Some(&CellValue::Bool(true))), 0.0);
        assert_eq!(coerce_number(Some(&CellValue::Number(f64::NAN))), 0.0);
        assert_eq!(coerce_quantity(Some(&CellValue::Number(-4.0))), 0.0);
        assert_eq!(coerce_quantity(Some(&CellValue::Text("7".into()))), 7.0);
    }

    #[test]
    fn fingerprint_is_stable_for_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estoque.xlsx");
        std::fs::write(&path, b"data").unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        let a = hash_path_metadata(&path, &meta);
        let b = hash_path_metadata(&path, &meta);
        assert_eq!(a, b);
        assert!(a.starts_with("wb-"));
        assert_eq!(a.len(), 3 + WORKBOOK_ID_TOKEN_LEN);
    }
}
