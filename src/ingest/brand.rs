use crate::utils::normalize_text;
use once_cell::sync::Lazy;
use regex::Regex;

pub const BOTICARIO: &str = "BOTICARIO";
pub const EUDORA: &str = "EUDORA";
pub const QUEM_DISSE_BERENICE: &str = "QUEM DISSE BERENICE";

static BRAND_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\bbotic").expect("valid brand pattern"),
            BOTICARIO,
        ),
        (Regex::new(r"\beudora").expect("valid brand pattern"), EUDORA),
        (
            Regex::new(r"\bquem\s*disse\b|\bberenice\b|\bqdb\b").expect("valid brand pattern"),
            QUEM_DISSE_BERENICE,
        ),
    ]
});

/// Brand label for a sheet. Unknown names pass through trimmed and uppercased.
pub fn brand_from_sheet_name(sheet_name: &str) -> String {
    let normalized = normalize_text(sheet_name);
    BRAND_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&normalized))
        .map(|(_, brand)| brand.to_string())
        .unwrap_or_else(|| sheet_name.trim().to_uppercase())
}
