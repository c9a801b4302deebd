//! Sales-cycle ordering. A cycle is identified canonically as `YYYYCC`
//! (year and cycle number, 17 cycles per year).

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

pub const CYCLES_PER_YEAR: i64 = 17;
pub const WINDOW_SIZE: usize = 17;
/// Days covered by one sales cycle.
pub const CYCLE_DAYS: f64 = 365.0 / CYCLES_PER_YEAR as f64;

static SIX_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").expect("valid pattern"));
static YEAR_THEN_CYCLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\D)(\d{4})\D{1,3}(\d{1,2})(?:\D|$)").expect("valid pattern")
});
static CYCLE_THEN_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\D)(\d{1,2})\D{1,3}(\d{4})(?:\D|$)").expect("valid pattern")
});

/// Ordering key of a cycle identifier; `None` sorts before every cycle.
///
/// Six-digit identifiers are taken as `YYYYCC` verbatim. Otherwise a
/// four-digit year and a one or two digit cycle are located in either order
/// (`"ciclo 2025-6"`, `"06/2025"`) and combined as `year * 100 + cycle`.
pub fn ciclo_key(cycle: &str) -> Option<i64> {
    let trimmed = cycle.trim();
    if SIX_DIGITS.is_match(trimmed) {
        return trimmed.parse().ok();
    }
    if let Some(caps) = YEAR_THEN_CYCLE.captures(trimmed) {
        let year: i64 = caps[1].parse().ok()?;
        let number: i64 = caps[2].parse().ok()?;
        return Some(year * 100 + number);
    }
    if let Some(caps) = CYCLE_THEN_YEAR.captures(trimmed) {
        let number: i64 = caps[1].parse().ok()?;
        let year: i64 = caps[2].parse().ok()?;
        return Some(year * 100 + number);
    }
    None
}

/// Six-digit form of a cycle when it has a key, the trimmed input otherwise.
pub fn canonical_cycle(cycle: &str) -> String {
    match ciclo_key(cycle) {
        Some(key) => format!("{key:06}"),
        None => cycle.trim().to_string(),
    }
}

/// Distinct cycles sorted ascending by [`ciclo_key`] (ties by identifier),
/// keeping only the most recent [`WINDOW_SIZE`].
pub fn select_window<'a, I>(cycles: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    select_window_of(cycles, WINDOW_SIZE)
}

pub fn select_window_of<'a, I>(cycles: I, size: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let distinct: BTreeSet<(Option<i64>, &str)> =
        cycles.into_iter().map(|c| (ciclo_key(c), c)).collect();
    let skip = distinct.len().saturating_sub(size);
    distinct
        .into_iter()
        .skip(skip)
        .map(|(_, c)| c.to_string())
        .collect()
}

/// Cycle following `key`; cycle 17 rolls over into cycle 1 of the next year.
pub fn next_cycle(key: i64) -> i64 {
    let year = key / 100;
    let number = key % 100;
    if number >= CYCLES_PER_YEAR {
        (year + 1) * 100 + 1
    } else {
        key + 1
    }
}

/// Cycle a calendar date falls in, assuming evenly sized cycles.
pub fn cycle_for_date(date: NaiveDate) -> i64 {
    let day = date.ordinal0() as f64;
    let number = ((day / CYCLE_DAYS).floor() as i64 + 1).min(CYCLES_PER_YEAR);
    date.year() as i64 * 100 + number
}

/// Current cycle for deactivation rules: an explicit cycle when it parses,
/// else the most recent of `observed`, else the cycle `today` falls in.
pub fn resolve_current_cycle<'a, I>(explicit: Option<&str>, observed: I, today: NaiveDate) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    explicit
        .and_then(ciclo_key)
        .or_else(|| observed.into_iter().filter_map(ciclo_key).max())
        .unwrap_or_else(|| cycle_for_date(today))
}
