// Synthetic date keys built from (year, quarter) or (year, month) columns.
use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The sub-year part of a date key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Quarter(u32),
    Month(u32),
}

impl Period {
    fn first_month(self) -> u32 {
        match self {
            Period::Quarter(q) => (q - 1) * 3 + 1,
            Period::Month(m) => m,
        }
    }
}

/// What loaders do with a row whose date cannot be reconstructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Stop the run, naming the dataset and row.
    #[default]
    Abort,
    /// Log a warning and drop the row.
    Skip,
}

/// Integral value of a cell such as `2021`, `3` or `3.0`.
fn parse_integral(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn parse_year(raw: &str) -> Option<i32> {
    match parse_integral(raw)? {
        y if y > 0 && y <= i32::MAX as i64 => Some(y as i32),
        _ => None,
    }
}

/// Accepts `Q1`..`Q4` (any case) or a bare `1`..`4`.
pub fn parse_quarter(raw: &str) -> Option<Period> {
    let s = raw.trim();
    let digits = s
        .strip_prefix('Q')
        .or_else(|| s.strip_prefix('q'))
        .unwrap_or(s);
    match parse_integral(digits)? {
        q @ 1..=4 => Some(Period::Quarter(q as u32)),
        _ => None,
    }
}

pub fn parse_month(raw: &str) -> Option<Period> {
    match parse_integral(raw)? {
        m @ 1..=12 => Some(Period::Month(m as u32)),
        _ => None,
    }
}

/// First day of the period: Q1→Jan, Q2→Apr, Q3→Jul, Q4→Oct, or the month.
pub fn reconstruct(year: i32, period: Period) -> Option<NaiveDate> {
    if year <= 0 {
        return None;
    }
    match period {
        Period::Quarter(1..=4) | Period::Month(1..=12) => {
            NaiveDate::from_ymd_opt(year, period.first_month(), 1)
        }
        _ => None,
    }
}

/// Build the date key for one row from its raw year and period cells.
///
/// `row` is the 1-based data row, used only for the error message.
pub fn date_key(
    dataset: &str,
    row: usize,
    year: Option<&str>,
    period: Option<&str>,
    parse_period: fn(&str) -> Option<Period>,
) -> Result<NaiveDate> {
    let invalid = |detail: String| PipelineError::InvalidDateComponent {
        dataset: dataset.to_string(),
        row,
        detail,
    };
    let year_raw = year.ok_or_else(|| invalid("year is missing".into()))?;
    let y = parse_year(year_raw).ok_or_else(|| invalid(format!("year `{year_raw}`")))?;
    let period_raw = period.ok_or_else(|| invalid("period is missing".into()))?;
    let p = parse_period(period_raw).ok_or_else(|| invalid(format!("period `{period_raw}`")))?;
    reconstruct(y, p).ok_or_else(|| invalid(format!("{y} {period_raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn quarter_labels_map_to_quarter_start() {
        let q3 = parse_quarter("Q3").unwrap();
        assert_eq!(reconstruct(2021, q3), Some(ymd(2021, 7, 1)));
        let q4 = parse_quarter("4").unwrap();
        assert_eq!(reconstruct(2021, q4), Some(ymd(2021, 10, 1)));
        assert_eq!(parse_quarter(" q1 "), Some(Period::Quarter(1)));
        assert_eq!(parse_quarter("2.0"), Some(Period::Quarter(2)));
    }

    #[test]
    fn out_of_range_periods_are_rejected() {
        assert_eq!(parse_quarter("5"), None);
        assert_eq!(parse_quarter("Q0"), None);
        assert_eq!(parse_quarter("Q2.5"), None);
        assert_eq!(parse_month("13"), None);
        assert_eq!(reconstruct(2021, Period::Quarter(5)), None);
        assert_eq!(reconstruct(0, Period::Quarter(1)), None);
    }

    #[test]
    fn months_map_to_first_of_month() {
        let m = parse_month("3").unwrap();
        assert_eq!(reconstruct(2020, m), Some(ymd(2020, 3, 1)));
    }

    #[test]
    fn date_key_reports_invalid_component_with_row() {
        let err = date_key("occupancy", 7, Some("2021"), Some("5"), parse_quarter).unwrap_err();
        match err {
            PipelineError::InvalidDateComponent { dataset, row, detail } => {
                assert_eq!(dataset, "occupancy");
                assert_eq!(row, 7);
                assert!(detail.contains('5'));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(date_key("price", 1, Some("-3"), Some("Q1"), parse_quarter).is_err());
        assert!(date_key("price", 1, None, Some("Q1"), parse_quarter).is_err());
    }

    #[test]
    fn date_key_builds_valid_dates() {
        let d = date_key("unemployment", 1, Some("2020"), Some("11"), parse_month).unwrap();
        assert_eq!(d, ymd(2020, 11, 1));
    }
}
