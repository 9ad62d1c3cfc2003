// Cleaning of raw extracts into cleaned CSVs, and typed loading of the
// cleaned files back into records.
use crate::config::{DatasetConfig, PipelineConfig};
use crate::dates::{date_key, parse_month, parse_quarter, DatePolicy};
use crate::error::{PipelineError, Result};
use crate::filter::{dedup, drop_fully_null, drop_if_null_in};
use crate::normalize::normalize_columns;
use crate::table::Table;
use crate::types::{
    Dataset, LeaseRecord, OccupancyRecord, PriceRecord, RawLeaseRow, RawOccupancyRow,
    RawPriceRow, RawUnemploymentRow, UnemploymentRecord,
};
use crate::util::parse_f64_safe;
use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// What cleaning did to one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanReport {
    pub dataset: Dataset,
    pub total_rows: usize,
    pub duplicates: usize,
    pub empty_rows: usize,
    pub missing_required: usize,
    pub kept_rows: usize,
}

/// Normalize headers and apply the row filters configured for a dataset.
///
/// Configuration errors (a required or dropped column that does not exist)
/// are raised before any row is removed.
pub fn clean_table(
    dataset: Dataset,
    mut table: Table,
    config: &DatasetConfig,
) -> Result<(Table, CleanReport)> {
    table.headers = normalize_columns(&table.headers);
    for column in config.required_columns.iter().chain(&config.drop_columns) {
        table.column_index(column)?;
    }
    let total_rows = table.len();
    let duplicates = dedup(&mut table);
    let empty_rows = drop_fully_null(&mut table);
    let missing_required = drop_if_null_in(&mut table, &config.required_columns)?;
    table.drop_columns(&config.drop_columns)?;
    let report = CleanReport {
        dataset,
        total_rows,
        duplicates,
        empty_rows,
        missing_required,
        kept_rows: table.len(),
    };
    info!(
        %dataset,
        total = report.total_rows,
        duplicates = report.duplicates,
        empty = report.empty_rows,
        missing_required = report.missing_required,
        kept = report.kept_rows,
        "cleaned dataset"
    );
    Ok((table, report))
}

pub fn clean_dataset(config: &PipelineConfig, dataset: Dataset) -> Result<(Table, CleanReport)> {
    let path = config.raw_path(dataset)?;
    debug!(%dataset, path = %path.display(), "reading raw extract");
    let table = Table::read_csv(&path, dataset.name())?;
    clean_table(dataset, table, config.dataset(dataset)?)
}

/// Clean every dataset and write the cleaned copies into `output_dir`.
pub fn clean_all(config: &PipelineConfig) -> Result<Vec<CleanReport>> {
    std::fs::create_dir_all(&config.output_dir)?;
    let mut reports = Vec::with_capacity(Dataset::ALL.len());
    for dataset in Dataset::ALL {
        let (table, report) = clean_dataset(config, dataset)?;
        let out = config.cleaned_path(dataset)?;
        table.write_csv(&out)?;
        info!(%dataset, path = %out.display(), "wrote cleaned dataset");
        reports.push(report);
    }
    Ok(reports)
}

/// Deserialize every row of a cleaned table through serde, paired with its
/// 1-based data row number.
fn raw_rows<T: DeserializeOwned>(table: &Table) -> Result<Vec<(usize, T)>> {
    let headers = table.header_record();
    (0..table.len())
        .map(|idx| {
            let row: T = table.row_record(idx).deserialize(Some(&headers))?;
            Ok((idx + 1, row))
        })
        .collect()
}

/// Apply the date policy to one row's outcome: `Ok(None)` means skipped.
fn admit<T>(policy: DatePolicy, outcome: Result<T>) -> Result<Option<T>> {
    match outcome {
        Ok(record) => Ok(Some(record)),
        Err(err @ PipelineError::InvalidDateComponent { .. }) if policy == DatePolicy::Skip => {
            warn!(error = %err, "skipping row");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

fn keyed(dataset: Dataset, row: usize, key: Option<String>) -> Option<String> {
    let key = trimmed(key);
    if key.is_none() {
        debug!(%dataset, row, "row has no grouping key, skipped");
    }
    key
}

pub fn occupancy_records(table: &Table, policy: DatePolicy) -> Result<Vec<OccupancyRecord>> {
    let dataset = Dataset::Occupancy;
    let mut out = Vec::new();
    for (row, raw) in raw_rows::<RawOccupancyRow>(table)? {
        let date = date_key(
            dataset.name(),
            row,
            raw.year.as_deref(),
            raw.quarter.as_deref(),
            parse_quarter,
        );
        let Some(date) = admit(policy, date)? else {
            continue;
        };
        let Some(market) = keyed(dataset, row, raw.market) else {
            continue;
        };
        out.push(OccupancyRecord {
            market,
            year: date.year(),
            quarter: quarter_of(date),
            date,
            occupancy_proportion: parse_f64_safe(raw.occupancy_proportion.as_deref()),
        });
    }
    Ok(out)
}

pub fn price_records(table: &Table, policy: DatePolicy) -> Result<Vec<PriceRecord>> {
    let dataset = Dataset::Price;
    let mut out = Vec::new();
    for (row, raw) in raw_rows::<RawPriceRow>(table)? {
        let date = date_key(
            dataset.name(),
            row,
            raw.year.as_deref(),
            raw.quarter.as_deref(),
            parse_quarter,
        );
        let Some(date) = admit(policy, date)? else {
            continue;
        };
        let Some(market) = keyed(dataset, row, raw.market) else {
            continue;
        };
        out.push(PriceRecord {
            market,
            region: trimmed(raw.region),
            year: date.year(),
            date,
            overall_rent: parse_f64_safe(raw.overall_rent.as_deref()),
            leasing: parse_f64_safe(raw.leasing.as_deref()),
        });
    }
    Ok(out)
}

pub fn lease_records(table: &Table, policy: DatePolicy) -> Result<Vec<LeaseRecord>> {
    let dataset = Dataset::Leases;
    let mut out = Vec::new();
    for (row, raw) in raw_rows::<RawLeaseRow>(table)? {
        let date = date_key(
            dataset.name(),
            row,
            raw.year.as_deref(),
            raw.quarter.as_deref(),
            parse_quarter,
        );
        let Some(date) = admit(policy, date)? else {
            continue;
        };
        let Some(market) = keyed(dataset, row, raw.market) else {
            continue;
        };
        out.push(LeaseRecord {
            market,
            city: trimmed(raw.city),
            state: trimmed(raw.state),
            address: trimmed(raw.address),
            company_name: trimmed(raw.company_name),
            industry: trimmed(raw.internal_industry),
            year: date.year(),
            quarter: quarter_of(date),
            date,
            leased_sf: parse_f64_safe(raw.leasedsf.as_deref()),
            overall_rent: parse_f64_safe(raw.overall_rent.as_deref()),
            available_space: parse_f64_safe(raw.available_space.as_deref()),
            leasing: parse_f64_safe(raw.leasing.as_deref()),
        });
    }
    Ok(out)
}

pub fn unemployment_records(
    table: &Table,
    policy: DatePolicy,
) -> Result<Vec<UnemploymentRecord>> {
    let dataset = Dataset::Unemployment;
    let mut out = Vec::new();
    for (row, raw) in raw_rows::<RawUnemploymentRow>(table)? {
        let date = date_key(
            dataset.name(),
            row,
            raw.year.as_deref(),
            raw.month.as_deref(),
            parse_month,
        );
        let Some(date) = admit(policy, date)? else {
            continue;
        };
        let Some(state) = keyed(dataset, row, raw.state) else {
            continue;
        };
        out.push(UnemploymentRecord {
            state,
            year: date.year(),
            month: date.month(),
            date,
            unemployment_rate: parse_f64_safe(raw.unemployment_rate.as_deref()),
        });
    }
    Ok(out)
}

/// All four datasets, typed and dated.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub leases: Vec<LeaseRecord>,
    pub occupancy: Vec<OccupancyRecord>,
    pub prices: Vec<PriceRecord>,
    pub unemployment: Vec<UnemploymentRecord>,
}

/// Read the cleaned files written by [`clean_all`].
pub fn load_cleaned(config: &PipelineConfig) -> Result<MarketData> {
    let read = |dataset: Dataset| -> Result<Table> {
        let table = Table::read_csv(&config.cleaned_path(dataset)?, dataset.name())?;
        info!(%dataset, rows = table.len(), "loaded cleaned dataset");
        Ok(table)
    };
    let policy = config.date_policy;
    Ok(MarketData {
        leases: lease_records(&read(Dataset::Leases)?, policy)?,
        occupancy: occupancy_records(&read(Dataset::Occupancy)?, policy)?,
        prices: price_records(&read(Dataset::Price)?, policy)?,
        unemployment: unemployment_records(&read(Dataset::Unemployment)?, policy)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn occupancy_table() -> Table {
        let mut t = Table::new(
            "occupancy",
            vec!["market".into(), "year".into(), "quarter".into(), "occupancy_proportion".into()],
        );
        t.rows = vec![
            vec![cell("Austin"), cell("2021"), cell("Q3"), cell("0.81")],
            vec![cell("Austin"), cell("2021"), cell("Q5"), cell("0.80")],
            vec![cell("Houston"), cell("2021"), cell("4"), None],
        ];
        t
    }

    #[test]
    fn clean_table_normalizes_and_filters() {
        let mut raw = Table::new(
            "leases",
            vec![" Company Name".into(), "RBA".into(), "Space Type".into()],
        );
        raw.rows = vec![
            vec![cell("Acme"), cell("100"), cell("Office")],
            vec![cell("Acme"), cell("100"), cell("Office")],
            vec![None, None, None],
            vec![None, cell("50"), cell("Office")],
        ];
        let config = DatasetConfig {
            file: "Leases.csv".into(),
            cleaned_file: "leases_clean.csv".into(),
            required_columns: vec!["company_name".into()],
            drop_columns: vec!["space_type".into()],
        };
        let (table, report) = clean_table(Dataset::Leases, raw, &config).unwrap();
        assert_eq!(table.headers, vec!["company_name", "rba"]);
        assert_eq!(table.rows, vec![vec![cell("Acme"), cell("100")]]);
        assert_eq!(
            (report.total_rows, report.duplicates, report.empty_rows, report.missing_required),
            (4, 1, 1, 1)
        );
    }

    #[test]
    fn abort_policy_stops_at_bad_row() {
        let err = occupancy_records(&occupancy_table(), DatePolicy::Abort).unwrap_err();
        match err {
            PipelineError::InvalidDateComponent { row, .. } => assert_eq!(row, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn skip_policy_drops_bad_row() {
        let records = occupancy_records(&occupancy_table(), DatePolicy::Skip).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2021, 7, 1).unwrap());
        assert_eq!(records[0].quarter, 3);
        assert_eq!(records[1].occupancy_proportion, None);
        assert_eq!(records[1].quarter, 4);
    }

    #[test]
    fn unemployment_uses_month_dates() {
        let mut t = Table::new(
            "unemployment",
            vec!["state".into(), "year".into(), "month".into(), "unemployment_rate".into()],
        );
        t.rows = vec![vec![cell("TX"), cell("2020"), cell("4"), cell("12.9")]];
        let records = unemployment_records(&t, DatePolicy::Abort).unwrap();
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2020, 4, 1).unwrap());
        assert_eq!(records[0].unemployment_rate, Some(12.9));
    }

    #[test]
    fn price_rows_keep_only_columns_reports_read() {
        let mut t = Table::new(
            "price",
            vec![
                "market".into(),
                "region".into(),
                "year".into(),
                "quarter".into(),
                "overall_rent".into(),
                "direct_overall_rent".into(),
                "sublet_overall_rent".into(),
                "available_space".into(),
                "leasing".into(),
            ],
        );
        t.rows = vec![vec![
            cell("Austin"),
            cell(" South "),
            cell("2021"),
            cell("Q2"),
            cell("45"),
            cell("46"),
            cell("31"),
            cell("950"),
            cell("160"),
        ]];
        let records = price_records(&t, DatePolicy::Abort).unwrap();
        assert_eq!(
            records,
            vec![PriceRecord {
                market: "Austin".into(),
                region: Some("South".into()),
                year: 2021,
                date: NaiveDate::from_ymd_opt(2021, 4, 1).unwrap(),
                overall_rent: Some(45.0),
                leasing: Some(160.0),
            }]
        );
    }
}
