// Group-by, rolling, indexing and pivot operations over keyed observations.
//
// Groups that end up with no values are left out of every result; nothing
// here zero-fills a missing group except [`pivot`], whose cells are defined
// to be 0 when a combination was never observed.

use crate::util::average;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Eight quarters.
pub const WINDOW_2Y: usize = 8;
/// Twelve quarters.
pub const WINDOW_3Y: usize = 12;

/// One value of a per-market time series.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub market: String,
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(market: impl Into<String>, date: NaiveDate, value: f64) -> Self {
        Self {
            market: market.into(),
            date,
            value,
        }
    }
}

fn collect_groups<K: Ord>(items: impl IntoIterator<Item = (K, f64)>) -> BTreeMap<K, Vec<f64>> {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (key, value) in items {
        groups.entry(key).or_default().push(value);
    }
    groups
}

pub fn group_mean<K: Ord>(items: impl IntoIterator<Item = (K, f64)>) -> BTreeMap<K, f64> {
    collect_groups(items)
        .into_iter()
        .filter_map(|(k, values)| average(&values).map(|m| (k, m)))
        .collect()
}

pub fn group_sum<K: Ord>(items: impl IntoIterator<Item = (K, f64)>) -> BTreeMap<K, f64> {
    let mut sums: BTreeMap<K, f64> = BTreeMap::new();
    for (key, value) in items {
        *sums.entry(key).or_insert(0.0) += value;
    }
    sums
}

pub fn group_count<K: Ord>(keys: impl IntoIterator<Item = K>) -> BTreeMap<K, usize> {
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    counts
}

/// Mean value per (market, date), as a series ordered by market then date.
pub fn mean_series(items: impl IntoIterator<Item = Observation>) -> Vec<Observation> {
    group_mean(items.into_iter().map(|o| ((o.market, o.date), o.value)))
        .into_iter()
        .map(|((market, date), value)| Observation { market, date, value })
        .collect()
}

/// Sum per (market, date), ordered by market then date.
pub fn sum_series(items: impl IntoIterator<Item = Observation>) -> Vec<Observation> {
    group_sum(items.into_iter().map(|o| ((o.market, o.date), o.value)))
        .into_iter()
        .map(|((market, date), value)| Observation { market, date, value })
        .collect()
}

fn by_market(series: &[Observation]) -> BTreeMap<&str, Vec<&Observation>> {
    let mut markets: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for obs in series {
        markets.entry(obs.market.as_str()).or_default().push(obs);
    }
    for points in markets.values_mut() {
        points.sort_by_key(|o| o.date);
    }
    markets
}

/// Trailing mean over the last `window` periods of each market, using
/// whatever is available while fewer than `window` periods exist.
///
/// Output is ordered by market then date and has one point per input point.
pub fn rolling_mean(series: &[Observation], window: usize) -> Vec<Observation> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(series.len());
    for (market, points) in by_market(series) {
        for (i, obs) in points.iter().enumerate() {
            let start = (i + 1).saturating_sub(window);
            let span = &points[start..=i];
            let sum: f64 = span.iter().map(|o| o.value).sum();
            out.push(Observation::new(market, obs.date, sum / span.len() as f64));
        }
    }
    out
}

/// Base value of one market's date-sorted series: the value at `baseline`,
/// else the last value before it, else the first value after it.
fn resolve_base(points: &[&Observation], baseline: NaiveDate) -> Option<f64> {
    let before = points.iter().rev().find(|o| o.date <= baseline);
    let after = points.iter().find(|o| o.date > baseline);
    before.or(after).map(|o| o.value)
}

/// Each market's series as a percentage of its baseline value, for points
/// on or after `baseline`. Markets without a usable (non-zero) base are
/// left out.
pub fn indexed_growth(series: &[Observation], baseline: NaiveDate) -> Vec<Observation> {
    let mut out = Vec::new();
    for (market, points) in by_market(series) {
        let Some(base) = resolve_base(&points, baseline).filter(|b| *b != 0.0) else {
            continue;
        };
        out.extend(
            points
                .iter()
                .filter(|o| o.date >= baseline)
                .map(|o| Observation::new(market, o.date, o.value / base * 100.0)),
        );
    }
    out
}

/// Groups ranked by value, largest first, keeping `n`. Ties keep key order.
pub fn top_n<K: Ord>(groups: impl IntoIterator<Item = (K, f64)>, n: usize) -> Vec<(K, f64)> {
    let mut ranked: Vec<(K, f64)> = groups.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(n);
    ranked
}

/// A dense row-key × column-key table.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_keys: Vec<String>,
    pub col_keys: Vec<String>,
    pub cells: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.row_keys.iter().position(|k| k == row)?;
        let c = self.col_keys.iter().position(|k| k == col)?;
        Some(self.cells[r][c])
    }

    /// Re-key to the given rows and columns, in that order. Keys the table
    /// never saw get zero cells.
    pub fn select(&self, rows: &[String], cols: &[String]) -> PivotTable {
        let cells = rows
            .iter()
            .map(|r| {
                cols.iter()
                    .map(|c| self.get(r, c).unwrap_or(0.0))
                    .collect()
            })
            .collect();
        PivotTable {
            row_keys: rows.to_vec(),
            col_keys: cols.to_vec(),
            cells,
        }
    }

    /// Each cell as a percentage of its row total; all-zero rows stay zero.
    pub fn row_shares(&self) -> PivotTable {
        let cells = self
            .cells
            .iter()
            .map(|row| {
                let total: f64 = row.iter().sum();
                row.iter()
                    .map(|v| if total == 0.0 { 0.0 } else { v / total * 100.0 })
                    .collect()
            })
            .collect();
        PivotTable {
            row_keys: self.row_keys.clone(),
            col_keys: self.col_keys.clone(),
            cells,
        }
    }
}

/// Reshape (row, column, value) triples into a [`PivotTable`] with sorted
/// keys. Repeated combinations are summed; absent ones are 0.
pub fn pivot(triples: impl IntoIterator<Item = (String, String, f64)>) -> PivotTable {
    let mut values: HashMap<(String, String), f64> = HashMap::new();
    let mut rows = BTreeSet::new();
    let mut cols = BTreeSet::new();
    for (row, col, value) in triples {
        rows.insert(row.clone());
        cols.insert(col.clone());
        *values.entry((row, col)).or_insert(0.0) += value;
    }
    let row_keys: Vec<String> = rows.into_iter().collect();
    let col_keys: Vec<String> = cols.into_iter().collect();
    let cells = row_keys
        .iter()
        .map(|r| {
            col_keys
                .iter()
                .map(|c| values.get(&(r.clone(), c.clone())).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();
    PivotTable {
        row_keys,
        col_keys,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn group_means_and_sums_skip_empty_groups() {
        let items = vec![("HOU", 2.0), ("AUS", 1.0), ("HOU", 4.0)];
        let means = group_mean(items.clone());
        assert_eq!(means.get("HOU"), Some(&3.0));
        assert_eq!(means.get("AUS"), Some(&1.0));
        assert_eq!(means.get("DFW"), None);
        assert_eq!(group_sum(items).get("HOU"), Some(&6.0));
        assert!(group_mean(Vec::<(&str, f64)>::new()).is_empty());
    }

    #[test]
    fn rolling_mean_is_cumulative_before_window_fills() {
        let series = vec![
            Observation::new("HOU", d(2020, 7), 0.6),
            Observation::new("HOU", d(2020, 1), 0.9),
            Observation::new("HOU", d(2020, 4), 0.8),
        ];
        let rolled = rolling_mean(&series, WINDOW_2Y);
        let values: Vec<f64> = rolled.iter().map(|o| o.value).collect();
        assert_eq!(rolled[0].date, d(2020, 1));
        assert!(close(values[0], 0.9));
        assert!(close(values[1], (0.9 + 0.8) / 2.0));
        assert!(close(values[2], (0.9 + 0.8 + 0.6) / 3.0));
    }

    #[test]
    fn rolling_mean_slides_and_stays_per_market() {
        let mut series: Vec<Observation> = (1..=4)
            .map(|q| Observation::new("AUS", d(2021, q * 3 - 2), q as f64))
            .collect();
        series.push(Observation::new("DFW", d(2021, 1), 100.0));
        let rolled = rolling_mean(&series, 2);
        let aus: Vec<f64> = rolled.iter().filter(|o| o.market == "AUS").map(|o| o.value).collect();
        assert_eq!(aus, vec![1.0, 1.5, 2.5, 3.5]);
        let dfw: Vec<f64> = rolled.iter().filter(|o| o.market == "DFW").map(|o| o.value).collect();
        assert_eq!(dfw, vec![100.0]);
    }

    #[test]
    fn indexed_growth_uses_baseline_value() {
        let series = vec![
            Observation::new("HOU", d(2021, 1), 150.0),
            Observation::new("HOU", d(2021, 4), 180.0),
        ];
        let indexed = indexed_growth(&series, d(2021, 1));
        assert_eq!(indexed.len(), 2);
        assert!(close(indexed[0].value, 100.0));
        assert!(close(indexed[1].value, 120.0));
    }

    #[test]
    fn indexed_growth_fills_missing_baseline() {
        let series = vec![
            Observation::new("AUS", d(2020, 10), 40.0),
            Observation::new("AUS", d(2021, 4), 50.0),
            Observation::new("SF", d(2021, 7), 80.0),
            Observation::new("SF", d(2021, 10), 100.0),
        ];
        let indexed = indexed_growth(&series, d(2021, 1));

        let aus: Vec<&Observation> = indexed.iter().filter(|o| o.market == "AUS").collect();
        assert_eq!(aus.len(), 1);
        assert!(close(aus[0].value, 125.0));

        let sf: Vec<f64> = indexed.iter().filter(|o| o.market == "SF").map(|o| o.value).collect();
        assert_eq!(sf.len(), 2);
        assert!(close(sf[0], 100.0));
        assert!(close(sf[1], 125.0));
    }

    #[test]
    fn indexed_growth_excludes_unresolvable_markets() {
        let series = vec![
            Observation::new("PHX", d(2021, 1), 0.0),
            Observation::new("PHX", d(2021, 4), 5.0),
        ];
        assert!(indexed_growth(&series, d(2021, 1)).is_empty());
    }

    #[test]
    fn pivot_fills_absent_cells_with_zero() {
        let table = pivot(vec![
            ("HOU".to_string(), "Tech".to_string(), 5.0),
            ("HOU".to_string(), "Finance".to_string(), 3.0),
            ("AUS".to_string(), "Tech".to_string(), 2.0),
        ]);
        assert_eq!(table.row_keys, vec!["AUS", "HOU"]);
        assert_eq!(table.col_keys, vec!["Finance", "Tech"]);
        assert_eq!(table.get("AUS", "Finance"), Some(0.0));
        assert_eq!(table.get("HOU", "Tech"), Some(5.0));
        assert_eq!(table.get("AUS", "Tech"), Some(2.0));
    }

    #[test]
    fn pivot_shares_and_selection() {
        let table = pivot(vec![
            ("HOU".to_string(), "Tech".to_string(), 3.0),
            ("HOU".to_string(), "Legal".to_string(), 1.0),
        ]);
        let shares = table.row_shares();
        assert!(close(shares.get("HOU", "Tech").unwrap(), 75.0));
        let picked = shares.select(&["HOU".to_string(), "NYC".to_string()], &["Tech".to_string()]);
        assert_eq!(picked.cells, vec![vec![75.0], vec![0.0]]);
    }

    #[test]
    fn top_n_orders_descending() {
        let groups = vec![("A", 10.0), ("B", 30.0), ("C", 20.0)];
        assert_eq!(top_n(groups, 2), vec![("B", 30.0), ("C", 20.0)]);
    }

    #[test]
    fn series_helpers_aggregate_per_market_date() {
        let obs = vec![
            Observation::new("HOU", d(2021, 1), 10.0),
            Observation::new("HOU", d(2021, 1), 20.0),
            Observation::new("AUS", d(2021, 1), 5.0),
        ];
        let means = mean_series(obs.clone());
        assert_eq!(means[0], Observation::new("AUS", d(2021, 1), 5.0));
        assert_eq!(means[1], Observation::new("HOU", d(2021, 1), 15.0));
        assert_eq!(sum_series(obs)[1].value, 30.0);
    }
}
