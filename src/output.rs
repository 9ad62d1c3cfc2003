// Writing report rows to disk and previewing them on the console.
use crate::aggregate::PivotTable;
use crate::error::Result;
use crate::util::format_number;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Text grid of a pivot: a header row of column keys, then one row per row
/// key, with cells formatted to `decimals`.
pub fn pivot_grid(table: &PivotTable, corner: &str, decimals: usize) -> Vec<Vec<String>> {
    let mut grid = Vec::with_capacity(table.row_keys.len() + 1);
    let mut header = vec![corner.to_string()];
    header.extend(table.col_keys.iter().cloned());
    grid.push(header);
    for (key, cells) in table.row_keys.iter().zip(&table.cells) {
        let mut row = vec![key.clone()];
        row.extend(cells.iter().map(|v| format_number(*v, decimals)));
        grid.push(row);
    }
    grid
}

pub fn write_pivot_csv(path: &Path, table: &PivotTable, corner: &str, decimals: usize) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in pivot_grid(table, corner, decimals) {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn preview_table<T>(section: usize, title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n[{}] {}", section, title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    preview_table_rows(rows, max_rows);
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn preview_pivot(section: usize, title: &str, table: &PivotTable, corner: &str, decimals: usize) {
    println!("\n[{}] {}", section, title);
    println!();
    if table.row_keys.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::from_iter(pivot_grid(table, corner, decimals))
        .with(Style::markdown())
        .to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::pivot;
    use crate::types::RankingRow;

    #[test]
    fn pivot_grid_has_header_and_formatted_cells() {
        let table = pivot(vec![
            ("Q1".to_string(), "2020".to_string(), 0.9),
            ("Q2".to_string(), "2021".to_string(), 0.85),
        ]);
        let grid = pivot_grid(&table, "Quarter", 2);
        assert_eq!(grid[0], vec!["Quarter", "2020", "2021"]);
        assert_eq!(grid[1], vec!["Q1", "0.90", "0.00"]);
        assert_eq!(grid[2], vec!["Q2", "0.00", "0.85"]);
    }

    #[test]
    fn csv_and_json_files_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![RankingRow {
            rank: 1,
            label: "AUS".into(),
            value: "12.50".into(),
        }];
        let csv_path = dir.path().join("growth.csv");
        write_csv(&csv_path, &rows).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text.lines().next(), Some("Rank,Label,Value"));
        assert_eq!(text.lines().nth(1), Some("1,AUS,12.50"));

        let json_path = dir.path().join("growth.json");
        write_json(&json_path, &serde_json::json!({ "markets": 1 })).unwrap();
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back["markets"], 1);
    }
}
