// Nullable text table read from and written to CSV.
use crate::error::{PipelineError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

/// Cell markers read as null, on top of empty cells. Same set as the
/// default NA values of pandas' CSV reader.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A loaded dataset: named columns over rows of nullable text cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

pub fn parse_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NA_MARKERS.contains(&trimmed) {
        return None;
    }
    Some(raw.to_string())
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a header-first, comma-delimited file. Short rows are padded with
    /// nulls and long rows truncated to the header width.
    pub fn read_csv(path: &Path, name: &str) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();
        let mut table = Table::new(name, headers);
        for result in rdr.records() {
            let record = result?;
            let mut row: Vec<Option<String>> = record.iter().take(width).map(parse_cell).collect();
            row.resize(width, None);
            table.rows.push(row);
        }
        Ok(table)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| PipelineError::MissingColumn {
                dataset: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Remove the named columns; every name must exist.
    pub fn drop_columns(&mut self, columns: &[String]) -> Result<()> {
        let mut doomed = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;
        doomed.sort_unstable();
        doomed.dedup();
        for idx in doomed.into_iter().rev() {
            self.headers.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        Ok(())
    }

    pub fn header_record(&self) -> StringRecord {
        StringRecord::from(self.headers.clone())
    }

    /// Row as a csv record with nulls as empty fields, ready for serde.
    pub fn row_record(&self, idx: usize) -> StringRecord {
        StringRecord::from(
            self.rows[idx]
                .iter()
                .map(|c| c.as_deref().unwrap_or(""))
                .collect::<Vec<_>>(),
        )
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let mut t = Table::new(
            "leases",
            vec!["market".into(), "rba".into(), "city".into()],
        );
        t.rows.push(vec![Some("Austin".into()), Some("100".into()), None]);
        t.rows.push(vec![Some("Houston".into()), None, Some("Katy".into())]);
        t
    }

    #[test]
    fn na_markers_and_blank_cells_are_null() {
        assert_eq!(parse_cell(""), None);
        assert_eq!(parse_cell("   "), None);
        assert_eq!(parse_cell("NaN"), None);
        assert_eq!(parse_cell("N/A"), None);
        for marker in [
            "n/a", "<NA>", "#NA", "#N/A N/A", "-NaN", "-nan", "1.#IND", "1.#QNAN", "-1.#IND",
            "-1.#QNAN",
        ] {
            assert_eq!(parse_cell(marker), None, "{marker}");
        }
        assert_eq!(parse_cell("Austin"), Some("Austin".to_string()));
        assert_eq!(parse_cell("Na"), Some("Na".to_string()));
    }

    #[test]
    fn drop_columns_removes_header_and_cells() {
        let mut t = table();
        t.drop_columns(&["rba".to_string()]).unwrap();
        assert_eq!(t.headers, vec!["market", "city"]);
        assert_eq!(t.rows[1], vec![Some("Houston".to_string()), Some("Katy".to_string())]);
    }

    #[test]
    fn drop_columns_rejects_unknown_column() {
        let mut t = table();
        let err = t.drop_columns(&["space_type".to_string()]).unwrap_err();
        assert!(err.to_string().contains("space_type"));
        assert_eq!(t.headers.len(), 3);
    }

    #[test]
    fn read_csv_reports_missing_path() {
        let err = Table::read_csv(Path::new("/definitely/not/here.csv"), "leases").unwrap_err();
        assert!(matches!(err, PipelineError::MissingFile { .. }));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}
