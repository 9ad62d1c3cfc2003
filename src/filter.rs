// Row-level filters. Each returns how many rows it removed so the loader
// can report what happened to a dataset.
use crate::error::Result;
use crate::table::Table;
use std::collections::HashSet;

/// Remove rows where every cell is null.
pub fn drop_fully_null(table: &mut Table) -> usize {
    let before = table.rows.len();
    table.rows.retain(|row| row.iter().any(Option::is_some));
    before - table.rows.len()
}

/// Remove rows with a null in any of `required`. Every required column must
/// exist; the table is untouched when one is missing.
pub fn drop_if_null_in(table: &mut Table, required: &[String]) -> Result<usize> {
    let indices = required
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;
    let before = table.rows.len();
    table
        .rows
        .retain(|row| indices.iter().all(|&idx| row[idx].is_some()));
    Ok(before - table.rows.len())
}

/// Remove exact duplicate rows, keeping the first occurrence in place.
pub fn dedup(table: &mut Table) -> usize {
    let before = table.rows.len();
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(before);
    table.rows.retain(|row| seen.insert(row.clone()));
    before - table.rows.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn table(headers: &[&str], rows: Vec<Vec<Option<String>>>) -> Table {
        let mut t = Table::new("test", headers.iter().map(|h| h.to_string()).collect());
        t.rows = rows;
        t
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let mut t = table(&["a"], vec![vec![cell("1")], vec![cell("1")], vec![cell("2")]]);
        assert_eq!(dedup(&mut t), 1);
        assert_eq!(t.rows, vec![vec![cell("1")], vec![cell("2")]]);
    }

    #[test]
    fn dedup_treats_nulls_as_equal() {
        let mut t = table(
            &["a", "b"],
            vec![
                vec![cell("2"), None],
                vec![cell("1"), None],
                vec![cell("2"), None],
                vec![cell("1"), cell("x")],
            ],
        );
        dedup(&mut t);
        assert_eq!(
            t.rows,
            vec![vec![cell("2"), None], vec![cell("1"), None], vec![cell("1"), cell("x")]]
        );
    }

    #[test]
    fn fully_null_rows_only_are_dropped() {
        let mut t = table(
            &["a", "b"],
            vec![vec![None, None], vec![None, cell("x")], vec![cell("y"), None]],
        );
        assert_eq!(drop_fully_null(&mut t), 1);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn required_columns_are_non_null_afterwards() {
        let mut t = table(
            &["company_name", "rba", "city"],
            vec![
                vec![cell("Acme"), cell("1000"), None],
                vec![None, cell("2000"), cell("Austin")],
                vec![cell("Initech"), None, cell("Dallas")],
                vec![cell("Globex"), cell("3000"), cell("Houston")],
            ],
        );
        let required = vec!["company_name".to_string(), "rba".to_string()];
        assert_eq!(drop_if_null_in(&mut t, &required).unwrap(), 2);
        assert!(t.rows.iter().all(|r| r[0].is_some() && r[1].is_some()));

        let snapshot = t.clone();
        assert_eq!(drop_if_null_in(&mut t, &required).unwrap(), 0);
        assert_eq!(t, snapshot);
    }

    #[test]
    fn filter_order_does_not_change_survivors() {
        let rows = vec![
            vec![cell("a"), cell("1")],
            vec![cell("a"), cell("1")],
            vec![None, None],
            vec![None, cell("2")],
            vec![cell("b"), None],
        ];
        let required = vec!["k".to_string()];

        let mut first = table(&["k", "v"], rows.clone());
        dedup(&mut first);
        drop_fully_null(&mut first);
        drop_if_null_in(&mut first, &required).unwrap();

        let mut second = table(&["k", "v"], rows);
        drop_if_null_in(&mut second, &required).unwrap();
        drop_fully_null(&mut second);
        dedup(&mut second);

        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn missing_required_column_fails_fast() {
        let mut t = table(&["a"], vec![vec![None]]);
        let err = drop_if_null_in(&mut t, &["rba".to_string()]).unwrap_err();
        match err {
            PipelineError::MissingColumn { column, .. } => assert_eq!(column, "rba"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(t.len(), 1);
    }
}
