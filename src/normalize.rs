// Column label normalization applied to every dataset before anything
// else looks at its headers.

/// Normalize one column label: stray quote characters removed, then
/// trimmed, lowercased and inner spaces turned into underscores.
///
/// Quotes are removed before trimming, so `" Leased SF"` becomes
/// `leased_sf` and the output never carries outer whitespace.
pub fn normalize_label(raw: &str) -> String {
    let unquoted: String = raw.chars().filter(|c| *c != '"' && *c != '\'').collect();
    unquoted.trim().to_lowercase().replace(' ', "_")
}

pub fn normalize_columns(labels: &[String]) -> Vec<String> {
    labels.iter().map(|l| normalize_label(l)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalizes_whitespace_case_and_quotes() {
        let raw = labels(&["  Leased SF ", "\"Company Name\"", "Market's Code", "RBA"]);
        assert_eq!(
            normalize_columns(&raw),
            labels(&["leased_sf", "company_name", "markets_code", "rba"])
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = labels(&[" Overall Rent", "internal_industry", "'Year'", "Quarter  "]);
        let once = normalize_columns(&raw);
        let twice = normalize_columns(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn padding_inside_quotes_is_trimmed() {
        assert_eq!(normalize_label("\" leasedSF\""), "leasedsf");
        assert_eq!(normalize_label("'\tYear'"), "year");
        assert_eq!(normalize_label("leasedSF"), "leasedsf");
    }
}
