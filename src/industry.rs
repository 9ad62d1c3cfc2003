// Industry grouping for lease records.
//
// Grouping happens in two separate stages. [`IndustryClassifier::classify`]
// looks at one free-text value at a time. [`collapse_to_top_n`] then looks
// at the whole column and folds every group outside the `n` most frequent
// into [`OTHER`], so the final label of a record depends on the dataset it
// was loaded with.

use crate::util::title_case;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const OTHER: &str = "Other";

/// Unmatched values at least this long are folded into [`OTHER`].
const MAX_ADHOC_LEN: usize = 30;

/// A group label and the lowercase substrings that select it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl IndustryRule {
    fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn defaults() -> Vec<IndustryRule> {
        vec![
            IndustryRule::new("Tech & Info", &["tech", "information", "software"]),
            IndustryRule::new("Finance & Insurance", &["finance", "bank", "insurance"]),
            IndustryRule::new("Legal", &["legal", "law"]),
            IndustryRule::new("Consulting & Business", &["consult", "business", "accounting"]),
            IndustryRule::new("Media & Advertising", &["media", "advertis"]),
            IndustryRule::new("Healthcare", &["health", "hospital", "medical"]),
            IndustryRule::new(
                "Manufacturing & Engineering",
                &["manufactur", "industrial", "engineering"],
            ),
            IndustryRule::new("Real Estate", &["real estate"]),
            IndustryRule::new("Retail", &["retail"]),
            IndustryRule::new("Education", &["education"]),
            IndustryRule::new("Non-Profit", &["non-profit"]),
            IndustryRule::new("Food & Hospitality", &["restaurant", "food"]),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct IndustryClassifier {
    rules: Vec<IndustryRule>,
}

impl IndustryClassifier {
    pub fn new(rules: &[IndustryRule]) -> Self {
        let rules = rules
            .iter()
            .map(|r| IndustryRule {
                label: r.label.clone(),
                keywords: r.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self { rules }
    }

    /// Group one raw industry value. The first rule with a matching keyword
    /// wins; unmatched short values become their own title-cased group.
    pub fn classify(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw else {
            return OTHER.to_string();
        };
        let lowered = raw.to_lowercase();
        for rule in &self.rules {
            if rule.keywords.iter().any(|k| lowered.contains(k.as_str())) {
                return rule.label.clone();
            }
        }
        if lowered.chars().count() < MAX_ADHOC_LEN {
            title_case(&lowered)
        } else {
            OTHER.to_string()
        }
    }
}

/// Labels ranked by frequency, most frequent first; ties by label.
pub fn rank_by_frequency(labels: &[String]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Rewrite every label outside the `n` most frequent to [`OTHER`].
///
/// Returns the retained labels in rank order.
pub fn collapse_to_top_n(labels: &mut [String], n: usize) -> Vec<String> {
    let top: Vec<String> = rank_by_frequency(labels)
        .into_iter()
        .take(n)
        .map(|(label, _)| label)
        .collect();
    for label in labels.iter_mut() {
        if !top.contains(label) {
            *label = OTHER.to_string();
        }
    }
    top
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IndustryClassifier {
        IndustryClassifier::new(&IndustryRule::defaults())
    }

    #[test]
    fn keywords_select_groups_in_priority_order() {
        let c = classifier();
        assert_eq!(c.classify(Some("Technology, Advertising, Media")), "Tech & Info");
        assert_eq!(c.classify(Some("Law Firms")), "Legal");
        assert_eq!(c.classify(Some("Banking")), "Finance & Insurance");
        assert_eq!(
            c.classify(Some("Construction, Engineering and Architecture")),
            "Manufacturing & Engineering"
        );
        assert_eq!(c.classify(Some("Fast FOOD")), "Food & Hospitality");
    }

    #[test]
    fn unmatched_values_depend_on_length() {
        let c = classifier();
        assert_eq!(c.classify(Some("government agency")), "Government Agency");
        assert_eq!(
            c.classify(Some("Utilities, Transportation and Logistics Services")),
            OTHER
        );
        assert_eq!(c.classify(None), OTHER);
    }

    #[test]
    fn collapse_keeps_only_most_frequent_groups() {
        let mut labels: Vec<String> = ["Legal", "Retail", "Legal", "Education", "Retail", "Legal", "Energy"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let top = collapse_to_top_n(&mut labels, 2);
        assert_eq!(top, vec!["Legal".to_string(), "Retail".to_string()]);
        assert_eq!(
            labels,
            vec!["Legal", "Retail", "Legal", "Other", "Retail", "Legal", "Other"]
        );
    }

    #[test]
    fn same_value_can_collapse_differently_per_dataset() {
        let c = classifier();
        let group = c.classify(Some("Energy"));

        let mut small = vec![group.clone(), "Legal".to_string()];
        collapse_to_top_n(&mut small, 2);
        assert_eq!(small[0], "Energy");

        let mut crowded = vec![group, "Legal".to_string(), "Legal".to_string(), "Retail".into(), "Retail".into()];
        collapse_to_top_n(&mut crowded, 2);
        assert_eq!(crowded[0], OTHER);
    }
}
