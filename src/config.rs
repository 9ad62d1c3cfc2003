// Pipeline configuration.
//
// Everything that used to differ between near-identical cleaning scripts
// (input file names, which columns must be present, which columns to drop)
// lives in one [`PipelineConfig`], loadable from JSON. Column names are
// given in their normalized form; they are normalized again on load so
// `"Company Name"` and `"company_name"` are equivalent.

use crate::canonical::LookupTables;
use crate::dates::DatePolicy;
use crate::error::{PipelineError, Result};
use crate::normalize::normalize_label;
use crate::types::Dataset;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Raw extract, relative to `data_dir`.
    pub file: String,
    /// Cleaned output, relative to `output_dir`.
    pub cleaned_file: String,
    #[serde(default)]
    pub required_columns: Vec<String>,
    #[serde(default)]
    pub drop_columns: Vec<String>,
}

impl DatasetConfig {
    fn new(file: &str, cleaned_file: &str, required: &[&str]) -> Self {
        Self {
            file: file.to_string(),
            cleaned_file: cleaned_file.to_string(),
            required_columns: required.iter().map(|c| c.to_string()).collect(),
            drop_columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub datasets: BTreeMap<Dataset, DatasetConfig>,
    pub date_policy: DatePolicy,
    /// Start of the post-COVID comparison window and rent index base.
    pub baseline: NaiveDate,
    /// Year averaged for the "before" side of occupancy change.
    pub pre_period_year: i32,
    /// Year splitting regional leasing into before / after; the occupancy
    /// rebound starts here too.
    pub shift_year: i32,
    pub target_industry: String,
    /// Number of industry groups kept before the rest become "Other".
    pub top_industries: usize,
    /// Number of metros shown in the ranked metro tables.
    pub top_metros: usize,
    /// Metros need more leases than this to appear in the rent table.
    pub min_metro_leases: usize,
    pub geocode_cache: PathBuf,
    pub map_metro: String,
    pub map_pin_limit: usize,
    /// States drawn next to the national unemployment average.
    pub highlight_states: Vec<String>,
    /// JSON file replacing the built-in lookup tables.
    pub lookup_tables: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut datasets = BTreeMap::new();
        datasets.insert(
            Dataset::Leases,
            DatasetConfig::new(
                "Leases.csv",
                "leases_clean.csv",
                &["market", "year", "quarter", "company_name", "rba"],
            ),
        );
        datasets.insert(
            Dataset::Occupancy,
            DatasetConfig::new(
                "Major Market Occupancy Data.csv",
                "major_market_occupancy_clean.csv",
                &["market", "year", "quarter"],
            ),
        );
        datasets.insert(
            Dataset::Price,
            DatasetConfig::new(
                "Price and Availability Data.csv",
                "price_and_availability_clean.csv",
                &["market", "year", "quarter"],
            ),
        );
        datasets.insert(
            Dataset::Unemployment,
            DatasetConfig::new(
                "Unemployment.csv",
                "unemployment_clean.csv",
                &["state", "year", "month"],
            ),
        );
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("cleaned_data"),
            datasets,
            date_policy: DatePolicy::default(),
            baseline: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            pre_period_year: 2019,
            shift_year: 2020,
            target_industry: "Construction, Engineering and Architecture".to_string(),
            top_industries: 10,
            top_metros: 10,
            min_metro_leases: 10,
            geocode_cache: PathBuf::from("nyc_geocode_cache.csv"),
            map_metro: "NYC Metro".to_string(),
            map_pin_limit: 300,
            highlight_states: ["NY", "CA", "TX", "FL"].iter().map(|s| s.to_string()).collect(),
            lookup_tables: None,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let mut config: PipelineConfig = serde_json::from_str(&text)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn normalize(&mut self) {
        for ds in self.datasets.values_mut() {
            for col in ds.required_columns.iter_mut().chain(ds.drop_columns.iter_mut()) {
                *col = normalize_label(col);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(missing) = Dataset::ALL.iter().find(|d| !self.datasets.contains_key(*d)) {
            return Err(PipelineError::Config(format!(
                "no dataset entry for `{missing}`"
            )));
        }
        if self.top_industries == 0 || self.top_metros == 0 {
            return Err(PipelineError::Config(
                "top_industries and top_metros must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn dataset(&self, dataset: Dataset) -> Result<&DatasetConfig> {
        self.datasets
            .get(&dataset)
            .ok_or_else(|| PipelineError::Config(format!("no dataset entry for `{dataset}`")))
    }

    pub fn raw_path(&self, dataset: Dataset) -> Result<PathBuf> {
        Ok(self.data_dir.join(&self.dataset(dataset)?.file))
    }

    pub fn cleaned_path(&self, dataset: Dataset) -> Result<PathBuf> {
        Ok(self.output_dir.join(&self.dataset(dataset)?.cleaned_file))
    }

    pub fn lookup_tables(&self) -> Result<LookupTables> {
        match &self.lookup_tables {
            Some(path) if !path.exists() => Err(PipelineError::MissingFile { path: path.clone() }),
            Some(path) => LookupTables::from_path(path),
            None => Ok(LookupTables::default()),
        }
    }
}
