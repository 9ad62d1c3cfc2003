// Shared data types: raw rows, typed records and report rows.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// The four source extracts the pipeline knows how to clean.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Leases,
    Occupancy,
    Price,
    Unemployment,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::Occupancy,
        Dataset::Price,
        Dataset::Unemployment,
        Dataset::Leases,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Leases => "leases",
            Dataset::Occupancy => "occupancy",
            Dataset::Price => "price",
            Dataset::Unemployment => "unemployment",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Raw rows as they come out of the cleaned tables. Every field is optional
// text; parsing happens in the loader.

#[derive(Debug, Deserialize)]
pub struct RawOccupancyRow {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub quarter: Option<String>,
    #[serde(default)]
    pub occupancy_proportion: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPriceRow {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub quarter: Option<String>,
    #[serde(default)]
    pub overall_rent: Option<String>,
    #[serde(default)]
    pub leasing: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawLeaseRow {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub internal_industry: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub quarter: Option<String>,
    #[serde(default)]
    pub leasedsf: Option<String>,
    #[serde(default)]
    pub overall_rent: Option<String>,
    #[serde(default)]
    pub available_space: Option<String>,
    #[serde(default)]
    pub leasing: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawUnemploymentRow {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub unemployment_rate: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyRecord {
    pub market: String,
    pub year: i32,
    pub quarter: u32,
    pub date: NaiveDate,
    pub occupancy_proportion: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub market: String,
    pub region: Option<String>,
    pub year: i32,
    pub date: NaiveDate,
    pub overall_rent: Option<f64>,
    pub leasing: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaseRecord {
    pub market: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub year: i32,
    pub quarter: u32,
    pub date: NaiveDate,
    pub leased_sf: Option<f64>,
    pub overall_rent: Option<f64>,
    pub available_space: Option<f64>,
    pub leasing: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnemploymentRecord {
    pub state: String,
    pub year: i32,
    pub month: u32,
    pub date: NaiveDate,
    pub unemployment_rate: Option<f64>,
}

// Report rows. Numeric columns are pre-formatted strings, as the console
// preview and the exported CSV show the same text.

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SeriesRow {
    #[serde(rename = "Market")]
    #[tabled(rename = "Market")]
    pub market: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OccupancyRow {
    #[serde(rename = "Market")]
    #[tabled(rename = "Market")]
    pub market: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Occupancy")]
    #[tabled(rename = "Occupancy")]
    pub occupancy: String,
    #[serde(rename = "Occupancy2y")]
    #[tabled(rename = "Occupancy2y")]
    pub occupancy_ma_2y: String,
    #[serde(rename = "Occupancy3y")]
    #[tabled(rename = "Occupancy3y")]
    pub occupancy_ma_3y: String,
    #[serde(rename = "Selected")]
    #[tabled(rename = "Selected")]
    pub selected: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MetroRentRow {
    #[serde(rename = "Metro")]
    #[tabled(rename = "Metro")]
    pub metro: String,
    #[serde(rename = "AvgRent")]
    #[tabled(rename = "AvgRent")]
    pub avg_rent: String,
    #[serde(rename = "LeaseCount")]
    #[tabled(rename = "LeaseCount")]
    pub lease_count: usize,
    #[serde(rename = "CostOfLiving")]
    #[tabled(rename = "CostOfLiving")]
    pub cost_of_living: String,
    #[serde(rename = "IndexedRent")]
    #[tabled(rename = "IndexedRent")]
    pub indexed_rent: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionLeasingRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Quarter")]
    #[tabled(rename = "Quarter")]
    pub quarter: String,
    #[serde(rename = "Leasing")]
    #[tabled(rename = "Leasing")]
    pub leasing: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionYearRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "AvgLeasing")]
    #[tabled(rename = "AvgLeasing")]
    pub leasing: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupedSeriesRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Market")]
    #[tabled(rename = "Market")]
    pub market: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MapPinRow {
    #[serde(rename = "Address")]
    #[tabled(rename = "Address")]
    pub address: String,
    #[serde(rename = "Company")]
    #[tabled(rename = "Company")]
    pub company: String,
    #[serde(rename = "IndustryGroup")]
    #[tabled(rename = "IndustryGroup")]
    pub industry_group: String,
    #[serde(rename = "Lat")]
    #[tabled(rename = "Lat")]
    pub lat: f64,
    #[serde(rename = "Lon")]
    #[tabled(rename = "Lon")]
    pub lon: f64,
}

/// Headline facts for the current dashboard filter.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Insights {
    pub most_affordable_market: Option<(String, f64)>,
    pub highest_occupancy_market: Option<(String, f64)>,
    pub most_active_market: Option<(String, f64)>,
}
