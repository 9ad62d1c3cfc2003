// Market and metro canonicalization.
//
// Raw market, city and state strings differ between source files, so every
// mapping here is driven by [`LookupTables`]: static data loaded once at
// startup, either the built-in defaults or a JSON file with the same shape.
// Lookups are case-insensitive and whitespace-trimmed; anything not in a
// table falls back to a title-cased label instead of failing.

use crate::error::Result;
use crate::industry::IndustryRule;
use crate::types::Dataset;
use crate::util::title_case;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// A label together with the raw spellings that map to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasGroup {
    pub label: String,
    pub aliases: Vec<String>,
}

impl AliasGroup {
    fn new(label: &str, aliases: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// All static mapping data used by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupTables {
    /// Per-dataset raw market name → short market code.
    pub markets: BTreeMap<Dataset, BTreeMap<String, String>>,
    /// City → metro area. Earlier groups win when a city appears twice.
    pub metros: Vec<AliasGroup>,
    /// State code → broad region.
    pub regions: Vec<AliasGroup>,
    /// Occupancy market → comparison group for the rebound relation.
    #[serde(default)]
    pub market_groups: Vec<AliasGroup>,
    /// Metro → cost-of-living multiplier; metros not listed use 1.0.
    pub cost_of_living: BTreeMap<String, f64>,
    /// Industry keyword rules in priority order.
    pub industries: Vec<IndustryRule>,
}

static DEFAULT_TABLES: Lazy<LookupTables> = Lazy::new(LookupTables::builtin);

impl Default for LookupTables {
    fn default() -> Self {
        DEFAULT_TABLES.clone()
    }
}

fn code_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(raw, code)| (raw.to_string(), code.to_string()))
        .collect()
}

impl LookupTables {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn builtin() -> Self {
        let mut markets = BTreeMap::new();
        markets.insert(
            Dataset::Price,
            code_map(&[
                ("Houston", "HOU"),
                ("Dallas-Ft. Worth", "DFW"),
                ("Austin", "AUS"),
                ("Atlanta", "ATL"),
                ("Phoenix", "PHX"),
                ("Los Angeles", "LA"),
                ("San Francisco", "SF"),
            ]),
        );
        markets.insert(
            Dataset::Leases,
            code_map(&[
                ("Houston", "HOU"),
                ("Dallas/Ft Worth", "DFW"),
                ("Austin", "AUS"),
                ("Atlanta", "ATL"),
                ("Phoenix", "PHX"),
                ("Los Angeles", "LA"),
                ("San Francisco", "SF"),
            ]),
        );
        markets.insert(
            Dataset::Occupancy,
            code_map(&[
                ("Houston", "HOU"),
                ("Dallas/Ft Worth", "DFW"),
                ("Austin", "AUS"),
                ("Los Angeles", "LA"),
                ("San Francisco", "SF"),
            ]),
        );

        let metros = vec![
            AliasGroup::new(
                "NYC Metro",
                &["new york", "manhattan", "brooklyn", "queens", "nyc", "bronx", "staten island"],
            ),
            AliasGroup::new(
                "SF Bay Area",
                &[
                    "san francisco", "sf", "south bay/san jose", "oakland", "san jose",
                    "berkeley", "palo alto", "mountain view", "redwood city", "menlo park",
                    "cupertino", "fremont", "milpitas", "santa clara", "sunnyvale", "san mateo",
                    "foster city", "burlingame", "san bruno", "daly city", "san leandro",
                    "hayward", "union city", "alameda",
                ],
            ),
            AliasGroup::new(
                "LA Metro",
                &[
                    "los angeles", "beverly hills", "santa monica", "west hollywood",
                    "culver city", "pasadena", "long beach", "glendale", "burbank", "inglewood",
                    "el segundo", "redondo beach", "hermosa beach", "manhattan beach",
                    "hawthorne", "torrance", "gardena", "compton", "carson", "san pedro",
                    "venice", "marina del rey", "malibu", "encino", "sherman oaks",
                    "studio city", "van nuys", "north hollywood", "reseda", "woodland hills",
                    "calabasas", "agoura hills", "thousand oaks",
                ],
            ),
            AliasGroup::new(
                "Chicago Metro",
                &[
                    "chicago", "evanston", "oak park", "skokie", "naperville", "aurora",
                    "wheaton", "oak brook", "schaumburg", "elgin", "joliet",
                    "arlington heights", "des plaines", "cicero", "berwyn",
                ],
            ),
            AliasGroup::new(
                "Houston Metro",
                &["houston", "sugar land", "the woodlands", "katy", "pasadena", "pearland", "baytown"],
            ),
            AliasGroup::new(
                "Dallas Metro",
                &[
                    "dallas", "fort worth", "plano", "irving", "arlington", "garland",
                    "grand prairie", "mckinney", "frisco", "richardson", "lewisville",
                    "carrollton", "allen", "flower mound",
                ],
            ),
            AliasGroup::new(
                "Atlanta Metro",
                &[
                    "atlanta", "marietta", "alpharetta", "roswell", "sandy springs",
                    "johns creek", "lawrenceville",
                ],
            ),
            AliasGroup::new(
                "DC Metro",
                &[
                    "washington d.c.", "arlington", "alexandria", "bethesda", "silver spring",
                    "rockville", "falls church", "tysons", "mclean",
                ],
            ),
            AliasGroup::new(
                "Miami Metro",
                &[
                    "miami", "fort lauderdale", "hollywood", "hialeah", "aventura",
                    "coral gables", "miami beach", "doral", "homestead",
                ],
            ),
            AliasGroup::new(
                "Boston Metro",
                &[
                    "boston", "cambridge", "somerville", "brookline", "newton", "quincy",
                    "waltham", "malden",
                ],
            ),
            AliasGroup::new(
                "Philadelphia Metro",
                &[
                    "philadelphia", "camden", "cherry hill", "king of prussia", "norristown",
                    "conshohocken", "ardmore",
                ],
            ),
        ];

        let regions = vec![
            AliasGroup::new(
                "Sun Belt",
                &["TX", "FL", "GA", "AZ", "NC", "SC", "TN", "NV", "AL", "OK", "AR", "LA", "MS"],
            ),
            AliasGroup::new("Legacy", &["NY", "IL", "CA", "MA", "NJ", "PA", "OH", "MI"]),
        ];

        let market_groups = vec![
            AliasGroup::new(
                "Sunbelt",
                &["Austin", "Dallas/Ft Worth", "Houston", "Atlanta", "Charlotte", "Nashville"],
            ),
            AliasGroup::new(
                "Coastal",
                &[
                    "Manhattan", "Los Angeles", "San Francisco", "South Bay/San Jose",
                    "Philadelphia", "Washington D.C.",
                ],
            ),
        ];

        let cost_of_living = [
            ("NYC Metro", 1.25),
            ("LA Metro", 1.18),
            ("Chicago Metro", 1.0),
            ("Houston Metro", 0.95),
            ("Dallas Metro", 0.97),
            ("Atlanta Metro", 0.93),
            ("DC Metro", 1.15),
            ("SF Bay Area", 1.27),
            ("Boston Metro", 1.22),
            ("Miami Metro", 1.08),
        ]
        .iter()
        .map(|(m, v)| (m.to_string(), *v))
        .collect();

        Self {
            markets,
            metros,
            regions,
            market_groups,
            cost_of_living,
            industries: IndustryRule::defaults(),
        }
    }
}

fn lookup_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Label used when a raw value has no table entry.
pub fn fallback_label(raw: &str) -> String {
    title_case(&lookup_key(raw))
}

fn alias_index(groups: &[AliasGroup]) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for group in groups {
        for alias in &group.aliases {
            index
                .entry(lookup_key(alias))
                .or_insert_with(|| group.label.clone());
        }
    }
    index
}

/// Case-insensitive view over [`LookupTables`].
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    markets: HashMap<Dataset, HashMap<String, String>>,
    metros: HashMap<String, String>,
    regions: HashMap<String, String>,
    market_groups: HashMap<String, String>,
    cost_of_living: HashMap<String, f64>,
}

impl Canonicalizer {
    pub fn new(tables: &LookupTables) -> Self {
        let markets = tables
            .markets
            .iter()
            .map(|(dataset, map)| {
                let lowered = map
                    .iter()
                    .map(|(raw, code)| (lookup_key(raw), code.clone()))
                    .collect();
                (*dataset, lowered)
            })
            .collect();
        Self {
            markets,
            metros: alias_index(&tables.metros),
            regions: alias_index(&tables.regions),
            market_groups: alias_index(&tables.market_groups),
            cost_of_living: tables
                .cost_of_living
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    /// Strict lookup: `None` when the dataset table has no entry.
    pub fn lookup(&self, dataset: Dataset, raw: &str) -> Option<&str> {
        self.markets
            .get(&dataset)?
            .get(&lookup_key(raw))
            .map(String::as_str)
    }

    pub fn canonicalize(&self, dataset: Dataset, raw: &str) -> String {
        match self.lookup(dataset, raw) {
            Some(code) => code.to_string(),
            None => {
                debug!(%dataset, raw, "unmapped market, using fallback label");
                fallback_label(raw)
            }
        }
    }

    /// Metro area for a lease city.
    pub fn metro(&self, city: Option<&str>) -> String {
        let Some(city) = city else {
            return "Unknown".to_string();
        };
        match self.metros.get(&lookup_key(city)) {
            Some(metro) => metro.clone(),
            None => fallback_label(city),
        }
    }

    pub fn region(&self, state: Option<&str>) -> &str {
        state
            .and_then(|s| self.regions.get(&lookup_key(s)))
            .map(String::as_str)
            .unwrap_or("Other")
    }

    /// Comparison group of a raw occupancy market, if it belongs to one.
    pub fn market_group(&self, market: &str) -> Option<&str> {
        self.market_groups
            .get(&lookup_key(market))
            .map(String::as_str)
    }

    pub fn cost_of_living(&self, metro: &str) -> f64 {
        self.cost_of_living.get(metro).copied().unwrap_or(1.0)
    }
}
