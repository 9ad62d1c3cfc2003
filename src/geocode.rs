// Read-only view of the address → coordinates cache written by the
// external geocoding job.
use crate::error::Result;
use crate::util::parse_f64_safe;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct CacheRow {
    address: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    coords: HashMap<String, (f64, f64)>,
}

impl GeocodeCache {
    /// Load `address,lat,lon` rows. A missing file is an empty cache and
    /// later rows win for repeated addresses.
    pub fn load(path: &Path) -> Result<Self> {
        let mut cache = GeocodeCache::default();
        if !path.exists() {
            info!(path = %path.display(), "no geocode cache yet");
            return Ok(cache);
        }
        let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
        let mut skipped = 0usize;
        for result in rdr.deserialize::<CacheRow>() {
            let row = match result {
                Ok(r) => r,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            let (Some(address), Some(lat), Some(lon)) = (
                row.address,
                parse_f64_safe(row.lat.as_deref()),
                parse_f64_safe(row.lon.as_deref()),
            ) else {
                skipped += 1;
                continue;
            };
            cache.coords.insert(address, (lat, lon));
        }
        debug!(entries = cache.coords.len(), skipped, "loaded geocode cache");
        Ok(cache)
    }

    pub fn insert(&mut self, address: impl Into<String>, lat: f64, lon: f64) {
        self.coords.insert(address.into(), (lat, lon));
    }

    pub fn get(&self, address: &str) -> Option<(f64, f64)> {
        self.coords.get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// An item with cached coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin<T> {
    pub item: T,
    pub lat: f64,
    pub lon: f64,
}

/// Inner join of `(address, item)` pairs against the cache, keeping the
/// first `limit` matches in input order.
pub fn join_cached<'s, T>(
    items: impl IntoIterator<Item = (&'s str, T)>,
    cache: &GeocodeCache,
    limit: usize,
) -> Vec<Pin<T>> {
    items
        .into_iter()
        .filter_map(|(address, item)| {
            let (lat, lon) = cache.get(address)?;
            Some(Pin { item, lat, lon })
        })
        .take(limit)
        .collect()
}
