// Cleaning and aggregation of commercial real-estate market extracts.
//
// Raw CSV extracts (leases, occupancy, price and availability,
// unemployment) are normalized and filtered into cleaned files, then loaded
// as typed records and reduced into dashboard and story tables.

pub mod aggregate;
pub mod canonical;
pub mod config;
pub mod dates;
pub mod error;
pub mod filter;
pub mod geocode;
pub mod industry;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod table;
pub mod types;
pub mod util;

pub use error::{PipelineError, Result};
