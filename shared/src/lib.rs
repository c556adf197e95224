#![warn(clippy::all)]

mod customer;
pub use customer::Customer;

mod facility;
pub use facility::Facility;

mod instance;
pub use instance::Instance;

mod config;
pub use config::DecompositionConfig;
pub use config::LowerBound;

mod error;
pub use error::LoadError;

#[cfg(feature = "perf_statistics")]
mod print_metrics;
use flate2::read::GzDecoder;
#[cfg(feature = "perf_statistics")]
pub use print_metrics::setup_metrics_printer;
use std::fs::File;
use std::io::Read;

extern crate csv;
extern crate indexmap;

pub type FacilityId = u32;
pub type CustomerId = u32;

pub fn get_reader(path: &str) -> Result<Box<dyn Read>, LoadError> {
    let file = File::open(path)?;
    if path.ends_with(".gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

// ids in the input files may carry a prefix, e.g. "f12" or "c3"
pub(crate) fn parse_id(raw: &str) -> Result<u32, LoadError> {
    raw.trim()
        .trim_start_matches(|c: char| c.is_alphabetic())
        .parse::<u32>()
        .map_err(|_| LoadError::Parse(format!("invalid id '{}'", raw)))
}

pub(crate) fn parse_float(raw: &str, what: &str) -> Result<f64, LoadError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| LoadError::Parse(format!("invalid {} '{}'", what, raw)))
}

pub(crate) fn column_position(
    headers: &csv::StringRecord,
    name: &str,
) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|x| x.trim() == name)
        .ok_or_else(|| LoadError::Parse(format!("missing column '{}'", name)))
}
