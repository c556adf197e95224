#![deny(clippy::all)]
#![allow(clippy::neg_cmp_op_on_partial_ord)]

pub mod callback;
pub mod cuts;
pub mod master;
pub mod statistics;
pub mod subproblem;

mod error;
pub use error::SolveError;

#[cfg(feature = "perf_statistics")]
mod metrics;

extern crate shared;
#[macro_use] extern crate rust_hawktracer;

/// Facility values strictly above this count as open when reading a binary candidate.
pub const OPEN_THRESHOLD: f64 = 0.5;
