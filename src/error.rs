//! Error types for the TSP genetic solver.

use std::io;

/// Errors raised while loading cities, configuring a run, or exporting results.
///
/// Broken chromosome invariants are not represented here: they indicate a bug
/// in the genetic operators and abort with a panic instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("city set is empty")]
    EmptyCities,
    #[error("population size must be at least 1")]
    ZeroPopulation,
    #[error("mutation rate must be within [0, 1], got {0}")]
    MutationRateOutOfRange(f64),
    #[error("invalid tour: {0}")]
    InvalidTour(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
