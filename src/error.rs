//! Error taxonomy.
//!
//! Three families: persistence (`StoreError`), external services
//! (`UpstreamError`), and the two operations composed from them
//! (`BuildError`, `OptimizeError`). Malformed upstream bodies are treated
//! the same as transport failures.

use thiserror::Error;

/// Persistence failures from the JSON-document stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store document malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures from the distance, solver, or routing services.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream response malformed: {0}")]
    Malformed(String),
}

/// Failures triggering or checkpointing a matrix build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A build already holds the single-slot lease for this point set.
    #[error("a matrix build is already in progress for this point set")]
    InProgress,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-stage failures of the optimization pipeline.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Caller-correctable precondition: build the matrix first.
    #[error("distance matrix incomplete: {calculated}/{total} pairs calculated")]
    MatrixIncomplete { calculated: usize, total: usize },
    #[error("solver failed: {0}")]
    Solver(#[source] UpstreamError),
    #[error("routing failed: {0}")]
    Routing(#[source] UpstreamError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
