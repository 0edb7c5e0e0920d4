//! JSON-file document stores.
//!
//! Each resource is one whole JSON document, replaced atomically on save:
//! the document is written to a sibling temp file and renamed over the
//! target, so a crash mid-write leaves the previous version intact. This
//! does not serialize concurrent writers; callers must (the builder's
//! single-slot lease covers the matrix resource).

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;
use crate::matrix::DistanceMatrix;
use crate::model::OptimizedTrip;
use crate::traits::{MatrixStore, TripStore};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    fs::rename(tmp_path, path)?;
    Ok(())
}

/// File-backed store for the distance-matrix document.
#[derive(Debug, Clone)]
pub struct FileMatrixStore {
    path: PathBuf,
}

impl FileMatrixStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MatrixStore for FileMatrixStore {
    /// A missing file is an empty matrix; a corrupt file is an error rather
    /// than silently discarded data.
    fn load(&self) -> Result<DistanceMatrix, StoreError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    fn save(&self, matrix: &DistanceMatrix) -> Result<(), StoreError> {
        write_json_atomic(&self.path, matrix)
    }
}

/// File-backed store for the optimized-trip snapshot.
#[derive(Debug, Clone)]
pub struct FileTripStore {
    path: PathBuf,
}

impl FileTripStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TripStore for FileTripStore {
    fn load(&self) -> Result<Option<OptimizedTrip>, StoreError> {
        read_json(&self.path)
    }

    fn save(&self, trip: &OptimizedTrip) -> Result<(), StoreError> {
        write_json_atomic(&self.path, trip)
    }
}
