//! Valhalla dataset preparation helpers (download + tile build).
//!
//! Used by the docker-gated integration tests to stand up a routing engine
//! over a real region extract.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Image used both for tile building and for `valhalla_service` in tests.
pub const VALHALLA_IMAGE: &str = "ghcr.io/valhalla/valhalla";

#[derive(Debug, Clone)]
pub struct GeofabrikRegion {
    /// Geofabrik region path, e.g. "north-america/us/nevada".
    pub path: String,
}

impl GeofabrikRegion {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn name(&self) -> String {
        self.path
            .split('/')
            .next_back()
            .unwrap_or("region")
            .to_string()
    }

    pub fn url(&self) -> String {
        format!("https://download.geofabrik.de/{}-latest.osm.pbf", self.path)
    }
}

#[derive(Debug, Clone)]
pub struct ValhallaDatasetConfig {
    pub region: GeofabrikRegion,
    pub data_root: PathBuf,
}

impl ValhallaDatasetConfig {
    pub fn new(region: GeofabrikRegion, data_root: impl Into<PathBuf>) -> Self {
        Self {
            region,
            data_root: data_root.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValhallaDataset {
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    pub tiles_dir: PathBuf,
    pub pbf_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum ValhallaDataError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    ProcessFailure(String),
}

impl ValhallaDataset {
    /// Downloads the region extract and builds routing tiles, skipping any
    /// step whose output already exists.
    pub fn ensure(config: &ValhallaDatasetConfig) -> Result<Self, ValhallaDataError> {
        let region_name = config.region.name();
        let data_root = if config.data_root.is_absolute() {
            config.data_root.clone()
        } else {
            std::env::current_dir()?.join(&config.data_root)
        };
        let data_dir = data_root.join(region_name);
        fs::create_dir_all(&data_dir)?;

        let pbf_name = format!("{}-latest.osm.pbf", config.region.name());
        let pbf_path = data_dir.join(&pbf_name);
        if !pbf_path.exists() {
            download_pbf(&config.region.url(), &pbf_path)?;
        }

        let config_path = data_dir.join("valhalla.json");
        if !config_path.exists() {
            run_docker(
                &[
                    "sh",
                    "-c",
                    "valhalla_build_config \
                     --mjolnir-tile-dir /data/valhalla_tiles \
                     --mjolnir-tile-extract /data/valhalla_tiles.tar \
                     > /data/valhalla.json",
                ],
                &data_dir,
            )?;
        }

        let tiles_dir = data_dir.join("valhalla_tiles");
        if !tiles_dir.exists() {
            run_docker(
                &[
                    "valhalla_build_tiles",
                    "-c",
                    "/data/valhalla.json",
                    &format!("/data/{pbf_name}"),
                ],
                &data_dir,
            )?;
        }

        Ok(Self {
            data_dir,
            config_path,
            tiles_dir,
            pbf_path,
        })
    }
}

fn download_pbf(url: &str, dest: &Path) -> Result<(), ValhallaDataError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    let bytes = response.bytes()?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}

fn run_docker(args: &[&str], data_dir: &Path) -> Result<(), ValhallaDataError> {
    let status = Command::new("docker")
        .arg("run")
        .arg("--rm")
        .arg("-t")
        .arg("-v")
        .arg(format!("{}:/data", data_dir.display()))
        .arg(format!("{VALHALLA_IMAGE}:latest"))
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(ValhallaDataError::ProcessFailure(format!(
            "docker exited with status {status}"
        )))
    }
}
