//! Polyline representation for route geometries.
//!
//! Stores decoded coordinate sequences; decoding from the compact encoded
//! format happens at the API boundary, when a routing response comes in.

use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

/// A route geometry as decoded `(lat, lng)` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Decodes an encoded shape string. Valhalla emits precision-6 shapes;
    /// most other services emit precision 5.
    pub fn from_encoded(encoded: &str, precision: u32) -> Result<Self, UpstreamError> {
        let line = ::polyline::decode_polyline(encoded, precision)
            .map_err(|err| UpstreamError::Malformed(format!("undecodable shape: {err}")))?;

        // geo stores (x, y) = (lng, lat).
        Ok(Self {
            points: line.coords().map(|c| (c.y, c.x)).collect(),
        })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }
}
