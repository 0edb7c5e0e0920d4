//! Haversine distance provider (fallback when no routing engine is
//! reachable).
//!
//! Uses great-circle distance and an assumed driving speed. Less accurate
//! than a real routing engine (ignores roads) but always available, and
//! never fails, which also makes it the natural provider for tests.

use crate::error::UpstreamError;
use crate::model::PairCost;
use crate::traits::DistanceProvider;

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone)]
pub struct HaversineEstimator {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineEstimator {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Great-circle distance between two `(lat, lng)` points in kilometers.
    fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    fn km_to_seconds(&self, km: f64) -> f64 {
        km / self.speed_kmh * 3600.0
    }
}

impl DistanceProvider for HaversineEstimator {
    fn pair_cost(&self, from: (f64, f64), to: (f64, f64)) -> Result<PairCost, UpstreamError> {
        let km = Self::haversine_km(from, to);
        Ok(PairCost {
            distance: km,
            duration: self.km_to_seconds(km),
        })
    }
}
