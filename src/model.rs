//! Domain types shared across the planner.
//!
//! Serde layouts match the persisted JSON documents (camelCase where the
//! on-disk schema uses it), so stores can round-trip files written by older
//! deployments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point of interest. Owned by the external point-store; this crate only
/// reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 1-based position assigned transiently by the last optimization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
}

impl Point {
    /// Coordinates as a `(lat, lng)` pair.
    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// A bare coordinate, optionally named. Used for trip origins/destinations,
/// which need not be stored points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            name: None,
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Measured cost of travelling between one pair of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairCost {
    /// Distance in kilometers.
    pub distance: f64,
    /// Duration in seconds.
    pub duration: f64,
}

/// One stop of an optimized itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedStop {
    pub lat: f64,
    pub lng: f64,
    /// 1-based position in visiting order.
    pub sequence: u32,
    pub name: String,
}

/// Snapshot of the last successful optimization. Replaced wholesale on each
/// run; never partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedTrip {
    pub origin: Location,
    pub destination: Option<Location>,
    pub round_trip: bool,
    pub optimized_order: Vec<OptimizedStop>,
    pub last_optimized: DateTime<Utc>,
}
