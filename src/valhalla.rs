//! Valhalla HTTP adapter: per-pair distance lookups and full-route planning.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UpstreamError;
use crate::model::PairCost;
use crate::polyline::Polyline;
use crate::traits::{DistanceProvider, PlannedRoute, RoutePlanner};

/// Valhalla encodes leg shapes at 6-decimal polyline precision.
const SHAPE_PRECISION: u32 = 6;

#[derive(Debug, Clone)]
pub struct ValhallaConfig {
    pub base_url: String,
    pub costing: String,
    /// Timeout for single-pair distance lookups. Full-route calls use the
    /// client default.
    pub distance_timeout_secs: u64,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            costing: "auto".to_string(),
            distance_timeout_secs: 30,
        }
    }
}

impl ValhallaConfig {
    /// Defaults with the base URL taken from `VALHALLA_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("VALHALLA_URL") {
            config.base_url = url;
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct ValhallaClient {
    config: ValhallaConfig,
    distance_client: reqwest::blocking::Client,
    route_client: reqwest::blocking::Client,
}

impl ValhallaClient {
    pub fn new(config: ValhallaConfig) -> Result<Self, reqwest::Error> {
        let distance_client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.distance_timeout_secs))
            .build()?;
        let route_client = reqwest::blocking::Client::builder().build()?;

        Ok(Self {
            config,
            distance_client,
            route_client,
        })
    }

    fn route_call(
        &self,
        client: &reqwest::blocking::Client,
        locations: &[(f64, f64)],
        units: &str,
    ) -> Result<Value, UpstreamError> {
        let body = RouteRequest {
            locations: locations
                .iter()
                .map(|&(lat, lng)| WireLocation { lat, lon: lng })
                .collect(),
            costing: &self.config.costing,
            directions_options: DirectionsOptions { units },
        };

        let raw = client
            .post(format!("{}/route", self.config.base_url))
            .json(&body)
            .send()?
            .error_for_status()?
            .json::<Value>()?;

        Ok(raw)
    }
}

impl DistanceProvider for ValhallaClient {
    fn pair_cost(&self, from: (f64, f64), to: (f64, f64)) -> Result<PairCost, UpstreamError> {
        let raw = self.route_call(&self.distance_client, &[from, to], "kilometers")?;
        let trip = parse_trip(&raw)?;

        Ok(PairCost {
            distance: trip.summary.length,
            duration: trip.summary.time,
        })
    }
}

impl RoutePlanner for ValhallaClient {
    fn plan_route(&self, waypoints: &[(f64, f64)]) -> Result<PlannedRoute, UpstreamError> {
        let raw = self.route_call(&self.route_client, waypoints, "miles")?;
        let trip = parse_trip(&raw)?;

        let geometry = trip
            .legs
            .iter()
            .filter_map(|leg| leg.shape.as_deref())
            .map(|shape| Polyline::from_encoded(shape, SHAPE_PRECISION))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PlannedRoute {
            distance: trip.summary.length,
            duration: trip.summary.time,
            geometry,
            raw,
        })
    }
}

fn parse_trip(raw: &Value) -> Result<TripBody, UpstreamError> {
    let trip = raw
        .get("trip")
        .cloned()
        .ok_or_else(|| UpstreamError::Malformed("response has no trip".to_string()))?;
    serde_json::from_value(trip).map_err(|err| UpstreamError::Malformed(err.to_string()))
}

#[derive(Debug, Serialize)]
struct RouteRequest<'a> {
    locations: Vec<WireLocation>,
    costing: &'a str,
    directions_options: DirectionsOptions<'a>,
}

#[derive(Debug, Serialize)]
struct WireLocation {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct DirectionsOptions<'a> {
    units: &'a str,
}

#[derive(Debug, Deserialize)]
struct TripBody {
    summary: TripSummary,
    #[serde(default)]
    legs: Vec<TripLeg>,
}

#[derive(Debug, Deserialize)]
struct TripSummary {
    length: f64,
    time: f64,
}

#[derive(Debug, Deserialize)]
struct TripLeg {
    shape: Option<String>,
}
