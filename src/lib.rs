//! trip-planner core
//!
//! Distance-matrix cache and trip-optimization orchestration for multi-stop
//! itineraries. External collaborators (TSP solver, routing engine, point
//! store) are reached through the seams in [`traits`].

pub mod traits;
pub mod model;
pub mod error;
pub mod matrix;
pub mod store;
pub mod builder;
pub mod optimizer;
pub mod valhalla;
pub mod valhalla_data;
pub mod vroom;
pub mod haversine;
pub mod polyline;
