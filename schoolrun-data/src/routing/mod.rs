//! Coordinate refinement through an OSRM routing service.
//!
//! This module provides [`OsrmNearestClient`], an implementation of
//! [`schoolrun_core::RoadSnapper`] and [`schoolrun_core::PlaceNamer`] backed
//! by OSRM's Nearest API. Snapping moves a stop onto the closest street;
//! naming reports that street's name.
//!
//! # Architecture
//!
//! The refinement traits are synchronous so the optimisation engine stays
//! free of async runtimes. The client blocks on async HTTP calls internally,
//! spaces requests by a minimum interval and retries transient failures.
//! Every failure is returned to the engine, which keeps raw coordinates and
//! generated names for the affected stops.
//!
//! # Example
//!
//! ```no_run
//! use geo::Coord;
//! use std::time::Duration;
//! use schoolrun_core::PlaceNamer;
//! use schoolrun_data::routing::{OsrmClientConfig, OsrmNearestClient};
//!
//! let config = OsrmClientConfig::new("http://localhost:5000")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_min_request_interval(Duration::from_millis(100));
//! let client = OsrmNearestClient::with_config(config)?;
//!
//! let names = client.name_places(&[Coord { x: 14.42, y: 50.08 }])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod osrm;
mod provider;
mod throttle;

#[doc(hidden)]
pub mod test_support;

pub use provider::{ClientBuildError, DEFAULT_USER_AGENT, OsrmClientConfig, OsrmNearestClient};
