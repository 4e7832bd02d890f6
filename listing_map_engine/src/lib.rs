//! Map annotation and route caching for the listing map.
//!
//! The engine places listing and POI markers on an external map surface, keeps
//! track of every handle it gets back, and draws cached walking/driving routes
//! between a listing and its points of interest. All state lives on a single
//! event loop: external callbacks become [`MapEvent`]s that the host feeds back
//! into [`MapEngine::handle`].

pub mod config;
pub mod display_mode;
pub mod engine;
pub mod error;
pub mod markers;
pub mod osrm;
pub mod overlays;
pub mod routes;
pub mod service;
pub mod session;

#[cfg(test)]
pub mod fake;

pub use config::MapConfig;
pub use display_mode::DisplayMode;
pub use engine::{EventSink, MapEngine, MapEvent};
pub use error::{MapError, RouteError};
pub use service::{LoadState, MapService};
pub use session::{MapSession, SessionId};
