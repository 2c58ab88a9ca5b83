//! Plant Diagnostics
//!
//! Invisible-waste analysis, machine health evaluation and pipe leak
//! detection for water/production facilities.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod machines;
pub mod models;
pub mod network;
pub mod waste;

pub use config::Config;
pub use error::{DiagnosticsError, Result};

/// Round half away from zero to `places` decimals.
///
/// Ties are decided on the scaled binary value, so a `.xx5` figure may land
/// one unit away from a correctly rounded half-to-even result.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Initialize logging; `RUST_LOG` overrides the default level
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
