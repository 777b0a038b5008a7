//! stemflow core - backend logic for the stemflow pipeline
//!
//! Fetches or opens an audio source, logs its tempo and key, transcodes
//! it to MP3 and splits it into stems. This crate has zero UI
//! dependencies; front ends drive it through `orchestrator` and consume
//! the `models::JobEvent` stream.

pub mod acquisition;
pub mod analysis;
pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod runner;
pub mod tools;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
