//! BIDFEED — simulated real-time bidding feed for an ad-campaign agent
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod campaign;
pub mod engine;
pub mod dashboard;
