//! Data layer for the climate statistics service.
//!
//! Reads delimited climate observations into a [`climate_core::models::Dataset`],
//! selects spatial/temporal subsets of it and computes per-variable
//! statistics and timelines over those subsets.

pub mod analysis;
pub mod reader;
pub mod statistics;
pub mod subset;
pub mod timeline;

pub use climate_core as core;
