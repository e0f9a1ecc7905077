//! Runtime layer for the climate statistics service.
//!
//! Owns the active dataset and exposes the boundary operations (load, list
//! variables, query, timeline) plus cancellable background reloads.

pub mod dataset_store;
pub mod service;

pub use climate_core as core;
pub use climate_data as data;
