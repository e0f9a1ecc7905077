//! Shared domain layer for the climate statistics workspace.
//!
//! Holds the error type, the data model, static variable tables, cell
//! parsing, calendar helpers, statistics primitives and CLI settings. Nothing
//! in this crate performs I/O beyond reading command-line arguments.

pub mod error;
pub mod models;
pub mod parsing;
pub mod settings;
pub mod stats;
pub mod time_utils;
pub mod variables;

pub use error::{ClimateError, Result};
