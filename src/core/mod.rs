//! Core types shared across the preprocessing stage.
//!
//! This module contains:
//! - Error handling for construction-time contract checks
//! - Parallel processing configuration
//!
//! It also re-exports the commonly used types for convenience.

pub mod config;
pub mod errors;

pub use config::ParallelPolicy;
pub use errors::ReorderError;
