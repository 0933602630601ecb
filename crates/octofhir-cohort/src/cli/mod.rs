//! CLI functionality for the cohort tool
//!
//! This module contains all CLI-related functionality including:
//! - Data, filter, cohort and config file loading
//! - Type inference and column statistics
//! - Filter validation
//! - Cohort building and comparison
//! - Output formatting

pub mod build;
pub mod compare;
pub mod infer;
pub mod loader;
pub mod output;
pub mod stats;
pub mod validate;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber; `RUST_LOG` wins over the verbosity flag
///
/// Records emitted through the `log` facade by the library crates are
/// forwarded to the subscriber.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
