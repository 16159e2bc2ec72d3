//! Metrics collection and export for spamguard.
//!
//! Crates record through the `metrics` facade behind their own `metrics`
//! feature. When the `prometheus` feature is enabled here, [`init_metrics`]
//! installs a Prometheus exporter with an HTTP scrape endpoint.
//!
//! ```rust,ignore
//! use spamguard_metrics::{counter, moderation};
//!
//! counter!(moderation::VERDICTS_TOTAL, "verdict" => "spam").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
