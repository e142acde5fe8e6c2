//! Error types for catalog and run configuration.
//!
//! The simulation itself has no runtime failure modes. Everything here is
//! a configuration problem surfaced when a catalog or config is built.

use thiserror::Error;

/// Rejections raised while constructing disruption events or catalogs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Disruption event name cannot be empty")]
    EmptyName,

    #[error("Event '{event}' has probability {value}, expected a value in [0.0, 1.0]")]
    ProbabilityOutOfRange { event: String, value: f64 },

    #[error("Event '{event}' impacts '{resource}' by {factor}, expected a factor in [0.0, 1.0]")]
    ImpactOutOfRange {
        event: String,
        resource: String,
        factor: f64,
    },

    #[error("Event '{event}' schedules recovery of '{resource}' after 0 cycles")]
    ZeroRecoveryDelay { event: String, resource: String },

    #[error("Catalog already contains an event named '{name}'")]
    DuplicateEvent { name: String },
}

/// Run configuration problem found by [`crate::driver::SimulationConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Cycle count must be at least 1")]
    ZeroCycles,

    #[error("Initial ecosystem has no resources")]
    EmptyInitialState,

    #[error("Initial level of '{resource}' is {value}, expected a finite non-negative number")]
    InvalidInitialLevel { resource: String, value: f64 },
}
