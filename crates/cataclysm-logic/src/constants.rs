//! Simulation constants: resource names, recovery tuning, run defaults.
//!
//! Resource names are plain `&str` constants. Catalogs and initial states
//! are free to use names outside this list; these are the ones the
//! built-in catalog and default ecosystem refer to.

pub mod resources {
    pub const VEGETATION: &str = "vegetation";
    pub const FAUNA: &str = "fauna";
    pub const POPULATION: &str = "population";
    pub const TEMPERATURE: &str = "temperature";
    pub const INFRASTRUCTURE: &str = "infrastructure";

    /// All resource names known to the built-in catalog, in display order.
    pub const ALL: [&str; 5] = [VEGETATION, FAUNA, POPULATION, TEMPERATURE, INFRASTRUCTURE];
}

/// Multiplier applied to a resource's level when its recovery timer expires.
pub const RECOVERY_BOOST: f64 = 1.5;

/// Upper bound on a level produced by a recovery boost.
pub const RECOVERY_CAP: f64 = 100.0;

/// Decimal places kept after an impact is applied.
pub const IMPACT_PRECISION: i32 = 2;

/// Cycle count of the default run (one simulated month of days).
pub const DEFAULT_CYCLES: u32 = 30;

/// Seed of the default run.
pub const DEFAULT_SEED: u64 = 42;

/// Initial levels of the default ecosystem.
pub const DEFAULT_LEVELS: [(&str, f64); 5] = [
    (resources::VEGETATION, 100.0),
    (resources::FAUNA, 100.0),
    (resources::POPULATION, 100.0),
    (resources::TEMPERATURE, 20.0),
    (resources::INFRASTRUCTURE, 100.0),
];
