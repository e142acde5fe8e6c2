//! Simulation driver: sequences disruption, recovery and reporting.
//!
//! Each cycle runs three steps in a fixed order:
//!
//! 1. [`DisruptionEngine::run_cycle`]: draw, fire, apply, schedule
//! 2. [`RecoveryScheduler::run_cycle`]: tick timers, restore
//! 3. hand a [`CycleReport`] to the [`CycleObserver`]
//!
//! The driver never formats or prints; observers decide what to do with
//! each report.
//!
//! ```
//! use cataclysm_logic::disruption::Catalog;
//! use cataclysm_logic::driver::{SimulationConfig, SimulationDriver};
//!
//! let config = SimulationConfig::default();
//! let reports = SimulationDriver::new()
//!     .run_with_config(&config, &Catalog::standard())
//!     .unwrap();
//! assert_eq!(reports.len(), 30);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CYCLES, DEFAULT_LEVELS, DEFAULT_SEED};
use crate::disruption::Catalog;
use crate::engine::{DisruptionEngine, FiredDisruption};
use crate::error::ConfigError;
use crate::recovery::RecoveryScheduler;
use crate::rng::{SimRng, UniformSource};
use crate::state::{ResourceState, Restoration, Snapshot};

/// Everything that happened in one cycle, plus the settled levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// 1-based cycle index.
    pub cycle: u32,
    pub fired: Vec<FiredDisruption>,
    pub restored: Vec<Restoration>,
    pub snapshot: Snapshot,
}

impl CycleReport {
    pub fn is_quiet(&self) -> bool {
        self.fired.is_empty() && self.restored.is_empty()
    }
}

/// Receives each cycle's report as soon as the cycle settles.
pub trait CycleObserver {
    fn on_cycle(&mut self, report: &CycleReport);
}

impl<F: FnMut(&CycleReport)> CycleObserver for F {
    fn on_cycle(&mut self, report: &CycleReport) {
        self(report)
    }
}

/// Run parameters: cycle count, seed, and initial ecosystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub cycles: u32,
    pub seed: u64,
    pub initial_levels: BTreeMap<String, f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cycles: DEFAULT_CYCLES,
            seed: DEFAULT_SEED,
            initial_levels: DEFAULT_LEVELS
                .iter()
                .map(|&(name, level)| (name.to_string(), level))
                .collect(),
        }
    }
}

impl SimulationConfig {
    /// Return every problem with this config; empty means runnable.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.cycles == 0 {
            errors.push(ConfigError::ZeroCycles);
        }
        if self.initial_levels.is_empty() {
            errors.push(ConfigError::EmptyInitialState);
        }
        for (resource, &value) in &self.initial_levels {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::InvalidInitialLevel {
                    resource: resource.clone(),
                    value,
                });
            }
        }
        errors
    }

    pub fn initial_state(&self) -> ResourceState {
        ResourceState::new(
            self.initial_levels
                .iter()
                .map(|(name, &level)| (name.clone(), level)),
        )
    }

    pub fn rng(&self) -> SimRng {
        SimRng::from_seed_u64(self.seed)
    }
}

/// Orchestrates disruption and recovery over a number of cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationDriver {
    engine: DisruptionEngine,
    scheduler: RecoveryScheduler,
}

impl SimulationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a single cycle: disruption first, recovery second.
    pub fn step<R>(
        &self,
        cycle: u32,
        state: &mut ResourceState,
        catalog: &Catalog,
        rng: &mut R,
    ) -> CycleReport
    where
        R: UniformSource + ?Sized,
    {
        let fired = self.engine.run_cycle(state, catalog, rng);
        let restored = self.scheduler.run_cycle(state);
        CycleReport {
            cycle,
            fired,
            restored,
            snapshot: state.snapshot(),
        }
    }

    /// Run cycles `1..=cycles`, streaming each report to `observer`.
    pub fn run<R, O>(
        &self,
        state: &mut ResourceState,
        catalog: &Catalog,
        rng: &mut R,
        cycles: u32,
        observer: &mut O,
    ) where
        R: UniformSource + ?Sized,
        O: CycleObserver + ?Sized,
    {
        for cycle in 1..=cycles {
            let report = self.step(cycle, state, catalog, rng);
            observer.on_cycle(&report);
        }
    }

    /// Like [`run`](Self::run), but collects the reports.
    pub fn run_collect<R>(
        &self,
        state: &mut ResourceState,
        catalog: &Catalog,
        rng: &mut R,
        cycles: u32,
    ) -> Vec<CycleReport>
    where
        R: UniformSource + ?Sized,
    {
        let mut reports = Vec::with_capacity(cycles as usize);
        self.run(state, catalog, rng, cycles, &mut |r: &CycleReport| {
            reports.push(r.clone())
        });
        reports
    }

    /// Validate `config`, then run it from a fresh state and seeded RNG.
    pub fn run_with_config(
        &self,
        config: &SimulationConfig,
        catalog: &Catalog,
    ) -> Result<Vec<CycleReport>, Vec<ConfigError>> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let mut state = config.initial_state();
        let mut rng = config.rng();
        log::info!(
            "Running {} cycles over {} resources with {} disruption kinds (seed {})",
            config.cycles,
            config.initial_levels.len(),
            catalog.len(),
            config.seed
        );
        Ok(self.run_collect(&mut state, catalog, &mut rng, config.cycles))
    }
}

/// Aggregate view of a run, built incrementally as an observer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub cycles: u32,
    /// Event name → number of cycles it fired in.
    pub firings: BTreeMap<String, u32>,
    pub restorations: u32,
    /// Resource → lowest level observed, including the starting level.
    pub minimum: BTreeMap<String, f64>,
    pub final_levels: Snapshot,
}

impl RunSummary {
    pub fn new(initial: &ResourceState) -> Self {
        let snapshot = initial.snapshot();
        Self {
            minimum: snapshot.iter().map(|(k, v)| (k.to_string(), v)).collect(),
            final_levels: snapshot,
            ..Self::default()
        }
    }

    pub fn total_firings(&self) -> u32 {
        self.firings.values().sum()
    }
}

impl CycleObserver for RunSummary {
    fn on_cycle(&mut self, report: &CycleReport) {
        self.cycles = report.cycle;
        for fired in &report.fired {
            *self.firings.entry(fired.event.clone()).or_insert(0) += 1;
        }
        self.restorations += report.restored.len() as u32;
        for (resource, level) in report.snapshot.iter() {
            let min = self.minimum.entry(resource.to_string()).or_insert(level);
            *min = min.min(level);
        }
        self.final_levels = report.snapshot.clone();
    }
}
