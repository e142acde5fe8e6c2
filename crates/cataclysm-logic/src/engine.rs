//! The disruption engine decides which catalog events fire each cycle and
//! applies their effects.
//!
//! One draw is taken per catalog entry per cycle, in catalog order, whether
//! or not earlier entries fired. Effects of several firings in one cycle
//! compound: later factors apply to already-reduced levels.

use serde::{Deserialize, Serialize};

use crate::disruption::{Catalog, DisruptionEvent};
use crate::rng::UniformSource;
use crate::state::ResourceState;

/// One impact actually applied to a resource present in the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedImpact {
    pub resource: String,
    pub factor: f64,
    pub before: f64,
    pub after: f64,
}

/// One recovery timer actually started or reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledRecovery {
    pub resource: String,
    pub cycles: u32,
}

/// Record of an event that fired during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredDisruption {
    pub event: String,
    pub draw: f64,
    pub impacts: Vec<AppliedImpact>,
    pub recoveries: Vec<ScheduledRecovery>,
}

/// Stateless trigger-and-apply step.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisruptionEngine;

impl DisruptionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every catalog event once against `state`.
    ///
    /// Returns the events that fired, in catalog order. Resources named by
    /// an event but missing from `state` are skipped silently.
    pub fn run_cycle<R>(
        &self,
        state: &mut ResourceState,
        catalog: &Catalog,
        rng: &mut R,
    ) -> Vec<FiredDisruption>
    where
        R: UniformSource + ?Sized,
    {
        let mut fired = Vec::new();
        for event in catalog {
            let draw = rng.next_draw();
            log::trace!("{}: draw {:.4} vs p={}", event.name(), draw, event.probability());
            if draw < event.probability() {
                fired.push(fire(state, event, draw));
            }
        }
        fired
    }
}

/// Apply every impact of `event`, then schedule every recovery.
fn fire(state: &mut ResourceState, event: &DisruptionEvent, draw: f64) -> FiredDisruption {
    log::info!("Disruption under way: {}", event.name());

    let impacts = event
        .impacts()
        .filter_map(|(resource, factor)| {
            let change = state.apply_impact(resource, factor)?;
            log::debug!("{} reduced to {}", resource, change.after);
            Some(AppliedImpact {
                resource: resource.to_string(),
                factor,
                before: change.before,
                after: change.after,
            })
        })
        .collect();

    let recoveries = event
        .recovery_delays()
        .filter(|&(resource, delay)| state.schedule_recovery(resource, delay))
        .map(|(resource, delay)| {
            log::debug!("{} will recover in {} cycles", resource, delay);
            ScheduledRecovery {
                resource: resource.to_string(),
                cycles: delay.get(),
            }
        })
        .collect();

    FiredDisruption {
        event: event.name().to_string(),
        draw,
        impacts,
        recoveries,
    }
}
