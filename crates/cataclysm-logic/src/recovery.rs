//! Recovery scheduler. Advances recovery timers once per cycle.
//!
//! Runs after the disruption step of the same cycle, so a timer started in
//! cycle N first counts down in cycle N+1.

use crate::state::{ResourceState, Restoration};

#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryScheduler;

impl RecoveryScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Tick every pending timer exactly once and return what was restored.
    pub fn run_cycle(&self, state: &mut ResourceState) -> Vec<Restoration> {
        let restored = state.tick_recovery();
        for r in &restored {
            log::info!("{} restored: {} -> {}", r.resource, r.before, r.after);
        }
        restored
    }
}
