//! Ecosystem resource state: named levels plus in-flight recovery timers.
//!
//! `ResourceState` is the single mutable value a run acts upon. Levels
//! and recovery bookkeeping live in separate maps so a resource name can
//! never be confused with a timer.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::constants::{IMPACT_PRECISION, RECOVERY_BOOST, RECOVERY_CAP};

/// Recovery state of a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryPhase {
    /// No recovery pending.
    Stable,
    /// Recovery pending; restores when the counter reaches zero.
    Recovering(u32),
}

/// Before/after levels of a resource touched by an impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelChange {
    pub before: f64,
    pub after: f64,
}

/// A resource whose recovery timer expired this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restoration {
    pub resource: String,
    pub before: f64,
    pub after: f64,
}

/// Read-only copy of resource levels handed to presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, f64>);

impl Snapshot {
    pub fn get(&self, resource: &str) -> Option<f64> {
        self.0.get(resource).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A pending recovery countdown.
///
/// A timer started since the previous tick is `fresh` and skips that tick,
/// so a recovery scheduled during cycle N first counts down in cycle N+1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct RecoveryTimer {
    remaining: u32,
    fresh: bool,
}

/// Mutable ecosystem state: resource levels and pending recoveries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    levels: BTreeMap<String, f64>,
    pending_recovery: BTreeMap<String, RecoveryTimer>,
}

impl ResourceState {
    /// Build a state from initial levels with no recoveries pending.
    ///
    /// Negative or NaN inputs are floored to zero.
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            levels: levels
                .into_iter()
                .map(|(name, level)| (name.into(), level.max(0.0)))
                .collect(),
            pending_recovery: BTreeMap::new(),
        }
    }

    /// The ecosystem every default run starts from.
    pub fn default_ecosystem() -> Self {
        Self::new(crate::constants::DEFAULT_LEVELS)
    }

    pub fn level(&self, resource: &str) -> Option<f64> {
        self.levels.get(resource).copied()
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.levels.contains_key(resource)
    }

    /// Remaining cycles before `resource` restores, if a recovery is pending.
    pub fn pending(&self, resource: &str) -> Option<u32> {
        self.pending_recovery.get(resource).map(|t| t.remaining)
    }

    /// All pending recoveries, ordered by resource name.
    pub fn pending_recoveries(&self) -> impl Iterator<Item = (&str, u32)> {
        self.pending_recovery
            .iter()
            .map(|(k, t)| (k.as_str(), t.remaining))
    }

    /// Recovery phase of `resource`, or `None` if the resource is unknown.
    pub fn phase(&self, resource: &str) -> Option<RecoveryPhase> {
        if !self.contains(resource) {
            return None;
        }
        Some(match self.pending(resource) {
            Some(remaining) => RecoveryPhase::Recovering(remaining),
            None => RecoveryPhase::Stable,
        })
    }

    /// Multiply a resource's level by `factor`, rounded to two decimals
    /// (ties to even) and floored at zero. Unknown resources are left alone.
    pub fn apply_impact(&mut self, resource: &str, factor: f64) -> Option<LevelChange> {
        let level = self.levels.get_mut(resource)?;
        let before = *level;
        *level = round_to(before * factor, IMPACT_PRECISION).max(0.0);
        Some(LevelChange {
            before,
            after: *level,
        })
    }

    /// Start (or restart) the recovery timer for `resource`.
    ///
    /// Last schedule wins: an in-flight timer is replaced, not extended.
    /// Returns `false` for unknown resources.
    pub fn schedule_recovery(&mut self, resource: &str, delay: NonZeroU32) -> bool {
        if !self.contains(resource) {
            return false;
        }
        self.pending_recovery.insert(
            resource.to_string(),
            RecoveryTimer {
                remaining: delay.get(),
                fresh: true,
            },
        );
        true
    }

    /// Count every pending timer down by one cycle and restore the
    /// resources whose timers hit zero.
    ///
    /// Timers scheduled since the previous tick are armed instead of
    /// decremented.
    pub fn tick_recovery(&mut self) -> Vec<Restoration> {
        let levels = &mut self.levels;
        let mut restored = Vec::new();

        self.pending_recovery.retain(|resource, timer| {
            if timer.fresh {
                timer.fresh = false;
                return true;
            }
            timer.remaining = timer.remaining.saturating_sub(1);
            if timer.remaining > 0 {
                return true;
            }
            if let Some(level) = levels.get_mut(resource) {
                let before = *level;
                *level = (before * RECOVERY_BOOST).min(RECOVERY_CAP);
                restored.push(Restoration {
                    resource: resource.clone(),
                    before,
                    after: *level,
                });
            }
            false
        });

        restored
    }

    /// Copy of the current levels, without recovery bookkeeping.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.levels.clone())
    }
}

/// Round to `places` decimals, exact ties to the even digit.
fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round_ties_even() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn forest() -> ResourceState {
        ResourceState::new([("vegetation", 100.0), ("fauna", 80.0)])
    }

    #[test]
    fn test_new_floors_negative_levels() {
        let state = ResourceState::new([("fauna", -5.0)]);
        assert_eq!(state.level("fauna"), Some(0.0));
        assert_eq!(state.pending_recoveries().count(), 0);
    }

    #[test]
    fn test_default_ecosystem() {
        let state = ResourceState::default_ecosystem();
        assert_eq!(state.level("vegetation"), Some(100.0));
        assert_eq!(state.level("temperature"), Some(20.0));
        assert_eq!(state.snapshot().len(), 5);
    }

    #[test]
    fn test_apply_impact_rounds_to_two_places() {
        let mut state = ResourceState::new([("fauna", 33.333)]);
        let change = state.apply_impact("fauna", 0.5).unwrap();
        assert_eq!(change.before, 33.333);
        assert_eq!(change.after, 16.67);
        assert_eq!(state.level("fauna"), Some(16.67));
    }

    #[test]
    fn test_apply_impact_rounds_ties_to_even() {
        let mut state = ResourceState::new([("fauna", 1.25), ("vegetation", 0.25)]);
        assert_eq!(state.apply_impact("fauna", 0.5).unwrap().after, 0.62);
        assert_eq!(state.apply_impact("vegetation", 0.5).unwrap().after, 0.12);

        let mut state = ResourceState::new([("population", 1.27)]);
        assert_eq!(state.apply_impact("population", 0.5).unwrap().after, 0.64);
    }

    #[test]
    fn test_apply_impact_zero_factor() {
        let mut state = forest();
        state.apply_impact("vegetation", 0.0);
        assert_eq!(state.level("vegetation"), Some(0.0));
    }

    #[test]
    fn test_apply_impact_unknown_resource_is_noop() {
        let mut state = forest();
        let before = state.clone();
        assert!(state.apply_impact("glaciers", 0.1).is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn test_schedule_recovery_last_wins() {
        let mut state = forest();
        assert!(state.schedule_recovery("vegetation", delay(10)));
        state.tick_recovery();
        assert_eq!(state.pending("vegetation"), Some(10));
        state.tick_recovery();
        assert_eq!(state.pending("vegetation"), Some(9));
        assert!(state.schedule_recovery("vegetation", delay(3)));
        assert_eq!(state.pending("vegetation"), Some(3));
    }

    #[test]
    fn test_schedule_recovery_unknown_resource_is_noop() {
        let mut state = forest();
        assert!(!state.schedule_recovery("glaciers", delay(4)));
        assert_eq!(state.pending("glaciers"), None);
        assert_eq!(state.pending_recoveries().count(), 0);
    }

    #[test]
    fn test_tick_restores_and_clears() {
        let mut state = forest();
        state.apply_impact("vegetation", 0.2);
        state.schedule_recovery("vegetation", delay(2));

        assert!(state.tick_recovery().is_empty());
        assert_eq!(state.phase("vegetation"), Some(RecoveryPhase::Recovering(2)));
        assert!(state.tick_recovery().is_empty());
        assert_eq!(state.phase("vegetation"), Some(RecoveryPhase::Recovering(1)));

        let restored = state.tick_recovery();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].resource, "vegetation");
        assert_eq!(restored[0].before, 20.0);
        assert_eq!(restored[0].after, 30.0);
        assert_eq!(state.phase("vegetation"), Some(RecoveryPhase::Stable));
    }

    #[test]
    fn test_restoration_capped_at_100() {
        let mut state = ResourceState::new([("fauna", 90.0)]);
        state.schedule_recovery("fauna", delay(1));
        assert!(state.tick_recovery().is_empty());
        assert_eq!(state.tick_recovery().len(), 1);
        assert_eq!(state.level("fauna"), Some(100.0));
    }

    #[test]
    fn test_restoration_cap_applies_above_100() {
        // The cap applies to the boosted value, so a level already above
        // 100 is pulled down to exactly 100.
        let mut state = ResourceState::new([("population", 120.0)]);
        state.schedule_recovery("population", delay(1));
        state.tick_recovery();
        state.tick_recovery();
        assert_eq!(state.level("population"), Some(100.0));
    }

    #[test]
    fn test_reschedule_rearms_timer() {
        let mut state = forest();
        state.schedule_recovery("fauna", delay(3));
        state.tick_recovery();
        state.tick_recovery();
        assert_eq!(state.pending("fauna"), Some(2));
        state.schedule_recovery("fauna", delay(3));
        state.tick_recovery();
        assert_eq!(state.pending("fauna"), Some(3));
    }

    #[test]
    fn test_phase_unknown_resource() {
        assert_eq!(forest().phase("glaciers"), None);
    }

    #[test]
    fn test_snapshot_excludes_timers() {
        let mut state = forest();
        state.schedule_recovery("fauna", delay(5));
        let snap = state.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get("fauna"), Some(80.0));
        assert!(snap.iter().all(|(name, _)| name == "vegetation" || name == "fauna"));
    }
}
