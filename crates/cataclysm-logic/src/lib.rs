//! Pure ecosystem disruption logic for Cataclysm.
//!
//! A shared ecosystem (named resource levels) is struck by randomly
//! triggered natural disasters, each of which scales some resources down
//! and may schedule a delayed recovery. Everything here takes plain data
//! and an injected random source, so runs are reproducible and every step
//! is unit-testable. Rendering and I/O live in the harness crate.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Resource names, recovery tuning, default run parameters |
//! | [`disruption`] | Validated event definitions, built-in kinds, the catalog |
//! | [`driver`] | Cycle sequencing, run config, reports, run summary |
//! | [`engine`] | Per-cycle Bernoulli triggering and effect application |
//! | [`error`] | Catalog and config errors |
//! | [`recovery`] | Per-cycle recovery timer advancement |
//! | [`rng`] | Uniform draw sources (seeded, scripted, any `rand::Rng`) |
//! | [`state`] | Resource levels, recovery timers, snapshots |

pub mod constants;
pub mod disruption;
pub mod driver;
pub mod engine;
pub mod error;
pub mod recovery;
pub mod rng;
pub mod state;
