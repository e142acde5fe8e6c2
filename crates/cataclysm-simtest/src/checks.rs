//! Self-check suite run before the simulation.
//!
//! Each check exercises the logic crate directly and reports a pass/fail
//! line, so a broken build of the logic is caught before any output is
//! trusted. Section banners and verbose detail go to the writer the caller
//! picks.

use std::io::{self, Write};
use std::num::NonZeroU32;

use cataclysm_logic::constants::{resources, RECOVERY_CAP};
use cataclysm_logic::disruption::{Catalog, DisruptionKind, EventDefinition};
use cataclysm_logic::driver::{SimulationConfig, SimulationDriver};
use cataclysm_logic::rng::ScriptedDraws;
use cataclysm_logic::state::ResourceState;

// ── Sample catalog (same JSON the harness accepts via --catalog) ────────
const SAMPLE_CATALOG_JSON: &str = include_str!("../../../data/disruption_catalog.json");

pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

pub fn run_all(verbose: bool, out: &mut dyn Write) -> io::Result<Vec<TestResult>> {
    let mut results = Vec::new();
    results.extend(validate_catalog(verbose, out)?);
    results.extend(validate_state_rules(verbose, out)?);
    results.extend(validate_scenarios(verbose, out)?);
    results.extend(validate_seed_sweep(verbose, out)?);
    Ok(results)
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(verbose: bool, out: &mut dyn Write) -> io::Result<Vec<TestResult>> {
    writeln!(out, "--- Disruption Catalog ---")?;
    let mut results = Vec::new();

    let invalid: Vec<_> = DisruptionKind::all()
        .iter()
        .filter(|k| k.definition().build().is_err())
        .collect();
    results.push(TestResult {
        name: "catalog_builtins_valid".into(),
        passed: invalid.is_empty(),
        detail: if invalid.is_empty() {
            format!("{} built-in kinds validate", DisruptionKind::all().len())
        } else {
            format!("invalid built-ins: {:?}", invalid)
        },
    });

    let catalog = Catalog::standard();
    if verbose {
        for event in &catalog {
            let hits: Vec<String> = event
                .impacts()
                .map(|(r, f)| format!("{}×{}", r, f))
                .collect();
            writeln!(
                out,
                "    {:<18} p={:<5} {}",
                event.name(),
                event.probability(),
                hits.join(" ")
            )?;
        }
    }
    let per_cycle: f64 = catalog.iter().map(|e| e.probability()).sum();
    results.push(TestResult {
        name: "catalog_probability_mass".into(),
        passed: per_cycle > 0.0 && per_cycle < 1.0,
        detail: format!("expected {:.2} disruptions per cycle", per_cycle),
    });

    let rejected = EventDefinition::new("Meteor", 1.5).build().is_err()
        && EventDefinition::new("Meteor", 0.5)
            .impact(resources::FAUNA, 2.0)
            .build()
            .is_err()
        && EventDefinition::new("Meteor", 0.5)
            .recovery(resources::FAUNA, 0)
            .build()
            .is_err();
    match serde_json::from_str::<Catalog>(SAMPLE_CATALOG_JSON) {
        Ok(sample) => {
            let builtins_match = DisruptionKind::all()
                .iter()
                .all(|k| sample.get(k.name()) == Some(&k.event()));
            results.push(TestResult {
                name: "catalog_sample_matches_builtins".into(),
                passed: builtins_match,
                detail: format!("{} events in sample catalog", sample.len()),
            });
        }
        Err(e) => results.push(TestResult {
            name: "catalog_sample_parse".into(),
            passed: false,
            detail: format!("JSON parse error: {}", e),
        }),
    }

    results.push(TestResult {
        name: "catalog_rejects_bad_values".into(),
        passed: rejected,
        detail: "probability > 1, factor > 1 and zero delay are rejected".into(),
    });

    Ok(results)
}

// ── 2. State rules ──────────────────────────────────────────────────────

fn validate_state_rules(verbose: bool, out: &mut dyn Write) -> io::Result<Vec<TestResult>> {
    writeln!(out, "--- Resource State ---")?;
    let mut results = Vec::new();

    let mut state = ResourceState::new([(resources::FAUNA, 10.0)]);
    state.apply_impact(resources::FAUNA, 0.0);
    results.push(TestResult {
        name: "state_level_floor".into(),
        passed: state.level(resources::FAUNA) == Some(0.0),
        detail: "zero factor floors at 0".into(),
    });

    let mut state = ResourceState::new([(resources::FAUNA, 1.25)]);
    let tie = state.apply_impact(resources::FAUNA, 0.5).map(|c| c.after);
    if verbose {
        writeln!(out, "    1.25 × 0.5 rounds to {:?}", tie)?;
    }
    results.push(TestResult {
        name: "state_rounding_ties_even".into(),
        passed: tie == Some(0.62),
        detail: format!("0.625 → {:?}", tie),
    });

    let mut state = ResourceState::new([(resources::VEGETATION, 90.0)]);
    if let Some(delay) = NonZeroU32::new(1) {
        state.schedule_recovery(resources::VEGETATION, delay);
    }
    state.tick_recovery();
    state.tick_recovery();
    let level = state.level(resources::VEGETATION).unwrap_or(f64::NAN);
    if verbose {
        writeln!(out, "    90 restored after 1 cycle → {}", level)?;
    }
    results.push(TestResult {
        name: "state_recovery_cap".into(),
        passed: level == RECOVERY_CAP,
        detail: format!("90 × 1.5 capped → {}", level),
    });

    let mut state = ResourceState::default_ecosystem();
    let before = state.clone();
    state.apply_impact("glaciers", 0.1);
    results.push(TestResult {
        name: "state_unknown_resource_noop".into(),
        passed: state == before,
        detail: "unknown resource leaves state unchanged".into(),
    });

    Ok(results)
}

// ── 3. Scenarios ────────────────────────────────────────────────────────

fn validate_scenarios(verbose: bool, out: &mut dyn Write) -> io::Result<Vec<TestResult>> {
    writeln!(out, "--- Scenarios ---")?;
    let mut results = Vec::new();
    let driver = SimulationDriver::new();

    // Single strike, recovery ten cycles later.
    let catalog = single_catalog(
        EventDefinition::new("Eruption", 1.0)
            .impact(resources::VEGETATION, 0.2)
            .recovery(resources::VEGETATION, 10),
    );
    let mut state = ResourceState::new([(resources::VEGETATION, 100.0)]);
    let reports = match catalog {
        Some(ref c) => driver.run_collect(&mut state, c, &mut ScriptedDraws::new([0.0]), 11),
        None => Vec::new(),
    };
    let at = |cycle: usize| {
        reports
            .get(cycle - 1)
            .and_then(|r| r.snapshot.get(resources::VEGETATION))
    };
    let passed = at(1) == Some(20.0) && at(10) == Some(20.0) && at(11) == Some(30.0);
    if verbose {
        for report in reports.iter().filter(|r| !r.is_quiet()) {
            writeln!(
                out,
                "    cycle {}: {} fired, {} restored",
                report.cycle,
                report.fired.len(),
                report.restored.len()
            )?;
        }
    }
    results.push(TestResult {
        name: "scenario_delayed_recovery".into(),
        passed,
        detail: format!("cycle 1 → {:?}, 10 → {:?}, 11 → {:?}", at(1), at(10), at(11)),
    });

    // Two strikes in one cycle compound.
    let catalog = Catalog::new(
        ["Drought", "Plague"]
            .iter()
            .filter_map(|n| {
                EventDefinition::new(*n, 0.5)
                    .impact(resources::FAUNA, 0.5)
                    .build()
                    .ok()
            })
            .collect(),
    )
    .ok();
    let mut state = ResourceState::new([(resources::FAUNA, 100.0)]);
    if let Some(ref c) = catalog {
        driver.run_collect(&mut state, c, &mut ScriptedDraws::always(2), 1);
    }
    results.push(TestResult {
        name: "scenario_compounding".into(),
        passed: state.level(resources::FAUNA) == Some(25.0),
        detail: format!("100 × 0.5 × 0.5 → {:?}", state.level(resources::FAUNA)),
    });

    // Impact with no recovery delay persists.
    let catalog =
        single_catalog(EventDefinition::new("Extinction", 1.0).impact(resources::FAUNA, 0.4));
    let mut state = ResourceState::new([(resources::FAUNA, 100.0)]);
    if let Some(ref c) = catalog {
        driver.run_collect(&mut state, c, &mut ScriptedDraws::new([0.0]), 40);
    }
    results.push(TestResult {
        name: "scenario_permanent_damage".into(),
        passed: state.level(resources::FAUNA) == Some(40.0)
            && state.pending(resources::FAUNA).is_none(),
        detail: format!("after 40 cycles → {:?}", state.level(resources::FAUNA)),
    });

    // Same seed, same run.
    let config = SimulationConfig::default();
    let a = driver.run_with_config(&config, &Catalog::standard());
    let b = driver.run_with_config(&config, &Catalog::standard());
    let same = matches!((&a, &b), (Ok(a), Ok(b)) if a == b);
    results.push(TestResult {
        name: "scenario_deterministic_replay".into(),
        passed: same,
        detail: format!("seed {} replayed over {} cycles", config.seed, config.cycles),
    });

    Ok(results)
}

fn single_catalog(def: EventDefinition) -> Option<Catalog> {
    def.build().ok().and_then(|e| Catalog::new(vec![e]).ok())
}

// ── 4. Seed sweep ───────────────────────────────────────────────────────

fn validate_seed_sweep(verbose: bool, out: &mut dyn Write) -> io::Result<Vec<TestResult>> {
    writeln!(out, "--- Seed Sweep ---")?;
    let mut results = Vec::new();
    let driver = SimulationDriver::new();
    let catalog = Catalog::standard();

    let mut out_of_bounds = 0;
    let mut rejected_runs = 0;
    let mut total_fired = 0;
    let seeds = 0..200u64;
    let runs = seeds.end;
    for seed in seeds {
        let config = SimulationConfig {
            seed,
            ..SimulationConfig::default()
        };
        let Ok(reports) = driver.run_with_config(&config, &catalog) else {
            rejected_runs += 1;
            continue;
        };
        for report in &reports {
            total_fired += report.fired.len();
            out_of_bounds += report
                .snapshot
                .iter()
                .filter(|(_, level)| !(0.0..=RECOVERY_CAP).contains(level))
                .count();
        }
    }

    let mean = total_fired as f64 / runs as f64;
    if verbose {
        writeln!(out, "    {} runs, {:.2} disruptions per run", runs, mean)?;
    }
    results.push(TestResult {
        name: "sweep_levels_in_bounds".into(),
        passed: out_of_bounds == 0 && rejected_runs == 0,
        detail: format!(
            "{} out-of-bounds levels across {} runs ({} rejected)",
            out_of_bounds, runs, rejected_runs
        ),
    });
    results.push(TestResult {
        name: "sweep_disruptions_occur".into(),
        passed: total_fired > 0,
        detail: format!("{:.2} disruptions per 30-cycle run", mean),
    });

    Ok(results)
}
