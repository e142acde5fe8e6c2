//! Console and JSON presentation of cycle reports.

use std::io::{self, Write};

use cataclysm_logic::driver::{CycleObserver, CycleReport, RunSummary};
use cataclysm_logic::state::Snapshot;

/// How reports are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Console,
    JsonLines,
}

/// Writes each report as it arrives and keeps a running summary.
pub struct Presenter<W: Write> {
    mode: OutputMode,
    summary: RunSummary,
    out: W,
}

impl<W: Write> Presenter<W> {
    pub fn new(mode: OutputMode, summary: RunSummary, out: W) -> Self {
        Self { mode, summary, out }
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

impl<W: Write> CycleObserver for Presenter<W> {
    fn on_cycle(&mut self, report: &CycleReport) {
        self.summary.on_cycle(report);
        let written = match self.mode {
            OutputMode::Console => write!(self.out, "{}", format_cycle(report)),
            OutputMode::JsonLines => write_json_line(&mut self.out, report),
        };
        if let Err(e) = written {
            tracing::error!("failed to write cycle {} report: {}", report.cycle, e);
        }
    }
}

fn write_json_line<T: serde::Serialize>(out: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)
}

/// Render one cycle the way an operator reads it.
pub fn format_cycle(report: &CycleReport) -> String {
    let mut out = format!("\n── Cycle {} ──\n", report.cycle);

    for fired in &report.fired {
        out.push_str(&format!("⚠ Disruption under way: {}\n", fired.event));
        for impact in &fired.impacts {
            out.push_str(&format!(
                "  ↓ {} reduced to {}\n",
                capitalize(&impact.resource),
                impact.after
            ));
        }
        for recovery in &fired.recoveries {
            out.push_str(&format!(
                "  ↻ {} starts recovering in {} cycles\n",
                capitalize(&recovery.resource),
                recovery.cycles
            ));
        }
    }
    for restored in &report.restored {
        out.push_str(&format!(
            "✓ {} back to normal ({} → {})\n",
            capitalize(&restored.resource),
            restored.before,
            restored.after
        ));
    }

    out.push_str("Ecosystem:\n");
    out.push_str(&format_levels(&report.snapshot));
    out
}

fn format_levels(snapshot: &Snapshot) -> String {
    snapshot
        .iter()
        .map(|(name, level)| format!("  {:<16} {:>7.2}\n", capitalize(name), level))
        .collect()
}

pub fn print_summary(
    summary: &RunSummary,
    mode: OutputMode,
    out: &mut impl Write,
) -> io::Result<()> {
    if mode == OutputMode::JsonLines {
        return write_json_line(out, summary);
    }

    writeln!(out, "\n=== SUMMARY: {} cycles ===", summary.cycles)?;
    if summary.firings.is_empty() {
        writeln!(out, "  no disruptions fired")?;
    }
    for (event, count) in &summary.firings {
        writeln!(out, "  {:<20} fired {}x", event, count)?;
    }
    writeln!(out, "  {} recoveries completed", summary.restorations)?;
    writeln!(out, "  {:<16} {:>7} {:>7}", "", "min", "final")?;
    for (name, level) in summary.final_levels.iter() {
        let min = summary.minimum.get(name).copied().unwrap_or(level);
        writeln!(out, "  {:<16} {:>7.2} {:>7.2}", capitalize(name), min, level)?;
    }
    Ok(())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
