//! Result export: hourly CSV tables and a JSON run summary.
//!
//! | File | Content |
//! |------|---------|
//! | `results.csv` | one row per hour: grid trade, generators, loads, renewable, battery |
//! | `line_flows.csv` | network mode only; one column per connected bus pair |
//! | `bus_angles.csv` | network mode only; one column per bus |
//! | `summary.json` | objective, backend, solve time, model statistics |

use anyhow::{Context, Result};
use mgd_algo::{DispatchSolution, ModelStats, Residuals};
use mgd_core::{BalanceMode, Diagnostics};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Values are rounded to this many decimals before writing.
const DECIMALS: i32 = 6;

fn fmt_value(value: f64) -> String {
    let scale = 10f64.powi(DECIMALS);
    let rounded = (value * scale).round() / scale;
    // avoid "-0"
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}

/// Header of `results.csv`.
pub fn results_header(solution: &DispatchSolution) -> Vec<String> {
    let mut header = vec![
        "Hour".to_string(),
        "Grid_Buy(MW)".to_string(),
        "Grid_Sell(MW)".to_string(),
    ];
    for k in 1..=solution.generator_names.len() {
        header.push(format!("DG{k}_Power(MW)"));
    }
    for k in 1..=solution.load_names.len() {
        header.push(format!("Load{k}(MW)"));
    }
    header.extend(
        [
            "Renewable_Gen(MW)",
            "BESS_Charge(MW)",
            "BESS_Discharge(MW)",
            "SoC",
        ]
        .map(String::from),
    );
    header
}

/// Write the hourly dispatch table.
pub fn write_results_csv<W: Write>(solution: &DispatchSolution, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(results_header(solution))
        .context("writing CSV header")?;

    for h in &solution.hours {
        let mut record = vec![
            h.hour.to_string(),
            fmt_value(h.grid_buy_mw),
            fmt_value(h.grid_sell_mw),
        ];
        record.extend(h.generator_mw.iter().map(|&p| fmt_value(p)));
        record.extend(h.load_mw.iter().map(|&d| fmt_value(d)));
        record.push(fmt_value(h.renewable_mw));
        record.push(fmt_value(h.charge_mw));
        record.push(fmt_value(h.discharge_mw));
        record.push(fmt_value(h.soc));
        wtr.write_record(&record).context("writing CSV record")?;
    }

    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

/// Write per-hour flows, one column per reported bus pair.
pub fn write_line_flows_csv<W: Write>(solution: &DispatchSolution, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut header = vec!["Hour".to_string()];
    header.extend(
        solution
            .flow_pairs
            .iter()
            .map(|p| format!("Flow_{}_{}(MW)", p.from, p.to)),
    );
    wtr.write_record(&header).context("writing CSV header")?;

    for (t, flows) in solution.line_flows.iter().enumerate() {
        let mut record = vec![t.to_string()];
        record.extend(flows.iter().map(|&f| fmt_value(f)));
        wtr.write_record(&record).context("writing CSV record")?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

/// Write per-hour voltage angles, one column per bus.
pub fn write_bus_angles_csv<W: Write>(solution: &DispatchSolution, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut header = vec!["Hour".to_string()];
    header.extend((0..solution.bus_count()).map(|bus| format!("Theta_{bus}(rad)")));
    wtr.write_record(&header).context("writing CSV header")?;

    for (t, angles) in solution.bus_angles.iter().enumerate() {
        let mut record = vec![t.to_string()];
        record.extend(angles.iter().map(|&a| fmt_value(a)));
        wtr.write_record(&record).context("writing CSV record")?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

/// Machine-readable outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    pub scenario: &'a str,
    pub status: &'static str,
    pub objective: f64,
    pub backend: &'static str,
    pub mode: BalanceMode,
    pub solve_time_ms: f64,
    pub hours: usize,
    pub model: &'a ModelStats,
    /// Hours with simultaneous grid buy and sell
    pub simultaneous_trade_hours: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residuals: Option<&'a Residuals>,
    pub diagnostics: &'a Diagnostics,
}

impl<'a> RunSummary<'a> {
    pub fn new(scenario: &'a str, solution: &'a DispatchSolution, diagnostics: &'a Diagnostics) -> Self {
        Self {
            scenario,
            status: "optimal",
            objective: solution.objective,
            backend: solution.backend.as_str(),
            mode: solution.mode,
            solve_time_ms: solution.solve_time_ms,
            hours: solution.hour_count(),
            model: &solution.stats,
            simultaneous_trade_hours: solution.simultaneous_trade_hours(1e-6),
            residuals: None,
            diagnostics,
        }
    }

    pub fn with_residuals(mut self, residuals: &'a Residuals) -> Self {
        self.residuals = Some(residuals);
        self
    }

    pub fn to_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing run summary to JSON")?;
        fs::write(path, json).with_context(|| format!("writing JSON to {}", path.display()))?;
        Ok(())
    }
}

/// Paths written by [`export_all`].
#[derive(Debug, Clone, Default)]
pub struct ExportedFiles {
    pub results: PathBuf,
    pub line_flows: Option<PathBuf>,
    pub bus_angles: Option<PathBuf>,
    pub summary: PathBuf,
}

impl ExportedFiles {
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths = vec![self.results.as_path()];
        paths.extend(self.line_flows.as_deref());
        paths.extend(self.bus_angles.as_deref());
        paths.push(self.summary.as_path());
        paths
    }
}

fn create(path: &Path) -> Result<fs::File> {
    fs::File::create(path).with_context(|| format!("creating {}", path.display()))
}

/// Write every output file for `summary` into `dir`, creating it if needed.
pub fn export_all(dir: &Path, solution: &DispatchSolution, summary: &RunSummary) -> Result<ExportedFiles> {
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {}", dir.display()))?;

    let results = dir.join("results.csv");
    write_results_csv(solution, create(&results)?)
        .with_context(|| format!("writing {}", results.display()))?;

    let (line_flows, bus_angles) = if solution.is_network() {
        let flows = dir.join("line_flows.csv");
        write_line_flows_csv(solution, create(&flows)?)
            .with_context(|| format!("writing {}", flows.display()))?;
        let angles = dir.join("bus_angles.csv");
        write_bus_angles_csv(solution, create(&angles)?)
            .with_context(|| format!("writing {}", angles.display()))?;
        (Some(flows), Some(angles))
    } else {
        (None, None)
    };

    let summary_path = dir.join("summary.json");
    summary.to_json(&summary_path)?;

    tracing::debug!(dir = %dir.display(), "exported dispatch results");

    Ok(ExportedFiles {
        results,
        line_flows,
        bus_angles,
        summary: summary_path,
    })
}
