//! Plain-text console reports: input summary, model size and dispatch table.

use anyhow::Result;
use mgd_algo::{DispatchSolution, ModelStats};
use mgd_core::{Location, ParameterSet};
use std::io::Write;
use tabwriter::TabWriter;

fn placement(location: &Location) -> String {
    match location.buses() {
        [] => "-".to_string(),
        buses => buses
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Summary of every input: hourly series, battery, generators and network.
pub fn write_input_report<W: Write>(params: &ParameterSet, out: W) -> Result<()> {
    let mut w = TabWriter::new(out).padding(2);

    writeln!(w, "=== Microgrid Input Data ===")?;
    writeln!(w)?;

    let mut header = String::from("HOUR\tBUY ($/MWh)\tSELL ($/MWh)");
    for load in &params.loads {
        header.push_str(&format!("\t{} (MW)", load.name));
    }
    header.push_str("\tRENEWABLE (MW)");
    writeln!(w, "{header}")?;
    for t in params.horizon.iter() {
        let price = params.grid_price.get(t).copied().unwrap_or(f64::NAN);
        let mut row = format!("{}\t{:.1}\t{:.1}", t, price, price * params.price_scale);
        for load in &params.loads {
            let demand = load.demand_mw.get(t).copied().unwrap_or(f64::NAN);
            row.push_str(&format!("\t{demand:.1}"));
        }
        let res = params.renewable.forecast_mw.get(t).copied().unwrap_or(f64::NAN);
        row.push_str(&format!("\t{res:.1}"));
        writeln!(w, "{row}")?;
    }
    writeln!(w)?;

    let bess = &params.battery;
    writeln!(w, "BESS")?;
    writeln!(w, "  Max Power (MW)\t{:.1}", bess.max_power_mw)?;
    writeln!(w, "  Efficiency\t{:.1} %", bess.efficiency * 100.0)?;
    writeln!(
        w,
        "  SoC Range\t[{:.1}%, {:.1}%]",
        bess.soc_min * 100.0,
        bess.soc_max * 100.0
    )?;
    writeln!(w)?;

    writeln!(w, "GENERATOR\tCOST ($/MWh)\tMIN (MW)\tMAX (MW)\tBUS")?;
    for gen in &params.generators {
        writeln!(
            w,
            "{}\t{:.1}\t{:.1}\t{:.1}\t{}",
            gen.name,
            gen.cost_per_mwh,
            gen.p_min_mw,
            gen.p_max_mw,
            placement(&gen.location)
        )?;
    }
    writeln!(w)?;

    writeln!(w, "Balance mode\t{}", params.mode)?;
    if let Some(network) = params.network.as_ref().filter(|_| params.is_network_mode()) {
        writeln!(
            w,
            "Buses\t{}\tline capacity {:.1} MW\tangles [{:.3}, {:.3}] rad",
            network.bus_count,
            network.line_capacity_mw,
            network.angle_min_rad,
            network.angle_max_rad
        )?;
        writeln!(w)?;
        writeln!(w, "LINE\tFROM\tTO\tR (pu)\tX (pu)\tSUSCEPTANCE")?;
        for (index, line) in network.lines.iter().enumerate() {
            let b = line
                .susceptance()
                .map(|b| format!("{b:.3}"))
                .unwrap_or_else(|| "degenerate".to_string());
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}\t{}",
                index, line.from, line.to, line.resistance, line.reactance, b
            )?;
        }
        writeln!(w)?;
        writeln!(w, "ELEMENT\tBUS")?;
        writeln!(w, "grid\t{}", placement(&params.grid.location))?;
        writeln!(w, "battery\t{}", placement(&params.battery.location))?;
        writeln!(w, "renewable\t{}", placement(&params.renewable.location))?;
        for load in &params.loads {
            writeln!(w, "{}\t{}", load.name, placement(&load.location))?;
        }
    }

    w.flush()?;
    Ok(())
}

/// Variable and constraint counts of a built model.
pub fn write_model_stats<W: Write>(stats: &ModelStats, out: W) -> Result<()> {
    let mut w = TabWriter::new(out).padding(2);
    writeln!(w, "Formulation\t{}", stats.formulation)?;
    writeln!(w, "Hours\t{}", stats.hours)?;
    writeln!(w, "Continuous variables\t{}", stats.continuous_variables)?;
    writeln!(w, "Integer variables\t{}", stats.integer_variables)?;
    writeln!(w, "Constraints\t{}", stats.constraints)?;
    for (kind, count) in &stats.constraints_by_kind {
        writeln!(w, "  {kind}\t{count}")?;
    }
    w.flush()?;
    Ok(())
}

/// Objective line followed by the hourly schedule.
pub fn write_dispatch_table<W: Write>(solution: &DispatchSolution, out: W) -> Result<()> {
    let mut w = TabWriter::new(out).padding(2);
    writeln!(w, "Minimized objective: {:.2}", solution.objective)?;
    writeln!(w)?;

    let mut header = String::from("HOUR\tBUY\tSELL");
    for name in &solution.generator_names {
        header.push_str(&format!("\t{name}"));
    }
    header.push_str("\tCHARGE\tDISCHARGE\tSOC\tCOST");
    writeln!(w, "{header}")?;

    for h in &solution.hours {
        let mut row = format!("{}\t{:.2}\t{:.2}", h.hour, h.grid_buy_mw, h.grid_sell_mw);
        for p in &h.generator_mw {
            row.push_str(&format!("\t{p:.2}"));
        }
        row.push_str(&format!(
            "\t{:.2}\t{:.2}\t{:.3}\t{:.2}",
            h.charge_mw, h.discharge_mw, h.soc, h.cost
        ));
        writeln!(w, "{row}")?;
    }
    w.flush()?;
    Ok(())
}
