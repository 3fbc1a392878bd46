//! End-to-end dispatch tests on the microlp backend

use mgd_algo::{
    verify, ConstraintKind, DispatchModel, LineLimitScope, MilpSolverKind, ModelOptions,
};
use mgd_core::{
    BalanceMode, BatteryStorage, BusId, ConfigError, DieselGenerator, GridConnection, Horizon,
    Line, LoadPoint, MgdError, NetworkParams, ParameterSet, RenewableSource, TopologyError,
    WarningKind,
};

const TOL: f64 = 1e-4;

fn solve(params: &ParameterSet) -> mgd_algo::DispatchSolution {
    DispatchModel::build(params, &ModelOptions::default())
        .expect("model builds")
        .solve(MilpSolverKind::Microlp)
        .expect("model solves")
}

/// Grid at 1000 $/MWh with no sell-back, one 150 $/MWh generator, 50 MW load.
fn generator_only(hours: usize) -> ParameterSet {
    ParameterSet::new(
        Horizon::new(hours),
        vec![1000.0; hours],
        BatteryStorage::new(50.0, 1.0, 0.0, 1.0),
        RenewableSource::new(vec![0.0; hours]),
    )
    .with_price_scale(0.0)
    .with_generator(DieselGenerator::new("DG1", 150.0, 0.0, 200.0))
    .with_load(LoadPoint::new("Load1", vec![50.0; hours]))
}

/// Renewable surplus in hour 0, equal deficit in hour 1, nothing else cheap.
fn storage_shift() -> ParameterSet {
    ParameterSet::new(
        Horizon::new(2),
        vec![1000.0; 2],
        BatteryStorage::new(50.0, 1.0, 0.0, 1.0),
        RenewableSource::new(vec![50.0, 0.0]),
    )
    .with_price_scale(0.0)
    .with_load(LoadPoint::new("Load1", vec![0.0, 50.0]))
}

/// Two buses: cheap grid at bus 0, expensive generator and the load at bus 1.
fn congested_pair(capacity: f64) -> ParameterSet {
    let lines = vec![Line::lossless(BusId::new(0), BusId::new(1), 0.01)];
    ParameterSet::new(
        Horizon::new(2),
        vec![40.0; 2],
        BatteryStorage::new(50.0, 1.0, 0.0, 1.0).at(BusId::new(1)),
        RenewableSource::new(vec![0.0; 2]).at(BusId::new(0)),
    )
    .with_grid(GridConnection::at(BusId::new(0)))
    .with_generator(DieselGenerator::new("DG1", 80.0, 0.0, 200.0).at(BusId::new(1)))
    .with_load(LoadPoint::new("Load1", vec![100.0; 2]).at(BusId::new(1)))
    .with_network(NetworkParams::new(2, lines, capacity))
}

/// The 24-hour microgrid day: two loads, renewable forecast, 200 MW battery,
/// two diesel units and a four-level grid tariff.
fn microgrid_day() -> ParameterSet {
    let mut price = vec![90.0; 6];
    price.extend([110.0; 5]);
    price.extend([125.0; 7]);
    price.extend([80.0; 6]);
    let load = vec![
        169.0, 175.0, 179.0, 171.0, 181.0, 172.0, 270.0, 264.0, 273.0, 281.0, 193.0, 158.0,
        161.0, 162.0, 250.0, 260.0, 267.0, 271.0, 284.0, 167.0, 128.0, 134.0, 144.0, 150.0,
    ];
    let mut renewable = load.clone();
    renewable[..4].copy_from_slice(&[16.0, 17.0, 17.0, 100.0]);

    ParameterSet::new(
        Horizon::day(),
        price,
        BatteryStorage::new(200.0, 0.95, 0.1, 0.9),
        RenewableSource::new(renewable),
    )
    .with_generator(DieselGenerator::new("DG1", 80.0, 50.0, 200.0))
    .with_generator(DieselGenerator::new("DG2", 70.0, 50.0, 200.0))
    .with_load(LoadPoint::new("Load1", load.clone()))
    .with_load(LoadPoint::new("Load2", load))
}

#[test]
fn cheapest_source_covers_demand() {
    let params = generator_only(2);
    let solution = solve(&params);

    assert!((solution.objective - 15_000.0).abs() < TOL, "objective {}", solution.objective);
    for hour in &solution.hours {
        assert!((hour.generator_mw[0] - 50.0).abs() < TOL);
        assert!(hour.grid_buy_mw.abs() < TOL);
    }
    assert!((solution.total_hourly_cost() - solution.objective).abs() < TOL);
}

/// Zero-width SoC band pins the battery; the generator carries the whole load.
#[test]
fn pinned_battery_leaves_generator_to_serve_load() {
    let params = ParameterSet::new(
        Horizon::new(3),
        vec![1000.0; 3],
        BatteryStorage::new(50.0, 0.95, 0.0, 0.0),
        RenewableSource::new(vec![0.0; 3]),
    )
    .with_price_scale(0.0)
    .with_generator(DieselGenerator::new("DG1", 50.0, 0.0, 200.0))
    .with_load(LoadPoint::new("Load1", vec![100.0; 3]));
    let solution = solve(&params);

    assert!((solution.objective - 15_000.0).abs() < TOL, "objective {}", solution.objective);
    for hour in &solution.hours {
        assert!((hour.generator_mw[0] - 100.0).abs() < TOL);
        assert!(hour.grid_buy_mw.abs() < TOL);
        assert!(hour.grid_sell_mw.abs() < TOL);
        assert!(hour.charge_mw.abs() < TOL);
        assert!(hour.discharge_mw.abs() < TOL);
        assert!(hour.soc.abs() < TOL);
    }
    assert!(verify::check(&params, &solution).unwrap().within(TOL));
}

/// Same system with the default sell-back: the generator runs flat out and the
/// surplus is exported, so the cost turns negative.
#[test]
fn default_sell_back_exports_generator_surplus() {
    let params = ParameterSet::new(
        Horizon::new(3),
        vec![1000.0; 3],
        BatteryStorage::new(50.0, 0.95, 0.0, 0.0),
        RenewableSource::new(vec![0.0; 3]),
    )
    .with_generator(DieselGenerator::new("DG1", 50.0, 0.0, 200.0))
    .with_load(LoadPoint::new("Load1", vec![100.0; 3]));
    let solution = solve(&params);

    // 3 h x (200 MW x 50 $/MWh - 100 MW x 800 $/MWh)
    assert!((solution.objective + 210_000.0).abs() < TOL, "objective {}", solution.objective);
    for hour in &solution.hours {
        assert!((hour.generator_mw[0] - 200.0).abs() < TOL);
        assert!((hour.grid_sell_mw - 100.0).abs() < TOL);
    }
}

#[test]
fn cheap_grid_displaces_generation() {
    let mut params = generator_only(3);
    params.grid_price = vec![40.0; 3];
    let solution = solve(&params);

    assert!((solution.objective - 3.0 * 40.0 * 50.0).abs() < TOL);
    for hour in &solution.hours {
        assert!((hour.grid_buy_mw - 50.0).abs() < TOL);
        assert!(hour.generator_mw[0].abs() < TOL);
    }
}

#[test]
fn battery_shifts_surplus_across_hours() {
    let params = storage_shift();
    let solution = solve(&params);

    assert!(solution.objective.abs() < TOL, "objective {}", solution.objective);
    let (h0, h1) = (&solution.hours[0], &solution.hours[1]);
    assert!((h0.charge_mw - 50.0).abs() < TOL);
    assert!(h0.discharge_mw.abs() < TOL);
    assert!((h1.discharge_mw - 50.0).abs() < TOL);
    assert!(h1.charge_mw.abs() < TOL);
    assert!((h0.soc - 1.0).abs() < TOL);
    assert!(h1.soc.abs() < TOL);
    assert!(h0.charging);
    assert!(!h1.charging);
}

#[test]
fn soc_recurrence_wraps_around_the_horizon() {
    let params = storage_shift();
    let solution = solve(&params);
    let residuals = verify::check(&params, &solution).unwrap();
    assert!(residuals.within(TOL), "{:?}", residuals.violations(TOL));

    // Hour 0 charges from the level left at the end of hour 1.
    let expected = solution.hours[1].soc + solution.hours[0].charge_mw / 50.0;
    assert!((solution.hours[0].soc - expected).abs() < TOL);
}

#[test]
fn charge_and_discharge_never_overlap() {
    let params = microgrid_day();
    let solution = solve(&params);
    for hour in &solution.hours {
        assert!(
            hour.charge_mw < TOL || hour.discharge_mw < TOL,
            "hour {} charges {} and discharges {}",
            hour.hour,
            hour.charge_mw,
            hour.discharge_mw
        );
    }
}

#[test]
fn microgrid_day_satisfies_every_property() {
    let params = microgrid_day();
    let solution = solve(&params);

    assert_eq!(solution.hour_count(), 24);
    assert_eq!(solution.generator_names, vec!["DG1", "DG2"]);
    assert!(!solution.is_network());
    assert!(solution.bus_angles.is_empty());

    let residuals = verify::check(&params, &solution).unwrap();
    assert!(residuals.within(TOL), "{:?}", residuals.violations(TOL));
    for hour in &solution.hours {
        assert!(hour.soc >= 0.1 - TOL && hour.soc <= 0.9 + TOL);
        for &p in &hour.generator_mw {
            assert!((50.0 - TOL..=200.0 + TOL).contains(&p));
        }
    }
    assert!((solution.total_hourly_cost() - solution.objective).abs() < 1e-3);
}

#[test]
fn solving_twice_is_deterministic() {
    let params = generator_only(4);
    let a = DispatchModel::build(&params, &ModelOptions::default()).unwrap();
    let b = DispatchModel::build(&params, &ModelOptions::default()).unwrap();
    assert_eq!(a.stats(), b.stats());

    let sa = a.solve(MilpSolverKind::Microlp).unwrap();
    let sb = b.solve(MilpSolverKind::Microlp).unwrap();
    assert!((sa.objective - sb.objective).abs() < TOL);
}

#[test]
fn line_limit_raises_cost_over_copper_plate() {
    let network = congested_pair(30.0);
    let copper_plate = network.clone().with_mode(BalanceMode::Simple);

    let simple = solve(&copper_plate);
    assert!((simple.objective - 2.0 * 40.0 * 100.0).abs() < TOL);

    let solution = solve(&network);
    // 30 MW over the line at 40 $/MWh, 70 MW from the generator at 80 $/MWh.
    assert!((solution.objective - 2.0 * (30.0 * 40.0 + 70.0 * 80.0)).abs() < TOL);
    assert!(solution.is_network());
    assert_eq!(solution.bus_count(), 2);
    assert_eq!(solution.flow_pairs.len(), 1);
    for flows in &solution.line_flows {
        assert!((flows[0] - 30.0).abs() < TOL, "flow {}", flows[0]);
    }

    let residuals = verify::check(&network, &solution).unwrap();
    assert!(residuals.within(TOL), "{:?}", residuals.violations(TOL));
}

#[test]
fn loose_network_matches_copper_plate() {
    let network = congested_pair(1_000.0);
    let simple = solve(&network.clone().with_mode(BalanceMode::Simple));
    let networked = solve(&network);
    assert!((simple.objective - networked.objective).abs() < TOL);
}

#[test]
fn all_bus_pairs_scope_gives_same_optimum() {
    let network = congested_pair(30.0);
    let lines = solve(&network);

    let options = ModelOptions::default().with_line_limits(LineLimitScope::AllBusPairs);
    let model = DispatchModel::build(&network, &options).unwrap();
    assert_eq!(model.stats().constraints_by_kind[&ConstraintKind::LineFlowLimit], 2 * 4 * 2);
    let all_pairs = model.solve(MilpSolverKind::Microlp).unwrap();

    assert!((lines.objective - all_pairs.objective).abs() < TOL);
}

#[test]
fn reference_bus_pins_angle_to_zero() {
    let mut params = congested_pair(30.0);
    if let Some(network) = params.network.as_mut() {
        network.reference_bus = Some(BusId::new(0));
    }
    let solution = solve(&params);
    for angles in &solution.bus_angles {
        assert!(angles[0].abs() < TOL);
    }
}

#[test]
fn islanded_network_runs_without_grid_exchange() {
    let mut params = congested_pair(30.0);
    params.grid = GridConnection::default();
    params.validate().unwrap();

    let solution = solve(&params);
    // default sell-back would be unbounded if the unplaced grid were free
    assert!((solution.objective - 2.0 * 80.0 * 100.0).abs() < TOL);
    for h in &solution.hours {
        assert!(h.grid_buy_mw.abs() < TOL && h.grid_sell_mw.abs() < TOL);
        assert!((h.generator_mw[0] - 100.0).abs() < TOL);
    }

    let residuals = verify::check(&params, &solution).unwrap();
    assert!(residuals.within(TOL), "{:?}", residuals.violations(TOL));
}

#[test]
fn zero_line_capacity_is_infeasible() {
    let mut params = congested_pair(0.0);
    params.generators.clear();
    let err = DispatchModel::build(&params, &ModelOptions::default())
        .unwrap()
        .solve(MilpSolverKind::Microlp)
        .unwrap_err();
    assert!(matches!(err, MgdError::Infeasible(_)), "got {err:?}");
}

#[test]
fn profitable_sell_back_is_unbounded() {
    let params = generator_only(2).with_price_scale(2.0);
    let model = DispatchModel::build(&params, &ModelOptions::default()).unwrap();
    assert_eq!(model.diagnostics().of_kind(WarningKind::Economics).count(), 1);

    let err = model.solve(MilpSolverKind::Microlp).unwrap_err();
    assert!(matches!(err, MgdError::Unbounded(_)), "got {err:?}");
}

#[test]
fn degenerate_line_fails_before_building() {
    let mut params = congested_pair(30.0);
    if let Some(network) = params.network.as_mut() {
        network.lines.push(Line::new(BusId::new(0), BusId::new(1), 0.0, 0.0));
    }
    let err = DispatchModel::build(&params, &ModelOptions::default()).err().unwrap();
    assert!(matches!(
        err,
        MgdError::Config(ConfigError::Topology(TopologyError::DegenerateImpedance { index: 1, .. }))
    ));
}

#[test]
fn network_model_admittance_rows_sum_to_zero() {
    let params = congested_pair(30.0);
    let topology = params.topology().unwrap().unwrap();
    for sum in topology.admittance().row_sums() {
        assert!(sum.abs() < 1e-9);
    }
}
