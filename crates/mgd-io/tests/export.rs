//! Scenario → solve → export round trip

use mgd_algo::{verify, DispatchModel, DispatchSolution, MilpSolverKind};
use mgd_core::Diagnostics;
use mgd_io::export::{results_header, write_results_csv};
use mgd_io::scenario::parse_scenario;
use mgd_io::{export_all, RunSummary};
use tempfile::TempDir;

const SIMPLE: &str = r#"
name = "two-hour"
horizon_hours = 2
grid_price = [1000, 1000]
price_scale = 0.0

[battery]
max_power_mw = 50
efficiency = 1.0
soc_min = 0.0
soc_max = 1.0

[renewable]
forecast_mw = [0, 0]

[[generators]]
name = "DG1"
cost_per_mwh = 150
p_min_mw = 0
p_max_mw = 200

[[loads]]
name = "Load1"
demand_mw = [50, 50]
"#;

const NETWORK: &str = r#"
name = "two-bus"
horizon_hours = 2
grid_price = [40, 40]

[grid]
bus = 0

[battery]
max_power_mw = 50
efficiency = 1.0
soc_min = 0.0
soc_max = 1.0
bus = 1

[renewable]
forecast_mw = [0, 0]
location = [1, 0]

[[generators]]
name = "DG1"
cost_per_mwh = 80
p_min_mw = 0
p_max_mw = 200
bus = 1

[[loads]]
name = "Load1"
demand_mw = [100, 100]
bus = 1

[network]
enabled = true
bus_count = 2
line_capacity_mw = 30

[[network.lines]]
from = 0
to = 1
x = 0.01
"#;

fn solve(text: &str) -> (String, DispatchSolution, Diagnostics) {
    let scenario = parse_scenario(text).unwrap().resolve().unwrap();
    let model = DispatchModel::build(&scenario.params, &scenario.options).unwrap();
    let diagnostics = model.diagnostics().clone();
    let solution = model.solve(MilpSolverKind::Microlp).unwrap();
    (scenario.name, solution, diagnostics)
}

#[test]
fn results_csv_has_one_row_per_hour() {
    let (_, solution, _) = solve(SIMPLE);
    let mut buf = Vec::new();
    write_results_csv(&solution, &mut buf).unwrap();

    let mut reader = csv::Reader::from_reader(buf.as_slice());
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        header,
        vec![
            "Hour",
            "Grid_Buy(MW)",
            "Grid_Sell(MW)",
            "DG1_Power(MW)",
            "Load1(MW)",
            "Renewable_Gen(MW)",
            "BESS_Charge(MW)",
            "BESS_Discharge(MW)",
            "SoC"
        ]
    );
    assert_eq!(header, results_header(&solution));

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][0], "1");
    let dg: f64 = rows[0][3].parse().unwrap();
    assert!((dg - 50.0).abs() < 1e-4);
    assert_eq!(&rows[0][4], "50");
}

#[test]
fn simple_mode_exports_results_and_summary_only() {
    let (name, solution, diagnostics) = solve(SIMPLE);
    let dir = TempDir::new().unwrap();
    let summary = RunSummary::new(&name, &solution, &diagnostics);
    let files = export_all(dir.path(), &solution, &summary).unwrap();

    assert!(files.results.exists());
    assert!(files.summary.exists());
    assert!(files.line_flows.is_none());
    assert!(files.bus_angles.is_none());
    assert_eq!(files.paths().len(), 2);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files.summary).unwrap()).unwrap();
    assert_eq!(json["scenario"], "two-hour");
    assert_eq!(json["status"], "optimal");
    assert_eq!(json["backend"], "microlp");
    assert_eq!(json["mode"], "simple");
    assert!((json["objective"].as_f64().unwrap() - 15_000.0).abs() < 1e-4);
    assert_eq!(json["model"]["integer_variables"], 2);
    assert!(json.get("residuals").is_none());
}

#[test]
fn network_mode_exports_flows_and_angles() {
    let (name, solution, diagnostics) = solve(NETWORK);
    let scenario = parse_scenario(NETWORK).unwrap().resolve().unwrap();
    let residuals = verify::check(&scenario.params, &solution).unwrap();
    assert!(residuals.within(1e-4));

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("nested").join("run");
    let summary = RunSummary::new(&name, &solution, &diagnostics).with_residuals(&residuals);
    let files = export_all(&out, &solution, &summary).unwrap();
    assert_eq!(files.paths().len(), 4);

    let flows = std::fs::read_to_string(files.line_flows.unwrap()).unwrap();
    let mut lines = flows.lines();
    assert_eq!(lines.next(), Some("Hour,Flow_0_1(MW)"));
    let first: Vec<&str> = lines.next().unwrap().split(',').collect();
    let flow: f64 = first[1].parse().unwrap();
    assert!((flow - 30.0).abs() < 1e-4);

    let angles = std::fs::read_to_string(files.bus_angles.unwrap()).unwrap();
    assert!(angles.starts_with("Hour,Theta_0(rad),Theta_1(rad)"));
    assert_eq!(angles.lines().count(), 3);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files.summary).unwrap()).unwrap();
    assert_eq!(json["mode"], "network");
    assert!(json["residuals"]["nodal_balance"].as_f64().unwrap() < 1e-4);
}

#[test]
fn export_into_unwritable_path_fails_without_touching_solution() {
    let (name, solution, diagnostics) = solve(SIMPLE);
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let summary = RunSummary::new(&name, &solution, &diagnostics);
    assert!(export_all(&blocker.join("out"), &solution, &summary).is_err());
    assert_eq!(solution.hour_count(), 2);
}
