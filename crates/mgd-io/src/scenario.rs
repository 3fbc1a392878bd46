//! TOML scenario files.
//!
//! A scenario file carries everything one model build needs: the parameter
//! set plus the model options. Elements are placed either with a direct bus
//! index (`bus = 1`) or with a one-hot vector over the buses
//! (`location = [0, 1, 0]`).

use anyhow::{anyhow, bail, Context, Result};
use mgd_algo::{LineLimitScope, ModelOptions, DEFAULT_BIG_M};
use mgd_core::{
    BalanceMode, BatteryStorage, BusId, DieselGenerator, GridConnection, Horizon, Line,
    LoadPoint, Location, NetworkParams, ParameterSet, RenewableSource, DEFAULT_PRICE_SCALE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const MICROGRID_24H: &str = include_str!("../../../scenarios/microgrid_24h.toml");
const MICROGRID_3BUS: &str = include_str!("../../../scenarios/microgrid_3bus.toml");

/// Names accepted by [`preset`].
pub const PRESETS: &[&str] = &["default", "microgrid-24h", "microgrid-3bus"];

fn default_price_scale() -> f64 {
    DEFAULT_PRICE_SCALE
}

fn default_big_m() -> f64 {
    DEFAULT_BIG_M
}

fn default_angle_min() -> f64 {
    -std::f64::consts::PI
}

fn default_angle_max() -> f64 {
    std::f64::consts::PI
}

/// Raw scenario file as written on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    pub name: Option<String>,
    pub description: Option<String>,
    pub horizon_hours: usize,
    pub grid_price: Vec<f64>,
    #[serde(default = "default_price_scale")]
    pub price_scale: f64,
    #[serde(default)]
    pub grid: GridSpec,
    pub battery: BatterySpec,
    pub renewable: RenewableSpec,
    #[serde(default)]
    pub generators: Vec<GeneratorSpec>,
    #[serde(default)]
    pub loads: Vec<LoadSpec>,
    pub network: Option<NetworkSpec>,
    #[serde(default)]
    pub model: ModelSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSpec {
    pub bus: Option<usize>,
    pub location: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatterySpec {
    pub max_power_mw: f64,
    pub efficiency: f64,
    pub soc_min: f64,
    pub soc_max: f64,
    pub bus: Option<usize>,
    pub location: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenewableSpec {
    pub forecast_mw: Vec<f64>,
    pub bus: Option<usize>,
    pub location: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSpec {
    pub name: String,
    pub cost_per_mwh: f64,
    pub p_min_mw: f64,
    pub p_max_mw: f64,
    pub bus: Option<usize>,
    pub location: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadSpec {
    pub name: String,
    pub demand_mw: Vec<f64>,
    pub bus: Option<usize>,
    pub location: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSpec {
    /// Use the DC power-flow balance instead of the single system balance
    #[serde(default)]
    pub enabled: bool,
    pub bus_count: usize,
    pub line_capacity_mw: f64,
    #[serde(default = "default_angle_min")]
    pub angle_min_rad: f64,
    #[serde(default = "default_angle_max")]
    pub angle_max_rad: f64,
    pub reference_bus: Option<usize>,
    #[serde(default)]
    pub lines: Vec<LineSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineSpec {
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub r: f64,
    pub x: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    #[serde(default = "default_big_m")]
    pub big_m: f64,
    #[serde(default)]
    pub line_limits: LineLimitScope,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            big_m: DEFAULT_BIG_M,
            line_limits: LineLimitScope::default(),
        }
    }
}

/// A resolved scenario ready for [`mgd_algo::DispatchModel::build`].
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub params: ParameterSet,
    pub options: ModelOptions,
}

fn place(element: &str, bus: Option<usize>, location: Option<&[u8]>) -> Result<Location> {
    match (bus, location) {
        (Some(_), Some(_)) => bail!("{element}: give either `bus` or `location`, not both"),
        (Some(bus), None) => Ok(Location::at(BusId::new(bus))),
        (None, Some(mask)) => Ok(Location::from_one_hot(element, mask)?),
        (None, None) => Ok(Location::unplaced()),
    }
}

impl ScenarioFile {
    /// Convert to a parameter set and model options.
    ///
    /// Only structural problems (placement syntax) are reported here; value
    /// checks happen in [`ParameterSet::validate`].
    pub fn resolve(&self) -> Result<Scenario> {
        let battery = BatteryStorage {
            max_power_mw: self.battery.max_power_mw,
            efficiency: self.battery.efficiency,
            soc_min: self.battery.soc_min,
            soc_max: self.battery.soc_max,
            location: place("battery", self.battery.bus, self.battery.location.as_deref())?,
        };
        let renewable = RenewableSource {
            forecast_mw: self.renewable.forecast_mw.clone(),
            location: place(
                "renewable",
                self.renewable.bus,
                self.renewable.location.as_deref(),
            )?,
        };
        let grid = GridConnection {
            location: place("grid", self.grid.bus, self.grid.location.as_deref())?,
        };

        let mut params = ParameterSet::new(
            Horizon::new(self.horizon_hours),
            self.grid_price.clone(),
            battery,
            renewable,
        )
        .with_price_scale(self.price_scale)
        .with_grid(grid);

        for gen in &self.generators {
            let element = format!("generator '{}'", gen.name);
            params = params.with_generator(DieselGenerator {
                name: gen.name.clone(),
                cost_per_mwh: gen.cost_per_mwh,
                p_min_mw: gen.p_min_mw,
                p_max_mw: gen.p_max_mw,
                location: place(&element, gen.bus, gen.location.as_deref())?,
            });
        }

        for load in &self.loads {
            let element = format!("load '{}'", load.name);
            params = params.with_load(LoadPoint {
                name: load.name.clone(),
                demand_mw: load.demand_mw.clone(),
                location: place(&element, load.bus, load.location.as_deref())?,
            });
        }

        if let Some(net) = &self.network {
            let lines = net
                .lines
                .iter()
                .map(|l| Line::new(BusId::new(l.from), BusId::new(l.to), l.r, l.x))
                .collect();
            let mut network = NetworkParams::new(net.bus_count, lines, net.line_capacity_mw)
                .with_angle_bounds(net.angle_min_rad, net.angle_max_rad);
            if let Some(reference) = net.reference_bus {
                network = network.with_reference_bus(BusId::new(reference));
            }
            params.network = Some(network);
            params.mode = if net.enabled {
                BalanceMode::Network
            } else {
                BalanceMode::Simple
            };
        }

        let options = ModelOptions::default()
            .with_big_m(self.model.big_m)
            .with_line_limits(self.model.line_limits);

        Ok(Scenario {
            name: self.name.clone().unwrap_or_else(|| "scenario".to_string()),
            description: self.description.clone(),
            params,
            options,
        })
    }
}

/// Parse scenario TOML text.
pub fn parse_scenario(text: &str) -> Result<ScenarioFile> {
    toml::from_str(text).context("parsing scenario toml")
}

/// Read, parse and resolve a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading scenario '{}'", path.display()))?;
    let file = parse_scenario(&text)
        .with_context(|| format!("in scenario '{}'", path.display()))?;
    let mut scenario = file.resolve()?;
    if file.name.is_none() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            scenario.name = stem.to_string();
        }
    }
    Ok(scenario)
}

/// A built-in scenario by name (see [`PRESETS`]).
pub fn preset(name: &str) -> Result<Scenario> {
    let text = match name.to_ascii_lowercase().as_str() {
        "default" | "microgrid-24h" => MICROGRID_24H,
        "microgrid-3bus" | "3bus" => MICROGRID_3BUS,
        other => {
            return Err(anyhow!(
                "unknown preset '{}'; available presets: {}",
                other,
                PRESETS.join(", ")
            ))
        }
    };
    parse_scenario(text)?.resolve()
}
