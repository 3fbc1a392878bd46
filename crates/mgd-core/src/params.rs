//! Static input data for one dispatch run.
//!
//! A [`ParameterSet`] is built once (from a scenario file or in code), checked
//! with [`ParameterSet::validate`], and never mutated afterwards. Every
//! per-hour sequence must have exactly `T` entries.

use crate::diagnostics::{Diagnostics, WarningKind};
use crate::graph_utils::find_islands;
use crate::horizon::Horizon;
use crate::topology::{Line, Topology};
use crate::{BusId, ConfigError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sell-back price as a fraction of the buy price.
pub const DEFAULT_PRICE_SCALE: f64 = 0.8;

/// Where an element is attached in the network.
///
/// Elements hold direct bus references instead of dense 0/1 masks. The
/// formulation supports one bus per element; the set form leaves room for
/// elements spread over several buses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location {
    buses: Vec<BusId>,
}

impl Location {
    pub fn at(bus: BusId) -> Self {
        Self { buses: vec![bus] }
    }

    pub fn unplaced() -> Self {
        Self::default()
    }

    /// Convert a one-hot location vector (one entry per bus) into a location.
    ///
    /// An all-zero vector yields an unplaced element.
    pub fn from_one_hot(element: &str, mask: &[u8]) -> Result<Self, ConfigError> {
        let mut hot = None;
        for (bus, &flag) in mask.iter().enumerate() {
            match flag {
                0 => {}
                1 if hot.is_none() => hot = Some(bus),
                _ => {
                    return Err(ConfigError::NotOneHot {
                        element: element.to_string(),
                    })
                }
            }
        }
        Ok(hot.map(|bus| Self::at(BusId::new(bus))).unwrap_or_default())
    }

    pub fn buses(&self) -> &[BusId] {
        &self.buses
    }

    /// The single bus this element sits on, if it is placed at exactly one.
    pub fn bus(&self) -> Option<BusId> {
        match self.buses.as_slice() {
            [bus] => Some(*bus),
            _ => None,
        }
    }

    pub fn is_at(&self, bus: usize) -> bool {
        self.buses.iter().any(|b| b.value() == bus)
    }

    fn check(&self, element: &str, bus_count: usize) -> Result<(), ConfigError> {
        match self.buses.as_slice() {
            [] => Err(ConfigError::Unplaced {
                element: element.to_string(),
            }),
            [bus] if bus.value() >= bus_count => Err(ConfigError::UnknownBus {
                element: element.to_string(),
                bus: bus.value(),
                bus_count,
            }),
            [_] => Ok(()),
            many => Err(ConfigError::MultiplePlacement {
                element: element.to_string(),
                count: many.len(),
            }),
        }
    }
}

/// Point of common coupling with the utility grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridConnection {
    pub location: Location,
}

impl GridConnection {
    pub fn at(bus: BusId) -> Self {
        Self {
            location: Location::at(bus),
        }
    }

    /// Whether any bus is tied to the utility grid.
    ///
    /// In network mode an unplaced connection means the microgrid runs
    /// islanded and grid exchange is pinned to zero.
    pub fn is_connected(&self) -> bool {
        !self.location.buses().is_empty()
    }
}

/// Battery energy storage system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryStorage {
    /// Maximum charge and discharge power (MW)
    pub max_power_mw: f64,
    /// Round-trip efficiency η ∈ (0, 1]
    pub efficiency: f64,
    pub soc_min: f64,
    pub soc_max: f64,
    #[serde(default)]
    pub location: Location,
}

impl BatteryStorage {
    pub fn new(max_power_mw: f64, efficiency: f64, soc_min: f64, soc_max: f64) -> Self {
        Self {
            max_power_mw,
            efficiency,
            soc_min,
            soc_max,
            location: Location::unplaced(),
        }
    }

    pub fn at(mut self, bus: BusId) -> Self {
        self.location = Location::at(bus);
        self
    }
}

/// Diesel generator with a linear energy cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DieselGenerator {
    pub name: String,
    pub cost_per_mwh: f64,
    pub p_min_mw: f64,
    pub p_max_mw: f64,
    #[serde(default)]
    pub location: Location,
}

impl DieselGenerator {
    pub fn new(name: impl Into<String>, cost_per_mwh: f64, p_min_mw: f64, p_max_mw: f64) -> Self {
        Self {
            name: name.into(),
            cost_per_mwh,
            p_min_mw,
            p_max_mw,
            location: Location::unplaced(),
        }
    }

    pub fn at(mut self, bus: BusId) -> Self {
        self.location = Location::at(bus);
        self
    }
}

/// Fixed demand profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPoint {
    pub name: String,
    pub demand_mw: Vec<f64>,
    #[serde(default)]
    pub location: Location,
}

impl LoadPoint {
    pub fn new(name: impl Into<String>, demand_mw: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            demand_mw,
            location: Location::unplaced(),
        }
    }

    pub fn at(mut self, bus: BusId) -> Self {
        self.location = Location::at(bus);
        self
    }
}

/// Non-dispatchable renewable infeed forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewableSource {
    pub forecast_mw: Vec<f64>,
    #[serde(default)]
    pub location: Location,
}

impl RenewableSource {
    pub fn new(forecast_mw: Vec<f64>) -> Self {
        Self {
            forecast_mw,
            location: Location::unplaced(),
        }
    }

    pub fn at(mut self, bus: BusId) -> Self {
        self.location = Location::at(bus);
        self
    }
}

/// Multi-bus network used by the DC power-flow balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub bus_count: usize,
    pub lines: Vec<Line>,
    /// Flow limit applied to every line in either direction (MW)
    pub line_capacity_mw: f64,
    pub angle_min_rad: f64,
    pub angle_max_rad: f64,
    /// Bus whose angle is pinned to zero; angles are only bounded when absent
    #[serde(default)]
    pub reference_bus: Option<BusId>,
}

impl NetworkParams {
    pub fn new(bus_count: usize, lines: Vec<Line>, line_capacity_mw: f64) -> Self {
        Self {
            bus_count,
            lines,
            line_capacity_mw,
            angle_min_rad: -std::f64::consts::PI,
            angle_max_rad: std::f64::consts::PI,
            reference_bus: None,
        }
    }

    pub fn with_angle_bounds(mut self, min_rad: f64, max_rad: f64) -> Self {
        self.angle_min_rad = min_rad;
        self.angle_max_rad = max_rad;
        self
    }

    pub fn with_reference_bus(mut self, bus: BusId) -> Self {
        self.reference_bus = Some(bus);
        self
    }
}

/// Which energy-balance formulation the model uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceMode {
    /// One system-wide balance per hour ("copper plate")
    #[default]
    Simple,
    /// Per-bus DC power-flow balance with line and angle limits
    Network,
}

impl fmt::Display for BalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceMode::Simple => write!(f, "simple"),
            BalanceMode::Network => write!(f, "network"),
        }
    }
}

/// Complete, immutable input for one model build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub horizon: Horizon,
    /// Grid buy price per hour ($/MWh)
    pub grid_price: Vec<f64>,
    /// Sell price = `price_scale` × buy price
    pub price_scale: f64,
    pub grid: GridConnection,
    pub battery: BatteryStorage,
    pub renewable: RenewableSource,
    pub generators: Vec<DieselGenerator>,
    pub loads: Vec<LoadPoint>,
    pub network: Option<NetworkParams>,
    pub mode: BalanceMode,
}

impl ParameterSet {
    pub fn new(
        horizon: Horizon,
        grid_price: Vec<f64>,
        battery: BatteryStorage,
        renewable: RenewableSource,
    ) -> Self {
        Self {
            horizon,
            grid_price,
            price_scale: DEFAULT_PRICE_SCALE,
            grid: GridConnection::default(),
            battery,
            renewable,
            generators: Vec::new(),
            loads: Vec::new(),
            network: None,
            mode: BalanceMode::Simple,
        }
    }

    pub fn with_price_scale(mut self, price_scale: f64) -> Self {
        self.price_scale = price_scale;
        self
    }

    pub fn with_grid(mut self, grid: GridConnection) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_generator(mut self, generator: DieselGenerator) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn with_load(mut self, load: LoadPoint) -> Self {
        self.loads.push(load);
        self
    }

    /// Attach a network description and switch to the network balance.
    pub fn with_network(mut self, network: NetworkParams) -> Self {
        self.network = Some(network);
        self.mode = BalanceMode::Network;
        self
    }

    pub fn with_mode(mut self, mode: BalanceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn hours(&self) -> usize {
        self.horizon.hours()
    }

    pub fn is_network_mode(&self) -> bool {
        self.mode == BalanceMode::Network
    }

    /// Σ_l load(l, t)
    pub fn total_demand_mw(&self, t: usize) -> f64 {
        self.loads.iter().map(|l| l.demand_mw[t]).sum()
    }

    pub fn peak_demand_mw(&self) -> f64 {
        self.horizon
            .iter()
            .map(|t| self.total_demand_mw(t))
            .fold(0.0, f64::max)
    }

    /// Build the network topology when network mode is active.
    pub fn topology(&self) -> Result<Option<Topology>, ConfigError> {
        if !self.is_network_mode() {
            return Ok(None);
        }
        let network = self.network.as_ref().ok_or(ConfigError::MissingNetwork)?;
        Ok(Some(Topology::build(network.bus_count, &network.lines)?))
    }

    /// Check every parameter and return non-fatal findings.
    ///
    /// Fails on the first malformed parameter; the error names it.
    pub fn validate(&self) -> Result<Diagnostics, ConfigError> {
        let t = self.hours();
        if t == 0 {
            return Err(ConfigError::EmptyHorizon);
        }

        check_series("grid_price", &self.grid_price, t, false)?;
        check_scalar("price_scale", self.price_scale, 0.0, f64::MAX, "[0, inf)")?;

        let bess = &self.battery;
        if !(bess.max_power_mw.is_finite() && bess.max_power_mw > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "battery.max_power_mw".into(),
                value: bess.max_power_mw,
                range: "(0, inf)",
            });
        }
        if !(bess.efficiency > 0.0 && bess.efficiency <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "battery.efficiency".into(),
                value: bess.efficiency,
                range: "(0, 1]",
            });
        }
        check_scalar("battery.soc_min", bess.soc_min, 0.0, 1.0, "[0, 1]")?;
        check_scalar("battery.soc_max", bess.soc_max, 0.0, 1.0, "[0, 1]")?;
        check_bounds("battery.soc", bess.soc_min, bess.soc_max)?;

        check_series("renewable.forecast_mw", &self.renewable.forecast_mw, t, true)?;

        for load in &self.loads {
            check_series(&format!("load '{}'.demand_mw", load.name), &load.demand_mw, t, true)?;
        }

        for gen in &self.generators {
            let field = format!("generator '{}'", gen.name);
            check_scalar(&format!("{field}.cost_per_mwh"), gen.cost_per_mwh, f64::MIN, f64::MAX, "finite")?;
            check_scalar(&format!("{field}.p_min_mw"), gen.p_min_mw, 0.0, f64::MAX, "[0, inf)")?;
            check_scalar(&format!("{field}.p_max_mw"), gen.p_max_mw, 0.0, f64::MAX, "[0, inf)")?;
            check_bounds(&format!("{field}.p_mw"), gen.p_min_mw, gen.p_max_mw)?;
        }

        let mut diagnostics = Diagnostics::new();

        if self.price_scale > 1.0 {
            diagnostics.warn(
                WarningKind::Economics,
                "price_scale",
                "sell price exceeds buy price; simultaneous buy and sell is profitable and the model may be unbounded",
            );
        }

        let min_generation: f64 = self.generators.iter().map(|g| g.p_min_mw).sum();
        if min_generation > self.peak_demand_mw() {
            diagnostics.warn(
                WarningKind::Generation,
                "generators",
                format!(
                    "combined minimum output {min_generation} MW exceeds peak demand {} MW; surplus must be sold or stored",
                    self.peak_demand_mw()
                ),
            );
        }

        if self.is_network_mode() {
            self.validate_network(&mut diagnostics)?;
        }

        Ok(diagnostics)
    }

    fn validate_network(&self, diagnostics: &mut Diagnostics) -> Result<(), ConfigError> {
        let network = self.network.as_ref().ok_or(ConfigError::MissingNetwork)?;
        let topology = Topology::build(network.bus_count, &network.lines)?;
        let n = network.bus_count;

        check_scalar("network.line_capacity_mw", network.line_capacity_mw, 0.0, f64::MAX, "[0, inf)")?;
        check_scalar("network.angle_min_rad", network.angle_min_rad, f64::MIN, f64::MAX, "finite")?;
        check_scalar("network.angle_max_rad", network.angle_max_rad, f64::MIN, f64::MAX, "finite")?;
        check_bounds("network.angle_rad", network.angle_min_rad, network.angle_max_rad)?;
        if let Some(reference) = network.reference_bus {
            if reference.value() >= n {
                return Err(ConfigError::UnknownBus {
                    element: "network.reference_bus".into(),
                    bus: reference.value(),
                    bus_count: n,
                });
            }
        }

        if self.grid.is_connected() {
            self.grid.location.check("grid", n)?;
        }
        self.battery.location.check("battery", n)?;
        self.renewable.location.check("renewable", n)?;
        for gen in &self.generators {
            gen.location.check(&format!("generator '{}'", gen.name), n)?;
        }
        for load in &self.loads {
            load.location.check(&format!("load '{}'", load.name), n)?;
        }

        let islands = find_islands(&topology);
        if islands.islands.len() > 1 {
            diagnostics.warn(
                WarningKind::Topology,
                "network",
                format!(
                    "network splits into {} islands; each island must balance on its own",
                    islands.islands.len()
                ),
            );
        }

        Ok(())
    }
}

fn check_series(
    field: &str,
    values: &[f64],
    expected: usize,
    non_negative: bool,
) -> Result<(), ConfigError> {
    if values.len() != expected {
        return Err(ConfigError::LengthMismatch {
            field: field.to_string(),
            expected,
            actual: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::NonFinite {
            field: field.to_string(),
        });
    }
    if non_negative {
        if let Some(&v) = values.iter().find(|v| **v < 0.0) {
            return Err(ConfigError::OutOfRange {
                field: field.to_string(),
                value: v,
                range: "[0, inf)",
            });
        }
    }
    Ok(())
}

fn check_scalar(
    field: &str,
    value: f64,
    min: f64,
    max: f64,
    range: &'static str,
) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite {
            field: field.to_string(),
        });
    }
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value,
            range,
        });
    }
    Ok(())
}

fn check_bounds(field: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvertedBounds {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}
