//! Bus/line topology and the matrices used by the DC power-flow balance.
//!
//! ```text
//! b_ij     = -x / (r² + x²)               line susceptance (−1/x when r = 0)
//!
//! B[i][j]  = -b_ij                        for i ≠ j
//! B[i][i]  = Σ_k b_ik                     signed sum over the row
//! ```
//!
//! With that diagonal every row of `B` sums to zero (Laplacian property). The
//! nodal balance only ever multiplies `B[i][j]` by `θ_i − θ_j`, so the diagonal
//! never contributes to a flow; it is kept for completeness and for the
//! row-sum check.

use crate::{BusId, TopologyError};
use serde::{Deserialize, Serialize};

/// Below this magnitude both r and x are treated as zero.
const IMPEDANCE_EPS: f64 = 1e-12;

/// A line between two buses with series resistance and reactance (per unit).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub from: BusId,
    pub to: BusId,
    pub resistance: f64,
    pub reactance: f64,
}

impl Line {
    pub fn new(from: BusId, to: BusId, resistance: f64, reactance: f64) -> Self {
        Self {
            from,
            to,
            resistance,
            reactance,
        }
    }

    /// Lossless line (r = 0) with the given reactance.
    pub fn lossless(from: BusId, to: BusId, reactance: f64) -> Self {
        Self::new(from, to, 0.0, reactance)
    }

    /// Susceptance `-x / (r² + x²)`; `None` when the impedance is degenerate.
    pub fn susceptance(&self) -> Option<f64> {
        let r = self.resistance;
        let x = self.reactance;
        if !r.is_finite() || !x.is_finite() {
            return None;
        }
        if r.abs() < IMPEDANCE_EPS && x.abs() < IMPEDANCE_EPS {
            return None;
        }
        Some(-x / (r * r + x * x))
    }
}

/// Dense symmetric N×N matrix of line susceptances; the diagonal is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SusceptanceMatrix {
    values: Vec<Vec<f64>>,
}

impl SusceptanceMatrix {
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }
}

/// Nodal admittance matrix `B` built from a [`SusceptanceMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittanceMatrix {
    values: Vec<Vec<f64>>,
}

impl AdmittanceMatrix {
    fn from_susceptance(susceptance: &SusceptanceMatrix) -> Self {
        let n = susceptance.dim();
        let mut values = vec![vec![0.0; n]; n];
        for (i, row) in susceptance.rows().iter().enumerate() {
            let mut diagonal = 0.0;
            for (j, &b) in row.iter().enumerate() {
                if i != j {
                    values[i][j] = -b;
                    diagonal += b;
                }
            }
            values[i][i] = diagonal;
        }
        Self { values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Σ_j B[i][j] for every row; zero up to rounding for a well-formed matrix.
    pub fn row_sums(&self) -> Vec<f64> {
        self.values.iter().map(|row| row.iter().sum()).collect()
    }
}

/// Buses, lines and the derived matrices, built once and never mutated.
#[derive(Debug, Clone)]
pub struct Topology {
    bus_count: usize,
    lines: Vec<Line>,
    susceptance: SusceptanceMatrix,
    admittance: AdmittanceMatrix,
}

impl Topology {
    /// Build the susceptance and admittance matrices for `bus_count` buses.
    ///
    /// Parallel lines between the same pair of buses add their susceptances.
    /// A line with r = x = 0 is rejected rather than producing an infinite
    /// coupling.
    pub fn build(bus_count: usize, lines: &[Line]) -> Result<Self, TopologyError> {
        if bus_count == 0 {
            return Err(TopologyError::NoBuses);
        }

        let mut values = vec![vec![0.0; bus_count]; bus_count];
        for (index, line) in lines.iter().enumerate() {
            let (i, j) = (line.from.value(), line.to.value());
            for bus in [i, j] {
                if bus >= bus_count {
                    return Err(TopologyError::UnknownBus {
                        index,
                        bus,
                        bus_count,
                    });
                }
            }
            if i == j {
                return Err(TopologyError::SelfLoop { index, bus: i });
            }
            let b = line
                .susceptance()
                .ok_or(TopologyError::DegenerateImpedance { index, from: i, to: j })?;

            values[i][j] += b;
            values[j][i] += b;
        }

        let susceptance = SusceptanceMatrix { values };
        let admittance = AdmittanceMatrix::from_susceptance(&susceptance);

        Ok(Self {
            bus_count,
            lines: lines.to_vec(),
            susceptance,
            admittance,
        })
    }

    pub fn bus_count(&self) -> usize {
        self.bus_count
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn susceptance(&self) -> &SusceptanceMatrix {
        &self.susceptance
    }

    pub fn admittance(&self) -> &AdmittanceMatrix {
        &self.admittance
    }

    /// Whether at least one line joins buses `i` and `j`.
    pub fn connected(&self, i: usize, j: usize) -> bool {
        i != j && self.susceptance.get(i, j) != 0.0
    }

    /// Distinct connected bus pairs `(i, j)` with `i < j`, in first-seen order.
    pub fn line_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            let (a, b) = (line.from.value(), line.to.value());
            let pair = (a.min(b), a.max(b));
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_bus_ring() -> Vec<Line> {
        vec![
            Line::lossless(BusId::new(0), BusId::new(1), 0.1),
            Line::lossless(BusId::new(1), BusId::new(2), 0.2),
            Line::lossless(BusId::new(0), BusId::new(2), 0.25),
        ]
    }

    #[test]
    fn lossless_susceptance_is_negative_inverse_reactance() {
        let line = Line::lossless(BusId::new(0), BusId::new(1), 0.1);
        let b = line.susceptance().unwrap();
        assert!((b + 10.0).abs() < 1e-12, "expected -10, got {b}");
    }

    #[test]
    fn lossy_susceptance_uses_full_impedance() {
        let line = Line::new(BusId::new(0), BusId::new(1), 0.3, 0.4);
        // -0.4 / (0.09 + 0.16) = -1.6
        let b = line.susceptance().unwrap();
        assert!((b + 1.6).abs() < 1e-12, "expected -1.6, got {b}");
    }

    #[test]
    fn susceptance_matrix_is_symmetric_with_zero_diagonal() {
        let topo = Topology::build(3, &three_bus_ring()).unwrap();
        let s = topo.susceptance();
        for i in 0..3 {
            assert_eq!(s.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(s.get(i, j), s.get(j, i));
            }
        }
        assert!((s.get(0, 1) + 10.0).abs() < 1e-12);
        assert!((s.get(1, 2) + 5.0).abs() < 1e-12);
        assert!((s.get(0, 2) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn admittance_rows_sum_to_zero() {
        let topo = Topology::build(3, &three_bus_ring()).unwrap();
        for (i, sum) in topo.admittance().row_sums().into_iter().enumerate() {
            assert!(sum.abs() < 1e-9, "row {i} sums to {sum}");
        }
    }

    #[test]
    fn admittance_off_diagonal_is_negated_susceptance() {
        let topo = Topology::build(3, &three_bus_ring()).unwrap();
        let b = topo.admittance();
        assert!((b.get(0, 1) - 10.0).abs() < 1e-12);
        assert!((b.get(0, 0) + 14.0).abs() < 1e-12);
    }

    #[test]
    fn unconnected_pairs_have_zero_coupling() {
        let lines = vec![Line::lossless(BusId::new(0), BusId::new(1), 0.1)];
        let topo = Topology::build(3, &lines).unwrap();
        assert_eq!(topo.susceptance().get(0, 2), 0.0);
        assert_eq!(topo.admittance().get(1, 2), 0.0);
        assert!(!topo.connected(0, 2));
        assert!(topo.connected(1, 0));
        // Bus 2 is isolated; its row is all zeros.
        assert_eq!(topo.admittance().row_sums()[2], 0.0);
    }

    #[test]
    fn parallel_lines_accumulate() {
        let lines = vec![
            Line::lossless(BusId::new(0), BusId::new(1), 0.2),
            Line::lossless(BusId::new(1), BusId::new(0), 0.2),
        ];
        let topo = Topology::build(2, &lines).unwrap();
        assert!((topo.susceptance().get(0, 1) + 10.0).abs() < 1e-12);
        assert_eq!(topo.line_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn degenerate_line_is_rejected() {
        let lines = vec![Line::new(BusId::new(0), BusId::new(1), 0.0, 0.0)];
        let err = Topology::build(2, &lines).unwrap_err();
        assert_eq!(
            err,
            TopologyError::DegenerateImpedance {
                index: 0,
                from: 0,
                to: 1
            }
        );
    }

    #[test]
    fn self_loop_and_unknown_bus_are_rejected() {
        let self_loop = vec![Line::lossless(BusId::new(1), BusId::new(1), 0.1)];
        assert!(matches!(
            Topology::build(2, &self_loop),
            Err(TopologyError::SelfLoop { bus: 1, .. })
        ));

        let dangling = vec![Line::lossless(BusId::new(0), BusId::new(5), 0.1)];
        assert!(matches!(
            Topology::build(2, &dangling),
            Err(TopologyError::UnknownBus { bus: 5, .. })
        ));
    }

    #[test]
    fn empty_network_is_rejected() {
        assert_eq!(Topology::build(0, &[]).unwrap_err(), TopologyError::NoBuses);
    }
}
