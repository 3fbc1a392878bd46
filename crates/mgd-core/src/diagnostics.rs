//! Non-fatal findings collected while validating a parameter set.
//!
//! Malformed input stops a run with a [`ConfigError`](crate::ConfigError).
//! Diagnostics are for inputs that are legal but likely to surprise: a sell
//! price above the buy price, an islanded bus, a Big-M that barely dominates
//! the battery rating.
//!
//! ```
//! use mgd_core::diagnostics::{Diagnostics, WarningKind};
//!
//! let mut diag = Diagnostics::new();
//! diag.warn(WarningKind::Economics, "price_scale", "sell price exceeds buy price");
//!
//! assert_eq!(diag.len(), 1);
//! assert_eq!(diag.of_kind(WarningKind::Topology).count(), 0);
//! ```

use serde::Serialize;
use std::fmt;

/// Which part of the input a warning is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningKind {
    /// Price relationships (sell-back arbitrage)
    Economics,
    /// Generator fleet against the load profile
    Generation,
    /// Bus graph shape
    Topology,
    /// Model options such as Big-M
    Model,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::Economics => "economics",
            WarningKind::Generation => "generation",
            WarningKind::Topology => "topology",
            WarningKind::Model => "model",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding. `subject` names the parameter or element it concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}

/// Warnings gathered from parameter and option validation, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(
        &mut self,
        kind: WarningKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.warnings.push(Warning {
            kind,
            subject: subject.into(),
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn summary(&self) -> String {
        match self.warnings.len() {
            0 => "no warnings".to_string(),
            1 => "1 warning".to_string(),
            n => format!("{n} warnings"),
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for warning in &self.warnings {
            writeln!(f, "  {warning}")?;
        }
        Ok(())
    }
}
