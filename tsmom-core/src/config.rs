//! Analysis configuration: scan range, volatility targeting, long-only policy.

use crate::policy::PolicyConfig;
use crate::scan::ScanConfig;
use crate::simulate::{SimulationConfig, Simulator};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A configuration value outside its valid domain.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}: {reason}")]
pub struct InvalidConfig {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidConfig {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Every knob the scan and simulator expose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub scan: ScanConfig,
    pub simulation: SimulationConfig,
    pub policy: PolicyConfig,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        let scan = &self.scan;
        if scan.min_window == 0 {
            return Err(InvalidConfig::new("scan.min_window", "must be >= 1"));
        }
        if scan.is_empty() {
            return Err(InvalidConfig::new(
                "scan.max_window",
                format!(
                    "must be >= min_window ({} < {})",
                    scan.max_window, scan.min_window
                ),
            ));
        }
        if scan.fallback_window == 0 {
            return Err(InvalidConfig::new("scan.fallback_window", "must be >= 1"));
        }

        let sim = &self.simulation;
        if sim.vol_window < 2 {
            return Err(InvalidConfig::new("simulation.vol_window", "must be >= 2"));
        }
        if !(sim.target_vol.is_finite() && sim.target_vol > 0.0) {
            return Err(InvalidConfig::new(
                "simulation.target_vol",
                format!("must be positive, got {}", sim.target_vol),
            ));
        }
        if !(sim.annualization.is_finite() && sim.annualization > 0.0) {
            return Err(InvalidConfig::new(
                "simulation.annualization",
                format!("must be positive, got {}", sim.annualization),
            ));
        }
        Ok(())
    }

    /// Simulator wired with this config's volatility settings and policy.
    pub fn simulator(&self) -> Simulator {
        Simulator::new(self.simulation.clone()).with_policy(self.policy.build())
    }
}
