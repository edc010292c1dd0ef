//! Scenario result export
//!
//! Serializes scenario reports together with the ensemble and slippage
//! summaries to JSON for external consumption.

use crate::error::SimulationError;
use crate::execution::SimulatedExecution;
use crate::reports::ensemble::{self, EnsembleSummary};
use crate::reports::slippage::{self, SlippageReport};
use crate::scenarios::ScenarioReport;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Combined export containing all outputs of one harness run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationExport {
    pub version: String,
    pub scenarios: Vec<ScenarioReport>,
    /// Present when more than one scenario ran
    pub ensemble: Option<EnsembleSummary>,
    pub slippage: Option<SlippageReport>,
}

/// Build an export from scenario reports and, optionally, the execution
/// history the slippage report should cover.
pub fn build_export(scenarios: Vec<ScenarioReport>, history: Option<&[SimulatedExecution]>) -> SimulationExport {
    let ensemble = (scenarios.len() > 1).then(|| {
        let metrics: Vec<_> = scenarios.iter().map(|r| r.metrics.clone()).collect();
        ensemble::summarize(&metrics)
    });
    SimulationExport {
        version: crate::VERSION.to_string(),
        scenarios,
        ensemble,
        slippage: history.map(slippage::analyze),
    }
}

pub fn export_json(export: &SimulationExport) -> Result<String, SimulationError> {
    Ok(serde_json::to_string_pretty(export)?)
}

pub fn write_to_file(export: &SimulationExport, path: impl AsRef<Path>) -> Result<(), SimulationError> {
    let json = export_json(export)?;
    std::fs::write(path, json)?;
    Ok(())
}
