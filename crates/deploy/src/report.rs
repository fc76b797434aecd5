//! The record of one deployment run.

use std::{fmt, path::Path};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use comfy_table::{Table, presets::UTF8_FULL};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{AddressBook, InitializationStep};

/// The default name of the file a report is saved to.
pub const REPORT_FILENAME: &str = "deployments.json";

/// Progress of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(tag = "state", content = "at", rename_all = "snake_case")]
pub enum RunState {
    #[default]
    #[display("not started")]
    NotStarted,
    /// Deploying the named component.
    #[display("deploying {_0}")]
    Deploying(String),
    /// Running the initialization step with the given 1-based index.
    #[display("initializing step {_0}")]
    Initializing(usize),
    /// Every step was attempted. Initialization steps may still have failed.
    #[display("complete")]
    Complete,
    /// A deployment failed and the remaining steps were skipped.
    #[display("aborted")]
    Aborted,
}

/// A component whose deployment has been confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedComponent {
    /// Logical name of the component.
    pub component: String,
    pub address: Address,
    /// Position in deployment order, starting at 0.
    pub sequence: usize,
    /// Unix timestamp (seconds) of the confirmation.
    pub deployed_at: i64,
}

/// Result of one initialization step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    Failed {
        /// The full error chain of the failed call.
        error: String,
    },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// The error message of a failed step.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Succeeded => None,
            Self::Failed { error } => Some(error),
        }
    }
}

/// An initialization step together with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: InitializationStep,
    pub outcome: StepOutcome,
}

/// Append-only record of a run: the deployed components and every initialization
/// step outcome, both in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub(crate) deployed: Vec<DeployedComponent>,
    pub(crate) steps: Vec<StepRecord>,
    pub(crate) state: RunState,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new report carrying over the deployments of `previous`, with no steps.
    pub(crate) fn resume(previous: &RunReport) -> Self {
        Self {
            deployed: previous.deployed.clone(),
            ..Self::default()
        }
    }

    /// The deployed components, in deployment order.
    pub fn deployed(&self) -> &[DeployedComponent] {
        &self.deployed
    }

    /// The initialization steps and their outcomes, in execution order.
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub(crate) fn transition(&mut self, state: RunState) {
        tracing::debug!(from = %self.state, to = %state, "Run state changed");
        self.state = state;
    }

    /// Record a confirmed deployment.
    pub fn record_deployment(&mut self, component: &str, address: Address) -> &DeployedComponent {
        let sequence = self.deployed.len();
        self.deployed.push(DeployedComponent {
            component: component.to_string(),
            address,
            sequence,
            deployed_at: chrono::Utc::now().timestamp(),
        });
        &self.deployed[sequence]
    }

    /// Record the outcome of an initialization step.
    pub fn record_step(&mut self, step: InitializationStep, outcome: StepOutcome) {
        self.steps.push(StepRecord { step, outcome });
    }

    /// The address of a deployed component.
    pub fn address_of(&self, component: &str) -> Option<Address> {
        self.deployed
            .iter()
            .find(|deployed| deployed.component == component)
            .map(|deployed| deployed.address)
    }

    /// All deployed addresses, by logical name.
    pub fn address_book(&self) -> AddressBook {
        self.deployed
            .iter()
            .map(|deployed| (deployed.component.clone(), deployed.address))
            .collect()
    }

    /// The steps that did not succeed.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|record| !record.outcome.is_success())
    }

    /// Whether every step was attempted.
    pub fn is_complete(&self) -> bool {
        self.state == RunState::Complete
    }

    /// Whether every step was attempted and every initialization succeeded.
    pub fn succeeded(&self) -> bool {
        self.is_complete() && self.failed_steps().next().is_none()
    }

    /// Save the report as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;

        std::fs::write(path, json)
            .context(format!("Failed to write run report to {}", path.display()))?;

        tracing::info!(path = %path.display(), "Run report saved");
        Ok(())
    }

    /// Load a report previously written by [`RunReport::save_to_file`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Run report does not exist: {}", path.display());
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read run report from {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse run report JSON")
    }

    /// Table of the deployed components.
    pub fn components_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["#", "Component", "Address"]);
        for deployed in &self.deployed {
            table.add_row(vec![
                deployed.sequence.to_string(),
                deployed.component.clone(),
                deployed.address.to_string(),
            ]);
        }
        table
    }

    /// Table of the initialization steps and their outcomes.
    pub fn steps_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["#", "Step", "Outcome"]);
        for (i, record) in self.steps.iter().enumerate() {
            let outcome = match &record.outcome {
                StepOutcome::Succeeded => "ok".to_string(),
                StepOutcome::Failed { error } => format!("FAILED: {error}"),
            };
            table.add_row(vec![(i + 1).to_string(), record.step.description(), outcome]);
        }
        table
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {}", self.state)?;
        writeln!(f, "{}", self.components_table())?;
        if !self.steps.is_empty() {
            writeln!(f, "{}", self.steps_table())?;
        }
        Ok(())
    }
}
