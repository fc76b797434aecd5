//! Errors that terminate a deployment run.

use crate::RunReport;

/// Errors surfaced to the caller of a deployment run.
///
/// Initialization failures never appear here: they are absorbed into the
/// [`RunReport`] as failed step outcomes.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A required configuration field is missing or malformed. Raised before any
    /// transaction is sent.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The plan references a component that is not available at that point.
    #[error("invalid deployment plan: {0}")]
    InvalidPlan(String),

    /// A component could not be deployed and confirmed.
    ///
    /// Components confirmed before the failure stay recorded in `report`; they are
    /// not rolled back.
    #[error("failed to deploy `{component}`: {source:#}")]
    Deployment {
        /// Logical name of the component that failed.
        component: String,
        /// Everything the run produced up to the failure.
        report: Box<RunReport>,
        #[source]
        source: anyhow::Error,
    },
}

impl DeployError {
    /// The partial report of an aborted run, if any.
    pub fn partial_report(&self) -> Option<&RunReport> {
        match self {
            Self::Deployment { report, .. } => Some(report),
            _ => None,
        }
    }
}
