//! Declarative deployment plans.
//!
//! A plan is an ordered list of steps. Each step either deploys a component or
//! calls an initializer on an already-deployed one, and each argument is either a
//! literal from the configuration or the address of a component deployed by a
//! strictly earlier step. Plans can only be built through [`PlanBuilder`], which
//! rejects forward references, so a [`DeploymentPlan`] is always executable in
//! declaration order.
//!
//! # Example
//!
//! ```
//! use arena_deploy::{ArgSource, DeploymentPlan};
//!
//! let plan = DeploymentPlan::builder()
//!     .deploy("factory", vec![ArgSource::literal(5u64)])
//!     .deploy("token", vec![ArgSource::address_of("factory")])
//!     .initialize("factory", "init", vec![ArgSource::address_of("token")])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(plan.deployments().count(), 2);
//! ```

mod args;
mod builder;
mod canonical;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use args::{AddressBook, ArgSource, ArgValue};
pub use builder::PlanBuilder;
pub use canonical::{FACTORY, MARKETPLACE, TOKEN};

/// Static description of one deployable component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// Logical name, unique within a plan.
    pub component: String,
    /// Constructor arguments, in order.
    pub args: Vec<ArgSource>,
}

/// A post-deployment call on a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializationStep {
    /// Logical name of the component the method is called on.
    pub target: String,
    pub method: String,
    /// Method arguments, in order.
    pub args: Vec<ArgSource>,
}

impl InitializationStep {
    /// Human-readable form, e.g. `factory.init(token)`.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InitializationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.target, self.method)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PlanStep {
    Deploy(DeploymentSpec),
    Initialize(InitializationStep),
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deploy(spec) => {
                write!(f, "deploy {}(", spec.component)?;
                for (i, arg) in spec.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Initialize(step) => write!(f, "call {step}"),
        }
    }
}

/// A validated, ordered deployment plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentPlan {
    steps: Vec<PlanStep>,
}

impl DeploymentPlan {
    /// Start building a plan.
    pub fn builder() -> PlanBuilder {
        PlanBuilder::new()
    }

    /// All steps, in execution order.
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// The deployment steps, in execution order.
    pub fn deployments(&self) -> impl Iterator<Item = &DeploymentSpec> {
        self.steps.iter().filter_map(|step| match step {
            PlanStep::Deploy(spec) => Some(spec),
            PlanStep::Initialize(_) => None,
        })
    }

    /// The initialization steps, in execution order.
    pub fn initializations(&self) -> impl Iterator<Item = &InitializationStep> {
        self.steps.iter().filter_map(|step| match step {
            PlanStep::Initialize(step) => Some(step),
            PlanStep::Deploy(_) => None,
        })
    }
}
