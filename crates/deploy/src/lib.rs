//! arena-deploy - Deployment library for the Theta Arena NFT contracts.
//!
//! This crate deploys and wires together the minting-authorization factory, the
//! NFT token and the marketplace. A [`DeploymentPlan`] declares the steps and the
//! [`Orchestrator`] runs them against a [`ContractRegistry`], recording everything
//! in a [`RunReport`].

mod config;
pub use config::{
    ARENA_CONFIG_FILENAME, ArenaConfig, ArtifactsConfig, ContractsConfig, DEFAULT_ARTIFACTS_PATH,
    DEFAULT_LOCAL_RPC_URL, DEFAULT_NETWORK, DeploymentParams, ENV_PREFIX, Erc20Config,
    NetworkConfig, TokenConfig,
};

mod error;
pub use error::DeployError;

pub mod erc20;
pub use erc20::{ERC20, deploy_erc20_tokens};

mod orchestrator;
pub use orchestrator::{Orchestrator, run_deployment_plan};

mod plan;
pub use plan::{
    AddressBook, ArgSource, ArgValue, DeploymentPlan, DeploymentSpec, FACTORY, InitializationStep,
    MARKETPLACE, PlanBuilder, PlanStep, TOKEN,
};

pub mod registry;
pub use registry::{Artifact, RpcRegistry};

mod report;
pub use report::{
    DeployedComponent, REPORT_FILENAME, RunReport, RunState, StepOutcome, StepRecord,
};

pub mod rpc;

mod traits;
pub use traits::ContractRegistry;
