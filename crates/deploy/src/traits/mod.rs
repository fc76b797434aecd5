//! Seams between the orchestrator and the chain it deploys to.

mod registry;

pub use registry::ContractRegistry;
