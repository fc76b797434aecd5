//! Payment tokens for development networks.

use crate::{
    ArgSource, ContractRegistry, DeployError, DeploymentPlan, Orchestrator, RunReport,
    config::Erc20Config,
};

/// Kind of the payment token components, deployed as `erc20:<SYMBOL>`.
pub const ERC20: &str = "erc20";

/// Logical name of the payment token with the given symbol.
pub fn erc20_component(symbol: &str) -> String {
    format!("{ERC20}:{symbol}")
}

/// A plan deploying one capped ERC20 per entry of `tokens`.
pub fn erc20_plan(tokens: &[Erc20Config]) -> Result<DeploymentPlan, DeployError> {
    let mut builder = DeploymentPlan::builder();
    for token in tokens {
        builder = builder.deploy(
            erc20_component(&token.symbol),
            vec![
                ArgSource::literal(token.name.as_str()),
                ArgSource::literal(token.symbol.as_str()),
                ArgSource::literal(token.cap()?),
            ],
        );
    }
    builder.build()
}

/// Deploy the configured payment tokens.
pub async fn deploy_erc20_tokens<R: ContractRegistry>(
    tokens: &[Erc20Config],
    registry: &R,
) -> Result<RunReport, DeployError> {
    if tokens.is_empty() {
        return Err(DeployError::Configuration(
            "no [[erc20]] token is configured".to_string(),
        ));
    }

    let plan = erc20_plan(tokens)?;
    Orchestrator::new(registry).run(&plan).await
}
