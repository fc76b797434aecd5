//! arena deploys the Theta Arena NFT contracts to an EVM network.

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use arena_deploy::{
    ArenaConfig, DeployError, DeploymentPlan, NetworkConfig, Orchestrator, REPORT_FILENAME,
    RpcRegistry, RunReport, deploy_erc20_tokens, run_deployment_plan,
};
use cli::{Cli, Command, OutputFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = ArenaConfig::load(&cli.config)?;

    match &cli.command {
        Command::Plan => {
            let plan = DeploymentPlan::canonical(&config.resolve()?)?;
            match cli.format {
                OutputFormat::Table => {
                    for (i, step) in plan.steps().iter().enumerate() {
                        println!("{:>2}. {}", i + 1, step);
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            }
        }
        Command::Accounts => {
            let registry = connect(&cli, &config).await?;
            for account in registry.accounts().await? {
                println!("{account}");
            }
        }
        Command::Deploy { outdata } => {
            // Validate before touching the network.
            let params = config.resolve()?;
            let registry = connect(&cli, &config).await?;
            registry.log_deployer_balance().await?;

            std::fs::create_dir_all(outdata)
                .with_context(|| format!("Failed to create {}", outdata.display()))?;

            let result = run_deployment_plan(&params, &registry).await;
            let report_path = outdata.join(REPORT_FILENAME);
            let report = save_report(result, &report_path)?;

            print_report(&report, cli.format)?;
            warn_failed_steps(&report);
            registry.log_deployer_balance().await?;
        }
        Command::Rewire { report } => {
            let previous = RunReport::load_from_file(report)?;
            let plan = DeploymentPlan::canonical(&config.resolve()?)?;
            let registry = connect(&cli, &config).await?;

            let rewired = Orchestrator::new(&registry)
                .rewire(&plan, &previous)
                .await?;
            rewired.save_to_file(report)?;

            print_report(&rewired, cli.format)?;
            warn_failed_steps(&rewired);
        }
        Command::DeployErc20 => {
            let registry = connect(&cli, &config).await?;
            let report = deploy_erc20_tokens(&config.erc20, &registry).await?;

            for deployed in report.deployed() {
                tracing::info!(
                    component = %deployed.component,
                    address = %deployed.address,
                    "Payment token deployed"
                );
            }
            print_report(&report, cli.format)?;
        }
    }

    Ok(())
}

async fn connect(cli: &Cli, config: &ArenaConfig) -> Result<RpcRegistry> {
    let mut network: NetworkConfig = config.network(&cli.network)?;
    if let Some(url) = &cli.rpc_url {
        network.url = url.clone();
    }

    tracing::info!(network = %cli.network, url = %network.url, "Connecting to network...");

    RpcRegistry::connect(&network, config.artifacts.clone())
        .await
        .with_context(|| format!("Failed to connect to network `{}`", cli.network))
}

/// Persist the report of a run, including the partial report of an aborted run,
/// then hand back the complete report or the run error.
fn save_report(result: Result<RunReport, DeployError>, path: &Path) -> Result<RunReport> {
    match result {
        Ok(report) => {
            report.save_to_file(path)?;
            Ok(report)
        }
        Err(err) => {
            if let Some(partial) = err.partial_report() {
                eprintln!("{partial}");
                if let Err(save_error) = partial.save_to_file(path) {
                    tracing::error!(
                        path = %path.display(),
                        error = %format!("{save_error:#}"),
                        "Failed to save the partial run report"
                    );
                }
            }
            Err(err.into())
        }
    }
}

fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

fn warn_failed_steps(report: &RunReport) {
    for record in report.failed_steps() {
        tracing::warn!(
            step = %record.step,
            error = record.outcome.error().unwrap_or_default(),
            "Initialization step failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn aborted() -> DeployError {
        DeployError::Deployment {
            component: "marketplace".to_string(),
            report: Box::new(RunReport::new()),
            source: anyhow::anyhow!("out of gas"),
        }
    }

    #[test]
    fn test_save_report_keeps_deployment_error_when_save_fails() {
        let dir = TempDir::new("arena-main").unwrap();
        let unwritable = dir.path().join("missing").join(REPORT_FILENAME);

        let err = save_report(Err(aborted()), &unwritable).unwrap_err();

        let deploy_error = err.downcast_ref::<DeployError>().unwrap();
        assert!(matches!(
            deploy_error,
            DeployError::Deployment { component, .. } if component == "marketplace"
        ));
        assert!(!unwritable.exists());
    }

    #[test]
    fn test_save_report_writes_partial_report() {
        let dir = TempDir::new("arena-main").unwrap();
        let path = dir.path().join(REPORT_FILENAME);

        assert!(save_report(Err(aborted()), &path).is_err());
        assert_eq!(RunReport::load_from_file(&path).unwrap(), RunReport::new());
    }
}
