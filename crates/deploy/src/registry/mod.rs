//! [`ContractRegistry`] backed by a JSON-RPC node and Hardhat artifacts.

mod artifact;

pub use artifact::Artifact;

use alloy_core::primitives::{Address, Bytes, U256, utils::format_ether};
use anyhow::{Context, Result};
use serde_json::json;
use url::Url;

use crate::{
    ArgValue, ContractRegistry, FACTORY, MARKETPLACE, TOKEN,
    config::{ArtifactsConfig, NetworkConfig},
    erc20::ERC20,
    rpc::{ConfirmationPolicy, TransactionReceipt, create_client, json_rpc_call, wait_for_receipt},
};

/// Sends transactions from an account unlocked on the node (a local dev node or a
/// node with a configured signer).
pub struct RpcRegistry {
    client: reqwest::Client,
    url: Url,
    from: Address,
    artifacts: ArtifactsConfig,
    policy: ConfirmationPolicy,
}

impl RpcRegistry {
    /// Connect to `network`. Transactions are sent from the configured account, or
    /// from the first account the node reports.
    pub async fn connect(network: &NetworkConfig, artifacts: ArtifactsConfig) -> Result<Self> {
        let client = create_client()?;

        let from = match network.from {
            Some(from) => from,
            None => {
                let accounts: Vec<Address> =
                    json_rpc_call(&client, network.url.as_str(), "eth_accounts", vec![])
                        .await
                        .with_context(|| format!("Failed to list accounts of {}", network.url))?;
                accounts.first().copied().with_context(|| {
                    format!("{} has no unlocked account to deploy from", network.url)
                })?
            }
        };

        tracing::debug!(url = %network.url, deployer = %from, "Connected to network");

        Ok(Self {
            client,
            url: network.url.clone(),
            from,
            artifacts,
            policy: ConfirmationPolicy::default(),
        })
    }

    pub fn with_confirmation_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The account transactions are sent from.
    pub fn deployer(&self) -> Address {
        self.from
    }

    /// The accounts unlocked on the node.
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        json_rpc_call(&self.client, self.url.as_str(), "eth_accounts", vec![]).await
    }

    /// Balance of `account`, in wei.
    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        json_rpc_call(
            &self.client,
            self.url.as_str(),
            "eth_getBalance",
            vec![json!(account), json!("latest")],
        )
        .await
        .with_context(|| format!("Failed to get balance of {}", account))
    }

    /// Log the balance of the deploying account.
    pub async fn log_deployer_balance(&self) -> Result<U256> {
        let balance = self.balance_of(self.from).await?;
        tracing::info!(
            deployer = %self.from,
            balance = %format_ether(balance),
            "Deployer balance (ETH)"
        );
        Ok(balance)
    }

    /// Name of the contract deployed for `component`. `kind:instance` components
    /// share the contract of `kind`.
    pub fn contract_for(&self, component: &str) -> Result<&str> {
        let kind = component
            .split_once(':')
            .map_or(component, |(kind, _)| kind);

        match kind {
            FACTORY => Ok(&self.artifacts.factory),
            TOKEN => Ok(&self.artifacts.token),
            MARKETPLACE => Ok(&self.artifacts.marketplace),
            ERC20 => Ok(&self.artifacts.erc20),
            _ => anyhow::bail!("No contract is registered for component `{}`", component),
        }
    }

    fn artifact(&self, component: &str) -> Result<Artifact> {
        Artifact::load(&self.artifacts.path, self.contract_for(component)?)
    }

    /// Simulate, send and confirm a transaction. `to` is `None` for deployments.
    async fn send_transaction(&self, to: Option<Address>, data: Bytes) -> Result<TransactionReceipt> {
        let mut tx = json!({ "from": self.from, "data": data });
        if let Some(to) = to {
            tx["to"] = json!(to);
        }

        // Surfaces the revert reason, which a mined receipt does not carry.
        let _: Bytes = json_rpc_call(
            &self.client,
            self.url.as_str(),
            "eth_call",
            vec![tx.clone(), json!("latest")],
        )
        .await
        .context("Transaction simulation failed")?;

        let tx_hash: String =
            json_rpc_call(&self.client, self.url.as_str(), "eth_sendTransaction", vec![tx])
                .await
                .context("Failed to send transaction")?;

        tracing::debug!(tx_hash = %tx_hash, "Transaction sent, waiting for confirmation...");

        let receipt = wait_for_receipt(&self.client, self.url.as_str(), &tx_hash, self.policy).await?;

        if !receipt.succeeded() {
            anyhow::bail!("Transaction {} reverted", receipt.transaction_hash);
        }

        tracing::debug!(
            tx_hash = %receipt.transaction_hash,
            block = ?receipt.block_number,
            gas_used = ?receipt.gas_used,
            "Transaction confirmed"
        );

        Ok(receipt)
    }
}

impl ContractRegistry for RpcRegistry {
    async fn deploy_and_confirm(&self, component: &str, args: &[ArgValue]) -> Result<Address> {
        let artifact = self.artifact(component)?;
        let data = artifact.deploy_data(args)?;

        let receipt = self
            .send_transaction(None, data)
            .await
            .with_context(|| format!("Failed to deploy {}", artifact.contract_name))?;

        receipt.contract_address.with_context(|| {
            format!(
                "Receipt of {} has no contract address",
                receipt.transaction_hash
            )
        })
    }

    async fn attach_and_call(
        &self,
        component: &str,
        address: Address,
        method: &str,
        args: &[ArgValue],
    ) -> Result<()> {
        let artifact = self.artifact(component)?;
        let data = artifact.call_data(method, args)?;

        self.send_transaction(Some(address), data)
            .await
            .with_context(|| format!("{}.{} failed", artifact.contract_name, method))?;

        Ok(())
    }
}
