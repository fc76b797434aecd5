//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::time::Duration;

use alloy_core::primitives::{Address, U64};
use anyhow::Context;
use backon::{ConstantBuilder, Retryable};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error
/// response. The node's error message (e.g. a revert reason) is kept in the error.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    tracing::trace!(method, ?params, "JSON-RPC request");

    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!("RPC error: {}", rpc_error_message(error));
    }

    let result_value = result
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// The message of a JSON-RPC error object, followed by its `data` (the revert
/// payload of a failed `eth_call`) when the node sends one.
fn rpc_error_message(error: &Value) -> String {
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("unknown");

    match error.get("data") {
        None | Some(Value::Null) => message.to_string(),
        Some(Value::String(data)) => format!("{message} (data: {data})"),
        Some(data) => format!("{message} (data: {data})"),
    }
}

/// The subset of a transaction receipt the registry looks at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// Address of the created contract, for deployments.
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// `1` on success, `0` on revert. Missing on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U64>,
}

impl TransactionReceipt {
    /// Whether the transaction was executed without reverting.
    pub fn succeeded(&self) -> bool {
        self.status != Some(U64::ZERO)
    }
}

/// How long to wait for a transaction to be mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Delay between two receipt polls.
    pub poll_interval: Duration,
    /// Maximum time to wait for the receipt.
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300),
        }
    }
}

impl ConfirmationPolicy {
    fn max_polls(&self) -> usize {
        let interval = self.poll_interval.as_millis().max(1);
        (self.timeout.as_millis() / interval).max(1) as usize
    }
}

/// Poll `eth_getTransactionReceipt` until the transaction is mined.
pub async fn wait_for_receipt(
    client: &reqwest::Client,
    url: &str,
    tx_hash: &str,
    policy: ConfirmationPolicy,
) -> Result<TransactionReceipt, anyhow::Error> {
    let fetch = || async move {
        let receipt: Option<TransactionReceipt> = json_rpc_call(
            client,
            url,
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await?;

        receipt.ok_or_else(|| anyhow::anyhow!("Transaction {} is still pending", tx_hash))
    };

    fetch
        .retry(
            ConstantBuilder::default()
                .with_delay(policy.poll_interval)
                .with_max_times(policy.max_polls()),
        )
        .notify(|e: &anyhow::Error, _| {
            tracing::trace!(error = %e, tx_hash, "Receipt not available yet, retrying...");
        })
        .await
        .with_context(|| format!("Transaction {} was not confirmed", tx_hash))
}
