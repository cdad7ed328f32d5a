//! Node client: the only door to the remote ledger.
//!
//! # Responsibilities
//! - Ask the node for transfer templates (native and contract)
//! - Submit signed transactions
//! - Classify failures as transport vs. node-level refusal
//! - Provide a health probe for readiness checks

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::abi::TRANSFER_SIGNATURE;
use crate::blockchain::address::TronAddress;
use crate::blockchain::transaction::SignedTransaction;
use crate::blockchain::types::{
    decode_node_message, BroadcastReply, NodeConfig, NodeError, NodeResult, TronTransaction, Trx,
};

/// Header TronGrid uses for API keys (`TRON-PRO-API-KEY`).
pub const API_KEY_HEADER: &str = "tron-pro-api-key";

/// A contract call the node should turn into a transaction template.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    pub owner: TronAddress,
    pub contract: TronAddress,
    pub function_selector: &'static str,
    /// ABI-encoded parameters, selector excluded.
    pub parameter: Vec<u8>,
    /// Upper bound on execution cost, in sun.
    pub fee_limit_sun: u64,
}

impl ContractCall {
    /// A TRC-20 `transfer` call.
    pub fn transfer(owner: TronAddress, contract: TronAddress, parameter: Vec<u8>, fee_limit_sun: u64) -> Self {
        Self {
            owner,
            contract,
            function_selector: TRANSFER_SIGNATURE,
            parameter,
            fee_limit_sun,
        }
    }
}

/// What the pipeline needs from a ledger node.
///
/// Encoding fidelity is the node's job; callers decide which fields to fill.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Template for moving `amount` TRX from `owner` to `to`.
    async fn create_transfer(&self, owner: &TronAddress, to: &TronAddress, amount: Trx) -> NodeResult<TronTransaction>;

    /// Template for a contract call. `Ok(None)` when the node answered without
    /// a transaction object.
    async fn trigger_smart_contract(&self, call: &ContractCall) -> NodeResult<Option<TronTransaction>>;

    /// Submit a signed transaction. A parsed refusal is `Ok` with
    /// `result == false`; only delivery problems are `Err`.
    async fn broadcast(&self, tx: &SignedTransaction) -> NodeResult<BroadcastReply>;

    /// True if the node answers a cheap query.
    async fn is_healthy(&self) -> bool;
}

/// TronGrid / java-tron full-node HTTP API client.
#[derive(Clone)]
pub struct TronGridClient {
    http: reqwest::Client,
    base_url: String,
    config: NodeConfig,
    timeout_duration: Duration,
}

#[derive(Debug, Serialize)]
struct CreateTransactionBody {
    owner_address: String,
    to_address: String,
    amount: u64,
    visible: bool,
}

#[derive(Debug, Serialize)]
struct TriggerSmartContractBody<'a> {
    owner_address: String,
    contract_address: String,
    function_selector: &'a str,
    parameter: String,
    fee_limit: u64,
    call_value: u64,
    visible: bool,
}

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    #[serde(default)]
    result: TriggerResult,
    transaction: Option<TronTransaction>,
}

#[derive(Debug, Default, Deserialize)]
struct TriggerResult {
    #[serde(default)]
    result: bool,
    code: Option<String>,
    message: Option<String>,
}

impl TronGridClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `config` - Node configuration (base URL, optional API key, timeout)
    pub fn new(config: NodeConfig) -> NodeResult<Self> {
        let parsed: url::Url = config
            .base_url
            .parse()
            .map_err(|e| NodeError::Config(format!("Invalid node URL '{}': {}", config.base_url, e)))?;

        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_ref().filter(|k| !k.expose().is_empty()) {
            let mut value = HeaderValue::from_str(key.expose())
                .map_err(|_| NodeError::Config("API key is not a valid header value".to_string()))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| NodeError::Config(e.to_string()))?;

        tracing::info!(base_url = %parsed, timeout_secs = config.timeout_secs, "Node client initialized");

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            timeout_duration: Duration::from_secs(config.timeout_secs),
            config,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and return the decoded JSON answer.
    async fn post<B, R>(&self, path: &str, body: &B) -> NodeResult<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let fut = async {
            let response = self
                .http
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| NodeError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(NodeError::Transport(format!("HTTP {} from {}: {}", status, path, text)));
            }

            let value: serde_json::Value = response
                .json()
                .await
                .map_err(|e| NodeError::Malformed(e.to_string()))?;
            Ok::<serde_json::Value, NodeError>(value)
        };

        let value = match timeout(self.timeout_duration, fut).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(path = %path, "Node request timed out");
                return Err(NodeError::Timeout(self.config.timeout_secs));
            }
        };

        // java-tron reports request-level refusals as {"Error": "..."} with HTTP 200
        if let Some(error) = value.get("Error").and_then(|e| e.as_str()) {
            return Err(NodeError::Refused(error.to_string()));
        }

        serde_json::from_value(value).map_err(|e| NodeError::Malformed(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl NodeClient for TronGridClient {
    async fn create_transfer(&self, owner: &TronAddress, to: &TronAddress, amount: Trx) -> NodeResult<TronTransaction> {
        let body = CreateTransactionBody {
            owner_address: owner.to_base58(),
            to_address: to.to_base58(),
            amount: amount.to_sun(),
            visible: true,
        };
        self.post("wallet/createtransaction", &body).await
    }

    async fn trigger_smart_contract(&self, call: &ContractCall) -> NodeResult<Option<TronTransaction>> {
        let body = TriggerSmartContractBody {
            owner_address: call.owner.to_base58(),
            contract_address: call.contract.to_base58(),
            function_selector: call.function_selector,
            parameter: hex::encode(&call.parameter),
            fee_limit: call.fee_limit_sun,
            call_value: 0,
            visible: true,
        };
        let response: TriggerResponse = self.post("wallet/triggersmartcontract", &body).await?;

        if !response.result.result {
            let code = response.result.code.unwrap_or_else(|| "UNKNOWN".to_string());
            let message = response
                .result
                .message
                .as_deref()
                .map(decode_node_message)
                .unwrap_or_default();
            return Err(NodeError::Refused(format!("{}: {}", code, message)));
        }

        Ok(response.transaction)
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> NodeResult<BroadcastReply> {
        let mut reply: BroadcastReply = self.post("wallet/broadcasttransaction", &tx.wire()).await?;
        reply.message = reply.message.as_deref().map(decode_node_message);
        Ok(reply)
    }

    async fn is_healthy(&self) -> bool {
        let result: NodeResult<serde_json::Value> = self.post("wallet/getnowblock", &serde_json::json!({})).await;
        match result {
            Ok(block) => block.get("blockID").is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "Node health probe failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for TronGridClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TronGridClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .field("api_key", &self.config.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}
