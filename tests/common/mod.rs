//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use tron_signer::blockchain::{
    BroadcastReply, ContractCall, NodeClient, NodeError, SignedTransaction, TronAddress, TronTransaction, Trx,
};
use tron_signer::config::{SecretString, SignerConfig};
use tron_signer::http::{AppState, HttpServer};
use tron_signer::lifecycle::assemble;

pub const SECRET: &str = "integration-secret";
/// Anvil's first development key.
pub const PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
/// Address of `PRIVATE_KEY`.
pub const SIGNER_ADDRESS: &str = "41f39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const RECIPIENT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
pub const OTHER_ACCOUNT: &str = "41a614f803b6fd780986a42c78ec9c7f77e6ded13c";
pub const TOKEN: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

/// What the mock answers to a broadcast.
#[derive(Debug, Clone)]
pub enum BroadcastMode {
    Accept,
    Reject { code: String, message: String },
    Transport,
}

/// Recording `NodeClient` double.
///
/// Templates are internally consistent (`txID` is the SHA-256 of
/// `raw_data_hex`) so the real signer accepts them.
pub struct MockNode {
    pub create_calls: AtomicUsize,
    pub trigger_calls: AtomicUsize,
    pub broadcast_calls: AtomicUsize,
    pub transfers: Mutex<Vec<(TronAddress, TronAddress, Trx)>>,
    pub contract_calls: Mutex<Vec<ContractCall>>,
    pub broadcasts: Mutex<Vec<(String, Vec<String>)>>,
    pub broadcast_mode: Mutex<BroadcastMode>,
    pub healthy: AtomicBool,
    pub build_error: Mutex<Option<String>>,
    /// Sleep inside build and broadcast, to widen the critical section.
    pub delay: Duration,
    in_flight: Mutex<HashMap<String, usize>>,
    total_in_flight: AtomicUsize,
    pub max_same_account: AtomicUsize,
    pub max_total: AtomicUsize,
    counter: AtomicUsize,
}

impl Default for MockNode {
    fn default() -> Self {
        Self {
            create_calls: AtomicUsize::new(0),
            trigger_calls: AtomicUsize::new(0),
            broadcast_calls: AtomicUsize::new(0),
            transfers: Mutex::new(Vec::new()),
            contract_calls: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
            broadcast_mode: Mutex::new(BroadcastMode::Accept),
            healthy: AtomicBool::new(true),
            build_error: Mutex::new(None),
            delay: Duration::ZERO,
            in_flight: Mutex::new(HashMap::new()),
            total_in_flight: AtomicUsize::new(0),
            max_same_account: AtomicUsize::new(0),
            max_total: AtomicUsize::new(0),
            counter: AtomicUsize::new(0),
        }
    }
}

impl MockNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Default::default()
        })
    }

    pub fn set_broadcast_mode(&self, mode: BroadcastMode) {
        *self.broadcast_mode.lock().unwrap() = mode;
    }

    pub fn fail_builds(&self, message: &str) {
        *self.build_error.lock().unwrap() = Some(message.to_string());
    }

    /// Calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.trigger_calls.load(Ordering::SeqCst)
            + self.broadcast_calls.load(Ordering::SeqCst)
    }

    fn template(&self, label: &str, owner: &TronAddress) -> TronTransaction {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let raw = format!("{}:{}:{}", label, owner.to_hex(), n).into_bytes();
        TronTransaction {
            tx_id: hex::encode(Sha256::digest(&raw)),
            raw_data: serde_json::json!({ "label": label, "n": n }),
            raw_data_hex: hex::encode(&raw),
            visible: true,
        }
    }

    fn enter(&self, owner: &TronAddress) {
        let mut in_flight = self.in_flight.lock().unwrap();
        let count = in_flight.entry(owner.to_base58()).or_insert(0);
        *count += 1;
        self.max_same_account.fetch_max(*count, Ordering::SeqCst);
        let total = self.total_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_total.fetch_max(total, Ordering::SeqCst);
    }

    fn exit(&self, owner: &TronAddress) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(count) = in_flight.get_mut(&owner.to_base58()) {
            *count = count.saturating_sub(1);
        }
        self.total_in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn create_transfer(&self, owner: &TronAddress, to: &TronAddress, amount: Trx) -> Result<TronTransaction, NodeError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let build_error = self.build_error.lock().unwrap().clone();
        if let Some(message) = build_error {
            return Err(NodeError::Refused(message));
        }
        self.enter(owner);
        self.pause().await;
        self.transfers.lock().unwrap().push((*owner, *to, amount));
        Ok(self.template("transfer", owner))
    }

    async fn trigger_smart_contract(&self, call: &ContractCall) -> Result<Option<TronTransaction>, NodeError> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        let build_error = self.build_error.lock().unwrap().clone();
        if let Some(message) = build_error {
            return Err(NodeError::Refused(message));
        }
        self.enter(&call.owner);
        self.pause().await;
        self.contract_calls.lock().unwrap().push(call.clone());
        Ok(Some(self.template("trigger", &call.owner)))
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastReply, NodeError> {
        self.broadcast_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let owner = tx.unsigned().owner();
        self.broadcasts.lock().unwrap().push((
            tx.tx_id().to_string(),
            tx.signatures().iter().map(hex::encode).collect(),
        ));
        self.exit(&owner);

        let mode = self.broadcast_mode.lock().unwrap().clone();
        match mode {
            BroadcastMode::Accept => Ok(BroadcastReply {
                result: true,
                txid: Some(tx.tx_id().to_string()),
                ..Default::default()
            }),
            BroadcastMode::Reject { code, message } => Ok(BroadcastReply {
                result: false,
                code: Some(code),
                message: Some(message),
                ..Default::default()
            }),
            BroadcastMode::Transport => Err(NodeError::Transport("connection reset".to_string())),
        }
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

/// Valid configuration with test credentials.
pub fn test_config() -> SignerConfig {
    let mut config = SignerConfig::default();
    config.signer_secret = Some(SecretString::new(SECRET));
    config.private_key = Some(SecretString::new(PRIVATE_KEY));
    config.node.base_url = "http://127.0.0.1:1".to_string();
    config
}

pub fn test_state(node: Arc<MockNode>) -> AppState {
    assemble(&test_config(), node).unwrap()
}

/// Fully layered router backed by `node`.
pub fn test_router(node: Arc<MockNode>) -> Router {
    HttpServer::new(test_config(), test_state(node)).router()
}

/// `POST /sign` with an optional secret header.
pub fn sign_request(body: &str, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/sign")
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-signer-secret", secret);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Drive one request through the router and decode the JSON answer.
pub async fn call(router: Router, request: Request<Body>) -> (u16, serde_json::Value) {
    let response: Response<Body> = router.oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
