//! Submission of signed transactions.
//!
//! # Design Decisions
//! - Signature form is checked before anything leaves the process
//! - No retries: a resubmission could double-spend if the first attempt landed
//! - Transport failure and node refusal are distinct outcomes

use serde::Serialize;
use std::sync::Arc;

use crate::blockchain::client::NodeClient;
use crate::blockchain::transaction::SignedTransaction;
use crate::blockchain::types::{BroadcastReply, NodeError};
use crate::observability::metrics;
use crate::signing::error::BroadcastError;

/// Node verdict on a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastResult {
    pub success: bool,
    /// Transaction id, present when accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    /// Node code and decoded reason, present when refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
    /// Reply as the node sent it (message decoded).
    #[serde(skip)]
    pub reply: BroadcastReply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: String,
    pub reason: String,
}

impl BroadcastResult {
    fn from_reply(tx: &SignedTransaction, reply: BroadcastReply) -> Self {
        if reply.result {
            Self {
                success: true,
                txid: Some(reply.txid.clone().unwrap_or_else(|| tx.tx_id().to_string())),
                rejection: None,
                reply,
            }
        } else {
            Self {
                success: false,
                txid: None,
                rejection: Some(Rejection {
                    code: reply.code.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
                    reason: reply.message.clone().unwrap_or_default(),
                }),
                reply,
            }
        }
    }

    /// Accepted reply, or the refusal as an error.
    pub fn into_accepted(self) -> Result<BroadcastReply, BroadcastError> {
        match self.rejection {
            Some(Rejection { code, reason }) => Err(BroadcastError::NodeRejected { code, reason }),
            None => Ok(self.reply),
        }
    }
}

/// Sends signed transactions to the node.
#[derive(Clone)]
pub struct Broadcaster {
    node: Arc<dyn NodeClient>,
}

impl Broadcaster {
    pub fn new(node: Arc<dyn NodeClient>) -> Self {
        Self { node }
    }

    pub async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResult, BroadcastError> {
        tx.validate()?;

        let reply = match self.node.broadcast(tx).await {
            Ok(reply) => reply,
            Err(NodeError::Refused(reason)) => {
                // {"Error": ...} replies: the node parsed the request and said no
                metrics::record_broadcast("rejected");
                return Ok(BroadcastResult::from_reply(
                    tx,
                    BroadcastReply {
                        result: false,
                        code: Some("ERROR".to_string()),
                        message: Some(reason),
                        ..Default::default()
                    },
                ));
            }
            Err(e) => {
                tracing::error!(tx_id = %tx.tx_id(), error = %e, "Broadcast transport failure");
                metrics::record_broadcast("transport_error");
                return Err(BroadcastError::Transport(e));
            }
        };

        let result = BroadcastResult::from_reply(tx, reply);
        match &result.rejection {
            None => {
                metrics::record_broadcast("accepted");
                tracing::info!(tx_id = %tx.tx_id(), "Transaction accepted by node");
            }
            Some(rejection) => {
                metrics::record_broadcast("rejected");
                tracing::warn!(
                    tx_id = %tx.tx_id(),
                    code = %rejection.code,
                    reason = %rejection.reason,
                    "Transaction rejected by node"
                );
            }
        }
        Ok(result)
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::address::TronAddress;
    use crate::blockchain::client::ContractCall;
    use crate::blockchain::transaction::{TxMetadata, UnsignedTransaction};
    use crate::blockchain::types::{NodeResult, TronTransaction, Trx};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedNode {
        reply: Mutex<Option<NodeResult<BroadcastReply>>>,
        sent: AtomicUsize,
    }

    impl ScriptedNode {
        fn new(reply: NodeResult<BroadcastReply>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                sent: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NodeClient for ScriptedNode {
        async fn create_transfer(&self, _: &TronAddress, _: &TronAddress, _: Trx) -> NodeResult<TronTransaction> {
            unreachable!()
        }

        async fn trigger_smart_contract(&self, _: &ContractCall) -> NodeResult<Option<TronTransaction>> {
            unreachable!()
        }

        async fn broadcast(&self, _tx: &SignedTransaction) -> NodeResult<BroadcastReply> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            self.reply.lock().unwrap().take().unwrap()
        }

        async fn is_healthy(&self) -> bool {
            true
        }
    }

    fn signed(signatures: Vec<Vec<u8>>) -> SignedTransaction {
        let tx = TronTransaction {
            tx_id: "ab".repeat(32),
            raw_data: serde_json::json!({}),
            raw_data_hex: "0a".into(),
            visible: true,
        };
        let owner: TronAddress = "41a614f803b6fd780986a42c78ec9c7f77e6ded13c".parse().unwrap();
        let unsigned = UnsignedTransaction::new(owner, tx, TxMetadata::Native { amount: Trx(1), amount_sun: 1_000_000 });
        SignedTransaction::new(unsigned, signatures)
    }

    fn good_sig() -> Vec<u8> {
        let mut sig = vec![7u8; 65];
        sig[64] = 28;
        sig
    }

    #[tokio::test]
    async fn test_accepted() {
        let node = ScriptedNode::new(Ok(BroadcastReply {
            result: true,
            txid: Some("ab".repeat(32)),
            ..Default::default()
        }));
        let result = Broadcaster::new(node.clone()).broadcast(&signed(vec![good_sig()])).await.unwrap();
        assert!(result.success);
        assert_eq!(result.txid.as_deref(), Some("ab".repeat(32).as_str()));
        assert!(result.rejection.is_none());
        assert!(result.into_accepted().is_ok());
    }

    #[tokio::test]
    async fn test_rejected_keeps_code_and_reason() {
        let node = ScriptedNode::new(Ok(BroadcastReply {
            result: false,
            code: Some("SIGERROR".into()),
            message: Some("validate signature error".into()),
            ..Default::default()
        }));
        let result = Broadcaster::new(node).broadcast(&signed(vec![good_sig()])).await.unwrap();
        assert!(!result.success);
        match result.into_accepted().unwrap_err() {
            BroadcastError::NodeRejected { code, reason } => {
                assert_eq!(code, "SIGERROR");
                assert_eq!(reason, "validate signature error");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let node = ScriptedNode::new(Err(NodeError::Timeout(10)));
        let err = Broadcaster::new(node).broadcast(&signed(vec![good_sig()])).await.unwrap_err();
        assert!(matches!(err, BroadcastError::Transport(NodeError::Timeout(10))));
    }

    #[tokio::test]
    async fn test_invalid_signature_never_sent() {
        let node = ScriptedNode::new(Ok(BroadcastReply::default()));
        let broadcaster = Broadcaster::new(node.clone());

        let err = broadcaster.broadcast(&signed(vec![])).await.unwrap_err();
        assert!(matches!(err, BroadcastError::InvalidSignedTransaction(_)));

        let err = broadcaster
            .broadcast(&signed(vec![good_sig(), good_sig()]))
            .await
            .unwrap_err();
        assert!(matches!(err, BroadcastError::InvalidSignedTransaction(_)));

        assert_eq!(node.sent.load(Ordering::SeqCst), 0);
    }
}
