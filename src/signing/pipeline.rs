//! End-to-end `/sign` pipeline.
//!
//! ```text
//! received → authenticated → normalized → built → signed → broadcast → completed
//!     └──────────────┴─────────────┴──────────┴────────┴──────────┴──→ error(stage)
//! ```
//!
//! Build, sign and broadcast run under the `from` account's lock; the lock is
//! released only once the node's verdict (or a failure) is known.
//!
//! Each request runs as a spawned job. Dropping the caller's future (client
//! gone, server draining) does not cancel it: a transaction that may already
//! be on the wire is seen through to the node's answer, lock held.

use axum::http::HeaderMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::auth::Authenticator;
use crate::blockchain::address::TronAddress;
use crate::blockchain::client::NodeClient;
use crate::blockchain::transaction::TransferKind;
use crate::blockchain::types::BroadcastReply;
use crate::blockchain::wallet::Wallet;
use crate::config::schema::SigningConfig;
use crate::lifecycle::shutdown::InFlight;
use crate::observability::metrics;
use crate::signing::broadcaster::Broadcaster;
use crate::signing::builder::TransactionBuilder;
use crate::signing::error::{SignerError, Stage};
use crate::signing::locks::AccountLocks;
use crate::signing::request::{normalize, parse_body, SigningRequest};
use crate::signing::signer::TxSigner;

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Authenticated,
    Normalized,
    Built,
    Signed,
    Broadcast,
    Completed,
    Error(Stage),
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Completed | RequestState::Error(_))
    }

    /// Forward transitions only; any live state may fail.
    pub fn can_advance_to(self, next: RequestState) -> bool {
        use RequestState::*;
        match (self, next) {
            (s, Error(_)) => !s.is_terminal(),
            (Received, Authenticated)
            | (Authenticated, Normalized)
            | (Normalized, Built)
            | (Built, Signed)
            | (Signed, Broadcast)
            | (Broadcast, Completed) => true,
            _ => false,
        }
    }
}

/// Tracks one request's state, logging each step.
#[derive(Debug)]
struct Progress<'a> {
    request_id: &'a str,
    state: RequestState,
}

impl<'a> Progress<'a> {
    fn new(request_id: &'a str) -> Self {
        Self {
            request_id,
            state: RequestState::Received,
        }
    }

    fn advance(&mut self, next: RequestState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} → {:?}",
            self.state,
            next
        );
        tracing::debug!(request_id = %self.request_id, from = ?self.state, to = ?next, "Request state");
        self.state = next;
    }

    fn fail(&mut self, err: &SignerError) {
        self.advance(RequestState::Error(err.stage()));
    }
}

/// Successful pipeline result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignOutcome {
    #[serde(rename = "type")]
    pub kind: TransferKind,
    pub txid: String,
    /// Node's broadcast reply, passed through.
    pub result: BroadcastReply,
}

/// Everything needed to turn a request body into a broadcast transaction.
#[derive(Clone)]
pub struct SigningPipeline {
    auth: Authenticator,
    builder: TransactionBuilder,
    signer: TxSigner,
    broadcaster: Broadcaster,
    locks: AccountLocks,
    jobs: InFlight,
}

impl SigningPipeline {
    pub fn new(auth: Authenticator, node: Arc<dyn NodeClient>, wallet: Arc<Wallet>, signing: &SigningConfig) -> Self {
        Self {
            auth,
            builder: TransactionBuilder::new(node.clone(), signing.fee_limit_sun),
            signer: TxSigner::new(wallet, signing.owner_policy),
            broadcaster: Broadcaster::new(node),
            locks: AccountLocks::new(),
            jobs: InFlight::new(),
        }
    }

    pub fn locks(&self) -> &AccountLocks {
        &self.locks
    }

    /// Signing jobs still running, including ones whose caller has gone.
    pub fn in_flight(&self) -> &InFlight {
        &self.jobs
    }

    /// Address the held key signs for.
    pub fn signer_address(&self) -> TronAddress {
        self.signer.wallet().address()
    }

    /// Run one request through every stage.
    ///
    /// The work is detached from the returned future; see the module docs.
    pub async fn execute(&self, request_id: &str, headers: &HeaderMap, body: &[u8]) -> Result<SignOutcome, SignerError> {
        let job = self.jobs.start();
        let pipeline = self.clone();
        let (owned_id, headers, body) = (request_id.to_string(), headers.clone(), body.to_vec());

        let task = tokio::spawn(
            async move {
                let _job = job;
                pipeline.process(&owned_id, &headers, &body).await
            }
            .in_current_span(),
        );

        match task.await {
            Ok(result) => result,
            Err(err) => {
                metrics::record_request("error", Some(Stage::Internal));
                tracing::error!(request_id = %request_id, error = %err, "Signing job aborted");
                Err(SignerError::Internal(format!("signing job aborted: {}", err)))
            }
        }
    }

    async fn process(&self, request_id: &str, headers: &HeaderMap, body: &[u8]) -> Result<SignOutcome, SignerError> {
        let start = Instant::now();
        let mut progress = Progress::new(request_id);

        let result = self.run(&mut progress, headers, body).await;

        match &result {
            Ok(outcome) => {
                progress.advance(RequestState::Completed);
                metrics::record_request("ok", None);
                metrics::record_duration(outcome.kind.as_str(), start);
                tracing::info!(
                    request_id = %request_id,
                    kind = outcome.kind.as_str(),
                    txid = %outcome.txid,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Transaction broadcast"
                );
            }
            Err(err) => {
                progress.fail(err);
                let stage = err.stage();
                metrics::record_request("error", Some(stage));
                match stage {
                    Stage::Auth | Stage::Validation => tracing::warn!(
                        request_id = %request_id,
                        stage = stage.as_str(),
                        code = err.code(),
                        error = %err,
                        "Request refused"
                    ),
                    _ => tracing::error!(
                        request_id = %request_id,
                        stage = stage.as_str(),
                        code = err.code(),
                        submission_attempted = err.submission_attempted(),
                        error = %err,
                        "Request failed"
                    ),
                }
            }
        }
        result
    }

    async fn run(&self, progress: &mut Progress<'_>, headers: &HeaderMap, body: &[u8]) -> Result<SignOutcome, SignerError> {
        self.auth.authenticate(headers)?;
        progress.advance(RequestState::Authenticated);

        let request = normalize(&parse_body(body))?;
        progress.advance(RequestState::Normalized);
        tracing::debug!(
            request_id = %progress.request_id,
            kind = request.kind().as_str(),
            from = %request.from(),
            to = %request.to(),
            "Request normalized"
        );

        let _guard = self.locks.acquire(request.from()).await;
        self.submit(progress, &request).await
    }

    async fn submit(&self, progress: &mut Progress<'_>, request: &SigningRequest) -> Result<SignOutcome, SignerError> {
        let unsigned = self.builder.build(request).await?;
        progress.advance(RequestState::Built);

        let kind = unsigned.kind();
        let signed = self.signer.sign(unsigned)?;
        progress.advance(RequestState::Signed);

        let result = self.broadcaster.broadcast(&signed).await?;
        progress.advance(RequestState::Broadcast);

        let txid = result.txid.clone().unwrap_or_else(|| signed.tx_id().to_string());
        let reply = result.into_accepted()?;

        Ok(SignOutcome {
            kind,
            txid,
            result: reply,
        })
    }
}

impl std::fmt::Debug for SigningPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningPipeline")
            .field("builder", &self.builder)
            .field("signer", &self.signer)
            .field("in_flight", &self.jobs.count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use RequestState::*;
        let path = [Received, Authenticated, Normalized, Built, Signed, Broadcast, Completed];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{:?} → {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_error_reachable_from_live_states() {
        use RequestState::*;
        for state in [Received, Authenticated, Normalized, Built, Signed, Broadcast] {
            assert!(state.can_advance_to(Error(Stage::Internal)));
        }
        assert!(!Completed.can_advance_to(Error(Stage::Internal)));
        assert!(!Error(Stage::Auth).can_advance_to(Error(Stage::Build)));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        use RequestState::*;
        assert!(!Received.can_advance_to(Built));
        assert!(!Signed.can_advance_to(Normalized));
        assert!(!Completed.can_advance_to(Received));
        assert!(Completed.is_terminal());
        assert!(Error(Stage::Sign).is_terminal());
        assert!(!Broadcast.is_terminal());
    }
}
