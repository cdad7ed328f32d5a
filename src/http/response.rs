//! Uniform JSON response contract.
//!
//! # Responsibilities
//! - Map pipeline outcomes to `{status:"ok", ...}` / `{status:"error", ...}`
//! - Map error kinds to status codes (400, 403, 500)
//! - Bound and scrub `detail` so no credential ever reaches a caller
//!
//! # Design Decisions
//! - `error` is a stable machine code; `detail` is human text and may change
//! - Validation failures additionally echo what was resolved and what is missing

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::blockchain::transaction::TransferKind;
use crate::blockchain::types::BroadcastReply;
use crate::config::schema::SignerConfig;
use crate::signing::error::{SignerError, Stage, ValidationError};
use crate::signing::pipeline::SignOutcome;
use crate::signing::request::ResolvedFields;

/// Longest `detail` string returned to callers, in characters.
pub const MAX_DETAIL_CHARS: usize = 512;

const REDACTED: &str = "[redacted]";

#[derive(Debug, Serialize)]
struct SuccessBody<'a> {
    status: &'static str,
    #[serde(rename = "type")]
    kind: TransferKind,
    txid: &'a str,
    result: &'a BroadcastReply,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    stage: Stage,
    error: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<&'a ResolvedFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<&'a [&'static str]>,
}

/// Builds HTTP responses and keeps secrets out of them.
#[derive(Clone, Default)]
pub struct ResponseFormatter {
    secrets: Arc<[String]>,
}

impl ResponseFormatter {
    /// `secrets` are removed from every detail string, ignoring ASCII case.
    /// Blank entries are ignored.
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for secret in secrets {
            let secret = secret.as_ref().trim().to_ascii_lowercase();
            if secret.is_empty() {
                continue;
            }
            // Keys show up with or without a 0x prefix.
            if let Some(bare) = secret.strip_prefix("0x").filter(|bare| !bare.is_empty()) {
                list.push(bare.to_string());
            }
            list.push(secret);
        }
        // Longest first so a secret containing another is fully replaced.
        list.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        list.dedup();
        Self { secrets: list.into() }
    }

    /// Scrub the shared secret, the private key and the node API key.
    pub fn from_config(config: &SignerConfig) -> Self {
        let secrets = [
            config.signer_secret.as_ref(),
            config.private_key.as_ref(),
            config.node.api_key.as_ref(),
        ];
        Self::new(secrets.into_iter().flatten().map(|s| s.expose()))
    }

    /// 200 with the node's reply.
    pub fn success(&self, outcome: &SignOutcome) -> Response {
        let body = SuccessBody {
            status: "ok",
            kind: outcome.kind,
            txid: &outcome.txid,
            result: &outcome.result,
        };
        (StatusCode::OK, Json(body)).into_response()
    }

    /// Stage-tagged error with a bounded, scrubbed detail.
    pub fn error(&self, err: &SignerError) -> Response {
        let (resolved, missing) = match err {
            SignerError::Validation(v) => (
                Some(v.resolved()),
                match v {
                    ValidationError::MissingParameters { missing, .. } => Some(missing.as_slice()),
                    ValidationError::InvalidParameter { .. } => None,
                },
            ),
            _ => (None, None),
        };

        let body = ErrorBody {
            status: "error",
            stage: err.stage(),
            error: err.code(),
            detail: self.detail(&err.to_string()),
            resolved,
            missing,
        };
        (status_for(err), Json(body)).into_response()
    }

    /// Remove secrets, then cap the length.
    pub fn detail(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for secret in self.secrets.iter() {
            text = redact(&text, secret);
        }
        truncate_chars(text, MAX_DETAIL_CHARS)
    }
}

impl std::fmt::Debug for ResponseFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFormatter")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

/// HTTP status for an error kind.
pub fn status_for(err: &SignerError) -> StatusCode {
    match err.stage() {
        Stage::Auth => StatusCode::FORBIDDEN,
        Stage::Validation => StatusCode::BAD_REQUEST,
        Stage::Build | Stage::Sign | Stage::Broadcast | Stage::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Replace every ASCII-case-insensitive occurrence of `needle` (lowercase).
fn redact(text: &str, needle: &str) -> String {
    // ASCII lowercasing keeps byte offsets, so indices map back onto `text`.
    let folded = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in folded.match_indices(needle) {
        out.push_str(&text[last..start]);
        out.push_str(REDACTED);
        last = start + needle.len();
    }
    out.push_str(&text[last..]);
    out
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => {
            let mut out = text[..cut].to_string();
            out.push_str("...");
            out
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::signing::error::{BroadcastError, BuildError};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_shape() {
        let formatter = ResponseFormatter::default();
        let outcome = SignOutcome {
            kind: TransferKind::Contract,
            txid: "abc".into(),
            result: BroadcastReply {
                result: true,
                txid: Some("abc".into()),
                ..Default::default()
            },
        };
        let response = formatter.success(&outcome);
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["type"], "contract");
        assert_eq!(json["result"]["result"], true);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let formatter = ResponseFormatter::default();
        let cases: Vec<(SignerError, StatusCode, &str)> = vec![
            (AuthError::Missing.into(), StatusCode::FORBIDDEN, "invalid_signer_secret"),
            (
                ValidationError::MissingParameters {
                    missing: vec!["from"],
                    resolved: ResolvedFields::default(),
                }
                .into(),
                StatusCode::BAD_REQUEST,
                "missing_parameters",
            ),
            (BuildError::ZeroTokenAmount.into(), StatusCode::INTERNAL_SERVER_ERROR, "build_failed"),
            (
                BroadcastError::NodeRejected {
                    code: "SIGERROR".into(),
                    reason: "bad".into(),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "node_rejected",
            ),
        ];

        for (err, status, code) in cases {
            let response = formatter.error(&err);
            assert_eq!(response.status(), status);
            let json = body_json(response).await;
            assert_eq!(json["status"], "error");
            assert_eq!(json["error"], code);
            assert!(json["detail"].is_string());
        }
    }

    #[tokio::test]
    async fn test_validation_echo() {
        let formatter = ResponseFormatter::default();
        let err: SignerError = ValidationError::MissingParameters {
            missing: vec!["from"],
            resolved: ResolvedFields {
                to: Some("B".into()),
                amount_sun: Some("1000000".into()),
                ..Default::default()
            },
        }
        .into();
        let json = body_json(formatter.error(&err)).await;
        assert_eq!(json["stage"], "validation");
        assert_eq!(json["missing"], serde_json::json!(["from"]));
        assert_eq!(json["resolved"]["to"], "B");
        assert_eq!(json["resolved"]["amountSun"], "1000000");
    }

    #[test]
    fn test_detail_scrubbed() {
        let formatter = ResponseFormatter::new(["s3cret", "0xABCDEF"]);
        let detail = formatter.detail("secret s3cret key abcdef and ABCDEF");
        assert!(!detail.contains("s3cret"));
        assert!(!detail.to_ascii_lowercase().contains("abcdef"));
        assert_eq!(detail.matches(REDACTED).count(), 3);
    }

    #[test]
    fn test_detail_scrub_ignores_case() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let formatter = ResponseFormatter::new([key, "Shared-Secret"]);
        let detail = formatter.detail(&format!(
            "node said: bad key 0X{} (shared-SECRET)",
            key.to_ascii_uppercase()
        ));
        assert!(!detail.to_ascii_lowercase().contains(key));
        assert!(!detail.to_ascii_lowercase().contains("shared-secret"));
        assert_eq!(detail, "node said: bad key 0X[redacted] ([redacted])");
    }

    #[test]
    fn test_detail_bounded() {
        let formatter = ResponseFormatter::default();
        let detail = formatter.detail(&"é".repeat(2000));
        assert_eq!(detail.chars().count(), MAX_DETAIL_CHARS + 3);
        assert_eq!(formatter.detail("short"), "short");
    }

    #[test]
    fn test_blank_secrets_ignored() {
        let formatter = ResponseFormatter::new(["", "   "]);
        assert_eq!(formatter.detail("nothing to hide"), "nothing to hide");
    }
}
