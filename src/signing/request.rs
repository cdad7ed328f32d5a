//! Request normalization.
//!
//! # Responsibilities
//! - Tolerate any body shape (JSON object, JSON sent as text, garbage)
//! - Resolve each canonical field through a fixed, ordered alias list
//! - Decide the transfer mode once, as a tagged [`TransferIntent`]
//!
//! # Design Decisions
//! - First present, non-empty alias wins; order is part of the contract
//! - Numbers (including 0) are present; null, blank strings, booleans,
//!   arrays and objects are absent
//! - Contract transfer wins when both modes resolve

use alloy::primitives::U256;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::blockchain::transaction::TransferKind;
use crate::signing::error::ValidationError;

/// Canonical field → accepted body keys, highest priority first.
pub const FROM_ALIASES: &[&str] = &["from", "from_address", "address", "source", "sender"];
pub const TO_ALIASES: &[&str] = &["to", "to_address", "company", "destination", "recipient"];
pub const AMOUNT_ALIASES: &[&str] = &["amountSun", "amount_sun", "trx_amount", "trxAmount", "amount", "value"];
pub const TOKEN_CONTRACT_ALIASES: &[&str] = &["tokenContract", "token_contract", "contract", "token"];
pub const TOKEN_AMOUNT_ALIASES: &[&str] = &[
    "tokenAmount",
    "token_amount",
    "token_amount_units",
    "token_value",
    "tokenValue",
    "amount_in_base",
    "amount",
];

/// How value moves for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferIntent {
    /// Coin transfer, amount in sun.
    Native { amount_sun: u64 },
    /// TRC-20 transfer, amount in token base units.
    Contract { token_contract: String, token_amount: U256 },
}

/// Canonical, immutable signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    from: String,
    to: String,
    intent: TransferIntent,
}

impl SigningRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>, intent: TransferIntent) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            intent,
        }
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn intent(&self) -> &TransferIntent {
        &self.intent
    }

    pub fn kind(&self) -> TransferKind {
        match self.intent {
            TransferIntent::Native { .. } => TransferKind::Native,
            TransferIntent::Contract { .. } => TransferKind::Contract,
        }
    }
}

/// What each canonical field resolved to, echoed back on validation failure.
///
/// Only values taken from the body's aliased fields appear here; headers
/// and anything else in the body are never copied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFields {
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount_sun: Option<String>,
    pub token_contract: Option<String>,
    pub token_amount: Option<String>,
}

/// Decode a raw body. Anything that is not a JSON object becomes an empty map.
pub fn parse_body(bytes: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::debug!(kind = json_kind(&other), "Request body is not a JSON object");
            Map::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, len = bytes.len(), "Request body is not JSON");
            Map::new()
        }
    }
}

/// Resolve aliases and validate field combinations.
pub fn normalize(body: &Map<String, Value>) -> Result<SigningRequest, ValidationError> {
    let resolved = ResolvedFields {
        from: resolve(body, FROM_ALIASES),
        to: resolve(body, TO_ALIASES),
        amount_sun: resolve(body, AMOUNT_ALIASES),
        token_contract: resolve(body, TOKEN_CONTRACT_ALIASES),
        token_amount: resolve(body, TOKEN_AMOUNT_ALIASES),
    };

    let has_contract = resolved.token_contract.is_some() && resolved.token_amount.is_some();
    let mut missing = Vec::new();
    if resolved.from.is_none() {
        missing.push("from");
    }
    if resolved.to.is_none() {
        missing.push("to");
    }
    if resolved.amount_sun.is_none() && !has_contract {
        missing.push("amountSun");
        if resolved.token_contract.is_none() {
            missing.push("tokenContract");
        }
        if resolved.token_amount.is_none() {
            missing.push("tokenAmount");
        }
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingParameters { missing, resolved });
    }

    let intent = if has_contract {
        let raw = resolved.token_amount.as_deref().unwrap_or_default();
        let token_amount = U256::from_str_radix(raw, 10).map_err(|e| ValidationError::InvalidParameter {
            field: "tokenAmount",
            reason: format!("expected a non-negative integer: {}", e),
            resolved: resolved.clone(),
        })?;
        TransferIntent::Contract {
            token_contract: resolved.token_contract.clone().unwrap_or_default(),
            token_amount,
        }
    } else {
        let raw = resolved.amount_sun.as_deref().unwrap_or_default();
        let amount_sun = raw.parse::<u64>().map_err(|e| ValidationError::InvalidParameter {
            field: "amountSun",
            reason: format!("expected a non-negative integer: {}", e),
            resolved: resolved.clone(),
        })?;
        if resolved.token_contract.is_some() {
            tracing::warn!("tokenContract supplied without a token amount; treating as native transfer");
        }
        TransferIntent::Native { amount_sun }
    };

    Ok(SigningRequest::new(
        resolved.from.unwrap_or_default(),
        resolved.to.unwrap_or_default(),
        intent,
    ))
}

/// First alias with a usable value, rendered as trimmed text.
fn resolve(body: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| body.get(*key).and_then(textual))
}

fn textual(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
