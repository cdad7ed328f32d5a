//! Shared-secret caller authentication.
//!
//! The secret is compared in constant time. An authenticator can only be
//! built from a non-empty secret, so a misconfigured service fails at boot
//! rather than accepting every request.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Header carrying the caller's secret.
pub const SIGNER_SECRET_HEADER: &str = "x-signer-secret";

/// Authentication failures. Both map to `invalid_signer_secret`.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("signer secret not supplied")]
    Missing,

    #[error("signer secret does not match")]
    Mismatch,
}

/// Raised when the configured secret is unusable.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("signer secret must not be empty")]
pub struct EmptySecret;

/// Validates the shared secret on each request.
#[derive(Clone)]
pub struct Authenticator {
    secret: Arc<str>,
}

impl Authenticator {
    pub fn new(secret: &str) -> Result<Self, EmptySecret> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(EmptySecret);
        }
        Ok(Self { secret: Arc::from(secret) })
    }

    /// Accept `x-signer-secret: <secret>` or `Authorization: Bearer <secret>`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let supplied = headers
            .get(SIGNER_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .or_else(|| {
                headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix("Bearer "))
            })
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::Missing)?;

        if self.matches(supplied) {
            Ok(())
        } else {
            Err(AuthError::Mismatch)
        }
    }

    fn matches(&self, supplied: &str) -> bool {
        supplied.as_bytes().ct_eq(self.secret.as_bytes()).into()
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}
