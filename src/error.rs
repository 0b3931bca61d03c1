// src/error.rs
//! Failure taxonomy for a single source fetch attempt.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why one Source Fetcher attempt failed. Closed set: the fallback rules in
/// [`ErrorKind::triggers_fallback`] match on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("upstream did not answer within the attempt timeout")]
    Timeout,
    #[error("upstream could not be reached")]
    Unreachable,
    #[error("upstream rejected the credential")]
    AuthRejected,
    #[error("upstream response could not be parsed")]
    MalformedResponse,
    #[error("upstream is rate limiting us")]
    RateLimited,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Unreachable => "unreachable",
            Self::AuthRejected => "auth_rejected",
            Self::MalformedResponse => "malformed_response",
            Self::RateLimited => "rate_limited",
        }
    }

    /// Whether a primary failure of this kind moves the chain to its secondary.
    /// Every kind does today; a new variant has to take a side here.
    pub fn triggers_fallback(&self) -> bool {
        match self {
            Self::Timeout | Self::Unreachable | Self::RateLimited => true,
            Self::AuthRejected | Self::MalformedResponse => true,
        }
    }

    /// Classify a transport-level reqwest error.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::MalformedResponse
        } else {
            Self::Unreachable
        }
    }

    /// Classify a non-2xx status. `rate_limit_exhausted` reflects headers like
    /// GitHub's `x-ratelimit-remaining: 0`, which arrive with a 403.
    pub fn from_status(status: StatusCode, rate_limit_exhausted: bool) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::FORBIDDEN if rate_limit_exhausted => Self::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::AuthRejected,
            _ => Self::Unreachable,
        }
    }
}

/// A failed attempt plus a human-readable detail for logs.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {detail}")]
pub struct FetchError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, detail)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(ErrorKind::from_transport(&err), err.to_string())
    }
}
