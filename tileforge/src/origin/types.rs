//! Origin fetcher capability and its error taxonomy.

use bytes::Bytes;
use thiserror::Error;

use crate::key::TileKey;
use crate::store::BoxFuture;

/// Payload produced by an origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTile {
    pub bytes: Bytes,
    /// MIME type reported by the origin, if any.
    pub content_type: Option<String>,
}

impl FetchedTile {
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<&str>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.map(str::to_string),
        }
    }
}

/// Successful origin answer: either a payload or a definitive absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(FetchedTile),
    /// The origin legitimately has no data for this key.
    NotFound,
}

/// Why an origin refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Coordinates the provider does not serve (HTTP 400/404, zoom range).
    BadCoordinates,
    /// Credentials missing or refused (HTTP 401/403).
    Unauthorized,
    /// Any other client error.
    Client,
}

/// Errors returned by origin fetchers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginError {
    /// The key is of the wrong kind or outside the origin's valid range.
    #[error("invalid key for origin: {0}")]
    InvalidKey(String),

    /// Non-retryable refusal.
    #[error("origin rejected request ({reason:?}, status {status:?})")]
    Rejected {
        status: Option<u16>,
        reason: RejectReason,
    },

    /// The origin asked us to slow down (HTTP 429).
    #[error("origin rate limited the request")]
    RateLimited,

    /// Server error, timeout or transport failure.
    #[error("transient origin failure: {0}")]
    Transient(String),

    /// The origin answered but the body was unusable.
    #[error("invalid origin response: {0}")]
    InvalidResponse(String),
}

impl OriginError {
    /// Returns true when a later retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, OriginError::RateLimited | OriginError::Transient(_))
    }
}

/// A source of tile payloads.
///
/// The single capability is `fetch`: produce the bytes for a key, report
/// that the key has no data, or fail.
pub trait OriginFetcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn fetch(&self, key: &TileKey) -> BoxFuture<'_, Result<FetchOutcome, OriginError>>;
}
