//! Result of resolving one tile key.
//!
//! Outcomes are `Clone` so a single generation result can be broadcast to
//! every caller waiting on the same key.

use std::fmt;

use bytes::Bytes;

use crate::origin::{OriginError, RejectReason};

/// Where a cached tile lives and what it should contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTile {
    pub object_key: String,
    pub size_bytes: u64,
    pub checksum: Option<String>,
}

/// Payload produced by a generation that ran for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTile {
    pub object_key: String,
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub checksum: String,
}

/// Why a resolve failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The origin failed or refused the request.
    Origin(OriginError),
    /// The origin answered with a payload of the wrong size or shape.
    Validation { expected: usize, actual: usize },
    /// The object store or index could not be read or written.
    Store(String),
    /// This caller stopped waiting; the generation may still complete.
    WaitTimeout,
    /// The generation task panicked or was cancelled before publishing.
    Aborted,
}

impl FailureReason {
    /// Returns true when the failure came from the origin.
    pub fn is_origin(&self) -> bool {
        matches!(self, FailureReason::Origin(_))
    }

    /// Returns true when the origin refused the coordinates themselves.
    pub fn is_bad_coordinates(&self) -> bool {
        matches!(
            self,
            FailureReason::Origin(OriginError::Rejected {
                reason: RejectReason::BadCoordinates,
                ..
            })
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Origin(e) => write!(f, "origin: {}", e),
            FailureReason::Validation { expected, actual } => {
                write!(f, "validation: expected {} bytes, got {}", expected, actual)
            }
            FailureReason::Store(msg) => write!(f, "store: {}", msg),
            FailureReason::WaitTimeout => f.write_str("timed out waiting for generation"),
            FailureReason::Aborted => f.write_str("generation aborted"),
        }
    }
}

/// Result of `GenerationCoordinator::resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the store without touching the origin.
    Cached(CachedTile),
    /// Produced by the origin and written through to the store.
    Generated(GeneratedTile),
    /// The origin has no data for this key.
    NotFound,
    Failed(FailureReason),
}

impl Outcome {
    pub fn is_cached(&self) -> bool {
        matches!(self, Outcome::Cached(_))
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Outcome::Generated(_))
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Outcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Cached(_) => "cached",
            Outcome::Generated(_) => "generated",
            Outcome::NotFound => "not_found",
            Outcome::Failed(_) => "failed",
        }
    }
}
