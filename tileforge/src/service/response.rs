//! Transport-neutral tile responses.
//!
//! The facade produces these; an HTTP layer only has to copy status,
//! headers and body onto its own response type.

use std::fmt;

use bytes::Bytes;

use crate::store::{read_all, ObjectStream, StoreError};

pub const STATUS_OK: u16 = 200;
pub const STATUS_ACCEPTED: u16 = 202;
pub const STATUS_NO_CONTENT: u16 = 204;
pub const STATUS_FOUND: u16 = 302;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;
pub const STATUS_BAD_GATEWAY: u16 = 502;

/// Response body.
pub enum TileBody {
    Empty,
    Bytes(Bytes),
    /// Streamed straight from the object store.
    Stream(ObjectStream),
}

impl TileBody {
    /// Collects the body into memory.
    pub async fn into_bytes(self) -> Result<Bytes, StoreError> {
        match self {
            TileBody::Empty => Ok(Bytes::new()),
            TileBody::Bytes(bytes) => Ok(bytes),
            TileBody::Stream(stream) => read_all(stream).await,
        }
    }
}

impl fmt::Debug for TileBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileBody::Empty => f.write_str("Empty"),
            TileBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            TileBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// Status, headers and body for one tile request.
#[derive(Debug)]
pub struct TileResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: TileBody,
}

impl TileResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: TileBody::Empty,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_body(mut self, body: TileBody) -> Self {
        self.body = body;
        self
    }

    /// Plain-text error response.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(TileBody::Bytes(Bytes::from(message.into())))
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
