//! Origin fetchers: where tile payloads come from on a cache miss.
//!
//! Every origin implements [`OriginFetcher`], whose single capability is to
//! fetch the payload for a key. Three strategies are provided:
//!
//! - [`SynthesisOrigin`] generates terrain chunks locally
//! - [`BulkStoreOrigin`] mirrors elevation tiles from a public bucket
//! - [`PaidApiOrigin`] calls an authenticated imagery tile API
//!
//! HTTP origins are generic over [`AsyncHttpClient`] so tests can inject a
//! mock client.

mod bulk;
mod http;
mod paid;
mod synthesis;
mod types;

pub use bulk::{BulkStoreOrigin, DEFAULT_ELEVATION_BASE_URL, HGT_CONTENT_TYPE};
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpError, HttpResponse, DEFAULT_TIMEOUT_SECS};
pub use paid::{
    ApiAuth, PaidApiConfig, PaidApiOrigin, DEFAULT_IMAGERY_CONTENT_TYPE, DEFAULT_MAX_ZOOM,
};
pub use synthesis::{
    within_world, SynthesisOrigin, DEFAULT_MAX_RESOLUTION, MAX_CHUNK_COORD, TERRAIN_CONTENT_TYPE,
};
pub use types::{FetchOutcome, FetchedTile, OriginError, OriginFetcher, RejectReason};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
