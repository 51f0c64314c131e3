//! Paid third-party imagery tile API origin.
//!
//! # URL Pattern
//!
//! The provider URL template carries `{z}`, `{x}` and `{y}` placeholders,
//! for example `https://tiles.example.com/v1/satellite/{z}/{x}/{y}.webp`.
//!
//! # Authentication
//!
//! The API key is sent either as a `key` query parameter or as a bearer
//! token in the `Authorization` header.
//!
//! # Status Mapping
//!
//! | HTTP status   | Result                          |
//! |---------------|---------------------------------|
//! | 2xx           | payload with content type       |
//! | 400, 404      | rejected, bad coordinates       |
//! | 401, 403      | rejected, unauthorized          |
//! | 429           | rate limited (transient)        |
//! | other 4xx     | rejected, client error          |
//! | 5xx, timeout  | transient                       |

use tracing::{debug, warn};

use crate::key::TileKey;
use crate::origin::http::AsyncHttpClient;
use crate::origin::types::{FetchOutcome, FetchedTile, OriginError, OriginFetcher, RejectReason};
use crate::store::BoxFuture;

/// Default highest zoom level served by imagery providers.
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Content type assumed when the provider does not send one.
pub const DEFAULT_IMAGERY_CONTENT_TYPE: &str = "image/webp";

/// How the API key is presented to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiAuth {
    /// `?key={api_key}` appended to the URL.
    #[default]
    Query,
    /// `Authorization: Bearer {api_key}`.
    Bearer,
}

/// Static description of a paid imagery provider.
#[derive(Debug, Clone)]
pub struct PaidApiConfig {
    /// Provider name; only keys naming this provider are served.
    pub provider: String,
    pub url_template: String,
    pub api_key: Option<String>,
    pub auth: ApiAuth,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl PaidApiConfig {
    pub fn new(provider: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            url_template: url_template.into(),
            api_key: None,
            auth: ApiAuth::default(),
            min_zoom: 0,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>, auth: ApiAuth) -> Self {
        self.api_key = Some(api_key.into());
        self.auth = auth;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }
}

/// Origin backed by an authenticated tile API.
pub struct PaidApiOrigin<C: AsyncHttpClient> {
    http_client: C,
    config: PaidApiConfig,
}

impl<C: AsyncHttpClient> PaidApiOrigin<C> {
    pub fn new(http_client: C, config: PaidApiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &PaidApiConfig {
        &self.config
    }

    /// Checks whether the provider serves a zoom level.
    pub fn supports_zoom(&self, zoom: u8) -> bool {
        (self.config.min_zoom..=self.config.max_zoom).contains(&zoom)
    }

    /// Builds the request URL, including the query key when configured.
    fn build_url(&self, zoom: u8, x: u32, y: u32) -> String {
        let url = self
            .config
            .url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string());

        match (&self.config.api_key, self.config.auth) {
            (Some(key), ApiAuth::Query) => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{}{}key={}", url, sep, key)
            }
            _ => url,
        }
    }
}

fn bad_coordinates() -> OriginError {
    OriginError::Rejected {
        status: None,
        reason: RejectReason::BadCoordinates,
    }
}

/// Maps a non-2xx status onto the origin error taxonomy.
fn classify_status(status: u16) -> OriginError {
    let rejected = |reason| OriginError::Rejected {
        status: Some(status),
        reason,
    };
    match status {
        400 | 404 => rejected(RejectReason::BadCoordinates),
        401 | 403 => rejected(RejectReason::Unauthorized),
        429 => OriginError::RateLimited,
        400..=499 => rejected(RejectReason::Client),
        _ => OriginError::Transient(format!("HTTP {}", status)),
    }
}

impl<C: AsyncHttpClient> OriginFetcher for PaidApiOrigin<C> {
    fn name(&self) -> &str {
        &self.config.provider
    }

    fn fetch(&self, key: &TileKey) -> BoxFuture<'_, Result<FetchOutcome, OriginError>> {
        let key = key.clone();
        Box::pin(async move {
            let TileKey::Imagery(tile) = &key else {
                return Err(OriginError::InvalidKey(format!(
                    "imagery API only serves imagery, got {}",
                    key
                )));
            };
            if tile.provider != self.config.provider {
                return Err(OriginError::InvalidKey(format!(
                    "provider '{}' is not served by '{}'",
                    tile.provider, self.config.provider
                )));
            }

            // Reject without spending a paid request.
            if !self.supports_zoom(tile.zoom) {
                return Err(bad_coordinates());
            }
            let extent = 1u64.checked_shl(u32::from(tile.zoom)).unwrap_or(u64::MAX);
            if u64::from(tile.x) >= extent || u64::from(tile.y) >= extent {
                return Err(bad_coordinates());
            }

            let url = self.build_url(tile.zoom, tile.x, tile.y);
            let bearer = match (&self.config.api_key, self.config.auth) {
                (Some(token), ApiAuth::Bearer) => Some(format!("Bearer {}", token)),
                _ => None,
            };
            let headers: Vec<(&str, &str)> = bearer
                .as_deref()
                .map(|value| vec![("Authorization", value)])
                .unwrap_or_default();

            let response = self.http_client.get(&url, &headers).await.map_err(|e| {
                warn!(
                    provider = %self.config.provider,
                    key = %key,
                    error = %e,
                    "Imagery fetch failed"
                );
                OriginError::Transient(e.message)
            })?;

            if !response.is_success() {
                let err = classify_status(response.status);
                warn!(
                    provider = %self.config.provider,
                    key = %key,
                    status = response.status,
                    "Imagery provider returned error status"
                );
                return Err(err);
            }
            if response.body.is_empty() {
                return Err(OriginError::InvalidResponse("empty body".to_string()));
            }

            debug!(key = %key, size_bytes = response.body.len(), "Fetched imagery tile");
            let content_type = response
                .content_type
                .unwrap_or_else(|| DEFAULT_IMAGERY_CONTENT_TYPE.to_string());
            Ok(FetchOutcome::Found(FetchedTile {
                bytes: response.body,
                content_type: Some(content_type),
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::http::tests::MockAsyncHttpClient;
    use crate::origin::http::{HttpError, HttpResponse};
    use bytes::Bytes;

    const TEMPLATE: &str = "https://tiles.example.com/v1/sat/{z}/{x}/{y}.webp";

    fn origin(
        mock: MockAsyncHttpClient,
        config: PaidApiConfig,
    ) -> PaidApiOrigin<MockAsyncHttpClient> {
        PaidApiOrigin::new(mock, config)
    }

    fn ok_response() -> MockAsyncHttpClient {
        MockAsyncHttpClient::with_response(Ok(HttpResponse {
            status: 200,
            content_type: Some("image/png".into()),
            body: Bytes::from_static(b"\x89PNG"),
        }))
    }

    #[tokio::test]
    async fn test_query_key_auth() {
        let config = PaidApiConfig::new("acme", TEMPLATE).with_api_key("s3cret", ApiAuth::Query);
        let origin = origin(ok_response(), config);

        let outcome = origin.fetch(&TileKey::imagery("acme", 3, 1, 2)).await.unwrap();
        match outcome {
            FetchOutcome::Found(tile) => {
                assert_eq!(tile.content_type.as_deref(), Some("image/png"));
                assert_eq!(tile.bytes.as_ref(), b"\x89PNG");
            }
            FetchOutcome::NotFound => panic!("expected payload"),
        }

        let requests = origin.http_client.requests.lock();
        assert_eq!(
            requests[0].url,
            "https://tiles.example.com/v1/sat/3/1/2.webp?key=s3cret"
        );
        assert!(requests[0].headers.is_empty());
    }

    #[tokio::test]
    async fn test_bearer_auth() {
        let config = PaidApiConfig::new("acme", TEMPLATE).with_api_key("tok", ApiAuth::Bearer);
        let origin = origin(ok_response(), config);

        origin.fetch(&TileKey::imagery("acme", 1, 0, 1)).await.unwrap();

        let requests = origin.http_client.requests.lock();
        assert_eq!(requests[0].url, "https://tiles.example.com/v1/sat/1/0/1.webp");
        assert_eq!(
            requests[0].headers,
            vec![("Authorization".to_string(), "Bearer tok".to_string())]
        );
    }

    #[tokio::test]
    async fn test_zoom_out_of_range_rejected_without_request() {
        let config = PaidApiConfig::new("acme", TEMPLATE).with_zoom_range(2, 10);
        let origin = origin(ok_response(), config);

        for key in [
            TileKey::imagery("acme", 1, 0, 0),
            TileKey::imagery("acme", 11, 0, 0),
            TileKey::imagery("acme", 3, 8, 0),
        ] {
            let err = origin.fetch(&key).await.unwrap_err();
            assert_eq!(err, bad_coordinates());
        }
        assert_eq!(origin.http_client.request_count(), 0);
    }

    #[test]
    fn test_classify_status() {
        let reason = |status| match classify_status(status) {
            OriginError::Rejected { reason, .. } => Some(reason),
            _ => None,
        };
        assert_eq!(reason(400), Some(RejectReason::BadCoordinates));
        assert_eq!(reason(404), Some(RejectReason::BadCoordinates));
        assert_eq!(reason(401), Some(RejectReason::Unauthorized));
        assert_eq!(reason(403), Some(RejectReason::Unauthorized));
        assert_eq!(reason(410), Some(RejectReason::Client));
        assert_eq!(classify_status(429), OriginError::RateLimited);
        assert!(classify_status(502).is_transient());
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        let mock = MockAsyncHttpClient::with_response(Err(HttpError {
            message: "operation timed out".into(),
            is_timeout: true,
        }));
        let origin = origin(mock, PaidApiConfig::new("acme", TEMPLATE));
        let err = origin
            .fetch(&TileKey::imagery("acme", 4, 4, 4))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_content_type_defaults_to_webp() {
        let mock = MockAsyncHttpClient::status(200, b"RIFF");
        let origin = origin(mock, PaidApiConfig::new("acme", TEMPLATE));
        match origin.fetch(&TileKey::imagery("acme", 0, 0, 0)).await.unwrap() {
            FetchOutcome::Found(tile) => {
                assert_eq!(tile.content_type.as_deref(), Some(DEFAULT_IMAGERY_CONTENT_TYPE))
            }
            FetchOutcome::NotFound => panic!("expected payload"),
        }
    }

    #[tokio::test]
    async fn test_rejects_other_provider() {
        let origin = origin(ok_response(), PaidApiConfig::new("acme", TEMPLATE));
        let err = origin
            .fetch(&TileKey::imagery("other", 1, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, OriginError::InvalidKey(_)));
    }
}
