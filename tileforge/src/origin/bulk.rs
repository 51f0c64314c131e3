//! Public bulk elevation dataset origin.
//!
//! Fetches SRTM tiles from a public, read-only bucket laid out as
//! `{base}/skadi/{band}/{tile}.hgt.gz`, e.g. `skadi/N37/N37W122.hgt.gz`.
//! Payloads are gzip-compressed in the bucket and inflated before storage.

use std::io::Read;

use bytes::Bytes;
use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::key::TileKey;
use crate::origin::http::AsyncHttpClient;
use crate::origin::types::{FetchOutcome, FetchedTile, OriginError, OriginFetcher, RejectReason};
use crate::store::BoxFuture;

/// Default bucket serving the skadi layout.
pub const DEFAULT_ELEVATION_BASE_URL: &str = "https://elevation-tiles-prod.s3.amazonaws.com";

/// Content type of inflated `.hgt` payloads.
pub const HGT_CONTENT_TYPE: &str = "application/octet-stream";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Upper bound on an inflated payload: twice a 1-arcsecond tile
/// (3601 x 3601 samples of 2 bytes).
pub const MAX_INFLATED_BYTES: u64 = 2 * 3601 * 3601 * 2;

/// Origin backed by the public SRTM bucket.
pub struct BulkStoreOrigin<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> BulkStoreOrigin<C> {
    pub fn new(http_client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
        }
    }

    /// Bucket URL for a tile.
    pub fn tile_url(&self, band: &str, name: &str) -> String {
        format!("{}/skadi/{}/{}.hgt.gz", self.base_url, band, name)
    }
}

/// Inflates a gzip body; bodies without the gzip magic pass through untouched.
///
/// Output is capped at `limit` bytes; anything larger is rejected.
fn inflate(body: Bytes, limit: u64) -> Result<Bytes, OriginError> {
    if !body.starts_with(&GZIP_MAGIC) {
        return Ok(body);
    }
    let mut out = Vec::with_capacity(body.len() * 4);
    GzDecoder::new(body.as_ref())
        .take(limit + 1)
        .read_to_end(&mut out)
        .map_err(|e| OriginError::InvalidResponse(format!("gzip inflate failed: {}", e)))?;
    if out.len() as u64 > limit {
        return Err(OriginError::InvalidResponse(format!(
            "inflated payload exceeds {} bytes",
            limit
        )));
    }
    Ok(Bytes::from(out))
}

impl<C: AsyncHttpClient> OriginFetcher for BulkStoreOrigin<C> {
    fn name(&self) -> &str {
        "bulk-srtm"
    }

    fn fetch(&self, key: &TileKey) -> BoxFuture<'_, Result<FetchOutcome, OriginError>> {
        let key = key.clone();
        Box::pin(async move {
            let TileKey::Elevation(tile) = &key else {
                return Err(OriginError::InvalidKey(format!(
                    "bulk store only serves elevation, got {}",
                    key
                )));
            };

            if !tile.is_in_range() {
                debug!(tile = tile.name(), "Tile outside lat/lon range");
                return Ok(FetchOutcome::NotFound);
            }

            let url = self.tile_url(tile.band(), tile.name());
            let response = self.http_client.get(&url, &[]).await.map_err(|e| {
                warn!(url = %url, error = %e, "Elevation fetch failed");
                OriginError::Transient(e.message)
            })?;

            match response.status {
                200..=299 => {}
                404 => return Ok(FetchOutcome::NotFound),
                429 => return Err(OriginError::RateLimited),
                500..=599 => {
                    return Err(OriginError::Transient(format!(
                        "HTTP {} from {}",
                        response.status, url
                    )))
                }
                status => {
                    return Err(OriginError::Rejected {
                        status: Some(status),
                        reason: RejectReason::Client,
                    })
                }
            }

            let compressed = response.body;
            let bytes = tokio::task::spawn_blocking(move || inflate(compressed, MAX_INFLATED_BYTES))
                .await
                .map_err(|e| OriginError::Transient(format!("inflate task failed: {}", e)))??;

            debug!(
                tile = tile.name(),
                size_bytes = bytes.len(),
                "Fetched elevation tile"
            );
            Ok(FetchOutcome::Found(FetchedTile::new(
                bytes,
                Some(HGT_CONTENT_TYPE),
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::http::tests::MockAsyncHttpClient;
    use crate::origin::http::{HttpError, HttpResponse};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Bytes {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        Bytes::from(encoder.finish().unwrap())
    }

    fn origin(mock: MockAsyncHttpClient) -> BulkStoreOrigin<MockAsyncHttpClient> {
        BulkStoreOrigin::new(mock, "https://bucket.example/")
    }

    #[tokio::test]
    async fn test_builds_skadi_url_and_inflates() {
        let raw = vec![0x12u8; 4096];
        let mock = MockAsyncHttpClient::with_response(Ok(HttpResponse {
            status: 200,
            content_type: Some("application/x-gzip".into()),
            body: gzip(&raw),
        }));
        let origin = origin(mock);

        let outcome = origin
            .fetch(&TileKey::elevation("N37W122").unwrap())
            .await
            .unwrap();
        match outcome {
            FetchOutcome::Found(tile) => assert_eq!(tile.bytes.as_ref(), raw.as_slice()),
            FetchOutcome::NotFound => panic!("expected payload"),
        }
        assert_eq!(
            origin.http_client.requests.lock()[0].url,
            "https://bucket.example/skadi/N37/N37W122.hgt.gz"
        );
    }

    #[tokio::test]
    async fn test_out_of_range_is_not_found_without_request() {
        let origin = origin(MockAsyncHttpClient::status(200, b""));
        let outcome = origin
            .fetch(&TileKey::elevation("S91E181").unwrap())
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::NotFound);
        assert_eq!(origin.http_client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_404_is_not_found() {
        let origin = origin(MockAsyncHttpClient::status(404, b"NoSuchKey"));
        let outcome = origin
            .fetch(&TileKey::elevation("N00W150").unwrap())
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let key = TileKey::elevation("N10E010").unwrap();

        let err = origin(MockAsyncHttpClient::status(503, b""))
            .fetch(&key)
            .await
            .unwrap_err();
        assert!(err.is_transient());

        let err = origin(MockAsyncHttpClient::status(403, b""))
            .fetch(&key)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OriginError::Rejected {
                status: Some(403),
                reason: RejectReason::Client
            }
        );

        let err = origin(MockAsyncHttpClient::with_response(Err(HttpError::new(
            "connection reset"
        ))))
        .fetch(&key)
        .await
        .unwrap_err();
        assert!(matches!(err, OriginError::Transient(_)));
    }

    #[tokio::test]
    async fn test_corrupt_gzip_is_invalid_response() {
        let mut body = gzip(&[1u8; 1024]).to_vec();
        body.truncate(20);
        let origin = origin(MockAsyncHttpClient::with_response(Ok(HttpResponse {
            status: 200,
            content_type: None,
            body: Bytes::from(body),
        })));

        let err = origin
            .fetch(&TileKey::elevation("N01E001").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, OriginError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_rejects_wrong_kind() {
        let origin = origin(MockAsyncHttpClient::status(200, b""));
        let err = origin
            .fetch(&TileKey::terrain(1, 8, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, OriginError::InvalidKey(_)));
    }

    #[test]
    fn test_inflate_rejects_oversized_output() {
        let bomb = gzip(&vec![0u8; 4096]);
        assert!(matches!(
            inflate(bomb.clone(), 1024),
            Err(OriginError::InvalidResponse(_))
        ));
        assert_eq!(inflate(bomb, 4096).unwrap().len(), 4096);
    }
}
