//! Tile service facades.
//!
//! One [`TileService`] exists per tile kind. Each parses raw coordinates
//! with its [`KeyScheme`], resolves them through the shared
//! [`GenerationCoordinator`](crate::coordinator::GenerationCoordinator), and
//! maps the outcome onto a [`TileResponse`].

mod facade;
mod response;
mod scheme;

pub use facade::{
    default_content_type, DeliveryPolicy, PurgeReport, ServiceError, TileService,
    RETRY_AFTER_SECS,
};
pub use response::{
    TileBody, TileResponse, STATUS_ACCEPTED, STATUS_BAD_GATEWAY, STATUS_BAD_REQUEST,
    STATUS_FOUND, STATUS_INTERNAL_ERROR, STATUS_NO_CONTENT, STATUS_OK,
};
pub use scheme::KeyScheme;
