//! Terrain chunk synthesis and payload encoding.
//!
//! The cache pipeline treats terrain payloads as opaque bytes; this module is
//! what the synthesis origin uses to produce them.

mod payload;
mod synth;

pub use payload::{encoded_len, PayloadError, TerrainPayload, HEADER_LEN, PAYLOAD_VERSION};
pub use synth::{TerrainSynthesizer, CHUNK_WORLD_SIZE};
