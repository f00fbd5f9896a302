//! Payload encoding: canonical JSON, SHA-256 content hash, gzip.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};

use crate::error::Result;
use crate::maps::MapState;

/// Canonical byte form of a map state; the content hash is taken over this
pub fn canonical_bytes(state: &MapState) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(state)?)
}

/// Lowercase hex SHA-256 of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn compress(bytes: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

pub fn decompress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Hash and compressed payload of a state
pub fn encode(state: &MapState, level: u32) -> Result<(String, Vec<u8>)> {
    let canonical = canonical_bytes(state)?;
    let hash = content_hash(&canonical);
    Ok((hash, compress(&canonical, level)?))
}

/// Decode a payload and verify it against `expected_hash`.
///
/// The error string describes what failed; the store wraps it in a corruption error.
pub fn decode(payload: &[u8], expected_hash: &str) -> std::result::Result<MapState, String> {
    let canonical = decompress(payload).map_err(|e| format!("payload does not inflate: {}", e))?;
    let actual = content_hash(&canonical);
    if actual != expected_hash {
        return Err(format!(
            "content hash mismatch: recorded {}, computed {}",
            expected_hash, actual
        ));
    }
    serde_json::from_slice(&canonical).map_err(|e| format!("payload does not decode: {}", e))
}
