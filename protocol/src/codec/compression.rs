//! Gzip framing for payloads before they are sealed.
//!
//! Gzip rather than raw deflate: a recipient who has decrypted a payload
//! by other means can still inflate it with stock tooling, and historical
//! payloads were written this way.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Errors from the gzip layer.
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("compression failed: {0}")]
    CompressFailed(io::Error),

    #[error("decompression failed: {0}")]
    DecompressFailed(io::Error),

    #[error("decompressed payload exceeds {limit} bytes")]
    LimitExceeded { limit: usize },
}

/// Gzip-compresses `data` at the default level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), Compression::default());
    encoder
        .write_all(data)
        .map_err(CompressionError::CompressFailed)?;
    encoder.finish().map_err(CompressionError::CompressFailed)
}

/// Inflates a gzip stream, refusing to produce more than `limit` bytes.
///
/// The limit guards against decompression bombs: a few hundred bytes of
/// gzip can expand to gigabytes.
pub fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>, CompressionError> {
    let mut out = Vec::with_capacity(data.len().saturating_mul(2).min(limit));
    GzDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(CompressionError::DecompressFailed)?;

    if out.len() > limit {
        return Err(CompressionError::LimitExceeded { limit });
    }
    Ok(out)
}
