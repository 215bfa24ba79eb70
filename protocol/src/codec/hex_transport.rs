//! Hexadecimal transport encoding for blobs crossing the system boundary.
//!
//! Output is always lowercase. Input may be either case (or mixed), must
//! have even length and nothing but hex digits. No whitespace trimming:
//! a transport string that needs cleaning is a malformed one.

use super::CodecError;

/// Encodes bytes as lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decodes a hex transport string, failing with
/// [`CodecError::MalformedEncoding`] before anything else looks at it.
pub fn from_hex(encoded: &str) -> Result<Vec<u8>, CodecError> {
    hex::decode(encoded).map_err(|e| CodecError::MalformedEncoding {
        reason: e.to_string(),
    })
}
