use flate2::read::GzDecoder;
use std::io::Read;
use veracity_crypto::base64url_decode;

use crate::error::StatusError;

/// A decoded status-list bitstring.
///
/// Bit `i` lives in byte `i / 8` at bit `7 - i % 8`, most significant first.
/// A set bit means the status (revocation, suspension) is asserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusList {
    bytes: Vec<u8>,
}

impl StatusList {
    /// Decode a GZIP-compressed, base64url-encoded list. A multibase `u`
    /// prefix is accepted.
    pub fn decode(encoded: &str) -> Result<Self, StatusError> {
        let encoded = encoded.trim();
        let encoded = encoded.strip_prefix('u').unwrap_or(encoded);
        let compressed = base64url_decode(encoded)
            .map_err(|e| StatusError::InvalidList(format!("encodedList: {}", e)))?;

        let mut bytes = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut bytes)
            .map_err(|e| StatusError::InvalidList(format!("encodedList is not gzip: {}", e)))?;
        Ok(Self { bytes })
    }

    /// Number of entries in the list.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64 * 8
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read the bit at `index`.
    pub fn get(&self, index: u64) -> Result<bool, StatusError> {
        let byte = usize::try_from(index / 8)
            .ok()
            .and_then(|i| self.bytes.get(i))
            .ok_or(StatusError::IndexOutOfRange {
                index,
                len: self.len(),
            })?;
        Ok(byte & (0x80 >> (index % 8)) != 0)
    }
}
