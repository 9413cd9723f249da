//! Transport-safe text form for arbitrary bytes.
//!
//! Base64 (URL-safe alphabet, no padding) so encoded values can be used as
//! file names.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{PuzzleError, Result};

pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(text.as_bytes())
        .map_err(|e| PuzzleError::decode(format!("invalid encoded text '{}': {}", text, e)))
}
