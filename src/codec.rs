//! Conversion between [`Email`] and the text stored in `payload` columns.
//!
//! Payloads are JSON wrapped in standard base64 so they fit any text column.
//! Rows written before the base64 wrapping hold the bare JSON document;
//! those are still read, nothing new is written that way.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::email::Email;

pub fn encode(email: &Email) -> String {
    // Serializing plain strings, byte vectors and string pairs cannot fail.
    let json = serde_json::to_vec(email).unwrap_or_default();
    STANDARD.encode(json)
}

/// Reads a stored payload back. Anything unreadable yields `None`.
pub fn decode(data: &str) -> Option<Email> {
    if data.is_empty() {
        return None;
    }

    // Older rows were wrapped at 76 columns.
    let compact: String = data.split_whitespace().collect();

    let current = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice::<Email>(&bytes).map_err(|e| e.to_string()));

    match current {
        Ok(email) => Some(email),
        Err(current_err) => match serde_json::from_str::<Email>(data) {
            Ok(email) => Some(email),
            Err(legacy_err) => {
                debug!(
                    "unable to decode payload: {}; legacy format: {}",
                    current_err, legacy_err
                );
                None
            }
        },
    }
}
