//! Unpadded base64url helpers (RFC 7515 appendix C).

use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// Decoder for externally supplied key material: padding optional, trailing
/// bits not required to be canonical.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded base64url into a `String`.
pub fn encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode an unpadded base64url string.
pub fn decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(data)
}

/// Decode base64 in either the standard or the url-safe alphabet, padded or
/// not.
///
/// EAB HMAC keys arrive copy-pasted from CA dashboards in whichever flavor
/// the CA emits, sometimes with mixed alphabets. The input is normalized to
/// the url-safe alphabet and decoded leniently.
pub fn decode_auto(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let normalized: String = data
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    LENIENT.decode(normalized)
}

/// Our serde module for encoding bytes as base64url encoded strings.
pub mod bytes {
    use serde::{Serialize, Serializer};

    /// Serialize bytes as an unpadded base64url string.
    pub fn serialize<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::encode(data).serialize(serializer)
    }
}
