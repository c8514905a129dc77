//! Transport encoding for the custom response payload.
//!
//! The payload travels as a query value, so it is turned into its UTF-8
//! bytes and then into the standard 64-symbol alphabet with `=` padding.
//! Going through the bytes is what keeps code points above U+00FF intact.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::EncodingError;

/// Encode `text` for the `response` query parameter.
pub fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Encode raw bytes that are supposed to hold UTF-8 text.
pub fn encode_bytes(bytes: &[u8]) -> Result<String, EncodingError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(encode(text))
}

/// Encode text given as UTF-16 code units. Fails on unpaired surrogates.
pub fn encode_utf16(units: &[u16]) -> Result<String, EncodingError> {
    let text = char::decode_utf16(units.iter().copied()).collect::<Result<String, _>>()?;
    Ok(encode(&text))
}

/// Recover the original text from an encoded payload.
///
/// A form decoder turns `+` into a space; such spaces are mapped back
/// before decoding.
pub fn decode(encoded: &str) -> Result<String, EncodingError> {
    let restored = encoded.replace(' ', "+");
    let bytes = STANDARD.decode(restored.as_bytes())?;
    let text = std::str::from_utf8(&bytes)?;
    Ok(text.to_string())
}
