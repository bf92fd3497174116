//! Form-style URL codec for object keys.
//!
//! The admin frontend encodes keys the way HTML forms do: space becomes
//! `+`, everything else percent-escapes. The decode side must therefore
//! turn `+` into a space *before* percent-decoding, so that an encoded
//! `%2B` still round-trips to a literal plus sign.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Everything except unreserved characters gets escaped; spaces are then
/// folded to `+`.
const FORM_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Form-style encode: percent-escape, then space → `+`.
#[must_use]
pub fn quote_plus(input: &str) -> String {
    utf8_percent_encode(input, FORM_SET)
        .to_string()
        .replace("%20", "+")
}

/// Form-style decode: `+` → space, then percent-decode.
pub fn unquote_plus(input: &str) -> Result<String, String> {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.to_string())
        .map_err(|e| format!("Failed to decode key: {e}"))
}
