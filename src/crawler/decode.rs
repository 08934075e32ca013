//! Response body decoding
//!
//! The HTTP client is built without automatic decompression so that the
//! `Content-Encoding` header is still observable here. Brotli and gzip bodies
//! are decompressed; `deflate`, absent, and unrecognized encodings pass
//! through unchanged. Byte-to-text conversion honors the response charset
//! when one is declared and falls back to UTF-8, substituting replacement
//! characters instead of failing on invalid sequences.

use encoding_rs::{Encoding, UTF_8};
use std::io::Read;
use thiserror::Error;

/// A body that could not be decompressed
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("corrupt {encoding} body: {source}")]
    Corrupt {
        encoding: &'static str,
        source: std::io::Error,
    },
}

/// Decodes a raw response body into text
pub fn decode_body(
    raw: &[u8],
    content_encoding: Option<&str>,
    charset: Option<&str>,
) -> Result<String, DecodeError> {
    let decompressed = decompress(raw, content_encoding)?;
    Ok(decode_text(&decompressed, charset))
}

/// Reverses the transfer compression declared by `Content-Encoding`
fn decompress(raw: &[u8], content_encoding: Option<&str>) -> Result<Vec<u8>, DecodeError> {
    let encoding = content_encoding
        .map(|e| e.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match encoding.as_str() {
        "br" => {
            let mut out = Vec::new();
            brotli::Decompressor::new(raw, 4096)
                .read_to_end(&mut out)
                .map_err(|source| DecodeError::Corrupt {
                    encoding: "br",
                    source,
                })?;
            Ok(out)
        }
        "gzip" => {
            let mut out = Vec::new();
            flate2::read::GzDecoder::new(raw)
                .read_to_end(&mut out)
                .map_err(|source| DecodeError::Corrupt {
                    encoding: "gzip",
                    source,
                })?;
            Ok(out)
        }
        // deflate, identity, and anything unrecognized pass through
        _ => Ok(raw.to_vec()),
    }
}

/// Converts bytes to text using the declared charset or UTF-8
pub fn decode_text(raw: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(raw);
    text.into_owned()
}

/// Pulls the charset parameter out of a Content-Type header value
pub fn charset_from_content_type(content_type: Option<&str>) -> Option<String> {
    content_type?.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}
