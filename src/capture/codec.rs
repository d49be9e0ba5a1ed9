/// Snapshot decoding
///
/// Camera snapshots arrive as self-describing data URLs
/// (`data:image/jpeg;base64,<payload>`), the same shape a browser
/// screenshot API produces. This module turns one into the raw binary
/// payload plus MIME type the backend upload needs. Pure function, no
/// state.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

use crate::state::data::CapturedImage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("not a data URL (expected `data:<mime>;base64,<payload>`)")]
    MissingHeader,
    #[error("missing MIME marker in data URL header")]
    MissingMime,
    #[error("unsupported payload encoding `{0}` (only base64 is handled)")]
    UnsupportedEncoding(String),
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// Decode a `data:` URL into binary image bytes and a MIME type.
///
/// Fails on anything that is not a base64 data URL with an explicit MIME
/// marker; a failed decode never touches any state, the capture attempt
/// is simply over.
pub fn decode_snapshot(data_url: &str) -> Result<CapturedImage, FormatError> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or(FormatError::MissingHeader)?;
    let header = header
        .strip_prefix("data:")
        .ok_or(FormatError::MissingHeader)?;
    let (mime, encoding) = header.split_once(';').ok_or(FormatError::MissingMime)?;
    if mime.is_empty() {
        return Err(FormatError::MissingMime);
    }
    if encoding != "base64" {
        return Err(FormatError::UnsupportedEncoding(encoding.to_string()));
    }

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| FormatError::InvalidPayload(e.to_string()))?;

    Ok(CapturedImage::new(bytes, mime))
}

/// Encode image bytes back into a data URL. Used by the webcam source so
/// that every producer hands the session the same self-describing shape.
pub fn encode_snapshot(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_valid_data_url() {
        let url = encode_snapshot(&[0xFF, 0xD8, 0xFF, 0xD9], "image/jpeg");
        let image = decode_snapshot(&url).unwrap();
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.bytes, vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_rejects_missing_comma() {
        assert_eq!(
            decode_snapshot("data:image/png;base64"),
            Err(FormatError::MissingHeader)
        );
    }

    #[test]
    fn test_rejects_non_data_url() {
        assert_eq!(
            decode_snapshot("https://example.com/a.png,abcd"),
            Err(FormatError::MissingHeader)
        );
    }

    #[test]
    fn test_rejects_missing_mime() {
        assert_eq!(
            decode_snapshot("data:;base64,abcd"),
            Err(FormatError::MissingMime)
        );
        assert_eq!(
            decode_snapshot("data:image/png,abcd"),
            Err(FormatError::MissingMime)
        );
    }

    #[test]
    fn test_rejects_non_base64_encoding() {
        assert_eq!(
            decode_snapshot("data:image/png;utf8,abcd"),
            Err(FormatError::UnsupportedEncoding("utf8".to_string()))
        );
    }

    #[test]
    fn test_rejects_invalid_payload() {
        let result = decode_snapshot("data:image/png;base64,@@not-base64@@");
        assert!(matches!(result, Err(FormatError::InvalidPayload(_))));
    }
}
