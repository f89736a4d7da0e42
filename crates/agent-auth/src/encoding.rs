use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(input.trim())
}

/// Accepts standard or URL-safe unpadded base64. Used for nonces, where both are common.
pub fn decode_lenient(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let trimmed = input.trim();
    STANDARD
        .decode(trimmed)
        .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_decode_accepts_url_safe_nonces() {
        assert_eq!(decode_lenient("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_lenient("+/8=").unwrap(), vec![0xfb, 0xff]);
        assert!(decode("-_8").is_err());
    }
}
