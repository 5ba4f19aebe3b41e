//! Percent-encoding helpers for token components
//!
//! The operator tooling that mints tokens URI-encodes the `sr` and `sig`
//! parameters: unreserved characters (`A-Z a-z 0-9 - _ . ~`) pass through,
//! a space becomes `+`, and every other byte becomes an uppercase `%XX`
//! escape. These helpers check and reverse that encoding without
//! allocating.

use heapless::{String, Vec};

/// Errors from percent-encoding operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PercentError {
    /// Character not allowed in an encoded component
    InvalidCharacter,
    /// `%` not followed by two hex digits
    InvalidEscape,
    /// Decoded bytes are not valid UTF-8
    InvalidUtf8,
    /// Output exceeds the destination capacity
    TooLong,
}

/// Whether a byte passes through the encoding unchanged
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Check that a component is well-formed URI-encoded text
///
/// Accepts unreserved characters, `+` (an encoded space), and `%XX`
/// escapes with either hex case. A raw space, a raw reserved character,
/// or a truncated escape is rejected.
pub fn validate(component: &str) -> Result<(), PercentError> {
    let bytes = component.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                if i + 2 >= bytes.len() {
                    return Err(PercentError::InvalidEscape);
                }
                if hex_value(bytes[i + 1]).is_none() || hex_value(bytes[i + 2]).is_none() {
                    return Err(PercentError::InvalidEscape);
                }
                i += 3;
            }
            b'+' => i += 1,
            b if is_unreserved(b) => i += 1,
            _ => return Err(PercentError::InvalidCharacter),
        }
    }
    Ok(())
}

/// Decode a URI-encoded component back to its raw text
///
/// Reverses [`encode`]: `+` becomes a space, `%XX` becomes the escaped
/// byte. The decoded bytes must form valid UTF-8.
pub fn decode<const N: usize>(component: &str) -> Result<String<N>, PercentError> {
    let bytes = component.as_bytes();
    let mut out: Vec<u8, N> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let byte = match bytes[i] {
            b'%' => {
                if i + 2 >= bytes.len() {
                    return Err(PercentError::InvalidEscape);
                }
                let hi = hex_value(bytes[i + 1]).ok_or(PercentError::InvalidEscape)?;
                let lo = hex_value(bytes[i + 2]).ok_or(PercentError::InvalidEscape)?;
                i += 3;
                (hi << 4) | lo
            }
            b'+' => {
                i += 1;
                b' '
            }
            b if is_unreserved(b) => {
                i += 1;
                b
            }
            _ => return Err(PercentError::InvalidCharacter),
        };
        out.push(byte).map_err(|_| PercentError::TooLong)?;
    }
    String::from_utf8(out).map_err(|_| PercentError::InvalidUtf8)
}

/// URI-encode raw text for use as a token component
///
/// Unreserved characters pass through, a space becomes `+`, every other
/// byte becomes an uppercase `%XX` escape. Multi-byte UTF-8 characters
/// are escaped bytewise.
pub fn encode<const N: usize>(raw: &str) -> Result<String<N>, PercentError> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut out: String<N> = String::new();
    for &byte in raw.as_bytes() {
        if is_unreserved(byte) {
            out.push(byte as char).map_err(|_| PercentError::TooLong)?;
        } else if byte == b' ' {
            out.push('+').map_err(|_| PercentError::TooLong)?;
        } else {
            out.push('%').map_err(|_| PercentError::TooLong)?;
            out.push(HEX[(byte >> 4) as usize] as char)
                .map_err(|_| PercentError::TooLong)?;
            out.push(HEX[(byte & 0x0F) as usize] as char)
                .map_err(|_| PercentError::TooLong)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_encoded_resource() {
        assert_eq!(validate("0ne00A1B2C3%2Fregistrations%2Fdev-001"), Ok(()));
        assert_eq!(validate("abc-_.~123"), Ok(()));
        assert_eq!(validate("with+plus"), Ok(()));
        assert_eq!(validate("lower%2fcase"), Ok(()));
    }

    #[test]
    fn test_validate_rejects_raw_characters() {
        assert_eq!(validate("has space"), Err(PercentError::InvalidCharacter));
        assert_eq!(validate("has/slash"), Err(PercentError::InvalidCharacter));
        assert_eq!(validate("has=equals"), Err(PercentError::InvalidCharacter));
        assert_eq!(validate("has&amp"), Err(PercentError::InvalidCharacter));
    }

    #[test]
    fn test_validate_rejects_bad_escapes() {
        assert_eq!(validate("%2"), Err(PercentError::InvalidEscape));
        assert_eq!(validate("abc%"), Err(PercentError::InvalidEscape));
        assert_eq!(validate("%GZ"), Err(PercentError::InvalidEscape));
    }

    #[test]
    fn test_decode() {
        let decoded: String<64> = decode("0ne00A1B2C3%2Fregistrations%2Fdev-001").unwrap();
        assert_eq!(decoded.as_str(), "0ne00A1B2C3/registrations/dev-001");

        let decoded: String<16> = decode("a+b").unwrap();
        assert_eq!(decoded.as_str(), "a b");

        let decoded: String<16> = decode("%3D%3d").unwrap();
        assert_eq!(decoded.as_str(), "==");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let result: Result<String<16>, _> = decode("%FF%FE");
        assert_eq!(result, Err(PercentError::InvalidUtf8));
    }

    #[test]
    fn test_decode_too_long() {
        let result: Result<String<4>, _> = decode("abcdef");
        assert_eq!(result, Err(PercentError::TooLong));
    }

    #[test]
    fn test_encode() {
        let encoded: String<64> = encode("0ne00A1B2C3/registrations/dev-002").unwrap();
        assert_eq!(encoded.as_str(), "0ne00A1B2C3%2Fregistrations%2Fdev-002");

        let encoded: String<32> = encode("sig+adds/64=").unwrap();
        assert_eq!(encoded.as_str(), "sig%2Badds%2F64%3D");

        let encoded: String<16> = encode("a b").unwrap();
        assert_eq!(encoded.as_str(), "a+b");
    }

    #[test]
    fn test_encode_escapes_utf8_bytewise() {
        let encoded: String<16> = encode("å").unwrap();
        assert_eq!(encoded.as_str(), "%C3%A5");
    }

    proptest! {
        #[test]
        fn prop_encode_output_validates(raw in "[ -~]{0,40}") {
            let encoded: String<128> = encode(&raw).unwrap();
            prop_assert_eq!(validate(&encoded), Ok(()));
        }

        #[test]
        fn prop_encode_decode_roundtrip(raw in "[ -~]{0,40}") {
            let encoded: String<128> = encode(&raw).unwrap();
            let decoded: String<128> = decode(&encoded).unwrap();
            prop_assert_eq!(decoded.as_str(), raw.as_str());
        }
    }
}
