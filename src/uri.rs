//! Percent-encoding of path segments.

use std::fmt::Write;

/// Percent-encode `value` for use as a single URI path segment.
///
/// ASCII letters, digits and `-_.~` pass through; every other byte becomes
/// `%XX` with uppercase hex digits.
///
/// ```
/// use kerfuffle_client::uri::encode_path_segment;
///
/// assert_eq!(encode_path_segment("My Game!"), "My%20Game%21");
/// ```
pub fn encode_path_segment(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(char::from(byte));
        } else {
            // Writing to a String cannot fail.
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_reserved_characters() {
        assert_eq!(encode_path_segment("My Game!"), "My%20Game%21");
        assert_eq!(encode_path_segment("a/b?c#d"), "a%2Fb%3Fc%23d");
        assert_eq!(encode_path_segment("100%"), "100%25");
    }

    #[test]
    fn keeps_unreserved_characters() {
        assert_eq!(encode_path_segment("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode_path_segment("AZaz09"), "AZaz09");
        assert_eq!(encode_path_segment(""), "");
    }

    #[test]
    fn encodes_utf8_bytewise() {
        assert_eq!(encode_path_segment("é"), "%C3%A9");
    }
}
