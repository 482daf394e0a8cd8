//! Percent-encoding normalization for robots.txt paths
//!
//! Rule patterns and candidate URL paths both pass through [`normalize`]
//! before comparison, so `%2f`, `%2F` and a literal `/` all compare
//! consistently. Normalization is decode-then-re-encode with a fixed safe
//! set: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is encoded.

use crate::{CodecError, CodecResult};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unencoded during normalization.
///
/// This is exactly the unreserved set of `encodeURIComponent`. Note that
/// `*` is in the set, which is what lets wildcard markers survive
/// normalization unchanged, while `/` does not (it round-trips as `%2F`
/// on both the pattern and the URL side, so matching is unaffected).
const QUOTE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Normalizes a path by percent-decoding it and re-encoding the result
///
/// # Arguments
///
/// * `path` - Raw path or pattern text from a robots.txt directive or URL
///
/// # Returns
///
/// * `Ok(String)` - The normalized form; equivalent encodings map to the
///   same output
/// * `Err(CodecError)` - The input contains a malformed percent escape
///   (e.g. `%3M`) or decodes to invalid UTF-8
///
/// # Examples
///
/// ```
/// use kumo_robots::codec::normalize;
///
/// assert_eq!(normalize("/a%2fb").unwrap(), normalize("/a%2Fb").unwrap());
/// assert_eq!(normalize("/%7ejoe").unwrap(), normalize("/~joe").unwrap());
/// assert!(normalize("/wiki/Wikipedia%3Mediation").is_err());
/// ```
pub fn normalize(path: &str) -> CodecResult<String> {
    let decoded = decode(path)?;
    Ok(quote(&decoded))
}

/// Percent-encodes `text` with the fixed safe set, without decoding first.
///
/// Used as the resolution fallback for candidate paths that fail
/// [`normalize`]: treating every byte as literal keeps prefix comparison
/// against normalized patterns meaningful.
pub(crate) fn quote(text: &str) -> String {
    utf8_percent_encode(text, QUOTE_SET).to_string()
}

/// Returns true if `path` survives decode-then-re-encode
///
/// The parser uses this to drop directives referencing unsafely-encoded
/// paths instead of failing, matching real-world robots.txt files that
/// frequently contain broken escapes.
pub fn is_safe(path: &str) -> bool {
    normalize(path).is_ok()
}

/// Percent-decodes `path`, rejecting malformed escapes.
///
/// The permissive decoder in the `percent-encoding` crate passes broken
/// escapes through untouched; here they must be detected so the caller
/// can discard the directive.
fn decode(path: &str) -> CodecResult<String> {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|b| hex_value(*b));
            let lo = bytes.get(i + 2).and_then(|b| hex_value(*b));
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push(hi << 4 | lo);
                    i += 3;
                }
                _ => return Err(CodecError::BadEscape { position: i }),
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).map_err(|_| CodecError::InvalidUtf8)
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|v| v as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path_unchanged_structure() {
        // '/' is outside the safe set, so it encodes; the result is stable
        assert_eq!(normalize("/tmp").unwrap(), "%2Ftmp");
    }

    #[test]
    fn test_idempotent() {
        let inputs = ["/tmp/", "/a%2fb.html", "/%7ejoe/index.html", "/a/*.json$", ""];
        for input in inputs {
            let once = normalize(input).unwrap();
            let twice = normalize(&once).unwrap();
            assert_eq!(once, twice, "normalize must be idempotent for {input}");
        }
    }

    #[test]
    fn test_case_of_escapes_unified() {
        assert_eq!(normalize("/a%2fb.html").unwrap(), normalize("/a%2Fb.html").unwrap());
        assert_eq!(normalize("/a%3cd.html").unwrap(), normalize("/a%3Cd.html").unwrap());
    }

    #[test]
    fn test_safe_characters_decoded() {
        // '~' is in the safe set, so an encoded tilde normalizes to the literal
        assert_eq!(
            normalize("/%7Ejoe/index.html").unwrap(),
            normalize("/~joe/index.html").unwrap()
        );
    }

    #[test]
    fn test_wildcard_and_anchor_survive() {
        let normalized = normalize("/a/*.json").unwrap();
        assert!(normalized.contains('*'));
        assert!(normalized.ends_with(".json"));
        // '$' is not safe and round-trips encoded
        assert_eq!(normalize("$").unwrap(), "%24");
    }

    #[test]
    fn test_malformed_escape_rejected() {
        // Found in the wild in Wikipedia's robots.txt
        assert!(!is_safe("/wiki/Wikipedia%3Mediation_Committee"));
        assert!(!is_safe("%"));
        assert!(!is_safe("/trailing%2"));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert_eq!(normalize("/%C3%28"), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn test_well_formed_escape_accepted() {
        assert!(is_safe("/a%3cd.html"));
        assert!(is_safe("/plain/path"));
        assert!(is_safe(""));
    }

    #[test]
    fn test_non_ascii_encoded() {
        let normalized = normalize("/caf\u{e9}").unwrap();
        assert_eq!(normalized, "%2Fcaf%C3%A9");
        assert_eq!(normalize("%2Fcaf%C3%A9").unwrap(), normalized);
    }
}
