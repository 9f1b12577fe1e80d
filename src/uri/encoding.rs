//! Percent-encoding rules shared by the parser and the builder.
//!
//! Every URI component has its own set of characters that must be escaped.
//! Input is either *raw* (every `%` is literal and gets escaped to `%25`) or
//! *already encoded* (existing escapes are kept, only illegal characters are
//! escaped). `+` means an encoded space only in query components.

use std::borrow::Cow;

pub(crate) const USERNAME_ENCODE_SET: &str = " \"':;<=>@[]^`{}|/\\?#";
pub(crate) const PASSWORD_ENCODE_SET: &str = " \"':;<=>@[]^`{}|/\\?#";
pub(crate) const PATH_SEGMENT_ENCODE_SET: &str = " \"<>^`{}|/\\?#";
pub(crate) const QUERY_ENCODE_SET: &str = " \"'<>#";
pub(crate) const QUERY_COMPONENT_ENCODE_SET: &str = " \"'<>#&=";
pub(crate) const FRAGMENT_ENCODE_SET: &str = " ";

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// How a component should be escaped.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Encoding {
    /// Characters that are always escaped, on top of controls and DEL.
    pub encode_set: &'static str,
    /// Keep existing `%XX` escapes instead of escaping the `%`.
    pub already_encoded: bool,
    /// Treat `+` as an encoded space.
    pub plus_is_space: bool,
    /// Escape every non-ASCII code point.
    pub ascii_only: bool,
}

impl Encoding {
    pub(crate) const fn new(encode_set: &'static str, already_encoded: bool) -> Self {
        Self {
            encode_set,
            already_encoded,
            plus_is_space: false,
            ascii_only: true,
        }
    }

    pub(crate) const fn plus_is_space(mut self) -> Self {
        self.plus_is_space = true;
        self
    }

    pub(crate) const fn allow_non_ascii(mut self) -> Self {
        self.ascii_only = false;
        self
    }

    fn must_escape(&self, c: char) -> bool {
        c < '\u{20}'
            || c == '\u{7f}'
            || (c >= '\u{80}' && self.ascii_only)
            || self.encode_set.contains(c)
            || (c == '%' && !self.already_encoded)
    }

    fn needs_rewrite(&self, c: char) -> bool {
        self.must_escape(c) || (c == '+' && self.plus_is_space)
    }
}

/// Escapes `input` for the component described by `encoding`.
///
/// Returns the input unchanged when nothing needs to be rewritten.
pub(crate) fn canonicalize(input: &str, encoding: Encoding) -> Cow<'_, str> {
    let Some(first) = input.find(|c| encoding.needs_rewrite(c)) else {
        return Cow::Borrowed(input);
    };

    let mut out = String::with_capacity(input.len() + 16);
    out.push_str(&input[..first]);

    let mut utf8 = [0u8; 4];
    for c in input[first..].chars() {
        if encoding.already_encoded && matches!(c, '\t' | '\n' | '\u{0c}' | '\r') {
            // Stripped from pre-encoded input.
        } else if c == '+' && encoding.plus_is_space {
            out.push_str(if encoding.already_encoded { "+" } else { "%2B" });
        } else if encoding.must_escape(c) {
            for byte in c.encode_utf8(&mut utf8).bytes() {
                out.push('%');
                out.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
                out.push(char::from(HEX_DIGITS[usize::from(byte & 0xf)]));
            }
        } else {
            out.push(c);
        }
    }

    Cow::Owned(out)
}

/// Decodes `%XX` escapes (and `+` when `plus_is_space`).
///
/// Malformed escapes are copied through literally and byte sequences that
/// are not valid UTF-8 decode to U+FFFD.
pub(crate) fn percent_decode(encoded: &str, plus_is_space: bool) -> Cow<'_, str> {
    let bytes = encoded.as_bytes();
    let Some(first) = bytes
        .iter()
        .position(|&b| b == b'%' || (b == b'+' && plus_is_space))
    else {
        return Cow::Borrowed(encoded);
    };

    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&bytes[..first]);

    let mut i = first;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (decode_hex_digit(bytes[i + 1]), decode_hex_digit(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        } else if b == b'+' && plus_is_space {
            out.push(b' ');
            i += 1;
            continue;
        }
        out.push(b);
        i += 1;
    }

    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

pub(crate) fn decode_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// A decoded or encoded query: `(name, value)` pairs where a missing `=`
/// yields a `None` value.
pub(crate) type QueryPairs = Vec<(String, Option<String>)>;

/// Splits `subject=math&easy&problem=5-2=3` into
/// `[("subject", Some("math")), ("easy", None), ("problem", Some("5-2=3"))]`.
///
/// The empty string is a single pair with an empty name.
pub(crate) fn split_query(encoded_query: &str) -> QueryPairs {
    encoded_query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.to_string())),
            None => (pair.to_string(), None),
        })
        .collect()
}

pub(crate) fn join_query(out: &mut String, pairs: &[(String, Option<String>)]) {
    for (i, (name, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(name);
        if let Some(value) = value {
            out.push('=');
            out.push_str(value);
        }
    }
}

pub(crate) fn decode_query(pairs: &[(String, Option<String>)]) -> QueryPairs {
    pairs
        .iter()
        .map(|(name, value)| {
            (
                percent_decode(name, true).into_owned(),
                value.as_deref().map(|v| percent_decode(v, true).into_owned()),
            )
        })
        .collect()
}
