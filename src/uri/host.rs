//! Host canonicalization.
//!
//! A host is percent-decoded first, then treated as an IPv6 literal when it
//! is bracketed (or, for builder input, contains a colon), otherwise run
//! through IDNA ToASCII and lowercased.

use std::net::Ipv6Addr;

use super::encoding::{decode_hex_digit, percent_decode};

/// Returns the canonical form of `input`, or `None` if it is not a valid host.
pub(crate) fn canonicalize_host(input: &str) -> Option<String> {
    let decoded = percent_decode(input, false);

    if let Some(literal) = decoded.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return decode_ipv6(literal.as_bytes()).map(ipv6_to_ascii);
    }
    if decoded.contains(':') {
        return decode_ipv6(decoded.as_bytes()).map(ipv6_to_ascii);
    }

    domain_to_ascii(&decoded)
}

/// Decodes an address like `1111:2222:3333:4444:5555:6666:7777:8888` or `::1`.
fn decode_ipv6(input: &[u8]) -> Option<[u8; 16]> {
    let limit = input.len();
    let mut address = [0u8; 16];
    let mut b = 0;
    let mut compress = None;
    let mut group_offset = None;

    let mut i = 0;
    while i < limit {
        if b == address.len() {
            return None;
        }

        if input[i..].starts_with(b"::") {
            if compress.is_some() {
                return None;
            }
            i += 2;
            b += 2;
            compress = Some(b);
            if i == limit {
                break;
            }
        } else if b != 0 {
            match input[i] {
                b':' => i += 1,
                b'.' => {
                    // Rewind over the last group and read it as an IPv4 suffix.
                    if !decode_ipv4_suffix(input, group_offset?, &mut address, b - 2) {
                        return None;
                    }
                    b += 2;
                    break;
                }
                _ => return None,
            }
        }

        if b == address.len() {
            return None;
        }

        let start = i;
        let mut value: u32 = 0;
        while i < limit {
            let Some(digit) = decode_hex_digit(input[i]) else {
                break;
            };
            value = (value << 4) + u32::from(digit);
            i += 1;
        }
        let group_length = i - start;
        if group_length == 0 || group_length > 4 {
            return None;
        }
        group_offset = Some(start);

        address[b] = (value >> 8) as u8;
        address[b + 1] = value as u8;
        b += 2;
    }

    // Shift the groups after "::" to the end of the address.
    let len = address.len();
    if b != len {
        let compress = compress?;
        let tail = b - compress;
        address.copy_within(compress..b, len - tail);
        address[compress..len - tail].fill(0);
    }

    Some(address)
}

/// Decodes the dotted suffix of an address like `1111::5555:6666:192.168.0.1`.
fn decode_ipv4_suffix(input: &[u8], pos: usize, address: &mut [u8; 16], offset: usize) -> bool {
    let mut b = offset;
    let mut i = pos;

    while i < input.len() {
        if b == address.len() {
            return false;
        }

        if b != offset {
            if input[i] != b'.' {
                return false;
            }
            i += 1;
        }

        let start = i;
        let mut value: u32 = 0;
        while i < input.len() && input[i].is_ascii_digit() {
            // No leading zeros.
            if value == 0 && start != i {
                return false;
            }
            value = value * 10 + u32::from(input[i] - b'0');
            if value > 255 {
                return false;
            }
            i += 1;
        }
        if i == start {
            return false;
        }

        address[b] = value as u8;
        b += 1;
    }

    b == offset + 4
}

/// Renders an address in canonical text form. IPv4-mapped addresses come out
/// as dotted decimal.
fn ipv6_to_ascii(address: [u8; 16]) -> String {
    if let Some(v4) = Ipv6Addr::from(address).to_ipv4_mapped() {
        return v4.to_string();
    }

    // Longest run of zero groups, leftmost on ties. Single zero groups stay.
    let mut longest_offset = None;
    let mut longest_length = 0;
    let mut i = 0;
    while i < address.len() {
        let run_offset = i;
        while i < 16 && address[i] == 0 && address[i + 1] == 0 {
            i += 2;
        }
        let run_length = i - run_offset;
        if run_length > longest_length && run_length >= 4 {
            longest_offset = Some(run_offset);
            longest_length = run_length;
        }
        i += 2;
    }

    let mut out = String::with_capacity(39);
    let mut i = 0;
    while i < address.len() {
        if Some(i) == longest_offset {
            out.push(':');
            i += longest_length;
            if i == 16 {
                out.push(':');
            }
        } else {
            if i > 0 {
                out.push(':');
            }
            let group = u16::from_be_bytes([address[i], address[i + 1]]);
            out.push_str(&format!("{group:x}"));
            i += 2;
        }
    }
    out
}

/// IDNA ToASCII followed by lowercasing, e.g. `☃.net` to `xn--n3h.net`.
fn domain_to_ascii(input: &str) -> Option<String> {
    let ascii = idna::domain_to_ascii(input).ok()?.to_ascii_lowercase();
    if ascii.is_empty() || contains_invalid_host_char(&ascii) {
        return None;
    }
    Some(ascii)
}

fn contains_invalid_host_char(host: &str) -> bool {
    host.chars()
        .any(|c| c <= '\u{1f}' || c >= '\u{7f}' || " #%/:?@[\\]".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(input: &str) -> Option<String> {
        canonicalize_host(input)
    }

    #[test]
    fn test_domain_lowercased() {
        assert_eq!(host("ABCD").as_deref(), Some("abcd"));
        assert_eq!(host("host.").as_deref(), Some("host."));
    }

    #[test]
    fn test_domain_idn() {
        assert_eq!(host("\u{3c3}").as_deref(), Some("xn--4xa"));
        assert_eq!(host("\u{3a3}").as_deref(), Some("xn--4xa"));
        assert_eq!(host("AB\u{ad}CD").as_deref(), Some("abcd"));
    }

    #[test]
    fn test_domain_illegal_characters() {
        assert_eq!(host(" "), None);
        assert_eq!(host("%20"), None);
        assert_eq!(host("host\u{1}"), None);
        assert_eq!(host(""), None);
    }

    #[test]
    fn test_ipv4_passthrough() {
        assert_eq!(host("255.255.255.255").as_deref(), Some("255.255.255.255"));
        assert_eq!(host("0.0.0.0").as_deref(), Some("0.0.0.0"));
    }

    #[test]
    fn test_ipv6_compression() {
        assert_eq!(host("[::1]").as_deref(), Some("::1"));
        assert_eq!(host("[0000:0000:0000:0000:0000:0000:0000:0001]").as_deref(), Some("::1"));
        assert_eq!(host("[1::]").as_deref(), Some("1::"));
        assert_eq!(host("[0:0:0:0:0:0:0:0]").as_deref(), Some("::"));
        assert_eq!(host("[a:0:0:0:b:0:0:0]").as_deref(), Some("a::b:0:0:0"));
        assert_eq!(host("[2001:db8:0:1:1:1:1:1]").as_deref(), Some("2001:db8:0:1:1:1:1:1"));
        assert_eq!(host("[FF01:0:0:0:0:0:0:101]").as_deref(), Some("ff01::101"));
    }

    #[test]
    fn test_ipv6_compression_shifts_tail() {
        assert_eq!(decode_ipv6(b"1::2:3"), Some([0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 3]));
        assert_eq!(decode_ipv6(b"::"), Some([0; 16]));
        assert_eq!(host("[1:2::7:8]").as_deref(), Some("1:2::7:8"));
    }

    #[test]
    fn test_ipv6_unbracketed_and_escaped() {
        assert_eq!(host("::0001").as_deref(), Some("::1"));
        assert_eq!(host("[%3A%3A%31]").as_deref(), Some("::1"));
        assert_eq!(host("%5B%3A%3A1%5D").as_deref(), Some("::1"));
    }

    #[test]
    fn test_ipv6_malformed() {
        for input in [
            "[:1]",
            "[:::1]",
            "[1:]",
            "[1:::]",
            "[1:::1]",
            "[::00001]",
            "[::g]",
            "[1::2::3]",
            "[1:2:3:4:5:6:7:8:9]",
            "[1:2:3:4:5:6:7::8]",
            "[::1%2544]",
        ] {
            assert_eq!(host(input), None, "{input}");
        }
    }

    #[test]
    fn test_ipv6_ipv4_suffix() {
        assert_eq!(host("[::1:255.255.255.255]").as_deref(), Some("::1:ffff:ffff"));
        assert_eq!(host("[0:0:0:0:0:1:0.0.0.0]").as_deref(), Some("::1:0:0"));
        assert_eq!(host("[::ffff:c0a8:1fe]").as_deref(), Some("192.168.1.254"));
    }

    #[test]
    fn test_ipv6_ipv4_suffix_malformed() {
        for input in [
            "[0:0:0:0:0:1:0.0:0.0]",
            "[0:0:0:0:0:1:0.0-0.0]",
            "[0:0:0:0:0:1:255.255.255.]",
            "[0:0:0:0:0:1:255.255.255]",
            "[0:0:0:0:0:1:256.255.255.255]",
            "[0:0:0:0:0:1:255.255.255.01]",
            "[0:0:0:0:0:1:0x1.0.0.0]",
            "[0:0:0:0:1:0.0.0.0:1]",
            "[0.0.0.0:0:0:0:0:0:1]",
        ] {
            assert_eq!(host(input), None, "{input}");
        }
    }
}
