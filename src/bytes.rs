// functions for working with byte arrays

pub fn parse_bytes<T: std::str::FromStr>(b: &[u8]) -> Option<T> {
    std::str::from_utf8(b).ok()?.parse().ok()
}

/// Returns `b` with leading and trailing ASCII whitespace removed.
pub fn trim_ascii(b: &[u8]) -> &[u8] {
    let is_space = |c: &u8| matches!(c, b' ' | b'\t' | b'\r' | b'\n');

    let start = b.iter().position(|c| !is_space(c)).unwrap_or(b.len());
    let end = b.iter().rposition(|c| !is_space(c)).map_or(start, |i| i + 1);

    &b[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_correctly_u32() {
        assert_eq!(Some(123), parse_bytes::<u32>(b"0123"));
    }

    #[test]
    fn parse_correctly_f64() {
        assert_relative_eq!(123.456, parse_bytes::<f64>(b"0123.4560").unwrap());
    }

    #[test]
    fn parse_fail_on_non_utf8() {
        assert_eq!(None, parse_bytes::<u32>(b"\xF0\xA4\xAD"));
    }

    #[test]
    fn parse_fail_on_not_a_number() {
        assert_eq!(None, parse_bytes::<u32>(b"0123NotANumber"));
        assert_eq!(None, parse_bytes::<u32>(b"NotANumber0123"))
    }

    #[test]
    fn trim_both_ends() {
        assert_eq!(b"abc", trim_ascii(b"  abc \t "));
        assert_eq!(b"a c", trim_ascii(b"a c"));
        assert_eq!(b"", trim_ascii(b" \t\r\n"));
        assert_eq!(b"", trim_ascii(b""));
    }
}
