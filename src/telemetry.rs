//! Telemetry decoding: the `T#` report format and the base-91 / hex
//! telemetry blocks embedded in Mic-E comments.

use crate::base91;
use crate::bytes::trim_ascii;
use crate::error::{AprsError, ErrorCode};
use crate::packet::{Packet, PacketType};

/// Decoded telemetry values.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Telemetry {
    /// Sequence number, kept as text: real-world sequence fields are not
    /// always numeric.
    pub seq: String,
    /// Analogue channels; `None` marks an undefined value.
    pub vals: Vec<Option<f64>>,
    /// Digital channels as an 8-character binary string.
    pub bits: Option<String>,
}

/// Accepts the telemetry value grammar: optional minus, optional leading
/// digits, optional dot, and at least one trailing digit.
fn is_numeric_value(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    if b.first() == Some(&b'-') {
        i = 1;
    }

    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    let mut has_dot = false;
    if i < b.len() && b[i] == b'.' {
        has_dot = true;
        i += 1;
    }

    let frac_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let frac_digits = i - frac_start;

    i == b.len() && if has_dot { frac_digits > 0 } else { int_digits > 0 }
}

impl Packet {
    /// `T#seq,a1,a2,a3,a4,a5,bbbbbbbb` — `body` starts after `T#`.
    pub(crate) fn parse_telemetry(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Telemetry);

        let text = String::from_utf8_lossy(body);
        let parts: Vec<&str> = text.splitn(8, ',').collect();
        if parts.len() < 2 {
            return Err(AprsError::new(
                ErrorCode::TlmInvalid,
                "telemetry packet has too few fields",
            ));
        }

        let mut tlm = Telemetry {
            seq: parts[0].to_string(),
            vals: vec![None; 5],
            bits: None,
        };

        for i in 1..parts.len().min(6) {
            let field = parts[i].trim();
            if field.is_empty() {
                continue;
            }

            if !is_numeric_value(field) {
                if field == "-" || field.ends_with('.') {
                    return Err(AprsError::new(
                        ErrorCode::TlmInvalid,
                        format!("invalid telemetry value: {}", field),
                    ));
                }
                // not a value; the rest is most likely a comment
                break;
            }

            match field.parse::<f64>() {
                Ok(val) => tlm.vals[i - 1] = Some(val),
                Err(_) => break,
            }
        }

        if parts.len() >= 7 {
            let bits = parts[6].trim();
            if bits.len() >= 8 && bits.as_bytes()[..8].iter().all(|&c| c == b'0' || c == b'1') {
                tlm.bits = Some(bits[..8].to_string());
            }
        }

        self.telemetry = Some(tlm);
        Ok(())
    }

    /// Base-91 telemetry in a Mic-E comment: `|ssaabbccddee..|` pairs, the
    /// first being the sequence number, up to five value pairs, and an
    /// optional seventh pair holding the digital bits (LSB first). Takes
    /// the rightmost region that matches and returns the comment without
    /// it.
    pub(crate) fn parse_mic_e_base91_telemetry(&mut self, comment: &[u8]) -> Vec<u8> {
        let mut best: Option<(usize, usize)> = None;

        'ends: for end in (0..comment.len()).rev() {
            if comment[end] != b'|' {
                continue;
            }
            for start in (0..end).rev() {
                if comment[start] != b'|' {
                    continue;
                }
                let content = &comment[start + 1..end];
                if content.len() < 4 || content.len() % 2 != 0 {
                    continue;
                }
                if !content.iter().all(|&c| base91::is_digit(c)) {
                    continue;
                }
                best = Some((start, end));
                break 'ends;
            }
        }

        let Some((start, end)) = best else {
            return comment.to_vec();
        };

        let data = &comment[start + 1..end];
        let pairs = data.len() / 2;

        let seq = u32::from(data[0] - 33) * 91 + u32::from(data[1] - 33);
        let mut tlm = Telemetry {
            seq: seq.to_string(),
            vals: vec![None; 5],
            bits: None,
        };

        for i in 1..pairs.min(6) {
            let idx = i * 2;
            let val = u32::from(data[idx] - 33) * 91 + u32::from(data[idx + 1] - 33);
            tlm.vals[i - 1] = Some(f64::from(val));
        }

        if pairs >= 7 {
            let bits_val = u32::from(data[12] - 33) * 91 + u32::from(data[13] - 33);
            let mut bits = String::with_capacity(8);
            for b in 0..8 {
                bits.push(if bits_val & (1 << b) != 0 { '1' } else { '0' });
            }
            tlm.bits = Some(bits);
        }

        self.telemetry = Some(tlm);

        let mut out = comment[..start].to_vec();
        out.extend_from_slice(&comment[end + 1..]);
        trim_ascii(&out).to_vec()
    }

    /// Old-style Mic-E telemetry: an apostrophe followed by 10 (five
    /// channels) or 4 (channels one and three) hex digits.
    pub(crate) fn parse_mic_e_hex_telemetry(&mut self, comment: &[u8]) -> Vec<u8> {
        if comment.len() < 2 || comment[0] != b'\'' {
            return comment.to_vec();
        }

        let rest = &comment[1..];
        let hex_len = if rest.len() >= 10 && rest[..10].iter().all(u8::is_ascii_hexdigit) {
            10
        } else if rest.len() >= 4 && rest[..4].iter().all(u8::is_ascii_hexdigit) {
            4
        } else {
            return comment.to_vec();
        };

        let channel = |i: usize| -> Option<f64> {
            std::str::from_utf8(&rest[i..i + 2])
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .map(f64::from)
        };

        let vals = if hex_len == 4 {
            vec![channel(0), Some(0.0), channel(2)]
        } else {
            (0..5).map(|i| channel(i * 2)).collect()
        };

        self.telemetry = Some(Telemetry {
            seq: String::new(),
            vals,
            bits: None,
        });

        let remaining = &rest[hex_len..];
        let skip = remaining.iter().take_while(|&&b| b == b' ').count();
        remaining[skip..].to_vec()
    }
}
