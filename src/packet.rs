use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::callsign::{check_ax25_call, is_aprsis_call, is_ipv6_hex, is_q_construct};
use crate::error::{AprsError, ErrorCode};
use crate::message::Message;
use crate::telemetry::Telemetry;
use crate::weather::Weather;

/// The kind of payload a packet carries.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PacketType {
    Location,
    Object,
    Item,
    Message,
    Wx,
    Telemetry,
    Status,
    Capabilities,
}

impl PacketType {
    pub fn as_str(self) -> &'static str {
        match self {
            PacketType::Location => "location",
            PacketType::Object => "object",
            PacketType::Item => "item",
            PacketType::Message => "message",
            PacketType::Wx => "wx",
            PacketType::Telemetry => "telemetry",
            PacketType::Status => "status",
            PacketType::Capabilities => "capabilities",
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The position encoding used by a location packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Format {
    Uncompressed,
    Compressed,
    MicE,
    Nmea,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Uncompressed => "uncompressed",
            Format::Compressed => "compressed",
            Format::MicE => "mice",
            Format::Nmea => "nmea",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hop in the digipeater path. `was_digied` is the trailing `*` that
/// marks a hop which has already relayed the packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Digipeater {
    pub call: String,
    pub was_digied: bool,
}

/// Parser behaviour switches. All default to off.
#[derive(Debug, Default, Copy, Clone)]
pub struct Options {
    /// Validate the packet against strict AX.25 rules.
    pub ax25: bool,
    /// Attempt to repair Mic-E packets corrupted by space-collapsing
    /// digipeater software.
    pub accept_broken_mice: bool,
    /// Keep position timestamps as raw digit strings instead of resolving
    /// them against the current time.
    pub raw_timestamp: bool,
}

/// A decoded APRS packet.
///
/// Every field below `dst_callsign` is optional and stays unset when it is
/// irrelevant to the packet shape. Free-text fields (`comment`, `status`,
/// message text) are byte strings: APRS-IS lines routinely carry non-UTF-8
/// bytes there.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Packet {
    /// The untouched input line.
    pub orig_packet: Vec<u8>,
    /// Everything before the first `:`.
    pub header: Vec<u8>,
    /// Everything after the first `:`.
    pub body: Vec<u8>,

    pub src_callsign: String,
    pub dst_callsign: String,
    pub digipeaters: Vec<Digipeater>,

    pub packet_type: Option<PacketType>,
    pub format: Option<Format>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// 0-4 blanked minute digits; 0 is full precision.
    pub pos_ambiguity: Option<u8>,
    /// Metres.
    pub pos_resolution: Option<f64>,

    pub symbol_table: Option<char>,
    pub symbol_code: Option<char>,

    /// km/h.
    pub speed: Option<f64>,
    /// Degrees, 0-360; 360 means north.
    pub course: Option<u16>,
    /// Metres, signed.
    pub altitude: Option<f64>,

    /// Whether the station reports messaging capability; `None` when the
    /// packet shape does not say.
    pub messaging: Option<bool>,

    /// Power/height/gain digits.
    pub phg: Option<String>,
    /// km.
    pub radio_range: Option<f64>,

    pub timestamp: Option<DateTime<Utc>>,
    /// The undecoded timestamp digits, when [`Options::raw_timestamp`] is set.
    pub raw_timestamp: Option<String>,

    /// Object name, space-padded to 9 characters.
    pub object_name: Option<String>,
    pub item_name: Option<String>,
    pub alive: Option<bool>,

    pub message: Option<Message>,
    pub status: Option<Vec<u8>>,
    pub wx: Option<Weather>,
    pub telemetry: Option<Telemetry>,
    pub capabilities: Option<BTreeMap<String, String>>,

    /// Mic-E message bits, three binary digits.
    pub mbits: Option<String>,
    /// Set when a corrupted Mic-E packet was repaired.
    pub mice_mangled: bool,

    /// Datum character from a DAO extension, uppercased.
    pub dao_datum_byte: Option<char>,

    /// 0 or 1, from the compressed-position type byte.
    pub gps_fix_status: Option<u8>,
    /// NMEA checksum verification outcome.
    pub checksum_ok: Option<bool>,

    /// Free-text comment tail.
    pub comment: Vec<u8>,

    /// Non-fatal anomalies found while parsing.
    pub warnings: Vec<AprsError>,
}

impl Packet {
    /// Decodes one TNC2 / APRS-IS line.
    ///
    /// Always returns the record, populated as far as parsing got; the
    /// second element carries the failure, if any, so callers can still
    /// read the routing header of a packet whose body was rejected.
    pub fn decode(data: &[u8], opts: &Options) -> (Packet, Option<AprsError>) {
        let mut packet = Packet {
            orig_packet: data.to_vec(),
            ..Packet::default()
        };
        let err = packet.run_decode(opts).err();
        (packet, err)
    }

    fn run_decode(&mut self, opts: &Options) -> Result<(), AprsError> {
        let colon = self
            .orig_packet
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| {
                AprsError::new(ErrorCode::PacketNoBody, "no packet body after header")
            })?;

        self.header = self.orig_packet[..colon].to_vec();
        self.body = self.orig_packet[colon + 1..].to_vec();

        if self.body.is_empty() {
            return Err(AprsError::new(ErrorCode::PacketNoBody, "packet body is empty"));
        }

        self.parse_header(opts)?;
        self.parse_body(opts)
    }

    pub(crate) fn warn<S: Into<String>>(&mut self, code: ErrorCode, detail: S) {
        self.warnings.push(AprsError::new(code, detail));
    }

    fn parse_header(&mut self, opts: &Options) -> Result<(), AprsError> {
        let gt = self.header.iter().position(|&b| b == b'>').ok_or_else(|| {
            AprsError::new(ErrorCode::SrcCallNoGt, "no '>' in header")
        })?;

        let src = &self.header[..gt];
        if src.is_empty() {
            return Err(AprsError::new(ErrorCode::SrcCallEmpty, "source callsign is empty"));
        }
        let src = ascii_str(src).ok_or_else(|| {
            AprsError::new(ErrorCode::SrcCallBadChars, "source callsign is not ASCII")
        })?;

        if opts.ax25 {
            self.src_callsign = check_ax25_call(src).ok_or_else(|| {
                AprsError::new(
                    ErrorCode::SrcCallNoAx25,
                    format!("source callsign {:?} is not a valid AX.25 call", src),
                )
            })?;
        } else {
            if !is_aprsis_call(src) {
                return Err(AprsError::new(
                    ErrorCode::SrcCallBadChars,
                    format!("invalid characters in source callsign {:?}", src),
                ));
            }
            self.src_callsign = src.to_string();
        }

        let rest = &self.header[gt + 1..];
        if rest.is_empty() {
            return Err(AprsError::new(
                ErrorCode::DstCallEmpty,
                "destination callsign is empty",
            ));
        }

        let mut elements = rest.split(|&b| b == b',');

        let dst = elements.next().unwrap_or_default();
        if dst.is_empty() {
            return Err(AprsError::new(
                ErrorCode::DstCallEmpty,
                "destination callsign is empty",
            ));
        }
        self.dst_callsign = ascii_str(dst)
            .and_then(check_ax25_call)
            .ok_or_else(|| {
                AprsError::new(
                    ErrorCode::DstCallNoAx25,
                    "destination callsign is not a valid AX.25 call",
                )
            })?;

        let path: Vec<&[u8]> = elements.collect();
        if opts.ax25 && path.len() > 8 {
            return Err(AprsError::new(
                ErrorCode::DstPathTooMany,
                format!("too many digipeaters for AX.25: {}", path.len()),
            ));
        }

        let mut seen_q_construct = false;
        for element in path {
            let (call, was_digied) = match element.split_last() {
                Some((&b'*', rest)) => (rest, true),
                _ => (element, false),
            };
            if call.is_empty() {
                return Err(AprsError::new(ErrorCode::DigiEmpty, "empty digipeater callsign"));
            }

            let badchars_code = if opts.ax25 {
                ErrorCode::DigiCallNoAx25
            } else {
                ErrorCode::DigiCallBadChars
            };
            let call = ascii_str(call).ok_or_else(|| {
                AprsError::new(badchars_code, "digipeater callsign is not ASCII")
            })?;

            let call = if opts.ax25 {
                check_ax25_call(call).ok_or_else(|| {
                    AprsError::new(
                        ErrorCode::DigiCallNoAx25,
                        format!("digipeater {:?} is not a valid AX.25 call", call),
                    )
                })?
            } else if is_q_construct(call) {
                seen_q_construct = true;
                call.to_string()
            } else if seen_q_construct && is_ipv6_hex(call) {
                call.to_string()
            } else if is_aprsis_call(call) {
                call.to_string()
            } else {
                return Err(AprsError::new(
                    ErrorCode::DigiCallBadChars,
                    format!("invalid characters in digipeater {:?}", call),
                ));
            };

            self.digipeaters.push(Digipeater { call, was_digied });
        }

        Ok(())
    }

    fn parse_body(&mut self, opts: &Options) -> Result<(), AprsError> {
        // lend the body out so sub-decoders can borrow it while mutating self
        let body = std::mem::take(&mut self.body);
        let result = self.dispatch_body(&body, opts);
        self.body = body;
        result
    }

    fn dispatch_body(&mut self, body: &[u8], opts: &Options) -> Result<(), AprsError> {
        match body[0] {
            b'!' if body.len() > 1 && body[1] == b'!' => self.parse_ultimeter_logging(&body[2..]),
            b'!' | b'=' => self.parse_position_plain(body),
            b'/' | b'@' => self.parse_position_timestamped(body, opts),
            b'`' | b'\'' => self.parse_mic_e(&body[1..], opts),
            b':' => self.parse_message(&body[1..]),
            b';' => self.parse_object(&body[1..]),
            b')' => self.parse_item(&body[1..]),
            b'>' => self.parse_status(&body[1..]),
            b'<' => self.parse_capabilities(&body[1..]),
            b'_' => self.parse_weather_positionless(&body[1..]),
            b'$' if body.starts_with(b"$ULTW") => self.parse_ultimeter(&body[5..]),
            b'$' => self.parse_nmea(body),
            b'T' if body.len() > 1 && body[1] == b'#' => self.parse_telemetry(&body[2..]),
            b'{' if body.len() > 1 && body[1] == b'{' => Err(AprsError::new(
                ErrorCode::ExpUnsupported,
                "unsupported experimental packet format",
            )),
            _ => self.parse_position_fallback(body),
        }
    }
}

fn ascii_str(b: &[u8]) -> Option<&str> {
    if b.is_ascii() {
        std::str::from_utf8(b).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, parse_with};

    #[test]
    fn header_and_body_split() {
        let (p, err) =
            Packet::decode(b"OH7LZB>APRS:>Testing status", &Options::default());
        assert_eq!(err, None);
        assert_eq!(p.header, b"OH7LZB>APRS");
        assert_eq!(p.body, b">Testing status");
        assert_eq!(p.src_callsign, "OH7LZB");
        assert_eq!(p.dst_callsign, "APRS");
        assert_eq!(p.packet_type, Some(PacketType::Status));
    }

    #[test]
    fn header_errors() {
        let cases: &[(&[u8], ErrorCode)] = &[
            (b"OH7LZB>APRS", ErrorCode::PacketNoBody),
            (b"OH7LZB>APRS:", ErrorCode::PacketNoBody),
            (b"OH7LZB:body", ErrorCode::SrcCallNoGt),
            (b">APRS:body", ErrorCode::SrcCallEmpty),
            (b"OH7_LZB>APRS:body", ErrorCode::SrcCallBadChars),
            (b"OH7LZB>:body", ErrorCode::DstCallEmpty),
            (b"OH7LZB>!!!:body", ErrorCode::DstCallNoAx25),
            (b"OH7LZB>APRS,,WIDE:body", ErrorCode::DigiEmpty),
            (b"OH7LZB>APRS,*:body", ErrorCode::DigiEmpty),
            (b"OH7LZB>APRS,WI_DE:body", ErrorCode::DigiCallBadChars),
        ];

        for (raw, code) in cases {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.code, *code, "packet {:?}", raw);
        }
    }

    #[test]
    fn header_errors_ax25() {
        let opts = Options {
            ax25: true,
            ..Options::default()
        };

        let cases: &[(&[u8], ErrorCode)] = &[
            (b"TOOLONGCALL>APRS:body", ErrorCode::SrcCallNoAx25),
            (b"OH7LZB-16>APRS:body", ErrorCode::SrcCallNoAx25),
            (b"OH7LZB>APRS,TOOLONGCALL:body", ErrorCode::DigiCallNoAx25),
            (
                b"OH7LZB>APRS,D1,D2,D3,D4,D5,D6,D7,D8,D9:body",
                ErrorCode::DstPathTooMany,
            ),
        ];

        for (raw, code) in cases {
            let err = parse_with(raw, &opts).unwrap_err();
            assert_eq!(err.code, *code, "packet {:?}", raw);
        }
    }

    #[test]
    fn ax25_valid_paths() {
        let opts = Options {
            ax25: true,
            ..Options::default()
        };

        let p = parse_with(
            b"OH7LZB-9>APX200,OH7AA-1*,WIDE2-1:!6028.51N/02505.68E#",
            &opts,
        )
        .unwrap();
        assert_eq!(p.src_callsign, "OH7LZB-9");
        assert_eq!(p.dst_callsign, "APX200");
        assert_eq!(p.digipeaters.len(), 2);
        assert_eq!(p.digipeaters[0].call, "OH7AA-1");
        assert!(p.digipeaters[0].was_digied);
        assert_eq!(p.digipeaters[1].call, "WIDE2-1");
        assert!(!p.digipeaters[1].was_digied);

        // 8 digipeaters is the AX.25 maximum
        let p = parse_with(b"OH7LZB>APRS,D1,D2,D3,D4,D5,D6,D7,D8:>status", &opts).unwrap();
        assert_eq!(p.digipeaters.len(), 8);

        // source is normalized to uppercase
        let p = parse_with(b"oh7lzb>APRS:>status", &opts).unwrap();
        assert_eq!(p.src_callsign, "OH7LZB");
    }

    #[test]
    fn ipv6_in_path_after_q_construct() {
        let p = parse(
            b"IQ3VQ>APD225,TCPIP*,qAI,IQ3VQ,THIRD,92E5A2B6,T2HUB1,\
              200106F8020204020000000000000002,T2FINLAND:!4526.66NI01104.68E#PHG21306/- \
              Lnx APRS Srv - sez. ARI VR EST",
        )
        .unwrap();
        assert_eq!(p.digipeaters.len(), 8);
        assert_eq!(p.digipeaters[6].call, "200106F8020204020000000000000002");
    }

    #[test]
    fn ipv6_in_path_before_q_construct() {
        let err = parse(
            b"IQ3VQ>APD225,200106F8020204020000000000000002,TCPIP*,qAI,IQ3VQ:!4526.66NI01104.68E#",
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DigiCallBadChars);
    }

    #[test]
    fn bad_srccall_keeps_header_fields() {
        let (p, err) = Packet::decode(
            b"K6IFR_S>APJS10,TCPIP*,qAC,K6IFR-BS:;K6IFR B *250300z3351.79ND11626.40WaRNG0040",
            &Options::default(),
        );
        assert_eq!(err.unwrap().code, ErrorCode::SrcCallBadChars);
        assert_eq!(p.packet_type, None);
    }

    #[test]
    fn bad_digicall_reported() {
        let err = parse(
            b"SV2BRF-6>APU25N,TCPXX*,qAX,SZ8L_GREE:=/:$U#T<:G- BVagelis, qrv:434.350",
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DigiCallBadChars);
    }

    #[test]
    fn non_aprs_beacon_keeps_header() {
        let (p, err) = Packet::decode(b"OH2RDU>UIDIGI: UIDIGI 1.9", &Options::default());
        assert_eq!(err.unwrap().code, ErrorCode::TypeNotSupported);
        assert_eq!(p.src_callsign, "OH2RDU");
        assert_eq!(p.dst_callsign, "UIDIGI");
        assert_eq!(p.body, b" UIDIGI 1.9");
    }

    #[test]
    fn experimental_packet_rejected() {
        let err = parse(b"ASDF>DSALK,OH2RDG*,WIDE:{{ unsupported experimental format")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExpUnsupported);
    }
}
