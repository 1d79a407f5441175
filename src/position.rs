//! Uncompressed and compressed position reports.
//!
//! Uncompressed positions are `DDMM.MMH` / `DDDMM.MMH` degree-minute
//! strings; trailing minute digits may be blanked with spaces to express
//! position ambiguity, in which case the centre of the resulting box is
//! reported. Compressed positions pack the coordinates into four base-91
//! digits each, with a trailing cs/T triple carrying course/speed,
//! altitude or radio range.

use crate::base91;
use crate::bytes::{parse_bytes, trim_ascii};
use crate::error::{AprsError, ErrorCode};
use crate::packet::{Format, Options, Packet, PacketType};
use crate::timestamp::parse_timestamp;
use crate::weather::{parse_weather_from_comment, Weather};

/// Position resolution in metres for an ambiguity level.
pub(crate) fn pos_resolution(ambiguity: u8) -> f64 {
    match ambiguity {
        1 => 185.2,
        2 => 1852.0,
        3 => 18520.0,
        4 => 111_120.0,
        _ => 18.52,
    }
}

pub(crate) fn is_uncompressed_start(b: u8) -> bool {
    b.is_ascii_digit() || b == b' '
}

/// Symbol table byte of a compressed position: `/`, `\` or an overlay.
pub(crate) fn is_compressed_table_char(b: u8) -> bool {
    b == b'/' || b == b'\\' || b.is_ascii_uppercase() || (b'a'..=b'j').contains(&b)
}

pub(crate) fn is_valid_symbol_table(b: u8) -> bool {
    b == b'/' || b == b'\\' || b.is_ascii_uppercase() || b.is_ascii_digit()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

enum CoordError {
    Ambiguity(String),
    Invalid(String),
}

fn digit_or_space(b: u8) -> Option<(u32, bool)> {
    match b {
        b' ' => Some((0, true)),
        b'0'..=b'9' => Some((u32::from(b - b'0'), false)),
        _ => None,
    }
}

/// Parses `DDMM.MM` / `DDDMM.MM` into degrees, minutes and the ambiguity
/// level. Latitude computes the ambiguity from its trailing minute spaces;
/// longitude inherits it (`known_ambiguity`) and only verifies that its
/// non-ambiguous digits are space-free. Ambiguous positions are centred in
/// their box.
fn parse_degrees_minutes(
    s: &[u8],
    deg_digits: usize,
    known_ambiguity: Option<u8>,
) -> Result<(f64, f64, u8), CoordError> {
    let mut deg = 0.0;
    for i in 0..deg_digits {
        let (d, _) = digit_or_space(s[i]).ok_or_else(|| {
            CoordError::Invalid(format!("invalid degrees character {:?}", s[i] as char))
        })?;
        deg = deg * 10.0 + f64::from(d);
    }

    let dot = s[deg_digits + 2];
    if dot != b'.' && dot != b' ' {
        return Err(CoordError::Invalid(format!(
            "expected '.' between minute digits, got {:?}",
            dot as char
        )));
    }

    let positions = [deg_digits, deg_digits + 1, deg_digits + 3, deg_digits + 4];
    let mut digits = [0u32; 4];
    let mut spaces = [false; 4];
    for (i, &pos) in positions.iter().enumerate() {
        let (d, sp) = digit_or_space(s[pos]).ok_or_else(|| {
            CoordError::Invalid(format!("invalid minutes character {:?}", s[pos] as char))
        })?;
        digits[i] = d;
        spaces[i] = sp;
    }

    let ambiguity = match known_ambiguity {
        None => {
            let ambiguity = spaces.iter().rev().take_while(|&&sp| sp).count();
            if spaces[..4 - ambiguity].iter().any(|&sp| sp) {
                return Err(CoordError::Ambiguity(
                    "space in a non-trailing minute digit".to_string(),
                ));
            }
            ambiguity as u8
        }
        Some(ambiguity) => {
            if spaces[..4 - ambiguity as usize].iter().any(|&sp| sp) {
                return Err(CoordError::Ambiguity(
                    "longitude has spaces in non-ambiguous digits".to_string(),
                ));
            }
            ambiguity
        }
    };

    let mut mm = f64::from(digits[0]) * 10.0
        + f64::from(digits[1])
        + f64::from(digits[2]) * 0.1
        + f64::from(digits[3]) * 0.01;

    match ambiguity {
        1 => mm = (mm / 0.1).floor() * 0.1 + 0.05,
        2 => mm = mm.floor() + 0.5,
        3 => mm = (mm / 10.0).floor() * 10.0 + 5.0,
        4 => {
            deg = deg.floor();
            mm = 30.0;
        }
        _ => {}
    }

    Ok((deg, mm, ambiguity))
}

fn parse_uncompressed_lat(b: &[u8]) -> Result<(f64, u8), AprsError> {
    let north = match b[7] {
        b'N' => true,
        b'S' => false,
        other => {
            return Err(AprsError::new(
                ErrorCode::LocInvalid,
                format!("invalid latitude hemisphere: {:?}", other as char),
            ))
        }
    };

    let (deg, mm, ambiguity) = parse_degrees_minutes(&b[..7], 2, None).map_err(|e| match e {
        CoordError::Ambiguity(detail) => AprsError::new(ErrorCode::LocAmbInvalid, detail),
        CoordError::Invalid(detail) => {
            AprsError::new(ErrorCode::LocInvalid, format!("invalid latitude: {}", detail))
        }
    })?;

    let lat = deg + mm / 60.0;
    if lat > 90.0 {
        return Err(AprsError::new(
            ErrorCode::LocLarge,
            format!("latitude out of range: {}", lat),
        ));
    }

    Ok((if north { lat } else { -lat }, ambiguity))
}

fn parse_uncompressed_lon(b: &[u8], ambiguity: u8) -> Result<f64, AprsError> {
    let east = match b[8] {
        b'E' => true,
        b'W' => false,
        other => {
            return Err(AprsError::new(
                ErrorCode::PosLonInvalid,
                format!("invalid longitude hemisphere: {:?}", other as char),
            ))
        }
    };

    let (deg, mm, _) =
        parse_degrees_minutes(&b[..8], 3, Some(ambiguity)).map_err(|e| match e {
            CoordError::Ambiguity(detail) => AprsError::new(ErrorCode::LocAmbInvalid, detail),
            CoordError::Invalid(detail) => AprsError::new(
                ErrorCode::PosLonInvalid,
                format!("invalid longitude: {}", detail),
            ),
        })?;

    let lon = deg + mm / 60.0;
    if lon > 180.0 {
        return Err(AprsError::new(
            ErrorCode::LocLarge,
            format!("longitude out of range: {}", lon),
        ));
    }

    Ok(if east { lon } else { -lon })
}

/// Removes an inline `|…|` telemetry block from a compressed-position
/// comment without decoding it.
fn strip_inline_telemetry(comment: &[u8]) -> Vec<u8> {
    if let (Some(first), Some(last)) = (
        comment.iter().position(|&b| b == b'|'),
        comment.iter().rposition(|&b| b == b'|'),
    ) {
        if first < last {
            let mut out = comment[..first].to_vec();
            out.extend_from_slice(&comment[last + 1..]);
            return out;
        }
    }
    comment.to_vec()
}

impl Packet {
    /// Position report without a timestamp (`!` and `=`).
    pub(crate) fn parse_position_plain(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Location);
        self.messaging = Some(body[0] == b'=');

        let body = &body[1..];
        if body.is_empty() {
            return Err(AprsError::new(ErrorCode::PosShort, "position body too short"));
        }

        if is_uncompressed_start(body[0]) {
            self.parse_uncompressed_position(body)
        } else {
            self.parse_compressed_position(body)
        }
    }

    /// Position report with a leading 7-character timestamp (`/` and `@`).
    pub(crate) fn parse_position_timestamped(
        &mut self,
        body: &[u8],
        opts: &Options,
    ) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Location);
        self.messaging = Some(body[0] == b'@');

        let body = &body[1..];
        if body.len() < 7 {
            return Err(AprsError::new(
                ErrorCode::PosShort,
                "position body too short for timestamp",
            ));
        }

        if opts.raw_timestamp {
            self.raw_timestamp = Some(String::from_utf8_lossy(&body[..6]).into_owned());
        } else {
            match parse_timestamp(&body[..7]) {
                Ok(ts) => self.timestamp = Some(ts),
                Err(e) => self.warn(
                    ErrorCode::TimestampInvalid,
                    format!("invalid timestamp: {}", e.detail),
                ),
            }
        }

        let pos = &body[7..];
        if pos.is_empty() {
            return Err(AprsError::new(
                ErrorCode::PosShort,
                "no position data after timestamp",
            ));
        }

        if is_uncompressed_start(pos[0]) {
            self.parse_uncompressed_position(pos)
        } else {
            self.parse_compressed_position(pos)
        }
    }

    pub(crate) fn parse_uncompressed_position(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.format = Some(Format::Uncompressed);

        if body.len() < 19 {
            return Err(AprsError::new(
                ErrorCode::PosShort,
                "uncompressed position too short",
            ));
        }

        let (lat, ambiguity) = parse_uncompressed_lat(&body[..8])?;
        self.latitude = Some(lat);
        self.pos_ambiguity = Some(ambiguity);

        let table = body[8];
        if !is_valid_symbol_table(table) {
            return Err(AprsError::new(
                ErrorCode::SymInvTable,
                format!("invalid symbol table: {:?}", table as char),
            ));
        }
        self.symbol_table = Some(table as char);

        self.longitude = Some(parse_uncompressed_lon(&body[9..18], ambiguity)?);
        self.symbol_code = Some(body[18] as char);
        self.pos_resolution = Some(pos_resolution(ambiguity));

        if body.len() > 19 {
            self.parse_position_comment(&body[19..]);
        }

        Ok(())
    }

    pub(crate) fn parse_compressed_position(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.format = Some(Format::Compressed);

        if body.len() < 13 {
            return Err(AprsError::new(
                ErrorCode::CompShort,
                "compressed position too short",
            ));
        }

        self.symbol_table = Some(body[0] as char);

        let lat_val = base91::decode_ascii(&body[1..5]).ok_or_else(|| {
            AprsError::new(ErrorCode::CompInvalid, "invalid base-91 latitude digits")
        })?;
        let lon_val = base91::decode_ascii(&body[5..9]).ok_or_else(|| {
            AprsError::new(ErrorCode::CompInvalid, "invalid base-91 longitude digits")
        })?;

        self.latitude = Some(90.0 - f64::from(lat_val) / 380_926.0);
        self.longitude = Some(-180.0 + f64::from(lon_val) / 190_463.0);
        self.symbol_code = Some(body[9] as char);

        let c1 = i32::from(body[10]) - 33;
        let s1 = i32::from(body[11]) - 33;
        let comp_type = i32::from(body[12]) - 33;

        // the cs/T bytes matter only when c is not a space
        if c1 != -1 {
            self.gps_fix_status = Some(u8::from(comp_type & 0x20 != 0));
        }

        self.pos_resolution = Some(0.291);

        if c1 == -1 || s1 == -1 {
            // csT unused
        } else if comp_type & 0x18 == 0x10 {
            let cs = c1 * 91 + s1;
            self.altitude = Some(1.002f64.powi(cs) * 0.3048);
        } else if (0..=89).contains(&c1) {
            self.course = Some(if c1 == 0 { 360 } else { (c1 * 4) as u16 });
            self.speed = Some((1.08f64.powi(s1) - 1.0) * 1.852);
        } else if c1 == 90 {
            self.radio_range = Some(2.0 * 1.08f64.powi(s1) * 1.609344);
        }

        if body.len() > 13 {
            let comment = &body[13..];

            if self.symbol_code == Some('_') {
                self.packet_type = Some(PacketType::Wx);
                let mut wx = Weather::default();
                let tail = parse_weather_from_comment(comment, &mut wx);
                if wx.has_data() && !tail.is_empty() {
                    self.comment = tail;
                }
                self.wx = Some(wx);
                return Ok(());
            }

            let comment = strip_inline_telemetry(comment);
            let comment = self.parse_dao(&comment);
            self.comment = trim_ascii(&comment).to_vec();
        }

        Ok(())
    }

    /// Consumes the comment tail of an uncompressed position: PHG,
    /// course/speed, altitude and DAO in that order, leaving the trimmed
    /// remainder as the comment. A `_` symbol reinterprets the whole tail
    /// as weather data.
    pub(crate) fn parse_position_comment(&mut self, comment: &[u8]) {
        if self.symbol_code == Some('_') {
            self.packet_type = Some(PacketType::Wx);
            let mut wx = Weather::default();
            let tail = parse_weather_from_comment(comment, &mut wx);
            if wx.has_data() && !tail.is_empty() {
                self.comment = tail;
            }
            self.wx = Some(wx);
            return;
        }

        let mut comment = comment.to_vec();

        if comment.len() >= 7
            && comment.starts_with(b"PHG")
            && comment[3..7].iter().all(u8::is_ascii_digit)
        {
            self.phg = Some(String::from_utf8_lossy(&comment[3..7]).into_owned());
            comment.drain(..7);
            if comment.first() == Some(&b'/') {
                comment.remove(0);
            }
        }

        if comment.len() >= 7 && comment[3] == b'/' {
            let course: Option<u16> = parse_bytes(&comment[..3]);
            let speed: Option<u32> = parse_bytes(&comment[4..7]);
            if let (Some(course), Some(speed)) = (course, speed) {
                if course <= 360 {
                    self.course = Some(course);
                    self.speed = Some(f64::from(speed) * 1.852);
                    comment.drain(..7);
                }
            }
        }

        if let Some(idx) = find_subslice(&comment, b"/A=") {
            if comment.len() >= idx + 9 {
                if let Some(alt) = parse_bytes::<i32>(&comment[idx + 3..idx + 9]) {
                    self.altitude = Some(f64::from(alt) * 0.3048);
                    comment.drain(idx..idx + 9);
                }
            }
        }

        let comment = self.parse_dao(&comment);
        self.comment = trim_ascii(&comment).to_vec();
    }

    /// Extracts a `!Dxy!` DAO precision extension, applies the extra
    /// digits to the coordinates and returns the comment without it.
    pub(crate) fn parse_dao(&mut self, comment: &[u8]) -> Vec<u8> {
        let mut i = 0;
        while i + 4 < comment.len() {
            if comment[i] == b'!' && comment[i + 4] == b'!' {
                let datum = comment[i + 1];
                let d1 = comment[i + 2];
                let d2 = comment[i + 3];

                if datum.is_ascii_uppercase() && d1.is_ascii_digit() && d2.is_ascii_digit() {
                    self.dao_datum_byte = Some(datum as char);
                    self.apply_dao(
                        f64::from(d1 - b'0') * 0.001 / 60.0,
                        f64::from(d2 - b'0') * 0.001 / 60.0,
                        1.852,
                    );
                    let mut out = comment[..i].to_vec();
                    out.extend_from_slice(&comment[i + 5..]);
                    return out;
                }

                if datum.is_ascii_lowercase() && base91::is_digit(d1) && base91::is_digit(d2) {
                    self.dao_datum_byte = Some(datum.to_ascii_uppercase() as char);
                    self.apply_dao(
                        f64::from(d1 - 33) / 91.0 * 0.01 / 60.0,
                        f64::from(d2 - 33) / 91.0 * 0.01 / 60.0,
                        0.1852,
                    );
                    let mut out = comment[..i].to_vec();
                    out.extend_from_slice(&comment[i + 5..]);
                    return out;
                }
            }
            i += 1;
        }
        comment.to_vec()
    }

    fn apply_dao(&mut self, lat_add: f64, lon_add: f64, resolution: f64) {
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            self.latitude = Some(if lat < 0.0 { lat - lat_add } else { lat + lat_add });
            self.longitude = Some(if lon < 0.0 { lon - lon_add } else { lon + lon_add });
            self.pos_resolution = Some(resolution);
        }
    }

    /// Last-resort parsing for unrecognized body types: hunt for a `!`
    /// within the first 40 bytes and try to read a position after it.
    pub(crate) fn parse_position_fallback(&mut self, body: &[u8]) -> Result<(), AprsError> {
        let unsupported = || AprsError::new(ErrorCode::TypeNotSupported, "unsupported packet type");

        let idx = body
            .iter()
            .position(|&b| b == b'!')
            .filter(|&i| i <= 39)
            .ok_or_else(unsupported)?;

        let rest = &body[idx + 1..];
        if let Some(&first) = rest.first() {
            if is_uncompressed_start(first) {
                if rest.len() < 19 {
                    return Err(unsupported());
                }
                self.packet_type = Some(PacketType::Location);
                self.messaging = Some(false);
                return self.parse_uncompressed_position(rest);
            }
            if rest.len() >= 13 && is_compressed_table_char(first) {
                self.packet_type = Some(PacketType::Location);
                self.messaging = Some(false);
                return self.parse_compressed_position(rest);
            }
        }

        Err(unsupported())
    }
}
