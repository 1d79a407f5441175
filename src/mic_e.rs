//! Mic-E position decoding.
//!
//! Mic-E hides half of the position in the destination callsign: each of
//! its six characters encodes a latitude digit plus one of the message
//! bits, the N/S flag, the +100° longitude offset or the E/W flag. The
//! information field then carries longitude, speed, course and symbol in
//! six bit-packed bytes, followed by an optional comment that may embed
//! base-91 telemetry, an altitude and a DAO extension.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::base91;
use crate::error::{AprsError, ErrorCode};
use crate::packet::{Format, Options, Packet, PacketType};
use crate::position::{is_valid_symbol_table, pos_resolution};

struct DestChar {
    digit: u8,
    msg_bit: u8,
    is_north: bool,
}

lazy_static! {
    static ref DEST_TABLE: HashMap<u8, DestChar> = {
        let mut m = HashMap::new();
        for b in b'0'..=b'9' {
            m.insert(b, DestChar { digit: b - b'0', msg_bit: 0, is_north: false });
        }
        for b in b'A'..=b'J' {
            m.insert(b, DestChar { digit: b - b'A', msg_bit: 1, is_north: false });
        }
        m.insert(b'K', DestChar { digit: 0, msg_bit: 1, is_north: false });
        m.insert(b'L', DestChar { digit: 0, msg_bit: 0, is_north: false });
        for b in b'P'..=b'Y' {
            m.insert(b, DestChar { digit: b - b'P', msg_bit: 1, is_north: true });
        }
        m.insert(b'Z', DestChar { digit: 0, msg_bit: 1, is_north: true });
        m
    };
}

struct DestFields {
    latitude: f64,
    mbits: String,
    lon_offset: i32,
    is_west: bool,
}

fn decode_destination(dst: &str) -> Result<DestFields, AprsError> {
    let b = dst.as_bytes();

    let mut digits = [0u8; 6];
    let mut mbits = String::with_capacity(3);
    let mut is_north = false;
    let mut lon_offset = 0;
    let mut is_west = false;

    for i in 0..6 {
        let info = DEST_TABLE.get(&b[i]).ok_or_else(|| {
            AprsError::new(
                ErrorCode::MiceInvDstCall,
                format!("invalid Mic-E destination character: {:?}", b[i] as char),
            )
        })?;
        digits[i] = info.digit;

        if i < 3 {
            mbits.push(if info.msg_bit == 1 { '1' } else { '0' });
        }
        if i == 3 && info.is_north {
            is_north = true;
        }
        if i == 4 && (b'P'..=b'Z').contains(&b[i]) {
            lon_offset = 100;
        }
        if i == 5 && (b'P'..=b'Z').contains(&b[i]) {
            is_west = true;
        }
    }

    let lat_deg = f64::from(digits[0]) * 10.0 + f64::from(digits[1]);
    let lat_min = f64::from(digits[2]) * 10.0
        + f64::from(digits[3])
        + (f64::from(digits[4]) * 10.0 + f64::from(digits[5])) / 100.0;
    let mut latitude = lat_deg + lat_min / 60.0;
    if !is_north {
        latitude = -latitude;
    }

    Ok(DestFields {
        latitude,
        mbits,
        lon_offset,
        is_west,
    })
}

fn decode_longitude(b0: u8, b1: u8, b2: u8, lon_offset: i32, is_west: bool) -> f64 {
    let mut lon_deg = i32::from(b0) - 28 + lon_offset;
    if (180..=189).contains(&lon_deg) {
        lon_deg -= 80;
    } else if (190..=199).contains(&lon_deg) {
        lon_deg -= 190;
    }

    let mut lon_min = i32::from(b1) - 28;
    if lon_min >= 60 {
        lon_min -= 60;
    }

    let lon_hmin = i32::from(b2) - 28;

    let mut lon = f64::from(lon_deg) + (f64::from(lon_min) + f64::from(lon_hmin) / 100.0) / 60.0;
    if is_west {
        lon = -lon;
    }
    lon
}

/// Converts Mic-E message bits to the standard display string.
pub fn mice_mbits_to_message(mbits: &str) -> &'static str {
    match mbits {
        "111" => "Off Duty",
        "110" => "En Route",
        "101" => "In Service",
        "100" => "Returning",
        "011" => "Committed",
        "010" => "Special",
        "001" => "Priority",
        "000" => "Emergency",
        _ => "Unknown",
    }
}

impl Packet {
    pub(crate) fn parse_mic_e(&mut self, info: &[u8], opts: &Options) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Location);
        self.format = Some(Format::MicE);

        let result = self.parse_mic_e_normal(info);
        if result.is_err() && opts.accept_broken_mice {
            self.reset_mic_e_fields();
            return self.parse_mic_e_mangled(info);
        }
        result
    }

    fn parse_mic_e_normal(&mut self, info: &[u8]) -> Result<(), AprsError> {
        let dst = strip_ssid(&self.dst_callsign);
        if dst.len() < 6 {
            return Err(AprsError::new(
                ErrorCode::MiceInvDstCall,
                "Mic-E destination callsign too short",
            ));
        }
        if info.len() < 8 {
            return Err(AprsError::new(
                ErrorCode::MiceShort,
                "Mic-E information field too short",
            ));
        }

        let dest = decode_destination(&dst)?;

        self.mbits = Some(dest.mbits);
        self.latitude = Some(dest.latitude);
        self.pos_ambiguity = Some(0);
        self.pos_resolution = Some(pos_resolution(0));
        self.longitude = Some(decode_longitude(
            info[0],
            info[1],
            info[2],
            dest.lon_offset,
            dest.is_west,
        ));

        let sp = i32::from(info[3]) - 28;
        let dc = i32::from(info[4]) - 28;
        let se = i32::from(info[5]) - 28;

        let mut speed = sp * 10 + dc / 10;
        let mut course = (dc % 10) * 100 + se;
        if speed >= 800 {
            speed -= 800;
        }
        if course >= 400 {
            course -= 400;
        }
        self.speed = Some(f64::from(speed) * 1.852);
        self.course = Some(course.max(0) as u16);

        self.symbol_code = Some(info[6] as char);
        let table = info[7];
        if !is_valid_symbol_table(table) {
            return Err(AprsError::new(
                ErrorCode::SymInvTable,
                format!("invalid Mic-E symbol table: {:?}", table as char),
            ));
        }
        self.symbol_table = Some(table as char);

        let comment = info.get(8..).unwrap_or_default();
        let comment = self.parse_mic_e_base91_telemetry(comment);
        let comment = self.parse_mic_e_altitude(&comment);
        let mut comment = self.parse_dao(&comment);
        if comment.first() == Some(&b'\'') {
            comment = self.parse_mic_e_hex_telemetry(&comment);
        }
        self.comment = comment;

        Ok(())
    }

    /// Altitude in a Mic-E comment: three base-91 digits terminated by
    /// `}`, metres with the origin at -10000 m.
    fn parse_mic_e_altitude(&mut self, comment: &[u8]) -> Vec<u8> {
        if let Some(idx) = comment.iter().position(|&b| b == b'}') {
            if idx >= 3 {
                let digits = &comment[idx - 3..idx];
                if digits.iter().all(|&c| base91::is_digit(c)) {
                    if let Some(raw) = base91::decode_ascii(digits) {
                        self.altitude = Some(f64::from(raw) - 10000.0);
                        let mut out = comment[..idx - 3].to_vec();
                        out.extend_from_slice(&comment[idx + 1..]);
                        return out;
                    }
                }
            }
        }
        comment.to_vec()
    }

    /// Recovery for Mic-E packets whose binary bytes were replaced with
    /// spaces by aprsd and then collapsed into one space. Detects the
    /// shape, reinserts the missing space and decodes position and symbol,
    /// skipping the unreliable speed/course bytes.
    fn parse_mic_e_mangled(&mut self, info: &[u8]) -> Result<(), AprsError> {
        let dst = strip_ssid(&self.dst_callsign);
        if dst.len() < 6 || info.len() < 7 {
            return Err(AprsError::new(
                ErrorCode::MiceShort,
                "mangled Mic-E packet too short",
            ));
        }

        let shape_ok = (0x26..=0x7f).contains(&info[0])
            && (0x26..=0x61).contains(&info[1])
            && (0x1c..=0x7f).contains(&info[2])
            && (0x1c..=0x7f).contains(&info[3])
            && info[4] == 0x20
            && (0x21..=0x7d).contains(&info[5])
            && is_valid_symbol_table(info[6]);
        if !shape_ok {
            return Err(AprsError::new(
                ErrorCode::MiceInvInfoField,
                "invalid Mic-E information field",
            ));
        }

        self.mice_mangled = true;

        let mut fixed = info[..5].to_vec();
        fixed.push(b' ');
        fixed.extend_from_slice(&info[5..]);

        let dest = decode_destination(&dst)?;

        self.mbits = Some(dest.mbits);
        self.latitude = Some(dest.latitude);
        self.pos_ambiguity = Some(0);
        self.pos_resolution = Some(pos_resolution(0));
        self.longitude = Some(decode_longitude(
            fixed[0],
            fixed[1],
            fixed[2],
            dest.lon_offset,
            dest.is_west,
        ));

        self.symbol_code = Some(fixed[6] as char);
        self.symbol_table = Some(fixed[7] as char);

        if fixed.len() > 8 {
            self.comment = fixed[8..].to_vec();
        }

        Ok(())
    }

    fn reset_mic_e_fields(&mut self) {
        self.latitude = None;
        self.longitude = None;
        self.pos_ambiguity = None;
        self.pos_resolution = None;
        self.speed = None;
        self.course = None;
        self.altitude = None;
        self.symbol_table = None;
        self.symbol_code = None;
        self.mbits = None;
        self.telemetry = None;
        self.dao_datum_byte = None;
        self.comment.clear();
    }
}

fn strip_ssid(call: &str) -> String {
    call.split('-').next().unwrap_or_default().to_string()
}
