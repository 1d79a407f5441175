//! NMEA sentences gated into APRS: `$GPRMC`, `$GPGGA` and `$GPGLL`.

use chrono::{TimeZone, Utc};

use crate::bytes::trim_ascii;
use crate::error::{AprsError, ErrorCode};
use crate::packet::{Format, Packet, PacketType};

/// Position resolution from the number of decimal digits in the NMEA
/// minutes field.
fn nmea_pos_resolution(decimals: i32) -> f64 {
    let base = if decimals <= -2 { 600.0 } else { 1000.0 };
    1.852 * base * 10f64.powi(-decimals)
}

/// Parses an NMEA `DDMM.mmm` coordinate. Returns the value in decimal
/// degrees and the position resolution derived from the decimal count.
fn parse_nmea_coord(coord: &str, hemisphere: &str, is_lon: bool) -> Result<(f64, f64), String> {
    if coord.is_empty() || hemisphere.is_empty() {
        return Err("empty coordinate or hemisphere".to_string());
    }
    if !coord.is_ascii() {
        return Err(format!("invalid coordinate: {:?}", coord));
    }

    let deg_len = if is_lon { 3 } else { 2 };
    if coord.len() < deg_len + 1 {
        return Err("coordinate too short".to_string());
    }

    let deg: f64 = coord[..deg_len]
        .parse()
        .map_err(|_| format!("invalid degrees: {:?}", &coord[..deg_len]))?;
    let minutes: f64 = coord[deg_len..]
        .parse()
        .map_err(|_| format!("invalid minutes: {:?}", &coord[deg_len..]))?;

    let mut value = deg + minutes / 60.0;
    if hemisphere == "S" || hemisphere == "W" {
        value = -value;
    }

    let max = if is_lon { 180.0 } else { 90.0 };
    if value.abs() > max {
        return Err(format!("coordinate out of range: {}", value));
    }

    let decimals = match coord[deg_len..].find('.') {
        Some(dot) => (coord.len() - deg_len - dot - 1) as i32,
        None => 0,
    };

    Ok((value, nmea_pos_resolution(decimals)))
}

impl Packet {
    /// `body` is the full packet body, starting with `$`.
    pub(crate) fn parse_nmea(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Location);
        self.format = Some(Format::Nmea);

        if !body.starts_with(b"$GP") {
            return Err(AprsError::new(
                ErrorCode::NmeaInvalid,
                "NMEA sentence must start with $GP",
            ));
        }

        let mut body = trim_ascii(body);

        // verify and strip the checksum, when present
        if let Some(idx) = body.iter().position(|&b| b == b'*') {
            let checksum = &body[idx + 1..];
            if checksum.len() == 2 {
                let given = std::str::from_utf8(checksum)
                    .ok()
                    .and_then(|s| u8::from_str_radix(s, 16).ok());
                if let Some(given) = given {
                    let skip = usize::from(body.first() == Some(&b'$'));
                    let calculated = body[skip..idx].iter().fold(0u8, |acc, &b| acc ^ b);
                    if given != calculated {
                        return Err(AprsError::new(
                            ErrorCode::NmeaInvalid,
                            "NMEA checksum mismatch",
                        ));
                    }
                    self.checksum_ok = Some(true);
                }
            }
            body = &body[..idx];
        }

        let text = String::from_utf8_lossy(body);
        let parts: Vec<&str> = text.split(',').collect();
        if parts.len() < 2 {
            return Err(AprsError::new(ErrorCode::NmeaShort, "NMEA sentence too short"));
        }

        match parts[0] {
            "$GPRMC" => self.parse_gprmc(&parts),
            "$GPGGA" => self.parse_gpgga(&parts),
            "$GPGLL" => self.parse_gpgll(&parts),
            other => Err(AprsError::new(
                ErrorCode::NmeaInvalid,
                format!("unsupported NMEA sentence: {}", other),
            )),
        }
    }

    /// `$GPRMC,HHMMSS,A,DDMM.MMM,N,DDDMM.MMM,W,speed,course,DDMMYY,…`
    fn parse_gprmc(&mut self, parts: &[&str]) -> Result<(), AprsError> {
        if parts.len() < 10 {
            return Err(AprsError::new(ErrorCode::NmeaShort, "GPRMC sentence too short"));
        }

        if parts[2] != "A" {
            return Err(AprsError::new(ErrorCode::GprmcNoFix, "GPRMC: no valid fix"));
        }

        self.parse_gprmc_timestamp(parts[1], parts[9])?;

        let (lat, lat_res) = parse_nmea_coord(parts[3], parts[4], false).map_err(|e| {
            AprsError::new(ErrorCode::PosLatInvalid, format!("GPRMC: {}", e))
        })?;
        self.latitude = Some(lat);

        let (lon, lon_res) = parse_nmea_coord(parts[5], parts[6], true).map_err(|e| {
            AprsError::new(ErrorCode::PosLonInvalid, format!("GPRMC: {}", e))
        })?;
        self.longitude = Some(lon);

        self.pos_resolution = Some(lat_res.max(lon_res));

        if !parts[7].is_empty() {
            if let Ok(speed) = parts[7].parse::<f64>() {
                self.speed = Some(speed * 1.852);
            }
        }

        if parts[8].is_empty() {
            self.course = Some(0);
        } else if let Ok(course) = parts[8].parse::<f64>() {
            let mut c = (course + 0.5) as i32;
            if c == 0 {
                c = 360;
            } else if c > 360 {
                c = 0;
            }
            self.course = Some(c as u16);
        }

        Ok(())
    }

    fn parse_gprmc_timestamp(&mut self, time_str: &str, date_str: &str) -> Result<(), AprsError> {
        let invalid_time = || AprsError::new(ErrorCode::NmeaInvalid, "GPRMC: invalid time");
        let invalid_date = || AprsError::new(ErrorCode::NmeaInvalid, "GPRMC: invalid date");

        // drop fractional seconds
        let time_str = time_str.trim();
        let time_str = time_str.split('.').next().unwrap_or_default();
        if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid_time());
        }
        let hour: u32 = time_str[0..2].parse().map_err(|_| invalid_time())?;
        let minute: u32 = time_str[2..4].parse().map_err(|_| invalid_time())?;
        let second: u32 = time_str[4..6].parse().map_err(|_| invalid_time())?;
        if hour > 23 || minute > 59 || second > 59 {
            return Err(invalid_time());
        }

        let date_str = date_str.trim();
        if date_str.len() != 6 || !date_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid_date());
        }
        let day: u32 = date_str[0..2].parse().map_err(|_| invalid_date())?;
        let month: u32 = date_str[2..4].parse().map_err(|_| invalid_date())?;
        let yy: i32 = date_str[4..6].parse().map_err(|_| invalid_date())?;

        let year = if yy >= 70 { 1900 + yy } else { 2000 + yy };

        let ts = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
            .ok_or_else(invalid_date)?;
        self.timestamp = Some(ts);

        Ok(())
    }

    /// `$GPGGA,HHMMSS,DDMM.MMM,N,DDDMM.MMM,W,quality,sats,HDOP,alt,M,…`
    fn parse_gpgga(&mut self, parts: &[&str]) -> Result<(), AprsError> {
        if parts.len() < 11 {
            return Err(AprsError::new(ErrorCode::NmeaShort, "GPGGA sentence too short"));
        }

        if parts[6] == "0" {
            return Err(AprsError::new(ErrorCode::NmeaInvalid, "GPGGA: no valid fix"));
        }

        let (lat, lat_res) = parse_nmea_coord(parts[2], parts[3], false).map_err(|e| {
            AprsError::new(ErrorCode::PosLatInvalid, format!("GPGGA: {}", e))
        })?;
        self.latitude = Some(lat);

        let (lon, lon_res) = parse_nmea_coord(parts[4], parts[5], true).map_err(|e| {
            AprsError::new(ErrorCode::PosLonInvalid, format!("GPGGA: {}", e))
        })?;
        self.longitude = Some(lon);

        self.pos_resolution = Some(lat_res.max(lon_res));

        if !parts[9].is_empty() {
            if let Ok(alt) = parts[9].parse::<f64>() {
                self.altitude = Some(alt);
            }
        }

        Ok(())
    }

    /// `$GPGLL,DDMM.MMM,N,DDDMM.MMM,W,HHMMSS,A`
    fn parse_gpgll(&mut self, parts: &[&str]) -> Result<(), AprsError> {
        if parts.len() < 5 {
            return Err(AprsError::new(ErrorCode::NmeaShort, "GPGLL sentence too short"));
        }

        let (lat, lat_res) = parse_nmea_coord(parts[1], parts[2], false).map_err(|e| {
            AprsError::new(ErrorCode::PosLatInvalid, format!("GPGLL: {}", e))
        })?;
        self.latitude = Some(lat);

        let (lon, lon_res) = parse_nmea_coord(parts[3], parts[4], true).map_err(|e| {
            AprsError::new(ErrorCode::PosLonInvalid, format!("GPGLL: {}", e))
        })?;
        self.longitude = Some(lon);

        self.pos_resolution = Some(lat_res.max(lon_res));

        Ok(())
    }
}
