//! Weather reports.
//!
//! Three wire shapes end up here: weather embedded in a position report
//! (symbol code `_`), the position-less `_MMDDHHMM…` report, and the two
//! Peet Bros Ultimeter formats (`$ULTW…` and the `!!…` logging frames)
//! made of fixed-width 16-bit hex fields.

use crate::bytes::trim_ascii;
use crate::error::{AprsError, ErrorCode};
use crate::packet::{Packet, PacketType};

/// Weather readings. All fields are optional; units are SI (m/s, °C,
/// millibars, millimetres).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Weather {
    /// Degrees.
    pub wind_direction: Option<f64>,
    /// m/s.
    pub wind_speed: Option<f64>,
    /// m/s.
    pub wind_gust: Option<f64>,
    /// °C.
    pub temp: Option<f64>,
    /// Indoor temperature, °C.
    pub temp_in: Option<f64>,
    /// Relative humidity, percent.
    pub humidity: Option<i32>,
    /// Indoor humidity, percent.
    pub humidity_in: Option<i32>,
    /// Millibars.
    pub pressure: Option<f64>,
    /// Rain during the last hour, mm.
    pub rain_1h: Option<f64>,
    /// Rain during the last 24 hours, mm.
    pub rain_24h: Option<f64>,
    /// Rain since midnight, mm.
    pub rain_midnight: Option<f64>,
    /// Snowfall during the last 24 hours, mm.
    pub snow_24h: Option<f64>,
    /// W/m².
    pub luminosity: Option<i32>,
    /// Metres.
    pub water_level: Option<f64>,
    /// nSv/h.
    pub radiation: Option<f64>,
    /// Volts.
    pub battery_voltage: Option<f64>,
    /// Station software / device identifier.
    pub software: Option<String>,
}

impl Weather {
    /// True when at least one reading was decoded.
    pub fn has_data(&self) -> bool {
        self.wind_direction.is_some()
            || self.wind_speed.is_some()
            || self.wind_gust.is_some()
            || self.temp.is_some()
            || self.temp_in.is_some()
            || self.humidity.is_some()
            || self.humidity_in.is_some()
            || self.pressure.is_some()
            || self.rain_1h.is_some()
            || self.rain_24h.is_some()
            || self.rain_midnight.is_some()
            || self.snow_24h.is_some()
            || self.luminosity.is_some()
            || self.water_level.is_some()
            || self.radiation.is_some()
            || self.battery_voltage.is_some()
    }
}

/// Reads a fixed-width numeric weather value. All-dots or all-spaces mean
/// the reading is missing.
fn parse_wx_value(s: &[u8], width: usize) -> Option<i32> {
    if s.len() < width {
        return None;
    }
    let field = &s[..width];
    if field.iter().all(|&c| c == b'.' || c == b' ') {
        return None;
    }
    std::str::from_utf8(field).ok()?.trim().parse().ok()
}

/// True when the field slot holds only dots/spaces and can be skipped.
fn skip_wx_field(s: &[u8], width: usize) -> bool {
    s.len() >= width && s[..width].iter().all(|&c| c == b'.' || c == b' ')
}

fn take_field(rest: &[u8], width: usize, mut apply: impl FnMut(i32)) -> usize {
    if let Some(val) = parse_wx_value(rest, width) {
        apply(val);
        1 + width
    } else if skip_wx_field(rest, width) {
        1 + width
    } else {
        0
    }
}

fn is_software_id(s: &[u8]) -> bool {
    (3..=5).contains(&s.len())
        && s.iter()
            .all(|&c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_')
}

/// Parses the letter-prefixed weather field stream. Returns the trailing
/// non-weather text, if any; a trailing software identifier is stored on
/// the record instead.
pub(crate) fn parse_weather_fields(data: &[u8], wx: &mut Weather) -> Vec<u8> {
    let mut i = 0;
    while i < data.len() {
        if i + 1 >= data.len() {
            break;
        }

        let rest = &data[i + 1..];
        let consumed = match data[i] {
            b'c' => take_field(rest, 3, |v| wx.wind_direction = Some(f64::from(v))),
            b's' => take_field(rest, 3, |v| wx.wind_speed = Some(f64::from(v) * 0.44704)),
            b'g' => take_field(rest, 3, |v| wx.wind_gust = Some(f64::from(v) * 0.44704)),
            b't' => take_field(rest, 3, |v| {
                wx.temp = Some((f64::from(v) - 32.0) * 5.0 / 9.0)
            }),
            b'r' => take_field(rest, 3, |v| wx.rain_1h = Some(f64::from(v) * 0.254)),
            b'p' => take_field(rest, 3, |v| wx.rain_24h = Some(f64::from(v) * 0.254)),
            b'P' => take_field(rest, 3, |v| wx.rain_midnight = Some(f64::from(v) * 0.254)),
            b'h' => take_field(rest, 2, |v| {
                wx.humidity = Some(if v == 0 { 100 } else { v })
            }),
            b'b' => take_field(rest, 5, |v| wx.pressure = Some(f64::from(v) / 10.0)),
            b'L' => take_field(rest, 3, |v| wx.luminosity = Some(v)),
            b'l' => take_field(rest, 3, |v| wx.luminosity = Some(v + 1000)),
            b'O' if rest.first() == Some(&b's') => {
                let consumed = take_field(&rest[1..], 3, |v| {
                    wx.snow_24h = Some(f64::from(v) * 0.254)
                });
                if consumed > 0 {
                    1 + consumed
                } else {
                    0
                }
            }
            b'F' => take_field(rest, 4, |v| {
                wx.water_level = Some(f64::from(v) / 10.0 * 0.3048)
            }),
            b'X' => take_field(rest, 3, |v| {
                let significand = v / 10;
                let exponent = v % 10;
                wx.radiation = Some(f64::from(significand) * 10f64.powi(exponent));
            }),
            b'V' => take_field(rest, 3, |v| wx.battery_voltage = Some(f64::from(v) / 10.0)),
            b'#' => take_field(rest, 3, |_| {}), // raw rain counter
            _ => 0,
        };

        if consumed > 0 {
            i += consumed;
        } else {
            let remaining = trim_ascii(&data[i..]);
            if is_software_id(remaining) {
                wx.software = Some(String::from_utf8_lossy(remaining).into_owned());
                return Vec::new();
            }
            return remaining.to_vec();
        }
    }
    Vec::new()
}

/// Weather data from a position packet's comment: a `CCC/SSS` wind
/// direction/speed pair followed by the field stream. Returns the
/// trailing non-weather text.
pub(crate) fn parse_weather_from_comment(comment: &[u8], wx: &mut Weather) -> Vec<u8> {
    if comment.len() < 7 {
        return Vec::new();
    }

    let mut comment = comment;
    if comment[3] == b'/' {
        if let Some(dir) = parse_wx_value(&comment[..3], 3) {
            wx.wind_direction = Some(f64::from(dir));
        }
        if let Some(speed) = parse_wx_value(&comment[4..7], 3) {
            wx.wind_speed = Some(f64::from(speed) * 0.44704);
        }
        comment = &comment[7..];
    }

    parse_weather_fields(comment, wx)
}

/// Splits Ultimeter data into signed 16-bit values; `----` is undefined.
fn parse_ultw_fields(mut s: &[u8]) -> Vec<Option<i32>> {
    let mut vals = Vec::new();
    while s.len() >= 4 {
        let field = &s[..4];
        s = &s[4..];

        if field == b"----" {
            vals.push(None);
            continue;
        }
        let parsed = std::str::from_utf8(field)
            .ok()
            .and_then(|text| u16::from_str_radix(text, 16).ok());
        match parsed {
            Some(v) => vals.push(Some(i32::from(v as i16))),
            None => break,
        }
    }
    vals
}

fn ultw_wind_speed(v: i32) -> f64 {
    (f64::from(v) / 36.0 * 10.0).round() / 10.0
}

fn ultw_direction(v: i32) -> f64 {
    (f64::from(v & 0xff) * 1.41176).round()
}

fn ultw_temp(v: i32) -> f64 {
    let celsius = (f64::from(v) / 10.0 - 32.0) / 1.8;
    (celsius * 10.0).round() / 10.0
}

fn ultw_rain(v: i32) -> f64 {
    (f64::from(v) * 0.254 * 10.0).round() / 10.0
}

fn ultw_humidity(v: i32) -> Option<i32> {
    let h = v / 10;
    (1..=100).contains(&h).then_some(h)
}

impl Packet {
    /// Position-less weather report: `_MMDDHHMM` followed by the field
    /// stream. `body` starts after `_`.
    pub(crate) fn parse_weather_positionless(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Wx);

        if body.len() < 8 {
            return Err(AprsError::new(
                ErrorCode::WxInvalid,
                "positionless weather report too short",
            ));
        }

        let mut wx = Weather::default();
        parse_weather_fields(&body[8..], &mut wx);
        self.wx = Some(wx);

        Ok(())
    }

    /// `$ULTW` packet data. Field order: wind gust, wind direction,
    /// outdoor temp, rain since midnight, pressure, three skipped
    /// barometer fields, humidity, date, time, rain since midnight again
    /// (overwrites), wind speed.
    pub(crate) fn parse_ultimeter(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Wx);

        let fields = parse_ultw_fields(body);
        if fields.is_empty() {
            return Err(AprsError::new(
                ErrorCode::WxInvalid,
                "ULTW weather report has no data",
            ));
        }

        let mut it = fields.into_iter();
        let mut wx = Weather::default();

        if let Some(v) = it.next().flatten() {
            wx.wind_gust = Some(ultw_wind_speed(v));
        }
        if let Some(v) = it.next().flatten() {
            wx.wind_direction = Some(ultw_direction(v));
        }
        if let Some(v) = it.next().flatten() {
            wx.temp = Some(ultw_temp(v));
        }
        if let Some(v) = it.next().flatten() {
            wx.rain_midnight = Some(ultw_rain(v));
        }
        match it.next().flatten() {
            Some(v) if v >= 10 => wx.pressure = Some(f64::from(v) / 10.0),
            _ => {}
        }
        it.next(); // barometer delta
        it.next(); // barometer correction LSW
        it.next(); // barometer correction MSW
        if let Some(v) = it.next().flatten() {
            wx.humidity = ultw_humidity(v);
        }
        it.next(); // date
        it.next(); // time
        if let Some(v) = it.next().flatten() {
            wx.rain_midnight = Some(ultw_rain(v));
        }
        if let Some(v) = it.next().flatten() {
            wx.wind_speed = Some(ultw_wind_speed(v));
        }

        self.wx = Some(wx);
        Ok(())
    }

    /// `!!` Ultimeter logging frame. Field order: wind speed, direction,
    /// outdoor temp, rain since midnight, pressure, indoor temp, humidity,
    /// indoor humidity, date, time, rain since midnight again (overwrites),
    /// average wind speed (overwrites).
    pub(crate) fn parse_ultimeter_logging(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Wx);

        let fields = parse_ultw_fields(body);
        if fields.is_empty() {
            return Err(AprsError::new(
                ErrorCode::WxInvalid,
                "ULTW logging weather report has no data",
            ));
        }

        let mut it = fields.into_iter();
        let mut wx = Weather::default();

        if let Some(v) = it.next().flatten() {
            wx.wind_speed = Some(ultw_wind_speed(v));
        }
        if let Some(v) = it.next().flatten() {
            wx.wind_direction = Some(ultw_direction(v));
        }
        if let Some(v) = it.next().flatten() {
            wx.temp = Some(ultw_temp(v));
        }
        if let Some(v) = it.next().flatten() {
            wx.rain_midnight = Some(ultw_rain(v));
        }
        match it.next().flatten() {
            Some(v) if v >= 10 => wx.pressure = Some(f64::from(v) / 10.0),
            _ => {}
        }
        if let Some(v) = it.next().flatten() {
            wx.temp_in = Some(ultw_temp(v));
        }
        if let Some(v) = it.next().flatten() {
            wx.humidity = ultw_humidity(v);
        }
        if let Some(v) = it.next().flatten() {
            wx.humidity_in = ultw_humidity(v);
        }
        it.next(); // date
        it.next(); // time
        if let Some(v) = it.next().flatten() {
            wx.rain_midnight = Some(ultw_rain(v));
        }
        if let Some(v) = it.next().flatten() {
            wx.wind_speed = Some(ultw_wind_speed(v));
        }

        if wx.temp.is_none() && wx.temp_in.is_some() {
            wx.temp = wx.temp_in;
        }

        self.wx = Some(wx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn basic_wx_report() {
        let p = parse(
            b"OH2RDP-1>BEACON-15,WIDE2-1,qAo,OH2MQK-1:=6030.35N/02443.91E_150/002g004t039r001P002p004h00b10125XRSW",
        )
        .unwrap();

        assert_eq!(p.packet_type, Some(PacketType::Wx));
        assert_relative_eq!(p.latitude.unwrap(), 60.5058, epsilon = 1e-4);
        assert_relative_eq!(p.longitude.unwrap(), 24.7318, epsilon = 1e-4);
        assert_relative_eq!(p.pos_resolution.unwrap(), 18.52);

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_direction, Some(150.0));
        assert_relative_eq!(wx.wind_speed.unwrap(), 0.9, epsilon = 0.05);
        assert_relative_eq!(wx.wind_gust.unwrap(), 1.8, epsilon = 0.05);
        assert_relative_eq!(wx.temp.unwrap(), 3.9, epsilon = 0.05);
        assert_eq!(wx.humidity, Some(100));
        assert_relative_eq!(wx.pressure.unwrap(), 1012.5);
        assert_relative_eq!(wx.rain_1h.unwrap(), 0.254);
        assert_relative_eq!(wx.rain_midnight.unwrap(), 0.508);
        assert_relative_eq!(wx.rain_24h.unwrap(), 1.016);
        assert_eq!(wx.software.as_deref(), Some("XRSW"));
    }

    #[test]
    fn wx_with_comment() {
        let p = parse(
            b"OH2GAX>APU25N,TCPIP*,qAC,OH2GAX:@101317z6024.78N/02503.97E_156/001g005t038r000p000P000h91b10093/type ?sade for more wx info",
        )
        .unwrap();

        assert_eq!(p.comment, b"/type ?sade for more wx info");

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_direction, Some(156.0));
        assert_relative_eq!(wx.wind_speed.unwrap(), 0.45, epsilon = 0.01);
        assert_relative_eq!(wx.wind_gust.unwrap(), 2.24, epsilon = 0.01);
        assert_relative_eq!(wx.temp.unwrap(), 3.3, epsilon = 0.05);
        assert_eq!(wx.humidity, Some(91));
        assert_relative_eq!(wx.pressure.unwrap(), 1009.3);
        assert_eq!(wx.rain_1h, Some(0.0));
        assert_eq!(wx.rain_24h, Some(0.0));
        assert_eq!(wx.rain_midnight, Some(0.0));
    }

    #[test]
    fn wx_with_station_name_comment() {
        let p = parse(
            b"JH9YVX>APU25N,TCPIP*,qAC,T2TOKYO3:@011241z3558.58N/13629.67E_068/001g001t033r000p020P020b09860h98Oregon WMR100N Weather Station {UIV32N}",
        )
        .unwrap();

        assert_eq!(p.comment, b"Oregon WMR100N Weather Station {UIV32N}");

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_direction, Some(68.0));
        assert_relative_eq!(wx.temp.unwrap(), 0.6, epsilon = 0.05);
        assert_eq!(wx.humidity, Some(98));
        assert_relative_eq!(wx.pressure.unwrap(), 986.0);
        assert_relative_eq!(wx.rain_24h.unwrap(), 5.08);
        assert_relative_eq!(wx.rain_midnight.unwrap(), 5.08);
    }

    #[test]
    fn wx_missing_wind_direction() {
        let p = parse(
            b"N0CALL>APU25N,TCPIP*,qAC,T2TOKYO3:@011241z3558.58N/13629.67E_.../...g001t033r000p020P020b09860h98",
        )
        .unwrap();

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_direction, None);
        assert_eq!(wx.wind_speed, None);
        assert_relative_eq!(wx.wind_gust.unwrap(), 0.45, epsilon = 0.01);
    }

    #[test]
    fn wx_mostly_missing_fields() {
        let p = parse(
            b"N0CALL>APJLSX,TCPIP*,qAS,KG4EXY:@061750z3849.10N/07725.10W_.../...g...t...r008p011P011b.....h..",
        )
        .unwrap();

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_gust, None);
        assert_eq!(wx.temp, None);
        assert_eq!(wx.pressure, None);
        assert_eq!(wx.humidity, None);
        assert_relative_eq!(wx.rain_1h.unwrap(), 2.032);
    }

    #[test]
    fn wx_space_filled_gust() {
        let p = parse(
            b"N0CALL>APU25N,TCPIP*,qAC,T2TOKYO3:@011241z3558.58N/13629.67E_.../...g   t033r000p020P020b09860h98",
        )
        .unwrap();

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_gust, None);
        assert_relative_eq!(wx.temp.unwrap(), 0.6, epsilon = 0.05);
    }

    #[test]
    fn positionless_with_snowfall_and_luminosity() {
        let p = parse(
            b"JH9YVX>APU25N,TCPIP*,qAC,T2TOKYO3:_12032359c180s001g002t033r010p040P080b09860h98Os010L500",
        )
        .unwrap();

        assert_eq!(p.packet_type, Some(PacketType::Wx));
        assert_eq!(p.latitude, None);
        assert_eq!(p.longitude, None);
        assert_eq!(p.pos_resolution, None);

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_direction, Some(180.0));
        assert_relative_eq!(wx.wind_speed.unwrap(), 0.45, epsilon = 0.01);
        assert_relative_eq!(wx.wind_gust.unwrap(), 0.89, epsilon = 0.01);
        assert_relative_eq!(wx.temp.unwrap(), 0.6, epsilon = 0.05);
        assert_eq!(wx.humidity, Some(98));
        assert_relative_eq!(wx.pressure.unwrap(), 986.0);
        assert_relative_eq!(wx.rain_1h.unwrap(), 2.54);
        assert_relative_eq!(wx.rain_24h.unwrap(), 10.16);
        assert_relative_eq!(wx.rain_midnight.unwrap(), 20.32);
        assert_relative_eq!(wx.snow_24h.unwrap(), 2.54);
        assert_eq!(wx.luminosity, Some(500));
    }

    #[test]
    fn compressed_position_weather() {
        let p = parse(
            b"SV4IKL-2>APU25N,WIDE2-2,qAR,SV6EXB-1:@011444z/:JF!T/W-_e!bg001t054r000p010P010h65b10073WS 2300 {UIV32N}",
        )
        .unwrap();

        assert_eq!(p.symbol_table, Some('/'));
        assert_eq!(p.symbol_code, Some('_'));
        assert_eq!(p.comment, b"WS 2300 {UIV32N}");

        let wx = p.wx.unwrap();
        assert_relative_eq!(wx.wind_gust.unwrap(), 0.45, epsilon = 0.01);
        assert_relative_eq!(wx.temp.unwrap(), 12.2, epsilon = 0.05);
        assert_eq!(wx.humidity, Some(65));
        assert_relative_eq!(wx.pressure.unwrap(), 1007.3);
    }

    #[test]
    fn ultimeter() {
        let p = parse(
            b"WC4PEM-14>APN391,WIDE2-1,qAo,K2KZ-3:$ULTW0053002D028D02FA2813000D87BD000103E8015703430010000C",
        )
        .unwrap();

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_direction, Some(64.0));
        assert_eq!(wx.wind_speed, Some(0.3));
        assert_eq!(wx.wind_gust, Some(2.3));
        assert_eq!(wx.temp, Some(18.5));
        assert_eq!(wx.humidity, Some(100));
        assert_relative_eq!(wx.pressure.unwrap(), 1025.9);
        assert_eq!(wx.rain_1h, None);
        assert_eq!(wx.rain_24h, None);
        assert_eq!(wx.rain_midnight, Some(4.1));
        assert_eq!(wx.software, None);
    }

    #[test]
    fn ultimeter_below_zero() {
        let p = parse(
            b"SR3DGT>APN391,SQ2LYH-14,SR4DOS,WIDE2*,qAo,SR4NWO-1:$ULTW00000000FFEA0000296F000A9663000103E80016025D",
        )
        .unwrap();

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_direction, Some(0.0));
        assert_eq!(wx.wind_speed, None);
        assert_eq!(wx.wind_gust, Some(0.0));
        assert_eq!(wx.temp, Some(-19.0));
        assert_eq!(wx.humidity, Some(100));
        assert_relative_eq!(wx.pressure.unwrap(), 1060.7);
        assert_eq!(wx.rain_midnight, Some(0.0));
    }

    #[test]
    fn ultimeter_logging() {
        let p = parse(
            b"MB7DS>APRS,TCPIP*,qAC,APRSUK2:!!00000066013D000028710166--------0158053201200210",
        )
        .unwrap();

        let wx = p.wx.unwrap();
        assert_eq!(wx.wind_direction, Some(144.0));
        assert_eq!(wx.wind_speed, Some(14.7));
        assert_eq!(wx.wind_gust, None);
        assert_eq!(wx.temp, Some(-0.2));
        assert_eq!(wx.temp_in, Some(2.1));
        assert_eq!(wx.humidity, None);
        assert_relative_eq!(wx.pressure.unwrap(), 1035.3);
        assert_eq!(wx.rain_midnight, Some(73.2));
    }

    #[test]
    fn ultimeter_without_data() {
        let err = parse(b"WC4PEM-14>APN391:$ULTW").unwrap_err();
        assert_eq!(err.code, ErrorCode::WxInvalid);
    }
}
