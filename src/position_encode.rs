//! The uncompressed position encoder.

use chrono::{DateTime, Timelike, Utc};

use crate::error::{AprsError, ErrorCode};
use crate::position::is_valid_symbol_table;

/// Optional parameters for [`encode_position`].
#[derive(Debug, Clone, Default)]
pub struct EncodePositionOpts {
    /// Blank 0-4 trailing minute digits. Disables DAO.
    pub ambiguity: u8,
    /// Emit a `/` or `@` report with an `HHMMSSh` UTC timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    /// Report the station as messaging-capable (`=` / `@` type byte).
    pub messaging_capable: bool,
    /// Append a `!wXX!` DAO extension carrying two extra minute digits.
    pub dao: bool,
    /// Free-text comment to append.
    pub comment: String,
}

/// Formats fractional minutes to the four digits of `MM.MM`, plus the two
/// extra DAO digits when requested. Rounding up to 60 minutes is clamped
/// to 59.99.
fn format_minutes(minutes: f64, dao: bool) -> (String, String) {
    let (mut min_s, mut dao_s) = if dao {
        let s = format!("{:06.0}", minutes * 10000.0);
        let d = if s.len() > 4 { s[4..6].to_string() } else { String::new() };
        (s, d)
    } else {
        (format!("{:04.0}", minutes * 100.0), String::new())
    };

    if min_s.starts_with("60") {
        min_s = "5999".to_string();
        dao_s = "99".to_string();
    }

    (min_s, dao_s)
}

/// Blanks minute digits of a `DDMM.MM` / `DDDMM.MM` string according to
/// the ambiguity level.
fn blank_ambiguity(s: &str, ambiguity: u8) -> String {
    let len = s.len();
    match ambiguity {
        1 | 2 => {
            let mut b = s.as_bytes().to_vec();
            for i in 0..usize::from(ambiguity) {
                b[len - 1 - i] = b' ';
            }
            String::from_utf8(b).unwrap_or_else(|_| s.to_string())
        }
        3 => format!("{} .  ", &s[..len - 4]),
        4 => format!("{}  .  ", &s[..len - 5]),
        _ => s.to_string(),
    }
}

fn dao_char(digits: &str) -> char {
    let val: f64 = digits.parse().unwrap_or(0.0);
    ((val / 1.1 + 0.5) as u8 + 33) as char
}

/// Builds an uncompressed APRS position report body.
///
/// `lat`/`lon` are decimal degrees, `speed` km/h, `course` degrees,
/// `altitude` metres; `symbol` is the two-character table + code pair.
pub fn encode_position(
    lat: f64,
    lon: f64,
    speed: Option<f64>,
    course: Option<f64>,
    altitude: Option<f64>,
    symbol: &str,
    opts: &EncodePositionOpts,
) -> Result<String, AprsError> {
    let invalid = |detail: String| AprsError::new(ErrorCode::PosEncInvalid, detail);

    // ambiguity blanks the digits DAO would refine
    let dao = opts.dao && opts.ambiguity == 0;

    if !(-89.99999..=89.99999).contains(&lat) || !(-179.99999..=179.99999).contains(&lon) {
        return Err(invalid(format!("invalid coordinates: lat={} lon={}", lat, lon)));
    }

    let symbol_bytes = symbol.as_bytes();
    if symbol_bytes.len() != 2 {
        return Err(invalid(format!("invalid symbol length: {}", symbol_bytes.len())));
    }
    let symbol_table = symbol_bytes[0];
    let symbol_code = symbol_bytes[1];
    if !is_valid_symbol_table(symbol_table) {
        return Err(invalid(format!("invalid symbol table: {:?}", symbol_table as char)));
    }
    if symbol_code < 0x21 || (symbol_code > 0x7b && symbol_code != 0x7d) {
        return Err(invalid(format!("invalid symbol code: {:?}", symbol_code as char)));
    }

    let (lat_abs, north) = if lat < 0.0 { (-lat, false) } else { (lat, true) };
    let lat_deg = lat_abs as u32;
    let lat_min = (lat_abs - f64::from(lat_deg)) * 60.0;
    let (lat_min_s, lat_dao) = format_minutes(lat_min, dao);

    let lat_string = format!("{:02}{}.{}", lat_deg, &lat_min_s[0..2], &lat_min_s[2..4]);
    let mut lat_string = blank_ambiguity(&lat_string, opts.ambiguity);
    lat_string.push(if north { 'N' } else { 'S' });

    let (lon_abs, east) = if lon < 0.0 { (-lon, false) } else { (lon, true) };
    let lon_deg = lon_abs as u32;
    let lon_min = (lon_abs - f64::from(lon_deg)) * 60.0;
    let (lon_min_s, lon_dao) = format_minutes(lon_min, dao);

    let lon_string = format!("{:03}{}.{}", lon_deg, &lon_min_s[0..2], &lon_min_s[2..4]);
    let mut lon_string = blank_ambiguity(&lon_string, opts.ambiguity);
    lon_string.push(if east { 'E' } else { 'W' });

    let mut result = match opts.timestamp {
        Some(ts) => format!(
            "{}{:02}{:02}{:02}h",
            if opts.messaging_capable { '@' } else { '/' },
            ts.hour(),
            ts.minute(),
            ts.second()
        ),
        None => {
            if opts.messaging_capable {
                "=".to_string()
            } else {
                "!".to_string()
            }
        }
    };

    result.push_str(&lat_string);
    result.push(symbol_table as char);
    result.push_str(&lon_string);
    result.push(symbol_code as char);

    if let (Some(speed), Some(course)) = (speed, course) {
        if speed >= 0.0 && course >= 0.0 {
            let knots = (speed / 1.852).min(999.0);
            let course = if course > 360.0 { 0.0 } else { course };
            result.push_str(&format!("{:03.0}/{:03.0}", course, knots));
        }
    }

    if let Some(altitude) = altitude {
        let alt_feet = altitude / 0.3048;
        if alt_feet >= 0.0 {
            result.push_str(&format!("/A={:06.0}", alt_feet));
        } else {
            result.push_str(&format!("/A=-{:05.0}", -alt_feet));
        }
    }

    result.push_str(&opts.comment);

    if dao && !lat_dao.is_empty() && !lon_dao.is_empty() {
        result.push_str("!w");
        result.push(dao_char(&lat_dao));
        result.push(dao_char(&lon_dao));
        result.push('!');
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encode_basic() {
        assert_eq!(
            encode_position(
                63.06716666666667,
                27.6605,
                None,
                None,
                None,
                "/#",
                &EncodePositionOpts::default()
            )
            .unwrap(),
            "!6304.03N/02739.63E#"
        );

        assert_eq!(
            encode_position(
                -23.64266666666667,
                -46.797,
                None,
                None,
                None,
                "/#",
                &EncodePositionOpts::default()
            )
            .unwrap(),
            "!2338.56S/04647.82W#"
        );
    }

    #[test]
    fn encode_minute_rounding_clamped() {
        assert_eq!(
            encode_position(
                22.9999999,
                -177.9999999,
                None,
                None,
                None,
                "/#",
                &EncodePositionOpts::default()
            )
            .unwrap(),
            "!2259.99N/17759.99W#"
        );
    }

    #[test]
    fn encode_with_course_speed_altitude() {
        assert_eq!(
            encode_position(
                52.364,
                14.1045,
                Some(83.34),
                Some(353.0),
                Some(95.7072),
                "/>",
                &EncodePositionOpts::default()
            )
            .unwrap(),
            "!5221.84N/01406.27E>353/045/A=000314"
        );

        assert_eq!(
            encode_position(
                52.364,
                14.1045,
                None,
                None,
                Some(95.7072),
                "/>",
                &EncodePositionOpts::default()
            )
            .unwrap(),
            "!5221.84N/01406.27E>/A=000314"
        );
    }

    #[test]
    fn encode_with_ambiguity() {
        let expected = [
            (1, "!5221.8 N/01406.2 E>"),
            (2, "!5221.  N/01406.  E>"),
            (3, "!522 .  N/0140 .  E>"),
            (4, "!52  .  N/014  .  E>"),
        ];

        for (ambiguity, want) in expected {
            let opts = EncodePositionOpts {
                ambiguity,
                ..EncodePositionOpts::default()
            };
            assert_eq!(
                encode_position(52.364, 14.1045, None, None, None, "/>", &opts).unwrap(),
                want
            );
        }
    }

    #[test]
    fn encode_with_dao() {
        let opts = EncodePositionOpts {
            dao: true,
            ..EncodePositionOpts::default()
        };
        assert_eq!(
            encode_position(
                39.15380036630037,
                -84.62208058608059,
                None,
                None,
                None,
                "/>",
                &opts
            )
            .unwrap(),
            "!3909.22N/08437.32W>!wjM!"
        );

        // rounding up to the next minute clamps both digit sets
        assert_eq!(
            encode_position(39.9999999, -84.9999999, None, None, None, "/>", &opts).unwrap(),
            "!3959.99N/08459.99W>!w{{!"
        );
    }

    #[test]
    fn encode_with_dao_and_comment() {
        let opts = EncodePositionOpts {
            dao: true,
            comment: "Comment blah".to_string(),
            ..EncodePositionOpts::default()
        };
        assert_eq!(
            encode_position(
                48.37314835164835,
                15.71477838827839,
                Some(62.968),
                Some(321.0),
                Some(192.9384),
                "/>",
                &opts
            )
            .unwrap(),
            "!4822.38N/01542.88E>321/034/A=000633Comment blah!wr^!"
        );
    }

    #[test]
    fn encode_with_timestamp() {
        let opts = EncodePositionOpts {
            timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap()),
            ..EncodePositionOpts::default()
        };
        assert_eq!(
            encode_position(63.06716666666667, 27.6605, None, None, None, "/#", &opts).unwrap(),
            "/123045h6304.03N/02739.63E#"
        );

        let opts = EncodePositionOpts {
            timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..EncodePositionOpts::default()
        };
        assert_eq!(
            encode_position(
                52.364,
                14.1045,
                Some(83.34),
                Some(353.0),
                Some(95.7072),
                "/>",
                &opts
            )
            .unwrap(),
            "/000000h5221.84N/01406.27E>353/045/A=000314"
        );
    }

    #[test]
    fn encode_messaging_capable() {
        let opts = EncodePositionOpts {
            messaging_capable: true,
            ..EncodePositionOpts::default()
        };
        assert_eq!(
            encode_position(63.06716666666667, 27.6605, None, None, None, "/#", &opts).unwrap(),
            "=6304.03N/02739.63E#"
        );

        let opts = EncodePositionOpts {
            messaging_capable: true,
            timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap()),
            ..EncodePositionOpts::default()
        };
        assert_eq!(
            encode_position(63.06716666666667, 27.6605, None, None, None, "/#", &opts).unwrap(),
            "@123045h6304.03N/02739.63E#"
        );
    }

    #[test]
    fn encode_errors() {
        let cases: [(f64, f64, &str); 8] = [
            (91.0, 0.0, "/#"),
            (-91.0, 0.0, "/#"),
            (0.0, 181.0, "/#"),
            (0.0, -181.0, "/#"),
            (0.0, 0.0, "a#"),
            (0.0, 0.0, "/\x1f"),
            (0.0, 0.0, "/"),
            (0.0, 0.0, "//#"),
        ];

        for (lat, lon, symbol) in cases {
            let err = encode_position(lat, lon, None, None, None, symbol, &EncodePositionOpts::default())
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::PosEncInvalid, "lat={} lon={} symbol={:?}", lat, lon, symbol);
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let samples = [
            (60.4752, 25.0947, "/#"),
            (-33.8173, 151.0044, "/>"),
            (0.001, -0.001, "\\a"),
            (89.9, 179.9, "/O"),
        ];

        for (lat, lon, symbol) in samples {
            let body =
                encode_position(lat, lon, None, None, None, symbol, &EncodePositionOpts::default())
                    .unwrap();
            let mut raw = b"N0CALL>APRS:".to_vec();
            raw.extend_from_slice(body.as_bytes());

            let p = crate::parse(&raw).unwrap();
            assert_relative_eq!(p.latitude.unwrap(), lat, epsilon = 1e-4);
            assert_relative_eq!(p.longitude.unwrap(), lon, epsilon = 1e-4);
            assert_eq!(p.symbol_table, Some(symbol.as_bytes()[0] as char));
            assert_eq!(p.symbol_code, Some(symbol.as_bytes()[1] as char));
        }
    }
}
