//! APRS timestamp decoding.
//!
//! Timestamps are 7 characters with the format indicator in the last
//! position: `DDHHMMz` (day/hour/minute UTC), `DDHHMM/` (day/hour/minute
//! local time) and `HHMMSSh` (hour/minute/second of today, UTC). The
//! day-based forms carry no year or month; those come from the current
//! time in the respective zone, rolling back one month if the result
//! would lie in the future.

use chrono::{DateTime, Datelike, Local, Months, TimeZone, Utc};

use crate::bytes::parse_bytes;
use crate::error::{AprsError, ErrorCode};

pub(crate) fn parse_timestamp(b: &[u8]) -> Result<DateTime<Utc>, AprsError> {
    let invalid = |detail: String| AprsError::new(ErrorCode::TimestampInvalid, detail);

    if b.len() != 7 {
        return Err(invalid(format!(
            "timestamp must be 7 characters, got {}",
            b.len()
        )));
    }

    let field = |range: std::ops::Range<usize>| -> Option<u32> { parse_bytes(&b[range]) };

    match b[6] {
        b'z' => {
            let dd = field(0..2).filter(|&d| (1..=31).contains(&d));
            let dd = dd.ok_or_else(|| invalid(format!("invalid day: {:?}", &b[0..2])))?;
            let hh = field(2..4).filter(|&h| h <= 23);
            let hh = hh.ok_or_else(|| invalid(format!("invalid hours: {:?}", &b[2..4])))?;
            let mm = field(4..6).filter(|&m| m <= 59);
            let mm = mm.ok_or_else(|| invalid(format!("invalid minutes: {:?}", &b[4..6])))?;

            resolve_day_based(&Utc, Utc::now(), dd, hh, mm)
                .ok_or_else(|| invalid("day does not exist in this or last month".to_string()))
        }
        b'/' => {
            let dd = field(0..2).filter(|&d| (1..=31).contains(&d));
            let dd = dd.ok_or_else(|| invalid(format!("invalid day: {:?}", &b[0..2])))?;
            let hh = field(2..4).filter(|&h| h <= 23);
            let hh = hh.ok_or_else(|| invalid(format!("invalid hours: {:?}", &b[2..4])))?;
            let mm = field(4..6).filter(|&m| m <= 59);
            let mm = mm.ok_or_else(|| invalid(format!("invalid minutes: {:?}", &b[4..6])))?;

            resolve_day_based(&Local, Local::now(), dd, hh, mm)
                .map(|t| t.with_timezone(&Utc))
                .ok_or_else(|| invalid("day does not exist in this or last month".to_string()))
        }
        b'h' => {
            let hh = field(0..2).filter(|&h| h <= 23);
            let hh = hh.ok_or_else(|| invalid(format!("invalid hours: {:?}", &b[0..2])))?;
            let mm = field(2..4).filter(|&m| m <= 59);
            let mm = mm.ok_or_else(|| invalid(format!("invalid minutes: {:?}", &b[2..4])))?;
            let ss = field(4..6).filter(|&s| s <= 59);
            let ss = ss.ok_or_else(|| invalid(format!("invalid seconds: {:?}", &b[4..6])))?;

            let now = Utc::now();
            Utc.with_ymd_and_hms(now.year(), now.month(), now.day(), hh, mm, ss)
                .single()
                .ok_or_else(|| invalid("unrepresentable time of day".to_string()))
        }
        other => Err(invalid(format!(
            "unknown timestamp indicator: {}",
            other as char
        ))),
    }
}

/// True if `b` opens with a 6-digit day-based timestamp shape (`DDHHMMz` or
/// `DDHHMM/`). Used by the status decoder, which must consume the
/// timestamp field even when its content turns out to be invalid.
pub(crate) fn looks_like_day_timestamp(b: &[u8]) -> bool {
    b.len() >= 7
        && b[..6].iter().all(u8::is_ascii_digit)
        && (b[6] == b'z' || b[6] == b'/')
}

/// Builds day/hour/minute against the current month, falling back to the
/// previous month when the day does not exist there, and rolling a future
/// result back one month.
fn resolve_day_based<Tz: TimeZone>(
    tz: &Tz,
    now: DateTime<Tz>,
    dd: u32,
    hh: u32,
    mm: u32,
) -> Option<DateTime<Tz>> {
    let candidate = tz
        .with_ymd_and_hms(now.year(), now.month(), dd, hh, mm, 0)
        .earliest()
        .or_else(|| {
            let prev = now.clone().checked_sub_months(Months::new(1))?;
            tz.with_ymd_and_hms(prev.year(), prev.month(), dd, hh, mm, 0)
                .earliest()
        })?;

    if candidate > now {
        candidate.checked_sub_months(Months::new(1))
    } else {
        Some(candidate)
    }
}
