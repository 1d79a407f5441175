//! Status reports and station capabilities.

use std::collections::BTreeMap;

use crate::bytes::trim_ascii;
use crate::error::{AprsError, ErrorCode};
use crate::packet::{Packet, PacketType};
use crate::timestamp::{looks_like_day_timestamp, parse_timestamp};

impl Packet {
    /// `>DDHHMMzstatus text` or `>status text` — `body` starts after `>`.
    /// A leading timestamp-shaped field is consumed even when its content
    /// is invalid; the anomaly is only warned about.
    pub(crate) fn parse_status(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Status);

        let mut body = body;
        if looks_like_day_timestamp(body) {
            match parse_timestamp(&body[..7]) {
                Ok(ts) => self.timestamp = Some(ts),
                Err(e) => self.warn(
                    ErrorCode::TimestampInvalid,
                    format!("invalid status timestamp: {}", e.detail),
                ),
            }
            body = &body[7..];
        }

        self.status = Some(body.to_vec());
        Ok(())
    }

    /// `<cap1=val1,cap2,…` — `body` starts after `<`. Bare keys map to an
    /// empty value.
    pub(crate) fn parse_capabilities(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Capabilities);

        let mut capabilities = BTreeMap::new();
        for part in body.split(|&b| b == b',') {
            let part = trim_ascii(part);
            if part.is_empty() {
                continue;
            }
            match part.iter().position(|&b| b == b'=') {
                Some(idx) => capabilities.insert(
                    String::from_utf8_lossy(&part[..idx]).into_owned(),
                    String::from_utf8_lossy(&part[idx + 1..]).into_owned(),
                ),
                None => capabilities.insert(
                    String::from_utf8_lossy(part).into_owned(),
                    String::new(),
                ),
            };
        }

        self.capabilities = Some(capabilities);
        Ok(())
    }
}
