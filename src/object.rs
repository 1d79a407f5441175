//! Object reports: a station reporting the position of some other entity
//! under a fixed nine-character name.

use crate::error::{AprsError, ErrorCode};
use crate::packet::{Packet, PacketType};
use crate::position::is_uncompressed_start;
use crate::timestamp::parse_timestamp;

impl Packet {
    /// `;NNNNNNNNN*TTTTTTTposition…` — `body` starts after `;`. The name
    /// is space-padded to nine characters, followed by `*` (alive) or `_`
    /// (killed), a timestamp and a position in either encoding.
    pub(crate) fn parse_object(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Object);

        if body.len() < 31 {
            return Err(AprsError::new(ErrorCode::ObjShort, "object packet too short"));
        }

        self.object_name = Some(String::from_utf8_lossy(&body[..9]).into_owned());

        match body[9] {
            b'*' => self.alive = Some(true),
            b'_' => self.alive = Some(false),
            other => {
                return Err(AprsError::new(
                    ErrorCode::ObjInvalid,
                    format!("invalid object alive/killed indicator: {:?}", other as char),
                ))
            }
        }

        match parse_timestamp(&body[10..17]) {
            Ok(ts) => self.timestamp = Some(ts),
            Err(e) => self.warn(
                ErrorCode::TimestampInvalid,
                format!("invalid object timestamp: {}", e.detail),
            ),
        }

        let pos = &body[17..];
        if is_uncompressed_start(pos[0]) {
            self.parse_uncompressed_position(pos)
        } else {
            self.parse_compressed_position(pos)
        }
    }
}
