//! Item reports: like objects, but without a timestamp and with a
//! variable-length name.

use crate::error::{AprsError, ErrorCode};
use crate::packet::{Packet, PacketType};
use crate::position::is_uncompressed_start;

impl Packet {
    /// `)NAME!position…` — `body` starts after `)`. The name is 3-9
    /// characters, terminated by `!` (alive) or `_` (killed).
    pub(crate) fn parse_item(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Item);

        if body.len() < 18 {
            return Err(AprsError::new(ErrorCode::ItemShort, "item packet too short"));
        }

        let name_end = (3..=9)
            .find(|&i| body[i] == b'!' || body[i] == b'_')
            .ok_or_else(|| {
                AprsError::new(ErrorCode::ItemInvalid, "item name terminator not found")
            })?;

        self.item_name = Some(String::from_utf8_lossy(&body[..name_end]).into_owned());
        self.alive = Some(body[name_end] == b'!');

        let pos = &body[name_end + 1..];
        if is_uncompressed_start(pos[0]) {
            self.parse_uncompressed_position(pos)
        } else {
            self.parse_compressed_position(pos)
        }
    }
}
