//! Text messages, acks, rejects and the reverse encoder.

use crate::bytes::trim_ascii;
use crate::error::{AprsError, ErrorCode};
use crate::packet::{Packet, PacketType};

/// A decoded (or to-be-encoded) APRS message. Empty strings stand for
/// absent fields; a reject excludes both text and ack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Message {
    /// Addressee callsign, up to 9 characters.
    pub destination: String,
    /// Message text; may contain non-UTF-8 bytes.
    pub text: Vec<u8>,
    /// Message ID the sender wants acked.
    pub id: String,
    /// ID being acknowledged.
    pub ack_id: String,
    /// ID being rejected.
    pub rej_id: String,
}

/// Builds the body of a message packet (`:ADDRESSEE:text{id`), validating
/// the fields the same way the decoder understands them.
pub fn encode_message(msg: &Message) -> Result<Vec<u8>, AprsError> {
    if msg.destination.is_empty() {
        return Err(AprsError::new(
            ErrorCode::MsgNoDst,
            "message destination is required",
        ));
    }
    if msg.destination.len() > 9 {
        return Err(AprsError::new(
            ErrorCode::MsgDstTooLong,
            "message destination too long (max 9 characters)",
        ));
    }

    if !msg.ack_id.is_empty() && !msg.rej_id.is_empty() {
        return Err(AprsError::new(
            ErrorCode::MsgAckRej,
            "message cannot have both ack and reject",
        ));
    }
    if !msg.text.is_empty() && !msg.rej_id.is_empty() {
        return Err(AprsError::new(
            ErrorCode::MsgAckRej,
            "message cannot have both content and reject",
        ));
    }

    if contains_crlf(msg.destination.as_bytes())
        || contains_crlf(&msg.text)
        || contains_crlf(msg.id.as_bytes())
        || contains_crlf(msg.ack_id.as_bytes())
        || contains_crlf(msg.rej_id.as_bytes())
    {
        return Err(AprsError::new(
            ErrorCode::MsgCrLf,
            "message fields must not contain CR or LF",
        ));
    }

    if !msg.id.is_empty() && !is_valid_msg_id(&msg.id) {
        return Err(AprsError::new(
            ErrorCode::MsgIdInvalid,
            "message ID must be 1-5 alphanumeric characters",
        ));
    }

    let mut out = Vec::with_capacity(11 + msg.text.len());
    out.push(b':');
    out.extend_from_slice(msg.destination.as_bytes());
    out.resize(10, b' ');
    out.push(b':');

    if !msg.ack_id.is_empty() && msg.id.is_empty() {
        out.extend_from_slice(b"ack");
        out.extend_from_slice(msg.ack_id.as_bytes());
    } else if !msg.rej_id.is_empty() {
        out.extend_from_slice(b"rej");
        out.extend_from_slice(msg.rej_id.as_bytes());
    } else {
        out.extend_from_slice(&msg.text);
        if !msg.id.is_empty() {
            if !msg.ack_id.is_empty() {
                // reply-ack: {id}ack must fit in the 5-character ID field
                if msg.id.len() + 1 + msg.ack_id.len() > 5 {
                    return Err(AprsError::new(
                        ErrorCode::MsgReplyAck,
                        "reply-ack too long to embed, send ack separately",
                    ));
                }
                out.push(b'{');
                out.extend_from_slice(msg.id.as_bytes());
                out.push(b'}');
                out.extend_from_slice(msg.ack_id.as_bytes());
            } else {
                out.push(b'{');
                out.extend_from_slice(msg.id.as_bytes());
            }
        }
    }

    Ok(out)
}

fn contains_crlf(b: &[u8]) -> bool {
    b.iter().any(|&c| c == b'\r' || c == b'\n')
}

fn is_valid_msg_id(id: &str) -> bool {
    (1..=5).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

impl Packet {
    /// `:ADDRESSEE:text{id` — `body` starts after the leading `:`.
    pub(crate) fn parse_message(&mut self, body: &[u8]) -> Result<(), AprsError> {
        self.packet_type = Some(PacketType::Message);

        if body.len() < 11 {
            return Err(AprsError::new(ErrorCode::MsgShort, "message packet too short"));
        }
        if body[9] != b':' {
            return Err(AprsError::new(
                ErrorCode::MsgInvalid,
                "message addressee field malformed",
            ));
        }

        let mut msg = Message {
            destination: String::from_utf8_lossy(trim_ascii(&body[..9])).into_owned(),
            ..Message::default()
        };

        let msg_body = &body[10..];

        if let Some(rest) = msg_body.strip_prefix(b"ack") {
            msg.ack_id = String::from_utf8_lossy(rest).into_owned();
        } else if let Some(rest) = msg_body.strip_prefix(b"rej") {
            msg.rej_id = String::from_utf8_lossy(rest).into_owned();
        } else if let Some(idx) = msg_body.iter().rposition(|&b| b == b'{') {
            msg.text = msg_body[..idx].to_vec();
            let id_part = &msg_body[idx + 1..];
            match id_part.iter().position(|&b| b == b'}') {
                Some(ridx) => {
                    msg.id = String::from_utf8_lossy(&id_part[..ridx]).into_owned();
                    msg.ack_id = String::from_utf8_lossy(&id_part[ridx + 1..]).into_owned();
                }
                None => msg.id = String::from_utf8_lossy(id_part).into_owned(),
            }
        } else {
            msg.text = msg_body.to_vec();
        }

        self.message = Some(msg);
        Ok(())
    }
}
