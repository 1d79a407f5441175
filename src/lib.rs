//! APRS packet parser and encoder for the TNC2 / APRS-IS text format.
//!
//! Every packet is one line of the form `SRC>DST,PATH:BODY`. [`parse`]
//! decomposes a line into a [`Packet`] record: routing header, packet
//! type, position, weather, telemetry, message and whatever else the body
//! carries. Input is taken as bytes since APRS-IS lines routinely contain
//! non-UTF-8 data in comments and messages.
//!
//! ```rust
//! use aprs_fap::{parse, PacketType};
//!
//! let packet = parse(
//!     b"OH2RDP-1>BEACON-15,OH2RDG*,WIDE:!6028.51N/02505.68E#PHG7220/RELAY,WIDE, OH2AP Jarvenpaa",
//! )
//! .unwrap();
//!
//! assert_eq!(packet.src_callsign, "OH2RDP-1");
//! assert_eq!(packet.packet_type, Some(PacketType::Location));
//! assert_eq!(packet.phg.as_deref(), Some("7220"));
//! assert!((packet.latitude.unwrap() - 60.4752).abs() < 0.0001);
//! ```
//!
//! Parse failures carry a stable machine-readable [`ErrorCode`]; use
//! [`Packet::decode`] when the partially-populated record of a rejected
//! packet is still of interest (the routing header of a packet whose body
//! failed, for instance).

#[cfg(test)]
#[macro_use]
extern crate approx;

mod aprsis;
mod base91;
mod bytes;
mod callsign;
mod error;
mod item;
mod message;
mod mic_e;
mod nmea;
mod object;
mod packet;
mod position;
mod position_encode;
mod status;
mod telemetry;
mod timestamp;
mod utils;
mod weather;

pub use aprsis::aprs_passcode;
pub use callsign::check_ax25_call;
pub use error::{AprsError, ErrorCode};
pub use message::{encode_message, Message};
pub use mic_e::mice_mbits_to_message;
pub use packet::{Digipeater, Format, Options, Packet, PacketType};
pub use position_encode::{encode_position, EncodePositionOpts};
pub use telemetry::Telemetry;
pub use utils::{direction, distance};
pub use weather::Weather;

/// Parses one APRS packet with default [`Options`].
pub fn parse(data: &[u8]) -> Result<Packet, AprsError> {
    parse_with(data, &Options::default())
}

/// Parses one APRS packet.
pub fn parse_with(data: &[u8], opts: &Options) -> Result<Packet, AprsError> {
    match Packet::decode(data, opts) {
        (packet, None) => Ok(packet),
        (_, Some(err)) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_encode_decode_recovers_input() {
        let samples = [
            (63.0672, 27.6605),
            (-23.6427, -46.797),
            (0.0001, 0.0001),
            (45.0, 90.0),
        ];

        for (lat, lon) in samples {
            let body = encode_position(
                lat,
                lon,
                None,
                None,
                None,
                "/#",
                &EncodePositionOpts::default(),
            )
            .unwrap();

            let mut raw = b"OH7LZB>APRS:".to_vec();
            raw.extend_from_slice(body.as_bytes());
            let p = parse(&raw).unwrap();

            assert!((p.latitude.unwrap() - lat).abs() < 0.0001, "lat {}", lat);
            assert!((p.longitude.unwrap() - lon).abs() < 0.0001, "lon {}", lon);
            assert_eq!(p.pos_ambiguity, Some(0));
        }
    }

    #[test]
    fn parse_is_deterministic() {
        let raw: &[u8] =
            b"OH2RDP-1>BEACON-15,OH2RDG*,WIDE:!6028.51N/02505.68E#PHG7220/RELAY,WIDE, OH2AP Jarvenpaa";
        assert_eq!(parse(raw).unwrap(), parse(raw).unwrap());
    }

    #[test]
    fn passcode_range_and_ssid_invariance() {
        for call in ["OH7LZB", "N0CALL-7", "K6IFR", "zz9zzz-15"] {
            let code = aprs_passcode(call);
            assert!(code <= 0x7fff);

            let base = call.split('-').next().unwrap();
            assert_eq!(code, aprs_passcode(&base.to_lowercase()));
        }
    }
}
