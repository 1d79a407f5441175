use std::fmt;

/// Machine-readable reason for a parse or encode failure.
///
/// The wire string of each code ([`ErrorCode::as_str`]) is stable; callers
/// dispatching on failures should match on the code, not the detail text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PacketNoBody,
    PacketShort,
    SrcCallNoGt,
    SrcCallEmpty,
    SrcCallBadChars,
    SrcCallNoAx25,
    DstCallEmpty,
    DstCallNoAx25,
    DstPathTooMany,
    DigiEmpty,
    DigiCallBadChars,
    DigiCallNoAx25,
    NoBody,
    TypeNotSupported,
    ExpUnsupported,

    PosAmbiguity,
    PosShort,
    PosInvalid,
    PosLatInvalid,
    PosLonInvalid,
    LocInvalid,
    LocAmbInvalid,
    LocLarge,

    SymInvTable,

    CompShort,
    CompInvalid,

    MiceShort,
    MiceInvDstCall,
    MiceInvInfoField,

    ObjShort,
    ObjInvalid,
    ItemShort,
    ItemInvalid,

    MsgShort,
    MsgInvalid,
    MsgNoDst,
    MsgDstTooLong,
    MsgIdInvalid,
    MsgAckRej,
    MsgCrLf,
    MsgReplyAck,

    NmeaShort,
    NmeaInvalid,
    GprmcNoFix,

    TimestampInvalid,

    WxInvalid,

    TlmInvalid,

    PosEncInvalid,
}

impl ErrorCode {
    /// The stable external string for this code, e.g. `"pos_short"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::PacketNoBody => "packet_no_body",
            ErrorCode::PacketShort => "packet_short",
            ErrorCode::SrcCallNoGt => "srccall_nogt",
            ErrorCode::SrcCallEmpty => "srccall_empty",
            ErrorCode::SrcCallBadChars => "srccall_badchars",
            ErrorCode::SrcCallNoAx25 => "srccall_noax25",
            ErrorCode::DstCallEmpty => "dstcall_empty",
            ErrorCode::DstCallNoAx25 => "dstcall_noax25",
            ErrorCode::DstPathTooMany => "dstpath_toomany",
            ErrorCode::DigiEmpty => "digi_empty",
            ErrorCode::DigiCallBadChars => "digicall_badchars",
            ErrorCode::DigiCallNoAx25 => "digicall_noax25",
            ErrorCode::NoBody => "no_body",
            ErrorCode::TypeNotSupported => "type_not_supported",
            ErrorCode::ExpUnsupported => "exp_unsupp",
            ErrorCode::PosAmbiguity => "pos_ambiguity",
            ErrorCode::PosShort => "pos_short",
            ErrorCode::PosInvalid => "pos_invalid",
            ErrorCode::PosLatInvalid => "pos_lat_invalid",
            ErrorCode::PosLonInvalid => "pos_lon_invalid",
            ErrorCode::LocInvalid => "loc_inv",
            ErrorCode::LocAmbInvalid => "loc_amb_inv",
            ErrorCode::LocLarge => "loc_large",
            ErrorCode::SymInvTable => "sym_inv_table",
            ErrorCode::CompShort => "comp_short",
            ErrorCode::CompInvalid => "comp_invalid",
            ErrorCode::MiceShort => "mice_short",
            ErrorCode::MiceInvDstCall => "mice_inv_dstcall",
            ErrorCode::MiceInvInfoField => "mice_inv_infofield",
            ErrorCode::ObjShort => "obj_short",
            ErrorCode::ObjInvalid => "obj_inv",
            ErrorCode::ItemShort => "item_short",
            ErrorCode::ItemInvalid => "item_invalid",
            ErrorCode::MsgShort => "msg_short",
            ErrorCode::MsgInvalid => "msg_invalid",
            ErrorCode::MsgNoDst => "msg_no_dst",
            ErrorCode::MsgDstTooLong => "msg_dst_toolong",
            ErrorCode::MsgIdInvalid => "msg_id_inv",
            ErrorCode::MsgAckRej => "msg_ack_rej",
            ErrorCode::MsgCrLf => "msg_crlf",
            ErrorCode::MsgReplyAck => "msg_replyack",
            ErrorCode::NmeaShort => "nmea_short",
            ErrorCode::NmeaInvalid => "nmea_invalid",
            ErrorCode::GprmcNoFix => "gprmc_nofix",
            ErrorCode::TimestampInvalid => "timestamp_inv",
            ErrorCode::WxInvalid => "wx_invalid",
            ErrorCode::TlmInvalid => "tlm_inv",
            ErrorCode::PosEncInvalid => "pos_enc_inv",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A parse or encode failure: a stable [`ErrorCode`] plus a human-readable
/// detail message. The same shape is used for the non-fatal warnings
/// collected on a decoded packet.
///
/// Equality compares codes only; the detail text is for humans.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {detail}")]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AprsError {
    pub code: ErrorCode,
    pub detail: String,
}

impl AprsError {
    pub fn new<S: Into<String>>(code: ErrorCode, detail: S) -> Self {
        AprsError {
            code,
            detail: detail.into(),
        }
    }
}

impl PartialEq for AprsError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for AprsError {}

impl PartialEq<ErrorCode> for AprsError {
    fn eq(&self, other: &ErrorCode) -> bool {
        self.code == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_detail() {
        let err = AprsError::new(ErrorCode::ObjShort, "object packet too short");
        assert_eq!(format!("{}", err), "obj_short: object packet too short");
    }

    #[test]
    fn equality_ignores_detail() {
        let a = AprsError::new(ErrorCode::ObjShort, "object packet too short");
        let b = AprsError::new(ErrorCode::ObjShort, "detail");
        let c = AprsError::new(ErrorCode::ObjInvalid, "object packet too short");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, ErrorCode::ObjShort);
    }

    #[test]
    fn stable_code_strings() {
        assert_eq!(ErrorCode::TypeNotSupported.as_str(), "type_not_supported");
        assert_eq!(ErrorCode::MiceInvDstCall.as_str(), "mice_inv_dstcall");
        assert_eq!(ErrorCode::DigiCallBadChars.as_str(), "digicall_badchars");
        assert_eq!(ErrorCode::LocAmbInvalid.as_str(), "loc_amb_inv");
    }
}
