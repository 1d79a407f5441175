//! Callsign and path-element validation.
//!
//! Two levels of strictness exist side by side: the permissive APRS-IS rules
//! (anything 1-9 chars of `[A-Za-z0-9-]` goes, since the internet side of
//! APRS carries aliases like `WIDE2-1` and `TCPIP`) and the strict AX.25
//! rules used on the air (up to six uppercase alphanumerics plus an SSID of
//! 0-15).

/// Validates a callsign against strict AX.25 rules and returns the
/// normalized (uppercased) form, or `None` if it does not qualify.
///
/// Accepts `BASE` or `BASE-SSID` where `BASE` is 1-6 alphanumerics and
/// `SSID` is 1-2 digits with a value of 0-15.
pub fn check_ax25_call(call: &str) -> Option<String> {
    let upper = call.to_ascii_uppercase();

    let (base, ssid) = match upper.split_once('-') {
        Some((base, ssid)) => (base, Some(ssid)),
        None => (upper.as_str(), None),
    };

    if base.is_empty() || base.len() > 6 {
        return None;
    }
    if !base.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
        return None;
    }

    match ssid {
        None => Some(base.to_string()),
        Some(ssid) => {
            if ssid.is_empty() || ssid.len() > 2 {
                return None;
            }
            if !ssid.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let n: u8 = ssid.parse().ok()?;
            if n > 15 {
                return None;
            }
            Some(format!("{}-{}", base, n))
        }
    }
}

/// Permissive APRS-IS callsign check: 1-9 characters of `[A-Za-z0-9-]`.
pub(crate) fn is_aprsis_call(call: &str) -> bool {
    !call.is_empty()
        && call.len() <= 9
        && call
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// A q-construct is `q` followed by exactly two characters.
pub(crate) fn is_q_construct(element: &str) -> bool {
    element.len() == 3 && element.starts_with('q')
}

/// A bracketed IPv6 address in an APRS-IS path: exactly 32 uppercase
/// hexadecimal digits.
pub(crate) fn is_ipv6_hex(element: &str) -> bool {
    element.len() == 32
        && element
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}
