//! Input validators shared by all attack components
//!
//! All checks are pure; callers decide how to surface a failure. Attack
//! constructors run these eagerly so that an invalid configuration fails
//! before any worker is spawned.

use crate::{Error, Interface, MacAddr, Result};

/// Verify that a network interface exists on this host.
pub fn validate_interface(name: &str) -> Result<()> {
    Interface::by_name(name).map(|_| ())
}

/// Validate a base-IP prefix of the form `192.168.1.` (trailing dot required).
pub fn validate_ip_prefix(prefix: &str) -> Result<()> {
    let invalid = || Error::invalid_parameter("base_ip", "use a format like '192.168.1.'");

    let body = prefix.strip_suffix('.').ok_or_else(invalid)?;
    let octets: Vec<&str> = body.split('.').collect();
    if octets.len() != 3 {
        return Err(invalid());
    }
    for octet in octets {
        if octet.is_empty() || octet.len() > 3 || !octet.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
    }
    Ok(())
}

/// Validate a 3-byte OUI MAC prefix of the form `de:ad:00`.
pub fn validate_mac_prefix(prefix: &str) -> Result<[u8; 3]> {
    let invalid = || Error::invalid_parameter("mac_prefix", "use a format like 'de:ad:00'");

    let parts: Vec<&str> = prefix.split(':').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }

    let mut bytes = [0u8; 3];
    for (i, part) in parts.iter().enumerate() {
        if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        bytes[i] = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
    }
    Ok(bytes)
}

/// Validate and normalize a MAC address.
///
/// Accepts `:` or `-` separated hex pairs; the returned [`MacAddr`] displays
/// as lowercase colon-separated form.
pub fn validate_mac(mac: &str) -> Result<MacAddr> {
    mac.parse()
}
