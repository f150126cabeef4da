//! Discovered access point records

use super::frames::Band;
use netstress_core::MacAddr;

/// One discovered access point: created when a beacon or probe response is
/// first observed for a (band, name) pair, then accumulates the channels its
/// beacons were seen on and the clients discovered mid-run.
#[derive(Debug, Clone)]
pub struct Ssid {
    pub name: String,
    pub bssid: MacAddr,
    pub band: Band,
    /// Channels beacons were observed on, kept sorted; duplicates retained
    /// so the median reflects observation frequency.
    channels: Vec<u16>,
    /// Clients seen associated with this AP, appended once each
    pub clients: Vec<MacAddr>,
}

impl Ssid {
    pub fn new(name: String, bssid: MacAddr, band: Band) -> Self {
        Self {
            name,
            bssid,
            band,
            channels: Vec::new(),
            clients: Vec::new(),
        }
    }

    /// Record a channel observation
    pub fn add_channel(&mut self, channel: u16) {
        self.channels.push(channel);
        self.channels.sort_unstable();
    }

    /// The "home" channel: median of the observed channels.
    ///
    /// None until at least one observation has been recorded.
    pub fn home_channel(&self) -> Option<u16> {
        if self.channels.is_empty() {
            return None;
        }
        Some(self.channels[self.channels.len() / 2])
    }

    /// Append a newly discovered client
    pub fn add_client(&mut self, client: MacAddr) {
        self.clients.push(client);
    }

    pub fn has_client(&self, client: &MacAddr) -> bool {
        self.clients.contains(client)
    }
}
