//! Network interface enumeration and raw frame transmission

use crate::{Error, MacAddr};
use pnet_datalink::{self, Channel, DataLinkSender};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Network interface
#[derive(Debug, Clone)]
pub struct Interface {
    /// Interface name (e.g., "eth0", "wlan0")
    pub name: String,
    /// Interface index
    pub index: u32,
    /// MAC address
    pub mac_address: MacAddr,
    /// Is interface up?
    pub is_up: bool,
}

impl Interface {
    /// Get interface by name
    pub fn by_name(name: &str) -> Result<Self, Error> {
        let interfaces = pnet_datalink::interfaces();
        let iface = interfaces
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))?;

        let mac_bytes = if let Some(mac) = iface.mac {
            [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]
        } else {
            [0, 0, 0, 0, 0, 0]
        };

        Ok(Self {
            name: iface.name.clone(),
            index: iface.index,
            mac_address: MacAddr(mac_bytes),
            is_up: iface.is_up(),
        })
    }

    /// Names of all live interfaces on this host
    pub fn names() -> Vec<String> {
        pnet_datalink::interfaces()
            .into_iter()
            .map(|i| i.name)
            .collect()
    }

    /// Send a raw frame on this interface
    ///
    /// # Arguments
    /// * `packet` - Raw packet bytes including the link-layer header
    pub fn send_raw(&self, packet: &[u8]) -> Result<(), Error> {
        let interfaces = pnet_datalink::interfaces();
        let interface = interfaces
            .into_iter()
            .find(|iface| iface.name == self.name)
            .ok_or_else(|| Error::InterfaceNotFound(self.name.clone()))?;

        let (mut tx, _) = match pnet_datalink::channel(&interface, Default::default()) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => return Err(Error::Interface("Unsupported channel type".to_string())),
            Err(e) => return Err(Error::Io(e)),
        };

        tx.send_to(packet, None)
            .ok_or_else(|| Error::Interface("Failed to send packet".to_string()))?
            .map_err(Error::Io)?;

        Ok(())
    }

    /// Create a persistent sender for this interface.
    ///
    /// More efficient than `send_raw` for send loops; the returned sender can
    /// be shared across threads.
    pub fn create_sender(&self) -> Result<Arc<Mutex<Box<dyn DataLinkSender>>>, Error> {
        let interfaces = pnet_datalink::interfaces();
        let interface = interfaces
            .into_iter()
            .find(|iface| iface.name == self.name)
            .ok_or_else(|| Error::InterfaceNotFound(self.name.clone()))?;

        let (tx, _) = match pnet_datalink::channel(&interface, Default::default()) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => return Err(Error::Interface("Unsupported channel type".to_string())),
            Err(e) => return Err(Error::Io(e)),
        };

        Ok(Arc::new(Mutex::new(tx)))
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.mac_address)
    }
}
