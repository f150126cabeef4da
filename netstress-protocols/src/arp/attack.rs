//! ARP keep-alive engine
//!
//! Emits repeated cycles of gratuitous ARP announcements for a range of
//! synthetic IP/MAC pairs, pacing packets by the shared pps safety cap and
//! sleeping the configured interval between cycles.

use super::packet::{ArpPacket, ETHERTYPE_ARP};
use async_trait::async_trait;
use rand::Rng;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info};
use netstress_core::{
    cap, validate_ip_prefix, validate_mac_prefix, Attack, AttackContext, Error, Interface,
    MacAddr, Result,
};

/// Wrap an ARP payload in a broadcast Ethernet frame
fn build_arp_frame(src_mac: MacAddr, packet: &ArpPacket) -> Vec<u8> {
    let mut frame = Vec::with_capacity(42); // 14 (Ethernet) + 28 (ARP)

    frame.extend_from_slice(MacAddr::broadcast().as_bytes());
    frame.extend_from_slice(src_mac.as_bytes());
    frame.extend_from_slice(&ETHERTYPE_ARP.to_be_bytes());
    frame.extend_from_slice(&packet.serialize());

    frame
}

/// ARP keep-alive attack
///
/// Per cycle, announces devices `base_ip + 1 ..= base_ip + num_devices`, each
/// with a source MAC derived from the configured 3-byte OUI prefix and the
/// device suffix. Permission-denied send errors are tolerated per packet;
/// any other error ends the run.
pub struct ArpKeepAlive {
    interface: Interface,
    base_ip: String,
    num_devices: u32,
    mac_prefix: [u8; 3],
    interval: Duration,
    cycles: u32,
}

impl ArpKeepAlive {
    /// Create the engine, validating all configuration eagerly.
    pub fn new(
        interface: &str,
        base_ip: &str,
        num_devices: u32,
        mac_prefix: &str,
        interval: Duration,
        cycles: u32,
    ) -> Result<Self> {
        let interface = Interface::by_name(interface)?;
        validate_ip_prefix(base_ip)?;
        let mac_prefix = validate_mac_prefix(mac_prefix)?;

        Ok(Self {
            interface,
            base_ip: base_ip.to_string(),
            num_devices,
            mac_prefix,
            interval,
            cycles,
        })
    }

    /// Derive the device MAC: OUI prefix, suffix byte, two random bytes.
    fn generate_mac(&self, ip_suffix: u32) -> MacAddr {
        let mut rng = rand::thread_rng();
        MacAddr::new([
            self.mac_prefix[0],
            self.mac_prefix[1],
            self.mac_prefix[2],
            ip_suffix as u8,
            rng.gen(),
            rng.gen(),
        ])
    }

    /// Announcement frame for the device at `base_ip + ip_suffix`
    fn generate_announcement(&self, ip_suffix: u32) -> Result<(Ipv4Addr, Vec<u8>)> {
        let ip: Ipv4Addr = format!("{}{}", self.base_ip, ip_suffix)
            .parse()
            .map_err(|_| {
                Error::invalid_parameter("base_ip", "prefix plus suffix is not a valid IPv4 address")
            })?;
        let mac = self.generate_mac(ip_suffix);
        let packet = ArpPacket::new_announcement(mac, ip);
        Ok((ip, build_arp_frame(mac, &packet)))
    }

    /// Inter-packet delay derived from the capped device rate
    fn send_delay(&self) -> Duration {
        let allowed_pps = cap(self.num_devices.max(1));
        Duration::from_secs_f64(1.0 / allowed_pps as f64)
    }

    /// Drive the announcement cycles through a caller-provided sender.
    ///
    /// Runs `cycles` repetitions of one packet per device, checking `running`
    /// before every send. Permission errors are logged and the loop carries
    /// on; other errors terminate the run. Sleeps `interval` between cycles
    /// but not after the last. The running flag is cleared on every exit
    /// path. Returns the number of packets sent.
    pub fn run_with_sender<F>(&self, running: &AtomicBool, mut send: F) -> u64
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let delay = self.send_delay();
        let mut sent = 0u64;

        'cycles: for cycle in 1..=self.cycles {
            if !running.load(Ordering::Relaxed) {
                break;
            }

            for i in 1..=self.num_devices {
                if !running.load(Ordering::Relaxed) {
                    break 'cycles;
                }

                let (ip, frame) = match self.generate_announcement(i) {
                    Ok(built) => built,
                    Err(e) => {
                        error!(error = %e, "ARP loop error");
                        break 'cycles;
                    }
                };

                match send(&frame) {
                    Ok(()) => {
                        sent += 1;
                        info!(%ip, "Sent ARP announcement");
                    }
                    Err(e) if e.is_permission_denied() => {
                        error!(error = %e, "Permission error sending ARP announcement");
                    }
                    Err(e) => {
                        error!(error = %e, "ARP loop error");
                        break 'cycles;
                    }
                }
                std::thread::sleep(delay);
            }

            if cycle < self.cycles && running.load(Ordering::Relaxed) {
                std::thread::sleep(self.interval);
            }
        }

        running.store(false, Ordering::Relaxed);
        info!("ARP cycles completed");
        sent
    }
}

#[async_trait]
impl Attack for ArpKeepAlive {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        let sender = ctx.interface.create_sender()?;
        let delay = self.send_delay();

        info!(
            devices = self.num_devices,
            cycles = self.cycles,
            interface = %ctx.interface.name,
            "Started ARP keep-alive"
        );

        'cycles: for cycle in 1..=self.cycles {
            if !ctx.running.load(Ordering::Relaxed) {
                break;
            }

            for i in 1..=self.num_devices {
                if !ctx.running.load(Ordering::Relaxed) {
                    break 'cycles;
                }

                let (ip, frame) = match self.generate_announcement(i) {
                    Ok(built) => built,
                    Err(e) => {
                        error!(error = %e, "ARP loop error");
                        break 'cycles;
                    }
                };

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
                        ctx.stats.increment_packets_sent();
                        info!(%ip, "Sent ARP announcement");
                    }
                    Err(e) if e.is_permission_denied() => {
                        ctx.stats.increment_errors();
                        error!(error = %e, "Permission error sending ARP announcement");
                    }
                    Err(e) => {
                        ctx.stats.increment_errors();
                        error!(error = %e, "ARP loop error");
                        break 'cycles;
                    }
                }

                tokio::time::sleep(delay).await;
            }

            if cycle < self.cycles && ctx.running.load(Ordering::Relaxed) {
                tokio::time::sleep(self.interval).await;
            }
        }

        ctx.running.store(false, Ordering::Relaxed);
        info!("ARP cycles completed");
        Ok(())
    }

    fn name(&self) -> &str {
        "ARP Keep-Alive"
    }
}
