//! Wireless radio control
//!
//! The [`Radio`] trait is the seam the interceptor drives the hardware
//! through; [`IwRadio`] implements it with the external `iw`/`iwlist` tools,
//! mirroring how the interface is controlled in the field. Monitor-mode
//! enablement delegates to an external toggle script and verifies the
//! reported mode after a settle delay.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};
use netstress_core::{Error, Result};

/// Delay for the driver to settle after toggling the interface mode
const MODE_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Wireless radio control seam
pub trait Radio: Send + Sync {
    /// Channels supported by the interface driver
    fn supported_channels(&self) -> Result<Vec<u16>>;

    /// Tune the radio to a channel
    fn set_channel(&self, channel: u16) -> Result<()>;

    /// Put the interface into monitor mode. Failure is fatal to setup.
    fn enable_monitor_mode(&self) -> Result<()>;
}

/// Radio control through the `iw` / `iwlist` command-line tools
pub struct IwRadio {
    interface: String,
    toggle_script: Option<PathBuf>,
}

impl IwRadio {
    pub fn new(interface: &str) -> Self {
        Self {
            interface: interface.to_string(),
            toggle_script: None,
        }
    }

    /// Use an external script `<script> <interface> monitor` for the mode
    /// toggle instead of failing when none is configured.
    pub fn with_toggle_script(mut self, script: &Path) -> Self {
        self.toggle_script = Some(script.to_path_buf());
        self
    }

    /// Is the interface currently reporting monitor mode?
    pub fn is_monitor_mode(&self) -> Result<bool> {
        let output = Command::new("iw")
            .args(["dev", &self.interface, "info"])
            .output()?;
        Ok(String::from_utf8_lossy(&output.stdout).contains("type monitor"))
    }
}

/// Stop a conflicting network-management service. Success is the command's
/// exit status; callers treat failure as non-fatal.
pub fn kill_network_manager() -> Result<()> {
    let cmd = "systemctl stop NetworkManager";
    info!(%cmd, "Running command");
    let status = Command::new("systemctl")
        .args(["stop", "NetworkManager"])
        .status()?;
    if !status.success() {
        return Err(Error::ExecutionFailed(format!(
            "'{}' exited with {}",
            cmd, status
        )));
    }
    Ok(())
}

impl Radio for IwRadio {
    fn supported_channels(&self) -> Result<Vec<u16>> {
        let output = Command::new("iwlist")
            .args([&self.interface, "channel"])
            .output()?;

        let text = String::from_utf8_lossy(&output.stdout);
        let mut channels = Vec::new();
        for line in text.lines() {
            // e.g. "          Channel 01 : 2.412 GHz"; the "Current" line
            // reports the tuned frequency, not a capability.
            if !line.contains("Channel") || line.contains("Current") {
                continue;
            }
            if let Some(rest) = line.split("Channel").nth(1) {
                let number = rest.split(':').next().unwrap_or("").trim();
                if let Ok(ch) = number.parse::<u16>() {
                    channels.push(ch);
                }
            }
        }
        Ok(channels)
    }

    fn set_channel(&self, channel: u16) -> Result<()> {
        debug!(interface = %self.interface, channel, "Setting channel");
        let status = Command::new("iw")
            .args(["dev", &self.interface, "set", "channel", &channel.to_string()])
            .status()?;
        if !status.success() {
            return Err(Error::wireless(format!(
                "failed to set channel {} on {}",
                channel, self.interface
            )));
        }
        Ok(())
    }

    fn enable_monitor_mode(&self) -> Result<()> {
        let script = self.toggle_script.as_ref().ok_or_else(|| {
            Error::wireless("no monitor-mode toggle script configured".to_string())
        })?;
        if !script.exists() {
            return Err(Error::wireless(format!(
                "toggle script not found: {}",
                script.display()
            )));
        }

        info!(script = %script.display(), interface = %self.interface, "Enabling monitor mode");
        let status = Command::new("bash")
            .arg(script)
            .args([&self.interface, "monitor"])
            .status()?;
        if !status.success() {
            return Err(Error::wireless(format!(
                "monitor-mode toggle exited with {}",
                status
            )));
        }

        std::thread::sleep(MODE_SETTLE_DELAY);

        if !self.is_monitor_mode()? {
            return Err(Error::wireless(format!(
                "monitor mode not enabled on {}",
                self.interface
            )));
        }
        debug!(interface = %self.interface, "Monitor mode enabled");
        Ok(())
    }
}
