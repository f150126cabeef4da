//! Capture driver
//!
//! Spawns a worker thread that blocks inside the capture library, plus an
//! optional timer thread that ends the capture after a configured duration.
//! Stopping is idempotent: the backend's stop operation runs exactly once
//! per capture, whichever of the timer, an explicit `stop` call or Drop gets
//! there first.

use crate::backend::{CaptureBackend, TrafficCaptureConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info};
use netstress_core::{validate_interface, Result};

/// Bounded wait for worker threads during shutdown
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Worker thread plus a completion channel for bounded joining
struct Worker {
    name: &'static str,
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

impl Worker {
    fn spawn<F: FnOnce() + Send + 'static>(name: &'static str, f: F) -> Self {
        let (done_tx, done) = std::sync::mpsc::channel();
        let handle = std::thread::spawn(move || {
            f();
            let _ = done_tx.send(());
        });
        Self { name, handle, done }
    }

    /// Join with a bounded timeout; a worker that does not finish in time is
    /// reported and left detached.
    fn join_timeout(self, timeout: Duration) {
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = self.handle.join();
            }
            Err(RecvTimeoutError::Timeout) => {
                error!(
                    worker = self.name,
                    timeout_secs = timeout.as_secs(),
                    "Worker failed to stop within timeout"
                );
            }
        }
    }
}

/// Traffic capture driver around the external capture library
pub struct TrafficLogger {
    backend: Arc<dyn CaptureBackend>,
    config: TrafficCaptureConfig,
    running: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    started_at: Option<SystemTime>,
    capture_worker: Option<Worker>,
    timer_worker: Option<Worker>,
}

impl TrafficLogger {
    /// Create the driver, validating the capture interface eagerly.
    pub fn new(backend: Arc<dyn CaptureBackend>, config: TrafficCaptureConfig) -> Result<Self> {
        validate_interface(&config.interface)?;

        Ok(Self {
            backend,
            config,
            running: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
            started_at: None,
            capture_worker: None,
            timer_worker: None,
        })
    }

    /// Is the capture worker still inside the library call?
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The stop sequence shared by the timer thread and `stop`: runs the
    /// backend stop exactly once per capture.
    fn stop_capture(
        backend: &Arc<dyn CaptureBackend>,
        running: &AtomicBool,
        stopped: &AtomicBool,
        reason: &str,
    ) -> bool {
        if stopped.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!(reason, "Stopping traffic capture");
        backend.capture_stop();
        running.store(false, Ordering::SeqCst);
        true
    }

    /// Start the capture worker and, when a duration is configured, the
    /// timer worker. Idempotent while running.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Capture already running, start ignored");
            return;
        }
        self.stopped.store(false, Ordering::SeqCst);
        self.started_at = Some(SystemTime::now());

        info!(
            interface = %self.config.interface,
            filter = %self.config.bpf_filter,
            output = %self.config.output_file,
            "Starting traffic capture"
        );

        let backend = Arc::clone(&self.backend);
        let config = self.config.clone();
        let running = Arc::clone(&self.running);
        self.capture_worker = Some(Worker::spawn("traffic-capture", move || {
            let status = backend.capture_start(&config);
            if status != 0 {
                error!(status, error = %backend.get_last_error(), "Capture failed");
            }
            running.store(false, Ordering::SeqCst);
        }));

        if self.config.duration > 0 {
            let backend = Arc::clone(&self.backend);
            let running = Arc::clone(&self.running);
            let stopped = Arc::clone(&self.stopped);
            let duration = Duration::from_secs(self.config.duration as u64);
            self.timer_worker = Some(Worker::spawn("traffic-capture-timer", move || {
                // Sleep in slices so an early stop doesn't strand the timer
                // past the join timeout.
                let deadline = Instant::now() + duration;
                while Instant::now() < deadline {
                    if stopped.load(Ordering::SeqCst) {
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(100).min(duration));
                }
                Self::stop_capture(&backend, &running, &stopped, "duration elapsed");
            }));
        }
    }

    /// Stop the capture and join the workers with bounded timeouts.
    ///
    /// Idempotent: the backend stop and the completion log happen exactly
    /// once per capture regardless of how many times this runs or whether
    /// the timer got there first.
    pub fn stop(&mut self) {
        if self.started_at.is_none() && self.capture_worker.is_none() {
            // Never started, or already stopped and joined
            return;
        }

        if Self::stop_capture(&self.backend, &self.running, &self.stopped, "stop requested") {
            if let Some(started_at) = self.started_at.take() {
                let duration_secs = SystemTime::now()
                    .duration_since(started_at)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                info!(duration_secs, "Traffic capture stopped");
            }
        }

        if let Some(worker) = self.capture_worker.take() {
            worker.join_timeout(JOIN_TIMEOUT);
        }
        if let Some(worker) = self.timer_worker.take() {
            worker.join_timeout(JOIN_TIMEOUT);
        }
    }
}

impl Drop for TrafficLogger {
    fn drop(&mut self) {
        self.stop();
    }
}
