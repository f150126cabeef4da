//! Attack runner: the uniform start/stop/scope contract
//!
//! `AttackRunner` holds one attack instance and enforces the lifecycle
//! semantics shared by every attack variant:
//!
//! - `start` transitions stopped -> running exactly once; starting a running
//!   attack is a no-op
//! - `stop` clears the running flag and waits for the worker with a bounded
//!   timeout; duplicate stops produce no repeated side effects
//! - `scope` runs a closure with the attack active and stops it on every
//!   exit path
//!
//! Workers never stop themselves through the runner: self-termination is
//! storing `running = false` and returning, so there is no join-from-worker
//! deadlock to guard against.

use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info};
use netstress_core::{Attack, AttackContext, AttackHandle, AttackStats, Interface, Result};

use crate::executor::{stop_and_wait, AttackExecutor};

/// Drives a single attack through its lifecycle.
pub struct AttackRunner {
    attack: Arc<dyn Attack>,
    interface: Interface,
    handle: Option<AttackHandle>,
}

impl AttackRunner {
    /// Create a runner for an attack on the given (pre-validated) interface.
    pub fn new(attack: Arc<dyn Attack>, interface: Interface) -> Self {
        Self {
            attack,
            interface,
            handle: None,
        }
    }

    /// Is the attack worker currently running?
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_running()).unwrap_or(false)
    }

    /// Current statistics, if the attack has ever been started.
    pub fn stats(&self) -> Option<AttackStats> {
        self.handle.as_ref().map(|h| h.stats())
    }

    /// Start the attack in a background worker.
    ///
    /// No-op when the attack is already running.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!(attack = %self.attack.name(), "Attack already running, start ignored");
            return;
        }

        let executor = AttackExecutor::new(self.attack.name().to_string());
        let context = AttackContext::new(self.interface.clone());
        self.handle = Some(executor.execute(self.attack.clone(), context));
    }

    /// Stop the attack and wait for the worker with a bounded timeout.
    ///
    /// Idempotent: the second and later calls find no live handle and return
    /// without side effects, so the stop log (with duration) is emitted
    /// exactly once per run.
    pub async fn stop(&mut self) -> Result<()> {
        let mut handle = match self.handle.take() {
            Some(h) => h,
            None => return Ok(()),
        };

        let result = stop_and_wait(&mut handle).await;
        if let Err(e) = &result {
            error!(attack = %self.attack.name(), error = %e, "Attack finished with error");
        }

        let duration_secs = SystemTime::now()
            .duration_since(handle.started_at)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        info!(
            attack = %self.attack.name(),
            duration_secs,
            packets_sent = handle.stats().packets_sent,
            "Attack stopped"
        );

        result
    }

    /// Stop triggered by the operator (e.g. from an interrupt signal).
    pub async fn user_abort(&mut self) -> Result<()> {
        info!(attack = %self.attack.name(), "User requested graceful shutdown");
        self.stop().await
    }

    /// Run `f` with the attack active; the attack is stopped on every exit
    /// path. The scoped-resource equivalent of context-managed attacks.
    pub async fn scope<F, Fut, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.start();
        let outcome = f().await;
        let stop_result = self.stop().await;
        let value = outcome?;
        stop_result?;
        Ok(value)
    }
}

/// Run an attack until the process receives an interrupt signal, then route
/// the signal to the attack's user abort.
pub async fn run_until_interrupt(runner: &mut AttackRunner) -> Result<()> {
    runner.start();
    tokio::signal::ctrl_c().await?;
    runner.user_abort().await
}
