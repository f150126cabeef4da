//! Attack executor that runs attacks with proper error handling
//!
//! The executor spawns exactly one background worker per attack and provides
//! the bounded-timeout join used during shutdown. A worker that fails to
//! terminate within [`STOP_TIMEOUT`] is reported as an error but never blocks
//! process exit.

use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use netstress_core::{Attack, AttackContext, AttackHandle, Error, Result};

/// Bounded wait applied when stopping a worker
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Attack executor that handles the lifecycle of a single attack instance
pub struct AttackExecutor {
    /// Unique identifier for this attack instance
    id: Uuid,
    /// Attack name
    attack_name: String,
}

impl AttackExecutor {
    /// Create a new attack executor
    pub fn new(attack_name: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            attack_name,
        }
    }

    /// Execute an attack and return a handle.
    ///
    /// Spawns one tokio task running the attack's execute method. The worker
    /// owns the send loop; completion and errors are logged here.
    pub fn execute(self, attack: Arc<dyn Attack>, context: AttackContext) -> AttackHandle {
        let id = self.id;
        let attack_name = self.attack_name.clone();
        let running = context.running.clone();
        let stats = context.stats.clone();
        let started_at = SystemTime::now();

        info!(
            id = %id,
            attack = %attack_name,
            interface = %context.interface.name,
            "Starting attack"
        );

        let attack_name_task = attack_name.clone();
        let task_handle = tokio::spawn(async move {
            let result = attack.execute(context).await;

            match &result {
                Ok(_) => {
                    info!(id = %id, attack = %attack_name_task, "Attack completed");
                }
                Err(e) => {
                    error!(id = %id, attack = %attack_name_task, error = %e, "Attack failed");
                }
            }

            result
        });

        AttackHandle {
            id,
            attack_name,
            running,
            stats,
            started_at,
            task_handle: Some(task_handle),
        }
    }
}

/// Wait for an attack worker to complete, bounded by [`STOP_TIMEOUT`].
///
/// A worker that does not terminate in time is reported but the call still
/// returns Ok; the task is left detached (best-effort cleanup).
pub async fn wait_for_attack(handle: &mut AttackHandle) -> Result<()> {
    let task_handle = match handle.task_handle.take() {
        Some(t) => t,
        None => {
            warn!(id = %handle.id, "Attack worker already joined");
            return Ok(());
        }
    };

    match tokio::time::timeout(STOP_TIMEOUT, task_handle).await {
        Err(_elapsed) => {
            error!(
                id = %handle.id,
                timeout_secs = STOP_TIMEOUT.as_secs(),
                "Attack worker failed to stop within timeout"
            );
            Ok(())
        }
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            if e.is_panic() {
                error!(id = %handle.id, "Attack worker panicked");
                Err(Error::ExecutionFailed("Attack worker panicked".to_string()))
            } else {
                error!(id = %handle.id, error = %e, "Failed to join attack worker");
                Err(Error::ExecutionFailed(format!(
                    "Failed to join attack worker: {}",
                    e
                )))
            }
        }
    }
}

/// Stop an attack and wait for the worker to finish.
pub async fn stop_and_wait(handle: &mut AttackHandle) -> Result<()> {
    debug!(id = %handle.id, "Stopping attack");
    handle.stop();
    wait_for_attack(handle).await
}
