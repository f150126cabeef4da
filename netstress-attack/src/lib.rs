//! Attack lifecycle execution for netstress
//!
//! This crate provides the machinery that drives [`netstress_core::Attack`]
//! implementations through the uniform start/stop contract:
//!
//! - `AttackExecutor`: spawns exactly one background worker per attack
//! - `AttackRunner`: idempotent start, bounded-timeout stop, scoped runs and
//!   user-initiated aborts
//!
//! # Example
//!
//! ```no_run
//! use netstress_attack::AttackRunner;
//! # async fn demo(attack: std::sync::Arc<dyn netstress_core::Attack>,
//! #               interface: netstress_core::Interface) -> netstress_core::Result<()> {
//! let mut runner = AttackRunner::new(attack, interface);
//! runner.scope(|| async { /* observe the attack */ Ok(()) }).await?;
//! # Ok(())
//! # }
//! ```

pub mod executor;
pub mod runner;

pub use executor::{stop_and_wait, wait_for_attack, AttackExecutor, STOP_TIMEOUT};
pub use runner::{run_until_interrupt, AttackRunner};
