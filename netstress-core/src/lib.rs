//! Netstress Core Library
//!
//! This crate provides the fundamental traits, types, validation and error
//! handling shared by the netstress network stress-testing toolkit.

pub mod attack;
pub mod cancel;
pub mod error;
pub mod interface;
pub mod rate;
pub mod types;
pub mod validate;

// Re-export commonly used types
pub use attack::{Attack, AttackContext, AttackHandle, AttackStats, AttackStatsCounters};
pub use cancel::AbortToken;
pub use error::{Error, Result};
pub use interface::Interface;
pub use rate::{cap, MAX_PPS};
pub use types::MacAddr;
pub use validate::{validate_interface, validate_ip_prefix, validate_mac, validate_mac_prefix};
