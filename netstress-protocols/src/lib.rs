//! Attack implementations for netstress
//!
//! Each protocol module follows the same layout: `packet.rs` builds the wire
//! format, `attack.rs` implements the engine behind the
//! [`netstress_core::Attack`] lifecycle contract. The `dot11` module houses
//! the deauthentication interceptor, which owns its own multi-threaded
//! scan-then-attack lifecycle.

pub mod arp;
pub mod dhcp;
pub mod dot11;
