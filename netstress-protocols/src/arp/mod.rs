//! Gratuitous-ARP keep-alive
//!
//! Maintains a range of synthetic devices in a router's ARP table by
//! broadcasting repeated cycles of gratuitous announcements.

pub mod attack;
pub mod packet;

pub use attack::ArpKeepAlive;
pub use packet::{ArpOpcode, ArpPacket};
