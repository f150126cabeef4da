//! DHCP pool exhaustion
//!
//! Simulates a configurable number of DHCP clients sending DISCOVER
//! broadcasts from distinct source MACs to exhaust a router's IP pool.

pub mod attack;
pub mod packet;

pub use attack::{DhcpExhaustion, MacPool};
pub use packet::{DhcpMessageType, DhcpOption, DhcpPacket};
