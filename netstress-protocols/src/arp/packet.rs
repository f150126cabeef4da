//! ARP packet structure and serialization

use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;
use netstress_core::{Error, MacAddr, Result};

/// ARP EtherType
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// Ethernet hardware type
pub const HTYPE_ETHERNET: u16 = 1;

/// IPv4 protocol type
pub const PTYPE_IPV4: u16 = 0x0800;

/// ARP operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOpcode {
    Request = 1,
    Reply = 2,
}

impl ArpOpcode {
    pub fn from_u16(val: u16) -> Option<Self> {
        match val {
            1 => Some(Self::Request),
            2 => Some(Self::Reply),
            _ => None,
        }
    }
}

/// ARP packet (payload only; the Ethernet header is added by the sender)
#[derive(Debug, Clone)]
pub struct ArpPacket {
    pub htype: u16,
    pub ptype: u16,
    pub hlen: u8,
    pub plen: u8,
    pub operation: ArpOpcode,
    pub sender_hw_addr: MacAddr,
    pub sender_proto_addr: Ipv4Addr,
    pub target_hw_addr: MacAddr,
    pub target_proto_addr: Ipv4Addr,
}

impl ArpPacket {
    /// Create a gratuitous announcement: sender and target protocol address
    /// both set to the advertised IP, target hardware zeroed.
    pub fn new_announcement(mac: MacAddr, ip: Ipv4Addr) -> Self {
        Self {
            htype: HTYPE_ETHERNET,
            ptype: PTYPE_IPV4,
            hlen: 6,
            plen: 4,
            operation: ArpOpcode::Request,
            sender_hw_addr: mac,
            sender_proto_addr: ip,
            target_hw_addr: MacAddr::zero(),
            target_proto_addr: ip,
        }
    }

    /// Parse an ARP payload from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 28 {
            return Err(Error::attack("ARP packet too short"));
        }

        let op_val = u16::from_be_bytes([data[6], data[7]]);
        let operation =
            ArpOpcode::from_u16(op_val).ok_or_else(|| Error::attack("Invalid ARP opcode"))?;

        let mut sender_hw = [0u8; 6];
        sender_hw.copy_from_slice(&data[8..14]);
        let mut target_hw = [0u8; 6];
        target_hw.copy_from_slice(&data[18..24]);

        Ok(Self {
            htype: u16::from_be_bytes([data[0], data[1]]),
            ptype: u16::from_be_bytes([data[2], data[3]]),
            hlen: data[4],
            plen: data[5],
            operation,
            sender_hw_addr: MacAddr(sender_hw),
            sender_proto_addr: Ipv4Addr::new(data[14], data[15], data[16], data[17]),
            target_hw_addr: MacAddr(target_hw),
            target_proto_addr: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
        })
    }

    /// Serialize to the 28-byte wire format
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(28);

        buf.put_u16(self.htype);
        buf.put_u16(self.ptype);
        buf.put_u8(self.hlen);
        buf.put_u8(self.plen);
        buf.put_u16(self.operation as u16);
        buf.put_slice(self.sender_hw_addr.as_bytes());
        buf.put_slice(&self.sender_proto_addr.octets());
        buf.put_slice(self.target_hw_addr.as_bytes());
        buf.put_slice(&self.target_proto_addr.octets());

        buf.to_vec()
    }

    /// Gratuitous announcements advertise their own binding
    pub fn is_gratuitous(&self) -> bool {
        self.sender_proto_addr == self.target_proto_addr
    }
}
