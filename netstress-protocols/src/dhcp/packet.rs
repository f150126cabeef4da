//! DHCP packet construction (RFC 2131 / RFC 2132, build side)

use bytes::{BufMut, BytesMut};
use netstress_core::MacAddr;

/// DHCP magic cookie value
pub const DHCP_MAGIC_COOKIE: u32 = 0x63825363;

/// DHCP server port
pub const DHCP_SERVER_PORT: u16 = 67;

/// DHCP client port
pub const DHCP_CLIENT_PORT: u16 = 68;

/// Broadcast flag value
pub const DHCP_BROADCAST_FLAG: u16 = 0x8000;

/// BOOTREQUEST opcode
pub const BOOTREQUEST: u8 = 1;

/// Ethernet hardware type
pub const HTYPE_ETHERNET: u8 = 1;

/// Ethernet hardware address length
pub const HLEN_ETHERNET: u8 = 6;

/// DHCP Message Types (RFC 2132)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpMessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

/// DHCP options the exhaustion engine emits
#[derive(Debug, Clone, PartialEq)]
pub enum DhcpOption {
    MessageType(DhcpMessageType),
    /// Hardware type byte followed by the client MAC
    ClientIdentifier(MacAddr),
    ParameterRequestList(Vec<u8>),
    End,
}

impl DhcpOption {
    /// Serialize the option as code, length, payload
    pub fn build(&self) -> Vec<u8> {
        match self {
            DhcpOption::MessageType(msg_type) => vec![53, 1, *msg_type as u8],
            DhcpOption::ClientIdentifier(mac) => {
                let mut bytes = vec![61, 7, HTYPE_ETHERNET];
                bytes.extend_from_slice(mac.as_bytes());
                bytes
            }
            DhcpOption::ParameterRequestList(params) => {
                let mut bytes = vec![55, params.len() as u8];
                bytes.extend_from_slice(params);
                bytes
            }
            DhcpOption::End => vec![255],
        }
    }
}

/// A DHCP message (BOOTP header plus options)
#[derive(Debug, Clone)]
pub struct DhcpPacket {
    pub op: u8,
    pub htype: u8,
    pub hlen: u8,
    pub hops: u8,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    /// Client hardware address field (16 bytes, MAC in the first 6)
    pub chaddr: [u8; 16],
    pub options: Vec<DhcpOption>,
}

impl DhcpPacket {
    /// Build a DISCOVER broadcast for the given client MAC.
    ///
    /// Options: message-type=discover, client identifier, parameter request
    /// list, end.
    pub fn new_discover(xid: u32, mac: MacAddr, param_req_list: &[u8]) -> Self {
        let mut chaddr = [0u8; 16];
        chaddr[..6].copy_from_slice(mac.as_bytes());

        Self {
            op: BOOTREQUEST,
            htype: HTYPE_ETHERNET,
            hlen: HLEN_ETHERNET,
            hops: 0,
            xid,
            secs: 0,
            flags: DHCP_BROADCAST_FLAG,
            chaddr,
            options: vec![
                DhcpOption::MessageType(DhcpMessageType::Discover),
                DhcpOption::ClientIdentifier(mac),
                DhcpOption::ParameterRequestList(param_req_list.to_vec()),
                DhcpOption::End,
            ],
        }
    }

    /// Client MAC from the hardware address field
    pub fn client_mac(&self) -> MacAddr {
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&self.chaddr[..6]);
        MacAddr(mac)
    }

    /// Serialize to wire format: fixed BOOTP header, magic cookie, options.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(300);

        buf.put_u8(self.op);
        buf.put_u8(self.htype);
        buf.put_u8(self.hlen);
        buf.put_u8(self.hops);
        buf.put_u32(self.xid);
        buf.put_u16(self.secs);
        buf.put_u16(self.flags);
        buf.put_u32(0); // ciaddr
        buf.put_u32(0); // yiaddr
        buf.put_u32(0); // siaddr
        buf.put_u32(0); // giaddr
        buf.put_slice(&self.chaddr);
        buf.put_bytes(0, 64); // sname
        buf.put_bytes(0, 128); // file
        buf.put_u32(DHCP_MAGIC_COOKIE);

        for option in &self.options {
            buf.put_slice(&option.build());
        }

        buf.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_mac() -> MacAddr {
        MacAddr::new([0xde, 0xad, 0x01, 0x02, 0x03, 0x04])
    }

    #[test]
    fn test_discover_header_fields() {
        let packet = DhcpPacket::new_discover(0x12345678, test_mac(), &[1, 3, 6]);

        assert_eq!(packet.op, BOOTREQUEST);
        assert_eq!(packet.htype, HTYPE_ETHERNET);
        assert_eq!(packet.hlen, HLEN_ETHERNET);
        assert_eq!(packet.flags, DHCP_BROADCAST_FLAG);
        assert_eq!(packet.client_mac(), test_mac());
    }

    #[test]
    fn test_discover_wire_format() {
        let packet = DhcpPacket::new_discover(0x12345678, test_mac(), &[1, 3]);
        let bytes = packet.build();

        // Fixed header is 236 bytes, then the cookie.
        assert_eq!(bytes[0], BOOTREQUEST);
        assert_eq!(&bytes[4..8], &0x12345678u32.to_be_bytes());
        assert_eq!(&bytes[28..34], test_mac().as_bytes());
        assert_eq!(&bytes[236..240], &DHCP_MAGIC_COOKIE.to_be_bytes());

        // Options: message type discover first, end last.
        assert_eq!(&bytes[240..243], &[53, 1, DhcpMessageType::Discover as u8]);
        assert_eq!(*bytes.last().unwrap(), 255);
    }

    #[test]
    fn test_client_identifier_option() {
        let option = DhcpOption::ClientIdentifier(test_mac());
        let bytes = option.build();
        assert_eq!(bytes[0], 61);
        assert_eq!(bytes[1], 7);
        assert_eq!(bytes[2], HTYPE_ETHERNET);
        assert_eq!(&bytes[3..9], test_mac().as_bytes());
    }

    #[test]
    fn test_parameter_request_list_option() {
        let codes: Vec<u8> = (0..=80).collect();
        let option = DhcpOption::ParameterRequestList(codes.clone());
        let bytes = option.build();
        assert_eq!(bytes[0], 55);
        assert_eq!(bytes[1], 81);
        assert_eq!(&bytes[2..], codes.as_slice());
    }
}
