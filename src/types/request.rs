//! Scan intent (`Range`) and single-target (`Request`) value types.

use super::{MacAddr, PortRange};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Description of what to scan. Input to the generators only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Source address copied onto every generated request.
    pub src_ip: Option<IpAddr>,
    /// Source hardware address copied onto every generated request.
    pub src_mac: Option<MacAddr>,
    /// Destination subnet to enumerate.
    pub dst_subnet: Option<IpNetwork>,
    /// Destination port ranges, enumerated in declaration order.
    pub ports: Vec<PortRange>,
}

impl Range {
    /// Create an empty range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the destination subnet.
    pub fn with_subnet(mut self, subnet: IpNetwork) -> Self {
        self.dst_subnet = Some(subnet);
        self
    }

    /// Set the destination port ranges.
    pub fn with_ports(mut self, ports: Vec<PortRange>) -> Self {
        self.ports = ports;
        self
    }

    /// Set the source address.
    pub fn with_src_ip(mut self, ip: IpAddr) -> Self {
        self.src_ip = Some(ip);
        self
    }

    /// Set the source hardware address.
    pub fn with_src_mac(mut self, mac: MacAddr) -> Self {
        self.src_mac = Some(mac);
        self
    }
}

/// A single scan target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    pub src_ip: Option<IpAddr>,
    pub src_mac: Option<MacAddr>,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
}

impl Request {
    /// Create a request for `dst_ip:dst_port` with no source fields.
    pub const fn new(dst_ip: IpAddr, dst_port: u16) -> Self {
        Self {
            src_ip: None,
            src_mac: None,
            dst_ip,
            dst_port,
        }
    }

    /// Create a request carrying the source fields of `range`.
    pub fn from_range(range: &Range, dst_ip: IpAddr, dst_port: u16) -> Self {
        Self {
            src_ip: range.src_ip,
            src_mac: range.src_mac,
            dst_ip,
            dst_port,
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dst_ip {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.dst_port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.dst_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_from_range_copies_source() {
        let mac = MacAddr::new(1, 2, 3, 4, 5, 6);
        let range = Range::new()
            .with_src_ip(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 3)))
            .with_src_mac(mac);

        let req = Request::from_range(&range, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 22);
        assert_eq!(req.src_ip, range.src_ip);
        assert_eq!(req.src_mac, Some(mac));
        assert_eq!(req.to_string(), "10.0.0.1:22");
    }

    #[test]
    fn test_request_equality() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(Request::new(ip, 80), Request::new(ip, 80));
        assert_ne!(Request::new(ip, 80), Request::new(ip, 81));
    }
}
