//! Address value type yielded by IP generators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// An immutable IP address value.
///
/// Each yielded address is an independent copy, comparable and ordered
/// by value. IPv4 addresses order before IPv6 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressValue(IpAddr);

impl AddressValue {
    /// Wrap an IP address.
    #[inline]
    pub const fn new(ip: IpAddr) -> Self {
        Self(ip)
    }

    /// Get the wrapped IP address.
    #[inline]
    pub const fn ip(self) -> IpAddr {
        self.0
    }
}

impl fmt::Display for AddressValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<IpAddr> for AddressValue {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl From<Ipv4Addr> for AddressValue {
    fn from(ip: Ipv4Addr) -> Self {
        Self(IpAddr::V4(ip))
    }
}

impl From<Ipv6Addr> for AddressValue {
    fn from(ip: Ipv6Addr) -> Self {
        Self(IpAddr::V6(ip))
    }
}

impl From<AddressValue> for IpAddr {
    fn from(value: AddressValue) -> Self {
        value.0
    }
}
