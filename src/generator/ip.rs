//! Address enumeration over a destination subnet.

use super::{AddressItem, Feed, IpGenerator};
use crate::error::{GenerateError, GenerateResult};
use crate::types::{AddressValue, Range};
use ipnetwork::IpNetwork;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Expands `Range::dst_subnet` into every address it contains.
///
/// Network and broadcast addresses are included: a /30 yields four
/// addresses and a /31 yields two.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubnetIpGenerator;

impl SubnetIpGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IpGenerator for SubnetIpGenerator {
    fn ips(&self, cancel: &CancellationToken, range: &Range) -> GenerateResult<Feed<AddressItem>> {
        let subnet = range.dst_subnet.ok_or(GenerateError::NoSubnet)?;

        let (emitter, feed) = Feed::channel(cancel);
        tokio::spawn(async move {
            for addr in subnet_addresses(subnet) {
                if !emitter.emit(Ok(addr)).await {
                    debug!(%subnet, "address generation stopped early");
                    return;
                }
            }
        });

        Ok(feed)
    }
}

/// All addresses of `subnet` in ascending order.
///
/// Bounds are computed from the mask rather than the host count so /0
/// networks do not overflow.
pub(crate) fn subnet_addresses(subnet: IpNetwork) -> Box<dyn Iterator<Item = AddressValue> + Send> {
    match subnet {
        IpNetwork::V4(net) => {
            let mask = u32::from(net.mask());
            let first = u32::from(net.ip()) & mask;
            let last = first | !mask;
            Box::new((first..=last).map(|ip| AddressValue::from(Ipv4Addr::from(ip))))
        }
        IpNetwork::V6(net) => {
            let mask = u128::from(net.mask());
            let first = u128::from(net.ip()) & mask;
            let last = first | !mask;
            Box::new((first..=last).map(|ip| AddressValue::from(Ipv6Addr::from(ip))))
        }
    }
}
