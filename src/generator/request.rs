//! Request generators composed from address and port generators.

use super::{
    AddressItem, Emitter, Feed, IpGenerator, PortGenerator, RequestGenerator, RequestItem,
};
use crate::error::GenerateResult;
use crate::types::{Range, Request};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Combines an address generator and a port generator.
///
/// Ordering is port-major: for each port, one request per address in
/// address order. Ports are validated before the subnet, so when both are
/// invalid the port error is the one returned.
#[derive(Clone)]
pub struct IpPortGenerator {
    ips: Arc<dyn IpGenerator>,
    ports: Arc<dyn PortGenerator>,
}

impl IpPortGenerator {
    pub fn new(ips: Arc<dyn IpGenerator>, ports: Arc<dyn PortGenerator>) -> Self {
        Self { ips, ports }
    }
}

impl RequestGenerator for IpPortGenerator {
    fn generate_requests(
        &self,
        cancel: &CancellationToken,
        range: &Range,
    ) -> GenerateResult<Feed<RequestItem>> {
        let mut ports = self.ports.ports(cancel, range)?;
        // The first address pass is started here so subnet errors surface
        // before anything is streamed. Later passes are started per port.
        let mut first_pass = Some(self.ips.ips(cancel, range)?);

        let ips = Arc::clone(&self.ips);
        let range = range.clone();
        let (emitter, feed) = Feed::channel(cancel);
        tokio::spawn(async move {
            let cancel = emitter.token().clone();
            while let Some(port) = ports.recv_or_cancel(&cancel).await {
                let mut addrs = match first_pass.take() {
                    Some(addrs) => addrs,
                    None => match ips.ips(&cancel, &range) {
                        Ok(addrs) => addrs,
                        Err(e) => {
                            warn!(port, error = %e, "address generation failed");
                            return;
                        }
                    },
                };

                while let Some(addr) = addrs.recv_or_cancel(&cancel).await {
                    let item = addr.map(|addr| Request::from_range(&range, addr.ip(), port));
                    if !emitter.emit(item).await {
                        debug!("request generation stopped early");
                        return;
                    }
                }
            }
        });

        Ok(feed)
    }
}

/// Produces one request per address, with `dst_port` left at zero.
#[derive(Clone)]
pub struct IpRequestGenerator {
    ips: Arc<dyn IpGenerator>,
}

impl IpRequestGenerator {
    pub fn new(ips: Arc<dyn IpGenerator>) -> Self {
        Self { ips }
    }
}

impl RequestGenerator for IpRequestGenerator {
    fn generate_requests(
        &self,
        cancel: &CancellationToken,
        range: &Range,
    ) -> GenerateResult<Feed<RequestItem>> {
        let addrs = self.ips.ips(cancel, range)?;

        let range = range.clone();
        let (emitter, feed) = Feed::channel(cancel);
        tokio::spawn(forward_addresses(addrs, emitter, range));

        Ok(feed)
    }
}

async fn forward_addresses(
    mut addrs: Feed<AddressItem>,
    emitter: Emitter<RequestItem>,
    range: Range,
) {
    let cancel = emitter.token().clone();
    while let Some(addr) = addrs.recv_or_cancel(&cancel).await {
        let item = addr.map(|addr| Request::from_range(&range, addr.ip(), 0));
        if !emitter.emit(item).await {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerateError, RecordError};
    use crate::generator::test_support::drain;
    use crate::generator::{FileIpGenerator, RangePortGenerator, Source, SubnetIpGenerator};
    use crate::types::{MacAddr, PortRange};
    use std::io::Cursor;
    use std::net::{IpAddr, Ipv4Addr};

    fn scan_range(subnet: Option<&str>, ports: Vec<PortRange>) -> Range {
        let mut range = Range::new()
            .with_src_ip(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 3)))
            .with_src_mac(MacAddr::new(0x1, 0x2, 0x3, 0x4, 0x5, 0x6))
            .with_ports(ports);
        range.dst_subnet = subnet.map(|s| s.parse().unwrap());
        range
    }

    fn request(range: &Range, last_octet: u8, port: u16) -> RequestItem {
        Ok(Request::from_range(
            range,
            IpAddr::V4(Ipv4Addr::new(192, 168, 0, last_octet)),
            port,
        ))
    }

    fn ip_port_generator() -> IpPortGenerator {
        IpPortGenerator::new(
            Arc::new(SubnetIpGenerator::new()),
            Arc::new(RangePortGenerator::new()),
        )
    }

    async fn generate(gen: &dyn RequestGenerator, range: &Range) -> GenerateResult<Vec<RequestItem>> {
        let feed = gen.generate_requests(&CancellationToken::new(), range)?;
        Ok(drain(feed).await)
    }

    #[tokio::test]
    async fn test_invalid_port_range() {
        let range = scan_range(Some("192.168.0.0/24"), vec![PortRange::new(5000, 2000)]);
        assert!(matches!(
            generate(&ip_port_generator(), &range).await,
            Err(GenerateError::InvalidPortRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_subnet() {
        let range = scan_range(None, vec![PortRange::new(22, 888)]);
        assert!(matches!(
            generate(&ip_port_generator(), &range).await,
            Err(GenerateError::NoSubnet)
        ));
    }

    #[tokio::test]
    async fn test_ports_validated_before_subnet() {
        let range = scan_range(None, vec![PortRange::new(5000, 2000)]);
        assert!(matches!(
            generate(&ip_port_generator(), &range).await,
            Err(GenerateError::InvalidPortRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_one_ip_two_ports() {
        let range = scan_range(Some("192.168.0.1/32"), vec![PortRange::new(888, 889)]);
        assert_eq!(
            generate(&ip_port_generator(), &range).await.unwrap(),
            vec![request(&range, 1, 888), request(&range, 1, 889)]
        );
    }

    #[tokio::test]
    async fn test_four_ips_one_port() {
        let range = scan_range(Some("192.168.0.1/30"), vec![PortRange::single(888)]);
        assert_eq!(
            generate(&ip_port_generator(), &range).await.unwrap(),
            vec![
                request(&range, 0, 888),
                request(&range, 1, 888),
                request(&range, 2, 888),
                request(&range, 3, 888),
            ]
        );
    }

    #[tokio::test]
    async fn test_port_major_order() {
        let range = scan_range(Some("192.168.0.1/31"), vec![PortRange::new(888, 889)]);
        assert_eq!(
            generate(&ip_port_generator(), &range).await.unwrap(),
            vec![
                request(&range, 0, 888),
                request(&range, 1, 888),
                request(&range, 0, 889),
                request(&range, 1, 889),
            ]
        );
    }

    #[tokio::test]
    async fn test_upper_port_bound() {
        let range = scan_range(Some("192.168.0.1/32"), vec![PortRange::single(65535)]);
        assert_eq!(
            generate(&ip_port_generator(), &range).await.unwrap(),
            vec![request(&range, 1, 65535)]
        );
    }

    #[tokio::test]
    async fn test_generator_is_reusable() {
        let gen = ip_port_generator();
        let range = scan_range(Some("192.168.0.1/31"), vec![PortRange::single(22)]);
        let first = generate(&gen, &range).await.unwrap();
        let second = generate(&gen, &range).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn test_record_errors_pass_through() {
        let gen = IpPortGenerator::new(
            Arc::new(FileIpGenerator::new(|| {
                Ok(Box::new(Cursor::new(b"{\"ip\":\"10.0.0.1\"}\n{\"ip\":\"10".to_vec())) as Source)
            })),
            Arc::new(RangePortGenerator::new()),
        );
        let range = Range::new().with_ports(vec![PortRange::new(80, 81)]);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(
            generate(&gen, &range).await.unwrap(),
            vec![
                Ok(Request::new(ip, 80)),
                Err(RecordError::Json),
                Ok(Request::new(ip, 81)),
                Err(RecordError::Json),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_stream_closes() {
        let cancel = CancellationToken::new();
        let range = scan_range(Some("10.0.0.0/16"), vec![PortRange::new(1, 1024)]);
        let feed = ip_port_generator().generate_requests(&cancel, &range).unwrap();
        cancel.cancel();
        let rest = drain(feed).await;
        assert!(rest.len() <= 1);
    }

    #[tokio::test]
    async fn test_ip_requests() {
        let gen = IpRequestGenerator::new(Arc::new(SubnetIpGenerator::new()));

        let range = scan_range(None, vec![]);
        assert!(matches!(
            generate(&gen, &range).await,
            Err(GenerateError::NoSubnet)
        ));

        let range = scan_range(Some("192.168.0.1/32"), vec![]);
        assert_eq!(
            generate(&gen, &range).await.unwrap(),
            vec![request(&range, 1, 0)]
        );

        let range = scan_range(Some("192.168.0.1/30"), vec![]);
        assert_eq!(
            generate(&gen, &range).await.unwrap(),
            vec![
                request(&range, 0, 0),
                request(&range, 1, 0),
                request(&range, 2, 0),
                request(&range, 3, 0),
            ]
        );
    }
}
