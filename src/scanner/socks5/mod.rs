//! SOCKS5 open-proxy scanner.
//!
//! Connects to the target, offers the NO AUTHENTICATION method and reports
//! the target when the server accepts it.
//!
//! # How It Works
//!
//! 1. Dial the target with a bounded connect timeout
//! 2. Set `SO_LINGER` to zero so closing sends RST and frees the socket
//!    and ephemeral port immediately
//! 3. Send the method request; every read and write gets its own deadline
//! 4. Read the two-byte method selection and classify it
//!
//! Cancellation is raced against every step. When it fires the connection
//! is dropped at once (with RST) instead of waiting out a deadline.

pub mod wire;

use crate::error::ScanError;
use crate::scanner::{ScanResult, Scanner};
use crate::types::Request;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use socket2::SockRef;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use wire::{MethodReply, MethodRequest, NO_AUTH, SOCKS_VERSION, USER_PASS};

/// Scan type tag carried by results.
pub const SCAN_TYPE: &str = "socks";

/// Default connect timeout.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(2);

/// Default per-operation read/write timeout.
pub const DEFAULT_DATA_TIMEOUT: Duration = Duration::from_secs(2);

/// A SOCKS5 server found at `ip:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Socks5Result {
    #[serde(rename = "scan")]
    pub scan_type: String,
    pub version: u8,
    pub ip: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "is_false")]
    pub auth: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Socks5Result {
    pub fn new(request: &Request, auth: bool) -> Self {
        Self {
            scan_type: SCAN_TYPE.to_string(),
            version: SOCKS_VERSION,
            ip: request.dst_ip.to_string(),
            port: request.dst_port,
            auth,
        }
    }

    /// Deduplication key, `ip:port`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl fmt::Display for Socks5Result {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<20} {:<5}", self.ip, self.port)
    }
}

/// SOCKS5 method negotiation scanner.
///
/// Holds only configuration, so one instance can serve any number of
/// concurrent scans.
#[derive(Debug, Clone)]
pub struct Socks5Scanner {
    dial_timeout: Duration,
    data_timeout: Duration,
    detect_auth: bool,
}

impl Default for Socks5Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Socks5Scanner {
    /// Create a scanner with default timeouts and auth detection off.
    pub fn new() -> Self {
        Self {
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            data_timeout: DEFAULT_DATA_TIMEOUT,
            detect_auth: false,
        }
    }

    /// Set the connect timeout.
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Set the per-read/per-write timeout.
    pub fn with_data_timeout(mut self, timeout: Duration) -> Self {
        self.data_timeout = timeout;
        self
    }

    /// Also offer USERNAME/PASSWORD and report servers that select it
    /// with `auth: true`.
    pub fn with_auth_detection(mut self, enabled: bool) -> Self {
        self.detect_auth = enabled;
        self
    }

    fn method_request(&self) -> MethodRequest {
        if self.detect_auth {
            MethodRequest::new(SOCKS_VERSION, [NO_AUTH, USER_PASS])
        } else {
            MethodRequest::new(SOCKS_VERSION, [NO_AUTH])
        }
    }

    fn classify(&self, reply: MethodReply) -> Option<bool> {
        if reply.selects(NO_AUTH) {
            Some(false)
        } else if self.detect_auth && reply.selects(USER_PASS) {
            Some(true)
        } else {
            None
        }
    }

    async fn dial(&self, cancel: &CancellationToken, addr: SocketAddr) -> Result<TcpStream, ScanError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            conn = timeout(self.dial_timeout, TcpStream::connect(addr)) => match conn {
                Ok(Ok(stream)) => Ok(stream),
                Ok(Err(source)) => Err(ScanError::Connect { addr, source }),
                Err(_) => Err(ScanError::Timeout("dial")),
            },
        }
    }
}

#[async_trait]
impl Scanner for Socks5Scanner {
    fn scan_type(&self) -> &'static str {
        SCAN_TYPE
    }

    async fn scan(
        &self,
        cancel: &CancellationToken,
        request: &Request,
    ) -> Result<Option<ScanResult>, ScanError> {
        let addr = SocketAddr::new(request.dst_ip, request.dst_port);
        let mut stream = self.dial(cancel, addr).await?;
        // discard unsent data and send RST on close
        SockRef::from(&stream).set_linger(Some(Duration::ZERO))?;

        let mut conn = SocksConn {
            stream: &mut stream,
            timeout: self.data_timeout,
            cancel,
        };

        conn.write_all(&self.method_request().encode()?).await?;

        let mut buf = [0u8; MethodReply::LEN];
        match conn.read_exact(&mut buf).await {
            Ok(()) => {}
            Err(ScanError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                trace!(%addr, "connection closed before method reply");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        let reply = MethodReply::decode(buf);
        trace!(%addr, version = reply.version, method = reply.method, "method reply");

        Ok(self
            .classify(reply)
            .map(|auth| ScanResult::Socks5(Socks5Result::new(request, auth))))
    }
}

/// A connection whose reads and writes each get a fresh deadline and
/// give way to cancellation.
struct SocksConn<'a> {
    stream: &'a mut TcpStream,
    timeout: Duration,
    cancel: &'a CancellationToken,
}

impl SocksConn<'_> {
    async fn write_all(&mut self, buf: &[u8]) -> Result<(), ScanError> {
        let Self {
            stream,
            timeout: limit,
            cancel,
        } = self;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            res = timeout(*limit, stream.write_all(buf)) => match res {
                Ok(res) => res.map_err(ScanError::Io),
                Err(_) => Err(ScanError::Timeout("write")),
            },
        }
    }

    /// Fill `buf`, restarting the deadline on every partial read.
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ScanError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]).await? {
                0 => return Err(ScanError::Io(io::ErrorKind::UnexpectedEof.into())),
                n => filled += n,
            }
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ScanError> {
        let Self {
            stream,
            timeout: limit,
            cancel,
        } = self;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            res = timeout(*limit, stream.read(buf)) => match res {
                Ok(res) => res.map_err(ScanError::Io),
                Err(_) => Err(ScanError::Timeout("read")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::net::TcpListener;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    /// What the test server does after reading the greeting.
    #[derive(Clone, Copy)]
    enum Behavior {
        Reply([u8; 2]),
        /// Send each reply byte separately, pausing before each one.
        Trickle([u8; 2], Duration),
        Close,
        Stall,
    }

    /// Serve `behavior` to every connection; returns the listening port.
    async fn serve(behavior: Behavior) -> u16 {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut greeting = [0u8; 3];
                    if stream.read_exact(&mut greeting).await.is_err() {
                        return;
                    }
                    match behavior {
                        Behavior::Reply(reply) => {
                            let _ = stream.write_all(&reply).await;
                            let mut rest = Vec::new();
                            let _ = stream.read_to_end(&mut rest).await;
                        }
                        Behavior::Trickle(reply, pause) => {
                            for byte in reply {
                                tokio::time::sleep(pause).await;
                                let _ = stream.write_all(&[byte]).await;
                            }
                            let mut rest = Vec::new();
                            let _ = stream.read_to_end(&mut rest).await;
                        }
                        Behavior::Close => drop(stream),
                        Behavior::Stall => {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                        }
                    }
                });
            }
        });
        port
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_open_proxy_found() {
        let port = serve(Behavior::Reply([0x05, 0x00])).await;
        let result = Socks5Scanner::new()
            .scan(&CancellationToken::new(), &Request::new(LOCALHOST, port))
            .await
            .unwrap();

        let expected = ScanResult::Socks5(Socks5Result {
            scan_type: "socks".to_string(),
            version: 5,
            ip: "127.0.0.1".to_string(),
            port,
            auth: false,
        });
        assert_eq!(result, Some(expected));
    }

    #[tokio::test]
    async fn test_other_method_is_no_result() {
        let port = serve(Behavior::Reply([0x05, wire::NO_ACCEPTABLE])).await;
        let result = Socks5Scanner::new()
            .scan(&CancellationToken::new(), &Request::new(LOCALHOST, port))
            .await
            .unwrap();
        assert_eq!(result, None);

        let port = serve(Behavior::Reply([0x04, 0x00])).await;
        let result = Socks5Scanner::new()
            .scan(&CancellationToken::new(), &Request::new(LOCALHOST, port))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_early_close_is_no_result() {
        let port = serve(Behavior::Close).await;
        let result = Socks5Scanner::new()
            .scan(&CancellationToken::new(), &Request::new(LOCALHOST, port))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_refused_is_error() {
        // the listener is dropped when closed_port returns
        let port = closed_port().await;
        let result = Socks5Scanner::new()
            .scan(&CancellationToken::new(), &Request::new(LOCALHOST, port))
            .await;
        assert!(matches!(result, Err(ScanError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_read_deadline_restarts_per_segment() {
        // each byte arrives inside the deadline, the whole reply does not
        let port = serve(Behavior::Trickle([0x05, 0x00], Duration::from_millis(300))).await;
        let result = Socks5Scanner::new()
            .with_data_timeout(Duration::from_millis(500))
            .scan(&CancellationToken::new(), &Request::new(LOCALHOST, port))
            .await
            .unwrap();
        assert!(result.is_some());

        let port = serve(Behavior::Trickle([0x05, 0x00], Duration::from_millis(400))).await;
        let result = Socks5Scanner::new()
            .with_data_timeout(Duration::from_millis(150))
            .scan(&CancellationToken::new(), &Request::new(LOCALHOST, port))
            .await;
        assert!(matches!(result, Err(ScanError::Timeout("read"))));
    }

    #[tokio::test]
    async fn test_data_timeout() {
        let port = serve(Behavior::Stall).await;
        let result = Socks5Scanner::new()
            .with_data_timeout(Duration::from_millis(100))
            .scan(&CancellationToken::new(), &Request::new(LOCALHOST, port))
            .await;
        assert!(matches!(result, Err(ScanError::Timeout("read"))));
    }

    #[tokio::test]
    async fn test_cancel_beats_data_timeout() {
        let port = serve(Behavior::Stall).await;
        let scanner = Socks5Scanner::new().with_data_timeout(Duration::from_secs(30));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(3),
            scanner.scan(&cancel, &Request::new(LOCALHOST, port)),
        )
        .await
        .expect("scan ignored cancellation");
        assert!(matches!(result, Err(ScanError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_before_dial() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = Socks5Scanner::new()
            .scan(&cancel, &Request::new(LOCALHOST, 1080))
            .await;
        assert!(matches!(result, Err(ScanError::Cancelled)));
    }

    #[tokio::test]
    async fn test_auth_detection() {
        let port = serve(Behavior::Reply([0x05, USER_PASS])).await;
        let request = Request::new(LOCALHOST, port);

        let plain = Socks5Scanner::new();
        assert_eq!(
            plain.scan(&CancellationToken::new(), &request).await.unwrap(),
            None
        );

        let detecting = Socks5Scanner::new().with_auth_detection(true);
        let result = detecting
            .scan(&CancellationToken::new(), &request)
            .await
            .unwrap()
            .unwrap();
        let ScanResult::Socks5(found) = result;
        assert!(found.auth);
    }

    #[tokio::test]
    async fn test_concurrent_scans() {
        let port = serve(Behavior::Reply([0x05, 0x00])).await;
        let scanner = Socks5Scanner::new();
        let cancel = CancellationToken::new();
        let request = Request::new(LOCALHOST, port);

        let scans = (0..16).map(|_| scanner.scan(&cancel, &request));
        let results = futures::future::join_all(scans).await;
        assert!(results
            .iter()
            .all(|r| matches!(r, Ok(Some(ScanResult::Socks5(_))))));
    }

    #[test]
    fn test_result_serialization() {
        let request = Request::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 1080);

        let open = Socks5Result::new(&request, false);
        assert_eq!(
            serde_json::to_string(&open).unwrap(),
            r#"{"scan":"socks","version":5,"ip":"10.0.0.1","port":1080}"#
        );

        let auth = Socks5Result::new(&request, true);
        assert_eq!(
            serde_json::to_string(&auth).unwrap(),
            r#"{"scan":"socks","version":5,"ip":"10.0.0.1","port":1080,"auth":true}"#
        );
    }

    #[test]
    fn test_result_id_and_display() {
        let request = Request::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 1080);
        let result = Socks5Result::new(&request, false);
        assert_eq!(result.id(), "10.0.0.1:1080");
        assert_eq!(result.to_string(), format!("{:<20} {:<5}", "10.0.0.1", 1080));
        assert_eq!(result.to_string().len(), 26);
    }
}
