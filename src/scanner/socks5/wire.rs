//! SOCKS5 method negotiation framing (RFC 1928, section 3).
//!
//! ```text
//! request:  | VER | NMETHODS | METHODS  |
//!           |  1  |    1     | 1 to 255 |
//! reply:    | VER | METHOD |
//!           |  1  |   1    |
//! ```

use crate::error::ScanError;

/// Protocol version byte.
pub const SOCKS_VERSION: u8 = 5;

/// NO AUTHENTICATION REQUIRED.
pub const NO_AUTH: u8 = 0x00;
/// GSSAPI.
pub const GSSAPI: u8 = 0x01;
/// USERNAME/PASSWORD.
pub const USER_PASS: u8 = 0x02;
/// NO ACCEPTABLE METHODS.
pub const NO_ACCEPTABLE: u8 = 0xFF;

/// Client greeting offering a list of authentication methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRequest {
    pub version: u8,
    pub methods: Vec<u8>,
}

impl MethodRequest {
    pub fn new(version: u8, methods: impl Into<Vec<u8>>) -> Self {
        Self {
            version,
            methods: methods.into(),
        }
    }

    /// Serialize the request.
    ///
    /// Fails when the method count does not fit the one-byte NMETHODS field
    /// or is zero.
    pub fn encode(&self) -> Result<Vec<u8>, ScanError> {
        let count = u8::try_from(self.methods.len())
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                ScanError::Encode(format!("method count {} not in 1..=255", self.methods.len()))
            })?;

        let mut buf = Vec::with_capacity(2 + self.methods.len());
        buf.push(self.version);
        buf.push(count);
        buf.extend_from_slice(&self.methods);
        Ok(buf)
    }
}

/// Server's method selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodReply {
    pub version: u8,
    pub method: u8,
}

impl MethodReply {
    /// Size of the reply on the wire.
    pub const LEN: usize = 2;

    pub const fn decode(buf: [u8; Self::LEN]) -> Self {
        Self {
            version: buf[0],
            method: buf[1],
        }
    }

    /// Whether this is a SOCKS5 reply selecting `method`.
    pub fn selects(&self, method: u8) -> bool {
        self.version == SOCKS_VERSION && self.method == method
    }
}
