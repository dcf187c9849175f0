//! Core value types shared by generators and scanners.
//!
//! All of these are plain values: once a generator yields one, nothing
//! else holds a mutable reference to it.

mod address;
mod port;
mod request;

pub use address::AddressValue;
pub use pnet::util::MacAddr;
pub use port::PortRange;
pub use request::{Range, Request};
