//! Port range types and parsing.
//!
//! A `PortRange` is plain data: inverted ranges are representable so that
//! generators can reject the whole request when they see one.

use crate::error::GenerateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An inclusive range of ports, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    /// Create a port range. No validation is performed here.
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Create a range containing a single port.
    pub const fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// Check the `start <= end` invariant.
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.start > self.end {
            Err(GenerateError::InvalidPortRange {
                start: self.start,
                end: self.end,
            })
        } else {
            Ok(())
        }
    }

    /// Iterate over all ports in ascending order.
    ///
    /// `RangeInclusive` tracks exhaustion separately from the bound, so
    /// `65535..=65535` yields once and stops.
    pub fn iter(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }

    /// Parse a comma-separated list of ports and ranges.
    ///
    /// Supports formats like:
    /// - Single port: "80"
    /// - Comma-separated: "80,443,8080"
    /// - Range: "1-1000"
    /// - Mixed: "22,80,443,8000-9000"
    ///
    /// Declaration order is kept; nothing is sorted or merged.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, GenerateError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GenerateError::NoPorts);
        }

        s.split(',')
            .map(|part| {
                let range: Self = part.parse()?;
                range.validate()?;
                Ok(range)
            })
            .collect()
    }
}

impl FromStr for PortRange {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let part = s.trim();
        let parse_port = |p: &str| {
            p.trim()
                .parse::<u16>()
                .map_err(|_| GenerateError::InvalidPortSpec(p.to_string()))
        };

        match part.split_once('-') {
            Some((start, end)) => Ok(Self::new(parse_port(start)?, parse_port(end)?)),
            None => Ok(Self::single(parse_port(part)?)),
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
