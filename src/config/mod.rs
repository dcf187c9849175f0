//! Configuration management for trawl.
//!
//! Provides XDG-compliant settings storage.

mod settings;

pub use settings::{AppSettings, OutputFormat, Paths};
