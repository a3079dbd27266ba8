//! Client side tooling for the Avahi mDNS/DNS-SD daemon: protocol
//! constants, TXT record helpers, typed D-Bus access, browse/publish
//! sessions, and the C literal embedder used at build time.

pub mod browse;
pub mod client;
pub mod config;
pub mod constants;
pub mod dbus;
pub mod embed;
pub mod error;
pub mod logging;
pub mod output;
pub mod publish;
pub mod service_types;
pub mod shutdown;
pub mod txt;
pub mod types;

pub use client::AvahiClient;
pub use error::{AvahiError, EmbedError, Result};
