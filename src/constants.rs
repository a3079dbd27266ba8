//! Protocol constants shared with the Avahi daemon
//!
//! Numeric values match `avahi-common/defs.h` of the daemon we talk to over
//! D-Bus; they travel on the wire as `i32`/`u32`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AvahiError;

/// Any network interface.
pub const IF_UNSPEC: i32 = -1;

/// D-Bus names published by the daemon
pub mod dbus {
    /// Well-known bus name
    pub const NAME: &str = "org.freedesktop.Avahi";

    pub const PATH_SERVER: &str = "/";

    pub const INTERFACE_SERVER: &str = "org.freedesktop.Avahi.Server";
    pub const INTERFACE_SERVER2: &str = "org.freedesktop.Avahi.Server2";
    pub const INTERFACE_ENTRY_GROUP: &str = "org.freedesktop.Avahi.EntryGroup";
    pub const INTERFACE_DOMAIN_BROWSER: &str = "org.freedesktop.Avahi.DomainBrowser";
    pub const INTERFACE_SERVICE_TYPE_BROWSER: &str = "org.freedesktop.Avahi.ServiceTypeBrowser";
    pub const INTERFACE_SERVICE_BROWSER: &str = "org.freedesktop.Avahi.ServiceBrowser";

    /// Prefix of every error name the daemon replies with
    pub const ERROR_PREFIX: &str = "org.freedesktop.Avahi.";
}

/// Flags accepted by browser and resolver calls
pub mod lookup_flags {
    pub const NONE: u32 = 0;
    pub const USE_WIDE_AREA: u32 = 1;
    pub const USE_MULTICAST: u32 = 2;
    pub const NO_TXT: u32 = 4;
    pub const NO_ADDRESS: u32 = 8;
}

/// Flags reported with browser items and resolver results
pub mod lookup_result_flags {
    pub const CACHED: u32 = 1;
    pub const WIDE_AREA: u32 = 2;
    pub const MULTICAST: u32 = 4;
    /// The item lives on this host
    pub const LOCAL: u32 = 8;
    /// The item was registered by this very client
    pub const OUR_OWN: u32 = 16;
    pub const STATIC: u32 = 32;
}

/// Flags accepted by the entry group `Add*` calls
pub mod publish_flags {
    pub const NONE: u32 = 0;
    pub const UNIQUE: u32 = 1;
    pub const NO_PROBE: u32 = 2;
    pub const NO_ANNOUNCE: u32 = 4;
    pub const ALLOW_MULTIPLE: u32 = 8;
    pub const NO_REVERSE: u32 = 16;
    pub const NO_COOKIE: u32 = 32;
    pub const UPDATE: u32 = 64;
    pub const USE_WIDE_AREA: u32 = 128;
    pub const USE_MULTICAST: u32 = 256;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    Invalid = 0,
    Registering = 1,
    Running = 2,
    Collision = 3,
    Failure = 4,
}

impl TryFrom<i32> for ServerState {
    type Error = AvahiError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ServerState::Invalid),
            1 => Ok(ServerState::Registering),
            2 => Ok(ServerState::Running),
            3 => Ok(ServerState::Collision),
            4 => Ok(ServerState::Failure),
            _ => Err(AvahiError::InvalidValue {
                kind: "server state",
                value,
            }),
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerState::Invalid => write!(f, "invalid"),
            ServerState::Registering => write!(f, "registering"),
            ServerState::Running => write!(f, "running"),
            ServerState::Collision => write!(f, "collision"),
            ServerState::Failure => write!(f, "failure"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryGroupState {
    Uncommited = 0,
    Registering = 1,
    Established = 2,
    Collision = 3,
    Failure = 4,
}

impl TryFrom<i32> for EntryGroupState {
    type Error = AvahiError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EntryGroupState::Uncommited),
            1 => Ok(EntryGroupState::Registering),
            2 => Ok(EntryGroupState::Established),
            3 => Ok(EntryGroupState::Collision),
            4 => Ok(EntryGroupState::Failure),
            _ => Err(AvahiError::InvalidValue {
                kind: "entry group state",
                value,
            }),
        }
    }
}

impl fmt::Display for EntryGroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryGroupState::Uncommited => write!(f, "uncommited"),
            EntryGroupState::Registering => write!(f, "registering"),
            EntryGroupState::Established => write!(f, "established"),
            EntryGroupState::Collision => write!(f, "collision"),
            EntryGroupState::Failure => write!(f, "failure"),
        }
    }
}

/// Which kind of domains a domain browser enumerates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DomainBrowserType {
    Browse = 0,
    BrowseDefault = 1,
    Register = 2,
    RegisterDefault = 3,
    BrowseLegacy = 4,
}

impl DomainBrowserType {
    pub fn raw(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for DomainBrowserType {
    type Error = AvahiError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DomainBrowserType::Browse),
            1 => Ok(DomainBrowserType::BrowseDefault),
            2 => Ok(DomainBrowserType::Register),
            3 => Ok(DomainBrowserType::RegisterDefault),
            4 => Ok(DomainBrowserType::BrowseLegacy),
            _ => Err(AvahiError::InvalidValue {
                kind: "domain browser type",
                value,
            }),
        }
    }
}

/// Address family selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Inet = 0,
    Inet6 = 1,
    Unspec = -1,
}

impl Protocol {
    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Like `TryFrom`, but anything unknown is treated as unspecified.
    pub fn from_raw_lossy(value: i32) -> Self {
        Protocol::try_from(value).unwrap_or(Protocol::Unspec)
    }
}

impl TryFrom<i32> for Protocol {
    type Error = AvahiError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Protocol::Inet),
            1 => Ok(Protocol::Inet6),
            -1 => Ok(Protocol::Unspec),
            _ => Err(AvahiError::InvalidValue {
                kind: "protocol",
                value,
            }),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Inet => write!(f, "IPv4"),
            Protocol::Inet6 => write!(f, "IPv6"),
            Protocol::Unspec => write!(f, "n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_names_share_bus_name_prefix() {
        for iface in [
            dbus::INTERFACE_SERVER,
            dbus::INTERFACE_SERVER2,
            dbus::INTERFACE_ENTRY_GROUP,
            dbus::INTERFACE_DOMAIN_BROWSER,
            dbus::INTERFACE_SERVICE_TYPE_BROWSER,
            dbus::INTERFACE_SERVICE_BROWSER,
        ] {
            assert!(iface.starts_with(dbus::NAME));
            assert!(iface.starts_with(dbus::ERROR_PREFIX));
        }
    }

    #[test]
    fn test_server_state_from_raw() {
        assert_eq!(ServerState::try_from(2).unwrap(), ServerState::Running);
        assert_eq!(ServerState::try_from(0).unwrap(), ServerState::Invalid);
        assert!(ServerState::try_from(5).is_err());
        assert!(ServerState::try_from(-1).is_err());
    }

    #[test]
    fn test_entry_group_state_roundtrip() {
        for raw in 0..5 {
            let state = EntryGroupState::try_from(raw).unwrap();
            assert_eq!(state as i32, raw);
        }
        assert!(EntryGroupState::try_from(42).is_err());
    }

    #[test]
    fn test_domain_browser_type_values() {
        assert_eq!(DomainBrowserType::Browse.raw(), 0);
        assert_eq!(DomainBrowserType::RegisterDefault.raw(), 3);
        assert_eq!(
            DomainBrowserType::try_from(4).unwrap(),
            DomainBrowserType::BrowseLegacy
        );
    }

    #[test]
    fn test_protocol_display_and_lossy() {
        assert_eq!(Protocol::Inet.to_string(), "IPv4");
        assert_eq!(Protocol::Inet6.to_string(), "IPv6");
        assert_eq!(Protocol::from_raw_lossy(7), Protocol::Unspec);
        assert_eq!(Protocol::Unspec.raw(), IF_UNSPEC);
    }

    #[test]
    fn test_invalid_value_message() {
        let err = ServerState::try_from(9).unwrap_err();
        assert_eq!(err.to_string(), "Invalid server state value: 9");
    }
}
