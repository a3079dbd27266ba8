use serde::{Serialize, Serializer};

use crate::constants::{lookup_result_flags, Protocol, ServerState};
use crate::dbus::server::{AddressReply, HostNameReply, ServiceReply};
use crate::txt::txt_array_to_string_array;

/// Compare two DNS names the way the daemon does: case-insensitive, with an
/// optional trailing dot.
pub fn domain_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

fn serialize_txt<S: Serializer>(txt: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    txt_array_to_string_array(txt).serialize(serializer)
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ServerInfo {
    pub version: String,
    pub api_version: u32,
    pub host_name: String,
    pub domain_name: String,
    pub host_name_fqdn: String,
    pub state: ServerState,
    pub local_service_cookie: u32,
    pub nss_support: bool,
}

/// A service announced by a service browser
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ServiceItem {
    pub interface: i32,
    pub protocol: Protocol,
    pub name: String,
    pub service_type: String,
    pub domain: String,
    pub flags: u32,
}

impl ServiceItem {
    pub fn is_local(&self) -> bool {
        self.flags & lookup_result_flags::LOCAL != 0
    }

    /// Identity used for de-duplication; flags are ignored.
    pub fn same_service(&self, other: &ServiceItem) -> bool {
        self.interface == other.interface
            && self.protocol == other.protocol
            && self.name.eq_ignore_ascii_case(&other.name)
            && domain_equal(&self.service_type, &other.service_type)
            && domain_equal(&self.domain, &other.domain)
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ServiceTypeItem {
    pub interface: i32,
    pub protocol: Protocol,
    pub service_type: String,
    pub domain: String,
    pub flags: u32,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DomainItem {
    pub interface: i32,
    pub protocol: Protocol,
    pub domain: String,
    pub flags: u32,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct HostNameResolution {
    pub interface: i32,
    pub protocol: Protocol,
    pub name: String,
    pub address_protocol: Protocol,
    pub address: String,
    pub flags: u32,
}

impl From<HostNameReply> for HostNameResolution {
    fn from(reply: HostNameReply) -> Self {
        let (interface, protocol, name, aprotocol, address, flags) = reply;
        Self {
            interface,
            protocol: Protocol::from_raw_lossy(protocol),
            name,
            address_protocol: Protocol::from_raw_lossy(aprotocol),
            address,
            flags,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AddressResolution {
    pub interface: i32,
    pub protocol: Protocol,
    pub address_protocol: Protocol,
    pub address: String,
    pub name: String,
    pub flags: u32,
}

impl From<AddressReply> for AddressResolution {
    fn from(reply: AddressReply) -> Self {
        let (interface, protocol, aprotocol, address, name, flags) = reply;
        Self {
            interface,
            protocol: Protocol::from_raw_lossy(protocol),
            address_protocol: Protocol::from_raw_lossy(aprotocol),
            address,
            name,
            flags,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ResolvedService {
    pub interface: i32,
    pub protocol: Protocol,
    pub name: String,
    pub service_type: String,
    pub domain: String,
    pub host_name: String,
    pub address_protocol: Protocol,
    pub address: String,
    pub port: u16,
    #[serde(serialize_with = "serialize_txt")]
    pub txt: Vec<Vec<u8>>,
    pub flags: u32,
}

impl ResolvedService {
    /// The browser item this resolution answers.
    pub fn item(&self) -> ServiceItem {
        ServiceItem {
            interface: self.interface,
            protocol: self.protocol,
            name: self.name.clone(),
            service_type: self.service_type.clone(),
            domain: self.domain.clone(),
            flags: self.flags,
        }
    }
}

impl From<ServiceReply> for ResolvedService {
    fn from(reply: ServiceReply) -> Self {
        let (
            interface,
            protocol,
            name,
            service_type,
            domain,
            host_name,
            aprotocol,
            address,
            port,
            txt,
            flags,
        ) = reply;
        Self {
            interface,
            protocol: Protocol::from_raw_lossy(protocol),
            name,
            service_type,
            domain,
            host_name,
            address_protocol: Protocol::from_raw_lossy(aprotocol),
            address,
            port,
            txt,
            flags,
        }
    }
}
