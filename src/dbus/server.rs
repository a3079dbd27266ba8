//! # D-Bus interface proxies for: `org.freedesktop.Avahi.Server` and `org.freedesktop.Avahi.Server2`

use zbus::proxy;
use zbus::zvariant::OwnedObjectPath;

/// Reply of `ResolveHostName`: interface, protocol, name, aprotocol, address, flags
pub type HostNameReply = (i32, i32, String, i32, String, u32);

/// Reply of `ResolveAddress`: interface, protocol, aprotocol, address, name, flags
pub type AddressReply = (i32, i32, i32, String, String, u32);

/// Reply of `ResolveService`: interface, protocol, name, type, domain, host,
/// aprotocol, address, port, txt, flags
pub type ServiceReply = (
    i32,
    i32,
    String,
    String,
    String,
    String,
    i32,
    String,
    u16,
    Vec<Vec<u8>>,
    u32,
);

#[proxy(
    interface = "org.freedesktop.Avahi.Server",
    default_service = "org.freedesktop.Avahi",
    default_path = "/"
)]
pub trait Server {
    /// GetVersionString method
    fn get_version_string(&self) -> zbus::Result<String>;

    /// GetAPIVersion method
    #[zbus(name = "GetAPIVersion")]
    fn get_api_version(&self) -> zbus::Result<u32>;

    /// GetHostName method
    fn get_host_name(&self) -> zbus::Result<String>;

    /// SetHostName method
    fn set_host_name(&self, name: &str) -> zbus::Result<()>;

    /// GetHostNameFqdn method
    fn get_host_name_fqdn(&self) -> zbus::Result<String>;

    /// GetDomainName method
    fn get_domain_name(&self) -> zbus::Result<String>;

    /// IsNSSSupportAvailable method
    #[zbus(name = "IsNSSSupportAvailable")]
    fn is_nss_support_available(&self) -> zbus::Result<bool>;

    /// GetState method
    fn get_state(&self) -> zbus::Result<i32>;

    /// GetLocalServiceCookie method
    fn get_local_service_cookie(&self) -> zbus::Result<u32>;

    /// GetAlternativeHostName method
    fn get_alternative_host_name(&self, name: &str) -> zbus::Result<String>;

    /// GetAlternativeServiceName method
    fn get_alternative_service_name(&self, name: &str) -> zbus::Result<String>;

    /// GetNetworkInterfaceNameByIndex method
    fn get_network_interface_name_by_index(&self, index: i32) -> zbus::Result<String>;

    /// GetNetworkInterfaceIndexByName method
    fn get_network_interface_index_by_name(&self, name: &str) -> zbus::Result<i32>;

    /// ResolveHostName method
    fn resolve_host_name(
        &self,
        interface: i32,
        protocol: i32,
        name: &str,
        aprotocol: i32,
        flags: u32,
    ) -> zbus::Result<HostNameReply>;

    /// ResolveAddress method
    fn resolve_address(
        &self,
        interface: i32,
        protocol: i32,
        address: &str,
        flags: u32,
    ) -> zbus::Result<AddressReply>;

    /// ResolveService method
    #[allow(clippy::too_many_arguments)]
    fn resolve_service(
        &self,
        interface: i32,
        protocol: i32,
        name: &str,
        service_type: &str,
        domain: &str,
        aprotocol: i32,
        flags: u32,
    ) -> zbus::Result<ServiceReply>;

    /// EntryGroupNew method
    fn entry_group_new(&self) -> zbus::Result<OwnedObjectPath>;
}

#[proxy(
    interface = "org.freedesktop.Avahi.Server2",
    default_service = "org.freedesktop.Avahi",
    default_path = "/"
)]
pub trait Server2 {
    /// DomainBrowserPrepare method
    fn domain_browser_prepare(
        &self,
        interface: i32,
        protocol: i32,
        domain: &str,
        btype: i32,
        flags: u32,
    ) -> zbus::Result<OwnedObjectPath>;

    /// ServiceTypeBrowserPrepare method
    fn service_type_browser_prepare(
        &self,
        interface: i32,
        protocol: i32,
        domain: &str,
        flags: u32,
    ) -> zbus::Result<OwnedObjectPath>;

    /// ServiceBrowserPrepare method
    fn service_browser_prepare(
        &self,
        interface: i32,
        protocol: i32,
        service_type: &str,
        domain: &str,
        flags: u32,
    ) -> zbus::Result<OwnedObjectPath>;
}
