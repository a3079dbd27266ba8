//! Connection to the Avahi daemon and typed wrappers around its server
//! object.

use std::collections::HashMap;

use parking_lot::Mutex;
use zbus::proxy::CacheProperties;
use zbus::Connection;

use crate::config::{BusConfig, BusKind};
use crate::constants::{ServerState, IF_UNSPEC};
use crate::dbus::{
    DomainBrowserProxy, EntryGroupProxy, Server2Proxy, ServerProxy, ServiceBrowserProxy,
    ServiceTypeBrowserProxy,
};
use crate::error::Result;
use crate::types::{AddressResolution, HostNameResolution, ResolvedService, ServerInfo};

pub struct AvahiClient {
    connection: Connection,
    server: ServerProxy<'static>,
    server2: Server2Proxy<'static>,
    /// Interface index -> name, filled lazily
    interface_names: Mutex<HashMap<i32, String>>,
}

impl AvahiClient {
    pub async fn connect(bus: &BusConfig) -> Result<Self> {
        let connection = match (&bus.address, bus.kind) {
            (Some(address), _) => {
                zbus::connection::Builder::address(address.as_str())?
                    .build()
                    .await?
            }
            (None, BusKind::System) => Connection::system().await?,
            (None, BusKind::Session) => Connection::session().await?,
        };
        tracing::debug!(unique_name = ?connection.unique_name(), "Connected to D-Bus");
        Self::with_connection(connection).await
    }

    pub async fn with_connection(connection: Connection) -> Result<Self> {
        let server = ServerProxy::builder(&connection)
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        let server2 = Server2Proxy::builder(&connection)
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(Self {
            connection,
            server,
            server2,
            interface_names: Mutex::new(HashMap::new()),
        })
    }

    pub fn server(&self) -> &ServerProxy<'static> {
        &self.server
    }

    pub async fn server_info(&self) -> Result<ServerInfo> {
        Ok(ServerInfo {
            version: self.server.get_version_string().await?,
            api_version: self.server.get_api_version().await?,
            host_name: self.host_name().await?,
            domain_name: self.domain_name().await?,
            host_name_fqdn: self.host_name_fqdn().await?,
            state: self.state().await?,
            local_service_cookie: self.server.get_local_service_cookie().await?,
            nss_support: self.server.is_nss_support_available().await?,
        })
    }

    pub async fn version(&self) -> Result<String> {
        Ok(self.server.get_version_string().await?)
    }

    pub async fn host_name(&self) -> Result<String> {
        Ok(self.server.get_host_name().await?)
    }

    pub async fn domain_name(&self) -> Result<String> {
        Ok(self.server.get_domain_name().await?)
    }

    pub async fn host_name_fqdn(&self) -> Result<String> {
        Ok(self.server.get_host_name_fqdn().await?)
    }

    pub async fn state(&self) -> Result<ServerState> {
        ServerState::try_from(self.server.get_state().await?)
    }

    pub async fn set_host_name(&self, name: &str) -> Result<()> {
        tracing::info!(name, "Changing host name");
        Ok(self.server.set_host_name(name).await?)
    }

    pub async fn alternative_host_name(&self, name: &str) -> Result<String> {
        Ok(self.server.get_alternative_host_name(name).await?)
    }

    pub async fn alternative_service_name(&self, name: &str) -> Result<String> {
        Ok(self.server.get_alternative_service_name(name).await?)
    }

    /// Interface name as known to the daemon; `n/a` for [`IF_UNSPEC`] and
    /// the bare index when the lookup fails.
    pub async fn interface_name(&self, index: i32) -> String {
        if index == IF_UNSPEC {
            return "n/a".to_string();
        }
        if let Some(name) = self.interface_names.lock().get(&index) {
            return name.clone();
        }
        match self.server.get_network_interface_name_by_index(index).await {
            Ok(name) => {
                self.interface_names.lock().insert(index, name.clone());
                name
            }
            Err(e) => {
                tracing::debug!(index, error = %e, "Interface name lookup failed");
                index.to_string()
            }
        }
    }

    pub async fn interface_index(&self, name: &str) -> Result<i32> {
        Ok(self.server.get_network_interface_index_by_name(name).await?)
    }

    pub async fn resolve_host_name(
        &self,
        interface: i32,
        protocol: i32,
        name: &str,
        aprotocol: i32,
        flags: u32,
    ) -> Result<HostNameResolution> {
        let reply = self
            .server
            .resolve_host_name(interface, protocol, name, aprotocol, flags)
            .await?;
        Ok(reply.into())
    }

    pub async fn resolve_address(
        &self,
        interface: i32,
        protocol: i32,
        address: &str,
        flags: u32,
    ) -> Result<AddressResolution> {
        let reply = self
            .server
            .resolve_address(interface, protocol, address, flags)
            .await?;
        Ok(reply.into())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn resolve_service(
        &self,
        interface: i32,
        protocol: i32,
        name: &str,
        service_type: &str,
        domain: &str,
        aprotocol: i32,
        flags: u32,
    ) -> Result<ResolvedService> {
        let reply = self
            .server
            .resolve_service(interface, protocol, name, service_type, domain, aprotocol, flags)
            .await?;
        Ok(reply.into())
    }

    pub async fn entry_group_new(&self) -> Result<EntryGroupProxy<'static>> {
        let path = self.server.entry_group_new().await?;
        tracing::debug!(path = %path.as_str(), "Created entry group");
        let group = EntryGroupProxy::builder(&self.connection)
            .path(path)?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(group)
    }

    /// Prepared but not started; call `start()` once signal streams exist.
    pub async fn domain_browser(
        &self,
        interface: i32,
        protocol: i32,
        domain: &str,
        btype: i32,
        flags: u32,
    ) -> Result<DomainBrowserProxy<'static>> {
        let path = self
            .server2
            .domain_browser_prepare(interface, protocol, domain, btype, flags)
            .await?;
        let browser = DomainBrowserProxy::builder(&self.connection)
            .path(path)?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(browser)
    }

    /// Prepared but not started; call `start()` once signal streams exist.
    pub async fn service_type_browser(
        &self,
        interface: i32,
        protocol: i32,
        domain: &str,
        flags: u32,
    ) -> Result<ServiceTypeBrowserProxy<'static>> {
        let path = self
            .server2
            .service_type_browser_prepare(interface, protocol, domain, flags)
            .await?;
        let browser = ServiceTypeBrowserProxy::builder(&self.connection)
            .path(path)?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(browser)
    }

    /// Prepared but not started; call `start()` once signal streams exist.
    pub async fn service_browser(
        &self,
        interface: i32,
        protocol: i32,
        service_type: &str,
        domain: &str,
        flags: u32,
    ) -> Result<ServiceBrowserProxy<'static>> {
        let path = self
            .server2
            .service_browser_prepare(interface, protocol, service_type, domain, flags)
            .await?;
        tracing::debug!(path = %path.as_str(), service_type, "Prepared service browser");
        let browser = ServiceBrowserProxy::builder(&self.connection)
            .path(path)?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(browser)
    }
}
