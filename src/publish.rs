//! Registering services and addresses through an entry group.
//!
//! The group is committed once and then watched until the user interrupts.
//! A service name collision renames every service of the group with the
//! daemon's alternative-name rule and commits again.

use std::io::Write;

use futures_util::StreamExt;

use crate::client::AvahiClient;
use crate::constants::{publish_flags, EntryGroupState, Protocol, IF_UNSPEC};
use crate::dbus::EntryGroupProxy;
use crate::error::{AvahiError, Result};
use crate::output::Printer;
use crate::shutdown::interrupted;
use crate::txt::string_array_to_txt_array;

/// Upper bound on consecutive renames before giving up
pub const MAX_RENAMES: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceSpec {
    pub interface: i32,
    pub protocol: Protocol,
    pub name: String,
    pub service_type: String,
    /// Empty for the default domain
    pub domain: String,
    /// Empty for this host
    pub host: String,
    pub port: u16,
    pub txt: Vec<String>,
    pub subtypes: Vec<String>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, service_type: impl Into<String>, port: u16) -> Self {
        Self {
            interface: IF_UNSPEC,
            protocol: Protocol::Unspec,
            name: name.into(),
            service_type: service_type.into(),
            domain: String::new(),
            host: String::new(),
            port,
            txt: Vec::new(),
            subtypes: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressSpec {
    pub interface: i32,
    pub protocol: Protocol,
    pub name: String,
    pub address: String,
}

impl AddressSpec {
    /// Parse `host.local=192.168.1.5`
    pub fn parse(s: &str) -> Result<Self> {
        let (name, address) = s.split_once('=').ok_or_else(|| {
            AvahiError::InvalidArgument(format!("expected NAME=ADDRESS, got {:?}", s))
        })?;
        let (name, address) = (name.trim(), address.trim());
        if name.is_empty() || address.is_empty() {
            return Err(AvahiError::InvalidArgument(format!(
                "expected NAME=ADDRESS, got {:?}",
                s
            )));
        }
        if address.parse::<std::net::IpAddr>().is_err() {
            return Err(AvahiError::InvalidArgument(format!(
                "not an IP address: {:?}",
                address
            )));
        }
        Ok(Self {
            interface: IF_UNSPEC,
            protocol: Protocol::Unspec,
            name: name.to_string(),
            address: address.to_string(),
        })
    }
}

/// What to do after the group reported a new state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishStep {
    Wait,
    Established,
    Rename,
    Fail(String),
}

pub fn next_step(
    state: EntryGroupState,
    error: &str,
    has_services: bool,
    renames: usize,
) -> PublishStep {
    match state {
        EntryGroupState::Uncommited | EntryGroupState::Registering => PublishStep::Wait,
        EntryGroupState::Established => PublishStep::Established,
        EntryGroupState::Collision if has_services && renames < MAX_RENAMES => PublishStep::Rename,
        EntryGroupState::Collision if has_services => {
            PublishStep::Fail(format!("still colliding after {} renames", renames))
        }
        EntryGroupState::Collision => PublishStep::Fail("address name collision".to_string()),
        EntryGroupState::Failure if error.is_empty() => {
            PublishStep::Fail("entry group failure".to_string())
        }
        EntryGroupState::Failure => PublishStep::Fail(error.to_string()),
    }
}

async fn populate(
    group: &EntryGroupProxy<'static>,
    services: &[ServiceSpec],
    addresses: &[AddressSpec],
) -> Result<()> {
    for service in services {
        let txt = string_array_to_txt_array(&service.txt);
        group
            .add_service(
                service.interface,
                service.protocol.raw(),
                publish_flags::NONE,
                &service.name,
                &service.service_type,
                &service.domain,
                &service.host,
                service.port,
                &txt,
            )
            .await?;
        for subtype in &service.subtypes {
            group
                .add_service_subtype(
                    service.interface,
                    service.protocol.raw(),
                    publish_flags::NONE,
                    &service.name,
                    &service.service_type,
                    &service.domain,
                    subtype,
                )
                .await?;
        }
        tracing::info!(
            name = %service.name,
            service_type = %service.service_type,
            port = service.port,
            "Added service"
        );
    }

    for address in addresses {
        group
            .add_address(
                address.interface,
                address.protocol.raw(),
                publish_flags::NONE,
                &address.name,
                &address.address,
            )
            .await?;
        tracing::info!(name = %address.name, address = %address.address, "Added address");
    }

    Ok(())
}

/// Publish `services` and `addresses` in one entry group and keep them
/// registered until interrupted. The group is freed on every exit path.
pub async fn publish<W: Write>(
    client: &AvahiClient,
    mut services: Vec<ServiceSpec>,
    addresses: Vec<AddressSpec>,
    printer: &mut Printer<W>,
) -> Result<()> {
    if services.is_empty() && addresses.is_empty() {
        return Err(AvahiError::InvalidArgument(
            "nothing to publish".to_string(),
        ));
    }

    let group = client.entry_group_new().await?;
    let result = run_group(client, &group, &mut services, &addresses, printer).await;

    if let Err(e) = group.free().await {
        tracing::warn!(error = %e, "Failed to free entry group");
    }
    result
}

async fn run_group<W: Write>(
    client: &AvahiClient,
    group: &EntryGroupProxy<'static>,
    services: &mut [ServiceSpec],
    addresses: &[AddressSpec],
    printer: &mut Printer<W>,
) -> Result<()> {
    let mut states = group.receive_state_changed().await?;

    populate(group, services, addresses).await?;
    group.commit().await?;

    let mut renames = 0usize;
    let mut interrupt = std::pin::pin!(interrupted());

    loop {
        let signal = tokio::select! {
            _ = &mut interrupt => return Ok(()),
            signal = states.next() => match signal {
                Some(signal) => signal,
                None => return Ok(()),
            },
        };

        let args = signal.args()?;
        let state = EntryGroupState::try_from(*args.state())?;
        let error = args.error().to_string();
        printer.group_state(state, &error)?;

        match next_step(state, &error, !services.is_empty(), renames) {
            PublishStep::Wait => {}
            PublishStep::Established => {
                tracing::info!("Entry group established");
                renames = 0;
            }
            PublishStep::Rename => {
                for service in services.iter_mut() {
                    let new_name = client.alternative_service_name(&service.name).await?;
                    printer.renamed(&service.name, &new_name)?;
                    tracing::warn!(old = %service.name, new = %new_name, "Service name collision");
                    service.name = new_name;
                }
                renames += 1;
                group.reset().await?;
                populate(group, services, addresses).await?;
                group.commit().await?;
            }
            PublishStep::Fail(reason) => return Err(AvahiError::EntryGroupFailure(reason)),
        }
    }
}
