//! Turn a browser's signals into a stream of [`BrowseEvent`]s.
//!
//! Each browser gets a single match rule on its object path and interface,
//! so its signals come out in the order the daemon sent them. `AllForNow`
//! is therefore only seen after every `ItemNew` that preceded it.

use futures_util::future::ready;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use zbus::message::Type as MessageType;
use zbus::{Message, MatchRule, MessageStream, Proxy};

use crate::constants::{dbus, Protocol};
use crate::error::Result;
use crate::types::{DomainItem, ServiceItem, ServiceTypeItem};

use super::tracker::BrowseEvent;

pub type EventStream = BoxStream<'static, BrowseEvent>;

/// Body of a service browser `ItemNew`/`ItemRemove`
type ServiceArgs = (i32, i32, String, String, String, u32);
/// Body of a service type browser `ItemNew`/`ItemRemove`
type ServiceTypeArgs = (i32, i32, String, String, u32);
/// Body of a domain browser `ItemNew`/`ItemRemove`
type DomainArgs = (i32, i32, String, u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowserKind {
    Domain,
    ServiceType,
    Service,
}

impl BrowserKind {
    pub fn interface(self) -> &'static str {
        match self {
            BrowserKind::Domain => dbus::INTERFACE_DOMAIN_BROWSER,
            BrowserKind::ServiceType => dbus::INTERFACE_SERVICE_TYPE_BROWSER,
            BrowserKind::Service => dbus::INTERFACE_SERVICE_BROWSER,
        }
    }
}

fn service_item((interface, protocol, name, service_type, domain, flags): ServiceArgs) -> ServiceItem {
    ServiceItem {
        interface,
        protocol: Protocol::from_raw_lossy(protocol),
        name,
        service_type,
        domain,
        flags,
    }
}

fn service_type_item((interface, protocol, service_type, domain, flags): ServiceTypeArgs) -> ServiceTypeItem {
    ServiceTypeItem {
        interface,
        protocol: Protocol::from_raw_lossy(protocol),
        service_type,
        domain,
        flags,
    }
}

fn domain_item((interface, protocol, domain, flags): DomainArgs) -> DomainItem {
    DomainItem {
        interface,
        protocol: Protocol::from_raw_lossy(protocol),
        domain,
        flags,
    }
}

/// Decode one signal of a `kind` browser. Unknown members and malformed
/// bodies yield `None`.
pub fn decode_signal(kind: BrowserKind, message: &Message) -> Option<BrowseEvent> {
    let header = message.header();
    let member = header.member()?.as_str();
    let body = message.body();

    let parsed = match (kind, member) {
        (_, "AllForNow") => Ok(BrowseEvent::AllForNow),
        (_, "CacheExhausted") => Ok(BrowseEvent::CacheExhausted),
        (_, "Failure") => body.deserialize::<String>().map(BrowseEvent::Failure),
        (BrowserKind::Service, "ItemNew") => body
            .deserialize::<ServiceArgs>()
            .map(|a| BrowseEvent::ServiceNew(service_item(a))),
        (BrowserKind::Service, "ItemRemove") => body
            .deserialize::<ServiceArgs>()
            .map(|a| BrowseEvent::ServiceRemove(service_item(a))),
        (BrowserKind::ServiceType, "ItemNew") => body
            .deserialize::<ServiceTypeArgs>()
            .map(|a| BrowseEvent::TypeNew(service_type_item(a))),
        (BrowserKind::ServiceType, "ItemRemove") => body
            .deserialize::<ServiceTypeArgs>()
            .map(|a| BrowseEvent::TypeRemove(service_type_item(a))),
        (BrowserKind::Domain, "ItemNew") => body
            .deserialize::<DomainArgs>()
            .map(|a| BrowseEvent::DomainNew(domain_item(a))),
        (BrowserKind::Domain, "ItemRemove") => body
            .deserialize::<DomainArgs>()
            .map(|a| BrowseEvent::DomainRemove(domain_item(a))),
        (_, other) => {
            tracing::trace!(member = other, "Ignoring browser signal");
            return None;
        }
    };

    match parsed {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(member, error = %e, "Ignoring malformed browser signal");
            None
        }
    }
}

/// Map an ordered message stream to events, keeping the order
pub fn signal_events<S>(kind: BrowserKind, messages: S) -> EventStream
where
    S: Stream<Item = zbus::Result<Message>> + Send + 'static,
{
    messages
        .filter_map(move |message| {
            ready(match message {
                Ok(message) => decode_signal(kind, &message),
                Err(e) => {
                    tracing::warn!(error = %e, "Browser message stream error");
                    None
                }
            })
        })
        .boxed()
}

/// Subscribe to every signal of the browser behind `proxy`. Must be called
/// before the browser is started.
pub async fn browser_events(proxy: &Proxy<'_>, kind: BrowserKind) -> Result<EventStream> {
    let rule = MatchRule::builder()
        .msg_type(MessageType::Signal)
        .interface(kind.interface())?
        .path(proxy.path().clone())?
        .build();
    let messages = MessageStream::for_match_rule(rule, proxy.connection(), None).await?;
    Ok(signal_events(kind, messages))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/Client1/ServiceBrowser1";

    fn signal<B>(kind: BrowserKind, member: &str, body: &B) -> Message
    where
        B: serde::Serialize + zbus::zvariant::DynamicType,
    {
        Message::signal(PATH, kind.interface(), member)
            .unwrap()
            .build(body)
            .unwrap()
    }

    #[test]
    fn test_decode_service_item() {
        let msg = signal(
            BrowserKind::Service,
            "ItemNew",
            &(2i32, 1i32, "web", "_http._tcp", "local", 8u32),
        );
        match decode_signal(BrowserKind::Service, &msg) {
            Some(BrowseEvent::ServiceNew(item)) => {
                assert_eq!(item.interface, 2);
                assert_eq!(item.protocol, Protocol::Inet6);
                assert_eq!(item.name, "web");
                assert!(item.is_local());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_type_and_domain_items() {
        let msg = signal(
            BrowserKind::ServiceType,
            "ItemRemove",
            &(3i32, 0i32, "_ssh._tcp", "local", 0u32),
        );
        assert!(matches!(
            decode_signal(BrowserKind::ServiceType, &msg),
            Some(BrowseEvent::TypeRemove(ref t)) if t.service_type == "_ssh._tcp"
        ));

        let msg = signal(BrowserKind::Domain, "ItemNew", &(3i32, 0i32, "example.com", 0u32));
        assert!(matches!(
            decode_signal(BrowserKind::Domain, &msg),
            Some(BrowseEvent::DomainNew(ref d)) if d.domain == "example.com"
        ));
    }

    #[test]
    fn test_decode_markers_and_failure() {
        let kind = BrowserKind::Service;
        assert_eq!(
            decode_signal(kind, &signal(kind, "AllForNow", &())),
            Some(BrowseEvent::AllForNow)
        );
        assert_eq!(
            decode_signal(kind, &signal(kind, "CacheExhausted", &())),
            Some(BrowseEvent::CacheExhausted)
        );
        assert_eq!(
            decode_signal(kind, &signal(kind, "Failure", &"Too many objects")),
            Some(BrowseEvent::Failure("Too many objects".to_string()))
        );
    }

    #[test]
    fn test_malformed_and_unknown_signals_are_dropped() {
        let kind = BrowserKind::Service;
        // Domain-browser shaped body on a service browser
        let msg = signal(kind, "ItemNew", &(2i32, 0i32, "local", 0u32));
        assert_eq!(decode_signal(kind, &msg), None);
        assert_eq!(decode_signal(kind, &signal(kind, "Bogus", &())), None);
    }
}
