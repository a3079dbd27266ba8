//! Browsing services, service types and domains.

pub mod events;
pub mod tracker;

use std::io::{self, Write};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::AvahiClient;
use crate::constants::{lookup_flags, DomainBrowserType, Protocol, IF_UNSPEC};
use crate::dbus::{DomainBrowserProxy, ServiceBrowserProxy, ServiceTypeBrowserProxy};
use crate::error::{AvahiError, Result};
use crate::output::{Change, Printer};
use crate::shutdown::{interrupted, ShutdownManager};
use crate::types::ServiceItem;

pub use events::{BrowserKind, EventStream};
pub use tracker::{Action, BrowseEvent, BrowseOptions, BrowseTarget, BrowseTracker};

/// Remote browser objects that must be freed when the session ends
enum Browser {
    Domains(DomainBrowserProxy<'static>),
    Types(ServiceTypeBrowserProxy<'static>),
    Services(ServiceBrowserProxy<'static>),
}

impl Browser {
    async fn free(&self) -> zbus::Result<()> {
        match self {
            Browser::Domains(b) => b.free().await,
            Browser::Types(b) => b.free().await,
            Browser::Services(b) => b.free().await,
        }
    }
}

/// Forward one browser's events until cancelled or the receiver is gone
async fn forward(
    mut events: EventStream,
    tx: mpsc::UnboundedSender<BrowseEvent>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            event = events.next() => match event {
                Some(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
}

struct Session {
    client: Arc<AvahiClient>,
    tx: mpsc::UnboundedSender<BrowseEvent>,
    shutdown: ShutdownManager,
    browsers: Vec<Browser>,
}

impl Session {
    fn new(client: Arc<AvahiClient>, tx: mpsc::UnboundedSender<BrowseEvent>) -> Self {
        Self {
            client,
            tx,
            shutdown: ShutdownManager::new(),
            browsers: Vec::new(),
        }
    }

    fn spawn_forwarder(&mut self, events: EventStream) {
        let handle = tokio::spawn(forward(events, self.tx.clone(), self.shutdown.token()));
        self.shutdown.register_task(handle);
    }

    async fn open_domain_browser(&mut self, domain: &str, btype: DomainBrowserType) -> Result<()> {
        let browser = self
            .client
            .domain_browser(
                IF_UNSPEC,
                Protocol::Unspec.raw(),
                domain,
                btype.raw(),
                lookup_flags::NONE,
            )
            .await?;
        let events = events::browser_events(browser.inner(), BrowserKind::Domain).await?;
        self.spawn_forwarder(events);
        let start = browser.start().await;
        self.browsers.push(Browser::Domains(browser));
        Ok(start?)
    }

    async fn open_type_browser(&mut self, domain: &str) -> Result<()> {
        let browser = self
            .client
            .service_type_browser(IF_UNSPEC, Protocol::Unspec.raw(), domain, lookup_flags::NONE)
            .await?;
        let events = events::browser_events(browser.inner(), BrowserKind::ServiceType).await?;
        self.spawn_forwarder(events);
        let start = browser.start().await;
        self.browsers.push(Browser::Types(browser));
        Ok(start?)
    }

    async fn open_service_browser(&mut self, service_type: &str, domain: &str) -> Result<()> {
        let browser = self
            .client
            .service_browser(
                IF_UNSPEC,
                Protocol::Unspec.raw(),
                service_type,
                domain,
                lookup_flags::NONE,
            )
            .await?;
        let events = events::browser_events(browser.inner(), BrowserKind::Service).await?;
        self.spawn_forwarder(events);
        let start = browser.start().await;
        self.browsers.push(Browser::Services(browser));
        start?;
        tracing::debug!(service_type, domain, "Started service browser");
        Ok(())
    }

    fn spawn_resolver(&mut self, item: ServiceItem) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let resolve = client.resolve_service(
                item.interface,
                item.protocol.raw(),
                &item.name,
                &item.service_type,
                &item.domain,
                Protocol::Unspec.raw(),
                lookup_flags::NONE,
            );
            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = resolve => result,
            };
            let event = match result {
                Ok(resolved) => BrowseEvent::Resolved(resolved),
                Err(e) => BrowseEvent::ResolveFailed {
                    item,
                    reason: e.to_string(),
                },
            };
            let _ = tx.send(event);
        });
        self.shutdown.register_task(handle);
    }

    /// Cancel forwarders and free remote objects, best effort
    async fn close(self) {
        self.shutdown.shutdown().await;
        for browser in &self.browsers {
            if let Err(e) = browser.free().await {
                tracing::warn!(error = %e, "Failed to free browser");
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Quit,
}

/// Print an action that only produces output; other actions print nothing.
pub fn render<W: Write>(action: &Action, ifname: &str, printer: &mut Printer<W>) -> io::Result<()> {
    match action {
        Action::Added(item) => printer.service(Change::New, ifname, item),
        Action::Removed(item) => printer.service(Change::Remove, ifname, item),
        Action::Resolved(resolved) => printer.resolved(ifname, resolved),
        Action::AllForNow => printer.marker("All for now"),
        Action::CacheExhausted => printer.marker("Cache exhausted"),
        _ => Ok(()),
    }
}

async fn perform<W: Write>(
    action: Action,
    session: &mut Session,
    printer: &mut Printer<W>,
) -> Result<Step> {
    match action {
        Action::BrowseTypes { domain } => session.open_type_browser(&domain).await?,
        Action::BrowseServices {
            service_type,
            domain,
        } => session.open_service_browser(&service_type, &domain).await?,
        Action::Resolve(item) => session.spawn_resolver(item),
        Action::ResolveFailed { item, reason } => {
            let err = AvahiError::ResolveFailed {
                name: item.name,
                service_type: item.service_type,
                domain: item.domain,
                reason,
            };
            tracing::debug!("{}", err);
            eprintln!("{}", err);
        }
        Action::Quit => return Ok(Step::Quit),
        Action::Fail(reason) => return Err(AvahiError::BrowserFailure(reason)),
        output => {
            let ifname = match output.interface() {
                Some(index) => session.client.interface_name(index).await,
                None => String::new(),
            };
            render(&output, &ifname, printer)?;
        }
    }
    Ok(Step::Continue)
}

async fn drive<W: Write>(
    tracker: &mut BrowseTracker,
    initial: Vec<Action>,
    session: &mut Session,
    rx: &mut mpsc::UnboundedReceiver<BrowseEvent>,
    printer: &mut Printer<W>,
) -> Result<()> {
    for action in initial {
        if let Step::Quit = perform(action, session, printer).await? {
            return Ok(());
        }
    }

    let mut interrupt = std::pin::pin!(interrupted());
    loop {
        let event = tokio::select! {
            _ = &mut interrupt => {
                tracing::debug!("Interrupted");
                return Ok(());
            }
            event = rx.recv() => match event {
                Some(event) => event,
                None => return Ok(()),
            },
        };

        for action in tracker.handle(event) {
            if let Step::Quit = perform(action, session, printer).await? {
                return Ok(());
            }
        }
    }
}

/// Browse services of one type, or of every type with
/// [`BrowseTarget::AllTypes`], until interrupted or told to terminate.
pub async fn browse_services<W: Write>(
    client: Arc<AvahiClient>,
    target: BrowseTarget,
    options: BrowseOptions,
    printer: &mut Printer<W>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = Session::new(client, tx);
    let mut tracker = BrowseTracker::new(options);

    let initial = tracker.start(target);
    let result = drive(&mut tracker, initial, &mut session, &mut rx, printer).await;

    tracing::debug!(
        services = tracker.service_count(),
        pending_resolutions = tracker.pending_resolutions(),
        "Browse session finished"
    );
    session.close().await;
    result
}

/// Output of one domain or service type browser event
fn list_output<W: Write>(
    event: BrowseEvent,
    ifname: &str,
    terminate: bool,
    printer: &mut Printer<W>,
) -> Result<Step> {
    match event {
        BrowseEvent::DomainNew(item) => printer.domain(Change::New, ifname, &item)?,
        BrowseEvent::DomainRemove(item) => printer.domain(Change::Remove, ifname, &item)?,
        BrowseEvent::TypeNew(item) => printer.service_type(Change::New, ifname, &item)?,
        BrowseEvent::TypeRemove(item) => printer.service_type(Change::Remove, ifname, &item)?,
        BrowseEvent::AllForNow if terminate => return Ok(Step::Quit),
        BrowseEvent::Failure(reason) => return Err(AvahiError::BrowserFailure(reason)),
        _ => {}
    }
    Ok(Step::Continue)
}

/// Print every event of a single domain or service type browser
async fn list<W: Write>(
    session: &mut Session,
    rx: &mut mpsc::UnboundedReceiver<BrowseEvent>,
    terminate: bool,
    printer: &mut Printer<W>,
) -> Result<()> {
    let mut interrupt = std::pin::pin!(interrupted());
    loop {
        let event = tokio::select! {
            _ = &mut interrupt => return Ok(()),
            event = rx.recv() => match event {
                Some(event) => event,
                None => return Ok(()),
            },
        };

        let ifname = match event.interface() {
            Some(index) => session.client.interface_name(index).await,
            None => String::new(),
        };
        if list_output(event, &ifname, terminate, printer)? == Step::Quit {
            return Ok(());
        }
    }
}

pub async fn browse_domains<W: Write>(
    client: Arc<AvahiClient>,
    domain: &str,
    btype: DomainBrowserType,
    terminate: bool,
    printer: &mut Printer<W>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = Session::new(client, tx);

    let result = match session.open_domain_browser(domain, btype).await {
        Ok(()) => list(&mut session, &mut rx, terminate, printer).await,
        Err(e) => Err(e),
    };
    session.close().await;
    result
}

pub async fn browse_types<W: Write>(
    client: Arc<AvahiClient>,
    domain: &str,
    terminate: bool,
    printer: &mut Printer<W>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = Session::new(client, tx);

    let result = match session.open_type_browser(domain).await {
        Ok(()) => list(&mut session, &mut rx, terminate, printer).await,
        Err(e) => Err(e),
    };
    session.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Protocol;
    use crate::output::OutputMode;
    use crate::types::ServiceTypeItem;

    fn printer() -> Printer<Vec<u8>> {
        Printer::new(Vec::new(), OutputMode::Lines, 80, None)
    }

    fn service_type(t: &str) -> ServiceTypeItem {
        ServiceTypeItem {
            interface: 2,
            protocol: Protocol::Inet,
            service_type: t.to_string(),
            domain: "local".to_string(),
            flags: 0,
        }
    }

    /// Feed events the way `list` does and collect what was printed
    fn run_list(events: Vec<BrowseEvent>, terminate: bool) -> (Result<()>, String) {
        let mut p = printer();
        let mut result = Ok(());
        for event in events {
            match list_output(event, "eth0", terminate, &mut p) {
                Ok(Step::Continue) => {}
                Ok(Step::Quit) => break,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        (result, String::from_utf8(p.into_inner()).unwrap())
    }

    #[test]
    fn test_list_prints_every_item_before_terminating() {
        let (result, out) = run_list(
            vec![
                BrowseEvent::TypeNew(service_type("_http._tcp")),
                BrowseEvent::TypeNew(service_type("_ssh._tcp")),
                BrowseEvent::CacheExhausted,
                BrowseEvent::AllForNow,
                BrowseEvent::TypeNew(service_type("_ipp._tcp")),
            ],
            true,
        );
        assert!(result.is_ok());
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("+ eth0 IPv4 _http._tcp"));
        assert!(lines[1].starts_with("+ eth0 IPv4 _ssh._tcp"));
    }

    #[test]
    fn test_list_keeps_going_without_terminate() {
        let (_, out) = run_list(
            vec![
                BrowseEvent::TypeNew(service_type("_http._tcp")),
                BrowseEvent::AllForNow,
                BrowseEvent::TypeRemove(service_type("_http._tcp")),
            ],
            false,
        );
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("- eth0"));
    }

    #[test]
    fn test_list_failure_ends_with_error() {
        let (result, _) = run_list(vec![BrowseEvent::Failure("Not permitted".to_string())], true);
        assert!(matches!(result, Err(AvahiError::BrowserFailure(ref r)) if r == "Not permitted"));
    }

    #[test]
    fn test_render_skips_session_actions() {
        let mut p = printer();
        render(
            &Action::BrowseTypes {
                domain: String::new(),
            },
            "",
            &mut p,
        )
        .unwrap();
        render(&Action::Quit, "", &mut p).unwrap();
        assert!(p.into_inner().is_empty());

        let mut p = printer();
        render(&Action::AllForNow, "", &mut p).unwrap();
        assert_eq!(String::from_utf8(p.into_inner()).unwrap(), ": All for now\n");
    }
}
