//! Rendering of command results, either as avahi-browse style text lines or
//! as one JSON object per line.

use std::io::{self, Write};

use serde_json::{json, Value};

use crate::constants::{EntryGroupState, Protocol};
use crate::service_types::ServiceTypeDb;
use crate::txt::txt_to_display;
use crate::types::{
    AddressResolution, DomainItem, HostNameResolution, ResolvedService, ServerInfo, ServiceItem,
    ServiceTypeItem,
};

pub const DEFAULT_COLUMNS: usize = 80;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Lines,
    Json,
}

/// Which way a browser item went
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    New,
    Remove,
    Resolved,
}

impl Change {
    fn marker(self) -> char {
        match self {
            Change::New => '+',
            Change::Remove => '-',
            Change::Resolved => '=',
        }
    }

    fn event(self) -> &'static str {
        match self {
            Change::New => "new",
            Change::Remove => "remove",
            Change::Resolved => "resolved",
        }
    }
}

/// Terminal width from `$COLUMNS`, falling back to 80.
pub fn terminal_columns() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse::<usize>().ok())
        .filter(|&c| c > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

pub struct Printer<W: Write> {
    out: W,
    mode: OutputMode,
    columns: usize,
    service_types: Option<ServiceTypeDb>,
}

impl Printer<io::Stdout> {
    pub fn stdout(mode: OutputMode, service_types: Option<ServiceTypeDb>) -> Self {
        Printer::new(io::stdout(), mode, terminal_columns(), service_types)
    }
}

impl<W: Write> Printer<W> {
    pub fn new(
        out: W,
        mode: OutputMode,
        columns: usize,
        service_types: Option<ServiceTypeDb>,
    ) -> Self {
        Self {
            out,
            mode,
            columns,
            service_types,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn describe_type<'a>(&'a self, service_type: &'a str) -> &'a str {
        match &self.service_types {
            Some(db) => db.lookup(service_type),
            None => service_type,
        }
    }

    fn json_line(&mut self, value: &Value) -> io::Result<()> {
        writeln!(self.out, "{}", value)?;
        self.out.flush()
    }

    /// A single scalar answer such as a host name
    pub fn value(&mut self, key: &str, value: &str) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => writeln!(self.out, "{}", value),
            OutputMode::Json => {
                let mut object = serde_json::Map::new();
                object.insert(key.to_string(), Value::from(value));
                self.json_line(&Value::Object(object))
            }
        }
    }

    pub fn server_info(&mut self, info: &ServerInfo) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => {
                writeln!(self.out, "Server version: {}", info.version)?;
                writeln!(self.out, "API version: {}", info.api_version)?;
                writeln!(self.out, "Host name: {}", info.host_name)?;
                writeln!(self.out, "Domain name: {}", info.domain_name)?;
                writeln!(self.out, "FQDN: {}", info.host_name_fqdn)?;
                writeln!(self.out, "State: {}", info.state)?;
                writeln!(self.out, "Local service cookie: {}", info.local_service_cookie)?;
                writeln!(
                    self.out,
                    "NSS support: {}",
                    if info.nss_support { "yes" } else { "no" }
                )
            }
            OutputMode::Json => self.json_line(&json!(info)),
        }
    }

    pub fn host_resolution(&mut self, r: &HostNameResolution) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => writeln!(self.out, "{}\t{}", r.name, r.address),
            OutputMode::Json => self.json_line(&json!(r)),
        }
    }

    pub fn address_resolution(&mut self, r: &AddressResolution) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => writeln!(self.out, "{}\t{}", r.address, r.name),
            OutputMode::Json => self.json_line(&json!(r)),
        }
    }

    fn service_line(
        &mut self,
        change: Change,
        ifname: &str,
        protocol: Protocol,
        name: &str,
        service_type: &str,
        domain: &str,
    ) -> io::Result<()> {
        let width = self.columns.saturating_sub(35);
        let line = format!(
            "{} {:>4} {:>4} {:<width$} {:<20} {}",
            change.marker(),
            ifname,
            protocol.to_string(),
            name,
            self.describe_type(service_type),
            domain,
            width = width
        );
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    pub fn service(&mut self, change: Change, ifname: &str, item: &ServiceItem) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => self.service_line(
                change,
                ifname,
                item.protocol,
                &item.name,
                &item.service_type,
                &item.domain,
            ),
            OutputMode::Json => self.json_line(&json!({
                "event": change.event(),
                "interface_name": ifname,
                "service": item,
            })),
        }
    }

    pub fn resolved(&mut self, ifname: &str, r: &ResolvedService) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => {
                self.service_line(
                    Change::Resolved,
                    ifname,
                    r.protocol,
                    &r.name,
                    &r.service_type,
                    &r.domain,
                )?;
                writeln!(self.out, "   hostname = [{}]", r.host_name)?;
                writeln!(self.out, "   address = [{}]", r.address)?;
                writeln!(self.out, "   port = [{}]", r.port)?;
                writeln!(self.out, "   txt = [{}]", txt_to_display(&r.txt))?;
                self.out.flush()
            }
            OutputMode::Json => self.json_line(&json!({
                "event": Change::Resolved.event(),
                "interface_name": ifname,
                "service": r,
            })),
        }
    }

    pub fn service_type(
        &mut self,
        change: Change,
        ifname: &str,
        item: &ServiceTypeItem,
    ) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => {
                let line = format!(
                    "{} {:>4} {:>4} {:<20} {}",
                    change.marker(),
                    ifname,
                    item.protocol.to_string(),
                    self.describe_type(&item.service_type),
                    item.domain
                );
                writeln!(self.out, "{}", line)?;
                self.out.flush()
            }
            OutputMode::Json => self.json_line(&json!({
                "event": change.event(),
                "interface_name": ifname,
                "service_type": item,
            })),
        }
    }

    pub fn domain(&mut self, change: Change, ifname: &str, item: &DomainItem) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => {
                writeln!(
                    self.out,
                    "{} {:>4} {:>4} {}",
                    change.marker(),
                    ifname,
                    item.protocol.to_string(),
                    item.domain
                )?;
                self.out.flush()
            }
            OutputMode::Json => self.json_line(&json!({
                "event": change.event(),
                "interface_name": ifname,
                "domain": item,
            })),
        }
    }

    /// `: All for now` / `: Cache exhausted` markers of verbose browsing
    pub fn marker(&mut self, text: &str) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => {
                writeln!(self.out, ": {}", text)?;
                self.out.flush()
            }
            OutputMode::Json => self.json_line(&json!({ "event": "marker", "text": text })),
        }
    }

    pub fn group_state(&mut self, state: EntryGroupState, error: &str) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => {
                if error.is_empty() {
                    writeln!(self.out, "StateChanged: {}", state)?;
                } else {
                    writeln!(self.out, "StateChanged: {} ({})", state, error)?;
                }
                self.out.flush()
            }
            OutputMode::Json => self.json_line(&json!({
                "event": "state_changed",
                "state": state,
                "error": error,
            })),
        }
    }

    pub fn renamed(&mut self, old: &str, new: &str) -> io::Result<()> {
        match self.mode {
            OutputMode::Lines => writeln!(
                self.out,
                "Service name collision, renaming '{}' to '{}'",
                old, new
            ),
            OutputMode::Json => self.json_line(&json!({
                "event": "renamed",
                "old": old,
                "new": new,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printer(mode: OutputMode, db: Option<ServiceTypeDb>) -> Printer<Vec<u8>> {
        Printer::new(Vec::new(), mode, DEFAULT_COLUMNS, db)
    }

    fn output(p: Printer<Vec<u8>>) -> String {
        String::from_utf8(p.into_inner()).unwrap()
    }

    fn item() -> ServiceItem {
        ServiceItem {
            interface: 2,
            protocol: Protocol::Inet,
            name: "web".to_string(),
            service_type: "_http._tcp".to_string(),
            domain: "local".to_string(),
            flags: 0,
        }
    }

    #[test]
    fn test_service_line_layout() {
        let mut p = printer(OutputMode::Lines, None);
        p.service(Change::New, "eth0", &item()).unwrap();
        let expected = format!(
            "+ eth0 IPv4 {:<45} {:<20} local\n",
            "web", "_http._tcp"
        );
        assert_eq!(output(p), expected);
    }

    #[test]
    fn test_service_type_description_used() {
        let mut p = printer(OutputMode::Lines, Some(ServiceTypeDb::builtin()));
        p.service(Change::Remove, "eth0", &item()).unwrap();
        let out = output(p);
        assert!(out.starts_with("- eth0 IPv4 web"));
        assert!(out.contains("Web Site"));
        assert!(!out.contains("_http._tcp"));
    }

    #[test]
    fn test_resolved_block() {
        let resolved = ResolvedService {
            interface: 2,
            protocol: Protocol::Inet,
            name: "web".to_string(),
            service_type: "_http._tcp".to_string(),
            domain: "local".to_string(),
            host_name: "box.local".to_string(),
            address_protocol: Protocol::Inet,
            address: "192.168.1.10".to_string(),
            port: 8080,
            txt: vec![b"path=/".to_vec()],
            flags: 0,
        };
        let mut p = printer(OutputMode::Lines, None);
        p.resolved("eth0", &resolved).unwrap();
        let out = output(p);
        let lines: Vec<_> = out.lines().collect();
        assert!(lines[0].starts_with("= eth0 IPv4 web"));
        assert_eq!(lines[1], "   hostname = [box.local]");
        assert_eq!(lines[2], "   address = [192.168.1.10]");
        assert_eq!(lines[3], "   port = [8080]");
        assert_eq!(lines[4], "   txt = [\"path=/\"]");
    }

    #[test]
    fn test_json_service_event() {
        let mut p = printer(OutputMode::Json, Some(ServiceTypeDb::builtin()));
        p.service(Change::New, "eth0", &item()).unwrap();
        let value: Value = serde_json::from_str(output(p).trim()).unwrap();
        assert_eq!(value["event"], "new");
        assert_eq!(value["interface_name"], "eth0");
        // JSON keeps the raw type
        assert_eq!(value["service"]["service_type"], "_http._tcp");
        assert_eq!(value["service"]["protocol"], "inet");
    }

    #[test]
    fn test_group_state_lines() {
        let mut p = printer(OutputMode::Lines, None);
        p.group_state(EntryGroupState::Established, "").unwrap();
        p.group_state(EntryGroupState::Failure, "Timeout reached").unwrap();
        assert_eq!(
            output(p),
            "StateChanged: established\nStateChanged: failure (Timeout reached)\n"
        );
    }

    #[test]
    fn test_narrow_terminal_does_not_underflow() {
        let mut p = Printer::new(Vec::new(), OutputMode::Lines, 10, None);
        p.service(Change::New, "lo", &item()).unwrap();
        assert!(output(p).starts_with("+   lo IPv4 web "));
    }
}
