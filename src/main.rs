use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use avahi_tools::browse::{self, BrowseOptions, BrowseTarget};
use avahi_tools::config::{BusConfig, BusKind, Config};
use avahi_tools::constants::{lookup_flags, DomainBrowserType, Protocol, IF_UNSPEC};
use avahi_tools::logging::setup_logging;
use avahi_tools::output::{OutputMode, Printer};
use avahi_tools::publish::{self, AddressSpec, ServiceSpec};
use avahi_tools::service_types::ServiceTypeDb;
use avahi_tools::{AvahiClient, AvahiError, Result};

#[derive(Parser, Debug)]
#[command(name = "avahictl")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Query and drive the Avahi daemon over D-Bus", long_about = None)]
#[command(help_template = "\
{before-help}{name} - {about}

{usage-heading} {usage}

Commands:
  Server
    info                      Show daemon version, host name, domain and state
    state                     Show the daemon state
    host-name                 Show the host name
    domain-name               Show the domain name
    fqdn                      Show the fully qualified host name
    set-host-name             Change the host name
    alternative-host-name     Derive an alternative host name
    alternative-service-name  Derive an alternative service name
    interface-name            Map an interface index to its name
    interface-index           Map an interface name to its index
  Resolve
    resolve-host-name         Resolve a host name to an address
    resolve-address           Resolve an address to a host name
    resolve-service           Resolve a service instance
  Publish
    publish-service           Register a service until interrupted
    publish-address           Register an address record until interrupted
  Browse
    browse                    Browse services of one type or of all types
    browse-types              Browse service types
    browse-domains            Browse domains
  Utility
    dump-config               Print the effective configuration

    help                      Print this message or the help of the given subcommand(s)

{options}{after-help}
")]
struct Args {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the session bus instead of the system bus
    #[arg(long)]
    session: bool,

    /// Connect to this D-Bus address instead
    #[arg(long, conflicts_with = "session")]
    bus_address: Option<String>,

    /// Output one JSON object per line
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging; browse prints "All for now" / "Cache exhausted"
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    // ============================================================
    // SERVER COMMANDS
    // ============================================================
    /// Show daemon version, host name, domain and state
    #[command(next_help_heading = "Server")]
    Info,

    /// Show the daemon state
    #[command(next_help_heading = "Server")]
    State,

    /// Show the host name
    #[command(next_help_heading = "Server")]
    HostName,

    /// Show the domain name
    #[command(next_help_heading = "Server")]
    DomainName,

    /// Show the fully qualified host name
    #[command(next_help_heading = "Server")]
    Fqdn,

    /// Change the host name
    #[command(next_help_heading = "Server")]
    SetHostName {
        /// New host name (without domain)
        name: String,
    },

    /// Derive an alternative host name
    #[command(next_help_heading = "Server")]
    AlternativeHostName {
        name: String,
    },

    /// Derive an alternative service name
    #[command(next_help_heading = "Server")]
    AlternativeServiceName {
        name: String,
    },

    /// Map an interface index to its name
    #[command(next_help_heading = "Server")]
    InterfaceName {
        index: i32,
    },

    /// Map an interface name to its index
    #[command(next_help_heading = "Server")]
    InterfaceIndex {
        name: String,
    },

    // ============================================================
    // RESOLVE COMMANDS
    // ============================================================
    /// Resolve a host name to an address
    #[command(next_help_heading = "Resolve")]
    ResolveHostName {
        /// Host name, e.g. foo.local
        name: String,
        /// Interface index or name
        #[arg(short, long)]
        interface: Option<String>,
        /// Protocol to query over
        #[arg(short, long, value_enum, default_value = "unspec")]
        protocol: Protocol,
        /// Address family of the answer
        #[arg(short, long, value_enum, default_value = "unspec")]
        address_protocol: Protocol,
    },

    /// Resolve an address to a host name
    #[command(next_help_heading = "Resolve")]
    ResolveAddress {
        address: String,
        /// Interface index or name
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// Resolve a service instance
    #[command(next_help_heading = "Resolve")]
    ResolveService {
        /// Instance name
        name: String,
        /// Service type, e.g. _http._tcp
        service_type: String,
        /// Domain (default domain if omitted)
        #[arg(default_value = "")]
        domain: String,
        /// Interface index or name
        #[arg(short, long)]
        interface: Option<String>,
        #[arg(short, long, value_enum, default_value = "unspec")]
        protocol: Protocol,
        /// Skip TXT data
        #[arg(long)]
        no_txt: bool,
    },

    // ============================================================
    // PUBLISH COMMANDS
    // ============================================================
    /// Register a service until interrupted
    #[command(next_help_heading = "Publish")]
    PublishService {
        /// Instance name
        name: String,
        /// Service type, e.g. _http._tcp
        service_type: String,
        port: u16,
        /// TXT entries, e.g. path=/index.html
        txt: Vec<String>,
        #[arg(long, default_value = "")]
        domain: String,
        /// Host the service runs on (this host if omitted)
        #[arg(long, default_value = "")]
        host: String,
        /// Subtype such as _printer._sub._http._tcp (repeatable)
        #[arg(long = "subtype")]
        subtypes: Vec<String>,
        /// Also publish NAME=ADDRESS in the same group (repeatable)
        #[arg(long = "address")]
        addresses: Vec<String>,
        /// Interface index or name
        #[arg(short, long)]
        interface: Option<String>,
        #[arg(short, long, value_enum, default_value = "unspec")]
        protocol: Protocol,
    },

    /// Register an address record until interrupted
    #[command(next_help_heading = "Publish")]
    PublishAddress {
        /// Host name, e.g. foo.local
        name: String,
        address: String,
    },

    // ============================================================
    // BROWSE COMMANDS
    // ============================================================
    /// Browse services of one type or of all types
    #[command(next_help_heading = "Browse")]
    Browse {
        /// Service type, e.g. _http._tcp
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        service_type: Option<String>,
        /// Show all services, regardless of the type
        #[arg(short, long)]
        all: bool,
        /// The domain to browse
        #[arg(short, long)]
        domain: Option<String>,
        /// Resolve services found
        #[arg(short, long)]
        resolve: bool,
        /// Terminate after getting a more or less complete list
        #[arg(short, long)]
        terminate: bool,
        /// Terminate after dumping all entries from the cache
        #[arg(short = 'c', long)]
        cache: bool,
        /// Ignore local services
        #[arg(short = 'l', long)]
        ignore_local: bool,
        /// Don't look up service type descriptions
        #[arg(short = 'k', long)]
        no_db_lookup: bool,
    },

    /// Browse service types
    #[command(next_help_heading = "Browse")]
    BrowseTypes {
        #[arg(short, long)]
        domain: Option<String>,
        #[arg(short, long)]
        terminate: bool,
        #[arg(short = 'k', long)]
        no_db_lookup: bool,
    },

    /// Browse domains
    #[command(next_help_heading = "Browse")]
    BrowseDomains {
        /// Which domains to enumerate
        #[arg(long, value_enum, default_value = "browse")]
        kind: DomainBrowserType,
        #[arg(short, long)]
        domain: Option<String>,
        #[arg(short, long)]
        terminate: bool,
    },

    // ============================================================
    // UTILITY COMMANDS
    // ============================================================
    /// Print the effective configuration
    #[command(next_help_heading = "Utility")]
    DumpConfig,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    setup_logging(&config.logging, args.verbose);

    if let Err(e) = run_command(args, config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Connect on demand so that local commands never touch the bus
async fn connect(bus: &BusConfig) -> Result<Arc<AvahiClient>> {
    Ok(Arc::new(AvahiClient::connect(bus).await?))
}

/// Accept either a numeric index or an interface name
async fn interface_arg(client: &AvahiClient, interface: Option<&str>) -> Result<i32> {
    match interface {
        None => Ok(IF_UNSPEC),
        Some(s) => match s.parse::<i32>() {
            Ok(index) => Ok(index),
            Err(_) => client.interface_index(s).await,
        },
    }
}

fn service_type_db(config: &Config, no_db_lookup: bool) -> Option<ServiceTypeDb> {
    if no_db_lookup || !config.browse.lookup_types {
        None
    } else {
        Some(ServiceTypeDb::with_overrides(&config.service_types))
    }
}

async fn run_command(args: Args, mut config: Config) -> Result<()> {
    let mode = if args.json {
        OutputMode::Json
    } else {
        OutputMode::Lines
    };

    if args.session {
        config.bus.kind = BusKind::Session;
        config.bus.address = None;
    }
    if let Some(address) = args.bus_address {
        config.bus.address = Some(address);
    }

    match args.command {
        Commands::Info => {
            let client = connect(&config.bus).await?;
            let info = client.server_info().await?;
            Printer::stdout(mode, None).server_info(&info)?;
        }
        Commands::State => {
            let client = connect(&config.bus).await?;
            let state = client.state().await?;
            Printer::stdout(mode, None).value("state", &state.to_string())?;
        }
        Commands::HostName => {
            let client = connect(&config.bus).await?;
            let name = client.host_name().await?;
            Printer::stdout(mode, None).value("host_name", &name)?;
        }
        Commands::DomainName => {
            let client = connect(&config.bus).await?;
            let name = client.domain_name().await?;
            Printer::stdout(mode, None).value("domain_name", &name)?;
        }
        Commands::Fqdn => {
            let client = connect(&config.bus).await?;
            let name = client.host_name_fqdn().await?;
            Printer::stdout(mode, None).value("host_name_fqdn", &name)?;
        }
        Commands::SetHostName { name } => {
            let client = connect(&config.bus).await?;
            client.set_host_name(&name).await?;
            let fqdn = client.host_name_fqdn().await?;
            Printer::stdout(mode, None).value("host_name_fqdn", &fqdn)?;
        }
        Commands::AlternativeHostName { name } => {
            let client = connect(&config.bus).await?;
            let alt = client.alternative_host_name(&name).await?;
            Printer::stdout(mode, None).value("host_name", &alt)?;
        }
        Commands::AlternativeServiceName { name } => {
            let client = connect(&config.bus).await?;
            let alt = client.alternative_service_name(&name).await?;
            Printer::stdout(mode, None).value("service_name", &alt)?;
        }
        Commands::InterfaceName { index } => {
            let client = connect(&config.bus).await?;
            let name = client
                .server()
                .get_network_interface_name_by_index(index)
                .await
                .map_err(AvahiError::from)?;
            Printer::stdout(mode, None).value("interface_name", &name)?;
        }
        Commands::InterfaceIndex { name } => {
            let client = connect(&config.bus).await?;
            let index = client.interface_index(&name).await?;
            Printer::stdout(mode, None).value("interface_index", &index.to_string())?;
        }
        Commands::ResolveHostName {
            name,
            interface,
            protocol,
            address_protocol,
        } => {
            let client = connect(&config.bus).await?;
            let interface = interface_arg(&client, interface.as_deref()).await?;
            let r = client
                .resolve_host_name(
                    interface,
                    protocol.raw(),
                    &name,
                    address_protocol.raw(),
                    lookup_flags::NONE,
                )
                .await?;
            Printer::stdout(mode, None).host_resolution(&r)?;
        }
        Commands::ResolveAddress { address, interface } => {
            let client = connect(&config.bus).await?;
            let interface = interface_arg(&client, interface.as_deref()).await?;
            let r = client
                .resolve_address(interface, Protocol::Unspec.raw(), &address, lookup_flags::NONE)
                .await?;
            Printer::stdout(mode, None).address_resolution(&r)?;
        }
        Commands::ResolveService {
            name,
            service_type,
            domain,
            interface,
            protocol,
            no_txt,
        } => {
            let client = connect(&config.bus).await?;
            let interface = interface_arg(&client, interface.as_deref()).await?;
            let flags = if no_txt {
                lookup_flags::NO_TXT
            } else {
                lookup_flags::NONE
            };
            let r = client
                .resolve_service(
                    interface,
                    protocol.raw(),
                    &name,
                    &service_type,
                    &domain,
                    Protocol::Unspec.raw(),
                    flags,
                )
                .await?;
            let ifname = client.interface_name(r.interface).await;
            let mut printer = Printer::stdout(mode, service_type_db(&config, false));
            printer.resolved(&ifname, &r)?;
        }
        Commands::PublishService {
            name,
            service_type,
            port,
            txt,
            domain,
            host,
            subtypes,
            addresses,
            interface,
            protocol,
        } => {
            let client = connect(&config.bus).await?;
            let interface = interface_arg(&client, interface.as_deref()).await?;
            let mut service = ServiceSpec::new(name, service_type, port);
            service.interface = interface;
            service.protocol = protocol;
            service.domain = domain;
            service.host = host;
            service.txt = txt;
            service.subtypes = subtypes;
            let addresses = addresses
                .iter()
                .map(|a| AddressSpec::parse(a))
                .collect::<Result<Vec<_>>>()?;

            let mut printer = Printer::stdout(mode, None);
            publish::publish(&client, vec![service], addresses, &mut printer).await?;
        }
        Commands::PublishAddress { name, address } => {
            let client = connect(&config.bus).await?;
            let spec = AddressSpec::parse(&format!("{}={}", name, address))?;
            let mut printer = Printer::stdout(mode, None);
            publish::publish(&client, Vec::new(), vec![spec], &mut printer).await?;
        }
        Commands::Browse {
            service_type,
            all,
            domain,
            resolve,
            terminate,
            cache,
            ignore_local,
            no_db_lookup,
        } => {
            let client = connect(&config.bus).await?;
            let domain = domain.unwrap_or_else(|| config.browse.domain.clone());
            let target = match service_type {
                Some(service_type) if !all => BrowseTarget::Type {
                    service_type,
                    domain,
                },
                _ => BrowseTarget::AllTypes { domain },
            };
            let options = BrowseOptions {
                verbose: args.verbose,
                resolve: resolve || config.browse.resolve,
                ignore_local: ignore_local || config.browse.ignore_local,
                terminate_on_all_for_now: terminate || config.browse.terminate,
                terminate_on_cache_exhausted: cache,
            };

            let mut printer = Printer::stdout(mode, service_type_db(&config, no_db_lookup));
            if args.verbose && mode == OutputMode::Lines {
                let version = client.version().await?;
                let host_name = client.host_name().await?;
                eprintln!("Server version: {}; Host name: {}\n", version, host_name);
            }
            browse::browse_services(client, target, options, &mut printer).await?;
        }
        Commands::BrowseTypes {
            domain,
            terminate,
            no_db_lookup,
        } => {
            let client = connect(&config.bus).await?;
            let domain = domain.unwrap_or_else(|| config.browse.domain.clone());
            let mut printer = Printer::stdout(mode, service_type_db(&config, no_db_lookup));
            browse::browse_types(
                client,
                &domain,
                terminate || config.browse.terminate,
                &mut printer,
            )
            .await?;
        }
        Commands::BrowseDomains {
            kind,
            domain,
            terminate,
        } => {
            let client = connect(&config.bus).await?;
            let domain = domain.unwrap_or_else(|| config.browse.domain.clone());
            let mut printer = Printer::stdout(mode, None);
            browse::browse_domains(
                client,
                &domain,
                kind,
                terminate || config.browse.terminate,
                &mut printer,
            )
            .await?;
        }
        Commands::DumpConfig => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_browse_requires_type_or_all() {
        assert!(Args::try_parse_from(["avahictl", "browse"]).is_err());
        assert!(Args::try_parse_from(["avahictl", "browse", "-a"]).is_ok());
        assert!(Args::try_parse_from(["avahictl", "browse", "_http._tcp", "-a"]).is_err());

        let args = Args::try_parse_from(["avahictl", "browse", "_ssh._tcp", "-r", "-t"]).unwrap();
        match args.command {
            Commands::Browse {
                service_type,
                resolve,
                terminate,
                ..
            } => {
                assert_eq!(service_type.as_deref(), Some("_ssh._tcp"));
                assert!(resolve && terminate);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_publish_service_arguments() {
        let args = Args::try_parse_from([
            "avahictl",
            "publish-service",
            "foo",
            "_http._tcp",
            "4712",
            "a=hallo",
            "b=mega",
            "--address",
            "foo.local=47.11.8.15",
        ])
        .unwrap();
        match args.command {
            Commands::PublishService {
                name,
                port,
                txt,
                addresses,
                protocol,
                ..
            } => {
                assert_eq!(name, "foo");
                assert_eq!(port, 4712);
                assert_eq!(txt, vec!["a=hallo", "b=mega"]);
                assert_eq!(addresses, vec!["foo.local=47.11.8.15"]);
                assert_eq!(protocol, Protocol::Unspec);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dump_config_does_not_connect() {
        let args = Args::try_parse_from([
            "avahictl",
            "--bus-address",
            "unix:path=/nonexistent/avahictl-test-bus",
            "dump-config",
        ])
        .unwrap();
        assert!(run_command(args, Config::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_daemon_commands_need_the_bus() {
        let args = Args::try_parse_from([
            "avahictl",
            "--bus-address",
            "unix:path=/nonexistent/avahictl-test-bus",
            "host-name",
        ])
        .unwrap();
        assert!(run_command(args, Config::default()).await.is_err());
    }

    #[test]
    fn test_session_conflicts_with_bus_address() {
        assert!(Args::try_parse_from([
            "avahictl",
            "--session",
            "--bus-address",
            "unix:path=/tmp/bus",
            "info"
        ])
        .is_err());
    }
}
