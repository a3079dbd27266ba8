//! zbus proxies for the `org.freedesktop.Avahi` interfaces we call.
//!
//! Signatures follow the daemon's introspection data. Browsers are created
//! through `Server2`'s `*Prepare` methods so that signal subscriptions can be
//! set up before `Start` is called and no early item is lost.

pub mod domain_browser;
pub mod entry_group;
pub mod server;
pub mod service_browser;
pub mod service_type_browser;

pub use domain_browser::DomainBrowserProxy;
pub use entry_group::EntryGroupProxy;
pub use server::{Server2Proxy, ServerProxy};
pub use service_browser::ServiceBrowserProxy;
pub use service_type_browser::ServiceTypeBrowserProxy;
