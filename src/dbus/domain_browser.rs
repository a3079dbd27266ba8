//! # D-Bus interface proxy for: `org.freedesktop.Avahi.DomainBrowser`
//!
//! Signals are not declared here; they are consumed as one ordered message
//! stream per browser, see [`crate::browse::events`].

use zbus::proxy;

#[proxy(
    interface = "org.freedesktop.Avahi.DomainBrowser",
    default_service = "org.freedesktop.Avahi"
)]
pub trait DomainBrowser {
    /// Free method
    fn free(&self) -> zbus::Result<()>;

    /// Start method
    fn start(&self) -> zbus::Result<()>;
}
