use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvahiError {
    #[error("D-Bus error: {0}")]
    Dbus(zbus::Error),

    /// Error reply sent by the daemon, e.g. `org.freedesktop.Avahi.TimeoutError`.
    #[error("{message} ({name})")]
    Daemon { name: String, message: String },

    #[error("Invalid {kind} value: {value}")]
    InvalidValue { kind: &'static str, value: i32 },

    #[error("Browser failure: {0}")]
    BrowserFailure(String),

    #[error("Failed to resolve service '{name}' of type '{service_type}' in domain '{domain}': {reason}")]
    ResolveFailed {
        name: String,
        service_type: String,
        domain: String,
        reason: String,
    },

    #[error("Entry group failure: {0}")]
    EntryGroupFailure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<zbus::Error> for AvahiError {
    fn from(err: zbus::Error) -> Self {
        match err {
            zbus::Error::MethodError(name, detail, _) => AvahiError::Daemon {
                message: detail.unwrap_or_else(|| name.to_string()),
                name: name.to_string(),
            },
            other => AvahiError::Dbus(other),
        }
    }
}

impl From<zbus::zvariant::Error> for AvahiError {
    fn from(err: zbus::zvariant::Error) -> Self {
        AvahiError::Dbus(zbus::Error::Variant(err))
    }
}

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Invalid C identifier: {0:?}")]
    InvalidSymbol(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AvahiError>;
