//! Human-readable descriptions of well-known DNS-SD service types.

use std::collections::{BTreeMap, HashMap};

const BUILTIN: &[(&str, &str)] = &[
    ("_afpovertcp._tcp", "Apple File Sharing"),
    ("_daap._tcp", "iTunes Audio Access"),
    ("_dacp._tcp", "iTunes Remote Control"),
    ("_distcc._tcp", "Distributed Compiler"),
    ("_domain._udp", "DNS Server"),
    ("_ftp._tcp", "FTP File Transfer"),
    ("_home-sharing._tcp", "Apple Home Sharing"),
    ("_http._tcp", "Web Site"),
    ("_https._tcp", "Secure Web Site"),
    ("_ipp._tcp", "Internet Printer"),
    ("_ldap._tcp", "LDAP Directory Server"),
    ("_mpd._tcp", "Music Player Daemon"),
    ("_nfs._tcp", "Network File System"),
    ("_ntp._udp", "NTP Time Server"),
    ("_pdl-datastream._tcp", "PDL Printer"),
    ("_postgresql._tcp", "PostgreSQL Server"),
    ("_presence._tcp", "iChat Presence"),
    ("_printer._tcp", "UNIX Printer"),
    ("_pulse-server._tcp", "PulseAudio Sound Server"),
    ("_raop._tcp", "AirTunes Remote Audio"),
    ("_rfb._tcp", "VNC Remote Access"),
    ("_sftp-ssh._tcp", "SFTP File Transfer"),
    ("_smb._tcp", "Microsoft Windows Network"),
    ("_ssh._tcp", "SSH Remote Terminal"),
    ("_svn._tcp", "Subversion Revision Control"),
    ("_telnet._tcp", "Telnet Remote Terminal"),
    ("_webdav._tcp", "WebDAV File Share"),
    ("_workstation._tcp", "Workstation"),
];

#[derive(Clone, Debug)]
pub struct ServiceTypeDb {
    entries: HashMap<String, String>,
}

impl ServiceTypeDb {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(t, d)| (t.to_string(), d.to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in entries, with `overrides` replacing or extending them
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut db = Self::builtin();
        for (service_type, description) in overrides {
            db.entries
                .insert(normalize(service_type), description.clone());
        }
        tracing::debug!(
            entries = db.entries.len(),
            overrides = overrides.len(),
            "Service type descriptions loaded"
        );
        db
    }

    /// Description for `service_type`, or the type itself when unknown
    pub fn lookup<'a>(&'a self, service_type: &'a str) -> &'a str {
        self.entries
            .get(&normalize(service_type))
            .map(String::as_str)
            .unwrap_or(service_type)
    }
}

impl Default for ServiceTypeDb {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize(service_type: &str) -> String {
    service_type.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let db = ServiceTypeDb::builtin();
        assert_eq!(db.lookup("_http._tcp"), "Web Site");
        assert_eq!(db.lookup("_SSH._tcp."), "SSH Remote Terminal");
        assert_eq!(db.entries.len(), BUILTIN.len());
    }

    #[test]
    fn test_unknown_type_passes_through() {
        let db = ServiceTypeDb::builtin();
        assert_eq!(db.lookup("_frobnicate._udp"), "_frobnicate._udp");
    }

    #[test]
    fn test_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("_http._tcp".to_string(), "Intranet".to_string());
        overrides.insert("_Foo._tcp".to_string(), "Foo Server".to_string());
        let db = ServiceTypeDb::with_overrides(&overrides);
        assert_eq!(db.lookup("_http._tcp"), "Intranet");
        assert_eq!(db.lookup("_foo._tcp"), "Foo Server");
        assert_eq!(db.entries.len(), BUILTIN.len() + 1);
    }
}
