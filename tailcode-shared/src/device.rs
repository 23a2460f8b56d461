use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Server,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A machine on the mesh, keyed by its user-chosen short name.
///
/// Built once from the config file and never mutated afterwards. The MAC is
/// kept exactly as written; it is only validated when a wake is attempted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub hostname: String,
    pub user: String,
    pub mac: Option<String>,
    pub role: Role,
    pub location: String,
    pub always_on: bool,
}

/// Raw `devices.<name>` record as it appears in the config file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DeviceEntry {
    pub hostname: Option<String>,
    pub user: String,
    pub mac: Option<String>,
    pub role: Role,
    pub location: String,
    pub always_on: bool,
}

impl Device {
    /// Server-role device with every optional field defaulted.
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            user: String::new(),
            mac: None,
            role: Role::Server,
            location: String::new(),
            always_on: false,
        }
    }

    pub fn from_entry(name: &str, entry: DeviceEntry) -> Self {
        Self {
            name: name.to_string(),
            hostname: entry.hostname.unwrap_or_else(|| name.to_string()),
            user: entry.user,
            // `mac: ""` is what `tc discover` writes as a placeholder
            mac: entry.mac.filter(|m| !m.trim().is_empty()),
            role: entry.role,
            location: entry.location,
            always_on: entry.always_on,
        }
    }

    pub fn can_wake(&self) -> bool {
        self.mac.is_some() && self.role == Role::Server
    }

    pub fn can_connect(&self) -> bool {
        self.role == Role::Server
    }

    pub fn is_wake_relay(&self) -> bool {
        self.always_on && self.role == Role::Server
    }

    /// `user@hostname`, or the bare hostname when no user is configured.
    pub fn ssh_target(&self) -> String {
        if self.user.is_empty() {
            self.hostname.clone()
        } else {
            format!("{}@{}", self.user, self.hostname)
        }
    }
}

/// A named network segment.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    /// Device that must relay wakes for this segment, overriding inference.
    pub wake_relay: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LocationEntry {
    pub wake_relay: Option<String>,
}

impl Location {
    pub fn from_entry(name: &str, entry: LocationEntry) -> Self {
        Self {
            name: name.to_string(),
            wake_relay: entry.wake_relay.filter(|r| !r.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_defaults() {
        let device = Device::from_entry("nas", DeviceEntry::default());
        assert_eq!(device.hostname, "nas");
        assert_eq!(device.user, "");
        assert_eq!(device.role, Role::Server);
        assert_eq!(device.location, "");
        assert!(device.mac.is_none());
        assert!(!device.always_on);
    }

    #[test]
    fn test_empty_mac_is_absent() {
        let entry = DeviceEntry {
            mac: Some("".to_string()),
            ..Default::default()
        };
        let device = Device::from_entry("nas", entry);
        assert!(device.mac.is_none());
        assert!(!device.can_wake());
    }

    #[test]
    fn test_capabilities() {
        let mut device = Device::new("studio", "mac-studio");
        assert!(!device.can_wake());
        assert!(device.can_connect());
        assert!(!device.is_wake_relay());

        device.mac = Some("AA:BB:CC:DD:EE:FF".to_string());
        device.always_on = true;
        assert!(device.can_wake());
        assert!(device.is_wake_relay());

        // client role removes every capability
        device.role = Role::Client;
        assert!(!device.can_wake());
        assert!(!device.can_connect());
        assert!(!device.is_wake_relay());
    }

    #[test]
    fn test_ssh_target() {
        let mut device = Device::new("nas", "nas.tail1234.ts.net");
        assert_eq!(device.ssh_target(), "nas.tail1234.ts.net");
        device.user = "admin".to_string();
        assert_eq!(device.ssh_target(), "admin@nas.tail1234.ts.net");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Server.to_string(), "server");
        assert_eq!(Role::Client.to_string(), "client");
    }
}
