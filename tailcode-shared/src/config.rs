use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::device::{Device, DeviceEntry, Location, LocationEntry, Role};

/// Parsed config file. Loaded once per process and read-only afterwards.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Devices in the order they are written in the file.
    #[serde(deserialize_with = "deserialize_devices")]
    pub devices: Vec<Device>,
    #[serde(deserialize_with = "deserialize_locations")]
    pub locations: Vec<Location>,
    pub ssh: SshConfig,
    pub wol: WolConfig,
    pub notifications: NotificationConfig,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    pub use_tailscale_ssh: bool,
    pub session_name: String,
    pub timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        SshConfig {
            use_tailscale_ssh: true,
            session_name: "ai".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WolConfig {
    pub broadcast: String,
    pub port: u16,
    pub relay_timeout_secs: u64,
}

impl Default for WolConfig {
    fn default() -> Self {
        WolConfig {
            broadcast: "255.255.255.255".to_string(),
            port: 9,
            relay_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub provider: String,
    pub ntfy: NtfyConfig,
    pub pushover: PushoverConfig,
    pub telegram: TelegramConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            provider: "ntfy".to_string(),
            ntfy: NtfyConfig::default(),
            pushover: PushoverConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NtfyConfig {
    pub server: String,
    pub topic: String,
}

impl Default for NtfyConfig {
    fn default() -> Self {
        NtfyConfig {
            server: "https://ntfy.sh".to_string(),
            topic: "tailcode-alerts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PushoverConfig {
    pub app_token: String,
    pub user_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub default_device: String,
    pub default_tool: String,
    pub auto_wake: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            default_device: String::new(),
            default_tool: "opencode".to_string(),
            auto_wake: true,
        }
    }
}

impl Config {
    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub fn servers(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| d.role == Role::Server)
    }

    /// Preferred device if one is set, otherwise the first server.
    pub fn default_device(&self) -> Option<&Device> {
        if !self.preferences.default_device.is_empty() {
            return self.device(&self.preferences.default_device);
        }
        self.servers().next()
    }

    pub fn location(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }
}

/// Visits a YAML/JSON map in document order, tolerating a null map and null
/// values (`devices:` or `laptop:` with nothing under it).
struct OrderedEntries<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for OrderedEntries<T>
where
    T: Deserialize<'de> + Default,
{
    type Value = Vec<(String, T)>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of named entries")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Option<T>>()? {
            entries.push((key, value.unwrap_or_default()));
        }
        Ok(entries)
    }
}

fn deserialize_devices<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Device>, D::Error> {
    let entries = deserializer.deserialize_any(OrderedEntries::<DeviceEntry>(PhantomData))?;
    Ok(entries
        .into_iter()
        .map(|(name, entry)| Device::from_entry(&name, entry))
        .collect())
}

fn deserialize_locations<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Location>, D::Error> {
    let entries = deserializer.deserialize_any(OrderedEntries::<LocationEntry>(PhantomData))?;
    Ok(entries
        .into_iter()
        .map(|(name, entry)| Location::from_entry(&name, entry))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
devices:
  zeta:
    hostname: zeta-box
    mac: "AA:BB:CC:DD:EE:FF"
    location: office
  alpha:
    hostname: alpha-box
    always_on: true
    location: office
  phone:
    role: client
  bare:
locations:
  office:
    wake_relay: alpha
  garage:
preferences:
  auto_wake: false
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.devices.is_empty());
        assert_eq!(config.wol.broadcast, "255.255.255.255");
        assert_eq!(config.wol.port, 9);
        assert_eq!(config.wol.relay_timeout_secs, 30);
        assert!(config.ssh.use_tailscale_ssh);
        assert_eq!(config.ssh.session_name, "ai");
        assert_eq!(config.notifications.provider, "ntfy");
        assert_eq!(config.notifications.ntfy.server, "https://ntfy.sh");
        assert!(config.preferences.auto_wake);
    }

    #[test]
    fn test_devices_keep_file_order() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();
        let names: Vec<&str> = config.devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "phone", "bare"]);
    }

    #[test]
    fn test_parse_sample() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();

        let zeta = config.device("zeta").unwrap();
        assert!(zeta.can_wake());
        assert_eq!(zeta.location, "office");

        let phone = config.device("phone").unwrap();
        assert_eq!(phone.role, Role::Client);
        assert_eq!(phone.hostname, "phone");

        let bare = config.device("bare").unwrap();
        assert_eq!(bare.hostname, "bare");

        assert_eq!(
            config.location("office").unwrap().wake_relay.as_deref(),
            Some("alpha")
        );
        assert!(config.location("garage").unwrap().wake_relay.is_none());
        assert!(!config.preferences.auto_wake);
        // untouched sections keep their defaults
        assert_eq!(config.ssh.session_name, "ai");
    }

    #[test]
    fn test_default_device() {
        let mut config: Config = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.default_device().unwrap().name, "zeta");

        config.preferences.default_device = "alpha".to_string();
        assert_eq!(config.default_device().unwrap().name, "alpha");

        config.preferences.default_device = "missing".to_string();
        assert!(config.default_device().is_none());
    }

    #[test]
    fn test_servers_skip_clients() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();
        assert!(config.servers().all(|d| d.name != "phone"));
        assert_eq!(config.servers().count(), 3);
    }

    #[test]
    fn test_empty_document_sections() {
        let config: Config = serde_yaml::from_str("devices:\nlocations:\n").unwrap();
        assert!(config.devices.is_empty());
        assert!(config.locations.is_empty());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("devices:\n  x:\n    role: toaster\n");
        assert!(result.is_err());
    }
}
