//! Bootstrap a config from the peers Tailscale already knows about.

use tailcode_shared::device::Role;

use crate::tailscale::{PeerStatus, TailscaleStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub hostname: String,
    /// First label of the MagicDNS name.
    pub name: String,
    pub ip: String,
    pub os: String,
    pub online: bool,
    pub is_self: bool,
}

impl DiscoveredDevice {
    fn from_peer(peer: &PeerStatus, is_self: bool) -> Self {
        Self {
            hostname: peer.host_name.clone(),
            name: peer.dns_name.split('.').next().unwrap_or_default().to_string(),
            ip: peer.tailscale_ips.first().cloned().unwrap_or_default(),
            os: peer.os.clone(),
            online: is_self || peer.online,
            is_self,
        }
    }

    /// Config key: the DNS label (or host name) lowercased, without `-`/`_`.
    pub fn config_key(&self) -> String {
        let base = if self.name.is_empty() {
            &self.hostname
        } else {
            &self.name
        };
        base.chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase()
    }
}

/// This node first, then its peers.
pub fn discover(status: &TailscaleStatus) -> Vec<DiscoveredDevice> {
    status
        .self_node
        .iter()
        .map(|node| DiscoveredDevice::from_peer(node, true))
        .chain(
            status
                .peers
                .values()
                .map(|peer| DiscoveredDevice::from_peer(peer, false)),
        )
        .collect()
}

pub fn guess_role(device: &DiscoveredDevice) -> Role {
    let os = device.os.to_lowercase();
    let hostname = device.hostname.to_lowercase();

    if os.contains("ios") || hostname.contains("ipad") || hostname.contains("iphone") {
        return Role::Client;
    }
    if os.contains("darwin") || os.contains("macos") || hostname.contains("mac") {
        return Role::Server;
    }
    if os.contains("linux") {
        return Role::Server;
    }
    if os.contains("windows") {
        return Role::Client;
    }
    Role::Server
}

/// Starter config with placeholders for what discovery can't know
/// (MAC addresses, locations).
pub fn generate_config_yaml(devices: &[DiscoveredDevice], user: &str) -> String {
    let mut lines = vec![
        "# Auto-generated Tailcode config".to_string(),
        "# Review and customize as needed".to_string(),
        String::new(),
        "devices:".to_string(),
    ];
    let mut servers = Vec::new();

    for device in devices.iter().filter(|d| !d.hostname.is_empty()) {
        let key = device.config_key();
        let role = guess_role(device);

        lines.push(format!("  {key}:"));
        lines.push(format!("    hostname: \"{}\"", device.hostname));
        if role == Role::Server && !user.is_empty() {
            lines.push(format!("    user: \"{user}\""));
        }
        lines.push(format!("    role: {role}"));
        if role == Role::Server {
            lines.push("    mac: \"\"  # Fill in for Wake-on-LAN".to_string());
            servers.push(key);
        }
        let os = device.os.to_lowercase();
        if os.contains("darwin") || os.contains("macos") {
            lines.push("    location: \"\"  # home, office, mobile, etc.".to_string());
        }
        lines.push(String::new());
    }

    let default_device = servers.first().map(String::as_str).unwrap_or_default();
    lines.extend([
        "preferences:".to_string(),
        format!("  default_device: \"{default_device}\""),
        "  auto_wake: true".to_string(),
        String::new(),
        "ssh:".to_string(),
        "  use_tailscale_ssh: true".to_string(),
        "  session_name: \"ai\"".to_string(),
        String::new(),
        "notifications:".to_string(),
        "  provider: ntfy".to_string(),
        "  ntfy:".to_string(),
        "    server: \"https://ntfy.sh\"".to_string(),
        "    topic: \"tailcode-alerts\"  # Change this!".to_string(),
    ]);
    lines.join("\n") + "\n"
}
