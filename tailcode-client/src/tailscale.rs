//! Peer liveness from the local `tailscale` daemon.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Answers "is this host up on the mesh right now". Every call may do I/O.
#[async_trait]
pub trait Liveness: Send + Sync {
    async fn is_online(&self, hostname: &str) -> bool;
}

/// Subset of `tailscale status --json`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TailscaleStatus {
    #[serde(rename = "Self", default)]
    pub self_node: Option<PeerStatus>,
    #[serde(rename = "Peer", default, deserialize_with = "null_as_default")]
    pub peers: BTreeMap<String, PeerStatus>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PeerStatus {
    #[serde(rename = "HostName")]
    pub host_name: String,
    #[serde(rename = "DNSName")]
    pub dns_name: String,
    #[serde(rename = "TailscaleIPs", deserialize_with = "null_as_default")]
    pub tailscale_ips: Vec<String>,
    #[serde(rename = "OS")]
    pub os: String,
    #[serde(rename = "Online")]
    pub online: bool,
}

// tailscale writes `null` instead of `{}`/`[]` for empty collections
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TailscaleStatus {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse tailscale status")
    }

    /// Online flag of the first peer whose host name contains `hostname`
    /// or is contained in it. Unknown hosts are offline.
    pub fn is_peer_online(&self, hostname: &str) -> bool {
        if hostname.is_empty() {
            return false;
        }
        self.peers
            .values()
            .find(|p| {
                !p.host_name.is_empty()
                    && (p.host_name.contains(hostname) || hostname.contains(&p.host_name))
            })
            .is_some_and(|p| p.online)
    }
}

/// Run `tailscale status --json` on this machine.
pub async fn status() -> Result<TailscaleStatus> {
    let output = tokio::time::timeout(
        STATUS_TIMEOUT,
        Command::new("tailscale")
            .args(["status", "--json"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .context("tailscale status timed out")?
    .context("Failed to run tailscale")?;

    if !output.status.success() {
        bail!(
            "tailscale status failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    TailscaleStatus::parse(&String::from_utf8_lossy(&output.stdout))
}

/// Liveness backed by a fresh `tailscale status` per query.
#[derive(Debug, Clone, Default)]
pub struct TailscaleCli;

#[async_trait]
impl Liveness for TailscaleCli {
    async fn is_online(&self, hostname: &str) -> bool {
        match status().await {
            Ok(status) => status.is_peer_online(hostname),
            Err(e) => {
                debug!("Treating {hostname} as offline: {e:#}");
                false
            }
        }
    }
}
