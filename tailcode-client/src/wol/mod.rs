//! Wake-on-LAN delivery: local broadcast, or a relayed send through an
//! always-on peer on the target's own segment.

pub mod dispatch;
pub mod local;
pub mod packet;
pub mod relay;
mod result;

use std::time::Duration;

use tailcode_shared::{config::Config, device::Device};
use tracing::{info, warn};

use crate::ssh::RemoteTransport;
use crate::tailscale::Liveness;

pub use local::{Broadcaster, UdpBroadcaster, send_local_broadcast};
pub use packet::{MagicPacket, build_magic_packet};
pub use relay::select_relay;
pub use result::{WakeError, WakeMethod, WakeResult};

/// Everything a wake needs, borrowed for the duration of the call.
pub struct Waker<'a> {
    config: &'a Config,
    liveness: &'a dyn Liveness,
    transport: &'a dyn RemoteTransport,
    broadcaster: &'a dyn Broadcaster,
}

impl<'a> Waker<'a> {
    pub fn new(
        config: &'a Config,
        liveness: &'a dyn Liveness,
        transport: &'a dyn RemoteTransport,
        broadcaster: &'a dyn Broadcaster,
    ) -> Self {
        Self {
            config,
            liveness,
            transport,
            broadcaster,
        }
    }

    /// Check the device can be woken and choose its relay, if any.
    pub async fn plan(&self, device: &Device) -> Result<Option<&'a Device>, WakeError> {
        check_capability(device)?;
        Ok(select_relay(
            device,
            &self.config.devices,
            &self.config.locations,
            self.liveness,
        )
        .await)
    }

    pub async fn wake(&self, device: &Device) -> WakeResult {
        match self.plan(device).await {
            Ok(relay) => self.deliver(device, relay).await,
            Err(e) => {
                warn!("Not waking {}: {e}", device.name);
                WakeResult::failed(e)
            }
        }
    }

    pub async fn wake_by_name(&self, name: &str) -> WakeResult {
        match self.config.device(name) {
            Some(device) => self.wake(device).await,
            None => WakeResult::failed(WakeError::UnknownDevice(name.to_string())),
        }
    }

    /// Send the packet along an already planned path. No retries.
    pub async fn deliver(&self, device: &Device, relay: Option<&Device>) -> WakeResult {
        if let Err(e) = check_capability(device) {
            return WakeResult::failed(e);
        }
        let Some(mac) = device.mac.as_deref() else {
            return WakeResult::failed(WakeError::no_mac(&device.name));
        };

        match relay {
            Some(relay) => {
                info!("Waking {} via relay {}", device.name, relay.name);
                let outcome = dispatch::dispatch_relayed_wake(
                    mac,
                    &relay.ssh_target(),
                    &self.config.wol.broadcast,
                    self.config.wol.port,
                    self.transport,
                    Duration::from_secs(self.config.wol.relay_timeout_secs),
                )
                .await;
                WakeResult {
                    success: outcome.success,
                    method: Some(WakeMethod::Relay(relay.name.clone())),
                    error: outcome.error,
                    stdout: outcome.stdout,
                    stderr: outcome.stderr,
                }
            }
            None => {
                info!("Waking {} by local broadcast", device.name);
                match self.send_local(mac).await {
                    Ok(()) => WakeResult {
                        success: true,
                        method: Some(WakeMethod::Local),
                        ..Default::default()
                    },
                    Err(e) => {
                        warn!("Local wake of {} failed: {e}", device.name);
                        WakeResult::failed(e)
                    }
                }
            }
        }
    }

    async fn send_local(&self, mac: &str) -> Result<(), WakeError> {
        let packet = build_magic_packet(mac)?;
        self.broadcaster
            .broadcast(&packet)
            .await
            .map_err(|e| WakeError::LocalSendFailure(e.to_string()))
    }
}

fn check_capability(device: &Device) -> Result<(), WakeError> {
    if !device.can_connect() {
        return Err(WakeError::client_device(&device.name));
    }
    if !device.can_wake() {
        return Err(WakeError::no_mac(&device.name));
    }
    Ok(())
}
