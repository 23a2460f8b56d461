use std::io;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use super::packet::{MagicPacket, build_magic_packet};

/// Sends a magic packet on the network segment this process is on.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, packet: &MagicPacket) -> io::Result<()>;
}

/// Single fire-and-forget UDP datagram to a broadcast address.
pub struct UdpBroadcaster {
    address: String,
    port: u16,
}

impl UdpBroadcaster {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

#[async_trait]
impl Broadcaster for UdpBroadcaster {
    async fn broadcast(&self, packet: &MagicPacket) -> io::Result<()> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.set_broadcast(true)?;
        let sent = socket
            .send_to(packet.as_bytes(), (self.address.as_str(), self.port))
            .await?;
        if sent != packet.as_bytes().len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short send: {sent} bytes"),
            ));
        }
        debug!("Sent magic packet to {}:{}", self.address, self.port);
        Ok(())
    }
}

/// Build and broadcast a magic packet. Any failure, including a malformed
/// MAC, is reported as `false`.
pub async fn send_local_broadcast(mac: &str, address: &str, port: u16) -> bool {
    let packet = match build_magic_packet(mac) {
        Ok(p) => p,
        Err(e) => {
            warn!("{e}");
            return false;
        }
    };
    match UdpBroadcaster::new(address, port).broadcast(&packet).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to send WoL packet to {address}:{port}: {e}");
            false
        }
    }
}
