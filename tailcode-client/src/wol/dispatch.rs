use std::net::Ipv4Addr;
use std::time::Duration;

use tracing::{debug, warn};

use super::WakeError;
use super::packet::normalize_mac;
use crate::ssh::{RemoteTransport, TransportError};

/// What came back from the relay.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelayOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub error: Option<WakeError>,
}

/// Shell command that makes the relay build and broadcast the packet itself.
/// Only a normalized MAC and a parsed IPv4 address reach the remote shell.
pub fn relay_command(mac: &str, broadcast: &str, port: u16) -> Result<String, WakeError> {
    let hex = normalize_mac(mac)?;
    let broadcast: Ipv4Addr = broadcast
        .trim()
        .parse()
        .map_err(|_| WakeError::InvalidBroadcast(broadcast.to_string()))?;
    Ok(format!(
        "python3 -c \"import socket; s=socket.socket(socket.AF_INET,socket.SOCK_DGRAM); \
         s.setsockopt(socket.SOL_SOCKET,socket.SO_BROADCAST,1); \
         s.sendto(bytes.fromhex('ff'*6+'{hex}'*16),('{broadcast}',{port})); print('sent')\""
    ))
}

/// Run the wake payload on `relay_target` (`user@host` or `host`).
///
/// The relay's exit status is the only feedback; WoL itself has no ack.
pub async fn dispatch_relayed_wake(
    mac: &str,
    relay_target: &str,
    broadcast: &str,
    port: u16,
    transport: &dyn RemoteTransport,
    timeout: Duration,
) -> RelayOutcome {
    let command = match relay_command(mac, broadcast, port) {
        Ok(c) => c,
        Err(e) => {
            return RelayOutcome {
                error: Some(e),
                ..Default::default()
            };
        }
    };
    debug!("Relaying wake through {relay_target}: {command}");

    match transport.execute(relay_target, &command, timeout).await {
        Ok(output) if output.success() => RelayOutcome {
            success: true,
            stdout: output.stdout,
            stderr: output.stderr,
            error: None,
        },
        Ok(output) => {
            let detail = match output.stderr.trim() {
                "" => match output.exit_code {
                    Some(code) => format!("{relay_target} exited with status {code}"),
                    None => format!("{relay_target} was terminated by a signal"),
                },
                stderr => stderr.to_string(),
            };
            warn!("Relayed wake via {relay_target} failed: {detail}");
            RelayOutcome {
                success: false,
                stdout: output.stdout,
                stderr: output.stderr,
                error: Some(WakeError::RelayExecutionFailure(detail)),
            }
        }
        Err(TransportError::Timeout(_)) => {
            warn!("Relayed wake via {relay_target} timed out after {timeout:?}");
            RelayOutcome {
                error: Some(WakeError::RelayTimeout),
                ..Default::default()
            }
        }
        Err(e) => RelayOutcome {
            error: Some(WakeError::RelayExecutionFailure(e.to_string())),
            ..Default::default()
        },
    }
}
