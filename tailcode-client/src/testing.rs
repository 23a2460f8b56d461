//! In-memory stand-ins for the mesh, the SSH transport, the broadcast
//! socket and the notifier.

use std::collections::HashSet;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::notify::{Notify, NotifyError};
use crate::ssh::{ExecOutput, RemoteTransport, TransportError};
use crate::tailscale::Liveness;
use crate::wol::{Broadcaster, MagicPacket};

/// Fixed set of online host names; remembers every query in order.
pub struct StaticLiveness {
    online: HashSet<String>,
    queried: Mutex<Vec<String>>,
}

impl StaticLiveness {
    pub fn online(hosts: &[&str]) -> Self {
        Self {
            online: hosts.iter().map(|h| h.to_string()).collect(),
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl Liveness for StaticLiveness {
    async fn is_online(&self, hostname: &str) -> bool {
        self.queried.lock().unwrap().push(hostname.to_string());
        self.online.contains(hostname)
    }
}

#[derive(Debug, Clone)]
pub enum TransportReply {
    Output(ExecOutput),
    Timeout,
    SpawnFailure,
}

/// Answers every `execute` with the same reply and records the call.
pub struct ScriptedTransport {
    reply: TransportReply,
    calls: Mutex<Vec<(String, String, Duration)>>,
}

impl ScriptedTransport {
    pub fn new(reply: TransportReply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(target, command, timeout)` per call.
    pub fn calls(&self) -> Vec<(String, String, Duration)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteTransport for ScriptedTransport {
    async fn execute(
        &self,
        target: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((target.to_string(), command.to_string(), timeout));
        match &self.reply {
            TransportReply::Output(output) => Ok(output.clone()),
            TransportReply::Timeout => Err(TransportError::Timeout(timeout)),
            TransportReply::SpawnFailure => Err(TransportError::Spawn {
                program: "ssh".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "not found"),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingBroadcaster {
    packets: Mutex<Vec<MagicPacket>>,
    fail: bool,
}

impl RecordingBroadcaster {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn packets(&self) -> Vec<MagicPacket> {
        self.packets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn broadcast(&self, packet: &MagicPacket) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "broadcast not permitted",
            ));
        }
        self.packets.lock().unwrap().push(packet.clone());
        Ok(())
    }
}

/// Collects `(message, title)` pairs.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notify for RecordingNotifier {
    async fn send(&self, message: &str, title: Option<&str>) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), title.map(str::to_string)));
        Ok(())
    }
}
