use std::sync::Arc;

use tailcode_shared::config::Config;

use crate::notify::Notify;
use crate::ssh::RemoteTransport;
use crate::tailscale::Liveness;
use crate::wol::{Broadcaster, Waker};

/// Shared by every request. The config is loaded once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Bearer token required on POST routes; `None` disables the check.
    pub token: Option<String>,
    pub liveness: Arc<dyn Liveness>,
    pub transport: Arc<dyn RemoteTransport>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub notifier: Arc<dyn Notify>,
}

impl AppState {
    pub fn waker(&self) -> Waker<'_> {
        Waker::new(
            &self.config,
            self.liveness.as_ref(),
            self.transport.as_ref(),
            self.broadcaster.as_ref(),
        )
    }
}
