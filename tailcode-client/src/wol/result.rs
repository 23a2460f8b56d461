use std::fmt::{self, Display};

use tailcode_shared::webhook::WakeResponse;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WakeError {
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    /// No MAC configured, or a client-role device.
    #[error("{device} {reason}")]
    MissingCapability { device: String, reason: &'static str },
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
    #[error("invalid broadcast address: {0}")]
    InvalidBroadcast(String),
    #[error("failed to send WoL packet: {0}")]
    LocalSendFailure(String),
    /// The relay did not answer within the bound; delivery is unknown.
    #[error("timeout")]
    RelayTimeout,
    #[error("relay failed: {0}")]
    RelayExecutionFailure(String),
}

impl WakeError {
    pub fn no_mac(device: &str) -> Self {
        WakeError::MissingCapability {
            device: device.to_string(),
            reason: "has no MAC address configured",
        }
    }

    pub fn client_device(device: &str) -> Self {
        WakeError::MissingCapability {
            device: device.to_string(),
            reason: "is a client device and can't be woken",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeMethod {
    Local,
    Relay(String),
}

impl Display for WakeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WakeMethod::Local => f.write_str("local"),
            WakeMethod::Relay(name) => write!(f, "relay:{name}"),
        }
    }
}

/// Outcome of one wake attempt. Failures are carried here instead of being
/// returned as `Err`, so every caller renders them the same way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WakeResult {
    pub success: bool,
    pub method: Option<WakeMethod>,
    pub error: Option<WakeError>,
    /// Output captured from the relay, empty for local sends.
    pub stdout: String,
    pub stderr: String,
}

impl WakeResult {
    pub fn failed(error: WakeError) -> Self {
        WakeResult {
            success: false,
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn method_tag(&self) -> Option<String> {
        self.method.as_ref().map(ToString::to_string)
    }

    pub fn to_response(&self) -> WakeResponse {
        WakeResponse {
            ok: self.success,
            method: self.method_tag(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tags() {
        assert_eq!(WakeMethod::Local.to_string(), "local");
        assert_eq!(
            WakeMethod::Relay("gateway".to_string()).to_string(),
            "relay:gateway"
        );
    }

    #[test]
    fn test_timeout_message_is_bare() {
        assert_eq!(WakeError::RelayTimeout.to_string(), "timeout");
    }

    #[test]
    fn test_capability_messages() {
        assert_eq!(
            WakeError::no_mac("nas").to_string(),
            "nas has no MAC address configured"
        );
        assert_eq!(
            WakeError::client_device("phone").to_string(),
            "phone is a client device and can't be woken"
        );
    }

    #[test]
    fn test_failed_result_response() {
        let result = WakeResult::failed(WakeError::InvalidMac("zz".to_string()));
        assert!(!result.success);
        assert_eq!(result.error_message().as_deref(), Some("invalid MAC address: zz"));
        assert_eq!(
            result.to_response(),
            WakeResponse {
                ok: false,
                method: None
            }
        );
    }
}
