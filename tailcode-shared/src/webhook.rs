//! JSON bodies exchanged with automation clients (phone shortcuts and the
//! like). Field names are part of the public contract.

use serde::{Deserialize, Serialize};

use crate::device::Role;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WakeRequest {
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WakeResponse {
    pub ok: bool,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub name: String,
    pub hostname: String,
    pub online: bool,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub devices: Vec<DeviceStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wake_response_shape() {
        let body = serde_json::to_value(WakeResponse {
            ok: true,
            method: Some("relay:gateway".to_string()),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"ok": true, "method": "relay:gateway"}));

        // a failed wake still carries an explicit null method
        let body = serde_json::to_value(WakeResponse {
            ok: false,
            method: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"ok": false, "method": null}));
    }

    #[test]
    fn test_requests_tolerate_missing_fields() {
        let wake: WakeRequest = serde_json::from_str("{}").unwrap();
        assert!(wake.device.is_none());

        let notify: NotifyRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(notify.message.as_deref(), Some("hi"));
        assert!(notify.title.is_none());
    }

    #[test]
    fn test_device_status_role_is_lowercase() {
        let status = DeviceStatus {
            name: "nas".to_string(),
            hostname: "nas".to_string(),
            online: false,
            role: Role::Server,
        };
        let body = serde_json::to_value(status).unwrap();
        assert_eq!(body["role"], "server");
    }
}
