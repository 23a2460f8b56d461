use tailcode_shared::device::{Device, Location, Role};
use tracing::{debug, warn};

use crate::tailscale::Liveness;

/// Pick the device that should send the magic packet on `target`'s behalf.
///
/// An explicit `wake_relay` on the target's location wins even when that
/// relay is offline. Otherwise the first always-on, online server in the
/// same location (config order) is used. Devices without a location share
/// the empty one. `None` means broadcast locally.
pub async fn select_relay<'a>(
    target: &Device,
    devices: &'a [Device],
    locations: &[Location],
    liveness: &dyn Liveness,
) -> Option<&'a Device> {
    if let Some(relay) = configured_relay(target, devices, locations) {
        debug!("Using configured relay {} for {}", relay.name, target.location);
        return Some(relay);
    }

    for device in devices.iter().filter(|d| d.role == Role::Server) {
        if device.name == target.name
            || device.location != target.location
            || !device.is_wake_relay()
        {
            continue;
        }
        if liveness.is_online(&device.hostname).await {
            return Some(device);
        }
        debug!("Relay candidate {} is offline", device.name);
    }
    None
}

fn configured_relay<'a>(
    target: &Device,
    devices: &'a [Device],
    locations: &[Location],
) -> Option<&'a Device> {
    let location = locations.iter().find(|l| l.name == target.location)?;
    let relay_name = location.wake_relay.as_deref()?;

    let Some(relay) = devices.iter().find(|d| d.name == relay_name) else {
        warn!(
            "Location {} names unknown wake relay {relay_name}",
            location.name
        );
        return None;
    };
    if relay.role != Role::Server || relay.name == target.name {
        warn!(
            "Ignoring wake relay {relay_name} for {}: not usable for {}",
            location.name, target.name
        );
        return None;
    }
    Some(relay)
}
