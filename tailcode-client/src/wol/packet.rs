//! Wake-on-LAN magic packet: 6 bytes of 0xFF, then the target's hardware
//! address repeated 16 times.

use super::WakeError;

pub const MAGIC_PACKET_LEN: usize = 6 + 6 * 16;

const MAC_SEPARATORS: [char; 3] = [':', '-', '.'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicPacket([u8; MAGIC_PACKET_LEN]);

impl MagicPacket {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Strip separators and return the 12 lowercase hex digits of `mac`.
pub fn normalize_mac(mac: &str) -> Result<String, WakeError> {
    let clean: String = mac.chars().filter(|c| !MAC_SEPARATORS.contains(c)).collect();
    if clean.len() != 12 || !clean.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WakeError::InvalidMac(mac.to_string()));
    }
    Ok(clean.to_ascii_lowercase())
}

pub fn parse_mac(mac: &str) -> Result<[u8; 6], WakeError> {
    let clean = normalize_mac(mac)?;
    let mut bytes = [0u8; 6];
    hex::decode_to_slice(&clean, &mut bytes).map_err(|_| WakeError::InvalidMac(mac.to_string()))?;
    Ok(bytes)
}

pub fn build_magic_packet(mac: &str) -> Result<MagicPacket, WakeError> {
    let address = parse_mac(mac)?;
    let mut packet = [0xFFu8; MAGIC_PACKET_LEN];
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&address);
    }
    Ok(MagicPacket(packet))
}
