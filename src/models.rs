use std::fmt;
use std::str::FromStr;

use crate::error::PayloadError;

/// Length of the vendor payload that follows the identifier.
pub const PAYLOAD_LEN: usize = 13;

/// Length of a Bluetooth hardware address.
pub const ADDRESS_LEN: usize = 6;

/// Bluetooth hardware address, most significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareAddress([u8; ADDRESS_LEN]);

impl HardwareAddress {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl FromStr for HardwareAddress {
    type Err = PayloadError;

    /// Parse the canonical `AA:BB:CC:DD:EE:FF` form (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PayloadError::InvalidAddress(s.to_string());

        let mut bytes = [0u8; ADDRESS_LEN];
        let mut groups = s.trim().split(':');
        for byte in bytes.iter_mut() {
            let group = groups.next().ok_or_else(invalid)?;
            if group.len() != 2 {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
        }
        if groups.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(bytes))
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

/// The 16-bit field BLE stacks report as the company identifier.
///
/// The scale only keeps the low byte constant; the high byte carries the
/// upper half of the packet counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VendorIdentifier {
    /// Low byte, constant per vendor.
    pub tag: u8,
    /// High byte, packet counter high half.
    pub data: u8,
}

impl VendorIdentifier {
    /// Tag observed in the low byte of pre-split manufacturer data.
    pub const VENDOR_TAG: u8 = 0xC0;

    pub const fn from_u16(value: u16) -> Self {
        Self {
            tag: (value & 0xFF) as u8,
            data: (value >> 8) as u8,
        }
    }

    /// Identifier rebuilt around the constant tag.
    pub const fn with_data(data: u8) -> Self {
        Self {
            tag: Self::VENDOR_TAG,
            data,
        }
    }

    pub const fn as_u16(&self) -> u16 {
        ((self.data as u16) << 8) | self.tag as u16
    }
}

/// One advertisement event as handed over by the BLE observation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: HardwareAddress,
    pub rssi: i16,
    /// Full on-air advertising data, when the backend exposes it.
    pub raw: Option<Vec<u8>>,
    /// Manufacturer data entries in the order the backend reported them.
    pub manufacturer_data: Vec<(u16, Vec<u8>)>,
}

impl Advertisement {
    pub fn new(address: HardwareAddress, rssi: i16) -> Self {
        Self {
            address,
            rssi,
            raw: None,
            manufacturer_data: Vec::new(),
        }
    }

    pub fn with_raw(mut self, raw: impl Into<Vec<u8>>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn with_manufacturer_data(mut self, identifier: u16, data: impl Into<Vec<u8>>) -> Self {
        self.manufacturer_data.push((identifier, data.into()));
        self
    }
}

/// Located vendor payload, aligned and checked against the device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalPayload {
    pub identifier: VendorIdentifier,
    pub bytes: [u8; PAYLOAD_LEN],
}

/// One payload's contribution to a device's measurement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub sequence_low_byte: u8,
    pub packet_id: u16,
    pub weight_raw: u16,
    pub impedance_raw: u16,
    pub impedance_present: bool,
}

/// Accumulated measurement state of one scale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    pub packet_id: u16,
    pub non_stabilized_mass_kg: f64,
    pub stabilized_mass_kg: Option<f64>,
    pub impedance_ohm: Option<f64>,
    pub last_rssi: i16,
}

/// Externally visible measurement state of one scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub title: String,
    pub name: String,
    pub model: &'static str,
    pub manufacturer: &'static str,
    pub packet_id: u16,
    pub non_stabilized_mass_kg: f64,
    pub stabilized_mass_kg: Option<f64>,
    pub impedance_ohm: Option<f64>,
    pub signal_strength: i16,
}
