/// Per-device state tracking for Leaone scales
use log::debug;
use std::collections::HashMap;

use crate::leaone::identity::{format_title, MANUFACTURER, MODEL};
use crate::leaone::locator::locate;
use crate::leaone::merger::merge;
use crate::models::{Advertisement, CanonicalPayload, DeviceState, HardwareAddress, Snapshot};

/// Accumulates measurement state for every scale seen so far
///
/// Updates take `&mut self`, so merges for one address never overlap.
#[derive(Debug, Default)]
pub struct LeaoneDeviceData {
    devices: HashMap<HardwareAddress, DeviceState>,
}

impl LeaoneDeviceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one advertisement
    ///
    /// # Returns
    /// The device's snapshot, or `None` when the advertisement carried no
    /// valid payload (state is left untouched in that case)
    pub fn update(&mut self, advertisement: &Advertisement) -> Option<Snapshot> {
        let address = advertisement.address;
        let payloads = locate(
            advertisement.raw.as_deref(),
            &advertisement.manufacturer_data,
            &address,
        );
        if payloads.is_empty() {
            debug!("No Leaone payload in advertisement from {}", address);
            return None;
        }

        let prior = self.devices.remove(&address).unwrap_or_default();
        let mut state = merge(prior, payloads.iter().map(CanonicalPayload::decode));
        state.last_rssi = advertisement.rssi;

        let snapshot = snapshot(&address, &state);
        self.devices.insert(address, state);

        debug!(
            "Updated {}: packet_id={}, mass={:.2} kg",
            snapshot.title, snapshot.packet_id, snapshot.non_stabilized_mass_kg
        );
        Some(snapshot)
    }

    /// Current state for an address, if any advertisement was accepted
    pub fn state(&self, address: &HardwareAddress) -> Option<&DeviceState> {
        self.devices.get(address)
    }
}

/// Project a device state into the snapshot handed to consumers
pub fn snapshot(address: &HardwareAddress, state: &DeviceState) -> Snapshot {
    let title = format_title(MODEL, address);
    Snapshot {
        name: title.clone(),
        title,
        model: MODEL,
        manufacturer: MANUFACTURER,
        packet_id: state.packet_id,
        non_stabilized_mass_kg: state.non_stabilized_mass_kg,
        stabilized_mass_kg: state.stabilized_mass_kg,
        impedance_ohm: state.impedance_ohm,
        signal_strength: state.last_rssi,
    }
}
