/// Utility functions for formatting and reading bookkeeping
use std::collections::HashMap;
use time::{format_description, OffsetDateTime};

use rust_leaone_etl::{HardwareAddress, Snapshot};

/// AD type of a manufacturer specific data element
const AD_TYPE_MANUFACTURER_DATA: u8 = 0xFF;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Convert a time::Duration to seconds as u64
pub fn duration_to_seconds(duration: time::Duration) -> u64 {
    duration.whole_seconds().max(0) as u64
}

/// Re-frame BlueZ advertising data as on-air bytes
///
/// BlueZ reports advertising data as AD type -> payload. Only the
/// manufacturer specific element is needed, so only that one is framed as
/// `[len][type][data]`.
///
/// # Returns
/// Raw bytes, or None if there is no manufacturer element or it is too long
/// to frame
pub fn frame_manufacturer_element(advertising_data: &HashMap<u8, Vec<u8>>) -> Option<Vec<u8>> {
    let data = advertising_data.get(&AD_TYPE_MANUFACTURER_DATA)?;
    let len = u8::try_from(data.len() + 1).ok()?;

    let mut raw = Vec::with_capacity(data.len() + 2);
    raw.push(len);
    raw.push(AD_TYPE_MANUFACTURER_DATA);
    raw.extend_from_slice(data);
    Some(raw)
}

/// Tracks the last stored packet id per scale so repeated advertisements
/// are stored once
#[derive(Debug, Default)]
pub struct StoredReadings {
    last_packet: HashMap<HardwareAddress, u16>,
}

impl StoredReadings {
    pub fn is_new(&self, address: &HardwareAddress, snapshot: &Snapshot) -> bool {
        self.last_packet.get(address) != Some(&snapshot.packet_id)
    }

    pub fn mark_stored(&mut self, address: HardwareAddress, snapshot: &Snapshot) {
        self.last_packet.insert(address, snapshot.packet_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_leaone_etl::{Advertisement, LeaoneDeviceData};

    const ADDRESS: HardwareAddress = HardwareAddress::new([0x5F, 0x5A, 0x5C, 0x52, 0xD3, 0x94]);

    #[test]
    fn frames_manufacturer_element() {
        let mut advertising_data = HashMap::new();
        advertising_data.insert(0x01, vec![0x06]);
        advertising_data.insert(
            0xFF,
            b"\x00\xdf\x06\xa4\x00\x00\x00\x020_Z\\R\xd3\x94".to_vec(),
        );

        let raw = frame_manufacturer_element(&advertising_data).unwrap();
        assert_eq!(
            raw,
            b"\x10\xff\x00\xdf\x06\xa4\x00\x00\x00\x020_Z\\R\xd3\x94".to_vec()
        );
    }

    #[test]
    fn framing_without_manufacturer_element() {
        let mut advertising_data = HashMap::new();
        advertising_data.insert(0x01, vec![0x06]);
        assert_eq!(frame_manufacturer_element(&advertising_data), None);
    }

    #[test]
    fn framed_bytes_decode() {
        let mut advertising_data = HashMap::new();
        advertising_data.insert(
            0xFF,
            b"\x00\xdf\x06\xa4\x00\x00\x00\x020_Z\\R\xd3\x94".to_vec(),
        );
        let raw = frame_manufacturer_element(&advertising_data).unwrap();

        let snapshot = LeaoneDeviceData::new()
            .update(&Advertisement::new(ADDRESS, -63).with_raw(raw))
            .unwrap();
        assert_eq!(snapshot.packet_id, 57136);
    }

    #[test]
    fn stores_each_packet_once() {
        let mut parser = LeaoneDeviceData::new();
        let mut stored = StoredReadings::default();
        let adv = Advertisement::new(ADDRESS, -63)
            .with_manufacturer_data(57280, b"\x06\xa4\x00\x00\x00\x020_Z\\R\xd3\x94".to_vec());

        let snapshot = parser.update(&adv).unwrap();
        assert!(stored.is_new(&ADDRESS, &snapshot));
        stored.mark_stored(ADDRESS, &snapshot);

        let again = parser.update(&adv).unwrap();
        assert!(!stored.is_new(&ADDRESS, &again));
    }
}
