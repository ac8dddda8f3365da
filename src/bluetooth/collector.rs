/// Turning BlueZ property updates into ordered advertisements
use log::debug;
use std::collections::HashMap;

use rust_leaone_etl::{Advertisement, HardwareAddress};

use crate::utils::frame_manufacturer_element;

/// Remembers the last manufacturer data map seen per scale
///
/// BlueZ keeps every identifier it has ever received in the map and never
/// evicts old ones. Since the scale's identifier changes with its packet
/// counter, only entries that are new or whose bytes changed are fresh.
/// Lives across scans.
#[derive(Debug, Default)]
pub struct ManufacturerDataTracker {
    previous: HashMap<HardwareAddress, HashMap<u16, Vec<u8>>>,
}

impl ManufacturerDataTracker {
    /// Entries of `current` that differ from the last map seen for `address`
    ///
    /// Entries changed within one update are ordered by identifier. On first
    /// sight of a scale every entry counts as changed.
    pub fn changed_entries(
        &mut self,
        address: HardwareAddress,
        current: &HashMap<u16, Vec<u8>>,
    ) -> Vec<(u16, Vec<u8>)> {
        let previous = self.previous.get(&address);
        let mut changed: Vec<(u16, Vec<u8>)> = current
            .iter()
            .filter(|(id, data)| previous.and_then(|p| p.get(*id)) != Some(*data))
            .map(|(id, data)| (*id, data.clone()))
            .collect();
        changed.sort_by_key(|(id, _)| *id);

        self.previous.insert(address, current.clone());
        changed
    }
}

/// Collects the advertisements of one scan in arrival order
pub struct ScanCollector<'a> {
    tracker: &'a mut ManufacturerDataTracker,
    rssi: HashMap<HardwareAddress, i16>,
    pending: Vec<Advertisement>,
}

impl<'a> ScanCollector<'a> {
    pub fn new(tracker: &'a mut ManufacturerDataTracker) -> Self {
        Self {
            tracker,
            rssi: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Properties BlueZ already had cached when the scale was first seen
    /// in this scan
    ///
    /// Without an RSSI the scale is not currently heard, so the cache only
    /// updates the tracker.
    pub fn cached(
        &mut self,
        address: HardwareAddress,
        rssi: Option<i16>,
        manufacturer_data: Option<&HashMap<u16, Vec<u8>>>,
    ) {
        let changed = manufacturer_data
            .map(|data| self.tracker.changed_entries(address, data))
            .unwrap_or_default();

        match rssi {
            Some(rssi) => {
                self.rssi.insert(address, rssi);
                self.push_entries(address, changed);
            }
            None => debug!("{} is cached but not in range", address),
        }
    }

    pub fn rssi(&mut self, address: HardwareAddress, rssi: i16) {
        self.rssi.insert(address, rssi);
    }

    pub fn manufacturer_data(&mut self, address: HardwareAddress, data: &HashMap<u16, Vec<u8>>) {
        let changed = self.tracker.changed_entries(address, data);
        self.push_entries(address, changed);
    }

    pub fn advertising_data(&mut self, address: HardwareAddress, data: &HashMap<u8, Vec<u8>>) {
        if let Some(raw) = frame_manufacturer_element(data) {
            self.pending.push(Advertisement::new(address, 0).with_raw(raw));
        }
    }

    fn push_entries(&mut self, address: HardwareAddress, entries: Vec<(u16, Vec<u8>)>) {
        if entries.is_empty() {
            return;
        }
        let mut advertisement = Advertisement::new(address, 0);
        advertisement.manufacturer_data = entries;
        self.pending.push(advertisement);
    }

    /// Advertisements in arrival order, each carrying the scale's latest RSSI
    ///
    /// Scales whose RSSI never became known are dropped.
    pub fn finish(self) -> Vec<Advertisement> {
        let rssi = self.rssi;
        self.pending
            .into_iter()
            .filter_map(|mut advertisement| {
                let known = rssi.get(&advertisement.address)?;
                advertisement.rssi = *known;
                Some(advertisement)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_leaone_etl::LeaoneDeviceData;

    const ADDRESS: HardwareAddress = HardwareAddress::new([0x5F, 0x5A, 0x5C, 0x52, 0xD3, 0x94]);

    const LBS_57280: &[u8] = b"\x06\xa4\x00\x00\x00\x020_Z\\R\xd3\x94";
    const LBS_63424: &[u8] = b"\x06\xa4\x13\x80\x00\x021_Z\\R\xd3\x94";
    const LBS_6592: &[u8] = b"\x06\x8e\x00\x00\x00\x020_Z\\R\xd3\x94";

    fn cache(entries: &[(u16, &[u8])]) -> HashMap<u16, Vec<u8>> {
        entries.iter().map(|(id, data)| (*id, data.to_vec())).collect()
    }

    fn three_entries() -> HashMap<u16, Vec<u8>> {
        cache(&[(57280, LBS_57280), (63424, LBS_63424), (6592, LBS_6592)])
    }

    fn packet_ids(parser: &mut LeaoneDeviceData, advertisements: &[Advertisement]) -> Vec<u16> {
        advertisements
            .iter()
            .filter_map(|adv| parser.update(adv))
            .map(|snapshot| snapshot.packet_id)
            .collect()
    }

    #[test]
    fn first_sight_is_independent_of_map_order() {
        let mut outcomes = Vec::new();
        for _ in 0..50 {
            let mut tracker = ManufacturerDataTracker::default();
            let mut collector = ScanCollector::new(&mut tracker);
            collector.cached(ADDRESS, Some(-63), Some(&three_entries()));

            let snapshot = LeaoneDeviceData::new()
                .update(&collector.finish()[0])
                .unwrap();
            outcomes.push((snapshot.packet_id, snapshot.non_stabilized_mass_kg));
        }
        outcomes.dedup();
        assert_eq!(outcomes, vec![(63281, 77.11)]);
    }

    #[test]
    fn stale_cache_does_not_change_stored_packet() {
        let mut tracker = ManufacturerDataTracker::default();
        let mut parser = LeaoneDeviceData::new();

        let mut collector = ScanCollector::new(&mut tracker);
        collector.cached(ADDRESS, Some(-63), Some(&cache(&[(57280, LBS_57280)])));
        let mut updated = three_entries();
        updated.remove(&6592);
        collector.manufacturer_data(ADDRESS, &updated);
        assert_eq!(packet_ids(&mut parser, &collector.finish()), vec![57136, 63281]);

        for _ in 0..10 {
            let mut collector = ScanCollector::new(&mut tracker);
            collector.cached(ADDRESS, Some(-63), Some(&updated));
            collector.manufacturer_data(ADDRESS, &updated);
            assert!(collector.finish().is_empty());
        }
        assert_eq!(parser.state(&ADDRESS).unwrap().packet_id, 63281);
    }

    #[test]
    fn only_changed_entries_are_forwarded() {
        let mut tracker = ManufacturerDataTracker::default();
        tracker.changed_entries(ADDRESS, &cache(&[(57280, LBS_57280), (63424, LBS_63424)]));

        let changed = tracker.changed_entries(ADDRESS, &three_entries());
        assert_eq!(changed, vec![(6592, LBS_6592.to_vec())]);

        let mut rewritten = three_entries();
        rewritten.insert(57280, LBS_63424.to_vec());
        let changed = tracker.changed_entries(ADDRESS, &rewritten);
        assert_eq!(changed, vec![(57280, LBS_63424.to_vec())]);
    }

    #[test]
    fn events_keep_arrival_order() {
        let mut tracker = ManufacturerDataTracker::default();
        let mut parser = LeaoneDeviceData::new();
        let mut collector = ScanCollector::new(&mut tracker);

        collector.rssi(ADDRESS, -60);
        let mut map = cache(&[(63424, LBS_63424)]);
        collector.manufacturer_data(ADDRESS, &map);
        map.insert(6592, LBS_6592.to_vec());
        collector.manufacturer_data(ADDRESS, &map);
        map.insert(57280, LBS_57280.to_vec());
        collector.manufacturer_data(ADDRESS, &map);

        let advertisements = collector.finish();
        assert_eq!(packet_ids(&mut parser, &advertisements), vec![63281, 6448, 57136]);
        assert_eq!(parser.state(&ADDRESS).unwrap().impedance_ohm, Some(499.2));
    }

    #[test]
    fn scale_out_of_range_yields_nothing() {
        let mut tracker = ManufacturerDataTracker::default();
        let mut collector = ScanCollector::new(&mut tracker);
        collector.cached(ADDRESS, None, Some(&three_entries()));
        assert!(collector.finish().is_empty());

        // the stale cache was consumed, it is not replayed once in range
        let mut collector = ScanCollector::new(&mut tracker);
        collector.cached(ADDRESS, Some(-70), Some(&three_entries()));
        assert!(collector.finish().is_empty());
    }

    #[test]
    fn events_without_rssi_are_dropped() {
        let mut tracker = ManufacturerDataTracker::default();
        let mut collector = ScanCollector::new(&mut tracker);
        collector.manufacturer_data(ADDRESS, &three_entries());
        assert!(collector.finish().is_empty());
    }

    #[test]
    fn latest_rssi_is_reported() {
        let mut tracker = ManufacturerDataTracker::default();
        let mut collector = ScanCollector::new(&mut tracker);
        collector.manufacturer_data(ADDRESS, &cache(&[(57280, LBS_57280)]));
        collector.rssi(ADDRESS, -58);

        let advertisements = collector.finish();
        assert_eq!(advertisements.len(), 1);
        assert_eq!(advertisements[0].rssi, -58);
    }

    #[test]
    fn advertising_data_is_framed_as_raw() {
        let mut tracker = ManufacturerDataTracker::default();
        let mut collector = ScanCollector::new(&mut tracker);
        let mut advertising_data = HashMap::new();
        advertising_data.insert(
            0xFF,
            b"\x00\xdf\x06\xa4\x00\x00\x00\x020_Z\\R\xd3\x94".to_vec(),
        );
        collector.advertising_data(ADDRESS, &advertising_data);
        collector.rssi(ADDRESS, -63);

        let advertisements = collector.finish();
        let snapshot = LeaoneDeviceData::new().update(&advertisements[0]).unwrap();
        assert_eq!(snapshot.packet_id, 57136);
        assert_eq!(snapshot.signal_strength, -63);
    }
}
