/// Bluetooth Low Energy scanning for Leaone scales
use bluer::{AdapterEvent, DeviceEvent, DeviceProperty};
use futures_util::StreamExt;
use log::{debug, error, warn};
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use rust_leaone_etl::{Advertisement, HardwareAddress};

use crate::bluetooth::collector::{ManufacturerDataTracker, ScanCollector};
use crate::config::ScaleConfig;

/// Scan for configured Leaone scales and collect their advertisements
///
/// Discovery runs for the configured duration. Every configured scale that
/// shows up is watched for property changes, and each change of its
/// manufacturer or advertising data becomes one advertisement, in the order
/// BlueZ reported them. Entries BlueZ merely kept cached from earlier
/// advertisements are filtered out by `tracker`.
///
/// # Arguments
/// * `config` - Configuration containing scale addresses to look for
/// * `tracker` - Manufacturer data seen in previous scans
///
/// # Returns
/// Result containing the advertisements in arrival order, or error if scan fails
pub async fn scan_for_scales(
    config: &ScaleConfig,
    tracker: &mut ManufacturerDataTracker,
) -> Result<Vec<Advertisement>, Box<dyn std::error::Error>> {
    // Initialize Bluetooth session
    let session = match bluer::Session::new().await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create Bluetooth session: {}", e);
            return Err(e.into());
        }
    };

    // Get the default Bluetooth adapter
    let adapter = match session.default_adapter().await {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to get default Bluetooth adapter: {}", e);
            return Err(e.into());
        }
    };

    // Ensure Bluetooth adapter is powered on
    if let Err(e) = adapter.set_powered(true).await {
        error!("Failed to power on adapter: {}", e);
        return Err(e.into());
    }

    // The packet counter lives in the manufacturer data, so duplicates matter
    let filter = bluer::DiscoveryFilter {
        transport: bluer::DiscoveryTransport::Le,
        duplicate_data: true,
        ..Default::default()
    };

    // Apply the discovery filter (warn if it fails, but continue)
    if let Err(e) = adapter.set_discovery_filter(filter).await {
        warn!("Failed to set discovery filter: {}", e);
    }

    let mut discovery = match adapter.discover_devices().await {
        Ok(discovery_stream) => discovery_stream,
        Err(e) => {
            error!("Failed to start device discovery: {}", e);
            return Err(e.into());
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<(HardwareAddress, DeviceProperty)>();
    let mut watchers: Vec<JoinHandle<()>> = Vec::new();
    let mut watched = HashSet::new();
    let mut collector = ScanCollector::new(tracker);

    let deadline = sleep(Duration::from_secs(config.scan_duration_secs));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = discovery.next() => match event {
                Some(AdapterEvent::DeviceAdded(addr)) => {
                    let address = HardwareAddress::new(addr.0);
                    if !config.scales.contains_key(&address) || !watched.insert(address) {
                        continue;
                    }
                    let device = match adapter.device(addr) {
                        Ok(device) => device,
                        Err(e) => {
                            debug!("Failed to open device {}: {}", address, e);
                            continue;
                        }
                    };
                    match watch_device(&device, address, tx.clone()).await {
                        Ok(watcher) => watchers.push(watcher),
                        Err(e) => {
                            debug!("Failed to watch {}: {}", address, e);
                            continue;
                        }
                    }
                    // Subscribed first, so no change between this read and the
                    // subscription is lost
                    let rssi = device.rssi().await.ok().flatten();
                    let cached = device.manufacturer_data().await.ok().flatten();
                    collector.cached(address, rssi, cached.as_ref());
                }
                Some(event) => debug!("Discovery event: {:?}", event),
                None => {
                    warn!("Discovery stream ended early");
                    break;
                }
            },
            Some((address, property)) = rx.recv() => match property {
                DeviceProperty::Rssi(rssi) => collector.rssi(address, rssi),
                DeviceProperty::ManufacturerData(data) => collector.manufacturer_data(address, &data),
                DeviceProperty::AdvertisingData(data) => collector.advertising_data(address, &data),
                _ => {}
            },
        }
    }

    for watcher in watchers {
        watcher.abort();
    }

    Ok(collector.finish())
}

/// Forward one device's property changes to the scan loop
async fn watch_device(
    device: &bluer::Device,
    address: HardwareAddress,
    tx: mpsc::UnboundedSender<(HardwareAddress, DeviceProperty)>,
) -> bluer::Result<JoinHandle<()>> {
    let mut events = device.events().await?;
    Ok(tokio::spawn(async move {
        while let Some(DeviceEvent::PropertyChanged(property)) = events.next().await {
            if tx.send((address, property)).is_err() {
                break;
            }
        }
    }))
}
