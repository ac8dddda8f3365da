mod bluetooth;
mod config;
mod database;
mod utils;

use log::{error, info, warn};
use time::OffsetDateTime;
use tokio::time::{sleep, Duration};

use rust_leaone_etl::{LeaoneDeviceData, SensorUpdate};

use bluetooth::{scan_for_scales, ManufacturerDataTracker};
use config::ScaleConfig;
use database::store_measurement;
use utils::{duration_to_seconds, format_datetime, StoredReadings};

async fn main_loop(config: ScaleConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Leaone scale data collection service");

    let mut parser = LeaoneDeviceData::new();
    let mut stored = StoredReadings::default();
    let mut tracker = ManufacturerDataTracker::default();

    loop {
        let start_time = OffsetDateTime::now_utc();

        let advertisements = match scan_for_scales(&config, &mut tracker).await {
            Ok(advertisements) => advertisements,
            Err(e) => {
                error!("Scan failed: {}", e);
                sleep(Duration::from_secs(config.poll_interval_secs)).await;
                continue;
            }
        };

        if advertisements.is_empty() {
            warn!("No scale advertisements seen during this scan");
        }

        for advertisement in &advertisements {
            let address = advertisement.address;
            let Some(snapshot) = parser.update(advertisement) else {
                continue;
            };
            if !stored.is_new(&address, &snapshot) {
                continue;
            }

            let name = config
                .scales
                .get(&address)
                .map(String::as_str)
                .unwrap_or("Unknown");
            let scale_id = address.to_string();
            let now = OffsetDateTime::now_utc();

            match store_measurement(&scale_id, name, &snapshot, now, &config.database_url).await {
                Ok(()) => {
                    stored.mark_stored(address, &snapshot);
                    info!(
                        "Stored reading for {} ({}) at {}",
                        name,
                        snapshot.title,
                        format_datetime(&now)
                    );
                    for value in SensorUpdate::from(&snapshot).entity_values.values() {
                        let unit = value
                            .device_key
                            .unit()
                            .map(|u| u.symbol())
                            .unwrap_or("");
                        info!(
                            "  {} [{}]: {} {}",
                            value.name, value.device_key, value.native_value, unit
                        );
                    }
                }
                Err(e) => error!("Failed to store reading for scale {}: {}", scale_id, e),
            }
        }

        // Wait until next poll time
        let elapsed = duration_to_seconds(OffsetDateTime::now_utc() - start_time);
        let wait_time = config.poll_interval_secs.saturating_sub(elapsed);
        if wait_time > 0 {
            sleep(Duration::from_secs(wait_time)).await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match ScaleConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        let _ = tx.send(());
    });

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
