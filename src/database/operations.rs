/// Database operations for storing scale measurements
use time::OffsetDateTime;

use rust_leaone_etl::Snapshot;

use crate::database::connection::execute_with_retry;

/// Store one scale reading in the database
///
/// Inserts the merged snapshot into the scale_measurements table. Mass and
/// impedance are NULL until the scale has produced a stabilized reading.
/// It uses the retry mechanism to handle transient database connection issues.
///
/// # Arguments
/// * `scale_id` - MAC address of the scale
/// * `name` - Configured name of the scale
/// * `snapshot` - Merged reading to store
/// * `time` - When the reading was collected
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// Result indicating success or failure
pub async fn store_measurement(
    scale_id: &str,
    name: &str,
    snapshot: &Snapshot,
    time: OffsetDateTime,
    database_url: &str,
) -> Result<(), String> {
    // Clone data for move into async closure
    let scale_id = scale_id.to_string();
    let name = name.to_string();
    let snapshot = snapshot.clone();

    execute_with_retry(database_url, move |client| {
        let scale_id = scale_id.clone();
        let name = name.clone();
        let snapshot = snapshot.clone();
        async move {
            client.execute(
                "INSERT INTO scale_measurements(scale_mac, name, packet_id, non_stabilized_mass, mass, impedance, rssi, time)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &scale_id,
                    &name,
                    &i32::from(snapshot.packet_id),
                    &snapshot.non_stabilized_mass_kg,
                    &snapshot.stabilized_mass_kg,
                    &snapshot.impedance_ohm,
                    &snapshot.signal_strength,
                    &time,
                ],
            ).await
        }
    }).await
}
