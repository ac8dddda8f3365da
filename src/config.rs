use log::{info, warn};
use std::collections::HashMap;
use std::env;

use rust_leaone_etl::HardwareAddress;

const DEFAULT_SCAN_DURATION_SECS: u64 = 20;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ScaleConfig {
    pub scales: HashMap<HardwareAddress, String>,
    pub database_url: String,
    pub scan_duration_secs: u64,
    pub poll_interval_secs: u64,
}

impl ScaleConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL environment variable not set")?;

        let scales = match env::var("LEAONE_SCALES") {
            Ok(list) => parse_scale_list(&list),
            Err(_) => {
                info!("LEAONE_SCALES environment variable not found, trying individual variables");
                parse_indexed_scales(env::vars())
            }
        };

        info!("Total scales loaded: {}", scales.len());
        for (mac, name) in &scales {
            info!("Scale: {} -> {}", mac, name);
        }

        if scales.is_empty() {
            return Err("No Leaone scales configured. Please set LEAONE_SCALES or LEAONE_SCALE_<N>_MAC/LEAONE_SCALE_<N>_NAME environment variables".into());
        }

        Ok(ScaleConfig {
            scales,
            database_url,
            scan_duration_secs: secs_from_env("SCAN_DURATION_SECS", DEFAULT_SCAN_DURATION_SECS),
            poll_interval_secs: secs_from_env("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
        })
    }
}

/// Parse `MAC=Name,MAC=Name` pairs, skipping malformed ones.
pub fn parse_scale_list(list: &str) -> HashMap<HardwareAddress, String> {
    let mut scales = HashMap::new();
    for pair in list.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((mac, name)) => insert_scale(&mut scales, mac, name),
            None => warn!("Failed to split pair: '{}'", pair),
        }
    }
    scales
}

/// Collect `LEAONE_SCALE_<N>_MAC` / `LEAONE_SCALE_<N>_NAME` pairs.
pub fn parse_indexed_scales(
    vars: impl Iterator<Item = (String, String)>,
) -> HashMap<HardwareAddress, String> {
    let vars: HashMap<String, String> = vars.collect();
    let mut scales = HashMap::new();
    for (key, mac) in &vars {
        if let Some(index) = key
            .strip_prefix("LEAONE_SCALE_")
            .and_then(|s| s.strip_suffix("_MAC"))
        {
            let name_key = format!("LEAONE_SCALE_{}_NAME", index);
            if let Some(name) = vars.get(&name_key) {
                insert_scale(&mut scales, mac, name);
            }
        }
    }
    scales
}

fn insert_scale(scales: &mut HashMap<HardwareAddress, String>, mac: &str, name: &str) {
    let name = name.trim();
    if name.is_empty() {
        warn!("Empty name for scale '{}'", mac.trim());
        return;
    }
    match mac.parse::<HardwareAddress>() {
        Ok(address) => {
            scales.insert(address, name.to_string());
        }
        Err(e) => warn!("Skipping scale '{}': {}", name, e),
    }
}

fn secs_from_env(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} '{}', using {}", key, value, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scale_list() {
        let scales = parse_scale_list(" 5F:5A:5C:52:D3:94 = Bathroom , ,aa:bb:cc:dd:ee:ff=Gym");
        assert_eq!(scales.len(), 2);
        let bathroom: HardwareAddress = "5F:5A:5C:52:D3:94".parse().unwrap();
        assert_eq!(scales[&bathroom], "Bathroom");
    }

    #[test]
    fn skips_malformed_pairs() {
        let scales = parse_scale_list("5F:5A:5C:52:D3=Short,NoEquals,11:22:33:44:55:66=");
        assert!(scales.is_empty());
    }

    #[test]
    fn parses_indexed_variables() {
        let vars = vec![
            ("LEAONE_SCALE_1_MAC".to_string(), "5F:5A:5C:52:D3:94".to_string()),
            ("LEAONE_SCALE_1_NAME".to_string(), "Bathroom".to_string()),
            ("LEAONE_SCALE_2_MAC".to_string(), "11:22:33:44:55:66".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ];
        let scales = parse_indexed_scales(vars.into_iter());
        assert_eq!(scales.len(), 1);
        assert_eq!(scales.values().next().unwrap(), "Bathroom");
    }
}
