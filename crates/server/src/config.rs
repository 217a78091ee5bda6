//! TOML config file loading and plausibility filtering for the trained
//! optimal watering hours.
//!
//! Config trouble is never fatal: a missing or unparsable file, or a file
//! whose hours all fail the plausibility check, degrades to the built-in
//! realistic defaults with a warning. The service must keep answering even
//! when the training pipeline exported garbage.

use serde::Deserialize;
use tracing::warn;

use crate::schedule::{WateringWindows, DEFAULT_EVENING_HOURS, DEFAULT_MORNING_HOURS};

// ---------------------------------------------------------------------------
// Config file structure
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Hours-of-day the training pipeline found optimal for watering.
    #[serde(default)]
    pub optimal_hours: Vec<i64>,
}

/// An hour a person would actually water plants at: 6-10 in the morning or
/// 16-19 in the evening. Anything else from the training pipeline is noise.
fn is_plausible_hour(hour: i64) -> bool {
    (6..=10).contains(&hour) || (16..=19).contains(&hour)
}

fn default_hours() -> Vec<u8> {
    let mut hours = DEFAULT_MORNING_HOURS.to_vec();
    hours.extend_from_slice(DEFAULT_EVENING_HOURS);
    hours
}

// ---------------------------------------------------------------------------
// Load + filter
// ---------------------------------------------------------------------------

/// Read and parse the config file, recovering to defaults on any failure.
pub fn load(path: &str) -> Config {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("config {path} not readable ({e}); using default watering hours");
            return Config::default();
        }
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            warn!("config {path} not valid TOML ({e}); using default watering hours");
            Config::default()
        }
    }
}

impl Config {
    /// Drop implausible hours, then fall back to the full realistic set when
    /// nothing survives (including the empty-file case).
    pub fn plausible_hours(&self) -> Vec<u8> {
        let mut kept: Vec<u8> = Vec::with_capacity(self.optimal_hours.len());
        for &hour in &self.optimal_hours {
            if is_plausible_hour(hour) {
                kept.push(hour as u8);
            } else {
                warn!("dropping implausible optimal hour {hour}");
            }
        }
        if kept.is_empty() {
            warn!("no plausible optimal hours configured; using defaults");
            default_hours()
        } else {
            kept
        }
    }

    /// The morning/evening windows the schedule deriver works against.
    pub fn windows(&self) -> WateringWindows {
        WateringWindows::from_hours(&self.plausible_hours())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -- Parsing ------------------------------------------------------------

    #[test]
    fn parse_hour_list() {
        let config: Config = toml::from_str("optimal_hours = [6, 7, 8, 9, 17, 18, 19]").unwrap();
        assert_eq!(config.optimal_hours, vec![6, 7, 8, 9, 17, 18, 19]);
    }

    #[test]
    fn parse_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.optimal_hours.is_empty());
    }

    // -- Plausibility filter ------------------------------------------------

    #[test]
    fn keeps_only_plausible_hours() {
        let config = Config {
            optimal_hours: vec![3, 6, 10, 11, 14, 16, 19, 20, 23],
        };
        assert_eq!(config.plausible_hours(), vec![6, 10, 16, 19]);
    }

    #[test]
    fn plausible_boundaries() {
        for hour in [6, 10, 16, 19] {
            assert!(is_plausible_hour(hour), "hour {hour}");
        }
        for hour in [5, 11, 15, 20, -1, 24] {
            assert!(!is_plausible_hour(hour), "hour {hour}");
        }
    }

    #[test]
    fn all_implausible_falls_back_to_defaults() {
        let config = Config {
            optimal_hours: vec![0, 2, 13, 22],
        };
        assert_eq!(config.plausible_hours(), vec![6, 7, 8, 9, 17, 18, 19]);
    }

    #[test]
    fn empty_list_falls_back_to_defaults() {
        let config = Config::default();
        assert_eq!(config.plausible_hours(), vec![6, 7, 8, 9, 17, 18, 19]);
    }

    // -- Windows ------------------------------------------------------------

    #[test]
    fn windows_partition_filtered_hours() {
        let config = Config {
            optimal_hours: vec![7, 9, 17, 19],
        };
        let w = config.windows();
        assert_eq!(w.morning(), &[7, 9]);
        assert_eq!(w.evening(), &[17, 19]);
    }

    #[test]
    fn hour_10_is_plausible_but_still_morning() {
        // 10 passes the load filter and lands in the morning window.
        let config = Config {
            optimal_hours: vec![10, 17],
        };
        let w = config.windows();
        assert_eq!(w.morning(), &[10]);
        assert_eq!(w.evening(), &[17]);
    }

    #[test]
    fn default_config_yields_default_windows() {
        assert_eq!(Config::default().windows(), WateringWindows::default());
    }

    // -- File loading -------------------------------------------------------

    #[test]
    fn missing_file_recovers_to_defaults() {
        let config = load("/nonexistent/config.toml");
        assert!(config.optimal_hours.is_empty());
        assert_eq!(config.windows(), WateringWindows::default());
    }

    #[test]
    fn garbage_file_recovers_to_defaults() {
        let dir = std::env::temp_dir();
        let path = dir.join("watering-config-garbage.toml");
        std::fs::write(&path, "optimal_hours = \"not a list").unwrap();
        let config = load(path.to_str().unwrap());
        assert!(config.optimal_hours.is_empty());
        std::fs::remove_file(&path).ok();
    }
}
