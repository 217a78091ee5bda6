mod sim;

use serde::Deserialize;
use std::{env, time::Duration};
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sim::{GreenhouseSim, Scenario};

/// Mirror of the server's predict response.
#[derive(Debug, Deserialize)]
struct ScheduleResult {
    needs_watering: bool,
    probability: f64,
    optimal_time: String,
    alternative_times: Vec<String>,
}

fn form_fields(r: &sim::Readings) -> [(&'static str, String); 3] {
    [
        ("air_temp", format!("{:.1}", r.air_temp)),
        ("air_humidity", format!("{:.1}", r.air_humidity)),
        ("soil_humidity", format!("{:.1}", r.soil_humidity)),
    ]
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Env config
    let server_url =
        env::var("SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    let predict_url = format!("{}/api/predict", server_url.trim_end_matches('/'));

    let sample_every_s: u64 = env::var("SAMPLE_EVERY_S")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(300);

    let scenario = Scenario::from_str_lossy(
        &env::var("SIM_SCENARIO").unwrap_or_else(|_| "drying".to_string()),
    );

    let diurnal_period_s: f64 = env::var("SIM_DIURNAL_PERIOD_S")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(86400.0);

    info!(%predict_url, %scenario, sample_every_s, "node starting");

    let mut sim = GreenhouseSim::new(scenario, diurnal_period_s);
    let client = reqwest::Client::new();

    loop {
        let readings = sim.sample();
        info!(
            "sampled air_temp={:.1} air_humidity={:.1} soil_humidity={:.1}",
            readings.air_temp, readings.air_humidity, readings.soil_humidity
        );

        // Keep sampling when the server is down; the greenhouse does not
        // stop existing because the hub rebooted.
        match post_readings(&client, &predict_url, &readings).await {
            Ok(result) => info!(
                needs_watering = result.needs_watering,
                probability = result.probability,
                optimal = %result.optimal_time,
                alternatives = ?result.alternative_times,
                "schedule received"
            ),
            Err(e) => warn!("predict request failed: {e:#}"),
        }

        sleep(Duration::from_secs(sample_every_s)).await;
    }
}

async fn post_readings(
    client: &reqwest::Client,
    url: &str,
    readings: &sim::Readings,
) -> anyhow::Result<ScheduleResult> {
    let response = client
        .post(url)
        .form(&form_fields(readings))
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json::<ScheduleResult>().await?)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_result_deserializes_server_response() {
        let json = r#"{
            "needs_watering": true,
            "probability": 0.83,
            "optimal_time": "17:30",
            "alternative_times": ["07:15", "18:00"]
        }"#;
        let result: ScheduleResult = serde_json::from_str(json).unwrap();
        assert!(result.needs_watering);
        assert!((result.probability - 0.83).abs() < 1e-12);
        assert_eq!(result.optimal_time, "17:30");
        assert_eq!(result.alternative_times, vec!["07:15", "18:00"]);
    }

    #[test]
    fn schedule_result_accepts_empty_alternatives() {
        let json = r#"{
            "needs_watering": false,
            "probability": 0.12,
            "optimal_time": "06:00",
            "alternative_times": []
        }"#;
        let result: ScheduleResult = serde_json::from_str(json).unwrap();
        assert!(!result.needs_watering);
        assert!(result.alternative_times.is_empty());
    }

    #[test]
    fn form_fields_are_one_decimal_strings() {
        let r = sim::Readings {
            air_temp: 31.46,
            air_humidity: 61.9999,
            soil_humidity: 38.0,
        };
        let fields = form_fields(&r);
        assert_eq!(fields[0], ("air_temp", "31.5".to_string()));
        assert_eq!(fields[1], ("air_humidity", "62.0".to_string()));
        assert_eq!(fields[2], ("soil_humidity", "38.0".to_string()));
    }
}
