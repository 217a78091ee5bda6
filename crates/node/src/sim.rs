//! Stateful greenhouse sensor simulator for local development.
//!
//! Produces the three channels the prediction endpoint expects — air
//! temperature, air humidity and soil humidity — with realistic behaviour:
//! - Temporal coherence via random walk with mean reversion (soil)
//! - Gradual soil drying drift (evaporation)
//! - Diurnal (day/night) temperature cycle
//! - Air humidity anti-correlated with temperature
//! - Per-reading electronic noise
//! - Occasional spikes (sensor flakiness)

use std::fmt;

// ---------------------------------------------------------------------------
// Gaussian approximation (no extra dependency)
// ---------------------------------------------------------------------------

/// Approximate a sample from N(0,1) using the Irwin-Hall method:
/// sum of 12 uniform [0,1) values minus 6.
fn approx_std_normal() -> f64 {
    let mut sum: f64 = 0.0;
    for _ in 0..12 {
        sum += fastrand::f64();
    }
    sum - 6.0
}

/// Sample from N(mean, sigma).
fn gaussian(mean: f64, sigma: f64) -> f64 {
    mean + sigma * approx_std_normal()
}

// ---------------------------------------------------------------------------
// Scenario presets
// ---------------------------------------------------------------------------

/// Pre-configured simulation profiles selectable via `SIM_SCENARIO` env var.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Warm day, soil steadily losing moisture.  Should flip the prediction
    /// to "needs watering" after enough ticks.
    Drying,
    /// Everything hovers near comfortable values.  Low noise, rare spikes.
    /// Good for exercising the endpoint without triggering watering.
    Stable,
    /// Cool and damp, soil stays wet.  Tests that the service keeps
    /// proposing next-morning slots when no watering is needed.
    Humid,
    /// High noise, ~10% spike rate, larger spike magnitude.  Tests the
    /// server's tolerance of implausible readings.
    Flaky,
}

impl Scenario {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "stable" => Self::Stable,
            "humid" => Self::Humid,
            "flaky" => Self::Flaky,
            _ => Self::Drying, // default
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drying => write!(f, "drying"),
            Self::Stable => write!(f, "stable"),
            Self::Humid => write!(f, "humid"),
            Self::Flaky => write!(f, "flaky"),
        }
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// One tick's worth of sensor values, ready to POST as form fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    /// Air temperature in °C.
    pub air_temp: f64,
    /// Relative air humidity in %.
    pub air_humidity: f64,
    /// Soil humidity in %.
    pub soil_humidity: f64,
}

// ---------------------------------------------------------------------------
// Main simulator
// ---------------------------------------------------------------------------

/// Stateful simulator producing temporally coherent greenhouse readings.
pub struct GreenhouseSim {
    /// Current "true" soil humidity in %.  Evolves each tick.
    soil: f64,
    /// Rest point the mean reversion pulls toward.
    soil_center: f64,

    // Soil random-walk parameters
    drift_per_tick: f64,
    walk_sigma: f64,
    mean_reversion: f64,
    soil_noise_sigma: f64,

    // Air parameters
    temp_mean: f64,
    temp_noise_sigma: f64,
    hum_mean: f64,
    hum_noise_sigma: f64,

    // Spike parameters
    spike_prob: f32,
    spike_sigma: f64,

    // Diurnal cycle
    diurnal_amplitude: f64,
    diurnal_period_s: f64,
}

impl GreenhouseSim {
    /// Create a new simulator.
    ///
    /// `diurnal_period_s` controls the day/night temperature cycle length.
    /// Use 600 (10 min) for fast dev iteration or 86400 for real-time.
    pub fn new(scenario: Scenario, diurnal_period_s: f64) -> Self {
        let (soil_start, drift, walk_sigma, mean_rev, soil_noise, spike_prob, spike_sigma) =
            match scenario {
                Scenario::Drying => (55.0, -0.40, 0.8, 0.01, 0.5, 0.03_f32, 15.0),
                Scenario::Stable => (60.0, -0.02, 0.3, 0.05, 0.3, 0.005, 8.0),
                Scenario::Humid => (78.0, -0.01, 0.4, 0.04, 0.4, 0.02, 10.0),
                Scenario::Flaky => (50.0, -0.20, 1.5, 0.01, 2.0, 0.10, 25.0),
            };

        let (temp_mean, temp_amp, hum_mean) = match scenario {
            Scenario::Drying => (31.0, 4.0, 58.0),
            Scenario::Stable => (27.0, 3.0, 68.0),
            Scenario::Humid => (24.0, 2.0, 86.0),
            Scenario::Flaky => (29.0, 4.0, 60.0),
        };

        // Randomise the starting point slightly so two nodes diverge.
        let soil = (soil_start + gaussian(0.0, 2.0)).clamp(0.0, 100.0);

        Self {
            soil,
            soil_center: soil_start,
            drift_per_tick: drift,
            walk_sigma,
            mean_reversion: mean_rev,
            soil_noise_sigma: soil_noise,
            temp_mean,
            temp_noise_sigma: 0.6,
            hum_mean,
            hum_noise_sigma: 2.5,
            spike_prob,
            spike_sigma,
            diurnal_amplitude: temp_amp,
            diurnal_period_s,
        }
    }

    /// Produce the next tick's readings.  The internal soil value evolves
    /// with each call, so call frequency matters.
    pub fn sample(&mut self) -> Readings {
        // -- Evolve the soil base value -----------------------------------

        // Mean reversion: pull toward the scenario's rest point.
        let pull = self.mean_reversion * (self.soil_center - self.soil);

        // Random walk step plus drying drift (negative = losing moisture).
        let walk = gaussian(0.0, self.walk_sigma);

        self.soil = (self.soil + self.drift_per_tick + pull + walk).clamp(0.0, 100.0);

        // -- Build the instantaneous readings ------------------------------

        // Diurnal temperature: sinusoidal, peaks mid-period ("afternoon").
        let now_s = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        let phase = 2.0 * std::f64::consts::PI * now_s / self.diurnal_period_s;
        let diurnal = self.diurnal_amplitude * phase.sin();

        let air_temp = self.temp_mean + diurnal + gaussian(0.0, self.temp_noise_sigma);

        // Air humidity runs opposite to temperature: warm air holds the same
        // moisture at a lower relative humidity.
        let air_humidity =
            self.hum_mean - 1.8 * (air_temp - self.temp_mean) + gaussian(0.0, self.hum_noise_sigma);

        // Occasional spike on the soil channel (sensor flakiness).
        let spike = if fastrand::f32() < self.spike_prob {
            gaussian(0.0, self.spike_sigma)
        } else {
            0.0
        };
        let soil_humidity = self.soil + gaussian(0.0, self.soil_noise_sigma) + spike;

        Readings {
            air_temp: air_temp.clamp(-10.0, 55.0),
            air_humidity: air_humidity.clamp(0.0, 100.0),
            soil_humidity: soil_humidity.clamp(0.0, 100.0),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: collect N soil readings.
    fn soil_samples(sim: &mut GreenhouseSim, n: usize) -> Vec<f64> {
        (0..n).map(|_| sim.sample().soil_humidity).collect()
    }

    #[test]
    fn readings_within_physical_ranges() {
        for scenario in [
            Scenario::Drying,
            Scenario::Stable,
            Scenario::Humid,
            Scenario::Flaky,
        ] {
            let mut sim = GreenhouseSim::new(scenario, 600.0);
            for _ in 0..500 {
                let r = sim.sample();
                assert!((-10.0..=55.0).contains(&r.air_temp), "temp {}", r.air_temp);
                assert!(
                    (0.0..=100.0).contains(&r.air_humidity),
                    "air humidity {}",
                    r.air_humidity
                );
                assert!(
                    (0.0..=100.0).contains(&r.soil_humidity),
                    "soil humidity {}",
                    r.soil_humidity
                );
            }
        }
    }

    #[test]
    fn temporal_coherence() {
        // Consecutive soil readings should be much closer than the full
        // 0-100 range.
        let mut sim = GreenhouseSim::new(Scenario::Stable, 600.0);
        let samples = soil_samples(&mut sim, 100);
        let max_jump = samples
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0_f64, f64::max);
        // Allow up to 30 to account for rare spikes.
        assert!(max_jump < 30.0, "max consecutive jump too large: {max_jump}");
    }

    #[test]
    fn drying_scenario_trends_down() {
        let mut sim = GreenhouseSim::new(Scenario::Drying, 600.0);
        let before: f64 = soil_samples(&mut sim, 20).iter().sum::<f64>() / 20.0;
        // Let evaporation run.
        for _ in 0..200 {
            sim.sample();
        }
        let after: f64 = soil_samples(&mut sim, 20).iter().sum::<f64>() / 20.0;
        assert!(
            after < before,
            "drying soil should lose moisture: before={before:.1} after={after:.1}"
        );
    }

    #[test]
    fn humid_scenario_stays_wetter_than_drying() {
        let mut humid = GreenhouseSim::new(Scenario::Humid, 600.0);
        let mut drying = GreenhouseSim::new(Scenario::Drying, 600.0);
        for _ in 0..150 {
            humid.sample();
            drying.sample();
        }
        let humid_avg: f64 = soil_samples(&mut humid, 30).iter().sum::<f64>() / 30.0;
        let drying_avg: f64 = soil_samples(&mut drying, 30).iter().sum::<f64>() / 30.0;
        assert!(
            humid_avg > drying_avg,
            "humid ({humid_avg:.1}) should stay wetter than drying ({drying_avg:.1})"
        );
    }

    #[test]
    fn air_humidity_anticorrelates_with_temperature() {
        // Across many ticks, hotter samples should carry lower air humidity
        // on average. Use a long diurnal period so temperature varies mostly
        // through its noise term within the sample run.
        let mut sim = GreenhouseSim::new(Scenario::Stable, 600.0);
        let samples: Vec<Readings> = (0..400).map(|_| sim.sample()).collect();

        let mean_t = samples.iter().map(|r| r.air_temp).sum::<f64>() / samples.len() as f64;
        let mean_h = samples.iter().map(|r| r.air_humidity).sum::<f64>() / samples.len() as f64;
        let cov: f64 = samples
            .iter()
            .map(|r| (r.air_temp - mean_t) * (r.air_humidity - mean_h))
            .sum::<f64>()
            / samples.len() as f64;

        assert!(cov < 0.0, "temp/humidity covariance should be negative: {cov:.2}");
    }

    #[test]
    fn flaky_scenario_has_more_variation() {
        fn variance(samples: &[f64]) -> f64 {
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            samples.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / samples.len() as f64
        }

        let mut stable = GreenhouseSim::new(Scenario::Stable, 600.0);
        let mut flaky = GreenhouseSim::new(Scenario::Flaky, 600.0);

        let var_stable = variance(&soil_samples(&mut stable, 200));
        let var_flaky = variance(&soil_samples(&mut flaky, 200));

        assert!(
            var_flaky > var_stable,
            "flaky variance ({var_flaky:.1}) should exceed stable ({var_stable:.1})"
        );
    }

    #[test]
    fn scenario_from_str_lossy() {
        assert_eq!(Scenario::from_str_lossy("drying"), Scenario::Drying);
        assert_eq!(Scenario::from_str_lossy("STABLE"), Scenario::Stable);
        assert_eq!(Scenario::from_str_lossy("Humid"), Scenario::Humid);
        assert_eq!(Scenario::from_str_lossy("flaky"), Scenario::Flaky);
        assert_eq!(Scenario::from_str_lossy("unknown"), Scenario::Drying);
        assert_eq!(Scenario::from_str_lossy(""), Scenario::Drying);
    }

    #[test]
    fn scenario_display() {
        assert_eq!(Scenario::Drying.to_string(), "drying");
        assert_eq!(Scenario::Stable.to_string(), "stable");
        assert_eq!(Scenario::Humid.to_string(), "humid");
        assert_eq!(Scenario::Flaky.to_string(), "flaky");
    }

    #[test]
    fn approx_std_normal_has_zero_mean() {
        let n = 5000;
        let sum: f64 = (0..n).map(|_| approx_std_normal()).sum();
        let mean = sum / n as f64;
        // With n=5000 the std error is 1/sqrt(5000) ≈ 0.014, so ±0.15 is
        // generous.
        assert!(
            mean.abs() < 0.15,
            "approx_std_normal mean should be near zero: {mean}"
        );
    }
}
