//! Trained-model loading and inference: a logistic-regression classifier plus
//! its feature scaler, both deserialized from the JSON artifacts exported by
//! the training pipeline.
//!
//! Feature order is significant and must match training:
//! `[hour, day, month, dayofweek, air_temp, air_humidity, soil_humidity]`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Width of the feature vector the model was trained on.
pub const FEATURE_COUNT: usize = 7;

// ---------------------------------------------------------------------------
// Prediction context
// ---------------------------------------------------------------------------

/// Per-request snapshot of the time and sensor inputs. Built by the HTTP
/// layer (with its fallback policies applied), consumed once, discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionContext {
    /// Wall-clock hour the schedule is derived against; always in [0, 23].
    pub hour: u8,
    pub day: i64,
    pub month: i64,
    /// Monday = 0 .. Sunday = 6, matching the training data encoding.
    pub day_of_week: i64,
    pub air_temp: f64,
    pub air_humidity: f64,
    pub soil_humidity: f64,
}

impl PredictionContext {
    /// The order-significant feature vector fed to the scaler.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.hour as f64,
            self.day as f64,
            self.month as f64,
            self.day_of_week as f64,
            self.air_temp,
            self.air_humidity,
            self.soil_humidity,
        ]
    }
}

// ---------------------------------------------------------------------------
// Artifact file structures
// ---------------------------------------------------------------------------

/// Standard-scaler parameters: `x' = (x - mean) / scale`, per feature.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Binary logistic-regression weights. `coef` holds a single row of
/// per-feature coefficients; `intercept` a single bias term.
#[derive(Debug, Clone, Deserialize)]
pub struct RegressionParams {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Classifier seam
// ---------------------------------------------------------------------------

/// The capability the prediction endpoint needs from a trained model.
pub trait Classifier: Send + Sync {
    /// Probability of the positive ("needs watering") class, in [0, 1].
    fn predict_proba(&self, features: &[f64; FEATURE_COUNT]) -> f64;

    /// Class label at the conventional 0.5 threshold.
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> bool {
        self.predict_proba(features) > 0.5
    }
}

// ---------------------------------------------------------------------------
// Model bundle
// ---------------------------------------------------------------------------

/// The classifier and its paired scaler, loaded once at startup and shared
/// read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    coef: Vec<f64>,
    intercept: f64,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl ModelBundle {
    /// Load and shape-check both artifacts. Any failure here means the model
    /// is unavailable for the whole process lifetime; the caller decides what
    /// that does to requests.
    pub fn load(model_path: &str, scaler_path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(model_path)
            .with_context(|| format!("failed to read model weights: {model_path}"))?;
        let weights: RegressionParams = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse model weights: {model_path}"))?;

        let raw = std::fs::read_to_string(scaler_path)
            .with_context(|| format!("failed to read scaler: {scaler_path}"))?;
        let scaler: ScalerParams = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scaler: {scaler_path}"))?;

        Self::from_parts(weights, scaler)
    }

    /// Validate shapes and assemble the bundle.
    pub fn from_parts(weights: RegressionParams, scaler: ScalerParams) -> Result<Self> {
        if weights.coef.len() != 1 {
            bail!(
                "model weights must have exactly one output row, got {}",
                weights.coef.len()
            );
        }
        let coef = weights.coef.into_iter().next().unwrap_or_default();
        if coef.len() != FEATURE_COUNT {
            bail!(
                "model expects {} coefficients, got {}",
                FEATURE_COUNT,
                coef.len()
            );
        }
        if weights.intercept.len() != 1 {
            bail!(
                "model weights must have exactly one intercept, got {}",
                weights.intercept.len()
            );
        }
        if scaler.mean.len() != FEATURE_COUNT || scaler.scale.len() != FEATURE_COUNT {
            bail!(
                "scaler must carry {} means and scales, got {} / {}",
                FEATURE_COUNT,
                scaler.mean.len(),
                scaler.scale.len()
            );
        }
        for (i, s) in scaler.scale.iter().enumerate() {
            if !s.is_finite() || *s == 0.0 {
                bail!("scaler scale[{i}] is {s}, must be finite and non-zero");
            }
        }

        Ok(Self {
            coef,
            intercept: weights.intercept[0],
            mean: scaler.mean,
            scale: scaler.scale,
        })
    }
}

impl Classifier for ModelBundle {
    fn predict_proba(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let mut z = self.intercept;
        for i in 0..FEATURE_COUNT {
            let scaled = (features[i] - self.mean[i]) / self.scale[i];
            z += self.coef[i] * scaled;
        }
        sigmoid(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

// ===========================================================================
// Tests
// ===========================================================================
