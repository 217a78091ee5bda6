use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::model::ModelBundle;
use crate::schedule::WateringWindows;

// ---------------------------------------------------------------------------
// Public type alias
// ---------------------------------------------------------------------------

/// Everything here is read-only after startup, so plain `Arc` sharing is
/// enough — no lock.
pub type SharedState = Arc<AppState>;

// ---------------------------------------------------------------------------
// Core type
// ---------------------------------------------------------------------------

pub struct AppState {
    pub started_at: Instant,
    pub windows: WateringWindows,
    /// `None` when the artifacts failed to load at startup; every predict
    /// request is then answered with a service-unavailable error.
    pub model: Option<ModelBundle>,
}

// ---------------------------------------------------------------------------
// JSON response (what the status API returns)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    pub model_loaded: bool,
    pub morning_hours: Vec<u8>,
    pub evening_hours: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Construction & snapshots
// ---------------------------------------------------------------------------

impl AppState {
    pub fn new(windows: WateringWindows, model: Option<ModelBundle>) -> Self {
        Self {
            started_at: Instant::now(),
            windows,
            model,
        }
    }

    /// Build the JSON-serialisable status snapshot.
    pub fn to_status(&self) -> StatusResponse {
        StatusResponse {
            uptime_secs: self.started_at.elapsed().as_secs(),
            model_loaded: self.model.is_some(),
            morning_hours: self.windows.morning().to_vec(),
            evening_hours: self.windows.evening().to_vec(),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reflects_missing_model() {
        let state = AppState::new(WateringWindows::default(), None);
        let status = state.to_status();
        assert!(!status.model_loaded);
        assert_eq!(status.morning_hours, vec![6, 7, 8, 9]);
        assert_eq!(status.evening_hours, vec![17, 18, 19]);
    }

    #[test]
    fn status_serializes_expected_fields() {
        let state = AppState::new(WateringWindows::from_hours(&[7, 17]), None);
        let json = serde_json::to_value(state.to_status()).unwrap();
        assert_eq!(json["model_loaded"], false);
        assert_eq!(json["morning_hours"], serde_json::json!([7]));
        assert_eq!(json["evening_hours"], serde_json::json!([17]));
        assert!(json["uptime_secs"].is_u64());
    }
}
