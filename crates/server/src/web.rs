//! HTTP layer: routes, form-field fallback policies, and response assembly.
//!
//! Two fallback policies guard the predict endpoint (neither ever fails the
//! request):
//! - a *missing* time field defaults to the matching current-time value,
//!   per field;
//! - a time field that is *present but not an integer* (or an hour outside
//!   0-23) resets **all four** time fields to the current time, so the
//!   feature vector never mixes caller time with server time;
//! - missing or unparsable sensor fields read as 0.0.

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tracing::info;

use crate::model::Classifier;
use crate::schedule::{derive, SystemRandom};
use crate::state::SharedState;

const BANNER: &str = "Plant watering prediction service is running";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Raw predict form. Everything arrives as an optional string so the
/// fallback policies can distinguish "absent" from "present but malformed".
#[derive(Debug, Default, Deserialize)]
pub struct PredictForm {
    pub air_temp: Option<String>,
    pub air_humidity: Option<String>,
    pub soil_humidity: Option<String>,
    pub hour: Option<String>,
    pub day: Option<String>,
    pub month: Option<String>,
    pub dayofweek: Option<String>,
}

/// The predict response body.
#[derive(Debug, Serialize)]
pub struct ScheduleResult {
    pub needs_watering: bool,
    pub probability: f64,
    pub optimal_time: String,
    pub alternative_times: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

// ---------------------------------------------------------------------------
// Time context
// ---------------------------------------------------------------------------

/// Current-time values the fallback policies substitute with.
#[derive(Debug, Clone, Copy)]
pub struct TimeParts {
    pub hour: u8,
    pub day: i64,
    pub month: i64,
    pub day_of_week: i64,
}

impl TimeParts {
    /// Local wall-clock time, falling back to UTC when the local offset
    /// cannot be determined (common inside containers).
    pub fn now() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self {
            hour: now.hour(),
            day: now.day() as i64,
            month: now.month() as i64,
            day_of_week: now.weekday().number_days_from_monday() as i64,
        }
    }
}

// ---------------------------------------------------------------------------
// Fallback policies
// ---------------------------------------------------------------------------

fn sensor_or_zero(field: &Option<String>) -> f64 {
    field
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Apply the fallback policies and build the prediction context.
pub fn resolve_context(form: &PredictForm, now: TimeParts) -> crate::model::PredictionContext {
    // A present-but-unparsable time field poisons the whole override set.
    let time_fields = [&form.hour, &form.day, &form.month, &form.dayofweek];
    let any_malformed = time_fields
        .iter()
        .any(|f| matches!(f.as_deref(), Some(s) if s.trim().parse::<i64>().is_err()));

    let parse_or = |field: &Option<String>, fallback: i64| -> i64 {
        field
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(fallback)
    };

    let hour_override = parse_or(&form.hour, now.hour as i64);
    let hour_out_of_range = !(0..=23).contains(&hour_override);

    let (hour, day, month, day_of_week) = if any_malformed || hour_out_of_range {
        (now.hour, now.day, now.month, now.day_of_week)
    } else {
        (
            hour_override as u8,
            parse_or(&form.day, now.day),
            parse_or(&form.month, now.month),
            parse_or(&form.dayofweek, now.day_of_week),
        )
    };

    crate::model::PredictionContext {
        hour,
        day,
        month,
        day_of_week,
        air_temp: sensor_or_zero(&form.air_temp),
        air_humidity: sensor_or_zero(&form.air_humidity),
        soil_humidity: sensor_or_zero(&form.soil_humidity),
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(api_status))
        .route("/api/predict", post(api_predict))
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    BANNER
}

async fn api_status(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.to_status())
}

async fn api_predict(
    State(state): State<SharedState>,
    Form(form): Form<PredictForm>,
) -> Response {
    let Some(model) = &state.model else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorBody {
                error: "model not loaded".to_string(),
            }),
        )
            .into_response();
    };

    let ctx = resolve_context(&form, TimeParts::now());
    let features = ctx.features();
    let needs_watering = model.predict(&features);
    let probability = model.predict_proba(&features);

    let mut rng = SystemRandom::new();
    let schedule = derive(needs_watering, ctx.hour, &state.windows, &mut rng);

    info!(
        needs_watering,
        probability,
        hour = ctx.hour,
        optimal = %schedule.optimal.hhmm(),
        "prediction served"
    );

    let body = ScheduleResult {
        needs_watering,
        probability,
        optimal_time: schedule.optimal.hhmm(),
        alternative_times: schedule.alternatives.iter().map(|s| s.hhmm()).collect(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve(state: SharedState) {
    let port: u16 = env::var("WEB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind web port");

    info!("listening on http://{addr}");

    axum::serve(listener, router(state))
        .await
        .expect("web server error");
}

// ===========================================================================
// Tests
// ===========================================================================
