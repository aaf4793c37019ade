//! Measurement ingest and aggregate query endpoints.
//!
//! - `POST /sensorMeasurement` stores one reading.
//! - `GET /sensorMeasurement/{sensor_id}` returns min/mean/max per bucket.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::AppState;
use crate::error::{ApiError, ApiResult};
use crate::interval::Interval;
use crate::models::{shape_aggregates, AggregateBucket, NewMeasurement};
use crate::storage::AggregateQuery;
use crate::window::TimeWindow;

const NOT_JSON_MESSAGE: &str = "Issue with body format and/or mimetype. Only JSON is accepted.";
const MALFORMED_BODY_MESSAGE: &str = "Malformed request body.";
const MISSING_PARAMS_MESSAGE: &str =
    "Malformed request, missing sensor id and/or measurement type.";

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/sensorMeasurement", post(create_measurement))
        .route("/sensorMeasurement/{sensor_id}", get(measurement_aggregates))
}

/// Body of simple acknowledgement responses.
#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

async fn create_measurement(
    State(store): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageBody>)> {
    // ---
    let fields = match payload {
        Ok(Json(Value::Object(fields))) => fields,
        Ok(Json(other)) => {
            debug!("POST /sensorMeasurement - body is not an object: {}", other);
            return Err(ApiError::BadRequest(NOT_JSON_MESSAGE.into()));
        }
        Err(rejection) => {
            debug!("POST /sensorMeasurement - rejected body: {}", rejection);
            return Err(ApiError::BadRequest(NOT_JSON_MESSAGE.into()));
        }
    };

    let measurement: NewMeasurement =
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            debug!("POST /sensorMeasurement - malformed body: {}", e);
            ApiError::BadRequest(MALFORMED_BODY_MESSAGE.into())
        })?;

    store.insert(&measurement).await?;

    info!(
        sensor_id = %measurement.sensor_id,
        meas_type = %measurement.meas_type,
        "Stored measurement"
    );
    Ok((
        StatusCode::CREATED,
        Json(MessageBody {
            message: "Sensor measurement created.",
        }),
    ))
}

/// Query string of the aggregate endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateParams {
    meas_type: Option<String>,
    aggregate: Option<String>,
    time_frame_start: Option<String>,
    time_frame_stop: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregatesResponse {
    message: String,
    aggregated_data: Vec<AggregateBucket>,
    interval: &'static str,
    start_date: String,
    stop_date: String,
}

async fn measurement_aggregates(
    State(store): State<AppState>,
    Path(sensor_id): Path<String>,
    params: Result<Query<AggregateParams>, QueryRejection>,
) -> ApiResult<Json<AggregatesResponse>> {
    // ---
    let Query(params) =
        params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    debug!("GET /sensorMeasurement/{} - {:?}", sensor_id, params);

    let meas_type = params
        .meas_type
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest(MISSING_PARAMS_MESSAGE.into()))?;

    let interval = Interval::select(params.aggregate.as_deref());
    let window = TimeWindow::resolve(
        params.time_frame_start.as_deref(),
        params.time_frame_stop.as_deref(),
    )?;

    let rows = store
        .aggregate(&AggregateQuery {
            sensor_id: &sensor_id,
            meas_type,
            interval,
            window: &window,
        })
        .await?;

    info!(
        "GET /sensorMeasurement/{} - returning {} {} buckets",
        sensor_id,
        rows.len(),
        interval
    );

    Ok(Json(AggregatesResponse {
        message: format!("Measurement aggregates for device {}", sensor_id),
        aggregated_data: shape_aggregates(rows),
        interval: interval.as_str(),
        start_date: window.start.text,
        stop_date: window.stop.text,
    }))
}
