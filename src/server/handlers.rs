//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::preprocessing::{MES, OPERA, TIPOVUELO};

use super::error::{Result, ServerError};
use super::state::AppState;

/// Flight types accepted by the service
pub const FLIGHT_TYPES: [&str; 2] = ["N", "I"];

/// One flight to score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    #[serde(rename = "OPERA")]
    pub opera: String,
    #[serde(rename = "TIPOVUELO")]
    pub tipo_vuelo: String,
    #[serde(rename = "MES")]
    pub mes: i64,
}

/// Request body of `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRequest {
    pub flights: Vec<Flight>,
}

/// Response body of `POST /predict`, one label per flight in request order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predict: Vec<i32>,
}

// ============================================================================
// System Handlers
// ============================================================================

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
    }))
}

// ============================================================================
// Prediction Handlers
// ============================================================================

pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<FlightRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    // Schema violations are client errors like any other invalid flight
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    validate_flights(&request.flights)?;

    let frame = flights_to_frame(&request.flights)?;
    let features = state.model.prepare_inference_features(&frame)?;
    let predict = state.model.predict(&features)?;

    info!(
        flights = predict.len(),
        delayed = predict.iter().filter(|&&p| p == 1).count(),
        trained = state.model.is_trained(),
        "Served predictions"
    );

    Ok(Json(PredictResponse { predict }))
}

/// Reject batches the model cannot score: empty, months outside 1-12, or flight
/// types other than `N`/`I`. Months are checked across the batch first.
pub fn validate_flights(flights: &[Flight]) -> Result<()> {
    if flights.is_empty() {
        return Err(ServerError::BadRequest("No flights provided".to_string()));
    }
    if flights.iter().any(|f| !(1..=12).contains(&f.mes)) {
        return Err(ServerError::BadRequest("Invalid month value".to_string()));
    }
    if flights.iter().any(|f| !FLIGHT_TYPES.contains(&f.tipo_vuelo.as_str())) {
        return Err(ServerError::BadRequest("Invalid flight type".to_string()));
    }
    Ok(())
}

/// Lay flights out as the raw `OPERA`/`TIPOVUELO`/`MES` frame the encoder reads
pub fn flights_to_frame(flights: &[Flight]) -> Result<DataFrame> {
    let opera: Vec<&str> = flights.iter().map(|f| f.opera.as_str()).collect();
    let tipo_vuelo: Vec<&str> = flights.iter().map(|f| f.tipo_vuelo.as_str()).collect();
    let mes: Vec<i64> = flights.iter().map(|f| f.mes).collect();

    let frame = df!(
        OPERA => opera,
        TIPOVUELO => tipo_vuelo,
        MES => mes
    )
    .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(opera: &str, tipo: &str, mes: i64) -> Flight {
        Flight {
            opera: opera.to_string(),
            tipo_vuelo: tipo.to_string(),
            mes,
        }
    }

    #[test]
    fn test_flight_uses_upper_case_keys() {
        let parsed: Flight =
            serde_json::from_str(r#"{"OPERA": "Aerolineas Argentinas", "TIPOVUELO": "N", "MES": 3}"#).unwrap();
        assert_eq!(parsed, flight("Aerolineas Argentinas", "N", 3));
    }

    #[test]
    fn test_validate_months() {
        assert!(validate_flights(&[flight("Grupo LATAM", "N", 1), flight("Grupo LATAM", "I", 12)]).is_ok());
        let err = validate_flights(&[flight("Grupo LATAM", "N", 13)]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid month value");
        assert!(validate_flights(&[flight("Grupo LATAM", "N", 0)]).is_err());
    }

    #[test]
    fn test_validate_flight_type() {
        let err = validate_flights(&[flight("Grupo LATAM", "O", 3)]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid flight type");
    }

    #[test]
    fn test_month_checked_before_type() {
        let err = validate_flights(&[flight("Grupo LATAM", "X", 3), flight("Grupo LATAM", "N", 13)]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid month value");
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(matches!(validate_flights(&[]), Err(ServerError::BadRequest(_))));
    }

    #[test]
    fn test_flights_to_frame() {
        let frame = flights_to_frame(&[flight("Copa Air", "I", 4), flight("Sky Airline", "N", 11)]).unwrap();
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.width(), 3);
        assert!(frame.column(MES).unwrap().dtype().is_integer());
    }
}
