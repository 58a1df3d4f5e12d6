use crate::core::converter::ConversionRequest;
use crate::core::rates::RateSnapshot;
use crate::server::AppState;
use crate::server::error::ApiResult;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    pub source: Option<String>,
    pub target: Option<String>,
    pub amount: Option<f64>,
}

impl From<ConvertParams> for ConversionRequest {
    fn from(params: ConvertParams) -> Self {
        ConversionRequest {
            source: params.source,
            target: params.target,
            amount: params.amount,
        }
    }
}

pub async fn convert(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ConvertParams>, QueryRejection>,
) -> ApiResult<Json<f64>> {
    let Query(params) = params.inspect_err(|e| warn!(error = %e, "Invalid conversion query"))?;
    info!(
        source = ?params.source,
        target = ?params.target,
        amount = ?params.amount,
        "Received conversion request"
    );

    let request = ConversionRequest::from(params)
        .validate()
        .inspect_err(|e| warn!(error = %e, "Invalid conversion input"))?;
    let converted = state.converter.convert_request(&request)?;
    Ok(Json(converted))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatesResponse {
    pub base: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub rates: BTreeMap<String, f64>,
}

impl RatesResponse {
    fn from_snapshot(base: &str, snapshot: &RateSnapshot) -> Self {
        RatesResponse {
            base: base.to_string(),
            fetched_at: snapshot.fetched_at,
            rates: snapshot
                .rates
                .iter()
                .map(|(code, rate)| (code.clone(), *rate))
                .collect(),
        }
    }
}

pub async fn rates(State(state): State<Arc<AppState>>) -> Json<RatesResponse> {
    let snapshot = state.store.snapshot();
    Json(RatesResponse::from_snapshot(state.store.base(), &snapshot))
}

pub async fn healthz() -> &'static str {
    "ok"
}
