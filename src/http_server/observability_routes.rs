//! Observability HTTP Routes
//!
//! Liveness endpoint. Answers only once the store can be read, and reports
//! how many records it holds.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::balade_routes::BaladeState;
use crate::rest_api::RestResult;
use crate::store::Filter;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub records: u64,
}

/// Health check route
pub fn health_routes(state: Arc<BaladeState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<BaladeState>>) -> RestResult<Json<HealthResponse>> {
    let records = state
        .call(|store| store.count_by_filter(&Filter::All))
        .await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        records,
    }))
}
