use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::aggregate::{AggregateResult, Aggregator, CategoryStatus};
use crate::config::{AiConfig, SourcesConfig};
use crate::fetch::types::Category;
use crate::synth::{Briefing, Synthesizer};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub synthesizer: Arc<Synthesizer>,
    pub per_attempt_timeout: Duration,
}

impl AppState {
    pub fn from_config(sources: &SourcesConfig, ai: &AiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            aggregator: Arc::new(Aggregator::from_config(sources)?),
            synthesizer: Arc::new(Synthesizer::from_config(ai)),
            per_attempt_timeout: sources.per_attempt_timeout(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/data", get(get_data))
        .route("/api/briefing", get(get_briefing))
        .route("/api/widget/{category}", get(get_widget))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct DataQuery {
    /// Comma-separated category names; all categories when absent.
    #[serde(default)]
    categories: Option<String>,
}

#[derive(Serialize)]
struct DataResponse {
    data: AggregateResult,
    status: std::collections::BTreeMap<Category, CategoryStatus>,
    timestamp: chrono::DateTime<chrono::Utc>,
}

impl DataResponse {
    fn new(data: AggregateResult) -> Self {
        Self {
            status: data.statuses(),
            data,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: msg.into() })).into_response()
}

fn parse_categories(raw: Option<&str>) -> anyhow::Result<BTreeSet<Category>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Category::ALL.into_iter().collect()),
        Some(list) => list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect(),
    }
}

async fn get_data(State(st): State<AppState>, Query(q): Query<DataQuery>) -> Response {
    let categories = match parse_categories(q.categories.as_deref()) {
        Ok(c) => c,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let data = st
        .aggregator
        .aggregate(&categories, st.per_attempt_timeout)
        .await;
    Json(DataResponse::new(data)).into_response()
}

async fn get_briefing(State(st): State<AppState>) -> Json<Briefing> {
    let data = st.aggregator.aggregate_all(st.per_attempt_timeout).await;
    Json(st.synthesizer.synthesize(&data).await)
}

async fn get_widget(State(st): State<AppState>, Path(raw): Path<String>) -> Response {
    let category: Category = match raw.parse() {
        Ok(c) => c,
        Err(e) => return error_response(StatusCode::NOT_FOUND, e.to_string()),
    };
    let data = st
        .aggregator
        .aggregate(&BTreeSet::from([category]), st.per_attempt_timeout)
        .await;
    Json(DataResponse::new(data)).into_response()
}
