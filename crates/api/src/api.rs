//! HTTP API for predictions, dataset browsing, model stats and metrics

use crate::config::ServerConfig;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fermix_lib::{
    DatasetError, DatasetPage, DatasetStore, ModelVariant, NotLoadedError, PredictError,
    PredictionRequest, PredictionResult, Predictor, ServingMetrics, StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "Fermix Exoplanet Classification API";
pub const SERVICE_DESCRIPTION: &str =
    "Classifies Kepler Objects of Interest as confirmed exoplanets or false positives";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub datasets: Arc<DatasetStore>,
    pub config: ServerConfig,
    pub default_variant: ModelVariant,
    pub metrics: ServingMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        predictor: Predictor,
        datasets: Arc<DatasetStore>,
        config: ServerConfig,
        default_variant: ModelVariant,
    ) -> Self {
        Self {
            predictor,
            datasets,
            config,
            default_variant,
            metrics: ServingMetrics::new(),
            logger: StructuredLogger::new("fermix-api"),
        }
    }
}

/// Error response rendered as `{"detail": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        let status = match err {
            PredictError::NotLoaded(_) => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::UnknownVariant(_) | PredictError::Alignment(_) => StatusCode::BAD_REQUEST,
            PredictError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<NotLoadedError> for ApiError {
    fn from(err: NotLoadedError) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
    }
}

impl From<DatasetError> for ApiError {
    fn from(err: DatasetError) -> Self {
        let status = match err {
            DatasetError::NotFound { .. } => StatusCode::NOT_FOUND,
            DatasetError::PageOutOfRange { .. } | DatasetError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            DatasetError::Unreadable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

/// Service banner
async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    let prefix = state.config.route_prefix();
    Json(json!({
        "message": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "docs": format!("{}/info", prefix),
        "health": format!("{}/health", prefix),
    }))
}

/// Liveness plus model load state; always 200
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": SERVICE_VERSION,
        "models_loaded": state.predictor.cache().is_loaded(),
    }))
}

#[derive(Debug, Deserialize)]
struct DatasetQuery {
    #[serde(default = "default_sample")]
    sample: bool,
    #[serde(default = "default_page")]
    page: usize,
    page_size: Option<usize>,
}

fn default_sample() -> bool {
    true
}

fn default_page() -> usize {
    1
}

async fn dataset(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DatasetQuery>, QueryRejection>,
) -> Result<Json<DatasetPage>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let page_size = query.page_size.unwrap_or(state.config.default_page_size);

    let page = state.datasets.page(query.sample, query.page, page_size)?;
    state.metrics.inc_dataset_pages(query.sample);
    Ok(Json(page))
}

/// Training metadata projection
async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let metadata = state.predictor.cache().metadata().map_err(|_| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Models not loaded. Please check server logs.",
        )
    })?;

    Ok(Json(json!({
        "created_utc": metadata.created_utc,
        "dataset": metadata.dataset,
        "task": metadata.task,
        "n_samples": metadata.n_samples,
        "n_features": metadata.n_features,
        "models": metadata.models,
    })))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(body) = payload.map_err(|e| {
        state.metrics.inc_prediction_errors("bad_request");
        ApiError::bad_request(e.body_text())
    })?;
    let Some(fields) = body.as_object() else {
        state.metrics.inc_prediction_errors("bad_request");
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    let start = Instant::now();
    let outcome = PredictionRequest::from_json(fields, state.default_variant).and_then(|request| {
        let result = state.predictor.predict(&request)?;
        Ok((result, request.features.len()))
    });

    state
        .metrics
        .observe_prediction_latency(start.elapsed().as_secs_f64());

    match outcome {
        Ok((result, supplied)) => {
            state
                .metrics
                .inc_predictions(result.model_used, &result.predicted_label);
            state.logger.log_prediction(&result, supplied);
            Ok(Json(result))
        }
        Err(e) => {
            state.metrics.inc_prediction_errors(e.kind());
            match &e {
                PredictError::Inference(_) => warn!(error = %e, "Prediction failed"),
                _ => info!(kind = e.kind(), error = %e, "Prediction rejected"),
            }
            Err(e.into())
        }
    }
}

/// Service description, endpoint map and per-model load status
async fn api_info(State(state): State<Arc<AppState>>) -> Json<Value> {
    let prefix = state.config.route_prefix();
    let cache = state.predictor.cache();
    let status = if cache.is_loaded() { "loaded" } else { "not loaded" };

    let mut models = serde_json::Map::new();
    for variant in ModelVariant::ALL {
        let mut entry = json!({
            "type": variant.estimator(),
            "status": status,
        });
        if let Ok(model) = cache.model(variant) {
            entry["sha256"] = json!(model.digest());
        }
        let n_estimators = cache
            .metadata()
            .ok()
            .and_then(|m| m.model_summary(variant))
            .and_then(|summary| summary.get("n_estimators"))
            .cloned();
        if let Some(n) = n_estimators {
            entry["n_estimators"] = n;
        }
        models.insert(variant.metadata_key().to_string(), entry);
    }

    Json(json!({
        "name": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "description": SERVICE_DESCRIPTION,
        "endpoints": {
            "health": format!("{}/health", prefix),
            "dataset": format!("{}/dataset", prefix),
            "stats": format!("{}/stats", prefix),
            "predict": format!("{}/predict", prefix),
            "info": format!("{}/info", prefix),
            "metrics": "/metrics",
        },
        "models": models,
    }))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let versioned = Router::new()
        .route("/health", get(health))
        .route("/dataset", get(dataset))
        .route("/stats", get(stats))
        .route("/predict", post(predict))
        .route("/info", get(api_info));

    Router::new()
        .route("/", get(root))
        .route("/metrics", get(metrics))
        .nest(state.config.route_prefix(), versioned)
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
