// FairSplit - Web Server
// REST API with Axum: fairness analysis + saved group history

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use fair_split::{
    analyze, generate_transaction_id, load_config, open_store, Analysis, Contribution,
    GroupCategory, GroupRecord, GroupStore, GroupSummary, NewGroup,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const ADDR_ENV: &str = "FAIRSPLIT_ADDR";

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<Box<dyn GroupStore + Send>>>,
}

impl AppState {
    fn new(store: Box<dyn GroupStore + Send>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` against the store. The guard never crosses an await point.
    fn with_store<T>(
        &self,
        f: impl FnOnce(&dyn GroupStore) -> anyhow::Result<T>,
    ) -> Result<T, ApiError> {
        let store = self
            .store
            .lock()
            .map_err(|_| ApiError::internal("group store lock poisoned"))?;

        f(&**store).map_err(|e| {
            error!("store error: {:#}", e);
            ApiError::internal(format!("{:#}", e))
        })
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Deserialize)]
struct AnalyzeRequest {
    members: Vec<Contribution>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    #[serde(flatten)]
    analysis: Analysis,
    status: String,
    settlement_note: String,
    transaction_id: String,
}

#[derive(Deserialize)]
struct SaveGroupRequest {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: GroupCategory,
    members: Vec<Contribution>,
}

#[derive(Serialize)]
struct SavedGroup {
    id: i64,
}

fn analyze_members(members: &[Contribution]) -> Result<Analysis, ApiError> {
    if members.len() < 2 {
        return Err(ApiError::bad_request(
            "Please add at least 2 members to calculate fairness.",
        ));
    }

    analyze(members).ok_or_else(|| ApiError::bad_request("contribution amounts are too large to analyze"))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}

/// POST /api/analyze - Fairness score + settlements for a member list
async fn analyze_handler(Json(req): Json<AnalyzeRequest>) -> ApiResult<AnalyzeResponse> {
    let analysis = analyze_members(&req.members)?;

    let response = AnalyzeResponse {
        status: analysis.report.status().to_string(),
        settlement_note: analysis.settlement_note(),
        transaction_id: generate_transaction_id(),
        analysis,
    };

    info!(
        members = response.analysis.members.len(),
        score = response.analysis.report.score,
        settlements = response.analysis.settlements.len(),
        "analyzed contributions"
    );
    Ok(ApiResponse::ok(response))
}

/// GET /api/groups - Saved groups, newest first
async fn list_groups(State(state): State<AppState>) -> ApiResult<Vec<GroupSummary>> {
    let groups = state.with_store(|store| store.list_groups())?;
    Ok(ApiResponse::ok(groups))
}

/// POST /api/groups - Analyze and save a group
async fn save_group(
    State(state): State<AppState>,
    Json(req): Json<SaveGroupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SavedGroup>>), ApiError> {
    let analysis = analyze_members(&req.members)?;
    let group = NewGroup::from_analysis(
        &req.name,
        req.description.as_deref(),
        req.category,
        &analysis,
    )
    .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let id = state.with_store(|store| store.save_group(&group))?;
    Ok((StatusCode::CREATED, ApiResponse::ok(SavedGroup { id })))
}

/// GET /api/groups/:id - One saved group with its members
async fn get_group(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<GroupRecord> {
    match state.with_store(|store| store.get_group(id))? {
        Some(group) => Ok(ApiResponse::ok(group)),
        None => Err(ApiError::not_found(format!("no saved group with ID {}", id))),
    }
}

/// DELETE /api/groups/:id
async fn delete_group(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<SavedGroup> {
    if state.with_store(|store| store.delete_group(id))? {
        Ok(ApiResponse::ok(SavedGroup { id }))
    } else {
        Err(ApiError::not_found(format!("no saved group with ID {}", id)))
    }
}

// ============================================================================
// Main Server
// ============================================================================

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/analyze", post(analyze_handler))
        .route("/groups", get(list_groups).post(save_group))
        .route("/groups/:id", get(get_group).delete(delete_group))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    fair_split::init_tracing(&config.log_filter, None)?;

    info!("FairSplit web server {}", fair_split::VERSION);

    let store = open_store(&config)?;
    let app = router(AppState::new(store));

    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    info!(%addr, "server running, API under /api");

    axum::serve(listener, app)
        .await
        .context("server error")?;

    Ok(())
}
