//! Web server exposing program generation and management.
//!
//! Provides a REST API for creating, listing, updating and deleting
//! programs, rerolling single weeks, and exporting programs as markdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::catalog::{TemplateSummary, available_templates};
use crate::dice::RngDice;
use crate::domain::{NewProgram, Program, ProgramUpdate};
use crate::error::ProgramError;
use crate::export::{ExportView, render};
use crate::generator::DailyBreakdown;
use crate::service::ProgramService;

const DEFAULT_PAGE_SIZE: u32 = 100;

/// Shared application state.
pub struct AppState {
    pub programs: ProgramService,
}

// === JSON Response Types ===

#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

// === Query Parameters ===

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_page_size")]
    pub limit: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct RerollParams {
    pub lift: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub view: Option<String>,
}

// === Error Responses ===

/// Error returned by every handler, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<ProgramError> for ApiError {
    fn from(err: ProgramError) -> Self {
        let status = match &err {
            ProgramError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            ProgramError::NotFound(_) => StatusCode::NOT_FOUND,
            ProgramError::GenerationInvariantViolation(_) | ProgramError::Store(_) => {
                log::error!("Request failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),*) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    Self {
                        status: rejection.status(),
                        detail: rejection.body_text(),
                    }
                }
            }
        )*
    };
}

impl_from_rejection!(JsonRejection, PathRejection, QueryRejection);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// === Router Setup ===

/// Creates the application router.
pub fn create_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/programs/templates", get(get_templates))
        .route("/api/programs", post(create_program).get(list_programs))
        .route(
            "/api/programs/{id}",
            get(get_program).patch(update_program).delete(delete_program),
        )
        .route(
            "/api/programs/{id}/reroll-week/{week}",
            post(reroll_week),
        )
        .route("/api/programs/{id}/breakdown", get(get_breakdown))
        .route("/api/programs/{id}/export", get(export_program))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}

/// Runs the web server.
pub async fn run_server(
    state: Arc<AppState>,
    port: u16,
    cors_origins: &[String],
) -> anyhow::Result<()> {
    let app = create_router(state, cors_origins);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("Server running at http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// === API Handlers ===

/// GET / - Service banner.
async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Battleship Program API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// GET /api/programs/templates - Catalog listing for program creation forms.
async fn get_templates() -> Json<Vec<TemplateSummary>> {
    Json(available_templates())
}

/// POST /api/programs - Generate and store a new program.
async fn create_program(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewProgram>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Program>)> {
    let Json(request) = payload?;
    let mut dice = RngDice::from_os();
    let program = state.programs.create_program(request, &mut dice).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

/// GET /api/programs - Page through programs, oldest first.
async fn list_programs(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Program>>> {
    let Query(params) = params?;
    let programs = state
        .programs
        .list_programs(params.skip, params.limit)
        .await?;
    Ok(Json(programs))
}

/// GET /api/programs/{id}
async fn get_program(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Program>> {
    let Path(id) = id?;
    Ok(Json(state.programs.get_program(id).await?))
}

/// PATCH /api/programs/{id} - Update name and/or status.
async fn update_program(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProgramUpdate>, JsonRejection>,
) -> ApiResult<Json<Program>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    Ok(Json(state.programs.update_program(id, update).await?))
}

/// DELETE /api/programs/{id}
async fn delete_program(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.programs.delete_program(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/programs/{id}/reroll-week/{week} - Reroll one lift or the whole week.
async fn reroll_week(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(Uuid, u32)>, PathRejection>,
    params: Result<Query<RerollParams>, QueryRejection>,
) -> ApiResult<Json<Program>> {
    let Path((id, week)) = path?;
    let Query(params) = params?;
    let mut dice = RngDice::from_os();
    let program = state
        .programs
        .reroll_week(id, week, params.lift.as_deref(), &mut dice)
        .await?;
    Ok(Json(program))
}

/// GET /api/programs/{id}/breakdown - Breakdown rebuilt from the stored weeks.
async fn get_breakdown(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<DailyBreakdown>> {
    let Path(id) = id?;
    Ok(Json(state.programs.breakdown(id).await?))
}

/// GET /api/programs/{id}/export?view=coach|athlete|table - Markdown download.
async fn export_program(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<ExportParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Path(id) = id?;
    let Query(params) = params?;
    let view = match params.view.as_deref() {
        Some(view) => view.parse::<ExportView>()?,
        None => ExportView::default(),
    };

    let program = state.programs.get_program(id).await?;
    let disposition = format!("attachment; filename=\"{}\"", view.file_name(&program));

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render(&program, view),
    )
        .into_response())
}
