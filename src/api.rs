use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::aggregator::{
    AggregateError, CurrentSnapshot, Observation, Summary, SummaryStats, YearlyAggregate,
    YearlyAverage,
};
use crate::data::{DataError, TableView};
use crate::presenter::{
    ChangeIndicator, DashboardView, Headline, StatRow, TimeSeries, Tone, Trend, YearlyBars,
};
use crate::services::{DashboardService, ServiceError};

const DASHBOARD_PAGE: &str = include_str!("../assets/dashboard.html");

/// File name offered for the CSV download
pub const CSV_FILE_NAME: &str = "wacc_data.csv";

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct CacheClearResponse {
    pub cleared: usize,
}

/// Columns requested from `/data`, one `columns` parameter per name
#[derive(Debug, Default, PartialEq, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ColumnSelection {
    /// Column name to include; repeat for several, all columns when omitted
    #[param(style = Form, explode)]
    pub columns: Vec<String>,
}

impl ColumnSelection {
    /// Collect every `columns` value in request order, ignoring blanks
    pub fn from_query(params: Vec<(String, String)>) -> Self {
        let columns = params
            .into_iter()
            .filter(|(key, value)| key == "columns" && !value.trim().is_empty())
            .map(|(_, value)| value)
            .collect();
        Self { columns }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        get_dashboard,
        get_summary,
        get_data,
        download_csv,
        clear_cache
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        CacheClearResponse,
        DashboardView,
        Headline,
        ChangeIndicator,
        StatRow,
        TimeSeries,
        YearlyBars,
        Trend,
        Tone,
        Summary,
        CurrentSnapshot,
        SummaryStats,
        YearlyAggregate,
        YearlyAverage,
        Observation,
        TableView
    )),
    tags(
        (name = "dashboard", description = "WACC dashboard data"),
        (name = "system", description = "Service health and cache control")
    )
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Data(DataError::NoDataFound { .. }) => StatusCode::NOT_FOUND,
            ServiceError::Data(DataError::UnknownColumn(_)) => StatusCode::BAD_REQUEST,
            ServiceError::Data(DataError::Parse { .. })
            | ServiceError::Data(DataError::ColumnLayout { .. })
            | ServiceError::Aggregate(AggregateError::EmptyDataset)
            | ServiceError::Aggregate(AggregateError::InsufficientData { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Data(DataError::Io { .. })
            | ServiceError::Data(DataError::CsvEncode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(get_dashboard))
        .route("/summary", get(get_summary))
        .route("/data", get(get_data))
        .route("/data/csv", get(download_csv))
        .route("/cache/clear", post(clear_cache))
        .with_state(state);

    Router::new()
        .route("/", get(index))
        .nest("/api/v1", api_routes)
}

async fn index() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "system",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard view model", body = DashboardView),
        (status = 404, description = "No spreadsheet in the data directory", body = ErrorResponse),
        (status = 422, description = "Spreadsheet unusable", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardView>, ServiceError> {
    debug!("Building dashboard view");
    let view = state.dashboard_service.dashboard().await.map_err(|e| {
        error!("Failed to build dashboard: {}", e);
        e
    })?;

    for warning in &view.warnings {
        warn!("Dashboard degraded: {}", warning);
    }
    info!(
        "Dashboard ready: current {} as of {}",
        view.headline.display, view.headline.as_of
    );

    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/v1/summary",
    tag = "dashboard",
    responses(
        (status = 200, description = "Snapshot, statistics and yearly averages", body = Summary),
        (status = 404, description = "No spreadsheet in the data directory", body = ErrorResponse),
        (status = 422, description = "Spreadsheet unusable", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
async fn get_summary(State(state): State<AppState>) -> Result<Json<Summary>, ServiceError> {
    let summary = state.dashboard_service.summary().await.map_err(|e| {
        error!("Failed to summarize data: {}", e);
        e
    })?;

    info!(
        "Summarized {} observations (yearly view: {})",
        summary.observations.len(),
        summary.yearly.is_some()
    );
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/data",
    tag = "dashboard",
    params(ColumnSelection),
    responses(
        (status = 200, description = "Raw table rows", body = TableView),
        (status = 400, description = "Unknown column requested", body = ErrorResponse),
        (status = 404, description = "No spreadsheet in the data directory", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
async fn get_data(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<TableView>, ServiceError> {
    let selection = ColumnSelection::from_query(params);
    debug!("Fetching table with {} selected columns", selection.columns.len());

    let view = state
        .dashboard_service
        .data_table(&selection.columns)
        .await
        .map_err(|e| {
            warn!("Failed to fetch table data: {}", e);
            e
        })?;

    info!(
        "Returning {} rows x {} columns",
        view.rows.len(),
        view.columns.len()
    );
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/v1/data/csv",
    tag = "dashboard",
    responses(
        (status = 200, description = "Full table as CSV", body = String, content_type = "text/csv"),
        (status = 404, description = "No spreadsheet in the data directory", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
async fn download_csv(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let csv = state.dashboard_service.csv_export().await.map_err(|e| {
        error!("Failed to export CSV: {}", e);
        e
    })?;

    info!("Serving CSV download ({} bytes)", csv.len());
    let disposition = format!("attachment; filename=\"{CSV_FILE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/cache/clear",
    tag = "system",
    responses((status = 200, description = "Cache cleared", body = CacheClearResponse))
)]
#[instrument(skip(state))]
async fn clear_cache(State(state): State<AppState>) -> Json<CacheClearResponse> {
    let cleared = state.dashboard_service.clear_cache().await;
    info!("Cache cleared ({} tables dropped)", cleared);
    Json(CacheClearResponse { cleared })
}
