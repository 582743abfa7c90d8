//! Axum router and all HTTP handlers for execbridge-daemon (§6, External
//! interfaces). `build_router` is the single entry point; `main.rs` calls it
//! and attaches the tracing/CORS middleware layers. Handlers are
//! `pub(crate)` so the scenario tests under `tests/` can compose the bare
//! router directly, matching the teacher's `mqk-daemon::routes` convention.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use execbridge_schemas::{
    parse_sort_by, ExecutionDto, ExecutionStatus, FillUpdateRequest, FilterSpec, NewExecutionRequest, PageEnvelope,
    Pagination, TradeType,
};

use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/executions", get(list_executions))
        .route("/api/v1/executions", post(create_execution))
        .route("/api/v1/executions/batch", post(create_batch))
        .route("/api/v1/execution/:id", get(get_execution))
        .route("/api/v1/execution/:id", put(update_fill))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

// ---------------------------------------------------------------------------
// GET /api/v1/health
// ---------------------------------------------------------------------------

/// Ambient liveness endpoint (SPEC_FULL §C.1) — no dependency checks; the
/// real health/readiness probing tool named in spec §1 is out of scope.
pub(crate) async fn health() -> impl IntoResponse {
    Json(HealthResponse { ok: true, service: "execbridge-daemon", version: env!("CARGO_PKG_VERSION") })
}

// ---------------------------------------------------------------------------
// GET /api/v1/executions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    offset: Option<i64>,
    limit: Option<i64>,
    execution_status: Option<String>,
    trade_type: Option<String>,
    destination: Option<String>,
    security_id: Option<String>,
    ticker: Option<String>,
    sort_by: Option<String>,
}

pub(crate) async fn list_executions(State(st): State<Arc<AppState>>, Query(q): Query<ListQuery>) -> Response {
    let offset = q.offset.unwrap_or(0).max(0);
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let sort = parse_sort_by(q.sort_by.as_deref());

    let mut filter = FilterSpec {
        execution_status: q.execution_status.as_deref().and_then(|s| ExecutionStatus::from_str(s).ok()),
        trade_type: q.trade_type.as_deref().and_then(|s| TradeType::from_str(s).ok()),
        destination: q.destination,
        security_id: q.security_id,
        id: None,
    };

    // §6: "ticker filter requires a reverse lookup via C2". The enricher
    // only resolves tickers it has already cached (§4.2) — an unresolved
    // ticker means no row can possibly match, so we short-circuit to an
    // empty page rather than querying the store with an unconstrained
    // filter.
    if let Some(ticker) = q.ticker.as_deref() {
        match st.enricher.find_security_id_by_ticker(ticker) {
            Some(security_id) => filter.security_id = Some(security_id),
            None => {
                let pagination = Pagination::new(offset, limit, 0);
                return Json(PageEnvelope::<ExecutionDto> { content: Vec::new(), pagination }).into_response();
            }
        }
    }

    let (rows, total) = match st.store.find_paged(&filter, &sort, offset, limit).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "find_paged failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        }
    };

    let mut content = Vec::with_capacity(rows.len());
    for row in rows {
        let security = st.enricher.enrich(&row.security_id).await;
        content.push(ExecutionDto::from_row(row, security));
    }

    Json(PageEnvelope { content, pagination: Pagination::new(offset, limit, total) }).into_response()
}

// ---------------------------------------------------------------------------
// GET /api/v1/execution/{id}
// ---------------------------------------------------------------------------

pub(crate) async fn get_execution(State(st): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match st.store.find_by_id(id).await {
        Ok(Some(row)) => {
            let security = st.enricher.enrich(&row.security_id).await;
            Json(ExecutionDto::from_row(row, security)).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("execution {id} not found")),
        Err(err) => {
            tracing::error!(error = %err, id, "find_by_id failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// POST /api/v1/executions
// ---------------------------------------------------------------------------

/// A single create is handled as a one-element batch so it shares C4/C5/C6
/// exactly with `POST /executions/batch` — there's no separate single-row
/// persistence path in §4.7.
pub(crate) async fn create_execution(State(st): State<Arc<AppState>>, Json(body): Json<NewExecutionRequest>) -> Response {
    let (response, http_code) = st.pipeline.submit_batch(vec![Some(body)]).await;
    let status = StatusCode::from_u16(http_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.results.into_iter().next() {
        Some(result) => match result.execution {
            Some(execution) => (status, Json(execution)).into_response(),
            None => error_response(status, result.message.unwrap_or_else(|| "execution rejected".to_string())),
        },
        None => error_response(StatusCode::INTERNAL_SERVER_ERROR, "no result produced for single create"),
    }
}

// ---------------------------------------------------------------------------
// POST /api/v1/executions/batch
// ---------------------------------------------------------------------------

pub(crate) async fn create_batch(
    State(st): State<Arc<AppState>>,
    Json(body): Json<Vec<Option<NewExecutionRequest>>>,
) -> Response {
    let (response, http_code) = st.pipeline.submit_batch(body).await;
    let status = StatusCode::from_u16(http_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response)).into_response()
}

// ---------------------------------------------------------------------------
// PUT /api/v1/execution/{id}
// ---------------------------------------------------------------------------

pub(crate) async fn update_fill(
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<FillUpdateRequest>,
) -> Response {
    match st.pipeline.apply_fill(id, body).await {
        Ok(dto) => Json(dto).into_response(),
        Err(execbridge_pipeline::FillError::NotFound) => error_response(StatusCode::NOT_FOUND, format!("execution {id} not found")),
        Err(execbridge_pipeline::FillError::VersionConflict) => {
            error_response(StatusCode::CONFLICT, "version conflict: execution was updated since last read")
        }
        Err(execbridge_pipeline::FillError::Internal(message)) => error_response(StatusCode::INTERNAL_SERVER_ERROR, message),
    }
}
