use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::{
    AnalyzeRequest, DetectRequest, DetectResponse, DraftRequest, DraftResponse, ErrorResponse,
    HistoryItemResponse, LookupQuery, RestoreResponse, SelectionResponse, TimelineResponse,
    ToggleResponse, TranslateRequest,
};
use super::state::ServerState;
use crate::analysis::AnalysisResult;
use crate::catalog::{Book, Catalog, CatalogFilter, group_by_period, timeline_stats};
use crate::clock::SystemClock;
use crate::history::{HistoryEntry, StateStore, export_file_name};
use crate::languages::{AUTO, LanguageEntry};
use crate::session::{AnalysisError, AnalysisSession};
use crate::settings::Settings;
use crate::translation::{DEFAULT_TARGET, TranslationReport};

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn run_server(
    settings: Settings,
    catalog: Arc<Catalog>,
    store: StateStore,
    addr: String,
) -> Result<()> {
    let state = Arc::new(ServerState::new(
        &settings,
        catalog,
        store,
        Arc::new(SystemClock),
    )?);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address {}", addr))?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/books", get(books))
        .route("/books/lookup", get(lookup_books))
        .route("/timeline", get(timeline))
        .route("/languages", get(languages))
        .route("/selection", get(selection).delete(clear_selection))
        .route("/selection/:id", post(toggle_selection))
        .route("/analyze", post(analyze))
        .route("/detect", post(detect))
        .route("/translate", post(translate))
        .route("/history", get(list_history).delete(clear_history))
        .route("/history/export", get(export_history))
        .route("/history/:id", get(history_item).delete(delete_history_item))
        .route("/history/:id/restore", post(restore_history_item))
        .route("/draft", get(get_draft).put(put_draft).delete(delete_draft))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal_error(err: anyhow::Error) -> ApiError {
    warn!("request failed: {:#}", err);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
}

fn analysis_error(err: AnalysisError) -> ApiError {
    let status = match err {
        AnalysisError::UnknownBook(_) => StatusCode::NOT_FOUND,
        AnalysisError::EmptyText | AnalysisError::NoBooksSelected => StatusCode::BAD_REQUEST,
    };
    api_error(status, err.to_string())
}

fn history_not_found(id: u64) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        format!("history entry {} not found", id),
    )
}

fn persist_history(state: &ServerState, session: &AnalysisSession) -> Result<(), ApiError> {
    state
        .store
        .save_history(session.history())
        .map_err(internal_error)
}

async fn books(
    State(state): State<Arc<ServerState>>,
    Query(filter): Query<CatalogFilter>,
) -> Json<Vec<Book>> {
    Json(state.catalog.filter(&filter).into_iter().cloned().collect())
}

async fn lookup_books(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<LookupQuery>,
) -> Json<Vec<Book>> {
    Json(
        state
            .catalog
            .search_titles(&query.q)
            .into_iter()
            .cloned()
            .collect(),
    )
}

async fn timeline(
    State(state): State<Arc<ServerState>>,
    Query(filter): Query<CatalogFilter>,
) -> Json<TimelineResponse> {
    let books = state.catalog.filter(&filter);
    Json(TimelineResponse {
        periods: group_by_period(books.iter().copied()),
        stats: timeline_stats(books.iter().copied()),
    })
}

async fn languages(State(state): State<Arc<ServerState>>) -> Json<Vec<LanguageEntry>> {
    Json(state.languages.all_sorted())
}

async fn selection(State(state): State<Arc<ServerState>>) -> Json<SelectionResponse> {
    let session = state.session.lock().await;
    Json(SelectionResponse {
        books: session.selected_books(),
    })
}

async fn toggle_selection(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let mut session = state.session.lock().await;
    let selected = session.toggle_book(id).map_err(analysis_error)?;
    Ok(Json(ToggleResponse {
        selected,
        books: session.selected_books(),
    }))
}

async fn clear_selection(State(state): State<Arc<ServerState>>) -> StatusCode {
    state.session.lock().await.clear_selection();
    StatusCode::NO_CONTENT
}

async fn analyze(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let mut session = state.session.lock().await;
    if let Some(ids) = payload.books.as_deref() {
        session.select_books(ids).map_err(analysis_error)?;
    }
    if let Some(options) = payload.options {
        session.set_options(options);
    }
    let result = session.generate(&payload.text).map_err(analysis_error)?;
    persist_history(&state, &session)?;
    Ok(Json(result))
}

async fn detect(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<DetectRequest>,
) -> Json<DetectResponse> {
    let language = state.translator.detect_language(&payload.text).await;
    let name = state.languages.name(&language);
    Json(DetectResponse { language, name })
}

async fn translate(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<TranslateRequest>,
) -> Result<Json<TranslationReport>, ApiError> {
    let source = payload.source_lang.unwrap_or_else(|| AUTO.to_string());
    let target = payload
        .target_lang
        .unwrap_or_else(|| DEFAULT_TARGET.to_string());
    if !state.languages.is_known(&source) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("unknown language code '{}'", source),
        ));
    }
    if !state.languages.is_target(&target) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("'{}' is not a target language", target),
        ));
    }
    let report = state
        .translator
        .translate_with_report(&payload.text, &source, &target)
        .await;
    Ok(Json(report))
}

async fn list_history(State(state): State<Arc<ServerState>>) -> Json<Vec<HistoryEntry>> {
    let session = state.session.lock().await;
    Json(session.history().entries().to_vec())
}

async fn clear_history(State(state): State<Arc<ServerState>>) -> Result<StatusCode, ApiError> {
    let mut session = state.session.lock().await;
    session.history_mut().clear();
    persist_history(&state, &session)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn history_item(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> Result<Json<HistoryItemResponse>, ApiError> {
    let session = state.session.lock().await;
    let (entry, books) = session
        .view_history_item(id)
        .ok_or_else(|| history_not_found(id))?;
    Ok(Json(HistoryItemResponse {
        entry: entry.clone(),
        books,
    }))
}

async fn delete_history_item(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let mut session = state.session.lock().await;
    if !session.history_mut().delete(id) {
        return Err(history_not_found(id));
    }
    persist_history(&state, &session)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn restore_history_item(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> Result<Json<RestoreResponse>, ApiError> {
    let mut session = state.session.lock().await;
    let text = session
        .restore_selection(id)
        .ok_or_else(|| history_not_found(id))?;
    Ok(Json(RestoreResponse {
        text,
        books: session.selected_books(),
    }))
}

async fn export_history(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session.lock().await;
    let content = session
        .history()
        .export_json()
        .map_err(|err| api_error(StatusCode::NOT_FOUND, err.to_string()))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(state.clock.now())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    ))
}

async fn get_draft(State(state): State<Arc<ServerState>>) -> Result<Json<DraftResponse>, ApiError> {
    let draft = state.store.load_draft().map_err(internal_error)?;
    Ok(Json(DraftResponse { draft }))
}

async fn put_draft(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<DraftRequest>,
) -> Result<Json<DraftResponse>, ApiError> {
    state
        .store
        .save_draft(&payload.text)
        .map_err(internal_error)?;
    if let Some(ids) = payload.books.as_deref() {
        state
            .session
            .lock()
            .await
            .select_books(ids)
            .map_err(analysis_error)?;
    }
    if payload.auto_generate {
        schedule_auto_generate(&state, payload.text.clone());
    }
    Ok(Json(DraftResponse {
        draft: Some(payload.text),
    }))
}

async fn delete_draft(State(state): State<Arc<ServerState>>) -> Result<StatusCode, ApiError> {
    state.auto_generate.cancel();
    state.store.clear_draft().map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces any pending automatic analysis with one for `text`.
fn schedule_auto_generate(state: &Arc<ServerState>, text: String) {
    let task_state = state.clone();
    state.auto_generate.trigger(move || async move {
        let mut session = task_state.session.lock().await;
        match session.generate(&text) {
            Ok(result) => match task_state.store.save_history(session.history()) {
                Ok(()) => info!("auto-generated analysis at {}", result.timestamp),
                Err(err) => warn!("failed to save auto-generated analysis: {:#}", err),
            },
            Err(err) => debug!("auto-generation skipped: {}", err),
        }
    });
}
