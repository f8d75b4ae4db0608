use crate::{
    app::{App, AppError},
    backup::{BackupError, RestoreSummary},
    videos::{CategoryCreate, CategoryUpdate, SearchQuery, VideoCreate, VideoUpdate},
};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    app: Arc<App>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub fn router(app: Arc<App>) -> Router {
    let shared_state = SharedState { app };

    Router::new()
        .route("/api/videos/search", post(search))
        .route("/api/videos/create", post(create))
        .route("/api/videos/update", post(update))
        .route("/api/videos/delete", post(delete))
        .route("/api/videos/move", post(move_videos))
        .route("/api/videos/favorite", post(favorite))
        .route("/api/categories", get(list_categories))
        .route("/api/categories/create", post(create_category))
        .route("/api/categories/update", post(update_category))
        .route("/api/categories/delete", post(delete_category))
        .route("/api/categories/lock", post(lock_category))
        .route("/api/categories/unlock", post(unlock_category))
        .route("/api/meta", post(meta))
        .route("/api/meta/scrape", post(meta_scrape))
        .route("/api/backup/export", get(backup_export))
        .route("/api/backup/import", post(backup_import))
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn start_app(app: Arc<App>, addr: &str) {
    let router = router(app);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    log::info!("listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn start_daemon(app: Arc<App>, addr: &str) {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async { start_app(app, addr).await });
}

// Wraps AppError so axum knows which status each failure maps to.
#[derive(Debug)]
struct HttpError(AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self.0 {
            AppError::VideoNotFound | AppError::CategoryNotFound => (
                axum::http::StatusCode::NOT_FOUND,
                json!({"error": self.0.to_string()}).to_string(),
            ),
            AppError::Backup(BackupError::Validation(_)) => (
                axum::http::StatusCode::BAD_REQUEST,
                json!({"error": self.0.to_string()}).to_string(),
            ),
            AppError::Backup(BackupError::Store(_)) => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": self.0.to_string()}).to_string(),
                )
            }
            AppError::Other(_) => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": self.0.to_string()}).to_string(),
                )
            }
        }
        .into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

async fn search(
    State(state): State<SharedState>,
    Json(query): Json<SearchQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let videos = state.app.search(query)?;
    Ok(Json(videos))
}

#[derive(Debug, Clone, Deserialize)]
struct CreateVideoRequest {
    #[serde(flatten)]
    create: VideoCreate,

    #[serde(default)]
    no_meta: bool,
}

async fn create(
    State(state): State<SharedState>,
    Json(req): Json<CreateVideoRequest>,
) -> Result<impl IntoResponse, HttpError> {
    // metadata resolution uses the blocking http client
    let app = state.app.clone();
    let video = tokio::task::spawn_blocking(move || app.create_video(req.create, req.no_meta))
        .await
        .map_err(|e| anyhow::anyhow!("create task panicked: {e}"))??;
    Ok(Json(video))
}

#[derive(Debug, Clone, Deserialize)]
struct UpdateVideoRequest {
    id: String,

    #[serde(flatten)]
    update: VideoUpdate,
}

async fn update(
    State(state): State<SharedState>,
    Json(req): Json<UpdateVideoRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let video = state.app.update_video(&req.id, req.update)?;
    Ok(Json(video))
}

#[derive(Debug, Clone, Deserialize)]
struct DeleteVideosRequest {
    ids: Vec<String>,
}

async fn delete(
    State(state): State<SharedState>,
    Json(req): Json<DeleteVideosRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let count = state.app.delete_videos(&req.ids)?;
    Ok(Json(json!({ "deleted": count })))
}

#[derive(Debug, Clone, Deserialize)]
struct MoveVideosRequest {
    ids: Vec<String>,
    category_id: Option<String>,
}

async fn move_videos(
    State(state): State<SharedState>,
    Json(req): Json<MoveVideosRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let count = state
        .app
        .move_videos(&req.ids, req.category_id.as_deref())?;
    Ok(Json(json!({ "moved": count })))
}

#[derive(Debug, Clone, Deserialize)]
struct VideoIdRequest {
    id: String,
}

async fn favorite(
    State(state): State<SharedState>,
    Json(req): Json<VideoIdRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let video = state.app.toggle_favorite(&req.id)?;
    Ok(Json(video))
}

async fn list_categories(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = state.app.list_categories()?;
    Ok(Json(categories))
}

async fn create_category(
    State(state): State<SharedState>,
    Json(create): Json<CategoryCreate>,
) -> Result<impl IntoResponse, HttpError> {
    let category = state.app.create_category(create)?;
    Ok(Json(category))
}

#[derive(Debug, Clone, Deserialize)]
struct UpdateCategoryRequest {
    id: String,

    #[serde(flatten)]
    update: CategoryUpdate,
}

async fn update_category(
    State(state): State<SharedState>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let category = state.app.update_category(&req.id, req.update)?;
    Ok(Json(category))
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryIdRequest {
    id: String,
}

async fn delete_category(
    State(state): State<SharedState>,
    Json(req): Json<CategoryIdRequest>,
) -> Result<impl IntoResponse, HttpError> {
    state.app.delete_category(&req.id)?;
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Clone, Deserialize)]
struct LockCategoryRequest {
    id: String,
    pin: String,
}

async fn lock_category(
    State(state): State<SharedState>,
    Json(req): Json<LockCategoryRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let category = state.app.lock_category(&req.id, req.pin)?;
    Ok(Json(category))
}

async fn unlock_category(
    State(state): State<SharedState>,
    Json(req): Json<CategoryIdRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let category = state.app.unlock_category(&req.id)?;
    Ok(Json(category))
}

#[derive(Debug, Clone, Deserialize)]
struct MetaRequest {
    url: String,
}

async fn meta(
    State(state): State<SharedState>,
    Json(req): Json<MetaRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let app = state.app.clone();
    let meta = tokio::task::spawn_blocking(move || app.fetch_meta(&req.url))
        .await
        .map_err(|e| anyhow::anyhow!("meta task panicked: {e}"))?;
    Ok(Json(meta))
}

async fn meta_scrape(
    State(state): State<SharedState>,
    Json(req): Json<MetaRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let app = state.app.clone();
    let meta = tokio::task::spawn_blocking(move || app.scrape_meta(&req.url))
        .await
        .map_err(|e| anyhow::anyhow!("meta task panicked: {e}"))?;
    Ok(Json(meta))
}

async fn backup_export(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, HttpError> {
    let (file_name, json) = state.app.export_backup()?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        json,
    ))
}

async fn backup_import(
    State(state): State<SharedState>,
    body: String,
) -> Result<impl IntoResponse, HttpError> {
    let summary: RestoreSummary = state.app.import_backup(&body, |_| {})?;
    Ok(Json(summary))
}
