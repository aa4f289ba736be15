//! LiveDraw HTTP server.
//!
//! Serves shared drawings to browsers:
//!
//! - `GET /` redirects to a fresh drawing.
//! - `GET /live/{id}.html` is the page for one drawing.
//! - `GET /live/{id}.click?x&y&radius&color&session` adds a circle.
//! - `GET /live/{id}.png?session` streams the drawing as
//!   `multipart/x-mixed-replace`, one part per change.
//! - `GET /download/{id}.png?width` renders the drawing once.

pub mod config;
pub mod error;
pub mod page;
pub mod stream;

pub use config::ServerConfig;
pub use error::AppError;

use axum::{
    Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, StatusCode, Uri, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use livedraw_core::{CircleEdit, Drawing, DrawingRegistry, Frame, validate_size};
use livedraw_render::PngRenderer;
use serde::Deserialize;
use std::sync::Arc;
use stream::{MultipartFramer, live_stream};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

/// Headers carrying the viewer's viewport width, in order of preference.
const VIEWPORT_WIDTH_HEADERS: [&str; 3] =
    ["sec-viewport-width", "viewport-width", "sec-ch-viewport-width"];

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    /// All drawings, created on first access and kept for the process lifetime.
    pub registry: DrawingRegistry,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let registry = DrawingRegistry::new(Arc::new(PngRenderer::new()))
            .with_fallback_width(config.default_width);
        Self { config, registry }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/live/{file}", get(live))
        .route("/download/{file}", get(download))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ClickParams {
    x: f64,
    y: f64,
    radius: f64,
    color: String,
    #[serde(default)]
    session: String,
}

#[derive(Debug, Deserialize)]
struct StreamParams {
    #[serde(default)]
    session: String,
}

#[derive(Debug, Deserialize)]
struct DownloadParams {
    width: Option<i64>,
}

/// Split `{id}.{ext}`, accepting only ids safe to embed in URLs and HTML.
fn split_file(file: &str) -> Option<(&str, &str)> {
    let (id, ext) = file.rsplit_once('.')?;
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some((id, ext))
}

fn random_token(len: usize) -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(len);
    token
}

/// Viewport width the browser reported, if any header holds a usable one.
fn viewport_width(headers: &HeaderMap) -> Option<u32> {
    VIEWPORT_WIDTH_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?.trim().parse::<f64>().ok()?;
        if !value.is_finite() || value < 1.0 {
            return None;
        }
        let width = value.round() as u32;
        validate_size(width, width).is_ok().then_some(width)
    })
}

async fn render_frame(drawing: Arc<Drawing>, width: u32, height: u32) -> Result<Frame, AppError> {
    let frame = tokio::task::spawn_blocking(move || drawing.render(width, height))
        .await
        .map_err(|e| AppError::Internal(format!("render task failed: {}", e)))??;
    Ok(frame)
}

/// Index page: start a new drawing.
async fn index() -> Redirect {
    Redirect::to(&format!("/live/{}.html", random_token(32)))
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn live(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (id, ext) = split_file(&file).ok_or(AppError::NotFound)?;
    match ext {
        "html" => Ok(live_page(&state, id)),
        "click" => {
            let Query(params) = Query::<ClickParams>::try_from_uri(&uri)
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            click(&state, id, params).map(IntoResponse::into_response)
        }
        "png" => {
            let Query(params) = Query::<StreamParams>::try_from_uri(&uri)
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            let width = viewport_width(&headers).unwrap_or(state.config.default_width);
            watch(&state, id, params.session, width).await
        }
        _ => Err(AppError::NotFound),
    }
}

fn live_page(state: &AppState, id: &str) -> Response {
    let session_id = random_token(8);
    (
        [
            (header::CACHE_CONTROL, "no-store"),
            (HeaderName::from_static("accept-ch"), page::ACCEPT_CH),
        ],
        Html(page::live_page(id, &session_id, state.config.default_width)),
    )
        .into_response()
}

/// Add a circle clicked at pixel coordinates of the editor's own image.
fn click(state: &AppState, id: &str, params: ClickParams) -> Result<StatusCode, AppError> {
    let drawing = state.registry.get(id);
    let edit = CircleEdit::new(params.x, params.y, params.radius, params.color);
    drawing.apply_edit(&edit, &params.session)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stream the drawing at `width` x `width` until the client goes away.
async fn watch(
    state: &AppState,
    id: &str,
    session_id: String,
    width: u32,
) -> Result<Response, AppError> {
    let drawing = state.registry.get(id);

    // Register before rendering so no edit can fall between the two.
    let observer = drawing.observe(width, width, session_id.as_str());
    let first = render_frame(Arc::clone(&drawing), width, width).await?;

    let framer = MultipartFramer::new(drawing.content_type());
    let content_type = framer.content_type();
    info!(
        "Stream opened: drawing {} session {} at {}px ({} observers)",
        id,
        session_id,
        width,
        drawing.observer_count()
    );

    let body = Body::from_stream(live_stream(id.to_string(), observer, framer, first));
    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "no-store")
        .body(body)
        .map_err(|e| AppError::Internal(e.to_string()))
}

async fn download(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, AppError> {
    let (id, ext) = split_file(&file).ok_or(AppError::NotFound)?;
    if ext != "png" {
        return Err(AppError::NotFound);
    }

    let width = params.width.unwrap_or(i64::from(state.config.default_width));
    // Negative and oversized widths become 0, which the renderer rejects.
    let width = u32::try_from(width).unwrap_or(0);
    let drawing = state.registry.get(id);
    let frame = render_frame(Arc::clone(&drawing), width, width).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, drawing.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.png\"", id),
        )
        .body(Body::from(frame.image))
        .map_err(|e| AppError::Internal(e.to_string()))
}
