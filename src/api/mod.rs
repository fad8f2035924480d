//! HTTP API.
//!
//! `GET/POST /api/state` move the whole state blob, `POST /upload` stores a
//! file, and the dashboard routes serve derived views of the stored state.
//! Anything else falls through to the static front-end bundle.

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use timeline_core::filter::{parse_axis, Filters, UnknownFilterValue};
use timeline_core::models::{AppState, ProjectType, TaskStatus};
use timeline_core::store::{coerce_state_blob, StateFile};
use timeline_core::normalize_value;
use timeline_core::views::{self, Dashboard, DeadlineBucket, FocusItem};

use crate::config::ServeArgs;
use crate::upload::{UploadDir, UploadedFile, PUBLIC_PREFIX};

pub use error::ApiError;

/// Shared handler context. Holds no lock: concurrent state saves race and
/// the last write wins.
#[derive(Clone)]
pub struct AppContext {
    pub state_file: Arc<StateFile>,
    pub uploads: Arc<UploadDir>,
    pub public_dir: PathBuf,
}

impl AppContext {
    pub fn new(state_file: StateFile, uploads: UploadDir, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_file: Arc::new(state_file),
            uploads: Arc::new(uploads),
            public_dir: public_dir.into(),
        }
    }

    pub fn from_args(args: &ServeArgs) -> Self {
        Self::new(
            StateFile::new(&args.state_file),
            UploadDir::new(&args.upload_dir),
            &args.public_dir,
        )
    }

    fn load_state(&self) -> Result<AppState, ApiError> {
        let blob = self.state_file.load_or_create().map_err(ApiError::Storage)?;
        Ok(normalize_value(&blob))
    }
}

pub fn create_router(ctx: AppContext) -> Router {
    let uploads = ServeDir::new(ctx.uploads.path());
    let public = ServeDir::new(&ctx.public_dir);

    Router::new()
        .route("/api/state", get(get_state).post(save_state))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/focus", get(get_focus))
        .route("/upload", post(upload_file))
        .nest_service(PUBLIC_PREFIX, uploads)
        .fallback_service(public)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn get_state(State(ctx): State<AppContext>) -> Result<Json<Value>, ApiError> {
    let blob = ctx.state_file.load_or_create().map_err(ApiError::Storage)?;
    Ok(Json(blob))
}

async fn save_state(
    State(ctx): State<AppContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let blob = coerce_state_blob(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    ctx.state_file.save(&blob).map_err(ApiError::Storage)?;

    let count = blob["projects"].as_array().map_or(0, Vec::len);
    tracing::debug!("Saved state with {} projects", count);
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<String>,
}

impl DashboardQuery {
    pub fn into_filters(self) -> Result<Filters, ApiError> {
        Ok(Filters {
            search: self.search.unwrap_or_default(),
            project_type: parse_axis(self.project_type.as_deref(), ProjectType::from_str)
                .map_err(unknown_filter("type"))?,
            status: parse_axis(self.status.as_deref(), TaskStatus::from_str)
                .map_err(unknown_filter("status"))?,
            deadline: parse_axis(self.deadline.as_deref(), DeadlineBucket::from_str)
                .map_err(unknown_filter("deadline"))?,
        })
    }
}

fn unknown_filter(axis: &'static str) -> impl Fn(UnknownFilterValue) -> ApiError {
    move |UnknownFilterValue(value)| {
        ApiError::BadRequest(format!("Unknown {axis} filter: {value}"))
    }
}

async fn get_dashboard(
    State(ctx): State<AppContext>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, ApiError> {
    let filters = query.into_filters()?;
    let state = ctx.load_state()?;
    Ok(Json(views::dashboard(&state, &filters, views::today())))
}

async fn get_focus(State(ctx): State<AppContext>) -> Result<Json<Vec<FocusItem>>, ApiError> {
    let state = ctx.load_state()?;
    Ok(Json(views::top_focus_items(&state.projects, views::today())))
}

async fn upload_file(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadedFile>, ApiError> {
    // A request that is not multipart at all carries no file either.
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::MissingFile);
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(e.into()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let Some(original_name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string)
        else {
            continue;
        };
        let bytes = field.bytes().await.map_err(|e| ApiError::Upload(e.into()))?;
        let stored = ctx
            .uploads
            .store(&original_name, &bytes)
            .map_err(ApiError::Upload)?;
        return Ok(Json(stored));
    }

    Err(ApiError::MissingFile)
}
