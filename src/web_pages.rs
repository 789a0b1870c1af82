use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::{
    analyzer::{self, AnalysisProfile, ContentAnalyzer, UploadedFile},
    errors::AnalysisError,
};

const PLANT_HTML: &str = include_str!("../templates/plant.html");
const ANALYZER_HTML: &str = include_str!("../templates/analyzer.html");

pub const DOWNLOAD_FILE_NAME: &str = "analysis_result.txt";

#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<dyn ContentAnalyzer>,
    // One outbound analysis at a time.
    analysis_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(analyzer: Arc<dyn ContentAnalyzer>) -> Self {
        Self {
            analyzer,
            analysis_gate: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

#[derive(Deserialize)]
pub struct DownloadRequest {
    text: String,
}

fn json_error(status: StatusCode, kind: &'static str, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            kind,
        }),
    )
        .into_response()
}

fn analysis_error(err: &AnalysisError) -> Response {
    json_error(err.status_code(), err.kind(), &err.user_message())
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(plant_page))
        .route("/analyzer", get(analyzer_page))
        .route(
            "/api/plant",
            post(handle_plant_upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/api/analyze",
            post(handle_file_upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/download", post(download_text))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn plant_page() -> Html<&'static str> {
    Html(PLANT_HTML)
}

pub async fn analyzer_page() -> Html<&'static str> {
    Html(ANALYZER_HTML)
}

pub async fn handle_plant_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    run_analysis(&state, AnalysisProfile::PlantDisease, multipart).await
}

pub async fn handle_file_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    run_analysis(&state, AnalysisProfile::Universal, multipart).await
}

pub async fn download_text(Json(request): Json<DownloadRequest>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        request.text,
    )
        .into_response()
}

async fn run_analysis(
    state: &AppState,
    profile: AnalysisProfile,
    multipart: Multipart,
) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    let _guard = state.analysis_gate.lock().await;
    match analyzer::analyze_upload(state.analyzer.as_ref(), profile, &upload).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => analysis_error(&err),
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, Response> {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let name = field.file_name().unwrap_or("").to_string();
                return match field.bytes().await {
                    Ok(data) => Ok(UploadedFile {
                        name,
                        bytes: data.to_vec(),
                    }),
                    Err(err) => Err(json_error(
                        err.status(),
                        "bad_request",
                        &format!("Failed to read uploaded file: {err}"),
                    )),
                };
            }
            Ok(None) => {
                return Err(json_error(
                    StatusCode::BAD_REQUEST,
                    "bad_request",
                    "No file was uploaded.",
                ));
            }
            Err(err) => {
                return Err(json_error(
                    err.status(),
                    "bad_request",
                    &format!("Failed to read form: {err}"),
                ));
            }
        }
    }
}
