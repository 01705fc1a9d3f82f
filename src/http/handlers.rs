// src/http/handlers.rs
//
// =============================================================================
// RENDER-MANAGER: DISPATCH API HANDLERS (v 0.1)
// =============================================================================
//
// One function per route, each taking the shared state, doing its work
// under the single coordinator lock, and returning a serializable view.
// Workers trust nothing the Manager doesn't hand them in a heartbeat
// response; the Manager trusts nothing a worker reports except at face
// value (see registry.rs).

use crate::http::error::HttpError;
use crate::model::{
    FrameRange, JobDescriptor, JobHistoryRecord, LifecycleState, Resolution, SystemInfo,
    WorkerStatus,
};
use crate::observability::{AlertLevel, JobProgress};
use crate::registry::HeartbeatInput;
use crate::scanner;
use crate::state::SharedState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Deserialize)]
pub struct HeartbeatRequest {
    pub name: String,
    pub status: WorkerStatus,
    #[serde(default)]
    pub job_id: Option<u64>,
    #[serde(default = "default_ip")]
    pub ip: String,
    #[serde(default)]
    pub frames_rendered: i64,
    #[serde(default)]
    pub jobs_completed: i64,
    #[serde(default)]
    pub errors: i64,
    #[serde(default)]
    pub system_info: Option<SystemInfo>,
}

fn default_ip() -> String {
    "unknown".to_string()
}

#[derive(Serialize)]
pub struct HeartbeatResponse {
    pub ok: bool,
    pub manager_state: &'static str,
    pub job_id: u64,
}

#[derive(Serialize)]
pub struct WorkerView {
    pub name: String,
    pub status: WorkerStatus,
    pub job_id: Option<u64>,
    pub ip: String,
    pub connected_at: chrono::DateTime<chrono::Utc>,
    pub frames_rendered: i64,
    pub jobs_completed: i64,
    pub errors: i64,
    pub success_rate: f64,
    pub system_info: Option<SystemInfo>,
}

impl From<&crate::model::WorkerRecord> for WorkerView {
    fn from(w: &crate::model::WorkerRecord) -> Self {
        Self {
            name: w.name.clone(),
            status: w.status,
            job_id: w.current_job_id,
            ip: w.ip.clone(),
            connected_at: w.connected_at_wall,
            frames_rendered: w.frames_rendered,
            jobs_completed: w.jobs_completed,
            errors: w.errors,
            success_rate: w.success_rate,
            system_info: w.system_info.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ActiveJobView {
    pub blend_file: Option<String>,
    pub output_path: Option<String>,
    pub total_frames: i64,
    pub completed_frames: i64,
    pub frame_range: FrameRange,
    pub resolution: Resolution,
    pub render_engine: String,
}

#[derive(Serialize)]
pub struct StatusSnapshot {
    pub manager_state: &'static str,
    pub job_id: u64,
    pub job: ActiveJobView,
    pub workers: Vec<WorkerView>,
    pub job_progress: Option<JobProgress>,
    pub performance_metrics: PerformanceMetricsView,
    pub timestamp: f64,
}

#[derive(Serialize)]
pub struct PerformanceMetricsView {
    pub total_jobs_completed: u64,
    pub total_render_time: f64,
    pub peak_workers: usize,
    pub queue_size: usize,
}

#[derive(Serialize)]
pub struct JobView {
    pub job_id: u64,
    pub blend_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_frames: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_range: Option<FrameRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_engine: Option<String>,
}

#[derive(Serialize)]
pub struct SetJobResponse {
    pub ok: bool,
    pub queued: bool,
    pub position: usize,
}

#[derive(Deserialize)]
pub struct ReportErrorRequest {
    #[serde(default)]
    pub worker: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub frame: Option<i64>,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub images: Vec<String>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct PreviewHistoryEntry {
    pub job_id: u64,
    pub blend_file: String,
    pub output_path: String,
    pub total_frames: i64,
    pub completed_frames: i64,
    pub duration: f64,
    pub datetime: chrono::DateTime<chrono::Utc>,
    pub preview_frames: Vec<String>,
}

#[derive(Serialize)]
pub struct PreviewHistoryResponse {
    pub history: Vec<PreviewHistoryEntry>,
    pub count: usize,
}

fn unix_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ============================================================================
// /heartbeat
// ============================================================================

pub async fn heartbeat(
    State(state): State<SharedState>,
    Json(req): Json<HeartbeatRequest>,
) -> Json<HeartbeatResponse> {
    let mut state = state.lock().await;
    let now = Instant::now();

    let input = HeartbeatInput {
        name: req.name.clone(),
        status: req.status,
        job_id: req.job_id,
        ip: req.ip,
        frames_rendered: req.frames_rendered,
        jobs_completed: req.jobs_completed,
        errors: req.errors,
        system_info: req.system_info,
    };

    let outcome = state.registry.observe_heartbeat(input, now);
    if outcome.newly_connected {
        state
            .observability
            .log_activity(format!("Worker connected: {}", req.name));
        state
            .observability
            .add_alert(AlertLevel::Info, format!("Worker {} connected", req.name));
    }

    Json(HeartbeatResponse {
        ok: true,
        manager_state: state.lifecycle.state().as_str(),
        job_id: state.lifecycle.reported_job_id(),
    })
}

// ============================================================================
// GET /job
// ============================================================================

pub async fn get_job(State(state): State<SharedState>) -> Json<JobView> {
    let state = state.lock().await;
    let job_id = state.lifecycle.reported_job_id();

    let view = match (state.lifecycle.state(), state.lifecycle.active_job()) {
        (LifecycleState::Working, Some(job)) => JobView {
            job_id,
            blend_file: Some(job.descriptor.blend_file.clone()),
            total_frames: Some(job.descriptor.total_frames),
            frame_range: Some(job.descriptor.frame_range.clone()),
            resolution: Some(job.descriptor.resolution.clone()),
            render_engine: Some(job.descriptor.render_engine.clone()),
        },
        _ => JobView {
            job_id,
            blend_file: None,
            total_frames: None,
            frame_range: None,
            resolution: None,
            render_engine: None,
        },
    };

    Json(view)
}

// ============================================================================
// POST /set_job
// ============================================================================

pub async fn set_job(
    State(state): State<SharedState>,
    Json(desc): Json<JobDescriptor>,
) -> Json<SetJobResponse> {
    let mut state = state.lock().await;
    let blend_file = desc.blend_file.clone();
    let position = state.queue.append(desc);

    state
        .observability
        .log_activity(format!("Job queued: {blend_file} (position {position})"));
    state
        .observability
        .add_alert(AlertLevel::Warning, format!("Job queued: {blend_file}"));

    Json(SetJobResponse {
        ok: true,
        queued: true,
        position,
    })
}

// ============================================================================
// GET / and /dashboard
// ============================================================================

pub async fn index(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if wants_html {
        return Html(crate::http::dashboard::DASHBOARD_HTML).into_response();
    }

    let mut state = state.lock().await;
    let now = Instant::now();
    let job_progress = state.lifecycle.refresh_progress(now);

    let job_view = match state.lifecycle.active_job() {
        Some(job) => ActiveJobView {
            blend_file: Some(job.descriptor.blend_file.clone()),
            output_path: Some(job.descriptor.output_path.clone()),
            total_frames: job.descriptor.total_frames,
            completed_frames: job.completed_frames,
            frame_range: job.descriptor.frame_range.clone(),
            resolution: job.descriptor.resolution.clone(),
            render_engine: job.descriptor.render_engine.clone(),
        },
        None => ActiveJobView {
            blend_file: None,
            output_path: None,
            total_frames: 0,
            completed_frames: 0,
            frame_range: FrameRange::default(),
            resolution: Resolution::default(),
            render_engine: "CYCLES".to_string(),
        },
    };

    let snapshot = StatusSnapshot {
        manager_state: state.lifecycle.state().as_str(),
        job_id: state.lifecycle.reported_job_id(),
        job: job_view,
        workers: state.registry.iter().map(WorkerView::from).collect(),
        job_progress,
        performance_metrics: PerformanceMetricsView {
            total_jobs_completed: state.observability.metrics.total_jobs_completed,
            total_render_time: state.observability.metrics.total_render_time,
            peak_workers: state.observability.metrics.peak_workers,
            queue_size: state.queue.size(),
        },
        timestamp: unix_now(),
    };

    Json(snapshot).into_response()
}

// ============================================================================
// GET /history
// ============================================================================

#[derive(Serialize)]
pub struct HistoryResponse {
    pub jobs: Vec<JobHistoryRecord>,
}

pub async fn history(State(state): State<SharedState>) -> Json<HistoryResponse> {
    let state = state.lock().await;
    Json(HistoryResponse {
        jobs: state.history.clone(),
    })
}

// ============================================================================
// GET /logs
// ============================================================================

#[derive(Serialize)]
pub struct LogsResponse {
    pub activity: Vec<crate::observability::ActivityEntry>,
    pub errors: Vec<crate::observability::ErrorEntry>,
}

pub async fn logs(State(state): State<SharedState>) -> Json<LogsResponse> {
    let state = state.lock().await;
    Json(LogsResponse {
        activity: state.observability.activity.iter().cloned().collect(),
        errors: state.observability.errors.iter().cloned().collect(),
    })
}

// ============================================================================
// GET /alerts
// ============================================================================

#[derive(Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<crate::observability::AlertEntry>,
}

pub async fn alerts(State(state): State<SharedState>) -> Json<AlertsResponse> {
    let state = state.lock().await;
    Json(AlertsResponse {
        alerts: state.observability.alerts.iter().cloned().collect(),
    })
}

// ============================================================================
// GET /queue
// ============================================================================

#[derive(Serialize)]
pub struct QueueResponse {
    pub queue: Vec<JobDescriptor>,
    pub size: usize,
}

pub async fn queue(State(state): State<SharedState>) -> Json<QueueResponse> {
    let state = state.lock().await;
    Json(QueueResponse {
        queue: state.queue.iter().cloned().collect(),
        size: state.queue.size(),
    })
}

// ============================================================================
// GET /preview and /preview/:filename
// ============================================================================

pub async fn preview_list(State(state): State<SharedState>) -> Json<PreviewResponse> {
    let state = state.lock().await;
    let images = match state
        .lifecycle
        .active_job()
        .map(|j| j.descriptor.output_path.clone())
        .and_then(|p| scanner::resolve_render_dir(&p))
    {
        Some(dir) => scanner::list_frame_files(&dir),
        None => Vec::new(),
    };

    Json(PreviewResponse {
        count: images.len(),
        images,
    })
}

pub async fn preview_file(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<Response, HttpError> {
    if filename.contains("..") || filename.contains('/') {
        return Err(HttpError::Forbidden("invalid filename".to_string()));
    }

    let state = state.lock().await;

    let mut search_dirs: Vec<std::path::PathBuf> = Vec::new();
    if let Some(dir) = state
        .lifecycle
        .active_job()
        .map(|j| j.descriptor.output_path.clone())
        .and_then(|p| scanner::resolve_render_dir(&p))
    {
        search_dirs.push(dir);
    }
    for record in &state.history {
        if let Some(dir) = scanner::resolve_render_dir(&record.output_path) {
            search_dirs.push(dir);
        }
    }
    drop(state);

    let filepath = search_dirs
        .into_iter()
        .map(|dir| dir.join(&filename))
        .find(|p| p.exists());

    let filepath = match filepath {
        Some(p) => p,
        None => return Err(HttpError::NotFound(format!("no such preview file: {filename}"))),
    };

    let bytes = std::fs::read(&filepath)
        .map_err(|e| HttpError::Internal(format!("failed to read preview file: {e}")))?;

    let content_type = mime_type_for(&filename);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

fn mime_type_for(filename: &str) -> &'static str {
    match std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("tiff") => "image/tiff",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// GET /preview_history
// ============================================================================

pub async fn preview_history(State(state): State<SharedState>) -> Json<PreviewHistoryResponse> {
    let state = state.lock().await;

    let history: Vec<PreviewHistoryEntry> = state
        .history
        .iter()
        .map(|record| {
            let preview_frames = scanner::resolve_render_dir(&record.output_path)
                .map(|dir| scanner::list_frame_files(&dir))
                .unwrap_or_default();

            PreviewHistoryEntry {
                job_id: record.job_id,
                blend_file: record.blend_file.clone(),
                output_path: record.output_path.clone(),
                total_frames: record.total_frames,
                completed_frames: record.completed_frames,
                duration: record.duration,
                datetime: record.datetime,
                preview_frames,
            }
        })
        .collect();

    Json(PreviewHistoryResponse {
        count: history.len(),
        history,
    })
}

// ============================================================================
// GET /worker_config
// ============================================================================

pub async fn worker_config(
    State(state): State<SharedState>,
) -> Json<crate::worker_config::WorkerConfig> {
    let state = state.lock().await;
    Json(crate::worker_config::load_worker_config(
        &state.config.worker_config_path,
    ))
}

// ============================================================================
// POST /report_error
// ============================================================================

pub async fn report_error(
    State(state): State<SharedState>,
    Json(req): Json<ReportErrorRequest>,
) -> Json<OkResponse> {
    let mut state = state.lock().await;
    let worker = req.worker.unwrap_or_default();
    let message = req.error.unwrap_or_default();

    state.observability.log_error(worker, message.clone());
    state
        .observability
        .add_alert(AlertLevel::Error, format!("Error: {message}"));

    Json(OkResponse { ok: true })
}

// ============================================================================
// POST /open-browser
// ============================================================================

pub async fn open_browser(State(state): State<SharedState>) -> Json<OkResponse> {
    let port = {
        let state = state.lock().await;
        state.config.bind_addr.port()
    };

    let url = format!("http://localhost:{port}/");
    if let Err(e) = webbrowser::open(&url) {
        log::warn!("Failed to open browser at {url}: {e}");
    }

    Json(OkResponse { ok: true })
}

/// Helper used by tests and the router's 404 fallback.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
