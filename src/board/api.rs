use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::errors::BoardError;

use super::ai::{self, TextGenerator};
use super::db::DbHandle;
use super::models::TaskStatus;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub ai: Arc<dyn TextGenerator>,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────
//
// Required fields are deserialized as `Option` so the handlers can return
// the board's own validation messages instead of a serde rejection.

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct MoveTaskRequest {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub project_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub task_id: Option<i64>,
    pub question: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

/// Map `BoardError` variants to status codes and public `{message}` bodies.
/// Internal detail (ids, source errors) goes to the log only.
impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            BoardError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BoardError::ProjectNotFound { id } => {
                tracing::warn!(project_id = id, "project not found");
                (StatusCode::NOT_FOUND, "Project not found".to_string())
            }
            BoardError::TaskNotFound { id } => {
                tracing::warn!(task_id = id, "task not found");
                (StatusCode::NOT_FOUND, "Task not found".to_string())
            }
            BoardError::AiGeneration { public, source } => {
                tracing::error!(error = %source, "AI generation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, (*public).to_string())
            }
            BoardError::Database(source) => {
                tracing::error!(error = %source, "database failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error".to_string())
            }
            BoardError::Other(source) => {
                tracing::error!(error = %source, "unexpected failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error".to_string())
            }
        };
        (status, Json(serde_json::json!({"message": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{project_id}",
            put(update_project).delete(delete_project),
        )
        .route("/api/projects/{project_id}/tasks", get(list_project_tasks))
        .route("/api/tasks", post(create_task))
        .route("/api/tasks/{task_id}", put(update_task).delete(delete_task))
        .route("/api/tasks/{task_id}/move", put(move_task))
        .route("/api/ai/summarize", post(summarize_project))
        .route("/api/ai/ask", post(ask_task_question))
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Treat missing, empty, and whitespace-only strings alike: the original
/// board rejects all three for required text fields.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_status(raw: &str) -> Result<TaskStatus, BoardError> {
    TaskStatus::from_str(raw)
        .map_err(|_| BoardError::Validation("Invalid status value".to_string()))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn root() -> &'static str {
    "Project Manager AI API is running..."
}

async fn health_check() -> &'static str {
    "ok"
}

async fn list_projects(State(state): State<SharedState>) -> Result<impl IntoResponse, BoardError> {
    let projects = state
        .db
        .call(|db| db.list_projects())
        .await
        .map_err(BoardError::Database)?;
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<SharedState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, BoardError> {
    let (Some(name), Some(description)) = (non_empty(&req.name), non_empty(&req.description))
    else {
        return Err(BoardError::Validation(
            "Please provide both a name and a description.".to_string(),
        ));
    };
    let name = name.to_string();
    let description = description.to_string();
    let project = state
        .db
        .call(move |db| db.create_project(&name, &description))
        .await
        .map_err(BoardError::Database)?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn update_project(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, BoardError> {
    let name = non_empty(&req.name).map(str::to_string);
    let description = non_empty(&req.description).map(str::to_string);
    if name.is_none() && description.is_none() {
        return Err(BoardError::Validation(
            "Please provide name or description to update.".to_string(),
        ));
    }

    let project = state
        .db
        .call(move |db| db.update_project(project_id, name.as_deref(), description.as_deref()))
        .await
        .map_err(BoardError::Database)?;
    match project {
        Some(project) => Ok(Json(project)),
        None => Err(BoardError::ProjectNotFound { id: project_id }),
    }
}

async fn delete_project(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, BoardError> {
    let deleted = state
        .db
        .call(move |db| db.delete_project_with_tasks(project_id))
        .await
        .map_err(BoardError::Database)?;
    if !deleted {
        return Err(BoardError::ProjectNotFound { id: project_id });
    }
    Ok(Json(serde_json::json!({
        "message": "Project and associated tasks removed"
    })))
}

async fn list_project_tasks(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, BoardError> {
    // No existence check: an unknown project id yields an empty list.
    let tasks = state
        .db
        .call(move |db| db.list_tasks(project_id))
        .await
        .map_err(BoardError::Database)?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<SharedState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, BoardError> {
    let (Some(title), Some(project_id)) = (non_empty(&req.title), req.project_id) else {
        return Err(BoardError::Validation(
            "Title and Project ID are required".to_string(),
        ));
    };
    let status = match &req.status {
        Some(raw) => parse_status(raw)?,
        None => TaskStatus::default(),
    };
    let title = title.to_string();
    let description = req.description.unwrap_or_default();

    // The project reference is validated at creation time only.
    let task = state
        .db
        .call(move |db| {
            if db.get_project(project_id)?.is_none() {
                return Ok(None);
            }
            db.create_task(project_id, &title, &description, status)
                .map(Some)
        })
        .await
        .map_err(BoardError::Database)?;
    match task {
        Some(task) => Ok((StatusCode::CREATED, Json(task))),
        None => Err(BoardError::ProjectNotFound { id: project_id }),
    }
}

/// Status-only update — the sole operation the drag-and-drop interaction
/// invokes. Safe to retry: setting the same status twice is a no-op.
async fn move_task(
    State(state): State<SharedState>,
    Path(task_id): Path<i64>,
    Json(req): Json<MoveTaskRequest>,
) -> Result<impl IntoResponse, BoardError> {
    let Some(raw) = non_empty(&req.status) else {
        return Err(BoardError::Validation("Status is required".to_string()));
    };
    let status = parse_status(raw)?;

    let task = state
        .db
        .call(move |db| db.set_task_status(task_id, status))
        .await
        .map_err(BoardError::Database)?;
    match task {
        Some(task) => Ok(Json(task)),
        None => Err(BoardError::TaskNotFound { id: task_id }),
    }
}

async fn update_task(
    State(state): State<SharedState>,
    Path(task_id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, BoardError> {
    // Absent fields are no-ops; supplying neither still succeeds. A blank
    // title would leave the task unnamed, so it is treated as absent too.
    let title = non_empty(&req.title).map(str::to_string);
    let description = req.description;
    let task = state
        .db
        .call(move |db| db.update_task(task_id, title.as_deref(), description.as_deref()))
        .await
        .map_err(BoardError::Database)?;
    match task {
        Some(task) => Ok(Json(task)),
        None => Err(BoardError::TaskNotFound { id: task_id }),
    }
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(task_id): Path<i64>,
) -> Result<impl IntoResponse, BoardError> {
    let deleted = state
        .db
        .call(move |db| db.delete_task(task_id))
        .await
        .map_err(BoardError::Database)?;
    if !deleted {
        return Err(BoardError::TaskNotFound { id: task_id });
    }
    Ok(Json(serde_json::json!({"message": "Task removed"})))
}

// ── AI Assist handlers ────────────────────────────────────────────────

async fn summarize_project(
    State(state): State<SharedState>,
    Json(req): Json<SummarizeRequest>,
) -> Result<impl IntoResponse, BoardError> {
    // A missing project id behaves like an unknown one: zero tasks.
    let tasks = match req.project_id {
        Some(project_id) => state
            .db
            .call(move |db| db.list_tasks(project_id))
            .await
            .map_err(BoardError::Database)?,
        None => Vec::new(),
    };

    if tasks.is_empty() {
        return Ok(Json(serde_json::json!({
            "summary": "This project has no tasks to summarize."
        })));
    }

    let prompt = ai::summary_prompt(&tasks);
    let summary = state
        .ai
        .generate(&prompt)
        .await
        .map_err(|source| BoardError::AiGeneration {
            public: "Error generating summary from AI",
            source,
        })?;
    Ok(Json(serde_json::json!({"summary": summary})))
}

async fn ask_task_question(
    State(state): State<SharedState>,
    Json(req): Json<AskRequest>,
) -> Result<impl IntoResponse, BoardError> {
    let (Some(task_id), Some(question)) = (req.task_id, non_empty(&req.question)) else {
        return Err(BoardError::Validation(
            "Task ID and question are required.".to_string(),
        ));
    };
    let question = question.to_string();

    let task = state
        .db
        .call(move |db| db.get_task(task_id))
        .await
        .map_err(BoardError::Database)?
        .ok_or(BoardError::TaskNotFound { id: task_id })?;

    let prompt = ai::question_prompt(&task, &question);
    let answer = state
        .ai
        .generate(&prompt)
        .await
        .map_err(|source| BoardError::AiGeneration {
            public: "Error generating answer from AI",
            source,
        })?;
    Ok(Json(serde_json::json!({"answer": answer})))
}

// ── Tests ─────────────────────────────────────────────────────────────
