use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::validate::{parse_choice, validate_email, validate_text};
use super::{active_owner, mutation_path, mutation_succeeded};
use crate::db;
use crate::db::tasks::{NewTask, TaskChanges};
use crate::error::{AppError, MutationError};
use crate::middleware::audit;
use crate::models::{Task, TaskPriority, TaskStatus, TaskView};
use crate::state::SharedState;
use crate::tenancy::{scope, TenantContext};

const ENTITY: &str = "task";
const MAX_TITLE_LEN: usize = 200;
const NOT_FOUND: &str = "Task not found";

#[derive(Deserialize)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_email: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_email: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

pub async fn list(
    tenant: TenantContext,
    State(state): State<SharedState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<TaskView>>, AppError> {
    let status = parse_choice::<TaskStatus>(filter.status.as_deref())?;
    let priority = parse_choice::<TaskPriority>(filter.priority.as_deref())?;

    let tasks = db::tasks::list(&state.pool, tenant.id(), status, priority).await?;
    let tasks = scope::filter(tasks, tenant.organization());
    Ok(Json(tasks.into_iter().map(TaskView::from).collect()))
}

/// Tasks of one project; an unknown project yields an empty list.
pub async fn list_by_project(
    tenant: TenantContext,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<TaskView>>, AppError> {
    let Some(project) = db::projects::find_by_id(&state.pool, project_id).await? else {
        return Ok(Json(Vec::new()));
    };
    scope::authorize(&project, tenant.organization())?;

    let tasks = db::tasks::list_by_project(&state.pool, project.id).await?;
    let tasks = scope::filter(tasks, tenant.organization());
    Ok(Json(tasks.into_iter().map(TaskView::from).collect()))
}

pub async fn get(
    tenant: TenantContext,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskView>, AppError> {
    let task = db::tasks::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    scope::authorize(&task, tenant.organization())?;
    Ok(Json(task.into()))
}

pub async fn create(
    tenant: TenantContext,
    State(state): State<SharedState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> Result<Json<Value>, MutationError> {
    let project_id = mutation_path(ENTITY, path)?;
    let task = create_task(&state, &tenant, project_id, payload)
        .await
        .map_err(|e| e.in_mutation(ENTITY))?;

    audit::log_event(task.organization_id, "task.created", ENTITY, task.id);
    mutation_succeeded(ENTITY, &TaskView::from(task))
}

async fn create_task(
    state: &SharedState,
    tenant: &TenantContext,
    project_id: Uuid,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> Result<Task, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let project = db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    scope::authorize(&project, tenant.organization())?;
    active_owner(&state.pool, project.organization_id).await?;

    validate_text("title", &req.title, MAX_TITLE_LEN)?;
    let assignee_email = req.assignee_email.unwrap_or_default();
    if !assignee_email.is_empty() {
        validate_email("assignee_email", &assignee_email)?;
    }

    let new = NewTask {
        project_id: project.id,
        title: &req.title,
        description: req.description.as_deref().unwrap_or_default(),
        status: parse_choice::<TaskStatus>(req.status.as_deref())?.unwrap_or_default(),
        priority: parse_choice::<TaskPriority>(req.priority.as_deref())?.unwrap_or_default(),
        assignee_email: &assignee_email,
        due_date: req.due_date,
    };

    db::tasks::create(&state.pool, &new)
        .await
        .map_err(|e| AppError::from_write(e, "Task already exists", "Project not found"))
}

pub async fn update(
    tenant: TenantContext,
    State(state): State<SharedState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> Result<Json<Value>, MutationError> {
    let id = mutation_path(ENTITY, path)?;
    let task = update_task(&state, &tenant, id, payload)
        .await
        .map_err(|e| e.in_mutation(ENTITY))?;

    audit::log_event(task.organization_id, "task.updated", ENTITY, task.id);
    mutation_succeeded(ENTITY, &TaskView::from(task))
}

async fn update_task(
    state: &SharedState,
    tenant: &TenantContext,
    id: Uuid,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> Result<Task, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let task = db::tasks::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    scope::authorize(&task, tenant.organization())?;
    active_owner(&state.pool, task.organization_id).await?;

    if let Some(title) = &req.title {
        validate_text("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(email) = req.assignee_email.as_deref().filter(|e| !e.is_empty()) {
        validate_email("assignee_email", email)?;
    }

    let changes = TaskChanges {
        title: req.title.as_deref(),
        description: req.description.as_deref(),
        status: parse_choice::<TaskStatus>(req.status.as_deref())?,
        priority: parse_choice::<TaskPriority>(req.priority.as_deref())?,
        assignee_email: req.assignee_email.as_deref(),
        due_date: req.due_date,
    };

    db::tasks::update(&state.pool, id, &changes)
        .await
        .map_err(|e| AppError::from_write(e, "Task already exists", NOT_FOUND))
}
