use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::validate::validate_email;
use super::{active_owner, mutation_path, mutation_succeeded};
use crate::db;
use crate::error::{AppError, MutationError};
use crate::middleware::audit;
use crate::models::Comment;
use crate::state::SharedState;
use crate::tenancy::{scope, TenantContext};

const ENTITY: &str = "comment";

#[derive(Deserialize)]
pub struct CreateComment {
    pub content: String,
    pub author_email: String,
}

pub async fn list(
    tenant: TenantContext,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let comments = db::comments::list(&state.pool, tenant.id()).await?;
    Ok(Json(scope::filter(comments, tenant.organization())))
}

pub async fn list_by_task(
    tenant: TenantContext,
    State(state): State<SharedState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let Some(task) = db::tasks::find_by_id(&state.pool, task_id).await? else {
        return Ok(Json(Vec::new()));
    };
    scope::authorize(&task, tenant.organization())?;

    let comments = db::comments::list_by_task(&state.pool, task.id).await?;
    Ok(Json(scope::filter(comments, tenant.organization())))
}

pub async fn get(
    tenant: TenantContext,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Comment>, AppError> {
    let comment = db::comments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
    scope::authorize(&comment, tenant.organization())?;
    Ok(Json(comment))
}

pub async fn create(
    tenant: TenantContext,
    State(state): State<SharedState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateComment>, JsonRejection>,
) -> Result<Json<Value>, MutationError> {
    let task_id = mutation_path(ENTITY, path)?;
    let comment = add_comment(&state, &tenant, task_id, payload)
        .await
        .map_err(|e| e.in_mutation(ENTITY))?;

    audit::log_event(comment.organization_id, "comment.created", ENTITY, comment.id);
    mutation_succeeded(ENTITY, &comment)
}

async fn add_comment(
    state: &SharedState,
    tenant: &TenantContext,
    task_id: Uuid,
    payload: Result<Json<CreateComment>, JsonRejection>,
) -> Result<Comment, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let task = db::tasks::find_by_id(&state.pool, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    scope::authorize(&task, tenant.organization())?;
    active_owner(&state.pool, task.organization_id).await?;

    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("content must not be empty".to_string()));
    }
    validate_email("author_email", &req.author_email)?;

    db::comments::create(&state.pool, task.id, &req.content, &req.author_email)
        .await
        .map_err(|e| AppError::from_write(e, "Comment already exists", "Task not found"))
}
