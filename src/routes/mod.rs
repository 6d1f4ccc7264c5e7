pub mod comments;
pub mod organizations;
pub mod projects;
pub mod tasks;
pub mod validate;

use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, MutationError};
use crate::models::Organization;
use crate::state::SharedState;
use crate::tenancy::scope;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Organizations (tenant management, exempt from the tenant gate)
        .route(
            "/api/organizations",
            get(organizations::list).post(organizations::create),
        )
        .route(
            "/api/organizations/by-slug/{slug}",
            get(organizations::get_by_slug),
        )
        .route(
            "/api/organizations/{id}",
            get(organizations::get).put(organizations::update),
        )
        .route(
            "/api/organizations/{id}/projects",
            get(organizations::list_projects),
        )
        .route("/api/organizations/{id}/stats", get(organizations::stats))
        // Projects
        .route("/api/projects", get(projects::list).post(projects::create))
        .route("/api/projects/stats", get(projects::stats))
        .route(
            "/api/projects/{id}",
            get(projects::get).put(projects::update),
        )
        // Tasks
        .route(
            "/api/projects/{id}/tasks",
            get(tasks::list_by_project).post(tasks::create),
        )
        .route("/api/tasks", get(tasks::list))
        .route("/api/tasks/{id}", get(tasks::get).put(tasks::update))
        // Comments
        .route(
            "/api/tasks/{id}/comments",
            get(comments::list_by_task).post(comments::create),
        )
        .route("/api/comments", get(comments::list))
        .route("/api/comments/{id}", get(comments::get))
}

/// Body of a successful mutation: `{ <entity>: ..., success: true, errors: [] }`.
pub(crate) fn mutation_succeeded<T: Serialize>(
    entity: &'static str,
    value: &T,
) -> Result<Json<Value>, MutationError> {
    let value = serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize {entity}: {e}")).in_mutation(entity))?;

    let mut body = Map::new();
    body.insert(entity.to_string(), value);
    body.insert("success".to_string(), Value::Bool(true));
    body.insert("errors".to_string(), Value::Array(Vec::new()));
    Ok(Json(Value::Object(body)))
}

/// Path id of a mutation; a malformed id is reported in the mutation body.
pub(crate) fn mutation_path<T>(
    entity: &'static str,
    path: Result<Path<T>, PathRejection>,
) -> Result<T, MutationError> {
    path.map(|Path(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()).in_mutation(entity))
}

/// The organization owning an entity, which must still be active before the
/// entity or its children change.
pub(crate) async fn active_owner(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Organization, AppError> {
    let organization = db::organizations::find_by_id(pool, organization_id).await?;
    scope::require_active(organization.as_ref()).cloned()
}
