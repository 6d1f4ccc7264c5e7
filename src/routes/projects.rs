use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::validate::{parse_choice, validate_text};
use super::{active_owner, mutation_path, mutation_succeeded};
use crate::db;
use crate::db::projects::{NewProject, ProjectChanges};
use crate::error::{AppError, MutationError};
use crate::middleware::audit;
use crate::models::{Project, ProjectStats, ProjectStatus, ProjectView};
use crate::state::SharedState;
use crate::tenancy::{scope, TenantContext};

const ENTITY: &str = "project";
const MAX_NAME_LEN: usize = 200;
const NAME_TAKEN: &str = "A project with this name already exists in this organization";
const NOT_FOUND: &str = "Project not found";

#[derive(Deserialize)]
pub struct ProjectFilter {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateProject {
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<NaiveDate>,
}

pub async fn list(
    tenant: TenantContext,
    State(state): State<SharedState>,
    Query(filter): Query<ProjectFilter>,
) -> Result<Json<Vec<ProjectView>>, AppError> {
    let status = parse_choice::<ProjectStatus>(filter.status.as_deref())?;

    let projects = db::projects::list(&state.pool, tenant.id(), status).await?;
    let projects = scope::filter(projects, tenant.organization());
    Ok(Json(projects.into_iter().map(ProjectView::from).collect()))
}

pub async fn stats(
    tenant: TenantContext,
    State(state): State<SharedState>,
) -> Result<Json<ProjectStats>, AppError> {
    let projects = db::projects::list(&state.pool, tenant.id(), None).await?;
    let projects = scope::filter(projects, tenant.organization());
    Ok(Json(ProjectStats::from_projects(
        &projects,
        Utc::now().date_naive(),
    )))
}

pub async fn get(
    tenant: TenantContext,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectView>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    scope::authorize(&project, tenant.organization())?;
    Ok(Json(project.into()))
}

pub async fn create(
    tenant: TenantContext,
    State(state): State<SharedState>,
    payload: Result<Json<CreateProject>, JsonRejection>,
) -> Result<Json<Value>, MutationError> {
    let project = create_project(&state, &tenant, payload)
        .await
        .map_err(|e| e.in_mutation(ENTITY))?;

    audit::log_event(project.organization_id, "project.created", ENTITY, project.id);
    mutation_succeeded(ENTITY, &ProjectView::from(project))
}

async fn create_project(
    state: &SharedState,
    tenant: &TenantContext,
    payload: Result<Json<CreateProject>, JsonRejection>,
) -> Result<Project, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let organization_id = req
        .organization_id
        .or_else(|| tenant.id())
        .ok_or_else(|| AppError::BadRequest("organization_id is required".to_string()))?;
    scope::authorize_organization(organization_id, tenant.organization())?;

    let organization = db::organizations::find_by_id(&state.pool, organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    scope::require_active(Some(&organization))?;

    validate_text("name", &req.name, MAX_NAME_LEN)?;
    let status = parse_choice::<ProjectStatus>(req.status.as_deref())?.unwrap_or_default();

    let new = NewProject {
        organization_id,
        name: &req.name,
        description: req.description.as_deref().unwrap_or_default(),
        status,
        due_date: req.due_date,
    };

    db::projects::create(&state.pool, &new)
        .await
        .map_err(|e| AppError::from_write(e, NAME_TAKEN, "Organization not found"))
}

pub async fn update(
    tenant: TenantContext,
    State(state): State<SharedState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateProject>, JsonRejection>,
) -> Result<Json<Value>, MutationError> {
    let id = mutation_path(ENTITY, path)?;
    let project = update_project(&state, &tenant, id, payload)
        .await
        .map_err(|e| e.in_mutation(ENTITY))?;

    audit::log_event(project.organization_id, "project.updated", ENTITY, project.id);
    mutation_succeeded(ENTITY, &ProjectView::from(project))
}

async fn update_project(
    state: &SharedState,
    tenant: &TenantContext,
    id: Uuid,
    payload: Result<Json<UpdateProject>, JsonRejection>,
) -> Result<Project, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    scope::authorize(&project, tenant.organization())?;
    active_owner(&state.pool, project.organization_id).await?;

    if let Some(name) = &req.name {
        validate_text("name", name, MAX_NAME_LEN)?;
    }

    let changes = ProjectChanges {
        name: req.name.as_deref(),
        description: req.description.as_deref(),
        status: parse_choice::<ProjectStatus>(req.status.as_deref())?,
        due_date: req.due_date,
    };

    db::projects::update(&state.pool, id, &changes)
        .await
        .map_err(|e| AppError::from_write(e, NAME_TAKEN, NOT_FOUND))
}
