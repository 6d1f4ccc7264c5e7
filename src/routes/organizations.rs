use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::validate::{slugify, validate_email, validate_slug, validate_text};
use super::{mutation_path, mutation_succeeded};
use crate::db;
use crate::db::organizations::OrganizationChanges;
use crate::error::{AppError, MutationError};
use crate::middleware::audit;
use crate::models::{Organization, ProjectStats, ProjectView};
use crate::state::SharedState;
use crate::tenancy::{scope, TenantContext};

const ENTITY: &str = "organization";
const MAX_NAME_LEN: usize = 100;
const SLUG_TAKEN: &str = "An organization with this slug already exists";
const NOT_FOUND: &str = "Organization not found";

#[derive(Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub contact_email: String,
    pub description: Option<String>,
    pub slug: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<Organization>>, AppError> {
    let organizations = db::organizations::list_active(&state.pool).await?;
    Ok(Json(organizations))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Organization>, AppError> {
    let organization = db::organizations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    Ok(Json(organization))
}

pub async fn get_by_slug(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<Organization>, AppError> {
    let organization = db::organizations::find_active_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    Ok(Json(organization))
}

pub async fn create(
    State(state): State<SharedState>,
    payload: Result<Json<CreateOrganization>, JsonRejection>,
) -> Result<Json<Value>, MutationError> {
    let organization = create_organization(&state, payload)
        .await
        .map_err(|e| e.in_mutation(ENTITY))?;

    audit::log_event(
        organization.id,
        "organization.created",
        ENTITY,
        organization.id,
    );
    mutation_succeeded(ENTITY, &organization)
}

async fn create_organization(
    state: &SharedState,
    payload: Result<Json<CreateOrganization>, JsonRejection>,
) -> Result<Organization, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    validate_text("name", &req.name, MAX_NAME_LEN)?;
    validate_email("contact_email", &req.contact_email)?;

    let slug = match req.slug.filter(|s| !s.is_empty()) {
        Some(slug) => slug,
        None => slugify(&req.name),
    };
    validate_slug(&slug)?;

    db::organizations::create(
        &state.pool,
        &req.name,
        &slug,
        &req.contact_email,
        req.description.as_deref().unwrap_or_default(),
    )
    .await
    .map_err(|e| AppError::from_write(e, SLUG_TAKEN, NOT_FOUND))
}

pub async fn update(
    tenant: TenantContext,
    State(state): State<SharedState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateOrganization>, JsonRejection>,
) -> Result<Json<Value>, MutationError> {
    let id = mutation_path(ENTITY, path)?;
    let organization = update_organization(&state, &tenant, id, payload)
        .await
        .map_err(|e| e.in_mutation(ENTITY))?;

    audit::log_event(
        organization.id,
        "organization.updated",
        ENTITY,
        organization.id,
    );
    mutation_succeeded(ENTITY, &organization)
}

async fn update_organization(
    state: &SharedState,
    tenant: &TenantContext,
    id: Uuid,
    payload: Result<Json<UpdateOrganization>, JsonRejection>,
) -> Result<Organization, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    scope::authorize_organization(id, tenant.organization())?;

    if let Some(name) = &req.name {
        validate_text("name", name, MAX_NAME_LEN)?;
    }
    if let Some(email) = &req.contact_email {
        validate_email("contact_email", email)?;
    }

    let changes = OrganizationChanges {
        name: req.name.as_deref(),
        contact_email: req.contact_email.as_deref(),
        description: req.description.as_deref(),
        is_active: req.is_active,
    };

    db::organizations::update(&state.pool, id, &changes)
        .await
        .map_err(|e| AppError::from_write(e, SLUG_TAKEN, NOT_FOUND))
}

/// Projects of one organization. The caller's tenant, if any, must match.
pub async fn list_projects(
    tenant: TenantContext,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectView>>, AppError> {
    if db::organizations::find_by_id(&state.pool, id).await?.is_none() {
        return Ok(Json(Vec::new()));
    }
    scope::authorize_organization(id, tenant.organization())?;

    let projects = db::projects::list(&state.pool, Some(id), None).await?;
    let projects = scope::filter(projects, tenant.organization());
    Ok(Json(projects.into_iter().map(ProjectView::from).collect()))
}

pub async fn stats(
    tenant: TenantContext,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectStats>, AppError> {
    db::organizations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    scope::authorize_organization(id, tenant.organization())?;

    let projects = db::projects::list(&state.pool, Some(id), None).await?;
    let projects = scope::filter(projects, tenant.organization());
    Ok(Json(ProjectStats::from_projects(
        &projects,
        Utc::now().date_naive(),
    )))
}
