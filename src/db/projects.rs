use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Project, ProjectStatus};
use crate::tenancy::scope;

const COLUMNS: &str = "p.*,
    (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id) AS task_count,
    (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id AND t.status = 'DONE')
        AS completed_tasks";

#[derive(Debug)]
pub struct NewProject<'a> {
    pub organization_id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub status: ProjectStatus,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default)]
pub struct ProjectChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub status: Option<ProjectStatus>,
    pub due_date: Option<NaiveDate>,
}

/// Projects visible to `organization_id` (all of them when `None`), newest first.
pub async fn list(
    pool: &PgPool,
    organization_id: Option<Uuid>,
    status: Option<ProjectStatus>,
) -> Result<Vec<Project>, sqlx::Error> {
    let Some(predicate) = scope::store_predicate::<Project>() else {
        return Ok(Vec::new());
    };

    sqlx::query_as::<_, Project>(&format!(
        "SELECT {COLUMNS} FROM projects p
         WHERE ($1::uuid IS NULL OR {predicate})
           AND ($2::project_status IS NULL OR p.status = $2)
         ORDER BY p.created_at DESC"
    ))
    .bind(organization_id)
    .bind(status)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {COLUMNS} FROM projects p WHERE p.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create(pool: &PgPool, new: &NewProject<'_>) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "WITH p AS (
            INSERT INTO projects (organization_id, name, description, status, due_date)
            VALUES ($1, $2, $3, $4, $5) RETURNING *
         )
         SELECT {COLUMNS} FROM p"
    ))
    .bind(new.organization_id)
    .bind(new.name)
    .bind(new.description)
    .bind(new.status)
    .bind(new.due_date)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &ProjectChanges<'_>,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "WITH p AS (
            UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                due_date = COALESCE($5, due_date),
                updated_at = now()
            WHERE id = $1 RETURNING *
         )
         SELECT {COLUMNS} FROM p"
    ))
    .bind(id)
    .bind(changes.name)
    .bind(changes.description)
    .bind(changes.status)
    .bind(changes.due_date)
    .fetch_one(pool)
    .await
}
