use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Organization;

const COLUMNS: &str = "o.*,
    (SELECT COUNT(*) FROM projects p WHERE p.organization_id = o.id) AS project_count,
    (SELECT COUNT(*) FROM projects p WHERE p.organization_id = o.id AND p.status = 'ACTIVE')
        AS active_project_count";

/// Whitelisted fields an update may touch. `None` leaves a field unchanged.
#[derive(Debug, Default)]
pub struct OrganizationChanges<'a> {
    pub name: Option<&'a str>,
    pub contact_email: Option<&'a str>,
    pub description: Option<&'a str>,
    pub is_active: Option<bool>,
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    slug: &str,
    contact_email: &str,
    description: &str,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "WITH o AS (
            INSERT INTO organizations (name, slug, contact_email, description)
            VALUES ($1, $2, $3, $4) RETURNING *
         )
         SELECT {COLUMNS} FROM o"
    ))
    .bind(name)
    .bind(slug)
    .bind(contact_email)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {COLUMNS} FROM organizations o WHERE o.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_active_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {COLUMNS} FROM organizations o WHERE o.id = $1 AND o.is_active"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_active_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {COLUMNS} FROM organizations o WHERE o.slug = $1 AND o.is_active"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {COLUMNS} FROM organizations o WHERE o.is_active ORDER BY o.name"
    ))
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &OrganizationChanges<'_>,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "WITH o AS (
            UPDATE organizations SET
                name = COALESCE($2, name),
                contact_email = COALESCE($3, contact_email),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active),
                updated_at = now()
            WHERE id = $1 RETURNING *
         )
         SELECT {COLUMNS} FROM o"
    ))
    .bind(id)
    .bind(changes.name)
    .bind(changes.contact_email)
    .bind(changes.description)
    .bind(changes.is_active)
    .fetch_one(pool)
    .await
}
