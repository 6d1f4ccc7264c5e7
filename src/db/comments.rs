use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Comment;
use crate::tenancy::scope;

const COLUMNS: &str = "c.*, t.project_id, p.organization_id";

const CHAIN: &str = "JOIN tasks t ON t.id = c.task_id JOIN projects p ON p.id = t.project_id";

/// Comments visible to `organization_id` (all of them when `None`), newest first.
pub async fn list(pool: &PgPool, organization_id: Option<Uuid>) -> Result<Vec<Comment>, sqlx::Error> {
    let Some(predicate) = scope::store_predicate::<Comment>() else {
        return Ok(Vec::new());
    };

    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COLUMNS} FROM task_comments c {CHAIN}
         WHERE ($1::uuid IS NULL OR {predicate})
         ORDER BY c.created_at DESC"
    ))
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

/// Comments on a task, oldest first.
pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COLUMNS} FROM task_comments c {CHAIN}
         WHERE c.task_id = $1 ORDER BY c.created_at"
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COLUMNS} FROM task_comments c {CHAIN} WHERE c.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    task_id: Uuid,
    content: &str,
    author_email: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "WITH c AS (
            INSERT INTO task_comments (task_id, content, author_email)
            VALUES ($1, $2, $3) RETURNING *
         )
         SELECT {COLUMNS} FROM c {CHAIN}"
    ))
    .bind(task_id)
    .bind(content)
    .bind(author_email)
    .fetch_one(pool)
    .await
}
