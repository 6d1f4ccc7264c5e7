use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Task, TaskPriority, TaskStatus};
use crate::tenancy::scope;

const COLUMNS: &str = "t.*, p.organization_id,
    (SELECT COUNT(*) FROM task_comments c WHERE c.task_id = t.id) AS comment_count";

const CHAIN: &str = "JOIN projects p ON p.id = t.project_id";

#[derive(Debug)]
pub struct NewTask<'a> {
    pub project_id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_email: &'a str,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct TaskChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_email: Option<&'a str>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Tasks visible to `organization_id` (all of them when `None`), newest first.
pub async fn list(
    pool: &PgPool,
    organization_id: Option<Uuid>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
) -> Result<Vec<Task>, sqlx::Error> {
    let Some(predicate) = scope::store_predicate::<Task>() else {
        return Ok(Vec::new());
    };

    sqlx::query_as::<_, Task>(&format!(
        "SELECT {COLUMNS} FROM tasks t {CHAIN}
         WHERE ($1::uuid IS NULL OR {predicate})
           AND ($2::task_status IS NULL OR t.status = $2)
           AND ($3::task_priority IS NULL OR t.priority = $3)
         ORDER BY t.created_at DESC"
    ))
    .bind(organization_id)
    .bind(status)
    .bind(priority)
    .fetch_all(pool)
    .await
}

pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {COLUMNS} FROM tasks t {CHAIN}
         WHERE t.project_id = $1 ORDER BY t.created_at DESC"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {COLUMNS} FROM tasks t {CHAIN} WHERE t.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create(pool: &PgPool, new: &NewTask<'_>) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "WITH t AS (
            INSERT INTO tasks (project_id, title, description, status, priority, assignee_email, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *
         )
         SELECT {COLUMNS} FROM t {CHAIN}"
    ))
    .bind(new.project_id)
    .bind(new.title)
    .bind(new.description)
    .bind(new.status)
    .bind(new.priority)
    .bind(new.assignee_email)
    .bind(new.due_date)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, id: Uuid, changes: &TaskChanges<'_>) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "WITH t AS (
            UPDATE tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                assignee_email = COALESCE($6, assignee_email),
                due_date = COALESCE($7, due_date),
                updated_at = now()
            WHERE id = $1 RETURNING *
         )
         SELECT {COLUMNS} FROM t {CHAIN}"
    ))
    .bind(id)
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.status)
    .bind(changes.priority)
    .bind(changes.assignee_email)
    .bind(changes.due_date)
    .fetch_one(pool)
    .await
}
