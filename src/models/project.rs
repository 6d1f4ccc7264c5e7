use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invalid_choice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    pub const CHOICES: [&'static str; 4] = ["ACTIVE", "COMPLETED", "ON_HOLD", "CANCELLED"];
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ProjectStatus::Active),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            "ON_HOLD" => Ok(ProjectStatus::OnHold),
            "CANCELLED" => Ok(ProjectStatus::Cancelled),
            other => Err(invalid_choice("status", other, &Self::CHOICES)),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub task_count: i64,
    pub completed_tasks: i64,
}

impl Project {
    /// Percentage of tasks that are done, rounded to two decimals. Zero without tasks.
    pub fn completion_rate(&self) -> f64 {
        percentage(self.completed_tasks, self.task_count)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => due < today && self.status != ProjectStatus::Completed,
            None => false,
        }
    }
}

/// Wire form of a project, with derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub completion_rate: f64,
    pub is_overdue: bool,
}

impl ProjectView {
    pub fn new(project: Project, today: NaiveDate) -> Self {
        Self {
            completion_rate: project.completion_rate(),
            is_overdue: project.is_overdue(today),
            project,
        }
    }
}

impl From<Project> for ProjectView {
    fn from(project: Project) -> Self {
        Self::new(project, Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub total_projects: i64,
    pub active_projects: i64,
    pub completed_projects: i64,
    pub overdue_projects: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub overall_completion_rate: f64,
}

impl ProjectStats {
    /// Overdue here counts only projects still in play (active or on hold).
    pub fn from_projects(projects: &[Project], today: NaiveDate) -> Self {
        let count = |status: ProjectStatus| {
            projects.iter().filter(|p| p.status == status).count() as i64
        };
        let overdue_projects = projects
            .iter()
            .filter(|p| {
                matches!(p.status, ProjectStatus::Active | ProjectStatus::OnHold)
                    && p.due_date.is_some_and(|due| due < today)
            })
            .count() as i64;
        let total_tasks: i64 = projects.iter().map(|p| p.task_count).sum();
        let completed_tasks: i64 = projects.iter().map(|p| p.completed_tasks).sum();

        Self {
            total_projects: projects.len() as i64,
            active_projects: count(ProjectStatus::Active),
            completed_projects: count(ProjectStatus::Completed),
            overdue_projects,
            total_tasks,
            completed_tasks,
            overall_completion_rate: percentage(completed_tasks, total_tasks),
        }
    }
}

fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = part as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(status: ProjectStatus, tasks: i64, done: i64, due: Option<NaiveDate>) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::now_v7(),
            organization_id: Uuid::now_v7(),
            name: "Roadmap".to_string(),
            description: String::new(),
            status,
            due_date: due,
            created_at: now,
            updated_at: now,
            task_count: tasks,
            completed_tasks: done,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn completion_rate_rounds_to_two_decimals() {
        assert_eq!(project(ProjectStatus::Active, 4, 1, None).completion_rate(), 25.0);
        assert_eq!(project(ProjectStatus::Active, 3, 1, None).completion_rate(), 33.33);
        assert_eq!(project(ProjectStatus::Active, 0, 0, None).completion_rate(), 0.0);
    }

    #[test]
    fn overdue_requires_past_due_date_and_open_status() {
        let today = date(2026, 3, 10);
        let past = Some(date(2026, 3, 9));
        assert!(project(ProjectStatus::Active, 0, 0, past).is_overdue(today));
        assert!(!project(ProjectStatus::Completed, 0, 0, past).is_overdue(today));
        assert!(!project(ProjectStatus::Active, 0, 0, Some(today)).is_overdue(today));
        assert!(!project(ProjectStatus::Active, 0, 0, None).is_overdue(today));
    }

    #[test]
    fn stats_aggregate_projects_and_tasks() {
        let today = date(2026, 3, 10);
        let past = Some(date(2026, 1, 1));
        let projects = vec![
            project(ProjectStatus::Active, 4, 1, past),
            project(ProjectStatus::OnHold, 2, 0, past),
            project(ProjectStatus::Cancelled, 0, 0, past),
            project(ProjectStatus::Completed, 2, 2, None),
        ];

        let stats = ProjectStats::from_projects(&projects, today);
        assert_eq!(stats.total_projects, 4);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.completed_projects, 1);
        assert_eq!(stats.overdue_projects, 2);
        assert_eq!(stats.total_tasks, 8);
        assert_eq!(stats.completed_tasks, 3);
        assert_eq!(stats.overall_completion_rate, 37.5);
    }

    #[test]
    fn status_parses_only_known_choices() {
        assert_eq!("ON_HOLD".parse::<ProjectStatus>(), Ok(ProjectStatus::OnHold));
        let err = "on_hold".parse::<ProjectStatus>().unwrap_err();
        assert!(err.contains("ACTIVE, COMPLETED, ON_HOLD, CANCELLED"));
    }
}
