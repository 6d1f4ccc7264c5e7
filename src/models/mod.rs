pub mod comment;
pub mod organization;
pub mod project;
pub mod task;

pub use comment::Comment;
pub use organization::Organization;
pub use project::{Project, ProjectStats, ProjectStatus, ProjectView};
pub use task::{Task, TaskPriority, TaskStatus, TaskView};

/// Error text for a value outside an enumerated field's choices.
pub(crate) fn invalid_choice(field: &str, value: &str, choices: &[&str]) -> String {
    format!(
        "Invalid {field} '{value}'. Expected one of: {}",
        choices.join(", ")
    )
}
