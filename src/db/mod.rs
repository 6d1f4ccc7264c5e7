pub mod comments;
pub mod organizations;
pub mod projects;
pub mod tasks;
