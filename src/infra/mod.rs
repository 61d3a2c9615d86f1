pub mod clock;
pub mod jira;
