use serde::Serialize;

use crate::error::{AppError, AppResult};

const SUMMARY_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 2000;
const STORY_POINTS_MAX: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    Story,
    Bug,
    Task,
    SubTask,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Story => "Story",
            IssueType::Bug => "Bug",
            IssueType::Task => "Task",
            IssueType::SubTask => "Sub-task",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "story" => Some(IssueType::Story),
            "bug" => Some(IssueType::Bug),
            "task" => Some(IssueType::Task),
            "sub-task" | "subtask" => Some(IssueType::SubTask),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        Self::from_str(value).ok_or_else(|| {
            AppError::Validation(format!(
                "priority must be 'High', 'Medium', or 'Low', got '{value}'"
            ))
        })
    }
}

/// Story points accepted by the board, 1 through 13.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryPoints(u8);

impl StoryPoints {
    pub fn new(value: i64) -> AppResult<Self> {
        u8::try_from(value)
            .ok()
            .filter(|points| (1..=STORY_POINTS_MAX).contains(points))
            .map(Self)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "story points must be between 1 and {STORY_POINTS_MAX}, got {value}"
                ))
            })
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub project: String,
    pub issue_type: IssueType,
    pub summary: String,
    pub description: String,
    pub priority: Priority,
    pub story_points: Option<StoryPoints>,
    pub parent_key: Option<String>,
}

impl TicketDraft {
    pub fn new(
        project: &str,
        issue_type: &str,
        summary: &str,
        description: &str,
        priority: &str,
    ) -> AppResult<Self> {
        let project = project.trim();
        if project.is_empty() {
            return Err(AppError::Validation(
                "project key must not be empty".to_string(),
            ));
        }
        let issue_type = IssueType::from_str(issue_type).ok_or_else(|| {
            AppError::Validation(format!(
                "issue type must be one of 'Story', 'Bug', 'Task', or 'Sub-task', got '{issue_type}'"
            ))
        })?;

        Ok(Self {
            project: project.to_string(),
            issue_type,
            summary: validate_summary(summary)?,
            description: validate_description(description)?,
            priority: Priority::parse(priority)?,
            story_points: None,
            parent_key: None,
        })
    }

    pub fn with_story_points(mut self, points: Option<i64>) -> AppResult<Self> {
        self.story_points = points.map(StoryPoints::new).transpose()?;
        Ok(self)
    }

    pub fn with_parent(mut self, parent_key: Option<&str>) -> Self {
        self.parent_key = parent_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub key: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
    pub story_points: Option<StoryPoints>,
    pub status: Option<String>,
}

impl TicketPatch {
    pub fn new(key: &str) -> AppResult<Self> {
        Ok(Self {
            key: issue_key(key)?,
            ..Self::default()
        })
    }

    pub fn summary(mut self, summary: Option<&str>) -> AppResult<Self> {
        self.summary = summary.map(validate_summary).transpose()?;
        Ok(self)
    }

    pub fn description(mut self, description: Option<&str>) -> AppResult<Self> {
        self.description = description.map(validate_description).transpose()?;
        Ok(self)
    }

    pub fn priority(mut self, priority: Option<&str>) -> AppResult<Self> {
        self.priority = priority.map(Priority::parse).transpose()?;
        Ok(self)
    }

    pub fn assignee(mut self, assignee: Option<&str>) -> Self {
        self.assignee = non_blank(assignee);
        self
    }

    pub fn story_points(mut self, points: Option<i64>) -> AppResult<Self> {
        self.story_points = points.map(StoryPoints::new).transpose()?;
        Ok(self)
    }

    pub fn status(mut self, status: Option<&str>) -> Self {
        self.status = non_blank(status);
        self
    }

    pub fn has_field_changes(&self) -> bool {
        self.summary.is_some()
            || self.description.is_some()
            || self.priority.is_some()
            || self.assignee.is_some()
            || self.story_points.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_field_changes() && self.status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub key: String,
    pub url: String,
}

/// One row of a sprint listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintTicket {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee: String,
    pub time_tracking: String,
}

/// Checks that `key` looks like `PROJ-123` before it is placed in a request path.
pub fn issue_key(key: &str) -> AppResult<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::Validation(
            "ticket key must not be empty".to_string(),
        ));
    }

    let well_formed = key.split_once('-').is_some_and(|(project, number)| {
        let mut project = project.chars();
        project.next().is_some_and(|first| first.is_ascii_alphabetic())
            && project.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !number.is_empty()
            && number.chars().all(|c| c.is_ascii_digit())
    });
    if !well_formed {
        return Err(AppError::Validation(format!(
            "ticket key must look like PROJ-123, got '{key}'"
        )));
    }
    Ok(key.to_string())
}

fn validate_summary(summary: &str) -> AppResult<String> {
    let summary = summary.trim();
    let chars = summary.chars().count();
    if chars == 0 || chars > SUMMARY_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "summary must be 1 to {SUMMARY_MAX_CHARS} characters, got {chars}"
        )));
    }
    Ok(summary.to_string())
}

fn validate_description(description: &str) -> AppResult<String> {
    let chars = description.chars().count();
    if chars > DESCRIPTION_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "description must be at most {DESCRIPTION_MAX_CHARS} characters, got {chars}"
        )));
    }
    Ok(description.to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
