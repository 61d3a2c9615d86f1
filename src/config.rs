use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jira_base_url: String,
    pub jira_username: String,
    pub jira_token: String,
    pub assignee_account_id: String,
    /// Custom field holding story points, e.g. `customfield_10016`.
    pub story_points_field: Option<String>,
    pub request_timeout: Option<Duration>,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &str| {
            optional(name)
                .ok_or_else(|| AppError::Configuration(format!("{name} is not set")))
        };

        let request_timeout = match optional("JIRA_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    AppError::Configuration(format!(
                        "JIRA_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            jira_base_url: required("JIRA_URL")?.trim_end_matches('/').to_string(),
            jira_username: required("JIRA_USERNAME")?,
            jira_token: required("JIRA_API_TOKEN")?,
            assignee_account_id: required("JIRA_ASSIGNEE_ACCOUNT_ID")?,
            story_points_field: optional("JIRA_STORY_POINTS_FIELD_ID"),
            request_timeout,
            log_filter: optional("TICKETEER_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}
