//! Shared fixtures for tests that talk to a mock Jira.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

use crate::config::{AppConfig, DEFAULT_LOG_FILTER};
use crate::context::AppContext;
use crate::infra::jira::JiraSession;
use crate::services::Clock;

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn config_for(base_url: &str) -> AppConfig {
    AppConfig {
        jira_base_url: base_url.trim_end_matches('/').to_string(),
        jira_username: "dev@example.com".to_string(),
        jira_token: "secret-token".to_string(),
        assignee_account_id: "acc-123".to_string(),
        story_points_field: None,
        request_timeout: None,
        log_filter: DEFAULT_LOG_FILTER.to_string(),
    }
}

pub fn context_with(config: AppConfig, today: NaiveDate) -> AppContext {
    let session = JiraSession::new(&config).expect("test session");
    AppContext::new(config, Arc::new(session), Arc::new(FixedClock(today)))
}

pub fn context_for(base_url: &str) -> AppContext {
    context_with(config_for(base_url), default_day())
}

pub fn default_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

pub async fn mount_boards(server: &MockServer, project_key: &str, boards: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board"))
        .and(query_param("projectKeyOrId", project_key))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "values": boards })))
        .mount(server)
        .await;
}

pub async fn mount_active_sprint(server: &MockServer, project_key: &str, board_id: u64, sprint_id: u64) {
    mount_boards(
        server,
        project_key,
        json!([{ "id": board_id, "location": { "projectKey": project_key } }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("/rest/agile/1.0/board/{board_id}/sprint")))
        .and(query_param("state", "active"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "values": [{ "id": sprint_id, "state": "active" }] })),
        )
        .mount(server)
        .await;
}
