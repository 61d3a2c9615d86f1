use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::services::{Api, RemoteResponse, RemoteSession};

pub struct JiraSession {
    http: Client,
    base_url: String,
    auth_header: String,
    assignee_account_id: String,
}

impl JiraSession {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|err| {
            AppError::Configuration(format!("failed to build HTTP client: {err}"))
        })?;

        Ok(Self {
            http,
            base_url: config.jira_base_url.trim_end_matches('/').to_string(),
            auth_header: Self::auth_header(&config.jira_username, &config.jira_token),
            assignee_account_id: config.assignee_account_id.clone(),
        })
    }

    fn auth_header(username: &str, token: &str) -> String {
        let credentials = format!("{username}:{token}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    fn endpoint(&self, api: Api, path: &str) -> String {
        format!("{}{}/{}", self.base_url, api.prefix(), path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<RemoteResponse> {
        let response = request
            .header(AUTHORIZATION, &self.auth_header)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|err| AppError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|err| AppError::Transport(format!("failed to read response: {err}")))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        tracing::debug!(status, "Jira responded");
        Ok(RemoteResponse { status, body })
    }
}

#[async_trait]
impl RemoteSession for JiraSession {
    async fn get(
        &self,
        api: Api,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<RemoteResponse> {
        let url = self.endpoint(api, path);
        tracing::debug!(%url, "GET");
        self.send(self.http.get(url).query(query)).await
    }

    async fn post(&self, api: Api, path: &str, body: &Value) -> AppResult<RemoteResponse> {
        let url = self.endpoint(api, path);
        tracing::debug!(%url, "POST");
        self.send(self.http.post(url).json(body)).await
    }

    async fn put(&self, api: Api, path: &str, body: &Value) -> AppResult<RemoteResponse> {
        let url = self.endpoint(api, path);
        tracing::debug!(%url, "PUT");
        self.send(self.http.put(url).json(body)).await
    }

    fn default_assignee(&self) -> &str {
        &self.assignee_account_id
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }
}
