use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// The two Jira sub-APIs the agent talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    /// Classic issue API, `/rest/api/3`.
    Platform,
    /// Board and sprint API, `/rest/agile/1.0`.
    Agile,
}

impl Api {
    pub fn prefix(&self) -> &'static str {
        match self {
            Api::Platform => "/rest/api/3",
            Api::Agile => "/rest/agile/1.0",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Value,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fails with the status and body unless the response is a 2xx.
    pub fn require_success(self) -> AppResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Fails unless the response carries exactly `expected`.
    pub fn require_status(self, expected: u16) -> AppResult<Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    pub fn parse<T: DeserializeOwned>(self) -> AppResult<T> {
        serde_json::from_value(self.body).map_err(|err| AppError::Decode(err.to_string()))
    }

    fn into_error(self) -> AppError {
        let body = match self.body {
            Value::Null => "<empty response>".to_string(),
            Value::String(text) => text,
            other => other.to_string(),
        };
        AppError::Remote {
            status: self.status,
            body,
        }
    }
}

/// Authenticated access to Jira. Implementations attach credentials and
/// fixed headers to every call and perform no retries or caching.
///
/// Non-2xx statuses come back as a [`RemoteResponse`]; only transport
/// faults are returned as errors.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    async fn get(&self, api: Api, path: &str, query: &[(&str, String)])
    -> AppResult<RemoteResponse>;
    async fn post(&self, api: Api, path: &str, body: &Value) -> AppResult<RemoteResponse>;
    async fn put(&self, api: Api, path: &str, body: &Value) -> AppResult<RemoteResponse>;

    /// Default assignee for new tickets and "my tickets" queries.
    fn default_assignee(&self) -> &str;

    fn browse_url(&self, key: &str) -> String;
}
