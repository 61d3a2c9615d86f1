use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::AppContext;
use crate::domain::document::Document;
use crate::domain::ticket::issue_key;
use crate::domain::worklog::{DailyTimeSummary, WorklogEntry};
use crate::error::{AppError, AppResult};
use crate::services::Api;

const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";
const SEARCH_PAGE_SIZE: u32 = 100;
const MIN_WORKLOG_SECONDS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedWork {
    pub key: String,
    pub seconds: u64,
}

pub async fn log_work(
    ctx: &AppContext,
    key: &str,
    seconds: u64,
    comment: Option<&str>,
) -> AppResult<LoggedWork> {
    let key = issue_key(key)?;
    if seconds < MIN_WORKLOG_SECONDS {
        return Err(AppError::Validation(format!(
            "time spent must be at least {MIN_WORKLOG_SECONDS} seconds, got {seconds}"
        )));
    }

    let request = WorklogRequest {
        time_spent_seconds: seconds,
        comment: comment
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(Document::paragraph),
    };
    let body = serde_json::to_value(&request).map_err(|err| AppError::Decode(err.to_string()))?;

    ctx.session
        .post(Api::Platform, &format!("issue/{key}/worklog"), &body)
        .await?
        .require_status(201)?;
    tracing::info!(%key, seconds, "work logged");

    Ok(LoggedWork { key, seconds })
}

/// Collects the current user's worklog entries started on `date`,
/// defaulting to today. Issue worklogs list every author, so entries are
/// kept only when they belong to the account behind the session.
pub async fn daily_time_summary(
    ctx: &AppContext,
    date: Option<NaiveDate>,
) -> AppResult<DailyTimeSummary> {
    let date = date.unwrap_or_else(|| ctx.clock.today());
    let session = ctx.session.as_ref();

    let search = SearchRequest {
        jql: format!("worklogAuthor = currentUser() AND worklogDate = \"{date}\""),
        fields: &["summary"],
        max_results: SEARCH_PAGE_SIZE,
    };
    let body = serde_json::to_value(&search).map_err(|err| AppError::Decode(err.to_string()))?;
    let found: SearchResponse = session
        .post(Api::Platform, "search", &body)
        .await?
        .require_success()?
        .parse()?;

    let mut entries = Vec::new();
    if found.issues.is_empty() {
        return Ok(DailyTimeSummary::new(date, entries));
    }
    let me: Account = session
        .get(Api::Platform, "myself", &[])
        .await?
        .require_success()?
        .parse()?;

    for issue in found.issues {
        let worklogs: WorklogPage = session
            .get(Api::Platform, &format!("issue/{}/worklog", issue.key), &[])
            .await?
            .require_success()?
            .parse()?;

        for worklog in worklogs.worklogs {
            if worklog.author.as_ref().map(|author| author.account_id.as_str())
                != Some(me.account_id.as_str())
            {
                continue;
            }
            let Ok(started) = DateTime::parse_from_str(&worklog.started, STARTED_FORMAT) else {
                tracing::warn!(key = %issue.key, started = %worklog.started, "unparseable worklog start");
                continue;
            };
            if started.date_naive() != date {
                continue;
            }
            entries.push(WorklogEntry {
                issue_key: issue.key.clone(),
                summary: issue.fields.summary.clone(),
                started: worklog.started,
                time_spent_seconds: worklog.time_spent_seconds,
                comment: worklog.comment.as_ref().map(plain_text).filter(|text| !text.is_empty()),
            });
        }
    }

    Ok(DailyTimeSummary::new(date, entries))
}

/// Flattens a rich-text document into its text, one line per block.
fn plain_text(doc: &Value) -> String {
    fn collect(node: &Value, out: &mut String) {
        if let Some(text) = node.get("text").and_then(Value::as_str) {
            out.push_str(text);
        }
        if let Some(children) = node.get("content").and_then(Value::as_array) {
            for child in children {
                collect(child, out);
                if child.get("content").is_some() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }

    if let Some(text) = doc.as_str() {
        return text.to_string();
    }
    let mut out = String::new();
    collect(doc, &mut out);
    out.trim_end().to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorklogRequest {
    time_spent_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<Document>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    jql: String,
    fields: &'a [&'a str],
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<FoundIssue>,
}

#[derive(Deserialize)]
struct FoundIssue {
    key: String,
    #[serde(default)]
    fields: FoundFields,
}

#[derive(Deserialize, Default)]
struct FoundFields {
    #[serde(default)]
    summary: String,
}

#[derive(Deserialize)]
struct WorklogPage {
    #[serde(default)]
    worklogs: Vec<Worklog>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Worklog {
    author: Option<Account>,
    started: String,
    time_spent_seconds: u64,
    comment: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    account_id: String,
}
