//! The operations an agent can invoke, keyed by the tool names the
//! conversational layer uses. Every operation returns an
//! [`OperationResult`]; failures never escape as errors.

use std::fmt;

use chrono::NaiveDate;
use clap::Args;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use crate::context::AppContext;
use crate::domain::ticket::{TicketDraft, TicketPatch};
use crate::domain::worklog::format_hours;
use crate::error::{AppError, AppResult};
use crate::workflow::sprint::list_sprint_tickets;
use crate::workflow::ticket::{CreateOutcome, create_ticket, update_ticket};
use crate::workflow::worklog::{daily_time_summary, log_work};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "name", content = "arguments")]
pub enum Operation {
    #[serde(rename = "createJiraTicket")]
    CreateTicket(CreateTicketArgs),
    #[serde(rename = "updateJiraTicket")]
    UpdateTicket(UpdateTicketArgs),
    #[serde(rename = "logTimeToJiraTicket")]
    LogWork(LogWorkArgs),
    #[serde(rename = "listSprintTickets")]
    ListSprintTickets(SprintTicketsArgs),
    #[serde(rename = "listUserSprintTickets")]
    ListUserSprintTickets(UserSprintTicketsArgs),
    #[serde(rename = "getDailyTimeLogSummary")]
    DailyTimeSummary(TimeSummaryArgs),
}

impl Operation {
    /// Parses `{"name": ..., "arguments": ...}`. Arguments may be an object
    /// or a JSON-encoded string, as chat completion tool calls deliver them.
    pub fn from_tool_call(raw: &str) -> AppResult<Self> {
        let call: ToolCall = serde_json::from_str(raw)
            .map_err(|err| AppError::Validation(format!("malformed tool call: {err}")))?;
        let arguments = match call.arguments {
            Value::String(encoded) => serde_json::from_str(&encoded).map_err(|err| {
                AppError::Validation(format!("malformed arguments for {}: {err}", call.name))
            })?,
            Value::Null => json!({}),
            other => other,
        };
        serde_json::from_value(json!({ "name": call.name, "arguments": arguments }))
            .map_err(|err| AppError::Validation(format!("invalid {} call: {err}", call.name)))
    }
}

#[derive(Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Clone, Args, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketArgs {
    /// Project key, e.g. BFA.
    #[arg(long)]
    pub project: String,
    /// Ticket title (1-100 characters).
    #[arg(long)]
    pub title: String,
    /// Description markup: `# heading`, `- [ ] task`, `**bold**`.
    #[arg(long, default_value = "")]
    #[serde(default)]
    pub description: String,
    /// Story, Bug, Task or Sub-task.
    #[arg(long, default_value = "Task")]
    pub issue_type: String,
    /// High, Medium or Low.
    #[arg(long, default_value = "Medium")]
    pub priority: String,
    #[arg(long)]
    #[serde(default, deserialize_with = "lenient_points")]
    pub story_points: Option<i64>,
    /// Parent issue key when creating a sub-task.
    #[arg(long)]
    #[serde(default)]
    pub parent_key: Option<String>,
}

#[derive(Debug, Clone, Args, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketArgs {
    /// Ticket key, e.g. BFA-12.
    #[arg(long = "ticket")]
    pub ticket_id: String,
    /// New title.
    #[arg(long)]
    #[serde(default, alias = "summary")]
    pub title: Option<String>,
    #[arg(long)]
    #[serde(default)]
    pub description: Option<String>,
    #[arg(long)]
    #[serde(default)]
    pub priority: Option<String>,
    /// Account id of the new assignee.
    #[arg(long)]
    #[serde(default)]
    pub assignee: Option<String>,
    #[arg(long)]
    #[serde(default, deserialize_with = "lenient_points")]
    pub story_points: Option<i64>,
    /// Destination status, matched case-insensitively.
    #[arg(long)]
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Args, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogWorkArgs {
    #[arg(long = "ticket")]
    pub ticket_id: String,
    #[arg(long = "seconds")]
    pub time_spent_seconds: u64,
    #[arg(long)]
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Args, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintTicketsArgs {
    #[arg(long = "project")]
    pub project_key: String,
}

#[derive(Debug, Clone, Args, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSprintTicketsArgs {
    #[arg(long = "project")]
    pub project_key: String,
    /// Defaults to the configured assignee.
    #[arg(long)]
    #[serde(default)]
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Default, Args, Deserialize)]
pub struct TimeSummaryArgs {
    /// Day to summarize as YYYY-MM-DD; defaults to today.
    #[arg(long)]
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Story points arrive as numbers or numeric strings depending on the caller.
fn lenient_points<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Points {
        Number(f64),
        Text(String),
    }

    let number = match Option::<Points>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Points::Number(value)) => value,
        Some(Points::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(Points::Text(text)) => text.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("story points must be a number, got '{text}'"))
        })?,
    };
    if number.fract() != 0.0 {
        return Err(serde::de::Error::custom(format!(
            "story points must be a whole number, got {number}"
        )));
    }
    Ok(Some(number as i64))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Success(String),
    Failure(String),
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            OperationResult::Success(message) | OperationResult::Failure(message) => message,
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub async fn invoke(ctx: &AppContext, operation: Operation) -> OperationResult {
    let (name, outcome) = match operation {
        Operation::CreateTicket(args) => ("createJiraTicket", create(ctx, args).await),
        Operation::UpdateTicket(args) => ("updateJiraTicket", update(ctx, args).await),
        Operation::LogWork(args) => ("logTimeToJiraTicket", log_time(ctx, args).await),
        Operation::ListSprintTickets(args) => (
            "listSprintTickets",
            sprint_tickets(ctx, &args.project_key, None).await,
        ),
        Operation::ListUserSprintTickets(args) => {
            let assignee = args
                .assignee
                .clone()
                .unwrap_or_else(|| ctx.session.default_assignee().to_string());
            (
                "listUserSprintTickets",
                sprint_tickets(ctx, &args.project_key, Some(assignee.as_str())).await,
            )
        }
        Operation::DailyTimeSummary(args) => {
            ("getDailyTimeLogSummary", time_summary(ctx, args).await)
        }
    };

    match outcome {
        Ok(message) => OperationResult::Success(message),
        Err(message) => {
            tracing::error!(operation = name, %message, "operation failed");
            OperationResult::Failure(message)
        }
    }
}

type Rendered = Result<String, String>;

async fn create(ctx: &AppContext, args: CreateTicketArgs) -> Rendered {
    let draft = TicketDraft::new(
        &args.project,
        &args.issue_type,
        &args.title,
        &args.description,
        &args.priority,
    )
    .and_then(|draft| draft.with_story_points(args.story_points))
    .map(|draft| draft.with_parent(args.parent_key.as_deref()))
    .map_err(|err| format!("Ticket was not created: {err}"))?;

    let outcome = create_ticket(ctx, draft)
        .await
        .map_err(|err| format!("Ticket was not created: {err}"))?;

    Ok(match outcome {
        CreateOutcome::Scheduled { ticket, sprint } => format!(
            "Issue {} created and assigned to sprint {sprint}: {}",
            ticket.key, ticket.url
        ),
        CreateOutcome::Unscheduled { ticket } => format!(
            "Issue {} created, but no active sprint found to assign it to: {}",
            ticket.key, ticket.url
        ),
        CreateOutcome::SchedulingFailed {
            ticket,
            sprint,
            reason,
        } => format!(
            "Issue {} created, but assigning it to sprint {sprint} failed ({reason}): {}",
            ticket.key, ticket.url
        ),
    })
}

async fn update(ctx: &AppContext, args: UpdateTicketArgs) -> Rendered {
    let key = args.ticket_id.trim().to_string();
    let not_updated = |err: AppError| format!("Ticket {key} was not updated: {err}");

    let patch = TicketPatch::new(&args.ticket_id)
        .and_then(|patch| patch.summary(args.title.as_deref()))
        .and_then(|patch| patch.description(args.description.as_deref()))
        .and_then(|patch| patch.priority(args.priority.as_deref()))
        .and_then(|patch| patch.story_points(args.story_points))
        .map(|patch| {
            patch
                .assignee(args.assignee.as_deref())
                .status(args.status.as_deref())
        })
        .map_err(not_updated)?;

    let outcome = update_ticket(ctx, patch).await.map_err(not_updated)?;
    if outcome.is_noop() {
        return Ok(format!("No changes requested for ticket {}", outcome.key));
    }

    let mut message = format!("Successfully updated ticket {}", outcome.key);
    if let Some(status) = &outcome.transitioned_to {
        message.push_str(&format!("; status is now {status}"));
    }
    Ok(message)
}

async fn log_time(ctx: &AppContext, args: LogWorkArgs) -> Rendered {
    let logged = log_work(
        ctx,
        &args.ticket_id,
        args.time_spent_seconds,
        args.comment.as_deref(),
    )
    .await
    .map_err(|err| format!("Failed to log time to {}: {err}", args.ticket_id.trim()))?;

    Ok(format!(
        "Logged {} hour(s) on {}",
        format_hours(logged.seconds),
        logged.key
    ))
}

async fn sprint_tickets(ctx: &AppContext, project_key: &str, assignee: Option<&str>) -> Rendered {
    let listed = list_sprint_tickets(ctx, project_key.trim(), assignee)
        .await
        .map_err(|err| format!("Failed to fetch sprint tickets for {project_key}: {err}"))?;

    match listed {
        None => Ok(format!("No active sprint found for project {project_key}")),
        Some(tickets) => serde_json::to_string_pretty(&tickets)
            .map_err(|err| format!("Failed to render sprint tickets: {err}")),
    }
}

async fn time_summary(ctx: &AppContext, args: TimeSummaryArgs) -> Rendered {
    let summary = daily_time_summary(ctx, args.date)
        .await
        .map_err(|err| format!("Failed to fetch time log summary: {err}"))?;
    serde_json::to_string_pretty(&summary)
        .map_err(|err| format!("Failed to render time log summary: {err}"))
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{any, method, path, query_param},
    };

    use super::*;
    use crate::testing::{context_for, mount_active_sprint, mount_boards};

    #[test]
    fn parses_tool_call_with_encoded_arguments() {
        let raw = r#"{
            "name": "updateJiraTicket",
            "arguments": "{\"ticketId\":\"BFA-3\",\"summary\":\"New\",\"storyPoints\":\"8\"}"
        }"#;
        let Operation::UpdateTicket(args) = Operation::from_tool_call(raw).unwrap() else {
            panic!("expected update");
        };
        assert_eq!(args.ticket_id, "BFA-3");
        assert_eq!(args.title.as_deref(), Some("New"));
        assert_eq!(args.story_points, Some(8));
        assert_eq!(args.status, None);
    }

    #[test]
    fn parses_create_with_defaults() {
        let raw = r#"{"name":"createJiraTicket","arguments":{
            "title":"Fix crash","project":"BFA","issueType":"Bug","priority":"High","storyPoints":3
        }}"#;
        let Operation::CreateTicket(args) = Operation::from_tool_call(raw).unwrap() else {
            panic!("expected create");
        };
        assert_eq!(args.description, "");
        assert_eq!(args.story_points, Some(3));
        assert_eq!(args.parent_key, None);
    }

    #[test]
    fn parses_summary_without_arguments() {
        let operation = Operation::from_tool_call(r#"{"name":"getDailyTimeLogSummary"}"#).unwrap();
        assert!(matches!(
            operation,
            Operation::DailyTimeSummary(TimeSummaryArgs { date: None })
        ));
    }

    #[test]
    fn rejects_unknown_tools_and_fractional_points() {
        assert!(Operation::from_tool_call(r#"{"name":"deleteEverything","arguments":{}}"#).is_err());
        let fractional = r#"{"name":"updateJiraTicket","arguments":{"ticketId":"A-1","storyPoints":2.5}}"#;
        assert!(Operation::from_tool_call(fractional).is_err());
    }

    #[tokio::test]
    async fn create_reports_key_and_sprint() {
        let server = MockServer::start().await;
        mount_active_sprint(&server, "BFA", 7, 42).await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "key": "BFA-101" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/agile/1.0/sprint/42/issue"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let operation = Operation::CreateTicket(CreateTicketArgs {
            project: "BFA".to_string(),
            title: "Checkout flow".to_string(),
            description: "- [ ] design".to_string(),
            issue_type: "Story".to_string(),
            priority: "Medium".to_string(),
            story_points: Some(3),
            parent_key: None,
        });
        let result = invoke(&ctx, operation).await;

        assert!(result.is_success());
        assert!(result.message().contains("BFA-101"));
        assert!(result.message().contains("42"));
    }

    #[tokio::test]
    async fn create_without_sprint_says_so() {
        let server = MockServer::start().await;
        mount_boards(&server, "BFA", json!([])).await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "key": "BFA-102" })))
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let raw = r#"{"name":"createJiraTicket","arguments":{
            "title":"Docs","project":"BFA","issueType":"Task","priority":"Low"
        }}"#;
        let result = invoke(&ctx, Operation::from_tool_call(raw).unwrap()).await;

        assert!(result.is_success());
        assert!(result.message().contains("BFA-102"));
        assert!(result.message().contains("no active sprint"));
    }

    #[tokio::test]
    async fn invalid_draft_fails_without_remote_calls() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let operation = Operation::CreateTicket(CreateTicketArgs {
            project: "BFA".to_string(),
            title: "Too many points".to_string(),
            description: String::new(),
            issue_type: "Story".to_string(),
            priority: "High".to_string(),
            story_points: Some(21),
            parent_key: None,
        });
        let result = invoke(&ctx, operation).await;

        assert!(!result.is_success());
        assert!(result.message().contains("story points"));
    }

    #[tokio::test]
    async fn update_with_malformed_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let operation = Operation::UpdateTicket(UpdateTicketArgs {
            ticket_id: "../../agile/1.0/sprint/42".to_string(),
            title: Some("Hijack".to_string()),
            description: None,
            priority: None,
            assignee: None,
            story_points: None,
            status: Some("Done".to_string()),
        });
        let result = invoke(&ctx, operation).await;

        assert!(!result.is_success());
        assert!(result.message().contains("must look like PROJ-123"));
    }

    #[tokio::test]
    async fn unavailable_transition_is_reported_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/BFA-7/transitions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transitions": [{ "id": "2", "to": { "name": "In Progress" } }]
            })))
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let operation = Operation::UpdateTicket(UpdateTicketArgs {
            ticket_id: "BFA-7".to_string(),
            title: None,
            description: None,
            priority: None,
            assignee: None,
            story_points: None,
            status: Some("Archived".to_string()),
        });
        let result = invoke(&ctx, operation).await;

        assert_eq!(
            result,
            OperationResult::Failure(
                "Ticket BFA-7 was not updated: Status transition to 'Archived' not available for BFA-7"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn log_work_reports_hours() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue/BFA-1/worklog"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let result = invoke(
            &ctx,
            Operation::LogWork(LogWorkArgs {
                ticket_id: "BFA-1".to_string(),
                time_spent_seconds: 3600,
                comment: None,
            }),
        )
        .await;

        assert_eq!(
            result,
            OperationResult::Success("Logged 1 hour(s) on BFA-1".to_string())
        );
    }

    #[tokio::test]
    async fn my_tickets_default_to_configured_assignee() {
        let server = MockServer::start().await;
        mount_active_sprint(&server, "BFA", 7, 42).await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/sprint/42/issue"))
            .and(query_param("jql", "assignee = \"acc-123\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "issues": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let result = invoke(
            &ctx,
            Operation::ListUserSprintTickets(UserSprintTicketsArgs {
                project_key: "BFA".to_string(),
                assignee: None,
            }),
        )
        .await;

        assert_eq!(result, OperationResult::Success("[]".to_string()));
    }

    #[tokio::test]
    async fn listing_without_sprint_is_not_a_failure() {
        let server = MockServer::start().await;
        mount_boards(&server, "BFA", json!([])).await;

        let ctx = context_for(&server.uri());
        let result = invoke(
            &ctx,
            Operation::ListSprintTickets(SprintTicketsArgs {
                project_key: "BFA".to_string(),
            }),
        )
        .await;

        assert!(result.is_success());
        assert!(result.message().contains("No active sprint"));
    }

    #[tokio::test]
    async fn summary_failure_is_contained() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let result = invoke(&ctx, Operation::DailyTimeSummary(TimeSummaryArgs::default())).await;

        assert!(!result.is_success());
        assert!(result.message().contains("401"));
    }
}
