use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::context::AppContext;
use crate::domain::document::{self, Document};
use crate::domain::sprint::Sprint;
use crate::domain::ticket::{Ticket, TicketDraft, TicketPatch};
use crate::error::{AppError, AppResult};
use crate::services::Api;
use crate::workflow::sprint::resolve_active_sprint;

/// Where a newly created ticket ended up. Creation and sprint scheduling
/// are separate remote calls, so each can be observed independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Scheduled { ticket: Ticket, sprint: Sprint },
    Unscheduled { ticket: Ticket },
    SchedulingFailed {
        ticket: Ticket,
        sprint: Sprint,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub key: String,
    pub fields_updated: bool,
    pub transitioned_to: Option<String>,
}

impl UpdateOutcome {
    pub fn is_noop(&self) -> bool {
        !self.fields_updated && self.transitioned_to.is_none()
    }
}

pub async fn create_ticket(ctx: &AppContext, draft: TicketDraft) -> AppResult<CreateOutcome> {
    let session = ctx.session.as_ref();
    let sprint = resolve_active_sprint(session, &draft.project).await;

    let mut custom = Map::new();
    if let (Some(field), Some(points)) = (&ctx.config.story_points_field, draft.story_points) {
        custom.insert(field.clone(), json!(points.value()));
    }

    let request = CreateIssueRequest {
        fields: CreateIssueFields {
            project: KeyRef { key: &draft.project },
            summary: &draft.summary,
            description: document::convert(&draft.description),
            issuetype: NameRef {
                name: draft.issue_type.as_str(),
            },
            priority: NameRef {
                name: draft.priority.as_str(),
            },
            assignee: AccountRef {
                account_id: session.default_assignee(),
            },
            parent: draft.parent_key.as_deref().map(|key| KeyRef { key }),
            custom,
        },
    };
    let body = serde_json::to_value(&request).map_err(|err| AppError::Decode(err.to_string()))?;

    let created: CreatedIssue = session
        .post(Api::Platform, "issue", &body)
        .await?
        .require_status(201)?
        .parse()?;
    let ticket = Ticket {
        url: session.browse_url(&created.key),
        key: created.key,
    };
    tracing::info!(key = %ticket.key, project = %draft.project, "issue created");

    let Some(sprint) = sprint else {
        return Ok(CreateOutcome::Unscheduled { ticket });
    };

    let assignment = json!({ "issues": [ticket.key] });
    let scheduled = session
        .post(Api::Agile, &format!("sprint/{}/issue", sprint.id), &assignment)
        .await
        .and_then(|response| response.require_success());

    match scheduled {
        Ok(_) => Ok(CreateOutcome::Scheduled { ticket, sprint }),
        Err(err) => {
            tracing::warn!(key = %ticket.key, sprint = sprint.id, error = %err, "sprint assignment failed");
            Ok(CreateOutcome::SchedulingFailed {
                ticket,
                sprint,
                reason: err.to_string(),
            })
        }
    }
}

/// Applies field changes first, then moves the ticket to the requested
/// status if the ticket's current workflow offers that destination.
pub async fn update_ticket(ctx: &AppContext, patch: TicketPatch) -> AppResult<UpdateOutcome> {
    if patch.is_empty() {
        tracing::debug!(key = %patch.key, "empty patch; nothing to do");
        return Ok(UpdateOutcome {
            key: patch.key,
            fields_updated: false,
            transitioned_to: None,
        });
    }

    let session = ctx.session.as_ref();
    let issue_path = format!("issue/{}", patch.key);
    let fields = field_changes(ctx, &patch)?;

    let fields_updated = !fields.is_empty();
    if fields_updated {
        session
            .put(Api::Platform, &issue_path, &json!({ "fields": fields }))
            .await?
            .require_success()?;
        tracing::info!(key = %patch.key, "fields updated");
    }

    let Some(target) = patch.status else {
        return Ok(UpdateOutcome {
            key: patch.key,
            fields_updated,
            transitioned_to: None,
        });
    };

    let transitions_path = format!("{issue_path}/transitions");
    let available: Transitions = session
        .get(Api::Platform, &transitions_path, &[])
        .await?
        .require_success()?
        .parse()?;
    tracing::debug!(
        key = %patch.key,
        offered = ?available.transitions.iter().map(|t| t.to.name.as_str()).collect::<Vec<_>>(),
        "fetched transitions"
    );

    let wanted = target.to_lowercase();
    let Some(transition) = available
        .transitions
        .into_iter()
        .find(|transition| transition.to.name.to_lowercase() == wanted)
    else {
        return Err(AppError::TransitionUnavailable {
            key: patch.key,
            status: target,
            fields_applied: fields_updated,
        });
    };

    session
        .post(
            Api::Platform,
            &transitions_path,
            &json!({ "transition": { "id": transition.id.to_string() } }),
        )
        .await?
        .require_success()?;
    tracing::info!(key = %patch.key, status = %transition.to.name, "ticket transitioned");

    Ok(UpdateOutcome {
        key: patch.key,
        fields_updated,
        transitioned_to: Some(transition.to.name),
    })
}

fn field_changes(ctx: &AppContext, patch: &TicketPatch) -> AppResult<Map<String, Value>> {
    let mut fields = Map::new();
    if let Some(summary) = &patch.summary {
        fields.insert("summary".to_string(), json!(summary));
    }
    if let Some(description) = &patch.description {
        let doc = document::convert(description);
        fields.insert("description".to_string(), to_json(&doc)?);
    }
    if let Some(priority) = patch.priority {
        fields.insert("priority".to_string(), json!({ "name": priority.as_str() }));
    }
    if let Some(assignee) = &patch.assignee {
        fields.insert("assignee".to_string(), json!({ "accountId": assignee }));
    }
    match (&ctx.config.story_points_field, patch.story_points) {
        (Some(field), Some(points)) => {
            fields.insert(field.clone(), json!(points.value()));
        }
        (None, Some(_)) => {
            tracing::debug!(key = %patch.key, "story points field not configured; skipping");
        }
        _ => {}
    }
    Ok(fields)
}

fn to_json(doc: &Document) -> AppResult<Value> {
    serde_json::to_value(doc).map_err(|err| AppError::Decode(err.to_string()))
}

#[derive(Serialize)]
struct CreateIssueRequest<'a> {
    fields: CreateIssueFields<'a>,
}

#[derive(Serialize)]
struct CreateIssueFields<'a> {
    project: KeyRef<'a>,
    summary: &'a str,
    description: Document,
    issuetype: NameRef<'a>,
    priority: NameRef<'a>,
    assignee: AccountRef<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<KeyRef<'a>>,
    #[serde(flatten)]
    custom: Map<String, Value>,
}

#[derive(Serialize)]
struct KeyRef<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct NameRef<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountRef<'a> {
    account_id: &'a str,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

#[derive(Deserialize)]
struct Transitions {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Deserialize)]
struct Transition {
    id: TransitionId,
    to: TransitionTarget,
}

#[derive(Deserialize)]
struct TransitionTarget {
    name: String,
}

/// Jira sends transition ids as strings; tolerate bare numbers too.
#[derive(Deserialize)]
#[serde(untagged)]
enum TransitionId {
    Text(String),
    Number(u64),
}

impl std::fmt::Display for TransitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionId::Text(id) => f.write_str(id),
            TransitionId::Number(id) => write!(f, "{id}"),
        }
    }
}
