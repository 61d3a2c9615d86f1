use serde::Deserialize;

use crate::context::AppContext;
use crate::domain::sprint::Sprint;
use crate::domain::ticket::SprintTicket;
use crate::error::AppResult;
use crate::services::{Api, RemoteSession};

const SPRINT_TICKET_FIELDS: &str = "summary,status,assignee,timetracking";

/// Finds the active sprint on the project's board. Any failure along the
/// way is logged and reported as no sprint; a missing sprint is routine.
pub async fn resolve_active_sprint(session: &dyn RemoteSession, project_key: &str) -> Option<Sprint> {
    match lookup_active_sprint(session, project_key).await {
        Ok(Some(sprint)) => {
            tracing::debug!(project_key, sprint = sprint.id, "resolved active sprint");
            Some(sprint)
        }
        Ok(None) => {
            tracing::info!(project_key, "no active sprint");
            None
        }
        Err(err) => {
            tracing::warn!(project_key, error = %err, "error fetching current sprint");
            None
        }
    }
}

async fn lookup_active_sprint(
    session: &dyn RemoteSession,
    project_key: &str,
) -> AppResult<Option<Sprint>> {
    let boards: Page<Board> = session
        .get(Api::Agile, "board", &[("projectKeyOrId", project_key.to_string())])
        .await?
        .require_success()?
        .parse()?;

    let Some(board_id) = boards
        .values
        .iter()
        .find(|board| board.project_key() == Some(project_key))
        .and_then(|board| board.id.filter(|id| *id > 0))
    else {
        return Ok(None);
    };

    let sprints: Page<SprintRef> = session
        .get(
            Api::Agile,
            &format!("board/{board_id}/sprint"),
            &[("state", "active".to_string())],
        )
        .await?
        .require_success()?
        .parse()?;

    Ok(sprints
        .values
        .first()
        .and_then(|sprint| sprint.id)
        .filter(|id| *id > 0)
        .map(|id| Sprint { id }))
}

/// Lists the active sprint's tickets, optionally only those assigned to
/// `assignee`. `None` means the project has no active sprint.
pub async fn list_sprint_tickets(
    ctx: &AppContext,
    project_key: &str,
    assignee: Option<&str>,
) -> AppResult<Option<Vec<SprintTicket>>> {
    let session = ctx.session.as_ref();
    let Some(sprint) = resolve_active_sprint(session, project_key).await else {
        return Ok(None);
    };

    let mut query = vec![("fields", SPRINT_TICKET_FIELDS.to_string())];
    if let Some(assignee) = assignee {
        query.push(("jql", format!("assignee = \"{}\"", assignee.replace('"', "\\\""))));
    }

    let issues: SprintIssues = session
        .get(Api::Agile, &format!("sprint/{}/issue", sprint.id), &query)
        .await?
        .require_success()?
        .parse()?;

    Ok(Some(
        issues.issues.into_iter().map(SprintIssue::into_ticket).collect(),
    ))
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
}

#[derive(Deserialize)]
struct Board {
    id: Option<u64>,
    location: Option<BoardLocation>,
}

impl Board {
    fn project_key(&self) -> Option<&str> {
        self.location
            .as_ref()
            .and_then(|location| location.project_key.as_deref())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardLocation {
    project_key: Option<String>,
}

#[derive(Deserialize)]
struct SprintRef {
    id: Option<u64>,
}

#[derive(Deserialize)]
struct SprintIssues {
    #[serde(default)]
    issues: Vec<SprintIssue>,
}

#[derive(Deserialize)]
struct SprintIssue {
    key: String,
    fields: SprintIssueFields,
}

#[derive(Deserialize)]
struct SprintIssueFields {
    #[serde(default)]
    summary: String,
    status: Option<NamedRef>,
    assignee: Option<Assignee>,
    timetracking: Option<TimeTracking>,
}

#[derive(Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Assignee {
    display_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeTracking {
    time_spent: Option<String>,
}

impl SprintIssue {
    fn into_ticket(self) -> SprintTicket {
        let fields = self.fields;
        SprintTicket {
            key: self.key,
            summary: fields.summary,
            status: fields
                .status
                .map(|status| status.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            assignee: fields
                .assignee
                .and_then(|assignee| assignee.display_name)
                .unwrap_or_else(|| "Unassigned".to_string()),
            time_tracking: fields
                .timetracking
                .and_then(|tracking| tracking.time_spent)
                .unwrap_or_else(|| "No time logged".to_string()),
        }
    }
}
