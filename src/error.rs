use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("Jira responded with {status}: {body}")]
    Remote { status: u16, body: String },
    #[error(
        "Status transition to '{status}' not available for {key}{}",
        applied_note(.fields_applied)
    )]
    TransitionUnavailable {
        key: String,
        status: String,
        fields_applied: bool,
    },
    #[error("failed to call Jira: {0}")]
    Transport(String),
    #[error("failed to parse Jira response: {0}")]
    Decode(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn applied_note(fields_applied: &bool) -> &'static str {
    if *fields_applied {
        " (other field changes were applied)"
    } else {
        ""
    }
}

pub type AppResult<T> = Result<T, AppError>;
