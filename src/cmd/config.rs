use clap::{Args, Subcommand};

use crate::config::AppConfig;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets masked).
    Show,
}

pub fn run(config: &AppConfig, command: ConfigCommand) {
    match command {
        ConfigCommand::Show => {
            for (label, value) in describe(config) {
                println!("{label}: {value}");
            }
        }
    }
}

fn describe(config: &AppConfig) -> Vec<(&'static str, String)> {
    vec![
        ("Jira base URL", config.jira_base_url.clone()),
        ("Jira username", config.jira_username.clone()),
        ("Jira API token", mask_secret(&config.jira_token)),
        ("Default assignee", config.assignee_account_id.clone()),
        (
            "Story points field",
            display_value(config.story_points_field.as_deref()),
        ),
        (
            "Request timeout",
            config
                .request_timeout
                .map(|timeout| format!("{}s", timeout.as_secs()))
                .unwrap_or_else(|| "<none>".to_string()),
        ),
        ("Log filter", config.log_filter.clone()),
    ]
}

fn display_value(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    match chars.len() {
        0 => "<not set>".to_string(),
        len if len > 6 => {
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[len - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        _ => "***".to_string(),
    }
}
