use chrono::NaiveDate;
use serde::Serialize;

const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogEntry {
    pub issue_key: String,
    pub summary: String,
    pub started: String,
    pub time_spent_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTimeSummary {
    pub date: NaiveDate,
    pub entries: Vec<WorklogEntry>,
    pub total_seconds: u64,
    /// Total in hours, two decimals.
    pub total_hours: String,
}

impl DailyTimeSummary {
    pub fn new(date: NaiveDate, entries: Vec<WorklogEntry>) -> Self {
        let total_seconds = entries.iter().map(|entry| entry.time_spent_seconds).sum();
        Self {
            date,
            entries,
            total_seconds,
            total_hours: format!("{:.2}", total_seconds as f64 / SECONDS_PER_HOUR),
        }
    }
}

/// Renders a duration in hours without trailing zeros: 3600 -> "1", 5400 -> "1.5".
pub fn format_hours(seconds: u64) -> String {
    let rendered = format!("{:.2}", seconds as f64 / SECONDS_PER_HOUR);
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
