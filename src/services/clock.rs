use chrono::NaiveDate;

/// Source of "today" for date-defaulted queries.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}
