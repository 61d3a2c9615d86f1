pub mod document;
pub mod sprint;
pub mod ticket;
pub mod worklog;
