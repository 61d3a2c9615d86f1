use std::fmt;

/// The iteration currently in progress on a project's board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprint {
    pub id: u64,
}

impl fmt::Display for Sprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
