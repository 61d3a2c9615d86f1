//! Conversion from the lightweight markup the agent writes into the
//! Atlassian document tree that Jira expects in rich-text fields.
//!
//! Supported per-line constructs, first match wins:
//! - `# Title` becomes a level 1 heading
//! - `- [ ] item` becomes a single unchecked task
//! - anything else becomes a paragraph, with `**bold**` spans marked strong
//!
//! Blank lines are dropped. Conversion never fails.

use serde::Serialize;

const HEADING_PREFIX: &str = "# ";
const TASK_PREFIX: &str = "- [ ] ";
const BOLD_MARKER: &str = "**";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(rename = "type")]
    doc_type: &'static str,
    pub version: u8,
    pub content: Vec<Block>,
}

impl Document {
    fn new(content: Vec<Block>) -> Self {
        Self {
            doc_type: "doc",
            version: 1,
            content,
        }
    }

    /// A single paragraph holding `text` verbatim, without markup parsing.
    pub fn paragraph(text: &str) -> Self {
        Self::new(vec![Block::Paragraph {
            content: Span::plain(text).into_iter().collect(),
        }])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Heading {
        attrs: HeadingAttrs,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        content: Vec<Span>,
    },
    Paragraph {
        content: Vec<Span>,
    },
    TaskList {
        content: Vec<TaskItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "taskItem")]
pub struct TaskItem {
    pub attrs: TaskAttrs,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskAttrs {
    pub state: TaskState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Todo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "text")]
pub struct Span {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl Span {
    /// Jira rejects empty text nodes, so empty input yields no span.
    fn plain(text: &str) -> Option<Self> {
        (!text.is_empty()).then(|| Self {
            text: text.to_string(),
            marks: Vec::new(),
        })
    }

    fn bold(text: &str) -> Option<Self> {
        (!text.is_empty()).then(|| Self {
            text: text.to_string(),
            marks: vec![Mark::Strong],
        })
    }

    #[cfg(test)]
    fn is_bold(&self) -> bool {
        self.marks.contains(&Mark::Strong)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Mark {
    Strong,
}

pub fn convert(markup: &str) -> Document {
    let blocks = markup
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(convert_line)
        .collect();
    Document::new(blocks)
}

fn convert_line(line: &str) -> Block {
    if let Some(title) = line.strip_prefix(HEADING_PREFIX) {
        Block::Heading {
            attrs: HeadingAttrs { level: 1 },
            content: Span::plain(title).into_iter().collect(),
        }
    } else if let Some(item) = line.strip_prefix(TASK_PREFIX) {
        Block::TaskList {
            content: vec![TaskItem {
                attrs: TaskAttrs {
                    state: TaskState::Todo,
                },
                content: Span::plain(item).into_iter().collect(),
            }],
        }
    } else {
        Block::Paragraph {
            content: scan_bold(line),
        }
    }
}

/// Splits a line into plain and bold spans. Each opening marker pairs with
/// the next marker after it; a marker without a partner stays literal text.
fn scan_bold(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = line;

    while let Some(open) = rest.find(BOLD_MARKER) {
        let after_open = &rest[open + BOLD_MARKER.len()..];
        let Some(close) = after_open.find(BOLD_MARKER) else {
            break;
        };
        spans.extend(Span::plain(&rest[..open]));
        spans.extend(Span::bold(&after_open[..close]));
        rest = &after_open[close + BOLD_MARKER.len()..];
    }

    spans.extend(Span::plain(rest));
    spans
}
