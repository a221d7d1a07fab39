use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Newest first.
    #[default]
    Date,
    /// Most severe first.
    Priority,
    /// Alphabetical.
    Sender,
}

/// Stable sort: ties keep their input order.
pub fn sort_messages(mut messages: Vec<Message>, key: SortKey) -> Vec<Message> {
    match key {
        SortKey::Date => messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortKey::Priority => {
            messages.sort_by(|a, b| b.priority.severity().cmp(&a.priority.severity()))
        }
        SortKey::Sender => messages.sort_by(|a, b| a.sender.cmp(&b.sender)),
    }
    messages
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Date => "date",
            SortKey::Priority => "priority",
            SortKey::Sender => "sender",
        })
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "priority" => Ok(SortKey::Priority),
            "sender" => Ok(SortKey::Sender),
            _ => Err(format!("unknown sort key `{s}`; expected date, priority or sender")),
        }
    }
}
