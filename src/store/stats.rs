use serde::Serialize;

use crate::model::Message;
use crate::vocab::DisplayPriority;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InboxStats {
    pub total: u64,
    pub unread: u64,
    pub urgent: u64,
    pub important: u64,
}

/// Counters over `messages`. `total` prefers the backend's pagination total.
pub fn derive_stats(messages: &[Message], reported_total: Option<u64>) -> InboxStats {
    let count = |predicate: &dyn Fn(&Message) -> bool| {
        messages.iter().filter(|message| predicate(message)).count() as u64
    };

    InboxStats {
        total: reported_total.unwrap_or(messages.len() as u64),
        unread: count(&|message| !message.is_read),
        urgent: count(&|message| message.priority == DisplayPriority::VeryUrgent),
        important: count(&|message| message.priority == DisplayPriority::Important),
    }
}
