use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::model::{Message, MessageSource};
use crate::vocab::{DisplayContext, DisplayPriority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    All,
    Days(u32),
}

impl TimeRange {
    pub fn days(self) -> Option<u32> {
        match self {
            TimeRange::All => None,
            TimeRange::Days(days) => Some(days),
        }
    }

    fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days()
            .map(|days| now - Duration::days(i64::from(days)))
    }
}

/// Independent predicates, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageFilters {
    pub search: Option<String>,
    pub source: Option<MessageSource>,
    pub context: Option<DisplayContext>,
    pub priority: Option<DisplayPriority>,
    pub unread_only: bool,
    pub time_range: TimeRange,
}

impl MessageFilters {
    pub fn matches(&self, message: &Message, now: DateTime<Utc>) -> bool {
        if let Some(needle) = self.search_needle() {
            let sender = message.sender.to_lowercase();
            let subject = message.subject.to_lowercase();
            if !sender.contains(&needle) && !subject.contains(&needle) {
                return false;
            }
        }

        if self.source.is_some_and(|source| source != message.source) {
            return false;
        }
        if self.context.is_some_and(|context| context != message.context) {
            return false;
        }
        if self
            .priority
            .is_some_and(|priority| priority != message.priority)
        {
            return false;
        }
        if self.unread_only && message.is_read {
            return false;
        }
        if let Some(cutoff) = self.time_range.cutoff(now) {
            if message.timestamp < cutoff {
                return false;
            }
        }

        true
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(str::to_lowercase)
    }
}

pub fn apply_filters(
    messages: &[Message],
    filters: &MessageFilters,
    now: DateTime<Utc>,
) -> Vec<Message> {
    messages
        .iter()
        .filter(|message| filters.matches(message, now))
        .cloned()
        .collect()
}
