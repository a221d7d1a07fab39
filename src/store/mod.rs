//! Reconciled view of loaded messages.
//!
//! Two collections feed the view: the session-wide "context" set and the
//! offset-paginated set. The merged view is their concatenation with
//! duplicate ids collapsed to the first occurrence, so context messages win.

pub mod filters;
pub mod sort;
pub mod stats;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::api::MessagePage;
use crate::model::Message;
use crate::vocab::{DisplayContext, DisplayPriority};

pub use filters::{MessageFilters, TimeRange, apply_filters};
pub use sort::{SortKey, sort_messages};
pub use stats::{InboxStats, derive_stats};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ContextReplaced,
    PageReplaced,
    PageAppended { offset: u32 },
    FeedbackApplied { id: String },
    FiltersChanged,
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Offset of the most recently loaded page.
    pub offset: u32,
    pub limit: u32,
    pub total: Option<u64>,
    pub has_next: bool,
}

impl Pagination {
    pub fn next_offset(&self) -> u32 {
        self.offset.saturating_add(self.limit)
    }
}

#[derive(Debug)]
pub struct MessageStore {
    context_messages: Vec<Message>,
    paginated: Vec<Message>,
    loaded_pages: bool,
    pagination: Pagination,
    filters: MessageFilters,
    sort_key: SortKey,
    events: broadcast::Sender<StoreEvent>,
}

impl MessageStore {
    pub fn new(page_size: u32) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            context_messages: Vec::new(),
            paginated: Vec::new(),
            loaded_pages: false,
            pagination: Pagination {
                offset: 0,
                limit: page_size.max(1),
                total: None,
                has_next: false,
            },
            filters: MessageFilters::default(),
            sort_key: SortKey::default(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn filters(&self) -> &MessageFilters {
        &self.filters
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn set_filters(&mut self, filters: MessageFilters) {
        if self.filters == filters {
            return;
        }
        self.filters = filters;
        self.notify(StoreEvent::FiltersChanged);
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        if self.sort_key == key {
            return;
        }
        self.sort_key = key;
        self.notify(StoreEvent::FiltersChanged);
    }

    pub fn set_context_messages(&mut self, messages: Vec<Message>) {
        self.context_messages = messages;
        self.notify(StoreEvent::ContextReplaced);
    }

    /// Refresh: the page becomes the whole paginated collection, from offset 0.
    pub fn replace_page(&mut self, page: MessagePage) {
        self.paginated = page.messages;
        self.loaded_pages = true;
        self.pagination.offset = 0;
        self.pagination.total = page.total;
        self.pagination.has_next = page.has_next;
        self.notify(StoreEvent::PageReplaced);
    }

    /// Load more: the page is appended after what is already loaded.
    pub fn append_page(&mut self, offset: u32, page: MessagePage) {
        if !self.loaded_pages {
            self.replace_page(page);
            return;
        }

        self.paginated.extend(page.messages);
        self.pagination.offset = offset;
        self.pagination.total = page.total.or(self.pagination.total);
        self.pagination.has_next = page.has_next;
        self.notify(StoreEvent::PageAppended { offset });
    }

    pub fn clear(&mut self) {
        self.context_messages.clear();
        self.paginated.clear();
        self.loaded_pages = false;
        self.pagination.offset = 0;
        self.pagination.total = None;
        self.pagination.has_next = false;
        self.notify(StoreEvent::Cleared);
    }

    /// Offset to request on "load more", if the backend reported more.
    pub fn next_page_offset(&self) -> Option<u32> {
        if !self.loaded_pages {
            return Some(0);
        }
        self.pagination
            .has_next
            .then(|| self.pagination.next_offset())
    }

    pub fn merged(&self) -> Vec<Message> {
        let mut seen = HashSet::new();
        self.context_messages
            .iter()
            .chain(self.paginated.iter())
            .filter(|message| seen.insert(message.id.as_str()))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Message> {
        self.context_messages
            .iter()
            .chain(self.paginated.iter())
            .find(|message| message.id == id)
            .cloned()
    }

    /// Merged, filtered and sorted.
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Message> {
        let filtered = apply_filters(&self.merged(), &self.filters, now);
        sort_messages(filtered, self.sort_key)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> InboxStats {
        derive_stats(&self.visible(now), self.pagination.total)
    }

    /// Patch a message in place ahead of the network round trip. Returns
    /// whether the id was loaded.
    pub fn apply_feedback(
        &mut self,
        id: &str,
        priority: Option<DisplayPriority>,
        context: Option<DisplayContext>,
    ) -> bool {
        let mut found = false;
        for message in self
            .context_messages
            .iter_mut()
            .chain(self.paginated.iter_mut())
            .filter(|message| message.id == id)
        {
            if let Some(priority) = priority {
                message.priority = priority;
            }
            if let Some(context) = context {
                message.context = context;
            }
            found = true;
        }

        if found {
            self.notify(StoreEvent::FeedbackApplied { id: id.to_string() });
        }
        found
    }

    fn notify(&self, event: StoreEvent) {
        debug!(?event, "store changed");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::MessageSource;

    fn message(id: &str, subject: &str) -> Message {
        Message {
            id: id.to_string(),
            sender: "example.com".to_string(),
            subject: subject.to_string(),
            preview: String::new(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap(),
            source: MessageSource::Gmail,
            priority: DisplayPriority::NotImportant,
            context: DisplayContext::General,
            confidence: 80.0,
            is_read: false,
        }
    }

    fn page(ids: std::ops::Range<u32>, has_next: bool) -> MessagePage {
        MessagePage {
            messages: ids.map(|i| message(&i.to_string(), "paged")).collect(),
            total: Some(100),
            has_next,
        }
    }

    #[test]
    fn context_copy_wins_on_duplicate_ids() {
        let mut store = MessageStore::new(20);
        store.set_context_messages(vec![message("42", "from context")]);
        store.replace_page(MessagePage {
            messages: vec![message("42", "from page"), message("43", "other")],
            total: None,
            has_next: false,
        });

        let merged = store.merged();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "42");
        assert_eq!(merged[0].subject, "from context");
    }

    #[test]
    fn load_more_appends_and_refresh_replaces() {
        let mut store = MessageStore::new(20);
        assert_eq!(store.next_page_offset(), Some(0));

        store.append_page(0, page(0..20, true));
        let offset = store.next_page_offset().expect("more pages");
        assert_eq!(offset, 20);
        store.append_page(offset, page(20..40, true));

        assert_eq!(store.merged().len(), 40);
        assert_eq!(store.pagination().offset, 20);
        assert_eq!(store.next_page_offset(), Some(40));

        store.replace_page(page(0..20, true));
        assert_eq!(store.merged().len(), 20);
        assert_eq!(store.pagination().offset, 0);
    }

    #[test]
    fn no_next_offset_when_backend_has_no_more() {
        let mut store = MessageStore::new(20);
        store.replace_page(page(0..5, false));
        assert_eq!(store.next_page_offset(), None);
    }

    #[test]
    fn feedback_patches_every_copy_and_notifies() {
        let mut store = MessageStore::new(20);
        let mut events = store.subscribe();
        store.set_context_messages(vec![message("7", "ctx")]);
        store.replace_page(MessagePage {
            messages: vec![message("7", "page")],
            total: None,
            has_next: false,
        });

        assert!(store.apply_feedback("7", Some(DisplayPriority::VeryUrgent), None));
        assert!(!store.apply_feedback("missing", Some(DisplayPriority::Important), None));

        let patched = store.get("7").expect("loaded");
        assert_eq!(patched.priority, DisplayPriority::VeryUrgent);
        assert_eq!(patched.context, DisplayContext::General);

        assert_eq!(events.try_recv(), Ok(StoreEvent::ContextReplaced));
        assert_eq!(events.try_recv(), Ok(StoreEvent::PageReplaced));
        assert_eq!(
            events.try_recv(),
            Ok(StoreEvent::FeedbackApplied { id: "7".to_string() })
        );
    }

    #[test]
    fn stats_use_reported_total_when_present() {
        let mut store = MessageStore::new(20);
        let mut urgent = message("1", "a");
        urgent.priority = DisplayPriority::VeryUrgent;
        let mut important = message("2", "b");
        important.priority = DisplayPriority::Important;
        important.is_read = true;

        store.set_context_messages(vec![urgent, important]);
        let now = Utc.with_ymd_and_hms(2026, 10, 2, 0, 0, 0).unwrap();
        assert_eq!(
            store.stats(now),
            InboxStats {
                total: 2,
                unread: 1,
                urgent: 1,
                important: 1
            }
        );

        store.replace_page(page(10..12, false));
        assert_eq!(store.stats(now).total, 100);
    }

    #[test]
    fn clear_empties_both_collections() {
        let mut store = MessageStore::new(20);
        store.set_context_messages(vec![message("1", "a")]);
        store.replace_page(page(0..3, true));
        store.clear();
        assert!(store.merged().is_empty());
        assert_eq!(store.next_page_offset(), Some(0));
    }
}
