//! Glue between the API client and the message store: loading flags, the
//! last error string, debounced filter refetches and stale-response
//! discarding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{AnalyticsSnapshot, InboxApi, MessagePage, MessageQuery, SyncResult};
use crate::error::{AppError, AppResult};
use crate::model::Message;
use crate::store::{InboxStats, MessageFilters, MessageStore};
use crate::sync::{Debouncer, RequestSequence};
use crate::vocab::{self, BackendContext, BackendPriority, DisplayContext, DisplayPriority};

#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    pub page_size: u32,
    /// Size of the unfiltered, session-wide context fetch.
    pub context_limit: u32,
    pub debounce: Duration,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            page_size: 20,
            context_limit: 100,
            debounce: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Default)]
struct LoadingFlags {
    messages: AtomicBool,
    context: AtomicBool,
    analytics: AtomicBool,
    sync: AtomicBool,
}

#[derive(Debug)]
pub struct Dashboard<A> {
    api: A,
    store: Mutex<MessageStore>,
    analytics: Mutex<Option<AnalyticsSnapshot>>,
    last_error: Mutex<Option<String>>,
    sequence: RequestSequence,
    context_sequence: RequestSequence,
    analytics_sequence: RequestSequence,
    context_limit: u32,
    debouncer: Debouncer,
    loading: LoadingFlags,
}

impl<A: InboxApi> Dashboard<A> {
    pub fn new(api: A, options: DashboardOptions) -> Self {
        Self {
            api,
            store: Mutex::new(MessageStore::new(options.page_size)),
            analytics: Mutex::new(None),
            last_error: Mutex::new(None),
            sequence: RequestSequence::default(),
            context_sequence: RequestSequence::default(),
            analytics_sequence: RequestSequence::default(),
            context_limit: options.context_limit.max(1),
            debouncer: Debouncer::new(options.debounce),
            loading: LoadingFlags::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run `f` against the store. The lock is never held across an await.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut MessageStore) -> R) -> R {
        let mut store = lock(&self.store);
        f(&mut *store)
    }

    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Message> {
        self.with_store(|store| store.visible(now))
    }

    pub fn stats(&self, now: DateTime<Utc>) -> InboxStats {
        self.with_store(|store| store.stats(now))
    }

    pub fn analytics(&self) -> Option<AnalyticsSnapshot> {
        lock(&self.analytics).clone()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    pub fn is_loading_messages(&self) -> bool {
        self.loading.messages.load(Ordering::SeqCst)
    }

    pub fn is_loading_context(&self) -> bool {
        self.loading.context.load(Ordering::SeqCst)
    }

    pub fn is_loading_analytics(&self) -> bool {
        self.loading.analytics.load(Ordering::SeqCst)
    }

    pub fn is_syncing(&self) -> bool {
        self.loading.sync.load(Ordering::SeqCst)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading_messages()
            || self.is_loading_context()
            || self.is_loading_analytics()
            || self.is_syncing()
    }

    /// Refetch the first page. Returns `false` if a newer request superseded
    /// this one before it resolved.
    pub async fn refresh_messages(&self) -> AppResult<bool> {
        let query = self.with_store(|store| page_query(store, 0));
        self.fetch_page(query, PageMode::Replace).await
    }

    /// Fetch the next page and append it. Returns `false` when there was
    /// nothing more to load or the response went stale.
    pub async fn load_more(&self) -> AppResult<bool> {
        let Some(query) = self.with_store(|store| {
            store
                .next_page_offset()
                .map(|offset| page_query(store, offset))
        }) else {
            debug!("no more pages to load");
            return Ok(false);
        };

        self.fetch_page(query, PageMode::Append).await
    }

    /// Apply new filters to the local view immediately and refetch once the
    /// edits stop arriving.
    pub async fn set_filters(&self, filters: MessageFilters) -> AppResult<bool> {
        self.with_store(|store| store.set_filters(filters));

        if !self.debouncer.settle().await {
            debug!("filter change superseded during debounce");
            return Ok(false);
        }

        self.refresh_messages().await
    }

    /// Reload the session-wide message set. It ignores filters and pages;
    /// where it overlaps the paginated pages, its copy is the one shown.
    pub async fn refresh_context(&self) -> AppResult<bool> {
        let ticket = self.context_sequence.issue();
        self.loading.context.store(true, Ordering::SeqCst);

        let query = MessageQuery {
            limit: self.context_limit,
            ..MessageQuery::default()
        };
        let result = self.api.list_messages(&query).await;

        if !self.context_sequence.is_latest(ticket) {
            debug!("discarding stale context messages");
            return Ok(false);
        }
        self.loading.context.store(false, Ordering::SeqCst);

        let page = result.map_err(|err| self.record_error(err))?;
        debug!(count = page.messages.len(), "applying context messages");
        self.with_store(|store| store.set_context_messages(page.messages));
        Ok(true)
    }

    pub async fn refresh_analytics(&self, user_id: &str, days: u32) -> AppResult<()> {
        let ticket = self.analytics_sequence.issue();
        self.loading.analytics.store(true, Ordering::SeqCst);
        let result = self.api.analytics(user_id, days, true).await;

        if !self.analytics_sequence.is_latest(ticket) {
            debug!("discarding stale analytics");
            return Ok(());
        }
        self.loading.analytics.store(false, Ordering::SeqCst);

        match result {
            Ok(snapshot) => {
                *lock(&self.analytics) = Some(snapshot);
                Ok(())
            }
            Err(err) => Err(self.record_error(err)),
        }
    }

    /// The paginated page, the context set and analytics are independent
    /// fetch groups and go out together.
    pub async fn refresh_all(&self, user_id: &str, days: u32) -> AppResult<()> {
        let (messages, context, analytics) = tokio::join!(
            self.refresh_messages(),
            self.refresh_context(),
            self.refresh_analytics(user_id, days)
        );
        messages?;
        context?;
        analytics
    }

    /// Ask the backend to pull new mail from Gmail, then reload the first page.
    pub async fn sync_gmail(&self) -> AppResult<SyncResult> {
        self.loading.sync.store(true, Ordering::SeqCst);
        let result = self.api.fetch_from_gmail().await;
        self.loading.sync.store(false, Ordering::SeqCst);

        let result = result.map_err(|err| self.record_error(err))?;
        info!(processed = result.processed, "gmail sync finished");
        self.refresh_messages().await?;
        Ok(result)
    }

    /// Record a user correction. The store is patched before the request
    /// goes out and is not reverted if it fails.
    pub async fn submit_feedback(
        &self,
        id: &str,
        priority: Option<DisplayPriority>,
        context: Option<DisplayContext>,
    ) -> AppResult<()> {
        let (backend_priority, backend_context) = feedback_request(priority, context)?;

        let patched = self.with_store(|store| store.apply_feedback(id, priority, context));
        if !patched {
            warn!(message_id = id, "feedback for a message that is not loaded");
        }

        self.api
            .submit_feedback(id, backend_priority, backend_context)
            .await
            .map_err(|err| self.record_error(err))
    }

    /// Drop all loaded state. Fetches still in flight are treated as stale.
    pub fn clear(&self) {
        self.sequence.issue();
        self.context_sequence.issue();
        self.analytics_sequence.issue();
        self.loading.messages.store(false, Ordering::SeqCst);
        self.loading.context.store(false, Ordering::SeqCst);
        self.loading.analytics.store(false, Ordering::SeqCst);

        self.with_store(MessageStore::clear);
        *lock(&self.analytics) = None;
        *lock(&self.last_error) = None;
    }

    async fn fetch_page(&self, query: MessageQuery, mode: PageMode) -> AppResult<bool> {
        let ticket = self.sequence.issue();
        self.loading.messages.store(true, Ordering::SeqCst);

        let result = self.api.list_messages(&query).await;

        if !self.sequence.is_latest(ticket) {
            debug!(offset = query.offset, "discarding stale message page");
            return Ok(false);
        }
        self.loading.messages.store(false, Ordering::SeqCst);

        let page = result.map_err(|err| self.record_error(err))?;
        self.apply_page(query.offset, page, mode);
        *lock(&self.last_error) = None;
        Ok(true)
    }

    fn apply_page(&self, offset: u32, page: MessagePage, mode: PageMode) {
        debug!(
            offset,
            count = page.messages.len(),
            has_next = page.has_next,
            "applying message page"
        );
        self.with_store(|store| match mode {
            PageMode::Replace => store.replace_page(page),
            PageMode::Append => store.append_page(offset, page),
        });
    }

    /// A rejected session is not an inline error: everything loaded under it
    /// is dropped and the caller sends the user back to login.
    fn record_error(&self, err: AppError) -> AppError {
        if err.is_unauthorized() {
            warn!(error = %err, "session rejected; clearing dashboard");
            self.clear();
            return err;
        }

        warn!(error = %err, "dashboard request failed");
        *lock(&self.last_error) = Some(err.user_message());
        err
    }
}

#[derive(Debug, Clone, Copy)]
enum PageMode {
    Replace,
    Append,
}

/// Translate a correction into the backend's feedback vocabulary. At least
/// one field is required, and only business, personal and general contexts
/// can be stored.
pub fn feedback_request(
    priority: Option<DisplayPriority>,
    context: Option<DisplayContext>,
) -> AppResult<(Option<BackendPriority>, Option<BackendContext>)> {
    if priority.is_none() && context.is_none() {
        return Err(AppError::InvalidInput(
            "feedback needs a priority, a context, or both".to_string(),
        ));
    }

    let backend_context = match context {
        Some(context) => Some(vocab::feedback_context(context).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "context `{context}` cannot be submitted as feedback; use business, personal or general"
            ))
        })?),
        None => None,
    };

    Ok((priority.map(vocab::priority_to_backend), backend_context))
}

fn page_query(store: &MessageStore, offset: u32) -> MessageQuery {
    let filters = store.filters();
    MessageQuery {
        limit: store.pagination().limit,
        offset,
        source: filters.source,
        priority: filters.priority,
        context: filters.context,
        search: filters.search.clone(),
        days: filters.time_range.days(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
