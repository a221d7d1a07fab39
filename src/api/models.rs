use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::auth::AuthSession;
use crate::model::{self, Message, MessageSource};
use crate::vocab::{self, DisplayPriority};

/// One page of messages after normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub total: Option<u64>,
    pub has_next: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub authorization_url: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailStatus {
    #[serde(alias = "gmail_connected", alias = "is_connected")]
    pub connected: bool,
    #[serde(alias = "gmail_email")]
    pub email: Option<String>,
    #[serde(alias = "last_sync_at", alias = "last_synced")]
    pub last_sync: Option<String>,
    #[serde(alias = "total_messages")]
    pub message_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailConnect {
    #[serde(alias = "auth_url", alias = "url")]
    pub authorization_url: Option<String>,
    pub connected: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncResult {
    #[serde(alias = "fetched", alias = "new_messages", alias = "count")]
    pub processed: u64,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSnapshot {
    pub message_stats: MessageStats,
    pub priority_distribution: BTreeMap<String, u64>,
    pub source_breakdown: BTreeMap<String, u64>,
    pub trends: Option<Value>,
    pub insights: Vec<Insight>,
    /// Day window the snapshot was requested for.
    pub days: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageStats {
    #[serde(alias = "total_messages")]
    pub total: u64,
    #[serde(alias = "processed_messages")]
    pub processed: u64,
    #[serde(alias = "unread_messages")]
    pub unread: u64,
    #[serde(alias = "high_priority", alias = "urgent_messages")]
    pub urgent: u64,
    #[serde(alias = "avg_confidence", alias = "average_confidence")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insight {
    Text(String),
    Detailed {
        #[serde(default, alias = "message")]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

impl Insight {
    pub fn text(&self) -> String {
        match self {
            Insight::Text(text) => text.clone(),
            Insight::Detailed {
                title, description, ..
            } => match (title, description) {
                (Some(title), Some(description)) => format!("{title}: {description}"),
                (Some(text), None) | (None, Some(text)) => text.clone(),
                (None, None) => String::new(),
            },
        }
    }
}

impl AnalyticsSnapshot {
    /// Priority counts keyed by display priority. Backend keys that map to the
    /// same display value are summed.
    pub fn display_priority_distribution(&self) -> [(DisplayPriority, u64); 3] {
        let mut out = DisplayPriority::ALL.map(|priority| (priority, 0_u64));
        for (key, count) in &self.priority_distribution {
            let priority = vocab::priority_to_display(key);
            if let Some(slot) = out.iter_mut().find(|(p, _)| *p == priority) {
                slot.1 = slot.1.saturating_add(*count);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawMessage {
    id: Option<Value>,
    gmail_id: Option<String>,
    #[serde(alias = "from", alias = "from_email", alias = "sender_email")]
    sender: Option<String>,
    subject: Option<String>,
    #[serde(alias = "snippet", alias = "body_preview")]
    preview: Option<String>,
    #[serde(alias = "received_at", alias = "date")]
    timestamp: Option<String>,
    source: Option<String>,
    #[serde(alias = "predicted_priority")]
    priority: Option<String>,
    #[serde(alias = "predicted_context")]
    context: Option<String>,
    #[serde(alias = "confidence_score")]
    confidence: Option<f64>,
    processed_at: Option<String>,
    prediction: Option<RawPrediction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawPrediction {
    priority: Option<String>,
    context: Option<String>,
    confidence: Option<f64>,
}

impl RawMessage {
    pub(crate) fn into_message(self) -> Option<Message> {
        let Some(id) = self.id.as_ref().and_then(id_string).or(self.gmail_id) else {
            warn!("dropping message record without an id");
            return None;
        };

        let prediction = self.prediction.unwrap_or_default();
        let priority = self.priority.or(prediction.priority).unwrap_or_default();
        let context = self.context.or(prediction.context);

        Some(Message {
            sender: model::display_sender(self.sender.as_deref().unwrap_or_default()),
            subject: self.subject.unwrap_or_else(|| "(no subject)".to_string()),
            preview: self.preview.unwrap_or_default(),
            timestamp: parse_timestamp(&id, self.timestamp.as_deref()),
            source: MessageSource::from_backend(self.source.as_deref()),
            priority: vocab::priority_to_display(&priority),
            context: vocab::optional_context_to_display(context.as_deref()),
            confidence: model::confidence_percent(self.confidence.or(prediction.confidence)),
            is_read: self
                .processed_at
                .as_deref()
                .is_some_and(|value| !value.trim().is_empty()),
            id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawProfile {
    #[serde(alias = "id")]
    user_id: Option<Value>,
    email: Option<String>,
    #[serde(alias = "name")]
    full_name: Option<String>,
    auth_method: Option<String>,
    gmail_connected: bool,
}

impl RawProfile {
    pub(crate) fn into_session(self) -> Option<AuthSession> {
        Some(AuthSession {
            user_id: self.user_id.as_ref().and_then(id_string)?,
            email: self.email?,
            full_name: self.full_name,
            auth_method: self.auth_method.unwrap_or_else(|| "google".to_string()),
            gmail_connected: self.gmail_connected,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawLoginInit {
    #[serde(alias = "auth_url", alias = "url")]
    pub(crate) authorization_url: Option<String>,
    pub(crate) state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawCodeExchange {
    #[serde(alias = "token")]
    pub(crate) access_token: Option<String>,
    pub(crate) user: Option<Value>,
}

/// Build a page out of any of the list shapes the backend returns.
pub(crate) fn parse_message_page(payload: Value) -> MessagePage {
    let (records, pagination) = match payload {
        Value::Array(records) => (records, None),
        Value::Object(mut map) => {
            let records = ["messages", "items", "results"]
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(records)) => Some(records),
                    _ => None,
                });
            let records = records.unwrap_or_else(|| {
                warn!("message list response has no message array; treating as empty");
                Vec::new()
            });
            let pagination = match map.remove("pagination") {
                Some(Value::Object(nested)) => Some(nested),
                _ => Some(map),
            };
            (records, pagination)
        }
        Value::Null => (Vec::new(), None),
        other => {
            warn!(kind = value_kind(&other), "unexpected message list payload; treating as empty");
            (Vec::new(), None)
        }
    };

    let messages = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<RawMessage>(record) {
            Ok(raw) => raw.into_message(),
            Err(err) => {
                warn!(error = %err, "skipping malformed message record");
                None
            }
        })
        .collect::<Vec<_>>();

    let total = pagination
        .as_ref()
        .and_then(|map| map.get("total").or_else(|| map.get("total_count")))
        .and_then(Value::as_u64);
    let has_next = pagination
        .as_ref()
        .and_then(|map| map.get("has_more").or_else(|| map.get("has_next")))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    MessagePage {
        messages,
        total,
        has_next,
    }
}

/// Profile payloads come either bare or nested under `user`.
pub(crate) fn parse_profile(payload: Value) -> Option<AuthSession> {
    let payload = match payload {
        Value::Object(mut map) => match map.remove("user") {
            Some(user @ Value::Object(_)) => user,
            _ => Value::Object(map),
        },
        other => other,
    };

    match serde_json::from_value::<RawProfile>(payload) {
        Ok(raw) => raw.into_session(),
        Err(err) => {
            warn!(error = %err, "malformed profile payload");
            None
        }
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn parse_timestamp(id: &str, raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        warn!(message_id = id, "message has no timestamp");
        return DateTime::<Utc>::UNIX_EPOCH;
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }

    // Naive timestamps from the backend are UTC.
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.and_utc();
    }

    warn!(message_id = id, timestamp = raw, "unparseable message timestamp");
    DateTime::<Utc>::UNIX_EPOCH
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::vocab::DisplayContext;

    #[test]
    fn normalizes_backend_message_record() {
        let page = parse_message_page(json!({
            "messages": [{
                "id": 42,
                "from_email": "Jane Doe <jane@example.com>",
                "subject": "Quarterly numbers",
                "snippet": "Numbers attached",
                "received_at": "2026-10-01T09:30:00Z",
                "predicted_priority": "high",
                "predicted_context": "work",
                "confidence": 0.5,
                "processed_at": "2026-10-01T09:31:00Z"
            }],
            "pagination": {"total": 120, "has_more": true}
        }));

        assert_eq!(page.total, Some(120));
        assert!(page.has_next);
        let message = &page.messages[0];
        assert_eq!(message.id, "42");
        assert_eq!(message.sender, "Jane Doe");
        assert_eq!(message.priority, DisplayPriority::VeryUrgent);
        assert_eq!(message.context, DisplayContext::Business);
        assert_eq!(message.confidence, 50.0);
        assert!(message.is_read);
        assert_eq!(message.source, MessageSource::Gmail);
    }

    #[test]
    fn reads_nested_prediction_and_flat_pagination() {
        let page = parse_message_page(json!({
            "items": [{
                "id": "m-1",
                "sender": "news@shop.com",
                "timestamp": "2026-10-01T09:30:00.250",
                "prediction": {"priority": "medium", "context": "marketing", "confidence": 73}
            }],
            "total": 5,
            "has_next": false
        }));

        let message = &page.messages[0];
        assert_eq!(message.priority, DisplayPriority::Important);
        assert_eq!(message.context, DisplayContext::Promotions);
        assert_eq!(message.confidence, 73.0);
        assert!(!message.is_read);
        assert_eq!(message.sender, "shop.com");
        assert_eq!(page.total, Some(5));
        assert!(!page.has_next);
    }

    #[test]
    fn missing_arrays_and_bad_records_are_treated_as_empty() {
        assert!(parse_message_page(json!({"pagination": {}})).messages.is_empty());
        assert!(parse_message_page(Value::Null).messages.is_empty());

        let page = parse_message_page(json!([
            {"subject": "no id"},
            {"id": "ok", "confidence": "not a number"},
            {"id": "fine"}
        ]));
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].id, "fine");
        assert_eq!(page.messages[0].priority, DisplayPriority::NotImportant);
        assert_eq!(page.messages[0].context, DisplayContext::General);
    }

    #[test]
    fn parses_profile_bare_or_nested() {
        let nested = parse_profile(json!({
            "user": {"id": 7, "email": "me@example.com", "full_name": "Me", "gmail_connected": true}
        }))
        .expect("nested profile");
        assert_eq!(nested.user_id, "7");
        assert!(nested.gmail_connected);

        let bare = parse_profile(json!({"user_id": "u-1", "email": "me@example.com"}))
            .expect("bare profile");
        assert_eq!(bare.auth_method, "google");
        assert!(parse_profile(json!({"email": "missing-id@example.com"})).is_none());
    }

    #[test]
    fn rekeys_priority_distribution() {
        let snapshot: AnalyticsSnapshot = serde_json::from_value(json!({
            "priority_distribution": {"high": 3, "urgent": 1, "medium": 4, "low": 9, "unknown": 2},
            "insights": ["Most mail arrives on Mondays", {"title": "Focus", "description": "3 urgent threads"}]
        }))
        .expect("snapshot");

        assert_eq!(
            snapshot.display_priority_distribution(),
            [
                (DisplayPriority::VeryUrgent, 4),
                (DisplayPriority::Important, 4),
                (DisplayPriority::NotImportant, 11),
            ]
        );
        assert_eq!(snapshot.insights[1].text(), "Focus: 3 urgent threads");
    }
}
