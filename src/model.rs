use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vocab::{DisplayContext, DisplayPriority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    Gmail,
    Whatsapp,
}

impl MessageSource {
    /// Lenient mapping for backend values; anything unrecognised came from gmail sync.
    pub fn from_backend(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("whatsapp") => MessageSource::Whatsapp,
            _ => MessageSource::Gmail,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageSource::Gmail => "gmail",
            MessageSource::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmail" => Ok(MessageSource::Gmail),
            "whatsapp" => Ok(MessageSource::Whatsapp),
            _ => Err(format!("unknown source `{s}`; expected gmail or whatsapp")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub preview: String,
    pub timestamp: DateTime<Utc>,
    pub source: MessageSource,
    pub priority: DisplayPriority,
    pub context: DisplayContext,
    /// Percentage in `[0, 100]`.
    pub confidence: f64,
    pub is_read: bool,
}

/// Scale a backend confidence to a percentage. Fractions in `[0, 1]` are
/// treated as probabilities.
pub fn confidence_percent(raw: Option<f64>) -> f64 {
    let Some(value) = raw.filter(|value| value.is_finite()) else {
        return 0.0;
    };

    let scaled = if (0.0..=1.0).contains(&value) {
        value * 100.0
    } else {
        value
    };
    scaled.clamp(0.0, 100.0)
}

/// Short sender label: the display name when present, otherwise the address domain.
pub fn display_sender(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "(unknown sender)".to_string();
    }

    if let Some((name, rest)) = raw.split_once('<') {
        let name = name.trim().trim_matches('"').trim();
        if !name.is_empty() {
            return name.to_string();
        }
        return address_domain(rest.trim_end_matches('>'));
    }

    address_domain(raw)
}

fn address_domain(address: &str) -> String {
    let address = address.trim();
    match address.rsplit_once('@') {
        Some((_, domain)) if !domain.is_empty() => domain.to_string(),
        _ => address.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_fractional_confidence() {
        assert_eq!(confidence_percent(Some(0.25)), 25.0);
        assert_eq!(confidence_percent(Some(92.5)), 92.5);
        assert_eq!(confidence_percent(Some(140.0)), 100.0);
        assert_eq!(confidence_percent(Some(-3.0)), 0.0);
        assert_eq!(confidence_percent(None), 0.0);
        assert_eq!(confidence_percent(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn sender_prefers_display_name() {
        assert_eq!(display_sender("Jane Doe <jane@example.com>"), "Jane Doe");
        assert_eq!(display_sender("\"Billing\" <billing@acme.io>"), "Billing");
    }

    #[test]
    fn sender_falls_back_to_domain() {
        assert_eq!(display_sender("alerts@github.com"), "github.com");
        assert_eq!(display_sender("<noreply@linkedin.com>"), "linkedin.com");
        assert_eq!(display_sender(""), "(unknown sender)");
    }

    #[test]
    fn unknown_sources_are_gmail() {
        assert_eq!(MessageSource::from_backend(Some("WhatsApp")), MessageSource::Whatsapp);
        assert_eq!(MessageSource::from_backend(Some("sms")), MessageSource::Gmail);
        assert_eq!(MessageSource::from_backend(None), MessageSource::Gmail);
    }
}
