//! Priority and context vocabularies.
//!
//! The backend speaks `high|medium|low` and `work|personal|general`; the
//! dashboard speaks `very_urgent|important|not_important` and a wider set of
//! contexts. Mapping into the display vocabulary is total: unknown values
//! fall back silently instead of erroring.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPriority {
    VeryUrgent,
    Important,
    NotImportant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayContext {
    Business,
    Personal,
    Education,
    Social,
    Promotions,
    General,
}

/// Contexts the feedback endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendContext {
    Business,
    Personal,
    General,
}

pub fn priority_to_display(backend_value: &str) -> DisplayPriority {
    match normalize_key(backend_value).as_str() {
        "high" | "urgent" | "very_urgent" => DisplayPriority::VeryUrgent,
        "medium" | "important" => DisplayPriority::Important,
        "low" | "normal" | "not_important" => DisplayPriority::NotImportant,
        _ => DisplayPriority::NotImportant,
    }
}

pub fn priority_to_backend(display_value: DisplayPriority) -> BackendPriority {
    match display_value {
        DisplayPriority::VeryUrgent => BackendPriority::High,
        DisplayPriority::Important => BackendPriority::Medium,
        DisplayPriority::NotImportant => BackendPriority::Low,
    }
}

pub fn context_to_display(backend_value: &str) -> DisplayContext {
    match normalize_key(backend_value).as_str() {
        "business" | "work" => DisplayContext::Business,
        "education" | "learning" => DisplayContext::Education,
        "personal" => DisplayContext::Personal,
        "social" | "networking" => DisplayContext::Social,
        "promotions" | "marketing" | "commercial" => DisplayContext::Promotions,
        _ => DisplayContext::General,
    }
}

/// Same as [`context_to_display`] for fields the backend may omit.
pub fn optional_context_to_display(backend_value: Option<&str>) -> DisplayContext {
    backend_value.map_or(DisplayContext::General, context_to_display)
}

/// Context value to send with a feedback correction, if the backend accepts it.
pub fn feedback_context(display_value: DisplayContext) -> Option<BackendContext> {
    match display_value {
        DisplayContext::Business => Some(BackendContext::Business),
        DisplayContext::Personal => Some(BackendContext::Personal),
        DisplayContext::General => Some(BackendContext::General),
        DisplayContext::Education | DisplayContext::Social | DisplayContext::Promotions => None,
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

impl DisplayPriority {
    pub const ALL: [DisplayPriority; 3] = [
        DisplayPriority::VeryUrgent,
        DisplayPriority::Important,
        DisplayPriority::NotImportant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayPriority::VeryUrgent => "very_urgent",
            DisplayPriority::Important => "important",
            DisplayPriority::NotImportant => "not_important",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayPriority::VeryUrgent => "Very Urgent",
            DisplayPriority::Important => "Important",
            DisplayPriority::NotImportant => "Not Important",
        }
    }

    /// Higher is more severe.
    pub fn severity(self) -> u8 {
        match self {
            DisplayPriority::VeryUrgent => 2,
            DisplayPriority::Important => 1,
            DisplayPriority::NotImportant => 0,
        }
    }
}

impl BackendPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendPriority::High => "high",
            BackendPriority::Medium => "medium",
            BackendPriority::Low => "low",
        }
    }
}

impl DisplayContext {
    pub const ALL: [DisplayContext; 6] = [
        DisplayContext::Business,
        DisplayContext::Personal,
        DisplayContext::Education,
        DisplayContext::Social,
        DisplayContext::Promotions,
        DisplayContext::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayContext::Business => "business",
            DisplayContext::Personal => "personal",
            DisplayContext::Education => "education",
            DisplayContext::Social => "social",
            DisplayContext::Promotions => "promotions",
            DisplayContext::General => "general",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayContext::Business => "Business",
            DisplayContext::Personal => "Personal",
            DisplayContext::Education => "Education",
            DisplayContext::Social => "Social",
            DisplayContext::Promotions => "Promotions",
            DisplayContext::General => "General",
        }
    }
}

impl BackendContext {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendContext::Business => "business",
            BackendContext::Personal => "personal",
            BackendContext::General => "general",
        }
    }
}

impl fmt::Display for DisplayPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DisplayContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Strict parsing for user input. Backend data goes through the total
// `*_to_display` functions instead.
impl FromStr for DisplayPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayPriority::ALL
            .into_iter()
            .find(|value| value.as_str() == normalize_key(s))
            .ok_or_else(|| {
                format!("unknown priority `{s}`; expected very_urgent, important or not_important")
            })
    }
}

impl FromStr for DisplayContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayContext::ALL
            .into_iter()
            .find(|value| value.as_str() == normalize_key(s))
            .ok_or_else(|| {
                format!(
                    "unknown context `{s}`; expected business, personal, education, social, promotions or general"
                )
            })
    }
}
