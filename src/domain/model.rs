use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// When Typefully should publish a new draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDate {
    NextFreeSlot,
    At(DateTime<Utc>),
}

impl ScheduleDate {
    pub fn to_wire(&self) -> String {
        match self {
            ScheduleDate::NextFreeSlot => "next-free-slot".to_string(),
            ScheduleDate::At(at) => at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl fmt::Display for ScheduleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl Serialize for ScheduleDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

/// Request body of `POST /drafts/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewDraft {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threadify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share: Option<bool>,
    #[serde(rename = "schedule-date", skip_serializing_if = "Option::is_none")]
    pub schedule_date: Option<ScheduleDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_retweet_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_plug_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_tweets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Draft {
    /// First line of the text, cut to `max_chars`.
    pub fn preview(&self, max_chars: usize) -> String {
        let text = self.text.as_deref().unwrap_or("");
        let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
        truncate_chars(first_line, max_chars)
    }

    /// The most relevant date for the draft's current state.
    pub fn display_date(&self) -> Option<&str> {
        self.published_on
            .as_deref()
            .or(self.scheduled_date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Notification {
    pub fn summary(&self, max_chars: usize) -> String {
        let Some(payload) = &self.payload else {
            return String::new();
        };
        let text = ["message", "title", "text", "action"]
            .iter()
            .find_map(|key| payload.get(key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string());
        truncate_chars(text.trim(), max_chars)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ContentFilter {
    Threads,
    Tweets,
}

impl ContentFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFilter::Threads => "threads",
            ContentFilter::Tweets => "tweets",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Inbox,
    Activity,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Inbox => "inbox",
            NotificationKind::Activity => "activity",
        }
    }
}

/// List endpoints answer either with a bare array or with the array wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Plain(Vec<T>),
    Wrapped {
        #[serde(alias = "drafts", alias = "notifications")]
        results: Vec<T>,
    },
}

impl<T> ListResponse<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Plain(items) => items,
            ListResponse::Wrapped { results } => results,
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for id, got {}",
            other
        ))),
    }
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}
