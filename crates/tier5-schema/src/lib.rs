pub mod entities;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub use entities::*;

/// A named assistant capability with its own payload schema.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    TodoList,
    CalendarEdit,
    KitchenTips,
    AppGuide,
    Weather,
    News,
    NluFallback,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::TodoList,
        Tool::CalendarEdit,
        Tool::KitchenTips,
        Tool::AppGuide,
        Tool::Weather,
        Tool::News,
        Tool::NluFallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TodoList => "todo_list",
            Self::CalendarEdit => "calendar_edit",
            Self::KitchenTips => "kitchen_tips",
            Self::AppGuide => "app_guide",
            Self::Weather => "weather",
            Self::News => "news",
            Self::NluFallback => "nlu_fallback",
        }
    }

    pub fn parse(raw: &str) -> Option<Tool> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str().eq_ignore_ascii_case(raw))
    }

    /// Human label shown in the intent dropdown.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TodoList => "Todo tool",
            Self::CalendarEdit => "Calendar tool",
            Self::KitchenTips => "Kitchen tips tool",
            Self::AppGuide => "Notes tool",
            Self::Weather => "Weather tool",
            Self::News => "News tool",
            Self::NluFallback => "LLM fallback",
        }
    }

    /// CRUD tools are backed by a data store.
    pub fn data_store(&self) -> Option<DataStore> {
        match self {
            Self::TodoList => Some(DataStore::Todos),
            Self::CalendarEdit => Some(DataStore::Calendar),
            Self::KitchenTips => Some(DataStore::KitchenTips),
            Self::AppGuide => Some(DataStore::AppGuide),
            Self::Weather | Self::News | Self::NluFallback => None,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool action. Unknown verbs (e.g. `lookup` for weather) are kept verbatim.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    List,
    Find,
    Create,
    Update,
    Delete,
    Other(String),
}

impl Action {
    pub const STANDARD: [Action; 5] = [
        Action::List,
        Action::Find,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    pub fn parse(raw: &str) -> Action {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "list" => Self::List,
            "find" => Self::Find,
            "create" => Self::Create,
            "update" => Self::Update,
            "delete" => Self::Delete,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::List => "list",
            Self::Find => "find",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Other(raw) if raw.is_empty())
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        Action::parse(&value)
    }
}

impl From<Action> for String {
    fn from(value: Action) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field provenance tag.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOrigin {
    Parser,
    Reviewer,
}

/// An `{id, title}` the parser or the reviewer asserts the user referred to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntendedEntity {
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
}

impl IntendedEntity {
    pub fn new(id: Option<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordProbe {
    #[serde(default, deserialize_with = "null_default")]
    pub matches: Vec<IntendedEntity>,
    #[serde(default, deserialize_with = "null_default")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingExtras {
    #[serde(default, deserialize_with = "null_default")]
    pub conversation_history: Vec<Value>,
    #[serde(default)]
    pub keyword_probe: Option<KeywordProbe>,
    #[serde(default, deserialize_with = "opt_id")]
    pub conversation_entry_id: Option<String>,
    #[serde(default)]
    pub invocation_source: Option<String>,
}

/// A machine-predicted tool invocation awaiting reviewer confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRecord {
    #[serde(deserialize_with = "id_string")]
    pub prompt_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user_text: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub predicted_payload: Map<String, Value>,
    #[serde(default, deserialize_with = "null_default")]
    pub related_prompts: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub intended_entities: Vec<IntendedEntity>,
    #[serde(default, deserialize_with = "null_default")]
    pub field_versions: BTreeMap<String, FieldOrigin>,
    #[serde(default, deserialize_with = "null_default")]
    pub extras: PendingExtras,
    #[serde(default, deserialize_with = "opt_id")]
    pub conversation_entry_id: Option<String>,
}

impl PendingRecord {
    pub fn new(prompt_id: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            user_text: user_text.into(),
            intent: None,
            reason: None,
            confidence: None,
            timestamp: None,
            tool_name: None,
            predicted_payload: Map::new(),
            related_prompts: Vec::new(),
            intended_entities: Vec::new(),
            field_versions: BTreeMap::new(),
            extras: PendingExtras::default(),
            conversation_entry_id: None,
        }
    }

    /// String value of a predicted payload key, if it is a non-empty string.
    pub fn predicted_str(&self, key: &str) -> Option<&str> {
        self.predicted_payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ============================================================
// HTTP wire types
// ============================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingPage {
    #[serde(default, deserialize_with = "null_default")]
    pub items: Vec<PendingRecord>,
    #[serde(default)]
    pub summary: Value,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentCatalog {
    #[serde(default, deserialize_with = "null_default")]
    pub intents: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub intent_actions: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSummary {
    #[serde(default, deserialize_with = "null_default")]
    pub pending_sample: Vec<PendingRecord>,
    #[serde(flatten)]
    pub counts: Map<String, Value>,
}

/// Body of `POST /api/logs/label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRequest {
    pub prompt_id: String,
    pub prompt_text: String,
    pub tool: String,
    pub parser_intent: String,
    pub reviewer_intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub predicted_payload: Map<String, Value>,
    pub corrected_payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_duplicate: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelResponse {
    #[serde(default)]
    pub record: Value,
    #[serde(default, deserialize_with = "null_default")]
    pub updated_stores: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedRecord {
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id")]
    pub prompt_id: Option<String>,
    #[serde(default)]
    pub prompt_text: Option<String>,
    #[serde(default)]
    pub reviewer_intent: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub corrected_payload: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_entry_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One prompt/reply pair kept in the local chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub prompt: String,
    pub reply: String,
    pub at: DateTime<Utc>,
}

// ============================================================
// Console events
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Notifications emitted by the console runtime for whatever chrome is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConsoleEvent {
    Toast {
        level: ToastLevel,
        message: String,
    },
    ReloginRequired,
    PendingRefreshed {
        count: usize,
        page: u32,
        has_more: bool,
    },
    SelectionChanged {
        prompt_id: Option<String>,
    },
    StoresRefreshed {
        stores: Vec<String>,
    },
    CorrectionSubmitted {
        prompt_id: String,
        training_duplicate: bool,
    },
    ChatQueuedOffline {
        queued: usize,
    },
}

impl ConsoleEvent {
    pub fn toast(level: ToastLevel, message: impl Into<String>) -> Self {
        Self::Toast {
            level,
            message: message.into(),
        }
    }
}

// ============================================================
// Lenient deserializers
// ============================================================

/// Treats `null` as the type's default.
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Accepts string or numeric identifiers.
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Accepts string, numeric or missing identifiers; blank strings become `None`.
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(Value::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_parse_roundtrips_wire_names() {
        for tool in Tool::ALL {
            assert_eq!(Tool::parse(tool.as_str()), Some(tool));
            let json = serde_json::to_value(tool).unwrap();
            assert_eq!(json, Value::String(tool.as_str().to_string()));
        }
        assert_eq!(Tool::parse(" Kitchen_Tips "), Some(Tool::KitchenTips));
        assert_eq!(Tool::parse("shopping"), None);
    }

    #[test]
    fn action_keeps_unknown_verbs() {
        assert_eq!(Action::parse("UPDATE"), Action::Update);
        assert_eq!(Action::parse("lookup"), Action::Other("lookup".into()));
        assert!(Action::Delete.is_mutating());
        assert!(!Action::Find.is_mutating());
        assert!(!Action::Other("upsert".into()).is_mutating());

        let parsed: Action = serde_json::from_str("\"Create\"").unwrap();
        assert_eq!(parsed, Action::Create);
        assert_eq!(serde_json::to_string(&Action::Find).unwrap(), "\"find\"");
    }

    #[test]
    fn pending_record_tolerates_numeric_ids_and_nulls() {
        let raw = serde_json::json!({
            "prompt_id": 42,
            "user_text": "add milk",
            "predicted_payload": null,
            "related_prompts": null,
            "intended_entities": [{"id": 7, "title": "Buy milk"}, {"title": "Eggs"}],
            "field_versions": {"title": "parser"},
            "extras": {"keyword_probe": {"matches": [{"id": "3", "title": "Pesto"}]}}
        });

        let record: PendingRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.prompt_id, "42");
        assert!(record.predicted_payload.is_empty());
        assert!(record.related_prompts.is_empty());
        assert_eq!(record.intended_entities[0].id.as_deref(), Some("7"));
        assert_eq!(record.intended_entities[1].id, None);
        assert_eq!(record.field_versions.get("title"), Some(&FieldOrigin::Parser));
        let probe = record.extras.keyword_probe.unwrap();
        assert_eq!(probe.matches[0].title, "Pesto");
    }

    #[test]
    fn label_request_omits_absent_duplicate_flag() {
        let request = LabelRequest {
            prompt_id: "p1".into(),
            prompt_text: "find pasta".into(),
            tool: "kitchen_tips".into(),
            parser_intent: "kitchen_tips".into(),
            reviewer_intent: "kitchen_tips".into(),
            action: Some("find".into()),
            predicted_payload: Map::new(),
            corrected_payload: Map::new(),
            training_duplicate: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("training_duplicate").is_none());
        assert_eq!(json["action"], "find");
    }

    #[test]
    fn stats_summary_keeps_counts_beside_sample() {
        let raw = serde_json::json!({
            "pending": 3,
            "corrected": 10,
            "pending_sample": [{"prompt_id": "a", "user_text": "hi"}]
        });
        let stats: StatsSummary = serde_json::from_value(raw).unwrap();
        assert_eq!(stats.pending_sample.len(), 1);
        assert_eq!(stats.counts["pending"], 3);
        assert!(!stats.counts.contains_key("pending_sample"));
    }
}
