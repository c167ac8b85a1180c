//! Live data-store entity types served under `/api/data/{store}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{id_string, null_default, opt_id, Tool};

/// Data store backing one CRUD tool.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStore {
    Todos,
    Calendar,
    KitchenTips,
    AppGuide,
}

impl DataStore {
    pub const ALL: [DataStore; 4] = [
        DataStore::Todos,
        DataStore::Calendar,
        DataStore::KitchenTips,
        DataStore::AppGuide,
    ];

    /// Path segment of `/api/data/{store}`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todos => "todos",
            Self::Calendar => "calendar",
            Self::KitchenTips => "kitchen_tips",
            Self::AppGuide => "app_guide",
        }
    }

    /// Key holding the entity list in the store response.
    pub fn collection_key(&self) -> &'static str {
        match self {
            Self::Todos => "todos",
            Self::Calendar => "events",
            Self::KitchenTips => "tips",
            Self::AppGuide => "sections",
        }
    }

    pub fn tool(&self) -> Tool {
        match self {
            Self::Todos => Tool::TodoList,
            Self::Calendar => Tool::CalendarEdit,
            Self::KitchenTips => Tool::KitchenTips,
            Self::AppGuide => Tool::AppGuide,
        }
    }

    /// Accepts store ids as well as tool names (`updated_stores` uses either).
    pub fn parse(raw: &str) -> Option<DataStore> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|store| {
            store.as_str().eq_ignore_ascii_case(raw)
                || store.collection_key().eq_ignore_ascii_case(raw)
                || store.tool().as_str().eq_ignore_ascii_case(raw)
        })
    }
}

impl fmt::Display for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KitchenTip {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, alias = "body")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteSection {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub parent_id: Option<String>,
}

/// One store's entity list, typed per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEntities {
    Todos(Vec<TodoItem>),
    Calendar(Vec<CalendarEvent>),
    KitchenTips(Vec<KitchenTip>),
    AppGuide(Vec<NoteSection>),
}

impl StoreEntities {
    pub fn empty(store: DataStore) -> Self {
        match store {
            DataStore::Todos => Self::Todos(Vec::new()),
            DataStore::Calendar => Self::Calendar(Vec::new()),
            DataStore::KitchenTips => Self::KitchenTips(Vec::new()),
            DataStore::AppGuide => Self::AppGuide(Vec::new()),
        }
    }

    /// Decodes a `/api/data/{store}` body; the list sits under the store's
    /// collection key, or the body is the bare list.
    pub fn from_response(store: DataStore, body: Value) -> serde_json::Result<Self> {
        let list = match body {
            Value::Object(mut map) => map
                .remove(store.collection_key())
                .unwrap_or(Value::Array(Vec::new())),
            Value::Null => Value::Array(Vec::new()),
            other => other,
        };
        Ok(match store {
            DataStore::Todos => Self::Todos(serde_json::from_value(list)?),
            DataStore::Calendar => Self::Calendar(serde_json::from_value(list)?),
            DataStore::KitchenTips => Self::KitchenTips(serde_json::from_value(list)?),
            DataStore::AppGuide => Self::AppGuide(serde_json::from_value(list)?),
        })
    }

    pub fn store(&self) -> DataStore {
        match self {
            Self::Todos(_) => DataStore::Todos,
            Self::Calendar(_) => DataStore::Calendar,
            Self::KitchenTips(_) => DataStore::KitchenTips,
            Self::AppGuide(_) => DataStore::AppGuide,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Todos(items) => items.len(),
            Self::Calendar(items) => items.len(),
            Self::KitchenTips(items) => items.len(),
            Self::AppGuide(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(id, title)` pairs in store order.
    pub fn id_titles(&self) -> Vec<(&str, &str)> {
        match self {
            Self::Todos(items) => items.iter().map(|e| (e.id.as_str(), e.title.as_str())).collect(),
            Self::Calendar(items) => items.iter().map(|e| (e.id.as_str(), e.title.as_str())).collect(),
            Self::KitchenTips(items) => items.iter().map(|e| (e.id.as_str(), e.title.as_str())).collect(),
            Self::AppGuide(items) => items.iter().map(|e| (e.id.as_str(), e.title.as_str())).collect(),
        }
    }
}
