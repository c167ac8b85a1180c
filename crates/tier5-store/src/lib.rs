//! Local persistence for console UI state.
//!
//! A single JSON object on disk, one entry per `tier5_*` key. Writes are
//! lossy: a failed write is logged and dropped, and entries that no longer
//! decode are treated as absent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tier5_schema::{ChatExchange, DataStore};
use uuid::Uuid;

pub mod keys {
    pub const ACTIVE_PAGE: &str = "tier5_active_page";
    pub const PENDING_PAGE: &str = "tier5_pending_page";
    pub const CHAT_HISTORY: &str = "tier5_chat_history";
    pub const LATEST_CONFIRMED: &str = "tier5_latest_confirmed";
    pub const SELECTED_PROMPT: &str = "tier5_selected_prompt";
    pub const DATA_ACTIVE_TAB: &str = "tier5_data_active_tab";
    pub const DATA_SELECTED_ROWS: &str = "tier5_data_selected_rows";
    pub const CHAT_OFFLINE_QUEUE: &str = "tier5_chat_offline_queue";
    pub const VOICE_OFFLINE_ATTEMPTS: &str = "tier5_voice_offline_attempts";
    pub const LAST_PURGE_ALERT_SIGNATURE: &str = "tier5_last_purge_alert_signature";
    pub const LAST_TRAINING_ALERT_COUNT: &str = "tier5_last_training_alert_count";
}

pub const CHAT_HISTORY_LIMIT: usize = 10;

/// Chat prompt waiting for connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedChat {
    pub id: Uuid,
    pub message: String,
    #[serde(default)]
    pub conversation_entry_id: Option<String>,
    pub queued_at: DateTime<Utc>,
}

impl QueuedChat {
    pub fn new(message: impl Into<String>, conversation_entry_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            conversation_entry_id,
            queued_at: Utc::now(),
        }
    }
}

pub struct LocalStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl LocalStore {
    /// Opens the store; a missing or unreadable file starts empty.
    pub fn open(path: &Path) -> Self {
        let entries = match Self::load(path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable local state: {e}");
                Map::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    fn load(path: &Path) -> Result<Map<String, Value>> {
        if !path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!(key, "ignoring corrupt local entry: {e}");
                None
            }
        }
    }

    /// Primitive entries may have been written as strings or numbers.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.entries.get(key)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub async fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.insert(key.to_string(), value);
                self.persist_lossy().await;
            }
            Err(e) => tracing::warn!(key, "dropping unserializable local entry: {e}"),
        }
    }

    pub async fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.persist_lossy().await;
        }
    }

    async fn persist_lossy(&self) {
        if let Err(e) = self.persist().await {
            tracing::warn!(path = %self.path.display(), "failed to persist local state: {e}");
        }
    }

    async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    // ============================================================
    // Typed accessors
    // ============================================================

    pub fn selected_prompt(&self) -> Option<String> {
        self.get_string(keys::SELECTED_PROMPT)
            .filter(|id| !id.trim().is_empty())
    }

    pub async fn set_selected_prompt(&mut self, prompt_id: Option<&str>) {
        match prompt_id {
            Some(id) => self.set(keys::SELECTED_PROMPT, &id).await,
            None => self.remove(keys::SELECTED_PROMPT).await,
        }
    }

    /// 1-based pending page; defaults to the first page.
    pub fn pending_page(&self) -> u32 {
        self.get_string(keys::PENDING_PAGE)
            .and_then(|raw| raw.trim().parse().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1)
    }

    pub async fn set_pending_page(&mut self, page: u32) {
        self.set(keys::PENDING_PAGE, &page).await;
    }

    pub fn active_page(&self) -> Option<String> {
        self.get_string(keys::ACTIVE_PAGE)
    }

    pub async fn set_active_page(&mut self, page: &str) {
        self.set(keys::ACTIVE_PAGE, &page).await;
    }

    pub fn chat_history(&self) -> Vec<ChatExchange> {
        self.get(keys::CHAT_HISTORY).unwrap_or_default()
    }

    /// Appends an exchange, keeping the most recent ten.
    pub async fn push_chat_exchange(&mut self, exchange: ChatExchange) {
        let mut history = self.chat_history();
        history.push(exchange);
        if history.len() > CHAT_HISTORY_LIMIT {
            let overflow = history.len() - CHAT_HISTORY_LIMIT;
            history.drain(..overflow);
        }
        self.set(keys::CHAT_HISTORY, &history).await;
    }

    pub fn latest_confirmed(&self) -> Option<Value> {
        self.entries
            .get(keys::LATEST_CONFIRMED)
            .filter(|value| !value.is_null())
            .cloned()
    }

    pub async fn set_latest_confirmed(&mut self, record: &Value) {
        self.set(keys::LATEST_CONFIRMED, record).await;
    }

    pub fn chat_offline_queue(&self) -> Vec<QueuedChat> {
        self.get(keys::CHAT_OFFLINE_QUEUE).unwrap_or_default()
    }

    pub async fn set_chat_offline_queue(&mut self, queue: &[QueuedChat]) {
        if queue.is_empty() {
            self.remove(keys::CHAT_OFFLINE_QUEUE).await;
        } else {
            self.set(keys::CHAT_OFFLINE_QUEUE, &queue).await;
        }
    }

    pub fn data_active_tab(&self) -> Option<DataStore> {
        self.get_string(keys::DATA_ACTIVE_TAB)
            .and_then(|raw| DataStore::parse(&raw))
    }

    pub async fn set_data_active_tab(&mut self, store: DataStore) {
        self.set(keys::DATA_ACTIVE_TAB, &store.as_str()).await;
    }

    /// Selected row id per data tab.
    pub fn data_selected_rows(&self) -> HashMap<String, String> {
        self.get(keys::DATA_SELECTED_ROWS).unwrap_or_default()
    }

    pub async fn set_data_selected_row(&mut self, store: DataStore, row_id: Option<&str>) {
        let mut rows = self.data_selected_rows();
        match row_id {
            Some(id) => {
                rows.insert(store.as_str().to_string(), id.to_string());
            }
            None => {
                rows.remove(store.as_str());
            }
        }
        self.set(keys::DATA_SELECTED_ROWS, &rows).await;
    }

    pub fn voice_offline_attempts(&self) -> u32 {
        self.get_string(keys::VOICE_OFFLINE_ATTEMPTS)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    pub async fn set_voice_offline_attempts(&mut self, attempts: u32) {
        self.set(keys::VOICE_OFFLINE_ATTEMPTS, &attempts).await;
    }

    pub fn last_purge_alert_signature(&self) -> Option<String> {
        self.get_string(keys::LAST_PURGE_ALERT_SIGNATURE)
    }

    pub async fn set_last_purge_alert_signature(&mut self, signature: &str) {
        self.set(keys::LAST_PURGE_ALERT_SIGNATURE, &signature).await;
    }

    pub fn last_training_alert_count(&self) -> Option<u64> {
        self.get_string(keys::LAST_TRAINING_ALERT_COUNT)
            .and_then(|raw| raw.parse().ok())
    }

    pub async fn set_last_training_alert_count(&mut self, count: u64) {
        self.set(keys::LAST_TRAINING_ALERT_COUNT, &count).await;
    }
}
