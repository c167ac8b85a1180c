//! Async runtime driving the correction editor against the review service.
//!
//! `Console` owns the editor state, the data-store cache and the local
//! persistence file. Every public entry point swallows its own errors: a
//! failure is logged, surfaced as a `ConsoleEvent::Toast` and the console
//! stays usable.

pub mod chat;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;
use tier5_bus::BusPublisher;
use tier5_client::{ApiError, ReviewApi};
use tier5_core::submit::{self, DUPLICATE_ADDED_MESSAGE, DUPLICATE_PENDING_MESSAGE};
use tier5_core::{
    project, ConsoleConfig, DataStoreCache, EditorState, EditorView, IntentOptions, SubmitOutcome,
};
use tier5_schema::{
    ConsoleEvent, CorrectedRecord, DataStore, PendingRecord, StatsSummary, ToastLevel,
};
use tier5_store::LocalStore;
use tokio::time::{interval, Duration, MissedTickBehavior};

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub struct Console {
    api: Arc<dyn ReviewApi>,
    config: ConsoleConfig,
    bus: BusPublisher,
    store: LocalStore,
    editor: EditorState,
    cache: DataStoreCache,
    queue: Vec<PendingRecord>,
    page: u32,
    has_more: bool,
    summary: Value,
    stats: Option<StatsSummary>,
    corrected: Vec<CorrectedRecord>,
    classifier: Value,
    submitting: bool,
    clock: fn() -> NaiveDateTime,
}

impl Console {
    pub fn new(api: Arc<dyn ReviewApi>, config: ConsoleConfig, bus: BusPublisher) -> Self {
        let store = LocalStore::open(&config.storage.path);
        let page = store.pending_page();
        Self {
            api,
            config,
            bus,
            store,
            editor: EditorState::default(),
            cache: DataStoreCache::new(),
            queue: Vec::new(),
            page,
            has_more: false,
            summary: Value::Null,
            stats: None,
            corrected: Vec::new(),
            classifier: Value::Null,
            submitting: false,
            clock: local_now,
        }
    }

    /// Replaces the wall clock used to resolve relative dates.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    // ============================================================
    // Read access
    // ============================================================

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn cache(&self) -> &DataStoreCache {
        &self.cache
    }

    pub fn queue(&self) -> &[PendingRecord] {
        &self.queue
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn summary(&self) -> &Value {
        &self.summary
    }

    pub fn stats(&self) -> Option<&StatsSummary> {
        self.stats.as_ref()
    }

    pub fn corrected(&self) -> &[CorrectedRecord] {
        &self.corrected
    }

    pub fn classifier(&self) -> &Value {
        &self.classifier
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn local_store(&self) -> &LocalStore {
        &self.store
    }

    pub fn storage_path(&self) -> &Path {
        self.store.path()
    }

    pub fn view(&self) -> Option<EditorView> {
        project(&self.editor, &self.cache)
    }

    /// Runs a reviewer interaction against the editor with the current cache.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut EditorState, &DataStoreCache) -> R) -> R {
        f(&mut self.editor, &self.cache)
    }

    // ============================================================
    // Loading
    // ============================================================

    /// Initial load: catalog, every data store, the queue (restoring the
    /// persisted selection), corrected log, stats and classifier log.
    pub async fn start(&mut self) {
        self.load_intents().await;
        self.refresh_stores(&DataStore::ALL).await;
        self.load_pending(true).await;
        self.load_corrected().await;
        self.load_stats().await;
        self.load_classifier().await;
    }

    pub async fn load_intents(&mut self) {
        match self.api.intents().await {
            Ok(catalog) => {
                self.editor.set_catalog(IntentOptions::from_catalog(&catalog));
                tracing::debug!(intents = catalog.intents.len(), "loaded intent catalog");
            }
            Err(e) => self.report(e, "Failed to load intents").await,
        }
    }

    pub async fn refresh_store(&mut self, store: DataStore) {
        self.refresh_stores(&[store]).await;
    }

    pub async fn refresh_stores(&mut self, stores: &[DataStore]) {
        let mut refreshed = Vec::new();
        for store in stores {
            match self.api.data_store(*store).await {
                Ok(entities) => {
                    tracing::debug!(store = %store, count = entities.len(), "refreshed data store");
                    self.cache.replace(entities);
                    refreshed.push(store.as_str().to_string());
                }
                Err(e) => self.report(e, &format!("Failed to load {store}")).await,
            }
        }
        if !refreshed.is_empty() {
            self.publish(ConsoleEvent::StoresRefreshed { stores: refreshed }).await;
        }
    }

    /// Re-fetches the current pending page. With `preserve_selection` a
    /// selected prompt that is still queued keeps its reviewer edits.
    pub async fn load_pending(&mut self, preserve_selection: bool) {
        let limit = self.config.pending.page_size;
        let page = match self.api.pending(self.page, limit).await {
            Ok(page) => page,
            Err(e) => {
                self.report(e, "Failed to load pending prompts").await;
                return;
            }
        };

        let mut items = page.items;
        if items.is_empty() && self.page <= 1 {
            items = self.cold_start_sample().await;
        }
        self.queue = items;
        self.has_more = page.has_more;
        self.summary = page.summary;

        self.sync_selection(preserve_selection).await;
        self.publish(ConsoleEvent::PendingRefreshed {
            count: self.queue.len(),
            page: self.page,
            has_more: self.has_more,
        })
        .await;
    }

    async fn cold_start_sample(&mut self) -> Vec<PendingRecord> {
        match self.api.stats().await {
            Ok(stats) => {
                let sample = stats.pending_sample.clone();
                if !sample.is_empty() {
                    tracing::info!(count = sample.len(), "seeding pending queue from stats sample");
                }
                self.stats = Some(stats);
                sample
            }
            Err(e) => {
                tracing::warn!("stats unavailable for cold start: {e}");
                Vec::new()
            }
        }
    }

    async fn sync_selection(&mut self, preserve_selection: bool) {
        let now = (self.clock)();
        let before = self.editor.selected_prompt_id().map(str::to_string);

        match before.as_deref() {
            Some(selected) => {
                let fresh = self.queued(selected).cloned();
                match fresh {
                    Some(record) if preserve_selection => {
                        self.editor.reconcile(record, &self.cache, now);
                    }
                    Some(record) => self.editor.select(record, &self.cache, now),
                    None => self.editor.reset(),
                }
            }
            None => {
                let restored = self
                    .store
                    .selected_prompt()
                    .and_then(|id| self.queued(&id).cloned());
                if let Some(record) = restored {
                    self.editor.select(record, &self.cache, now);
                }
            }
        }

        let after = self.editor.selected_prompt_id().map(str::to_string);
        if after != before {
            self.selection_changed(after).await;
        }
    }

    fn queued(&self, prompt_id: &str) -> Option<&PendingRecord> {
        self.queue.iter().find(|record| record.prompt_id == prompt_id)
    }

    pub async fn load_corrected(&mut self) {
        match self.api.corrected(self.config.corrected.limit).await {
            Ok(records) => self.corrected = records,
            Err(e) => self.report(e, "Failed to load corrected log").await,
        }
    }

    pub async fn load_stats(&mut self) {
        match self.api.stats().await {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => self.report(e, "Failed to load stats").await,
        }
    }

    pub async fn load_classifier(&mut self) {
        match self.api.classifier().await {
            Ok(body) => self.classifier = body,
            Err(e) => self.report(e, "Failed to load classifier log").await,
        }
    }

    // ============================================================
    // Selection & paging
    // ============================================================

    /// Selects a queued prompt. Returns `false` when it is not in the queue.
    pub async fn select(&mut self, prompt_id: &str) -> bool {
        let Some(record) = self.queued(prompt_id).cloned() else {
            return false;
        };
        self.editor.select(record, &self.cache, (self.clock)());
        self.selection_changed(Some(prompt_id.to_string())).await;
        true
    }

    pub async fn reset_selection(&mut self) {
        if self.editor.selection().is_some() {
            self.editor.reset();
            self.selection_changed(None).await;
        }
    }

    async fn selection_changed(&mut self, prompt_id: Option<String>) {
        self.store.set_selected_prompt(prompt_id.as_deref()).await;
        self.publish(ConsoleEvent::SelectionChanged { prompt_id }).await;
    }

    pub async fn next_page(&mut self) -> bool {
        if !self.has_more {
            return false;
        }
        self.set_page(self.page + 1).await;
        true
    }

    pub async fn prev_page(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.set_page(self.page - 1).await;
        true
    }

    async fn set_page(&mut self, page: u32) {
        self.page = page;
        self.store.set_pending_page(page).await;
        self.load_pending(true).await;
    }

    pub async fn set_active_tab(&mut self, store: DataStore) {
        self.store.set_data_active_tab(store).await;
        self.refresh_store(store).await;
    }

    // ============================================================
    // Submission
    // ============================================================

    /// Presses the correct/trigger button. Returns `true` when a correction
    /// was accepted by the service.
    pub async fn submit(&mut self) -> bool {
        if self.submitting {
            tracing::debug!("submission already in flight");
            return false;
        }

        let request = match submit::prepare_submission(&mut self.editor, &self.cache) {
            SubmitOutcome::NothingSelected => return false,
            SubmitOutcome::MissingRequired { fields } => {
                self.toast(
                    ToastLevel::Warning,
                    format!("Missing required fields: {}", fields.join(", ")),
                )
                .await;
                return false;
            }
            SubmitOutcome::DuplicatePending { .. } => {
                self.toast(ToastLevel::Info, DUPLICATE_PENDING_MESSAGE).await;
                return false;
            }
            SubmitOutcome::Ready(request) => request,
        };

        self.submitting = true;
        let result = self.api.label(&request).await;
        self.submitting = false;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.report(e, "Failed to submit correction").await;
                return false;
            }
        };

        let resolved = submit::prompts_resolved_by(
            &request,
            self.queue
                .iter()
                .map(|record| (record.prompt_id.as_str(), record.user_text.as_str())),
        );
        let selected_before = self.editor.selected_prompt_id().map(str::to_string);
        self.queue.retain(|record| !resolved.contains(&record.prompt_id));
        for prompt_id in &resolved {
            self.editor.forget_prompt(prompt_id);
        }
        if selected_before.is_some() && self.editor.selection().is_none() {
            self.selection_changed(None).await;
        }
        tracing::info!(
            prompt_id = %request.prompt_id,
            removed = resolved.len(),
            "correction submitted"
        );

        if !response.record.is_null() {
            self.store.set_latest_confirmed(&response.record).await;
        }

        let training_duplicate = request.training_duplicate.unwrap_or(false);
        let message = if training_duplicate {
            DUPLICATE_ADDED_MESSAGE
        } else {
            "Correction saved"
        };
        self.toast(ToastLevel::Success, message).await;
        self.publish(ConsoleEvent::CorrectionSubmitted {
            prompt_id: request.prompt_id.clone(),
            training_duplicate,
        })
        .await;

        let mut stores: Vec<DataStore> = response
            .updated_stores
            .iter()
            .filter_map(|raw| DataStore::parse(raw))
            .collect();
        stores.sort();
        stores.dedup();
        self.refresh_stores(&stores).await;
        self.load_pending(true).await;
        self.load_corrected().await;
        self.load_stats().await;
        true
    }

    // ============================================================
    // Deletion
    // ============================================================

    pub async fn delete_pending(&mut self, prompt_id: &str) -> bool {
        if let Err(e) = self.api.delete_pending(prompt_id).await {
            self.report(e, "Failed to delete pending prompt").await;
            return false;
        }
        let was_selected = self.editor.selected_prompt_id() == Some(prompt_id);
        self.queue.retain(|record| record.prompt_id != prompt_id);
        self.editor.forget_prompt(prompt_id);
        if was_selected {
            self.selection_changed(None).await;
        }
        self.toast(ToastLevel::Success, "Pending prompt deleted").await;
        self.load_pending(true).await;
        true
    }

    pub async fn delete_corrected(&mut self, record_id: &str) -> bool {
        if let Err(e) = self.api.delete_corrected(record_id).await {
            self.report(e, "Failed to delete corrected record").await;
            return false;
        }
        self.toast(ToastLevel::Success, "Corrected record deleted").await;
        self.load_corrected().await;
        true
    }

    // ============================================================
    // Background refresh
    // ============================================================

    /// One background refresh: the pending queue and the active data tab.
    pub async fn tick(&mut self) {
        self.load_pending(true).await;
        if let Some(store) = self.store.data_active_tab() {
            self.refresh_store(store).await;
        }
    }

    /// Refreshes on the configured interval until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = Duration::from_secs(self.config.pending.refresh_interval_secs.max(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = &mut shutdown => {
                    tracing::info!("refresh loop stopped");
                    break;
                }
            }
        }
    }

    // ============================================================
    // Notifications
    // ============================================================

    async fn publish(&self, event: ConsoleEvent) {
        let _ = self.bus.publish(event).await;
    }

    async fn toast(&self, level: ToastLevel, message: impl Into<String>) {
        self.publish(ConsoleEvent::toast(level, message)).await;
    }

    /// Logs and surfaces an API failure. A 401 drops the reviewer identity
    /// and asks the chrome to log in again.
    async fn report(&self, err: ApiError, context: &str) {
        tracing::warn!(kind = err.kind.as_str(), "{context}: {err}");
        if err.is_unauthorized() {
            self.api.set_reviewer(None);
            self.publish(ConsoleEvent::ReloginRequired).await;
            return;
        }
        self.toast(ToastLevel::Error, format!("{context}: {}", err.detail))
            .await;
    }
}
