//! Correction editor state machine.
//!
//! `EditorState` is the only writer of editor state. It moves between
//! "no selection" and "editing one pending record"; every reviewer
//! interaction is a method here and rendering reads it through
//! [`crate::view`].

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use tier5_schema::{Action, FieldOrigin, IntendedEntity, PendingRecord, Tool};

use crate::canonical::{self, LOOKUP_TITLE};
use crate::catalog::IntentOptions;
use crate::datetime::{self, DateTimeInputs};
use crate::entities::{self, DataStoreCache};
use crate::fields;
use crate::pending;
use crate::pronoun::{self, PronounOutcome};
use crate::registry;
use crate::values::{FieldMap, FieldValue};

// ============================================================
// Selection
// ============================================================

/// Editor state for the selected pending record.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub(crate) record: PendingRecord,
    pub(crate) tool: Tool,
    pub(crate) action: Action,
    pub(crate) fields: FieldMap,
    pub(crate) hidden: BTreeMap<String, String>,
    pub(crate) residual: Map<String, Value>,
    pub(crate) field_versions: BTreeMap<String, FieldOrigin>,
    pub(crate) intended_entities: Vec<IntendedEntity>,
    pub(crate) related_prompts: Vec<String>,
    pub(crate) datetime_inputs: BTreeMap<String, DateTimeInputs>,
    pub(crate) base: NaiveDateTime,
    // what the server snapshot produced, to tell reviewer changes apart
    initial_entities: Vec<IntendedEntity>,
    initial_related: Vec<String>,
}

impl Selection {
    pub fn record(&self) -> &PendingRecord {
        &self.record
    }

    pub fn prompt_id(&self) -> &str {
        &self.record.prompt_id
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn hidden(&self) -> &BTreeMap<String, String> {
        &self.hidden
    }

    /// Payload keys the editor does not model.
    pub fn residual(&self) -> &Map<String, Value> {
        &self.residual
    }

    pub fn field_versions(&self) -> &BTreeMap<String, FieldOrigin> {
        &self.field_versions
    }

    pub fn intended_entities(&self) -> &[IntendedEntity] {
        &self.intended_entities
    }

    pub fn related_prompts(&self) -> &[String] {
        &self.related_prompts
    }

    pub fn datetime_inputs(&self, field: &str) -> Option<&DateTimeInputs> {
        self.datetime_inputs.get(field)
    }

    pub fn base_date(&self) -> NaiveDateTime {
        self.base
    }

    pub fn visible_fields(&self) -> Vec<String> {
        fields::compute_field_list(self.tool, &self.action, &self.fields)
    }

    pub fn has_reviewer_edits(&self) -> bool {
        self.field_versions
            .values()
            .any(|origin| *origin == FieldOrigin::Reviewer)
    }

    fn mark_reviewer(&mut self, field: &str) {
        self.field_versions
            .insert(field.to_string(), FieldOrigin::Reviewer);
    }

    /// Adds working copies for visible date/time fields that lack one.
    fn sync_datetime_inputs(&mut self) {
        for field in self.visible_fields() {
            if let Some(config) = registry::date_time_field_config(&field) {
                let value = self.fields.get(&field);
                self.datetime_inputs
                    .entry(field)
                    .or_insert_with(|| DateTimeInputs::from_field_value(value, &config));
            }
        }
    }

    fn rebuild_datetime_input(&mut self, field: &str) {
        if let Some(config) = registry::date_time_field_config(field) {
            let inputs = DateTimeInputs::from_field_value(self.fields.get(field), &config);
            self.datetime_inputs.insert(field.to_string(), inputs);
        }
    }

    fn rebuild_all_datetime_inputs(&mut self) {
        self.datetime_inputs.clear();
        self.sync_datetime_inputs();
    }

    /// `hidden.lookup_title` when present, else the visible title.
    fn lookup_key(&self) -> Option<String> {
        self.hidden
            .get(LOOKUP_TITLE)
            .map(|title| title.trim())
            .filter(|title| !title.is_empty())
            .or_else(|| self.fields.text("title"))
            .map(str::to_string)
    }

    fn merge_keyword_probe(&mut self) {
        let Some(probe) = self.record.extras.keyword_probe.as_ref() else {
            return;
        };
        let matches: Vec<IntendedEntity> = probe
            .matches
            .iter()
            .filter(|entity| !entity.title.trim().is_empty())
            .cloned()
            .collect();
        if matches.is_empty()
            || !self.intended_entities.is_empty()
            || !registry::supports_intended_entities(self.tool, &self.action)
        {
            return;
        }

        if matches!(self.action, Action::Update | Action::Delete) {
            let first = &matches[0];
            if !self.fields.has_value("id") {
                if let Some(id) = first.id.as_deref().filter(|id| !id.trim().is_empty()) {
                    self.fields.insert("id", id.trim());
                }
            }
            if !self.fields.has_value("title") {
                self.fields.insert("title", first.title.trim());
            }
        }
        self.intended_entities = matches;
    }
}

/// Builds the editor state for a record. `keep` preserves a reviewer's
/// intent and action across refreshes.
fn build_selection(
    record: PendingRecord,
    cache: &DataStoreCache,
    now: NaiveDateTime,
    keep: Option<(Tool, Action)>,
) -> Selection {
    let record = pending::normalize_pending_record(record);
    let (tool, action) = keep.unwrap_or_else(|| {
        let tool = pending::resolve_intent(&record);
        let action =
            registry::canonical_action(tool, record.predicted_str("action").unwrap_or_default());
        (tool, action)
    });

    let payload = canonical::canonicalize(tool, &record.predicted_payload);
    let base = datetime::base_date_for(record.timestamp.as_deref(), now);

    let mut selection = Selection {
        tool,
        action,
        fields: payload.fields,
        hidden: payload.hidden,
        residual: payload.residual,
        field_versions: record.field_versions.clone(),
        intended_entities: record.intended_entities.clone(),
        related_prompts: record.related_prompts.clone(),
        datetime_inputs: BTreeMap::new(),
        base,
        initial_entities: Vec::new(),
        initial_related: Vec::new(),
        record,
    };

    let pronoun = if tool.data_store().is_some() {
        let title = selection.fields.text("title").map(str::to_string);
        let command_allowed = matches!(selection.action, Action::Update | Action::Delete);
        let outcome = pronoun::resolve_pronoun(
            title.as_deref(),
            if command_allowed {
                selection.record.user_text.as_str()
            } else {
                ""
            },
            &selection.related_prompts,
            &cache.id_titles(tool),
        );
        let stale_lookup = selection
            .hidden
            .get(LOOKUP_TITLE)
            .is_some_and(|lookup| pronoun::is_pronoun(lookup));
        match &outcome {
            PronounOutcome::Unchanged => {}
            PronounOutcome::Replaced { title } | PronounOutcome::Matched { title, .. } => {
                selection.fields.insert("title", title.clone());
                if stale_lookup {
                    selection.hidden.insert(LOOKUP_TITLE.to_string(), title.clone());
                }
            }
            PronounOutcome::Ambiguous => {
                selection.fields.remove("title");
                if stale_lookup {
                    selection.hidden.remove(LOOKUP_TITLE);
                }
            }
        }
        outcome
    } else {
        PronounOutcome::Unchanged
    };

    selection.merge_keyword_probe();

    if let PronounOutcome::Matched { id, title } = pronoun {
        if let Some(entity) = registry::entity_field_config(tool) {
            selection.fields.insert(entity.field, id);
        }
        selection.hidden.insert(LOOKUP_TITLE.to_string(), title);
    } else if registry::supports_title_lookup(tool, &selection.action)
        && !selection.fields.has_value("id")
    {
        if let Some(key) = selection.lookup_key() {
            entities::auto_select_id_for_title(&mut selection.fields, cache, tool, &key);
        }
    }

    selection.initial_entities = selection.intended_entities.clone();
    selection.initial_related = selection.related_prompts.clone();
    selection.sync_datetime_inputs();
    selection
}

// ============================================================
// Submit button
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLabel {
    Trigger,
    Correct,
}

impl ButtonLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger => "Trigger",
            Self::Correct => "Correct",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub enabled: bool,
    pub label: ButtonLabel,
    /// Required fields still empty, in display order.
    pub missing: Vec<String>,
    /// `calendar_edit.create` with neither start nor end.
    pub needs_schedule: bool,
}

// ============================================================
// Editor
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct EditorState {
    selection: Option<Selection>,
    catalog: IntentOptions,
    duplicate_confirmations: HashSet<String>,
}

impl EditorState {
    pub fn new(catalog: IntentOptions) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    pub fn catalog(&self) -> &IntentOptions {
        &self.catalog
    }

    pub fn set_catalog(&mut self, catalog: IntentOptions) {
        self.catalog = catalog;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_prompt_id(&self) -> Option<&str> {
        self.selection.as_ref().map(Selection::prompt_id)
    }

    /// `NoSelection -> Editing` (or switches records).
    pub fn select(&mut self, record: PendingRecord, cache: &DataStoreCache, now: NaiveDateTime) {
        let selection = build_selection(record, cache, now, None);
        tracing::debug!(
            prompt_id = %selection.prompt_id(),
            tool = %selection.tool,
            action = %selection.action,
            "selected pending prompt"
        );
        self.selection = Some(selection);
    }

    pub fn reset(&mut self) {
        self.selection = None;
    }

    /// Reviewer typed into a field. Returns `false` without a selection.
    pub fn apply_edit(&mut self, field: &str, value: &str, cache: &DataStoreCache) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        selection.fields.insert(field, value);
        selection.mark_reviewer(field);
        if registry::date_time_field_config(field).is_some() {
            selection.rebuild_datetime_input(field);
        }
        if field == "title" {
            self.refresh_duplicate_flag(cache);
        }
        true
    }

    /// Reviewer edited one of the split date/time controls. A typed `now`
    /// resolves against `now`.
    pub fn apply_date_time(
        &mut self,
        field: &str,
        date_value: &str,
        time_value: &str,
        now: NaiveDateTime,
    ) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        let Some(config) = registry::date_time_field_config(field) else {
            return false;
        };
        let required = fields::is_field_required(selection.tool, &selection.action, field);
        let inputs = selection
            .datetime_inputs
            .entry(field.to_string())
            .or_insert_with(|| DateTimeInputs {
                use_default_time: config.default_time.is_some(),
                ..Default::default()
            });
        inputs.date_value = date_value.to_string();
        inputs.time_value = time_value.to_string();
        let inputs = inputs.clone();

        datetime::apply_date_time_field_value(
            &mut selection.fields,
            field,
            &config,
            &inputs,
            required,
            selection.base,
            now.time(),
        );
        selection.mark_reviewer(field);
        true
    }

    pub fn set_use_default_time(&mut self, field: &str, enabled: bool, now: NaiveDateTime) -> bool {
        let Some((date, time)) = self
            .selection
            .as_mut()
            .and_then(|selection| selection.datetime_inputs.get_mut(field))
            .map(|inputs| {
                inputs.use_default_time = enabled;
                (inputs.date_value.clone(), inputs.time_value.clone())
            })
        else {
            return false;
        };
        self.apply_date_time(field, &date, &time, now)
    }

    /// Reviewer picked a different intent; the action resets to the first
    /// one offered for it.
    pub fn apply_intent(&mut self, tool: Tool, cache: &DataStoreCache) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        selection.tool = tool;
        selection.action = self
            .catalog
            .actions_for(tool)
            .first()
            .cloned()
            .unwrap_or_else(|| Action::parse(""));
        selection.sync_datetime_inputs();
        self.refresh_duplicate_flag(cache);
        true
    }

    pub fn apply_action(&mut self, raw: &str, cache: &DataStoreCache) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        selection.action = registry::canonical_action(selection.tool, raw);
        selection.sync_datetime_inputs();
        self.refresh_duplicate_flag(cache);
        true
    }

    /// Title chosen from the constrained title dropdown.
    pub fn select_title(&mut self, title: &str, cache: &DataStoreCache) -> usize {
        let Some(selection) = self.selection.as_mut() else {
            return 0;
        };
        let title = title.trim();
        selection.fields.insert("title", title);
        selection
            .hidden
            .insert(LOOKUP_TITLE.to_string(), title.to_string());
        selection.mark_reviewer("title");
        let matches =
            entities::auto_select_id_for_title(&mut selection.fields, cache, selection.tool, title);
        self.refresh_duplicate_flag(cache);
        matches
    }

    /// Entity chosen from the id select; its values are hydrated in.
    pub fn select_entity(&mut self, id: &str, cache: &DataStoreCache) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        let Some(entity) = registry::entity_field_config(selection.tool) else {
            return false;
        };
        selection.fields.insert(entity.field, id.trim());
        selection.mark_reviewer(entity.field);
        let hydrated = entities::hydrate_entity_selection(
            &mut selection.fields,
            &mut selection.hidden,
            cache,
            selection.tool,
            &selection.action,
            id,
        );
        if hydrated {
            selection.rebuild_all_datetime_inputs();
        }
        hydrated
    }

    pub fn add_intended_entity(&mut self, entity: IntendedEntity) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        if entity.title.trim().is_empty() || selection.intended_entities.contains(&entity) {
            return false;
        }
        selection.intended_entities.push(entity);
        true
    }

    pub fn remove_intended_entity(&mut self, index: usize) -> Option<IntendedEntity> {
        let selection = self.selection.as_mut()?;
        (index < selection.intended_entities.len())
            .then(|| selection.intended_entities.remove(index))
    }

    pub fn set_related_prompts(&mut self, prompts: Vec<String>) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        selection.related_prompts =
            pending::normalize_related_prompts(&selection.record.user_text, &prompts);
        true
    }

    /// Merges a refreshed copy of the selected record without discarding
    /// reviewer work. Returns `false` when `record` is not the selection.
    pub fn reconcile(&mut self, record: PendingRecord, cache: &DataStoreCache, now: NaiveDateTime) -> bool {
        let Some(current) = self.selection.as_mut() else {
            return false;
        };
        if current.record.prompt_id != record.prompt_id {
            return false;
        }

        let keep = Some((current.tool, current.action.clone()));
        let fresh = build_selection(record, cache, now, keep);

        if !current.has_reviewer_edits() {
            current.fields = fresh.fields;
            current.hidden = fresh.hidden;
            current.residual = fresh.residual;
            current.field_versions = fresh.field_versions;
            current.datetime_inputs = fresh.datetime_inputs;
        }
        if current.intended_entities == current.initial_entities {
            current.intended_entities = fresh.intended_entities;
        }
        if current.related_prompts == current.initial_related {
            current.related_prompts = fresh.related_prompts;
        }
        current.initial_entities = fresh.initial_entities;
        current.initial_related = fresh.initial_related;
        current.base = fresh.base;
        current.record = fresh.record;
        true
    }

    pub fn button_state(&self) -> ButtonState {
        let Some(selection) = self.selection.as_ref() else {
            return ButtonState {
                enabled: false,
                label: ButtonLabel::Correct,
                missing: Vec::new(),
                needs_schedule: false,
            };
        };
        let tool = selection.tool;
        let action = &selection.action;
        let label = if registry::is_mutating(action) {
            ButtonLabel::Trigger
        } else {
            ButtonLabel::Correct
        };

        let missing: Vec<String> = fields::required_field_list(tool, action, &selection.fields)
            .into_iter()
            .filter(|field| !selection.fields.has_value(field))
            .collect();
        let action_chosen = self.catalog.actions_for(tool).is_empty() || !action.is_empty();
        let needs_schedule = tool == Tool::CalendarEdit
            && *action == Action::Create
            && !selection.fields.has_value("start")
            && !selection.fields.has_value("end");

        ButtonState {
            enabled: action_chosen && missing.is_empty() && !needs_schedule,
            label,
            missing,
            needs_schedule,
        }
    }

    // ============================================================
    // Duplicate-title confirmations
    // ============================================================

    /// Whether the current `create` title already exists in the tool's store.
    pub fn is_duplicate_title(&self, cache: &DataStoreCache) -> bool {
        let Some(selection) = self.selection.as_ref() else {
            return false;
        };
        if selection.action != Action::Create {
            return false;
        }
        selection
            .fields
            .text("title")
            .is_some_and(|title| !entities::get_entities_matching_title(cache, selection.tool, title).is_empty())
    }

    pub fn duplicate_confirmed(&self, prompt_id: &str) -> bool {
        self.duplicate_confirmations.contains(prompt_id)
    }

    pub(crate) fn confirm_duplicate(&mut self, prompt_id: &str) {
        self.duplicate_confirmations.insert(prompt_id.to_string());
    }

    fn refresh_duplicate_flag(&mut self, cache: &DataStoreCache) {
        let Some(prompt_id) = self.selected_prompt_id().map(str::to_string) else {
            return;
        };
        if self.duplicate_confirmed(&prompt_id) && !self.is_duplicate_title(cache) {
            self.duplicate_confirmations.remove(&prompt_id);
        }
    }

    /// Drops every trace of a prompt that left the queue: its duplicate
    /// flag and, when selected, the selection itself.
    pub fn forget_prompt(&mut self, prompt_id: &str) {
        self.duplicate_confirmations.remove(prompt_id);
        if self.selected_prompt_id() == Some(prompt_id) {
            self.reset();
        }
    }

    /// Value of a field as shown to the reviewer.
    pub fn field_value(&self, field: &str) -> Option<&FieldValue> {
        self.selection.as_ref()?.fields.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use tier5_schema::{KeywordProbe, StoreEntities, TodoItem};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn record(id: &str, intent: &str, payload: serde_json::Value) -> PendingRecord {
        let mut record = PendingRecord::new(id, "utterance");
        record.intent = Some(intent.into());
        record.predicted_payload = payload.as_object().cloned().unwrap_or_default();
        record
    }

    fn todo_cache(items: &[(&str, &str)]) -> DataStoreCache {
        let mut cache = DataStoreCache::new();
        cache.replace(StoreEntities::Todos(
            items
                .iter()
                .map(|(id, title)| TodoItem {
                    id: id.to_string(),
                    title: title.to_string(),
                    ..Default::default()
                })
                .collect(),
        ));
        cache
    }

    #[test]
    fn edits_mark_reviewer_and_stay_reviewer() {
        let cache = DataStoreCache::new();
        let mut rec = record("1", "todo_list", json!({"action": "create", "title": "Buy milk"}));
        rec.field_versions.insert("title".into(), FieldOrigin::Parser);
        let mut editor = EditorState::default();
        editor.select(rec, &cache, now());

        assert!(editor.apply_edit("title", "Buy oat milk", &cache));
        editor.apply_action("update", &cache);
        editor.apply_edit("priority", "high", &cache);
        let versions = editor.selection().unwrap().field_versions();
        assert_eq!(versions.get("title"), Some(&FieldOrigin::Reviewer));
        assert_eq!(versions.get("priority"), Some(&FieldOrigin::Reviewer));
    }

    #[test]
    fn intent_change_resets_action_to_first_offered() {
        let cache = DataStoreCache::new();
        let mut editor = EditorState::default();
        editor.select(record("1", "weather", json!({"city": "Oslo"})), &cache, now());
        assert!(editor.apply_intent(Tool::KitchenTips, &cache));
        let selection = editor.selection().unwrap();
        assert_eq!(selection.tool(), Tool::KitchenTips);
        assert_eq!(selection.action(), &Action::List);
    }

    #[test]
    fn duplicate_flag_resets_on_intent_or_action_change() {
        let mut cache = DataStoreCache::new();
        cache.replace(StoreEntities::KitchenTips(vec![tier5_schema::KitchenTip {
            id: "1".into(),
            title: "Pesto".into(),
            ..Default::default()
        }]));
        let mut editor = EditorState::default();
        editor.select(
            record("1", "kitchen_tips", json!({"action": "create", "title": "Pesto"})),
            &cache,
            now(),
        );
        assert!(editor.is_duplicate_title(&cache));

        editor.confirm_duplicate("1");
        editor.apply_intent(Tool::TodoList, &cache);
        editor.apply_intent(Tool::KitchenTips, &cache);
        editor.apply_action("create", &cache);
        assert!(editor.is_duplicate_title(&cache));
        assert!(!editor.duplicate_confirmed("1"));

        editor.confirm_duplicate("1");
        editor.apply_action("find", &cache);
        assert!(!editor.duplicate_confirmed("1"));
    }

    #[test]
    fn button_requires_action_when_intent_offers_some() {
        let cache = DataStoreCache::new();
        let mut editor = EditorState::default();
        editor.select(record("1", "todo_list", json!({"title": "Buy milk"})), &cache, now());
        assert!(!editor.button_state().enabled);

        editor.apply_action("add", &cache);
        let state = editor.button_state();
        assert!(state.enabled);
        assert_eq!(state.label, ButtonLabel::Trigger);
    }

    #[test]
    fn missing_required_field_disables_button() {
        let cache = DataStoreCache::new();
        let mut editor = EditorState::default();
        editor.select(record("1", "kitchen_tips", json!({"action": "create", "title": "Pesto"})), &cache, now());
        let state = editor.button_state();
        assert!(!state.enabled);
        assert_eq!(state.missing, vec!["content"]);
    }

    #[test]
    fn keyword_probe_seeds_entities_and_first_match() {
        let cache = DataStoreCache::new();
        let mut rec = record("1", "todo_list", json!({"action": "delete"}));
        rec.extras.keyword_probe = Some(KeywordProbe {
            matches: vec![
                IntendedEntity::new(Some("4".into()), "Pay rent"),
                IntendedEntity::new(Some("5".into()), "Pay bills"),
            ],
            keywords: vec!["pay".into()],
        });
        let mut editor = EditorState::default();
        editor.select(rec, &cache, now());

        let selection = editor.selection().unwrap();
        assert_eq!(selection.intended_entities().len(), 2);
        assert_eq!(selection.fields().text("id"), Some("4"));
        assert_eq!(selection.fields().text("title"), Some("Pay rent"));
    }

    #[test]
    fn keyword_probe_ignored_when_parser_named_entities() {
        let cache = DataStoreCache::new();
        let mut rec = record("1", "todo_list", json!({"action": "find", "keywords": "rent"}));
        rec.intended_entities = vec![IntendedEntity::new(None, "Rent")];
        rec.extras.keyword_probe = Some(KeywordProbe {
            matches: vec![IntendedEntity::new(Some("4".into()), "Pay rent")],
            keywords: vec![],
        });
        let mut editor = EditorState::default();
        editor.select(rec, &cache, now());
        assert_eq!(
            editor.selection().unwrap().intended_entities(),
            &[IntendedEntity::new(None, "Rent")]
        );
    }

    #[test]
    fn select_title_sets_lookup_and_id() {
        let cache = todo_cache(&[("7", "Buy milk")]);
        let mut editor = EditorState::default();
        editor.select(record("1", "todo_list", json!({"action": "delete"})), &cache, now());

        assert_eq!(editor.select_title("Buy milk", &cache), 1);
        let selection = editor.selection().unwrap();
        assert_eq!(selection.fields().text("id"), Some("7"));
        assert_eq!(selection.hidden().get(LOOKUP_TITLE).map(String::as_str), Some("Buy milk"));
    }

    #[test]
    fn select_entity_hydrates_fields() {
        let mut cache = DataStoreCache::new();
        cache.replace(StoreEntities::Todos(vec![TodoItem {
            id: "3".into(),
            title: "File taxes".into(),
            deadline: Some("2025-04-15".into()),
            ..Default::default()
        }]));
        let mut editor = EditorState::default();
        editor.select(record("1", "todo_list", json!({"action": "update"})), &cache, now());

        assert!(editor.select_entity("3", &cache));
        let selection = editor.selection().unwrap();
        assert_eq!(selection.fields().text("title"), Some("File taxes"));
        assert_eq!(selection.fields().text("deadline"), Some("2025-04-15"));
        assert_eq!(
            selection.datetime_inputs("deadline").map(|i| i.date_value.as_str()),
            Some("2025-04-15")
        );
    }

    #[test]
    fn split_date_time_edit_writes_iso_value() {
        let cache = DataStoreCache::new();
        let mut editor = EditorState::default();
        editor.select(
            record("1", "calendar_edit", json!({"action": "create", "title": "Standup"})),
            &cache,
            now(),
        );
        assert!(editor.apply_date_time("start", "Tomorrow", "", now()));
        assert_eq!(
            editor.field_value("start").and_then(FieldValue::as_text),
            Some("2025-06-02T09:00")
        );
        assert!(editor.button_state().enabled);
    }

    #[test]
    fn reconcile_keeps_reviewer_edits() {
        let cache = DataStoreCache::new();
        let mut editor = EditorState::default();
        editor.select(record("1", "todo_list", json!({"action": "update", "title": "A"})), &cache, now());
        editor.apply_action("delete", &cache);
        editor.apply_edit("title", "Reviewer title", &cache);

        let mut refreshed = record("1", "todo_list", json!({"action": "update", "title": "Server title"}));
        refreshed.related_prompts = vec!["earlier prompt".into()];
        assert!(editor.reconcile(refreshed, &cache, now()));

        let selection = editor.selection().unwrap();
        assert_eq!(selection.fields().text("title"), Some("Reviewer title"));
        assert_eq!(selection.action(), &Action::Delete);
        assert_eq!(selection.related_prompts(), &["earlier prompt".to_string()]);
    }

    #[test]
    fn reconcile_adopts_server_fields_without_reviewer_edits() {
        let cache = DataStoreCache::new();
        let mut editor = EditorState::default();
        editor.select(record("1", "todo_list", json!({"action": "update", "title": "A"})), &cache, now());
        editor.add_intended_entity(IntendedEntity::new(None, "Chosen"));

        let mut refreshed = record("1", "todo_list", json!({"action": "update", "title": "B"}));
        refreshed.intended_entities = vec![IntendedEntity::new(None, "Server")];
        editor.reconcile(refreshed, &cache, now());

        let selection = editor.selection().unwrap();
        assert_eq!(selection.fields().text("title"), Some("B"));
        assert_eq!(selection.intended_entities(), &[IntendedEntity::new(None, "Chosen")]);
        assert!(!editor.reconcile(PendingRecord::new("2", "x"), &cache, now()));
    }

    #[test]
    fn forget_prompt_resets_selection_and_flag() {
        let cache = DataStoreCache::new();
        let mut editor = EditorState::default();
        editor.select(record("1", "todo_list", json!({})), &cache, now());
        editor.confirm_duplicate("1");
        editor.forget_prompt("1");
        assert!(editor.selection().is_none());
        assert!(!editor.duplicate_confirmed("1"));
    }
}
