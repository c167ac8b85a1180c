//! Turns the editor state into a `POST /api/logs/label` body.

use serde_json::{Map, Value};
use tier5_schema::{Action, LabelRequest, Tool};

use crate::canonical::LOOKUP_TITLE;
use crate::editor::{EditorState, Selection};
use crate::entities::DataStoreCache;
use crate::registry;
use crate::values::FieldValue;

pub const DUPLICATE_PENDING_MESSAGE: &str = "Duplicate will only be added to training data";
pub const DUPLICATE_ADDED_MESSAGE: &str = "Duplicate added to training data";

/// Result of pressing the submit button. Only `Ready` leads to a POST.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    NothingSelected,
    /// Button was disabled; lists the required fields still empty.
    MissingRequired { fields: Vec<String> },
    /// First click on a duplicate `create` title; the flag is now set.
    DuplicatePending { prompt_id: String },
    Ready(Box<LabelRequest>),
}

/// Validates, runs the duplicate-title gate and assembles the request.
pub fn prepare_submission(editor: &mut EditorState, cache: &DataStoreCache) -> SubmitOutcome {
    let Some(selection) = editor.selection() else {
        return SubmitOutcome::NothingSelected;
    };
    let prompt_id = selection.prompt_id().to_string();

    let button = editor.button_state();
    if !button.enabled {
        let mut fields = button.missing;
        if button.needs_schedule {
            fields.push("start".to_string());
        }
        return SubmitOutcome::MissingRequired { fields };
    }

    let mut training_duplicate = None;
    if editor.is_duplicate_title(cache) {
        if !editor.duplicate_confirmed(&prompt_id) {
            editor.confirm_duplicate(&prompt_id);
            tracing::info!(prompt_id = %prompt_id, "duplicate title held for confirmation");
            return SubmitOutcome::DuplicatePending { prompt_id };
        }
        training_duplicate = Some(true);
    }

    let Some(selection) = editor.selection() else {
        return SubmitOutcome::NothingSelected;
    };
    let mut request = build_label_request(selection);
    request.training_duplicate = training_duplicate;
    SubmitOutcome::Ready(Box::new(request))
}

fn parser_intent(selection: &Selection) -> String {
    let record = selection.record();
    record
        .intent
        .as_deref()
        .map(str::trim)
        .filter(|intent| !intent.is_empty())
        .or_else(|| record.predicted_str("intent"))
        .or(record.tool_name.as_deref())
        .unwrap_or(Tool::NluFallback.as_str())
        .to_string()
}

fn field_json(field: &str, value: &FieldValue) -> Option<Value> {
    match value {
        FieldValue::Weather(time) => (!time.is_empty()).then(|| value.to_json()),
        FieldValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            if field == "tags" {
                let tags: Vec<Value> = trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(|tag| Value::String(tag.to_string()))
                    .collect();
                return Some(Value::Array(tags));
            }
            Some(Value::String(trimmed.to_string()))
        }
    }
}

/// The corrected payload for the current selection.
pub fn build_corrected_payload(selection: &Selection) -> Map<String, Value> {
    let tool = selection.tool();
    let action = selection.action();
    let mut payload = Map::new();

    for (field, value) in selection.fields().iter() {
        if let Some(json) = field_json(field, value) {
            payload.insert(field.to_string(), json);
        }
    }

    if !action.is_empty() {
        payload.insert("action".into(), Value::String(action.as_str().to_string()));
    }

    let mut hidden = selection.hidden().clone();
    if registry::supports_title_lookup(tool, action) && !payload.contains_key("id") {
        if let Some(Value::String(title)) = payload.get("title") {
            hidden
                .entry(LOOKUP_TITLE.to_string())
                .or_insert_with(|| title.clone());
        }
    }
    for (key, value) in hidden {
        if !value.trim().is_empty() && !payload.contains_key(&key) {
            payload.insert(key, Value::String(value));
        }
    }

    if tool == Tool::CalendarEdit && *action == Action::Create && !payload.contains_key("start") {
        if let Some(end) = payload.get("end").cloned() {
            payload.insert("start".into(), end);
        }
    }

    payload.insert("intent".into(), Value::String(tool.as_str().to_string()));
    payload.insert(
        "related_prompts".into(),
        Value::Array(
            selection
                .related_prompts()
                .iter()
                .map(|prompt| Value::String(prompt.clone()))
                .collect(),
        ),
    );
    if registry::supports_intended_entities(tool, action) {
        payload.insert(
            "intended_entities".into(),
            serde_json::to_value(selection.intended_entities()).unwrap_or_else(|_| Value::Array(Vec::new())),
        );
    }
    payload
}

pub fn build_label_request(selection: &Selection) -> LabelRequest {
    let record = selection.record();
    let action = selection.action();
    LabelRequest {
        prompt_id: record.prompt_id.clone(),
        prompt_text: record.user_text.clone(),
        tool: selection.tool().as_str().to_string(),
        parser_intent: parser_intent(selection),
        reviewer_intent: selection.tool().as_str().to_string(),
        action: (!action.is_empty()).then(|| action.as_str().to_string()),
        predicted_payload: record.predicted_payload.clone(),
        corrected_payload: build_corrected_payload(selection),
        training_duplicate: None,
    }
}

/// Prompts that leave the queue after a successful submission: the
/// submitted one and any whose utterance equals a submitted related prompt.
pub fn prompts_resolved_by<'a>(
    request: &LabelRequest,
    queue: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Vec<String> {
    let related: Vec<&str> = request
        .corrected_payload
        .get("related_prompts")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    queue
        .into_iter()
        .filter(|(prompt_id, user_text)| {
            *prompt_id == request.prompt_id || related.contains(user_text)
        })
        .map(|(prompt_id, _)| prompt_id.to_string())
        .collect()
}
