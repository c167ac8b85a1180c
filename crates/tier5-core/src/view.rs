//! Pure projection of the editor state into something a front-end paints.

use tier5_schema::{Action, FieldOrigin, IntendedEntity, Tool};

use crate::datetime::{self, DATE_LABELS};
use crate::editor::{ButtonState, EditorState, Selection};
use crate::entities::{self, DataStoreCache, EntityOption};
use crate::fields;
use crate::registry::{self, ControlKind, GridPlacement, SelectOption};
use crate::values::FieldValue;

#[derive(Debug, Clone, PartialEq)]
pub enum CellControl {
    Text,
    TextArea,
    Select(&'static [SelectOption]),
    /// Constrained dropdown over store titles.
    TitleSelect(Vec<String>),
    /// Free text with store titles offered as suggestions.
    TitleSuggest(Vec<String>),
    EntitySelect(Vec<EntityOption>),
    Date { suggestions: Vec<&'static str> },
    /// Slot labels with the clock value each one fills in.
    Time { suggestions: Vec<(&'static str, String)> },
    /// Unsplit date/time wrapper holding both controls.
    DateTime {
        date_value: String,
        time_value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldCell {
    /// Grid cell key (`start__date` for split controls, else the field).
    pub cell: String,
    pub field: String,
    pub label: String,
    pub control: CellControl,
    pub value: String,
    pub required: bool,
    pub missing: bool,
    pub origin: Option<FieldOrigin>,
    pub placement: Option<GridPlacement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorView {
    pub prompt_id: String,
    pub user_text: String,
    pub intent: Tool,
    pub intents: Vec<(Tool, &'static str)>,
    pub actions: Vec<String>,
    pub selected_action: String,
    pub cells: Vec<FieldCell>,
    /// `None` when the (tool, action) has no chip row.
    pub chips: Option<Vec<IntendedEntity>>,
    pub related_prompts: Vec<String>,
    pub button: ButtonState,
    pub duplicate_pending: bool,
}

fn display_value(value: Option<&FieldValue>) -> String {
    match value {
        Some(FieldValue::Text(text)) => text.clone(),
        Some(FieldValue::Weather(time)) => time.raw.clone(),
        None => String::new(),
    }
}

fn title_control(selection: &Selection, cache: &DataStoreCache) -> Option<CellControl> {
    let tool = selection.tool();
    let action = selection.action();
    if !registry::uses_title_select(tool, action) {
        return None;
    }
    let titles = entities::get_title_options(cache, tool)
        .into_iter()
        .map(|(value, _)| value)
        .collect();
    // update keeps free text so renames stay possible
    Some(match action {
        Action::Update => CellControl::TitleSuggest(titles),
        _ => CellControl::TitleSelect(titles),
    })
}

fn cells_for(selection: &Selection, cache: &DataStoreCache) -> Vec<FieldCell> {
    let tool = selection.tool();
    let action = selection.action();
    let entity_field = registry::entity_field_config(tool).map(|config| config.field);
    let mut cells = Vec::new();

    for field in fields::compute_field_list(tool, action, selection.fields()) {
        let spec = registry::field_spec(&field);
        let required = fields::is_field_required(tool, action, &field);
        let value = selection.fields().get(&field);
        let missing = required && !value.is_some_and(|value| !value.is_blank());
        let origin = selection.field_versions().get(&field).copied();

        let make = |cell: String, label: String, control: CellControl, value: String| FieldCell {
            placement: registry::placement_for(tool, action, &cell),
            cell,
            field: field.clone(),
            label,
            control,
            value,
            required,
            missing,
            origin,
        };

        if let Some(config) = registry::date_time_field_config(&field) {
            let inputs = selection.datetime_inputs(&field).cloned().unwrap_or_default();
            if config.split {
                cells.push(make(
                    format!("{field}__date"),
                    format!("{} Date", spec.label),
                    CellControl::Date {
                        suggestions: DATE_LABELS.to_vec(),
                    },
                    inputs.date_value,
                ));
                if config.include_time {
                    cells.push(make(
                        format!("{field}__time"),
                        format!("{} Time", spec.label),
                        CellControl::Time {
                            suggestions: datetime::time_slot_values(selection.base_date().time()),
                        },
                        inputs.time_value,
                    ));
                }
            } else {
                cells.push(make(
                    field.clone(),
                    spec.label.clone(),
                    CellControl::DateTime {
                        date_value: inputs.date_value,
                        time_value: inputs.time_value,
                    },
                    display_value(value),
                ));
            }
            continue;
        }

        let special = if field == "title" {
            title_control(selection, cache)
        } else if Some(field.as_str()) == entity_field {
            Some(CellControl::EntitySelect(entities::get_entity_options(cache, tool)))
        } else {
            None
        };
        let control = special.unwrap_or(match spec.control {
            ControlKind::Text => CellControl::Text,
            ControlKind::TextArea => CellControl::TextArea,
            ControlKind::Select(options) => CellControl::Select(options),
        });
        cells.push(make(field.clone(), spec.label.clone(), control, display_value(value)));
    }
    cells
}

/// Snapshot of everything the editor panel shows; `None` without a selection.
pub fn project(editor: &EditorState, cache: &DataStoreCache) -> Option<EditorView> {
    let selection = editor.selection()?;
    let tool = selection.tool();
    let action = selection.action();

    Some(EditorView {
        prompt_id: selection.prompt_id().to_string(),
        user_text: selection.record().user_text.clone(),
        intent: tool,
        intents: editor
            .catalog()
            .intents()
            .iter()
            .map(|tool| (*tool, tool.label()))
            .collect(),
        actions: editor
            .catalog()
            .actions_for(tool)
            .iter()
            .map(|action| action.as_str().to_string())
            .collect(),
        selected_action: action.as_str().to_string(),
        cells: cells_for(selection, cache),
        chips: registry::supports_intended_entities(tool, action)
            .then(|| selection.intended_entities().to_vec()),
        related_prompts: selection.related_prompts().to_vec(),
        button: editor.button_state(),
        duplicate_pending: editor.duplicate_confirmed(selection.prompt_id()),
    })
}
