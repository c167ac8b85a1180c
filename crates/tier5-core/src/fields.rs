//! Resolves which fields the editor shows for a (tool, action) and which
//! of them are required.

use tier5_schema::{Action, Tool};

use crate::registry;
use crate::values::FieldMap;

fn push_unique(list: &mut Vec<String>, field: &str) {
    if !list.iter().any(|existing| existing == field) {
        list.push(field.to_string());
    }
}

/// Ordered, deduplicated list of visible fields.
///
/// An action override is returned verbatim. Otherwise the list is the union
/// of the current field keys, the tool's extra/required fields, whitelist
/// keys and the entity field, ordered by `FIELD_ORDER` and then by arrival.
pub fn compute_field_list(tool: Tool, action: &Action, fields: &FieldMap) -> Vec<String> {
    if let Some(config) = registry::action_field_config(tool, action) {
        let mut list = Vec::with_capacity(config.fields.len());
        for field in config.fields {
            push_unique(&mut list, field);
        }
        return list;
    }

    let mut union: Vec<String> = Vec::new();
    for key in fields.keys() {
        push_unique(&mut union, key);
    }
    for field in registry::extra_fields(tool) {
        push_unique(&mut union, field);
    }
    for field in registry::required_fields(tool) {
        push_unique(&mut union, field);
    }
    if let Some(paths) = registry::field_whitelist(tool) {
        for path in paths {
            push_unique(&mut union, &registry::whitelist_field_key(path));
        }
    }
    if let Some(entity) = registry::entity_field_config(tool) {
        push_unique(&mut union, entity.field);
    }

    let mut ordered: Vec<String> = registry::FIELD_ORDER
        .iter()
        .filter(|field| union.iter().any(|key| key == *field))
        .map(|field| field.to_string())
        .collect();
    for key in &union {
        push_unique(&mut ordered, key);
    }

    if tool == Tool::CalendarEdit {
        sort_calendar(&mut ordered);
    }
    ordered
}

fn calendar_rank(field: &str) -> usize {
    let overflow = registry::CALENDAR_FIELD_ORDER.len();
    registry::CALENDAR_FIELD_ORDER
        .iter()
        .position(|name| *name == field)
        .or_else(|| {
            registry::FIELD_ORDER
                .iter()
                .position(|name| *name == field)
                .map(|index| overflow + index)
        })
        .unwrap_or(usize::MAX)
}

fn sort_calendar(list: &mut [String]) {
    // stable: unknown keys keep their arrival order at the tail
    list.sort_by_key(|field| calendar_rank(field));
}

/// Whether `field` must hold a value before submission.
pub fn is_field_required(tool: Tool, action: &Action, field: &str) -> bool {
    if let Some(config) = registry::action_field_config(tool, action) {
        return config.required.contains(&field);
    }
    if !registry::required_fields(tool).contains(&field) {
        return false;
    }
    let suppressed = match tool {
        Tool::TodoList | Tool::CalendarEdit => *action == Action::List,
        Tool::KitchenTips | Tool::AppGuide => *action == Action::Create,
        _ => false,
    };
    !suppressed
}

/// Required fields among the visible list, in list order.
pub fn required_field_list(tool: Tool, action: &Action, fields: &FieldMap) -> Vec<String> {
    let visible = compute_field_list(tool, action, fields);
    let mut required: Vec<String> = visible
        .into_iter()
        .filter(|field| is_field_required(tool, action, field))
        .collect();
    if let Some(config) = registry::action_field_config(tool, action) {
        for field in config.required {
            push_unique(&mut required, field);
        }
    }
    required
}
