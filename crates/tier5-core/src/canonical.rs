//! Maps an opaque parser payload onto flat editor state for one tool.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tier5_schema::Tool;

use crate::registry;
use crate::values::FieldMap;

pub const LOOKUP_TITLE: &str = "lookup_title";

/// Canonicalized payload: visible fields, hidden fields, and keys the
/// editor does not know about (never rendered, never submitted).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalPayload {
    pub fields: FieldMap,
    pub hidden: BTreeMap<String, String>,
    pub residual: Map<String, Value>,
}

/// Total function from `(tool, payload)` to editor state. Unknown shapes
/// degrade to their string rendering.
pub fn canonicalize(tool: Tool, payload: &Map<String, Value>) -> CanonicalPayload {
    match registry::field_whitelist(tool) {
        Some(whitelist) => canonicalize_whitelisted(tool, whitelist, payload),
        None => canonicalize_walk(tool, payload),
    }
}

fn is_envelope_key(key: &str) -> bool {
    matches!(key, "intent" | "action")
}

fn canonicalize_whitelisted(
    tool: Tool,
    whitelist: &[&str],
    payload: &Map<String, Value>,
) -> CanonicalPayload {
    let mut out = CanonicalPayload::default();
    for path in whitelist {
        let Some(value) = lookup_path(payload, path) else {
            continue;
        };
        let rendered = if tool == Tool::Weather && *path == "time" {
            match value {
                Value::Object(obj) => render_weather_time(obj),
                other => stringify(other, false),
            }
        } else {
            stringify(value, false)
        };
        if let Some(text) = rendered {
            out.fields.insert(registry::whitelist_field_key(path), text);
        }
    }

    for (key, value) in payload {
        let top_level_listed = whitelist
            .iter()
            .any(|path| path.split('.').next() == Some(key.as_str()));
        if !is_envelope_key(key) && !top_level_listed {
            out.residual.insert(key.clone(), value.clone());
        }
    }
    out
}

fn lookup_path<'a>(payload: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = payload.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

/// `"<day> hour <H> minute <M> <raw>"`, keeping only the present parts.
fn render_weather_time(obj: &Map<String, Value>) -> Option<String> {
    let component = |key: &str| obj.get(key).and_then(|value| stringify(value, false));

    let mut parts = Vec::new();
    if let Some(day) = component("day") {
        parts.push(day);
    }
    if let Some(hour) = component("hour") {
        parts.push(format!("hour {hour}"));
    }
    if let Some(minute) = component("minute") {
        parts.push(format!("minute {minute}"));
    }
    if let Some(raw) = component("raw") {
        parts.push(raw);
    }

    if !parts.is_empty() {
        return Some(parts.join(" "));
    }
    if obj.is_empty() {
        None
    } else {
        Some(Value::Object(obj.clone()).to_string())
    }
}

fn canonicalize_walk(tool: Tool, payload: &Map<String, Value>) -> CanonicalPayload {
    let mut out = CanonicalPayload::default();
    let has_new_title = payload
        .get("new_title")
        .and_then(|value| stringify(value, false))
        .is_some();

    for (key, value) in payload {
        if is_envelope_key(key) {
            continue;
        }
        let joined = stringify(value, registry::preserves_spacing(key));

        match key.as_str() {
            "id" => {
                if let Some(id) = joined {
                    out.fields.insert("id", id);
                }
            }
            "section_id" | "tip_id" => {
                if let Some(id) = joined {
                    if !out.fields.has_value("id") {
                        out.fields.insert("id", id);
                    }
                }
            }
            "target_title" => {
                if let Some(title) = joined {
                    if !out.fields.has_value("title") {
                        out.fields.insert("title", title.clone());
                    }
                    out.hidden.insert(LOOKUP_TITLE.to_string(), title);
                }
            }
            "lookup_title" | "title_lookup" => {
                if let Some(title) = joined {
                    out.hidden.insert(LOOKUP_TITLE.to_string(), title);
                }
            }
            "new_title" => {
                if let Some(title) = joined {
                    out.fields.insert("title", title);
                }
            }
            "title" if has_new_title => {
                // the plain title names the entity being renamed
                if let Some(title) = joined {
                    out.hidden
                        .entry(LOOKUP_TITLE.to_string())
                        .or_insert(title);
                }
            }
            "notes" if tool == Tool::CalendarEdit => {
                if let Some(notes) = joined {
                    out.fields.insert("notes", notes);
                }
            }
            "body" | "notes" | "notes_append" => {
                if let Some(content) = stringify(value, true) {
                    if !out.fields.has_value("content") {
                        out.fields.insert("content", content);
                    }
                }
            }
            "content" => {
                if let Some(content) = stringify(value, true) {
                    out.fields.insert("content", content);
                }
            }
            "tags" | "query" => {
                if let Some(keywords) = joined {
                    if !out.fields.has_value("keywords") {
                        out.fields.insert("keywords", keywords);
                    }
                }
            }
            other if is_field_for(tool, other) => {
                if let Some(text) = joined {
                    out.fields.insert(other, text);
                }
            }
            other => {
                out.residual.insert(other.to_string(), value.clone());
            }
        }
    }
    out
}

fn is_field_for(tool: Tool, key: &str) -> bool {
    registry::FIELD_ORDER.contains(&key)
        || registry::extra_fields(tool).contains(&key)
        || registry::required_fields(tool).contains(&key)
}

/// Flattens a JSON value to editor text. Arrays join with `", "` (or
/// newlines), objects JSON-stringify, empty values produce nothing.
pub fn stringify(value: &Value, join_with_newline: bool) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => {
            if join_with_newline {
                s.clone()
            } else {
                s.trim().to_string()
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| stringify(item, false))
                .collect();
            parts.join(if join_with_newline { "\n" } else { ", " })
        }
        Value::Object(_) => value.to_string(),
    };
    (!text.trim().is_empty()).then_some(text)
}
