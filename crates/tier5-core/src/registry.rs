//! Static declarative tables describing every tool's editor schema.
//!
//! Nothing here holds state; every other module asks these tables which
//! fields exist, which are required, which controls to render and how the
//! grid is laid out.

use tier5_schema::{Action, DataStore, Tool};

// ============================================================
// Field library
// ============================================================

/// Canonical display order for keys not overridden by tool-specific layouts.
pub const FIELD_ORDER: &[&str] = &[
    "id",
    "title",
    "content",
    "keywords",
    "status",
    "priority",
    "deadline",
    "start",
    "end",
    "start_time",
    "end_time",
    "location",
    "link",
    "notes",
    "city",
    "time",
    "topic",
    "language",
    "region",
    "source_name",
];

/// Calendar overrides the generic order.
pub const CALENDAR_FIELD_ORDER: &[&str] = &[
    "title",
    "start",
    "end",
    "link",
    "location",
    "start_time",
    "end_time",
    "id",
    "notes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub const STATUS_OPTIONS: &[SelectOption] = &[
    SelectOption { value: "pending", label: "Pending" },
    SelectOption { value: "pushed", label: "Pushed" },
    SelectOption { value: "completed", label: "Completed" },
];

pub const PRIORITY_OPTIONS: &[SelectOption] = &[
    SelectOption { value: "", label: "None" },
    SelectOption { value: "low", label: "Low" },
    SelectOption { value: "medium", label: "Medium" },
    SelectOption { value: "high", label: "High" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    TextArea,
    Select(&'static [SelectOption]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub control: ControlKind,
}

/// Label and control factory for a field. Unknown fields become text inputs
/// labelled from their key.
pub fn field_spec(field: &str) -> FieldSpec {
    let (label, control) = match field {
        "id" => ("ID", ControlKind::Text),
        "title" => ("Title", ControlKind::Text),
        "content" => ("Content", ControlKind::TextArea),
        "keywords" => ("Keywords", ControlKind::Text),
        "status" => ("Status", ControlKind::Select(STATUS_OPTIONS)),
        "priority" => ("Priority", ControlKind::Select(PRIORITY_OPTIONS)),
        "deadline" => ("Deadline", ControlKind::Text),
        "start" => ("Start", ControlKind::Text),
        "end" => ("End", ControlKind::Text),
        "start_time" => ("Start time", ControlKind::Text),
        "end_time" => ("End time", ControlKind::Text),
        "location" => ("Location", ControlKind::Text),
        "link" => ("Link", ControlKind::Text),
        "notes" => ("Notes", ControlKind::TextArea),
        "city" => ("City", ControlKind::Text),
        "time" => ("Time", ControlKind::Text),
        "topic" => ("Topic", ControlKind::Text),
        "language" => ("Language", ControlKind::Text),
        "region" => ("Region", ControlKind::Text),
        "source_name" => ("Source", ControlKind::Text),
        other => {
            return FieldSpec {
                name: other.to_string(),
                label: humanize(other),
                control: ControlKind::Text,
            }
        }
    };
    FieldSpec {
        name: field.to_string(),
        label: label.to_string(),
        control,
    }
}

fn humanize(key: &str) -> String {
    let spaced = key.replace(['_', '.'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Fields whose string value keeps its inner whitespace and joins lists with newlines.
pub fn preserves_spacing(field: &str) -> bool {
    matches!(field, "content" | "notes")
}

// ============================================================
// Actions
// ============================================================

/// Canonical action order per tool.
pub fn default_intent_actions(tool: Tool) -> Vec<Action> {
    match tool {
        Tool::TodoList | Tool::CalendarEdit | Tool::KitchenTips | Tool::AppGuide => {
            Action::STANDARD.to_vec()
        }
        Tool::Weather | Tool::News | Tool::NluFallback => Vec::new(),
    }
}

/// Per-tool synonym map applied before every consumer check.
pub fn action_aliases(tool: Tool) -> &'static [(&'static str, &'static str)] {
    match tool {
        Tool::TodoList => &[("add", "create"), ("remove", "delete"), ("edit", "update"), ("complete", "update")],
        Tool::CalendarEdit => &[
            ("add", "create"),
            ("schedule", "create"),
            ("move", "update"),
            ("reschedule", "update"),
            ("cancel", "delete"),
            ("remove", "delete"),
        ],
        Tool::KitchenTips => &[("search", "find"), ("get", "find")],
        Tool::AppGuide => &[("get", "find"), ("upsert", "update"), ("search", "find")],
        Tool::Weather | Tool::News | Tool::NluFallback => &[],
    }
}

/// Resolves a raw action through the tool's aliases.
pub fn canonical_action(tool: Tool, raw: &str) -> Action {
    let normalized = raw.trim().to_ascii_lowercase();
    let resolved = action_aliases(tool)
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(normalized.as_str());
    Action::parse(resolved)
}

/// Decides the submit-button label (`Trigger` vs `Correct`).
pub fn is_mutating(action: &Action) -> bool {
    action.is_mutating()
}

// ============================================================
// Field visibility and requirement tables
// ============================================================

pub fn required_fields(tool: Tool) -> &'static [&'static str] {
    match tool {
        Tool::TodoList | Tool::CalendarEdit | Tool::KitchenTips | Tool::AppGuide => &["title"],
        Tool::Weather => &["city"],
        Tool::News | Tool::NluFallback => &[],
    }
}

pub fn extra_fields(tool: Tool) -> &'static [&'static str] {
    match tool {
        Tool::TodoList => &["status", "priority", "deadline"],
        Tool::CalendarEdit => &["start", "end", "location"],
        Tool::KitchenTips => &["content", "keywords"],
        Tool::AppGuide => &["content", "keywords"],
        Tool::Weather => &["city", "time"],
        Tool::News => &["topic"],
        Tool::NluFallback => &[],
    }
}

/// Parameter-extraction tools keep only these (dotted) payload paths.
pub fn field_whitelist(tool: Tool) -> Option<&'static [&'static str]> {
    match tool {
        Tool::Weather => Some(&["city", "time"]),
        Tool::News => Some(&["topic", "language", "region", "source.name"]),
        _ => None,
    }
}

/// Field key a whitelist path is rendered under.
pub fn whitelist_field_key(path: &str) -> String {
    path.replace('.', "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionFieldConfig {
    pub fields: &'static [&'static str],
    pub required: &'static [&'static str],
}

fn config(
    fields: &'static [&'static str],
    required: &'static [&'static str],
) -> Option<ActionFieldConfig> {
    Some(ActionFieldConfig { fields, required })
}

/// When present, replaces the defaults for both visibility and requirement.
pub fn action_field_config(tool: Tool, action: &Action) -> Option<ActionFieldConfig> {
    match (tool, action) {
        (Tool::TodoList, Action::Find) => config(&["keywords", "status"], &[]),
        (Tool::TodoList, Action::Create) => config(&["title", "status", "priority", "deadline"], &["title"]),
        (Tool::TodoList, Action::Delete) => config(&["title", "id"], &["title"]),
        (Tool::CalendarEdit, Action::Find) => config(&["title", "keywords"], &[]),
        (Tool::CalendarEdit, Action::Create) => {
            config(&["title", "start", "end", "location", "link", "notes"], &["title"])
        }
        (Tool::CalendarEdit, Action::Delete) => config(&["title", "id"], &["title"]),
        (Tool::KitchenTips, Action::List) => config(&[], &[]),
        (Tool::KitchenTips, Action::Find) => config(&["keywords"], &["keywords"]),
        (Tool::KitchenTips, Action::Create) => {
            config(&["title", "content", "keywords", "link"], &["title", "content"])
        }
        (Tool::KitchenTips, Action::Delete) => config(&["title", "id"], &["title"]),
        (Tool::AppGuide, Action::List) => config(&[], &[]),
        (Tool::AppGuide, Action::Find) => config(&["keywords"], &["keywords"]),
        (Tool::AppGuide, Action::Create) => config(&["title", "content", "keywords"], &["title", "content"]),
        (Tool::AppGuide, Action::Delete) => config(&["title", "id"], &["title"]),
        _ => None,
    }
}

fn is_crud(tool: Tool) -> bool {
    tool.data_store().is_some()
}

/// Pairs that may synthesize a hidden `lookup_title`.
pub fn supports_title_lookup(tool: Tool, action: &Action) -> bool {
    is_crud(tool) && matches!(action, Action::Find | Action::Update | Action::Delete)
}

/// Pairs that render the title as a constrained dropdown over store titles.
pub fn uses_title_select(tool: Tool, action: &Action) -> bool {
    is_crud(tool) && matches!(action, Action::Update | Action::Delete)
}

/// Pairs that expose the intended-entities chip row.
pub fn supports_intended_entities(tool: Tool, action: &Action) -> bool {
    is_crud(tool) && matches!(action, Action::Find | Action::Update | Action::Delete)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityFieldConfig {
    /// Primary-key field name in the form.
    pub field: &'static str,
    pub store: DataStore,
}

pub fn entity_field_config(tool: Tool) -> Option<EntityFieldConfig> {
    tool.data_store().map(|store| EntityFieldConfig { field: "id", store })
}

/// Every field name the editor can know about; used to validate provenance keys.
pub fn is_known_field(field: &str) -> bool {
    FIELD_ORDER.contains(&field)
        || CALENDAR_FIELD_ORDER.contains(&field)
        || Tool::ALL.into_iter().any(|tool| {
            required_fields(tool).contains(&field)
                || extra_fields(tool).contains(&field)
                || field_whitelist(tool)
                    .is_some_and(|paths| paths.iter().any(|p| whitelist_field_key(p) == field))
        })
}

// ============================================================
// Date/time fields
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeMode {
    /// Structured `{day, date, hour, minute, raw}` object.
    Weather,
    /// `YYYY-MM-DDTHH:MM` (or bare date without time).
    Iso,
    /// Bare `YYYY-MM-DD`.
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeFieldConfig {
    pub mode: DateTimeMode,
    pub include_time: bool,
    pub default_time: Option<&'static str>,
    pub split: bool,
}

pub fn date_time_field_config(field: &str) -> Option<DateTimeFieldConfig> {
    match field {
        "time" => Some(DateTimeFieldConfig {
            mode: DateTimeMode::Weather,
            include_time: true,
            default_time: None,
            split: false,
        }),
        "start" | "end" => Some(DateTimeFieldConfig {
            mode: DateTimeMode::Iso,
            include_time: true,
            default_time: Some("09:00"),
            split: true,
        }),
        "deadline" => Some(DateTimeFieldConfig {
            mode: DateTimeMode::Date,
            include_time: false,
            default_time: None,
            split: false,
        }),
        _ => None,
    }
}

// ============================================================
// Grid layouts
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlacement {
    pub column: u8,
    pub row: u8,
    pub span: u8,
}

const fn at(column: u8, row: u8, span: u8) -> GridPlacement {
    GridPlacement { column, row, span }
}

type Layout = &'static [(&'static str, GridPlacement)];

const TODO_LAYOUT: Layout = &[
    ("title", at(1, 1, 2)),
    ("status", at(1, 2, 1)),
    ("priority", at(2, 2, 1)),
    ("deadline", at(1, 3, 1)),
    ("id", at(2, 3, 1)),
    ("keywords", at(1, 4, 2)),
];

const CALENDAR_LAYOUT: Layout = &[
    ("title", at(1, 1, 2)),
    ("start", at(1, 2, 1)),
    ("end", at(2, 2, 1)),
    ("location", at(1, 4, 1)),
    ("link", at(2, 4, 1)),
    ("notes", at(1, 5, 2)),
    ("id", at(1, 6, 1)),
];

/// Placements for split start/end controls; cells are keyed `<field>__date` / `<field>__time`
/// so they never collide with the plain `start_time` / `end_time` fields.
pub const CALENDAR_FIELD_LAYOUT: Layout = &[
    ("start__date", at(1, 2, 1)),
    ("start__time", at(2, 2, 1)),
    ("end__date", at(1, 3, 1)),
    ("end__time", at(2, 3, 1)),
];

const KITCHEN_LAYOUT: Layout = &[
    ("title", at(1, 1, 2)),
    ("content", at(1, 2, 2)),
    ("keywords", at(1, 3, 1)),
    ("link", at(2, 3, 1)),
    ("id", at(1, 4, 1)),
];

const KITCHEN_FIND_LAYOUT: Layout = &[("keywords", at(1, 1, 2))];

const NOTES_LAYOUT: Layout = &[
    ("title", at(1, 1, 2)),
    ("content", at(1, 2, 2)),
    ("keywords", at(1, 3, 2)),
    ("id", at(1, 4, 1)),
];

const WEATHER_LAYOUT: Layout = &[("city", at(1, 1, 1)), ("time", at(2, 1, 1))];

const NEWS_LAYOUT: Layout = &[
    ("topic", at(1, 1, 2)),
    ("language", at(1, 2, 1)),
    ("region", at(2, 2, 1)),
];

/// Grid placements for a (tool, action); the calendar split cells are
/// appended for every action except `delete` and `find`.
pub fn field_layout(tool: Tool, action: &Action) -> Vec<(&'static str, GridPlacement)> {
    let base: Layout = match (tool, action) {
        (Tool::TodoList, _) => TODO_LAYOUT,
        (Tool::CalendarEdit, _) => CALENDAR_LAYOUT,
        (Tool::KitchenTips | Tool::AppGuide, Action::Find) => KITCHEN_FIND_LAYOUT,
        (Tool::KitchenTips, _) => KITCHEN_LAYOUT,
        (Tool::AppGuide, _) => NOTES_LAYOUT,
        (Tool::Weather, _) => WEATHER_LAYOUT,
        (Tool::News, _) => NEWS_LAYOUT,
        (Tool::NluFallback, _) => &[],
    };
    let mut layout = base.to_vec();
    if tool == Tool::CalendarEdit && !matches!(action, Action::Delete | Action::Find) {
        layout.extend_from_slice(CALENDAR_FIELD_LAYOUT);
    }
    layout
}

pub fn placement_for(tool: Tool, action: &Action, cell: &str) -> Option<GridPlacement> {
    field_layout(tool, action)
        .into_iter()
        .find(|(name, _)| *name == cell)
        .map(|(_, placement)| placement)
}
