//! Cross-references editor titles and ids against the live data stores.

use std::collections::BTreeMap;

use tier5_schema::{
    Action, CalendarEvent, DataStore, KitchenTip, NoteSection, StoreEntities, TodoItem, Tool,
};

use crate::canonical::LOOKUP_TITLE;
use crate::registry;
use crate::values::FieldMap;

/// Read-only snapshot of every CRUD store, one collection per variant.
#[derive(Debug, Clone, Default)]
pub struct DataStoreCache {
    stores: BTreeMap<DataStore, StoreEntities>,
}

impl DataStoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, entities: StoreEntities) {
        self.stores.insert(entities.store(), entities);
    }

    pub fn get(&self, store: DataStore) -> Option<&StoreEntities> {
        self.stores.get(&store)
    }

    pub fn for_tool(&self, tool: Tool) -> Option<&StoreEntities> {
        tool.data_store().and_then(|store| self.get(store))
    }

    /// `(id, title)` pairs for a tool's store; empty when not loaded.
    pub fn id_titles(&self, tool: Tool) -> Vec<(&str, &str)> {
        self.for_tool(tool)
            .map(StoreEntities::id_titles)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityOption {
    pub value: String,
    pub label: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleGroup {
    /// Lowercased, trimmed title.
    pub key: String,
    /// Display casing of the first occurrence.
    pub title: String,
    pub ids: Vec<String>,
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

fn entity_label(id: &str, title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        format!("#{id}")
    } else {
        title.to_string()
    }
}

pub fn get_entity_options(cache: &DataStoreCache, tool: Tool) -> Vec<EntityOption> {
    let mut options: Vec<EntityOption> = cache
        .id_titles(tool)
        .into_iter()
        .map(|(id, title)| EntityOption {
            value: id.to_string(),
            label: entity_label(id, title),
            title: title.trim().to_string(),
        })
        .collect();
    options.sort_by(|a, b| {
        a.label
            .to_lowercase()
            .cmp(&b.label.to_lowercase())
            .then_with(|| a.label.cmp(&b.label))
    });
    options
}

pub fn get_title_groups(cache: &DataStoreCache, tool: Tool) -> Vec<TitleGroup> {
    let mut groups: Vec<TitleGroup> = Vec::new();
    for option in get_entity_options(cache, tool) {
        if option.title.is_empty() {
            continue;
        }
        let key = title_key(&option.title);
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.ids.push(option.value),
            None => groups.push(TitleGroup {
                key,
                title: option.title,
                ids: vec![option.value],
            }),
        }
    }
    groups
}

/// One `(value, label)` per distinct title.
pub fn get_title_options(cache: &DataStoreCache, tool: Tool) -> Vec<(String, String)> {
    get_title_groups(cache, tool)
        .into_iter()
        .map(|group| (group.title.clone(), group.title))
        .collect()
}

/// Ids of entities whose title matches exactly, ignoring case and outer whitespace.
pub fn get_entities_matching_title(cache: &DataStoreCache, tool: Tool, title: &str) -> Vec<String> {
    let key = title_key(title);
    if key.is_empty() {
        return Vec::new();
    }
    get_title_groups(cache, tool)
        .into_iter()
        .find(|group| group.key == key)
        .map(|group| group.ids)
        .unwrap_or_default()
}

/// Sets `fields.id` when exactly one entity matches `title`, clears it
/// otherwise. Returns the match count.
pub fn auto_select_id_for_title(
    fields: &mut FieldMap,
    cache: &DataStoreCache,
    tool: Tool,
    title: &str,
) -> usize {
    let Some(entity) = registry::entity_field_config(tool) else {
        return 0;
    };
    let matches = get_entities_matching_title(cache, tool, title);
    match matches.as_slice() {
        [id] => fields.insert(entity.field, id.clone()),
        _ => {
            fields.remove(entity.field);
        }
    }
    matches.len()
}

/// Form values an entity contributes when selected by id. `None` clears
/// the field.
pub trait Hydrate {
    fn hydrate(&self) -> Vec<(&'static str, Option<String>)>;
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn keep_spacing(value: &Option<String>) -> Option<String> {
    value.clone().filter(|text| !text.trim().is_empty())
}

fn joined(values: &[String]) -> Option<String> {
    let parts: Vec<&str> = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn title_of(title: &str) -> Option<String> {
    non_empty(&Some(title.to_string()))
}

impl Hydrate for TodoItem {
    fn hydrate(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("title", title_of(&self.title)),
            ("status", non_empty(&self.status)),
            ("priority", non_empty(&self.priority)),
            ("deadline", non_empty(&self.deadline)),
        ]
    }
}

impl Hydrate for CalendarEvent {
    fn hydrate(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("title", title_of(&self.title)),
            ("start", non_empty(&self.start)),
            ("end", non_empty(&self.end)),
            ("location", non_empty(&self.location)),
            ("link", non_empty(&self.link)),
            ("notes", keep_spacing(&self.notes)),
        ]
    }
}

impl Hydrate for KitchenTip {
    fn hydrate(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("title", title_of(&self.title)),
            ("content", keep_spacing(&self.content)),
            ("keywords", joined(&self.tags)),
            ("link", non_empty(&self.link)),
        ]
    }
}

impl Hydrate for NoteSection {
    fn hydrate(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("title", title_of(&self.title)),
            ("content", keep_spacing(&self.content)),
            ("keywords", joined(&self.keywords)),
        ]
    }
}

fn find_hydrated<T: Hydrate>(
    items: &[T],
    id: &str,
    id_of: impl Fn(&T) -> &str,
) -> Option<Vec<(&'static str, Option<String>)>> {
    items
        .iter()
        .find(|item| id_of(*item) == id)
        .map(|item| item.hydrate())
}

fn hydrate_by_id(entities: &StoreEntities, id: &str) -> Option<Vec<(&'static str, Option<String>)>> {
    match entities {
        StoreEntities::Todos(items) => find_hydrated(items, id, |e| e.id.as_str()),
        StoreEntities::Calendar(items) => find_hydrated(items, id, |e| e.id.as_str()),
        StoreEntities::KitchenTips(items) => find_hydrated(items, id, |e| e.id.as_str()),
        StoreEntities::AppGuide(items) => find_hydrated(items, id, |e| e.id.as_str()),
    }
}

/// Copies the selected entity's values into the form. Returns `false` when
/// the id is not in the cache.
pub fn hydrate_entity_selection(
    fields: &mut FieldMap,
    hidden: &mut BTreeMap<String, String>,
    cache: &DataStoreCache,
    tool: Tool,
    action: &Action,
    id: &str,
) -> bool {
    let id = id.trim();
    let Some(values) = cache
        .for_tool(tool)
        .and_then(|entities| hydrate_by_id(entities, id))
    else {
        return false;
    };

    let mut hydrated_title = None;
    for (field, value) in values {
        match value {
            Some(value) => {
                if field == "title" {
                    hydrated_title = Some(value.clone());
                }
                fields.insert(field, value);
            }
            None => {
                fields.remove(field);
            }
        }
    }
    if registry::supports_title_lookup(tool, action) {
        if let Some(title) = hydrated_title {
            hidden.insert(LOOKUP_TITLE.to_string(), title);
        }
    }
    tracing::debug!(tool = %tool, id, "hydrated entity selection");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: &str, title: &str) -> TodoItem {
        TodoItem {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    fn cache_with_todos(items: Vec<TodoItem>) -> DataStoreCache {
        let mut cache = DataStoreCache::new();
        cache.replace(StoreEntities::Todos(items));
        cache
    }

    #[test]
    fn options_sort_by_label_and_group_case_insensitively() {
        let cache = cache_with_todos(vec![
            todo("3", "walk dog"),
            todo("1", "Buy milk"),
            todo("2", "buy milk "),
        ]);
        let options = get_entity_options(&cache, Tool::TodoList);
        assert_eq!(options[0].label, "Buy milk");
        assert_eq!(options[2].label, "walk dog");

        let groups = get_title_groups(&cache, Tool::TodoList);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Buy milk");
        assert_eq!(groups[0].ids, vec!["1", "2"]);
        assert_eq!(
            get_title_options(&cache, Tool::TodoList)[1],
            ("walk dog".to_string(), "walk dog".to_string())
        );
    }

    #[test]
    fn auto_select_sets_id_only_on_single_match() {
        let cache = cache_with_todos(vec![todo("7", "Buy milk"), todo("8", "Pay rent"), todo("9", "pay rent")]);
        let mut fields = FieldMap::new();

        assert_eq!(auto_select_id_for_title(&mut fields, &cache, Tool::TodoList, " buy MILK "), 1);
        assert_eq!(fields.text("id"), Some("7"));

        assert_eq!(auto_select_id_for_title(&mut fields, &cache, Tool::TodoList, "Pay rent"), 2);
        assert!(!fields.contains("id"));

        fields.insert("id", "7");
        assert_eq!(auto_select_id_for_title(&mut fields, &cache, Tool::TodoList, "nothing"), 0);
        assert!(!fields.contains("id"));
    }

    #[test]
    fn hydrate_merges_values_and_sets_lookup_title() {
        let mut cache = DataStoreCache::new();
        cache.replace(StoreEntities::KitchenTips(vec![KitchenTip {
            id: "4".into(),
            title: "Pesto".into(),
            content: Some("Blend basil\n  then oil".into()),
            tags: vec!["italian".into(), "sauce".into()],
            link: None,
        }]));
        let mut fields: FieldMap = [("link", "http://old"), ("title", "old")].into_iter().collect();
        let mut hidden = BTreeMap::new();

        assert!(hydrate_entity_selection(
            &mut fields,
            &mut hidden,
            &cache,
            Tool::KitchenTips,
            &Action::Update,
            "4"
        ));
        assert_eq!(fields.text("title"), Some("Pesto"));
        assert_eq!(fields.get("content").and_then(|v| v.as_text()), Some("Blend basil\n  then oil"));
        assert_eq!(fields.text("keywords"), Some("italian, sauce"));
        assert!(!fields.contains("link"));
        assert_eq!(hidden.get(LOOKUP_TITLE).map(String::as_str), Some("Pesto"));

        assert!(!hydrate_entity_selection(
            &mut fields,
            &mut hidden,
            &cache,
            Tool::KitchenTips,
            &Action::Update,
            "99"
        ));
    }

    #[test]
    fn hydrate_skips_lookup_title_for_create() {
        let cache = cache_with_todos(vec![todo("7", "Buy milk")]);
        let mut fields = FieldMap::new();
        let mut hidden = BTreeMap::new();
        hydrate_entity_selection(&mut fields, &mut hidden, &cache, Tool::TodoList, &Action::Create, "7");
        assert_eq!(fields.text("title"), Some("Buy milk"));
        assert!(hidden.is_empty());
    }
}
