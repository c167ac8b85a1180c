use std::collections::HashMap;

use tier5_schema::{Action, IntentCatalog, Tool};

use crate::registry;

/// Intent and action dropdown contents: defaults first, then server-added
/// actions in the order the server sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentOptions {
    intents: Vec<Tool>,
    actions: HashMap<Tool, Vec<Action>>,
}

impl Default for IntentOptions {
    fn default() -> Self {
        Self {
            intents: Tool::ALL.to_vec(),
            actions: Tool::ALL
                .into_iter()
                .map(|tool| (tool, registry::default_intent_actions(tool)))
                .collect(),
        }
    }
}

impl IntentOptions {
    pub fn from_catalog(catalog: &IntentCatalog) -> Self {
        let mut options = Self::default();

        let intents: Vec<Tool> = catalog
            .intents
            .iter()
            .filter_map(|raw| Tool::parse(raw))
            .fold(Vec::new(), |mut acc, tool| {
                if !acc.contains(&tool) {
                    acc.push(tool);
                }
                acc
            });
        if !intents.is_empty() {
            options.intents = intents;
        }

        for (intent, raw_actions) in &catalog.intent_actions {
            let Some(tool) = Tool::parse(intent) else {
                tracing::debug!(intent = %intent, "ignoring actions for unknown intent");
                continue;
            };
            let actions = options.actions.entry(tool).or_default();
            for raw in raw_actions {
                let action = registry::canonical_action(tool, raw);
                if !action.is_empty() && !actions.contains(&action) {
                    actions.push(action);
                }
            }
        }
        options
    }

    pub fn intents(&self) -> &[Tool] {
        &self.intents
    }

    pub fn actions_for(&self, tool: Tool) -> &[Action] {
        self.actions.get(&tool).map(Vec::as_slice).unwrap_or(&[])
    }
}
