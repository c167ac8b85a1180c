//! Resolves pronoun titles ("delete this one") against nearby prompts.
//!
//! This is the only place that reads `related_prompts` for meaning. A
//! pronoun title is replaced by the most recent related prompt; store
//! titles contained in that prompt then decide whether the reference is a
//! single entity, ambiguous, or just free text.

const PRONOUN_TOKENS: &[&str] = &["this", "that", "it", "this one", "that one", "this todo", "that todo"];

const COMMAND_VERBS: &[&str] = &["delete", "remove", "update", "edit", "change", "cancel", "complete", "move", "rename"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PronounOutcome {
    /// Title is not a pronoun, or there is nothing to resolve it against.
    Unchanged,
    /// No store title found; the prompt text becomes the title.
    Replaced { title: String },
    /// Exactly one store entity is referenced.
    Matched { id: String, title: String },
    /// Several entities fit; the title is cleared.
    Ambiguous,
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '?' | '!' | '.' | ','))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn is_pronoun(text: &str) -> bool {
    let normalized = normalize(text);
    PRONOUN_TOKENS.contains(&normalized.as_str())
}

/// `"delete this one"`, `"remove it"`: a command verb followed only by a pronoun.
pub fn is_pronoun_command(utterance: &str) -> bool {
    let normalized = normalize(utterance);
    let mut words = normalized.splitn(2, ' ');
    match (words.next(), words.next()) {
        (Some(verb), Some(rest)) => COMMAND_VERBS.contains(&verb) && PRONOUN_TOKENS.contains(&rest),
        _ => false,
    }
}

/// Resolves `title` (or an empty title on a pronoun command) against the
/// most recent related prompt and the store's `(id, title)` pairs.
pub fn resolve_pronoun(
    title: Option<&str>,
    utterance: &str,
    related_prompts: &[String],
    store: &[(&str, &str)],
) -> PronounOutcome {
    let title = title.map(str::trim).unwrap_or_default();
    let triggered = if title.is_empty() {
        is_pronoun_command(utterance)
    } else {
        is_pronoun(title)
    };
    if !triggered {
        return PronounOutcome::Unchanged;
    }

    let primary = normalize(utterance);
    let Some(candidate) = related_prompts
        .iter()
        .map(|prompt| prompt.trim())
        .find(|prompt| !prompt.is_empty() && normalize(prompt) != primary)
    else {
        return PronounOutcome::Unchanged;
    };

    let haystack = candidate.to_lowercase();
    let mut matched: Vec<(&str, &str)> = store
        .iter()
        .copied()
        .filter(|(_, title)| {
            let needle = title.trim().to_lowercase();
            !needle.is_empty() && haystack.contains(&needle)
        })
        .collect();

    // a longer title that contains a shorter match supersedes it
    let snapshot = matched.clone();
    matched.retain(|(_, title)| {
        let lower = title.trim().to_lowercase();
        !snapshot.iter().any(|(_, other)| {
            let other = other.trim().to_lowercase();
            other.len() > lower.len() && other.contains(&lower)
        })
    });

    match matched.as_slice() {
        [] => PronounOutcome::Replaced {
            title: candidate.to_string(),
        },
        [(id, title)] => PronounOutcome::Matched {
            id: id.to_string(),
            title: title.trim().to_string(),
        },
        _ => PronounOutcome::Ambiguous,
    }
}
