//! Normalization applied to pending records on arrival.

use tier5_schema::{PendingRecord, Tool};

use crate::registry;

pub const MAX_RELATED_PROMPTS: usize = 10;

/// Trimmed, non-empty, case-insensitively unique related prompts, most
/// recent first, excluding the record's own utterance.
pub fn normalize_related_prompts_list(record: &PendingRecord) -> Vec<String> {
    normalize_related_prompts(&record.user_text, &record.related_prompts)
}

pub fn normalize_related_prompts(user_text: &str, prompts: &[String]) -> Vec<String> {
    let primary = user_text.trim().to_lowercase();
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for prompt in prompts {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            continue;
        }
        let key = prompt.to_lowercase();
        if key == primary || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(prompt.to_string());
        if out.len() == MAX_RELATED_PROMPTS {
            break;
        }
    }
    out
}

/// Enforces the record invariants: related prompts normalized, intended
/// entities titled, provenance keyed by known fields only.
pub fn normalize_pending_record(mut record: PendingRecord) -> PendingRecord {
    record.related_prompts = normalize_related_prompts_list(&record);
    record.intended_entities.retain_mut(|entity| {
        entity.title = entity.title.trim().to_string();
        !entity.title.is_empty()
    });
    record
        .field_versions
        .retain(|field, _| registry::is_known_field(field));
    record
}

/// Tool a record is edited as: the record intent unless it is the
/// fallback, then the predicted intent, then `tool_name`.
pub fn resolve_intent(record: &PendingRecord) -> Tool {
    let non_fallback = |raw: Option<&str>| {
        raw.and_then(Tool::parse)
            .filter(|tool| *tool != Tool::NluFallback)
    };
    non_fallback(record.intent.as_deref())
        .or_else(|| non_fallback(record.predicted_str("intent")))
        .or_else(|| non_fallback(record.tool_name.as_deref()))
        .unwrap_or(Tool::NluFallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tier5_schema::{FieldOrigin, IntendedEntity};

    #[test]
    fn related_prompts_drop_primary_duplicates_and_cap() {
        let mut record = PendingRecord::new("1", "Delete this one");
        record.related_prompts = vec![" delete this one ".into(), "Buy milk".into(), "buy milk".into(), "".into()];
        record
            .related_prompts
            .extend((0..20).map(|i| format!("prompt {i}")));

        let normalized = normalize_related_prompts_list(&record);
        assert_eq!(normalized.len(), MAX_RELATED_PROMPTS);
        assert_eq!(normalized[0], "Buy milk");
        assert!(!normalized.iter().any(|p| p.eq_ignore_ascii_case("delete this one")));
    }

    #[test]
    fn record_normalization_enforces_invariants() {
        let mut record = PendingRecord::new("1", "x");
        record.intended_entities = vec![IntendedEntity::new(None, "  "), IntendedEntity::new(Some("3".into()), " Pesto ")];
        record.field_versions.insert("title".into(), FieldOrigin::Parser);
        record.field_versions.insert("mystery".into(), FieldOrigin::Reviewer);

        let record = normalize_pending_record(record);
        assert_eq!(record.intended_entities, vec![IntendedEntity::new(Some("3".into()), "Pesto")]);
        assert_eq!(record.field_versions.len(), 1);
    }

    #[test]
    fn intent_resolution_skips_fallback() {
        let mut record = PendingRecord::new("1", "x");
        record.intent = Some("nlu_fallback".into());
        record
            .predicted_payload
            .insert("intent".into(), serde_json::json!("kitchen_tips"));
        assert_eq!(resolve_intent(&record), Tool::KitchenTips);

        record.predicted_payload.clear();
        record.tool_name = Some("weather".into());
        assert_eq!(resolve_intent(&record), Tool::Weather);

        record.tool_name = None;
        assert_eq!(resolve_intent(&record), Tool::NluFallback);
    }
}
