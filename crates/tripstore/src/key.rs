use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the canonicalized-content key for a trip-plan item.
///
/// Hashes `item_type` plus a canonical (key-sorted) rendering of
/// `details` so semantically identical details always collide on the
/// same key regardless of field order. When `details` carries nothing
/// (empty object, empty array, or null), falls back to a fingerprint of
/// `title` instead — some item types (e.g. a free-text note) have no
/// structured details to canonicalize.
pub fn normalized_key(item_type: &str, title: &str, details: &Value) -> String {
    let mut hasher = Sha256::new();
    if is_empty_details(details) {
        hasher.update(item_type.as_bytes());
        hasher.update(b":title:");
        hasher.update(title.trim().to_lowercase().as_bytes());
    } else {
        let canonical = canonicalize(details);
        let rendered = serde_json::to_string(&canonical).unwrap_or_default();
        hasher.update(item_type.as_bytes());
        hasher.update(b":details:");
        hasher.update(rendered.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn is_empty_details(details: &Value) -> bool {
    match details {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Recursively sort object keys and lowercase/trim string values so that
/// two semantically-equal JSON values always canonicalize to the same
/// byte string, regardless of field order or whitespace/case differences
/// inside strings.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: std::collections::BTreeMap<String, Value> = std::collections::BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k.clone(), canonicalize(v));
            }
            let ordered: serde_json::Map<String, Value> = sorted.into_iter().collect();
            Value::Object(ordered)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::String(s) => Value::String(s.trim().to_lowercase()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_order_does_not_change_the_key() {
        let a = json!({"destination": "Tokyo", "nights": 3});
        let b = json!({"nights": 3, "destination": "Tokyo"});
        assert_eq!(normalized_key("hotel", "Tokyo stay", &a), normalized_key("hotel", "Tokyo stay", &b));
    }

    #[test]
    fn different_item_types_never_collide_on_the_same_details() {
        let details = json!({"destination": "Tokyo"});
        assert_ne!(normalized_key("hotel", "t", &details), normalized_key("flight", "t", &details));
    }

    #[test]
    fn empty_details_falls_back_to_title_fingerprint() {
        let k1 = normalized_key("note", "Remember passport", &Value::Null);
        let k2 = normalized_key("note", "remember   PASSPORT", &Value::Null);
        assert_eq!(k1, k2);
    }

    #[test]
    fn string_case_and_whitespace_inside_details_does_not_change_the_key() {
        let a = json!({"destination": "Tokyo"});
        let b = json!({"destination": "  tokyo  "});
        assert_eq!(normalized_key("hotel", "t", &a), normalized_key("hotel", "t", &b));
    }

    #[test]
    fn distinct_details_produce_distinct_keys() {
        let a = json!({"destination": "Tokyo"});
        let b = json!({"destination": "Osaka"});
        assert_ne!(normalized_key("hotel", "t", &a), normalized_key("hotel", "t", &b));
    }
}
