//! Diff generation for audit records
//!
//! Summarizes the difference between two JSON snapshots of an entity, used
//! to describe what changed in each audited update.

use serde_json::{Map, Value};

/// Longest string value shown in full
const MAX_SHOWN_CHARS: usize = 40;

/// Describe the top-level field changes between two snapshots
///
/// Returns `None` when nothing differs.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let (Value::Object(before_obj), Value::Object(after_obj)) = (before, after) else {
        return (before != after)
            .then(|| format!("{} -> {}", format_value(before), format_value(after)));
    };

    let changes: Vec<String> = before_obj
        .iter()
        .filter_map(|(key, old)| match after_obj.get(key) {
            Some(new) if new != old => {
                Some(format!("{}: {} -> {}", key, format_value(old), format_value(new)))
            }
            Some(_) => None,
            None => Some(format!("{}: {} -> (removed)", key, format_value(old))),
        })
        .chain(
            after_obj
                .iter()
                .filter(|(key, _)| !before_obj.contains_key(*key))
                .map(|(key, new)| format!("{}: (added) -> {}", key, format_value(new))),
        )
        .collect();

    (!changes.is_empty()).then(|| changes.join(", "))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > MAX_SHOWN_CHARS {
                let head: String = s.chars().take(MAX_SHOWN_CHARS - 3).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format_money(obj).unwrap_or_else(|| format!("{{{} fields}}", obj.len())),
    }
}

/// Money snapshots read better as "USD 12.50" than as an object
fn format_money(obj: &Map<String, Value>) -> Option<String> {
    if obj.len() != 2 {
        return None;
    }
    let amount = obj.get("amount")?.as_str()?;
    let currency = obj.get("currency")?.as_str()?;
    Some(format!("{} {}", currency, amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_renamed_category() {
        let before = json!({"name": "Food", "display_order": 0});
        let after = json!({"name": "Groceries", "display_order": 0});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(diff, "name: \"Food\" -> \"Groceries\"");
    }

    #[test]
    fn test_planned_amount_set_and_cleared() {
        let unset = json!({"planned_amount": null});
        let set = json!({"planned_amount": {"amount": "250.00", "currency": "USD"}});

        assert_eq!(
            generate_diff(&unset, &set).unwrap(),
            "planned_amount: null -> USD 250.00"
        );
        assert_eq!(
            generate_diff(&set, &unset).unwrap(),
            "planned_amount: USD 250.00 -> null"
        );
    }

    #[test]
    fn test_added_and_removed_fields() {
        let before = json!({"name": "Rent", "description": "flat"});
        let after = json!({"name": "Rent", "is_deleted": true});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("description: \"flat\" -> (removed)"));
        assert!(diff.contains("is_deleted: (added) -> true"));
    }

    #[test]
    fn test_no_changes() {
        let snapshot = json!({"name": "Rent", "status": "Draft"});
        assert!(generate_diff(&snapshot, &snapshot.clone()).is_none());
    }

    #[test]
    fn test_long_unicode_string_is_truncated_safely() {
        let before = json!({"description": "é".repeat(60)});
        let after = json!({"description": "short"});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("...\""));
    }

    #[test]
    fn test_non_object_values() {
        assert_eq!(generate_diff(&json!(1), &json!(2)).unwrap(), "1 -> 2");
        assert!(generate_diff(&json!([1]), &json!([1])).is_none());
        assert_eq!(generate_diff(&json!([1]), &json!([1, 2])).unwrap(), "[1 items] -> [2 items]");
    }
}
