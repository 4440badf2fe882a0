//! Typed system settings.
//!
//! Settings are stored as text plus a type tag. Reads turn each row into a
//! JSON value and publish the legacy keys under the names the frontend uses.

use serde_json::{Map, Value, json};

use crate::models::{SettingType, SystemSetting};

/// Legacy storage key -> frontend key. The alias is only filled in when the
/// frontend key is not stored itself.
const ALIASES: [(&str, &str); 6] = [
    ("system_name", "systemName"),
    ("system_title", "systemTitle"),
    ("primary_color", "systemColor"),
    ("system_logo", "logo"),
    ("system_favicon", "favicon"),
    ("footer_name", "systemSubtitle"),
];

/// Decode one stored value according to its type tag.
pub fn parse_setting_value(value: Option<&str>, setting_type: SettingType) -> Value {
    match setting_type {
        SettingType::Boolean => Value::Bool(value == Some("true")),
        SettingType::Number => {
            let raw = value.unwrap_or_default().trim();
            if let Ok(n) = raw.parse::<i64>() {
                json!(n)
            } else {
                raw.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map_or_else(|| json!(0), |n| json!(n))
            }
        }
        SettingType::Json => value
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_else(|| json!({})),
        SettingType::String => value.map_or(Value::Null, |raw| Value::String(raw.to_owned())),
    }
}

/// Build the settings map served to the frontend.
pub fn resolve_settings(rows: &[SystemSetting]) -> Map<String, Value> {
    let mut resolved: Map<String, Value> = rows
        .iter()
        .map(|row| {
            (
                row.setting_key.clone(),
                parse_setting_value(row.setting_value.as_deref(), row.setting_type),
            )
        })
        .collect();

    for (legacy, frontend) in ALIASES {
        if resolved.contains_key(frontend) {
            continue;
        }
        if let Some(value) = resolved.get(legacy).cloned() {
            resolved.insert(frontend.to_owned(), value);
        }
    }

    resolved
}

/// Encode an incoming JSON value for storage, inferring its type tag.
pub fn encode_setting_value(value: &Value) -> (Option<String>, SettingType) {
    match value {
        Value::Null => (None, SettingType::String),
        Value::Bool(b) => (Some(b.to_string()), SettingType::Boolean),
        Value::Number(n) => (Some(n.to_string()), SettingType::Number),
        Value::String(s) => (Some(s.clone()), SettingType::String),
        Value::Array(_) | Value::Object(_) => (Some(value.to_string()), SettingType::Json),
    }
}
