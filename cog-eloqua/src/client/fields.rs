//! Translation between "friendly" flat contact records and Eloqua's wire
//! representation, where custom fields live in a `fieldValues` array keyed
//! by opaque field ids.
//!
//! Both directions are pure functions over a caller-supplied field map
//! (id -> internal name); they never mutate their input. Round-trip
//! property: `deserialize(serialize(x)) == x` for any contact whose custom
//! field keys are all present in the field map.

use std::collections::HashMap;

/// Friendly contact record: field name -> scalar value.
pub type Contact = serde_json::Map<String, serde_json::Value>;

/// Eloqua field id -> internal field name (e.g. `10001` -> `C_Custom_Field`).
pub type FieldMap = HashMap<String, String>;

const FIELD_VALUES_KEY: &str = "fieldValues";

/// Moves every contact property whose key matches a known internal field
/// name into a `fieldValues` entry `{id, type: "FieldValue", value}`.
/// Keys with no match pass through unchanged.
pub fn serialize_custom_fields(field_map: &FieldMap, contact: &Contact) -> Contact {
    let mut wire = Contact::new();
    let mut field_values: Vec<serde_json::Value> = contact
        .get(FIELD_VALUES_KEY)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    for (key, value) in contact {
        if key == FIELD_VALUES_KEY {
            continue;
        }
        match field_map.iter().find(|(_, name)| *name == key) {
            Some((id, _)) => field_values.push(serde_json::json!({
                "type": "FieldValue",
                "id": id,
                "value": value,
            })),
            None => {
                wire.insert(key.clone(), value.clone());
            }
        }
    }

    if !field_values.is_empty() {
        wire.insert(FIELD_VALUES_KEY.into(), field_values.into());
    }
    wire
}

/// Lifts every known, non-empty `fieldValues` entry back onto the contact
/// as a direct property named by the internal field name, then drops the
/// `fieldValues` array. Entries with unknown ids are dropped silently.
pub fn deserialize_custom_fields(field_map: &FieldMap, contact: &Contact) -> Contact {
    let mut friendly = Contact::new();
    for (key, value) in contact {
        if key != FIELD_VALUES_KEY {
            friendly.insert(key.clone(), value.clone());
        }
    }

    let entries = contact
        .get(FIELD_VALUES_KEY)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    for entry in &entries {
        let Some(id) = entry.get("id").and_then(|v| v.as_str()) else {
            continue;
        };
        let Some(value) = entry.get("value") else {
            continue;
        };
        if value.is_null() || value.as_str().is_some_and(str::is_empty) {
            continue;
        }
        if let Some(name) = field_map.get(id) {
            friendly.insert(name.clone(), value.clone());
        }
    }
    friendly
}
