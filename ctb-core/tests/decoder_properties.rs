//! Property tests for the error-accumulating decoder.

use std::collections::BTreeMap;

use ctb_core::parse::{DictionaryParser, Fields, JsonParser};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// Decodes every key of `json` as an optional string field.
fn decode_all_strings(json: &Value, keys: &[String]) -> Result<BTreeMap<String, String>, usize> {
    let mut fields = Fields::new(json);
    let values: BTreeMap<String, String> = keys
        .iter()
        .map(|key| (key.clone(), fields.string(key)))
        .collect();
    fields.finish(values).map_err(|errors| errors.len())
}

fn field_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z_]{1,12}", 1..12).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn well_formed_objects_keep_every_field(entries in prop::collection::btree_map("[a-z_]{1,12}", ".{0,24}", 0..16)) {
        let json = Value::Object(entries.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect::<Map<_, _>>());
        let keys: Vec<String> = entries.keys().cloned().collect();

        let decoded = decode_all_strings(&json, &keys).unwrap();

        prop_assert_eq!(&decoded, &entries);
        let reencoded = serde_json::to_value(&decoded).unwrap();
        prop_assert_eq!(reencoded, json);
    }

    #[test]
    fn each_invalid_field_is_reported(keys in field_names(), bad_mask in prop::collection::vec(any::<bool>(), 12)) {
        let mut object = Map::new();
        let mut expected_errors = 0;
        for (index, key) in keys.iter().enumerate() {
            if bad_mask[index] {
                object.insert(key.clone(), json!(index));
                expected_errors += 1;
            } else {
                object.insert(key.clone(), json!(format!("value-{index}")));
            }
        }
        let json = Value::Object(object);

        match decode_all_strings(&json, &keys) {
            Ok(_) => prop_assert_eq!(expected_errors, 0),
            Err(count) => prop_assert_eq!(count, expected_errors),
        }
    }

    #[test]
    fn dictionary_round_trips_string_maps(entries in prop::collection::btree_map("[a-zA-Z-]{1,16}", "[ -~]{0,32}", 0..8)) {
        let json = serde_json::to_value(&entries).unwrap();
        let decoded = DictionaryParser.parse_node(&json, None, true).unwrap();
        prop_assert_eq!(decoded, entries);
    }
}

#[test]
fn two_invalid_fields_yield_two_errors() {
    let json = json!({ "content_type": 1, "ping_url": ["x"], "post_url": "https://bucket" });
    let mut fields = Fields::new(&json);
    let _ = fields.required_string("content_type");
    let _ = fields.required_string("ping_url");
    let _ = fields.required_string("post_url");

    assert_eq!(fields.finish(()).unwrap_err().len(), 2);
}
