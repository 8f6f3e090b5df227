use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Types the model can be forced to produce through a tool call.
///
/// `tool_schema` renders the type's JSON schema in the form the Messages
/// API accepts for tool input: `$ref`s inlined, `definitions`/`$schema`
/// stripped, and `additionalProperties: false` on every object so the
/// model cannot smuggle in unrequested fields.
///
/// `validate` is the hook for constraints a JSON schema cannot carry
/// (numeric ranges, cross-field rules). The adapter runs it right after
/// deserialization, so callers only ever see values that passed it.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn tool_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = value.get("definitions").cloned();
        if let Some(defs) = definitions {
            inline_refs(&mut value, &defs);
        }
        close_object_schemas(&mut value);

        if let serde_json::Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Recursively mark struct-shaped object schemas as closed. Map-typed
/// fields already carry their value-schema in `additionalProperties` and
/// must keep it, so only objects with declared `properties` and no
/// existing `additionalProperties` are closed.
fn close_object_schemas(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if map.get("type") == Some(&serde_json::Value::String("object".to_string()))
                && map.contains_key("properties")
                && !map.contains_key("additionalProperties")
            {
                map.insert(
                    "additionalProperties".to_string(),
                    serde_json::Value::Bool(false),
                );
            }
            for (_, v) in map.iter_mut() {
                close_object_schemas(v);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                close_object_schemas(item);
            }
        }
        _ => {}
    }
}

/// Replace `#/definitions/...` references with the definition bodies.
/// Single-element `allOf` wrappers (schemars' nullable encoding) are
/// flattened along the way.
fn inline_refs(value: &mut serde_json::Value, definitions: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(name) {
                        *value = def.clone();
                        inline_refs(value, definitions);
                        return;
                    }
                }
            }

            if let Some(serde_json::Value::Array(all_of)) = map.get("allOf").cloned() {
                if all_of.len() == 1 {
                    *value = all_of.into_iter().next().unwrap();
                    inline_refs(value, definitions);
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Inner {
        label: String,
        note: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Outer {
        items: Vec<Inner>,
        count: u32,
    }

    impl StructuredOutput for Outer {}

    #[test]
    fn objects_are_closed() {
        let schema = Outer::tool_schema();
        assert_eq!(
            schema.get("additionalProperties"),
            Some(&serde_json::Value::Bool(false))
        );
    }

    #[test]
    fn nested_refs_are_inlined() {
        let schema = Outer::tool_schema();
        let obj = schema.as_object().unwrap();
        assert!(!obj.contains_key("definitions"));
        assert!(!obj.contains_key("$schema"));

        let item_schema = &schema["properties"]["items"]["items"];
        assert!(item_schema.get("$ref").is_none());
        assert_eq!(
            item_schema.get("type"),
            Some(&serde_json::Value::String("object".to_string()))
        );
    }

    #[test]
    fn map_fields_keep_their_value_schema() {
        use std::collections::BTreeMap;

        #[derive(Deserialize, JsonSchema)]
        struct Scored {
            scores: BTreeMap<String, f64>,
            notes: BTreeMap<String, String>,
        }

        impl StructuredOutput for Scored {}

        let schema = Scored::tool_schema();

        let scores = &schema["properties"]["scores"];
        assert_eq!(
            scores["additionalProperties"]["type"],
            serde_json::Value::String("number".to_string())
        );

        let notes = &schema["properties"]["notes"];
        assert_eq!(
            notes["additionalProperties"]["type"],
            serde_json::Value::String("string".to_string())
        );

        // The outer struct schema is still closed.
        assert_eq!(
            schema.get("additionalProperties"),
            Some(&serde_json::Value::Bool(false))
        );
    }

    #[test]
    fn default_validate_accepts() {
        let outer = Outer {
            items: vec![],
            count: 0,
        };
        assert!(outer.validate().is_ok());
    }
}
