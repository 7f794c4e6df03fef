use schemars::gen::SchemaSettings;
use serde::de::DeserializeOwned;

/// Types the model can be forced to return via a tool schema.
/// Auto-implemented for anything deriving `JsonSchema` + `Deserialize`.
pub trait StructuredOutput: schemars::JsonSchema + DeserializeOwned {
    /// JSON schema for the tool input, with subschemas inlined — the
    /// Messages API does not resolve `$ref` definitions.
    fn output_schema() -> serde_json::Value {
        let generator = SchemaSettings::draft07()
            .with(|s| {
                s.inline_subschemas = true;
            })
            .into_generator();
        let schema = generator.into_root_schema_for::<Self>();
        serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
    }
}

impl<T: schemars::JsonSchema + DeserializeOwned> StructuredOutput for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Sample {
        #[allow(dead_code)]
        name: String,
        #[allow(dead_code)]
        score: Option<i32>,
    }

    #[test]
    fn schema_is_an_object_with_properties() {
        let schema = Sample::output_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["name"].is_object());
    }
}
