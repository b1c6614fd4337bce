//! Raw JTD document model, straight off the wire.
//!
//! `SchemaDef` mirrors the RFC 8927 keyword set with no interpretation;
//! classification into AST kinds happens in `build`. All maps are
//! `IndexMap` so key order survives parsing and fixes emission order in
//! the generated source.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDef {
    #[serde(default)]
    pub nullable: bool,

    /// Primitive tag (`boolean`, `string`, `timestamp`, numeric family).
    #[serde(rename = "type")]
    pub type_: Option<String>,

    /// Name of another definition in the module set.
    #[serde(rename = "ref")]
    pub ref_: Option<String>,

    #[serde(rename = "enum")]
    pub enum_: Option<Vec<String>>,

    /// Array-of schema.
    pub elements: Option<Box<SchemaDef>>,

    /// Map-of-string-to schema.
    pub values: Option<Box<SchemaDef>>,

    pub properties: Option<IndexMap<String, SchemaDef>>,
    pub optional_properties: Option<IndexMap<String, SchemaDef>>,

    pub discriminator: Option<String>,
    pub mapping: Option<IndexMap<String, SchemaDef>>,

    /// Opaque; a `description` entry becomes a doc comment.
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,

    /// Auxiliary named schemas, meaningful at a document root only.
    pub definitions: Option<IndexMap<String, SchemaDef>>,
}

impl SchemaDef {
    /// Non-empty documentation text carried in `metadata.description`.
    pub fn description(&self) -> Option<&str> {
        self.metadata
            .get("description")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(v: serde_json::Value) -> SchemaDef {
        serde_json::from_value(v).expect("schema fixture")
    }

    #[test]
    fn keyword_spelling_matches_the_wire_format() {
        let def = schema(json!({
            "type": "string",
            "nullable": true,
            "metadata": { "description": "a name" }
        }));
        assert_eq!(def.type_.as_deref(), Some("string"));
        assert!(def.nullable);
        assert_eq!(def.description(), Some("a name"));
    }

    #[test]
    fn property_order_is_preserved() {
        let def = schema(json!({
            "properties": { "zulu": {}, "alpha": {}, "mike": {} }
        }));
        let keys: Vec<&String> = def.properties.as_ref().unwrap().keys().collect();
        assert_eq!(keys, ["zulu", "alpha", "mike"]);
    }

    #[test]
    fn optional_properties_uses_camel_case() {
        let def = schema(json!({
            "optionalProperties": { "age": { "type": "int8" } }
        }));
        assert!(def.optional_properties.is_some());
        assert!(def.properties.is_none());
    }

    #[test]
    fn missing_metadata_defaults_to_empty() {
        let def = schema(json!({ "ref": "other" }));
        assert!(def.metadata.is_empty());
        assert_eq!(def.description(), None);
    }
}
