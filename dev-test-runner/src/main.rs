//! Development harness: compile a small multi-module schema set end to
//! end and print the generated TypeScript. Doubles as a quick manual
//! regression check that regeneration is byte-identical.

use indexmap::IndexMap;
use jtd_typegen::schema::SchemaDef;
use jtd_typegen::Options;

fn dict(v: serde_json::Value) -> IndexMap<String, SchemaDef> {
    serde_json::from_value(v).expect("schema fixture")
}

fn main() {
    let mut modules = IndexMap::new();
    modules.insert(
        "./models/role".to_string(),
        dict(serde_json::json!({
            "role": {
                "metadata": { "description": "Access level of an account." },
                "enum": ["admin", "editor", "viewer"]
            }
        })),
    );
    modules.insert(
        "./models/user".to_string(),
        dict(serde_json::json!({
            "user": {
                "definitions": {
                    "address": {
                        "properties": {
                            "street": { "type": "string" },
                            "city": { "type": "string" }
                        }
                    }
                },
                "properties": {
                    "email": { "type": "string" },
                    "role": { "ref": "role" },
                    "createdAt": { "type": "timestamp" }
                },
                "optionalProperties": {
                    "age": { "type": "uint8", "nullable": true },
                    "address": { "ref": "address" },
                    "tags": { "elements": { "type": "string" } }
                }
            }
        })),
    );
    modules.insert(
        "./models/event".to_string(),
        dict(serde_json::json!({
            "event": {
                "discriminator": "kind",
                "mapping": {
                    "user_created": {
                        "properties": { "user": { "ref": "user" } }
                    },
                    "user_deleted": {
                        "properties": { "email": { "type": "string" } }
                    }
                }
            }
        })),
    );

    let options = Options::default();
    let first = jtd_typegen::compile(&modules, &options).expect("compile");
    let second = jtd_typegen::compile(&modules, &options).expect("compile");
    assert_eq!(first, second, "regeneration must be byte-identical");

    for (id, source) in &first {
        println!("// ===== {id} =====");
        println!("{source}");
    }
}
