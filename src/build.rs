//! SchemaDef → AST. Pure; enforces the shape invariants the rest of the
//! pipeline assumes.
//!
//! Classification precedence, first match wins, `nullable` orthogonal:
//! `type` → `ref` → `enum` → `elements` → `values` →
//! `properties`/`optionalProperties` → `discriminator`+`mapping` → any.
//! `nullable: true` reclassifies the same schema with the flag cleared and
//! wraps the result.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::{Ast, NodeId, NodeKind, Primitive};
use crate::error::CompileError;
use crate::schema::SchemaDef;

/// Parse one module's named schemas into a fresh AST.
pub fn build_module(defs: &IndexMap<String, SchemaDef>) -> Result<Ast, CompileError> {
    let mut ast = Ast::new();
    for (name, def) in defs {
        build_root(&mut ast, name, def)?;
    }
    Ok(ast)
}

/// Parse a root schema into `ast` under `name`. Root-level `definitions`
/// are hoisted into the same table first, each parsed independently, so
/// the root may reference its siblings and itself.
pub fn build_root(ast: &mut Ast, name: &str, def: &SchemaDef) -> Result<NodeId, CompileError> {
    if let Some(definitions) = &def.definitions {
        for (aux_name, aux) in definitions {
            let id = build_node(ast, None, aux)?;
            insert_definition(ast, aux_name, id)?;
        }
    }
    let id = build_node(ast, None, def)?;
    insert_definition(ast, name, id)?;
    Ok(id)
}

/// Classify one schema into a node, descending into nested schemas.
pub fn build_node(
    ast: &mut Ast,
    parent: Option<NodeId>,
    def: &SchemaDef,
) -> Result<NodeId, CompileError> {
    if def.nullable {
        let id = ast.alloc(parent, def.metadata.clone());
        let mut bare = def.clone();
        bare.nullable = false;
        let inner = build_node(ast, Some(id), &bare)?;
        ast.set_kind(id, NodeKind::Nullable { inner });
        return Ok(id);
    }

    let id = ast.alloc(parent, def.metadata.clone());
    let kind = if let Some(tag) = &def.type_ {
        let primitive =
            Primitive::parse(tag).ok_or_else(|| CompileError::UnknownType { tag: tag.clone() })?;
        NodeKind::Type { primitive }
    } else if let Some(target) = &def.ref_ {
        NodeKind::Ref {
            target: target.clone(),
        }
    } else if let Some(values) = &def.enum_ {
        NodeKind::Enum {
            values: dedup_preserving(values),
        }
    } else if let Some(elements) = &def.elements {
        let inner = build_node(ast, Some(id), elements)?;
        NodeKind::Elements { inner }
    } else if let Some(values) = &def.values {
        let inner = build_node(ast, Some(id), values)?;
        NodeKind::Values { inner }
    } else if def.properties.is_some() || def.optional_properties.is_some() {
        build_object(ast, id, def)?
    } else if def.discriminator.is_some() || def.mapping.is_some() {
        build_union(ast, id, def)?
    } else {
        NodeKind::Any
    };
    ast.set_kind(id, kind);
    Ok(id)
}

fn build_object(ast: &mut Ast, id: NodeId, def: &SchemaDef) -> Result<NodeKind, CompileError> {
    let mut properties = Vec::new();
    let mut optional_properties = Vec::new();
    if let Some(props) = &def.properties {
        for (key, prop) in props {
            let node = build_node(ast, Some(id), prop)?;
            properties.push((key.clone(), node));
        }
    }
    if let Some(props) = &def.optional_properties {
        for (key, prop) in props {
            if def.properties.as_ref().is_some_and(|p| p.contains_key(key)) {
                return Err(CompileError::DuplicateProperty { key: key.clone() });
            }
            let node = build_node(ast, Some(id), prop)?;
            optional_properties.push((key.clone(), node));
        }
    }
    Ok(NodeKind::Object {
        properties,
        optional_properties,
    })
}

fn build_union(ast: &mut Ast, id: NodeId, def: &SchemaDef) -> Result<NodeKind, CompileError> {
    let (Some(discriminator), Some(mapping)) = (&def.discriminator, &def.mapping) else {
        return Err(CompileError::MalformedUnion);
    };
    let mut arms = Vec::with_capacity(mapping.len());
    for (key, arm) in mapping {
        let node = build_node(ast, Some(id), arm)?;
        // Arms must classify as Object; Nullable or anything else is out.
        if !matches!(ast.kind(node), NodeKind::Object { .. }) {
            return Err(CompileError::InvalidMapping { key: key.clone() });
        }
        arms.push((key.clone(), node));
    }
    Ok(NodeKind::Union {
        discriminator: discriminator.clone(),
        mapping: arms,
    })
}

fn insert_definition(ast: &mut Ast, name: &str, id: NodeId) -> Result<(), CompileError> {
    if ast.definitions.contains_key(name) {
        return Err(CompileError::DuplicateDefinition {
            name: name.to_string(),
        });
    }
    ast.definitions.insert(name.to_string(), id);
    Ok(())
}

fn dedup_preserving(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

// ------------------------------- Tests ------------------------------------ //
