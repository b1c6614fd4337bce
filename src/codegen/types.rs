//! Type-declaration compiler: one exported TypeScript declaration per
//! definition, in definition-table order.
//!
//! Declaration heads are selected by the root node's kind; member lines
//! for interfaces and union arms are driven through the traversal engine
//! so their order matches the validator compiler's exactly. Inner type
//! expressions are mechanical recursive string assembly over the same
//! nodes.

use std::collections::HashSet;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::codegen::{
    doc_comment, is_ts_ident, ts_string, EnumValueStyle, Options, Resolve,
};
use crate::error::CompileError;
use crate::traverse::{walk, Next, Visitor};

/// Compile every definition's declaration, separated by blank lines.
pub fn compile_declarations(
    ast: &Ast,
    options: &Options,
    resolver: &mut dyn Resolve,
) -> Result<String, CompileError> {
    let mut out = String::new();
    for (i, (name, id)) in ast.definitions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&compile_declaration(ast, name, *id, options, resolver)?);
    }
    Ok(out)
}

fn compile_declaration(
    ast: &Ast,
    name: &str,
    id: NodeId,
    options: &Options,
    resolver: &mut dyn Resolve,
) -> Result<String, CompileError> {
    let type_name = options.naming.type_name(name);
    let mut out = String::new();
    if let Some(d) = ast.node(id).description() {
        out.push_str(&doc_comment(d, ""));
    }
    match ast.kind(id) {
        NodeKind::Enum { values } => {
            out.push_str(&emit_enum(&type_name, values, options));
        }
        NodeKind::Object { .. } => {
            let mut members = MemberEmit::new(ast, options, resolver, name);
            walk(ast, id, &mut members, ());
            if let Some(error) = members.error {
                return Err(error);
            }
            out.push_str(&format!("export interface {type_name} {{\n"));
            out.push_str(&members.out);
            out.push_str("}\n");
        }
        NodeKind::Union {
            discriminator,
            mapping,
        } => {
            // synthetic enum of the mapping keys, then the union alias,
            // then one interface per arm
            let enum_name = options.naming.union_enum_name(name, discriminator);
            let keys: Vec<String> = mapping.iter().map(|(k, _)| k.clone()).collect();
            out.push_str(&emit_enum(&enum_name, &keys, options));
            out.push('\n');
            if mapping.is_empty() {
                out.push_str(&format!("export type {type_name} = never;\n"));
            } else {
                let arm_names: Vec<String> = keys
                    .iter()
                    .map(|k| options.naming.arm_name(name, k))
                    .collect();
                out.push_str(&format!(
                    "export type {type_name} = {};\n",
                    arm_names.join(" | ")
                ));
            }
            let mut arms = MemberEmit::new(ast, options, resolver, name);
            arms.union = Some(UnionCx {
                discriminator: discriminator.clone(),
                enum_name,
                members: enum_members(&keys, options),
                arm_index: 0,
            });
            walk(ast, id, &mut arms, ());
            if let Some(error) = arms.error {
                return Err(error);
            }
            out.push_str(&arms.out);
        }
        _ => {
            let expr = expr(ast, id, options, resolver)?;
            out.push_str(&format!("export type {type_name} = {expr};\n"));
        }
    }
    Ok(out)
}

/// Member identifiers plus value literals for one enum declaration, with
/// deterministic disambiguation of colliding identifiers.
fn enum_members(values: &[String], options: &Options) -> Vec<(String, String)> {
    let mut used = HashSet::new();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let mut member = options.naming.enum_member(i, v);
            if !used.insert(member.clone()) {
                member = format!("{member}{i}");
                used.insert(member.clone());
            }
            let literal = match options.enum_values {
                EnumValueStyle::Literal => ts_string(v),
                EnumValueStyle::Ordinal => i.to_string(),
            };
            (member, literal)
        })
        .collect()
}

fn emit_enum(name: &str, values: &[String], options: &Options) -> String {
    let mut out = format!("export enum {name} {{\n");
    for (member, literal) in enum_members(values, options) {
        out.push_str(&format!("  {member} = {literal},\n"));
    }
    out.push_str("}\n");
    out
}

fn decl_key(key: &str) -> String {
    if is_ts_ident(key) {
        key.to_string()
    } else {
        ts_string(key)
    }
}

struct UnionCx {
    discriminator: String,
    enum_name: String,
    members: Vec<(String, String)>,
    arm_index: usize,
}

/// Emits interface member lines (and, for unions, whole arm interfaces).
/// Property handlers render the member's full type expression and prune;
/// the engine only orders the entries.
struct MemberEmit<'a> {
    ast: &'a Ast,
    options: &'a Options,
    resolver: &'a mut dyn Resolve,
    def_name: &'a str,
    union: Option<UnionCx>,
    out: String,
    error: Option<CompileError>,
}

impl<'a> MemberEmit<'a> {
    fn new(
        ast: &'a Ast,
        options: &'a Options,
        resolver: &'a mut dyn Resolve,
        def_name: &'a str,
    ) -> Self {
        Self {
            ast,
            options,
            resolver,
            def_name,
            union: None,
            out: String::new(),
            error: None,
        }
    }

    fn member_line(&mut self, key: &str, node: NodeId, optional: bool) {
        if self.error.is_some() {
            return;
        }
        if let Some(d) = self.ast.node(node).description() {
            self.out.push_str(&doc_comment(d, "  "));
        }
        let marker = if optional { "?" } else { "" };
        match expr(self.ast, node, self.options, self.resolver) {
            Ok(e) => {
                self.out
                    .push_str(&format!("  {}{marker}: {e};\n", decl_key(key)));
            }
            Err(error) => self.error = Some(error),
        }
    }
}

impl Visitor for MemberEmit<'_> {
    type Cx = ();

    fn property(&mut self, _cx: &(), _owner: NodeId, key: &str, node: NodeId, _next: Next<'_>) {
        self.member_line(key, node, false);
    }

    fn optional_property(
        &mut self,
        _cx: &(),
        _owner: NodeId,
        key: &str,
        node: NodeId,
        _next: Next<'_>,
    ) {
        self.member_line(key, node, true);
    }

    fn mapping(&mut self, _cx: &(), _owner: NodeId, key: &str, arm: NodeId, next: Next<'_>) {
        if self.error.is_some() {
            return;
        }
        let Some(union) = &mut self.union else {
            return;
        };
        let member = union.members[union.arm_index].0.clone();
        union.arm_index += 1;
        let discriminator = union.discriminator.clone();
        let enum_name = union.enum_name.clone();
        let arm_name = self.options.naming.arm_name(self.def_name, key);
        self.out.push('\n');
        if let Some(d) = self.ast.node(arm).description() {
            self.out.push_str(&doc_comment(d, ""));
        }
        self.out
            .push_str(&format!("export interface {arm_name} {{\n"));
        // discriminator member, typed as its enum member; the arm's own
        // properties follow
        self.out.push_str(&format!(
            "  {}: {enum_name}.{member};\n",
            decl_key(&discriminator)
        ));
        next.descend(self, ());
        self.out.push_str("}\n");
    }
}

/// Inline type expression for a (possibly nested) node.
fn expr(
    ast: &Ast,
    id: NodeId,
    options: &Options,
    resolver: &mut dyn Resolve,
) -> Result<String, CompileError> {
    Ok(match ast.kind(id) {
        NodeKind::Any => "any".into(),
        NodeKind::Ref { target } => resolver.type_name(target)?,
        NodeKind::Type { primitive } => options.primitives.get(*primitive).to_string(),
        NodeKind::Enum { values } => {
            if values.is_empty() {
                "never".into()
            } else {
                values
                    .iter()
                    .map(|v| ts_string(v))
                    .collect::<Vec<_>>()
                    .join(" | ")
            }
        }
        NodeKind::Nullable { inner } => {
            format!("{} | null", expr(ast, *inner, options, resolver)?)
        }
        NodeKind::Elements { inner } => {
            let inner = expr(ast, *inner, options, resolver)?;
            if inner.contains('|') {
                format!("({inner})[]")
            } else {
                format!("{inner}[]")
            }
        }
        NodeKind::Values { inner } => {
            format!(
                "{{ [key: string]: {} }}",
                expr(ast, *inner, options, resolver)?
            )
        }
        NodeKind::Object { .. } => inline_object(ast, id, options, resolver, None)?,
        NodeKind::Union {
            discriminator,
            mapping,
        } => {
            if mapping.is_empty() {
                "never".into()
            } else {
                let mut arms = Vec::with_capacity(mapping.len());
                for (key, arm) in mapping {
                    let tag = format!("{}: {}", decl_key(discriminator), ts_string(key));
                    arms.push(inline_object(ast, *arm, options, resolver, Some(tag))?);
                }
                arms.join(" | ")
            }
        }
    })
}

fn inline_object(
    ast: &Ast,
    id: NodeId,
    options: &Options,
    resolver: &mut dyn Resolve,
    head: Option<String>,
) -> Result<String, CompileError> {
    let NodeKind::Object {
        properties,
        optional_properties,
    } = ast.kind(id)
    else {
        return Ok("{}".into());
    };
    let mut parts: Vec<String> = Vec::new();
    if let Some(head) = head {
        parts.push(head);
    }
    for (key, child) in properties {
        parts.push(format!(
            "{}: {}",
            decl_key(key),
            expr(ast, *child, options, resolver)?
        ));
    }
    for (key, child) in optional_properties {
        parts.push(format!(
            "{}?: {}",
            decl_key(key),
            expr(ast, *child, options, resolver)?
        ));
    }
    if parts.is_empty() {
        Ok("{}".into())
    } else {
        Ok(format!("{{ {} }}", parts.join("; ")))
    }
}

// ------------------------------- Tests ------------------------------------ //
