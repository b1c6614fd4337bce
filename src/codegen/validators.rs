//! Validator codegen.
//!
//! A dialect is the per-node-kind strategy: it implements the traversal
//! engine's `Visitor` over a threaded `EmitCx` and writes code fragments
//! into its current function buffer. The compiler drives the dialect over
//! each definition and wraps the finished body into one exported function
//! (plus an optional boolean type guard).
//!
//! Generated functions share a fixed calling convention:
//! `(value, context?, pointer?) → errors-or-undefined`. They never throw;
//! problems are appended to `context.errors` with their JSON Pointer.

use crate::ast::{Ast, NodeId, NodeKind, Primitive};
use crate::codegen::{escape_pointer_segment, ts_member, ts_string, Options, Resolve};
use crate::error::CompileError;
use crate::traverse::{walk, Next, Visitor};

/// Codegen context threaded through one recursive descent: the expression
/// denoting the value under check and the expression denoting its
/// accumulated JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitCx {
    pub value: String,
    pub pointer: String,
}

/// One finished function body plus the constants hoisted out of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedFunction {
    /// Module-level literal-cache constants, in slot-allocation order.
    pub constants: Vec<String>,
    /// Statement lines, already indented one level.
    pub body: String,
}

/// A validator back end: per-kind fragment emission via `Visitor`, plus
/// the per-function bracketing the compiler drives.
pub trait ValidatorDialect: Visitor<Cx = EmitCx> {
    /// Reset per-function state for `validator_name`.
    fn begin(&mut self, validator_name: &str);
    /// Take the finished fragment set for the current function.
    fn finish(&mut self) -> EmittedFunction;
    /// First error hit while emitting, if any.
    fn take_error(&mut self) -> Option<CompileError>;
}

/// The built-in TypeScript dialect.
pub struct TsValidatorDialect<'a> {
    ast: &'a Ast,
    options: &'a Options,
    resolver: &'a mut dyn Resolve,
    // per-function state
    fn_key: String,
    constants: Vec<String>,
    slot: usize,
    body: String,
    indent: usize,
    vars: usize,
    error: Option<CompileError>,
}

impl<'a> TsValidatorDialect<'a> {
    pub fn new(ast: &'a Ast, options: &'a Options, resolver: &'a mut dyn Resolve) -> Self {
        Self {
            ast,
            options,
            resolver,
            fn_key: String::new(),
            constants: Vec::new(),
            slot: 0,
            body: String::new(),
            indent: 1,
            vars: 0,
            error: None,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.body.push_str("  ");
        }
        self.body.push_str(text);
        self.body.push('\n');
    }

    /// Memoize an invariant expression once per generated function and
    /// return the identifier the body should use. Slots are keyed by
    /// allocation order, so repeated literals in one function never
    /// collide.
    fn cache(&mut self, expr: &str) -> String {
        let name = format!("{}_LIT_{}", self.fn_key, self.slot);
        self.slot += 1;
        self.constants.push(format!("const {name} = {expr};"));
        name
    }

    fn fresh(&mut self) -> usize {
        self.vars += 1;
        self.vars
    }
}

/// `"/escaped-key"` as a TS string literal, ready to append to a pointer
/// expression.
fn pointer_literal(key: &str) -> String {
    ts_string(&format!("/{}", escape_pointer_segment(key)))
}

/// Checker call per primitive tag. Total by construction: unknown tags
/// never reach codegen (rejected at build time).
fn primitive_call(rt: &str, primitive: Primitive, value: &str, pointer: &str) -> String {
    match primitive {
        Primitive::Boolean => format!("{rt}.checkBoolean({value}, context, {pointer});"),
        Primitive::String => format!("{rt}.checkString({value}, context, {pointer});"),
        Primitive::Timestamp => format!("{rt}.checkTimestamp({value}, context, {pointer});"),
        Primitive::Float32 | Primitive::Float64 => {
            format!("{rt}.checkNumber({value}, context, {pointer});")
        }
        p => {
            let (min, max) = p.integer_bounds().unwrap_or((0, 0));
            format!("{rt}.checkInteger({value}, context, {pointer}, {min}, {max});")
        }
    }
}

impl Visitor for TsValidatorDialect<'_> {
    type Cx = EmitCx;

    // Any always passes; nothing to emit.
    fn any(&mut self, _cx: &EmitCx, _id: NodeId) {}

    fn reference(&mut self, cx: &EmitCx, _id: NodeId, target: &str) {
        if self.error.is_some() {
            return;
        }
        // recursion happens in the generated code, never in the generator
        match self.resolver.validator_name(target) {
            Ok(name) => self.line(&format!("{name}({}, context, {});", cx.value, cx.pointer)),
            Err(error) => self.error = Some(error),
        }
    }

    fn primitive(&mut self, cx: &EmitCx, _id: NodeId, primitive: Primitive) {
        if self.error.is_some() {
            return;
        }
        let call = primitive_call(&self.options.runtime_alias, primitive, &cx.value, &cx.pointer);
        self.line(&call);
    }

    fn enumeration(&mut self, cx: &EmitCx, _id: NodeId, values: &[String]) {
        if self.error.is_some() {
            return;
        }
        let literal = format!(
            "[{}]",
            values
                .iter()
                .map(|v| ts_string(v))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let cached = self.cache(&literal);
        self.line(&format!(
            "{}.checkEnum({}, context, {}, {cached});",
            self.options.runtime_alias, cx.value, cx.pointer
        ));
    }

    fn nullable(&mut self, cx: &EmitCx, _id: NodeId, inner: NodeId, next: Next<'_>) {
        if self.error.is_some() || self.ast.is_unconstrained(inner) {
            return;
        }
        self.line(&format!("if ({} !== null) {{", cx.value));
        self.indent += 1;
        next.descend(self, cx.clone());
        self.indent -= 1;
        self.line("}");
    }

    fn elements(&mut self, cx: &EmitCx, _id: NodeId, inner: NodeId, next: Next<'_>) {
        if self.error.is_some() {
            return;
        }
        let guard = format!(
            "{}.checkArray({}, context, {})",
            self.options.runtime_alias, cx.value, cx.pointer
        );
        if self.ast.is_unconstrained(inner) {
            self.line(&format!("{guard};"));
            return;
        }
        let n = self.fresh();
        self.line(&format!("if ({guard}) {{"));
        self.indent += 1;
        self.line(&format!(
            "for (let i{n} = 0; i{n} < {}.length; i{n}++) {{",
            cx.value
        ));
        self.indent += 1;
        self.line(&format!("const v{n} = {}[i{n}];", cx.value));
        self.line(&format!("const p{n} = {} + \"/\" + i{n};", cx.pointer));
        next.descend(
            self,
            EmitCx {
                value: format!("v{n}"),
                pointer: format!("p{n}"),
            },
        );
        self.indent -= 1;
        self.line("}");
        self.indent -= 1;
        self.line("}");
    }

    fn values(&mut self, cx: &EmitCx, _id: NodeId, inner: NodeId, next: Next<'_>) {
        if self.error.is_some() {
            return;
        }
        let rt = self.options.runtime_alias.clone();
        let guard = format!("{rt}.checkObject({}, context, {})", cx.value, cx.pointer);
        if self.ast.is_unconstrained(inner) {
            self.line(&format!("{guard};"));
            return;
        }
        let n = self.fresh();
        self.line(&format!("if ({guard}) {{"));
        self.indent += 1;
        self.line(&format!("for (const k{n} of {rt}.keys({})) {{", cx.value));
        self.indent += 1;
        self.line(&format!("const v{n} = {}[k{n}];", cx.value));
        self.line(&format!(
            "const p{n} = {} + \"/\" + {rt}.escapePointer(k{n});",
            cx.pointer
        ));
        next.descend(
            self,
            EmitCx {
                value: format!("v{n}"),
                pointer: format!("p{n}"),
            },
        );
        self.indent -= 1;
        self.line("}");
        self.indent -= 1;
        self.line("}");
    }

    fn object(&mut self, cx: &EmitCx, id: NodeId, next: Next<'_>) {
        if self.error.is_some() {
            return;
        }
        let guard = format!(
            "{}.checkObject({}, context, {})",
            self.options.runtime_alias, cx.value, cx.pointer
        );
        let constrained = match self.ast.kind(id) {
            NodeKind::Object {
                properties,
                optional_properties,
            } => properties
                .iter()
                .chain(optional_properties)
                .any(|(_, n)| !self.ast.is_unconstrained(*n)),
            _ => false,
        };
        if !constrained {
            // nothing inside can fail; the bare structural guard is the
            // whole check
            self.line(&format!("{guard};"));
            return;
        }
        self.line(&format!("if ({guard}) {{"));
        self.indent += 1;
        next.descend(self, cx.clone());
        self.indent -= 1;
        self.line("}");
    }

    fn property(&mut self, cx: &EmitCx, _owner: NodeId, key: &str, node: NodeId, next: Next<'_>) {
        if self.error.is_some() || self.ast.is_unconstrained(node) {
            return;
        }
        let n = self.fresh();
        self.line(&format!("const v{n} = {};", ts_member(&cx.value, key)));
        self.line(&format!(
            "const p{n} = {} + {};",
            cx.pointer,
            pointer_literal(key)
        ));
        // recurse unconditionally; the runtime checkers report `required`
        // when the bound value is undefined
        next.descend(
            self,
            EmitCx {
                value: format!("v{n}"),
                pointer: format!("p{n}"),
            },
        );
    }

    fn optional_property(
        &mut self,
        cx: &EmitCx,
        _owner: NodeId,
        key: &str,
        node: NodeId,
        next: Next<'_>,
    ) {
        if self.error.is_some() || self.ast.is_unconstrained(node) {
            return;
        }
        let n = self.fresh();
        self.line(&format!("const v{n} = {};", ts_member(&cx.value, key)));
        self.line(&format!("if (v{n} !== undefined) {{"));
        self.indent += 1;
        self.line(&format!(
            "const p{n} = {} + {};",
            cx.pointer,
            pointer_literal(key)
        ));
        next.descend(
            self,
            EmitCx {
                value: format!("v{n}"),
                pointer: format!("p{n}"),
            },
        );
        self.indent -= 1;
        self.line("}");
    }

    fn union(&mut self, cx: &EmitCx, _id: NodeId, discriminator: &str, next: Next<'_>) {
        if self.error.is_some() {
            return;
        }
        let rt = self.options.runtime_alias.clone();
        let guard = format!("{rt}.checkObject({}, context, {})", cx.value, cx.pointer);
        let switch = format!("switch ({}) {{", ts_member(&cx.value, discriminator));
        let miss = format!(
            "{rt}.invalidDiscriminator(context, {} + {});",
            cx.pointer,
            pointer_literal(discriminator)
        );
        self.line(&format!("if ({guard}) {{"));
        self.indent += 1;
        self.line(&switch);
        self.indent += 1;
        next.descend(self, cx.clone());
        // unmatched discriminator values land here, reported at the
        // discriminator's own pointer
        self.line("default: {");
        self.indent += 1;
        self.line(&miss);
        self.line("break;");
        self.indent -= 1;
        self.line("}");
        self.indent -= 1;
        self.line("}");
        self.indent -= 1;
        self.line("}");
    }

    fn mapping(&mut self, cx: &EmitCx, _owner: NodeId, key: &str, _arm: NodeId, next: Next<'_>) {
        if self.error.is_some() {
            return;
        }
        self.line(&format!("case {}: {{", ts_string(key)));
        self.indent += 1;
        // the arm's members; the discriminator itself is not re-validated
        next.descend(self, cx.clone());
        self.line("break;");
        self.indent -= 1;
        self.line("}");
    }
}

impl ValidatorDialect for TsValidatorDialect<'_> {
    fn begin(&mut self, validator_name: &str) {
        self.fn_key = screaming_snake(validator_name);
        self.constants.clear();
        self.slot = 0;
        self.body.clear();
        self.indent = 1;
        self.vars = 0;
        self.error = None;
    }

    fn finish(&mut self) -> EmittedFunction {
        EmittedFunction {
            constants: std::mem::take(&mut self.constants),
            body: std::mem::take(&mut self.body),
        }
    }

    fn take_error(&mut self) -> Option<CompileError> {
        self.error.take()
    }
}

/// Drive `dialect` over every definition, assembling one exported
/// function per definition plus optional type-guard wrappers.
pub fn compile_validators<D: ValidatorDialect>(
    ast: &Ast,
    options: &Options,
    dialect: &mut D,
) -> Result<String, CompileError> {
    let mut out = String::new();
    for (i, (name, id)) in ast.definitions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let validator_name = options.naming.validator_name(name);
        dialect.begin(&validator_name);
        walk(
            ast,
            *id,
            dialect,
            EmitCx {
                value: "value".into(),
                pointer: "pointer".into(),
            },
        );
        if let Some(error) = dialect.take_error() {
            return Err(error);
        }
        let emitted = dialect.finish();
        for constant in &emitted.constants {
            out.push_str(constant);
            out.push('\n');
        }
        let rt = &options.runtime_alias;
        out.push_str(&format!(
            "export function {validator_name}(value: any, context: {rt}.Context = {rt}.newContext(), pointer: string = \"\"): {rt}.ValidationError[] | undefined {{\n"
        ));
        // identity-set cycle guard: a value already visited on this call
        // is skipped, never reported
        out.push_str("  if (typeof value === \"object\" && value !== null) {\n");
        out.push_str("    if (context.excluded.has(value)) {\n");
        out.push_str("      return undefined;\n");
        out.push_str("    }\n");
        out.push_str("    context.excluded.add(value);\n");
        out.push_str("  }\n");
        out.push_str(&emitted.body);
        out.push_str("  return context.errors.length > 0 ? context.errors : undefined;\n");
        out.push_str("}\n");
        if options.guards {
            let guard_name = options.naming.guard_name(name);
            let type_name = options.naming.type_name(name);
            out.push('\n');
            out.push_str(&format!(
                "export function {guard_name}(value: any): value is {type_name} {{\n"
            ));
            // fail-fast context: the first recorded error stops the rest
            out.push_str(&format!(
                "  return {validator_name}(value, {rt}.newContext(true)) === undefined;\n"
            ));
            out.push_str("}\n");
        }
    }
    Ok(out)
}

fn screaming_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(c.to_uppercase());
    }
    out
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_root;
    use crate::codegen::naming::pascal;
    use crate::schema::SchemaDef;
    use serde_json::json;

    struct Names;

    impl Resolve for Names {
        fn type_name(&mut self, target: &str) -> Result<String, CompileError> {
            Ok(pascal(target))
        }

        fn validator_name(&mut self, target: &str) -> Result<String, CompileError> {
            Ok(format!("validate{}", pascal(target)))
        }
    }

    fn generate_with(options: &Options, name: &str, v: serde_json::Value) -> String {
        let def: SchemaDef = serde_json::from_value(v).expect("schema fixture");
        let mut ast = Ast::new();
        build_root(&mut ast, name, &def).expect("builds");
        let mut names = Names;
        let mut dialect = TsValidatorDialect::new(&ast, options, &mut names);
        compile_validators(&ast, options, &mut dialect).expect("compiles")
    }

    fn generate(name: &str, v: serde_json::Value) -> String {
        generate_with(&Options::default(), name, v)
    }

    #[test]
    fn signature_and_bracketing_are_fixed() {
        let out = generate("age", json!({"type": "int8"}));
        let expected = "\
export function validateAge(value: any, context: rt.Context = rt.newContext(), pointer: string = \"\"): rt.ValidationError[] | undefined {
  if (typeof value === \"object\" && value !== null) {
    if (context.excluded.has(value)) {
      return undefined;
    }
    context.excluded.add(value);
  }
  rt.checkInteger(value, context, pointer, -128, 127);
  return context.errors.length > 0 ? context.errors : undefined;
}

export function isAge(value: any): value is Age {
  return validateAge(value, rt.newContext(true)) === undefined;
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn primitive_checkers_come_from_the_tag_table() {
        let cases = [
            (json!({"type": "boolean"}), "rt.checkBoolean(value, context, pointer);"),
            (json!({"type": "string"}), "rt.checkString(value, context, pointer);"),
            (json!({"type": "timestamp"}), "rt.checkTimestamp(value, context, pointer);"),
            (json!({"type": "float64"}), "rt.checkNumber(value, context, pointer);"),
            (json!({"type": "uint8"}), "rt.checkInteger(value, context, pointer, 0, 255);"),
            (
                json!({"type": "int32"}),
                "rt.checkInteger(value, context, pointer, -2147483648, 2147483647);",
            ),
        ];
        for (schema, line) in cases {
            let out = generate("x", schema.clone());
            assert!(out.contains(line), "missing `{line}` for {schema} in:\n{out}");
        }
    }

    #[test]
    fn unconstrained_definitions_emit_empty_bodies() {
        let out = generate("free", json!({}));
        assert!(!out.contains("check"), "got:\n{out}");
        let out = generate("free", json!({"nullable": true}));
        assert!(!out.contains("!== null"), "nullable-of-any elides the guard:\n{out}");
    }

    #[test]
    fn nullable_guards_constrained_inners() {
        let out = generate("age", json!({"type": "int8", "nullable": true}));
        assert!(out.contains("  if (value !== null) {\n    rt.checkInteger(value, context, pointer, -128, 127);\n  }\n"), "got:\n{out}");
    }

    #[test]
    fn enum_literal_is_cached_per_function_slot() {
        let out = generate("role", json!({"enum": ["admin", "user"]}));
        assert!(
            out.contains("const VALIDATE_ROLE_LIT_0 = [\"admin\", \"user\"];\n"),
            "got:\n{out}"
        );
        assert!(
            out.contains("rt.checkEnum(value, context, pointer, VALIDATE_ROLE_LIT_0);"),
            "got:\n{out}"
        );
    }

    #[test]
    fn repeated_enums_get_distinct_slots() {
        let out = generate(
            "pair",
            json!({
                "properties": {
                    "a": { "enum": ["x", "y"] },
                    "b": { "enum": ["x", "y"] }
                }
            }),
        );
        assert!(out.contains("VALIDATE_PAIR_LIT_0"), "got:\n{out}");
        assert!(out.contains("VALIDATE_PAIR_LIT_1"), "got:\n{out}");
    }

    #[test]
    fn elements_loop_binds_fresh_value_and_pointer() {
        let out = generate("names", json!({"elements": {"type": "string"}}));
        let expected = "\
  if (rt.checkArray(value, context, pointer)) {
    for (let i1 = 0; i1 < value.length; i1++) {
      const v1 = value[i1];
      const p1 = pointer + \"/\" + i1;
      rt.checkString(v1, context, p1);
    }
  }
";
        assert!(out.contains(expected), "got:\n{out}");
    }

    #[test]
    fn unconstrained_elements_keep_only_the_structural_guard() {
        let out = generate("list", json!({"elements": {}}));
        assert!(out.contains("  rt.checkArray(value, context, pointer);\n"), "got:\n{out}");
        assert!(!out.contains("for ("), "no loop expected:\n{out}");
    }

    #[test]
    fn values_loop_escapes_dynamic_keys() {
        let out = generate("counts", json!({"values": {"type": "uint32"}}));
        let expected = "\
  if (rt.checkObject(value, context, pointer)) {
    for (const k1 of rt.keys(value)) {
      const v1 = value[k1];
      const p1 = pointer + \"/\" + rt.escapePointer(k1);
      rt.checkInteger(v1, context, p1, 0, 4294967295);
    }
  }
";
        assert!(out.contains(expected), "got:\n{out}");
    }

    #[test]
    fn fully_unconstrained_objects_keep_only_the_guard() {
        let out = generate("bag", json!({"properties": {"a": {}}, "optionalProperties": {"b": {}}}));
        assert!(out.contains("  rt.checkObject(value, context, pointer);\n"), "got:\n{out}");
        assert!(!out.contains("const v"), "no member bindings expected:\n{out}");
    }

    #[test]
    fn properties_bind_and_recurse_unconditionally() {
        let out = generate(
            "user",
            json!({
                "properties": { "email": { "type": "string" } },
                "optionalProperties": { "age": { "type": "int8" } }
            }),
        );
        let expected = "\
  if (rt.checkObject(value, context, pointer)) {
    const v1 = value.email;
    const p1 = pointer + \"/email\";
    rt.checkString(v1, context, p1);
    const v2 = value.age;
    if (v2 !== undefined) {
      const p2 = pointer + \"/age\";
      rt.checkInteger(v2, context, p2, -128, 127);
    }
  }
";
        assert!(out.contains(expected), "got:\n{out}");
    }

    #[test]
    fn property_keys_are_pointer_escaped() {
        let out = generate(
            "odd",
            json!({"properties": { "a/b~c": { "type": "string" } }}),
        );
        assert!(out.contains("const p1 = pointer + \"/a~1b~0c\";"), "got:\n{out}");
        assert!(out.contains("const v1 = value[\"a/b~c\"];"), "got:\n{out}");
    }

    #[test]
    fn union_dispatch_reports_misses_at_the_discriminator() {
        let out = generate(
            "event",
            json!({
                "discriminator": "kind",
                "mapping": {
                    "AAA": { "properties": { "x": { "type": "string" } } },
                    "BBB": { "properties": {} }
                }
            }),
        );
        let expected = "\
  if (rt.checkObject(value, context, pointer)) {
    switch (value.kind) {
      case \"AAA\": {
        const v1 = value.x;
        const p1 = pointer + \"/x\";
        rt.checkString(v1, context, p1);
        break;
      }
      case \"BBB\": {
        break;
      }
      default: {
        rt.invalidDiscriminator(context, pointer + \"/kind\");
        break;
      }
    }
  }
";
        assert!(out.contains(expected), "got:\n{out}");
    }

    #[test]
    fn refs_call_the_target_validator() {
        let out = generate(
            "tree",
            json!({
                "definitions": {
                    "node": { "properties": { "children": { "elements": { "ref": "node" } } } }
                },
                "ref": "node"
            }),
        );
        // the cyclic definition compiles to a plain call, no structural
        // recursion in the generator
        assert!(out.contains("validateNode(v2, context, p2);"), "got:\n{out}");
        assert!(out.contains("export function validateTree"), "got:\n{out}");
        assert!(out.contains("validateNode(value, context, pointer);"), "got:\n{out}");
    }

    #[test]
    fn guards_can_be_disabled() {
        let options = Options {
            guards: false,
            ..Options::default()
        };
        let out = generate_with(&options, "age", json!({"type": "int8"}));
        assert!(!out.contains("value is "), "got:\n{out}");
    }
}
