//! Code generation: configuration surface plus the TypeScript text
//! helpers shared by the type and validator compilers.

pub mod naming;
pub mod types;
pub mod validators;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::Primitive;
use crate::error::CompileError;
use naming::{DefaultNaming, NamingPolicy};

/// Literal values for generated enum members and discriminator enums.
/// Affects declarations only; validators always compare against the
/// schema's literal strings, because that is what the data carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumValueStyle {
    /// Member value is the schema's literal string.
    #[default]
    Literal,
    /// Member value is the member's position, as an integer.
    Ordinal,
}

/// Target type text per JTD primitive tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveTypes {
    pub boolean: String,
    pub string: String,
    pub timestamp: String,
    pub float32: String,
    pub float64: String,
    pub int8: String,
    pub uint8: String,
    pub int16: String,
    pub uint16: String,
    pub int32: String,
    pub uint32: String,
}

impl Default for PrimitiveTypes {
    fn default() -> Self {
        Self {
            boolean: "boolean".into(),
            string: "string".into(),
            timestamp: "string".into(),
            float32: "number".into(),
            float64: "number".into(),
            int8: "number".into(),
            uint8: "number".into(),
            int16: "number".into(),
            uint16: "number".into(),
            int32: "number".into(),
            uint32: "number".into(),
        }
    }
}

impl PrimitiveTypes {
    pub fn get(&self, primitive: Primitive) -> &str {
        match primitive {
            Primitive::Boolean => &self.boolean,
            Primitive::String => &self.string,
            Primitive::Timestamp => &self.timestamp,
            Primitive::Float32 => &self.float32,
            Primitive::Float64 => &self.float64,
            Primitive::Int8 => &self.int8,
            Primitive::Uint8 => &self.uint8,
            Primitive::Int16 => &self.int16,
            Primitive::Uint16 => &self.uint16,
            Primitive::Int32 => &self.int32,
            Primitive::Uint32 => &self.uint32,
        }
    }
}

/// Everything overridable about one compile run.
pub struct Options {
    pub naming: Box<dyn NamingPolicy>,
    pub enum_values: EnumValueStyle,
    pub primitives: PrimitiveTypes,
    /// Emit validator functions.
    pub validators: bool,
    /// Emit boolean type-guard wrappers (meaningless without `validators`).
    pub guards: bool,
    /// Import path generated modules use to reach the runtime library.
    pub runtime_path: String,
    /// Local alias for the runtime import.
    pub runtime_alias: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            naming: Box::new(DefaultNaming::default()),
            enum_values: EnumValueStyle::Literal,
            primitives: PrimitiveTypes::default(),
            validators: true,
            guards: true,
            runtime_path: "./runtime".into(),
            runtime_alias: "rt".into(),
        }
    }
}

/// Names a `Ref` target resolves to. Resolution is supplied by the
/// linker; implementations record an import dependency as a side effect
/// of a successful foreign hit, which is why the methods take `&mut`.
pub trait Resolve {
    /// Declared type name for `target`.
    fn type_name(&mut self, target: &str) -> Result<String, CompileError>;
    /// Exported validator function name for `target`.
    fn validator_name(&mut self, target: &str) -> Result<String, CompileError>;
}

// --------------------------- Text helpers --------------------------------- //

static TS_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

/// True when `name` can stand unquoted as a TS property or member name.
pub fn is_ts_ident(name: &str) -> bool {
    TS_IDENT.is_match(name)
}

/// Double-quoted TypeScript string literal.
pub fn ts_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Member access on a value expression: `.name`, or `["odd name"]` when
/// the key is not an identifier.
pub fn ts_member(value: &str, key: &str) -> String {
    if is_ts_ident(key) {
        format!("{value}.{key}")
    } else {
        format!("{value}[{}]", ts_string(key))
    }
}

/// JSON Pointer segment escaping: `~` → `~0`, then `/` → `~1`.
pub fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// `/** … */` block for a metadata description, indented for its site.
pub fn doc_comment(description: &str, indent: &str) -> String {
    if !description.contains('\n') {
        return format!("{indent}/** {description} */\n");
    }
    let mut out = format!("{indent}/**\n");
    for line in description.lines() {
        if line.is_empty() {
            out.push_str(&format!("{indent} *\n"));
        } else {
            out.push_str(&format!("{indent} * {line}\n"));
        }
    }
    out.push_str(&format!("{indent} */\n"));
    out
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_classification() {
        assert!(is_ts_ident("fooBar"));
        assert!(is_ts_ident("_private"));
        assert!(is_ts_ident("$ref"));
        assert!(!is_ts_ident("foo-bar"));
        assert!(!is_ts_ident("1abc"));
        assert!(!is_ts_ident(""));
    }

    #[test]
    fn string_literals_escape_control_characters() {
        assert_eq!(ts_string("plain"), "\"plain\"");
        assert_eq!(ts_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(ts_string("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(ts_string("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn member_access_quotes_non_identifiers() {
        assert_eq!(ts_member("value", "name"), "value.name");
        assert_eq!(ts_member("v1", "first name"), "v1[\"first name\"]");
    }

    #[test]
    fn pointer_segments_escape_tilde_before_slash() {
        assert_eq!(escape_pointer_segment("a/b"), "a~1b");
        assert_eq!(escape_pointer_segment("a~b"), "a~0b");
        assert_eq!(escape_pointer_segment("~/"), "~0~1");
    }

    #[test]
    fn doc_comments_pick_single_or_multi_line_shape() {
        assert_eq!(doc_comment("one line", ""), "/** one line */\n");
        assert_eq!(
            doc_comment("two\nlines", "  "),
            "  /**\n   * two\n   * lines\n   */\n"
        );
    }
}
