//! Compile-time failures. These abort the whole compile call; nothing is
//! partially emitted. Validation-time problems (`required`, `illegalType`,
//! `invalid`) are a different animal entirely: they are collected by the
//! generated code at runtime and never surface as Rust errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A key claimed by both `properties` and `optionalProperties`.
    #[error("property `{key}` appears in both properties and optionalProperties")]
    DuplicateProperty { key: String },

    #[error("discriminator and mapping must be given together")]
    MalformedUnion,

    /// Mapping arms must classify as object schemas.
    #[error("mapping arm `{key}` is not an object schema")]
    InvalidMapping { key: String },

    #[error("unknown type tag `{tag}`")]
    UnknownType { tag: String },

    /// Two definitions (given or hoisted) under one name in one module.
    #[error("definition `{name}` is declared more than once in one module")]
    DuplicateDefinition { name: String },

    #[error("unresolved reference `{target}` while compiling module `{module}`")]
    UnresolvedReference { target: String, module: String },
}
