//! Compile JSON Type Definition (RFC 8927) schemas into TypeScript type
//! declarations and runtime structural validators.
//!
//! Pipeline: a raw [`schema::SchemaDef`] document is parsed into an
//! arena-backed [`ast::Ast`]; a single generic traversal engine
//! ([`traverse`]) drives both the type-declaration compiler and the
//! validator dialect; the [`link`] layer resolves references across
//! modules into import statements and exposes the pure
//! [`compile`](link::compile) entry point.
//!
//! Compilation is synchronous and deterministic: identical inputs yield
//! byte-identical sources, and definitions emit in the order their
//! dictionary declares them.

pub mod ast;
pub mod build;
pub mod cli;
pub mod codegen;
pub mod error;
pub mod link;
pub mod runtime;
pub mod schema;
pub mod traverse;

pub use crate::codegen::Options;
pub use crate::error::CompileError;
pub use crate::link::{compile, compile_one};
pub use crate::schema::SchemaDef;
