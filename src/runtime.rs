//! The TypeScript runtime helper library consumed by generated code.
//! Shipped verbatim next to the generated modules; never generated.

/// File name the CLI writes the helpers under.
pub const RUNTIME_FILE: &str = "runtime.ts";

/// Full source of the helper library.
pub const RUNTIME_SOURCE: &str = include_str!("runtime.ts");
