//! Cross-module reference linking and the `compile` entry point.
//!
//! Every module is parsed before any module is compiled, so reference
//! resolution always scans the full set. A foreign hit records an import
//! dependency as a side effect; a same-module hit does not. Compilation
//! is a pure function of its inputs: identical inputs yield byte-identical
//! sources, and definitions emit in their dictionary's insertion order.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::ast::Ast;
use crate::build::build_module;
use crate::codegen::types::compile_declarations;
use crate::codegen::validators::{compile_validators, TsValidatorDialect};
use crate::codegen::{ts_string, Options, Resolve};
use crate::error::CompileError;
use crate::schema::SchemaDef;

/// Names a definition exports to the rest of the module set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub type_name: String,
    pub validator_name: String,
    pub guard_name: String,
}

/// One schema dictionary, parsed and ready to compile.
#[derive(Debug)]
pub struct Module {
    pub id: String,
    pub ast: Ast,
    pub exports: IndexMap<String, Export>,
}

/// Compile a named collection of schema dictionaries into one generated
/// source per module.
pub fn compile(
    modules: &IndexMap<String, IndexMap<String, SchemaDef>>,
    options: &Options,
) -> Result<IndexMap<String, String>, CompileError> {
    let parsed = parse_modules(modules, options)?;
    let mut out = IndexMap::with_capacity(parsed.len());
    for current in 0..parsed.len() {
        let source = compile_module(&parsed, current, options)?;
        out.insert(parsed[current].id.clone(), source);
    }
    Ok(out)
}

/// Compile one standalone dictionary (no foreign references).
pub fn compile_one(
    id: &str,
    defs: &IndexMap<String, SchemaDef>,
    options: &Options,
) -> Result<String, CompileError> {
    let mut modules = IndexMap::new();
    modules.insert(id.to_string(), defs.clone());
    let mut sources = compile(&modules, options)?;
    Ok(sources.swap_remove(id).unwrap_or_default())
}

fn parse_modules(
    modules: &IndexMap<String, IndexMap<String, SchemaDef>>,
    options: &Options,
) -> Result<Vec<Module>, CompileError> {
    let mut parsed = Vec::with_capacity(modules.len());
    for (id, defs) in modules {
        let ast = build_module(defs)?;
        let exports = ast
            .definitions
            .keys()
            .map(|name| {
                (
                    name.clone(),
                    Export {
                        type_name: options.naming.type_name(name),
                        validator_name: options.naming.validator_name(name),
                        guard_name: options.naming.guard_name(name),
                    },
                )
            })
            .collect();
        parsed.push(Module {
            id: id.clone(),
            ast,
            exports,
        });
    }
    Ok(parsed)
}

fn compile_module(
    modules: &[Module],
    current: usize,
    options: &Options,
) -> Result<String, CompileError> {
    let module = &modules[current];
    let mut resolver = LinkResolver {
        modules,
        current,
        imports: IndexMap::new(),
    };

    let declarations = compile_declarations(&module.ast, options, &mut resolver)?;
    let validators = if options.validators {
        let mut dialect = TsValidatorDialect::new(&module.ast, options, &mut resolver);
        Some(compile_validators(&module.ast, options, &mut dialect)?)
    } else {
        None
    };

    // header: runtime import first, then one statement per foreign module,
    // sorted by path, symbols alphabetical within each statement
    let mut out = String::new();
    if options.validators {
        out.push_str(&format!(
            "import * as {} from {};\n",
            options.runtime_alias,
            ts_string(&options.runtime_path)
        ));
    }
    let mut statements: Vec<(String, BTreeSet<String>)> = resolver
        .imports
        .into_iter()
        .map(|(id, names)| (relative_import(&module.id, &id), names))
        .collect();
    statements.sort_by(|a, b| a.0.cmp(&b.0));
    for (path, names) in &statements {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        out.push_str(&format!(
            "import {{ {} }} from {};\n",
            names.join(", "),
            ts_string(path)
        ));
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&declarations);
    if let Some(validators) = validators {
        out.push('\n');
        out.push_str(&validators);
    }
    Ok(out)
}

/// Scans the full module set; a hit in the compiling module returns the
/// name directly, a hit elsewhere records the symbol under the foreign
/// module's id.
struct LinkResolver<'a> {
    modules: &'a [Module],
    current: usize,
    imports: IndexMap<String, BTreeSet<String>>,
}

impl LinkResolver<'_> {
    fn lookup(
        &mut self,
        target: &str,
        pick: fn(&Export) -> &String,
    ) -> Result<String, CompileError> {
        if let Some(export) = self.modules[self.current].exports.get(target) {
            return Ok(pick(export).clone());
        }
        for (i, module) in self.modules.iter().enumerate() {
            if i == self.current {
                continue;
            }
            if let Some(export) = module.exports.get(target) {
                let name = pick(export).clone();
                self.imports
                    .entry(module.id.clone())
                    .or_default()
                    .insert(name.clone());
                return Ok(name);
            }
        }
        Err(CompileError::UnresolvedReference {
            target: target.to_string(),
            module: self.modules[self.current].id.clone(),
        })
    }
}

impl Resolve for LinkResolver<'_> {
    fn type_name(&mut self, target: &str) -> Result<String, CompileError> {
        self.lookup(target, |e| &e.type_name)
    }

    fn validator_name(&mut self, target: &str) -> Result<String, CompileError> {
        self.lookup(target, |e| &e.validator_name)
    }
}

// --------------------------- Relative paths ------------------------------- //

/// Relative import path from module `from` to module `to`. Identities are
/// compared extension-agnostically, so `./a.json` and `./a` denote the
/// same module and emitted paths never carry a source extension.
pub fn relative_import(from: &str, to: &str) -> String {
    let from = strip_extension(split_id(from));
    let to = strip_extension(split_id(to));
    let from_dir = &from[..from.len().saturating_sub(1)];
    let mut common = 0;
    while common < from_dir.len() && common < to.len() && from_dir[common] == to[common] {
        common += 1;
    }
    let ups = from_dir.len() - common;
    let mut out = String::new();
    if ups == 0 {
        out.push_str("./");
    } else {
        for _ in 0..ups {
            out.push_str("../");
        }
    }
    out.push_str(&to[common..].join("/"));
    out
}

fn split_id(id: &str) -> Vec<String> {
    id.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .map(str::to_string)
        .collect()
}

fn strip_extension(mut parts: Vec<String>) -> Vec<String> {
    if let Some(last) = parts.last_mut() {
        if let Some(dot) = last.rfind('.') {
            if dot > 0 {
                last.truncate(dot);
            }
        }
    }
    parts
}

// ------------------------------- Tests ------------------------------------ //
