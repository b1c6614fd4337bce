//! Identifier derivation for generated declarations.
//!
//! One method per renamable entity; the linker applies the policy once per
//! definition when it computes a module's export table, so implementations
//! must be pure and deterministic.

use once_cell::sync::Lazy;
use regex::Regex;

pub trait NamingPolicy {
    /// Declared type/interface/enum name for a definition.
    fn type_name(&self, def: &str) -> String;
    /// Exported validator function name.
    fn validator_name(&self, def: &str) -> String;
    /// Exported boolean type-guard name.
    fn guard_name(&self, def: &str) -> String;
    /// Synthetic discriminator-enum name for a union definition.
    fn union_enum_name(&self, def: &str, discriminator: &str) -> String;
    /// Interface name for one union mapping arm.
    fn arm_name(&self, def: &str, key: &str) -> String;
    /// Identifier for one enum member. `index` is the member's position;
    /// policies use it to rescue values that make poor identifiers.
    fn enum_member(&self, index: usize, value: &str) -> String;
}

/// Pascal-casing with an optional fixed prefix.
#[derive(Debug, Clone, Default)]
pub struct DefaultNaming {
    pub prefix: Option<String>,
}

impl DefaultNaming {
    fn base(&self, def: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", pascal(prefix), pascal(def)),
            None => pascal(def),
        }
    }
}

impl NamingPolicy for DefaultNaming {
    fn type_name(&self, def: &str) -> String {
        self.base(def)
    }

    fn validator_name(&self, def: &str) -> String {
        format!("validate{}", self.base(def))
    }

    fn guard_name(&self, def: &str) -> String {
        format!("is{}", self.base(def))
    }

    fn union_enum_name(&self, def: &str, discriminator: &str) -> String {
        format!("{}{}", self.base(def), pascal(discriminator))
    }

    fn arm_name(&self, def: &str, key: &str) -> String {
        format!("{}{}", self.base(def), pascal(key))
    }

    fn enum_member(&self, index: usize, value: &str) -> String {
        let name = pascal(value);
        if name.is_empty() {
            return format!("Value{index}");
        }
        if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return format!("V{name}");
        }
        name
    }
}

static WORD: Lazy<Regex> = Lazy::new(|| {
    // ASCII word runs; everything else separates
    Regex::new(r"[A-Za-z0-9]+").unwrap()
});

/// PascalCase over word runs: `shared_user-id` → `SharedUserId`. Interior
/// camel humps are kept as written (`userId` → `UserId`).
pub fn pascal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in WORD.find_iter(text) {
        let mut chars = word.as_str().chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

// ------------------------------- Tests ------------------------------------ //
