//! Field-type synthesis for the emitted record: `%type` annotations for
//! user nonterminals, synthesised tuples for auxiliaries, and the
//! terminal-name to Rust-type mapping.

use std::collections::BTreeMap;

use rustburg_core::ast::{Spec, VarTy};
use rustburg_core::error::Error;

/// Rust keywords that need a raw-identifier prefix when they appear as a
/// record field. `self`/`Self`/`super`/`crate` cannot be raw identifiers
/// and pass through; names in generated positions never collide with
/// them in practice.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while",
];

/// Emit a nonterminal name as a record field. Keywords become raw
/// identifiers; names beginning with `_` pass through untouched.
pub fn field(name: &str) -> String {
    if !name.starts_with('_') && KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_owned()
    }
}

/// The Rust type a terminal name denotes in emitted code. The
/// predeclared terminals map to std types; `%term`-declared names are
/// emitted verbatim and must be supplied by the head code.
pub fn rust_terminal(name: &str) -> &str {
    match name {
        "int" => "i64",
        "string" => "String",
        "char" => "char",
        other => other,
    }
}

/// Compute the record field type of every nonterminal.
///
/// User nonterminals take their `%type` annotation -- user action code is
/// spliced into emitted function bodies, so the field cannot stay
/// polymorphic and a missing annotation is fatal. Auxiliaries take the
/// tuple over their value shape (see
/// [`rustburg_core::normalize::aux_shapes`]).
pub fn field_types(
    spec: &Spec,
    nonterms: &[&str],
    shapes: &BTreeMap<String, Vec<VarTy>>,
) -> Result<BTreeMap<String, String>, Error> {
    let mut tys = BTreeMap::new();
    for n in nonterms {
        let ty = if n.starts_with('_') {
            let shape = shapes.get(*n).cloned().unwrap_or_default();
            let mut parts = Vec::new();
            for component in &shape {
                parts.push(component_type(spec, component)?);
            }
            tuple_type(&parts)
        } else {
            user_type(spec, n)?
        };
        tys.insert((*n).to_owned(), ty);
    }
    Ok(tys)
}

fn user_type(spec: &Spec, nonterm: &str) -> Result<String, Error> {
    match spec.types.get(nonterm) {
        Some(code) => Ok(code.text().to_owned()),
        None => Err(Error::MissingTypeAnnotation {
            nonterm: nonterm.to_owned(),
        }),
    }
}

fn component_type(spec: &Spec, ty: &VarTy) -> Result<String, Error> {
    match ty {
        VarTy::Terminal(t) => Ok(rust_terminal(t).to_owned()),
        VarTy::Nonterm(n) => user_type(spec, n),
    }
}

fn tuple_type(parts: &[String]) -> String {
    match parts.len() {
        0 => "()".to_owned(),
        1 => format!("({},)", parts[0]),
        _ => format!("({})", parts.join(", ")),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
