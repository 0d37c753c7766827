//! Constructor signature inference: fold every constructor occurrence in
//! the rule set into a name-keyed argument-kind signature map, failing on
//! the first inconsistent use.

use std::collections::BTreeMap;
use std::fmt;

use crate::ast::{Literal, Pattern, Rule, VarTy};
use crate::error::Error;

/// The kind of one constructor argument position: monomorphic of a named
/// terminal type, or polymorphic (accepts any nonterminal value or nested
/// constructor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKind {
    Mono(String),
    Poly,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Mono(t) => write!(f, "{}", t),
            ArgKind::Poly => write!(f, "*"),
        }
    }
}

/// A constructor's argument signature, one kind per position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConSig(pub Vec<ArgKind>);

impl ConSig {
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    fn of_args(args: &[Pattern]) -> ConSig {
        ConSig(args.iter().map(arg_kind).collect())
    }
}

impl fmt::Display for ConSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, k) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", k)?;
        }
        write!(f, ")")
    }
}

fn arg_kind(arg: &Pattern) -> ArgKind {
    match arg {
        Pattern::Lit(Literal::Int(_)) => ArgKind::Mono("int".to_owned()),
        Pattern::Lit(Literal::Str(_)) => ArgKind::Mono("string".to_owned()),
        Pattern::Lit(Literal::Char(_)) => ArgKind::Mono("char".to_owned()),
        Pattern::Var {
            ty: VarTy::Terminal(t),
            ..
        } => ArgKind::Mono(t.clone()),
        // Nonterminal variables and nested constructors (the latter only
        // occur before normalisation) are both polymorphic positions.
        Pattern::Var {
            ty: VarTy::Nonterm(_),
            ..
        } => ArgKind::Poly,
        Pattern::Con { .. } => ArgKind::Poly,
    }
}

/// Map every constructor used in `rules` to its signature. Deterministic,
/// insensitive to rule order, idempotent; defined on arbitrary patterns,
/// normalised or not.
pub fn infer_signatures(rules: &[Rule]) -> Result<BTreeMap<String, ConSig>, Error> {
    let mut sigs: BTreeMap<String, ConSig> = BTreeMap::new();
    for rule in rules {
        rule.pattern.fold_cons(Ok(()), &mut |acc, name, args| {
            acc?;
            let sig = ConSig::of_args(args);
            if let Some(existing) = sigs.get(name) {
                if *existing != sig {
                    return Err(Error::InconsistentConstructor {
                        con: name.to_owned(),
                        expected: existing.to_string(),
                        found: sig.to_string(),
                    });
                }
                return Ok(());
            }
            sigs.insert(name.to_owned(), sig);
            Ok(())
        })?;
    }
    Ok(sigs)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
