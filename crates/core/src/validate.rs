//! Post-parse validation: structural invariants every later stage
//! assumes. Checks top-level pattern form, per-pattern variable
//! uniqueness, terminal/nonterminal disjointness, unknown type names and
//! reserved auxiliary names.

use std::collections::BTreeSet;

use crate::ast::{Pattern, Spec, VarTy};
use crate::error::Error;

pub fn validate(spec: &Spec) -> Result<(), Error> {
    let nonterms: BTreeSet<&str> = spec.nonterms();

    // Declared terminals must be disjoint from nonterminal names.
    for term in &spec.terms {
        if nonterms.contains(term.as_str()) {
            return Err(Error::TerminalNonterminalClash { name: term.clone() });
        }
    }

    // %type annotations must name a defined nonterminal.
    for name in spec.types.keys() {
        if !nonterms.contains(name.as_str()) {
            return Err(Error::UnknownType {
                ty: name.clone(),
                what: format!("%type '{}'", name),
            });
        }
    }

    for rule in &spec.rules {
        // The `_` prefix belongs to normalisation-introduced auxiliaries.
        if rule.lhs.starts_with('_') {
            return Err(Error::ReservedName {
                name: rule.lhs.clone(),
            });
        }

        // Top-level patterns are chain variables or constructors; bare
        // literals and bare terminal variables only appear nested.
        match &rule.pattern {
            Pattern::Lit(_) => {
                return Err(Error::IllFormedTopPattern {
                    lhs: rule.lhs.clone(),
                    what: "bare literal".to_owned(),
                });
            }
            Pattern::Var {
                ty: VarTy::Terminal(_),
                ..
            } => {
                return Err(Error::IllFormedTopPattern {
                    lhs: rule.lhs.clone(),
                    what: "bare terminal variable".to_owned(),
                });
            }
            _ => {}
        }

        // Every nonterminal-typed variable must reference some rule's
        // left-hand side.
        for (name, ty) in rule.pattern.free_vars_typed() {
            if let VarTy::Nonterm(n) = ty {
                if !nonterms.contains(n.as_str()) {
                    return Err(Error::UnknownType {
                        ty: n.clone(),
                        what: format!("variable '{}' in rule '{}'", name, rule.lhs),
                    });
                }
            }
        }

        // Variable names are unique within a pattern.
        let mut seen = BTreeSet::new();
        for name in rule.pattern.free_vars() {
            if !seen.insert(name) {
                return Err(Error::DuplicateVariable {
                    lhs: rule.lhs.clone(),
                    var: name.to_owned(),
                });
            }
        }
    }

    Ok(())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;
    use crate::parser;

    fn check(src: &str) -> Result<(), Error> {
        let tokens = lexer::lex(src, "test.burg")?;
        let spec = parser::parse(&tokens, "test.burg")?;
        validate(&spec)
    }

    #[test]
    fn well_formed_specification_passes() {
        check("%%\ne : ADD(x:e, y:e) [2] {: x + y :}\ne : CONST(x:int) [1] {: x :}\ns : e [1] {: e.to_string() :}\n")
            .unwrap();
    }

    #[test]
    fn bare_literal_top_pattern_is_rejected() {
        let err = check("%%\ne : 0 [1] {: 0 :}\n").unwrap_err();
        assert!(matches!(err, Error::IllFormedTopPattern { .. }), "got: {}", err);
    }

    #[test]
    fn bare_terminal_variable_top_pattern_is_rejected() {
        let err = check("%%\ne : x:int [1] {: x :}\n").unwrap_err();
        assert!(matches!(err, Error::IllFormedTopPattern { .. }), "got: {}", err);
    }

    #[test]
    fn duplicate_variables_are_rejected() {
        let err = check("%%\ne : ADD(x:e, x:e) [1] {: x :}\n").unwrap_err();
        assert!(
            matches!(err, Error::DuplicateVariable { ref var, .. } if var == "x"),
            "got: {}",
            err
        );
    }

    #[test]
    fn terminal_clashing_with_nonterminal_is_rejected() {
        let err = check("%term e\n%%\ne : CONST(x:int) [1] {: x :}\n").unwrap_err();
        assert!(
            matches!(err, Error::TerminalNonterminalClash { ref name } if name == "e"),
            "got: {}",
            err
        );
    }

    #[test]
    fn unknown_variable_type_is_rejected() {
        let err = check("%%\ne : ADD(x:mystery, y:e) [1] {: x :}\n").unwrap_err();
        assert!(
            matches!(err, Error::UnknownType { ref ty, .. } if ty == "mystery"),
            "got: {}",
            err
        );
    }

    #[test]
    fn unknown_type_annotation_is_rejected() {
        let err = check("%type f {: i64 :}\n%%\ne : CONST(x:int) [1] {: x :}\n").unwrap_err();
        assert!(matches!(err, Error::UnknownType { .. }), "got: {}", err);
    }

    #[test]
    fn underscore_nonterminals_are_reserved() {
        let err = check("%%\n_e : CONST(x:int) [1] {: x :}\n").unwrap_err();
        assert!(matches!(err, Error::ReservedName { .. }), "got: {}", err);
    }

    #[test]
    fn chain_rule_to_unknown_nonterminal_is_rejected() {
        let err = check("%%\ns : e [1] {: e :}\n").unwrap_err();
        assert!(
            matches!(err, Error::UnknownType { ref ty, .. } if ty == "e"),
            "got: {}",
            err
        );
    }
}
