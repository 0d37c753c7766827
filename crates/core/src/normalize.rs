//! Rule normalisation: lift every nested constructor argument into an
//! auxiliary nonterminal so that no constructor pattern's direct argument
//! is itself a constructor.
//!
//! A nested constructor `C(…)` of arity `k` lifts into the auxiliary
//! `_C<k>`, shared across all sites in the specification. The auxiliary
//! rule costs nothing and its action returns the tuple of the lifted
//! sub-pattern's variables; the outer action is rewritten to destructure
//! that tuple from a fresh variable. Equivalent auxiliary rules are
//! emitted once.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{Code, CostExpr, Pattern, Rule, VarTy};
use crate::error::Error;

/// Normalise a rule list. The result admits the same subject trees at the
/// same minimum costs; auxiliary rules contribute zero cost.
pub fn normalize(rules: &[Rule]) -> Result<Vec<Rule>, Error> {
    let mut out = Vec::new();
    for rule in rules {
        normalize_rule(rule.clone(), false, &mut out);
    }
    // Every rule set leaving the normaliser has consistent auxiliary
    // shapes; the check also catches conflicts between lift sites.
    aux_shapes(&out)?;
    Ok(out)
}

fn normalize_rule(mut rule: Rule, dedup: bool, out: &mut Vec<Rule>) {
    let mut used: BTreeSet<String> = rule
        .pattern
        .free_vars()
        .iter()
        .map(|s| (*s).to_owned())
        .collect();
    let mut bindings: Vec<(Vec<String>, String)> = Vec::new();

    if let Pattern::Con { args, .. } = &mut rule.pattern {
        for (i, arg) in args.iter_mut().enumerate() {
            let (cname, arity) = match arg {
                Pattern::Con { name, args } => (name.clone(), args.len()),
                _ => continue,
            };
            let vars: Vec<String> = arg.free_vars().iter().map(|s| (*s).to_owned()).collect();
            let aux = format!("_{}{}", cname, arity);
            let fresh = fresh_var(i + 1, vars.is_empty(), &used);
            used.insert(fresh.clone());

            let lifted = std::mem::replace(
                arg,
                Pattern::Var {
                    name: fresh.clone(),
                    ty: VarTy::Nonterm(aux.clone()),
                },
            );
            let aux_rule = Rule {
                lhs: aux,
                pattern: lifted,
                cost: CostExpr::Int(0),
                action: Code(tuple_expr(&vars)),
                prov: rule.prov.clone(),
            };
            normalize_rule(aux_rule, true, out);

            if !vars.is_empty() {
                bindings.push((vars, fresh));
            }
        }
    }

    if !bindings.is_empty() {
        rule.action = wrapped_action(&bindings, &rule.action);
    }
    if dedup
        && out
            .iter()
            .any(|r| r.lhs == rule.lhs && r.pattern.equivalent(&rule.pattern))
    {
        return;
    }
    out.push(rule);
}

/// Fresh variable for a lifted argument at 1-based position `pos`.
/// Sub-patterns binding no variables get an underscore-prefixed name so
/// the unused binding in emitted code stays quiet.
fn fresh_var(pos: usize, unused: bool, taken: &BTreeSet<String>) -> String {
    let mut name = if unused {
        format!("_x{}", pos)
    } else {
        format!("x{}", pos)
    };
    while taken.contains(&name) {
        name.push('_');
    }
    name
}

/// Tuple expression (and destructuring pattern) over a variable list:
/// `()`, `(z,)`, `(a, b)`.
fn tuple_expr(vars: &[String]) -> String {
    match vars.len() {
        0 => "()".to_owned(),
        1 => format!("({},)", vars[0]),
        _ => format!("({})", vars.join(", ")),
    }
}

/// Rewrite an action to destructure each lifted sub-match's tuple before
/// the original user code runs.
fn wrapped_action(bindings: &[(Vec<String>, String)], action: &Code) -> Code {
    let mut body = String::from("{ ");
    for (vars, fresh) in bindings {
        body.push_str(&format!("let {} = {}; ", tuple_expr(vars), fresh));
    }
    body.push_str(action.text());
    body.push_str(" }");
    Code(body)
}

// ──────────────────────────────────────────────
// Auxiliary value shapes
// ──────────────────────────────────────────────

/// Compute the value shape of every auxiliary nonterminal: the flattened
/// type tuple its rules' actions return. Variables typed with a deeper
/// auxiliary splice that auxiliary's components in place.
///
/// Every rule producing the same auxiliary must agree on the shape; a
/// conflict means two lift sites shared `_C<k>` with incompatible
/// variable lists, and the shared record field could not be typed.
pub fn aux_shapes(rules: &[Rule]) -> Result<BTreeMap<String, Vec<VarTy>>, Error> {
    let mut by_aux: BTreeMap<&str, Vec<&Rule>> = BTreeMap::new();
    for r in rules {
        if r.lhs.starts_with('_') {
            by_aux.entry(r.lhs.as_str()).or_default().push(r);
        }
    }
    let mut memo: BTreeMap<String, Vec<VarTy>> = BTreeMap::new();
    let mut in_stack: Vec<String> = Vec::new();
    let auxes: Vec<&str> = by_aux.keys().copied().collect();
    for aux in auxes {
        shape_of(aux, &by_aux, &mut memo, &mut in_stack)?;
    }
    Ok(memo)
}

fn shape_of(
    aux: &str,
    by_aux: &BTreeMap<&str, Vec<&Rule>>,
    memo: &mut BTreeMap<String, Vec<VarTy>>,
    in_stack: &mut Vec<String>,
) -> Result<Vec<VarTy>, Error> {
    if let Some(shape) = memo.get(aux) {
        return Ok(shape.clone());
    }
    if in_stack.iter().any(|a| a == aux) {
        // Auxiliary nesting is well-founded by construction; a cycle here
        // means the rule set was not produced by this normaliser.
        return Err(Error::InconsistentAuxiliary {
            aux: aux.to_owned(),
            expected: "a well-founded shape".to_owned(),
            found: "a recursive shape".to_owned(),
        });
    }
    let Some(producing) = by_aux.get(aux) else {
        return Err(Error::UnknownType {
            ty: aux.to_owned(),
            what: "auxiliary nonterminal with no producing rule".to_owned(),
        });
    };
    in_stack.push(aux.to_owned());

    let mut first: Option<Vec<VarTy>> = None;
    for rule in producing.iter() {
        let typed: Vec<(String, VarTy)> = rule
            .pattern
            .free_vars_typed()
            .into_iter()
            .map(|(n, t)| (n.to_owned(), t.clone()))
            .collect();
        let mut shape = Vec::new();
        for (_, ty) in typed {
            match ty {
                VarTy::Nonterm(ref n) if n.starts_with('_') => {
                    shape.extend(shape_of(n, by_aux, memo, in_stack)?);
                }
                other => shape.push(other),
            }
        }
        match &first {
            None => first = Some(shape),
            Some(expected) if *expected != shape => {
                return Err(Error::InconsistentAuxiliary {
                    aux: aux.to_owned(),
                    expected: shape_str(expected),
                    found: shape_str(&shape),
                });
            }
            Some(_) => {}
        }
    }

    in_stack.pop();
    let shape = first.unwrap_or_default();
    memo.insert(aux.to_owned(), shape.clone());
    Ok(shape)
}

fn shape_str(shape: &[VarTy]) -> String {
    let names: Vec<&str> = shape.iter().map(|t| t.name()).collect();
    format!("({})", names.join(", "))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
