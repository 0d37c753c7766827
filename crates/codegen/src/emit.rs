//! The code generator: emit a self-contained Rust module implementing
//! the bottom-up minimum-cost matcher for a specification.
//!
//! Emission order is fixed: head fragments, the runtime import, the
//! `Nonterm` record, the `infinity` value, one `update_*` routine per
//! nonterminal, one `con*` routine per constructor, tail fragments.
//! Output is byte-identical across runs on the same input.

use std::io::Write;

use rustburg_core::ast::{CostExpr, Literal, Pattern, Rule, Spec, VarTy};
use rustburg_core::error::Error;
use rustburg_core::sig::{ArgKind, ConSig};
use rustburg_core::{aux_shapes, infer_signatures, normalize};

use crate::group::{group, Grouping};
use crate::types::{field, field_types, rust_terminal};

type FieldTypes = std::collections::BTreeMap<String, String>;

pub fn generate(spec: &Spec, out: &mut dyn Write) -> Result<(), Error> {
    writeln!(out, "// Generated by rustburg. Do not edit.")?;
    for head in &spec.heads {
        writeln!(out)?;
        writeln!(out, "{}", head.text())?;
    }

    // An empty rule list emits the head fragments alone.
    if spec.rules.is_empty() {
        return Ok(());
    }

    let normal = normalize(&spec.rules)?;
    let sigs = infer_signatures(&normal)?;
    let shapes = aux_shapes(&normal)?;
    let grouping = group(&normal)?;
    let tys = field_types(spec, &grouping.nonterms, &shapes)?;

    writeln!(out)?;
    writeln!(out, "{}", imports(&grouping, &normal))?;
    write!(out, "{}", record_decl(&grouping, &tys))?;
    write!(out, "{}", infinity_decl(&grouping))?;
    for n in &grouping.nonterms {
        write!(out, "{}", update_fn(n, &grouping, &tys))?;
    }
    for (cname, rules) in &grouping.cons {
        // Grouping keys come from the same rule set the signatures were
        // inferred from, so the lookup cannot miss.
        let sig = sigs.get(*cname).cloned().unwrap_or_default();
        write!(out, "{}", con_fn(cname, &sig, rules, &grouping))?;
    }
    for tail in &spec.tails {
        writeln!(out)?;
        writeln!(out, "{}", tail.text())?;
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Preamble
// ──────────────────────────────────────────────

fn imports(grouping: &Grouping, rules: &[Rule]) -> String {
    let mut items: Vec<&str> = Vec::new();
    if !grouping.cons.is_empty() {
        items.push("choice");
    }
    if rules_mention_literals(rules) {
        items.push("matches");
    }
    items.push("Cost");
    items.push("Nt");
    format!("use rustburg_runtime::{{{}}};", items.join(", "))
}

fn rules_mention_literals(rules: &[Rule]) -> bool {
    rules.iter().any(|r| match &r.pattern {
        Pattern::Con { args, .. } => args.iter().any(|a| matches!(a, Pattern::Lit(_))),
        _ => false,
    })
}

fn needs_case_allowance(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
}

// ──────────────────────────────────────────────
// Record type and infinity
// ──────────────────────────────────────────────

fn record_decl(grouping: &Grouping, tys: &FieldTypes) -> String {
    let mut s = String::new();
    s.push_str("\n#[derive(Clone)]\n");
    if grouping.nonterms.iter().any(|n| needs_case_allowance(n)) {
        s.push_str("#[allow(non_snake_case)]\n");
    }
    s.push_str("pub struct Nonterm {\n");
    for n in &grouping.nonterms {
        s.push_str(&format!("    pub {}: Nt<{}>,\n", field(n), tys[*n]));
    }
    s.push_str("}\n");
    s
}

fn infinity_decl(grouping: &Grouping) -> String {
    let mut s = String::new();
    s.push_str("\npub fn infinity() -> Nonterm {\n    Nonterm {\n");
    for n in &grouping.nonterms {
        s.push_str(&format!("        {}: Nt::infinity(),\n", field(n)));
    }
    s.push_str("    }\n}\n");
    s
}

// ──────────────────────────────────────────────
// Update routines
// ──────────────────────────────────────────────

/// One routine per nonterminal: install a cheaper candidate and push it
/// through this nonterminal's chain rules, cheapest chain first, so the
/// first fixpoint visit plants the minimum before the `>=` guard prunes
/// the rest.
fn update_fn(n: &str, grouping: &Grouping, tys: &FieldTypes) -> String {
    let fname = format!("update_{}", n);
    let fld = field(n);
    let ty = &tys[n];

    let mut chains: Vec<&Rule> = grouping.chains.get(n).cloned().unwrap_or_default();
    chains.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.lhs.cmp(&b.lhs)));

    let mut s = String::new();
    s.push('\n');
    if needs_case_allowance(&fname) {
        s.push_str("#[allow(non_snake_case)]\n");
    }
    s.push_str(&format!(
        "pub fn {}(nt: Nt<{}>, x: Nonterm) -> Nonterm {{\n",
        fname, ty
    ));
    s.push_str(&format!(
        "    if nt.cost >= x.{}.cost {{\n        return x;\n    }}\n",
        fld
    ));
    if chains.is_empty() {
        s.push_str(&format!("    Nonterm {{ {}: nt, ..x }}\n}}\n", fld));
        return s;
    }
    s.push_str(&format!(
        "    let x = Nonterm {{ {}: nt.clone(), ..x }};\n",
        fld
    ));
    for rule in &chains {
        let cost = match &rule.cost {
            CostExpr::Int(c) => format!("nt.cost + Cost::from({})", c),
            CostExpr::Code(code) => format!("nt.cost + Cost::from({{ {} }})", code.trim()),
        };
        s.push_str(&format!(
            "    let x = update_{}(\n        Nt::new({}, {{\n            let nt = nt.clone();\n            move || {{\n                let {} = (nt.action)();\n                {}\n            }}\n        }}),\n        x,\n    );\n",
            rule.lhs,
            cost,
            chain_var(rule),
            rule.action.text()
        ));
    }
    s.push_str("    x\n}\n");
    s
}

fn chain_var(rule: &Rule) -> &str {
    match &rule.pattern {
        Pattern::Var { name, .. } => name,
        _ => "",
    }
}

// ──────────────────────────────────────────────
// Constructor routines
// ──────────────────────────────────────────────

/// One routine per constructor: seed with `infinity`, then for every
/// nonterminal this constructor can produce, offer the candidate covers
/// to `choice` and install the winner through `update_*`.
fn con_fn(cname: &str, sig: &ConSig, rules: &[&Rule], grouping: &Grouping) -> String {
    let fname = format!("con{}", cname);

    let params: Vec<String> = sig
        .0
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let ty = match kind {
                ArgKind::Poly => "Nonterm",
                ArgKind::Mono(t) => rust_terminal(t),
            };
            format!("arg{}: {}", i + 1, ty)
        })
        .collect();

    let mut s = String::new();
    s.push('\n');
    if needs_case_allowance(&fname) {
        s.push_str("#[allow(non_snake_case)]\n");
    }
    s.push_str(&format!(
        "pub fn {}({}) -> Nonterm {{\n    let acc = infinity();\n",
        fname,
        params.join(", ")
    ));

    for n in &grouping.nonterms {
        let produced: Vec<&Rule> = rules.iter().filter(|r| r.lhs == *n).copied().collect();
        if produced.is_empty() {
            continue;
        }
        s.push_str(&format!(
            "    let acc = update_{}(\n        choice(vec![\n",
            n
        ));
        for rule in produced {
            s.push_str(&candidate(rule));
        }
        s.push_str("        ]),\n        acc,\n    );\n");
    }
    s.push_str("    acc\n}\n");
    s
}

/// One `Nt::new` candidate for a constructor rule: the cost sums the
/// rule's own cost, every nonterminal argument's field cost, and a
/// `matches` guard per literal position; the thunk clones what it needs,
/// binds every rule variable, then runs the user action.
fn candidate(rule: &Rule) -> String {
    let args: &[Pattern] = match &rule.pattern {
        Pattern::Con { args, .. } => args,
        _ => &[],
    };

    let mut cost = match &rule.cost {
        CostExpr::Int(c) => format!("Cost::from({})", c),
        CostExpr::Code(code) => {
            // Dynamic costs see the pattern's top-level terminal
            // variables only.
            let mut binds = String::new();
            for (i, arg) in args.iter().enumerate() {
                if let Pattern::Var {
                    name,
                    ty: VarTy::Terminal(_),
                } = arg
                {
                    binds.push_str(&format!("let {} = arg{}.clone(); ", name, i + 1));
                }
            }
            format!("Cost::from({{ {}{} }})", binds, code.trim())
        }
    };
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Pattern::Var {
                ty: VarTy::Nonterm(m),
                ..
            } => {
                cost.push_str(&format!(" + arg{}.{}.cost", i + 1, field(m)));
            }
            Pattern::Lit(lit) => {
                cost.push_str(&format!(" + matches(&{}, &arg{}).cost", lit_text(lit), i + 1));
            }
            _ => {}
        }
    }

    let mut captures: Vec<String> = Vec::new();
    let mut binds: Vec<String> = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Pattern::Var {
                name,
                ty: VarTy::Nonterm(m),
            } => {
                captures.push(format!("let a{} = arg{}.{}.clone();", i + 1, i + 1, field(m)));
                binds.push(format!("let {} = (a{}.action)();", name, i + 1));
            }
            Pattern::Var {
                name,
                ty: VarTy::Terminal(_),
            } => {
                captures.push(format!("let a{} = arg{}.clone();", i + 1, i + 1));
                binds.push(format!("let {} = a{}.clone();", name, i + 1));
            }
            _ => {}
        }
    }

    let action = rule.action.text();
    if captures.is_empty() {
        return format!(
            "            Nt::new(\n                {},\n                move || {{\n                    {}\n                }},\n            ),\n",
            cost, action
        );
    }
    let mut s = String::new();
    s.push_str(&format!(
        "            Nt::new(\n                {},\n                {{\n",
        cost
    ));
    for cap in &captures {
        s.push_str(&format!("                    {}\n", cap));
    }
    s.push_str("                    move || {\n");
    for bind in &binds {
        s.push_str(&format!("                        {}\n", bind));
    }
    s.push_str(&format!("                        {}\n", action));
    s.push_str("                    }\n                },\n            ),\n");
    s
}

fn lit_text(lit: &Literal) -> String {
    match lit {
        Literal::Int(n) => n.to_string(),
        Literal::Str(s) => format!("{:?}", s),
        Literal::Char(c) => format!("{:?}", c),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rustburg_core::compile_str;

    fn emit(src: &str) -> String {
        let spec = compile_str(src, "test.burg").unwrap();
        let mut out = Vec::new();
        generate(&spec, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    const ARITH: &str = "%type e {: i64 :}\n%type s {: String :}\n%%\ne : ADD(x:e, y:e) [2] {: x + y :}\ne : CONST(x:int) [1] {: x :}\ns : e [1] {: e.to_string() :}\ne : s [1] {: s.parse().unwrap() :}\n";

    #[test]
    fn record_lists_every_nonterminal_with_its_type() {
        let code = emit(ARITH);
        assert!(code.contains("pub struct Nonterm {"));
        assert!(code.contains("    pub e: Nt<i64>,"));
        assert!(code.contains("    pub s: Nt<String>,"));
    }

    #[test]
    fn infinity_initialises_every_field() {
        let code = emit(ARITH);
        assert!(code.contains("pub fn infinity() -> Nonterm {"));
        assert!(code.contains("        e: Nt::infinity(),"));
        assert!(code.contains("        s: Nt::infinity(),"));
    }

    #[test]
    fn update_guard_short_circuits_on_cost() {
        let code = emit(ARITH);
        assert!(code.contains("pub fn update_e(nt: Nt<i64>, x: Nonterm) -> Nonterm {"));
        assert!(code.contains("    if nt.cost >= x.e.cost {\n        return x;\n    }"));
    }

    #[test]
    fn mutually_recursive_chain_rules_compose_updates() {
        // `s : e [1]` makes update_e push into update_s and vice versa;
        // the `>=` guard bounds the recursion.
        let code = emit(ARITH);
        let update_e = section(&code, "pub fn update_e");
        assert!(update_e.contains("let x = update_s("));
        assert!(update_e.contains("Nt::new(nt.cost + Cost::from(1), {"));
        assert!(update_e.contains("let e = (nt.action)();"));
        assert!(update_e.contains("e.to_string()"));
        let update_s = section(&code, "pub fn update_s");
        assert!(update_s.contains("let x = update_e("));
        assert!(update_s.contains("s.parse().unwrap()"));
    }

    #[test]
    fn constructor_arity_matches_signature() {
        let code = emit(ARITH);
        assert!(code.contains("pub fn conADD(arg1: Nonterm, arg2: Nonterm) -> Nonterm {"));
        assert!(code.contains("pub fn conCONST(arg1: i64) -> Nonterm {"));
    }

    #[test]
    fn constructor_cost_sums_argument_fields() {
        let code = emit(ARITH);
        let con_add = section(&code, "pub fn conADD");
        assert!(con_add.contains("Cost::from(2) + arg1.e.cost + arg2.e.cost"));
        assert!(con_add.contains("let a1 = arg1.e.clone();"));
        assert!(con_add.contains("let x = (a1.action)();"));
        assert!(con_add.contains("let y = (a2.action)();"));
        assert!(con_add.contains("x + y"));
    }

    #[test]
    fn literal_positions_guard_with_matches() {
        let code = emit(
            "%type e {: i64 :}\n%%\ne : CONST(0) [0] {: 0 :}\ne : CONST(x:int) [1] {: x :}\n",
        );
        let con_const = section(&code, "pub fn conCONST");
        assert!(con_const.contains("Cost::from(0) + matches(&0, &arg1).cost"));
        // Both candidates feed one choice, cheapest-first selection is
        // the runtime's job.
        assert_eq!(con_const.matches("Nt::new(").count(), 2);
        assert!(code.contains("use rustburg_runtime::{choice, matches, Cost, Nt};"));
    }

    #[test]
    fn terminal_variables_bind_the_raw_argument() {
        let code = emit(ARITH);
        let con_const = section(&code, "pub fn conCONST");
        assert!(con_const.contains("let a1 = arg1.clone();"));
        assert!(con_const.contains("let x = a1.clone();"));
    }

    #[test]
    fn dynamic_costs_bind_top_level_terminal_variables() {
        let code = emit(
            "%type e {: i64 :}\n%%\ne : CONST(x:int) [{: if x == 0 { 0 } else { 1 } :}] {: x :}\n",
        );
        assert!(code.contains("Cost::from({ let x = arg1.clone(); if x == 0 { 0 } else { 1 } })"));
    }

    #[test]
    fn chain_rules_propagate_cheapest_first() {
        let code = emit(
            "%type e {: i64 :}\n%type a {: i64 :}\n%type b {: i64 :}\n%type c {: i64 :}\n%%\ne : CONST(x:int) [1] {: x :}\na : e [3] {: e :}\nb : e [1] {: e :}\nc : e [{: dyn_cost() :}] {: e :}\n",
        );
        let update_e = section(&code, "pub fn update_e");
        let pos_dyn = update_e.find("update_c(").unwrap();
        let pos_b = update_e.find("update_b(").unwrap();
        let pos_a = update_e.find("update_a(").unwrap();
        assert!(
            pos_dyn < pos_b && pos_b < pos_a,
            "dynamic cost sorts below all integers, then ascending"
        );
    }

    #[test]
    fn normalised_auxiliaries_reach_the_emitted_record() {
        let code = emit(
            "%type e {: i64 :}\n%%\ne : ADD(x:e, ADD(CONST(0), z:e)) [1] {: x + z :}\ne : CONST(x:int) [1] {: x :}\n",
        );
        assert!(code.contains("pub _ADD2: Nt<(i64,)>,"));
        assert!(code.contains("pub _CONST1: Nt<()>,"));
        assert!(code.contains("#[allow(non_snake_case)]\npub fn update__ADD2"));
        let con_add = section(&code, "pub fn conADD");
        assert!(con_add.contains("let acc = update__ADD2("));
        assert!(con_add.contains("{ let (z,) = x2; x + z }"));
    }

    #[test]
    fn heads_precede_the_record_and_tails_follow_the_routines() {
        let code = emit(
            "%head {: use crate::ir::*; :}\n%type e {: i64 :}\n%tail {: // trailer :}\n%%\ne : CONST(x:int) [1] {: x :}\n",
        );
        let head = code.find("use crate::ir::*;").unwrap();
        let record = code.find("pub struct Nonterm").unwrap();
        let trailer = code.find("// trailer").unwrap();
        assert!(head < record && record < trailer);
    }

    #[test]
    fn empty_rule_list_emits_heads_only() {
        let code = emit("%head {: pub struct Subject; :}\n%tail {: fn unused() {} :}\n%%\n");
        assert!(code.contains("pub struct Subject;"));
        assert!(!code.contains("fn unused"), "tails are skipped");
        assert!(!code.contains("Nonterm"));
        assert!(!code.contains("use rustburg_runtime"));
    }

    #[test]
    fn keyword_nonterminals_are_raw_identifiers() {
        let code = emit("%type loop {: i64 :}\n%%\nloop : CONST(x:int) [1] {: x :}\n");
        assert!(code.contains("    pub r#loop: Nt<i64>,"));
        assert!(code.contains("pub fn update_loop(nt: Nt<i64>, x: Nonterm) -> Nonterm {"));
        assert!(code.contains("if nt.cost >= x.r#loop.cost"));
    }

    #[test]
    fn generation_is_deterministic() {
        let spec = compile_str(ARITH, "test.burg").unwrap();
        let mut first = Vec::new();
        generate(&spec, &mut first).unwrap();
        let mut second = Vec::new();
        generate(&spec, &mut second).unwrap();
        assert_eq!(first, second, "byte-identical output for identical input");
    }

    #[test]
    fn imports_shrink_when_no_literals_occur() {
        let code = emit(ARITH);
        assert!(code.contains("use rustburg_runtime::{choice, Cost, Nt};"));
    }

    /// The emitted text of one routine: from its header to the next
    /// blank-line-separated item.
    fn section<'a>(code: &'a str, header: &str) -> &'a str {
        let start = code
            .find(header)
            .unwrap_or_else(|| panic!("{} not found in:\n{}", header, code));
        let rest = &code[start..];
        match rest.find("\n\n") {
            Some(end) => &rest[..end],
            None => rest,
        }
    }
}
