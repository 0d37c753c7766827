//! Rule grouping: partition normalised rules into chain rules and
//! constructor rules, and fix the nonterminal emission order.
//!
//! Also rejects chain-rule cycles the emitted fixpoint could not be
//! proven to terminate on: a cycle whose edges all cost 0 or carry a
//! dynamic cost expression, with at least one dynamic edge. (All-zero
//! literal cycles are fine -- the second visit arrives with an equal
//! cost and the `>=` guard prunes it.)

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rustburg_core::ast::{CostExpr, Pattern, Rule, VarTy};
use rustburg_core::error::Error;

/// The grouped view of a normalised rule list.
#[derive(Debug)]
pub struct Grouping<'a> {
    /// Constructor name to the rules whose top-level pattern uses it, in
    /// source order.
    pub cons: BTreeMap<&'a str, Vec<&'a Rule>>,
    /// Nonterminal `n` to the chain rules `m : n`, in source order.
    pub chains: BTreeMap<&'a str, Vec<&'a Rule>>,
    /// All left-hand-side names: ordinary names first, auxiliaries
    /// (`_`-prefixed) after, lexicographic within each class.
    pub nonterms: Vec<&'a str>,
}

pub fn group(rules: &[Rule]) -> Result<Grouping<'_>, Error> {
    let mut cons: BTreeMap<&str, Vec<&Rule>> = BTreeMap::new();
    let mut chains: BTreeMap<&str, Vec<&Rule>> = BTreeMap::new();
    let mut lhs: BTreeSet<&str> = BTreeSet::new();

    for rule in rules {
        lhs.insert(rule.lhs.as_str());
        match &rule.pattern {
            Pattern::Con { name, .. } => {
                cons.entry(name.as_str()).or_default().push(rule);
            }
            Pattern::Var {
                ty: VarTy::Nonterm(n),
                ..
            } => {
                chains.entry(n.as_str()).or_default().push(rule);
            }
            // Validation rejects bare literals and terminal variables at
            // the top level before grouping runs.
            _ => {}
        }
    }

    check_chain_cycles(&chains)?;

    let mut nonterms: Vec<&str> = lhs.into_iter().collect();
    nonterms.sort_by_key(|n| (n.starts_with('_'), *n));

    Ok(Grouping {
        cons,
        chains,
        nonterms,
    })
}

/// A chain edge `n -> m` (rule `m : n`) is *suspect* when its cost is 0
/// or dynamic: traversing it may not increase the candidate cost. Any
/// suspect cycle through a dynamic edge is rejected.
fn check_chain_cycles(chains: &BTreeMap<&str, Vec<&Rule>>) -> Result<(), Error> {
    // Suspect adjacency: source nonterminal to reachable targets.
    let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut dynamic_edges: Vec<(&str, &str)> = Vec::new();
    for (n, rules) in chains {
        for rule in rules {
            match &rule.cost {
                CostExpr::Int(0) => {
                    adj.entry(*n).or_default().push(rule.lhs.as_str());
                }
                CostExpr::Code(_) => {
                    adj.entry(*n).or_default().push(rule.lhs.as_str());
                    dynamic_edges.push((*n, rule.lhs.as_str()));
                }
                CostExpr::Int(_) => {}
            }
        }
    }

    // A dynamic edge n -> m closes a cycle iff m reaches n over suspect
    // edges.
    for (n, m) in dynamic_edges {
        if let Some(path) = suspect_path(m, n, &adj) {
            let mut cycle = vec![n];
            cycle.extend(path);
            let cycle = cycle
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(Error::DynamicChainCycle { cycle });
        }
    }
    Ok(())
}

/// Breadth-first path from `from` to `to` over suspect edges, returned
/// as the node list starting at `from`.
fn suspect_path<'a>(
    from: &'a str,
    to: &str,
    adj: &BTreeMap<&str, Vec<&'a str>>,
) -> Option<Vec<&'a str>> {
    let mut parent: BTreeMap<&str, &str> = BTreeMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(from);
    while let Some(cur) = queue.pop_front() {
        if cur == to {
            let mut path = vec![cur];
            let mut at = cur;
            while let Some(p) = parent.get(at) {
                path.push(*p);
                at = p;
            }
            path.reverse();
            return Some(path);
        }
        if let Some(nexts) = adj.get(cur) {
            for next in nexts {
                if *next != from && !parent.contains_key(next) {
                    parent.insert(next, cur);
                    queue.push_back(next);
                }
            }
        }
    }
    None
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
