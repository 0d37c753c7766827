//! Shared AST types for the rustburg pipeline.
//!
//! These types are produced by the parser and consumed by every later
//! stage. They live here so the normaliser, signature inference and the
//! codegen crate can import them without depending on the parser.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ──────────────────────────────────────────────
// Provenance
// ──────────────────────────────────────────────

/// Source position of a rule: file name and the line its left-hand side
/// starts on. Used only for diagnostics.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub file: String,
    pub line: u32,
}

// ──────────────────────────────────────────────
// Literals and variable types
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Literal {
    Int(i64),
    Str(String),
    Char(char),
}

/// The type tag a pattern variable carries. Terminal types are opaque
/// names (predeclared `int`/`string`/`char` or `%term` declarations);
/// nonterminal types name some rule's left-hand side.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum VarTy {
    Terminal(String),
    Nonterm(String),
}

impl VarTy {
    pub fn name(&self) -> &str {
        match self {
            VarTy::Terminal(n) | VarTy::Nonterm(n) => n,
        }
    }
}

// ──────────────────────────────────────────────
// Patterns
// ──────────────────────────────────────────────

/// A rule's right-hand side: literal leaves, typed variable leaves, and
/// constructor nodes. A nullary constructor `C()` is distinct from a bare
/// variable `C`.
#[derive(Debug, Clone)]
pub enum Pattern {
    Lit(Literal),
    Var { name: String, ty: VarTy },
    Con { name: String, args: Vec<Pattern> },
}

// ──────────────────────────────────────────────
// Code fragments and costs
// ──────────────────────────────────────────────

/// An opaque user code fragment (`{: … :}` in the surface syntax),
/// transported verbatim to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code(pub String);

impl Code {
    pub fn text(&self) -> &str {
        self.0.trim()
    }
}

/// A rule cost: either an opaque code fragment evaluated at match time, or
/// a literal non-negative integer.
///
/// The derived order is the chain-rule propagation order: every dynamic
/// cost sorts below every literal one, and dynamic costs compare lexically
/// by their code text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CostExpr {
    Code(String),
    Int(u32),
}

// ──────────────────────────────────────────────
// Rules and specifications
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Rule {
    /// Left-hand nonterminal name.
    pub lhs: String,
    pub pattern: Pattern,
    pub cost: CostExpr,
    pub action: Code,
    pub prov: Provenance,
}

impl Rule {
    /// A chain rule is `m : n` — a pattern that is a single
    /// nonterminal-typed variable.
    pub fn is_chain(&self) -> bool {
        matches!(
            &self.pattern,
            Pattern::Var {
                ty: VarTy::Nonterm(_),
                ..
            }
        )
    }
}

/// A parsed specification, threaded read-only through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Spec {
    /// Declared terminal type names, including the predeclared
    /// `int`/`string`/`char`.
    pub terms: BTreeSet<String>,
    /// `%head` fragments in declaration order.
    pub heads: Vec<Code>,
    /// `%tail` fragments in declaration order.
    pub tails: Vec<Code>,
    /// `%type` annotations: nonterminal name to target type text.
    pub types: BTreeMap<String, Code>,
    pub rules: Vec<Rule>,
}

impl Spec {
    /// The set of nonterminal names: every rule's left-hand side.
    pub fn nonterms(&self) -> BTreeSet<&str> {
        self.rules.iter().map(|r| r.lhs.as_str()).collect()
    }
}

// ──────────────────────────────────────────────
// Display (surface syntax, used by the norm dump)
// ──────────────────────────────────────────────

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Char(c) => write!(f, "{:?}", c),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Lit(l) => write!(f, "{}", l),
            Pattern::Var { name, ty } => write!(f, "{}:{}", name, ty.name()),
            Pattern::Con { name, args } => {
                write!(f, "{}(", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for CostExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostExpr::Code(c) => write!(f, "{{: {} :}}", c.trim()),
            CostExpr::Int(n) => write!(f, "{}", n),
        }
    }
}

/// The `norm` dump format: `lhs: pattern [cost] {: action :}`.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {{: {} :}}",
            self.lhs,
            self.pattern,
            self.cost,
            self.action.text()
        )
    }
}
