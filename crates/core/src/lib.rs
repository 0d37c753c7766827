//! rustburg-core: specification language frontend and rule pipeline.
//!
//! The pipeline is pure and single-threaded:
//!
//! ```text
//! source ──► lexer ──► parser ──► validate ──► normalize ──► signatures
//! ```
//!
//! Each stage reads its input and produces a fresh value; the codegen
//! crate consumes the results. Key entry points, re-exported at the crate
//! root:
//!
//! - [`load_spec`] / [`compile_str`] -- source to a validated [`Spec`]
//! - [`normalize`] -- lift nested constructor patterns into auxiliaries
//! - [`infer_signatures`] -- constructor argument-kind signatures
//! - [`Error`] -- the structured error every stage reports through

pub mod ast;
pub mod compile;
pub mod error;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod pattern;
pub mod sig;
pub mod validate;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{Code, CostExpr, Literal, Pattern, Provenance, Rule, Spec, VarTy};
pub use compile::{compile_str, load_spec};
pub use error::Error;
pub use normalize::{aux_shapes, normalize};
pub use sig::{infer_signatures, ArgKind, ConSig};
pub use validate::validate;
