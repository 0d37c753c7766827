//! rustburg-codegen: emit Rust matchers from validated specifications.
//!
//! Consumes the `rustburg-core` AST (the same pattern as the frontend's
//! own passes): [`generate`] normalises the rules, infers constructor
//! signatures, groups chain and constructor rules, synthesises record
//! field types and streams the emitted module to the output sink.

pub mod emit;
pub mod group;
pub mod types;

pub use emit::generate;
pub use group::{group, Grouping};
