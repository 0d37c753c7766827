//! The single structured error type every pipeline stage reports through.
//!
//! Variants are tagged by failure kind so the driver can serialise them as
//! JSON diagnostics; the `Display` form is the human-readable message.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Error {
    /// Lexer or parser failure at a known source position.
    #[error("{file}:{line}: {message}")]
    Syntax {
        file: String,
        line: u32,
        message: String,
    },

    /// A rule's top-level pattern is a bare literal or a bare
    /// terminal-typed variable; those may only appear nested.
    #[error("rule '{lhs}': top-level pattern may not be a {what}")]
    IllFormedTopPattern { lhs: String, what: String },

    /// A variable name occurs twice within one pattern.
    #[error("rule '{lhs}': duplicate variable '{var}' in pattern")]
    DuplicateVariable { lhs: String, var: String },

    /// A name is declared `%term` but also appears as a rule's left-hand
    /// side.
    #[error("'{name}' is declared %term but also defined as a nonterminal")]
    TerminalNonterminalClash { name: String },

    /// A variable's type name is neither a declared terminal nor any
    /// rule's left-hand side.
    #[error("unknown type '{ty}' for '{what}'")]
    UnknownType { ty: String, what: String },

    /// User nonterminal names may not begin with `_`; that prefix is
    /// reserved for auxiliaries introduced by normalisation.
    #[error("nonterminal '{name}': names beginning with '_' are reserved")]
    ReservedName { name: String },

    /// A constructor appears with two distinct argument signatures.
    #[error("constructor '{con}' used inconsistently: expected {expected}, found {found}")]
    InconsistentConstructor {
        con: String,
        expected: String,
        found: String,
    },

    /// Two rules produce the same auxiliary nonterminal with different
    /// value shapes, so the shared record field cannot be given one type.
    #[error("auxiliary '{aux}' produced with conflicting shapes: {expected} vs {found}")]
    InconsistentAuxiliary {
        aux: String,
        expected: String,
        found: String,
    },

    /// A chain-rule cycle whose edges are all cost-0 or dynamic, with at
    /// least one dynamic edge: the emitted fixpoint cannot be proven to
    /// terminate.
    #[error("chain-rule cycle {cycle} carries a dynamic cost; termination cannot be guaranteed")]
    DynamicChainCycle { cycle: String },

    /// The Rust target needs a concrete field type per nonterminal.
    #[error("nonterminal '{nonterm}' has no %type annotation; the Rust target requires one")]
    MissingTypeAnnotation { nonterm: String },

    /// A write to the output sink failed.
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl Error {
    pub fn syntax(file: &str, line: u32, message: impl Into<String>) -> Error {
        Error::Syntax {
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Error {
        Error::Io {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::io(e.to_string())
    }
}
