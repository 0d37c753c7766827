//! Thin frontend orchestrator: source text to a validated [`Spec`].
//!
//! This is the single-error path; the driver uses
//! [`crate::parser::parse_recovering`] directly when it wants every
//! syntax error at once.

use std::fs;
use std::path::Path;

use crate::ast::Spec;
use crate::error::Error;
use crate::lexer;
use crate::parser;
use crate::validate;

/// Lex, parse and validate a specification from a string.
pub fn compile_str(src: &str, filename: &str) -> Result<Spec, Error> {
    let tokens = lexer::lex(src, filename)?;
    let spec = parser::parse(&tokens, filename)?;
    validate::validate(&spec)?;
    Ok(spec)
}

/// Read, lex, parse and validate a specification file.
pub fn load_spec(path: &Path) -> Result<Spec, Error> {
    let filename = path.display().to_string();
    let src = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to read '{}': {}", filename, e)))?;
    compile_str(&src, &filename)
}
