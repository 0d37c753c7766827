//! Recursive-descent parser for `.burg` specifications.
//!
//! Declarations (`%term`, `%head`, `%tail`, `%type`) come before `%%`,
//! rules after. No structural checking is done here beyond the grammar --
//! that is validation's job.

use std::collections::BTreeSet;

use crate::ast::{Code, CostExpr, Literal, Pattern, Provenance, Rule, Spec, VarTy};
use crate::error::Error;
use crate::lexer::{Spanned, Token};

/// Identifiers the surface syntax reserves; rejected wherever an
/// identifier is expected.
const RESERVED: &[&str] = &["start", "term", "type", "head", "tail"];

/// Terminal types every specification starts with.
const PREDECLARED: &[&str] = &["int", "string", "char"];

/// Default maximum number of errors collected in multi-error mode before
/// aborting.
pub const DEFAULT_MAX_ERRORS: usize = 10;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    filename: String,
    terms: BTreeSet<String>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], filename: &str) -> Self {
        Parser {
            tokens,
            pos: 0,
            filename: filename.to_owned(),
            terms: PREDECLARED.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn cur_line(&self) -> u32 {
        self.cur().line
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> Error {
        Error::syntax(&self.filename, self.cur_line(), msg)
    }

    fn take_id(&mut self) -> Result<String, Error> {
        if let Token::Word(w) = self.peek().clone() {
            if RESERVED.contains(&w.as_str()) {
                return Err(self.err(format!("'{}' is a reserved identifier", w)));
            }
            self.advance();
            Ok(w)
        } else {
            Err(self.err(format!("expected identifier, got {:?}", self.peek())))
        }
    }

    fn take_code(&mut self) -> Result<Code, Error> {
        if let Token::Code(body) = self.peek().clone() {
            self.advance();
            Ok(Code(body))
        } else {
            Err(self.err(format!("expected '{{: … :}}' block, got {:?}", self.peek())))
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), Error> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {}, got {:?}", what, self.peek())))
        }
    }

    /// Classify a variable's type name against the declared terminal set.
    /// Unknown names are assumed nonterminal; validation rejects them if
    /// no rule defines them.
    fn var_ty(&self, name: String) -> VarTy {
        if self.terms.contains(&name) {
            VarTy::Terminal(name)
        } else {
            VarTy::Nonterm(name)
        }
    }

    // -- Declarations -------------------------------------------

    /// Parse one declaration into `spec`. The caller guarantees the
    /// current token is a declaration keyword.
    fn parse_decl(&mut self, spec: &mut Spec) -> Result<(), Error> {
        match self.peek().clone() {
            Token::Term => {
                self.advance();
                let first = self.take_id()?;
                self.terms.insert(first.clone());
                spec.terms.insert(first);
                while let Token::Word(_) = self.peek() {
                    let t = self.take_id()?;
                    self.terms.insert(t.clone());
                    spec.terms.insert(t);
                }
                Ok(())
            }
            Token::Head => {
                self.advance();
                let code = self.take_code()?;
                spec.heads.push(code);
                Ok(())
            }
            Token::Tail => {
                self.advance();
                let code = self.take_code()?;
                spec.tails.push(code);
                Ok(())
            }
            Token::Type => {
                self.advance();
                let line = self.cur_line();
                let name = self.take_id()?;
                let code = self.take_code()?;
                if spec.types.insert(name.clone(), code).is_some() {
                    return Err(Error::syntax(
                        &self.filename,
                        line,
                        format!("duplicate %type for '{}'", name),
                    ));
                }
                Ok(())
            }
            other => Err(self.err(format!("expected declaration or '%%', got {:?}", other))),
        }
    }

    // -- Patterns -----------------------------------------------

    fn parse_pattern(&mut self) -> Result<Pattern, Error> {
        match self.peek().clone() {
            Token::Int(n) => {
                self.advance();
                Ok(Pattern::Lit(Literal::Int(n)))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Pattern::Lit(Literal::Str(s)))
            }
            Token::Char(c) => {
                self.advance();
                Ok(Pattern::Lit(Literal::Char(c)))
            }
            Token::Word(_) => {
                let name = self.take_id()?;
                match self.peek() {
                    // Constructor, possibly nullary
                    Token::LParen => {
                        self.advance();
                        let mut args = Vec::new();
                        if self.peek() != &Token::RParen {
                            args.push(self.parse_pattern()?);
                            while self.peek() == &Token::Comma {
                                self.advance();
                                args.push(self.parse_pattern()?);
                            }
                        }
                        self.expect(&Token::RParen, "')'")?;
                        Ok(Pattern::Con { name, args })
                    }
                    // Typed variable
                    Token::Colon => {
                        self.advance();
                        let ty = self.take_id()?;
                        Ok(Pattern::Var {
                            name,
                            ty: self.var_ty(ty),
                        })
                    }
                    // Bare `id` is sugar for `id:id`
                    _ => Ok(Pattern::Var {
                        name: name.clone(),
                        ty: self.var_ty(name),
                    }),
                }
            }
            other => Err(self.err(format!("expected pattern, got {:?}", other))),
        }
    }

    // -- Rules --------------------------------------------------

    fn parse_cost(&mut self) -> Result<CostExpr, Error> {
        if self.peek() != &Token::LBracket {
            // Cost is optional; omitted means the additive identity.
            return Ok(CostExpr::Int(0));
        }
        self.advance();
        let cost = match self.peek().clone() {
            Token::Int(n) => {
                let n = u32::try_from(n)
                    .map_err(|_| self.err(format!("cost {} out of range", n)))?;
                self.advance();
                CostExpr::Int(n)
            }
            Token::Code(body) => {
                self.advance();
                CostExpr::Code(body)
            }
            other => {
                return Err(self.err(format!(
                    "expected integer or '{{: … :}}' cost, got {:?}",
                    other
                )));
            }
        };
        self.expect(&Token::RBracket, "']'")?;
        Ok(cost)
    }

    fn parse_rule(&mut self) -> Result<Rule, Error> {
        let line = self.cur_line();
        let lhs = self.take_id()?;
        self.expect(&Token::Colon, "':'")?;
        let pattern = self.parse_pattern()?;
        let cost = self.parse_cost()?;
        let action = self.take_code()?;
        Ok(Rule {
            lhs,
            pattern,
            cost,
            action,
            prov: Provenance {
                file: self.filename.clone(),
                line,
            },
        })
    }

    // -- Files --------------------------------------------------

    fn parse_file(&mut self) -> Result<Spec, Error> {
        let mut spec = Spec::default();
        while self.peek() != &Token::Sep {
            if self.peek() == &Token::Eof {
                return Err(self.err("expected '%%' before end of input"));
            }
            self.parse_decl(&mut spec)?;
        }
        self.advance(); // consume %%
        while self.peek() != &Token::Eof {
            let rule = self.parse_rule()?;
            spec.rules.push(rule);
        }
        // Predeclared terminals are part of every specification.
        for t in PREDECLARED {
            spec.terms.insert(t.to_string());
        }
        Ok(spec)
    }

    /// Skip tokens until a plausible resume point: the next declaration
    /// keyword or `%%` while in the declaration section, or just past the
    /// next `{: … :}` action block while in the rules section.
    fn recover(&mut self, in_rules: bool) {
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::Sep => break,
                Token::Term | Token::Head | Token::Tail | Token::Type if !in_rules => break,
                Token::Code(_) if in_rules => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parse the file with error recovery at declaration and rule
    /// boundaries.
    fn parse_file_recovering(&mut self, max_errors: usize) -> (Spec, Vec<Error>) {
        let mut spec = Spec::default();
        let mut errors = Vec::new();

        while self.peek() != &Token::Sep && self.peek() != &Token::Eof {
            if let Err(e) = self.parse_decl(&mut spec) {
                errors.push(e);
                if errors.len() >= max_errors {
                    return (spec, errors);
                }
                self.recover(false);
            }
        }
        if self.peek() == &Token::Eof {
            errors.push(self.err("expected '%%' before end of input"));
            return (spec, errors);
        }
        self.advance(); // consume %%

        while self.peek() != &Token::Eof {
            match self.parse_rule() {
                Ok(rule) => spec.rules.push(rule),
                Err(e) => {
                    errors.push(e);
                    if errors.len() >= max_errors {
                        return (spec, errors);
                    }
                    self.recover(true);
                }
            }
        }
        for t in PREDECLARED {
            spec.terms.insert(t.to_string());
        }
        (spec, errors)
    }
}

pub fn parse(tokens: &[Spanned], filename: &str) -> Result<Spec, Error> {
    let mut p = Parser::new(tokens, filename);
    p.parse_file()
}

/// Parse in multi-error recovery mode.
///
/// Returns the successfully-parsed specification plus all accumulated
/// errors (empty when the input was clean). Recovery resumes at the next
/// declaration keyword or, inside the rules section, just past the next
/// action block.
pub fn parse_recovering(
    tokens: &[Spanned],
    filename: &str,
    max_errors: usize,
) -> (Spec, Vec<Error>) {
    let mut p = Parser::new(tokens, filename);
    p.parse_file_recovering(max_errors)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
