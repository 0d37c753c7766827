//! Lexer for the `.burg` specification language.
//!
//! `{: … :}` code blocks are captured verbatim (the parser never looks
//! inside them); `--` comments run to end of line.

use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `%term`
    Term,
    /// `%head`
    Head,
    /// `%tail`
    Tail,
    /// `%type`
    Type,
    /// `%%`
    Sep,
    /// `{: … :}` content, braces stripped, text verbatim
    Code(String),
    /// Identifier
    Word(String),
    /// Non-negative integer literal
    Int(i64),
    /// Quoted string literal, escapes resolved
    Str(String),
    /// Character literal
    Char(char),
    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Comma,
    // End of input
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

pub fn lex(src: &str, filename: &str) -> Result<Vec<Spanned>, Error> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line: u32 = 1;

    while pos < chars.len() {
        let c = chars[pos];

        // Line comment
        if c == '-' && pos + 1 < chars.len() && chars[pos + 1] == '-' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        // Whitespace
        if c.is_whitespace() {
            if c == '\n' {
                line += 1;
            }
            pos += 1;
            continue;
        }

        let tok_line = line;

        // Code block
        if c == '{' && pos + 1 < chars.len() && chars[pos + 1] == ':' {
            pos += 2;
            let mut body = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(Error::syntax(filename, tok_line, "unterminated code block"));
                }
                if chars[pos] == ':' && pos + 1 < chars.len() && chars[pos + 1] == '}' {
                    pos += 2;
                    break;
                }
                if chars[pos] == '\n' {
                    line += 1;
                }
                body.push(chars[pos]);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Code(body),
                line: tok_line,
            });
            continue;
        }

        // Percent keywords and the rule separator
        if c == '%' {
            if pos + 1 < chars.len() && chars[pos + 1] == '%' {
                tokens.push(Spanned {
                    token: Token::Sep,
                    line: tok_line,
                });
                pos += 2;
                continue;
            }
            let start = pos + 1;
            let mut end = start;
            while end < chars.len() && chars[end].is_ascii_alphabetic() {
                end += 1;
            }
            let word: String = chars[start..end].iter().collect();
            let token = match word.as_str() {
                "term" => Token::Term,
                "head" => Token::Head,
                "tail" => Token::Tail,
                "type" => Token::Type,
                other => {
                    return Err(Error::syntax(
                        filename,
                        tok_line,
                        format!("unknown declaration '%{}'", other),
                    ));
                }
            };
            tokens.push(Spanned {
                token,
                line: tok_line,
            });
            pos = end;
            continue;
        }

        // String literal
        if c == '"' {
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(Error::syntax(
                        filename,
                        tok_line,
                        "unterminated string literal",
                    ));
                }
                let sc = chars[pos];
                if sc == '"' {
                    pos += 1;
                    break;
                }
                if sc == '\n' {
                    return Err(Error::syntax(
                        filename,
                        tok_line,
                        "unterminated string literal",
                    ));
                }
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(Error::syntax(
                            filename,
                            tok_line,
                            "unterminated escape in string",
                        ));
                    }
                    match chars[pos] {
                        '"' => s.push('"'),
                        '\\' => s.push('\\'),
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => {
                            s.push('\\');
                            s.push(other);
                        }
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                line: tok_line,
            });
            continue;
        }

        // Character literal
        if c == '\'' {
            pos += 1;
            if pos >= chars.len() {
                return Err(Error::syntax(
                    filename,
                    tok_line,
                    "unterminated character literal",
                ));
            }
            let ch = if chars[pos] == '\\' {
                pos += 1;
                if pos >= chars.len() {
                    return Err(Error::syntax(
                        filename,
                        tok_line,
                        "unterminated character literal",
                    ));
                }
                let esc = match chars[pos] {
                    'n' => '\n',
                    't' => '\t',
                    '\\' => '\\',
                    '\'' => '\'',
                    other => {
                        return Err(Error::syntax(
                            filename,
                            tok_line,
                            format!("unknown escape '\\{}'", other),
                        ));
                    }
                };
                pos += 1;
                esc
            } else {
                let ch = chars[pos];
                pos += 1;
                ch
            };
            if pos >= chars.len() || chars[pos] != '\'' {
                return Err(Error::syntax(
                    filename,
                    tok_line,
                    "unterminated character literal",
                ));
            }
            pos += 1;
            tokens.push(Spanned {
                token: Token::Char(ch),
                line: tok_line,
            });
            continue;
        }

        // Number
        if c.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let s: String = chars[start..pos].iter().collect();
            let n: i64 = s
                .parse()
                .map_err(|_| Error::syntax(filename, tok_line, format!("invalid integer '{}'", s)))?;
            tokens.push(Spanned {
                token: Token::Int(n),
                line: tok_line,
            });
            continue;
        }

        // Punctuation
        let punct = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = punct {
            tokens.push(Spanned {
                token,
                line: tok_line,
            });
            pos += 1;
            continue;
        }

        // Identifier
        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Word(word),
                line: tok_line,
            });
            continue;
        }

        return Err(Error::syntax(
            filename,
            tok_line,
            format!("unexpected character '{}'", c),
        ));
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
    });
    Ok(tokens)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        lex(src, "test.burg")
            .expect("lex should succeed")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn keywords_and_separator() {
        assert_eq!(
            kinds("%term %head %tail %type %%"),
            vec![
                Token::Term,
                Token::Head,
                Token::Tail,
                Token::Type,
                Token::Sep,
                Token::Eof
            ]
        );
    }

    #[test]
    fn code_block_is_captured_verbatim() {
        let toks = kinds("{: x + y -- not a comment :}");
        assert_eq!(
            toks[0],
            Token::Code(" x + y -- not a comment ".to_owned())
        );
    }

    #[test]
    fn code_block_tracks_lines() {
        let toks = lex("{: a\nb\nc :}\nfoo", "test.burg").unwrap();
        assert_eq!(toks[0].line, 1);
        assert!(matches!(toks[0].token, Token::Code(_)));
        assert_eq!(toks[1].line, 4);
        assert_eq!(toks[1].token, Token::Word("foo".to_owned()));
    }

    #[test]
    fn unterminated_code_block_is_fatal() {
        assert!(lex("{: never closed", "test.burg").is_err());
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("a -- the rest is noise ( ) [ ]\nb"),
            vec![
                Token::Word("a".to_owned()),
                Token::Word("b".to_owned()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn literals() {
        assert_eq!(
            kinds(r#"42 "br" 'c' '\n'"#),
            vec![
                Token::Int(42),
                Token::Str("br".to_owned()),
                Token::Char('c'),
                Token::Char('\n'),
                Token::Eof
            ]
        );
    }

    #[test]
    fn pattern_punctuation() {
        assert_eq!(
            kinds("ADD(x:e, y:e) [2]"),
            vec![
                Token::Word("ADD".to_owned()),
                Token::LParen,
                Token::Word("x".to_owned()),
                Token::Colon,
                Token::Word("e".to_owned()),
                Token::Comma,
                Token::Word("y".to_owned()),
                Token::Colon,
                Token::Word("e".to_owned()),
                Token::RParen,
                Token::LBracket,
                Token::Int(2),
                Token::RBracket,
                Token::Eof
            ]
        );
    }

    #[test]
    fn underscore_identifiers_lex_as_words() {
        assert_eq!(
            kinds("_ADD2"),
            vec![Token::Word("_ADD2".to_owned()), Token::Eof]
        );
    }

    #[test]
    fn unknown_declaration_is_fatal() {
        let err = lex("%bogus", "test.burg").unwrap_err();
        assert!(err.to_string().contains("%bogus"), "got: {}", err);
    }
}
