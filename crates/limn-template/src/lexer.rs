/*
 * lexer.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Token scanner for the expression grammar.
//!
//! Multi-character operators that share a prefix (`<` vs `<=`, `==` vs `===`)
//! are matched longest-first; the operator table below is ordered by
//! descending spelling length and must stay that way.

use crate::error::{TemplateError, TemplateResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Num(f64),
    Str(String),
    Ident(String),
    True,
    False,

    // Word operators
    Not,
    And,
    Or,
    Contains,

    // Symbol operators, longest spellings first in OPERATORS
    StrictEq, // ===
    StrictNe, // !==
    EqEq,     // ==
    Ne,       // !=
    Le,       // <=
    Ge,       // >=
    Lt,       // <
    Gt,       // >
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Caret,    // ^
    LParen,   // (
    RParen,   // )
    Dot,      // .
    Comma,    // ,
}

/// A token with the byte range it was scanned from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// Symbol operators ordered by descending length so that `===` is never
/// truncated to `==`, nor `<=` to `<`.
const OPERATORS: &[(&str, Token)] = &[
    ("===", Token::StrictEq),
    ("!==", Token::StrictNe),
    ("==", Token::EqEq),
    ("!=", Token::Ne),
    ("<=", Token::Le),
    (">=", Token::Ge),
    ("<", Token::Lt),
    (">", Token::Gt),
    ("+", Token::Plus),
    ("-", Token::Minus),
    ("*", Token::Star),
    ("/", Token::Slash),
    ("^", Token::Caret),
    ("(", Token::LParen),
    (")", Token::RParen),
    (".", Token::Dot),
    (",", Token::Comma),
];

/// How the scanner treats text it cannot tokenize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// The whole input is one expression; anything unscannable is an error.
    Standalone,
    /// The expression is embedded in a template delimiter; scanning stops
    /// quietly at closing delimiters, trim markers, filter pipes, or any
    /// other unscannable text, which the template tokenizer then consumes.
    Embedded,
}

/// Scan expression tokens from `input` starting at byte `start`.
pub(crate) fn tokenize(input: &str, start: usize, mode: Mode) -> TemplateResult<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut pos = start;

    'scan: while pos < input.len() {
        let rest = &input[pos..];

        let trimmed = rest.trim_start_matches([' ', '\t', '\n', '\r']);
        pos += rest.len() - trimmed.len();
        if trimmed.is_empty() {
            break;
        }
        let rest = trimmed;

        if mode == Mode::Embedded {
            for stop in ["-}}", "-%}", "}}", "%}", "|"] {
                if rest.starts_with(stop) {
                    break 'scan;
                }
            }
        }

        let first = rest.chars().next().unwrap_or_default();

        if first.is_ascii_digit() {
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            let end = pos + digits.len();
            let n: f64 = digits.parse().unwrap_or(f64::NAN);
            tokens.push(Spanned {
                token: Token::Num(n),
                start: pos,
                end,
            });
            pos = end;
            continue;
        }

        if first == '"' || first == '\'' {
            let (literal, end) = scan_string(input, pos, first)?;
            tokens.push(Spanned {
                token: Token::Str(literal),
                start: pos,
                end,
            });
            pos = end;
            continue;
        }

        if first.is_ascii_alphabetic() || first == '_' {
            let word: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphabetic() || *c == '_')
                .collect();
            let end = pos + word.len();
            let token = match word.as_str() {
                "true" => Token::True,
                "false" => Token::False,
                "not" => Token::Not,
                "and" => Token::And,
                "or" => Token::Or,
                "contains" => Token::Contains,
                _ => Token::Ident(word),
            };
            tokens.push(Spanned {
                token,
                start: pos,
                end,
            });
            pos = end;
            continue;
        }

        for (spelling, token) in OPERATORS {
            if rest.starts_with(spelling) {
                tokens.push(Spanned {
                    token: token.clone(),
                    start: pos,
                    end: pos + spelling.len(),
                });
                pos += spelling.len();
                continue 'scan;
            }
        }

        // Unscannable character
        match mode {
            Mode::Embedded => break 'scan,
            Mode::Standalone => {
                return Err(TemplateError::ExprParse {
                    offset: pos,
                    expected: format!("a token, found {first:?}"),
                });
            }
        }
    }

    Ok(tokens)
}

/// Scan a quoted string literal starting at `start` (which holds `quote`),
/// interpreting backslash escapes. Returns the decoded text and the byte
/// offset just past the closing quote.
fn scan_string(input: &str, start: usize, quote: char) -> TemplateResult<(String, usize)> {
    let mut out = String::new();
    let mut chars = input[start + 1..].char_indices();

    while let Some((i, c)) = chars.next() {
        let here = start + 1 + i;
        if c == quote {
            return Ok((out, here + 1));
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, escaped)) = chars.next() else {
            break;
        };
        match escaped {
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let mut code = 0u32;
                let mut digits = 0;
                let mut probe = chars.clone();
                while digits < 4 {
                    match probe.next().and_then(|(_, h)| h.to_digit(16)) {
                        Some(d) => {
                            code = code * 16 + d;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 4 {
                    chars = probe;
                    out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                } else {
                    // Malformed \uXXXX un-escapes like any other char
                    out.push('u');
                }
            }
            other => out.push(other),
        }
    }

    Err(TemplateError::ExprParse {
        offset: start,
        expected: "a closing string quote".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input, 0, Mode::Standalone)
            .expect("tokenizes")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_longest_match_first() {
        assert_eq!(
            kinds("a === b == c <= d < e !== f"),
            vec![
                Token::Ident("a".to_string()),
                Token::StrictEq,
                Token::Ident("b".to_string()),
                Token::EqEq,
                Token::Ident("c".to_string()),
                Token::Le,
                Token::Ident("d".to_string()),
                Token::Lt,
                Token::Ident("e".to_string()),
                Token::StrictNe,
                Token::Ident("f".to_string()),
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("not nota and contains true falsey"),
            vec![
                Token::Not,
                Token::Ident("nota".to_string()),
                Token::And,
                Token::Contains,
                Token::True,
                Token::Ident("falsey".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\tbA\q""#),
            vec![Token::Str("a\tbA\u{0071}".to_string())]
        );
        assert_eq!(kinds(r#"'it\'s'"#), vec![Token::Str("it's".to_string())]);
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(matches!(
            tokenize("\"oops", 0, Mode::Standalone),
            Err(TemplateError::ExprParse { .. })
        ));
    }

    #[test]
    fn test_embedded_mode_stops_at_delimiters() {
        let tokens = tokenize("{{ a - b -}} tail", 2, Mode::Embedded).expect("tokenizes");
        let kinds: Vec<Token> = tokens.into_iter().map(|s| s.token).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Ident("a".to_string()),
                Token::Minus,
                Token::Ident("b".to_string()),
            ]
        );

        let tokens = tokenize("x | upcase }}", 0, Mode::Embedded).expect("tokenizes");
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_unknown_char_is_error_when_standalone() {
        assert!(tokenize("a ? b", 0, Mode::Standalone).is_err());
        assert!(tokenize("a ? b", 0, Mode::Embedded).is_ok());
    }
}
