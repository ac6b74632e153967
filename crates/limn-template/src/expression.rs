/*
 * expression.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Recursive-descent parser for the expression grammar.
//!
//! Precedence tiers, tightest binding first:
//!
//! 1. atoms: literals, identifiers, member chains, helper calls, parens
//! 2. unary prefix `-` / `not`, right-nested
//! 3. `^`, right-associative
//! 4. `*` `/`, left-associative
//! 5. `==` `===` `!=` `!==` `<=` `<` `>=` `>` `contains` `+` `-`,
//!    left-associative (binary plus/minus share this tier with the
//!    comparisons, which is part of the compatibility surface)
//! 6. `and` `or`, left-associative
//!
//! Whitespace is insignificant around tokens, and a standalone parse must
//! consume the entire input.

use crate::ast::{BinaryOp, ExprNode, UnaryOp};
use crate::error::{TemplateError, TemplateResult};
use crate::lexer::{Mode, Spanned, Token, tokenize};

/// Parse a standalone expression string into an AST.
///
/// Trailing text that is not part of the expression is a parse error.
pub fn parse_expression(input: &str) -> TemplateResult<ExprNode> {
    let tokens = tokenize(input, 0, Mode::Standalone)?;
    let mut parser = Parser::new(&tokens, input.len());
    let node = parser.parse_expr()?;
    match parser.peek() {
        None => Ok(node),
        Some(extra) => Err(TemplateError::ExprParse {
            offset: extra.start,
            expected: "end of input".to_string(),
        }),
    }
}

/// Parse an expression embedded in a template delimiter, starting at byte
/// `at`. Returns the AST and the byte offset just past the last token the
/// expression consumed; the template tokenizer resumes from there.
pub(crate) fn parse_embedded(input: &str, at: usize) -> TemplateResult<(ExprNode, usize)> {
    let tokens = tokenize(input, at, Mode::Embedded)?;
    if tokens.is_empty() {
        return Err(TemplateError::ExprParse {
            offset: at,
            expected: "an expression".to_string(),
        });
    }
    let mut parser = Parser::new(&tokens, input.len());
    let node = parser.parse_expr()?;
    let end = tokens[parser.pos - 1].end;
    Ok((node, end))
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    input_len: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Spanned], input_len: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            input_len,
        }
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Spanned> {
        let spanned = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(spanned)
    }

    fn error(&self, expected: &str) -> TemplateError {
        let offset = self
            .peek()
            .map(|s| s.start)
            .unwrap_or(self.input_len);
        TemplateError::ExprParse {
            offset,
            expected: expected.to_string(),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek().map(|s| &s.token) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_expr(&mut self) -> TemplateResult<ExprNode> {
        self.parse_logic()
    }

    /// Tier 6: `and` / `or`, left-associative.
    fn parse_logic(&mut self) -> TemplateResult<ExprNode> {
        let mut node = self.parse_comparison()?;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::And) => BinaryOp::And,
                Some(Token::Or) => BinaryOp::Or,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_comparison()?;
            node = ExprNode::binary(op, node, right);
        }
        Ok(node)
    }

    /// Tier 5: comparisons plus binary `+`/`-`, left-associative.
    fn parse_comparison(&mut self) -> TemplateResult<ExprNode> {
        let mut node = self.parse_term()?;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::StrictEq) => BinaryOp::StrictEq,
                Some(Token::StrictNe) => BinaryOp::StrictNe,
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Ge) => BinaryOp::Ge,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Contains) => BinaryOp::Contains,
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_term()?;
            node = ExprNode::binary(op, node, right);
        }
        Ok(node)
    }

    /// Tier 4: `*` / `/`, left-associative.
    fn parse_term(&mut self) -> TemplateResult<ExprNode> {
        let mut node = self.parse_power()?;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_power()?;
            node = ExprNode::binary(op, node, right);
        }
        Ok(node)
    }

    /// Tier 3: `^`, right-associative.
    fn parse_power(&mut self) -> TemplateResult<ExprNode> {
        let base = self.parse_unary()?;
        if self.eat(&Token::Caret) {
            let exponent = self.parse_power()?;
            Ok(ExprNode::binary(BinaryOp::Caret, base, exponent))
        } else {
            Ok(base)
        }
    }

    /// Tier 2: unary prefix `-` / `not`; stacking nests.
    fn parse_unary(&mut self) -> TemplateResult<ExprNode> {
        let op = match self.peek().map(|s| &s.token) {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Not) => UnaryOp::Not,
            _ => return self.parse_atom(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(ExprNode::unary(op, operand))
    }

    /// Tier 1: atoms.
    fn parse_atom(&mut self) -> TemplateResult<ExprNode> {
        let Some(spanned) = self.next() else {
            return Err(self.error("an expression"));
        };
        match spanned.token.clone() {
            Token::Num(n) => Ok(ExprNode::Num(n)),
            Token::True => Ok(ExprNode::Bool(true)),
            Token::False => Ok(ExprNode::Bool(false)),
            Token::Str(s) => Ok(ExprNode::Str(s)),
            Token::LParen => {
                let inner = self.parse_expr()?;
                if self.eat(&Token::RParen) {
                    Ok(inner)
                } else {
                    Err(self.error("a closing `)`"))
                }
            }
            Token::Ident(name) => {
                if self.peek().map(|s| &s.token) == Some(&Token::LParen) {
                    self.pos += 1;
                    self.parse_helper_call(name)
                } else {
                    self.parse_member_chain(ExprNode::Id(name))
                }
            }
            _ => Err(TemplateError::ExprParse {
                offset: spanned.start,
                expected: "an expression".to_string(),
            }),
        }
    }

    /// `name(arg, arg, ...)` with zero or more comma-separated arguments.
    fn parse_helper_call(&mut self, name: String) -> TemplateResult<ExprNode> {
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                if self.eat(&Token::RParen) {
                    break;
                }
                return Err(self.error("`,` or `)` in helper arguments"));
            }
        }
        Ok(ExprNode::Helper(name, args))
    }

    /// Left-fold `.identifier` suffixes onto an identifier.
    fn parse_member_chain(&mut self, base: ExprNode) -> TemplateResult<ExprNode> {
        let mut node = base;
        while self.eat(&Token::Dot) {
            let key = match self.next().map(|s| s.token.clone()) {
                Some(Token::Ident(key)) => key,
                // word operators are ordinary names in member position
                Some(Token::True) => "true".to_string(),
                Some(Token::False) => "false".to_string(),
                Some(Token::Not) => "not".to_string(),
                Some(Token::And) => "and".to_string(),
                Some(Token::Or) => "or".to_string(),
                Some(Token::Contains) => "contains".to_string(),
                _ => return Err(self.error("an identifier after `.`")),
            };
            node = ExprNode::member(node, key);
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp::*;
    use crate::ast::ExprNode::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> ExprNode {
        parse_expression(input).expect("parses")
    }

    #[test]
    fn test_parsing_is_pure() {
        let a = parse("a and b or upcase(name) + 1");
        let b = parse("a and b or upcase(name) + 1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_member_chain_left_associates() {
        assert_eq!(
            parse("a.b.c"),
            ExprNode::member(ExprNode::member(Id("a".to_string()), "b"), "c"),
        );
    }

    #[test]
    fn test_explicit_grouping_beats_default_binding() {
        let grouped_left = parse("(2 + 5) ^ -15");
        let grouped_right = parse("2 + (5 ^ -15)");
        let ungrouped = parse("2 + 5 ^ -15");

        assert_ne!(grouped_left, grouped_right);
        // `^` binds tighter than `+` and nests to the right
        assert_eq!(ungrouped, grouped_right);
        assert_eq!(
            ungrouped,
            ExprNode::binary(
                Add,
                Num(2.0),
                ExprNode::binary(Caret, Num(5.0), ExprNode::unary(UnaryOp::Neg, Num(15.0))),
            )
        );
    }

    #[test]
    fn test_caret_is_right_associative() {
        assert_eq!(
            parse("1 ^ 2 ^ 3"),
            ExprNode::binary(
                Caret,
                Num(1.0),
                ExprNode::binary(Caret, Num(2.0), Num(3.0)),
            )
        );
    }

    #[test]
    fn test_plus_shares_tier_with_comparisons() {
        // left-associative within the tier: (((1 + 2) < 3) + 4)
        assert_eq!(
            parse("1 + 2 < 3 + 4"),
            ExprNode::binary(
                Add,
                ExprNode::binary(Lt, ExprNode::binary(Add, Num(1.0), Num(2.0)), Num(3.0)),
                Num(4.0),
            )
        );
        // but multiplication binds tighter
        assert_eq!(
            parse("1 + 2 * 3"),
            ExprNode::binary(Add, Num(1.0), ExprNode::binary(Mul, Num(2.0), Num(3.0))),
        );
    }

    #[test]
    fn test_unary_stacking() {
        assert_eq!(
            parse("- - x"),
            ExprNode::unary(
                UnaryOp::Neg,
                ExprNode::unary(UnaryOp::Neg, Id("x".to_string())),
            )
        );
        assert_eq!(
            parse("not not ok"),
            ExprNode::unary(
                UnaryOp::Not,
                ExprNode::unary(UnaryOp::Not, Id("ok".to_string())),
            )
        );
    }

    #[test]
    fn test_helper_calls() {
        assert_eq!(
            parse("clamp(x, 0, upper('a'))"),
            Helper(
                "clamp".to_string(),
                vec![
                    Id("x".to_string()),
                    Num(0.0),
                    Helper("upper".to_string(), vec![Str("a".to_string())]),
                ],
            )
        );
        assert_eq!(parse("now()"), Helper("now".to_string(), vec![]));
    }

    #[test]
    fn test_strict_operators_scan_whole() {
        assert_eq!(
            parse("a === b"),
            ExprNode::binary(StrictEq, Id("a".to_string()), Id("b".to_string())),
        );
        assert_eq!(
            parse("a !== b"),
            ExprNode::binary(StrictNe, Id("a".to_string()), Id("b".to_string())),
        );
    }

    #[test]
    fn test_contains_is_a_comparison() {
        assert_eq!(
            parse("arr contains a.b and ok"),
            ExprNode::binary(
                And,
                ExprNode::binary(
                    Contains,
                    Id("arr".to_string()),
                    ExprNode::member(Id("a".to_string()), "b"),
                ),
                Id("ok".to_string()),
            )
        );
    }

    #[test]
    fn test_trailing_garbage_is_an_error() {
        assert!(matches!(
            parse_expression("1 + 2 )"),
            Err(TemplateError::ExprParse { offset: 6, .. })
        ));
        assert!(parse_expression("").is_err());
        assert!(parse_expression("a .").is_err());
        assert!(parse_expression("f(1,").is_err());
    }

    #[test]
    fn test_embedded_parse_reports_consumed_end() {
        let input = "{{ a + b }}";
        let (node, end) = parse_embedded(input, 2).expect("parses");
        assert_eq!(
            node,
            ExprNode::binary(Add, Id("a".to_string()), Id("b".to_string())),
        );
        assert_eq!(&input[end..], " }}");
    }
}
