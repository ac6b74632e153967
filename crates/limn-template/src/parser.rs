/*
 * parser.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Template tokenizer and AST builder.
//!
//! Parsing runs in three passes: the tokenizer flattens the source into an
//! ordered sequence of pieces, a whitespace pass applies the `-` trim markers
//! against adjacent raw pieces, and the structural pass matches blocks into
//! a nested tree using an explicit stack of open frames. With no parent
//! back-pointers, the finished tree is immutable and freely shareable.

use crate::ast::{ExprNode, Filter, TemplateNode};
use crate::error::{TemplateError, TemplateResult};
use crate::expression::parse_embedded;

/// A compiled template ready for rendering.
///
/// Compiling once and rendering many times with different environments is
/// supported and expected to be cheap: rendering only reads the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// The parsed template AST.
    pub(crate) nodes: Vec<TemplateNode>,
}

impl Template {
    /// Compile a template from source text.
    pub fn compile(source: &str) -> TemplateResult<Self> {
        let mut pieces = tokenize(source)?;
        strip_whitespace(&mut pieces);
        let nodes = build(pieces)?;
        Ok(Template { nodes })
    }

    /// The root-level nodes of the compiled template.
    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }
}

/// One lexical unit of a template, prior to tree construction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PieceKind {
    Raw(String),
    Interpolation { expr: ExprNode, filters: Vec<Filter> },
    If(ExprNode),
    Unless(ExprNode),
    ElseIf(ExprNode),
    Else,
    For { item: String, collection: ExprNode },
    Assign { item: String, expr: ExprNode },
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Piece {
    pub kind: PieceKind,
    /// `{{-` / `{%-` requested trimming of the preceding raw text.
    pub strip_left: bool,
    /// `-}}` / `-%}` requested trimming of the following raw text.
    pub strip_right: bool,
}

impl Piece {
    fn raw(content: String) -> Self {
        Piece {
            kind: PieceKind::Raw(content),
            strip_left: false,
            strip_right: false,
        }
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn skip_blank(source: &str, pos: &mut usize) {
    let rest = &source[*pos..];
    *pos += rest.len() - rest.trim_start_matches(is_blank).len();
}

fn read_word(source: &str, pos: &mut usize) -> String {
    let word: String = source[*pos..]
        .chars()
        .take_while(|c| c.is_ascii_alphabetic() || *c == '_')
        .collect();
    *pos += word.len();
    word
}

fn syntax_error(offset: usize, message: impl Into<String>) -> TemplateError {
    TemplateError::TemplateSyntax {
        offset,
        message: message.into(),
    }
}

/// Tokenize a template into its flat piece sequence.
pub(crate) fn tokenize(source: &str) -> TemplateResult<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        let next_delim = [rest.find("{{"), rest.find("{%")]
            .into_iter()
            .flatten()
            .min();

        match next_delim {
            Some(0) => {
                let piece = if rest.starts_with("{{") {
                    scan_interpolation(source, &mut pos)?
                } else {
                    scan_block(source, &mut pos)?
                };
                pieces.push(piece);
            }
            Some(offset) => {
                pieces.push(Piece::raw(rest[..offset].to_string()));
                pos += offset;
            }
            None => {
                pieces.push(Piece::raw(rest.to_string()));
                pos = source.len();
            }
        }
    }

    Ok(pieces)
}

/// Scan `{{-? expr (| filter(: args)?)* -?}}` starting at `pos`.
fn scan_interpolation(source: &str, pos: &mut usize) -> TemplateResult<Piece> {
    *pos += 2;
    let strip_left = source[*pos..].starts_with('-');
    if strip_left {
        *pos += 1;
    }

    let (expr, end) = parse_embedded(source, *pos)?;
    *pos = end;
    skip_blank(source, pos);

    let mut filters = Vec::new();
    while source[*pos..].starts_with('|') {
        *pos += 1;
        skip_blank(source, pos);
        let name = read_word(source, pos);
        if name.is_empty() {
            return Err(syntax_error(*pos, "expected a filter name after `|`"));
        }
        let mut args = Vec::new();
        if source[*pos..].starts_with(':') {
            *pos += 1;
            loop {
                let (arg, end) = parse_embedded(source, *pos)?;
                args.push(arg);
                *pos = end;
                skip_blank(source, pos);
                if source[*pos..].starts_with(',') {
                    *pos += 1;
                } else {
                    break;
                }
            }
        }
        filters.push(Filter { name, args });
        skip_blank(source, pos);
    }

    let strip_right = close_delimiter(source, pos, "}}")?;
    Ok(Piece {
        kind: PieceKind::Interpolation { expr, filters },
        strip_left,
        strip_right,
    })
}

/// Scan `{%-? keyword ... -?%}` starting at `pos`.
fn scan_block(source: &str, pos: &mut usize) -> TemplateResult<Piece> {
    *pos += 2;
    let strip_left = source[*pos..].starts_with('-');
    if strip_left {
        *pos += 1;
    }
    skip_blank(source, pos);

    let keyword_at = *pos;
    let keyword = read_word(source, pos);

    let kind = match keyword.as_str() {
        "if" => PieceKind::If(block_expression(source, pos)?),
        "unless" => PieceKind::Unless(block_expression(source, pos)?),
        "elseif" | "elsif" | "elif" => PieceKind::ElseIf(block_expression(source, pos)?),
        "else" => {
            // `else if` is an accepted spelling of `elseif`
            let checkpoint = *pos;
            skip_blank(source, pos);
            if read_word(source, pos) == "if" {
                PieceKind::ElseIf(block_expression(source, pos)?)
            } else {
                *pos = checkpoint;
                PieceKind::Else
            }
        }
        "for" => {
            require_blank(source, pos)?;
            let item = read_word(source, pos);
            if item.is_empty() {
                return Err(syntax_error(*pos, "expected a loop variable name"));
            }
            require_blank(source, pos)?;
            let preposition = read_word(source, pos);
            if preposition != "in" && preposition != "of" {
                return Err(syntax_error(*pos, "expected `in` or `of` in for header"));
            }
            require_blank(source, pos)?;
            let (collection, end) = parse_embedded(source, *pos)?;
            *pos = end;
            PieceKind::For { item, collection }
        }
        "assign" => {
            require_blank(source, pos)?;
            let item = read_word(source, pos);
            if item.is_empty() {
                return Err(syntax_error(*pos, "expected a variable name after `assign`"));
            }
            skip_blank(source, pos);
            if !source[*pos..].starts_with('=') {
                return Err(syntax_error(*pos, "expected `=` in assign header"));
            }
            *pos += 1;
            let (expr, end) = parse_embedded(source, *pos)?;
            *pos = end;
            PieceKind::Assign { item, expr }
        }
        // the grammar does not cross-check which kind of block a terminator closes
        "end" | "endif" | "endunless" | "endfor" => PieceKind::End,
        "" => return Err(syntax_error(keyword_at, "expected a block keyword")),
        other => {
            return Err(syntax_error(
                keyword_at,
                format!("unknown block keyword `{other}`"),
            ));
        }
    };

    skip_blank(source, pos);
    let strip_right = close_delimiter(source, pos, "%}")?;
    Ok(Piece {
        kind,
        strip_left,
        strip_right,
    })
}

/// Keyword blocks require whitespace between keyword and expression.
fn block_expression(source: &str, pos: &mut usize) -> TemplateResult<ExprNode> {
    require_blank(source, pos)?;
    let (expr, end) = parse_embedded(source, *pos)?;
    *pos = end;
    Ok(expr)
}

fn require_blank(source: &str, pos: &mut usize) -> TemplateResult<()> {
    if !source[*pos..].starts_with(is_blank) {
        return Err(syntax_error(*pos, "expected whitespace"));
    }
    skip_blank(source, pos);
    Ok(())
}

/// Expect `-close` or `close`, reporting whether the trim marker was present.
fn close_delimiter(source: &str, pos: &mut usize, close: &str) -> TemplateResult<bool> {
    let rest = &source[*pos..];
    if rest.starts_with('-') && rest[1..].starts_with(close) {
        *pos += 1 + close.len();
        Ok(true)
    } else if rest.starts_with(close) {
        *pos += close.len();
        Ok(false)
    } else {
        Err(syntax_error(*pos, format!("expected `{close}`")))
    }
}

/// Apply trim markers against adjacent raw pieces. A marker only reaches the
/// piece directly next to it; control pieces in between block the trim.
pub(crate) fn strip_whitespace(pieces: &mut [Piece]) {
    for i in 0..pieces.len() {
        if pieces[i].strip_left && i > 0 {
            if let PieceKind::Raw(content) = &mut pieces[i - 1].kind {
                let trimmed = content.trim_end_matches(is_blank).len();
                content.truncate(trimmed);
            }
        }
        if pieces[i].strip_right && i + 1 < pieces.len() {
            if let PieceKind::Raw(content) = &mut pieces[i + 1].kind {
                *content = content.trim_start_matches(is_blank).to_string();
            }
        }
    }
}

/// An open container during the structural pass.
enum Frame {
    Root {
        children: Vec<TemplateNode>,
    },
    For {
        item: String,
        collection: ExprNode,
        children: Vec<TemplateNode>,
    },
    /// A conditional chain: the `if`/`unless` branch, any `elseif` branches,
    /// and at most one trailing `else` branch (condition `None`). `negate`
    /// applies to the opening branch only.
    Cond {
        negate: bool,
        branches: Vec<(Option<ExprNode>, Vec<TemplateNode>)>,
    },
}

impl Frame {
    fn children_mut(&mut self) -> &mut Vec<TemplateNode> {
        match self {
            Frame::Root { children } | Frame::For { children, .. } => children,
            Frame::Cond { branches, .. } => {
                // a Cond frame always has at least its opening branch
                &mut branches.last_mut().expect("open branch").1
            }
        }
    }
}

/// Match the flat piece sequence into a nested tree.
pub(crate) fn build(pieces: Vec<Piece>) -> TemplateResult<Vec<TemplateNode>> {
    let mut stack = vec![Frame::Root {
        children: Vec::new(),
    }];

    for piece in pieces {
        match piece.kind {
            PieceKind::Raw(content) => {
                if !content.is_empty() {
                    current(&mut stack).push(TemplateNode::Raw(content));
                }
            }
            PieceKind::Interpolation { expr, filters } => {
                current(&mut stack).push(TemplateNode::Interpolation { expr, filters });
            }
            PieceKind::Assign { item, expr } => {
                current(&mut stack).push(TemplateNode::Assign { item, expr });
            }
            PieceKind::If(condition) => {
                stack.push(Frame::Cond {
                    negate: false,
                    branches: vec![(Some(condition), Vec::new())],
                });
            }
            PieceKind::Unless(condition) => {
                stack.push(Frame::Cond {
                    negate: true,
                    branches: vec![(Some(condition), Vec::new())],
                });
            }
            // `elseif` may only continue an `if`/`elseif` chain; continuing
            // an `unless` or following an `else` is misplaced
            PieceKind::ElseIf(condition) => match stack.last_mut() {
                Some(Frame::Cond {
                    negate: false,
                    branches,
                }) if branches.last().is_some_and(|b| b.0.is_some()) => {
                    branches.push((Some(condition), Vec::new()));
                }
                _ => {
                    return Err(TemplateError::MisplacedBlock {
                        keyword: "elseif".to_string(),
                    });
                }
            },
            PieceKind::Else => match stack.last_mut() {
                Some(Frame::Cond { branches, .. })
                    if branches.last().is_some_and(|b| b.0.is_some()) =>
                {
                    branches.push((None, Vec::new()));
                }
                _ => {
                    return Err(TemplateError::MisplacedBlock {
                        keyword: "else".to_string(),
                    });
                }
            },
            PieceKind::End => {
                let frame = stack.pop().expect("stack is never empty");
                let node = match frame {
                    Frame::Root { .. } => {
                        return Err(TemplateError::MisplacedBlock {
                            keyword: "end".to_string(),
                        });
                    }
                    Frame::For {
                        item,
                        collection,
                        children,
                    } => TemplateNode::For {
                        item,
                        collection,
                        children,
                    },
                    Frame::Cond { negate, branches } => close_cond(negate, branches),
                };
                current(&mut stack).push(node);
            }
            PieceKind::For { item, collection } => {
                stack.push(Frame::For {
                    item,
                    collection,
                    children: Vec::new(),
                });
            }
        }
    }

    match stack.pop() {
        Some(Frame::Root { children }) if stack.is_empty() => Ok(children),
        _ => Err(TemplateError::UnterminatedBlock),
    }
}

fn current(stack: &mut [Frame]) -> &mut Vec<TemplateNode> {
    stack.last_mut().expect("stack is never empty").children_mut()
}

/// Fold a conditional chain into nested `Cond`/`Else` nodes, rightmost
/// branch first. Only the opening branch can be an `unless`.
fn close_cond(negate: bool, branches: Vec<(Option<ExprNode>, Vec<TemplateNode>)>) -> TemplateNode {
    let mut else_branch: Option<Box<TemplateNode>> = None;
    for (index, (condition, children)) in branches.into_iter().enumerate().rev() {
        let node = match condition {
            Some(condition) => TemplateNode::Cond {
                condition,
                negate: negate && index == 0,
                children,
                else_branch,
            },
            None => TemplateNode::Else { children },
        };
        else_branch = Some(Box::new(node));
    }
    // the chain always opens with a conditioned branch
    *else_branch.expect("non-empty chain")
}
