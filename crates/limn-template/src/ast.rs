/*
 * ast.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Expression and template AST types.
//!
//! Both trees are built once per parse, are immutable afterwards, and can be
//! evaluated/rendered any number of times with different environments.

/// A unary prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation: `-x`.
    Neg,
    /// Value-propagating logical not: `not x`.
    Not,
}

/// A binary operator.
///
/// Precedence and associativity live in the parser; the tier layout is part
/// of the language's compatibility surface, in particular binary `+`/`-`
/// sharing a tier with the comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `^`: binds right-associatively like exponentiation but evaluates as
    /// bitwise XOR over the operands' 32-bit integer representations.
    Caret,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `==` (loose, coercing)
    Eq,
    /// `===` (strict, type and value)
    StrictEq,
    /// `!=`
    Ne,
    /// `!==`
    StrictNe,
    /// `<=`
    Le,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `contains`: substring / element membership test
    Contains,
    /// `+`: numeric addition or string concatenation
    Add,
    /// binary `-`
    Sub,
    /// `and`: short-circuit, propagates operand values
    And,
    /// `or`: short-circuit, propagates operand values
    Or,
}

impl BinaryOp {
    /// The surface spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Caret => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::StrictEq => "===",
            BinaryOp::Ne => "!=",
            BinaryOp::StrictNe => "!==",
            BinaryOp::Le => "<=",
            BinaryOp::Lt => "<",
            BinaryOp::Ge => ">=",
            BinaryOp::Gt => ">",
            BinaryOp::Contains => "contains",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// A node in the expression AST.
///
/// The tree is finite, acyclic, and fully owned by its root; evaluation
/// never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// Boolean literal: `true` / `false`.
    Bool(bool),

    /// Integer literal, stored as a float.
    Num(f64),

    /// Single- or double-quoted string literal, escapes interpreted.
    Str(String),

    /// Identifier, looked up in the environment at evaluation time.
    Id(String),

    /// Property access: `a.b.c` is `Member(Member(Id(a), "b"), "c")`.
    Member(Box<ExprNode>, String),

    /// Helper invocation with positional arguments: `name(arg, ...)`.
    Helper(String, Vec<ExprNode>),

    /// Unary prefix operation; stacking nests (`- - x`).
    Unary(UnaryOp, Box<ExprNode>),

    /// Binary operation.
    Binary(BinaryOp, Box<ExprNode>, Box<ExprNode>),
}

impl ExprNode {
    /// Convenience constructor for a member access.
    pub fn member(base: ExprNode, key: impl Into<String>) -> Self {
        ExprNode::Member(Box::new(base), key.into())
    }

    /// Convenience constructor for a unary operation.
    pub fn unary(op: UnaryOp, operand: ExprNode) -> Self {
        ExprNode::Unary(op, Box::new(operand))
    }

    /// Convenience constructor for a binary operation.
    pub fn binary(op: BinaryOp, left: ExprNode, right: ExprNode) -> Self {
        ExprNode::Binary(op, Box::new(left), Box::new(right))
    }
}

/// A filter applied to an interpolation's value, pipeline-style.
///
/// `{{ x | clamp: 0, 10 }}` resolves `clamp` through the helper registry and
/// calls it with the piped value prepended to the evaluated arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Registry name of the filter.
    pub name: String,
    /// Additional arguments after the piped value.
    pub args: Vec<ExprNode>,
}

/// A node in the template AST.
///
/// Every `Cond`/`For` body is a complete balanced sub-block; there are no
/// parent back-references, so the tree is trivially shareable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Literal text emitted as-is (whitespace trimming already applied).
    Raw(String),

    /// `{{ expr | filter | filter: arg }}`
    Interpolation { expr: ExprNode, filters: Vec<Filter> },

    /// Conditional block; covers `if`, `unless` (`negate` set), and `elseif`
    /// links, whose chain hangs off `else_branch`.
    ///
    /// `unless` carries its raw condition with `negate` rather than a
    /// condition wrapped in the `not` operator: `not` propagates falsy
    /// operand values instead of producing `true`, so the wrapped form would
    /// never read as truthy.
    Cond {
        condition: ExprNode,
        negate: bool,
        children: Vec<TemplateNode>,
        else_branch: Option<Box<TemplateNode>>,
    },

    /// Terminal `else` branch of a conditional chain.
    Else { children: Vec<TemplateNode> },

    /// `{% for item in collection %}` loop.
    For {
        item: String,
        collection: ExprNode,
        children: Vec<TemplateNode>,
    },

    /// `{% assign name = expr %}`: binds a value for the remaining siblings
    /// of the same block.
    Assign { item: String, expr: ExprNode },
}
