//! Abstract syntax tree for the range query language.

/// The kind of a binary [`AstNode::Operator`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Intersect,
    Subtract,
    Union,
}

/// A parsed range expression.
///
/// A transient "nothing parsed yet" marker has no counterpart here: the
/// recursive-descent parser in [`crate::range::parser`] never needs to
/// represent that state as a node on an explicit stack.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// The empty expression, e.g. the missing side of `{,foo}`.
    Null,
    /// A literal word, possibly containing a numeric-range shorthand
    /// (`host1..3`) that is expanded at evaluation time.
    Text(String),
    /// An opaque literal (`q(...)` / `"..."`), never re-interpreted as a
    /// range expression.
    Constant(String),
    /// A `/regex/` match.
    Regex(String),
    /// `$KEY` — a lookup against the current cluster.
    LocalClusterLookup(String),
    /// `?expr` — keys of the default cluster whose values intersect `expr`.
    GroupQuery(Box<AstNode>),
    /// `%expr:key` (or `%expr` for the implicit `CLUSTER` key, or `@expr`
    /// for a lookup against the default cluster).
    ClusterLookup {
        cluster: Box<AstNode>,
        key: Box<AstNode>,
    },
    /// `left OP right`.
    Operator {
        kind: OperatorKind,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    /// `left_prefix{middle}right_suffix` brace expansion.
    Braces {
        middle: Box<AstNode>,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    /// `name(arg1;arg2;...)`.
    Function {
        name: String,
        args: Vec<AstNode>,
    },
}
