//! Expression AST nodes.
//!
//! Provides nodes for every expression kind the analyzer evaluates:
//! - Constants and names
//! - Member access, indexing, slicing and calls
//! - Collection displays (list, tuple, set, dict)
//! - Comprehensions and generator expressions
//! - Unary and binary operations, `yield`

use pyinfer_core::{NodeId, Span};

use crate::ops::{BinaryOp, UnaryOp};

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal constant
    Constant(ConstantExpr<'ast>),
    /// Name reference
    Name(Ident<'ast>),
    /// Attribute access (`a.b`)
    Member(&'ast MemberExpr<'ast>),
    /// Subscript (`a[i]`)
    Index(&'ast IndexExpr<'ast>),
    /// Slice inside a subscript (`a[1:2]`)
    Slice(&'ast SliceExpr<'ast>),
    /// Call (`f(x, y=1)`)
    Call(&'ast CallExpr<'ast>),
    /// List display
    List(SequenceExpr<'ast>),
    /// Tuple display
    Tuple(SequenceExpr<'ast>),
    /// Set display
    Set(SequenceExpr<'ast>),
    /// Dict display
    Dict(DictExpr<'ast>),
    /// List/set/dict comprehension or generator expression
    Comprehension(&'ast ComprehensionExpr<'ast>),
    /// `yield` / `yield value`
    Yield(YieldExpr<'ast>),
    /// Unary operation
    Unary(&'ast UnaryExpr<'ast>),
    /// Binary operation
    Binary(&'ast BinaryExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Constant(e) => e.span,
            Self::Name(e) => e.span,
            Self::Member(e) => e.span,
            Self::Index(e) => e.span,
            Self::Slice(e) => e.span,
            Self::Call(e) => e.span,
            Self::List(e) | Self::Tuple(e) | Self::Set(e) => e.span,
            Self::Dict(e) => e.span,
            Self::Comprehension(e) => e.span,
            Self::Yield(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
        }
    }

    /// The name, if this is a plain name reference.
    pub fn as_name(&self) -> Option<&'ast str> {
        match self {
            Self::Name(ident) => Some(ident.name),
            _ => None,
        }
    }
}

/// A literal constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantExpr<'ast> {
    pub kind: ConstantKind<'ast>,
    pub span: Span,
}

/// The kind of literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantKind<'ast> {
    Int(i64),
    Float(f64),
    Str(&'ast str),
    Bytes(&'ast [u8]),
    Bool(bool),
    None,
    Ellipsis,
}

/// Attribute access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub target: Expr<'ast>,
    pub name: Ident<'ast>,
    pub span: Span,
}

/// Subscript.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub target: Expr<'ast>,
    pub index: Expr<'ast>,
    pub span: Span,
}

/// Slice bounds; any part may be omitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceExpr<'ast> {
    pub lower: Option<Expr<'ast>>,
    pub upper: Option<Expr<'ast>>,
    pub step: Option<Expr<'ast>>,
    pub span: Span,
}

/// A call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: Expr<'ast>,
    pub args: &'ast [Argument<'ast>],
    pub span: Span,
}

/// How an argument is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentKind {
    #[default]
    Positional,
    /// `*args`
    Star,
    /// `**kwargs`
    DoubleStar,
}

/// A call argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Argument<'ast> {
    /// Keyword, for `name=value`
    pub name: Option<Ident<'ast>>,
    pub value: Expr<'ast>,
    pub kind: ArgumentKind,
    pub span: Span,
}

/// List, tuple or set display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceExpr<'ast> {
    pub items: &'ast [Expr<'ast>],
    pub span: Span,
}

/// Dict display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DictExpr<'ast> {
    pub entries: &'ast [DictEntry<'ast>],
    pub span: Span,
}

/// One `key: value` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DictEntry<'ast> {
    pub key: Expr<'ast>,
    pub value: Expr<'ast>,
}

/// Which collection a comprehension builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionKind {
    List,
    Set,
    Dict,
    Generator,
}

/// A comprehension.
///
/// Dict comprehensions carry the key in `element` and the value in `value`.
/// Each comprehension opens its own scope, identified by `id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComprehensionExpr<'ast> {
    pub id: NodeId,
    pub kind: ComprehensionKind,
    pub element: Expr<'ast>,
    pub value: Option<Expr<'ast>>,
    pub clauses: &'ast [ComprehensionClause<'ast>],
    pub span: Span,
}

impl<'ast> ComprehensionExpr<'ast> {
    /// The first `for` clause.
    pub fn first_for(&self) -> Option<(&Expr<'ast>, &Expr<'ast>)> {
        self.clauses.iter().find_map(|c| match c {
            ComprehensionClause::For { target, iter, .. } => Some((target, iter)),
            ComprehensionClause::If { .. } => None,
        })
    }
}

/// One `for` or `if` clause of a comprehension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComprehensionClause<'ast> {
    For {
        target: Expr<'ast>,
        iter: Expr<'ast>,
        span: Span,
    },
    If {
        test: Expr<'ast>,
        span: Span,
    },
}

/// `yield` expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldExpr<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// Unary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: Expr<'ast>,
    pub span: Span,
}

/// Binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: Expr<'ast>,
    pub op: BinaryOp,
    pub right: Expr<'ast>,
    pub span: Span,
}
