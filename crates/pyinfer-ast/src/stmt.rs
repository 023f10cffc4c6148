//! Statement AST nodes.
//!
//! Provides nodes for:
//! - Expression statements and assignments
//! - `return`, `global`, `nonlocal`, `pass`
//! - Control flow (`if`, `for`, `while`)
//! - Function and class definitions

use pyinfer_core::{NodeId, ParameterKind, Span};

use crate::expr::{Expr, Ident};

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// Expression statement
    Expr(ExprStmt<'ast>),
    /// `a = b = value`
    Assign(&'ast AssignStmt<'ast>),
    /// `a: T = value`
    AnnAssign(&'ast AnnAssignStmt<'ast>),
    /// `return` / `return value`
    Return(ReturnStmt<'ast>),
    /// `def`
    FunctionDef(&'ast FunctionDef<'ast>),
    /// `class`
    ClassDef(&'ast ClassDef<'ast>),
    /// `global a, b`
    Global(NamesStmt<'ast>),
    /// `nonlocal a, b`
    Nonlocal(NamesStmt<'ast>),
    /// `if` / `elif` / `else`
    If(&'ast IfStmt<'ast>),
    /// `for target in iter`
    For(&'ast ForStmt<'ast>),
    /// `while test`
    While(&'ast WhileStmt<'ast>),
    /// `pass`
    Pass(Span),
}

impl<'ast> Stmt<'ast> {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Self::Expr(s) => s.span,
            Self::Assign(s) => s.span,
            Self::AnnAssign(s) => s.span,
            Self::Return(s) => s.span,
            Self::FunctionDef(s) => s.span,
            Self::ClassDef(s) => s.span,
            Self::Global(s) | Self::Nonlocal(s) => s.span,
            Self::If(s) => s.span,
            Self::For(s) => s.span,
            Self::While(s) => s.span,
            Self::Pass(span) => *span,
        }
    }
}

/// Expression evaluated for its effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: Expr<'ast>,
    pub span: Span,
}

/// Assignment to one or more targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignStmt<'ast> {
    pub targets: &'ast [Expr<'ast>],
    pub value: Expr<'ast>,
    pub span: Span,
}

/// Annotated assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnAssignStmt<'ast> {
    pub target: Expr<'ast>,
    pub annotation: Expr<'ast>,
    pub value: Option<Expr<'ast>>,
    pub span: Span,
}

/// Return statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// `global` or `nonlocal` name list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamesStmt<'ast> {
    pub names: &'ast [Ident<'ast>],
    pub span: Span,
}

/// If statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub test: Expr<'ast>,
    pub body: &'ast [Stmt<'ast>],
    pub orelse: &'ast [Stmt<'ast>],
    pub span: Span,
}

/// For loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForStmt<'ast> {
    pub target: Expr<'ast>,
    pub iter: Expr<'ast>,
    pub body: &'ast [Stmt<'ast>],
    pub orelse: &'ast [Stmt<'ast>],
    pub span: Span,
}

/// While loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub test: Expr<'ast>,
    pub body: &'ast [Stmt<'ast>],
    pub orelse: &'ast [Stmt<'ast>],
    pub span: Span,
}

/// A declared parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter<'ast> {
    pub name: Ident<'ast>,
    pub annotation: Option<Expr<'ast>>,
    pub default: Option<Expr<'ast>>,
    pub kind: ParameterKind,
}

/// Function definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDef<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub params: &'ast [Parameter<'ast>],
    pub returns: Option<Expr<'ast>>,
    pub body: &'ast [Stmt<'ast>],
    pub decorators: &'ast [Expr<'ast>],
    pub span: Span,
}

/// Class definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDef<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub bases: &'ast [Expr<'ast>],
    pub body: &'ast [Stmt<'ast>],
    pub decorators: &'ast [Expr<'ast>],
    pub span: Span,
}

/// A parsed module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Module<'ast> {
    pub id: NodeId,
    pub body: &'ast [Stmt<'ast>],
}
