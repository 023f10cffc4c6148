//! Arena-backed AST construction.
//!
//! [`AstBuilder`] is the entry point for producers of the AST: the external
//! parser adapter and tests. Every node lives in the caller's [`Bump`] arena
//! and every scope-opening node gets a fresh [`NodeId`].
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use pyinfer_ast::AstBuilder;
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let module = b.module([
//!     b.assign(b.name("x"), b.list([b.int(1), b.int(2)])),
//! ]);
//! assert_eq!(module.body.len(), 1);
//! ```

use std::cell::Cell;

use bumpalo::Bump;
use pyinfer_core::{NodeId, ParameterKind, Span};

use crate::expr::*;
use crate::ops::{BinaryOp, UnaryOp};
use crate::stmt::*;

/// Builds AST nodes in an arena.
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    next_id: Cell<u32>,
    line: Cell<u32>,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            next_id: Cell::new(NodeId::MODULE.0 + 1),
            line: Cell::new(1),
        }
    }

    /// Set the line used for the spans of subsequently built nodes.
    pub fn at_line(&self, line: u32) -> &Self {
        self.line.set(line);
        self
    }

    pub fn arena(&self) -> &'ast Bump {
        self.arena
    }

    fn span(&self) -> Span {
        Span::on_line(self.line.get(), 1, 2)
    }

    fn next_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn ident(&self, name: &str) -> Ident<'ast> {
        Ident {
            name: self.arena.alloc_str(name),
            span: self.span(),
        }
    }

    fn exprs(&self, items: impl IntoIterator<Item = Expr<'ast>>) -> &'ast [Expr<'ast>] {
        let items: Vec<Expr<'ast>> = items.into_iter().collect();
        self.arena.alloc_slice_copy(&items)
    }

    fn stmts(&self, items: impl IntoIterator<Item = Stmt<'ast>>) -> &'ast [Stmt<'ast>] {
        let items: Vec<Stmt<'ast>> = items.into_iter().collect();
        self.arena.alloc_slice_copy(&items)
    }

    // === Constants ===

    fn constant(&self, kind: ConstantKind<'ast>) -> Expr<'ast> {
        Expr::Constant(ConstantExpr {
            kind,
            span: self.span(),
        })
    }

    pub fn int(&self, value: i64) -> Expr<'ast> {
        self.constant(ConstantKind::Int(value))
    }

    pub fn float(&self, value: f64) -> Expr<'ast> {
        self.constant(ConstantKind::Float(value))
    }

    pub fn str(&self, value: &str) -> Expr<'ast> {
        self.constant(ConstantKind::Str(self.arena.alloc_str(value)))
    }

    pub fn bytes(&self, value: &[u8]) -> Expr<'ast> {
        self.constant(ConstantKind::Bytes(self.arena.alloc_slice_copy(value)))
    }

    pub fn bool(&self, value: bool) -> Expr<'ast> {
        self.constant(ConstantKind::Bool(value))
    }

    pub fn none(&self) -> Expr<'ast> {
        self.constant(ConstantKind::None)
    }

    pub fn ellipsis(&self) -> Expr<'ast> {
        self.constant(ConstantKind::Ellipsis)
    }

    // === Names, members, calls ===

    pub fn name(&self, name: &str) -> Expr<'ast> {
        Expr::Name(self.ident(name))
    }

    pub fn attr(&self, target: Expr<'ast>, name: &str) -> Expr<'ast> {
        Expr::Member(self.arena.alloc(MemberExpr {
            target,
            name: self.ident(name),
            span: self.span(),
        }))
    }

    pub fn index(&self, target: Expr<'ast>, index: Expr<'ast>) -> Expr<'ast> {
        Expr::Index(self.arena.alloc(IndexExpr {
            target,
            index,
            span: self.span(),
        }))
    }

    pub fn slice(&self, lower: Option<Expr<'ast>>, upper: Option<Expr<'ast>>) -> Expr<'ast> {
        Expr::Slice(self.arena.alloc(SliceExpr {
            lower,
            upper,
            step: None,
            span: self.span(),
        }))
    }

    pub fn call(&self, callee: Expr<'ast>, args: impl IntoIterator<Item = Expr<'ast>>) -> Expr<'ast> {
        let args: Vec<Argument<'ast>> = args
            .into_iter()
            .map(|value| Argument {
                name: None,
                value,
                kind: ArgumentKind::Positional,
                span: value.span(),
            })
            .collect();
        self.call_with(callee, args)
    }

    /// Call with keyword arguments after the positional ones.
    pub fn call_kw<'n>(
        &self,
        callee: Expr<'ast>,
        args: impl IntoIterator<Item = Expr<'ast>>,
        kwargs: impl IntoIterator<Item = (&'n str, Expr<'ast>)>,
    ) -> Expr<'ast> {
        let mut all: Vec<Argument<'ast>> = args
            .into_iter()
            .map(|value| Argument {
                name: None,
                value,
                kind: ArgumentKind::Positional,
                span: value.span(),
            })
            .collect();
        all.extend(kwargs.into_iter().map(|(name, value)| Argument {
            name: Some(self.ident(name)),
            value,
            kind: ArgumentKind::Positional,
            span: value.span(),
        }));
        self.call_with(callee, all)
    }

    pub fn call_with(&self, callee: Expr<'ast>, args: Vec<Argument<'ast>>) -> Expr<'ast> {
        Expr::Call(self.arena.alloc(CallExpr {
            callee,
            args: self.arena.alloc_slice_copy(&args),
            span: self.span(),
        }))
    }

    // === Collections ===

    fn sequence(&self, items: impl IntoIterator<Item = Expr<'ast>>) -> SequenceExpr<'ast> {
        SequenceExpr {
            items: self.exprs(items),
            span: self.span(),
        }
    }

    pub fn list(&self, items: impl IntoIterator<Item = Expr<'ast>>) -> Expr<'ast> {
        Expr::List(self.sequence(items))
    }

    pub fn tuple(&self, items: impl IntoIterator<Item = Expr<'ast>>) -> Expr<'ast> {
        Expr::Tuple(self.sequence(items))
    }

    pub fn set(&self, items: impl IntoIterator<Item = Expr<'ast>>) -> Expr<'ast> {
        Expr::Set(self.sequence(items))
    }

    pub fn dict(&self, entries: impl IntoIterator<Item = (Expr<'ast>, Expr<'ast>)>) -> Expr<'ast> {
        let entries: Vec<DictEntry<'ast>> = entries
            .into_iter()
            .map(|(key, value)| DictEntry { key, value })
            .collect();
        Expr::Dict(DictExpr {
            entries: self.arena.alloc_slice_copy(&entries),
            span: self.span(),
        })
    }

    // === Comprehensions ===

    pub fn for_clause(&self, target: Expr<'ast>, iter: Expr<'ast>) -> ComprehensionClause<'ast> {
        ComprehensionClause::For {
            target,
            iter,
            span: self.span(),
        }
    }

    pub fn if_clause(&self, test: Expr<'ast>) -> ComprehensionClause<'ast> {
        ComprehensionClause::If {
            test,
            span: self.span(),
        }
    }

    fn comprehension(
        &self,
        kind: ComprehensionKind,
        element: Expr<'ast>,
        value: Option<Expr<'ast>>,
        clauses: impl IntoIterator<Item = ComprehensionClause<'ast>>,
    ) -> Expr<'ast> {
        let clauses: Vec<ComprehensionClause<'ast>> = clauses.into_iter().collect();
        Expr::Comprehension(self.arena.alloc(ComprehensionExpr {
            id: self.next_id(),
            kind,
            element,
            value,
            clauses: self.arena.alloc_slice_copy(&clauses),
            span: self.span(),
        }))
    }

    pub fn list_comp(
        &self,
        element: Expr<'ast>,
        clauses: impl IntoIterator<Item = ComprehensionClause<'ast>>,
    ) -> Expr<'ast> {
        self.comprehension(ComprehensionKind::List, element, None, clauses)
    }

    pub fn set_comp(
        &self,
        element: Expr<'ast>,
        clauses: impl IntoIterator<Item = ComprehensionClause<'ast>>,
    ) -> Expr<'ast> {
        self.comprehension(ComprehensionKind::Set, element, None, clauses)
    }

    pub fn dict_comp(
        &self,
        key: Expr<'ast>,
        value: Expr<'ast>,
        clauses: impl IntoIterator<Item = ComprehensionClause<'ast>>,
    ) -> Expr<'ast> {
        self.comprehension(ComprehensionKind::Dict, key, Some(value), clauses)
    }

    pub fn generator(
        &self,
        element: Expr<'ast>,
        clauses: impl IntoIterator<Item = ComprehensionClause<'ast>>,
    ) -> Expr<'ast> {
        self.comprehension(ComprehensionKind::Generator, element, None, clauses)
    }

    // === Operators ===

    pub fn binary(&self, left: Expr<'ast>, op: BinaryOp, right: Expr<'ast>) -> Expr<'ast> {
        Expr::Binary(self.arena.alloc(BinaryExpr {
            left,
            op,
            right,
            span: self.span(),
        }))
    }

    pub fn unary(&self, op: UnaryOp, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Unary(self.arena.alloc(UnaryExpr {
            op,
            operand,
            span: self.span(),
        }))
    }

    pub fn yield_(&self, value: Option<Expr<'ast>>) -> Expr<'ast> {
        Expr::Yield(YieldExpr {
            value: value.map(|v| &*self.arena.alloc(v)),
            span: self.span(),
        })
    }

    // === Statements ===

    pub fn expr_stmt(&self, expr: Expr<'ast>) -> Stmt<'ast> {
        Stmt::Expr(ExprStmt {
            expr,
            span: self.span(),
        })
    }

    pub fn assign(&self, target: Expr<'ast>, value: Expr<'ast>) -> Stmt<'ast> {
        self.assign_many([target], value)
    }

    pub fn assign_many(
        &self,
        targets: impl IntoIterator<Item = Expr<'ast>>,
        value: Expr<'ast>,
    ) -> Stmt<'ast> {
        Stmt::Assign(self.arena.alloc(AssignStmt {
            targets: self.exprs(targets),
            value,
            span: self.span(),
        }))
    }

    pub fn ann_assign(
        &self,
        target: Expr<'ast>,
        annotation: Expr<'ast>,
        value: Option<Expr<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::AnnAssign(self.arena.alloc(AnnAssignStmt {
            target,
            annotation,
            value,
            span: self.span(),
        }))
    }

    pub fn ret(&self, value: Option<Expr<'ast>>) -> Stmt<'ast> {
        Stmt::Return(ReturnStmt {
            value: value.map(|v| &*self.arena.alloc(v)),
            span: self.span(),
        })
    }

    fn names(&self, names: &[&str]) -> NamesStmt<'ast> {
        let idents: Vec<Ident<'ast>> = names.iter().map(|n| self.ident(n)).collect();
        NamesStmt {
            names: self.arena.alloc_slice_copy(&idents),
            span: self.span(),
        }
    }

    pub fn global(&self, names: &[&str]) -> Stmt<'ast> {
        Stmt::Global(self.names(names))
    }

    pub fn nonlocal(&self, names: &[&str]) -> Stmt<'ast> {
        Stmt::Nonlocal(self.names(names))
    }

    pub fn if_(
        &self,
        test: Expr<'ast>,
        body: impl IntoIterator<Item = Stmt<'ast>>,
        orelse: impl IntoIterator<Item = Stmt<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::If(self.arena.alloc(IfStmt {
            test,
            body: self.stmts(body),
            orelse: self.stmts(orelse),
            span: self.span(),
        }))
    }

    pub fn for_(
        &self,
        target: Expr<'ast>,
        iter: Expr<'ast>,
        body: impl IntoIterator<Item = Stmt<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::For(self.arena.alloc(ForStmt {
            target,
            iter,
            body: self.stmts(body),
            orelse: &[],
            span: self.span(),
        }))
    }

    pub fn while_(&self, test: Expr<'ast>, body: impl IntoIterator<Item = Stmt<'ast>>) -> Stmt<'ast> {
        Stmt::While(self.arena.alloc(WhileStmt {
            test,
            body: self.stmts(body),
            orelse: &[],
            span: self.span(),
        }))
    }

    pub fn pass(&self) -> Stmt<'ast> {
        Stmt::Pass(self.span())
    }

    // === Definitions ===

    /// Start a function definition.
    pub fn def<'b>(&'b self, name: &str) -> FunctionDefBuilder<'b, 'ast> {
        FunctionDefBuilder {
            builder: self,
            id: self.next_id(),
            name: self.ident(name),
            params: Vec::new(),
            returns: None,
            decorators: Vec::new(),
            span: self.span(),
        }
    }

    /// Start a class definition.
    pub fn class<'b>(&'b self, name: &str) -> ClassDefBuilder<'b, 'ast> {
        ClassDefBuilder {
            builder: self,
            id: self.next_id(),
            name: self.ident(name),
            bases: Vec::new(),
            decorators: Vec::new(),
            span: self.span(),
        }
    }

    pub fn module(&self, body: impl IntoIterator<Item = Stmt<'ast>>) -> &'ast Module<'ast> {
        self.arena.alloc(Module {
            id: NodeId::MODULE,
            body: self.stmts(body),
        })
    }
}

/// Builder for [`FunctionDef`]; finished by [`body`](Self::body).
pub struct FunctionDefBuilder<'b, 'ast> {
    builder: &'b AstBuilder<'ast>,
    id: NodeId,
    name: Ident<'ast>,
    params: Vec<Parameter<'ast>>,
    returns: Option<Expr<'ast>>,
    decorators: Vec<Expr<'ast>>,
    span: Span,
}

impl<'b, 'ast> FunctionDefBuilder<'b, 'ast> {
    fn push_param(
        mut self,
        name: &str,
        annotation: Option<Expr<'ast>>,
        default: Option<Expr<'ast>>,
        kind: ParameterKind,
    ) -> Self {
        self.params.push(Parameter {
            name: self.builder.ident(name),
            annotation,
            default,
            kind,
        });
        self
    }

    pub fn param(self, name: &str) -> Self {
        self.push_param(name, None, None, ParameterKind::Normal)
    }

    pub fn param_typed(self, name: &str, annotation: Expr<'ast>) -> Self {
        self.push_param(name, Some(annotation), None, ParameterKind::Normal)
    }

    pub fn param_default(self, name: &str, default: Expr<'ast>) -> Self {
        self.push_param(name, None, Some(default), ParameterKind::Normal)
    }

    pub fn param_kind(self, name: &str, kind: ParameterKind) -> Self {
        self.push_param(name, None, None, kind)
    }

    pub fn returns(mut self, annotation: Expr<'ast>) -> Self {
        self.returns = Some(annotation);
        self
    }

    pub fn decorator(mut self, decorator: Expr<'ast>) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Finish the definition with its body.
    pub fn body(self, body: impl IntoIterator<Item = Stmt<'ast>>) -> Stmt<'ast> {
        let arena = self.builder.arena;
        Stmt::FunctionDef(arena.alloc(FunctionDef {
            id: self.id,
            name: self.name,
            params: arena.alloc_slice_copy(&self.params),
            returns: self.returns,
            body: self.builder.stmts(body),
            decorators: arena.alloc_slice_copy(&self.decorators),
            span: self.span,
        }))
    }
}

/// Builder for [`ClassDef`]; finished by [`body`](Self::body).
pub struct ClassDefBuilder<'b, 'ast> {
    builder: &'b AstBuilder<'ast>,
    id: NodeId,
    name: Ident<'ast>,
    bases: Vec<Expr<'ast>>,
    decorators: Vec<Expr<'ast>>,
    span: Span,
}

impl<'b, 'ast> ClassDefBuilder<'b, 'ast> {
    pub fn base(mut self, base: Expr<'ast>) -> Self {
        self.bases.push(base);
        self
    }

    pub fn decorator(mut self, decorator: Expr<'ast>) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Finish the definition with its body.
    pub fn body(self, body: impl IntoIterator<Item = Stmt<'ast>>) -> Stmt<'ast> {
        let arena = self.builder.arena;
        Stmt::ClassDef(arena.alloc(ClassDef {
            id: self.id,
            name: self.name,
            bases: arena.alloc_slice_copy(&self.bases),
            body: self.builder.stmts(body),
            decorators: arena.alloc_slice_copy(&self.decorators),
            span: self.span,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_nodes_get_distinct_ids() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let f = b.def("f").body([b.pass()]);
        let c = b.class("C").body([b.pass()]);
        let (Stmt::FunctionDef(f), Stmt::ClassDef(c)) = (f, c) else {
            panic!("unexpected statements");
        };
        assert_ne!(f.id, c.id);
        assert_ne!(f.id, NodeId::MODULE);
    }

    #[test]
    fn spans_follow_current_line() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        b.at_line(7);
        assert_eq!(b.name("x").span().start.line, 7);
    }

    #[test]
    fn function_builder_collects_parts() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let stmt = b
            .def("get")
            .param("self")
            .param_typed("value", b.name("int"))
            .returns(b.name("int"))
            .decorator(b.name("staticmethod"))
            .body([b.ret(Some(b.name("value")))]);
        let Stmt::FunctionDef(def) = stmt else {
            panic!("expected a function definition");
        };
        assert_eq!(def.name.name, "get");
        assert_eq!(def.params.len(), 2);
        assert!(def.params[1].annotation.is_some());
        assert_eq!(def.decorators.len(), 1);
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn comprehension_first_for() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let e = b.generator(
            b.name("x"),
            [b.if_clause(b.bool(true)), b.for_clause(b.name("x"), b.name("xs"))],
        );
        let Expr::Comprehension(c) = e else {
            panic!("expected a comprehension");
        };
        let (target, iter) = c.first_for().unwrap();
        assert_eq!(target.as_name(), Some("x"));
        assert_eq!(iter.as_name(), Some("xs"));
    }
}
