//! Integration tests for pyinfer using `Analyzer` as the entry point.
//!
//! Each test builds a complete module with `AstBuilder` and checks the
//! inferred globals and the diagnostics of one analysis.

use std::rc::Rc;

use bumpalo::Bump;
use pyinfer::ast::{BinaryOp, Stmt};
use pyinfer::{
    AnalysisOptions, Analyzer, AstBuilder, BuiltinTypeId, ClassRef, Constant, DocumentId, Error,
    Member, Module, ModuleAnalysis, ModuleKind, ParameterKind, PyType, Severity,
};

/// Analyze a module with default options.
fn analyze<'ast>(module: &'ast Module<'ast>) -> ModuleAnalysis {
    Analyzer::new().analyze(module).expect("analysis failed")
}

fn value<'a>(analysis: &'a ModuleAnalysis, name: &str) -> &'a Member {
    analysis
        .value(name)
        .unwrap_or_else(|| panic!("no global named '{name}'"))
}

fn class_of(member: &Member) -> ClassRef {
    member
        .py_type()
        .as_class()
        .cloned()
        .expect("member has no class")
}

fn codes(analysis: &ModuleAnalysis) -> Vec<&'static str> {
    analysis.diagnostics().iter().map(|d| d.error_code).collect()
}

/// `T = TypeVar('T')`
fn type_var<'ast>(b: &AstBuilder<'ast>) -> Stmt<'ast> {
    b.assign(b.name("T"), b.call(b.name("TypeVar"), [b.str("T")]))
}

/// A generic container whose `get` is annotated to return its parameter.
fn box_class<'ast>(b: &AstBuilder<'ast>) -> Stmt<'ast> {
    b.class("Box")
        .base(b.index(b.name("Generic"), b.name("T")))
        .body([
            b.def("__init__")
                .param("self")
                .param_typed("value", b.name("T"))
                .body([b.assign(b.attr(b.name("self"), "value"), b.name("value"))]),
            b.def("get")
                .param("self")
                .returns(b.name("T"))
                .body([b.ret(Some(b.attr(b.name("self"), "value")))]),
        ])
}

// =============================================================================
// Collections
// =============================================================================

#[test]
fn test_collection_cap_marks_inexact() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([b.assign(b.name("big"), b.list((0..1500).map(|i| b.int(i))))]);
    let analysis = analyze(module);

    let big = value(&analysis, "big").as_collection().unwrap();
    assert_eq!(big.len(), 1000);
    assert!(!big.is_exact());
}

#[test]
fn test_collection_cap_is_configurable() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.assign(b.name("small"), b.tuple((0..10).map(|i| b.int(i)))),
        b.assign(b.name("capped"), b.tuple((0..11).map(|i| b.int(i)))),
    ]);
    let options = AnalysisOptions::default().with_max_collection_size(10);
    let analysis = Analyzer::with_options(options).analyze(module).unwrap();

    assert!(value(&analysis, "small").as_collection().unwrap().is_exact());
    let capped = value(&analysis, "capped").as_collection().unwrap();
    assert_eq!(capped.len(), 10);
    assert!(!capped.is_exact());
}

#[test]
fn test_bad_index_type_reported_once() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([b.assign(
        b.name("v"),
        b.index(b.list([b.str("a"), b.str("b")]), b.str("x")),
    )]);
    let analysis = analyze(module);

    let bad: Vec<_> = analysis.diagnostics().with_code("bad-index-type").collect();
    assert_eq!(bad.len(), 1);
    assert!(bad[0].message.contains("str"));
    assert_eq!(bad[0].severity, Severity::Error);
    assert_eq!(analysis.diagnostics().len(), 1);
    // zero-index fallback
    assert_eq!(value(&analysis, "v").as_constant(), Some(&Constant::Str("a".into())));
}

#[test]
fn test_indexing_tracks_elements() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.assign(b.name("items"), b.list([b.int(1), b.str("two")])),
        b.assign(b.name("last"), b.index(b.name("items"), b.int(-1))),
        b.assign(b.name("missing"), b.index(b.name("items"), b.int(5))),
        b.assign(b.name("part"), b.index(b.name("items"), b.slice(Some(b.int(0)), None))),
        b.assign(b.name("d"), b.dict([(b.str("k"), b.float(1.5))])),
        b.assign(b.name("hit"), b.index(b.name("d"), b.str("k"))),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "last").py_type().is_builtin(BuiltinTypeId::Str));
    assert!(value(&analysis, "missing").is_unknown());
    assert!(value(&analysis, "part").py_type().is_builtin(BuiltinTypeId::List));
    assert!(value(&analysis, "hit").py_type().is_builtin(BuiltinTypeId::Float));
    assert!(analysis.diagnostics().is_empty());
}

#[test]
fn test_comprehensions_sample_elements() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let doubled = b.list_comp(
        b.binary(b.name("x"), BinaryOp::Mul, b.int(2)),
        [b.for_clause(b.name("x"), b.list([b.int(1), b.int(2)]))],
    );
    let swapped = b.dict_comp(
        b.name("v"),
        b.name("k"),
        [b.for_clause(
            b.tuple([b.name("k"), b.name("v")]),
            b.dict([(b.str("a"), b.int(1))]),
        )],
    );
    let lazy = b.generator(b.name("c"), [b.for_clause(b.name("c"), b.set([b.str("s")]))]);
    let module = b.module([
        b.assign(b.name("doubled"), doubled),
        b.assign(b.name("swapped"), swapped),
        b.assign(b.name("lazy"), lazy),
    ]);
    let analysis = analyze(module);

    let doubled = value(&analysis, "doubled");
    assert!(doubled.py_type().is_builtin(BuiltinTypeId::List));
    let sample = doubled.as_collection().unwrap().first().unwrap();
    assert!(sample.py_type().is_builtin(BuiltinTypeId::Int));

    let swapped = value(&analysis, "swapped").as_mapping().unwrap();
    assert!(swapped.first_key().unwrap().py_type().is_builtin(BuiltinTypeId::Int));
    assert!(swapped.first_value().unwrap().py_type().is_builtin(BuiltinTypeId::Str));

    assert!(value(&analysis, "lazy").py_type().is_builtin(BuiltinTypeId::Set));
    // comprehension targets never leak into the module
    assert!(analysis.global("x").is_none());
    assert!(analysis.diagnostics().is_empty());
}

// =============================================================================
// Generics
// =============================================================================

#[test]
fn test_generic_method_returns_argument_type() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        type_var(&b),
        box_class(&b),
        b.assign(b.name("boxed"), b.call(b.name("Box"), [b.int(1)])),
        b.assign(b.name("x"), b.call(b.attr(b.name("boxed"), "get"), [])),
        b.assign(b.name("y"), b.attr(b.name("boxed"), "value")),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "x").py_type().is_builtin(BuiltinTypeId::Int));
    assert!(value(&analysis, "y").py_type().is_builtin(BuiltinTypeId::Int));
    assert_eq!(class_of(value(&analysis, "boxed")).display_name(), "Box[int]");
    assert!(analysis.diagnostics().is_empty());
}

#[test]
fn test_specializations_are_cached() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        type_var(&b),
        box_class(&b),
        b.assign(b.name("a"), b.call(b.name("Box"), [b.int(1)])),
        b.assign(b.name("b"), b.call(b.name("Box"), [b.int(2)])),
        b.assign(b.name("c"), b.call(b.name("Box"), [b.str("s")])),
        b.assign(b.name("annotated"), b.index(b.name("Box"), b.name("int"))),
    ]);
    let analysis = analyze(module);

    let a = class_of(value(&analysis, "a"));
    let same = class_of(value(&analysis, "b"));
    let other = class_of(value(&analysis, "c"));
    let annotated = class_of(value(&analysis, "annotated"));
    assert!(Rc::ptr_eq(&a, &same));
    assert!(Rc::ptr_eq(&a, &annotated));
    assert!(!Rc::ptr_eq(&a, &other));
    assert_eq!(other.display_name(), "Box[str]");

    let template = class_of(value(&analysis, "Box"));
    assert_eq!(template.specialization_count(), 2);
    assert!(Rc::ptr_eq(&a.template().unwrap(), &template));
}

#[test]
fn test_same_named_nested_classes_specialize_separately() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let inner = |tag| b.class("Inner").body([b.assign(b.name("tag"), tag)]);
    let module = b.module([
        type_var(&b),
        box_class(&b),
        b.class("A").body([inner(b.int(1))]),
        b.class("B").body([inner(b.str("s"))]),
        b.assign(b.name("x"), b.call(b.name("Box"), [b.call(b.attr(b.name("A"), "Inner"), [])])),
        b.assign(b.name("y"), b.call(b.name("Box"), [b.call(b.attr(b.name("B"), "Inner"), [])])),
        b.assign(b.name("xt"), b.attr(b.call(b.attr(b.name("x"), "get"), []), "tag")),
        b.assign(b.name("yt"), b.attr(b.call(b.attr(b.name("y"), "get"), []), "tag")),
    ]);
    let analysis = analyze(module);

    let x = class_of(value(&analysis, "x"));
    let y = class_of(value(&analysis, "y"));
    assert!(!Rc::ptr_eq(&x, &y));
    assert_ne!(x.type_hash(), y.type_hash());
    assert!(value(&analysis, "xt").py_type().is_builtin(BuiltinTypeId::Int));
    assert!(value(&analysis, "yt").py_type().is_builtin(BuiltinTypeId::Str));

    let a_inner = class_of(value(&analysis, "A")).own_member("Inner").unwrap();
    assert_eq!(class_of(&a_inner).qualified_name(), "__main__.A.Inner");
}

#[test]
fn test_function_local_classes_have_distinct_identities() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let local = |function, tag| {
        b.def(function).body([
            b.class("Local").body([b.assign(b.name("tag"), tag)]),
            b.ret(Some(b.call(b.name("Local"), []))),
        ])
    };
    let module = b.module([
        type_var(&b),
        box_class(&b),
        local("f", b.int(1)),
        local("g", b.str("s")),
        b.assign(b.name("x"), b.call(b.name("Box"), [b.call(b.name("f"), [])])),
        b.assign(b.name("y"), b.call(b.name("Box"), [b.call(b.name("g"), [])])),
        b.assign(b.name("yt"), b.attr(b.call(b.attr(b.name("y"), "get"), []), "tag")),
    ]);
    let analysis = analyze(module);

    let f_local = class_of(value(&analysis, "x")).generic_params();
    let f_local = f_local.iter().next().unwrap().1.as_class().unwrap().clone();
    assert_eq!(f_local.qualified_name(), "__main__.f.<locals>.Local");
    assert!(!Rc::ptr_eq(&class_of(value(&analysis, "x")), &class_of(value(&analysis, "y"))));
    assert!(value(&analysis, "yt").py_type().is_builtin(BuiltinTypeId::Str));
}

#[test]
fn test_self_referential_generic_terminates() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let node = b
        .class("Node")
        .base(b.index(b.name("Generic"), b.name("T")))
        .body([
            b.def("__init__")
                .param("self")
                .param_typed("value", b.name("T"))
                .body([b.assign(b.attr(b.name("self"), "value"), b.name("value"))]),
            b.def("child")
                .param("self")
                .returns(b.index(b.name("Node"), b.name("T")))
                .body([b.ret(Some(b.call(
                    b.name("Node"),
                    [b.attr(b.name("self"), "value")],
                )))]),
        ]);
    let module = b.module([
        type_var(&b),
        node,
        b.assign(b.name("n"), b.call(b.name("Node"), [b.int(1)])),
        b.assign(b.name("c"), b.call(b.attr(b.name("n"), "child"), [])),
        b.assign(
            b.name("cc"),
            b.call(b.attr(b.call(b.attr(b.name("n"), "child"), []), "child"), []),
        ),
    ]);
    let analysis = analyze(module);

    let n = class_of(value(&analysis, "n"));
    let c = class_of(value(&analysis, "c"));
    assert_eq!(c.display_name(), "Node[int]");
    assert!(Rc::ptr_eq(&n, &c));
    assert!(Rc::ptr_eq(&n, &class_of(value(&analysis, "cc"))));
}

#[test]
fn test_generic_collection_annotations() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.def("names")
            .returns(b.index(b.name("List"), b.name("str")))
            .body([b.pass()]),
        b.assign(b.name("first"), b.index(b.call(b.name("names"), []), b.int(0))),
        b.for_(b.name("each"), b.call(b.name("names"), []), [b.pass()]),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "first").py_type().is_builtin(BuiltinTypeId::Str));
    assert!(value(&analysis, "each").py_type().is_builtin(BuiltinTypeId::Str));
}

// =============================================================================
// Scopes
// =============================================================================

#[test]
fn test_class_locals_hidden_from_methods() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let class = b.class("C").body([
        b.assign(b.name("x"), b.int(1)),
        b.def("m").param("self").body([b.ret(Some(b.name("x")))]),
        b.def("k").param("self").body([b.ret(Some(b.name("__class__")))]),
    ]);
    let module = b.module([
        class,
        b.assign(b.name("through_class"), b.attr(b.name("C"), "x")),
        b.assign(b.name("through_instance"), b.attr(b.call(b.name("C"), []), "x")),
        b.assign(b.name("free"), b.call(b.attr(b.call(b.name("C"), []), "m"), [])),
        b.assign(b.name("cell"), b.call(b.attr(b.call(b.name("C"), []), "k"), [])),
    ]);
    let analysis = analyze(module);

    assert_eq!(value(&analysis, "through_class").as_constant(), Some(&Constant::Int(1)));
    assert_eq!(value(&analysis, "through_instance").as_constant(), Some(&Constant::Int(1)));
    assert!(value(&analysis, "free").is_unknown());
    let cell = value(&analysis, "cell");
    assert!(cell.is_type());
    assert_eq!(class_of(cell).name(), "C");
    assert_eq!(codes(&analysis), ["undefined-variable"]);
}

#[test]
fn test_global_declaration_binds_module_variable() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.def("setup").body([
            b.global(&["counter"]),
            b.assign(b.name("counter"), b.int(0)),
        ]),
        b.expr_stmt(b.call(b.name("setup"), [])),
    ]);
    let analysis = analyze(module);

    let counter = analysis.global("counter").unwrap();
    assert_eq!(counter.kind, pyinfer::VariableKind::Global);
    assert!(counter.value.py_type().is_builtin(BuiltinTypeId::Int));
}

#[test]
fn test_nonlocal_and_closures() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let outer = b.def("outer").body([
        b.assign(b.name("v"), b.int(1)),
        b.def("rebind").body([
            b.nonlocal(&["v"]),
            b.assign(b.name("v"), b.str("s")),
        ]),
        b.expr_stmt(b.call(b.name("rebind"), [])),
        b.ret(Some(b.name("v"))),
    ]);
    let reader = b.def("reader").body([
        b.assign(b.name("w"), b.float(1.0)),
        b.def("read").body([b.ret(Some(b.name("w")))]),
        b.ret(Some(b.call(b.name("read"), []))),
    ]);
    let module = b.module([
        outer,
        reader,
        b.assign(b.name("r"), b.call(b.name("outer"), [])),
        b.assign(b.name("f"), b.call(b.name("reader"), [])),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "r").py_type().is_builtin(BuiltinTypeId::Str));
    assert!(value(&analysis, "f").py_type().is_builtin(BuiltinTypeId::Float));
    assert!(analysis.diagnostics().is_empty());
}

#[test]
fn test_undefined_names_are_warnings() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.assign(b.name("a"), b.name("nowhere")),
        b.assign(b.name("b"), b.name("len")),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "a").is_unknown());
    assert!(value(&analysis, "b").is_type());
    let entries: Vec<_> = analysis.diagnostics().iter().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].error_code, "undefined-variable");
    assert_eq!(entries[0].severity, Severity::Warning);
    assert!(entries[0].message.contains("nowhere"));
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_return_values_are_united() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.def("pick").param("flag").body([
            b.if_(b.name("flag"), [b.ret(Some(b.int(1)))], []),
            b.ret(Some(b.str("one"))),
        ]),
        b.assign(b.name("r"), b.call(b.name("pick"), [b.bool(true)])),
    ]);
    let analysis = analyze(module);

    let items = value(&analysis, "r").as_union().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0].py_type().is_builtin(BuiltinTypeId::Int));
    assert!(items[1].py_type().is_builtin(BuiltinTypeId::Str));
}

#[test]
fn test_generator_returns_iterator() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.def("gen").body([b.expr_stmt(b.yield_(Some(b.int(1))))]),
        b.assign(b.name("it"), b.call(b.name("gen"), [])),
        b.for_(b.name("v"), b.call(b.name("gen"), []), [b.pass()]),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "it").py_type().is_builtin(BuiltinTypeId::Iterator));
    assert!(value(&analysis, "v").py_type().is_builtin(BuiltinTypeId::Int));
}

#[test]
fn test_recursive_function_terminates() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.def("fact").param("n").body([
            b.if_(b.name("n"), [b.ret(Some(b.int(1)))], []),
            b.ret(Some(b.call(b.name("fact"), [b.name("n")]))),
        ]),
        b.assign(b.name("r"), b.call(b.name("fact"), [b.int(3)])),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "r").py_type().is_builtin(BuiltinTypeId::Int));
}

#[test]
fn test_calling_convention_diagnostics() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let class = b.class("C").body([
        b.def("m").param("this").body([b.pass()]),
        b.def("k").decorator(b.name("classmethod")).param("self").body([b.pass()]),
        b.def("n").body([b.pass()]),
        b.def("s").decorator(b.name("staticmethod")).body([b.pass()]),
        b.def("u").decorator(b.name("unknown")).param("x").body([b.pass()]),
        b.def("star").param_kind("args", ParameterKind::VarPositional).body([b.pass()]),
        b.def("ok").param("self").body([b.pass()]),
    ]);
    let analysis = analyze(b.module([class]));

    assert_eq!(
        codes(&analysis),
        ["no-self-argument", "no-cls-argument", "no-method-argument"]
    );
}

#[test]
fn test_metaclass_methods_skip_receiver_checks() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let meta = b
        .class("Meta")
        .base(b.name("type"))
        .body([b.def("make").param("mcs").body([b.pass()])]);
    let analysis = analyze(b.module([meta]));

    assert!(analysis.diagnostics().is_empty());
}

#[test]
fn test_return_in_init() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let bad = b.class("Bad").body([b
        .def("__init__")
        .param("self")
        .body([b.ret(Some(b.int(1)))])]);
    let fine = b.class("Fine").body([b
        .def("__init__")
        .param("self")
        .body([b.ret(Some(b.none())), b.ret(None)])]);
    let analysis = analyze(b.module([bad, fine]));

    assert_eq!(codes(&analysis), ["return-in-init"]);
}

#[test]
fn test_return_in_init_checks_the_returned_value() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.def("helper").body([b.pass()]),
        b.class("C").body([b
            .def("__init__")
            .param("self")
            .body([b.ret(Some(b.call(b.name("helper"), [])))])]),
        b.class("D").body([b.def("__init__").param("self").body([
            b.assign(b.name("nothing"), b.none()),
            b.ret(Some(b.name("nothing"))),
        ])]),
        b.assign(b.name("c"), b.call(b.name("C"), [])),
        b.assign(b.name("d"), b.call(b.name("D"), [])),
    ]);
    let analysis = analyze(module);

    assert!(analysis.diagnostics().is_empty(), "{:?}", codes(&analysis));
}

// =============================================================================
// Classes
// =============================================================================

#[test]
fn test_receiver_assignments_become_members() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let class = b.class("Point").body([b
        .def("__init__")
        .param("self")
        .body([
            b.assign(b.attr(b.name("self"), "x"), b.float(0.0)),
            b.assign(b.attr(b.name("self"), "label"), b.str("origin")),
            b.assign(b.name("self"), b.none()),
        ])]);
    let module = b.module([
        class,
        b.assign(b.name("p"), b.call(b.name("Point"), [])),
        b.assign(b.name("x"), b.attr(b.name("p"), "x")),
        b.assign(b.name("label"), b.attr(b.name("p"), "label")),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "x").py_type().is_builtin(BuiltinTypeId::Float));
    assert!(value(&analysis, "label").py_type().is_builtin(BuiltinTypeId::Str));
    assert!(class_of(value(&analysis, "p")).own_member("x").is_some());
}

#[test]
fn test_properties_evaluate_to_return_value() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let class = b.class("Sized").body([b
        .def("size")
        .decorator(b.name("property"))
        .param("self")
        .returns(b.name("int"))
        .body([b.ret(Some(b.int(3)))])]);
    let module = b.module([
        class,
        b.assign(b.name("n"), b.attr(b.call(b.name("Sized"), []), "size")),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "n").py_type().is_builtin(BuiltinTypeId::Int));
    assert!(value(&analysis, "n").is_instance());
}

#[test]
fn test_inherited_members_follow_mro() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.class("Base").body([b.def("name").param("self").body([b.ret(Some(b.str("b")))])]),
        b.class("Derived").base(b.name("Base")).body([b.pass()]),
        b.assign(b.name("n"), b.call(b.attr(b.call(b.name("Derived"), []), "name"), [])),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "n").py_type().is_builtin(BuiltinTypeId::Str));
    let derived = class_of(value(&analysis, "Derived"));
    let mro: Vec<String> = derived.mro().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(mro, ["Base", "object"]);
}

#[test]
fn test_qualified_names_use_module_name() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([b.class("C").body([b.pass()])]);
    let options = AnalysisOptions::default().with_module_name("pkg.mod");
    let analysis = Analyzer::with_options(options).analyze(module).unwrap();

    assert_eq!(class_of(value(&analysis, "C")).qualified_name(), "pkg.mod.C");
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn test_binary_operators() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.assign(b.name("promoted"), b.binary(b.int(1), BinaryOp::Add, b.float(2.0))),
        b.assign(b.name("joined"), b.binary(b.str("a"), BinaryOp::Add, b.str("b"))),
        b.assign(b.name("repeated"), b.binary(b.list([b.int(1)]), BinaryOp::Mul, b.int(3))),
        b.assign(b.name("broken"), b.binary(b.str("a"), BinaryOp::Add, b.int(1))),
    ]);
    let analysis = analyze(module);

    assert!(value(&analysis, "promoted").py_type().is_builtin(BuiltinTypeId::Float));
    assert!(value(&analysis, "joined").py_type().is_builtin(BuiltinTypeId::Str));
    assert!(value(&analysis, "repeated").py_type().is_builtin(BuiltinTypeId::List));
    assert_eq!(codes(&analysis), ["unsupported-operand-type"]);
}

// =============================================================================
// Analyzer
// =============================================================================

#[test]
fn test_registered_builtins_resolve() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let mut analyzer = Analyzer::new();
    let version = analyzer.registry().instance(BuiltinTypeId::Str);
    analyzer.register_builtin("VERSION", version).unwrap();

    let analysis = analyzer.analyze(b.module([b.assign(b.name("v"), b.name("VERSION"))])).unwrap();
    assert!(value(&analysis, "v").py_type().is_builtin(BuiltinTypeId::Str));
    assert!(analysis.diagnostics().is_empty());
}

#[test]
fn test_duplicate_builtin_is_rejected() {
    let mut analyzer = Analyzer::new();
    let result = analyzer.register_builtin("int", Member::Unknown);
    assert!(matches!(result, Err(Error::Registration(_))));
}

#[test]
fn test_diagnostics_attach_to_document() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let document = DocumentId::new("file:///main.py");
    let options = AnalysisOptions::default().with_document(document.clone());
    let analysis = Analyzer::with_options(options)
        .analyze(b.module([b.expr_stmt(b.name("missing"))]))
        .unwrap();

    assert_eq!(analysis.diagnostics().for_document(&document).count(), 1);
    assert_eq!(
        analysis
            .diagnostics()
            .for_document(&DocumentId::new("file:///other.py"))
            .count(),
        0
    );
}

#[test]
fn test_library_modules_trust_declared_returns() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.def("declared")
            .returns(b.name("int"))
            .body([b.ret(Some(b.str("ignored")))]),
        b.assign(b.name("r"), b.call(b.name("declared"), [])),
    ]);
    let options = AnalysisOptions::default().with_module_kind(ModuleKind::Library);
    let analysis = Analyzer::with_options(options).analyze(module).unwrap();

    let r = value(&analysis, "r");
    assert!(r.py_type().is_builtin(BuiltinTypeId::Int));
    assert!(r.as_union().is_none());
}

#[test]
fn test_type_annotations_denote_types() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let module = b.module([
        b.def("kind")
            .returns(b.index(b.name("Type"), b.name("int")))
            .body([b.ret(Some(b.name("int")))]),
        b.assign(b.name("k"), b.call(b.name("kind"), [])),
    ]);
    let analysis = analyze(module);

    let k = value(&analysis, "k");
    assert!(k.is_type());
    assert!(matches!(k.py_type(), PyType::Class(c) if c.builtin_id() == Some(BuiltinTypeId::Int)));
}
