//! Population of the builtin and typing names.

use std::rc::Rc;

use pyinfer_core::{
    BuiltinTypeId, ClassFlags, ClassRef, ClassType, FunctionFlags, FunctionRef, FunctionType,
    GenericParam, GenericParamRef, Instance, Member, Overload, ParameterInfo, PyType,
};

use crate::TypeRegistry;

/// Decorators recognized by name; they resolve like any other builtin function.
const DECORATORS: &[&str] = &[
    "staticmethod",
    "classmethod",
    "property",
    "abstractmethod",
    "abstractstaticmethod",
    "abstractclassmethod",
    "abstractproperty",
    "overload",
];

fn param(name: &str) -> GenericParamRef {
    Rc::new(GenericParam::new(name))
}

fn params(names: &[&str]) -> Vec<ParameterInfo> {
    names.iter().map(|n| ParameterInfo::new(*n)).collect()
}

fn instance_of_param(p: &GenericParamRef) -> Member {
    Member::instance_of(PyType::Param(p.clone()))
}

/// A builtin method with a fixed signature.
fn add_method(class: &ClassRef, name: &str, parameters: Vec<ParameterInfo>, returns: Member) {
    let function = Rc::new(
        FunctionType::new(name, format!("{}.{name}", class.qualified_name()))
            .with_declaring_class(class)
            .with_flags(FunctionFlags::BUILTIN),
    );
    function.add_overload(Overload::new(name, None).with_signature(parameters, returns));
    class.add_member(name, Member::Type(PyType::Function(function)), true);
}

/// A builtin module-level function with a fixed signature.
fn function(qualified_name: &str, parameters: Vec<ParameterInfo>, returns: Member) -> FunctionRef {
    let name = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
    let function = Rc::new(FunctionType::new(name, qualified_name).with_flags(FunctionFlags::BUILTIN));
    function.add_overload(Overload::new(name, None).with_signature(parameters, returns));
    function
}

impl TypeRegistry {
    pub(crate) fn register_builtins(&mut self) {
        let t = param("_T");
        let kt = param("_KT");
        let vt = param("_VT");

        for id in BuiltinTypeId::ALL {
            let class = ClassType::builtin(id);
            let class = match id {
                BuiltinTypeId::Type => class.with_flags(ClassFlags::METACLASS),
                BuiltinTypeId::List
                | BuiltinTypeId::Tuple
                | BuiltinTypeId::Set
                | BuiltinTypeId::Iterator
                | BuiltinTypeId::Generator => class.with_params(&[t.clone()]),
                BuiltinTypeId::Dict => class.with_params(&[kt.clone(), vt.clone()]),
                _ => class,
            };
            self.builtins.push(Rc::new(class));
        }

        let object = self.builtin(BuiltinTypeId::Object);
        for id in BuiltinTypeId::ALL {
            let base = match id {
                BuiltinTypeId::Object => continue,
                BuiltinTypeId::Bool => self.builtin(BuiltinTypeId::Int),
                _ => object.clone(),
            };
            self.builtin_class(id).set_bases(vec![base]);
        }

        for id in [
            BuiltinTypeId::Object,
            BuiltinTypeId::Type,
            BuiltinTypeId::Bool,
            BuiltinTypeId::Int,
            BuiltinTypeId::Float,
            BuiltinTypeId::Complex,
            BuiltinTypeId::Str,
            BuiltinTypeId::Bytes,
            BuiltinTypeId::List,
            BuiltinTypeId::Tuple,
            BuiltinTypeId::Set,
            BuiltinTypeId::Dict,
        ] {
            let class = self.builtin_class(id);
            self.register_class(id.name(), &class);
        }

        self.register_methods(&t, &vt);
        self.register_typing(&t, &kt, &vt);
        self.register_functions();
    }

    fn register_methods(&mut self, t: &GenericParamRef, vt: &GenericParamRef) {
        let none = self.none();
        let str_instance = self.instance(BuiltinTypeId::Str);

        let list = self.builtin_class(BuiltinTypeId::List);
        add_method(&list, "__getitem__", params(&["self", "index"]), instance_of_param(t));
        add_method(&list, "pop", params(&["self"]), instance_of_param(t));
        add_method(&list, "append", params(&["self", "item"]), none.clone());

        let tuple = self.builtin_class(BuiltinTypeId::Tuple);
        add_method(&tuple, "__getitem__", params(&["self", "index"]), instance_of_param(t));

        let dict = self.builtin_class(BuiltinTypeId::Dict);
        add_method(&dict, "__getitem__", params(&["self", "key"]), instance_of_param(vt));
        add_method(&dict, "get", params(&["self", "key"]), instance_of_param(vt));

        let iterator = self.builtin_class(BuiltinTypeId::Iterator);
        add_method(&iterator, "__next__", params(&["self"]), instance_of_param(t));

        let s = self.builtin_class(BuiltinTypeId::Str);
        add_method(&s, "__getitem__", params(&["self", "index"]), str_instance.clone());
        for name in ["upper", "lower", "strip"] {
            add_method(&s, name, params(&["self"]), str_instance.clone());
        }
        add_method(&s, "join", params(&["self", "iterable"]), str_instance);
    }

    fn register_typing(&mut self, t: &GenericParamRef, kt: &GenericParamRef, vt: &GenericParamRef) {
        for (alias, id) in [
            ("List", BuiltinTypeId::List),
            ("Tuple", BuiltinTypeId::Tuple),
            ("Set", BuiltinTypeId::Set),
            ("Dict", BuiltinTypeId::Dict),
            ("Iterator", BuiltinTypeId::Iterator),
            ("Iterable", BuiltinTypeId::Iterator),
            ("Generator", BuiltinTypeId::Generator),
        ] {
            let class = self.builtin_class(id);
            self.register_class(alias, &class);
        }

        let object = self.builtin(BuiltinTypeId::Object);
        let typing_class = |name: &str, id: Option<BuiltinTypeId>, params: &[GenericParamRef]| {
            let class = Rc::new(
                ClassType::new(name, format!("typing.{name}"), id)
                    .with_flags(ClassFlags::BUILTIN)
                    .with_params(params),
            );
            class.set_bases(vec![object.clone()]);
            class
        };

        let mapping = typing_class("Mapping", Some(BuiltinTypeId::Dict), &[kt.clone(), vt.clone()]);
        let sequence = typing_class("Sequence", Some(BuiltinTypeId::List), &[t.clone()]);
        let type_of = typing_class("Type", None, &[param("_TT")]);
        type_of.insert_flags(ClassFlags::TYPE_OF_TYPE);
        let generic = typing_class("Generic", None, &[]);
        self.generic_marker = generic.type_hash();

        self.register_class("Mapping", &mapping);
        self.register_class("Sequence", &sequence);
        self.register_class("Type", &type_of);
        self.register_class("Generic", &generic);
        self.names.insert("Any".to_string(), Member::Unknown);

        let type_var = function("typing.TypeVar", params(&["name"]), Member::Unknown);
        self.type_var = type_var.type_hash();
        self.register_function(&type_var);
    }

    fn register_functions(&mut self) {
        let int_instance = self.instance(BuiltinTypeId::Int);
        let range_iter = Member::from_instance(Instance::iterator(
            self.builtin(BuiltinTypeId::Iterator),
            int_instance.clone(),
        ));

        let builtins = [
            function("builtins.print", params(&["value"]), self.none()),
            function("builtins.len", params(&["obj"]), int_instance),
            function("builtins.isinstance", params(&["obj", "class_or_tuple"]), self.instance(BuiltinTypeId::Bool)),
            function("builtins.repr", params(&["obj"]), self.instance(BuiltinTypeId::Str)),
            function("builtins.range", params(&["stop"]), range_iter),
        ];
        for f in &builtins {
            self.register_function(f);
        }

        for name in DECORATORS {
            let f = function(&format!("builtins.{name}"), params(&["function"]), Member::Unknown);
            self.register_function(&f);
        }
    }
}
