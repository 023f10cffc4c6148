//! Argument sets passed to calls, constructors and specialization.

use pyinfer_core::{Member, ParameterInfo, ParameterKind, PyType, Span};

/// One argument: the parameter it binds, its value and the parameter's
/// declared type.
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: String,
    pub value: Member,
    pub declared_type: PyType,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: Member, declared_type: PyType) -> Self {
        Self {
            name: name.into(),
            value,
            declared_type,
        }
    }
}

/// Ordered arguments plus the span of the expression they came from.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSet {
    arguments: Vec<Argument>,
    span: Span,
}

impl ArgumentSet {
    pub fn new(span: Span) -> Self {
        Self {
            arguments: Vec::new(),
            span,
        }
    }

    /// Bind call arguments to a parameter list.
    ///
    /// The receiver, when present, binds the first parameter. Positional
    /// values fill the remaining positional parameters in order, a `*args`
    /// parameter absorbs the rest, keywords match by name and parameters left
    /// without a value take their default. Surplus positional values are
    /// kept unnamed at the end.
    pub fn for_call(
        params: &[ParameterInfo],
        receiver: Option<Member>,
        positional: Vec<Member>,
        keywords: Vec<(String, Member)>,
        span: Span,
    ) -> Self {
        let mut set = Self::new(span);
        let mut positional = positional.into_iter();
        let mut keywords: Vec<Option<(String, Member)>> = keywords.into_iter().map(Some).collect();
        let mut take_keyword = |name: &str| {
            keywords
                .iter_mut()
                .find(|k| k.as_ref().is_some_and(|(n, _)| n == name))
                .and_then(Option::take)
                .map(|(_, v)| v)
        };

        let mut params = params.iter();
        if let Some(receiver) = receiver
            && let Some(first) = params.next()
        {
            set.push(Argument::new(&first.name, receiver, first.declared_type.clone()));
        }

        for param in params {
            let value = match param.kind {
                ParameterKind::Normal => positional.next().or_else(|| take_keyword(&param.name)),
                ParameterKind::KeywordOnly => take_keyword(&param.name),
                ParameterKind::VarPositional => {
                    for value in positional.by_ref() {
                        set.push(Argument::new(&param.name, value, param.declared_type.clone()));
                    }
                    continue;
                }
                ParameterKind::VarKeyword => continue,
            };
            let value = match value {
                Some(v) => v,
                None if param.has_default => param.default_value.clone(),
                None => continue,
            };
            set.push(Argument::new(&param.name, value, param.declared_type.clone()));
        }

        for value in positional {
            set.push(Argument::new("", value, PyType::Unknown));
        }
        for (name, value) in keywords.into_iter().flatten() {
            set.push(Argument::new(name, value, PyType::Unknown));
        }
        set
    }

    /// Positional values with no declared types.
    pub fn positional(values: Vec<Member>, span: Span) -> Self {
        let mut set = Self::new(span);
        for value in values {
            set.push(Argument::new("", value, PyType::Unknown));
        }
        set
    }

    /// Type arguments, e.g. the `int, str` of `Dict[int, str]`.
    pub fn from_types(types: Vec<PyType>, span: Span) -> Self {
        let mut set = Self::new(span);
        for ty in types {
            set.push(Argument::new("", Member::of_type(ty), PyType::Unknown));
        }
        set
    }

    pub fn push(&mut self, argument: Argument) {
        self.arguments.push(argument);
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.arguments.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter()
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyinfer_core::{BuiltinTypeId, ClassType, Constant, Instance};
    use std::rc::Rc;

    fn int(value: i64) -> Member {
        let ty = PyType::Class(Rc::new(ClassType::builtin(BuiltinTypeId::Int)));
        Member::from_instance(Instance::constant(ty, Constant::Int(value)))
    }

    fn constant(member: &Member) -> Option<i64> {
        member.as_constant().and_then(Constant::as_int)
    }

    #[test]
    fn receiver_binds_first_parameter() {
        let params = [ParameterInfo::new("self"), ParameterInfo::new("x")];
        let set = ArgumentSet::for_call(&params, Some(int(0)), vec![int(1)], vec![], Span::default());
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().name, "self");
        assert_eq!(constant(&set.by_name("x").unwrap().value), Some(1));
    }

    #[test]
    fn keywords_and_defaults() {
        let params = [
            ParameterInfo::new("a"),
            ParameterInfo::new("b").with_default(int(7)),
            ParameterInfo::new("c").with_kind(ParameterKind::KeywordOnly),
        ];
        let set = ArgumentSet::for_call(
            &params,
            None,
            vec![int(1)],
            vec![("c".into(), int(3))],
            Span::default(),
        );
        assert_eq!(constant(&set.by_name("b").unwrap().value), Some(7));
        assert_eq!(constant(&set.by_name("c").unwrap().value), Some(3));
    }

    #[test]
    fn var_positional_absorbs_rest() {
        let params = [
            ParameterInfo::new("first"),
            ParameterInfo::new("rest").with_kind(ParameterKind::VarPositional),
        ];
        let set = ArgumentSet::for_call(&params, None, vec![int(1), int(2), int(3)], vec![], Span::default());
        assert_eq!(set.iter().filter(|a| a.name == "rest").count(), 2);
    }

    #[test]
    fn missing_arguments_are_omitted() {
        let params = [ParameterInfo::new("a"), ParameterInfo::new("b")];
        let set = ArgumentSet::for_call(&params, None, vec![], vec![], Span::default());
        assert!(set.is_empty());
    }

    #[test]
    fn surplus_positional_kept() {
        let set = ArgumentSet::for_call(&[], None, vec![int(1)], vec![], Span::default());
        assert_eq!(set.len(), 1);
        assert!(set.get(0).unwrap().declared_type.is_unknown());
    }
}
