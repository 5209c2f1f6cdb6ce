//! Types computed by the [`Checker`](crate::Checker).
//!
//! This is not TypeScript's type system. It tracks what lowering needs:
//! array-ness, string-ness, function context, multi-return marking and the
//! identity of classes, interfaces, enums and namespaces.

use std::rc::Rc;

use crate::binder::SymbolId;

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Any,
    Unknown,
    Never,
    Void,
    Undefined,
    Null,
    Number,
    String,
    Boolean,
    StringLiteral(String),
    NumberLiteral(f64),
    BooleanLiteral(bool),
    Array(Box<Type>),
    Tuple(Vec<Type>),
    Function(Rc<FunctionType>),
    /// Anonymous object shape (object literal or type literal).
    Object(Rc<Vec<(String, Type)>>),
    /// Constructor side of a class.
    Class(SymbolId),
    /// Instance of a class.
    Instance(SymbolId),
    Interface(SymbolId),
    Enum(SymbolId),
    Namespace(SymbolId),
    /// Built-in library type such as `Map` or `Promise`.
    Named(String, Vec<Type>),
    Union(Vec<Type>),
}

/// Whether a function takes a leading `self` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextType {
    Void,
    NonVoid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub rest: Option<Type>,
    pub returns: Type,
    pub context: ContextType,
    /// Returns `LuaMultiReturn<...>`.
    pub multi: bool,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, returns: Type, context: ContextType) -> Self {
        Self {
            params,
            rest: None,
            returns,
            context,
            multi: false,
        }
    }

    /// Type of the argument at `index`, following a rest parameter.
    pub fn param(&self, index: usize) -> Type {
        match self.params.get(index) {
            Some(param) => param.clone(),
            None => match &self.rest {
                Some(Type::Array(element)) => (**element).clone(),
                Some(rest) => rest.clone(),
                None => Type::Any,
            },
        }
    }
}

impl Type {
    pub fn function(function: FunctionType) -> Self {
        Type::Function(Rc::new(function))
    }

    /// Build a union, flattening nested unions and dropping duplicates.
    pub fn union(members: Vec<Type>) -> Self {
        let mut flat: Vec<Type> = Vec::new();
        for member in members {
            match member {
                Type::Union(inner) => {
                    for inner in inner {
                        if !flat.contains(&inner) {
                            flat.push(inner);
                        }
                    }
                }
                Type::Never => {}
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }
        match flat.len() {
            0 => Type::Never,
            1 => flat.remove(0),
            _ => Type::Union(flat),
        }
    }

    /// Drop literal-ness, as `let` declarations do.
    pub fn widen(&self) -> Type {
        match self {
            Type::StringLiteral(_) => Type::String,
            Type::NumberLiteral(_) => Type::Number,
            Type::BooleanLiteral(_) => Type::Boolean,
            Type::Union(members) => Type::union(members.iter().map(Type::widen).collect()),
            other => other.clone(),
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Type::Undefined | Type::Null | Type::Void)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any | Type::Unknown)
    }

    /// The type with `undefined`, `null` and `void` removed.
    pub fn non_nullable(&self) -> Type {
        match self {
            Type::Union(members) => {
                Type::union(members.iter().filter(|m| !m.is_nullish()).cloned().collect())
            }
            other => other.clone(),
        }
    }

    fn all_non_nullish(&self, predicate: impl Fn(&Type) -> bool) -> bool {
        match self {
            Type::Union(members) => {
                let mut any = false;
                for member in members.iter().filter(|m| !m.is_nullish()) {
                    if !predicate(member) {
                        return false;
                    }
                    any = true;
                }
                any
            }
            other => predicate(other),
        }
    }

    pub fn is_array(&self) -> bool {
        self.all_non_nullish(|t| matches!(t, Type::Array(_) | Type::Tuple(_)))
    }

    pub fn is_string(&self) -> bool {
        self.all_non_nullish(|t| matches!(t, Type::String | Type::StringLiteral(_)))
    }

    pub fn is_number(&self) -> bool {
        self.all_non_nullish(|t| matches!(t, Type::Number | Type::NumberLiteral(_)))
    }

    pub fn is_function(&self) -> bool {
        self.all_non_nullish(|t| matches!(t, Type::Function(_)))
    }

    /// Element type of an array or tuple.
    pub fn element_type(&self) -> Type {
        match self.non_nullable() {
            Type::Array(element) => *element,
            Type::Tuple(elements) => Type::union(elements),
            Type::Union(members) => Type::union(
                members
                    .iter()
                    .filter(|m| m.is_array())
                    .map(Type::element_type)
                    .collect(),
            ),
            Type::String | Type::StringLiteral(_) => Type::String,
            Type::Named(name, arguments) if is_iterable_name(&name) => {
                arguments.first().cloned().unwrap_or(Type::Any)
            }
            _ => Type::Any,
        }
    }

    /// Whether a value of this type may be `false` or `nil` in Lua.
    pub fn can_be_falsy(&self) -> bool {
        match self {
            Type::Any
            | Type::Unknown
            | Type::Void
            | Type::Undefined
            | Type::Null
            | Type::Boolean
            | Type::BooleanLiteral(false) => true,
            Type::Union(members) => members.iter().any(Type::can_be_falsy),
            _ => false,
        }
    }

    /// Whether a value of this type may be the boolean `false`.
    pub fn can_be_false(&self) -> bool {
        match self {
            Type::Any | Type::Unknown | Type::Boolean | Type::BooleanLiteral(false) => true,
            Type::Union(members) => members.iter().any(Type::can_be_false),
            _ => false,
        }
    }

    /// Call signature when the type is callable.
    pub fn signature(&self) -> Option<Rc<FunctionType>> {
        match self.non_nullable() {
            Type::Function(function) => Some(function),
            Type::Union(members) => members.iter().find_map(Type::signature),
            _ => None,
        }
    }
}

fn is_iterable_name(name: &str) -> bool {
    matches!(
        name,
        "Set" | "ReadonlySet" | "Iterable" | "IterableIterator" | "Iterator" | "Generator"
    )
}
