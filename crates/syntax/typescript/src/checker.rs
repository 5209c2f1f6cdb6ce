//! Read-only type facility consulted by the transformer.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::ast::*;
use crate::binder::{
    Binder, Bindings, CallbackSite, Declaration, ImportedName, Origin, PathStep, Symbol, SymbolId,
    SymbolKind, ThisBinding,
};
use crate::prelude::prelude;
use crate::reader::ParseError;
use crate::types::{ContextType, FunctionType, Type};

/// Options that change how function context types are decided.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckerOptions {
    /// Free functions take no `self` argument.
    pub no_implicit_self: bool,
}

/// Constant value of an enum member.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    Number(f64),
    String(String),
}

const MAX_DEPTH: usize = 32;

pub struct Checker<'a> {
    file: &'a SourceFile,
    bindings: Bindings<'a>,
    options: CheckerOptions,
    symbol_types: RefCell<HashMap<SymbolId, Type>>,
    in_progress: RefCell<HashSet<SymbolId>>,
}

impl<'a> Checker<'a> {
    pub fn new(file: &'a SourceFile, options: CheckerOptions) -> Result<Self, ParseError> {
        let prelude = prelude()?;
        let bindings = Binder::bind(file, prelude);
        tracing::trace!(
            file = %file.file_name,
            symbols = bindings.symbols.len(),
            "bound source file"
        );
        Ok(Self {
            file,
            bindings,
            options,
            symbol_types: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(HashSet::new()),
        })
    }

    pub fn file(&self) -> &'a SourceFile {
        self.file
    }

    pub fn options(&self) -> CheckerOptions {
        self.options
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    /// Symbol an identifier reference or declaring name resolves to.
    pub fn symbol_of(&self, node: NodeId) -> Option<SymbolId> {
        self.bindings.resolved.get(&node).copied()
    }

    pub fn symbol(&self, symbol: SymbolId) -> &Symbol {
        &self.bindings.symbols[symbol.0 as usize]
    }

    fn declaration(&self, symbol: SymbolId) -> &Declaration<'a> {
        &self.bindings.declarations[symbol.0 as usize]
    }

    /// Prelude global by name.
    pub fn global(&self, name: &str) -> Option<SymbolId> {
        self.bindings.globals.get(name).copied()
    }

    pub fn references(&self, symbol: SymbolId) -> &[NodeId] {
        self.bindings
            .references
            .get(&symbol)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Spans of every reference to `symbol`, in source order.
    pub fn reference_spans(&self, symbol: SymbolId) -> Vec<Span> {
        let mut spans: Vec<Span> = self
            .references(symbol)
            .iter()
            .filter_map(|node| self.bindings.reference_spans.get(node).copied())
            .collect();
        spans.sort_by_key(|span| span.start);
        spans
    }

    /// Function declaration a function symbol was declared by.
    pub fn function_declaration(&self, symbol: SymbolId) -> Option<&'a FunctionDeclaration> {
        match self.declaration(symbol) {
            Declaration::Function(declaration) => Some(*declaration),
            _ => None,
        }
    }

    pub fn is_assigned(&self, symbol: SymbolId) -> bool {
        self.bindings.assigned.contains(&symbol)
    }

    pub fn this_binding(&self, node: NodeId) -> Option<ThisBinding> {
        self.bindings.this_bindings.get(&node).copied()
    }

    pub fn class_symbol(&self, class: &ClassDeclaration) -> Option<SymbolId> {
        self.bindings.class_symbols.get(&class.id).copied()
    }

    pub fn class_declaration(&self, symbol: SymbolId) -> Option<&'a ClassDeclaration> {
        match self.declaration(symbol) {
            Declaration::Class(class) => Some(*class),
            _ => None,
        }
    }

    pub fn enum_declaration(&self, symbol: SymbolId) -> Option<&'a EnumDeclaration> {
        match self.declaration(symbol) {
            Declaration::Enum(declaration) => Some(*declaration),
            _ => None,
        }
    }

    pub fn namespace_member(&self, namespace: SymbolId, name: &str) -> Option<SymbolId> {
        self.bindings
            .namespace_members
            .get(&namespace)
            .and_then(|members| members.get(name))
            .copied()
    }

    /// Namespace an exported member belongs to.
    pub fn member_namespace(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.bindings.member_namespaces.get(&symbol).copied()
    }

    /// Module and export an import binding refers to.
    pub fn import_of(&self, symbol: SymbolId) -> Option<(&'a str, ImportedName<'a>)> {
        match self.declaration(symbol) {
            Declaration::Import { source, imported } => Some((*source, *imported)),
            _ => None,
        }
    }

    /// Function whose rest parameter `symbol` is.
    pub fn rest_parameter_function(&self, symbol: SymbolId) -> Option<&'a Function> {
        match self.declaration(symbol) {
            Declaration::Parameter {
                function,
                index,
                path,
            } if path.is_empty() && function.params.get(*index).is_some_and(|p| p.rest) => {
                Some(*function)
            }
            _ => None,
        }
    }

    /// Base class of a class, when it is a known class declaration.
    pub fn base_class(&self, class: SymbolId) -> Option<SymbolId> {
        let declaration = self.class_declaration(class)?;
        let extends = declaration.extends.as_ref()?;
        match self.type_of(extends) {
            Type::Class(base) => Some(base),
            _ => None,
        }
    }

    /// Whether `name` is a get/set accessor on the class or one of its bases.
    pub fn has_accessor(&self, class: SymbolId, name: &str, is_static: bool) -> bool {
        let mut current = Some(class);
        let mut depth = 0;
        while let (Some(symbol), true) = (current, depth < MAX_DEPTH) {
            if let Some(declaration) = self.class_declaration(symbol) {
                let found = declaration.members.iter().any(|member| {
                    member.is_static == is_static
                        && match &member.kind {
                            ClassMemberKind::Getter { name: n, .. }
                            | ClassMemberKind::Setter { name: n, .. } => {
                                n.text().as_deref() == Some(name)
                            }
                            _ => false,
                        }
                });
                if found {
                    return true;
                }
            }
            current = self.base_class(symbol);
            depth += 1;
        }
        false
    }

    /// Whether a call invokes the `$multi` helper.
    pub fn is_multi_helper_call(&self, call: &CallExpression) -> bool {
        let callee = call.callee.skip_outer();
        let ExpressionKind::Identifier(name) = &callee.kind else {
            return false;
        };
        let Some(symbol) = self.symbol_of(callee.id) else {
            return name == "$multi";
        };
        match self.declaration(symbol) {
            Declaration::Function(_) => {
                let symbol = self.symbol(symbol);
                symbol.origin == Origin::Prelude && symbol.name == "$multi"
            }
            Declaration::Import {
                source,
                imported: ImportedName::Named(imported),
            } => {
                (source.ends_with("helpers/multi") || source.ends_with("helpers"))
                    && matches!(*imported, "multi" | "$multi")
            }
            _ => false,
        }
    }

    /// Whether the call returns multiple Lua values.
    pub fn returns_multi(&self, call: &CallExpression) -> bool {
        if self.is_multi_helper_call(call) {
            return true;
        }
        self.type_of(&call.callee)
            .signature()
            .is_some_and(|signature| signature.multi)
    }

    /// Whether a function returns multiple Lua values, either declared as
    /// `LuaMultiReturn` or inferred from a forwarded multi-value call.
    pub fn is_multi_return_function(&self, function: &Function) -> bool {
        if function.is_async || function.is_generator {
            return false;
        }
        match &function.return_type {
            Some(TypeNode::Reference { name, .. }) => name == "LuaMultiReturn" || name == "MultiReturn",
            Some(_) => false,
            None => self.infer_return_type(function).1,
        }
    }

    // =========================================================================
    // Function context
    // =========================================================================

    /// Whether a function declared in the file takes a leading `self`.
    pub fn function_context(&self, function: &Function) -> ContextType {
        if let Some(this) = &function.this_param {
            return explicit_context(this);
        }
        if self.bindings.no_self_functions.contains(&function.id) {
            return ContextType::Void;
        }
        if self.bindings.methods.contains(&function.id) {
            return ContextType::NonVoid;
        }
        if let Some(signature) = self.contextual_signature(function.id) {
            return signature.context;
        }
        if self.options.no_implicit_self {
            ContextType::Void
        } else {
            ContextType::NonVoid
        }
    }

    /// Signature a function expression is expected to satisfy.
    pub fn contextual_signature(&self, function: NodeId) -> Option<Rc<FunctionType>> {
        match *self.bindings.callback_sites.get(&function)? {
            CallbackSite::Declared(type_node) => self.type_from_node(type_node, false).signature(),
            CallbackSite::Argument {
                callee,
                index,
                is_new,
            } => {
                if let Some(signature) = self.builtin_callback_signature(callee, index, is_new) {
                    return Some(signature);
                }
                let signature = if is_new {
                    match self.type_of(callee) {
                        Type::Class(class) => self.constructor_signature(class)?,
                        _ => return None,
                    }
                } else {
                    self.type_of(callee).signature()?
                };
                signature.param(index).signature()
            }
        }
    }

    fn builtin_callback_signature(
        &self,
        callee: &Expression,
        index: usize,
        is_new: bool,
    ) -> Option<Rc<FunctionType>> {
        let callback = |params: Vec<Type>| {
            Some(Rc::new(FunctionType::new(params, Type::Any, ContextType::NonVoid)))
        };
        if is_new {
            return match &callee.skip_outer().kind {
                ExpressionKind::Identifier(name)
                    if name == "Promise" && self.symbol_of(callee.skip_outer().id).is_none() =>
                {
                    let settle = Type::function(FunctionType {
                        params: vec![],
                        rest: Some(Type::Array(Box::new(Type::Any))),
                        returns: Type::Void,
                        context: ContextType::NonVoid,
                        multi: false,
                    });
                    callback(vec![settle.clone(), settle])
                }
                _ => None,
            };
        }
        let ExpressionKind::PropertyAccess(access) = &callee.skip_outer().kind else {
            return None;
        };
        let object = self.type_of(&access.object);
        let method = access.name.name.as_str();
        if object.is_array() {
            let element = object.element_type();
            let array = object.non_nullable();
            return match method {
                "map" | "filter" | "forEach" | "find" | "findIndex" | "some" | "every"
                | "flatMap" => callback(vec![element, Type::Number, array]),
                "reduce" | "reduceRight" if index == 0 => {
                    callback(vec![Type::Any, element, Type::Number, array])
                }
                "sort" => callback(vec![element.clone(), element]),
                _ => None,
            };
        }
        match (object.non_nullable(), method) {
            (Type::Named(name, arguments), "forEach") if name == "Map" => {
                let key = arguments.first().cloned().unwrap_or(Type::Any);
                let value = arguments.get(1).cloned().unwrap_or(Type::Any);
                callback(vec![value, key])
            }
            (Type::Named(name, arguments), "forEach") if name == "Set" => {
                let value = arguments.first().cloned().unwrap_or(Type::Any);
                callback(vec![value.clone(), value])
            }
            (Type::Named(name, arguments), "then") if name == "Promise" => {
                callback(vec![arguments.first().cloned().unwrap_or(Type::Any)])
            }
            (Type::Named(name, _), "catch" | "finally") if name == "Promise" => {
                callback(vec![Type::Any])
            }
            _ => None,
        }
    }

    fn constructor_signature(&self, class: SymbolId) -> Option<Rc<FunctionType>> {
        let mut current = Some(class);
        let mut depth = 0;
        while let (Some(symbol), true) = (current, depth < MAX_DEPTH) {
            if let Some(constructor) = self.class_declaration(symbol).and_then(|c| c.constructor())
            {
                let origin = self.symbol(symbol).origin;
                return Some(Rc::new(self.function_type(constructor, origin, false)));
            }
            current = self.base_class(symbol);
            depth += 1;
        }
        None
    }

    // =========================================================================
    // Enums
    // =========================================================================

    /// Member values in declaration order. `None` marks a member whose value
    /// is not a compile-time constant.
    pub fn enum_values(&self, declaration: &EnumDeclaration) -> Vec<(String, Option<EnumValue>)> {
        let mut values: Vec<(String, Option<EnumValue>)> = Vec::new();
        for member in &declaration.members {
            let name = member.name.text().unwrap_or_default();
            let value = match &member.initializer {
                Some(initializer) => {
                    evaluate_constant(initializer, &declaration.name.name, &values)
                }
                None => match values.last() {
                    None => Some(EnumValue::Number(0.0)),
                    Some((_, Some(EnumValue::Number(previous)))) => {
                        Some(EnumValue::Number(previous + 1.0))
                    }
                    Some(_) => None,
                },
            };
            values.push((name, value));
        }
        values
    }

    pub fn enum_member_value(&self, symbol: SymbolId, name: &str) -> Option<EnumValue> {
        let declaration = self.enum_declaration(symbol)?;
        self.enum_values(declaration)
            .into_iter()
            .find(|(member, _)| member == name)
            .and_then(|(_, value)| value)
    }

    // =========================================================================
    // Expression types
    // =========================================================================

    pub fn type_of(&self, expression: &Expression) -> Type {
        match &expression.kind {
            ExpressionKind::Identifier(name) => match self.symbol_of(expression.id) {
                Some(symbol) => self.type_of_symbol(symbol),
                None => builtin_global_type(name),
            },
            ExpressionKind::Number(value) => Type::NumberLiteral(*value),
            ExpressionKind::String(value) => Type::StringLiteral(value.clone()),
            ExpressionKind::Template(_) => Type::String,
            ExpressionKind::Boolean(value) => Type::BooleanLiteral(*value),
            ExpressionKind::Null => Type::Null,
            ExpressionKind::Undefined => Type::Undefined,
            ExpressionKind::This => match self.this_binding(expression.id) {
                Some(binding) if binding.is_static => Type::Class(binding.class),
                Some(binding) => Type::Instance(binding.class),
                None => Type::Any,
            },
            ExpressionKind::Super => Type::Any,
            ExpressionKind::Array(elements) => {
                let members: Vec<Type> = elements
                    .iter()
                    .map(|element| match &element.kind {
                        ExpressionKind::Spread(inner) => self.type_of(inner).element_type(),
                        ExpressionKind::Omitted => Type::Undefined,
                        _ => self.type_of(element).widen(),
                    })
                    .collect();
                let element = if members.is_empty() {
                    Type::Any
                } else {
                    Type::union(members)
                };
                Type::Array(Box::new(element))
            }
            ExpressionKind::Object(members) => self.object_literal_type(members),
            ExpressionKind::Function(function) => {
                Type::function(self.function_type(function, Origin::File, false))
            }
            ExpressionKind::Class(class) => match self.class_symbol(class) {
                Some(symbol) => Type::Class(symbol),
                None => Type::Any,
            },
            ExpressionKind::Call(call) => self.call_return_type(call),
            ExpressionKind::New(new) => self.construct_type(&new.callee),
            ExpressionKind::PropertyAccess(access) => {
                let object = self.type_of(&access.object);
                self.property_type(&object, &access.name.name)
            }
            ExpressionKind::ElementAccess(access) => {
                let object = self.type_of(&access.object);
                self.element_access_type(&object, &access.index)
            }
            ExpressionKind::Assignment(assignment) => self.type_of(&assignment.right),
            ExpressionKind::CompoundAssignment(assignment) => match assignment.operator {
                CompoundOperator::Add => {
                    let left = self.type_of(&assignment.left);
                    let right = self.type_of(&assignment.right);
                    if left.is_string() || right.is_string() {
                        Type::String
                    } else {
                        Type::Number
                    }
                }
                CompoundOperator::LogicalAnd
                | CompoundOperator::LogicalOr
                | CompoundOperator::Coalesce => Type::union(vec![
                    self.type_of(&assignment.left),
                    self.type_of(&assignment.right),
                ]),
                _ => Type::Number,
            },
            ExpressionKind::Binary(binary) => self.binary_type(binary),
            ExpressionKind::Unary(unary) => match unary.operator {
                UnaryOperator::Not | UnaryOperator::Delete => Type::Boolean,
                UnaryOperator::TypeOf => Type::String,
                UnaryOperator::Void => Type::Undefined,
                UnaryOperator::Minus | UnaryOperator::Plus | UnaryOperator::BitwiseNot => {
                    Type::Number
                }
            },
            ExpressionKind::Update(_) => Type::Number,
            ExpressionKind::Conditional(conditional) => Type::union(vec![
                self.type_of(&conditional.when_true),
                self.type_of(&conditional.when_false),
            ]),
            ExpressionKind::Parenthesized(inner) => self.type_of(inner),
            ExpressionKind::Assertion(inner, Some(type_node)) => {
                match self.type_from_node(type_node, false) {
                    Type::Any => match type_node {
                        TypeNode::Reference { name, .. } if name == "const" => self.type_of(inner),
                        _ => Type::Any,
                    },
                    asserted => asserted,
                }
            }
            ExpressionKind::Assertion(inner, None) => self.type_of(inner).non_nullable(),
            ExpressionKind::Await(inner) => match self.type_of(inner) {
                Type::Named(name, arguments) if name == "Promise" => {
                    arguments.first().cloned().unwrap_or(Type::Any)
                }
                other => other,
            },
            ExpressionKind::Sequence(expressions) => expressions
                .last()
                .map(|last| self.type_of(last))
                .unwrap_or(Type::Undefined),
            ExpressionKind::Spread(inner) => self.type_of(inner),
            ExpressionKind::Omitted => Type::Undefined,
            ExpressionKind::Yield(_) | ExpressionKind::Unsupported(_) => Type::Any,
        }
    }

    fn object_literal_type(&self, members: &[ObjectMember]) -> Type {
        let mut fields: Vec<(String, Type)> = Vec::new();
        for member in members {
            match &member.kind {
                ObjectMemberKind::Property { key, value } => {
                    if let Some(name) = key.text() {
                        fields.push((name, self.type_of(value).widen()));
                    }
                }
                ObjectMemberKind::Shorthand(value) => {
                    if let Some(name) = value.as_identifier() {
                        fields.push((name.to_string(), self.type_of(value)));
                    }
                }
                ObjectMemberKind::Method { key, function } => {
                    if let Some(name) = key.text() {
                        let function = self.function_type(function, Origin::File, false);
                        fields.push((name, Type::function(function)));
                    }
                }
                ObjectMemberKind::Accessor { key, function } => {
                    if let Some(name) = key.text() {
                        let function = self.function_type(function, Origin::File, false);
                        fields.push((name, function.returns));
                    }
                }
                ObjectMemberKind::Spread(value) => {
                    if let Type::Object(spread) = self.type_of(value) {
                        fields.extend(spread.iter().cloned());
                    }
                }
            }
        }
        Type::Object(Rc::new(fields))
    }

    fn binary_type(&self, binary: &BinaryExpression) -> Type {
        match binary.operator {
            BinaryOperator::Add => {
                let left = self.type_of(&binary.left);
                let right = self.type_of(&binary.right);
                if left.is_string() || right.is_string() {
                    Type::String
                } else if left.is_number() && right.is_number() {
                    Type::Number
                } else {
                    Type::Any
                }
            }
            BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Mod
            | BinaryOperator::Pow
            | BinaryOperator::BitwiseAnd
            | BinaryOperator::BitwiseOr
            | BinaryOperator::BitwiseXor
            | BinaryOperator::ShiftLeft
            | BinaryOperator::ShiftRight
            | BinaryOperator::UnsignedShiftRight => Type::Number,
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::StrictEqual
            | BinaryOperator::StrictNotEqual
            | BinaryOperator::Less
            | BinaryOperator::LessEqual
            | BinaryOperator::Greater
            | BinaryOperator::GreaterEqual
            | BinaryOperator::In
            | BinaryOperator::InstanceOf => Type::Boolean,
            BinaryOperator::LogicalAnd => self.type_of(&binary.right),
            BinaryOperator::LogicalOr => Type::union(vec![
                self.type_of(&binary.left),
                self.type_of(&binary.right),
            ]),
            BinaryOperator::Coalesce => Type::union(vec![
                self.type_of(&binary.left).non_nullable(),
                self.type_of(&binary.right),
            ]),
        }
    }

    fn call_return_type(&self, call: &CallExpression) -> Type {
        if self.is_multi_helper_call(call) {
            return Type::Tuple(call.arguments.iter().map(|a| self.type_of(a)).collect());
        }
        let callee = self.type_of(&call.callee);
        if let Type::Named(name, _) = &callee {
            match name.as_str() {
                "StringConstructor" => return Type::String,
                "NumberConstructor" => return Type::Number,
                "BooleanConstructor" => return Type::Boolean,
                "ArrayConstructor" => return Type::Array(Box::new(Type::Any)),
                _ => {}
            }
        }
        match callee.signature() {
            Some(signature) => signature.returns.clone(),
            None => Type::Any,
        }
    }

    fn construct_type(&self, callee: &Expression) -> Type {
        match self.type_of(callee) {
            Type::Class(class) => Type::Instance(class),
            Type::Named(name, _) => match name.strip_suffix("Constructor") {
                Some("Array") => Type::Array(Box::new(Type::Any)),
                Some(instance) => Type::Named(instance.to_string(), Vec::new()),
                None => Type::Any,
            },
            _ => Type::Any,
        }
    }

    fn element_access_type(&self, object: &Type, index: &Expression) -> Type {
        match object.non_nullable() {
            Type::Array(element) => *element,
            Type::Tuple(elements) => match index.skip_outer().kind {
                ExpressionKind::Number(value) if value >= 0.0 => elements
                    .get(value as usize)
                    .cloned()
                    .unwrap_or(Type::Undefined),
                _ => Type::union(elements),
            },
            Type::String | Type::StringLiteral(_) => Type::String,
            other => match &index.skip_outer().kind {
                ExpressionKind::String(name) => self.property_type(&other, name),
                _ => Type::Any,
            },
        }
    }

    /// Type of `object.name`.
    pub fn property_type(&self, object: &Type, name: &str) -> Type {
        match object.non_nullable() {
            Type::Array(element) => array_property_type(&Type::Array(element), name),
            array @ Type::Tuple(_) => array_property_type(&array, name),
            Type::String | Type::StringLiteral(_) => string_property_type(name),
            Type::Instance(class) => self.class_member_type(class, name, false),
            Type::Class(class) => self.class_member_type(class, name, true),
            Type::Interface(interface) => self.interface_member_type(interface, name, 0),
            Type::Object(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, ty)| ty.clone())
                .unwrap_or(Type::Any),
            Type::Enum(symbol) => match self.enum_member_value(symbol, name) {
                Some(EnumValue::Number(value)) => Type::NumberLiteral(value),
                Some(EnumValue::String(value)) => Type::StringLiteral(value),
                None => Type::Any,
            },
            Type::Namespace(namespace) => match self.namespace_member(namespace, name) {
                Some(member) => self.type_of_symbol(member),
                None => Type::Any,
            },
            Type::Named(named, arguments) => named_property_type(&named, &arguments, name),
            Type::Function(_) if name == "length" => Type::Number,
            Type::Union(members) => Type::union(
                members
                    .iter()
                    .map(|member| self.property_type(member, name))
                    .collect(),
            ),
            _ => Type::Any,
        }
    }

    fn class_member_type(&self, class: SymbolId, name: &str, is_static: bool) -> Type {
        let mut current = Some(class);
        let mut depth = 0;
        while let (Some(symbol), true) = (current, depth < MAX_DEPTH) {
            let origin = self.symbol(symbol).origin;
            let no_self = self.symbol(symbol).no_self;
            if let Some(declaration) = self.class_declaration(symbol) {
                for member in &declaration.members {
                    if let Some(found) =
                        self.member_type(member, name, is_static, origin, no_self)
                    {
                        return found;
                    }
                }
            }
            current = self.base_class(symbol);
            depth += 1;
        }
        Type::Any
    }

    fn member_type(
        &self,
        member: &ClassMember,
        name: &str,
        is_static: bool,
        origin: Origin,
        no_self: bool,
    ) -> Option<Type> {
        if let ClassMemberKind::Constructor(function) = &member.kind {
            if is_static {
                return None;
            }
            let parameter = function
                .params
                .iter()
                .find(|p| p.is_property && p.pattern.as_identifier() == Some(name))?;
            return Some(match &parameter.type_annotation {
                Some(annotation) => self.type_from_node(annotation, no_self),
                None => Type::Any,
            });
        }
        if member.is_static != is_static {
            return None;
        }
        match &member.kind {
            ClassMemberKind::Property {
                name: member_name,
                type_annotation,
                initializer,
            } if member_name.text().as_deref() == Some(name) => {
                Some(match (type_annotation, initializer) {
                    (Some(annotation), _) => self.type_from_node(annotation, no_self),
                    (None, Some(initializer)) => self.type_of(initializer).widen(),
                    (None, None) => Type::Any,
                })
            }
            ClassMemberKind::Method {
                name: member_name,
                function,
            } if member_name.text().as_deref() == Some(name) => {
                Some(Type::function(self.function_type(function, origin, no_self)))
            }
            ClassMemberKind::Getter {
                name: member_name,
                function,
            } if member_name.text().as_deref() == Some(name) => {
                Some(self.function_type(function, origin, no_self).returns)
            }
            ClassMemberKind::Setter {
                name: member_name,
                function,
            } if member_name.text().as_deref() == Some(name) => {
                Some(self.function_type(function, origin, no_self).param(0))
            }
            _ => None,
        }
    }

    fn interface_member_type(&self, interface: SymbolId, name: &str, depth: usize) -> Type {
        if depth > MAX_DEPTH {
            return Type::Any;
        }
        let no_self = self.symbol(interface).no_self;
        let Declaration::Interface(declaration) = self.declaration(interface) else {
            return match self.declaration(interface) {
                Declaration::Class(_) => self.class_member_type(interface, name, false),
                _ => Type::Any,
            };
        };
        for member in &declaration.members {
            if member.name != name {
                continue;
            }
            return match &member.kind {
                TypeMemberKind::Property { type_node, .. } => match type_node {
                    Some(type_node) => self.type_from_node(type_node, no_self),
                    None => Type::Any,
                },
                TypeMemberKind::Method(function) => {
                    Type::function(self.function_type_from_node(function, no_self))
                }
                TypeMemberKind::Call(_) => continue,
            };
        }
        for extended in &declaration.extends {
            if let TypeNode::Reference { name: base, .. } = extended {
                if let Some(base) = self.bindings.type_names.get(base) {
                    let found = self.interface_member_type(*base, name, depth + 1);
                    if found != Type::Any {
                        return found;
                    }
                }
            }
        }
        Type::Any
    }

    // =========================================================================
    // Symbol types
    // =========================================================================

    pub fn type_of_symbol(&self, symbol: SymbolId) -> Type {
        if let Some(cached) = self.symbol_types.borrow().get(&symbol) {
            return cached.clone();
        }
        if !self.in_progress.borrow_mut().insert(symbol) {
            return Type::Any;
        }
        let computed = self.compute_symbol_type(symbol);
        self.in_progress.borrow_mut().remove(&symbol);
        self.symbol_types
            .borrow_mut()
            .insert(symbol, computed.clone());
        computed
    }

    fn compute_symbol_type(&self, symbol: SymbolId) -> Type {
        let info = self.symbol(symbol);
        match self.declaration(symbol) {
            Declaration::Variable { declarator, path } => {
                let root = match (&declarator.type_annotation, &declarator.initializer) {
                    (Some(annotation), _) => self.type_from_node(annotation, info.no_self),
                    (None, Some(initializer)) => {
                        let inferred = self.type_of(initializer);
                        if info.kind == SymbolKind::Variable(VariableKind::Const) {
                            inferred
                        } else {
                            inferred.widen()
                        }
                    }
                    (None, None) => Type::Any,
                };
                self.apply_path(root, path)
            }
            Declaration::ForBinding {
                statement,
                is_for_in,
                path,
            } => {
                if *is_for_in {
                    return Type::String;
                }
                let root = self.type_of(&statement.expression).element_type();
                self.apply_path(root, path)
            }
            Declaration::Parameter {
                function,
                index,
                path,
            } => {
                let Some(parameter) = function.params.get(*index) else {
                    return Type::Any;
                };
                let root = match &parameter.type_annotation {
                    Some(annotation) => self.type_from_node(annotation, info.no_self),
                    None => match self.contextual_signature(function.id) {
                        Some(signature) if parameter.rest => {
                            Type::Array(Box::new(signature.param(*index)))
                        }
                        Some(signature) => signature.param(*index),
                        None if parameter.rest => Type::Array(Box::new(Type::Any)),
                        None => match &parameter.default {
                            Some(default) => self.type_of(default).widen(),
                            None => Type::Any,
                        },
                    },
                };
                self.apply_path(root, path)
            }
            Declaration::CatchParameter | Declaration::Import { .. } => Type::Any,
            Declaration::Function(declaration) => Type::function(self.function_type(
                &declaration.function,
                info.origin,
                info.no_self,
            )),
            Declaration::Class(_) => Type::Class(symbol),
            Declaration::Enum(_) => Type::Enum(symbol),
            Declaration::Interface(_) => Type::Interface(symbol),
            Declaration::TypeAlias(alias) => self.type_from_node(&alias.value, info.no_self),
            Declaration::Namespace(_) => Type::Namespace(symbol),
        }
    }

    fn apply_path(&self, mut current: Type, path: &[PathStep]) -> Type {
        for step in path {
            current = match step {
                PathStep::Index(index) => match current.non_nullable() {
                    Type::Tuple(elements) => {
                        elements.get(*index).cloned().unwrap_or(Type::Undefined)
                    }
                    other => other.element_type(),
                },
                PathStep::Rest(index) => match current.non_nullable() {
                    Type::Tuple(elements) => {
                        Type::Tuple(elements.iter().skip(*index).cloned().collect())
                    }
                    Type::Array(element) => Type::Array(element),
                    _ => Type::Array(Box::new(Type::Any)),
                },
                PathStep::Property(name) => self.property_type(&current, name),
                PathStep::ObjectRest => Type::Any,
            };
        }
        current
    }

    /// Signature of a function declaration or expression.
    fn function_type(&self, function: &Function, origin: Origin, no_self: bool) -> FunctionType {
        let contextual = match origin {
            Origin::File => self.contextual_signature(function.id),
            Origin::Prelude => None,
        };
        let mut params = Vec::new();
        let mut rest = None;
        for (index, parameter) in function.params.iter().enumerate() {
            let declared = match &parameter.type_annotation {
                Some(annotation) => self.type_from_node(annotation, no_self),
                None => contextual
                    .as_ref()
                    .map(|signature| signature.param(index))
                    .unwrap_or(Type::Any),
            };
            if parameter.rest {
                rest = Some(match declared {
                    array @ (Type::Array(_) | Type::Tuple(_)) => array,
                    other => Type::Array(Box::new(other)),
                });
            } else {
                params.push(declared);
            }
        }

        let (mut returns, multi) = match &function.return_type {
            Some(TypeNode::Reference { name, arguments })
                if name == "LuaMultiReturn" || name == "MultiReturn" =>
            {
                let inner = arguments
                    .first()
                    .map(|argument| self.type_from_node(argument, no_self))
                    .unwrap_or(Type::Any);
                (inner, true)
            }
            Some(annotation) => (self.type_from_node(annotation, no_self), false),
            None => self.infer_return_type(function),
        };
        if function.return_type.is_none() {
            if function.is_async {
                returns = Type::Named("Promise".into(), vec![returns]);
            } else if function.is_generator {
                returns = Type::Named("Generator".into(), vec![Type::Any]);
            }
        }

        let context = match (origin, &function.this_param) {
            (_, Some(this)) => explicit_context(this),
            (Origin::Prelude, None) if no_self => ContextType::Void,
            (Origin::Prelude, None) => ContextType::NonVoid,
            (Origin::File, None) => self.function_context(function),
        };

        FunctionType {
            params,
            rest,
            returns,
            context,
            multi,
        }
    }

    fn infer_return_type(&self, function: &Function) -> (Type, bool) {
        match &function.body {
            Some(FunctionBody::Expression(expression)) => {
                (self.type_of(expression).widen(), self.is_multi_expression(expression))
            }
            Some(FunctionBody::Block(statements)) => match first_return(statements) {
                Some(value) => (self.type_of(value).widen(), self.is_multi_expression(value)),
                None => (Type::Void, false),
            },
            None => (Type::Any, false),
        }
    }

    fn is_multi_expression(&self, expression: &Expression) -> bool {
        match &expression.skip_outer().kind {
            ExpressionKind::Call(call) => self.returns_multi(call),
            _ => false,
        }
    }

    fn function_type_from_node(&self, node: &FunctionTypeNode, no_self: bool) -> FunctionType {
        let mut params = Vec::new();
        let mut rest = None;
        for parameter in &node.params {
            let declared = parameter
                .type_node
                .as_ref()
                .map(|type_node| self.type_from_node(type_node, no_self))
                .unwrap_or(Type::Any);
            if parameter.rest {
                rest = Some(declared);
            } else {
                params.push(declared);
            }
        }
        let (returns, multi) = match &node.return_type {
            TypeNode::Reference { name, arguments }
                if name == "LuaMultiReturn" || name == "MultiReturn" =>
            {
                let inner = arguments
                    .first()
                    .map(|argument| self.type_from_node(argument, no_self))
                    .unwrap_or(Type::Any);
                (inner, true)
            }
            other => (self.type_from_node(other, no_self), false),
        };
        let context = match &node.this_param {
            Some(this) => explicit_context(this),
            None if no_self => ContextType::Void,
            None => ContextType::NonVoid,
        };
        FunctionType {
            params,
            rest,
            returns,
            context,
            multi,
        }
    }

    /// Convert a type annotation.
    pub fn type_from_node(&self, node: &TypeNode, no_self: bool) -> Type {
        self.type_from_node_depth(node, no_self, 0)
    }

    fn type_from_node_depth(&self, node: &TypeNode, no_self: bool, depth: usize) -> Type {
        if depth > MAX_DEPTH {
            return Type::Any;
        }
        let convert = |inner: &TypeNode| self.type_from_node_depth(inner, no_self, depth + 1);
        match node {
            TypeNode::Any | TypeNode::Other | TypeNode::This | TypeNode::BigInt => Type::Any,
            TypeNode::Unknown => Type::Unknown,
            TypeNode::Never => Type::Never,
            TypeNode::Void => Type::Void,
            TypeNode::Undefined => Type::Undefined,
            TypeNode::Null => Type::Null,
            TypeNode::Number => Type::Number,
            TypeNode::String => Type::String,
            TypeNode::Boolean => Type::Boolean,
            TypeNode::Object | TypeNode::Symbol => Type::Object(Rc::new(Vec::new())),
            TypeNode::StringLiteral(value) => Type::StringLiteral(value.clone()),
            TypeNode::NumberLiteral(value) => Type::NumberLiteral(*value),
            TypeNode::BooleanLiteral(value) => Type::BooleanLiteral(*value),
            TypeNode::Array(element) => Type::Array(Box::new(convert(element.as_ref()))),
            TypeNode::Tuple(elements) => Type::Tuple(elements.iter().map(convert).collect()),
            TypeNode::Union(members) => Type::union(members.iter().map(convert).collect()),
            TypeNode::Intersection(members) => {
                let mut fields = Vec::new();
                for member in members {
                    match convert(member) {
                        Type::Object(inner) => fields.extend(inner.iter().cloned()),
                        other if fields.is_empty() => return other,
                        _ => {}
                    }
                }
                Type::Object(Rc::new(fields))
            }
            TypeNode::Function(function) => {
                Type::function(self.function_type_from_node(function, no_self))
            }
            TypeNode::TypeLiteral(members) => {
                if let [TypeMember {
                    kind: TypeMemberKind::Call(signature),
                    ..
                }] = members.as_slice()
                {
                    return Type::function(self.function_type_from_node(signature, no_self));
                }
                let fields = members
                    .iter()
                    .filter_map(|member| match &member.kind {
                        TypeMemberKind::Property { type_node, .. } => Some((
                            member.name.clone(),
                            type_node.as_ref().map(&convert).unwrap_or(Type::Any),
                        )),
                        TypeMemberKind::Method(function) => Some((
                            member.name.clone(),
                            Type::function(self.function_type_from_node(function, no_self)),
                        )),
                        TypeMemberKind::Call(_) => None,
                    })
                    .collect();
                Type::Object(Rc::new(fields))
            }
            TypeNode::TypeQuery(name) => match self.bindings.globals.get(name) {
                Some(symbol) => self.type_of_symbol(*symbol),
                None => Type::Any,
            },
            TypeNode::Reference { name, arguments } => {
                let arguments: Vec<Type> = arguments.iter().map(convert).collect();
                self.reference_type(name, arguments, no_self, depth)
            }
        }
    }

    fn reference_type(&self, name: &str, arguments: Vec<Type>, no_self: bool, depth: usize) -> Type {
        let first = || arguments.first().cloned().unwrap_or(Type::Any);
        match name {
            "Array" | "ReadonlyArray" => return Type::Array(Box::new(first())),
            "LuaMultiReturn" | "MultiReturn" | "Partial" | "Readonly" | "Required"
            | "NonNullable" => return first(),
            "String" => return Type::String,
            "Number" => return Type::Number,
            "Boolean" => return Type::Boolean,
            "Function" | "Record" | "const" => return Type::Any,
            "Promise" | "PromiseLike" => return Type::Named("Promise".into(), arguments),
            "Map" | "ReadonlyMap" | "WeakMap" => return Type::Named("Map".into(), arguments),
            "Set" | "ReadonlySet" | "WeakSet" => return Type::Named("Set".into(), arguments),
            "Error" | "TypeError" | "RangeError" => return Type::Named("Error".into(), arguments),
            "Iterable" | "IterableIterator" | "Iterator" | "Generator" => {
                return Type::Named(name.to_string(), arguments);
            }
            _ => {}
        }
        let simple = name.rsplit('.').next().unwrap_or(name);
        let Some(symbol) = self.bindings.type_names.get(simple).copied() else {
            return Type::Any;
        };
        match self.declaration(symbol) {
            Declaration::Class(_) => Type::Instance(symbol),
            Declaration::Interface(_) => Type::Interface(symbol),
            Declaration::Enum(declaration) => {
                let all_strings = self
                    .enum_values(declaration)
                    .iter()
                    .all(|(_, value)| matches!(value, Some(EnumValue::String(_))));
                if all_strings && !declaration.members.is_empty() {
                    Type::String
                } else {
                    Type::Number
                }
            }
            Declaration::TypeAlias(alias) => {
                self.type_from_node_depth(&alias.value, no_self, depth + 1)
            }
            _ => Type::Any,
        }
    }
}

fn explicit_context(this: &ThisParameter) -> ContextType {
    match &this.type_annotation {
        Some(TypeNode::Void) => ContextType::Void,
        _ => ContextType::NonVoid,
    }
}

/// First `return <value>` in a body, not looking into nested functions.
fn first_return(statements: &[Statement]) -> Option<&Expression> {
    statements.iter().find_map(|statement| match &statement.kind {
        StatementKind::Return(value) => value.as_ref(),
        StatementKind::Block(inner) => first_return(inner),
        StatementKind::If(statement) => {
            first_return(std::slice::from_ref(statement.then_branch.as_ref())).or_else(|| {
                statement
                    .else_branch
                    .as_deref()
                    .and_then(|branch| first_return(std::slice::from_ref(branch)))
            })
        }
        StatementKind::While(statement) | StatementKind::DoWhile(statement) => {
            first_return(std::slice::from_ref(statement.body.as_ref()))
        }
        StatementKind::For(statement) => first_return(std::slice::from_ref(statement.body.as_ref())),
        StatementKind::ForOf(statement) | StatementKind::ForIn(statement) => {
            first_return(std::slice::from_ref(statement.body.as_ref()))
        }
        StatementKind::Try(statement) => first_return(std::slice::from_ref(statement.block.as_ref())),
        StatementKind::Switch(statement) => statement
            .clauses
            .iter()
            .find_map(|clause| first_return(&clause.statements)),
        StatementKind::Labeled(labeled) => first_return(std::slice::from_ref(labeled.body.as_ref())),
        _ => None,
    })
}

fn evaluate_constant(
    expression: &Expression,
    enum_name: &str,
    previous: &[(String, Option<EnumValue>)],
) -> Option<EnumValue> {
    let lookup = |name: &str| {
        previous
            .iter()
            .find(|(member, _)| member == name)
            .and_then(|(_, value)| value.clone())
    };
    match &expression.kind {
        ExpressionKind::Number(value) => Some(EnumValue::Number(*value)),
        ExpressionKind::String(value) => Some(EnumValue::String(value.clone())),
        ExpressionKind::Template(template) if template.expressions.is_empty() => {
            Some(EnumValue::String(template.quasis.concat()))
        }
        ExpressionKind::Parenthesized(inner) => evaluate_constant(inner, enum_name, previous),
        ExpressionKind::Identifier(name) => lookup(name),
        ExpressionKind::PropertyAccess(access)
            if access.object.as_identifier() == Some(enum_name) =>
        {
            lookup(&access.name.name)
        }
        ExpressionKind::Unary(unary) => {
            let EnumValue::Number(value) = evaluate_constant(&unary.operand, enum_name, previous)?
            else {
                return None;
            };
            match unary.operator {
                UnaryOperator::Minus => Some(EnumValue::Number(-value)),
                UnaryOperator::Plus => Some(EnumValue::Number(value)),
                UnaryOperator::BitwiseNot => Some(EnumValue::Number(!(value as i32) as f64)),
                _ => None,
            }
        }
        ExpressionKind::Binary(binary) => {
            let left = evaluate_constant(&binary.left, enum_name, previous)?;
            let right = evaluate_constant(&binary.right, enum_name, previous)?;
            match (left, right) {
                (EnumValue::Number(left), EnumValue::Number(right)) => {
                    let (l, r) = (left as i32, right as i32);
                    let value = match binary.operator {
                        BinaryOperator::Add => left + right,
                        BinaryOperator::Sub => left - right,
                        BinaryOperator::Mul => left * right,
                        BinaryOperator::Div => left / right,
                        BinaryOperator::Mod => left % right,
                        BinaryOperator::Pow => left.powf(right),
                        BinaryOperator::BitwiseAnd => (l & r) as f64,
                        BinaryOperator::BitwiseOr => (l | r) as f64,
                        BinaryOperator::BitwiseXor => (l ^ r) as f64,
                        BinaryOperator::ShiftLeft => l.wrapping_shl(r as u32) as f64,
                        BinaryOperator::ShiftRight => l.wrapping_shr(r as u32) as f64,
                        BinaryOperator::UnsignedShiftRight => {
                            (l as u32).wrapping_shr(r as u32) as f64
                        }
                        _ => return None,
                    };
                    Some(EnumValue::Number(value))
                }
                (EnumValue::String(left), EnumValue::String(right))
                    if binary.operator == BinaryOperator::Add =>
                {
                    Some(EnumValue::String(left + &right))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn builtin_global_type(name: &str) -> Type {
    match name {
        "Math" | "console" | "JSON" => Type::Named(name.to_string(), Vec::new()),
        "Object" | "Array" | "String" | "Number" | "Boolean" | "Symbol" | "Map" | "Set"
        | "WeakMap" | "WeakSet" | "Promise" | "Error" | "TypeError" | "RangeError" => {
            Type::Named(format!("{}Constructor", name), Vec::new())
        }
        "NaN" | "Infinity" => Type::Number,
        _ => Type::Any,
    }
}

fn builtin_function(returns: Type) -> Type {
    Type::function(FunctionType {
        params: Vec::new(),
        rest: Some(Type::Array(Box::new(Type::Any))),
        returns,
        context: ContextType::Void,
        multi: false,
    })
}

/// Instance method of a runtime library class, called with `:`.
fn builtin_method(returns: Type) -> Type {
    Type::function(FunctionType {
        params: Vec::new(),
        rest: Some(Type::Array(Box::new(Type::Any))),
        returns,
        context: ContextType::NonVoid,
        multi: false,
    })
}

fn array_property_type(array: &Type, name: &str) -> Type {
    let element = array.element_type();
    let same = || Type::Array(Box::new(element.clone()));
    match name {
        "length" => Type::Number,
        "filter" | "slice" | "splice" | "concat" | "reverse" | "sort" | "fill" => {
            builtin_function(same())
        }
        "map" | "flat" | "flatMap" => builtin_function(Type::Array(Box::new(Type::Any))),
        "join" | "toString" => builtin_function(Type::String),
        "indexOf" | "lastIndexOf" | "findIndex" | "push" | "unshift" => {
            builtin_function(Type::Number)
        }
        "includes" | "some" | "every" => builtin_function(Type::Boolean),
        "find" | "pop" | "shift" | "at" => {
            builtin_function(Type::union(vec![element.clone(), Type::Undefined]))
        }
        "forEach" => builtin_function(Type::Void),
        "entries" | "keys" | "values" => {
            builtin_function(Type::Named("IterableIterator".into(), vec![Type::Any]))
        }
        _ => Type::Any,
    }
}

fn string_property_type(name: &str) -> Type {
    match name {
        "length" => Type::Number,
        "charAt" | "substring" | "substr" | "slice" | "toUpperCase" | "toLowerCase" | "trim"
        | "trimStart" | "trimEnd" | "padStart" | "padEnd" | "repeat" | "replace"
        | "replaceAll" | "concat" | "toString" => builtin_function(Type::String),
        "split" => builtin_function(Type::Array(Box::new(Type::String))),
        "indexOf" | "lastIndexOf" | "charCodeAt" | "codePointAt" | "search" => {
            builtin_function(Type::Number)
        }
        "includes" | "startsWith" | "endsWith" => builtin_function(Type::Boolean),
        _ => Type::Any,
    }
}

fn named_property_type(named: &str, arguments: &[Type], name: &str) -> Type {
    let argument = |index: usize| arguments.get(index).cloned().unwrap_or(Type::Any);
    match (named, name) {
        ("Map" | "Set", "size") => Type::Number,
        ("Map", "get") => builtin_method(Type::union(vec![argument(1), Type::Undefined])),
        ("Map" | "Set", "has" | "delete") => builtin_method(Type::Boolean),
        ("Map", "set") | ("Set", "add") => {
            builtin_method(Type::Named(named.to_string(), arguments.to_vec()))
        }
        ("Map" | "Set", "forEach" | "clear") => builtin_method(Type::Void),
        ("Map" | "Set", "keys" | "values" | "entries") => {
            builtin_method(Type::Array(Box::new(Type::Any)))
        }
        ("Promise", "then" | "catch" | "finally") => {
            builtin_method(Type::Named("Promise".into(), vec![Type::Any]))
        }
        ("Generator" | "IterableIterator" | "Iterator", "next") => builtin_method(Type::Any),
        ("Error", "toString") => builtin_method(Type::String),
        ("Error", "message" | "name" | "stack") => Type::String,
        ("Math", "PI" | "E" | "LN2" | "LN10" | "LOG2E" | "LOG10E" | "SQRT1_2" | "SQRT2") => {
            Type::Number
        }
        ("Math", _) => builtin_function(Type::Number),
        ("console", _) => builtin_function(Type::Void),
        ("ObjectConstructor", "keys") => builtin_function(Type::Array(Box::new(Type::String))),
        ("ObjectConstructor", "values" | "entries") => {
            builtin_function(Type::Array(Box::new(Type::Any)))
        }
        ("ArrayConstructor", "isArray") => builtin_function(Type::Boolean),
        ("ArrayConstructor", "from" | "of") => builtin_function(Type::Array(Box::new(Type::Any))),
        ("NumberConstructor", "isNaN" | "isFinite" | "isInteger" | "isSafeInteger") => {
            builtin_function(Type::Boolean)
        }
        ("NumberConstructor", "parseFloat" | "parseInt") => builtin_function(Type::Number),
        ("NumberConstructor", _) => Type::Number,
        ("StringConstructor", "fromCharCode") => builtin_function(Type::String),
        ("PromiseConstructor", _) => {
            builtin_function(Type::Named("Promise".into(), vec![Type::Any]))
        }
        _ => Type::Any,
    }
}
