//! Scope binding: declares symbols and resolves identifier references.

use std::collections::{HashMap, HashSet};

use crate::ast::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable(VariableKind),
    Parameter,
    CatchParameter,
    Function,
    Class,
    Enum,
    ConstEnum,
    Interface,
    TypeAlias,
    Namespace,
    Import,
}

/// Where a symbol was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    File,
    /// The embedded Lua prelude.
    Prelude,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Span of the declaring name.
    pub span: Span,
    /// Node id of the declaring name. Only meaningful for [`Origin::File`].
    pub declaration: NodeId,
    pub origin: Origin,
    pub exported: bool,
    /// Declared with `declare` or in the prelude; the name cannot be changed.
    pub ambient: bool,
    /// Declared where `@noSelf` applies.
    pub no_self: bool,
}

impl Symbol {
    pub fn is_value(&self) -> bool {
        !matches!(self.kind, SymbolKind::Interface | SymbolKind::TypeAlias)
    }
}

/// Step from a destructured root value to a bound name.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PathStep {
    Index(usize),
    Rest(usize),
    Property(String),
    ObjectRest,
}

/// Which export of a module an import binding reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportedName<'a> {
    Default,
    Namespace,
    Named(&'a str),
}

#[derive(Debug, Clone)]
pub(crate) enum Declaration<'a> {
    Variable {
        declarator: &'a VariableDeclarator,
        path: Vec<PathStep>,
    },
    ForBinding {
        statement: &'a ForOfStatement,
        is_for_in: bool,
        path: Vec<PathStep>,
    },
    Parameter {
        function: &'a Function,
        index: usize,
        path: Vec<PathStep>,
    },
    CatchParameter,
    Function(&'a FunctionDeclaration),
    Class(&'a ClassDeclaration),
    Enum(&'a EnumDeclaration),
    Interface(&'a InterfaceDeclaration),
    TypeAlias(&'a TypeAliasDeclaration),
    Namespace(&'a NamespaceDeclaration),
    Import {
        source: &'a str,
        imported: ImportedName<'a>,
    },
}

/// Receiver that `this` refers to inside class members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThisBinding {
    pub class: SymbolId,
    pub is_static: bool,
}

/// Position a function expression appears in, for contextual typing.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CallbackSite<'a> {
    Argument {
        callee: &'a Expression,
        index: usize,
        is_new: bool,
    },
    Declared(&'a TypeNode),
}

#[derive(Debug, Default)]
pub(crate) struct Bindings<'a> {
    pub symbols: Vec<Symbol>,
    pub declarations: Vec<Declaration<'a>>,
    pub resolved: HashMap<NodeId, SymbolId>,
    pub this_bindings: HashMap<NodeId, ThisBinding>,
    pub references: HashMap<SymbolId, Vec<NodeId>>,
    pub reference_spans: HashMap<NodeId, Span>,
    pub assigned: HashSet<SymbolId>,
    pub type_names: HashMap<String, SymbolId>,
    pub globals: HashMap<String, SymbolId>,
    pub namespace_members: HashMap<SymbolId, HashMap<String, SymbolId>>,
    /// Exported namespace member to its namespace.
    pub member_namespaces: HashMap<SymbolId, SymbolId>,
    pub methods: HashSet<NodeId>,
    pub no_self_functions: HashSet<NodeId>,
    pub class_symbols: HashMap<NodeId, SymbolId>,
    pub callback_sites: HashMap<NodeId, CallbackSite<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Global,
    File,
    Function,
    Block,
    Namespace,
}

#[derive(Debug)]
struct Scope {
    parent: Option<usize>,
    kind: ScopeKind,
    values: HashMap<String, SymbolId>,
    types: HashMap<String, SymbolId>,
}

pub(crate) struct Binder<'a> {
    bindings: Bindings<'a>,
    scopes: Vec<Scope>,
    current: usize,
    origin: Origin,
    no_self: bool,
    this_stack: Vec<Option<ThisBinding>>,
}

struct DeclareInfo {
    kind: SymbolKind,
    exported: bool,
    ambient: bool,
    no_self: bool,
}

impl<'a> Binder<'a> {
    pub fn bind(file: &'a SourceFile, prelude: &'a SourceFile) -> Bindings<'a> {
        let mut binder = Binder {
            bindings: Bindings::default(),
            scopes: vec![Scope {
                parent: None,
                kind: ScopeKind::Global,
                values: HashMap::new(),
                types: HashMap::new(),
            }],
            current: 0,
            origin: Origin::Prelude,
            no_self: has_annotation(&prelude.annotations, AnnotationKind::NoSelfInFile),
            this_stack: Vec::new(),
        };
        binder.predeclare(&prelude.statements, 0);
        binder.predeclare_ambient_namespaces(&prelude.statements);
        binder.bindings.globals = binder.scopes[0].values.clone();

        binder.origin = Origin::File;
        binder.no_self = has_annotation(&file.annotations, AnnotationKind::NoSelfInFile);
        binder.current = binder.push_scope(ScopeKind::File);
        binder.walk_statements(&file.statements);
        binder.bindings
    }

    fn push_scope(&mut self, kind: ScopeKind) -> usize {
        self.scopes.push(Scope {
            parent: Some(self.current),
            kind,
            values: HashMap::new(),
            types: HashMap::new(),
        });
        self.current = self.scopes.len() - 1;
        self.current
    }

    fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    fn function_scope(&self, mut scope: usize) -> usize {
        loop {
            let data = &self.scopes[scope];
            match (data.kind, data.parent) {
                (ScopeKind::Block, Some(parent)) => scope = parent,
                _ => return scope,
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<SymbolId> {
        let mut scope = Some(self.current);
        while let Some(index) = scope {
            if let Some(symbol) = self.scopes[index].values.get(name) {
                return Some(*symbol);
            }
            scope = self.scopes[index].parent;
        }
        None
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn declare(
        &mut self,
        name: &str,
        span: Span,
        node: NodeId,
        declaration: Declaration<'a>,
        info: DeclareInfo,
        scope: usize,
    ) -> SymbolId {
        let is_type = matches!(info.kind, SymbolKind::Interface | SymbolKind::TypeAlias);
        let existing = if is_type {
            self.scopes[scope].types.get(name).copied()
        } else {
            self.scopes[scope].values.get(name).copied()
        };
        if let Some(existing) = existing {
            let symbol = &self.bindings.symbols[existing.0 as usize];
            let mergeable = symbol.kind == info.kind
                && matches!(
                    info.kind,
                    SymbolKind::Function
                        | SymbolKind::Namespace
                        | SymbolKind::Enum
                        | SymbolKind::Interface
                );
            if mergeable {
                let implements_overload = matches!(
                    (&declaration, &self.bindings.declarations[existing.0 as usize]),
                    (Declaration::Function(new), Declaration::Function(old))
                        if old.function.body.is_none() && new.function.body.is_some()
                );
                if implements_overload {
                    self.bindings.declarations[existing.0 as usize] = declaration;
                }
                if self.origin == Origin::File {
                    self.bindings.resolved.insert(node, existing);
                }
                return existing;
            }
        }

        let id = SymbolId(self.bindings.symbols.len() as u32);
        self.bindings.symbols.push(Symbol {
            id,
            name: name.to_string(),
            kind: info.kind,
            span,
            declaration: node,
            origin: self.origin,
            exported: info.exported,
            ambient: info.ambient || self.origin == Origin::Prelude,
            no_self: info.no_self || self.no_self,
        });
        self.bindings.declarations.push(declaration);
        if self.origin == Origin::File {
            self.bindings.resolved.insert(node, id);
        }

        let declares_type = matches!(
            info.kind,
            SymbolKind::Class
                | SymbolKind::Enum
                | SymbolKind::ConstEnum
                | SymbolKind::Interface
                | SymbolKind::TypeAlias
        );
        if declares_type {
            self.scopes[scope].types.insert(name.to_string(), id);
            self.bindings.type_names.insert(name.to_string(), id);
        }
        if !is_type {
            self.scopes[scope].values.insert(name.to_string(), id);
        }
        id
    }

    fn declare_pattern(
        &mut self,
        pattern: &'a Pattern,
        path: Vec<PathStep>,
        make: &dyn Fn(Vec<PathStep>) -> Declaration<'a>,
        kind: SymbolKind,
        modifiers: Modifiers,
        scope: usize,
    ) {
        match &pattern.kind {
            PatternKind::Identifier(name) => {
                let info = DeclareInfo {
                    kind,
                    exported: modifiers.export,
                    ambient: modifiers.declare,
                    no_self: false,
                };
                self.declare(name, pattern.span, pattern.id, make(path), info, scope);
            }
            PatternKind::Array(elements) => {
                for (index, element) in elements.iter().enumerate() {
                    let Some(element) = element else {
                        continue;
                    };
                    let mut step = path.clone();
                    step.push(if element.rest {
                        PathStep::Rest(index)
                    } else {
                        PathStep::Index(index)
                    });
                    self.declare_pattern(&element.target, step, make, kind, modifiers, scope);
                }
            }
            PatternKind::Object(properties) => {
                for property in properties {
                    let mut step = path.clone();
                    match property.key.as_ref().and_then(PropertyName::text) {
                        Some(key) => step.push(PathStep::Property(key)),
                        None if property.key.is_none() => step.push(PathStep::ObjectRest),
                        None => step.push(PathStep::Property(String::new())),
                    }
                    self.declare_pattern(&property.target, step, make, kind, modifiers, scope);
                }
            }
            PatternKind::Expression(_) => {}
        }
    }

    /// Declare every name a statement list introduces before walking it.
    fn predeclare(&mut self, statements: &'a [Statement], scope: usize) {
        for statement in statements {
            self.predeclare_statement(statement, scope);
        }
    }

    fn predeclare_statement(&mut self, statement: &'a Statement, scope: usize) {
        match &statement.kind {
            StatementKind::Variable(variable) => self.predeclare_variable(variable, scope),
            StatementKind::Function(declaration) => {
                if let Some(name) = &declaration.name {
                    let info = DeclareInfo {
                        kind: SymbolKind::Function,
                        exported: declaration.modifiers.export,
                        ambient: declaration.modifiers.declare,
                        no_self: has_annotation(&declaration.annotations, AnnotationKind::NoSelf),
                    };
                    self.declare(
                        &name.name,
                        name.span,
                        name.id,
                        Declaration::Function(declaration),
                        info,
                        scope,
                    );
                }
            }
            StatementKind::Class(class) => {
                if let Some(name) = &class.name {
                    let info = DeclareInfo {
                        kind: SymbolKind::Class,
                        exported: class.modifiers.export,
                        ambient: class.modifiers.declare,
                        no_self: has_annotation(&class.annotations, AnnotationKind::NoSelf),
                    };
                    let symbol = self.declare(
                        &name.name,
                        name.span,
                        name.id,
                        Declaration::Class(class),
                        info,
                        scope,
                    );
                    self.bindings.class_symbols.insert(class.id, symbol);
                }
            }
            StatementKind::Enum(declaration) => {
                let kind = if declaration.is_const
                    || has_annotation(&declaration.annotations, AnnotationKind::CompileMembersOnly)
                {
                    SymbolKind::ConstEnum
                } else {
                    SymbolKind::Enum
                };
                let info = DeclareInfo {
                    kind,
                    exported: declaration.modifiers.export,
                    ambient: declaration.modifiers.declare,
                    no_self: false,
                };
                let name = &declaration.name;
                self.declare(
                    &name.name,
                    name.span,
                    name.id,
                    Declaration::Enum(declaration),
                    info,
                    scope,
                );
            }
            StatementKind::Interface(declaration) => {
                let info = DeclareInfo {
                    kind: SymbolKind::Interface,
                    exported: declaration.modifiers.export,
                    ambient: true,
                    no_self: has_annotation(&declaration.annotations, AnnotationKind::NoSelf),
                };
                let name = &declaration.name;
                self.declare(
                    &name.name,
                    name.span,
                    name.id,
                    Declaration::Interface(declaration),
                    info,
                    scope,
                );
            }
            StatementKind::TypeAlias(declaration) => {
                let info = DeclareInfo {
                    kind: SymbolKind::TypeAlias,
                    exported: declaration.modifiers.export,
                    ambient: true,
                    no_self: false,
                };
                let name = &declaration.name;
                self.declare(
                    &name.name,
                    name.span,
                    name.id,
                    Declaration::TypeAlias(declaration),
                    info,
                    scope,
                );
            }
            StatementKind::Namespace(declaration) => {
                let info = DeclareInfo {
                    kind: SymbolKind::Namespace,
                    exported: declaration.modifiers.export,
                    ambient: declaration.modifiers.declare,
                    no_self: has_annotation(&declaration.annotations, AnnotationKind::NoSelf),
                };
                let name = &declaration.name;
                self.declare(
                    &name.name,
                    name.span,
                    name.id,
                    Declaration::Namespace(declaration),
                    info,
                    scope,
                );
            }
            StatementKind::Import(import) if !import.type_only => {
                let mut locals: Vec<(&'a Ident, ImportedName<'a>)> = Vec::new();
                if let Some(default) = &import.default {
                    locals.push((default, ImportedName::Default));
                }
                if let Some(namespace) = &import.namespace {
                    locals.push((namespace, ImportedName::Namespace));
                }
                for specifier in &import.named {
                    locals.push((&specifier.local, ImportedName::Named(&specifier.imported)));
                }
                for (local, imported) in locals {
                    let info = DeclareInfo {
                        kind: SymbolKind::Import,
                        exported: false,
                        ambient: false,
                        no_self: false,
                    };
                    self.declare(
                        &local.name,
                        local.span,
                        local.id,
                        Declaration::Import {
                            source: &import.source,
                            imported,
                        },
                        info,
                        scope,
                    );
                }
            }
            _ => {}
        }
    }

    fn predeclare_variable(&mut self, variable: &'a VariableStatement, scope: usize) {
        let target = if variable.kind == VariableKind::Var {
            self.function_scope(scope)
        } else {
            scope
        };
        for declarator in &variable.declarations {
            let make = |path: Vec<PathStep>| Declaration::Variable { declarator, path };
            self.declare_pattern(
                &declarator.name,
                Vec::new(),
                &make,
                SymbolKind::Variable(variable.kind),
                variable.modifiers,
                target,
            );
        }
    }

    /// Give prelude namespaces member tables so `string.sub` resolves.
    fn predeclare_ambient_namespaces(&mut self, statements: &'a [Statement]) {
        for statement in statements {
            let StatementKind::Namespace(namespace) = &statement.kind else {
                continue;
            };
            let Some(symbol) = self.scopes[self.current].values.get(&namespace.name.name).copied()
            else {
                continue;
            };
            let outer = self.current;
            let scope = self.push_scope(ScopeKind::Namespace);
            self.predeclare(&namespace.body, scope);
            self.predeclare_ambient_namespaces(&namespace.body);
            let members = self.scopes[scope].values.clone();
            self.bindings
                .namespace_members
                .entry(symbol)
                .or_default()
                .extend(members);
            self.current = outer;
        }
    }

    // =========================================================================
    // Walking
    // =========================================================================

    fn walk_statements(&mut self, statements: &'a [Statement]) {
        self.predeclare(statements, self.current);
        for statement in statements {
            self.walk_statement(statement);
        }
    }

    fn walk_block(&mut self, statements: &'a [Statement]) {
        self.push_scope(ScopeKind::Block);
        self.walk_statements(statements);
        self.pop_scope();
    }

    fn walk_statement(&mut self, statement: &'a Statement) {
        match &statement.kind {
            StatementKind::Variable(variable) => self.walk_variable(variable),
            StatementKind::Function(declaration) => {
                let no_self = has_annotation(&declaration.annotations, AnnotationKind::NoSelf);
                self.walk_function(&declaration.function, false, no_self, None);
            }
            StatementKind::Class(class) => {
                if let Some(symbol) = self.bindings.class_symbols.get(&class.id).copied() {
                    self.walk_class(class, symbol);
                }
            }
            StatementKind::Enum(declaration) => {
                for member in &declaration.members {
                    if let Some(initializer) = &member.initializer {
                        self.walk_expression(initializer);
                    }
                }
            }
            StatementKind::Namespace(namespace) => self.walk_namespace(namespace),
            StatementKind::Export(export) => match export {
                ExportDeclaration::Named {
                    specifiers,
                    source: None,
                } => {
                    for specifier in specifiers {
                        self.walk_expression(&specifier.local);
                    }
                }
                ExportDeclaration::Default(expression)
                | ExportDeclaration::Assignment(expression) => self.walk_expression(expression),
                _ => {}
            },
            StatementKind::Expression(expression) | StatementKind::Throw(expression) => {
                self.walk_expression(expression)
            }
            StatementKind::Return(value) => {
                if let Some(value) = value {
                    self.walk_expression(value);
                }
            }
            StatementKind::If(statement) => {
                self.walk_expression(&statement.condition);
                self.walk_statement(&statement.then_branch);
                if let Some(else_branch) = &statement.else_branch {
                    self.walk_statement(else_branch);
                }
            }
            StatementKind::While(statement) | StatementKind::DoWhile(statement) => {
                self.walk_expression(&statement.condition);
                self.walk_statement(&statement.body);
            }
            StatementKind::For(statement) => {
                self.push_scope(ScopeKind::Block);
                match &statement.initializer {
                    Some(ForInitializer::Variable(variable)) => {
                        self.predeclare_variable(variable, self.current);
                        self.walk_variable(variable);
                    }
                    Some(ForInitializer::Expression(expression)) => {
                        self.walk_expression(expression)
                    }
                    None => {}
                }
                if let Some(condition) = &statement.condition {
                    self.walk_expression(condition);
                }
                if let Some(incrementor) = &statement.incrementor {
                    self.walk_expression(incrementor);
                }
                self.walk_statement(&statement.body);
                self.pop_scope();
            }
            StatementKind::ForOf(for_of) | StatementKind::ForIn(for_of) => {
                let is_for_in = matches!(statement.kind, StatementKind::ForIn(_));
                self.walk_expression(&for_of.expression);
                self.push_scope(ScopeKind::Block);
                match &for_of.binding {
                    ForBinding::Declaration(kind, pattern) => {
                        let make = |path: Vec<PathStep>| Declaration::ForBinding {
                            statement: for_of,
                            is_for_in,
                            path,
                        };
                        self.declare_pattern(
                            pattern,
                            Vec::new(),
                            &make,
                            SymbolKind::Variable(*kind),
                            Modifiers::default(),
                            self.current,
                        );
                        self.walk_pattern_defaults(pattern);
                    }
                    ForBinding::Target(pattern) => self.walk_assignment_target(pattern),
                }
                self.walk_statement(&for_of.body);
                self.pop_scope();
            }
            StatementKind::Try(statement) => {
                self.walk_statement(&statement.block);
                if let Some(catch) = &statement.catch_clause {
                    self.push_scope(ScopeKind::Block);
                    if let Some(parameter) = &catch.parameter {
                        let make = |_: Vec<PathStep>| Declaration::CatchParameter;
                        self.declare_pattern(
                            parameter,
                            Vec::new(),
                            &make,
                            SymbolKind::CatchParameter,
                            Modifiers::default(),
                            self.current,
                        );
                    }
                    self.walk_statement(&catch.block);
                    self.pop_scope();
                }
                if let Some(finally) = &statement.finally_block {
                    self.walk_statement(finally);
                }
            }
            StatementKind::Switch(statement) => {
                self.walk_expression(&statement.expression);
                self.push_scope(ScopeKind::Block);
                for clause in &statement.clauses {
                    self.predeclare(&clause.statements, self.current);
                }
                for clause in &statement.clauses {
                    if let Some(test) = &clause.test {
                        self.walk_expression(test);
                    }
                    for statement in &clause.statements {
                        self.walk_statement(statement);
                    }
                }
                self.pop_scope();
            }
            StatementKind::Block(statements) => self.walk_block(statements),
            StatementKind::Labeled(labeled) => self.walk_statement(&labeled.body),
            StatementKind::Import(_)
            | StatementKind::Interface(_)
            | StatementKind::TypeAlias(_)
            | StatementKind::Break(_)
            | StatementKind::Continue(_)
            | StatementKind::Empty
            | StatementKind::Unsupported(_) => {}
        }
    }

    fn walk_variable(&mut self, variable: &'a VariableStatement) {
        for declarator in &variable.declarations {
            self.walk_pattern_defaults(&declarator.name);
            if let Some(initializer) = &declarator.initializer {
                if let (Some(type_node), ExpressionKind::Function(function)) = (
                    &declarator.type_annotation,
                    &initializer.skip_outer().kind,
                ) {
                    self.bindings
                        .callback_sites
                        .insert(function.id, CallbackSite::Declared(type_node));
                }
                self.walk_expression(initializer);
            }
        }
    }

    fn walk_namespace(&mut self, namespace: &'a NamespaceDeclaration) {
        let symbol = self.lookup(&namespace.name.name);
        let saved_no_self = self.no_self;
        self.no_self |= has_annotation(&namespace.annotations, AnnotationKind::NoSelf);
        let scope = self.push_scope(ScopeKind::Namespace);
        self.predeclare(&namespace.body, scope);
        if let Some(symbol) = symbol {
            let ambient = namespace.modifiers.declare;
            let members: HashMap<String, SymbolId> = self.scopes[scope]
                .values
                .iter()
                .filter(|(_, id)| ambient || self.bindings.symbols[id.0 as usize].exported)
                .map(|(name, id)| (name.clone(), *id))
                .collect();
            for member in members.values() {
                self.bindings.member_namespaces.insert(*member, symbol);
            }
            self.bindings
                .namespace_members
                .entry(symbol)
                .or_default()
                .extend(members);
        }
        for statement in &namespace.body {
            self.walk_statement(statement);
        }
        self.pop_scope();
        self.no_self = saved_no_self;
    }

    fn walk_function(
        &mut self,
        function: &'a Function,
        method: bool,
        no_self: bool,
        this: Option<ThisBinding>,
    ) {
        if method {
            self.bindings.methods.insert(function.id);
        }
        if no_self || self.no_self {
            self.bindings.no_self_functions.insert(function.id);
        }
        let pushes_this = !function.is_arrow;
        if pushes_this {
            self.this_stack.push(this);
        }
        self.push_scope(ScopeKind::Function);
        let scope = self.current;
        for (index, parameter) in function.params.iter().enumerate() {
            let make = |path: Vec<PathStep>| Declaration::Parameter {
                function,
                index,
                path,
            };
            self.declare_pattern(
                &parameter.pattern,
                Vec::new(),
                &make,
                SymbolKind::Parameter,
                Modifiers::default(),
                scope,
            );
        }
        for parameter in &function.params {
            self.walk_pattern_defaults(&parameter.pattern);
            if let Some(default) = &parameter.default {
                self.walk_expression(default);
            }
        }
        match &function.body {
            Some(FunctionBody::Block(statements)) => self.walk_statements(statements),
            Some(FunctionBody::Expression(expression)) => self.walk_expression(expression),
            None => {}
        }
        self.pop_scope();
        if pushes_this {
            self.this_stack.pop();
        }
    }

    fn walk_class(&mut self, class: &'a ClassDeclaration, symbol: SymbolId) {
        if let Some(extends) = &class.extends {
            self.walk_expression(extends);
        }
        let no_self = has_annotation(&class.annotations, AnnotationKind::NoSelf);
        for member in &class.members {
            let binding = ThisBinding {
                class: symbol,
                is_static: member.is_static,
            };
            match &member.kind {
                ClassMemberKind::Constructor(function) => {
                    self.walk_function(function, true, no_self, Some(binding));
                }
                ClassMemberKind::Method { name, function }
                | ClassMemberKind::Getter { name, function }
                | ClassMemberKind::Setter { name, function } => {
                    self.walk_property_name(name);
                    self.walk_function(function, true, no_self, Some(binding));
                }
                ClassMemberKind::Property {
                    name,
                    type_annotation,
                    initializer,
                } => {
                    self.walk_property_name(name);
                    if let Some(initializer) = initializer {
                        if let (Some(type_node), ExpressionKind::Function(function)) =
                            (type_annotation, &initializer.skip_outer().kind)
                        {
                            self.bindings
                                .callback_sites
                                .insert(function.id, CallbackSite::Declared(type_node));
                        }
                        self.this_stack.push(Some(binding));
                        self.walk_expression(initializer);
                        self.this_stack.pop();
                    }
                }
            }
        }
    }

    fn walk_property_name(&mut self, name: &'a PropertyName) {
        if let PropertyNameKind::Computed(expression) = &name.kind {
            self.walk_expression(expression);
        }
    }

    fn reference(&mut self, node: NodeId, span: Span, name: &str) -> Option<SymbolId> {
        let symbol = self.lookup(name)?;
        self.bindings.resolved.insert(node, symbol);
        self.bindings.references.entry(symbol).or_default().push(node);
        self.bindings.reference_spans.insert(node, span);
        Some(symbol)
    }

    fn walk_expression(&mut self, expression: &'a Expression) {
        match &expression.kind {
            ExpressionKind::Identifier(name) => {
                self.reference(expression.id, expression.span, name);
            }
            ExpressionKind::This => {
                if let Some(Some(binding)) = self.this_stack.last() {
                    self.bindings.this_bindings.insert(expression.id, *binding);
                }
            }
            ExpressionKind::Template(template) => {
                for expression in &template.expressions {
                    self.walk_expression(expression);
                }
            }
            ExpressionKind::Array(elements) | ExpressionKind::Sequence(elements) => {
                for element in elements {
                    self.walk_expression(element);
                }
            }
            ExpressionKind::Object(members) => {
                for member in members {
                    match &member.kind {
                        ObjectMemberKind::Property { key, value } => {
                            self.walk_property_name(key);
                            self.walk_expression(value);
                        }
                        ObjectMemberKind::Shorthand(value) | ObjectMemberKind::Spread(value) => {
                            self.walk_expression(value)
                        }
                        ObjectMemberKind::Method { key, function }
                        | ObjectMemberKind::Accessor { key, function } => {
                            self.walk_property_name(key);
                            self.walk_function(function, true, false, None);
                        }
                    }
                }
            }
            ExpressionKind::Function(function) => self.walk_function(function, false, false, None),
            ExpressionKind::Class(class) => {
                self.push_scope(ScopeKind::Block);
                let name = class.name.as_ref().map(|name| name.name.as_str()).unwrap_or("");
                let (span, node) = match &class.name {
                    Some(name) => (name.span, name.id),
                    None => (class.span, class.id),
                };
                let info = DeclareInfo {
                    kind: SymbolKind::Class,
                    exported: false,
                    ambient: false,
                    no_self: has_annotation(&class.annotations, AnnotationKind::NoSelf),
                };
                let symbol =
                    self.declare(name, span, node, Declaration::Class(class), info, self.current);
                self.bindings.class_symbols.insert(class.id, symbol);
                self.walk_class(class, symbol);
                self.pop_scope();
            }
            ExpressionKind::Call(call) => {
                self.walk_expression(&call.callee);
                self.walk_arguments(&call.callee, &call.arguments, false);
            }
            ExpressionKind::New(new) => {
                self.walk_expression(&new.callee);
                self.walk_arguments(&new.callee, &new.arguments, true);
            }
            ExpressionKind::PropertyAccess(access) => self.walk_expression(&access.object),
            ExpressionKind::ElementAccess(access) => {
                self.walk_expression(&access.object);
                self.walk_expression(&access.index);
            }
            ExpressionKind::Assignment(assignment) => {
                self.walk_assignment_target(&assignment.left);
                self.walk_expression(&assignment.right);
            }
            ExpressionKind::CompoundAssignment(assignment) => {
                self.walk_expression(&assignment.left);
                self.mark_assigned(&assignment.left);
                self.walk_expression(&assignment.right);
            }
            ExpressionKind::Binary(binary) => {
                self.walk_expression(&binary.left);
                self.walk_expression(&binary.right);
            }
            ExpressionKind::Unary(unary) => self.walk_expression(&unary.operand),
            ExpressionKind::Update(update) => {
                self.walk_expression(&update.operand);
                self.mark_assigned(&update.operand);
            }
            ExpressionKind::Conditional(conditional) => {
                self.walk_expression(&conditional.condition);
                self.walk_expression(&conditional.when_true);
                self.walk_expression(&conditional.when_false);
            }
            ExpressionKind::Parenthesized(inner)
            | ExpressionKind::Assertion(inner, _)
            | ExpressionKind::Await(inner)
            | ExpressionKind::Spread(inner) => self.walk_expression(inner),
            ExpressionKind::Yield(value) => {
                if let Some(value) = value {
                    self.walk_expression(value);
                }
            }
            ExpressionKind::Number(_)
            | ExpressionKind::String(_)
            | ExpressionKind::Boolean(_)
            | ExpressionKind::Null
            | ExpressionKind::Undefined
            | ExpressionKind::Super
            | ExpressionKind::Omitted
            | ExpressionKind::Unsupported(_) => {}
        }
    }

    fn walk_arguments(&mut self, callee: &'a Expression, arguments: &'a [Expression], is_new: bool) {
        for (index, argument) in arguments.iter().enumerate() {
            if let ExpressionKind::Function(function) = &argument.skip_outer().kind {
                self.bindings.callback_sites.insert(
                    function.id,
                    CallbackSite::Argument {
                        callee,
                        index,
                        is_new,
                    },
                );
            }
            self.walk_expression(argument);
        }
    }

    fn mark_assigned(&mut self, target: &'a Expression) {
        if let ExpressionKind::Identifier(_) = &target.skip_outer().kind {
            if let Some(symbol) = self.bindings.resolved.get(&target.skip_outer().id) {
                self.bindings.assigned.insert(*symbol);
            }
        }
    }

    fn walk_assignment_target(&mut self, pattern: &'a Pattern) {
        match &pattern.kind {
            PatternKind::Identifier(name) => {
                if let Some(symbol) = self.reference(pattern.id, pattern.span, name) {
                    self.bindings.assigned.insert(symbol);
                }
            }
            PatternKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    self.walk_assignment_target(&element.target);
                    if let Some(default) = &element.default {
                        self.walk_expression(default);
                    }
                }
            }
            PatternKind::Object(properties) => {
                for property in properties {
                    if let Some(key) = &property.key {
                        self.walk_property_name(key);
                    }
                    self.walk_assignment_target(&property.target);
                    if let Some(default) = &property.default {
                        self.walk_expression(default);
                    }
                }
            }
            PatternKind::Expression(expression) => self.walk_expression(expression),
        }
    }

    /// Walk default values and computed keys inside a binding pattern.
    fn walk_pattern_defaults(&mut self, pattern: &'a Pattern) {
        match &pattern.kind {
            PatternKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    if let Some(default) = &element.default {
                        self.walk_expression(default);
                    }
                    self.walk_pattern_defaults(&element.target);
                }
            }
            PatternKind::Object(properties) => {
                for property in properties {
                    if let Some(key) = &property.key {
                        self.walk_property_name(key);
                    }
                    if let Some(default) = &property.default {
                        self.walk_expression(default);
                    }
                    self.walk_pattern_defaults(&property.target);
                }
            }
            PatternKind::Identifier(_) | PatternKind::Expression(_) => {}
        }
    }
}

fn has_annotation(annotations: &[Annotation], kind: AnnotationKind) -> bool {
    find_annotation(annotations, kind).is_some()
}
