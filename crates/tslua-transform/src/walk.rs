//! Reference pre-pass.
//!
//! Before a block is lowered, its statements are walked once to find every
//! identifier reference. Hoisting decisions and the rest-parameter spread
//! check are made from this list.

use rhizome_tslua_syntax_typescript::{
    Checker, ClassDeclaration, ClassMemberKind, Expression, ExpressionKind, ExportDeclaration,
    ForBinding, ForInitializer, Function, FunctionBody, NodeId, ObjectMemberKind, Pattern,
    PatternKind, PropertyName, PropertyNameKind, Span, Statement, StatementKind, SymbolId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reference {
    pub symbol: SymbolId,
    pub span: Span,
    /// Innermost function the reference appears in.
    pub function: Option<NodeId>,
    /// Operand of a spread element.
    pub in_spread: bool,
}

pub(crate) fn collect_references(checker: &Checker<'_>, statements: &[Statement]) -> Vec<Reference> {
    let mut collector = Collector {
        checker,
        functions: Vec::new(),
        references: Vec::new(),
    };
    for statement in statements {
        collector.statement(statement);
    }
    collector.references
}

/// References made anywhere inside `function`, including its parameters.
pub(crate) fn collect_function_references(
    checker: &Checker<'_>,
    function: &Function,
) -> Vec<Reference> {
    let mut collector = Collector {
        checker,
        functions: Vec::new(),
        references: Vec::new(),
    };
    collector.function(function);
    collector.references
}

struct Collector<'c, 'a> {
    checker: &'c Checker<'a>,
    functions: Vec<NodeId>,
    references: Vec<Reference>,
}

impl Collector<'_, '_> {
    fn record(&mut self, node: NodeId, span: Span, in_spread: bool) {
        if let Some(symbol) = self.checker.symbol_of(node) {
            self.references.push(Reference {
                symbol,
                span,
                function: self.functions.last().copied(),
                in_spread,
            });
        }
    }

    fn statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn statement(&mut self, statement: &Statement) {
        match &statement.kind {
            StatementKind::Variable(variable) => {
                for declarator in &variable.declarations {
                    self.binding(&declarator.name);
                    if let Some(initializer) = &declarator.initializer {
                        self.expression(initializer);
                    }
                }
            }
            StatementKind::Function(declaration) => self.function(&declaration.function),
            StatementKind::Class(class) => self.class(class),
            StatementKind::Enum(declaration) => {
                for member in &declaration.members {
                    if let Some(initializer) = &member.initializer {
                        self.expression(initializer);
                    }
                }
            }
            StatementKind::Namespace(namespace) => self.statements(&namespace.body),
            StatementKind::Export(export) => match export {
                ExportDeclaration::Named {
                    specifiers,
                    source: None,
                } => {
                    for specifier in specifiers {
                        self.expression(&specifier.local);
                    }
                }
                ExportDeclaration::Default(expression)
                | ExportDeclaration::Assignment(expression) => self.expression(expression),
                _ => {}
            },
            StatementKind::Expression(expression) | StatementKind::Throw(expression) => {
                self.expression(expression)
            }
            StatementKind::Return(Some(value)) => self.expression(value),
            StatementKind::If(statement) => {
                self.expression(&statement.condition);
                self.statement(&statement.then_branch);
                if let Some(else_branch) = &statement.else_branch {
                    self.statement(else_branch);
                }
            }
            StatementKind::While(statement) | StatementKind::DoWhile(statement) => {
                self.expression(&statement.condition);
                self.statement(&statement.body);
            }
            StatementKind::For(statement) => {
                match &statement.initializer {
                    Some(ForInitializer::Variable(variable)) => {
                        for declarator in &variable.declarations {
                            self.binding(&declarator.name);
                            if let Some(initializer) = &declarator.initializer {
                                self.expression(initializer);
                            }
                        }
                    }
                    Some(ForInitializer::Expression(expression)) => self.expression(expression),
                    None => {}
                }
                if let Some(condition) = &statement.condition {
                    self.expression(condition);
                }
                if let Some(incrementor) = &statement.incrementor {
                    self.expression(incrementor);
                }
                self.statement(&statement.body);
            }
            StatementKind::ForOf(statement) | StatementKind::ForIn(statement) => {
                self.expression(&statement.expression);
                match &statement.binding {
                    ForBinding::Declaration(_, pattern) => self.binding(pattern),
                    ForBinding::Target(pattern) => self.target(pattern),
                }
                self.statement(&statement.body);
            }
            StatementKind::Try(statement) => {
                self.statement(&statement.block);
                if let Some(catch) = &statement.catch_clause {
                    self.statement(&catch.block);
                }
                if let Some(finally) = &statement.finally_block {
                    self.statement(finally);
                }
            }
            StatementKind::Switch(statement) => {
                self.expression(&statement.expression);
                for clause in &statement.clauses {
                    if let Some(test) = &clause.test {
                        self.expression(test);
                    }
                    self.statements(&clause.statements);
                }
            }
            StatementKind::Block(statements) => self.statements(statements),
            StatementKind::Labeled(labeled) => self.statement(&labeled.body),
            _ => {}
        }
    }

    fn function(&mut self, function: &Function) {
        self.functions.push(function.id);
        for parameter in &function.params {
            self.binding(&parameter.pattern);
            if let Some(default) = &parameter.default {
                self.expression(default);
            }
        }
        match &function.body {
            Some(FunctionBody::Block(statements)) => self.statements(statements),
            Some(FunctionBody::Expression(expression)) => self.expression(expression),
            None => {}
        }
        self.functions.pop();
    }

    fn class(&mut self, class: &ClassDeclaration) {
        if let Some(extends) = &class.extends {
            self.expression(extends);
        }
        for member in &class.members {
            match &member.kind {
                ClassMemberKind::Constructor(function) => self.function(function),
                ClassMemberKind::Method { name, function }
                | ClassMemberKind::Getter { name, function }
                | ClassMemberKind::Setter { name, function } => {
                    self.property_name(name);
                    self.function(function);
                }
                ClassMemberKind::Property {
                    name, initializer, ..
                } => {
                    self.property_name(name);
                    if let Some(initializer) = initializer {
                        self.expression(initializer);
                    }
                }
            }
        }
    }

    fn property_name(&mut self, name: &PropertyName) {
        if let PropertyNameKind::Computed(expression) = &name.kind {
            self.expression(expression);
        }
    }

    fn expression(&mut self, expression: &Expression) {
        match &expression.kind {
            ExpressionKind::Identifier(_) => self.record(expression.id, expression.span, false),
            ExpressionKind::Spread(inner) => match &inner.skip_outer().kind {
                ExpressionKind::Identifier(_) => {
                    let inner = inner.skip_outer();
                    self.record(inner.id, inner.span, true);
                }
                _ => self.expression(inner),
            },
            ExpressionKind::Template(template) => {
                for expression in &template.expressions {
                    self.expression(expression);
                }
            }
            ExpressionKind::Array(elements) | ExpressionKind::Sequence(elements) => {
                for element in elements {
                    self.expression(element);
                }
            }
            ExpressionKind::Object(members) => {
                for member in members {
                    match &member.kind {
                        ObjectMemberKind::Property { key, value } => {
                            self.property_name(key);
                            self.expression(value);
                        }
                        ObjectMemberKind::Shorthand(value) | ObjectMemberKind::Spread(value) => {
                            self.expression(value)
                        }
                        ObjectMemberKind::Method { key, function }
                        | ObjectMemberKind::Accessor { key, function } => {
                            self.property_name(key);
                            self.function(function);
                        }
                    }
                }
            }
            ExpressionKind::Function(function) => self.function(function),
            ExpressionKind::Class(class) => self.class(class),
            ExpressionKind::Call(call) => {
                self.expression(&call.callee);
                for argument in &call.arguments {
                    self.expression(argument);
                }
            }
            ExpressionKind::New(new) => {
                self.expression(&new.callee);
                for argument in &new.arguments {
                    self.expression(argument);
                }
            }
            ExpressionKind::PropertyAccess(access) => self.expression(&access.object),
            ExpressionKind::ElementAccess(access) => {
                self.expression(&access.object);
                self.expression(&access.index);
            }
            ExpressionKind::Assignment(assignment) => {
                self.target(&assignment.left);
                self.expression(&assignment.right);
            }
            ExpressionKind::CompoundAssignment(assignment) => {
                self.expression(&assignment.left);
                self.expression(&assignment.right);
            }
            ExpressionKind::Binary(binary) => {
                self.expression(&binary.left);
                self.expression(&binary.right);
            }
            ExpressionKind::Unary(unary) => self.expression(&unary.operand),
            ExpressionKind::Update(update) => self.expression(&update.operand),
            ExpressionKind::Conditional(conditional) => {
                self.expression(&conditional.condition);
                self.expression(&conditional.when_true);
                self.expression(&conditional.when_false);
            }
            ExpressionKind::Parenthesized(inner)
            | ExpressionKind::Assertion(inner, _)
            | ExpressionKind::Await(inner) => self.expression(inner),
            ExpressionKind::Yield(Some(value)) => self.expression(value),
            _ => {}
        }
    }

    /// Declared names are not references; defaults and computed keys are walked.
    fn binding(&mut self, pattern: &Pattern) {
        match &pattern.kind {
            PatternKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    self.binding(&element.target);
                    if let Some(default) = &element.default {
                        self.expression(default);
                    }
                }
            }
            PatternKind::Object(properties) => {
                for property in properties {
                    if let Some(key) = &property.key {
                        self.property_name(key);
                    }
                    self.binding(&property.target);
                    if let Some(default) = &property.default {
                        self.expression(default);
                    }
                }
            }
            PatternKind::Identifier(_) | PatternKind::Expression(_) => {}
        }
    }

    fn target(&mut self, pattern: &Pattern) {
        match &pattern.kind {
            PatternKind::Identifier(_) => self.record(pattern.id, pattern.span, false),
            PatternKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    self.target(&element.target);
                    if let Some(default) = &element.default {
                        self.expression(default);
                    }
                }
            }
            PatternKind::Object(properties) => {
                for property in properties {
                    if let Some(key) = &property.key {
                        self.property_name(key);
                    }
                    self.target(&property.target);
                    if let Some(default) = &property.default {
                        self.expression(default);
                    }
                }
            }
            PatternKind::Expression(expression) => self.expression(expression),
        }
    }
}
