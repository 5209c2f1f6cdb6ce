//! Per-file transformation state.
//!
//! The [`TransformationContext`] is the only way visitors recurse into
//! children. It owns the diagnostics sink, the preceding-statement frames,
//! the scope stack, the temp counter and the set of used lualib features.

mod scope;
mod visitors;

use std::collections::{BTreeSet, HashMap, HashSet};

use rhizome_tslua_ast as lua;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{Checker, NodeId, SourceFile, Span, SymbolId, SyntaxKind};

pub use scope::{FunctionDefinition, Scope, ScopeType};
pub use visitors::{ExpressionTransform, StatementTransform, Visitor, VisitorFn, VisitorMap};

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::error::TransformError;
use crate::options::CompilerOptions;
use crate::walk;

/// Class whose members are being lowered, for `super` and static `this`.
#[derive(Debug, Clone)]
pub struct ClassFrame {
    pub symbol: Option<SymbolId>,
    /// How the class table is referred to inside its members.
    pub reference: lua::Expression,
    /// Lowering static field initializers, where `this` is the class table.
    pub static_initializer: bool,
}

pub struct TransformationContext<'a> {
    pub file: &'a SourceFile,
    pub checker: &'a Checker<'a>,
    pub options: &'a CompilerOptions,
    pub is_module: bool,
    visitors: &'a VisitorMap,
    dispatch: Vec<(SyntaxKind, usize)>,
    preceding: Vec<Vec<lua::Statement>>,
    scopes: Vec<Scope>,
    next_scope_id: usize,
    classes: Vec<ClassFrame>,
    diagnostics: Vec<Diagnostic>,
    used_features: BTreeSet<LuaLibFeature>,
    temp_counter: u32,
    /// Local table name of each required module.
    module_tables: HashMap<String, String>,
    /// Source nodes whose value was already lowered into a temp.
    substitutions: HashMap<NodeId, lua::Expression>,
    /// Optional chain links already guarded by a nil check.
    guarded_links: HashSet<NodeId>,
}

impl<'a> TransformationContext<'a> {
    pub fn new(
        file: &'a SourceFile,
        checker: &'a Checker<'a>,
        options: &'a CompilerOptions,
        visitors: &'a VisitorMap,
    ) -> Self {
        Self {
            file,
            checker,
            options,
            is_module: file.is_module,
            visitors,
            dispatch: Vec::new(),
            preceding: Vec::new(),
            scopes: Vec::new(),
            next_scope_id: 0,
            classes: Vec::new(),
            diagnostics: Vec::new(),
            used_features: BTreeSet::new(),
            temp_counter: 0,
            module_tables: HashMap::new(),
            substitutions: HashMap::new(),
            guarded_links: HashSet::new(),
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub fn transform_statement(
        &mut self,
        statement: &'a ts::Statement,
    ) -> Result<Vec<lua::Statement>, TransformError> {
        let kind = statement.syntax_kind();
        match self.visitors.stack(kind).len() {
            0 => {
                self.unsupported_kind(statement.span, kind, statement_detail(statement));
                Ok(Vec::new())
            }
            depth => self.invoke_statement(kind, depth - 1, statement),
        }
    }

    /// Hand `statement` to the visitor below the one currently running.
    pub fn super_transform_statement(
        &mut self,
        statement: &'a ts::Statement,
    ) -> Result<Vec<lua::Statement>, TransformError> {
        let kind = statement.syntax_kind();
        let index = self.super_index(kind)?;
        self.invoke_statement(kind, index, statement)
    }

    fn invoke_statement(
        &mut self,
        kind: SyntaxKind,
        index: usize,
        statement: &'a ts::Statement,
    ) -> Result<Vec<lua::Statement>, TransformError> {
        let visitors = self.visitors;
        let Some(visitor) = visitors.get(kind, index) else {
            self.unsupported_kind(statement.span, kind, None);
            return Ok(Vec::new());
        };
        let VisitorFn::Statement(transform) = visitor.transform else {
            self.unsupported_kind(statement.span, kind, None);
            return Ok(Vec::new());
        };
        tracing::trace!(visitor = visitor.name, ?kind, "dispatch statement");
        self.dispatch.push((kind, index));
        let result = transform(statement, self);
        self.dispatch.pop();
        result
    }

    /// Lower an expression that must produce exactly one value.
    pub fn transform_expression(
        &mut self,
        expression: &'a ts::Expression,
    ) -> Result<lua::Expression, TransformError> {
        if let Some(substitute) = self.substitutions.get(&expression.id) {
            return Ok(substitute.clone());
        }
        let kind = expression.syntax_kind();
        match self.visitors.stack(kind).len() {
            0 => {
                self.unsupported_kind(expression.span, kind, expression_detail(expression));
                Ok(lua::Expression::nil())
            }
            depth => self.invoke_expression(kind, depth - 1, expression),
        }
    }

    pub fn super_transform_expression(
        &mut self,
        expression: &'a ts::Expression,
    ) -> Result<lua::Expression, TransformError> {
        let kind = expression.syntax_kind();
        let index = self.super_index(kind)?;
        self.invoke_expression(kind, index, expression)
    }

    fn invoke_expression(
        &mut self,
        kind: SyntaxKind,
        index: usize,
        expression: &'a ts::Expression,
    ) -> Result<lua::Expression, TransformError> {
        let visitors = self.visitors;
        let Some(visitor) = visitors.get(kind, index) else {
            self.unsupported_kind(expression.span, kind, None);
            return Ok(lua::Expression::nil());
        };
        let VisitorFn::Expression(transform) = visitor.transform else {
            self.unsupported_kind(expression.span, kind, None);
            return Ok(lua::Expression::nil());
        };
        tracing::trace!(visitor = visitor.name, ?kind, "dispatch expression");
        self.dispatch.push((kind, index));
        let result = transform(expression, self);
        self.dispatch.pop();
        match result? {
            Some(lowered) => Ok(lowered),
            None => Err(TransformError::EmptyExpressionResult {
                kind: format!("{:?}", kind),
            }),
        }
    }

    fn super_index(&self, kind: SyntaxKind) -> Result<usize, TransformError> {
        match self.dispatch.last() {
            Some(&(current, index)) if current == kind && index > 0 => Ok(index - 1),
            _ => Err(TransformError::NoSuperVisitor {
                kind: format!("{:?}", kind),
            }),
        }
    }

    fn unsupported_kind(&mut self, span: Span, kind: SyntaxKind, detail: Option<&str>) {
        let message = match detail {
            Some(detail) => format!("Unsupported node kind {}", detail),
            None => format!("Unsupported node kind {:?}", kind),
        };
        self.diagnose(span, DiagnosticCode::UnsupportedKind, message);
    }

    /// Lower a statement list. Each statement gets its own preceding
    /// statements frame, drained in front of the statement's own output.
    pub fn transform_statements(
        &mut self,
        statements: &'a [ts::Statement],
    ) -> Result<Vec<lua::Statement>, TransformError> {
        let mut result = Vec::new();
        for statement in statements {
            self.push_preceding_frame();
            let lowered = self.transform_statement(statement);
            let preceding = self.pop_preceding_frame()?;
            result.extend(preceding);
            result.extend(lowered?);
        }
        Ok(result)
    }

    /// Lower a statement list in a fresh scope of `kind`, applying hoisting.
    pub fn transform_scope_block(
        &mut self,
        statements: &'a [ts::Statement],
        kind: ScopeType,
    ) -> Result<Vec<lua::Statement>, TransformError> {
        self.push_scope(kind);
        self.plan_block(statements)?;
        let lowered = self.transform_statements(statements);
        let scope = self.pop_scope()?;
        Ok(scope.finish(lowered?))
    }

    /// Lower a statement that stands in for a block, such as an `if` branch.
    pub fn transform_body(
        &mut self,
        statement: &'a ts::Statement,
        kind: ScopeType,
    ) -> Result<Vec<lua::Statement>, TransformError> {
        match &statement.kind {
            ts::StatementKind::Block(statements) => self.transform_scope_block(statements, kind),
            _ => self.transform_scope_block(std::slice::from_ref(statement), kind),
        }
    }

    // =========================================================================
    // Preceding statements
    // =========================================================================

    pub fn push_preceding_frame(&mut self) {
        self.preceding.push(Vec::new());
    }

    pub fn pop_preceding_frame(&mut self) -> Result<Vec<lua::Statement>, TransformError> {
        self.preceding
            .pop()
            .ok_or(TransformError::NoPrecedingStatementsFrame)
    }

    pub fn add_preceding_statements(
        &mut self,
        statements: impl IntoIterator<Item = lua::Statement>,
    ) -> Result<(), TransformError> {
        let frame = self
            .preceding
            .last_mut()
            .ok_or(TransformError::NoPrecedingStatementsFrame)?;
        frame.extend(statements);
        Ok(())
    }

    pub fn add_preceding_statement(
        &mut self,
        statement: lua::Statement,
    ) -> Result<(), TransformError> {
        self.add_preceding_statements([statement])
    }

    pub fn prepend_preceding_statements(
        &mut self,
        statements: Vec<lua::Statement>,
    ) -> Result<(), TransformError> {
        let frame = self
            .preceding
            .last_mut()
            .ok_or(TransformError::NoPrecedingStatementsFrame)?;
        frame.splice(0..0, statements);
        Ok(())
    }

    /// Run `f` in its own preceding statements frame and return what it
    /// buffered alongside its result.
    pub fn with_preceding_frame<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, TransformError>,
    ) -> Result<(Vec<lua::Statement>, T), TransformError> {
        self.push_preceding_frame();
        let result = f(self);
        let preceding = self.pop_preceding_frame()?;
        Ok((preceding, result?))
    }

    /// Make later transforms of `node` yield `value` instead of lowering it
    /// again.
    pub fn substitute(&mut self, node: NodeId, value: lua::Expression) {
        self.substitutions.insert(node, value);
    }

    pub fn remove_substitution(&mut self, node: NodeId) {
        self.substitutions.remove(&node);
    }

    pub(crate) fn guard_link(&mut self, node: NodeId) {
        self.guarded_links.insert(node);
    }

    pub(crate) fn unguard_link(&mut self, node: NodeId) {
        self.guarded_links.remove(&node);
    }

    pub(crate) fn is_guarded_link(&self, node: NodeId) -> bool {
        self.guarded_links.contains(&node)
    }

    // =========================================================================
    // Temps
    // =========================================================================

    pub fn create_temp_name(&mut self, hint: &str) -> String {
        let hint = lua::luaify(hint);
        let hint = hint.trim_matches('_');
        let hint = if hint.is_empty() { "temp" } else { hint };
        let name = format!("____{}_{}", hint, self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// Temp named after the source expression it will hold.
    pub fn create_temp_for_node(&mut self, node: &ts::Expression) -> lua::Identifier {
        let hint = temp_hint(node);
        lua::Identifier::new(self.create_temp_name(&hint))
    }

    /// Cache `value` in a new local and return a reference to it.
    pub fn create_temp_for_expression(
        &mut self,
        value: lua::Expression,
        hint: &str,
    ) -> Result<lua::Expression, TransformError> {
        let range = value.range;
        let temp = lua::Identifier::new(self.create_temp_name(hint)).with_range(range);
        self.add_preceding_statement(lua::Statement::local_one(temp.clone(), Some(value)))?;
        Ok(temp.into())
    }

    /// Like [`create_temp_for_expression`](Self::create_temp_for_expression),
    /// but values that cannot change between evaluations are returned as is.
    pub fn move_to_preceding_temp(
        &mut self,
        value: lua::Expression,
        node: Option<&ts::Expression>,
    ) -> Result<lua::Expression, TransformError> {
        if self.is_stable(&value) {
            return Ok(value);
        }
        let hint = node.map(temp_hint).unwrap_or_else(|| "temp".to_string());
        self.create_temp_for_expression(value, &hint)
    }

    /// Literals, temps and constants can be evaluated twice safely.
    pub fn is_stable(&self, value: &lua::Expression) -> bool {
        if value.is_literal() {
            return true;
        }
        match &value.kind {
            lua::ExpressionKind::Identifier(identifier) => match identifier.symbol_id {
                Some(id) => {
                    let symbol = self.checker.symbol(SymbolId(id));
                    matches!(
                        symbol.kind,
                        ts::SymbolKind::Variable(ts::VariableKind::Const)
                            | ts::SymbolKind::Function
                            | ts::SymbolKind::Class
                            | ts::SymbolKind::Enum
                            | ts::SymbolKind::Namespace
                            | ts::SymbolKind::Import
                    ) || !self.checker.is_assigned(SymbolId(id))
                }
                None => identifier.text.starts_with("____") || identifier.text == "self",
            },
            _ => false,
        }
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub fn push_scope(&mut self, kind: ScopeType) -> usize {
        let id = self.next_scope_id;
        self.next_scope_id += 1;
        self.scopes.push(Scope::new(id, kind));
        id
    }

    pub fn pop_scope(&mut self) -> Result<Scope, TransformError> {
        self.scopes.pop().ok_or(TransformError::ScopeUnderflow)
    }

    pub fn current_scope(&self) -> Result<&Scope, TransformError> {
        self.scopes.last().ok_or(TransformError::ScopeUnderflow)
    }

    pub fn current_scope_mut(&mut self) -> Result<&mut Scope, TransformError> {
        self.scopes.last_mut().ok_or(TransformError::ScopeUnderflow)
    }

    /// Innermost scope of one of `kinds`.
    pub fn find_scope(&self, kinds: &[ScopeType]) -> Option<&Scope> {
        self.scopes.iter().rev().find(|scope| kinds.contains(&scope.kind))
    }

    pub fn find_scope_mut(&mut self, kinds: &[ScopeType]) -> Option<&mut Scope> {
        self.scopes
            .iter_mut()
            .rev()
            .find(|scope| kinds.contains(&scope.kind))
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Whether the declaration of `symbol` in the current block is hoisted.
    pub fn is_hoisted(&self, symbol: SymbolId) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.is_hoisted(symbol))
    }

    /// Whether code is at the top level of a script (not a module), where
    /// declarations become globals.
    pub fn is_global_scope(&self) -> bool {
        !self.is_module && self.scopes.len() == 1
    }

    /// Record the block's references and declarations in the current scope
    /// and decide what it hoists.
    pub fn plan_block(&mut self, statements: &'a [ts::Statement]) -> Result<(), TransformError> {
        let references = walk::collect_references(self.checker, statements);
        let mut variables: Vec<(SymbolId, u32)> = Vec::new();
        let mut functions: HashMap<SymbolId, FunctionDefinition> = HashMap::new();
        let globals = self.is_global_scope();
        for statement in statements {
            let position = statement.span.start;
            match &statement.kind {
                ts::StatementKind::Variable(variable) if !variable.modifiers.declare => {
                    for declarator in &variable.declarations {
                        for name in declarator.name.bound_names() {
                            if let Some(symbol) = self.checker.symbol_of(name.id) {
                                if self.is_local_binding(symbol, globals) {
                                    variables.push((symbol, position));
                                }
                            }
                        }
                    }
                }
                ts::StatementKind::Class(class) if !class.modifiers.declare => {
                    if let Some(symbol) = self.checker.class_symbol(class) {
                        if self.is_local_binding(symbol, globals) {
                            variables.push((symbol, position));
                        }
                    }
                }
                ts::StatementKind::Enum(declaration) if !declaration.modifiers.declare => {
                    if let Some(symbol) = self.checker.symbol_of(declaration.name.id) {
                        if self.is_local_binding(symbol, globals) {
                            variables.push((symbol, position));
                        }
                    }
                }
                ts::StatementKind::Function(declaration) => {
                    let (Some(name), Some(_)) = (&declaration.name, &declaration.function.body)
                    else {
                        continue;
                    };
                    if let Some(symbol) = self.checker.symbol_of(name.id) {
                        let referenced_symbols =
                            walk::collect_function_references(self.checker, &declaration.function)
                                .into_iter()
                                .map(|reference| reference.symbol)
                                .collect();
                        functions.insert(
                            symbol,
                            FunctionDefinition {
                                position,
                                referenced_symbols,
                            },
                        );
                    }
                }
                _ => {}
            }
        }

        let no_hoisting = self.options.no_hoisting;
        let checker = self.checker;
        let scope = self.current_scope_mut()?;
        for reference in &references {
            scope
                .referenced_symbols
                .entry(reference.symbol)
                .or_insert(reference.span);
        }
        scope.variable_declarations = variables.iter().map(|(symbol, _)| *symbol).collect();
        scope.function_definitions = functions;
        scope.references = references;

        if !no_hoisting {
            let hoisted = scope::plan_hoisting(scope, &variables);
            scope.hoisted = hoisted;
            return Ok(());
        }

        let mut early: Vec<(Span, String)> = Vec::new();
        let declarations = variables.iter().copied().chain(
            scope
                .function_definitions
                .iter()
                .map(|(symbol, definition)| (*symbol, definition.position)),
        );
        for (symbol, position) in declarations {
            if let Some(reference) = scope
                .references
                .iter()
                .find(|reference| reference.symbol == symbol && reference.span.start < position)
            {
                early.push((reference.span, checker.symbol(symbol).name.clone()));
            }
        }
        early.sort_by_key(|(span, _)| span.start);
        for (span, name) in early {
            self.diagnose(
                span,
                DiagnosticCode::ReferencedBeforeDeclaration,
                format!("'{}' is referenced before its declaration", name),
            );
        }
        Ok(())
    }

    /// Plan the clauses of a `switch`. They share one scope but lower to
    /// separate Lua blocks, so every declaration in them is hoisted.
    pub fn plan_switch(&mut self, clauses: &'a [ts::SwitchClause]) -> Result<(), TransformError> {
        let mut variables = Vec::new();
        let mut functions = HashMap::new();
        let mut references = Vec::new();
        let mut referenced_symbols = HashMap::new();
        for clause in clauses {
            self.plan_block(&clause.statements)?;
            let scope = self.current_scope_mut()?;
            variables.append(&mut scope.variable_declarations);
            functions.extend(scope.function_definitions.drain());
            references.append(&mut scope.references);
            for (symbol, span) in scope.referenced_symbols.drain() {
                referenced_symbols.entry(symbol).or_insert(span);
            }
        }
        let scope = self.current_scope_mut()?;
        scope.hoisted = variables.iter().chain(functions.keys()).copied().collect();
        scope.variable_declarations = variables;
        scope.function_definitions = functions;
        scope.references = references;
        scope.referenced_symbols = referenced_symbols;
        Ok(())
    }

    fn is_local_binding(&self, symbol: SymbolId, globals: bool) -> bool {
        let info = self.checker.symbol(symbol);
        !globals && !info.exported && self.checker.member_namespace(symbol).is_none()
    }

    /// Scope of the function currently being lowered.
    pub fn function_scope(&self) -> Option<&Scope> {
        self.find_scope(&[ScopeType::Function])
    }

    // =========================================================================
    // Classes
    // =========================================================================

    pub fn push_class(&mut self, frame: ClassFrame) {
        self.classes.push(frame);
    }

    pub fn pop_class(&mut self) {
        self.classes.pop();
    }

    pub fn current_class(&self) -> Option<&ClassFrame> {
        self.classes.last()
    }

    // =========================================================================
    // Modules
    // =========================================================================

    /// Name of the local holding the required module `path`, and whether it
    /// was newly assigned.
    pub fn module_table(&mut self, path: &str) -> (String, bool) {
        if let Some(existing) = self.module_tables.get(path) {
            return (existing.clone(), false);
        }
        let base = path.rsplit(['/', '.']).find(|part| !part.is_empty()).unwrap_or("module");
        let name = format!("____{}", lua::luaify(base));
        let name = if self.module_tables.values().any(|taken| *taken == name) {
            self.create_temp_name(base)
        } else {
            name
        };
        self.module_tables.insert(path.to_string(), name.clone());
        (name, true)
    }

    // =========================================================================
    // Diagnostics and features
    // =========================================================================

    pub fn diagnose(&mut self, span: Span, code: DiagnosticCode, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(&self.file.file_name, span, code, message);
        tracing::debug!(%diagnostic, "diagnostic");
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn import_lualib_feature(&mut self, feature: LuaLibFeature) {
        if self.used_features.insert(feature) {
            tracing::debug!(%feature, "using lualib feature");
        }
    }

    /// `__TS__<Feature>(arguments)`, recording the feature as used.
    pub fn transform_lualib_call(
        &mut self,
        feature: LuaLibFeature,
        arguments: Vec<lua::Expression>,
    ) -> lua::Expression {
        self.import_lualib_feature(feature);
        lua::Expression::call(lua::Expression::identifier(feature.function_name()), arguments)
    }

    pub fn used_features(&self) -> &BTreeSet<LuaLibFeature> {
        &self.used_features
    }

    pub(crate) fn into_parts(self) -> (Vec<Diagnostic>, BTreeSet<LuaLibFeature>) {
        (self.diagnostics, self.used_features)
    }

    pub fn symbol_of(&self, node: NodeId) -> Option<SymbolId> {
        self.checker.symbol_of(node)
    }
}

fn statement_detail(statement: &ts::Statement) -> Option<&str> {
    match &statement.kind {
        ts::StatementKind::Unsupported(kind) => Some(kind),
        _ => None,
    }
}

fn expression_detail(expression: &ts::Expression) -> Option<&str> {
    match &expression.kind {
        ts::ExpressionKind::Unsupported(kind) => Some(kind),
        _ => None,
    }
}

/// Readable temp name hint for a source expression.
pub fn temp_hint(expression: &ts::Expression) -> String {
    match &expression.kind {
        ts::ExpressionKind::Identifier(name) => name.clone(),
        ts::ExpressionKind::String(value) => value.clone(),
        ts::ExpressionKind::Number(value) => ts::format_number(*value),
        ts::ExpressionKind::This => "self".to_string(),
        ts::ExpressionKind::Call(call) => format!("{}_result", temp_hint(&call.callee)),
        ts::ExpressionKind::New(new) => format!("{}_result", temp_hint(&new.callee)),
        ts::ExpressionKind::PropertyAccess(access) => {
            format!("{}_{}", temp_hint(&access.object), access.name.name)
        }
        ts::ExpressionKind::ElementAccess(access) => {
            format!("{}_{}", temp_hint(&access.object), temp_hint(&access.index))
        }
        ts::ExpressionKind::Parenthesized(inner) | ts::ExpressionKind::Assertion(inner, _) => {
            temp_hint(inner)
        }
        _ => "temp".to_string(),
    }
}
