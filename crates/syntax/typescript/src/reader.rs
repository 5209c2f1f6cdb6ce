//! Tree-sitter CST to owned syntax tree.

use thiserror::Error;
use tree_sitter::{Node, Parser};

use crate::ast::*;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("syntax error at {line}:{column}: unexpected '{text}'")]
    Syntax {
        line: usize,
        column: usize,
        text: String,
    },

    #[error("expected {expected}, got {got}")]
    UnexpectedNode { expected: String, got: String },
}

/// Parse TypeScript source into a [`SourceFile`].
pub fn parse(source: &str, file_name: &str) -> Result<SourceFile, ParseError> {
    let mut parser = Parser::new();
    let language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT;
    parser
        .set_language(&language.into())
        .map_err(|err| ParseError::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Parse("failed to parse".into()))?;

    let root = tree.root_node();
    if root.has_error() {
        let error = first_error(root).unwrap_or(root);
        let position = error.start_position();
        let text = error.utf8_text(source.as_bytes()).unwrap_or("");
        return Err(ParseError::Syntax {
            line: position.row + 1,
            column: position.column + 1,
            text: text.chars().take(40).collect(),
        });
    }

    let mut reader = Reader::new(source);
    reader.read_program(root, file_name)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

struct Reader<'a> {
    source: &'a str,
    next_id: u32,
    is_module: bool,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            next_id: 0,
            is_module: false,
        }
    }

    fn id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn span(&self, node: Node) -> Span {
        let position = node.start_position();
        Span {
            start: node.start_byte() as u32,
            end: node.end_byte() as u32,
            line: position.row as u32,
            column: position.column as u32,
        }
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>, ParseError> {
        node.child_by_field_name(name).ok_or_else(|| {
            ParseError::Parse(format!("{} missing {}", node.kind(), name))
        })
    }

    fn ident(&mut self, node: Node) -> Ident {
        Ident {
            id: self.id(),
            span: self.span(node),
            name: self.text(node).to_string(),
        }
    }

    /// Whether `node` has an anonymous child token with the given text.
    fn has_token(&self, node: Node, token: &str) -> bool {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .any(|child| !child.is_named() && child.kind() == token)
    }

    fn named_children<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect()
    }

    fn first_named<'t>(&self, node: Node<'t>) -> Result<Node<'t>, ParseError> {
        self.named_children(node)
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::Parse(format!("empty {}", node.kind())))
    }

    // =========================================================================
    // Annotations
    // =========================================================================

    fn annotations_for(&self, node: Node) -> Vec<Annotation> {
        match node.prev_sibling() {
            Some(previous) if previous.kind() == "comment" => {
                parse_annotations(self.text(previous))
            }
            _ => Vec::new(),
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn read_program(&mut self, root: Node, file_name: &str) -> Result<SourceFile, ParseError> {
        let mut annotations = Vec::new();
        let mut cursor = root.walk();
        if let Some(first) = root.named_children(&mut cursor).next() {
            if first.kind() == "comment" {
                annotations = parse_annotations(self.text(first));
            }
        }
        let statements = self.read_statements(root)?;
        Ok(SourceFile {
            file_name: file_name.to_string(),
            text: self.source.to_string(),
            statements,
            annotations,
            is_module: self.is_module,
            node_count: self.next_id,
        })
    }

    fn read_statements(&mut self, node: Node) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            if let Some(statement) = self.read_statement(child)? {
                statements.push(statement);
            }
        }
        Ok(statements)
    }

    fn read_body(&mut self, node: Node) -> Result<Box<Statement>, ParseError> {
        let statement = match self.read_statement(node)? {
            Some(statement) => statement,
            None => Statement {
                id: self.id(),
                span: self.span(node),
                kind: StatementKind::Empty,
            },
        };
        Ok(Box::new(statement))
    }

    fn read_statement(&mut self, node: Node) -> Result<Option<Statement>, ParseError> {
        let annotations = self.annotations_for(node);
        self.read_statement_with(node, Modifiers::default(), annotations)
    }

    fn read_statement_with(
        &mut self,
        node: Node,
        modifiers: Modifiers,
        annotations: Vec<Annotation>,
    ) -> Result<Option<Statement>, ParseError> {
        let id = self.id();
        let span = self.span(node);
        let kind = match node.kind() {
            "comment" | "hash_bang_line" => return Ok(None),
            "empty_statement" => StatementKind::Empty,
            "expression_statement" => {
                let inner = self.first_named(node)?;
                if inner.kind() == "internal_module" {
                    self.read_namespace(inner, modifiers, annotations)?
                } else {
                    StatementKind::Expression(self.read_expression(inner)?)
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                StatementKind::Variable(self.read_variable_statement(node, modifiers)?)
            }
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                let name = self.field(node, "name")?;
                let name = self.ident(name);
                let function = self.read_function(node)?;
                StatementKind::Function(FunctionDeclaration {
                    name: Some(name),
                    function,
                    modifiers,
                    annotations,
                })
            }
            "class_declaration" | "abstract_class_declaration" => {
                StatementKind::Class(self.read_class(node, modifiers, annotations)?)
            }
            "enum_declaration" => StatementKind::Enum(self.read_enum(node, modifiers, annotations)?),
            "interface_declaration" => {
                let name = self.field(node, "name")?;
                let name = self.ident(name);
                let mut extends = Vec::new();
                for child in self.named_children(node) {
                    if child.kind() == "extends_type_clause" {
                        for extended in self.named_children(child) {
                            extends.push(self.read_type(extended)?);
                        }
                    }
                }
                let body = self.field(node, "body")?;
                let members = self.read_type_members(body)?;
                StatementKind::Interface(InterfaceDeclaration {
                    name,
                    extends,
                    members,
                    modifiers,
                    annotations,
                })
            }
            "type_alias_declaration" => {
                let name = self.field(node, "name")?;
                let name = self.ident(name);
                let value = self.field(node, "value")?;
                StatementKind::TypeAlias(TypeAliasDeclaration {
                    name,
                    value: self.read_type(value)?,
                    modifiers,
                })
            }
            "internal_module" | "module" => self.read_namespace(node, modifiers, annotations)?,
            "ambient_declaration" => {
                let declared = Modifiers {
                    declare: true,
                    ..modifiers
                };
                let declaration = self
                    .named_children(node)
                    .into_iter()
                    .find(|child| !matches!(child.kind(), "statement_block" | "property_identifier"));
                match declaration {
                    Some(inner) if is_declaration_kind(inner.kind()) => {
                        return self.read_statement_with(inner, declared, annotations);
                    }
                    _ => StatementKind::Empty,
                }
            }
            "import_statement" => {
                self.is_module = true;
                StatementKind::Import(self.read_import(node)?)
            }
            "export_statement" => {
                self.is_module = true;
                return self.read_export(node, annotations);
            }
            "if_statement" => {
                let condition = self.field(node, "condition")?;
                let consequence = self.field(node, "consequence")?;
                let else_branch = match node.child_by_field_name("alternative") {
                    Some(alternative) => {
                        let inner = self.first_named(alternative)?;
                        Some(self.read_body(inner)?)
                    }
                    None => None,
                };
                StatementKind::If(IfStatement {
                    condition: self.read_parenthesized_inner(condition)?,
                    then_branch: self.read_body(consequence)?,
                    else_branch,
                })
            }
            "while_statement" | "do_statement" => {
                let condition = self.field(node, "condition")?;
                let body = self.field(node, "body")?;
                let statement = WhileStatement {
                    condition: self.read_parenthesized_inner(condition)?,
                    body: self.read_body(body)?,
                };
                if node.kind() == "while_statement" {
                    StatementKind::While(statement)
                } else {
                    StatementKind::DoWhile(statement)
                }
            }
            "for_statement" => StatementKind::For(self.read_for(node)?),
            "for_in_statement" => self.read_for_in(node)?,
            "return_statement" => {
                let value = match self.named_children(node).into_iter().next() {
                    Some(child) => Some(self.read_expression(child)?),
                    None => None,
                };
                StatementKind::Return(value)
            }
            "break_statement" | "continue_statement" => {
                let label = node.child_by_field_name("label").map(|label| self.ident(label));
                if node.kind() == "break_statement" {
                    StatementKind::Break(label)
                } else {
                    StatementKind::Continue(label)
                }
            }
            "throw_statement" => {
                let value = self.first_named(node)?;
                StatementKind::Throw(self.read_expression(value)?)
            }
            "try_statement" => StatementKind::Try(self.read_try(node)?),
            "switch_statement" => StatementKind::Switch(self.read_switch(node)?),
            "statement_block" => StatementKind::Block(self.read_statements(node)?),
            "labeled_statement" => {
                let label = self.field(node, "label")?;
                let body = self.field(node, "body")?;
                StatementKind::Labeled(LabeledStatement {
                    label: self.ident(label),
                    body: self.read_body(body)?,
                })
            }
            kind => StatementKind::Unsupported(kind.to_string()),
        };
        Ok(Some(Statement { id, span, kind }))
    }

    fn read_variable_statement(
        &mut self,
        node: Node,
        modifiers: Modifiers,
    ) -> Result<VariableStatement, ParseError> {
        let kind = if node.kind() == "variable_declaration" {
            VariableKind::Var
        } else {
            match node.child_by_field_name("kind").map(|kind| self.text(kind)) {
                Some("const") => VariableKind::Const,
                _ => VariableKind::Let,
            }
        };
        let mut declarations = Vec::new();
        for child in self.named_children(node) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            let id = self.id();
            let span = self.span(child);
            let name = self.field(child, "name")?;
            let name = self.read_pattern(name, false)?;
            let type_annotation = match child.child_by_field_name("type") {
                Some(annotation) => Some(self.read_type(annotation)?),
                None => None,
            };
            let initializer = match child.child_by_field_name("value") {
                Some(value) => Some(self.read_expression(value)?),
                None => None,
            };
            declarations.push(VariableDeclarator {
                id,
                span,
                name,
                type_annotation,
                initializer,
            });
        }
        Ok(VariableStatement {
            kind,
            declarations,
            modifiers,
        })
    }

    fn read_namespace(
        &mut self,
        node: Node,
        modifiers: Modifiers,
        annotations: Vec<Annotation>,
    ) -> Result<StatementKind, ParseError> {
        let name = self.field(node, "name")?;
        let name = self.ident(name);
        let body = match node.child_by_field_name("body") {
            Some(body) => self.read_statements(body)?,
            None => Vec::new(),
        };
        Ok(StatementKind::Namespace(NamespaceDeclaration {
            name,
            body,
            modifiers,
            annotations,
        }))
    }

    fn read_for(&mut self, node: Node) -> Result<ForStatement, ParseError> {
        let initializer = match node.child_by_field_name("initializer") {
            Some(init) if matches!(init.kind(), "lexical_declaration" | "variable_declaration") => {
                Some(ForInitializer::Variable(
                    self.read_variable_statement(init, Modifiers::default())?,
                ))
            }
            Some(init) if init.kind() == "empty_statement" => None,
            Some(init) => Some(ForInitializer::Expression(self.read_expression(init)?)),
            None => None,
        };
        let mut condition = None;
        let mut cursor = node.walk();
        let conditions: Vec<Node> = node.children_by_field_name("condition", &mut cursor).collect();
        for candidate in conditions {
            if candidate.is_named() && candidate.kind() != "empty_statement" {
                condition = Some(self.read_expression(candidate)?);
                break;
            }
        }
        let incrementor = match node.child_by_field_name("increment") {
            Some(increment) => Some(self.read_expression(increment)?),
            None => None,
        };
        let body = self.field(node, "body")?;
        Ok(ForStatement {
            initializer,
            condition,
            incrementor,
            body: self.read_body(body)?,
        })
    }

    fn read_for_in(&mut self, node: Node) -> Result<StatementKind, ParseError> {
        let left = self.field(node, "left")?;
        let binding = match node.child_by_field_name("kind").map(|kind| self.text(kind)) {
            Some(kind) => {
                let kind = match kind {
                    "const" => VariableKind::Const,
                    "var" => VariableKind::Var,
                    _ => VariableKind::Let,
                };
                ForBinding::Declaration(kind, self.read_pattern(left, false)?)
            }
            None => ForBinding::Target(self.read_pattern(left, true)?),
        };
        let right = self.field(node, "right")?;
        let body = self.field(node, "body")?;
        let operator = self.field(node, "operator")?;
        let statement = ForOfStatement {
            binding,
            expression: self.read_expression(right)?,
            body: self.read_body(body)?,
        };
        if self.text(operator) == "of" {
            Ok(StatementKind::ForOf(statement))
        } else {
            Ok(StatementKind::ForIn(statement))
        }
    }

    fn read_try(&mut self, node: Node) -> Result<TryStatement, ParseError> {
        let body = self.field(node, "body")?;
        let block = self.read_body(body)?;
        let catch_clause = match node.child_by_field_name("handler") {
            Some(handler) => {
                let id = self.id();
                let span = self.span(handler);
                let parameter = match handler.child_by_field_name("parameter") {
                    Some(parameter) => Some(self.read_pattern(parameter, false)?),
                    None => None,
                };
                let body = self.field(handler, "body")?;
                Some(CatchClause {
                    id,
                    span,
                    parameter,
                    block: self.read_body(body)?,
                })
            }
            None => None,
        };
        let finally_block = match node.child_by_field_name("finalizer") {
            Some(finalizer) => {
                let body = self.field(finalizer, "body")?;
                Some(self.read_body(body)?)
            }
            None => None,
        };
        Ok(TryStatement {
            block,
            catch_clause,
            finally_block,
        })
    }

    fn read_switch(&mut self, node: Node) -> Result<SwitchStatement, ParseError> {
        let value = self.field(node, "value")?;
        let expression = self.read_parenthesized_inner(value)?;
        let body = self.field(node, "body")?;
        let mut clauses = Vec::new();
        for clause in self.named_children(body) {
            let id = self.id();
            let span = self.span(clause);
            let test = match clause.kind() {
                "switch_case" => {
                    let value = self.field(clause, "value")?;
                    Some(self.read_expression(value)?)
                }
                "switch_default" => None,
                _ => continue,
            };
            let mut statements = Vec::new();
            let mut cursor = clause.walk();
            let bodies: Vec<Node> = clause.children_by_field_name("body", &mut cursor).collect();
            for statement in bodies {
                if let Some(statement) = self.read_statement(statement)? {
                    statements.push(statement);
                }
            }
            clauses.push(SwitchClause {
                id,
                span,
                test,
                statements,
            });
        }
        Ok(SwitchStatement {
            expression,
            clauses,
        })
    }

    fn read_import(&mut self, node: Node) -> Result<ImportDeclaration, ParseError> {
        let source = match node.child_by_field_name("source") {
            Some(source) => self.read_string_literal(source),
            None => String::new(),
        };
        let mut import = ImportDeclaration {
            source,
            default: None,
            namespace: None,
            named: Vec::new(),
            type_only: self.has_token(node, "type"),
        };
        for clause in self.named_children(node) {
            if clause.kind() != "import_clause" {
                continue;
            }
            for child in self.named_children(clause) {
                match child.kind() {
                    "identifier" => import.default = Some(self.ident(child)),
                    "namespace_import" => {
                        let name = self.first_named(child)?;
                        import.namespace = Some(self.ident(name));
                    }
                    "named_imports" => {
                        for specifier in self.named_children(child) {
                            if specifier.kind() != "import_specifier"
                                || self.has_token(specifier, "type")
                            {
                                continue;
                            }
                            let name = self.field(specifier, "name")?;
                            let imported = if name.kind() == "string" {
                                self.read_string_literal(name)
                            } else {
                                self.text(name).to_string()
                            };
                            let local = match specifier.child_by_field_name("alias") {
                                Some(alias) => self.ident(alias),
                                None => self.ident(name),
                            };
                            import.named.push(ImportSpecifier { imported, local });
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(import)
    }

    fn read_export(
        &mut self,
        node: Node,
        annotations: Vec<Annotation>,
    ) -> Result<Option<Statement>, ParseError> {
        let is_default = self.has_token(node, "default");
        if let Some(declaration) = node.child_by_field_name("declaration") {
            let modifiers = Modifiers {
                export: true,
                default: is_default,
                declare: false,
            };
            return self.read_statement_with(declaration, modifiers, annotations);
        }

        let id = self.id();
        let span = self.span(node);
        let source = node
            .child_by_field_name("source")
            .map(|source| self.read_string_literal(source));

        if let Some(value) = node.child_by_field_name("value") {
            let expression = self.read_expression(value)?;
            return Ok(Some(Statement {
                id,
                span,
                kind: StatementKind::Export(ExportDeclaration::Default(expression)),
            }));
        }

        let children = self.named_children(node);
        if let Some(clause) = children.iter().find(|child| child.kind() == "export_clause") {
            let mut specifiers = Vec::new();
            for specifier in self.named_children(*clause) {
                let name = self.field(specifier, "name")?;
                let local_name = self.text(name).to_string();
                let exported = match specifier.child_by_field_name("alias") {
                    Some(alias) if alias.kind() == "string" => self.read_string_literal(alias),
                    Some(alias) => self.text(alias).to_string(),
                    None => local_name.clone(),
                };
                let local = Expression {
                    id: self.id(),
                    span: self.span(name),
                    kind: ExpressionKind::Identifier(local_name.clone()),
                };
                specifiers.push(ExportSpecifier {
                    local,
                    local_name,
                    exported,
                });
            }
            return Ok(Some(Statement {
                id,
                span,
                kind: StatementKind::Export(ExportDeclaration::Named { specifiers, source }),
            }));
        }

        if let (true, Some(source)) = (self.has_token(node, "*"), source) {
            if children.iter().any(|child| child.kind() == "namespace_export") {
                return Ok(Some(Statement {
                    id,
                    span,
                    kind: StatementKind::Unsupported("NamespaceExport".into()),
                }));
            }
            return Ok(Some(Statement {
                id,
                span,
                kind: StatementKind::Export(ExportDeclaration::All { source }),
            }));
        }

        if self.has_token(node, "=") {
            if let Some(value) = children.into_iter().next() {
                let expression = self.read_expression(value)?;
                return Ok(Some(Statement {
                    id,
                    span,
                    kind: StatementKind::Export(ExportDeclaration::Assignment(expression)),
                }));
            }
        }

        Ok(Some(Statement {
            id,
            span,
            kind: StatementKind::Unsupported("ExportDeclaration".into()),
        }))
    }

    // =========================================================================
    // Functions and classes
    // =========================================================================

    fn read_function(&mut self, node: Node) -> Result<Function, ParseError> {
        let id = self.id();
        let span = self.span(node);
        let is_arrow = node.kind() == "arrow_function";
        let mut params = Vec::new();
        let mut this_param = None;
        if let Some(parameters) = node.child_by_field_name("parameters") {
            let (read, this) = self.read_parameters(parameters)?;
            params = read;
            this_param = this;
        } else if let Some(parameter) = node.child_by_field_name("parameter") {
            let pattern = Pattern {
                id: self.id(),
                span: self.span(parameter),
                kind: PatternKind::Identifier(self.text(parameter).to_string()),
            };
            params.push(Parameter {
                id: self.id(),
                span: self.span(parameter),
                pattern,
                type_annotation: None,
                default: None,
                rest: false,
                optional: false,
                is_property: false,
            });
        }

        let return_type = match node.child_by_field_name("return_type") {
            Some(annotation) => Some(self.read_return_type(annotation)?),
            None => None,
        };

        let body = match node.child_by_field_name("body") {
            Some(body) if body.kind() == "statement_block" => {
                Some(FunctionBody::Block(self.read_statements(body)?))
            }
            Some(body) => Some(FunctionBody::Expression(Box::new(self.read_expression(body)?))),
            None => None,
        };

        Ok(Function {
            id,
            span,
            params,
            this_param,
            body,
            return_type,
            is_arrow,
            is_async: self.has_token(node, "async"),
            is_generator: node.kind().contains("generator") || self.has_token(node, "*"),
        })
    }

    fn read_return_type(&mut self, annotation: Node) -> Result<TypeNode, ParseError> {
        match annotation.kind() {
            "type_annotation" => {
                let inner = self.first_named(annotation)?;
                self.read_type(inner)
            }
            "type_predicate_annotation" | "asserts_annotation" => Ok(TypeNode::Boolean),
            _ => self.read_type(annotation),
        }
    }

    fn read_parameters(
        &mut self,
        node: Node,
    ) -> Result<(Vec<Parameter>, Option<ThisParameter>), ParseError> {
        let mut params = Vec::new();
        let mut this_param = None;
        for child in self.named_children(node) {
            if !matches!(child.kind(), "required_parameter" | "optional_parameter") {
                continue;
            }
            let type_annotation = match child.child_by_field_name("type") {
                Some(annotation) => Some(self.read_type(annotation)?),
                None => None,
            };
            let pattern_node = child
                .child_by_field_name("pattern")
                .or_else(|| child.child_by_field_name("name"))
                .ok_or_else(|| ParseError::Parse("parameter missing pattern".into()))?;
            if pattern_node.kind() == "this" {
                this_param = Some(ThisParameter { type_annotation });
                continue;
            }
            let (pattern, rest) = if pattern_node.kind() == "rest_pattern" {
                let inner = self.first_named(pattern_node)?;
                (self.read_pattern(inner, false)?, true)
            } else {
                (self.read_pattern(pattern_node, false)?, false)
            };
            let default = match child.child_by_field_name("value") {
                Some(value) => Some(self.read_expression(value)?),
                None => None,
            };
            let is_property = self
                .named_children(child)
                .iter()
                .any(|modifier| modifier.kind() == "accessibility_modifier")
                || self.has_token(child, "readonly");
            params.push(Parameter {
                id: self.id(),
                span: self.span(child),
                pattern,
                type_annotation,
                default,
                rest,
                optional: child.kind() == "optional_parameter",
                is_property,
            });
        }
        Ok((params, this_param))
    }

    fn read_class(
        &mut self,
        node: Node,
        modifiers: Modifiers,
        annotations: Vec<Annotation>,
    ) -> Result<ClassDeclaration, ParseError> {
        let id = self.id();
        let span = self.span(node);
        let name = node.child_by_field_name("name").map(|name| self.ident(name));
        let mut extends = None;
        for child in self.named_children(node) {
            if child.kind() != "class_heritage" {
                continue;
            }
            for clause in self.named_children(child) {
                if clause.kind() == "extends_clause" {
                    let value = self.field(clause, "value")?;
                    extends = Some(self.read_expression(value)?);
                }
            }
        }
        let body = self.field(node, "body")?;
        let mut members = Vec::new();
        for member in self.named_children(body) {
            if let Some(member) = self.read_class_member(member)? {
                members.push(member);
            }
        }
        Ok(ClassDeclaration {
            id,
            span,
            name,
            extends,
            members,
            modifiers,
            annotations,
            is_abstract: node.kind() == "abstract_class_declaration",
        })
    }

    fn read_class_member(&mut self, node: Node) -> Result<Option<ClassMember>, ParseError> {
        let id = self.id();
        let span = self.span(node);
        let is_static = self.has_token(node, "static");
        let kind = match node.kind() {
            "method_definition" => {
                let name_node = self.field(node, "name")?;
                let name = self.read_property_name(name_node)?;
                let function = self.read_function(node)?;
                if self.has_token(node, "get") {
                    ClassMemberKind::Getter { name, function }
                } else if self.has_token(node, "set") {
                    ClassMemberKind::Setter { name, function }
                } else if name.text().as_deref() == Some("constructor") && !is_static {
                    ClassMemberKind::Constructor(function)
                } else {
                    ClassMemberKind::Method { name, function }
                }
            }
            "public_field_definition" => {
                if self.has_token(node, "declare") || self.has_token(node, "abstract") {
                    return Ok(None);
                }
                let name_node = self.field(node, "name")?;
                let name = self.read_property_name(name_node)?;
                let type_annotation = match node.child_by_field_name("type") {
                    Some(annotation) => Some(self.read_type(annotation)?),
                    None => None,
                };
                let initializer = match node.child_by_field_name("value") {
                    Some(value) => Some(self.read_expression(value)?),
                    None => None,
                };
                ClassMemberKind::Property {
                    name,
                    type_annotation,
                    initializer,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(ClassMember {
            id,
            span,
            is_static,
            kind,
        }))
    }

    fn read_property_name(&mut self, node: Node) -> Result<PropertyName, ParseError> {
        let id = self.id();
        let span = self.span(node);
        let kind = match node.kind() {
            "property_identifier" | "identifier" | "shorthand_property_identifier_pattern"
            | "shorthand_property_identifier" => {
                PropertyNameKind::Identifier(self.text(node).to_string())
            }
            "private_property_identifier" => {
                PropertyNameKind::Identifier(self.text(node).trim_start_matches('#').to_string())
            }
            "string" => PropertyNameKind::String(self.read_string_literal(node)),
            "number" => PropertyNameKind::Number(parse_number(self.text(node))?),
            "computed_property_name" => {
                let inner = self.first_named(node)?;
                PropertyNameKind::Computed(Box::new(self.read_expression(inner)?))
            }
            other => {
                return Err(ParseError::UnexpectedNode {
                    expected: "property name".into(),
                    got: other.into(),
                });
            }
        };
        Ok(PropertyName { id, span, kind })
    }

    fn read_enum(
        &mut self,
        node: Node,
        modifiers: Modifiers,
        annotations: Vec<Annotation>,
    ) -> Result<EnumDeclaration, ParseError> {
        let name = self.field(node, "name")?;
        let name = self.ident(name);
        let body = self.field(node, "body")?;
        let mut members = Vec::new();
        for member in self.named_children(body) {
            let id = self.id();
            let span = self.span(member);
            let (name, initializer) = if member.kind() == "enum_assignment" {
                let name = self.field(member, "name")?;
                let value = self.field(member, "value")?;
                (
                    self.read_property_name(name)?,
                    Some(self.read_expression(value)?),
                )
            } else {
                (self.read_property_name(member)?, None)
            };
            members.push(EnumMember {
                id,
                span,
                name,
                initializer,
            });
        }
        Ok(EnumDeclaration {
            name,
            members,
            is_const: self.has_token(node, "const"),
            modifiers,
            annotations,
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn read_parenthesized_inner(&mut self, node: Node) -> Result<Expression, ParseError> {
        if node.kind() == "parenthesized_expression" {
            let inner = self.first_named(node)?;
            self.read_expression(inner)
        } else {
            self.read_expression(node)
        }
    }

    fn read_expression(&mut self, node: Node) -> Result<Expression, ParseError> {
        let id = self.id();
        let span = self.span(node);
        let kind = match node.kind() {
            "identifier" | "shorthand_property_identifier" => {
                ExpressionKind::Identifier(self.text(node).to_string())
            }
            "number" => ExpressionKind::Number(parse_number(self.text(node))?),
            "string" => ExpressionKind::String(self.read_string_literal(node)),
            "template_string" => ExpressionKind::Template(self.read_template(node)?),
            "true" => ExpressionKind::Boolean(true),
            "false" => ExpressionKind::Boolean(false),
            "null" => ExpressionKind::Null,
            "undefined" => ExpressionKind::Undefined,
            "this" => ExpressionKind::This,
            "super" => ExpressionKind::Super,
            "array" => ExpressionKind::Array(self.read_array_elements(node)?),
            "object" => ExpressionKind::Object(self.read_object(node)?),
            "function_expression" | "function" | "generator_function" | "arrow_function" => {
                ExpressionKind::Function(Box::new(self.read_function(node)?))
            }
            "class" => ExpressionKind::Class(Box::new(self.read_class(
                node,
                Modifiers::default(),
                Vec::new(),
            )?)),
            "call_expression" => {
                let arguments = self.field(node, "arguments")?;
                if arguments.kind() == "template_string" {
                    ExpressionKind::Unsupported("TaggedTemplateExpression".into())
                } else {
                    let function = self.field(node, "function")?;
                    if function.kind() == "import" {
                        ExpressionKind::Unsupported("ImportCall".into())
                    } else {
                        ExpressionKind::Call(CallExpression {
                            callee: Box::new(self.read_expression(function)?),
                            arguments: self.read_arguments(arguments)?,
                            optional: self.has_token(node, "?."),
                        })
                    }
                }
            }
            "new_expression" => {
                let constructor = self.field(node, "constructor")?;
                let arguments = match node.child_by_field_name("arguments") {
                    Some(arguments) => self.read_arguments(arguments)?,
                    None => Vec::new(),
                };
                ExpressionKind::New(NewExpression {
                    callee: Box::new(self.read_expression(constructor)?),
                    arguments,
                })
            }
            "member_expression" => {
                let object = self.field(node, "object")?;
                let property = self.field(node, "property")?;
                let mut name = self.ident(property);
                name.name = name.name.trim_start_matches('#').to_string();
                ExpressionKind::PropertyAccess(PropertyAccess {
                    object: Box::new(self.read_expression(object)?),
                    name,
                    optional: node.child_by_field_name("optional_chain").is_some(),
                })
            }
            "subscript_expression" => {
                let object = self.field(node, "object")?;
                let index = self.field(node, "index")?;
                ExpressionKind::ElementAccess(ElementAccess {
                    object: Box::new(self.read_expression(object)?),
                    index: Box::new(self.read_expression(index)?),
                    optional: node.child_by_field_name("optional_chain").is_some(),
                })
            }
            "assignment_expression" => {
                let left = self.field(node, "left")?;
                let right = self.field(node, "right")?;
                ExpressionKind::Assignment(Assignment {
                    left: Box::new(self.read_pattern(left, true)?),
                    right: Box::new(self.read_expression(right)?),
                })
            }
            "augmented_assignment_expression" => {
                let left = self.field(node, "left")?;
                let right = self.field(node, "right")?;
                let operator = self.field(node, "operator")?;
                let token = self.text(operator);
                let operator = CompoundOperator::from_token(token).ok_or_else(|| {
                    ParseError::Parse(format!("unknown assignment operator '{}'", token))
                })?;
                ExpressionKind::CompoundAssignment(CompoundAssignment {
                    operator,
                    left: Box::new(self.read_expression(left)?),
                    right: Box::new(self.read_expression(right)?),
                })
            }
            "binary_expression" => {
                let left = self.field(node, "left")?;
                let right = self.field(node, "right")?;
                let operator = self.field(node, "operator")?;
                let token = self.text(operator);
                let operator = BinaryOperator::from_token(token).ok_or_else(|| {
                    ParseError::Parse(format!("unknown binary operator '{}'", token))
                })?;
                ExpressionKind::Binary(BinaryExpression {
                    operator,
                    left: Box::new(self.read_expression(left)?),
                    right: Box::new(self.read_expression(right)?),
                })
            }
            "unary_expression" => {
                let operator = self.field(node, "operator")?;
                let argument = self.field(node, "argument")?;
                let operator = match self.text(operator) {
                    "!" => UnaryOperator::Not,
                    "-" => UnaryOperator::Minus,
                    "+" => UnaryOperator::Plus,
                    "~" => UnaryOperator::BitwiseNot,
                    "typeof" => UnaryOperator::TypeOf,
                    "void" => UnaryOperator::Void,
                    "delete" => UnaryOperator::Delete,
                    other => {
                        return Err(ParseError::Parse(format!(
                            "unknown unary operator '{}'",
                            other
                        )));
                    }
                };
                ExpressionKind::Unary(UnaryExpression {
                    operator,
                    operand: Box::new(self.read_expression(argument)?),
                })
            }
            "update_expression" => {
                let operator = self.field(node, "operator")?;
                let argument = self.field(node, "argument")?;
                ExpressionKind::Update(UpdateExpression {
                    increment: self.text(operator) == "++",
                    prefix: operator.start_byte() < argument.start_byte(),
                    operand: Box::new(self.read_expression(argument)?),
                })
            }
            "ternary_expression" => {
                let condition = self.field(node, "condition")?;
                let consequence = self.field(node, "consequence")?;
                let alternative = self.field(node, "alternative")?;
                ExpressionKind::Conditional(ConditionalExpression {
                    condition: Box::new(self.read_expression(condition)?),
                    when_true: Box::new(self.read_expression(consequence)?),
                    when_false: Box::new(self.read_expression(alternative)?),
                })
            }
            "parenthesized_expression" => {
                let inner = self.first_named(node)?;
                ExpressionKind::Parenthesized(Box::new(self.read_expression(inner)?))
            }
            "sequence_expression" => {
                let mut expressions = Vec::new();
                for child in self.named_children(node) {
                    let expression = self.read_expression(child)?;
                    match expression.kind {
                        ExpressionKind::Sequence(inner) => expressions.extend(inner),
                        _ => expressions.push(expression),
                    }
                }
                ExpressionKind::Sequence(expressions)
            }
            "as_expression" | "satisfies_expression" => {
                let children = self.named_children(node);
                let inner = children
                    .first()
                    .copied()
                    .ok_or_else(|| ParseError::Parse("empty assertion".into()))?;
                let asserted = match children.get(1) {
                    Some(type_node) => Some(self.read_type(*type_node)?),
                    None => None,
                };
                ExpressionKind::Assertion(Box::new(self.read_expression(inner)?), asserted)
            }
            "type_assertion" => {
                let mut asserted = None;
                let mut inner = None;
                for child in self.named_children(node) {
                    if child.kind() == "type_arguments" {
                        if let Some(first) = self.named_children(child).into_iter().next() {
                            asserted = Some(self.read_type(first)?);
                        }
                    } else {
                        inner = Some(child);
                    }
                }
                let inner = inner.ok_or_else(|| ParseError::Parse("empty type assertion".into()))?;
                ExpressionKind::Assertion(Box::new(self.read_expression(inner)?), asserted)
            }
            "non_null_expression" | "instantiation_expression" => {
                let inner = self.first_named(node)?;
                ExpressionKind::Assertion(Box::new(self.read_expression(inner)?), None)
            }
            "await_expression" => {
                let inner = self.first_named(node)?;
                ExpressionKind::Await(Box::new(self.read_expression(inner)?))
            }
            "yield_expression" => {
                if self.has_token(node, "*") {
                    ExpressionKind::Unsupported("YieldDelegation".into())
                } else {
                    match self.named_children(node).into_iter().next() {
                        Some(inner) => {
                            ExpressionKind::Yield(Some(Box::new(self.read_expression(inner)?)))
                        }
                        None => ExpressionKind::Yield(None),
                    }
                }
            }
            "spread_element" => {
                let inner = self.first_named(node)?;
                ExpressionKind::Spread(Box::new(self.read_expression(inner)?))
            }
            kind => ExpressionKind::Unsupported(kind.to_string()),
        };
        Ok(Expression { id, span, kind })
    }

    fn read_arguments(&mut self, node: Node) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();
        for child in self.named_children(node) {
            arguments.push(self.read_expression(child)?);
        }
        Ok(arguments)
    }

    /// Array literal elements, with holes as [`ExpressionKind::Omitted`].
    fn read_array_elements(&mut self, node: Node) -> Result<Vec<Expression>, ParseError> {
        let mut elements = Vec::new();
        let mut seen_element = false;
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "," => {
                    if !seen_element {
                        elements.push(Expression {
                            id: self.id(),
                            span: self.span(child),
                            kind: ExpressionKind::Omitted,
                        });
                    }
                    seen_element = false;
                }
                "[" | "]" | "comment" => {}
                _ if child.is_named() => {
                    elements.push(self.read_expression(child)?);
                    seen_element = true;
                }
                _ => {}
            }
        }
        Ok(elements)
    }

    fn read_object(&mut self, node: Node) -> Result<Vec<ObjectMember>, ParseError> {
        let mut members = Vec::new();
        for child in self.named_children(node) {
            let id = self.id();
            let span = self.span(child);
            let kind = match child.kind() {
                "pair" => {
                    let key = self.field(child, "key")?;
                    let value = self.field(child, "value")?;
                    ObjectMemberKind::Property {
                        key: self.read_property_name(key)?,
                        value: self.read_expression(value)?,
                    }
                }
                "shorthand_property_identifier" => {
                    ObjectMemberKind::Shorthand(self.read_expression(child)?)
                }
                "spread_element" => {
                    let inner = self.first_named(child)?;
                    ObjectMemberKind::Spread(self.read_expression(inner)?)
                }
                "method_definition" => {
                    let key = self.field(child, "name")?;
                    let key = self.read_property_name(key)?;
                    let function = self.read_function(child)?;
                    if self.has_token(child, "get") || self.has_token(child, "set") {
                        ObjectMemberKind::Accessor { key, function }
                    } else {
                        ObjectMemberKind::Method { key, function }
                    }
                }
                _ => continue,
            };
            members.push(ObjectMember { id, span, kind });
        }
        Ok(members)
    }

    fn read_template(&mut self, node: Node) -> Result<TemplateLiteral, ParseError> {
        let mut quasis = vec![String::new()];
        let mut expressions = Vec::new();
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "string_fragment" => {
                    if let Some(last) = quasis.last_mut() {
                        last.push_str(self.text(child));
                    }
                }
                "escape_sequence" => {
                    let decoded = unescape(self.text(child));
                    if let Some(last) = quasis.last_mut() {
                        last.push_str(&decoded);
                    }
                }
                "template_substitution" => {
                    let inner = self.first_named(child)?;
                    expressions.push(self.read_expression(inner)?);
                    quasis.push(String::new());
                }
                _ => {}
            }
        }
        Ok(TemplateLiteral {
            quasis,
            expressions,
        })
    }

    fn read_string_literal(&self, node: Node) -> String {
        let text = self.text(node);
        let inner = if text.len() >= 2 {
            &text[1..text.len() - 1]
        } else {
            text
        };
        unescape(inner)
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    /// Read a binding pattern, or an assignment target when `assignment` is set.
    fn read_pattern(&mut self, node: Node, assignment: bool) -> Result<Pattern, ParseError> {
        let id = self.id();
        let span = self.span(node);
        let kind = match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" | "undefined" => {
                PatternKind::Identifier(self.text(node).to_string())
            }
            "parenthesized_expression" if assignment => {
                let inner = self.first_named(node)?;
                return self.read_pattern(inner, assignment);
            }
            "member_expression" | "subscript_expression" | "non_null_expression" => {
                PatternKind::Expression(Box::new(self.read_expression(node)?))
            }
            "array_pattern" => {
                let mut elements = Vec::new();
                let mut seen_element = false;
                let mut cursor = node.walk();
                let children: Vec<Node> = node.children(&mut cursor).collect();
                for child in children {
                    match child.kind() {
                        "," => {
                            if !seen_element {
                                elements.push(None);
                            }
                            seen_element = false;
                        }
                        _ if child.is_named() && child.kind() != "comment" => {
                            elements.push(Some(self.read_array_pattern_element(child, assignment)?));
                            seen_element = true;
                        }
                        _ => {}
                    }
                }
                PatternKind::Array(elements)
            }
            "object_pattern" => {
                let mut properties = Vec::new();
                for child in self.named_children(node) {
                    properties.push(self.read_object_pattern_property(child, assignment)?);
                }
                PatternKind::Object(properties)
            }
            other => {
                return Err(ParseError::UnexpectedNode {
                    expected: "pattern".into(),
                    got: other.into(),
                });
            }
        };
        Ok(Pattern { id, span, kind })
    }

    fn read_array_pattern_element(
        &mut self,
        node: Node,
        assignment: bool,
    ) -> Result<ArrayPatternElement, ParseError> {
        match node.kind() {
            "assignment_pattern" => {
                let left = self.field(node, "left")?;
                let right = self.field(node, "right")?;
                Ok(ArrayPatternElement {
                    target: self.read_pattern(left, assignment)?,
                    default: Some(self.read_expression(right)?),
                    rest: false,
                })
            }
            "rest_pattern" => {
                let inner = self.first_named(node)?;
                Ok(ArrayPatternElement {
                    target: self.read_pattern(inner, assignment)?,
                    default: None,
                    rest: true,
                })
            }
            _ => Ok(ArrayPatternElement {
                target: self.read_pattern(node, assignment)?,
                default: None,
                rest: false,
            }),
        }
    }

    fn read_object_pattern_property(
        &mut self,
        node: Node,
        assignment: bool,
    ) -> Result<ObjectPatternProperty, ParseError> {
        let id = self.id();
        let span = self.span(node);
        match node.kind() {
            "pair_pattern" => {
                let key = self.field(node, "key")?;
                let key = self.read_property_name(key)?;
                let value = self.field(node, "value")?;
                let (target, default) = if value.kind() == "assignment_pattern" {
                    let left = self.field(value, "left")?;
                    let right = self.field(value, "right")?;
                    (
                        self.read_pattern(left, assignment)?,
                        Some(self.read_expression(right)?),
                    )
                } else {
                    (self.read_pattern(value, assignment)?, None)
                };
                Ok(ObjectPatternProperty {
                    id,
                    span,
                    key: Some(key),
                    target,
                    default,
                })
            }
            "shorthand_property_identifier_pattern" => Ok(ObjectPatternProperty {
                id,
                span,
                key: Some(self.read_property_name(node)?),
                target: self.read_pattern(node, assignment)?,
                default: None,
            }),
            "object_assignment_pattern" => {
                let left = self.field(node, "left")?;
                let right = self.field(node, "right")?;
                Ok(ObjectPatternProperty {
                    id,
                    span,
                    key: Some(self.read_property_name(left)?),
                    target: self.read_pattern(left, assignment)?,
                    default: Some(self.read_expression(right)?),
                })
            }
            "rest_pattern" => {
                let inner = self.first_named(node)?;
                Ok(ObjectPatternProperty {
                    id,
                    span,
                    key: None,
                    target: self.read_pattern(inner, assignment)?,
                    default: None,
                })
            }
            other => Err(ParseError::UnexpectedNode {
                expected: "object pattern property".into(),
                got: other.into(),
            }),
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn read_type(&mut self, node: Node) -> Result<TypeNode, ParseError> {
        Ok(match node.kind() {
            "type_annotation" | "parenthesized_type" | "readonly_type" | "optional_type" => {
                let inner = self.first_named(node)?;
                self.read_type(inner)?
            }
            "predefined_type" => match self.text(node) {
                "any" => TypeNode::Any,
                "unknown" => TypeNode::Unknown,
                "never" => TypeNode::Never,
                "void" => TypeNode::Void,
                "undefined" => TypeNode::Undefined,
                "null" => TypeNode::Null,
                "number" => TypeNode::Number,
                "string" => TypeNode::String,
                "boolean" => TypeNode::Boolean,
                "object" => TypeNode::Object,
                "symbol" => TypeNode::Symbol,
                "bigint" => TypeNode::BigInt,
                _ => TypeNode::Other,
            },
            "type_identifier" | "nested_type_identifier" | "identifier" => TypeNode::Reference {
                name: self.text(node).to_string(),
                arguments: Vec::new(),
            },
            "generic_type" => {
                let name = self.field(node, "name")?;
                let mut arguments = Vec::new();
                if let Some(type_arguments) = node.child_by_field_name("type_arguments") {
                    for argument in self.named_children(type_arguments) {
                        arguments.push(self.read_type(argument)?);
                    }
                }
                TypeNode::Reference {
                    name: self.text(name).to_string(),
                    arguments,
                }
            }
            "array_type" => {
                let inner = self.first_named(node)?;
                TypeNode::Array(Box::new(self.read_type(inner)?))
            }
            "tuple_type" => {
                let mut elements = Vec::new();
                for child in self.named_children(node) {
                    let element = match child.kind() {
                        "required_parameter" | "optional_parameter" => {
                            match child.child_by_field_name("type") {
                                Some(annotation) => self.read_type(annotation)?,
                                None => TypeNode::Any,
                            }
                        }
                        "rest_type" => {
                            let inner = self.first_named(child)?;
                            self.read_type(inner)?
                        }
                        _ => self.read_type(child)?,
                    };
                    elements.push(element);
                }
                TypeNode::Tuple(elements)
            }
            "union_type" | "intersection_type" => {
                let mut members = Vec::new();
                for child in self.named_children(node) {
                    match self.read_type(child)? {
                        TypeNode::Union(inner) if node.kind() == "union_type" => {
                            members.extend(inner)
                        }
                        other => members.push(other),
                    }
                }
                if node.kind() == "union_type" {
                    TypeNode::Union(members)
                } else {
                    TypeNode::Intersection(members)
                }
            }
            "function_type" => TypeNode::Function(Box::new(self.read_function_type(node)?)),
            "literal_type" => {
                let inner = self.first_named(node)?;
                match inner.kind() {
                    "string" => TypeNode::StringLiteral(self.read_string_literal(inner)),
                    "number" => TypeNode::NumberLiteral(parse_number(self.text(inner))?),
                    "true" => TypeNode::BooleanLiteral(true),
                    "false" => TypeNode::BooleanLiteral(false),
                    "null" => TypeNode::Null,
                    "undefined" => TypeNode::Undefined,
                    "unary_expression" => {
                        let value = parse_number(self.text(inner).trim_start_matches('-').trim())?;
                        TypeNode::NumberLiteral(-value)
                    }
                    _ => TypeNode::Other,
                }
            }
            "object_type" => TypeNode::TypeLiteral(self.read_type_members(node)?),
            "this_type" => TypeNode::This,
            "type_query" => {
                let inner = self.first_named(node)?;
                TypeNode::TypeQuery(self.text(inner).to_string())
            }
            _ => TypeNode::Other,
        })
    }

    fn read_function_type(&mut self, node: Node) -> Result<FunctionTypeNode, ParseError> {
        let mut params = Vec::new();
        let mut this_param = None;
        if let Some(parameters) = node.child_by_field_name("parameters") {
            for child in self.named_children(parameters) {
                if !matches!(child.kind(), "required_parameter" | "optional_parameter") {
                    continue;
                }
                let type_node = match child.child_by_field_name("type") {
                    Some(annotation) => Some(self.read_type(annotation)?),
                    None => None,
                };
                let Some(pattern) = child
                    .child_by_field_name("pattern")
                    .or_else(|| child.child_by_field_name("name"))
                else {
                    continue;
                };
                if pattern.kind() == "this" {
                    this_param = Some(ThisParameter {
                        type_annotation: type_node,
                    });
                    continue;
                }
                params.push(ParameterType {
                    name: self.text(pattern).trim_start_matches("...").to_string(),
                    type_node,
                    rest: pattern.kind() == "rest_pattern",
                    optional: child.kind() == "optional_parameter",
                });
            }
        }
        let return_type = match node.child_by_field_name("return_type") {
            Some(annotation) => self.read_return_type(annotation)?,
            None => TypeNode::Any,
        };
        Ok(FunctionTypeNode {
            params,
            this_param,
            return_type,
        })
    }

    fn read_type_members(&mut self, node: Node) -> Result<Vec<TypeMember>, ParseError> {
        let mut members = Vec::new();
        for child in self.named_children(node) {
            match child.kind() {
                "property_signature" => {
                    let name = self.field(child, "name")?;
                    let name = self.read_property_name(name)?.text().unwrap_or_default();
                    let type_node = match child.child_by_field_name("type") {
                        Some(annotation) => Some(self.read_type(annotation)?),
                        None => None,
                    };
                    members.push(TypeMember {
                        name,
                        kind: TypeMemberKind::Property {
                            type_node,
                            optional: self.has_token(child, "?"),
                        },
                    });
                }
                "method_signature" => {
                    let name = self.field(child, "name")?;
                    let name = self.read_property_name(name)?.text().unwrap_or_default();
                    members.push(TypeMember {
                        name,
                        kind: TypeMemberKind::Method(self.read_function_type(child)?),
                    });
                }
                "call_signature" => members.push(TypeMember {
                    name: String::new(),
                    kind: TypeMemberKind::Call(self.read_function_type(child)?),
                }),
                _ => {}
            }
        }
        Ok(members)
    }
}

fn is_declaration_kind(kind: &str) -> bool {
    matches!(
        kind,
        "lexical_declaration"
            | "variable_declaration"
            | "function_declaration"
            | "generator_function_declaration"
            | "function_signature"
            | "class_declaration"
            | "abstract_class_declaration"
            | "enum_declaration"
            | "interface_declaration"
            | "type_alias_declaration"
            | "internal_module"
            | "module"
    )
}

/// Parse `@tag args` lines out of a comment.
fn parse_annotations(comment: &str) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    for line in comment.lines() {
        let line = line
            .trim()
            .trim_start_matches("/**")
            .trim_start_matches("/*")
            .trim_start_matches("//")
            .trim_start_matches('*')
            .trim_end_matches("*/")
            .trim();
        for part in line.split('@').skip(1) {
            let mut words = part.split_whitespace();
            let Some(tag) = words.next() else {
                continue;
            };
            if let Some(kind) = AnnotationKind::from_tag(tag) {
                annotations.push(Annotation {
                    kind,
                    args: words.map(str::to_string).collect(),
                });
            }
        }
    }
    annotations
}

fn parse_number(text: &str) -> Result<f64, ParseError> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let cleaned = cleaned.trim_end_matches('n');
    let lower = cleaned.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).map(|value| value as f64).ok()
    } else if let Some(binary) = lower.strip_prefix("0b") {
        u64::from_str_radix(binary, 2).map(|value| value as f64).ok()
    } else if let Some(octal) = lower.strip_prefix("0o") {
        u64::from_str_radix(octal, 8).map(|value| value as f64).ok()
    } else {
        lower.parse::<f64>().ok()
    };
    parsed.ok_or_else(|| ParseError::Parse(format!("invalid number: {}", text)))
}

/// Decode JavaScript string escapes.
pub(crate) fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            'b' => result.push('\u{8}'),
            'f' => result.push('\u{c}'),
            'v' => result.push('\u{b}'),
            '0' => result.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Some(decoded) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    result.push(decoded);
                }
            }
            'u' => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                if let Some(decoded) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    result.push(decoded);
                }
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' => {}
            other => result.push(other),
        }
    }
    result
}
