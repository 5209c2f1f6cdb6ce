//! Lua AST to text.

use rhizome_tslua_ast::{
    BinaryOperator, Block, ElseBranch, Expression, ExpressionKind, FunctionExpression, Identifier,
    IfStatement, NodeFlags, SourceRange, Statement, StatementKind, TableField, UNARY_PRECEDENCE,
    UnaryOperator, is_valid_lua_identifier,
};

use crate::source_map::Mapping;

const INDENT: &str = "    ";

/// Binding strength of atoms and prefix expressions.
const ATOM_PRECEDENCE: u8 = 13;

/// Writes Lua text while tracking the generated position of every node that
/// carries a source range.
pub struct LuaPrinter {
    output: String,
    indent: String,
    line: u32,
    column: u32,
    mappings: Vec<Mapping>,
}

impl Default for LuaPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl LuaPrinter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: String::new(),
            line: 0,
            column: 0,
            mappings: Vec::new(),
        }
    }

    /// Text and mappings printed so far.
    pub fn finish(self) -> (String, Vec<Mapping>) {
        (self.output, self.mappings)
    }

    pub fn write(&mut self, text: &str) {
        match text.rfind('\n') {
            Some(last) => {
                self.line += text.matches('\n').count() as u32;
                self.column = (text.len() - last - 1) as u32;
            }
            None => self.column += text.len() as u32,
        }
        self.output.push_str(text);
    }

    fn newline(&mut self) {
        self.write("\n");
    }

    fn write_indent(&mut self) {
        let indent = std::mem::take(&mut self.indent);
        self.write(&indent);
        self.indent = indent;
    }

    fn push_indent(&mut self) {
        self.indent.push_str(INDENT);
    }

    fn pop_indent(&mut self) {
        let len = self.indent.len().saturating_sub(INDENT.len());
        self.indent.truncate(len);
    }

    /// Map the current generated position to `range`. The outermost node
    /// starting at a position wins.
    fn mark(&mut self, range: Option<SourceRange>, name: Option<&str>) {
        let Some(range) = range else {
            return;
        };
        if self
            .mappings
            .last()
            .is_some_and(|last| last.generated_line == self.line && last.generated_column == self.column)
        {
            return;
        }
        self.mappings.push(Mapping {
            generated_line: self.line,
            generated_column: self.column,
            original_line: range.line,
            original_column: range.column,
            name: name.map(str::to_string),
        });
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Print a block's statements. Anything after a `return` or `break` is
    /// unreachable and not valid Lua, so it is dropped.
    pub fn print_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.print_statement(statement);
            if matches!(statement.kind, StatementKind::Return(_) | StatementKind::Break) {
                break;
            }
        }
    }

    fn print_nested_block(&mut self, block: &Block) {
        self.push_indent();
        self.print_statements(&block.statements);
        self.pop_indent();
    }

    pub fn print_statement(&mut self, statement: &Statement) {
        self.write_indent();
        self.mark(statement.range, None);
        match &statement.kind {
            StatementKind::Do(block) => {
                self.write("do");
                self.newline();
                self.print_nested_block(block);
                self.write_indent();
                self.write("end");
            }
            StatementKind::VariableDeclaration { left, right } => {
                self.print_variable_declaration(left, right);
            }
            StatementKind::Assignment { left, right } => self.print_assignment(left, right),
            StatementKind::If(statement) => {
                self.write("if ");
                self.print_if(statement);
                self.write_indent();
                self.write("end");
            }
            StatementKind::While { condition, body } => {
                self.write("while ");
                self.print_expression(condition);
                self.write(" do");
                self.newline();
                self.print_nested_block(body);
                self.write_indent();
                self.write("end");
            }
            StatementKind::Repeat { body, condition } => {
                self.write("repeat");
                self.newline();
                self.print_nested_block(body);
                self.write_indent();
                self.write("until ");
                self.print_expression(condition);
            }
            StatementKind::NumericFor {
                control,
                start,
                limit,
                step,
                body,
            } => {
                self.write("for ");
                self.print_identifier(control);
                self.write(" = ");
                self.print_expression(start);
                self.write(", ");
                self.print_expression(limit);
                if let Some(step) = step {
                    self.write(", ");
                    self.print_expression(step);
                }
                self.write(" do");
                self.newline();
                self.print_nested_block(body);
                self.write_indent();
                self.write("end");
            }
            StatementKind::ForIn {
                names,
                expressions,
                body,
            } => {
                self.write("for ");
                self.print_identifiers(names);
                self.write(" in ");
                self.print_expression_list(expressions);
                self.write(" do");
                self.newline();
                self.print_nested_block(body);
                self.write_indent();
                self.write("end");
            }
            StatementKind::Goto(label) => {
                self.write("goto ");
                self.write(label);
                self.write(";");
            }
            StatementKind::Label(label) => {
                self.write("::");
                self.write(label);
                self.write("::");
            }
            StatementKind::Return(expressions) => {
                self.write("return");
                if !expressions.is_empty() {
                    self.write(" ");
                    self.print_expression_list(expressions);
                }
                self.write(";");
            }
            StatementKind::Break => self.write("break;"),
            StatementKind::Expression(expression) => {
                self.print_expression(expression);
                self.write(";");
            }
        }
        self.newline();
    }

    fn print_variable_declaration(&mut self, left: &[Identifier], right: &[Expression]) {
        if let ([name], [value]) = (left, right)
            && let Some(function) = declared_function(value)
        {
            self.write("local function ");
            self.print_identifier(name);
            self.print_function_rest(function, value.flags);
            return;
        }
        self.write("local ");
        self.print_identifiers(left);
        if !right.is_empty() {
            self.write(" = ");
            self.print_expression_list(right);
        }
        self.write(";");
    }

    fn print_assignment(&mut self, left: &[Expression], right: &[Expression]) {
        if let ([target], [value]) = (left, right)
            && let Some(function) = declared_function(value)
            && let Some(path) = function_name_path(target)
        {
            self.write("function ");
            self.mark(target.range, None);
            self.write(&path);
            self.print_function_rest(function, value.flags);
            return;
        }
        self.print_expression_list(left);
        self.write(" = ");
        self.print_expression_list(right);
        self.write(";");
    }

    /// Everything after the `if`/`elseif` keyword, up to but excluding `end`.
    fn print_if(&mut self, statement: &IfStatement) {
        self.print_expression(&statement.condition);
        self.write(" then");
        self.newline();
        self.print_nested_block(&statement.then_block);
        match &statement.else_branch {
            Some(ElseBranch::ElseIf(next)) => {
                self.write_indent();
                self.write("elseif ");
                self.print_if(next);
            }
            Some(ElseBranch::Block(block)) => {
                self.write_indent();
                self.write("else");
                self.newline();
                self.print_nested_block(block);
            }
            None => {}
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn print_expression(&mut self, expression: &Expression) {
        let name = expression.as_identifier().map(|identifier| {
            identifier
                .original_name
                .clone()
                .unwrap_or_else(|| identifier.text.clone())
        });
        self.mark(expression.range, name.as_deref());
        match &expression.kind {
            ExpressionKind::Nil => self.write("nil"),
            ExpressionKind::Boolean(value) => self.write(if *value { "true" } else { "false" }),
            ExpressionKind::Number(value) => self.write(&format_number(*value)),
            ExpressionKind::String(value) => self.write(&escape_string(value)),
            ExpressionKind::Dots => self.write("..."),
            ExpressionKind::Function(function) => {
                self.write("function");
                self.print_function_rest(function, expression.flags);
            }
            ExpressionKind::Table(fields) => self.print_table(fields),
            ExpressionKind::Unary { operator, operand } => {
                self.write(operator.token());
                let clashes = *operator == UnaryOperator::Negate && starts_with_minus(operand);
                self.print_operand(operand, clashes || precedence(operand) < UNARY_PRECEDENCE);
            }
            ExpressionKind::Binary {
                operator,
                left,
                right,
            } => self.print_binary(*operator, left, right),
            ExpressionKind::Parenthesized(inner) => {
                self.write("(");
                self.print_expression(inner);
                self.write(")");
            }
            ExpressionKind::Call { callee, arguments } => {
                self.print_prefix(callee);
                self.write("(");
                self.print_expression_list(arguments);
                self.write(")");
            }
            ExpressionKind::MethodCall {
                receiver,
                name,
                arguments,
            } => {
                self.print_prefix(receiver);
                self.write(":");
                self.write(name);
                self.write("(");
                self.print_expression_list(arguments);
                self.write(")");
            }
            ExpressionKind::Identifier(identifier) => self.write(&identifier.text),
            ExpressionKind::TableIndex { table, index } => {
                self.print_prefix(table);
                match index.as_string() {
                    Some(name) if is_valid_lua_identifier(name) => {
                        self.write(".");
                        self.write(name);
                    }
                    _ => {
                        self.write("[");
                        self.print_expression(index);
                        self.write("]");
                    }
                }
            }
        }
    }

    fn print_binary(&mut self, operator: BinaryOperator, left: &Expression, right: &Expression) {
        let own = operator.precedence();
        let right_associative = operator.is_right_associative();
        let left_precedence = precedence(left);
        let right_precedence = precedence(right);
        self.print_operand(
            left,
            left_precedence < own || (left_precedence == own && right_associative),
        );
        self.write(" ");
        self.write(operator.token());
        self.write(" ");
        self.print_operand(
            right,
            right_precedence < own || (right_precedence == own && !right_associative),
        );
    }

    fn print_operand(&mut self, operand: &Expression, parenthesize: bool) {
        if parenthesize {
            self.write("(");
            self.print_expression(operand);
            self.write(")");
        } else {
            self.print_expression(operand);
        }
    }

    /// Call targets and indexed tables must be Lua prefix expressions.
    fn print_prefix(&mut self, expression: &Expression) {
        let is_prefix = matches!(
            expression.kind,
            ExpressionKind::Identifier(_)
                | ExpressionKind::Call { .. }
                | ExpressionKind::MethodCall { .. }
                | ExpressionKind::TableIndex { .. }
                | ExpressionKind::Parenthesized(_)
        );
        self.print_operand(expression, !is_prefix);
    }

    fn print_table(&mut self, fields: &[TableField]) {
        if fields.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{");
        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            match &field.key {
                None => {}
                Some(key) => match key.as_string() {
                    Some(name) if is_valid_lua_identifier(name) => {
                        self.mark(key.range, None);
                        self.write(name);
                        self.write(" = ");
                    }
                    _ => {
                        self.write("[");
                        self.print_expression(key);
                        self.write("] = ");
                    }
                },
            }
            self.print_expression(&field.value);
        }
        self.write("}");
    }

    /// Parameter list and body of a function, after `function` or its name.
    fn print_function_rest(&mut self, function: &FunctionExpression, flags: NodeFlags) {
        self.write("(");
        self.print_identifiers(&function.params);
        if function.dots {
            if !function.params.is_empty() {
                self.write(", ");
            }
            self.write("...");
        }
        self.write(")");

        if flags.contains(NodeFlags::INLINE)
            && let [statement] = function.body.statements.as_slice()
            && let StatementKind::Return(values) = &statement.kind
        {
            self.write(" ");
            self.mark(statement.range, None);
            self.write("return");
            if !values.is_empty() {
                self.write(" ");
                self.print_expression_list(values);
            }
            self.write(" end");
            return;
        }

        self.newline();
        self.print_nested_block(&function.body);
        self.write_indent();
        self.write("end");
    }

    fn print_identifier(&mut self, identifier: &Identifier) {
        self.mark(identifier.range, identifier.original_name.as_deref().or(Some(identifier.text.as_str())));
        self.write(&identifier.text);
    }

    fn print_identifiers(&mut self, identifiers: &[Identifier]) {
        for (index, identifier) in identifiers.iter().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            self.print_identifier(identifier);
        }
    }

    fn print_expression_list(&mut self, expressions: &[Expression]) {
        for (index, expression) in expressions.iter().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            self.print_expression(expression);
        }
    }
}

/// The function a declaration-flagged value holds.
fn declared_function(value: &Expression) -> Option<&FunctionExpression> {
    match &value.kind {
        ExpressionKind::Function(function) if value.flags.contains(NodeFlags::DECLARATION) => Some(function),
        _ => None,
    }
}

/// `a.b.c` when `target` can be written as a `function a.b.c()` name.
fn function_name_path(target: &Expression) -> Option<String> {
    match &target.kind {
        ExpressionKind::Identifier(identifier) => Some(identifier.text.clone()),
        ExpressionKind::TableIndex { table, index } => {
            let name = index.as_string().filter(|name| is_valid_lua_identifier(name))?;
            let table = function_name_path(table)?;
            Some(format!("{}.{}", table, name))
        }
        _ => None,
    }
}

fn precedence(expression: &Expression) -> u8 {
    match &expression.kind {
        ExpressionKind::Binary { operator, .. } => operator.precedence(),
        ExpressionKind::Unary { .. } => UNARY_PRECEDENCE,
        ExpressionKind::Number(value) if value.is_sign_negative() && !value.is_nan() => UNARY_PRECEDENCE,
        _ => ATOM_PRECEDENCE,
    }
}

/// Whether printing `expression` right after a `-` would start a comment.
fn starts_with_minus(expression: &Expression) -> bool {
    match &expression.kind {
        ExpressionKind::Unary { operator, .. } => *operator == UnaryOperator::Negate,
        ExpressionKind::Number(value) => format_number(*value).starts_with('-'),
        _ => false,
    }
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "(0/0)".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "math.huge" } else { "-math.huge" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else if value.fract() == 0.0 {
        format!("{:e}", value)
    } else {
        format!("{}", value)
    }
}

/// Double-quoted Lua string literal.
pub fn escape_string(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\'' => result.push_str("\\'"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\u{b}' => result.push_str("\\v"),
            '\u{8}' => result.push_str("\\b"),
            '\u{c}' => result.push_str("\\f"),
            '\0' if !chars.peek().is_some_and(char::is_ascii_digit) => result.push_str("\\0"),
            c if c.is_control() && (c as u32) < 0x80 => result.push_str(&format!("\\{:03}", c as u32)),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}
