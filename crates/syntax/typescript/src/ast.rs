//! Owned TypeScript syntax tree.
//!
//! The reader lowers the tree-sitter CST into these types so that later
//! passes can hold plain references into the tree. Every node that can be
//! referenced by the checker carries a [`NodeId`] unique within its file.

/// Identity of a node within one [`SourceFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Byte range of a node plus the 0-based line/column of its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub file_name: String,
    pub text: String,
    pub statements: Vec<Statement>,
    /// Annotations from the leading comment of the file.
    pub annotations: Vec<Annotation>,
    /// Whether the file has a top-level import or export.
    pub is_module: bool,
    pub node_count: u32,
}

/// JSDoc tag read from the comment preceding a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    NoSelf,
    NoSelfInFile,
    Extension,
    MetaExtension,
    CustomConstructor,
    CompileMembersOnly,
}

impl AnnotationKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "noSelf" | "noself" => Some(AnnotationKind::NoSelf),
            "noSelfInFile" | "noselfinfile" => Some(AnnotationKind::NoSelfInFile),
            "extension" => Some(AnnotationKind::Extension),
            "metaExtension" => Some(AnnotationKind::MetaExtension),
            "customConstructor" => Some(AnnotationKind::CustomConstructor),
            "compileMembersOnly" => Some(AnnotationKind::CompileMembersOnly),
            _ => None,
        }
    }
}

pub fn find_annotation(annotations: &[Annotation], kind: AnnotationKind) -> Option<&Annotation> {
    annotations.iter().find(|annotation| annotation.kind == kind)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub export: bool,
    pub default: bool,
    pub declare: bool,
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub id: NodeId,
    pub span: Span,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Variable(VariableStatement),
    Function(FunctionDeclaration),
    Class(ClassDeclaration),
    Enum(EnumDeclaration),
    Interface(InterfaceDeclaration),
    TypeAlias(TypeAliasDeclaration),
    Namespace(NamespaceDeclaration),
    Import(ImportDeclaration),
    Export(ExportDeclaration),
    Expression(Expression),
    If(IfStatement),
    While(WhileStatement),
    DoWhile(WhileStatement),
    For(ForStatement),
    ForOf(ForOfStatement),
    ForIn(ForOfStatement),
    Return(Option<Expression>),
    Break(Option<Ident>),
    Continue(Option<Ident>),
    Throw(Expression),
    Try(TryStatement),
    Switch(SwitchStatement),
    Block(Vec<Statement>),
    Labeled(LabeledStatement),
    Empty,
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableStatement {
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub id: NodeId,
    pub span: Span,
    pub name: Pattern,
    pub type_annotation: Option<TypeNode>,
    pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Option<Ident>,
    pub function: Function,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: NodeId,
    pub span: Span,
    pub params: Vec<Parameter>,
    pub this_param: Option<ThisParameter>,
    /// `None` for overload signatures and ambient declarations.
    pub body: Option<FunctionBody>,
    pub return_type: Option<TypeNode>,
    pub is_arrow: bool,
    pub is_async: bool,
    pub is_generator: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    Expression(Box<Expression>),
}

/// Explicit `this` parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ThisParameter {
    pub type_annotation: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: NodeId,
    pub span: Span,
    pub pattern: Pattern,
    pub type_annotation: Option<TypeNode>,
    pub default: Option<Expression>,
    pub rest: bool,
    pub optional: bool,
    /// Constructor parameter property (`private x: number`).
    pub is_property: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    pub id: NodeId,
    pub span: Span,
    pub name: Option<Ident>,
    pub extends: Option<Expression>,
    pub members: Vec<ClassMember>,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub is_abstract: bool,
}

impl ClassDeclaration {
    pub fn constructor(&self) -> Option<&Function> {
        self.members.iter().find_map(|member| match &member.kind {
            ClassMemberKind::Constructor(function) if function.body.is_some() => Some(function),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub id: NodeId,
    pub span: Span,
    pub is_static: bool,
    pub kind: ClassMemberKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMemberKind {
    Constructor(Function),
    Method {
        name: PropertyName,
        function: Function,
    },
    Getter {
        name: PropertyName,
        function: Function,
    },
    Setter {
        name: PropertyName,
        function: Function,
    },
    Property {
        name: PropertyName,
        type_annotation: Option<TypeNode>,
        initializer: Option<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyName {
    pub id: NodeId,
    pub span: Span,
    pub kind: PropertyNameKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyNameKind {
    Identifier(String),
    String(String),
    Number(f64),
    Computed(Box<Expression>),
}

impl PropertyName {
    /// Static text of the name, if it is not computed.
    pub fn text(&self) -> Option<String> {
        match &self.kind {
            PropertyNameKind::Identifier(name) | PropertyNameKind::String(name) => {
                Some(name.clone())
            }
            PropertyNameKind::Number(value) => Some(format_number(*value)),
            PropertyNameKind::Computed(_) => None,
        }
    }
}

/// Render a number the way JavaScript's `String(n)` does for common values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDeclaration {
    pub name: Ident,
    pub members: Vec<EnumMember>,
    pub is_const: bool,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub id: NodeId,
    pub span: Span,
    pub name: PropertyName,
    pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDeclaration {
    pub name: Ident,
    pub extends: Vec<TypeNode>,
    pub members: Vec<TypeMember>,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDeclaration {
    pub name: Ident,
    pub value: TypeNode,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDeclaration {
    pub name: Ident,
    pub body: Vec<Statement>,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub source: String,
    pub default: Option<Ident>,
    pub namespace: Option<Ident>,
    pub named: Vec<ImportSpecifier>,
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportDeclaration {
    /// `export { a, b as c }`, optionally re-exported `from` a module.
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<String>,
    },
    /// `export * from "m"`.
    All { source: String },
    /// `export default <expression>`.
    Default(Expression),
    /// `export = <expression>`.
    Assignment(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    /// Local binding, an identifier expression so it resolves like any reference.
    pub local: Expression,
    pub local_name: String,
    pub exported: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub initializer: Option<ForInitializer>,
    pub condition: Option<Expression>,
    pub incrementor: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInitializer {
    Variable(VariableStatement),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForOfStatement {
    pub binding: ForBinding,
    pub expression: Expression,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForBinding {
    /// `for (const x of ...)`.
    Declaration(VariableKind, Pattern),
    /// `for (x of ...)` assigning to an existing target.
    Target(Pattern),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub block: Box<Statement>,
    pub catch_clause: Option<CatchClause>,
    pub finally_block: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub id: NodeId,
    pub span: Span,
    pub parameter: Option<Pattern>,
    pub block: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub expression: Expression,
    pub clauses: Vec<SwitchClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchClause {
    pub id: NodeId,
    pub span: Span,
    /// `None` for `default:`.
    pub test: Option<Expression>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStatement {
    pub label: Ident,
    pub body: Box<Statement>,
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Identifier(String),
    Number(f64),
    String(String),
    Template(TemplateLiteral),
    Boolean(bool),
    Null,
    Undefined,
    This,
    Super,
    Array(Vec<Expression>),
    Object(Vec<ObjectMember>),
    Function(Box<Function>),
    Class(Box<ClassDeclaration>),
    Call(CallExpression),
    New(NewExpression),
    PropertyAccess(PropertyAccess),
    ElementAccess(ElementAccess),
    Assignment(Assignment),
    CompoundAssignment(CompoundAssignment),
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    Update(UpdateExpression),
    Conditional(ConditionalExpression),
    Parenthesized(Box<Expression>),
    /// `as`, `satisfies`, `!` and `<T>` assertions.
    Assertion(Box<Expression>, Option<TypeNode>),
    Await(Box<Expression>),
    Yield(Option<Box<Expression>>),
    Sequence(Vec<Expression>),
    Spread(Box<Expression>),
    /// Hole in an array literal.
    Omitted,
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLiteral {
    /// Literal text around the substitutions; always one longer than `expressions`.
    pub quasis: Vec<String>,
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMember {
    pub id: NodeId,
    pub span: Span,
    pub kind: ObjectMemberKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMemberKind {
    Property { key: PropertyName, value: Expression },
    /// `{ x }`; the value is an identifier reference.
    Shorthand(Expression),
    Method { key: PropertyName, function: Function },
    Accessor { key: PropertyName, function: Function },
    Spread(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccess {
    pub object: Box<Expression>,
    pub name: Ident,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementAccess {
    pub object: Box<Expression>,
    pub index: Box<Expression>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub left: Box<Pattern>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundAssignment {
    pub operator: CompoundOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    LogicalAnd,
    LogicalOr,
    Coalesce,
}

impl CompoundOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+=" => CompoundOperator::Add,
            "-=" => CompoundOperator::Sub,
            "*=" => CompoundOperator::Mul,
            "/=" => CompoundOperator::Div,
            "%=" => CompoundOperator::Mod,
            "**=" => CompoundOperator::Pow,
            "&=" => CompoundOperator::BitwiseAnd,
            "|=" => CompoundOperator::BitwiseOr,
            "^=" => CompoundOperator::BitwiseXor,
            "<<=" => CompoundOperator::ShiftLeft,
            ">>=" => CompoundOperator::ShiftRight,
            ">>>=" => CompoundOperator::UnsignedShiftRight,
            "&&=" => CompoundOperator::LogicalAnd,
            "||=" => CompoundOperator::LogicalOr,
            "??=" => CompoundOperator::Coalesce,
            _ => return None,
        })
    }

    /// Binary operator applied by the compound form.
    pub fn binary_operator(self) -> BinaryOperator {
        match self {
            CompoundOperator::Add => BinaryOperator::Add,
            CompoundOperator::Sub => BinaryOperator::Sub,
            CompoundOperator::Mul => BinaryOperator::Mul,
            CompoundOperator::Div => BinaryOperator::Div,
            CompoundOperator::Mod => BinaryOperator::Mod,
            CompoundOperator::Pow => BinaryOperator::Pow,
            CompoundOperator::BitwiseAnd => BinaryOperator::BitwiseAnd,
            CompoundOperator::BitwiseOr => BinaryOperator::BitwiseOr,
            CompoundOperator::BitwiseXor => BinaryOperator::BitwiseXor,
            CompoundOperator::ShiftLeft => BinaryOperator::ShiftLeft,
            CompoundOperator::ShiftRight => BinaryOperator::ShiftRight,
            CompoundOperator::UnsignedShiftRight => BinaryOperator::UnsignedShiftRight,
            CompoundOperator::LogicalAnd => BinaryOperator::LogicalAnd,
            CompoundOperator::LogicalOr => BinaryOperator::LogicalOr,
            CompoundOperator::Coalesce => BinaryOperator::Coalesce,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    Coalesce,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    In,
    InstanceOf,
}

impl BinaryOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Sub,
            "*" => BinaryOperator::Mul,
            "/" => BinaryOperator::Div,
            "%" => BinaryOperator::Mod,
            "**" => BinaryOperator::Pow,
            "==" => BinaryOperator::Equal,
            "!=" => BinaryOperator::NotEqual,
            "===" => BinaryOperator::StrictEqual,
            "!==" => BinaryOperator::StrictNotEqual,
            "<" => BinaryOperator::Less,
            "<=" => BinaryOperator::LessEqual,
            ">" => BinaryOperator::Greater,
            ">=" => BinaryOperator::GreaterEqual,
            "&&" => BinaryOperator::LogicalAnd,
            "||" => BinaryOperator::LogicalOr,
            "??" => BinaryOperator::Coalesce,
            "&" => BinaryOperator::BitwiseAnd,
            "|" => BinaryOperator::BitwiseOr,
            "^" => BinaryOperator::BitwiseXor,
            "<<" => BinaryOperator::ShiftLeft,
            ">>" => BinaryOperator::ShiftRight,
            ">>>" => BinaryOperator::UnsignedShiftRight,
            "in" => BinaryOperator::In,
            "instanceof" => BinaryOperator::InstanceOf,
            _ => return None,
        })
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOperator::BitwiseAnd
                | BinaryOperator::BitwiseOr
                | BinaryOperator::BitwiseXor
                | BinaryOperator::ShiftLeft
                | BinaryOperator::ShiftRight
                | BinaryOperator::UnsignedShiftRight
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(
            self,
            BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr | BinaryOperator::Coalesce
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
    BitwiseNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    pub increment: bool,
    pub prefix: bool,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    pub condition: Box<Expression>,
    pub when_true: Box<Expression>,
    pub when_false: Box<Expression>,
}

impl Expression {
    /// Skip parentheses and type assertions.
    pub fn skip_outer(&self) -> &Expression {
        match &self.kind {
            ExpressionKind::Parenthesized(inner) | ExpressionKind::Assertion(inner, _) => {
                inner.skip_outer()
            }
            _ => self,
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

// =============================================================================
// Patterns
// =============================================================================

/// Binding or assignment target.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub id: NodeId,
    pub span: Span,
    pub kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    Identifier(String),
    /// `None` elements are holes.
    Array(Vec<Option<ArrayPatternElement>>),
    Object(Vec<ObjectPatternProperty>),
    /// Property or element access target in an assignment.
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPatternElement {
    pub target: Pattern,
    pub default: Option<Expression>,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatternProperty {
    pub id: NodeId,
    pub span: Span,
    /// `None` for a rest element.
    pub key: Option<PropertyName>,
    pub target: Pattern,
    pub default: Option<Expression>,
}

impl Pattern {
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            PatternKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Identifier patterns declared by this pattern, in source order.
    pub fn bound_names(&self) -> Vec<&Pattern> {
        let mut names = Vec::new();
        self.collect_bound_names(&mut names);
        names
    }

    fn collect_bound_names<'a>(&'a self, names: &mut Vec<&'a Pattern>) {
        match &self.kind {
            PatternKind::Identifier(_) => names.push(self),
            PatternKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    element.target.collect_bound_names(names);
                }
            }
            PatternKind::Object(properties) => {
                for property in properties {
                    property.target.collect_bound_names(names);
                }
            }
            PatternKind::Expression(_) => {}
        }
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Any,
    Unknown,
    Never,
    Void,
    Undefined,
    Null,
    Number,
    String,
    Boolean,
    Object,
    Symbol,
    BigInt,
    This,
    Reference {
        name: String,
        arguments: Vec<TypeNode>,
    },
    Array(Box<TypeNode>),
    Tuple(Vec<TypeNode>),
    Union(Vec<TypeNode>),
    Intersection(Vec<TypeNode>),
    Function(Box<FunctionTypeNode>),
    StringLiteral(String),
    NumberLiteral(f64),
    BooleanLiteral(bool),
    TypeLiteral(Vec<TypeMember>),
    TypeQuery(String),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTypeNode {
    pub params: Vec<ParameterType>,
    pub this_param: Option<ThisParameter>,
    pub return_type: TypeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterType {
    pub name: String,
    pub type_node: Option<TypeNode>,
    pub rest: bool,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeMember {
    pub name: String,
    pub kind: TypeMemberKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeMemberKind {
    Property {
        type_node: Option<TypeNode>,
        optional: bool,
    },
    Method(FunctionTypeNode),
    Call(FunctionTypeNode),
}

// =============================================================================
// Dispatch kinds
// =============================================================================

/// Syntactic kind used as the visitor dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyntaxKind {
    VariableStatement,
    FunctionDeclaration,
    ClassDeclaration,
    EnumDeclaration,
    InterfaceDeclaration,
    TypeAliasDeclaration,
    ModuleDeclaration,
    ImportDeclaration,
    ExportDeclaration,
    ExpressionStatement,
    IfStatement,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForOfStatement,
    ForInStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    ThrowStatement,
    TryStatement,
    SwitchStatement,
    Block,
    LabeledStatement,
    EmptyStatement,
    Identifier,
    NumericLiteral,
    StringLiteral,
    TemplateExpression,
    TrueKeyword,
    FalseKeyword,
    NullKeyword,
    UndefinedKeyword,
    ThisKeyword,
    SuperKeyword,
    ArrayLiteralExpression,
    ObjectLiteralExpression,
    FunctionExpression,
    ArrowFunction,
    ClassExpression,
    CallExpression,
    NewExpression,
    PropertyAccessExpression,
    ElementAccessExpression,
    BinaryExpression,
    PrefixUnaryExpression,
    PostfixUnaryExpression,
    TypeOfExpression,
    VoidExpression,
    DeleteExpression,
    ConditionalExpression,
    ParenthesizedExpression,
    AsExpression,
    AwaitExpression,
    YieldExpression,
    CommaListExpression,
    SpreadElement,
    OmittedExpression,
    Unknown,
}

impl Statement {
    pub fn syntax_kind(&self) -> SyntaxKind {
        match &self.kind {
            StatementKind::Variable(_) => SyntaxKind::VariableStatement,
            StatementKind::Function(_) => SyntaxKind::FunctionDeclaration,
            StatementKind::Class(_) => SyntaxKind::ClassDeclaration,
            StatementKind::Enum(_) => SyntaxKind::EnumDeclaration,
            StatementKind::Interface(_) => SyntaxKind::InterfaceDeclaration,
            StatementKind::TypeAlias(_) => SyntaxKind::TypeAliasDeclaration,
            StatementKind::Namespace(_) => SyntaxKind::ModuleDeclaration,
            StatementKind::Import(_) => SyntaxKind::ImportDeclaration,
            StatementKind::Export(_) => SyntaxKind::ExportDeclaration,
            StatementKind::Expression(_) => SyntaxKind::ExpressionStatement,
            StatementKind::If(_) => SyntaxKind::IfStatement,
            StatementKind::While(_) => SyntaxKind::WhileStatement,
            StatementKind::DoWhile(_) => SyntaxKind::DoStatement,
            StatementKind::For(_) => SyntaxKind::ForStatement,
            StatementKind::ForOf(_) => SyntaxKind::ForOfStatement,
            StatementKind::ForIn(_) => SyntaxKind::ForInStatement,
            StatementKind::Return(_) => SyntaxKind::ReturnStatement,
            StatementKind::Break(_) => SyntaxKind::BreakStatement,
            StatementKind::Continue(_) => SyntaxKind::ContinueStatement,
            StatementKind::Throw(_) => SyntaxKind::ThrowStatement,
            StatementKind::Try(_) => SyntaxKind::TryStatement,
            StatementKind::Switch(_) => SyntaxKind::SwitchStatement,
            StatementKind::Block(_) => SyntaxKind::Block,
            StatementKind::Labeled(_) => SyntaxKind::LabeledStatement,
            StatementKind::Empty => SyntaxKind::EmptyStatement,
            StatementKind::Unsupported(_) => SyntaxKind::Unknown,
        }
    }
}

impl Expression {
    pub fn syntax_kind(&self) -> SyntaxKind {
        match &self.kind {
            ExpressionKind::Identifier(_) => SyntaxKind::Identifier,
            ExpressionKind::Number(_) => SyntaxKind::NumericLiteral,
            ExpressionKind::String(_) => SyntaxKind::StringLiteral,
            ExpressionKind::Template(_) => SyntaxKind::TemplateExpression,
            ExpressionKind::Boolean(true) => SyntaxKind::TrueKeyword,
            ExpressionKind::Boolean(false) => SyntaxKind::FalseKeyword,
            ExpressionKind::Null => SyntaxKind::NullKeyword,
            ExpressionKind::Undefined => SyntaxKind::UndefinedKeyword,
            ExpressionKind::This => SyntaxKind::ThisKeyword,
            ExpressionKind::Super => SyntaxKind::SuperKeyword,
            ExpressionKind::Array(_) => SyntaxKind::ArrayLiteralExpression,
            ExpressionKind::Object(_) => SyntaxKind::ObjectLiteralExpression,
            ExpressionKind::Function(function) if function.is_arrow => SyntaxKind::ArrowFunction,
            ExpressionKind::Function(_) => SyntaxKind::FunctionExpression,
            ExpressionKind::Class(_) => SyntaxKind::ClassExpression,
            ExpressionKind::Call(_) => SyntaxKind::CallExpression,
            ExpressionKind::New(_) => SyntaxKind::NewExpression,
            ExpressionKind::PropertyAccess(_) => SyntaxKind::PropertyAccessExpression,
            ExpressionKind::ElementAccess(_) => SyntaxKind::ElementAccessExpression,
            ExpressionKind::Assignment(_)
            | ExpressionKind::CompoundAssignment(_)
            | ExpressionKind::Binary(_) => SyntaxKind::BinaryExpression,
            ExpressionKind::Unary(unary) => match unary.operator {
                UnaryOperator::TypeOf => SyntaxKind::TypeOfExpression,
                UnaryOperator::Void => SyntaxKind::VoidExpression,
                UnaryOperator::Delete => SyntaxKind::DeleteExpression,
                _ => SyntaxKind::PrefixUnaryExpression,
            },
            ExpressionKind::Update(update) if update.prefix => SyntaxKind::PrefixUnaryExpression,
            ExpressionKind::Update(_) => SyntaxKind::PostfixUnaryExpression,
            ExpressionKind::Conditional(_) => SyntaxKind::ConditionalExpression,
            ExpressionKind::Parenthesized(_) => SyntaxKind::ParenthesizedExpression,
            ExpressionKind::Assertion(..) => SyntaxKind::AsExpression,
            ExpressionKind::Await(_) => SyntaxKind::AwaitExpression,
            ExpressionKind::Yield(_) => SyntaxKind::YieldExpression,
            ExpressionKind::Sequence(_) => SyntaxKind::CommaListExpression,
            ExpressionKind::Spread(_) => SyntaxKind::SpreadElement,
            ExpressionKind::Omitted => SyntaxKind::OmittedExpression,
            ExpressionKind::Unsupported(_) => SyntaxKind::Unknown,
        }
    }
}
