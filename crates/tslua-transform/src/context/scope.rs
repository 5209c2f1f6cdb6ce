//! Lexical scopes tracked while lowering.

use std::collections::{HashMap, HashSet};

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript::{NodeId, Span, SymbolId};

use crate::walk::Reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeType {
    File,
    Function,
    Block,
    Loop,
    Switch,
    Try,
    Catch,
    Conditional,
}

/// A function declaration found in a block and what its body refers to.
#[derive(Debug, Clone, Default)]
pub struct FunctionDefinition {
    pub position: u32,
    pub referenced_symbols: HashSet<SymbolId>,
}

#[derive(Debug)]
pub struct Scope {
    pub id: usize,
    pub kind: ScopeType,
    /// Function node that opened a function scope.
    pub function: Option<NodeId>,
    pub is_async: bool,
    pub is_generator: bool,
    /// The function returns several Lua values.
    pub multi_return: bool,
    /// First reference of every symbol referenced in the block.
    pub referenced_symbols: HashMap<SymbolId, Span>,
    /// Variables, classes and enums declared directly in the block.
    pub variable_declarations: Vec<SymbolId>,
    pub function_definitions: HashMap<SymbolId, FunctionDefinition>,
    /// Declarations whose binding moves to the top of the block.
    pub hoisted: HashSet<SymbolId>,
    pub hoisted_identifiers: Vec<lua::Identifier>,
    pub hoisted_functions: Vec<lua::Statement>,
    pub import_statements: Vec<lua::Statement>,
    /// A `continue` targets this loop.
    pub loop_continued: bool,
    /// A `return` inside this try or catch body has to be forwarded.
    pub try_has_return: bool,
    pub(crate) references: Vec<Reference>,
}

impl Scope {
    pub fn new(id: usize, kind: ScopeType) -> Self {
        Self {
            id,
            kind,
            function: None,
            is_async: false,
            is_generator: false,
            multi_return: false,
            referenced_symbols: HashMap::new(),
            variable_declarations: Vec::new(),
            function_definitions: HashMap::new(),
            hoisted: HashSet::new(),
            hoisted_identifiers: Vec::new(),
            hoisted_functions: Vec::new(),
            import_statements: Vec::new(),
            loop_continued: false,
            try_has_return: false,
            references: Vec::new(),
        }
    }

    pub fn is_hoisted(&self, symbol: SymbolId) -> bool {
        self.hoisted.contains(&symbol)
    }

    /// Number of functions this block hoists.
    pub fn hoisted_function_count(&self) -> usize {
        self.function_definitions
            .keys()
            .filter(|symbol| self.hoisted.contains(symbol))
            .count()
    }

    /// Prepend imports and hoisted declarations to the block's statements.
    pub fn finish(self, statements: Vec<lua::Statement>) -> Vec<lua::Statement> {
        let mut result = self.import_statements;
        if !self.hoisted_identifiers.is_empty() {
            result.push(lua::Statement::local(self.hoisted_identifiers, Vec::new()));
        }
        result.extend(self.hoisted_functions);
        result.extend(statements);
        result
    }
}

/// Decide which declarations of a block must be hoisted.
///
/// A function is hoisted when it is referenced before its declaration or
/// from another hoisted function. A variable is hoisted when it is referenced
/// before its declaration or from a hoisted function.
pub(crate) fn plan_hoisting(scope: &Scope, variables: &[(SymbolId, u32)]) -> HashSet<SymbolId> {
    let referenced_before = |symbol: SymbolId, position: u32| {
        scope
            .references
            .iter()
            .any(|reference| reference.symbol == symbol && reference.span.start < position)
    };

    let mut hoisted: HashSet<SymbolId> = scope
        .function_definitions
        .iter()
        .filter(|(symbol, definition)| referenced_before(**symbol, definition.position))
        .map(|(symbol, _)| *symbol)
        .collect();
    loop {
        let reached: Vec<SymbolId> = hoisted
            .iter()
            .filter_map(|symbol| scope.function_definitions.get(symbol))
            .flat_map(|definition| definition.referenced_symbols.iter().copied())
            .filter(|symbol| {
                scope.function_definitions.contains_key(symbol) && !hoisted.contains(symbol)
            })
            .collect();
        if reached.is_empty() {
            break;
        }
        hoisted.extend(reached);
    }

    let from_hoisted_functions: HashSet<SymbolId> = hoisted
        .iter()
        .filter_map(|symbol| scope.function_definitions.get(symbol))
        .flat_map(|definition| definition.referenced_symbols.iter().copied())
        .collect();
    for (symbol, position) in variables {
        if referenced_before(*symbol, *position) || from_hoisted_functions.contains(symbol) {
            hoisted.insert(*symbol);
        }
    }
    hoisted
}
