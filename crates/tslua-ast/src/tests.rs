//! Tests for the Lua AST.

use super::*;

#[test]
fn test_valid_identifiers() {
    assert!(is_valid_lua_identifier("foo"));
    assert!(is_valid_lua_identifier("_bar1"));
    assert!(!is_valid_lua_identifier("1abc"));
    assert!(!is_valid_lua_identifier("a-b"));
    assert!(!is_valid_lua_identifier(""));
    assert!(!is_valid_lua_identifier("end"));
    assert!(!is_valid_lua_identifier("$x"));
}

#[test]
fn test_fix_invalid_identifier() {
    assert_eq!(fix_invalid_lua_identifier("end"), "____end");
    assert_eq!(fix_invalid_lua_identifier("$x"), "_____24x");
    assert_eq!(fix_invalid_lua_identifier("print"), "____print");
}

#[test]
fn test_unsafe_names() {
    assert!(is_unsafe_name("type"));
    assert!(is_unsafe_name("local"));
    assert!(!is_unsafe_name("value"));
}

#[test]
fn test_operator_precedence() {
    assert!(BinaryOperator::Mul.precedence() > BinaryOperator::Add.precedence());
    assert!(BinaryOperator::And.precedence() > BinaryOperator::Or.precedence());
    assert!(BinaryOperator::Pow.precedence() > UNARY_PRECEDENCE);
    assert!(BinaryOperator::Concat.is_right_associative());
    assert!(!BinaryOperator::Sub.is_right_associative());
    assert_eq!(UnaryOperator::Not.token(), "not ");
    assert_eq!(BinaryOperator::Ne.token(), "~=");
}

#[test]
fn test_path_builder() {
    let expression = Expression::path("string.sub");
    let ExpressionKind::TableIndex { table, index } = &expression.kind else {
        panic!("expected table index, got {:?}", expression.kind);
    };
    assert_eq!(table.as_identifier().map(|id| id.text.as_str()), Some("string"));
    assert_eq!(index.as_string(), Some("sub"));
}

#[test]
fn test_flags_accumulate() {
    let expression = Expression::call(Expression::identifier("f"), vec![])
        .with_flags(NodeFlags::POSSIBLY_NOT_USED)
        .with_flags(NodeFlags::TABLE_UNPACK_CALL);
    assert!(expression.flags.contains(NodeFlags::POSSIBLY_NOT_USED));
    assert!(expression.flags.contains(NodeFlags::TABLE_UNPACK_CALL));
    assert!(expression.is_multi_value());
}

#[test]
fn test_serialize_statement() {
    let statement = Statement::local_one(Identifier::new("x"), Some(Expression::number(1.0)));
    let json = serde_json::to_value(&statement).unwrap();
    assert_eq!(json["kind"]["VariableDeclaration"]["left"][0]["text"], "x");
}
