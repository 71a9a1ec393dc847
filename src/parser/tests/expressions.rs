use super::{dec, where_of};
use crate::ast::*;
use rust_decimal::Decimal;

fn select_item(query: &str) -> Expr {
    crate::parser::parse(query).unwrap().items.remove(0).expr
}

#[test]
fn test_numeric_literals_are_decimal() {
    for text in ["SELECT 42", "SELECT 42.0"] {
        match select_item(text) {
            Expr::Literal(lit) => {
                assert_eq!(lit.kind, ValueKind::Decimal);
                assert_eq!(lit.value, Value::Decimal(Decimal::from(42)));
            }
            other => panic!("Expected literal, got {:?}", other),
        }
    }
}

#[test]
fn test_string_bool_null_literals() {
    assert_eq!(select_item("SELECT 'x'"), Expr::literal("x"));
    assert_eq!(select_item("SELECT TRUE"), Expr::literal(true));
    match select_item("SELECT NULL") {
        Expr::Literal(lit) => {
            assert_eq!(lit.value, Value::Null);
            assert_eq!(lit.kind, ValueKind::Untyped);
        }
        other => panic!("Expected literal, got {:?}", other),
    }
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expr = where_of("SELECT * FROM t WHERE a = 1 OR b = 2 AND c = 3");
    let eq = |name: &str, n| Expr::binary(Expr::ident(name), BinaryOperator::Equal, dec(n));
    assert_eq!(
        expr,
        Expr::binary(
            eq("a", 1),
            BinaryOperator::Or,
            Expr::binary(eq("b", 2), BinaryOperator::And, eq("c", 3))
        )
    );
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(
        select_item("SELECT 1 + 2 * 3 - 4"),
        Expr::binary(
            Expr::binary(
                dec(1),
                BinaryOperator::Add,
                Expr::binary(dec(2), BinaryOperator::Multiply, dec(3))
            ),
            BinaryOperator::Subtract,
            dec(4)
        )
    );
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(
        select_item("SELECT (1 + 2) * 3"),
        Expr::binary(
            Expr::binary(dec(1), BinaryOperator::Add, dec(2)),
            BinaryOperator::Multiply,
            dec(3)
        )
    );
}

#[test]
fn test_concat_and_unary() {
    assert_eq!(
        select_item("SELECT first_name || last_name"),
        Expr::binary(
            Expr::ident("first_name"),
            BinaryOperator::Concat,
            Expr::ident("last_name")
        )
    );
    assert_eq!(
        select_item("SELECT -price"),
        Expr::unary(UnaryOperator::Minus, Expr::ident("price"), Span::default())
    );
}

#[test]
fn test_not_wraps_comparison() {
    assert_eq!(
        where_of("SELECT * FROM t WHERE NOT a = 1"),
        Expr::unary(
            UnaryOperator::Not,
            Expr::binary(Expr::ident("a"), BinaryOperator::Equal, dec(1)),
            Span::default()
        )
    );
}

#[test]
fn test_in_list_and_not_in() {
    match where_of("SELECT * FROM t WHERE id IN (1, 2, 3)") {
        Expr::In(node) => {
            assert!(!node.negated);
            assert_eq!(node.values, vec![dec(1), dec(2), dec(3)]);
        }
        other => panic!("Expected IN, got {:?}", other),
    }
    match where_of("SELECT * FROM t WHERE status NOT IN ('a', 'b')") {
        Expr::In(node) => {
            assert!(node.negated);
            assert_eq!(*node.expr, Expr::ident("status"));
        }
        other => panic!("Expected NOT IN, got {:?}", other),
    }
}

#[test]
fn test_in_subquery() {
    match where_of("SELECT * FROM users WHERE id IN (SELECT user_id FROM orders)") {
        Expr::In(node) => {
            assert_eq!(node.values.len(), 1);
            let Expr::Subquery(sub) = &node.values[0] else {
                panic!("Expected subquery value");
            };
            assert_eq!(sub.query.from.as_ref().unwrap().table.name, "orders");
        }
        other => panic!("Expected IN, got {:?}", other),
    }
}

#[test]
fn test_between_and_not_between() {
    match where_of("SELECT * FROM products WHERE price BETWEEN 100 AND 500") {
        Expr::Between(node) => {
            assert!(!node.negated);
            assert_eq!(*node.low, dec(100));
            assert_eq!(*node.high, dec(500));
        }
        other => panic!("Expected BETWEEN, got {:?}", other),
    }
    let expr = where_of("SELECT * FROM products WHERE price NOT BETWEEN 1 AND 2 AND stock > 0");
    let Expr::Binary(b) = expr else {
        panic!("Expected AND");
    };
    assert_eq!(b.op, BinaryOperator::And);
    assert!(matches!(*b.left, Expr::Between(ref n) if n.negated));
}

#[test]
fn test_like_and_not_like() {
    assert_eq!(
        where_of("SELECT * FROM users WHERE name LIKE 'John%'"),
        Expr::binary(Expr::ident("name"), BinaryOperator::Like, Expr::literal("John%"))
    );
    assert_eq!(
        where_of("SELECT * FROM users WHERE name NOT LIKE '%x'"),
        Expr::unary(
            UnaryOperator::Not,
            Expr::binary(Expr::ident("name"), BinaryOperator::Like, Expr::literal("%x")),
            Span::default()
        )
    );
}

#[test]
fn test_is_null_forms() {
    assert_eq!(
        where_of("SELECT * FROM users WHERE email IS NULL"),
        Expr::unary(UnaryOperator::IsNull, Expr::ident("email"), Span::default())
    );
    assert_eq!(
        where_of("SELECT * FROM users WHERE email IS NOT NULL"),
        Expr::unary(UnaryOperator::IsNotNull, Expr::ident("email"), Span::default())
    );
}

#[test]
fn test_function_calls() {
    match select_item("SELECT UPPER(name)") {
        Expr::FunctionCall(call) => {
            assert_eq!(call.name, "UPPER");
            assert_eq!(call.args, vec![Expr::ident("name")]);
        }
        other => panic!("Expected call, got {:?}", other),
    }
    match select_item("SELECT count(*)") {
        Expr::FunctionCall(call) => {
            assert_eq!(call.name, "count");
            assert_eq!(call.args, vec![Expr::ident("*")]);
        }
        other => panic!("Expected call, got {:?}", other),
    }
    match select_item("SELECT now()") {
        Expr::FunctionCall(call) => assert!(call.args.is_empty()),
        other => panic!("Expected call, got {:?}", other),
    }
}

#[test]
fn test_member_access_chain() {
    let expr = select_item("SELECT u.address.city");
    assert_eq!(expr.name_path(), Some(vec!["u", "address", "city"]));
    assert!(matches!(expr, Expr::MemberAccess(ref m) if m.member == "city"));
}

#[test]
fn test_searched_and_simple_case() {
    match select_item("SELECT CASE WHEN age > 18 THEN 'adult' ELSE 'minor' END") {
        Expr::Case(case) => {
            assert!(case.operand.is_none());
            assert_eq!(case.whens.len(), 1);
            assert_eq!(case.whens[0].result, Expr::literal("adult"));
            assert_eq!(case.else_result.as_deref(), Some(&Expr::literal("minor")));
        }
        other => panic!("Expected CASE, got {:?}", other),
    }
    match select_item("SELECT CASE status WHEN 'a' THEN 1 WHEN 'b' THEN 2 END") {
        Expr::Case(case) => {
            assert_eq!(case.operand.as_deref(), Some(&Expr::ident("status")));
            assert_eq!(case.whens.len(), 2);
            assert!(case.else_result.is_none());
        }
        other => panic!("Expected CASE, got {:?}", other),
    }
}

#[test]
fn test_exists_and_not_exists() {
    match where_of("SELECT * FROM users WHERE EXISTS (SELECT * FROM orders)") {
        Expr::Exists(node) => assert!(!node.negated),
        other => panic!("Expected EXISTS, got {:?}", other),
    }
    match where_of("SELECT * FROM users WHERE NOT EXISTS (SELECT * FROM orders)") {
        Expr::Exists(node) => assert!(node.negated),
        other => panic!("Expected NOT EXISTS, got {:?}", other),
    }
}

#[test]
fn test_scalar_subquery() {
    match where_of("SELECT * FROM products WHERE price > (SELECT AVG(price) FROM products)") {
        Expr::Binary(b) => assert!(matches!(*b.right, Expr::Subquery(_))),
        other => panic!("Expected comparison, got {:?}", other),
    }
}
