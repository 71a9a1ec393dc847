use super::*;
use crate::ast::{SelectQuery, SortOrder, ValueKind};
use crate::parser::{Parameters, parse, parse_with_params};
use crate::record::Row;
use crate::schema::EntityDef;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn shop() -> Schema {
    Schema::new()
        .with_entity(
            EntityDef::new("User")
                .with_table("users")
                .with_column("Id", ValueKind::Int)
                .with_column("Name", ValueKind::String)
                .with_column("Age", ValueKind::Int)
                .with_column("Email", ValueKind::String)
                .with_column("Status", ValueKind::String)
                .with_column("CreatedAt", ValueKind::DateTime)
                .with_many("Orders", "Order"),
        )
        .with_entity(
            EntityDef::new("Product")
                .with_table("products")
                .with_column("Id", ValueKind::Int)
                .with_column("Name", ValueKind::String)
                .with_column("Price", ValueKind::Decimal),
        )
        .with_entity(
            EntityDef::new("Order")
                .with_table("orders")
                .with_column("Id", ValueKind::Int)
                .with_column("OrderNumber", ValueKind::String)
                .with_column("TotalAmount", ValueKind::Decimal)
                .with_column("UserId", ValueKind::Int)
                .with_one("User", "User"),
        )
}

fn query(text: &str) -> SelectQuery {
    parse(text).unwrap()
}

fn compile(entity: &str, text: &str) -> Result<Predicate, LowerError> {
    let query = query(text);
    compile_predicate(query.where_clause.as_ref().unwrap(), &shop(), entity)
}

fn lowered(entity: &str, text: &str) -> String {
    compile(entity, text).unwrap().to_string()
}

fn compile_join(entity: &str, text: &str) -> Result<Predicate, LowerError> {
    let query = query(text);
    compile_join_predicate(
        query.from.as_ref().unwrap(),
        query.where_clause.as_ref().unwrap(),
        &shop(),
        entity,
    )
}

fn users_where(condition: &str) -> String {
    lowered("User", &format!("SELECT * FROM users WHERE {}", condition))
}

const USERS_ORDERS: &str = "SELECT * FROM users u JOIN orders o ON u.Id = o.UserId";

#[test]
fn test_numeric_comparison_widens_column() {
    assert_eq!(users_where("Age > 18"), "(decimal(Age) > 18)");
    assert_eq!(lowered("Product", "SELECT * FROM products WHERE Price <= 9.99"), "(Price <= 9.99)");
}

#[test]
fn test_like_patterns() {
    assert_eq!(users_where("Name LIKE 'John%'"), "starts_with(Name, 'John')");
    assert_eq!(users_where("Name LIKE '%son'"), "ends_with(Name, 'son')");
    assert_eq!(users_where("Email LIKE '%@example%'"), "contains(Email, '@example')");
    assert_eq!(users_where("Name LIKE 'John'"), "(Name = 'John')");
    assert_eq!(users_where("Name NOT LIKE 'J%'"), "NOT starts_with(Name, 'J')");
}

#[test]
fn test_like_requires_constant_pattern() {
    let err = compile("User", "SELECT * FROM users WHERE Name LIKE Email").unwrap_err();
    assert_eq!(err, LowerError::DynamicLikePattern);
}

#[test]
fn test_between() {
    assert_eq!(
        lowered("Product", "SELECT * FROM products WHERE Price BETWEEN 100 AND 500"),
        "((Price >= 100) AND (Price <= 500))"
    );
    assert_eq!(
        lowered("Product", "SELECT * FROM products WHERE Price NOT BETWEEN 1 AND 2"),
        "NOT ((Price >= 1) AND (Price <= 2))"
    );
}

#[test]
fn test_in_lists() {
    assert_eq!(
        users_where("Status IN ('active', 'pending')"),
        "(Status IN ('active', 'pending'))"
    );
    assert_eq!(users_where("Id NOT IN (1, 2)"), "NOT (decimal(Id) IN (1, 2))");
}

#[test]
fn test_null_checks() {
    assert_eq!(users_where("Email IS NULL"), "(Email = NULL)");
    assert_eq!(users_where("Email IS NOT NULL"), "(Email <> NULL)");
    assert_eq!(users_where("Email = NULL"), "(Email = NULL)");
}

#[test]
fn test_datetime_literal_coercion() {
    assert_eq!(
        users_where("CreatedAt >= '2024-01-01'"),
        "(CreatedAt >= '2024-01-01 00:00:00')"
    );
}

#[test]
fn test_functions() {
    assert_eq!(users_where("UPPER(Name) = 'JOHN'"), "(upper(Name) = 'JOHN')");
    assert_eq!(users_where("toLower(Email) LIKE '%@x.com'"), "ends_with(lower(Email), '@x.com')");
    assert_eq!(users_where("CONTAINS(Email, '@')"), "contains(Email, '@')");
    assert_eq!(users_where("LEN(Name) > 3"), "(decimal(length(Name)) > 3)");
}

#[test]
fn test_function_errors() {
    let err = compile("User", "SELECT * FROM users WHERE SOUNDEX(Name) = 'x'").unwrap_err();
    assert_eq!(err, LowerError::FunctionNotSupported("SOUNDEX".to_string()));

    let err = compile("User", "SELECT * FROM users WHERE UPPER(Name, Email) = 'x'").unwrap_err();
    assert_eq!(err.to_string(), "Function 'UPPER' expects 1 argument(s), got 2");
}

#[test]
fn test_alias_qualified_columns() {
    assert_eq!(users_where("x.Name = 'John'"), "(Name = 'John')");
    assert_eq!(users_where("user.Name = 'John'"), "(Name = 'John')");

    let query = query("SELECT * FROM users u WHERE u.Name = 'John'");
    let schema = shop();
    let compiler = EntityCompiler::new(&schema, "User")
        .unwrap()
        .with_table(&query.from.as_ref().unwrap().table);
    let predicate = compiler.compile_predicate(query.where_clause.as_ref().unwrap()).unwrap();
    assert_eq!(predicate.to_string(), "(Name = 'John')");
}

#[test]
fn test_to_one_navigation() {
    assert_eq!(
        lowered("Order", "SELECT * FROM orders WHERE User.Name = 'John'"),
        "(User.Name = 'John')"
    );
}

#[test]
fn test_collection_navigation_needs_join() {
    let err = compile("User", "SELECT * FROM users WHERE Orders.TotalAmount > 1").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Navigation through collection 'Orders' without a JOIN is not supported"
    );
}

#[test]
fn test_unknown_attribute_suggests() {
    let err = compile("User", "SELECT * FROM users WHERE Nmae = 'x'").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Attribute 'Nmae' not found on entity 'User'. Did you mean 'Name'?"
    );

    let err = compile("User", "SELECT * FROM users WHERE Orders = 1").unwrap_err();
    assert!(matches!(err, LowerError::NotAColumn { .. }));
}

#[test]
fn test_unknown_entity() {
    let query = query("SELECT * FROM widgets WHERE a = 1");
    let err = compile_predicate(query.where_clause.as_ref().unwrap(), &shop(), "Widget").unwrap_err();
    assert_eq!(err, LowerError::EntityNotFound("Widget".to_string()));
}

#[test]
fn test_type_mismatches() {
    let err = compile("User", "SELECT * FROM users WHERE Name > 5").unwrap_err();
    assert_eq!(err.to_string(), "Operator > cannot be applied to string and decimal");

    let err = compile("User", "SELECT * FROM users WHERE Age = 'abc'").unwrap_err();
    assert_eq!(err, LowerError::mismatch("=", ValueKind::Int, ValueKind::String));

    let err = compile("User", "SELECT * FROM users WHERE Age AND Name = 'x'").unwrap_err();
    assert_eq!(err, LowerError::mismatch("AND", ValueKind::Int, ValueKind::Bool));
}

#[test]
fn test_condition_must_be_boolean() {
    let err = compile("User", "SELECT * FROM users WHERE Age + 1").unwrap_err();
    assert_eq!(err, LowerError::NotBoolean(ValueKind::Decimal));
}

#[test]
fn test_unsupported_expressions() {
    let err = compile("User", "SELECT * FROM users WHERE EXISTS (SELECT * FROM orders)").unwrap_err();
    assert_eq!(err.to_string(), "EXISTS is not supported");

    let err = compile(
        "User",
        "SELECT * FROM users WHERE CASE WHEN Age > 1 THEN TRUE ELSE FALSE END",
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "CASE expression is not supported");

    let err = compile("User", "SELECT * FROM users WHERE Id IN (SELECT UserId FROM orders)").unwrap_err();
    assert_eq!(err, LowerError::unsupported("IN with a subquery"));
}

#[test]
fn test_parameters() {
    let mut params = Parameters::new();
    params.insert("age".to_string(), Value::Int(21));
    let query = parse_with_params("SELECT * FROM users WHERE Age > @age", &params).unwrap();
    let predicate = compile_predicate(query.where_clause.as_ref().unwrap(), &shop(), "User").unwrap();
    assert_eq!(predicate.to_string(), "(Age > 21)");

    let err = compile("User", "SELECT * FROM users WHERE Age > @age").unwrap_err();
    assert_eq!(err, LowerError::UnboundParameter("@age".to_string()));
}

#[test]
fn test_predicate_evaluation() {
    let predicate = compile(
        "User",
        "SELECT * FROM users WHERE Age >= 18 AND Name LIKE 'J%' AND Email IS NOT NULL",
    )
    .unwrap();
    assert_eq!(predicate.entity(), "User");

    let john = Row::new().with("Age", 30).with("Name", "John").with("Email", "j@x.com");
    let minor = Row::new().with("Age", 12).with("Name", "Jim").with("Email", "jim@x.com");
    let no_email = Row::new().with("Age", 40).with("Name", "Jane");
    assert!(predicate.evaluate(&john).unwrap());
    assert!(!predicate.evaluate(&minor).unwrap());
    assert!(!predicate.evaluate(&no_email).unwrap());
}

#[test]
fn test_join_to_many_becomes_existential() {
    let predicate = compile_join("User", &format!("{} WHERE o.TotalAmount > 1000", USERS_ORDERS)).unwrap();
    assert_eq!(predicate.to_string(), "any(Orders, item => (item.TotalAmount > 1000))");

    let predicate = compile_join("User", &format!("{} WHERE 1000 < o.TotalAmount", USERS_ORDERS)).unwrap();
    assert_eq!(predicate.to_string(), "any(Orders, item => (1000 < item.TotalAmount))");

    let predicate = compile_join(
        "User",
        &format!("{} WHERE u.Name = 'John' AND o.OrderNumber LIKE 'ORD%'", USERS_ORDERS),
    )
    .unwrap();
    assert_eq!(
        predicate.to_string(),
        "((Name = 'John') AND any(Orders, item => starts_with(item.OrderNumber, 'ORD')))"
    );
}

#[test]
fn test_join_existential_evaluation() {
    let predicate = compile_join("User", &format!("{} WHERE o.TotalAmount > 1000", USERS_ORDERS)).unwrap();
    let big_spender = Row::new().with("Name", "John").with_related(
        "Orders",
        vec![
            Row::new().with("TotalAmount", Decimal::new(250, 0)),
            Row::new().with("TotalAmount", Decimal::new(1500, 0)),
        ],
    );
    let small_spender = Row::new()
        .with("Name", "Jane")
        .with_related("Orders", vec![Row::new().with("TotalAmount", Decimal::new(20, 0))]);
    assert!(predicate.evaluate(&big_spender).unwrap());
    assert!(!predicate.evaluate(&small_spender).unwrap());
    assert!(!predicate.evaluate(&Row::new()).unwrap());
}

#[test]
fn test_join_collection_operator_errors() {
    let err = compile_join("User", &format!("{} WHERE o.TotalAmount + 1 > 5", USERS_ORDERS)).unwrap_err();
    assert_eq!(err, LowerError::UnsupportedCollectionOperator("+".to_string()));

    let err = compile_join("User", &format!("{} WHERE o.TotalAmount IN (1, 2)", USERS_ORDERS)).unwrap_err();
    assert_eq!(err.to_string(), "Operator IN is not supported for collection properties");

    let err = compile_join("User", &format!("{} WHERE UPPER(o.OrderNumber) = 'A'", USERS_ORDERS)).unwrap_err();
    assert!(matches!(err, LowerError::CollectionNotScalar(_)));
}

#[test]
fn test_join_to_one() {
    let predicate = compile_join(
        "Order",
        "SELECT * FROM orders o JOIN users u ON o.UserId = u.Id WHERE u.Name = 'John' AND o.TotalAmount > 5",
    )
    .unwrap();
    assert_eq!(
        predicate.to_string(),
        "((User.Name = 'John') AND (TotalAmount > 5))"
    );

    let order = Row::new()
        .with("TotalAmount", Decimal::new(10, 0))
        .with_related("User", vec![Row::new().with("Name", "John")]);
    assert!(predicate.evaluate(&order).unwrap());
    let orphan = Row::new().with("TotalAmount", Decimal::new(10, 0));
    assert!(!predicate.evaluate(&orphan).unwrap());
}

#[test]
fn test_join_name_resolution() {
    let predicate = compile_join("User", &format!("{} WHERE Age > 1 AND users.Id = 3", USERS_ORDERS)).unwrap();
    assert_eq!(predicate.to_string(), "((decimal(Age) > 1) AND (decimal(Id) = 3))");

    let err = compile_join("User", &format!("{} WHERE p.Price > 1", USERS_ORDERS)).unwrap_err();
    assert_eq!(err.to_string(), "Table or alias 'p' not found in query");

    // no relationship from User to products, so the alias stays unbound
    let err = compile_join(
        "User",
        "SELECT * FROM users u JOIN products p ON u.Id = p.Id WHERE p.Price > 1",
    )
    .unwrap_err();
    assert_eq!(err, LowerError::AliasNotFound("p".to_string()));
}

#[test]
fn test_order_keys() {
    let key = compile_order_key(&Expr::ident("Name"), &shop(), "User").unwrap();
    assert_eq!(key.extract(&Row::new().with("Name", "Ann")).unwrap(), Value::from("Ann"));

    let err = compile_order_key(&Expr::ident("Missing"), &shop(), "User").unwrap_err();
    assert!(matches!(err, LowerError::AttributeNotFound { .. }));
}

#[test]
fn test_join_order_keys() {
    let query = query(&format!("{} ORDER BY o.TotalAmount DESC, u.Name", USERS_ORDERS));
    let from = query.from.as_ref().unwrap();
    let schema = shop();

    assert!(compile_join_order_key(&Expr::ident("o.TotalAmount"), from, &schema, "User").is_none());
    assert!(compile_join_order_key(&Expr::ident("u.Name"), from, &schema, "User").is_some());

    let compiler = JoinCompiler::new(&schema, "User", from).unwrap();
    let plan = compiler.compile_order_by(query.order_by.as_ref().unwrap());
    assert_eq!(plan.keys.len(), 1);
    assert_eq!(plan.keys[0].0.to_string(), "Name");
    assert_eq!(plan.keys[0].1, SortOrder::Ascending);
    assert_eq!(plan.dropped.len(), 1);
    assert!(matches!(plan.dropped[0].1, LowerError::CollectionNotScalar(_)));
}
