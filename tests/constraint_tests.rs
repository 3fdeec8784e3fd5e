//! Integration tests for the expression core: Computation/Constraint
//! dispatch and the boolean/list builtin vocabulary.

use wc_rules_matcher::entity::Entity;
use wc_rules_matcher::expr::eval::{eval, Bindings};
use wc_rules_matcher::expr::parser::parse_expr;
use wc_rules_matcher::expr::{check_acyclic, EvalOutcome, ExecutableExpression, ExprKind};
use wc_rules_matcher::value::Value;

#[test]
fn assignment_lines_parse_as_computations_and_bare_lines_as_constraints() {
    let exprs = ExecutableExpression::initialize_from_strings(
        "total = a.x + b.y\na.x + b.y < 10",
        0,
    )
    .unwrap();
    assert_eq!(exprs[0].kind, ExprKind::Computation);
    assert_eq!(exprs[0].name, "total");
    assert_eq!(exprs[1].kind, ExprKind::Constraint);
    assert_eq!(exprs[1].name, "_0");
}

#[test]
fn computation_binds_a_named_variable() {
    let a = Entity::new("a", "X").with_attr("x", Value::Int(1));
    let b = Entity::new("b", "X").with_attr("y", Value::Int(2));
    let bindings = Bindings::new().with_entity("a", &a).with_entity("b", &b);

    let exprs = ExecutableExpression::initialize_from_strings("total = a.x + b.y", 0).unwrap();
    match exprs[0].exec(&bindings).unwrap() {
        EvalOutcome::Bound(name, value) => {
            assert_eq!(name, "total");
            assert_eq!(value, Value::Int(3));
        }
        EvalOutcome::Bool(_) => panic!("expected a binding"),
    }
}

#[test]
fn cyclic_computations_are_rejected() {
    let exprs = ExecutableExpression::initialize_from_strings("p = q + 1\nq = p + 1", 0).unwrap();
    assert!(check_acyclic(&exprs).is_err());
}

#[test]
fn acyclic_computation_chain_is_accepted() {
    let exprs = ExecutableExpression::initialize_from_strings("p = 1\nq = p + 1", 0).unwrap();
    assert!(check_acyclic(&exprs).is_ok());
}

#[test]
fn boolean_builtins_cover_the_truth_table() {
    let z1 = Entity::new("z1", "Z")
        .with_attr("a", Value::Bool(true))
        .with_attr("b", Value::Bool(false));
    let z2 = Entity::new("z2", "Z")
        .with_attr("a", Value::Bool(false))
        .with_attr("b", Value::Bool(false));
    let bindings = Bindings::new().with_entity("z1", &z1).with_entity("z2", &z2);

    let any = parse_expr("any(z1.a, z1.b, z2.a, z2.b)").unwrap();
    let all = parse_expr("all(z1.a, z1.b, z2.a, z2.b)").unwrap();
    let oot = parse_expr("only_one_true(z1.a, z1.b, z2.a, z2.b)").unwrap();

    assert_eq!(eval(&any, &bindings).unwrap(), Value::Bool(true));
    assert_eq!(eval(&all, &bindings).unwrap(), Value::Bool(false));
    assert_eq!(eval(&oot, &bindings).unwrap(), Value::Bool(true));
}

#[test]
fn list_builtins_reduce_over_relation_and_attribute_lists() {
    let x = Entity::new("x", "X")
        .with_attr("i", Value::Int(4))
        .with_attr("j", Value::Int(9))
        .with_relation_many("members", vec!["m1".into(), "m2".into(), "m3".into()]);
    let bindings = Bindings::new().with_entity("x", &x);

    let max_e = parse_expr("max(x.i, x.j)").unwrap();
    let len_e = parse_expr("len(x.members)").unwrap();

    assert_eq!(eval(&max_e, &bindings).unwrap(), Value::Int(9));
    assert_eq!(eval(&len_e, &bindings).unwrap(), Value::Int(3));
}
