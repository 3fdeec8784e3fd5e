//! Integration tests for pattern compilation: namespace verification,
//! synthetic constraints from literal attributes, and canonical symmetry
//! detection over small representative graphs.

use wc_rules_matcher::entity::Entity;
use wc_rules_matcher::error::MatchError;
use wc_rules_matcher::pattern::{ParentSource, Pattern};
use wc_rules_matcher::value::Value;

fn entity_pattern(entities: Vec<Entity>, seed_id: &str, constraints: &str) -> Result<Pattern, MatchError> {
    Pattern::build(
        ParentSource::Entity {
            entities,
            seed_id: seed_id.to_string(),
        },
        constraints,
    )
}

#[test]
fn single_entity_pattern_with_no_constraints_compiles() {
    let x = Entity::new("x", "Molecule");
    let p = entity_pattern(vec![x], "x", "").unwrap();
    assert_eq!(p.variable_names().len(), 1);
    assert!(p.constraints.is_empty());
}

#[test]
fn literal_attributes_are_lowered_to_synthetic_equality_constraints() {
    let x = Entity::new("x", "Molecule")
        .with_attr("count", Value::Int(3))
        .with_attr("active", Value::Bool(true));
    let p = entity_pattern(vec![x], "x", "").unwrap();
    assert_eq!(p.constraints.len(), 2);
    assert!(p.constraints.iter().all(|c| c.name.starts_with('_')));
}

#[test]
fn user_constraints_are_numbered_after_synthetic_ones() {
    let x = Entity::new("x", "Molecule").with_attr("count", Value::Int(3));
    let p = entity_pattern(vec![x], "x", "y = x.count + 1").unwrap();
    assert_eq!(p.constraints.len(), 2);
    assert_eq!(p.constraints[0].name, "_0");
    assert_eq!(p.constraints[1].name, "y");
}

#[test]
fn computed_variable_shadowing_an_entity_variable_fails_verification() {
    let x = Entity::new("x", "Molecule");
    let y = Entity::new("y", "Molecule").with_relation_one("partner", "x");
    let x = x.with_relation_one("partner", "y");
    let err = entity_pattern(vec![x, y], "x", "x = 1").unwrap_err();
    match err {
        MatchError::Validate(msg) => assert!(msg.contains('x')),
        other => panic!("expected Validate error, got {other:?}"),
    }
}

#[test]
fn reference_to_an_unbound_variable_fails_verification() {
    let x = Entity::new("x", "Molecule");
    let err = entity_pattern(vec![x], "x", "q.count < 5").unwrap_err();
    assert!(matches!(err, MatchError::Validate(_)));
}

#[test]
fn two_symmetric_partners_form_a_single_orbit() {
    let a = Entity::new("a", "Partner").with_relation_one("link", "b");
    let b = Entity::new("b", "Partner").with_relation_one("link", "a");
    let p = entity_pattern(vec![a, b], "a", "").unwrap();
    assert_eq!(p.canonical.partition, vec![vec!["a".to_string(), "b".to_string()]]);
    assert_eq!(p.canonical.leaders, p.canonical.partition);
}

#[test]
fn a_constraint_touching_only_one_orbit_member_breaks_symmetry() {
    let a = Entity::new("a", "Partner")
        .with_relation_one("link", "b")
        .with_attr("i", Value::Int(1));
    let b = Entity::new("b", "Partner").with_relation_one("link", "a");
    let p = entity_pattern(vec![a, b], "a", "").unwrap();
    assert_eq!(
        p.canonical.partition,
        vec![vec!["a".to_string()], vec!["b".to_string()]]
    );
    assert!(p.canonical.leaders.is_empty());
}

#[test]
fn building_a_helper_pattern_registers_it_under_the_helper_name() {
    let x = Entity::new("x", "Molecule");
    let base = std::rc::Rc::new(entity_pattern(vec![x], "x", "").unwrap());
    let derived = Pattern::build(ParentSource::Pattern(base.clone()), "helper.contains(var=x)").unwrap();
    assert!(derived.helpers.contains_key("helper"));

    let mut argmap = std::collections::BTreeMap::new();
    argmap.insert("x".to_string(), "x".to_string());
    assert!(base.contains(&argmap));
}
