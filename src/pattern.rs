//! Pattern compilation: turns a seed entity graph plus constraint source
//! into a verified, canonically-labeled `Pattern` ready for network
//! insertion.

use crate::canonical::{self, CanonicalForm};
use crate::entity::Entity;
use crate::error::MatchError;
use crate::expr::dependency::DependencyCollector;
use crate::expr::{check_acyclic, highest_synthetic, CmpOp, Expr, ExecutableExpression, ExprKind};
use crate::graph_container::GraphContainer;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// What kind of thing a name in a pattern's namespace refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    EntityVariable,
    ComputedVariable,
    Helper,
}

/// A pattern's parent may be a canonicalized entity graph or another
/// pattern; both expose the same partition/leaders/namespace surface so
/// `Pattern::build`'s downstream verification and canonicalization never
/// need to branch on which kind of parent it got.
pub trait PatternParent {
    fn graph(&self) -> &GraphContainer;
    fn partition(&self) -> &[Vec<String>];
    fn leaders(&self) -> &[Vec<String>];
    fn namespace(&self) -> BTreeMap<String, NameKind>;
}

/// A freshly canonicalized entity graph acting as a pattern's parent (the
/// `ParentSource::Entity` case, wrapped once at construction time).
pub struct GraphParent {
    graph: GraphContainer,
    canonical: CanonicalForm,
}

impl PatternParent for GraphParent {
    fn graph(&self) -> &GraphContainer {
        &self.graph
    }
    fn partition(&self) -> &[Vec<String>] {
        &self.canonical.partition
    }
    fn leaders(&self) -> &[Vec<String>] {
        &self.canonical.leaders
    }
    fn namespace(&self) -> BTreeMap<String, NameKind> {
        self.graph
            .entities
            .keys()
            .map(|v| (v.clone(), NameKind::EntityVariable))
            .collect()
    }
}

impl PatternParent for Pattern {
    fn graph(&self) -> &GraphContainer {
        &self.graph
    }
    fn partition(&self) -> &[Vec<String>] {
        &self.canonical.partition
    }
    fn leaders(&self) -> &[Vec<String>] {
        &self.canonical.leaders
    }
    fn namespace(&self) -> BTreeMap<String, NameKind> {
        self.graph
            .entities
            .keys()
            .map(|v| (v.clone(), NameKind::EntityVariable))
            .collect()
    }
}

/// Where a pattern's entity graph comes from: a fresh seed, or (for
/// patterns built on top of a helper) a reference to the parent pattern.
pub enum ParentSource {
    Entity { entities: Vec<Entity>, seed_id: String },
    Pattern(Rc<Pattern>),
}

fn literal_expr(v: &Value) -> Expr {
    match v {
        Value::Int(i) => Expr::Int(*i),
        Value::Float(f) => Expr::Float(*f),
        Value::Bool(b) => Expr::Bool(*b),
        Value::Str(s) => Expr::Str(s.clone()),
        Value::List(items) => Expr::List(items.iter().map(literal_expr).collect()),
    }
}

/// Lowers a graph's stripped literal attributes into synthetic `var.attr == value`
/// equality constraints, numbered `_0`, `_1`, ... in entity/attribute order.
fn synthetic_equality_constraints(
    side: &BTreeMap<String, BTreeMap<String, Value>>,
) -> Vec<ExecutableExpression> {
    let mut synthetic = Vec::new();
    let mut counter = 0usize;
    for (var, attrs) in side {
        for (attr, value) in attrs {
            let ast = Expr::Cmp(
                CmpOp::Eq,
                Box::new(Expr::Attr(Box::new(Expr::Var(var.clone())), attr.clone())),
                Box::new(literal_expr(value)),
            );
            synthetic.push(ExecutableExpression {
                name: format!("_{counter}"),
                kind: ExprKind::Constraint,
                declared_variable: None,
                ast,
                source: format!("{var}.{attr} == {value}"),
            });
            counter += 1;
        }
    }
    synthetic
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub graph: GraphContainer,
    pub constraints: Vec<ExecutableExpression>,
    pub canonical: CanonicalForm,
    pub helpers: BTreeMap<String, Rc<Pattern>>,
}

impl Pattern {
    /// Builds and verifies a pattern from a `ParentSource` and constraint
    /// source text, in one pipeline:
    /// graph build -> literal-attr stripping into synthetic equality
    /// constraints -> constraint parsing -> namespace verification ->
    /// canonical labeling -> symmetry refinement.
    pub fn build(source: ParentSource, constraint_src: &str) -> Result<Self, MatchError> {
        let (parent, helpers): (Rc<dyn PatternParent>, BTreeMap<String, Rc<Pattern>>) = match source {
            ParentSource::Entity { entities, seed_id } => {
                let graph = GraphContainer::build(entities, &seed_id)?;
                let canonical = canonical::canonicalize(&graph);
                (Rc::new(GraphParent { graph, canonical }), BTreeMap::new())
            }
            ParentSource::Pattern(parent) => {
                let mut helpers = BTreeMap::new();
                helpers.insert("helper".to_string(), parent.clone());
                (parent, helpers)
            }
        };

        let (graph, side) = parent.graph().strip_attrs();
        let synthetic = synthetic_equality_constraints(&side);

        let user_constraints =
            ExecutableExpression::initialize_from_strings(constraint_src, highest_synthetic(&synthetic))?;

        let mut constraints = synthetic;
        constraints.extend(user_constraints);

        Self::verify_namespace(parent.namespace(), &constraints, &helpers)?;

        let (partition, leaders) = canonical::expr_ordering::refine(parent.partition(), &constraints);

        Ok(Pattern {
            graph,
            constraints,
            canonical: CanonicalForm { partition, leaders },
            helpers,
        })
    }

    fn verify_namespace(
        parent_namespace: BTreeMap<String, NameKind>,
        constraints: &[ExecutableExpression],
        helpers: &BTreeMap<String, Rc<Pattern>>,
    ) -> Result<(), MatchError> {
        let mut errors = Vec::new();

        let mut names = parent_namespace;
        for h in helpers.keys() {
            names.insert(h.clone(), NameKind::Helper);
        }

        for c in constraints {
            if let Some(v) = &c.declared_variable {
                if let Some(existing) = names.get(v) {
                    if *existing != NameKind::ComputedVariable {
                        errors.push(format!("computed variable '{v}' shadows an existing name"));
                        continue;
                    }
                }
                names.insert(v.clone(), NameKind::ComputedVariable);
            }
        }

        if helpers.len() > 1 {
            let mut seen: Vec<(String, *const Pattern)> = Vec::new();
            for (name, p) in helpers {
                let ptr = Rc::as_ptr(p);
                if let Some((other, _)) = seen.iter().find(|(_, q)| *q == ptr) {
                    errors.push(format!("helper '{name}' aliases helper '{other}'"));
                }
                seen.push((name.clone(), ptr));
            }
        }

        let known: BTreeSet<String> = names.keys().cloned().collect();
        for c in constraints {
            let deps = DependencyCollector::collect(&c.ast);
            for v in &deps.variables {
                if !known.contains(v) {
                    errors.push(format!(
                        "constraint '{}' references unknown variable '{v}'",
                        c.name
                    ));
                }
            }
        }

        if let Err(e) = check_acyclic(constraints) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MatchError::Validate(errors.join("; ")))
        }
    }

    /// Simplified stand-in for a live indexed match lookup: true iff every
    /// supplied binding names a variable this pattern's representative
    /// graph actually carries under that id.
    pub fn contains(&self, argmap: &BTreeMap<String, String>) -> bool {
        argmap
            .iter()
            .all(|(var, id)| self.graph.entities.get(var).is_some_and(|e| &e.id == id))
    }

    pub fn variable_names(&self) -> BTreeSet<String> {
        self.graph.entities.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_attrs_become_synthetic_equality_constraints() {
        let x = Entity::new("x", "X").with_attr("i", Value::Int(10));
        let p = Pattern::build(
            ParentSource::Entity {
                entities: vec![x],
                seed_id: "x".to_string(),
            },
            "",
        )
        .unwrap();
        assert_eq!(p.constraints.len(), 1);
        assert_eq!(p.constraints[0].name, "_0");
    }

    #[test]
    fn shadowing_computed_variable_is_rejected() {
        let x = Entity::new("x", "X").with_attr("i", Value::Int(10));
        let err = Pattern::build(
            ParentSource::Entity {
                entities: vec![x],
                seed_id: "x".to_string(),
            },
            "x = 1",
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::Validate(_)));
    }

    #[test]
    fn unknown_variable_reference_is_rejected() {
        let x = Entity::new("x", "X");
        let err = Pattern::build(
            ParentSource::Entity {
                entities: vec![x],
                seed_id: "x".to_string(),
            },
            "y.i < 1",
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::Validate(_)));
    }

    #[test]
    fn cyclic_computation_is_rejected() {
        let x = Entity::new("x", "X");
        let err = Pattern::build(
            ParentSource::Entity {
                entities: vec![x],
                seed_id: "x".to_string(),
            },
            "a = b + 1\nb = a + 1",
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::Validate(_)));
    }

    #[test]
    fn symmetric_pair_refines_to_single_orbit() {
        let z1 = Entity::new("z1", "Z").with_relation_one("z", "z2");
        let z2 = Entity::new("z2", "Z").with_relation_one("z", "z1");
        let p = Pattern::build(
            ParentSource::Entity {
                entities: vec![z1, z2],
                seed_id: "z1".to_string(),
            },
            "",
        )
        .unwrap();
        assert_eq!(p.canonical.partition, vec![vec!["z1".to_string(), "z2".to_string()]]);
        assert_eq!(p.canonical.leaders, p.canonical.partition);
    }

    #[test]
    fn contains_checks_representative_graph_membership() {
        let x = Entity::new("x", "X");
        let p = Pattern::build(
            ParentSource::Entity {
                entities: vec![x],
                seed_id: "x".to_string(),
            },
            "",
        )
        .unwrap();
        let mut ok = BTreeMap::new();
        ok.insert("x".to_string(), "x".to_string());
        assert!(p.contains(&ok));

        let mut bad = BTreeMap::new();
        bad.insert("x".to_string(), "other".to_string());
        assert!(!p.contains(&bad));
    }
}
