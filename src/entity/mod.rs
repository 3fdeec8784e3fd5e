//! Entity/graph data model: typed nodes with literal attributes and
//! bidirectional relations, keyed by an id, a class, and a map of
//! attribute descriptors. The core invariant: assigning `A.r = B` implies
//! `B.r⁻¹ ∋ A`.

use crate::error::MatchError;
use crate::value::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// The target(s) of a relation attribute on one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTargets {
    One(Option<String>),
    Many(Vec<String>),
}

impl RelationTargets {
    pub fn ids(&self) -> Vec<&String> {
        match self {
            RelationTargets::One(Some(id)) => vec![id],
            RelationTargets::One(None) => vec![],
            RelationTargets::Many(ids) => ids.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub class: String,
    pub attrs: BTreeMap<String, Value>,
    pub relations: BTreeMap<String, RelationTargets>,
}

impl Entity {
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            class: class.into(),
            attrs: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_relation_one(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relations
            .insert(name.into(), RelationTargets::One(Some(target.into())));
        self
    }

    #[must_use]
    pub fn with_relation_many(
        mut self,
        name: impl Into<String>,
        targets: Vec<String>,
    ) -> Self {
        self.relations.insert(name.into(), RelationTargets::Many(targets));
        self
    }

    /// Reads a literal attribute, or a relation re-exposed as a value
    /// (a single entity id as `Str`, a list of ids as `List`).
    pub fn attr_value(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.attrs.get(name) {
            return Some(v.clone());
        }
        self.relations.get(name).map(|rel| match rel {
            RelationTargets::One(Some(id)) => Value::Str(id.clone()),
            RelationTargets::One(None) => Value::Str(String::new()),
            RelationTargets::Many(ids) => {
                Value::List(ids.iter().cloned().map(Value::Str).collect())
            }
        })
    }
}

/// Links two entities through a named relation and its declared inverse,
/// keeping both sides synchronized.
pub fn link(
    entities: &mut BTreeMap<String, Entity>,
    a_id: &str,
    relation: &str,
    related_name: &str,
    b_id: &str,
    multiplicity: Multiplicity,
) -> Result<(), MatchError> {
    if !entities.contains_key(a_id) || !entities.contains_key(b_id) {
        return Err(MatchError::Validate(format!(
            "cannot link unknown entities '{a_id}'/'{b_id}'"
        )));
    }
    let forward_many = matches!(multiplicity, Multiplicity::OneToMany | Multiplicity::ManyToMany);
    let inverse_many = matches!(multiplicity, Multiplicity::ManyToOne | Multiplicity::ManyToMany);

    {
        let a = entities.get_mut(a_id).expect("presence checked above");
        let entry = a
            .relations
            .entry(relation.to_string())
            .or_insert_with(|| {
                if forward_many {
                    RelationTargets::Many(Vec::new())
                } else {
                    RelationTargets::One(None)
                }
            });
        match entry {
            RelationTargets::One(slot) => *slot = Some(b_id.to_string()),
            RelationTargets::Many(ids) => {
                if !ids.iter().any(|i| i == b_id) {
                    ids.push(b_id.to_string());
                }
            }
        }
    }
    {
        let b = entities.get_mut(b_id).expect("presence checked above");
        let entry = b
            .relations
            .entry(related_name.to_string())
            .or_insert_with(|| {
                if inverse_many {
                    RelationTargets::Many(Vec::new())
                } else {
                    RelationTargets::One(None)
                }
            });
        match entry {
            RelationTargets::One(slot) => *slot = Some(a_id.to_string()),
            RelationTargets::Many(ids) => {
                if !ids.iter().any(|i| i == a_id) {
                    ids.push(a_id.to_string());
                }
            }
        }
    }
    Ok(())
}
