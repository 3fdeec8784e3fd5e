//! Change-propagation tokens flowing through the discrimination network.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tag {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Species {
    Node,
    Edge,
}

/// A single unit of change: an entity or relation being added or removed,
/// carrying the variable-to-entity-id bindings accumulated so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tag: Tag,
    pub species: Species,
    pub bindings: BTreeMap<String, String>,
}

impl Token {
    pub fn new(tag: Tag, species: Species) -> Self {
        Token {
            tag,
            species,
            bindings: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_binding(mut self, var: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.bindings.insert(var.into(), entity_id.into());
        self
    }

    pub fn merge(&self, other: &Token) -> Token {
        let mut bindings = self.bindings.clone();
        bindings.extend(other.bindings.clone());
        Token {
            tag: self.tag,
            species: self.species,
            bindings,
        }
    }

    pub fn negate(&self) -> Token {
        Token {
            tag: match self.tag {
                Tag::Add => Tag::Remove,
                Tag::Remove => Tag::Add,
            },
            species: self.species,
            bindings: self.bindings.clone(),
        }
    }
}
