//! `GraphContainer`: immutable, uniquely-id'd bundle of entities forming a
//! single connected subgraph. `duplicate` rewrites relation targets
//! through the varmap as well as ids, not just ids.

use crate::entity::{Entity, RelationTargets};
use crate::error::MatchError;
use crate::value::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct GraphContainer {
    pub entities: BTreeMap<String, Entity>,
    pub seed_id: String,
}

impl GraphContainer {
    /// Builds a container from a list of entities and a seed id. Fails if
    /// ids collide, if the seed is absent, or if the seed does not reach
    /// every supplied entity (non-connected).
    pub fn build(entities: Vec<Entity>, seed_id: &str) -> Result<Self, MatchError> {
        let mut map = BTreeMap::new();
        for e in entities {
            if map.insert(e.id.clone(), e.clone()).is_some() {
                return Err(MatchError::Validate(format!(
                    "duplicate entity id '{}' in graph container",
                    e.id
                )));
            }
        }
        if !map.contains_key(seed_id) {
            return Err(MatchError::Validate(format!(
                "seed entity '{seed_id}' not present in supplied entities"
            )));
        }

        let mut seen = std::collections::BTreeSet::new();
        let mut stack = vec![seed_id.to_string()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(e) = map.get(&id) {
                for targets in e.relations.values() {
                    for t in targets.ids() {
                        stack.push(t.clone());
                    }
                }
            }
        }
        if seen.len() != map.len() {
            return Err(MatchError::Validate(
                "seed entity does not reach a single connected component".to_string(),
            ));
        }

        Ok(GraphContainer {
            entities: map,
            seed_id: seed_id.to_string(),
        })
    }

    /// Returns a fresh copy with every id (and every relation target)
    /// rewritten through `varmap`; ids absent from the map are left as-is.
    pub fn duplicate(&self, varmap: &BTreeMap<String, String>) -> GraphContainer {
        let remap = |id: &str| varmap.get(id).cloned().unwrap_or_else(|| id.to_string());
        let mut entities = BTreeMap::new();
        for e in self.entities.values() {
            let mut ne = e.clone();
            ne.id = remap(&e.id);
            for targets in ne.relations.values_mut() {
                match targets {
                    RelationTargets::One(Some(t)) => *t = remap(t),
                    RelationTargets::Many(ts) => {
                        for t in ts.iter_mut() {
                            *t = remap(t);
                        }
                    }
                    RelationTargets::One(None) => {}
                }
            }
            entities.insert(ne.id.clone(), ne);
        }
        GraphContainer {
            entities,
            seed_id: remap(&self.seed_id),
        }
    }

    /// Strips literal attributes off every entity, returning the stripped
    /// container plus a side table of the removed attributes keyed by
    /// variable (entity id).
    pub fn strip_attrs(&self) -> (GraphContainer, BTreeMap<String, BTreeMap<String, Value>>) {
        let mut side = BTreeMap::new();
        let mut entities = BTreeMap::new();
        for (id, e) in &self.entities {
            side.insert(id.clone(), e.attrs.clone());
            let mut ne = e.clone();
            ne.attrs.clear();
            entities.insert(id.clone(), ne);
        }
        (
            GraphContainer {
                entities,
                seed_id: self.seed_id.clone(),
            },
            side,
        )
    }
}
