//! Canonical labeling: produces orbits of pattern variables under the
//! graph's automorphism group. Implemented as iterated color refinement
//! (vertex class + neighbor signature), a 1-dimensional Weisfeiler-Leman
//! pass rather than full individualization/backtracking (see DESIGN.md:
//! adequate for the symmetric shapes this crate's pattern graphs take,
//! flagged as the natural next refinement).

pub mod expr_ordering;

use crate::graph_container::GraphContainer;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm {
    pub partition: Vec<Vec<String>>,
    pub leaders: Vec<Vec<String>>,
}

fn hash_of(class: &str, neighbors: &[(String, u64)]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    class.hash(&mut hasher);
    neighbors.hash(&mut hasher);
    hasher.finish()
}

pub fn canonicalize(g: &GraphContainer) -> CanonicalForm {
    canonicalize_with_cap(g, g.entities.len() + 2)
}

pub fn canonicalize_with_cap(g: &GraphContainer, iteration_cap: usize) -> CanonicalForm {
    let mut ids: Vec<String> = g.entities.keys().cloned().collect();
    ids.sort();

    let mut color: BTreeMap<String, u64> = ids
        .iter()
        .map(|id| (id.clone(), hash_of(&g.entities[id].class, &[])))
        .collect();

    for _ in 0..iteration_cap {
        let mut next = BTreeMap::new();
        for id in &ids {
            let e = &g.entities[id];
            let mut neighbors: Vec<(String, u64)> = Vec::new();
            for (relname, targets) in &e.relations {
                for t in targets.ids() {
                    if let Some(&c) = color.get(t) {
                        neighbors.push((relname.clone(), c));
                    }
                }
            }
            neighbors.sort();
            next.insert(id.clone(), hash_of(&format!("{}:{}", e.class, color[id]), &neighbors));
        }
        if next == color {
            break;
        }
        color = next;
    }

    let mut groups: BTreeMap<u64, Vec<String>> = BTreeMap::new();
    for id in &ids {
        groups.entry(color[id]).or_default().push(id.clone());
    }
    let mut partition: Vec<Vec<String>> = groups.into_values().collect();
    for orbit in &mut partition {
        orbit.sort();
    }
    partition.sort();

    let leaders: Vec<Vec<String>> = partition.iter().filter(|o| o.len() >= 2).cloned().collect();

    CanonicalForm { partition, leaders }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    #[test]
    fn symmetric_pair_forms_one_orbit() {
        let z1 = Entity::new("z1", "Z");
        let z2 = Entity::new("z2", "Z").with_relation_one("z", "z1");
        let z1 = z1.with_relation_one("z", "z2");
        let gc = GraphContainer::build(vec![z1, z2], "z1").unwrap();
        let form = canonicalize(&gc);
        assert_eq!(form.partition, vec![vec!["z1".to_string(), "z2".to_string()]]);
        assert_eq!(form.leaders, form.partition);
    }

    #[test]
    fn distinct_classes_split_into_singletons() {
        let a = Entity::new("a", "A").with_relation_one("r", "b");
        let b = Entity::new("b", "B");
        let gc = GraphContainer::build(vec![a, b], "a").unwrap();
        let form = canonicalize(&gc);
        assert_eq!(form.partition, vec![vec!["a".to_string()], vec!["b".to_string()]]);
        assert!(form.leaders.is_empty());
    }
}
