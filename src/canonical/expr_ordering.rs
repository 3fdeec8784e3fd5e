//! Canonical expression ordering: refines a graph partition using
//! constraint dependencies, detecting symmetry breaking.

use crate::expr::dependency::DependencyCollector;
use crate::expr::ExecutableExpression;
use std::collections::BTreeSet;

fn merge_dependencies(constraints: &[ExecutableExpression]) -> DependencyCollector {
    let mut merged = DependencyCollector::default();
    for c in constraints {
        let deps = DependencyCollector::collect(&c.ast);
        merged.variables.extend(deps.variables);
        for (var, attrs) in deps.attribute_calls {
            merged.attribute_calls.entry(var).or_default().extend(attrs);
        }
        for (key, calls) in deps.function_calls {
            merged.function_calls.entry(key).or_default().extend(calls);
        }
        merged.builtins.extend(deps.builtins);
        merged.subvariables.extend(deps.subvariables);
    }
    merged
}

fn is_preserving(orbit: &[String], deps: &DependencyCollector) -> bool {
    let touched: Vec<&String> = orbit.iter().filter(|v| deps.variables.contains(*v)).collect();
    if touched.is_empty() {
        return true;
    }
    if touched.len() != orbit.len() {
        return false;
    }

    let attr_sigs: Vec<BTreeSet<String>> = orbit
        .iter()
        .map(|v| deps.attribute_calls.get(v).cloned().unwrap_or_default())
        .collect();
    if !attr_sigs.windows(2).all(|w| w[0] == w[1]) {
        return false;
    }

    let orbit_set: BTreeSet<String> = orbit.iter().cloned().collect();
    for (key, calls) in &deps.function_calls {
        if key.ends_with(".contains") {
            let referenced: BTreeSet<String> = calls.iter().filter_map(|m| m.get("var").cloned()).collect();
            let touched_in_orbit: BTreeSet<String> =
                referenced.intersection(&orbit_set).cloned().collect();
            if !touched_in_orbit.is_empty() && touched_in_orbit != orbit_set {
                return false;
            }
        }
    }
    true
}

/// Refines `partition` against each constraint in turn, splitting any orbit
/// a constraint breaks symmetry on into singletons. Returns the refined
/// partition plus `leaders` (the surviving orbits of size >= 2).
pub fn refine(
    partition: &[Vec<String>],
    constraints: &[ExecutableExpression],
) -> (Vec<Vec<String>>, Vec<Vec<String>>) {
    let deps = merge_dependencies(constraints);
    let mut current = Vec::new();
    for orbit in partition {
        if orbit.len() < 2 || is_preserving(orbit, &deps) {
            current.push(orbit.clone());
        } else {
            for v in orbit {
                current.push(vec![v.clone()]);
            }
        }
    }
    for orbit in &mut current {
        orbit.sort();
    }
    current.sort();
    let leaders: Vec<Vec<String>> = current.iter().filter(|o| o.len() >= 2).cloned().collect();
    (current, leaders)
}
