//! Restore scheduling simulation test
//!
//! Exercises the dependency ordering the way a restore orchestrator would:
//! 1. Build a graph from a solution's project-reference edges
//! 2. Derive a total restore order
//! 3. Group the order into waves where each wave only depends on earlier ones
//! 4. Verify invalidation walks can rely on "dependencies seen first"

use solution_graph::{DependencyGraph, GraphError};
use std::collections::{HashMap, HashSet};

/// Build the graph of a small but realistic solution:
///
/// `contracts` and `logging` are leaves, `data` and `services` sit in the
/// middle, `web` and `worker` are the application heads.
fn solution() -> DependencyGraph<String> {
    let mut graph = DependencyGraph::new();
    for name in ["web", "worker", "services", "data", "contracts", "logging"] {
        let _ = graph.add_node(name.to_string());
    }

    let edges = [
        ("web", "services"),
        ("web", "logging"),
        ("worker", "services"),
        ("services", "data"),
        ("services", "contracts"),
        ("data", "contracts"),
    ];
    for (dependent, dependency) in edges {
        graph
            .depend_on(&dependent.to_string(), &dependency.to_string())
            .unwrap();
    }

    graph
}

/// Group an order into waves: a project joins the earliest wave that comes
/// after the waves of all of its dependencies.
fn waves(graph: &DependencyGraph<String>, order: &[String]) -> Vec<Vec<String>> {
    let mut wave_of: HashMap<String, usize> = HashMap::new();
    let mut waves: Vec<Vec<String>> = Vec::new();

    for project in order {
        let wave = graph
            .dependencies_of(project)
            .unwrap()
            .iter()
            .map(|dep| wave_of[dep.as_str()] + 1)
            .max()
            .unwrap_or(0);

        if wave == waves.len() {
            waves.push(Vec::new());
        }
        waves[wave].push(project.clone());
        let _ = wave_of.insert(project.clone(), wave);
    }

    waves
}

#[test]
fn restore_order_visits_dependencies_first() {
    let graph = solution();
    let order = graph.dependency_order().unwrap();
    assert_eq!(order.len(), graph.node_count());

    let mut seen: HashSet<&str> = HashSet::new();
    for project in &order {
        for dependency in graph.dependencies_of(project).unwrap() {
            assert!(
                seen.contains(dependency.as_str()),
                "{dependency} must be restored before {project}"
            );
        }
        let _ = seen.insert(project.as_str());
    }
}

#[test]
fn restore_waves_respect_reference_depth() {
    let graph = solution();
    let order = graph.dependency_order().unwrap();
    let waves = waves(&graph, &order);

    // contracts and logging have no references; web sits at depth 3.
    assert_eq!(waves.len(), 4);
    assert!(waves[0].contains(&"contracts".to_string()));
    assert!(waves[0].contains(&"logging".to_string()));
    assert!(waves[1].contains(&"data".to_string()));
    assert!(waves[2].contains(&"services".to_string()));
    assert!(waves[3].contains(&"web".to_string()));
    assert!(waves[3].contains(&"worker".to_string()));
}

#[test]
fn invalidation_walk_over_order_reaches_all_dependents() {
    let graph = solution();
    let order = graph.dependency_order().unwrap();

    // Mark one mid-level project changed and sweep the order once; every
    // transitive dependent must end up marked without a fixed-point loop.
    let mut dirty: HashSet<String> = HashSet::new();
    let _ = dirty.insert("data".to_string());

    for project in &order {
        if dirty.contains(project) {
            continue;
        }
        let touched = graph
            .dependencies_of(project)
            .unwrap()
            .iter()
            .any(|dep| dirty.contains(dep.as_str()));
        if touched {
            let _ = dirty.insert(project.clone());
        }
    }

    let expect: HashSet<String> = ["data", "services", "web", "worker"]
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(dirty, expect);
}

#[test]
fn cycle_is_reported_with_its_path() {
    let mut graph = solution();
    // Introduce a back-edge: contracts now depends on web.
    graph
        .depend_on(&"contracts".to_string(), &"web".to_string())
        .unwrap();

    let result = graph.dependency_order();
    assert!(matches!(
        result,
        Err(GraphError::CycleDetected(path))
            if path.contains("web") && path.contains("contracts") && path.contains(" -> ")
    ));
}
