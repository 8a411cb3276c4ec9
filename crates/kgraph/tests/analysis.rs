//! Dependency, impact and pattern analysis over secured walks.

mod common;

use common::{FailingEngine, Fixture, is_cycle_search, repeats_in, user};
use kgraph::analysis::{
    ChangeType, DependencyDirection, DependencyOptions, PatternOptions, PatternType, Section,
    Severity,
};
use kgraph::domain::{EdgeType, VertexId, Visibility};
use kgraph::engine::Direction;
use kgraph::error::Error;
use std::collections::BTreeSet;
use std::sync::Arc;

fn reverse_walk(traversal: &kgraph::engine::Traversal) -> bool {
    repeats_in(traversal, Direction::In)
}

async fn triangle(g: &Fixture) -> (VertexId, VertexId, VertexId) {
    let alice = user("alice");
    let a = g.shared_function(&alice, "a").await;
    let b = g.shared_function(&alice, "b").await;
    let c = g.shared_function(&alice, "c").await;
    g.link(&alice, &a, &b, EdgeType::Calls).await;
    g.link(&alice, &b, &c, EdgeType::Calls).await;
    g.link(&alice, &c, &a, EdgeType::Calls).await;
    (a, b, c)
}

// === Dependencies ===

#[tokio::test]
async fn test_triangle_yields_exactly_one_cycle() {
    let g = Fixture::new();
    let (a, b, c) = triangle(&g).await;

    let options = DependencyOptions {
        max_depth: 3,
        ..DependencyOptions::default()
    };
    let cycles = g
        .dependencies
        .detect_circular_dependencies(&user("alice"), &a, &options)
        .await
        .expect("cycles");

    assert_eq!(cycles.len(), 1);
    let members: BTreeSet<VertexId> = cycles[0].iter().cloned().collect();
    assert_eq!(members, BTreeSet::from([a, b, c]));
    assert_eq!(cycles[0].len(), 3);
}

#[tokio::test]
async fn test_analysis_reports_every_section() {
    let g = Fixture::new();
    let (a, b, c) = triangle(&g).await;

    let analysis = g
        .dependencies
        .analyze(&user("alice"), &a, &DependencyOptions::default())
        .await
        .expect("analyze");

    assert_eq!(analysis.root.id, a);
    let forward = analysis.forward.expect("forward section");
    assert_eq!(forward.len(), 2);
    assert_eq!((forward[0].vertex.id.clone(), forward[0].level), (b.clone(), 1));
    assert_eq!((forward[1].vertex.id.clone(), forward[1].level), (c.clone(), 2));
    assert_eq!(forward[1].path, vec![a.clone(), b, c.clone()]);

    let reverse = analysis.reverse.expect("reverse section");
    assert_eq!(reverse[0].vertex.id, c);
    assert_eq!(reverse[0].level, 1);

    assert_eq!(analysis.cycles.as_ref().map(Vec::len), Some(1));
    assert_eq!(analysis.stats.forward_count, 2);
    assert_eq!(analysis.stats.cycle_count, 1);
    assert!(analysis.failed_sections.is_empty());
}

#[tokio::test]
async fn test_direct_only_analysis_stops_at_first_hop() {
    let g = Fixture::new();
    let (a, b, _) = triangle(&g).await;

    let options = DependencyOptions {
        direction: DependencyDirection::Forward,
        include_indirect: false,
        detect_cycles: false,
        ..DependencyOptions::default()
    };
    let analysis = g
        .dependencies
        .analyze(&user("alice"), &a, &options)
        .await
        .expect("analyze");

    let forward = analysis.forward.expect("forward section");
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].vertex.id, b);
    assert_eq!(analysis.reverse, None);
    assert_eq!(analysis.cycles, None);
}

#[tokio::test]
async fn test_cycle_through_invisible_vertex_is_not_reported() {
    let g = Fixture::new();
    let alice = user("alice");
    let bob = user("bob");
    let a = g.shared_function(&alice, "a").await;
    let hidden = g.function(&bob, "hidden", Visibility::Private).await;
    g.link(&bob, &a, &hidden.id, EdgeType::Calls).await;
    g.link(&bob, &hidden.id, &a, EdgeType::Calls).await;

    let options = DependencyOptions::default();
    let for_alice = g
        .dependencies
        .detect_circular_dependencies(&alice, &a, &options)
        .await
        .expect("cycles");
    assert!(for_alice.is_empty());

    let for_bob = g
        .dependencies
        .detect_circular_dependencies(&bob, &a, &options)
        .await
        .expect("cycles");
    assert_eq!(for_bob.len(), 1);
}

#[tokio::test]
async fn test_analysis_of_invisible_root_is_not_found() {
    let g = Fixture::new();
    let hidden = g
        .function(&user("bob"), "hidden", Visibility::Private)
        .await;

    let err = g
        .dependencies
        .analyze(&user("alice"), &hidden.id, &DependencyOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_single_section_operations_reject_unresolvable_root() {
    let g = Fixture::new();
    let hidden = g
        .function(&user("bob"), "hidden", Visibility::Private)
        .await;
    let missing = VertexId::new("kg-nothing");
    let alice = user("alice");
    let options = DependencyOptions::default();

    for root in [&hidden.id, &missing] {
        let forward = g
            .dependencies
            .forward_dependencies(&alice, root, &options)
            .await
            .unwrap_err();
        assert!(matches!(forward, Error::NotFound(_)));

        let reverse = g
            .dependencies
            .reverse_dependencies(&alice, root, &options)
            .await
            .unwrap_err();
        assert!(matches!(reverse, Error::NotFound(_)));

        let cycles = g
            .dependencies
            .detect_circular_dependencies(&alice, root, &options)
            .await
            .unwrap_err();
        assert!(matches!(cycles, Error::NotFound(_)));
    }
}

#[tokio::test]
async fn test_zero_depth_is_rejected() {
    let g = Fixture::new();
    let (a, _, _) = triangle(&g).await;

    let options = DependencyOptions {
        max_depth: 0,
        ..DependencyOptions::default()
    };
    let err = g
        .dependencies
        .analyze(&user("alice"), &a, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn test_failed_section_is_omitted_not_fatal() {
    let engine = Arc::new(FailingEngine::new(reverse_walk));
    let g = Fixture::with_engine(engine.clone());
    let (a, b, _) = triangle(&g).await;

    let analysis = g
        .dependencies
        .analyze(&user("alice"), &a, &DependencyOptions::default())
        .await
        .expect("partial analysis");

    assert_eq!(analysis.failed_sections, vec![Section::Reverse]);
    assert_eq!(analysis.reverse, None);
    assert_eq!(analysis.stats.reverse_count, 0);
    let forward = analysis.forward.expect("forward section");
    assert_eq!(forward[0].vertex.id, b);
    assert_eq!(analysis.cycles.as_ref().map(Vec::len), Some(1));
    assert!(engine.failures() > 0);
}

// === Impact ===

#[tokio::test]
async fn test_closer_dependents_are_graded_at_least_as_severe() {
    let g = Fixture::new();
    let alice = user("alice");
    let target = g.shared_function(&alice, "target").await;
    let mut previous = target.clone();
    let mut chain = Vec::new();
    for i in 1..=4 {
        let caller = g.shared_function(&alice, &format!("caller{i}")).await;
        g.link(&alice, &caller, &previous, EdgeType::Calls).await;
        chain.push(caller.clone());
        previous = caller;
    }

    let impact = g
        .impact
        .analyze(&alice, &target, ChangeType::Modify, 4, &[])
        .await
        .expect("impact");

    assert_eq!(impact.target.id, target);
    assert_eq!(impact.impacted.len(), 4);
    assert_eq!(impact.counts.total(), 4);
    assert_eq!(impact.max_depth, 4);

    let severity_at = |level: usize| {
        impact
            .impacted
            .iter()
            .find(|v| v.level == level)
            .map(|v| v.severity)
            .expect("level present")
    };
    assert!(severity_at(1) >= severity_at(4));
    assert_eq!(severity_at(1), Severity::Critical);
    assert_eq!(impact.impacted[0].vertex.id, chain[0]);
    assert!(
        impact
            .impacted
            .windows(2)
            .all(|w| w[0].severity >= w[1].severity)
    );
    assert!(
        impact
            .recommendations
            .iter()
            .any(|r| r.contains("more than three levels"))
    );
}

#[tokio::test]
async fn test_parallel_edges_grade_on_the_hard_coupling() {
    for _ in 0..10 {
        let g = Fixture::new();
        let alice = user("alice");
        let target = g.shared_function(&alice, "target").await;
        let subclass = g.shared_function(&alice, "subclass").await;
        g.link(&alice, &subclass, &target, EdgeType::References).await;
        g.link(&alice, &subclass, &target, EdgeType::Extends).await;

        let impact = g
            .impact
            .analyze(&alice, &target, ChangeType::Delete, 2, &[])
            .await
            .expect("impact");

        assert_eq!(impact.impacted.len(), 1);
        assert_eq!(impact.impacted[0].severity, Severity::Critical);
        assert_eq!(impact.counts.critical, 1);
    }
}

#[tokio::test]
async fn test_impact_hides_invisible_dependents() {
    let g = Fixture::new();
    let alice = user("alice");
    let bob = user("bob");
    let target = g.shared_function(&alice, "target").await;
    let hidden = g.function(&bob, "hidden", Visibility::Private).await;
    g.link(&bob, &hidden.id, &target, EdgeType::Uses).await;

    let impact = g
        .impact
        .analyze(&alice, &target, ChangeType::Delete, 3, &[])
        .await
        .expect("impact");

    assert!(impact.impacted.is_empty());
    assert_eq!(
        impact.recommendations,
        vec!["No dependents found; the change is safe to proceed.".to_string()]
    );
}

#[tokio::test]
async fn test_impact_fails_when_reverse_walk_fails() {
    let g = Fixture::with_engine(Arc::new(FailingEngine::new(reverse_walk)));
    let alice = user("alice");
    let target = g.shared_function(&alice, "target").await;

    let err = g
        .impact
        .analyze(&alice, &target, ChangeType::Modify, 3, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Engine(_)));
}

// === Patterns ===

#[tokio::test]
async fn test_hub_and_isolated_vertices_are_detected() {
    let g = Fixture::new();
    let alice = user("alice");
    let hub = g.shared_function(&alice, "hub").await;
    for i in 0..3 {
        let callee = g.shared_function(&alice, &format!("callee{i}")).await;
        g.link(&alice, &hub, &callee, EdgeType::Calls).await;
    }
    let lonely = g.shared_function(&alice, "lonely").await;

    let options = PatternOptions {
        hub_degree: 3,
        ..PatternOptions::default()
    };
    let report = g.patterns.detect(&alice, &options).await.expect("detect");

    assert_eq!(report.scanned, 5);
    assert!(report.skipped.is_empty());
    let types: Vec<PatternType> = report.patterns.iter().map(|p| p.pattern_type).collect();
    assert_eq!(
        types,
        vec![PatternType::HubFunction, PatternType::IsolatedComponent]
    );
    assert_eq!(report.patterns[0].vertices, vec![hub]);
    assert!((report.patterns[0].confidence - 0.7).abs() < 1e-9);
    assert_eq!(report.patterns[1].vertices, vec![lonely]);
}

#[tokio::test]
async fn test_cycles_and_deep_chains_are_detected() {
    let g = Fixture::new();
    let alice = user("alice");
    triangle(&g).await;

    let mut chain = vec![g.shared_function(&alice, "l0").await];
    for i in 1..=3 {
        let next = g.shared_function(&alice, &format!("l{i}")).await;
        let last = chain.last().cloned().expect("chain start");
        g.link(&alice, &last, &next, EdgeType::DependsOn).await;
        chain.push(next);
    }

    let options = PatternOptions {
        deep_chain_length: 3,
        ..PatternOptions::default()
    };
    let report = g.patterns.detect(&alice, &options).await.expect("detect");

    let cycles = report
        .patterns
        .iter()
        .find(|p| p.pattern_type == PatternType::CircularDependencies)
        .expect("cycle pattern");
    assert_eq!(cycles.count, 1);
    assert_eq!(cycles.vertices.len(), 3);

    let deep = report
        .patterns
        .iter()
        .find(|p| p.pattern_type == PatternType::DeepDependencyChain)
        .expect("deep chain pattern");
    assert_eq!(deep.vertices, vec![chain[0].clone()]);
}

#[tokio::test]
async fn test_failing_detector_is_skipped() {
    let g = Fixture::with_engine(Arc::new(FailingEngine::new(is_cycle_search)));
    let alice = user("alice");
    triangle(&g).await;
    let lonely = g.shared_function(&alice, "lonely").await;

    let report = g
        .patterns
        .detect(&alice, &PatternOptions::default())
        .await
        .expect("detect");

    assert_eq!(report.skipped, vec![PatternType::CircularDependencies]);
    let isolated = report
        .patterns
        .iter()
        .find(|p| p.pattern_type == PatternType::IsolatedComponent)
        .expect("isolated pattern");
    assert_eq!(isolated.vertices, vec![lonely]);
}

#[tokio::test]
async fn test_out_of_range_threshold_is_rejected() {
    let g = Fixture::new();
    let options = PatternOptions {
        similarity_threshold: 1.5,
        ..PatternOptions::default()
    };
    let err = g
        .patterns
        .detect(&user("alice"), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}
