//! Edge access rules and per-hop filtering of traversals.

mod common;

use common::{Fixture, user};
use kgraph::domain::{EdgeAttributes, EdgeType, Visibility};
use kgraph::error::{Error, Operation};
use kgraph::traversal::DEFAULT_MAX_DEPTH;

// === Edge Creation ===

#[tokio::test]
async fn test_calls_edge_is_found_from_both_ends() {
    let g = Fixture::new();
    let alice = user("alice");
    let f1 = g.shared_function(&alice, "f1").await;
    let f2 = g.shared_function(&alice, "f2").await;

    let edge = g
        .edges
        .create_edge(&alice, &f1, &f2, EdgeType::Calls.into())
        .await
        .expect("create edge");
    assert_eq!(edge.from_vertex_id, f1);
    assert_eq!(edge.to_vertex_id, f2);
    assert_eq!(edge.tenant_id, "acme");

    let outgoing = g
        .edges
        .find_edges_from(&alice, &f1, Some(EdgeType::Calls))
        .await
        .expect("outgoing");
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].to_vertex_id, f2);

    let incoming = g
        .edges
        .find_edges_to(&alice, &f2, None)
        .await
        .expect("incoming");
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].id, edge.id);

    let other_type = g
        .edges
        .find_edges_from(&alice, &f1, Some(EdgeType::Uses))
        .await
        .expect("filtered");
    assert!(other_type.is_empty());
}

#[tokio::test]
async fn test_edge_to_invisible_vertex_is_refused() {
    let g = Fixture::new();
    let alice = user("alice");
    let bob = user("bob");
    let public = g.shared_function(&alice, "public").await;
    let hidden = g.function(&bob, "hidden", Visibility::Private).await;

    let err = g
        .edges
        .create_edge(&alice, &public, &hidden.id, EdgeType::Calls.into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientPermissions {
            operation: Operation::CreateEdge
        }
    ));

    let outgoing = g
        .edges
        .find_edges_from(&alice, &public, None)
        .await
        .expect("outgoing");
    assert!(outgoing.is_empty());
}

#[tokio::test]
async fn test_edge_to_invisible_vertex_is_hidden_from_lookups() {
    let g = Fixture::new();
    let alice = user("alice");
    let bob = user("bob");
    let public = g.shared_function(&alice, "public").await;
    let hidden = g.function(&bob, "hidden", Visibility::Private).await;

    let edge = g
        .edges
        .create_edge(&bob, &public, &hidden.id, EdgeType::Calls.into())
        .await
        .expect("bob sees both ends");
    assert_eq!(edge.visibility, Visibility::Private);

    let for_alice = g
        .edges
        .find_edges_from(&alice, &public, None)
        .await
        .expect("outgoing");
    assert!(for_alice.is_empty());

    let for_bob = g
        .edges
        .find_edges_from(&bob, &public, None)
        .await
        .expect("outgoing");
    assert_eq!(for_bob.len(), 1);
}

#[tokio::test]
async fn test_edge_lookups_on_invisible_vertex_are_empty() {
    let g = Fixture::new();
    let bob = user("bob");
    let hidden = g.function(&bob, "hidden", Visibility::Private).await;
    let other = g.function(&bob, "other", Visibility::Private).await;
    g.link(&bob, &hidden.id, &other.id, EdgeType::Uses).await;

    let alice = user("alice");
    assert!(
        g.edges
            .find_edges_from(&alice, &hidden.id, None)
            .await
            .expect("outgoing")
            .is_empty()
    );
    assert!(
        g.edges
            .find_edges_to(&alice, &other.id, None)
            .await
            .expect("incoming")
            .is_empty()
    );
}

#[tokio::test]
async fn test_explicit_edge_visibility_is_kept() {
    let g = Fixture::new();
    let alice = user("alice");
    let a = g.shared_function(&alice, "a").await;
    let b = g.shared_function(&alice, "b").await;

    let mut attrs = EdgeAttributes::from(EdgeType::DependsOn);
    attrs.visibility = Some(Visibility::Team);
    let edge = g
        .edges
        .create_edge(&alice, &a, &b, attrs)
        .await
        .expect("create edge");
    assert_eq!(edge.visibility, Visibility::Team);
    assert_eq!(edge.edge_type, EdgeType::DependsOn);
}

// === Traversal ===

#[tokio::test]
async fn test_traversal_stops_at_invisible_intermediate_vertex() {
    let g = Fixture::new();
    let alice = user("alice");
    let bob = user("bob");
    let a = g.shared_function(&alice, "a").await;
    let c = g.shared_function(&alice, "c").await;
    let b = g.function(&bob, "b", Visibility::Private).await;
    g.link(&bob, &a, &b.id, EdgeType::Calls).await;
    g.link(&bob, &b.id, &c, EdgeType::Calls).await;

    for depth in 1..=2 {
        let paths = g
            .traversal
            .traverse_graph(&alice, &a, depth, &[])
            .await
            .expect("traverse");
        for path in &paths {
            let ids = path.vertex_ids();
            assert!(!ids.contains(&b.id), "hidden vertex leaked at depth {depth}");
            assert!(!ids.contains(&c), "vertex behind hidden hop leaked at depth {depth}");
        }
    }

    let for_bob = g
        .traversal
        .traverse_graph(&bob, &a, 2, &[])
        .await
        .expect("traverse");
    assert!(
        for_bob
            .iter()
            .any(|p| p.vertex_ids() == vec![a.clone(), b.id.clone(), c.clone()])
    );
}

#[tokio::test]
async fn test_traversal_follows_edges_in_both_directions() {
    let g = Fixture::new();
    let alice = user("alice");
    let a = g.shared_function(&alice, "a").await;
    let b = g.shared_function(&alice, "b").await;
    let c = g.shared_function(&alice, "c").await;
    g.link(&alice, &a, &b, EdgeType::Calls).await;
    g.link(&alice, &c, &b, EdgeType::Uses).await;

    let paths = g
        .traversal
        .traverse_graph(&alice, &a, 2, &[])
        .await
        .expect("traverse");

    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].vertex_ids(), vec![a, b, c]);
    assert_eq!(paths[0].length(), 2);
}

#[tokio::test]
async fn test_traversal_respects_edge_type_filter() {
    let g = Fixture::new();
    let alice = user("alice");
    let a = g.shared_function(&alice, "a").await;
    let b = g.shared_function(&alice, "b").await;
    let c = g.shared_function(&alice, "c").await;
    g.link(&alice, &a, &b, EdgeType::Calls).await;
    g.link(&alice, &a, &c, EdgeType::References).await;

    let paths = g
        .traversal
        .traverse_graph(&alice, &a, 1, &[EdgeType::Calls])
        .await
        .expect("traverse");

    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].last().map(|v| v.id.clone()), Some(b));
}

#[tokio::test]
async fn test_traversal_from_invisible_start_is_empty() {
    let g = Fixture::new();
    let bob = user("bob");
    let hidden = g.function(&bob, "hidden", Visibility::Private).await;

    let paths = g
        .traversal
        .traverse_graph(&user("alice"), &hidden.id, 1, &[])
        .await
        .expect("traverse");
    assert!(paths.is_empty());
}

#[tokio::test]
async fn test_traversal_depth_is_bounded() {
    let g = Fixture::new();
    let alice = user("alice");
    let a = g.shared_function(&alice, "a").await;

    let err = g
        .traversal
        .traverse_graph(&alice, &a, DEFAULT_MAX_DEPTH + 1, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}
