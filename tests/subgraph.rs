//! Bounded extraction around a focus vertex

mod common;

use common::MapBuilder;
use mindgraph::{TagRequest, Uri, TYPE_RELATION_EXTERNAL_URI};
use proptest::prelude::*;
use std::collections::{BTreeMap, VecDeque};

#[test]
fn depth_zero_returns_only_the_focus() {
    let map = MapBuilder::new("roger").chain(&["a", "b", "c"]);
    let subgraph = map.graph.extractor().extract(&map.uri("a"), 0).unwrap();

    assert_eq!(subgraph.vertex_count(), 1);
    assert!(subgraph.has_vertex(&map.uri("a")));
    assert_eq!(subgraph.edge_count(), 0);
}

#[test]
fn chain_is_cut_at_depth() {
    let map = MapBuilder::new("roger").chain(&["a", "b", "c", "d"]);
    let subgraph = map.graph.extractor().extract(&map.uri("a"), 2).unwrap();

    assert_eq!(subgraph.distance_of(&map.uri("a")), Some(0));
    assert_eq!(subgraph.distance_of(&map.uri("b")), Some(1));
    assert_eq!(subgraph.distance_of(&map.uri("c")), Some(2));
    assert!(!subgraph.has_vertex(&map.uri("d")));
    assert_eq!(subgraph.edge_count(), 2);
}

#[test]
fn shortest_distance_wins_over_longer_paths() {
    // a-b-c-d plus a shortcut a-d
    let map = MapBuilder::new("roger")
        .chain(&["a", "b", "c", "d"])
        .edge("a", "d");
    let subgraph = map.graph.extractor().extract(&map.uri("a"), 3).unwrap();

    assert_eq!(subgraph.distance_of(&map.uri("d")), Some(1));
    assert_eq!(subgraph.distance_of(&map.uri("c")), Some(2));
}

#[test]
fn edges_are_followed_in_both_directions() {
    let map = MapBuilder::new("roger").edge("b", "a").edge("c", "b");
    let subgraph = map.graph.extractor().extract(&map.uri("a"), 2).unwrap();
    assert_eq!(subgraph.distance_of(&map.uri("c")), Some(2));
}

#[test]
fn unreachable_vertices_never_appear() {
    let map = MapBuilder::new("roger").edge("a", "b").vertex("island");
    let subgraph = map.graph.extractor().extract(&map.uri("a"), 5).unwrap();
    assert!(!subgraph.has_vertex(&map.uri("island")));
    assert_eq!(subgraph.vertex_count(), 2);
}

#[test]
fn vertices_carry_tags_and_included_elements() {
    let map = MapBuilder::new("roger")
        .edge("group", "member")
        .vertex("inner")
        .edge("left", "right");
    let graph = &map.graph;
    graph
        .identification()
        .add_tag(
            &map.uri("group"),
            TagRequest::new("https://example.org/Forest").with_relation(TYPE_RELATION_EXTERNAL_URI),
        )
        .unwrap();
    graph
        .identification()
        .add_tag(map.edges()[0].uri(), TagRequest::new("https://example.org/contains"))
        .unwrap();
    graph
        .elements()
        .include_vertex(&map.uri("group"), &map.uri("inner"))
        .unwrap();
    let inner_edge = map.edges()[1].uri().clone();
    graph
        .elements()
        .include_edge(&map.uri("group"), &inner_edge)
        .unwrap();

    let subgraph = graph.extractor().extract(&map.uri("group"), 1).unwrap();
    let group = subgraph.vertex(&map.uri("group")).unwrap();
    assert_eq!(group.types().count(), 1);
    assert_eq!(group.identifications.len(), 1);
    assert_eq!(group.included_vertices[&map.uri("inner")].label, "inner");

    let included = &group.included_edges[&inner_edge];
    assert_eq!(included.source_vertex.uri, map.uri("left"));
    assert_eq!(included.source_vertex.label, "left");
    assert_eq!(included.destination_vertex.uri, map.uri("right"));
    assert_eq!(included.destination_vertex.label, "right");

    let edge = subgraph.edge(map.edges()[0].uri()).unwrap();
    assert_eq!(edge.identifications.len(), 1);
    assert_eq!(edge.source_vertex_uri, map.uri("group"));
}

/// Hop counts by plain breadth-first search over the edge list
fn bfs(links: &[(usize, usize)], origin: usize, depth: u32) -> BTreeMap<usize, u32> {
    let mut distances = BTreeMap::from([(origin, 0)]);
    let mut queue = VecDeque::from([origin]);
    while let Some(node) = queue.pop_front() {
        let d = distances[&node];
        if d == depth {
            continue;
        }
        for &(a, b) in links {
            let next = if a == node {
                b
            } else if b == node {
                a
            } else {
                continue;
            };
            if !distances.contains_key(&next) {
                distances.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }
    distances
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn extracted_distances_are_shortest_hop_counts(
        links in prop::collection::vec((0usize..7, 0usize..7), 0..12),
        depth in 0u32..4,
    ) {
        let names: Vec<String> = (0..7).map(|i| format!("v{}", i)).collect();
        let mut map = MapBuilder::new("roger");
        for name in &names {
            map = map.vertex(name);
        }
        for &(a, b) in &links {
            map = map.edge(&names[a], &names[b]);
        }

        let subgraph = map.graph.extractor().extract(&map.uri("v0"), depth).unwrap();
        let expected = bfs(&links, 0, depth);

        let actual: BTreeMap<Uri, u32> = subgraph
            .vertices
            .iter()
            .map(|(uri, v)| (uri.clone(), v.min_distance_from_focus.unwrap()))
            .collect();
        let expected: BTreeMap<Uri, u32> = expected
            .into_iter()
            .map(|(i, d)| (map.uri(&names[i]), d))
            .collect();
        prop_assert_eq!(actual, expected);

        // Every edge touches a vertex closer than the depth limit
        for edge in subgraph.edges.values() {
            let closest = [&edge.source_vertex_uri, &edge.destination_vertex_uri]
                .iter()
                .filter_map(|u| subgraph.distance_of(u))
                .min();
            prop_assert!(matches!(closest, Some(d) if d < depth));
        }
    }
}
