//! Shortest hop counts over an in-memory, undirected adjacency

use std::collections::{BTreeMap, BTreeSet};

/// Undirected adjacency between nodes
#[derive(Debug, Clone)]
pub struct Adjacency<N: Ord + Clone> {
    neighbors: BTreeMap<N, BTreeSet<N>>,
}

impl<N: Ord + Clone> Default for Adjacency<N> {
    fn default() -> Self {
        Self {
            neighbors: BTreeMap::new(),
        }
    }
}

impl<N: Ord + Clone> Adjacency<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `a` and `b` both ways
    pub fn link(&mut self, a: N, b: N) {
        self.neighbors.entry(a.clone()).or_default().insert(b.clone());
        self.neighbors.entry(b).or_default().insert(a);
    }

    pub fn add_node(&mut self, node: N) {
        self.neighbors.entry(node).or_default();
    }

    pub fn neighbors(&self, node: &N) -> impl Iterator<Item = &N> {
        self.neighbors.get(node).into_iter().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Shortest hop count from `origin` to every node within `max_hops`.
    ///
    /// Repeatedly relaxes every link until no distance decreases. A
    /// recorded distance is only ever replaced by a strictly smaller one,
    /// and nodes farther than `max_hops` are left out.
    pub fn shortest_distances(&self, origin: &N, max_hops: u32) -> BTreeMap<N, u32> {
        let mut distances = BTreeMap::new();
        if !self.neighbors.contains_key(origin) {
            return distances;
        }
        distances.insert(origin.clone(), 0);

        loop {
            let mut changed = false;
            for (node, adjacent) in &self.neighbors {
                let Some(&known) = distances.get(node) else {
                    continue;
                };
                let through = known + 1;
                if through > max_hops {
                    continue;
                }
                for next in adjacent {
                    match distances.get(next) {
                        Some(&d) if d <= through => {}
                        _ => {
                            distances.insert(next.clone(), through);
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                return distances;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chain(n: u32) -> Adjacency<u32> {
        let mut adjacency = Adjacency::new();
        for i in 0..n {
            adjacency.link(i, i + 1);
        }
        adjacency
    }

    #[test]
    fn origin_alone_at_zero_hops() {
        let distances = chain(3).shortest_distances(&0, 0);
        assert_eq!(distances, BTreeMap::from([(0, 0)]));
    }

    #[test]
    fn unknown_origin_reaches_nothing() {
        assert!(chain(3).shortest_distances(&42, 5).is_empty());
    }

    #[test]
    fn chain_is_cut_at_max_hops() {
        let distances = chain(5).shortest_distances(&0, 2);
        assert_eq!(distances, BTreeMap::from([(0, 0), (1, 1), (2, 2)]));
    }

    #[test]
    fn shortcut_wins_over_long_path() {
        // 0-1-2-3 and 0-3
        let mut adjacency = chain(3);
        adjacency.link(0, 3);
        let distances = adjacency.shortest_distances(&0, 5);
        assert_eq!(distances[&3], 1);
        assert_eq!(distances[&2], 2);
    }

    #[test]
    fn links_are_undirected() {
        let mut adjacency = Adjacency::new();
        adjacency.link(1, 0);
        assert_eq!(adjacency.shortest_distances(&0, 1)[&1], 1);
    }

    /// Shortest hop counts by enumerating every simple path from the origin
    fn brute_force(adjacency: &Adjacency<u32>, origin: u32, max_hops: u32) -> BTreeMap<u32, u32> {
        fn walk(
            adjacency: &Adjacency<u32>,
            node: u32,
            hops: u32,
            max_hops: u32,
            path: &mut Vec<u32>,
            best: &mut BTreeMap<u32, u32>,
        ) {
            let entry = best.entry(node).or_insert(hops);
            *entry = (*entry).min(hops);
            if hops == max_hops {
                return;
            }
            for &next in adjacency.neighbors(&node) {
                if !path.contains(&next) {
                    path.push(next);
                    walk(adjacency, next, hops + 1, max_hops, path, best);
                    path.pop();
                }
            }
        }

        let mut best = BTreeMap::new();
        if adjacency.neighbors.contains_key(&origin) {
            walk(adjacency, origin, 0, max_hops, &mut vec![origin], &mut best);
        }
        best
    }

    proptest! {
        #[test]
        fn relaxation_matches_path_enumeration(
            links in prop::collection::vec((0u32..8, 0u32..8), 0..16),
            max_hops in 0u32..5,
        ) {
            let mut adjacency = Adjacency::new();
            adjacency.add_node(0);
            for (a, b) in links {
                adjacency.link(a, b);
            }
            prop_assert_eq!(
                adjacency.shortest_distances(&0, max_hops),
                brute_force(&adjacency, 0, max_hops)
            );
        }
    }
}
