use std::collections::BTreeSet;

use foundation::bounds::ScreenRect;
use foundation::math::Vec2;

/// A box to be placed. `position` is the box center.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub position: Vec2,
}

impl LayoutNode {
    pub fn new(index: usize, width: f64, height: f64) -> Self {
        Self {
            index,
            width,
            height,
            position: Vec2::ZERO,
        }
    }

    pub fn bounds(&self) -> ScreenRect {
        ScreenRect::new(
            self.position.x - self.width / 2.0,
            self.position.y - self.height / 2.0,
            self.width,
            self.height,
        )
    }
}

/// Directed edge between node indices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutEdge {
    pub source: usize,
    pub target: usize,
}

impl LayoutEdge {
    pub fn new(source: usize, target: usize) -> Self {
        Self { source, target }
    }
}

/// Undirected neighbour sets, one per node. Edges to unknown nodes are ignored.
pub fn neighbours(node_count: usize, edges: &[LayoutEdge]) -> Vec<BTreeSet<usize>> {
    let mut sets = vec![BTreeSet::new(); node_count];
    for e in edges {
        if e.source < node_count && e.target < node_count && e.source != e.target {
            sets[e.source].insert(e.target);
            sets[e.target].insert(e.source);
        }
    }
    sets
}

/// Per-edge lengths `base * (1 + (1 - jaccard(u, v)))`, where the Jaccard
/// index is taken over the endpoints' neighbour sets. Edges between nodes
/// that share many neighbours get shorter.
pub fn jaccard_lengths(node_count: usize, edges: &[LayoutEdge], base: f64) -> Vec<f64> {
    let sets = neighbours(node_count, edges);
    edges
        .iter()
        .map(|e| {
            let (Some(a), Some(b)) = (sets.get(e.source), sets.get(e.target)) else {
                return base;
            };
            let union = a.union(b).count();
            let jaccard = if union == 0 {
                0.0
            } else {
                a.intersection(b).count() as f64 / union as f64
            };
            base * (2.0 - jaccard)
        })
        .collect()
}

/// All-pairs shortest path lengths over the undirected graph.
///
/// Disconnected pairs get the longest finite distance plus `gap`.
pub fn ideal_distances(
    node_count: usize,
    edges: &[LayoutEdge],
    lengths: &[f64],
    gap: f64,
) -> Vec<Vec<f64>> {
    let n = node_count;
    let mut d = vec![vec![f64::INFINITY; n]; n];
    for (i, row) in d.iter_mut().enumerate() {
        row[i] = 0.0;
    }
    for (e, len) in edges.iter().zip(lengths) {
        if e.source >= n || e.target >= n || e.source == e.target {
            continue;
        }
        let l = d[e.source][e.target].min(*len);
        d[e.source][e.target] = l;
        d[e.target][e.source] = l;
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                let via = d[i][k] + d[k][j];
                if via < d[i][j] {
                    d[i][j] = via;
                }
            }
        }
    }
    let longest = d
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    for row in &mut d {
        for v in row.iter_mut() {
            if !v.is_finite() {
                *v = longest + gap;
            }
        }
    }
    d
}
