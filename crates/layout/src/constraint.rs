//! Stress-majorization layout with separation constraints.
//!
//! Iterations run in three phases with separate budgets: unconstrained,
//! then with downward-flow constraints, then with non-overlap constraints
//! as well. A phase ends early once the stress stops improving by more
//! than the convergence threshold.

use foundation::math::Vec2;
use tracing::debug;

use crate::graph::{LayoutEdge, LayoutNode, ideal_distances, jaccard_lengths};
use crate::strategy::LayoutStrategy;

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
const PROJECTION_PASSES: usize = 64;
const SEPARATION_SLACK: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintConfig {
    /// Area the layout is centered in.
    pub size: Vec2,
    /// Base edge length before Jaccard scaling.
    pub link_length: f64,
    /// Minimum center-to-center x distance from an edge's source to its target.
    pub flow_separation: Option<f64>,
    pub avoid_overlaps: bool,
    /// Relative stress change under which a phase is considered settled.
    pub convergence_threshold: f64,
    /// Iteration budgets of the unconstrained, flow and full phases.
    pub schedule: [usize; 3],
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(960.0, 500.0),
            link_length: 150.0,
            flow_separation: Some(150.0),
            avoid_overlaps: true,
            convergence_threshold: 1e-3,
            schedule: [50, 100, 200],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstraintLayout {
    config: ConstraintConfig,
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    ideal: Vec<Vec<f64>>,
    phase: usize,
    phase_steps: usize,
    steps: usize,
    last_stress: f64,
    converged: bool,
}

impl Default for ConstraintLayout {
    fn default() -> Self {
        Self::new(ConstraintConfig::default())
    }
}

impl ConstraintLayout {
    pub fn new(config: ConstraintConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            edges: Vec::new(),
            ideal: Vec::new(),
            phase: 0,
            phase_steps: 0,
            steps: 0,
            last_stress: f64::INFINITY,
            converged: true,
        }
    }

    pub fn config(&self) -> &ConstraintConfig {
        &self.config
    }

    /// Iterations performed since the last `initialize`.
    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    /// Upper bound on iterations per layout.
    pub fn max_steps(&self) -> usize {
        self.config.schedule.iter().sum()
    }

    /// Sum of squared relative deviations from the ideal distances.
    pub fn stress(&self) -> f64 {
        let mut total = 0.0;
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let d = self.ideal[i][j];
                if d <= 0.0 {
                    continue;
                }
                let actual = (self.nodes[i].position - self.nodes[j].position).length();
                total += (actual - d).powi(2) / (d * d);
            }
        }
        total
    }

    fn skip_empty_phases(&mut self) {
        while self.phase < self.config.schedule.len() && self.config.schedule[self.phase] == 0 {
            self.phase += 1;
        }
        if self.phase >= self.config.schedule.len() {
            self.converged = true;
        }
    }

    /// One Jacobi sweep of localized stress majorization.
    fn majorize(&mut self) {
        let old: Vec<Vec2> = self.nodes.iter().map(|n| n.position).collect();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let mut sum = Vec2::ZERO;
            let mut weights = 0.0;
            for (j, pj) in old.iter().enumerate() {
                let d = self.ideal[i][j];
                if i == j || d <= 0.0 {
                    continue;
                }
                let w = 1.0 / (d * d);
                let delta = old[i] - *pj;
                let dist = delta.length();
                let dir = if dist > 1e-9 {
                    delta.scale(1.0 / dist)
                } else {
                    let a = GOLDEN_ANGLE * (i + 1) as f64;
                    Vec2::new(a.cos(), a.sin())
                };
                sum += (*pj + dir.scale(d)).scale(w);
                weights += w;
            }
            if weights > 0.0 {
                node.position = sum.scale(1.0 / weights);
            }
        }
    }

    fn project_flow(&mut self, separation: f64) {
        for _ in 0..PROJECTION_PASSES {
            let mut moved = false;
            for e in &self.edges {
                if e.source == e.target {
                    continue;
                }
                let gap = self.nodes[e.target].position.x - self.nodes[e.source].position.x;
                if gap < separation - SEPARATION_SLACK {
                    let shift = (separation - gap) / 2.0;
                    self.nodes[e.source].position.x -= shift;
                    self.nodes[e.target].position.x += shift;
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }
    }

    fn project_overlaps(&mut self) {
        let n = self.nodes.len();
        for _ in 0..PROJECTION_PASSES {
            let mut moved = false;
            for i in 0..n {
                for j in (i + 1)..n {
                    let (a, b) = (self.nodes[i].bounds(), self.nodes[j].bounds());
                    if !a.intersects(&b) {
                        continue;
                    }
                    let ox = a.max().x.min(b.max().x) - a.min().x.max(b.min().x);
                    let oy = a.max().y.min(b.max().y) - a.min().y.max(b.min().y);
                    let delta = self.nodes[i].position - self.nodes[j].position;
                    if ox < oy {
                        let s = if delta.x < 0.0 { -1.0 } else { 1.0 };
                        let shift = ox / 2.0 + SEPARATION_SLACK;
                        self.nodes[i].position.x += s * shift;
                        self.nodes[j].position.x -= s * shift;
                    } else {
                        let s = if delta.y < 0.0 { -1.0 } else { 1.0 };
                        let shift = oy / 2.0 + SEPARATION_SLACK;
                        self.nodes[i].position.y += s * shift;
                        self.nodes[j].position.y -= s * shift;
                    }
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }
    }

    /// Moves the bounding box center onto the center of the layout area.
    fn recenter(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let (mut lo, mut hi) = (
            Vec2::new(f64::INFINITY, f64::INFINITY),
            Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        );
        for n in &self.nodes {
            let b = n.bounds();
            lo = Vec2::new(lo.x.min(b.min().x), lo.y.min(b.min().y));
            hi = Vec2::new(hi.x.max(b.max().x), hi.y.max(b.max().y));
        }
        let offset = self.config.size.scale(0.5) - (lo + hi).scale(0.5);
        if offset.is_finite() {
            for n in &mut self.nodes {
                n.position += offset;
            }
        }
    }
}

impl LayoutStrategy for ConstraintLayout {
    fn initialize(&mut self, nodes: Vec<LayoutNode>, edges: Vec<LayoutEdge>) {
        let n = nodes.len();
        let center = self.config.size.scale(0.5);
        self.nodes = nodes;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.index = i;
            if node.position == Vec2::ZERO {
                let angle = i as f64 * GOLDEN_ANGLE;
                let radius = 100.0 + i as f64 * 20.0;
                node.position = center + Vec2::new(angle.cos(), angle.sin()).scale(radius);
            }
        }
        self.edges = edges
            .into_iter()
            .filter(|e| e.source < n && e.target < n)
            .collect();
        let lengths = jaccard_lengths(n, &self.edges, self.config.link_length);
        self.ideal = ideal_distances(n, &self.edges, &lengths, self.config.link_length);
        self.phase = 0;
        self.phase_steps = 0;
        self.steps = 0;
        self.last_stress = f64::INFINITY;
        self.converged = n == 0;
        self.skip_empty_phases();
    }

    fn step(&mut self) -> &[LayoutNode] {
        if self.converged {
            return &self.nodes;
        }
        self.majorize();
        if self.phase >= 1 {
            if let Some(sep) = self.config.flow_separation {
                self.project_flow(sep);
            }
        }
        if self.phase >= 2 && self.config.avoid_overlaps {
            self.project_overlaps();
        }
        self.recenter();

        let stress = self.stress();
        let settled = self.last_stress.is_finite()
            && (self.last_stress - stress).abs() / self.last_stress.max(f64::EPSILON)
                < self.config.convergence_threshold;
        self.last_stress = stress;
        self.steps += 1;
        self.phase_steps += 1;

        if settled || self.phase_steps >= self.config.schedule[self.phase] {
            debug!(
                phase = self.phase,
                steps = self.phase_steps,
                stress,
                settled,
                "layout phase finished"
            );
            self.phase += 1;
            self.phase_steps = 0;
            self.last_stress = f64::INFINITY;
            self.skip_empty_phases();
        }
        &self.nodes
    }

    fn is_converged(&self) -> bool {
        self.converged
    }

    fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }
}
