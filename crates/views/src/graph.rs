use std::collections::{BTreeMap, BTreeSet, HashSet};

use foundation::math::Vec2;
use layers::graph::{ModuleBox, ModuleGraphLayer};
use layout::constraint::{ConstraintConfig, ConstraintLayout};
use layout::graph::{LayoutEdge, LayoutNode};
use layout::routing::route_edges;
use layout::strategy::LayoutStrategy;
use scene::SceneGraph;
use streaming::protocol::ModuleSummary;
use tracing::debug;

use crate::config::GraphConfig;
use crate::viewport::ZoomTransform;

pub const LINKS: &str = "links";
pub const NODES: &str = "nodes";
pub const LABELS: &str = "labels";

/// Upper bound for [`GraphView::settle_layout`] with strategies that never
/// report convergence.
const MAX_SETTLE_STEPS: usize = 10_000;

/// Graph edges are layout edges over per-pass node ids.
pub type GraphEdge = LayoutEdge;

/// Pixel size of rendered label text.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size_px: f64) -> Vec2;
}

/// Estimate for hosts without a text engine: every glyph has the same advance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedAdvance {
    pub advance_em: f64,
    pub line_height_em: f64,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self {
            advance_em: 0.6,
            line_height_em: 1.2,
        }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str, font_size_px: f64) -> Vec2 {
        Vec2::new(
            text.chars().count() as f64 * self.advance_em * font_size_px,
            self.line_height_em * font_size_px,
        )
    }
}

/// A module as one refresh sees it. `id` is its position in that listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: usize,
    pub name: String,
    pub state: String,
}

pub fn graph_nodes(modules: &[ModuleSummary]) -> Vec<GraphNode> {
    modules
        .iter()
        .enumerate()
        .map(|(id, m)| GraphNode {
            id,
            name: m.id.clone(),
            state: m.state.clone(),
        })
        .collect()
}

/// Module name to node id. A repeated name maps to its last position.
pub fn name_table(nodes: &[GraphNode]) -> BTreeMap<String, usize> {
    nodes.iter().map(|n| (n.name.clone(), n.id)).collect()
}

/// One edge per connected module pair, in first-seen order.
///
/// Several slot links between the same two modules collapse into one edge;
/// links naming a module outside `names` are skipped.
pub fn collect_edges(modules: &[ModuleSummary], names: &BTreeMap<String, usize>) -> Vec<GraphEdge> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for link in modules.iter().flat_map(ModuleSummary::links) {
        let (Some(&source), Some(&target)) = (
            names.get(&link.output_module),
            names.get(&link.input_module),
        ) else {
            debug!(
                from = %link.output_module,
                to = %link.input_module,
                "skipping link to unknown module"
            );
            continue;
        };
        let edge = LayoutEdge::new(source, target);
        if seen.insert(edge) {
            edges.push(edge);
        }
    }
    edges
}

/// What one [`GraphView::update`] did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GraphUpdate {
    /// Boxes, labels and links were rebuilt and the layout restarted.
    pub rebuilt: bool,
    pub nodes: usize,
    pub edges: usize,
}

/// Module dependency graph: boxed modules, labels and routed links.
///
/// The first non-empty listing builds the geometry and starts the layout;
/// later listings only restyle boxes by module state. The host steps the
/// layout with [`GraphView::advance_layout`]; links are routed once it has
/// converged.
pub struct GraphView<L = ConstraintLayout> {
    config: GraphConfig,
    layout: L,
    measure: Box<dyn TextMeasure>,
    layer: ModuleGraphLayer,
    scene: SceneGraph,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    built: bool,
    routed: bool,
    zoom: ZoomTransform,
}

impl GraphView<ConstraintLayout> {
    pub fn new(config: GraphConfig, measure: Box<dyn TextMeasure>) -> Self {
        let layout = ConstraintLayout::new(ConstraintConfig {
            size: config.size(),
            link_length: config.link_length,
            flow_separation: config.flow_separation,
            avoid_overlaps: config.avoid_overlaps,
            convergence_threshold: config.convergence_threshold,
            schedule: config.schedule,
        });
        Self::with_layout(config, layout, measure)
    }
}

impl<L: LayoutStrategy> GraphView<L> {
    pub fn with_layout(config: GraphConfig, layout: L, measure: Box<dyn TextMeasure>) -> Self {
        let mut layer = ModuleGraphLayer::new(10, NODES);
        layer.font_size_px = config.font_size_px;
        Self {
            scene: SceneGraph::new(config.size()),
            config,
            layout,
            measure,
            layer,
            nodes: Vec::new(),
            edges: Vec::new(),
            built: false,
            routed: false,
            zoom: ZoomTransform::identity(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn is_routed(&self) -> bool {
        self.routed
    }

    pub fn is_converged(&self) -> bool {
        self.layout.is_converged()
    }

    pub fn transform(&self) -> ZoomTransform {
        self.zoom
    }

    pub fn update(&mut self, modules: &[ModuleSummary]) -> GraphUpdate {
        let nodes = graph_nodes(modules);
        let names = name_table(&nodes);
        let edges = collect_edges(modules, &names);

        let rebuild = !self.built
            || (self.config.relayout_on_structure_change
                && structure(&self.nodes, &self.edges) != structure(&nodes, &edges));
        if rebuild && !nodes.is_empty() {
            self.nodes = nodes;
            self.edges = edges;
            self.build();
            debug!(
                nodes = self.nodes.len(),
                edges = self.edges.len(),
                "module graph built"
            );
            return GraphUpdate {
                rebuilt: true,
                nodes: self.nodes.len(),
                edges: self.edges.len(),
            };
        }

        let states: BTreeMap<&str, &str> = nodes
            .iter()
            .map(|n| (n.name.as_str(), n.state.as_str()))
            .collect();
        for node in &mut self.nodes {
            if let Some(state) = states.get(node.name.as_str()) {
                node.state = state.to_string();
            }
        }
        if let Some(group) = self.scene.group_mut(NODES) {
            self.layer.restyle(group, states.iter().map(|(n, s)| (*n, *s)));
        }
        GraphUpdate {
            rebuilt: false,
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        }
    }

    fn build(&mut self) {
        let font = self.layer.font_size_px;
        let extra = 2.0 * (self.config.margin + self.config.pad);
        let layout_nodes = self
            .nodes
            .iter()
            .map(|n| {
                let text = self.measure.measure(&n.name, font);
                LayoutNode::new(n.id, text.x + extra, text.y + extra)
            })
            .collect();
        self.layout.initialize(layout_nodes, self.edges.clone());

        self.scene.clear();
        let transform = self.zoom.as_group();
        for id in [LINKS, NODES, LABELS] {
            self.scene.ensure_group(id, transform);
        }
        self.built = true;
        self.routed = false;

        let unrouted: Vec<(String, Vec<Vec2>)> = self
            .edges
            .iter()
            .filter_map(|e| self.link_key(*e))
            .map(|key| (key, Vec::new()))
            .collect();
        if let Some(group) = self.scene.group_mut(LINKS) {
            self.layer.sync_links(group, unrouted);
        }
        self.apply_positions();
    }

    fn link_key(&self, edge: GraphEdge) -> Option<String> {
        let source = self.nodes.get(edge.source)?;
        let target = self.nodes.get(edge.target)?;
        Some(format!("{}->{}", source.name, target.name))
    }

    /// Copies the layout's current positions into boxes and labels.
    fn apply_positions(&mut self) {
        let margin = self.config.margin;
        let label_dy = (margin + self.config.pad) / 2.0;
        let boxes: Vec<ModuleBox> = self
            .layout
            .nodes()
            .iter()
            .filter_map(|ln| {
                let node = self.nodes.get(ln.index)?;
                Some(ModuleBox {
                    name: node.name.clone(),
                    state: node.state.clone(),
                    rect: Some(ln.bounds().inflate(-margin)),
                    label_at: Some(Vec2::new(ln.position.x, ln.position.y + label_dy)),
                })
            })
            .collect();
        if let Some(group) = self.scene.group_mut(NODES) {
            self.layer.sync_boxes(group, &boxes);
        }
        if let Some(group) = self.scene.group_mut(LABELS) {
            self.layer.sync_labels(group, &boxes);
        }
    }

    fn route(&mut self) {
        let routes = route_edges(self.layout.nodes(), self.layout.edges(), self.config.margin);
        let links: Vec<(String, Vec<Vec2>)> = self
            .layout
            .edges()
            .iter()
            .zip(routes)
            .filter_map(|(e, points)| Some((self.link_key(*e)?, points)))
            .collect();
        if let Some(group) = self.scene.group_mut(LINKS) {
            self.layer.sync_links(group, links);
        }
        self.routed = true;
        debug!(edges = self.edges.len(), "module graph links routed");
    }

    /// Runs up to `max_steps` layout iterations and redraws the boxes.
    ///
    /// Routes the links once the layout has converged. Returns whether it has.
    pub fn advance_layout(&mut self, max_steps: usize) -> bool {
        if !self.built {
            return true;
        }
        let mut steps = 0;
        while steps < max_steps && !self.layout.is_converged() {
            self.layout.step();
            steps += 1;
        }
        if steps > 0 {
            self.apply_positions();
        }
        let converged = self.layout.is_converged();
        if converged && !self.routed {
            self.route();
        }
        converged
    }

    pub fn settle_layout(&mut self) -> bool {
        self.advance_layout(MAX_SETTLE_STEPS)
    }

    pub fn zoom(&mut self, transform: ZoomTransform) {
        self.zoom = transform.clamped(self.config.zoom_extent);
        let group_transform = self.zoom.as_group();
        for id in [LINKS, NODES, LABELS] {
            if let Some(group) = self.scene.group_mut(id) {
                group.transform = group_transform;
            }
        }
    }

    pub fn zoom_at(&mut self, anchor_px: Vec2, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let next = self
            .zoom
            .zoomed_at(anchor_px, factor, self.config.zoom_extent);
        self.zoom(next);
    }

    pub fn pan_by(&mut self, delta_px: Vec2) {
        self.zoom(ZoomTransform::new(
            self.zoom.translate + delta_px,
            self.zoom.scale,
        ));
    }
}

/// Module names and named edges, independent of listing order.
fn structure(nodes: &[GraphNode], edges: &[GraphEdge]) -> (BTreeSet<String>, BTreeSet<(String, String)>) {
    let names = nodes.iter().map(|n| n.name.clone()).collect();
    let named = edges
        .iter()
        .filter_map(|e| {
            let s = nodes.get(e.source)?;
            let t = nodes.get(e.target)?;
            Some((s.name.clone(), t.name.clone()))
        })
        .collect();
    (names, named)
}

#[cfg(test)]
mod tests {
    use super::{
        FixedAdvance, GraphView, LABELS, LINKS, NODES, collect_edges, graph_nodes, name_table,
    };
    use crate::config::GraphConfig;
    use crate::viewport::ZoomTransform;
    use foundation::math::Vec2;
    use layout::graph::LayoutEdge;
    use pretty_assertions::assert_eq;
    use scene::components::Shape;
    use std::collections::BTreeMap;
    use streaming::protocol::{ModuleSummary, OneOrMany, SlotLink};

    fn link(from: &str, out: &str, to: &str, input: &str) -> SlotLink {
        SlotLink {
            output_module: from.to_string(),
            output_name: Some(out.to_string()),
            input_module: to.to_string(),
            input_name: Some(input.to_string()),
        }
    }

    fn module(id: &str, state: &str, links: Vec<SlotLink>) -> ModuleSummary {
        let mut output_slots = BTreeMap::new();
        output_slots.insert("table".to_string(), Some(OneOrMany::Many(links)));
        output_slots.insert("_trace".to_string(), None);
        ModuleSummary {
            id: id.to_string(),
            state: state.to_string(),
            classname: None,
            output_slots,
        }
    }

    fn pipeline() -> Vec<ModuleSummary> {
        vec![
            module("csv", "running", vec![link("csv", "table", "min", "table")]),
            module("min", "ready", vec![link("min", "table", "plot", "table")]),
            module("plot", "blocked", vec![]),
        ]
    }

    fn view(config: GraphConfig) -> GraphView {
        GraphView::new(config, Box::new(FixedAdvance::default()))
    }

    #[test]
    fn parallel_links_collapse_to_one_edge() {
        let modules = vec![
            module(
                "a",
                "ready",
                vec![
                    link("a", "table", "b", "table"),
                    link("a", "min", "b", "min"),
                    link("a", "table", "b", "table"),
                    link("a", "table", "ghost", "table"),
                ],
            ),
            module("b", "ready", vec![]),
        ];
        let names = name_table(&graph_nodes(&modules));
        assert_eq!(collect_edges(&modules, &names), vec![LayoutEdge::new(0, 1)]);
    }

    #[test]
    fn first_pass_builds_then_layout_routes() {
        let mut view = view(GraphConfig::default());
        let update = view.update(&pipeline());
        assert!(update.rebuilt);
        assert_eq!((update.nodes, update.edges), (3, 2));

        let ids: Vec<&str> = view.scene().groups().map(|g| g.id()).collect();
        assert_eq!(ids, vec![LINKS, NODES, LABELS]);
        let nodes = view.scene().group(NODES).unwrap();
        assert_eq!(nodes.len(), 3);
        match &nodes.get("csv").unwrap().shape {
            Shape::Rect { rect, corner_radius } => {
                // 3 glyphs * 0.6 * 12px + 2 * (10 + 12) - 2 * 10
                assert!((rect.width() - 45.6).abs() < 1e-9);
                assert_eq!(*corner_radius, 5.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!view.is_routed());

        assert!(view.settle_layout());
        assert!(view.is_routed());
        let links = view.scene().group(LINKS).unwrap();
        let keys: Vec<&str> = links.keys().collect();
        assert_eq!(keys, vec!["csv->min", "min->plot"]);
        match &links.get("csv->min").unwrap().shape {
            Shape::Path { points, .. } => assert!(points.len() >= 2),
            other => panic!("unexpected {other:?}"),
        }
        let label = view.scene().group(LABELS).unwrap().get("min").unwrap();
        assert!(matches!(&label.shape, Shape::Text { text, .. } if text == "min"));
    }

    #[test]
    fn later_passes_only_restyle() {
        let mut view = view(GraphConfig::default());
        view.update(&pipeline());
        view.settle_layout();
        let before = view.scene().group(NODES).unwrap().get("csv").unwrap().shape.clone();

        let mut next = pipeline();
        next[0].state = "terminated".to_string();
        next.push(module("extra", "ready", vec![]));
        let update = view.update(&next);
        assert!(!update.rebuilt);
        let nodes = view.scene().group(NODES).unwrap();
        assert_eq!(nodes.len(), 3);
        let csv = nodes.get("csv").unwrap();
        assert_eq!(csv.style.class.as_deref(), Some("node terminated"));
        assert_eq!(csv.shape, before);
        assert_eq!(view.nodes()[0].state, "terminated");
    }

    #[test]
    fn structure_change_relayouts_when_enabled() {
        let mut view = view(GraphConfig {
            relayout_on_structure_change: true,
            ..GraphConfig::default()
        });
        view.update(&pipeline());
        view.settle_layout();
        assert!(!view.update(&pipeline()).rebuilt);

        let mut next = pipeline();
        next.push(module("extra", "ready", vec![]));
        assert!(view.update(&next).rebuilt);
        assert!(!view.is_routed());
        assert_eq!(view.scene().group(NODES).unwrap().len(), 4);
    }

    #[test]
    fn empty_listing_defers_first_pass() {
        let mut view = view(GraphConfig::default());
        assert!(!view.update(&[]).rebuilt);
        assert!(!view.is_built());
        assert!(view.update(&pipeline()).rebuilt);
    }

    #[test]
    fn zoom_is_clamped_and_applied_to_groups() {
        let mut view = view(GraphConfig::default());
        view.update(&pipeline());
        view.zoom(ZoomTransform::new(Vec2::new(5.0, 5.0), 50.0));
        assert_eq!(view.transform().scale, 10.0);
        for g in view.scene().groups() {
            assert_eq!(g.transform.scale, 10.0);
        }
        view.zoom_at(Vec2::ZERO, 0.001);
        assert_eq!(view.transform().scale, 0.1);
    }
}
