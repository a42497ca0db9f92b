use foundation::bounds::ScreenRect;
use foundation::history::HistoryRing;
use foundation::math::Vec2;
use layers::axis::{AxisLayer, AxisOrient};
use layers::history::HistoryStripLayer;
use layers::points::PointsLayer;
use layers::raster::RasterLayer;
use layers::Layer;
use layers::symbology::{PointSymbol, RasterSymbol};
use scene::components::{GroupTransform, Rgba, Shape, Style};
use scene::{SceneGraph, SceneNode};
use streaming::snapshot::Snapshot;
use tracing::debug;

use crate::config::ScatterplotConfig;
use crate::filter::{FilterRequest, compute_filter};
use crate::viewport::{ViewportTransform, ZoomTransform};

pub const BACKDROP: &str = "backdrop";
pub const HEATMAP: &str = "heatmap";
pub const DOTS: &str = "dots";
pub const COMPARE: &str = "compare";
pub const X_AXIS: &str = "x-axis";
pub const Y_AXIS: &str = "y-axis";
pub const HISTORY: &str = "history";

/// Outcome of one applied snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    pub first_render: bool,
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
    /// The snapshot's raster was new to the history ring.
    pub history_changed: bool,
}

/// Scatterplot of the latest snapshot over its density raster, with axes,
/// a compare overlay and a strip of recent rasters.
///
/// Dots, heatmap and compare overlay live in groups that carry the zoom
/// transform; their geometry uses the natural mapping only, so a zoom
/// gesture touches group transforms, dot radii and axes and nothing else.
#[derive(Debug, Clone)]
pub struct ScatterplotView {
    config: ScatterplotConfig,
    viewport: ViewportTransform,
    scene: SceneGraph,
    history_scene: SceneGraph,
    history: HistoryRing<String>,
    dots: PointsLayer,
    heatmap: RasterLayer,
    compare: RasterLayer,
    x_axis: AxisLayer,
    y_axis: AxisLayer,
    strip: HistoryStripLayer,
}

impl ScatterplotView {
    pub fn new(config: ScatterplotConfig) -> Self {
        let viewport = ViewportTransform::new(
            config.inner_size(),
            config.zoom_extent,
            config.tick_count,
            config.base_radius,
        );
        let strip = HistoryStripLayer::new(7, HISTORY);
        let strip_width = config.history_capacity as f64 * (strip.thumb_size + strip.gap);
        let mut x_axis = AxisLayer::new(5, X_AXIS, AxisOrient::Bottom);
        let mut y_axis = AxisLayer::new(6, Y_AXIS, AxisOrient::Left);
        x_axis.tick_count = config.tick_count;
        y_axis.tick_count = config.tick_count;
        Self {
            viewport,
            scene: SceneGraph::new(Vec2::new(config.width, config.height)),
            history_scene: SceneGraph::new(Vec2::new(strip_width, strip.thumb_size)),
            history: HistoryRing::new(config.history_capacity),
            dots: PointsLayer::new(
                2,
                DOTS,
                PointSymbol {
                    fill: Rgba::BLUE,
                    base_radius: config.base_radius,
                },
            ),
            heatmap: RasterLayer::new(1, HEATMAP, RasterSymbol::heatmap(config.blur_sigma)),
            compare: {
                let mut layer = RasterLayer::new(3, COMPARE, RasterSymbol::compare());
                layer.set_visible(false);
                layer
            },
            x_axis,
            y_axis,
            strip,
            config,
        }
    }

    pub fn config(&self) -> &ScatterplotConfig {
        &self.config
    }

    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn history_scene(&self) -> &SceneGraph {
        &self.history_scene
    }

    pub fn history(&self) -> &HistoryRing<String> {
        &self.history
    }

    fn margin_transform(&self) -> GroupTransform {
        let m = self.config.margin;
        GroupTransform::translate(Vec2::new(m.left, m.top))
    }

    fn zoomable_transform(&self) -> GroupTransform {
        self.margin_transform()
            .then(&self.viewport.transform().as_group())
    }

    /// Creates every group in draw order.
    fn build(&mut self) {
        let margin = self.margin_transform();
        let zoomable = self.zoomable_transform();
        let inner = self.config.inner_size();
        let m = self.config.margin;

        self.scene
            .ensure_group(BACKDROP, margin)
            .upsert(SceneNode::new(
                "background",
                Shape::rect(ScreenRect::sized(inner.x, inner.y)),
                Style::filled(Rgba::WHITE).with_class("background"),
            ));
        self.scene.ensure_group(HEATMAP, zoomable);
        self.scene.ensure_group(DOTS, zoomable);
        self.scene.ensure_group(COMPARE, zoomable);
        self.scene.ensure_group(
            X_AXIS,
            GroupTransform::translate(Vec2::new(m.left, m.top + inner.y)),
        );
        self.scene.ensure_group(Y_AXIS, margin);
        self.history_scene
            .ensure_group(HISTORY, GroupTransform::identity());
    }

    /// Reconciles the view against `snapshot`.
    ///
    /// Returns `None`, leaving the previous render in place, when the
    /// snapshot's bounds are unusable.
    pub fn update(&mut self, snapshot: &Snapshot) -> Option<ReconcileSummary> {
        let first_render = self.viewport.is_first_render();
        if !self.viewport.set_domain(&snapshot.bounds) {
            debug!(bounds = ?snapshot.bounds, "ignoring snapshot with unusable bounds");
            return None;
        }
        if first_render {
            self.build();
        }
        self.x_axis.title = snapshot.columns[0].clone();
        self.y_axis.title = snapshot.columns[1].clone();

        let rect = self.viewport.raster_rect(&snapshot.bounds);
        self.heatmap.set_rect(rect);
        self.heatmap.set_source(snapshot.image.as_deref());
        self.compare.set_rect(rect);
        if let Some(group) = self.scene.group_mut(self.heatmap.group()) {
            self.heatmap.sync(group);
        }
        if let Some(group) = self.scene.group_mut(self.compare.group()) {
            self.compare.sync(group);
        }

        let viewport = &self.viewport;
        let mut summary = ReconcileSummary {
            first_render,
            ..ReconcileSummary::default()
        };
        if let Some(group) = self.scene.group_mut(self.dots.group()) {
            let points = snapshot
                .keyed_points()
                .map(|(key, p)| (key, viewport.natural_to_px(p)));
            let join = self.dots.sync(group, points, viewport.transform().scale);
            summary.entered = join.entered.len();
            summary.updated = join.updated.len();
            summary.exited = join.exited.len();
        }
        self.apply_zoom();

        if let Some(href) = &snapshot.image {
            summary.history_changed = self.history.enqueue_unique(href.clone());
        }
        if summary.history_changed || first_render {
            if let Some(group) = self.history_scene.group_mut(self.strip.group()) {
                self.strip.sync(group, self.history.items());
            }
        }

        debug!(
            points = snapshot.len(),
            entered = summary.entered,
            updated = summary.updated,
            exited = summary.exited,
            "scatterplot reconciled"
        );
        Some(summary)
    }

    /// Pushes the current zoom into group transforms, dot radii and axes.
    fn apply_zoom(&mut self) {
        let zoomable = self.zoomable_transform();
        for id in [HEATMAP, DOTS, COMPARE] {
            if let Some(group) = self.scene.group_mut(id) {
                group.transform = zoomable;
            }
        }
        let scale = self.viewport.transform().scale;
        if let Some(group) = self.scene.group_mut(self.dots.group()) {
            self.dots.rescale(group, scale);
        }
        if let Some(group) = self.scene.group_mut(self.x_axis.group()) {
            self.x_axis.sync(group, self.viewport.x_scale());
        }
        if let Some(group) = self.scene.group_mut(self.y_axis.group()) {
            self.y_axis.sync(group, self.viewport.y_scale());
        }
    }

    pub fn zoom(&mut self, transform: ZoomTransform) {
        self.viewport.zoom(transform);
        self.apply_zoom();
    }

    /// Wheel-style zoom around a point of the plot area.
    pub fn zoom_at(&mut self, anchor_px: Vec2, factor: f64) {
        self.viewport.zoom_at(anchor_px, factor);
        self.apply_zoom();
    }

    pub fn pan_by(&mut self, delta_px: Vec2) {
        self.viewport.pan_by(delta_px);
        self.apply_zoom();
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.reset_zoom();
        self.apply_zoom();
    }

    /// History entry whose thumbnail is under `px` (history strip space).
    pub fn history_at(&self, px: Vec2) -> Option<String> {
        let group = self.history_scene.group(self.strip.group())?;
        self.strip.hit(group, px).map(str::to_string)
    }

    /// Shows the compare overlay with a raster from the history.
    ///
    /// Returns `false` for a raster the history does not hold.
    pub fn hover_history(&mut self, href: &str) -> bool {
        if !self.history.items().any(|h| h == href) {
            return false;
        }
        self.compare.set_source(Some(href));
        self.compare.set_visible(true);
        if let Some(group) = self.scene.group_mut(self.compare.group()) {
            self.compare.sync(group);
        }
        true
    }

    pub fn unhover_history(&mut self) {
        self.compare.set_visible(false);
        if let Some(group) = self.scene.group_mut(self.compare.group()) {
            self.compare.sync(group);
        }
    }

    pub fn is_comparing(&self) -> bool {
        self.compare.is_visible()
    }

    /// Range-query inputs for the visible rectangle of `module_id`.
    ///
    /// `None` before the first render, and when the axes lack two distinct
    /// column names to key the bounds by.
    pub fn filter_request(&self, module_id: &str) -> Option<FilterRequest> {
        let visible = self.viewport.filter_bounds()?;
        let server = self.viewport.bounds()?;
        let columns = [self.x_axis.title.clone(), self.y_axis.title.clone()];
        if columns.iter().any(String::is_empty) || columns[0] == columns[1] {
            debug!(?columns, "no filter: columns are not distinct names");
            return None;
        }
        Some(compute_filter(
            &visible,
            &server,
            &columns,
            module_id,
            &self.config.filter,
        ))
    }

    /// Keys of the rendered dots, in draw order.
    pub fn rendered_keys(&self) -> Vec<String> {
        self.scene
            .group(DOTS)
            .map(|g| g.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Position of a dot in plot-area pixels, zoom included.
    pub fn screen_position(&self, key: &str) -> Option<Vec2> {
        let node = self.scene.group(DOTS)?.get(key)?;
        let p = node.shape.position()?;
        Some(self.viewport.transform().apply(p))
    }
}
