use foundation::math::Vec2;
use foundation::math::scale::{LinearScale, format_tick};
use scene::components::{Rgba, Shape, Style, TextAnchor};
use scene::{Group, JoinSummary, SceneNode};

use crate::layer::{Layer, LayerId};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AxisOrient {
    /// Horizontal axis, ticks and labels below the line.
    Bottom,
    /// Vertical axis, ticks and labels left of the line.
    Left,
}

/// Ticked axis for one linear scale, drawn at the group origin.
///
/// Tick nodes are keyed by their formatted label so that a tick surviving a
/// domain change is moved rather than recreated.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLayer {
    id: LayerId,
    group: String,
    pub orient: AxisOrient,
    pub title: String,
    pub tick_count: usize,
    pub tick_size: f64,
    pub font_size_px: f64,
    /// Cosmetic duration attached to moved ticks.
    pub transition_ms: u32,
}

impl AxisLayer {
    pub fn new(id: u64, group: impl Into<String>, orient: AxisOrient) -> Self {
        Self {
            id: LayerId(id),
            group: group.into(),
            orient,
            title: String::new(),
            tick_count: 10,
            tick_size: 6.0,
            font_size_px: 10.0,
            transition_ms: 250,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Tick values and their labels for `scale`.
    pub fn ticks(&self, scale: &LinearScale) -> Vec<(f64, String)> {
        let step = scale.tick_step(self.tick_count);
        scale
            .ticks(self.tick_count)
            .into_iter()
            .map(|v| (v, format_tick(v, step)))
            .collect()
    }

    pub fn sync(&self, group: &mut Group, scale: &LinearScale) -> JoinSummary {
        let mut parts: Vec<(String, SceneNode)> = Vec::new();
        parts.push(("domain".to_string(), self.domain_line(scale)));
        for (value, label) in self.ticks(scale) {
            let px = scale.map(value);
            let (line, text) = self.tick(px, &label);
            parts.push((format!("tick:{label}"), line));
            parts.push((format!("tick-label:{label}"), text));
        }
        if !self.title.is_empty() {
            parts.push(("title".to_string(), self.title_node(scale)));
        }

        let ms = self.transition_ms;
        group.join(
            parts,
            |_, node| node.clone(),
            |_, fresh, node| {
                node.shape = fresh.shape.clone();
                node.transition_ms = Some(ms);
            },
        )
    }

    fn stroke(&self) -> Style {
        Style::stroked(Rgba::BLACK, 1.0)
    }

    fn label_style(&self) -> Style {
        Style::filled(Rgba::BLACK)
    }

    fn domain_line(&self, scale: &LinearScale) -> SceneNode {
        let [r0, r1] = scale.range();
        let t = self.tick_size;
        let points = match self.orient {
            AxisOrient::Bottom => vec![
                Vec2::new(r0, t),
                Vec2::new(r0, 0.0),
                Vec2::new(r1, 0.0),
                Vec2::new(r1, t),
            ],
            AxisOrient::Left => vec![
                Vec2::new(-t, r0),
                Vec2::new(0.0, r0),
                Vec2::new(0.0, r1),
                Vec2::new(-t, r1),
            ],
        };
        SceneNode::new(
            "domain",
            Shape::Path {
                points,
                arrow_end: false,
            },
            self.stroke().with_class("domain"),
        )
    }

    fn tick(&self, px: f64, label: &str) -> (SceneNode, SceneNode) {
        let t = self.tick_size;
        let (a, b, at, anchor) = match self.orient {
            AxisOrient::Bottom => (
                Vec2::new(px, 0.0),
                Vec2::new(px, t),
                Vec2::new(px, t + 3.0 + self.font_size_px),
                TextAnchor::Middle,
            ),
            AxisOrient::Left => (
                Vec2::new(0.0, px),
                Vec2::new(-t, px),
                Vec2::new(-t - 3.0, px + self.font_size_px * 0.32),
                TextAnchor::End,
            ),
        };
        let line = SceneNode::new(
            "",
            Shape::Path {
                points: vec![a, b],
                arrow_end: false,
            },
            self.stroke().with_class("tick"),
        );
        let text = SceneNode::new(
            "",
            Shape::Text {
                position: at,
                text: label.to_string(),
                anchor,
                rotation_deg: 0.0,
                font_size_px: self.font_size_px,
            },
            self.label_style(),
        );
        (line, text)
    }

    fn title_node(&self, scale: &LinearScale) -> SceneNode {
        let (position, rotation_deg) = match self.orient {
            AxisOrient::Bottom => (Vec2::new(scale.range()[1], -6.0), 0.0),
            AxisOrient::Left => (Vec2::new(6.0 + 0.71 * self.font_size_px, 0.0), -90.0),
        };
        SceneNode::new(
            "title",
            Shape::Text {
                position,
                text: self.title.clone(),
                anchor: TextAnchor::End,
                rotation_deg,
                font_size_px: self.font_size_px,
            },
            self.label_style().with_class("label"),
        )
    }
}

impl Layer for AxisLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn group(&self) -> &str {
        &self.group
    }
}
