use foundation::bounds::ScreenRect;
use foundation::math::Vec2;
use scene::components::{Rgba, Shape, Style, TextAnchor};
use scene::{Group, JoinSummary, SceneNode};

use crate::layer::{Layer, LayerId};
use crate::symbology::{node_class, state_fill};

/// One module box as the graph view sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleBox {
    pub name: String,
    pub state: String,
    /// Inner box in graph space, once laid out.
    pub rect: Option<ScreenRect>,
    pub label_at: Option<Vec2>,
}

/// Rounded module boxes, their labels and routed links.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleGraphLayer {
    id: LayerId,
    group: String,
    pub corner_radius: f64,
    pub font_size_px: f64,
}

impl ModuleGraphLayer {
    pub fn new(id: u64, group: impl Into<String>) -> Self {
        Self {
            id: LayerId(id),
            group: group.into(),
            corner_radius: 5.0,
            font_size_px: 12.0,
        }
    }

    fn box_style(state: &str) -> Style {
        Style {
            stroke: Some(Rgba::BLACK),
            ..Style::filled(state_fill(state))
        }
        .with_class(node_class(state))
    }

    /// Boxes are keyed by module name.
    pub fn sync_boxes(&self, group: &mut Group, boxes: &[ModuleBox]) -> JoinSummary {
        let radius = self.corner_radius;
        let shape = |b: &ModuleBox| {
            let rect = b.rect.unwrap_or(ScreenRect::sized(0.0, 0.0));
            Shape::Rect {
                rect,
                corner_radius: radius,
            }
        };
        group.join(
            boxes.iter().map(|b| (b.name.clone(), b)),
            |key, b| SceneNode::new(key, shape(*b), Self::box_style(&b.state)),
            |_, b, node| {
                node.shape = shape(*b);
                node.style = Self::box_style(&b.state);
            },
        )
    }

    /// Updates only the state class and fill of existing boxes.
    pub fn restyle<'a>(
        &self,
        group: &mut Group,
        states: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        for (name, state) in states {
            if let Some(node) = group.get_mut(name) {
                node.style = Self::box_style(state);
            }
        }
    }

    pub fn sync_labels(&self, group: &mut Group, boxes: &[ModuleBox]) -> JoinSummary {
        let size = self.font_size_px;
        let text = |b: &ModuleBox| Shape::Text {
            position: b.label_at.unwrap_or(Vec2::ZERO),
            text: b.name.clone(),
            anchor: TextAnchor::Middle,
            rotation_deg: 0.0,
            font_size_px: size,
        };
        group.join(
            boxes.iter().map(|b| (b.name.clone(), b)),
            |key, b| {
                SceneNode::new(key, text(*b), Style::filled(Rgba::BLACK).with_class("label"))
            },
            |_, b, node| node.shape = text(*b),
        )
    }

    /// Links are keyed `"<source>-><target>"`; an empty route draws nothing.
    pub fn sync_links(
        &self,
        group: &mut Group,
        links: impl IntoIterator<Item = (String, Vec<Vec2>)>,
    ) -> JoinSummary {
        let path = |points: &Vec<Vec2>| Shape::Path {
            points: points.clone(),
            arrow_end: true,
        };
        group.join(
            links,
            |key, points| {
                let style = Style::stroked(Rgba::GREY, 1.5).with_class("link");
                SceneNode::new(key, path(points), style)
            },
            |_, points, node| node.shape = path(points),
        )
    }
}

impl Layer for ModuleGraphLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn group(&self) -> &str {
        &self.group
    }
}

#[cfg(test)]
mod tests {
    use super::{ModuleBox, ModuleGraphLayer};
    use foundation::bounds::ScreenRect;
    use foundation::math::Vec2;
    use scene::components::{GroupTransform, Shape};
    use scene::Group;

    fn module(name: &str, state: &str) -> ModuleBox {
        ModuleBox {
            name: name.to_string(),
            state: state.to_string(),
            rect: Some(ScreenRect::new(10.0, 10.0, 80.0, 30.0)),
            label_at: Some(Vec2::new(50.0, 36.0)),
        }
    }

    #[test]
    fn restyle_changes_class_only() {
        let layer = ModuleGraphLayer::new(1, "nodes");
        let mut group = Group::new("nodes", GroupTransform::identity());
        layer.sync_boxes(&mut group, &[module("csv", "ready"), module("min", "blocked")]);
        let before = group.get("csv").unwrap().shape.clone();
        layer.restyle(&mut group, [("csv", "running"), ("gone", "zombie")]);
        let after = group.get("csv").unwrap();
        assert_eq!(after.style.class.as_deref(), Some("node running"));
        assert_eq!(after.shape, before);
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn links_carry_arrowheads() {
        let layer = ModuleGraphLayer::new(2, "links");
        let mut group = Group::new("links", GroupTransform::identity());
        layer.sync_links(
            &mut group,
            [("csv->min".to_string(), vec![Vec2::ZERO, Vec2::new(5.0, 0.0)])],
        );
        match &group.get("csv->min").unwrap().shape {
            Shape::Path { arrow_end, points } => {
                assert!(*arrow_end);
                assert_eq!(points.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
