use foundation::bounds::ScreenRect;
use scene::components::{Shape, Style};
use scene::{Group, JoinSummary, SceneNode};

use crate::layer::{Layer, LayerId};

/// Row of thumbnails of recent rasters, keyed by raster reference.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStripLayer {
    id: LayerId,
    group: String,
    pub thumb_size: f64,
    pub gap: f64,
    /// Cosmetic enter/exit duration.
    pub transition_ms: u32,
}

impl HistoryStripLayer {
    pub fn new(id: u64, group: impl Into<String>) -> Self {
        Self {
            id: LayerId(id),
            group: group.into(),
            thumb_size: 100.0,
            gap: 4.0,
            transition_ms: 500,
        }
    }

    /// Pixel slot of the `i`-th thumbnail.
    pub fn slot(&self, i: usize) -> ScreenRect {
        ScreenRect::new(
            i as f64 * (self.thumb_size + self.gap),
            0.0,
            self.thumb_size,
            self.thumb_size,
        )
    }

    /// Thumbnail under `px`, if any.
    pub fn hit<'g>(&self, group: &'g Group, px: foundation::math::Vec2) -> Option<&'g str> {
        group.nodes().find_map(|n| match &n.shape {
            Shape::Image { rect, .. } if rect.contains(px) => Some(n.key.as_str()),
            _ => None,
        })
    }

    pub fn sync<'a>(
        &self,
        group: &mut Group,
        items: impl IntoIterator<Item = &'a String>,
    ) -> JoinSummary {
        let ms = self.transition_ms;
        let data: Vec<(String, ScreenRect)> = items
            .into_iter()
            .enumerate()
            .map(|(i, href)| (href.clone(), self.slot(i)))
            .collect();
        group.join(
            data,
            |href, rect| {
                SceneNode::new(
                    href,
                    Shape::Image {
                        rect: *rect,
                        href: Some(href.to_string()),
                    },
                    Style::default().with_class("history"),
                )
                .with_title(href)
                .with_transition(ms)
            },
            |_, rect, node| {
                if let Shape::Image { rect: r, .. } = &mut node.shape {
                    *r = *rect;
                }
                node.transition_ms = Some(ms);
            },
        )
    }
}

impl Layer for HistoryStripLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn group(&self) -> &str {
        &self.group
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryStripLayer;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use scene::components::GroupTransform;
    use scene::Group;

    #[test]
    fn strip_follows_ring_order() {
        let layer = HistoryStripLayer::new(1, "history");
        let mut group = Group::new("history", GroupTransform::identity());
        let first = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        layer.sync(&mut group, &first);
        let second = vec!["b".to_string(), "c".to_string(), "d".to_string()];
        let s = layer.sync(&mut group, &second);
        assert_eq!(s.exited, vec!["a".to_string()]);
        assert_eq!(s.entered, vec!["d".to_string()]);
        let keys: Vec<&str> = group.keys().collect();
        assert_eq!(keys, vec!["b", "c", "d"]);
        assert_eq!(layer.hit(&group, Vec2::new(50.0, 50.0)), Some("b"));
        assert_eq!(layer.hit(&group, Vec2::new(250.0, 50.0)), Some("d"));
        assert_eq!(layer.hit(&group, Vec2::new(50.0, 150.0)), None);
    }
}
