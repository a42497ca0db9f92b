use foundation::math::Vec2;
use scene::components::Shape;
use scene::{Group, JoinSummary, SceneNode};

use crate::layer::{Layer, LayerId};
use crate::symbology::PointSymbol;

/// Keyed dots, one per data row.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsLayer {
    id: LayerId,
    group: String,
    pub symbol: PointSymbol,
}

impl PointsLayer {
    pub fn new(id: u64, group: impl Into<String>, symbol: PointSymbol) -> Self {
        Self {
            id: LayerId(id),
            group: group.into(),
            symbol,
        }
    }

    /// Joins `points` (already in group pixel space) against the dots in
    /// `group`. New dots get the fixed symbol and their id as tooltip;
    /// existing dots only move.
    pub fn sync<'a>(
        &self,
        group: &mut Group,
        points: impl IntoIterator<Item = (&'a str, Vec2)>,
        zoom_scale: f64,
    ) -> JoinSummary {
        let radius = self.symbol.radius_at(zoom_scale);
        let style = self.symbol.style();
        group.join(
            points.into_iter().map(|(k, p)| (k.to_string(), p)),
            |key, p| {
                SceneNode::new(key, Shape::circle(*p, radius), style.clone()).with_title(key)
            },
            |_, p, node| {
                if let Shape::Circle { center, .. } = &mut node.shape {
                    *center = *p;
                }
            },
        )
    }

    /// Sets every dot's radius for a new zoom scale.
    pub fn rescale(&self, group: &mut Group, zoom_scale: f64) {
        let r = self.symbol.radius_at(zoom_scale);
        for node in group.nodes_mut() {
            if let Shape::Circle { radius, .. } = &mut node.shape {
                *radius = r;
            }
        }
    }
}

impl Layer for PointsLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn group(&self) -> &str {
        &self.group
    }
}
