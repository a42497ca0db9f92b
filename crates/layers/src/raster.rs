use foundation::bounds::ScreenRect;
use scene::components::Shape;
use scene::{Group, SceneNode};

use crate::layer::{Layer, LayerId};
use crate::symbology::RasterSymbol;

const IMAGE_KEY: &str = "image";

/// A single image stretched over a pixel rectangle, e.g. a density heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    id: LayerId,
    group: String,
    pub symbol: RasterSymbol,
    rect: Option<ScreenRect>,
    source: Option<String>,
    visible: bool,
}

impl RasterLayer {
    pub fn new(id: u64, group: impl Into<String>, symbol: RasterSymbol) -> Self {
        Self {
            id: LayerId(id),
            group: group.into(),
            symbol,
            rect: None,
            source: None,
            visible: true,
        }
    }

    pub fn rect(&self) -> Option<ScreenRect> {
        self.rect
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_rect(&mut self, rect: ScreenRect) {
        self.rect = Some(rect);
    }

    /// Replaces the raster reference; `None` keeps the current one.
    pub fn set_source(&mut self, source: Option<&str>) {
        if let Some(s) = source {
            self.source = Some(s.to_string());
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Writes the image node into `group`. Nothing is drawn before a
    /// rectangle is known.
    pub fn sync(&self, group: &mut Group) {
        let Some(rect) = self.rect else {
            group.remove(IMAGE_KEY);
            return;
        };
        let mut style = self.symbol.style();
        style.visible = self.visible;
        group.upsert(SceneNode::new(
            IMAGE_KEY,
            Shape::Image {
                rect,
                href: self.source.clone(),
            },
            style,
        ));
    }
}

impl Layer for RasterLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn group(&self) -> &str {
        &self.group
    }
}

#[cfg(test)]
mod tests {
    use super::RasterLayer;
    use crate::symbology::RasterSymbol;
    use foundation::bounds::ScreenRect;
    use scene::components::{GroupTransform, Shape};
    use scene::Group;

    #[test]
    fn syncs_single_image_node() {
        let mut layer = RasterLayer::new(1, "heatmap", RasterSymbol::heatmap(2.0));
        let mut group = Group::new("heatmap", GroupTransform::identity());
        layer.sync(&mut group);
        assert!(group.is_empty());

        layer.set_rect(ScreenRect::new(0.0, 0.0, 900.0, 450.0));
        layer.set_source(Some("/img?run_number=1"));
        layer.sync(&mut group);
        layer.set_source(None);
        layer.sync(&mut group);
        assert_eq!(group.len(), 1);
        let node = group.get("image").unwrap();
        match &node.shape {
            Shape::Image { rect, href } => {
                assert_eq!(rect.width(), 900.0);
                assert_eq!(href.as_deref(), Some("/img?run_number=1"));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn hidden_overlay_is_kept_but_invisible() {
        let mut layer = RasterLayer::new(2, "compare", RasterSymbol::compare());
        layer.set_rect(ScreenRect::sized(10.0, 10.0));
        layer.set_visible(false);
        let mut group = Group::new("compare", GroupTransform::identity());
        layer.sync(&mut group);
        let node = group.get("image").unwrap();
        assert!(!node.style.visible);
        assert_eq!(node.style.opacity, 0.5);
    }
}
