use foundation::bounds::ScreenRect;
use foundation::math::Vec2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

/// Geometry of a scene node, in the pixel space of its group.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        rect: ScreenRect,
        corner_radius: f64,
    },
    Circle {
        center: Vec2,
        radius: f64,
    },
    /// Raster stretched to `rect` without preserving aspect ratio.
    Image {
        rect: ScreenRect,
        href: Option<String>,
    },
    Text {
        position: Vec2,
        text: String,
        anchor: TextAnchor,
        /// Clockwise rotation around `position`.
        rotation_deg: f64,
        font_size_px: f64,
    },
    /// Open polyline; `arrow_end` marks the last segment with an arrowhead.
    Path {
        points: Vec<Vec2>,
        arrow_end: bool,
    },
}

impl Shape {
    pub fn rect(rect: ScreenRect) -> Self {
        Shape::Rect {
            rect,
            corner_radius: 0.0,
        }
    }

    pub fn circle(center: Vec2, radius: f64) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn text(position: Vec2, text: impl Into<String>) -> Self {
        Shape::Text {
            position,
            text: text.into(),
            anchor: TextAnchor::Start,
            rotation_deg: 0.0,
            font_size_px: 10.0,
        }
    }

    /// Reference point: circle center, rect/image origin, text anchor, first path point.
    pub fn position(&self) -> Option<Vec2> {
        match self {
            Shape::Rect { rect, .. } | Shape::Image { rect, .. } => Some(rect.origin),
            Shape::Circle { center, .. } => Some(*center),
            Shape::Text { position, .. } => Some(*position),
            Shape::Path { points, .. } => points.first().copied(),
        }
    }
}
