/// Straight (non-premultiplied) RGBA, components in `0.0..=1.0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0.0, 0.0, 0.0, 1.0]);
    pub const WHITE: Rgba = Rgba([1.0, 1.0, 1.0, 1.0]);
    pub const BLUE: Rgba = Rgba([0.0, 0.0, 1.0, 1.0]);
    pub const GREY: Rgba = Rgba([0.5, 0.5, 0.5, 1.0]);

    pub fn css(&self) -> String {
        let [r, g, b, a] = self.0;
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if a >= 1.0 {
            format!("rgb({},{},{})", c(r), c(g), c(b))
        } else {
            format!("rgba({},{},{},{})", c(r), c(g), c(b), a.clamp(0.0, 1.0))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: Option<Rgba>,
    pub stroke: Option<Rgba>,
    pub stroke_width: f64,
    pub opacity: f64,
    pub visible: bool,
    /// Classification label for backends that style by class (e.g. module state).
    pub class: Option<String>,
    /// Gaussian blur radius applied by backends that support filters.
    pub blur_sigma: Option<f64>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
            visible: true,
            class: None,
            blur_sigma: None,
        }
    }
}

impl Style {
    pub fn filled(color: Rgba) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    pub fn stroked(color: Rgba, width: f64) -> Self {
        Self {
            stroke: Some(color),
            stroke_width: width,
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}
