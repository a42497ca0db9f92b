use scene::components::{Rgba, Style};

/// Look of scatterplot dots.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointSymbol {
    pub fill: Rgba,
    /// Radius at zoom scale 1; drawn as `base_radius / scale`.
    pub base_radius: f64,
}

impl PointSymbol {
    pub const fn new(fill: Rgba, base_radius: f64) -> Self {
        Self { fill, base_radius }
    }

    pub fn radius_at(&self, zoom_scale: f64) -> f64 {
        if zoom_scale > 0.0 && zoom_scale.is_finite() {
            self.base_radius / zoom_scale
        } else {
            self.base_radius
        }
    }

    pub fn style(&self) -> Style {
        Style::filled(self.fill).with_class("dot")
    }
}

impl Default for PointSymbol {
    fn default() -> Self {
        Self::new(Rgba::BLUE, 3.5)
    }
}

/// Look of a raster overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSymbol {
    pub class: &'static str,
    pub opacity: f64,
    pub blur_sigma: Option<f64>,
}

impl RasterSymbol {
    pub fn heatmap(blur_sigma: f64) -> Self {
        Self {
            class: "heatmap",
            opacity: 1.0,
            blur_sigma: (blur_sigma > 0.0).then_some(blur_sigma),
        }
    }

    pub fn compare() -> Self {
        Self {
            class: "heatmapCompare",
            opacity: 0.5,
            blur_sigma: None,
        }
    }

    pub fn style(&self) -> Style {
        let mut style = Style::default().with_class(self.class).with_opacity(self.opacity);
        style.blur_sigma = self.blur_sigma;
        style
    }
}

/// Fill color for a module box, by module state name.
pub fn state_fill(state: &str) -> Rgba {
    match state {
        "running" => Rgba([0.55, 0.80, 0.45, 1.0]),
        "ready" => Rgba([0.60, 0.75, 0.95, 1.0]),
        "blocked" => Rgba([0.98, 0.70, 0.35, 1.0]),
        "zombie" => Rgba([0.75, 0.75, 0.75, 1.0]),
        "terminated" => Rgba([0.45, 0.45, 0.45, 1.0]),
        "invalid" => Rgba([0.90, 0.35, 0.35, 1.0]),
        _ => Rgba::WHITE,
    }
}

/// CSS class of a module box: `"node <state>"`.
pub fn node_class(state: &str) -> String {
    format!("node {state}")
}
