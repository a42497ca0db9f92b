use foundation::math::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_extent(field: &'static str, [lo, hi]: [f64; 2]) -> Result<(), ConfigError> {
    if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
        return Err(invalid(field, format!("expected 0 < min <= max, got [{lo}, {hi}]")));
    }
    Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 30.0,
            left: 40.0,
        }
    }
}

/// Module input slots receiving the visible range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterTarget {
    pub min_slot: String,
    pub max_slot: String,
}

impl Default for FilterTarget {
    fn default() -> Self {
        Self {
            min_slot: "range_query/min_value".to_string(),
            max_slot: "range_query/max_value".to_string(),
        }
    }
}

impl FilterTarget {
    pub fn min_path(&self, module_id: &str) -> String {
        format!("{module_id}/{}", self.min_slot)
    }

    pub fn max_path(&self, module_id: &str) -> String {
        format!("{module_id}/{}", self.max_slot)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterplotConfig {
    /// Outer size of the drawing surface, margins included.
    pub width: f64,
    pub height: f64,
    pub margin: Margins,
    pub base_radius: f64,
    pub zoom_extent: [f64; 2],
    pub history_capacity: usize,
    pub tick_count: usize,
    /// Gaussian blur applied to the density raster.
    pub blur_sigma: f64,
    pub filter: FilterTarget,
}

impl Default for ScatterplotConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 500.0,
            margin: Margins::default(),
            base_radius: 3.5,
            zoom_extent: [1.0, 32.0],
            history_capacity: 3,
            tick_count: 10,
            blur_sigma: 2.0,
            filter: FilterTarget::default(),
        }
    }
}

impl ScatterplotConfig {
    /// Plot area: outer size minus margins.
    pub fn inner_size(&self) -> Vec2 {
        Vec2::new(
            self.width - self.margin.left - self.margin.right,
            self.height - self.margin.top - self.margin.bottom,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let inner = self.inner_size();
        if !(inner.x > 0.0 && inner.y > 0.0) {
            return Err(invalid("scatterplot.width/height", "margins leave no plot area"));
        }
        if !(self.base_radius.is_finite() && self.base_radius > 0.0) {
            return Err(invalid("scatterplot.base_radius", "must be positive"));
        }
        if self.tick_count == 0 {
            return Err(invalid("scatterplot.tick_count", "must be at least 1"));
        }
        check_extent("scatterplot.zoom_extent", self.zoom_extent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub width: f64,
    pub height: f64,
    /// Gap kept around each module box.
    pub margin: f64,
    /// Padding between a box border and its label.
    pub pad: f64,
    pub flow_separation: Option<f64>,
    pub link_length: f64,
    pub convergence_threshold: f64,
    pub schedule: [usize; 3],
    pub avoid_overlaps: bool,
    pub relayout_on_structure_change: bool,
    pub zoom_extent: [f64; 2],
    pub font_size_px: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 500.0,
            margin: 10.0,
            pad: 12.0,
            flow_separation: Some(150.0),
            link_length: 150.0,
            convergence_threshold: 1e-3,
            schedule: [50, 100, 200],
            avoid_overlaps: true,
            relayout_on_structure_change: false,
            zoom_extent: [0.1, 10.0],
            font_size_px: 12.0,
        }
    }
}

impl GraphConfig {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(invalid("graph.width/height", "must be positive"));
        }
        if !(self.link_length.is_finite() && self.link_length > 0.0) {
            return Err(invalid("graph.link_length", "must be positive"));
        }
        if self.margin < 0.0 || self.pad < 0.0 {
            return Err(invalid("graph.margin/pad", "must not be negative"));
        }
        check_extent("graph.zoom_extent", self.zoom_extent)
    }
}

/// Everything a host needs to run the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub server_url: String,
    /// Module shown by the scatterplot view.
    pub module_id: String,
    pub poll_interval_ms: u64,
    pub discard_stale: bool,
    pub scatterplot: ScatterplotConfig,
    pub graph: GraphConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            module_id: "scatterplot".to_string(),
            poll_interval_ms: 1000,
            discard_stale: true,
            scatterplot: ScatterplotConfig::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Parses and validates a JSON config. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms", "must be at least 1"));
        }
        self.scatterplot.validate()?;
        self.graph.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ViewerConfig};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.scatterplot.inner_size(), Vec2::new(900.0, 450.0));
        assert_eq!(config.graph.schedule, [50, 100, 200]);
        assert_eq!(
            config.scatterplot.filter.min_path("sp"),
            "sp/range_query/min_value"
        );
    }

    #[test]
    fn partial_nested_override() {
        let config =
            ViewerConfig::from_json(r#"{"module_id":"m","scatterplot":{"margin":{"left":60}}}"#)
                .unwrap();
        assert_eq!(config.module_id, "m");
        assert_eq!(config.scatterplot.margin.left, 60.0);
        assert_eq!(config.scatterplot.margin.top, 20.0);
        assert_eq!(config.scatterplot.inner_size().x, 880.0);
    }

    #[test]
    fn rejects_bad_values() {
        let err = ViewerConfig::from_json(r#"{"scatterplot":{"zoom_extent":[4,2]}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "scatterplot.zoom_extent", .. }));
        assert!(matches!(
            ViewerConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(ViewerConfig::from_json(r#"{"poll_interval_ms":0}"#).is_err());
    }
}
