use foundation::bounds::DataBounds;
use foundation::math::Vec2;
use tracing::{debug, warn};

use crate::protocol::{ModuleState, WireId};

/// One immutable scatterplot state: points, their ids, extent and raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub points: Vec<Vec2>,
    /// Aligned 1:1 with `points`.
    pub index: Vec<String>,
    pub bounds: DataBounds,
    /// Opaque raster reference, usually a URL.
    pub image: Option<String>,
    /// `[x label, y label]`.
    pub columns: [String; 2],
}

impl Snapshot {
    /// Extracts a renderable snapshot from a module response.
    ///
    /// Returns `None` when the response has no point data or no usable bounds.
    pub fn from_module_state(state: &ModuleState) -> Option<Self> {
        let Some(frame) = state.scatterplot.as_ref() else {
            debug!(module = %state.id, "no scatterplot data");
            return None;
        };
        let Some(raw) = state.bounds else {
            debug!(module = %state.id, "no bounds");
            return None;
        };
        let Some(bounds) = DataBounds::from_edges(raw.xmin, raw.xmax, raw.ymin, raw.ymax) else {
            debug!(module = %state.id, ?raw, "malformed bounds");
            return None;
        };

        if frame.index.len() != frame.data.len() {
            warn!(
                module = %state.id,
                index = frame.index.len(),
                data = frame.data.len(),
                "index and data lengths differ; truncating"
            );
        }

        let mut points = Vec::with_capacity(frame.data.len());
        let mut index = Vec::with_capacity(frame.data.len());
        for (id, row) in frame.index.iter().zip(&frame.data) {
            let (Some(Some(x)), Some(Some(y))) = (row.first(), row.get(1)) else {
                continue;
            };
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            points.push(Vec2::new(*x, *y));
            index.push(WireId::into_key(id.clone()));
        }

        let columns = state
            .columns
            .as_deref()
            .filter(|c| c.len() >= 2)
            .or_else(|| Some(frame.columns.as_slice()).filter(|c| c.len() >= 2))
            .map(|c| [c[0].clone(), c[1].clone()])
            .unwrap_or_default();

        Some(Self {
            points,
            index,
            bounds,
            image: state.image.clone(),
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(id, point)` pairs in snapshot order.
    pub fn keyed_points(&self) -> impl Iterator<Item = (&str, Vec2)> + '_ {
        self.index.iter().map(String::as_str).zip(self.points.iter().copied())
    }
}
