//! Wire types exchanged with the progressive computation server.
//!
//! All payloads are JSON. Module responses are loosely typed on the server
//! side, so most fields are optional and unknown fields are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Row identifier as serialized by the server: a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl WireId {
    /// Normalized string key.
    pub fn into_key(self) -> String {
        match self {
            WireId::Int(v) => v.to_string(),
            WireId::Float(v) => v.to_string(),
            WireId::Text(s) => s,
        }
    }
}

/// A two-column table in "split" orientation: parallel `index` and `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitFrame {
    #[serde(default)]
    pub index: Vec<WireId>,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Rows of `[x, y]`; NaN values arrive as `null`.
    #[serde(default)]
    pub data: Vec<Vec<Option<f64>>>,
}

/// Data extent as sent by the server. Omitted entirely when any edge is NaN.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBounds {
    #[serde(default)]
    pub xmin: Option<f64>,
    #[serde(default)]
    pub xmax: Option<f64>,
    #[serde(default)]
    pub ymin: Option<f64>,
    #[serde(default)]
    pub ymax: Option<f64>,
}

/// Full state of one module, as returned by the module endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub classname: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub is_running: Option<bool>,
    #[serde(default)]
    pub run_number: Option<u64>,
    #[serde(default)]
    pub last_update: Option<u64>,
    #[serde(default)]
    pub scatterplot: Option<SplitFrame>,
    #[serde(default)]
    pub bounds: Option<RawBounds>,
    /// URL of the latest rendered raster.
    #[serde(default)]
    pub image: Option<String>,
    /// `[x label, y label]`.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

/// One or a list of values; the server emits both shapes for slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(v) => v,
        }
    }
}

/// A connection from an output slot of one module to an input of another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotLink {
    pub output_module: String,
    #[serde(default)]
    pub output_name: Option<String>,
    pub input_module: String,
    #[serde(default)]
    pub input_name: Option<String>,
}

/// Module entry of the long-form scheduler listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub classname: Option<String>,
    #[serde(default)]
    pub output_slots: BTreeMap<String, Option<OneOrMany<SlotLink>>>,
}

impl ModuleSummary {
    /// Every link leaving this module, over all output slots.
    pub fn links(&self) -> impl Iterator<Item = &SlotLink> + '_ {
        self.output_slots
            .values()
            .flatten()
            .flat_map(|slot| slot.as_slice().iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerState {
    #[serde(default)]
    pub modules: Vec<ModuleSummary>,
    #[serde(default)]
    pub is_running: Option<bool>,
    #[serde(default)]
    pub run_number: Option<u64>,
}

/// Parameter change sent to a module input, e.g. a range-query bound.
///
/// `None` values serialize as `null`, meaning "no bound".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMutation {
    pub path: String,
    pub var_values: BTreeMap<String, Option<f64>>,
}

/// Server reply to an [`InputMutation`]. Its content is not interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputAck(pub serde_json::Value);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_scatterplot_module() {
        let json = r#"{
            "id": "scatterplot_1",
            "state": "running",
            "run_number": 12,
            "scatterplot": {
                "index": [0, "b", 2.5],
                "columns": ["x", "y"],
                "data": [[0.1, 0.2], [null, 0.4], [0.5, 0.6]]
            },
            "bounds": {"xmin": 0.0, "xmax": 1.0, "ymin": 0.0, "ymax": 1.0},
            "image": "/progressivis/module/image/heatmap_1?run_number=12",
            "columns": ["x", "y"],
            "parameters": {"quantum": 1.0}
        }"#;
        let m: ModuleState = serde_json::from_str(json).unwrap();
        assert_eq!(m.id, "scatterplot_1");
        let sp = m.scatterplot.unwrap();
        let keys: Vec<String> = sp.index.into_iter().map(WireId::into_key).collect();
        assert_eq!(keys, vec!["0", "b", "2.5"]);
        assert_eq!(sp.data[1], vec![None, Some(0.4)]);
        assert_eq!(m.bounds.unwrap().xmax, Some(1.0));
        assert_eq!(m.columns, Some(vec!["x".to_string(), "y".to_string()]));
    }

    #[test]
    fn decodes_scheduler_slots() {
        let json = r#"{"modules": [
            {"id": "csv", "state": "ready", "output_slots": {
                "df": [
                    {"output_module": "csv", "output_name": "df", "input_module": "min", "input_name": "df"},
                    {"output_module": "csv", "output_name": "df", "input_module": "max", "input_name": "df"}
                ],
                "_trace": null
            }},
            {"id": "min", "state": "blocked", "output_slots": {
                "df": {"output_module": "min", "input_module": "max"}
            }},
            {"id": "max", "state": "zombie"}
        ]}"#;
        let s: SchedulerState = serde_json::from_str(json).unwrap();
        assert_eq!(s.modules.len(), 3);
        let targets: Vec<&str> = s.modules[0].links().map(|l| l.input_module.as_str()).collect();
        assert_eq!(targets, vec!["min", "max"]);
        assert_eq!(s.modules[1].links().count(), 1);
        assert_eq!(s.modules[2].links().count(), 0);
    }

    #[test]
    fn mutation_encodes_missing_bound_as_null() {
        let m = InputMutation {
            path: "sp/range_query/min_value".to_string(),
            var_values: [("x".to_string(), Some(1.5)), ("y".to_string(), None)]
                .into_iter()
                .collect(),
        };
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(
            json,
            r#"{"path":"sp/range_query/min_value","var_values":{"x":1.5,"y":null}}"#
        );
    }
}
