use std::collections::BTreeMap;

pub const REFRESH_ISSUED: &str = "refresh.issued";
pub const REFRESH_APPLIED: &str = "refresh.applied";
pub const REFRESH_FAILED: &str = "refresh.failed";
pub const REFRESH_IGNORED: &str = "refresh.ignored";
pub const REFRESH_STALE: &str = "refresh.stale";
pub const REFRESH_SUPERSEDED: &str = "refresh.superseded";
pub const VIEW_ACTIVATIONS: &str = "view.activations";

/// Refresh-loop counters and gauges.
///
/// Sorted maps so snapshots print in a stable order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc(&mut self, name: &'static str) {
        *self.counters.entry(name).or_insert(0) += 1;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Metrics, REFRESH_APPLIED, REFRESH_ISSUED};
    use pretty_assertions::assert_eq;

    #[test]
    fn counters_accumulate() {
        let mut m = Metrics::new();
        m.inc(REFRESH_ISSUED);
        m.inc(REFRESH_ISSUED);
        assert_eq!(m.counter(REFRESH_ISSUED), 2);
        assert_eq!(m.counter("missing"), 0);
    }

    #[test]
    fn snapshot_is_stably_sorted() {
        let mut m = Metrics::new();
        m.inc(REFRESH_ISSUED);
        m.inc(REFRESH_APPLIED);
        m.set_gauge("view.points", 3);
        m.set_gauge("view.edges", 1);

        let snap = m.snapshot();
        assert_eq!(
            snap.counters,
            vec![(REFRESH_APPLIED, 1), (REFRESH_ISSUED, 1)]
        );
        assert_eq!(snap.gauges, vec![("view.edges", 1), ("view.points", 3)]);
    }
}
