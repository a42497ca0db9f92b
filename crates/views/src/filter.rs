use std::collections::BTreeMap;

use foundation::bounds::DataBounds;
use streaming::error::TransportError;
use streaming::protocol::InputMutation;
use streaming::transport::Transport;
use tracing::{debug, warn};

use crate::config::FilterTarget;

/// The pair of range-query inputs derived from one visible rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    pub min: InputMutation,
    pub max: InputMutation,
}

impl FilterRequest {
    pub fn mutations(&self) -> [&InputMutation; 2] {
        [&self.min, &self.max]
    }
}

/// Range query for the `visible` rectangle against the server's `server`
/// bounds.
///
/// A visible edge only becomes a bound when it lies strictly inside the
/// server's extent; otherwise the column gets `None`, meaning "no bound".
pub fn compute_filter(
    visible: &DataBounds,
    server: &DataBounds,
    columns: &[String; 2],
    module_id: &str,
    target: &FilterTarget,
) -> FilterRequest {
    let lower = |v: f64, limit: f64| (v > limit).then_some(v);
    let upper = |v: f64, limit: f64| (v < limit).then_some(v);

    let mut min = BTreeMap::new();
    min.insert(columns[0].clone(), lower(visible.xmin, server.xmin));
    min.insert(columns[1].clone(), lower(visible.ymin, server.ymin));
    let mut max = BTreeMap::new();
    max.insert(columns[0].clone(), upper(visible.xmax, server.xmax));
    max.insert(columns[1].clone(), upper(visible.ymax, server.ymax));

    FilterRequest {
        min: InputMutation {
            path: target.min_path(module_id),
            var_values: min,
        },
        max: InputMutation {
            path: target.max_path(module_id),
            var_values: max,
        },
    }
}

/// Sends both halves of `request`. Failures are reported to `on_error`
/// and never abort the other half.
///
/// Returns how many mutations the server acknowledged.
pub async fn send_filter<T, F>(transport: &T, request: &FilterRequest, on_error: F) -> usize
where
    T: Transport + ?Sized,
    F: Fn(&TransportError),
{
    let mut sent = 0;
    for mutation in request.mutations() {
        match transport.send_input(mutation).await {
            Ok(_) => {
                debug!(path = %mutation.path, "filter input sent");
                sent += 1;
            }
            Err(err) => {
                warn!(path = %mutation.path, error = %err, "filter input failed");
                on_error(&err);
            }
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::{compute_filter, send_filter};
    use crate::config::FilterTarget;
    use foundation::bounds::DataBounds;
    use pollster::block_on;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use streaming::error::TransportError;
    use streaming::transport::MemoryTransport;

    fn columns() -> [String; 2] {
        ["x".to_string(), "y".to_string()]
    }

    #[test]
    fn edge_on_server_bound_means_no_bound() {
        let server = DataBounds::new(0.0, 10.0, 0.0, 5.0);
        let visible = DataBounds::new(0.0, 7.5, 1.25, 5.0);
        let req = compute_filter(&visible, &server, &columns(), "sp", &FilterTarget::default());
        assert_eq!(req.min.path, "sp/range_query/min_value");
        assert_eq!(req.max.path, "sp/range_query/max_value");
        assert_eq!(req.min.var_values["x"], None);
        assert_eq!(req.min.var_values["y"], Some(1.25));
        assert_eq!(req.max.var_values["x"], Some(7.5));
        assert_eq!(req.max.var_values["y"], None);
    }

    #[test]
    fn rectangle_wider_than_server_is_unbounded() {
        let server = DataBounds::new(0.0, 10.0, 0.0, 5.0);
        let visible = DataBounds::new(-1.0, 11.0, -1.0, 6.0);
        let req = compute_filter(&visible, &server, &columns(), "sp", &FilterTarget::default());
        assert!(req.min.var_values.values().all(Option::is_none));
        assert!(req.max.var_values.values().all(Option::is_none));
        let body = serde_json::to_string(&req.min.var_values).unwrap();
        assert_eq!(body, r#"{"x":null,"y":null}"#);
    }

    #[test]
    fn failures_are_reported_not_propagated() {
        let transport = MemoryTransport::new();
        let server = DataBounds::new(0.0, 10.0, 0.0, 5.0);
        let visible = DataBounds::new(1.0, 9.0, 1.0, 4.0);
        let req = compute_filter(&visible, &server, &columns(), "sp", &FilterTarget::default());

        transport.fail_next(TransportError::Network("down".to_string()));
        let errors = Cell::new(0);
        let sent = block_on(send_filter(&transport, &req, |_| errors.set(errors.get() + 1)));
        assert_eq!(sent, 1);
        assert_eq!(errors.get(), 1);
        let inputs = transport.inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].path, "sp/range_query/max_value");
    }
}
