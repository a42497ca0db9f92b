use std::cell::RefCell;
use std::rc::Rc;

use runtime::driver::{RefreshDriver, ViewController};
use streaming::error::TransportError;
use streaming::request::{FetchRequest, Payload};
use streaming::snapshot::Snapshot;
use tracing::{debug, warn};

use crate::graph::GraphView;
use crate::scatterplot::ScatterplotView;

/// The driver both hosts run: module and scheduler fetches over one transport.
pub type ViewDriver = RefreshDriver<FetchRequest, Payload, TransportError>;

/// Receives fetch failures with the name of the view that issued them.
pub type ErrorCallback = Rc<dyn Fn(&str, &TransportError)>;

fn report(view: &str, error: &TransportError, on_error: Option<&ErrorCallback>) {
    warn!(view, error = %error, "refresh failed");
    if let Some(callback) = on_error {
        callback(view, error);
    }
}

/// Polls one module and reconciles its scatterplot.
pub struct ScatterplotController {
    module_id: String,
    view: Rc<RefCell<ScatterplotView>>,
    on_error: Option<ErrorCallback>,
}

impl ScatterplotController {
    pub fn new(module_id: impl Into<String>, view: Rc<RefCell<ScatterplotView>>) -> Self {
        Self {
            module_id: module_id.into(),
            view,
            on_error: None,
        }
    }

    pub fn with_error_callback(mut self, on_error: ErrorCallback) -> Self {
        self.on_error = Some(on_error);
        self
    }
}

impl ViewController<FetchRequest, Payload, TransportError> for ScatterplotController {
    fn name(&self) -> &str {
        "scatterplot"
    }

    fn deactivate(&mut self) {
        if let Ok(mut view) = self.view.try_borrow_mut() {
            view.unhover_history();
        }
    }

    fn request(&self) -> FetchRequest {
        FetchRequest::Module(self.module_id.clone())
    }

    fn apply(&mut self, payload: Payload) -> bool {
        let Payload::Module(state) = payload else {
            warn!(module = %self.module_id, "scatterplot got a scheduler payload");
            return false;
        };
        let Some(snapshot) = Snapshot::from_module_state(&state) else {
            debug!(module = %self.module_id, "skipping degenerate snapshot");
            return false;
        };
        let Ok(mut view) = self.view.try_borrow_mut() else {
            warn!(module = %self.module_id, "scatterplot busy; dropping snapshot");
            return false;
        };
        match view.update(&snapshot) {
            Some(summary) => {
                debug!(module = %self.module_id, ?summary, "snapshot applied");
                true
            }
            None => false,
        }
    }

    fn fail(&mut self, error: &TransportError) {
        report(self.name(), error, self.on_error.as_ref());
    }
}

/// Polls the scheduler and reconciles the module graph.
pub struct GraphController {
    view: Rc<RefCell<GraphView>>,
    on_error: Option<ErrorCallback>,
}

impl GraphController {
    pub fn new(view: Rc<RefCell<GraphView>>) -> Self {
        Self {
            view,
            on_error: None,
        }
    }

    pub fn with_error_callback(mut self, on_error: ErrorCallback) -> Self {
        self.on_error = Some(on_error);
        self
    }
}

impl ViewController<FetchRequest, Payload, TransportError> for GraphController {
    fn name(&self) -> &str {
        "module-graph"
    }

    fn request(&self) -> FetchRequest {
        FetchRequest::Scheduler
    }

    fn apply(&mut self, payload: Payload) -> bool {
        let Payload::Scheduler(state) = payload else {
            warn!("module graph got a module payload");
            return false;
        };
        let Ok(mut view) = self.view.try_borrow_mut() else {
            warn!("module graph busy; dropping listing");
            return false;
        };
        let update = view.update(&state.modules);
        debug!(?update, "module listing applied");
        // An empty first listing defers the build.
        view.is_built()
    }

    fn fail(&mut self, error: &TransportError) {
        report(self.name(), error, self.on_error.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCallback, GraphController, ScatterplotController, ViewDriver};
    use crate::config::{GraphConfig, ScatterplotConfig};
    use crate::graph::{FixedAdvance, GraphView};
    use crate::scatterplot::ScatterplotView;
    use pretty_assertions::assert_eq;
    use runtime::driver::{Completion, ViewController};
    use std::cell::RefCell;
    use std::rc::Rc;
    use streaming::error::TransportError;
    use streaming::protocol::{ModuleState, RawBounds, SchedulerState, SplitFrame, WireId};
    use streaming::request::{FetchRequest, Payload};

    fn module_state() -> ModuleState {
        ModuleState {
            id: "sp".to_string(),
            scatterplot: Some(SplitFrame {
                index: vec![WireId::Text("p1".to_string()), WireId::Int(2)],
                columns: vec!["x".to_string(), "y".to_string()],
                data: vec![vec![Some(0.0), Some(0.0)], vec![Some(1.0), Some(1.0)]],
            }),
            bounds: Some(RawBounds {
                xmin: Some(0.0),
                xmax: Some(1.0),
                ymin: Some(0.0),
                ymax: Some(1.0),
            }),
            ..ModuleState::default()
        }
    }

    #[test]
    fn scatterplot_controller_applies_module_payloads() {
        let view = Rc::new(RefCell::new(ScatterplotView::new(ScatterplotConfig::default())));
        let mut controller = ScatterplotController::new("sp", Rc::clone(&view));
        assert_eq!(controller.request(), FetchRequest::module("sp"));

        assert!(!controller.apply(Payload::Scheduler(SchedulerState::default())));
        assert!(view.borrow().rendered_keys().is_empty());
        assert!(controller.apply(Payload::Module(module_state())));
        assert_eq!(view.borrow().rendered_keys(), vec!["p1", "2"]);
    }

    #[test]
    fn failures_reach_callback_and_keep_state() {
        let view = Rc::new(RefCell::new(ScatterplotView::new(ScatterplotConfig::default())));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let callback: ErrorCallback =
            Rc::new(move |name: &str, err: &TransportError| sink.borrow_mut().push(format!("{name}: {err}")));
        let controller =
            ScatterplotController::new("sp", Rc::clone(&view)).with_error_callback(callback);

        let mut driver = ViewDriver::new();
        driver.activate(Box::new(controller));
        let ok = driver.begin_refresh().unwrap();
        assert_eq!(
            driver.complete(ok.generation, Ok(Payload::Module(module_state()))),
            Completion::Applied
        );
        let bad = driver.begin_refresh().unwrap();
        let err = TransportError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(driver.complete(bad.generation, Err(err)), Completion::Failed);
        assert_eq!(*seen.borrow(), vec!["scatterplot: server returned 500: boom".to_string()]);
        assert_eq!(view.borrow().rendered_keys().len(), 2);
    }

    #[test]
    fn degenerate_snapshot_leaves_older_response_applicable() {
        let view = Rc::new(RefCell::new(ScatterplotView::new(ScatterplotConfig::default())));
        let mut driver = ViewDriver::new();
        driver.activate(Box::new(ScatterplotController::new("sp", Rc::clone(&view))));

        let older = driver.begin_refresh().unwrap();
        let newer = driver.begin_refresh().unwrap();
        let degenerate = ModuleState {
            bounds: None,
            ..module_state()
        };
        assert_eq!(
            driver.complete(newer.generation, Ok(Payload::Module(degenerate))),
            Completion::Ignored
        );
        assert_eq!(
            driver.complete(older.generation, Ok(Payload::Module(module_state()))),
            Completion::Applied
        );
        assert_eq!(view.borrow().rendered_keys(), vec!["p1", "2"]);
    }

    #[test]
    fn graph_controller_requests_scheduler() {
        let view = Rc::new(RefCell::new(GraphView::new(
            GraphConfig::default(),
            Box::new(FixedAdvance::default()),
        )));
        let mut controller = GraphController::new(Rc::clone(&view));
        assert_eq!(controller.request(), FetchRequest::Scheduler);
        assert!(!controller.apply(Payload::Module(module_state())));
        assert!(!controller.apply(Payload::Scheduler(SchedulerState::default())));
        assert!(!view.borrow().is_built());
    }
}
