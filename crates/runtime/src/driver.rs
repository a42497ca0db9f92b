use tracing::{debug, info};

use crate::generation::{Generation, GenerationTracker};
use crate::metrics::{
    Metrics, REFRESH_APPLIED, REFRESH_FAILED, REFRESH_IGNORED, REFRESH_ISSUED, REFRESH_STALE,
    REFRESH_SUPERSEDED, VIEW_ACTIVATIONS,
};

/// A view that can be refreshed by the [`RefreshDriver`].
///
/// `R` is what the view asks to fetch, `P` the payload it consumes and `E`
/// the transport error it reports.
pub trait ViewController<R, P, E> {
    fn name(&self) -> &str;

    fn activate(&mut self) {}

    fn deactivate(&mut self) {}

    /// What to fetch on the next refresh.
    fn request(&self) -> R;

    /// Reconcile a fresh payload into the view.
    ///
    /// Returns `false` when the payload was unusable and the view kept its
    /// previous render.
    fn apply(&mut self, payload: P) -> bool;

    /// Report a failed fetch. The view must keep its last good state.
    fn fail(&mut self, error: &E);
}

/// A refresh that has been issued and awaits its response.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRefresh<R> {
    pub generation: Generation,
    pub request: R,
}

/// What happened to a completed refresh.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The view rejected the payload; the latest applied generation is unchanged.
    Ignored,
    Failed,
    /// A newer response was already applied.
    Stale,
    /// Issued for a view that is no longer active.
    Superseded,
    /// No view is active.
    Idle,
}

/// Owns the single active view and sequences its refreshes.
///
/// Exactly one controller is active at a time; activating another one
/// deactivates the previous controller first. Responses are matched to the
/// controller they were issued for by generation.
pub struct RefreshDriver<R, P, E> {
    active: Option<Box<dyn ViewController<R, P, E>>>,
    generations: GenerationTracker,
    activated_at: Generation,
    discard_stale: bool,
    metrics: Metrics,
}

impl<R, P, E> Default for RefreshDriver<R, P, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P, E> RefreshDriver<R, P, E> {
    pub fn new() -> Self {
        Self {
            active: None,
            generations: GenerationTracker::new(),
            activated_at: Generation(0),
            discard_stale: true,
            metrics: Metrics::new(),
        }
    }

    /// When disabled, out-of-order responses are applied as they arrive.
    pub fn with_discard_stale(mut self, discard_stale: bool) -> Self {
        self.discard_stale = discard_stale;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_ref().map(|c| c.name())
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Makes `controller` the single active view.
    ///
    /// Returns the previously active controller, already deactivated.
    pub fn activate(
        &mut self,
        mut controller: Box<dyn ViewController<R, P, E>>,
    ) -> Option<Box<dyn ViewController<R, P, E>>> {
        let previous = self.deactivate();
        self.activated_at = self.generations.peek_next();
        controller.activate();
        info!(view = controller.name(), "view activated");
        self.metrics.inc(VIEW_ACTIVATIONS);
        self.active = Some(controller);
        previous
    }

    pub fn deactivate(&mut self) -> Option<Box<dyn ViewController<R, P, E>>> {
        let mut previous = self.active.take()?;
        previous.deactivate();
        debug!(view = previous.name(), "view deactivated");
        Some(previous)
    }

    /// Issues the next refresh for the active view, if any.
    pub fn begin_refresh(&mut self) -> Option<PendingRefresh<R>> {
        let controller = self.active.as_ref()?;
        let request = controller.request();
        let generation = self.generations.issue();
        self.metrics.inc(REFRESH_ISSUED);
        Some(PendingRefresh {
            generation,
            request,
        })
    }

    /// Delivers the response for a refresh issued by [`RefreshDriver::begin_refresh`].
    pub fn complete(&mut self, generation: Generation, result: Result<P, E>) -> Completion {
        let Some(controller) = self.active.as_mut() else {
            return Completion::Idle;
        };
        if generation < self.activated_at {
            self.metrics.inc(REFRESH_SUPERSEDED);
            debug!(?generation, "dropping response issued for a previous view");
            return Completion::Superseded;
        }
        match result {
            Ok(payload) => {
                if self.discard_stale && self.generations.is_stale(generation) {
                    self.metrics.inc(REFRESH_STALE);
                    debug!(?generation, "dropping out-of-order response");
                    return Completion::Stale;
                }
                if !controller.apply(payload) {
                    self.metrics.inc(REFRESH_IGNORED);
                    debug!(?generation, "view ignored unusable payload");
                    return Completion::Ignored;
                }
                self.generations.mark_applied(generation);
                self.metrics.inc(REFRESH_APPLIED);
                Completion::Applied
            }
            Err(err) => {
                controller.fail(&err);
                self.metrics.inc(REFRESH_FAILED);
                Completion::Failed
            }
        }
    }

    /// Runs `f` against the active controller.
    pub fn with_active<T>(
        &mut self,
        f: impl FnOnce(&mut dyn ViewController<R, P, E>) -> T,
    ) -> Option<T> {
        let controller = self.active.as_mut()?;
        Some(f(controller.as_mut()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Completion, RefreshDriver, ViewController};
    use crate::generation::Generation;
    use crate::metrics::{REFRESH_APPLIED, REFRESH_IGNORED, REFRESH_STALE, REFRESH_SUPERSEDED};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        applied: Vec<u32>,
        errors: Vec<String>,
        lifecycle: Vec<String>,
    }

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Log>>,
    }

    impl ViewController<&'static str, u32, String> for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn activate(&mut self) {
            self.log.borrow_mut().lifecycle.push(format!("+{}", self.name));
        }

        fn deactivate(&mut self) {
            self.log.borrow_mut().lifecycle.push(format!("-{}", self.name));
        }

        fn request(&self) -> &'static str {
            self.name
        }

        /// Zero stands in for a degenerate payload.
        fn apply(&mut self, payload: u32) -> bool {
            if payload == 0 {
                return false;
            }
            self.log.borrow_mut().applied.push(payload);
            true
        }

        fn fail(&mut self, error: &String) {
            self.log.borrow_mut().errors.push(error.clone());
        }
    }

    type TestDriver = RefreshDriver<&'static str, u32, String>;

    fn recorder(name: &'static str, log: &Rc<RefCell<Log>>) -> Box<Recorder> {
        Box::new(Recorder {
            name,
            log: Rc::clone(log),
        })
    }

    #[test]
    fn idle_driver_issues_nothing() {
        let mut d = TestDriver::new();
        assert!(d.begin_refresh().is_none());
        assert_eq!(d.complete(Generation(0), Ok(1)), Completion::Idle);
    }

    #[test]
    fn only_one_view_is_active() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut d = TestDriver::new();
        assert!(d.activate(recorder("graph", &log)).is_none());
        let previous = d.activate(recorder("scatter", &log));
        assert_eq!(previous.map(|p| p.name().to_string()), Some("graph".to_string()));
        assert_eq!(d.active_name(), Some("scatter"));
        assert_eq!(log.borrow().lifecycle, vec!["+graph", "-graph", "+scatter"]);
    }

    #[test]
    fn applies_in_order_and_drops_stale() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut d = TestDriver::new();
        d.activate(recorder("scatter", &log));

        let first = d.begin_refresh().unwrap();
        let second = d.begin_refresh().unwrap();
        assert_eq!(second.request, "scatter");

        assert_eq!(d.complete(second.generation, Ok(2)), Completion::Applied);
        assert_eq!(d.complete(first.generation, Ok(1)), Completion::Stale);
        assert_eq!(log.borrow().applied, vec![2]);
        assert_eq!(d.metrics().counter(REFRESH_STALE), 1);
        assert_eq!(d.metrics().counter(REFRESH_APPLIED), 1);
    }

    #[test]
    fn ignored_payload_does_not_make_older_responses_stale() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut d = TestDriver::new();
        d.activate(recorder("scatter", &log));

        let first = d.begin_refresh().unwrap();
        let second = d.begin_refresh().unwrap();
        assert_eq!(d.complete(second.generation, Ok(0)), Completion::Ignored);
        assert_eq!(d.complete(first.generation, Ok(1)), Completion::Applied);
        assert_eq!(log.borrow().applied, vec![1]);
        assert_eq!(d.metrics().counter(REFRESH_IGNORED), 1);
        assert_eq!(d.metrics().counter(REFRESH_APPLIED), 1);
    }

    #[test]
    fn stale_responses_apply_when_discard_is_off() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut d = TestDriver::new().with_discard_stale(false);
        d.activate(recorder("scatter", &log));
        let first = d.begin_refresh().unwrap();
        let second = d.begin_refresh().unwrap();
        d.complete(second.generation, Ok(2));
        assert_eq!(d.complete(first.generation, Ok(1)), Completion::Applied);
        assert_eq!(log.borrow().applied, vec![2, 1]);
    }

    #[test]
    fn response_for_previous_view_is_superseded() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut d = TestDriver::new();
        d.activate(recorder("graph", &log));
        let pending = d.begin_refresh().unwrap();
        d.activate(recorder("scatter", &log));

        assert_eq!(d.complete(pending.generation, Ok(7)), Completion::Superseded);
        assert_eq!(
            d.complete(pending.generation, Err("late".to_string())),
            Completion::Superseded
        );
        assert!(log.borrow().applied.is_empty());
        assert!(log.borrow().errors.is_empty());
        assert_eq!(d.metrics().counter(REFRESH_SUPERSEDED), 2);
    }

    #[test]
    fn failure_reaches_controller() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut d = TestDriver::new();
        d.activate(recorder("scatter", &log));
        let pending = d.begin_refresh().unwrap();
        assert_eq!(
            d.complete(pending.generation, Err("timeout".to_string())),
            Completion::Failed
        );
        assert_eq!(log.borrow().errors, vec!["timeout".to_string()]);
    }
}
