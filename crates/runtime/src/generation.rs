/// Identifies a refresh request in issue order.
///
/// Small and copyable so it can travel with an in-flight fetch and come back
/// with its response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

/// Issues monotonically increasing generations and remembers the newest one
/// whose response was applied.
#[derive(Debug, Default, Clone)]
pub struct GenerationTracker {
    next: u64,
    latest_applied: Option<Generation>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Generation {
        let g = Generation(self.next);
        self.next += 1;
        g
    }

    /// The generation the next call to [`GenerationTracker::issue`] returns.
    pub fn peek_next(&self) -> Generation {
        Generation(self.next)
    }

    pub fn latest_applied(&self) -> Option<Generation> {
        self.latest_applied
    }

    /// A response is stale when a newer one has already been applied.
    pub fn is_stale(&self, g: Generation) -> bool {
        self.latest_applied.is_some_and(|latest| g < latest)
    }

    pub fn mark_applied(&mut self, g: Generation) {
        if self.latest_applied.is_none_or(|latest| g > latest) {
            self.latest_applied = Some(g);
        }
    }
}
