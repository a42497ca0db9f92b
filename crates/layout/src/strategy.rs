use crate::graph::{LayoutEdge, LayoutNode};

/// An iterative node placement algorithm.
///
/// Callers drive it explicitly: `initialize` once, then `step` until
/// `is_converged`, rendering the intermediate positions if they like.
pub trait LayoutStrategy {
    fn initialize(&mut self, nodes: Vec<LayoutNode>, edges: Vec<LayoutEdge>);

    /// Advances one iteration and returns the current positions.
    fn step(&mut self) -> &[LayoutNode];

    /// True once positions will no longer change, either because the
    /// iteration budget is spent or the layout has settled.
    fn is_converged(&self) -> bool;

    fn nodes(&self) -> &[LayoutNode];

    fn edges(&self) -> &[LayoutEdge];
}
