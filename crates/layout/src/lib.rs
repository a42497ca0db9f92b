//! Graph layout: node placement strategies and edge routing.

pub mod constraint;
pub mod graph;
pub mod routing;
pub mod strategy;

pub use constraint::*;
pub use graph::*;
pub use routing::*;
pub use strategy::*;
