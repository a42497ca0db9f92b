//! Progressive views: a scatterplot reconciled against a stream of module
//! snapshots and a module dependency graph, both driven by a single
//! refresh driver.

pub mod config;
pub mod controller;
pub mod filter;
pub mod graph;
pub mod scatterplot;
pub mod session;
pub mod viewport;

pub use config::*;
pub use controller::*;
pub use filter::*;
pub use graph::*;
pub use scatterplot::*;
pub use session::*;
pub use viewport::*;
