pub mod bounds;
pub mod history;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use history::*;
pub use math::*;
