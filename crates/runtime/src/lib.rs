pub mod driver;
pub mod generation;
pub mod metrics;

pub use driver::*;
pub use generation::*;
