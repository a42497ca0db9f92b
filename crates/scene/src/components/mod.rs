pub mod shape;
pub mod style;
pub mod transform;

pub use shape::*;
pub use style::*;
pub use transform::*;
