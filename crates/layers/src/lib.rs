pub mod axis;
pub mod graph;
pub mod history;
pub mod layer;
pub mod points;
pub mod raster;
pub mod symbology;

pub use layer::*;
