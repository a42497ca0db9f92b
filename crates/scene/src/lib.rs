pub mod backend;
pub mod components;
pub mod node;
pub mod reconcile;
pub mod svg;
pub mod world;

pub use backend::*;
pub use node::*;
pub use reconcile::*;
pub use world::*;
