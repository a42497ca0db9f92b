pub mod scale;
pub mod vec;

pub use scale::*;
pub use vec::*;
