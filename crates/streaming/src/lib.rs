pub mod endpoints;
pub mod error;
pub mod protocol;
pub mod request;
pub mod snapshot;
pub mod transport;

pub use endpoints::*;
pub use error::*;
pub use protocol::*;
pub use request::*;
pub use snapshot::*;
pub use transport::*;
