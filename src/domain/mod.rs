pub mod commodity;
pub mod der;
pub mod properties;
pub mod types;

pub use commodity::*;
pub use der::*;
pub use properties::*;
pub use types::*;
