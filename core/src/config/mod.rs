pub mod options;
pub mod serde;

pub use options::*;
pub use serde::*;
