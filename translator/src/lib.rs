#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(
    clippy::needless_continue,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::struct_field_names
)]

pub mod error;
pub mod expressions;
pub mod failures;
pub mod ingress;
pub mod l4;
pub mod model;
pub mod paths;
pub mod rewrite;
pub mod source;
pub mod tags;
mod translator;

pub use crate::translator::*;
