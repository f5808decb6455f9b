//! Core types for newsrank.

mod article;
mod hit;
mod sparse;

pub use article::*;
pub use hit::*;
pub use sparse::*;
