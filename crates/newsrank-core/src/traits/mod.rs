//! Core traits for newsrank collaborators.

mod article_store;
mod corpus;
mod embedder;
mod vector_index;

pub use article_store::*;
pub use corpus::*;
pub use embedder::*;
pub use vector_index::*;
