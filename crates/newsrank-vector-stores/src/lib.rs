//! newsrank-vector-stores - Vector index clients for newsrank.
//!
//! # Supported Backends
//!
//! - **Pinecone** (feature: `pinecone`) - serves both the dense embedding
//!   index and the sparse BM25 index through its data-plane query API

mod factory;

#[cfg(feature = "pinecone")]
mod pinecone;

pub use factory::VectorIndexFactory;

#[cfg(feature = "pinecone")]
pub use pinecone::PineconeIndex;

// Re-export core types for convenience
pub use newsrank_core::traits::{
    DenseIndex, IndexMatch, SparseIndex, VectorIndexConfig, VectorIndexProvider,
};
