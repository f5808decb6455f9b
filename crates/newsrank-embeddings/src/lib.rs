//! newsrank-embeddings - Query embedding providers for newsrank.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - text-embedding-3-small, text-embedding-3-large, etc.
//! - **Ollama** (feature: `ollama`) - Local embedding models via Ollama
//!
//! The model and dimensionality must match the ones the dense index was
//! built with, otherwise dense search fails with a dimension mismatch.
//!
//! # Example
//!
//! ```ignore
//! use newsrank_embeddings::EmbedderFactory;
//!
//! let embedder = EmbedderFactory::openai()?;
//! let embedder = EmbedderFactory::ollama_with_model("nomic-embed-text", 768)?;
//! ```

mod factory;
mod ollama;
mod openai;

pub use factory::EmbedderFactory;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAIEmbedder;

// Re-export core types for convenience
pub use newsrank_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};
