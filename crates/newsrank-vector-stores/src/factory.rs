//! Factory for creating vector index clients.

use std::sync::Arc;

use newsrank_core::error::{NewsrankError, NewsrankResult};
use newsrank_core::traits::{DenseIndex, SparseIndex, VectorIndexConfig, VectorIndexProvider};

/// Factory for creating vector index clients.
pub struct VectorIndexFactory;

impl VectorIndexFactory {
    /// Create the dense (embedding) index client.
    pub fn dense(config: &VectorIndexConfig) -> NewsrankResult<Arc<dyn DenseIndex>> {
        match config.provider {
            #[cfg(feature = "pinecone")]
            VectorIndexProvider::Pinecone => {
                let index = crate::pinecone::PineconeIndex::new(config)?;
                Ok(Arc::new(index))
            }

            #[allow(unreachable_patterns)]
            _ => Err(unsupported(config.provider)),
        }
    }

    /// Create the sparse (BM25) index client.
    pub fn sparse(config: &VectorIndexConfig) -> NewsrankResult<Arc<dyn SparseIndex>> {
        match config.provider {
            #[cfg(feature = "pinecone")]
            VectorIndexProvider::Pinecone => {
                let index = crate::pinecone::PineconeIndex::new(config)?;
                Ok(Arc::new(index))
            }

            #[allow(unreachable_patterns)]
            _ => Err(unsupported(config.provider)),
        }
    }
}

#[allow(dead_code)]
fn unsupported(provider: VectorIndexProvider) -> NewsrankError {
    NewsrankError::UnsupportedProvider {
        provider: format!("{:?} (enable the matching feature)", provider),
    }
}
