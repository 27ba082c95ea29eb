use async_trait::async_trait;

use crate::application::ports::{Embedder, EmbedderError};
use crate::domain::Embedding;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Local embedder based on feature hashing of lowercase word tokens.
///
/// Output is deterministic and L2-normalized, so texts sharing vocabulary
/// score higher under cosine similarity. Needs no network access.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, EmbedderError> {
        if dimensions == 0 {
            return Err(EmbedderError::InvalidConfiguration(
                "dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    fn vectorize(&self, text: &str) -> Embedding {
        let mut values = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(&token.to_lowercase());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            values[bucket] += sign;
        }

        Embedding::new(values).normalized()
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}
