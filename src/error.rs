//! Error types for the generation pipeline.

use crate::config::ConfigError;
use crate::store::StoreError;

/// Errors that abort a world build.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The biome store has nothing to classify into.
    #[error("biome table is empty")]
    EmptyBiomeTable,

    /// A biome the classifier or materializer needs is not in the store.
    #[error("biome `{0}` is not in the biome store")]
    MissingBiome(String),

    /// The Voronoi diagram could not be built from the sampled sites.
    #[error("could not build a Voronoi diagram from {sites} sites")]
    Diagram { sites: usize },
}
