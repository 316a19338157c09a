// Recipe indexing: content fingerprints and retrieval chunks

pub mod chunker;
pub mod signature;

// Re-exports
pub use chunker::{chunk, price_chunk, Chunk, ChunkType, Chunker};
pub use signature::signature;
