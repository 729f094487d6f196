// Sparsity patterns consumed by the chunked matrix

pub mod chunk;
pub mod pattern;

pub use chunk::ChunkSparsityPattern;
pub use pattern::SparsityPattern;
