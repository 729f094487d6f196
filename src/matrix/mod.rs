// Chunked sparse matrix and its operations

pub mod chunk_sparse;
pub mod config;
pub mod identity;
pub mod io;
pub mod kernels;
pub mod norms;
pub mod smoothers;
pub mod vmult;

pub use chunk_sparse::{ChunkEntry, ChunkSparseMatrix};
pub use config::ParallelConfig;
pub use identity::IdentityMatrix;
pub use io::PrintFormat;
