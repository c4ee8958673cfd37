pub mod chunker;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod traits;
pub mod types;
