pub mod baseline;
pub mod bench;
pub mod config;
pub mod fixtures;
pub mod metrics;
pub mod paths;
pub mod rerank;

// Re-export commonly used types
pub use baseline::{Baseline, BaselineCache};
pub use bench::{BenchOptions, BenchReport, Orchestrator};
pub use config::BenchConfig;
pub use fixtures::Fixtures;
pub use rerank::{Ranking, Reranker};
