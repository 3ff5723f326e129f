//! Single source of truth for the benchmark's filesystem layout.
//!
//! This module defines WHERE data lives. It has no I/O and no validation.
//!
//! ```text
//! project/
//! ├── rerank-bench.toml            # Optional config
//! └── .rerank-bench/               # Derived (gitignored)
//!     └── baseline-cache.json      # Trusted-provider rankings
//! ```

use std::path::{Path, PathBuf};

/// Config file name looked up in the working directory
pub const CONFIG_FILE: &str = "rerank-bench.toml";

/// Data directory name under the working directory
pub const DATA_DIR: &str = ".rerank-bench";

/// Baseline cache file name inside the data directory
pub const BASELINE_CACHE_FILE: &str = "baseline-cache.json";

/// Config file: `<root>/rerank-bench.toml`
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Default cache path as written in config (relative to the working directory)
pub fn default_cache_path() -> PathBuf {
    PathBuf::from(DATA_DIR).join(BASELINE_CACHE_FILE)
}
