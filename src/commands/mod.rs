//! CLI commands
//!
//! Each command is a thin shell over the library: resolve config, build
//! clients, call into `rerank_bench`, print.

pub mod baseline;
pub mod fixtures;
pub mod health;
pub mod run;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use rerank_bench::rerank::{EmbedServer, TrustedProvider};
use rerank_bench::{BaselineCache, BenchConfig, Fixtures};

/// Arguments shared by every command
#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    /// Inference server URL (overrides EMBED_SERVER_URL and config)
    #[arg(long, value_name = "URL")]
    pub embed_server: Option<String>,

    /// Config file (default: ./rerank-bench.toml if present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Custom fixture set (JSON) instead of the built-in corpus
    #[arg(long, value_name = "PATH")]
    pub fixtures: Option<PathBuf>,
}

/// Resolved config + fixtures for a command
pub struct Setup {
    pub config: BenchConfig,
    pub fixtures: Fixtures,
}

impl Setup {
    pub fn resolve(args: &CommonArgs) -> Result<Self> {
        let mut config = BenchConfig::load(args.config.as_deref())?;
        if let Some(url) = &args.embed_server {
            config.server.url = url.clone();
        }

        let fixtures = match &args.fixtures {
            Some(path) => Fixtures::load(path)?,
            None => Fixtures::builtin(),
        };

        Ok(Self { config, fixtures })
    }

    pub fn embed_server(&self) -> Result<EmbedServer> {
        EmbedServer::new(
            &self.config.server.url,
            Duration::from_secs(self.config.server.timeout_secs),
            Duration::from_secs(self.config.server.warmup_timeout_secs),
        )
    }

    pub fn cache(&self) -> BaselineCache {
        BaselineCache::new(self.config.bench.cache_path.clone(), &self.fixtures)
    }

    /// Trusted provider, or `None` without a credential
    pub fn trusted(&self) -> Result<Option<TrustedProvider>> {
        if self.config.trusted.api_key.is_none() {
            debug!("no trusted provider credential; baseline must come from cache");
            return Ok(None);
        }
        TrustedProvider::from_config(&self.config.trusted).map(Some)
    }
}
