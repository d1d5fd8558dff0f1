use crate::refresher::DEFAULT_REFRESH_INTERVAL;
use crate::story_fetcher::DEFAULT_BASE_URL;
use anyhow::{Context, Result, bail};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub refresh_interval: Duration,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Read all configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = var("HN_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let refresh_interval = match var("REFRESH_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .context("REFRESH_INTERVAL_SECS must be a valid number")?;
                if secs == 0 {
                    bail!("REFRESH_INTERVAL_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_REFRESH_INTERVAL,
        };

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:8080")?;

        Ok(Self {
            api_base_url,
            refresh_interval,
            bind_addr,
        })
    }
}
