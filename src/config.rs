//! Runtime settings, read from the environment (after `.env` is loaded).
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_DB: &str = "sqlite://chat.db?mode=rwc";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// How often the sweeper wakes up.
    pub sweep_every: Duration,
    /// Silence longer than this gets a participant evicted.
    pub stale_after: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let num = |key: &str, default: u64| -> anyhow::Result<u64> {
            match get(key) {
                Some(v) => v.trim().parse::<u64>().with_context(|| format!("{key}={v:?} is not a number")),
                None    => Ok(default),
            }
        };

        let port  = num("PORT", 5000)?;
        let every = num("SWEEP_INTERVAL_SECS", 15)?;
        anyhow::ensure!(every > 0, "SWEEP_INTERVAL_SECS must be at least 1");

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DB.into()),
            port: u16::try_from(port).with_context(|| format!("PORT={port} out of range"))?,
            sweep_every: Duration::from_secs(every),
            stale_after: Duration::from_secs(num("STALE_AFTER_SECS", 10)?),
        })
    }
}
