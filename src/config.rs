// src/config.rs
use std::net::SocketAddr;

use anyhow::{Context, Result};

const ENV_ADDR: &str = "RSSDEPOT_ADDR";
const ENV_RELAY: &str = "FLARESOLVERR_URL";
const ENV_REFRESH: &str = "RSSDEPOT_REFRESH_SECS";

const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_RELAY: &str = "http://localhost:8191/v1";
const DEFAULT_REFRESH_SECS: u64 = 900;

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub relay_url: String,
    pub refresh_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let addr = std::env::var(ENV_ADDR)
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse()
            .with_context(|| format!("parsing {ENV_ADDR}"))?;

        let relay_url = std::env::var(ENV_RELAY).unwrap_or_else(|_| DEFAULT_RELAY.to_string());

        let refresh_secs = match std::env::var(ENV_REFRESH) {
            Ok(v) => v
                .parse()
                .with_context(|| format!("parsing {ENV_REFRESH}"))?,
            Err(_) => DEFAULT_REFRESH_SECS,
        };

        Ok(Self {
            addr,
            relay_url,
            refresh_secs,
        })
    }
}
