// src/fetch.rs
//
// One call, two retrieval strategies: a plain GET for cooperative sites, a
// POST through the anti-bot relay for the rest. No retries here — retry
// policy belongs to the scheduler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::types::{AccessMode, FeedSource};

const DIRECT_TIMEOUT: Duration = Duration::from_secs(30);
// The relay needs time to spin up a browser and pass the challenge.
const RELAY_TIMEOUT: Duration = Duration::from_secs(90);
const RELAY_SOLVE_BUDGET_MS: u64 = 60_000;

pub struct FetchGateway {
    client: reqwest::Client,
    relay_url: String,
}

#[derive(Serialize)]
struct SolveRequest<'a> {
    cmd: &'static str,
    url: &'a str,
    #[serde(rename = "maxTimeout")]
    max_timeout: u64,
}

#[derive(Deserialize)]
struct SolveResponse {
    solution: Option<Solution>,
}

#[derive(Deserialize)]
struct Solution {
    response: Option<String>,
}

impl FetchGateway {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url: relay_url.into(),
        }
    }

    /// Fetch a source's raw payload according to its access mode.
    pub async fn fetch(&self, source: &FeedSource) -> Result<String, FeedError> {
        match source.access {
            AccessMode::Direct => self.fetch_url(source.fetch_url).await,
            AccessMode::Proxied => self.fetch_via_relay(source.fetch_url).await,
        }
    }

    /// Direct GET. Also used by extractors that make secondary per-article
    /// fetches.
    pub async fn fetch_url(&self, url: &str) -> Result<String, FeedError> {
        let resp = self
            .client
            .get(url)
            .timeout(DIRECT_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FeedError::SourceUnavailable(e.to_string()))?;
        resp.text()
            .await
            .map_err(|e| FeedError::SourceUnavailable(e.to_string()))
    }

    /// Ask the relay to solve the page and hand back the body. A transport
    /// failure talking to the relay is infrastructure trouble, not the
    /// target site being down, and is reported as such.
    async fn fetch_via_relay(&self, target: &str) -> Result<String, FeedError> {
        let req = SolveRequest {
            cmd: "request.get",
            url: target,
            max_timeout: RELAY_SOLVE_BUDGET_MS,
        };
        let resp = self
            .client
            .post(&self.relay_url)
            .timeout(RELAY_TIMEOUT)
            .json(&req)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FeedError::RelayUnavailable(e.to_string()))?;

        let envelope: SolveResponse = resp
            .json()
            .await
            .map_err(|e| FeedError::MalformedPayload(format!("relay envelope: {e}")))?;

        envelope
            .solution
            .and_then(|s| s.response)
            .ok_or_else(|| {
                FeedError::MalformedPayload("relay envelope missing solution.response".to_string())
            })
    }
}
