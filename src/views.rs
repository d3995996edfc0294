use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::{CounterArgs, ViewsCommand};
use crate::config::{SiteConfig, parse_http_url};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterAction {
    Get,
    Increment,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CounterRequest {
    post_id: u64,
    action: CounterAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CounterResponse {
    success: bool,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the remote view counter. Every public operation degrades to a
/// default on failure; nothing here returns an error to the caller.
#[derive(Debug, Clone)]
pub struct ViewCounterClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ViewCounterClient {
    pub fn new(endpoint: Url, timeout: Duration) -> anyhow::Result<Self> {
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            anyhow::bail!("view counter endpoint must be http/https: {endpoint}");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build view counter http client")?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Current count, or `0` when the counter is unreachable.
    pub async fn get(&self, post_id: u64) -> u64 {
        match self.call(post_id, CounterAction::Get).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(post_id, error = %format!("{err:#}"), "view count read failed");
                0
            }
        }
    }

    /// New count after incrementing, or `None` when the call failed.
    pub async fn increment(&self, post_id: u64) -> Option<u64> {
        match self.call(post_id, CounterAction::Increment).await {
            Ok(count) => Some(count),
            Err(err) => {
                tracing::warn!(post_id, error = %format!("{err:#}"), "view count increment failed");
                None
            }
        }
    }

    /// Reads every id concurrently. Each id resolves on its own, so the map
    /// always holds every requested key.
    pub async fn get_many(&self, post_ids: &[u64]) -> BTreeMap<u64, u64> {
        let mut counts: BTreeMap<u64, u64> = post_ids.iter().map(|id| (*id, 0)).collect();

        let mut join_set = tokio::task::JoinSet::new();
        for post_id in counts.keys().copied() {
            let client = self.clone();
            join_set.spawn(async move { (post_id, client.get(post_id).await) });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((post_id, count)) => {
                    counts.insert(post_id, count);
                }
                Err(err) => {
                    tracing::warn!(?err, "view count task failed; keeping default");
                }
            }
        }

        counts
    }

    async fn call(&self, post_id: u64, action: CounterAction) -> anyhow::Result<u64> {
        let body = CounterRequest { post_id, action };
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(USER_AGENT, "habitsite/0.1")
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        let raw = response.text().await.context("read view counter response")?;
        if !status.is_success() {
            anyhow::bail!("view counter error ({status}): {raw}");
        }

        let parsed: CounterResponse =
            serde_json::from_str(&raw).context("parse view counter response")?;
        if !parsed.success {
            let message = parsed.message.unwrap_or_else(|| "no message".to_owned());
            anyhow::bail!("view counter reported failure: {message}");
        }
        parsed
            .view_count
            .ok_or_else(|| anyhow::anyhow!("view counter response is missing viewCount"))
    }
}

pub async fn run(command: ViewsCommand, config: &SiteConfig) -> anyhow::Result<()> {
    match command {
        ViewsCommand::Get(args) => {
            let client = client_for(&args.counter, config)?;
            let counts = client.get_many(&args.ids).await;
            for (post_id, count) in counts {
                println!("{post_id}\t{count}\t{}", format_count(Some(count)));
            }
        }
        ViewsCommand::Increment(args) => {
            let client = client_for(&args.counter, config)?;
            let count = client.increment(args.id).await;
            println!("{}\t{}", args.id, format_count(count));
        }
    }
    Ok(())
}

fn client_for(args: &CounterArgs, config: &SiteConfig) -> anyhow::Result<ViewCounterClient> {
    let endpoint = match args.counter_url.as_deref() {
        Some(raw) => parse_http_url(raw).context("parse --counter-url")?,
        None => config.counter_endpoint.clone(),
    };
    ViewCounterClient::new(endpoint, config.counter_timeout)
}

/// Display string for a view count: `999`, `1.2K`, `3.4M`. `None` renders
/// as `0`.
pub fn format_count(count: Option<u64>) -> String {
    let Some(count) = count else {
        return "0".to_owned();
    };
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        // Below 1,000 there is no digit grouping in any supported locale.
        count.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewCountState {
    #[default]
    NotLoaded,
    Loaded(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewCountTicket(u64);

/// Holds the count shown by one view. Results for requests started before
/// the latest `begin`, or arriving after `unmount`, are discarded.
#[derive(Debug, Clone)]
pub struct ViewCountCell {
    state: ViewCountState,
    generation: u64,
    mounted: bool,
}

impl Default for ViewCountCell {
    fn default() -> Self {
        Self {
            state: ViewCountState::NotLoaded,
            generation: 0,
            mounted: true,
        }
    }
}

impl ViewCountCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> ViewCountTicket {
        self.generation += 1;
        ViewCountTicket(self.generation)
    }

    /// Returns whether the value was accepted.
    pub fn apply(&mut self, ticket: ViewCountTicket, count: u64) -> bool {
        if !self.mounted || ticket.0 != self.generation {
            tracing::debug!(
                ticket = ticket.0,
                generation = self.generation,
                mounted = self.mounted,
                "discarding stale view count"
            );
            return false;
        }
        self.state = ViewCountState::Loaded(count);
        true
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    pub fn state(&self) -> ViewCountState {
        self.state
    }

    pub fn display(&self) -> String {
        match self.state {
            ViewCountState::NotLoaded => format_count(None),
            ViewCountState::Loaded(count) => format_count(Some(count)),
        }
    }
}
