use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

pub const DEFAULT_SITE_ORIGIN: &str = "https://habitracker.app";
pub const DEFAULT_SITE_NAME: &str = "Habit Tracker";
pub const DEFAULT_COUNTER_URL: &str = "https://habitracker.app/api/views";
pub const DEFAULT_COUNTER_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_LOCALE_STATE: &str = ".habitsite/locale.json";

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site_origin: Url,
    pub site_name: String,
    pub counter_endpoint: Url,
    pub counter_timeout: Duration,
    pub locale_state_path: PathBuf,
}

impl SiteConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_origin = var("HABITSITE_SITE_ORIGIN").unwrap_or_else(|| DEFAULT_SITE_ORIGIN.to_owned());
        let site_origin = parse_http_url(&raw_origin)
            .with_context(|| format!("invalid HABITSITE_SITE_ORIGIN={raw_origin:?}"))?;

        let raw_counter =
            var("HABITSITE_VIEW_COUNTER_URL").unwrap_or_else(|| DEFAULT_COUNTER_URL.to_owned());
        let counter_endpoint = parse_http_url(&raw_counter)
            .with_context(|| format!("invalid HABITSITE_VIEW_COUNTER_URL={raw_counter:?}"))?;

        let counter_timeout = match var("HABITSITE_VIEW_COUNTER_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().with_context(|| {
                    format!("invalid HABITSITE_VIEW_COUNTER_TIMEOUT_MS={raw:?}")
                })?;
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(DEFAULT_COUNTER_TIMEOUT_MS),
        };

        Ok(Self {
            site_origin,
            site_name: var("HABITSITE_SITE_NAME").unwrap_or_else(|| DEFAULT_SITE_NAME.to_owned()),
            counter_endpoint,
            counter_timeout,
            locale_state_path: var("HABITSITE_LOCALE_STATE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCALE_STATE)),
        })
    }
}

pub fn parse_http_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).context("parse url")?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("url must be http/https: {url}");
    }
    Ok(url)
}
