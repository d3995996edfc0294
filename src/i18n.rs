use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context as _;

use crate::locale::Locale;

/// Locale-keyed message tables. Lookups never fail: a missing key falls back
/// to English and then to the key itself.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    messages: BTreeMap<Locale, HashMap<String, String>>,
}

impl Translations {
    pub fn new(messages: BTreeMap<Locale, HashMap<String, String>>) -> Self {
        Self { messages }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read translations: {}", path.display()))?;
        let messages = serde_yaml::from_str(&raw).context("parse translations yaml")?;
        Ok(Self { messages })
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        self.messages
            .get(&locale)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }

    pub fn t<'a>(&'a self, locale: Locale, key: &'a str) -> Cow<'a, str> {
        if let Some(text) = self.lookup(locale, key) {
            return Cow::Borrowed(text);
        }
        if let Some(text) = self.lookup(Locale::En, key) {
            tracing::debug!(key, locale = %locale, "missing translation; using english");
            return Cow::Borrowed(text);
        }
        tracing::debug!(key, locale = %locale, "missing translation key");
        Cow::Borrowed(key)
    }

    pub fn t_or<'a>(&'a self, locale: Locale, key: &str, fallback: &'a str) -> Cow<'a, str> {
        match self.lookup(locale, key) {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Borrowed(fallback),
        }
    }
}
