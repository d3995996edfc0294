use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::cli::LocaleCommand;
use crate::config::SiteConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ko];

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let lower = raw.trim().to_ascii_lowercase();
        let primary = lower.split(['-', '_']).next().unwrap_or_default();
        match primary {
            "en" => Ok(Self::En),
            "ko" => Ok(Self::Ko),
            other => anyhow::bail!("unsupported locale: {other:?} (expected one of: en, ko)"),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ko => "ko",
        }
    }

    /// The other locale the site is published in.
    pub fn counterpart(self) -> Self {
        match self {
            Self::En => Self::Ko,
            Self::Ko => Self::En,
        }
    }

    pub fn og_locale(self) -> &'static str {
        match self {
            Self::En => "en_US",
            Self::Ko => "ko_KR",
        }
    }

    pub fn is_latin(self) -> bool {
        matches!(self, Self::En)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

pub trait LocaleStore {
    fn load(&self) -> anyhow::Result<Option<Locale>>;
    fn save(&self, locale: Locale) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedLocale {
    locale: String,
}

#[derive(Debug, Clone)]
pub struct FileLocaleStore {
    path: PathBuf,
}

impl FileLocaleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocaleStore for FileLocaleStore {
    fn load(&self) -> anyhow::Result<Option<Locale>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read locale state: {}", self.path.display()));
            }
        };
        let persisted: PersistedLocale =
            serde_json::from_str(&raw).context("parse locale state json")?;
        Locale::parse(&persisted.locale).map(Some)
    }

    fn save(&self, locale: Locale) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create locale state dir: {}", parent.display()))?;
        }
        let persisted = PersistedLocale {
            locale: locale.code().to_owned(),
        };
        let json = serde_json::to_string(&persisted).context("serialize locale state")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("write locale state: {}", self.path.display()))?;
        Ok(())
    }
}

/// Active locale, read once at startup and persisted on every change.
pub struct LocaleContext<S> {
    store: S,
    current: Locale,
}

impl<S: LocaleStore> LocaleContext<S> {
    pub fn init(store: S) -> Self {
        let current = match store.load() {
            Ok(Some(locale)) => locale,
            Ok(None) => Locale::default(),
            Err(err) => {
                tracing::warn!(?err, "failed to read persisted locale; using default");
                Locale::default()
            }
        };
        tracing::debug!(locale = %current, "locale context initialized");
        Self { store, current }
    }

    pub fn current(&self) -> Locale {
        self.current
    }

    pub fn set(&mut self, locale: Locale) {
        self.current = locale;
        if let Err(err) = self.store.save(locale) {
            tracing::warn!(?err, locale = %locale, "failed to persist locale");
        }
    }

    pub fn toggle(&mut self) -> Locale {
        let next = self.current.counterpart();
        self.set(next);
        next
    }
}

pub fn run(command: LocaleCommand, config: &SiteConfig) -> anyhow::Result<()> {
    let store = FileLocaleStore::new(&config.locale_state_path);
    match command {
        LocaleCommand::Show => {
            let context = LocaleContext::init(store);
            println!("{}", context.current());
        }
        LocaleCommand::Set(args) => {
            // Unlike `LocaleContext::set`, a failed write here is the whole job.
            store.save(args.locale).context("persist locale")?;
            println!("{}", args.locale);
        }
    }
    Ok(())
}
