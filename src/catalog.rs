use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Context as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::slug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<Locale, String>);

impl LocalizedText {
    pub fn new(entries: impl IntoIterator<Item = (Locale, String)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Text for `locale`, then English, then whatever translation exists.
    pub fn get(&self, locale: Locale) -> &str {
        self.0
            .get(&locale)
            .or_else(|| self.0.get(&Locale::En))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn has(&self, locale: Locale) -> bool {
        self.0.contains_key(&locale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Habits,
    Productivity,
    Wellness,
    Mindfulness,
    Updates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub title: LocalizedText,
    pub excerpt: LocalizedText,
    #[serde(default)]
    pub body: LocalizedText,
    pub category: Category,
    pub published_at: NaiveDate,
    pub read_time: LocalizedText,
    pub hero_image: String,
    #[serde(default)]
    pub featured: bool,
}

impl Document {
    pub fn canonical_slug(&self, locale: Locale) -> String {
        slug::encode(self.title.get(locale), self.id, locale)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlugResolution<'a> {
    Canonical(&'a Document),
    /// The id resolved but the incoming slug is not the canonical spelling.
    Redirect {
        document: &'a Document,
        canonical_slug: String,
    },
    NotFound,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    documents: Vec<Document>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    documents: Vec<Document>,
}

impl ContentCatalog {
    pub fn new(documents: Vec<Document>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for document in &documents {
            if !seen.insert(document.id) {
                anyhow::bail!("duplicate document id in catalog: {}", document.id);
            }
        }
        Ok(Self { documents })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read content catalog: {}", path.display()))?;
        let file: CatalogFile = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw).context("parse content catalog json")?,
            _ => serde_yaml::from_str(&raw).context("parse content catalog yaml")?,
        };
        tracing::debug!(
            path = %path.display(),
            documents = file.documents.len(),
            "loaded content catalog"
        );
        Self::new(file.documents)
    }

    pub fn get(&self, id: u64) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// All documents, newest first; ties keep the higher id first.
    pub fn list(&self) -> Vec<&Document> {
        let mut out = self.documents.iter().collect::<Vec<_>>();
        out.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        out
    }

    pub fn featured(&self) -> Vec<&Document> {
        self.list().into_iter().filter(|d| d.featured).collect()
    }

    pub fn resolve(&self, incoming: &str, locale: Locale) -> SlugResolution<'_> {
        let Some(id) = slug::decode(incoming) else {
            tracing::debug!(slug = incoming, "slug has no numeric id suffix");
            return SlugResolution::NotFound;
        };
        let Some(document) = self.get(id) else {
            tracing::debug!(slug = incoming, id, "slug id has no matching document");
            return SlugResolution::NotFound;
        };

        let canonical_slug = document.canonical_slug(locale);
        if canonical_slug == incoming {
            SlugResolution::Canonical(document)
        } else {
            SlugResolution::Redirect {
                document,
                canonical_slug,
            }
        }
    }
}
