use std::fmt::Write as _;

use anyhow::Context as _;
use url::Url;

use crate::locale::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetaAttr {
    Name,
    Property,
}

impl MetaAttr {
    fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Property => "property",
        }
    }
}

/// Identity of one head element. Two elements with the same key are the
/// same element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadKey {
    Title,
    Meta { attr: MetaAttr, key: String },
    Link { rel: String, hreflang: Option<String> },
}

impl HeadKey {
    pub fn name(key: &str) -> Self {
        Self::Meta {
            attr: MetaAttr::Name,
            key: key.to_owned(),
        }
    }

    pub fn property(key: &str) -> Self {
        Self::Meta {
            attr: MetaAttr::Property,
            key: key.to_owned(),
        }
    }

    pub fn canonical() -> Self {
        Self::Link {
            rel: "canonical".to_owned(),
            hreflang: None,
        }
    }

    pub fn alternate(hreflang: &str) -> Self {
        Self::Link {
            rel: "alternate".to_owned(),
            hreflang: Some(hreflang.to_owned()),
        }
    }
}

/// Upsert-by-key access to the shared document head. Only
/// [`HeadSynchronizer`] writes through this. Both calls report whether the
/// head actually changed.
pub trait DocumentHead {
    fn upsert(&mut self, key: &HeadKey, value: &str) -> anyhow::Result<bool>;
    fn remove(&mut self, key: &HeadKey) -> anyhow::Result<bool>;
}

/// Head kept in memory in document order.
#[derive(Debug, Clone, Default)]
pub struct MemoryHead {
    elements: Vec<(HeadKey, String)>,
}

impl MemoryHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &HeadKey) -> Option<&str> {
        self.elements
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn count(&self, key: &HeadKey) -> usize {
        self.elements.iter().filter(|(k, _)| k == key).count()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn render_html(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.elements {
            let value = escape_html(value);
            let _ = match key {
                HeadKey::Title => writeln!(out, "<title>{value}</title>"),
                HeadKey::Meta { attr, key } => writeln!(
                    out,
                    r#"<meta {}="{}" content="{value}">"#,
                    attr.as_str(),
                    escape_html(key)
                ),
                HeadKey::Link {
                    rel,
                    hreflang: Some(lang),
                } => writeln!(
                    out,
                    r#"<link rel="{}" hreflang="{}" href="{value}">"#,
                    escape_html(rel),
                    escape_html(lang)
                ),
                HeadKey::Link { rel, hreflang: None } => {
                    writeln!(out, r#"<link rel="{}" href="{value}">"#, escape_html(rel))
                }
            };
        }
        out
    }
}

impl DocumentHead for MemoryHead {
    fn upsert(&mut self, key: &HeadKey, value: &str) -> anyhow::Result<bool> {
        match self.elements.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) if existing == value => Ok(false),
            Some((_, existing)) => {
                value.clone_into(existing);
                Ok(true)
            }
            None => {
                self.elements.push((key.clone(), value.to_owned()));
                Ok(true)
            }
        }
    }

    fn remove(&mut self, key: &HeadKey) -> anyhow::Result<bool> {
        let before = self.elements.len();
        self.elements.retain(|(k, _)| k != key);
        Ok(self.elements.len() != before)
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OgType {
    #[default]
    Website,
    Article,
}

impl OgType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Article => "article",
        }
    }
}

/// What a view hands to the synchronizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub keywords: Option<String>,
    pub image: Option<String>,
    pub og_type: OgType,
    pub noindex: bool,
}

/// Fully resolved metadata for the active route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMetadata {
    pub title: String,
    pub description: String,
    pub keywords: Option<String>,
    pub canonical_url: String,
    pub og_image: Option<String>,
    pub og_type: OgType,
    pub locale: Locale,
    pub noindex: bool,
}

impl RouteMetadata {
    pub fn resolve(
        meta: &PageMeta,
        path: &str,
        locale: Locale,
        site_origin: &Url,
    ) -> anyhow::Result<Self> {
        let mut canonical = site_origin
            .join(path)
            .with_context(|| format!("resolve canonical url for path: {path}"))?;
        canonical.set_query(None);
        canonical.set_fragment(None);

        let og_image = match meta.image.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(image) => Some(resolve_image_url(image, site_origin)?),
            None => None,
        };

        Ok(Self {
            title: meta.title.clone(),
            description: meta.description.clone(),
            keywords: meta.keywords.clone().filter(|k| !k.trim().is_empty()),
            canonical_url: canonical.to_string(),
            og_image,
            og_type: meta.og_type,
            locale,
            noindex: meta.noindex,
        })
    }
}

fn resolve_image_url(image: &str, site_origin: &Url) -> anyhow::Result<String> {
    if let Ok(absolute) = Url::parse(image)
        && (absolute.scheme() == "http" || absolute.scheme() == "https")
    {
        return Ok(image.to_owned());
    }
    let resolved = site_origin
        .join(image)
        .with_context(|| format!("resolve image url: {image}"))?;
    Ok(resolved.to_string())
}

pub struct HeadSynchronizer {
    site_origin: Url,
    site_name: String,
    applied: Option<RouteMetadata>,
}

impl HeadSynchronizer {
    pub fn new(site_origin: Url, site_name: impl Into<String>) -> Self {
        Self {
            site_origin,
            site_name: site_name.into(),
            applied: None,
        }
    }

    pub fn applied(&self) -> Option<&RouteMetadata> {
        self.applied.as_ref()
    }

    /// Reconciles the head with the active route. Returns whether the head
    /// changed. Every call is checked against the head itself, so a fresh or
    /// externally edited head is brought back in line even when the metadata
    /// is the same as last time. Without a head (non-browser context) this is
    /// a no-op, and no failure propagates out of here.
    pub fn sync(
        &mut self,
        head: Option<&mut dyn DocumentHead>,
        meta: &PageMeta,
        path: &str,
        locale: Locale,
    ) -> bool {
        let Some(head) = head else {
            tracing::debug!(path, "no document head; skipping metadata sync");
            return false;
        };

        let resolved = match RouteMetadata::resolve(meta, path, locale, &self.site_origin) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), path, "resolve route metadata");
                return false;
            }
        };

        match self.apply(head, &resolved) {
            Ok(changed) => {
                if changed {
                    tracing::debug!(path, locale = %locale, "document head synchronized");
                }
                self.applied = Some(resolved);
                changed
            }
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), path, "apply document head");
                self.applied = None;
                false
            }
        }
    }

    fn apply(&self, head: &mut dyn DocumentHead, meta: &RouteMetadata) -> anyhow::Result<bool> {
        let canonical = meta.canonical_url.as_str();
        let og_image = meta.og_image.as_deref();
        let alternates = [meta.locale.code(), meta.locale.counterpart().code(), "x-default"];
        let mut changed = false;

        changed |= head.upsert(&HeadKey::Title, &meta.title)?;
        changed |= head.upsert(&HeadKey::name("description"), &meta.description)?;
        changed |= upsert_or_remove(head, &HeadKey::name("keywords"), meta.keywords.as_deref())?;

        changed |= head.upsert(&HeadKey::property("og:title"), &meta.title)?;
        changed |= head.upsert(&HeadKey::property("og:description"), &meta.description)?;
        changed |= head.upsert(&HeadKey::property("og:url"), canonical)?;
        changed |= head.upsert(&HeadKey::property("og:type"), meta.og_type.as_str())?;
        changed |= head.upsert(&HeadKey::property("og:site_name"), &self.site_name)?;
        changed |= head.upsert(&HeadKey::property("og:locale"), meta.locale.og_locale())?;
        changed |= upsert_or_remove(head, &HeadKey::property("og:image"), og_image)?;

        changed |= head.upsert(&HeadKey::name("twitter:card"), "summary_large_image")?;
        changed |= head.upsert(&HeadKey::name("twitter:title"), &meta.title)?;
        changed |= head.upsert(&HeadKey::name("twitter:description"), &meta.description)?;
        changed |= upsert_or_remove(head, &HeadKey::name("twitter:image"), og_image)?;

        changed |= head.upsert(&HeadKey::canonical(), canonical)?;
        let robots = if meta.noindex {
            "noindex, nofollow"
        } else {
            "index, follow"
        };
        changed |= head.upsert(&HeadKey::name("robots"), robots)?;

        // Every locale variant points at the same URL until per-locale paths exist.
        for hreflang in alternates {
            changed |= head.upsert(&HeadKey::alternate(hreflang), canonical)?;
        }

        Ok(changed)
    }
}

fn upsert_or_remove(
    head: &mut dyn DocumentHead,
    key: &HeadKey,
    value: Option<&str>,
) -> anyhow::Result<bool> {
    match value {
        Some(value) => head.upsert(key, value),
        None => head.remove(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synchronizer() -> HeadSynchronizer {
        HeadSynchronizer::new(Url::parse("https://habits.example").unwrap(), "Habit Tracker")
    }

    fn meta(title: &str) -> PageMeta {
        PageMeta {
            title: title.to_owned(),
            description: format!("{title} description"),
            ..PageMeta::default()
        }
    }

    struct BrokenHead;

    impl DocumentHead for BrokenHead {
        fn upsert(&mut self, _key: &HeadKey, _value: &str) -> anyhow::Result<bool> {
            anyhow::bail!("head detached")
        }

        fn remove(&mut self, _key: &HeadKey) -> anyhow::Result<bool> {
            anyhow::bail!("head detached")
        }
    }

    #[test]
    fn repeated_sync_never_duplicates_tags() {
        let mut head = MemoryHead::new();
        let mut sync = synchronizer();

        assert!(sync.sync(Some(&mut head), &meta("First"), "/", Locale::En));
        let len_after_first = head.len();
        assert!(sync.sync(Some(&mut head), &meta("Second"), "/", Locale::En));

        assert_eq!(head.len(), len_after_first);
        assert_eq!(head.count(&HeadKey::Title), 1);
        assert_eq!(head.count(&HeadKey::property("og:title")), 1);
        assert_eq!(head.get(&HeadKey::Title), Some("Second"));
        assert_eq!(head.get(&HeadKey::property("og:title")), Some("Second"));
    }

    #[test]
    fn canonical_and_hreflang_share_one_url() {
        let mut head = MemoryHead::new();
        let mut sync = synchronizer();
        sync.sync(Some(&mut head), &meta("Blog"), "/blog?page=2#top", Locale::Ko);

        let canonical = "https://habits.example/blog";
        assert_eq!(head.get(&HeadKey::canonical()), Some(canonical));
        assert_eq!(head.get(&HeadKey::property("og:url")), Some(canonical));
        for lang in ["ko", "en", "x-default"] {
            assert_eq!(head.get(&HeadKey::alternate(lang)), Some(canonical));
        }
        assert_eq!(head.get(&HeadKey::property("og:locale")), Some("ko_KR"));
    }

    #[test]
    fn absent_optional_fields_write_no_tags() {
        let mut head = MemoryHead::new();
        let mut sync = synchronizer();
        sync.sync(Some(&mut head), &meta("Home"), "/", Locale::En);

        assert_eq!(head.count(&HeadKey::name("keywords")), 0);
        assert_eq!(head.count(&HeadKey::property("og:image")), 0);
        assert_eq!(head.count(&HeadKey::name("twitter:image")), 0);
    }

    #[test]
    fn optional_tags_from_previous_route_are_dropped() {
        let mut head = MemoryHead::new();
        let mut sync = synchronizer();
        let with_image = PageMeta {
            image: Some("/images/a.jpg".to_owned()),
            keywords: Some("habits, streaks".to_owned()),
            ..meta("Article")
        };
        sync.sync(Some(&mut head), &with_image, "/blog/a-1", Locale::En);
        assert_eq!(
            head.get(&HeadKey::property("og:image")),
            Some("https://habits.example/images/a.jpg")
        );

        sync.sync(Some(&mut head), &meta("Home"), "/", Locale::En);
        assert_eq!(head.count(&HeadKey::property("og:image")), 0);
        assert_eq!(head.count(&HeadKey::name("keywords")), 0);
    }

    #[test]
    fn absolute_images_pass_through() {
        let resolved = RouteMetadata::resolve(
            &PageMeta {
                image: Some("https://cdn.example/hero.png".to_owned()),
                ..meta("X")
            },
            "/",
            Locale::En,
            &Url::parse("https://habits.example").unwrap(),
        )
        .unwrap();
        assert_eq!(resolved.og_image.as_deref(), Some("https://cdn.example/hero.png"));
    }

    #[test]
    fn noindex_sets_robots() {
        let mut head = MemoryHead::new();
        let mut sync = synchronizer();
        let hidden = PageMeta {
            noindex: true,
            ..meta("Not found")
        };
        sync.sync(Some(&mut head), &hidden, "/blog/missing", Locale::En);
        assert_eq!(head.get(&HeadKey::name("robots")), Some("noindex, nofollow"));
    }

    #[test]
    fn unchanged_input_is_not_reapplied() {
        let mut head = MemoryHead::new();
        let mut sync = synchronizer();
        assert!(sync.sync(Some(&mut head), &meta("Same"), "/", Locale::En));
        assert!(!sync.sync(Some(&mut head), &meta("Same"), "/", Locale::En));
        assert!(sync.sync(Some(&mut head), &meta("Same"), "/", Locale::Ko));
    }

    #[test]
    fn reused_synchronizer_fills_a_fresh_head() {
        let mut sync = synchronizer();
        let mut first = MemoryHead::new();
        assert!(sync.sync(Some(&mut first), &meta("Same"), "/", Locale::En));

        let mut fresh = MemoryHead::new();
        assert!(sync.sync(Some(&mut fresh), &meta("Same"), "/", Locale::En));
        assert_eq!(fresh.get(&HeadKey::Title), Some("Same"));
        assert_eq!(fresh.len(), first.len());
    }

    #[test]
    fn tags_removed_behind_its_back_are_restored() {
        let mut head = MemoryHead::new();
        let mut sync = synchronizer();
        sync.sync(Some(&mut head), &meta("Same"), "/", Locale::En);
        head.remove(&HeadKey::canonical()).unwrap();

        assert!(sync.sync(Some(&mut head), &meta("Same"), "/", Locale::En));
        assert_eq!(
            head.get(&HeadKey::canonical()),
            Some("https://habits.example/")
        );
        assert_eq!(head.count(&HeadKey::canonical()), 1);
    }

    #[test]
    fn missing_head_is_a_no_op() {
        let mut sync = synchronizer();
        assert!(!sync.sync(None, &meta("Anything"), "/", Locale::En));
        assert!(sync.applied().is_none());
    }

    #[test]
    fn failing_head_does_not_propagate() {
        let mut head = BrokenHead;
        let mut sync = synchronizer();
        assert!(!sync.sync(Some(&mut head), &meta("Anything"), "/", Locale::En));
        assert!(sync.applied().is_none());
    }

    #[test]
    fn render_escapes_values() {
        let mut head = MemoryHead::new();
        head.upsert(&HeadKey::Title, "Tips & \"Tricks\" <1>").unwrap();
        head.upsert(&HeadKey::canonical(), "https://habits.example/").unwrap();
        assert_eq!(
            head.render_html(),
            "<title>Tips &amp; &quot;Tricks&quot; &lt;1&gt;</title>\n\
<link rel=\"canonical\" href=\"https://habits.example/\">\n"
        );
    }
}
