use std::path::PathBuf;

use anyhow::Context as _;

use crate::catalog::{ContentCatalog, Document, SlugResolution};
use crate::cli::HeadArgs;
use crate::config::{SiteConfig, parse_http_url};
use crate::head::{HeadSynchronizer, MemoryHead, OgType, PageMeta};
use crate::i18n::Translations;
use crate::locale::{FileLocaleStore, Locale, LocaleContext};
use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Found,
    /// The article exists under a different canonical slug.
    Moved,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    pub status: PageStatus,
    pub canonical_path: String,
    pub meta: PageMeta,
    pub post_id: Option<u64>,
}

/// Renders the reconciled head for one route as HTML.
pub fn run(args: HeadArgs, config: &SiteConfig) -> anyhow::Result<()> {
    let catalog = ContentCatalog::load(&PathBuf::from(&args.catalog)).context("load catalog")?;
    let translations = match args.translations.as_deref() {
        Some(path) => Translations::load(&PathBuf::from(path)).context("load translations")?,
        None => Translations::default(),
    };
    let site_origin = match args.site_origin.as_deref() {
        Some(raw) => parse_http_url(raw).context("parse --site-origin")?,
        None => config.site_origin.clone(),
    };
    let locale = match args.locale {
        Some(locale) => locale,
        None => LocaleContext::init(FileLocaleStore::new(&config.locale_state_path)).current(),
    };

    let route = Route::parse(&args.path);
    let page = resolve_page(&route, locale, &catalog, &translations);
    match page.status {
        PageStatus::Found => {}
        PageStatus::Moved => {
            tracing::info!(from = %args.path, to = %page.canonical_path, "non-canonical article path");
        }
        PageStatus::NotFound => tracing::warn!(path = %args.path, "content not found"),
    }

    let mut head = MemoryHead::new();
    let mut synchronizer = HeadSynchronizer::new(site_origin, config.site_name.clone());
    synchronizer.sync(Some(&mut head), &page.meta, &page.canonical_path, locale);
    print!("{}", head.render_html());
    Ok(())
}

pub fn resolve_page(
    route: &Route,
    locale: Locale,
    catalog: &ContentCatalog,
    translations: &Translations,
) -> ResolvedPage {
    let t = |key: &'static str| translations.t(locale, key).into_owned();

    match route {
        Route::Home => found(
            route,
            PageMeta {
                title: t("home.meta.title"),
                description: t("home.meta.description"),
                keywords: Some(t("home.meta.keywords")),
                image: Some("/og-image.png".to_owned()),
                ..PageMeta::default()
            },
        ),
        Route::BlogList => found(
            route,
            PageMeta {
                title: t("blog.meta.title"),
                description: t("blog.meta.description"),
                keywords: Some(t("blog.meta.keywords")),
                ..PageMeta::default()
            },
        ),
        Route::BlogPost { slug } => match catalog.resolve(slug, locale) {
            SlugResolution::Canonical(document) => ResolvedPage {
                status: PageStatus::Found,
                canonical_path: route.path(),
                meta: article_meta(document, locale),
                post_id: Some(document.id),
            },
            SlugResolution::Redirect {
                document,
                canonical_slug,
            } => ResolvedPage {
                status: PageStatus::Moved,
                canonical_path: Route::BlogPost {
                    slug: canonical_slug,
                }
                .path(),
                meta: article_meta(document, locale),
                post_id: Some(document.id),
            },
            SlugResolution::NotFound => not_found(route, locale, translations),
        },
        Route::Habit { name } => {
            let title_key = format!("habits.{name}.title");
            let description_key = format!("habits.{name}.description");
            found(
                route,
                PageMeta {
                    title: translations.t_or(locale, &title_key, name).into_owned(),
                    description: translations
                        .t_or(locale, &description_key, &t("home.meta.description"))
                        .into_owned(),
                    ..PageMeta::default()
                },
            )
        }
        Route::Static { path } => {
            let key = format!("pages.{}.title", path.trim_start_matches('/').replace('/', "."));
            found(
                route,
                PageMeta {
                    title: translations
                        .t_or(locale, &key, &t("home.meta.title"))
                        .into_owned(),
                    description: t("home.meta.description"),
                    ..PageMeta::default()
                },
            )
        }
    }
}

fn found(route: &Route, meta: PageMeta) -> ResolvedPage {
    ResolvedPage {
        status: PageStatus::Found,
        canonical_path: route.path(),
        meta,
        post_id: None,
    }
}

fn not_found(route: &Route, locale: Locale, translations: &Translations) -> ResolvedPage {
    ResolvedPage {
        status: PageStatus::NotFound,
        canonical_path: route.path(),
        meta: PageMeta {
            title: translations
                .t_or(locale, "notFound.title", "Post not found")
                .into_owned(),
            description: translations
                .t_or(locale, "notFound.description", "This post does not exist.")
                .into_owned(),
            noindex: true,
            ..PageMeta::default()
        },
        post_id: None,
    }
}

fn article_meta(document: &Document, locale: Locale) -> PageMeta {
    PageMeta {
        title: document.title.get(locale).to_owned(),
        description: document.excerpt.get(locale).to_owned(),
        keywords: None,
        image: Some(document.hero_image.clone()),
        og_type: OgType::Article,
        noindex: false,
    }
}
