use std::time::Duration;

use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Instant positioning.
    Auto,
    Smooth,
}

/// The two elements whose `scroll-behavior` governs window scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRoot {
    Document,
    Body,
}

/// Window scroll state as the controller sees it.
pub trait ScrollSurface {
    fn scroll_behavior(&self, root: ScrollRoot) -> ScrollBehavior;
    fn set_scroll_behavior(&mut self, root: ScrollRoot, behavior: ScrollBehavior);
    fn scroll_to(&mut self, top: f64);
    fn scroll_y(&self) -> f64;
    fn section_offset(&self, section_id: &str) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollIntent {
    Programmatic,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Push,
    /// Browser back/forward.
    Pop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleOrigin {
    HomeSection,
    BlogList,
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDecision {
    JumpToTop,
    /// Leave the position to history scroll restoration.
    Restore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackAction {
    Navigate(Route),
    HistoryBack,
}

/// Article views always open at the top. Other routes start at the top on a
/// push and keep history's position on back/forward.
pub fn decide(to: &Route, kind: NavigationKind) -> ScrollDecision {
    match (to, kind) {
        (Route::BlogPost { .. }, _) => ScrollDecision::JumpToTop,
        (_, NavigationKind::Pop) => ScrollDecision::Restore,
        (_, NavigationKind::Push) => ScrollDecision::JumpToTop,
    }
}

#[derive(Debug, Clone)]
pub struct ScrollConfig {
    pub home_section_id: String,
    pub home_section_delay: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            home_section_id: "blog".to_owned(),
            home_section_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SavedBehavior {
    document: ScrollBehavior,
    body: ScrollBehavior,
}

#[derive(Debug, Clone)]
struct PendingScroll {
    due: Duration,
    section_id: String,
}

/// Owns the window scroll position during programmatic corrections.
///
/// Programmatic jumps force instant behavior on both scroll roots and hand
/// the previous behavior back on the next animation frame; the host drives
/// frames with [`ScrollController::on_animation_frame`] and time with
/// [`ScrollController::advance`].
#[derive(Debug)]
pub struct ScrollController {
    config: ScrollConfig,
    now: Duration,
    saved: Option<SavedBehavior>,
    pending: Vec<PendingScroll>,
    current: Option<Route>,
    article_origin: Option<ArticleOrigin>,
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::new(ScrollConfig::default())
    }
}

impl ScrollController {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            now: Duration::ZERO,
            saved: None,
            pending: Vec::new(),
            current: None,
            article_origin: None,
        }
    }

    pub fn article_origin(&self) -> Option<ArticleOrigin> {
        self.article_origin
    }

    pub fn is_overriding(&self) -> bool {
        self.saved.is_some()
    }

    pub fn scroll(&mut self, surface: &mut dyn ScrollSurface, top: f64, intent: ScrollIntent) {
        match intent {
            ScrollIntent::Programmatic => self.jump_to(surface, top),
            ScrollIntent::User => surface.scroll_to(top),
        }
    }

    pub fn jump_to_top(&mut self, surface: &mut dyn ScrollSurface) {
        self.jump_to(surface, 0.0);
    }

    pub fn jump_to(&mut self, surface: &mut dyn ScrollSurface, top: f64) {
        // A jump during an open override keeps the first saved values so the
        // user's preference is what comes back.
        if self.saved.is_none() {
            self.saved = Some(SavedBehavior {
                document: surface.scroll_behavior(ScrollRoot::Document),
                body: surface.scroll_behavior(ScrollRoot::Body),
            });
        }
        surface.set_scroll_behavior(ScrollRoot::Document, ScrollBehavior::Auto);
        surface.set_scroll_behavior(ScrollRoot::Body, ScrollBehavior::Auto);
        surface.scroll_to(top);
        tracing::trace!(top, "programmatic scroll");
    }

    pub fn on_animation_frame(&mut self, surface: &mut dyn ScrollSurface) {
        if let Some(saved) = self.saved.take() {
            surface.set_scroll_behavior(ScrollRoot::Document, saved.document);
            surface.set_scroll_behavior(ScrollRoot::Body, saved.body);
        }
    }

    /// Moves the controller clock forward and runs deferred section jumps
    /// that have come due.
    pub fn advance(&mut self, surface: &mut dyn ScrollSurface, elapsed: Duration) {
        self.now += elapsed;
        let now = self.now;
        let (due, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|p| p.due <= now);
        self.pending = waiting;

        for scroll in due {
            match surface.section_offset(&scroll.section_id) {
                Some(offset) => self.jump_to(surface, offset),
                None => {
                    tracing::debug!(section = %scroll.section_id, "scroll target section not mounted");
                }
            }
        }
    }

    /// Applies the scroll policy for a completed route change.
    pub fn on_navigate(
        &mut self,
        surface: &mut dyn ScrollSurface,
        to: Route,
        kind: NavigationKind,
    ) -> ScrollDecision {
        let from = self.current.take();
        let decision = decide(&to, kind);

        // Section jumps only belong to the home view they were queued for.
        if to != Route::Home && !self.pending.is_empty() {
            tracing::debug!(
                to = %to.path(),
                dropped = self.pending.len(),
                "cancelling pending section scroll"
            );
            self.pending.clear();
        }

        if to.is_article() && kind == NavigationKind::Push {
            self.article_origin = Some(match from {
                Some(Route::Home) => ArticleOrigin::HomeSection,
                Some(Route::BlogList) => ArticleOrigin::BlogList,
                _ => ArticleOrigin::Direct,
            });
        }

        if decision == ScrollDecision::JumpToTop {
            self.jump_to_top(surface);
        }
        tracing::debug!(to = %to.path(), ?kind, ?decision, "navigation scroll");
        self.current = Some(to);
        decision
    }

    /// "Back" from an article. Articles opened from the home page's embedded
    /// list return to that section once the home view has mounted.
    pub fn back_from_article(&mut self) -> BackAction {
        match self.article_origin.take() {
            Some(ArticleOrigin::HomeSection) => {
                self.pending.push(PendingScroll {
                    due: self.now + self.config.home_section_delay,
                    section_id: self.config.home_section_id.clone(),
                });
                BackAction::Navigate(Route::Home)
            }
            Some(ArticleOrigin::BlogList) => BackAction::HistoryBack,
            Some(ArticleOrigin::Direct) | None => BackAction::Navigate(Route::BlogList),
        }
    }
}
