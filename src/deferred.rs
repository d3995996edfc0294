use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Vertical extent of an element or viewport, in document pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self {
            top,
            height: height.max(0.0),
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn expanded(&self, margin: f64) -> Self {
        Self::new(self.top - margin, self.height + 2.0 * margin)
    }
}

/// Share of `element` inside `viewport` after growing the viewport by
/// `margin` on both edges.
pub fn intersection_ratio(element: Rect, viewport: Rect, margin: f64) -> f64 {
    let root = viewport.expanded(margin);
    let overlap = element.bottom().min(root.bottom()) - element.top.max(root.top);
    if element.height == 0.0 {
        return if element.top >= root.top && element.top <= root.bottom() {
            1.0
        } else {
            0.0
        };
    }
    (overlap / element.height).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserveOptions {
    pub root_margin_px: f64,
    pub threshold: f64,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            root_margin_px: 100.0,
            threshold: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservationId(pub u64);

/// Platform hook that reports viewport intersections for watched elements.
pub trait ViewportObserver {
    fn observe(&mut self, element: Rect, options: ObserveOptions) -> ObservationId;
    fn unobserve(&mut self, id: ObservationId);
}

/// Observer handle shared by every deferred wrapper on a page.
pub type SharedObserver = Rc<RefCell<dyn ViewportObserver>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    Unobserved,
    Observing(ObservationId),
    Visible,
}

pub enum Slot<'a, C> {
    Fallback,
    Children(&'a C),
}

/// Mounts its children the first time the wrapped element nears the
/// viewport and keeps them mounted afterwards.
///
/// `Unobserved -> Observing -> Visible`; `Visible` is terminal and the
/// observation is released on entering it. Dropping the wrapper in any state
/// releases a live observation.
pub struct DeferredMount<F, C> {
    observer: SharedObserver,
    state: VisibilityState,
    options: ObserveOptions,
    factory: Option<F>,
    children: Option<C>,
}

impl<F, C> DeferredMount<F, C>
where
    F: FnOnce() -> C,
{
    pub fn new<O>(observer: &Rc<RefCell<O>>, factory: F) -> Self
    where
        O: ViewportObserver + 'static,
    {
        Self::with_options(observer, factory, ObserveOptions::default())
    }

    pub fn with_options<O>(observer: &Rc<RefCell<O>>, factory: F, options: ObserveOptions) -> Self
    where
        O: ViewportObserver + 'static,
    {
        let observer: SharedObserver = observer.clone();
        Self {
            observer,
            state: VisibilityState::Unobserved,
            options,
            factory: Some(factory),
            children: None,
        }
    }

    pub fn state(&self) -> VisibilityState {
        self.state
    }

    pub fn mount(&mut self, element: Rect) {
        if self.state != VisibilityState::Unobserved {
            return;
        }
        let id = self.observer.borrow_mut().observe(element, self.options);
        self.state = VisibilityState::Observing(id);
    }

    /// Feeds one intersection report. Returns `true` on the transition to
    /// `Visible`.
    pub fn on_intersection(&mut self, id: ObservationId, ratio: f64) -> bool {
        let VisibilityState::Observing(current) = self.state else {
            return false;
        };
        if current != id || ratio <= 0.0 || ratio < self.options.threshold {
            return false;
        }

        self.observer.borrow_mut().unobserve(current);
        self.state = VisibilityState::Visible;
        if let Some(factory) = self.factory.take() {
            self.children = Some(factory());
        }
        true
    }

    pub fn view(&self) -> Slot<'_, C> {
        match &self.children {
            Some(children) => Slot::Children(children),
            None => Slot::Fallback,
        }
    }

    pub fn unmount(self) {
        drop(self);
    }
}

impl<F, C> Drop for DeferredMount<F, C> {
    fn drop(&mut self) {
        let VisibilityState::Observing(id) = self.state else {
            return;
        };
        match self.observer.try_borrow_mut() {
            Ok(mut observer) => observer.unobserve(id),
            Err(_) => tracing::warn!(?id, "viewport observer busy; observation not released"),
        }
        self.state = VisibilityState::Unobserved;
    }
}

/// Window-sized viewport that evaluates watched elements against the
/// current scroll offset.
#[derive(Debug, Clone)]
pub struct Viewport {
    height: f64,
    scroll_y: f64,
    next_id: u64,
    observations: BTreeMap<ObservationId, (Rect, ObserveOptions)>,
}

impl Viewport {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            scroll_y: 0.0,
            next_id: 0,
            observations: BTreeMap::new(),
        }
    }

    pub fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y.max(0.0);
    }

    pub fn active_observations(&self) -> usize {
        self.observations.len()
    }

    /// Ratios for every live observation at the current scroll offset.
    pub fn entries(&self) -> Vec<(ObservationId, f64)> {
        let viewport = Rect::new(self.scroll_y, self.height);
        self.observations
            .iter()
            .map(|(id, (element, options))| {
                (
                    *id,
                    intersection_ratio(*element, viewport, options.root_margin_px),
                )
            })
            .collect()
    }
}

impl ViewportObserver for Viewport {
    fn observe(&mut self, element: Rect, options: ObserveOptions) -> ObservationId {
        self.next_id += 1;
        let id = ObservationId(self.next_id);
        self.observations.insert(id, (element, options));
        id
    }

    fn unobserve(&mut self, id: ObservationId) {
        self.observations.remove(&id);
    }
}
