use std::collections::HashMap;

use habitsite::scroll::{ScrollBehavior, ScrollRoot, ScrollSurface};

/// Window whose smooth scrolls move a fixed distance per frame, the way a
/// browser animates `scroll-behavior: smooth`.
pub struct AnimatedWindow {
    document: ScrollBehavior,
    body: ScrollBehavior,
    y: f64,
    target: Option<f64>,
    step_per_frame: f64,
    sections: HashMap<String, f64>,
}

impl AnimatedWindow {
    pub fn new(step_per_frame: f64) -> Self {
        Self {
            document: ScrollBehavior::Smooth,
            body: ScrollBehavior::Smooth,
            y: 0.0,
            target: None,
            step_per_frame,
            sections: HashMap::new(),
        }
    }

    pub fn with_section(mut self, id: &str, offset: f64) -> Self {
        self.sections.insert(id.to_owned(), offset);
        self
    }

    pub fn is_animating(&self) -> bool {
        self.target.is_some()
    }

    pub fn set_position(&mut self, y: f64) {
        self.y = y;
        self.target = None;
    }

    pub fn frame(&mut self) {
        let Some(target) = self.target else {
            return;
        };
        let delta = target - self.y;
        if delta.abs() <= self.step_per_frame {
            self.y = target;
            self.target = None;
        } else {
            self.y += self.step_per_frame * delta.signum();
        }
    }
}

impl ScrollSurface for AnimatedWindow {
    fn scroll_behavior(&self, root: ScrollRoot) -> ScrollBehavior {
        match root {
            ScrollRoot::Document => self.document,
            ScrollRoot::Body => self.body,
        }
    }

    fn set_scroll_behavior(&mut self, root: ScrollRoot, behavior: ScrollBehavior) {
        match root {
            ScrollRoot::Document => self.document = behavior,
            ScrollRoot::Body => self.body = behavior,
        }
    }

    fn scroll_to(&mut self, top: f64) {
        let smooth = self.document == ScrollBehavior::Smooth || self.body == ScrollBehavior::Smooth;
        if smooth {
            self.target = Some(top);
        } else {
            self.y = top;
            self.target = None;
        }
    }

    fn scroll_y(&self) -> f64 {
        self.y
    }

    fn section_offset(&self, section_id: &str) -> Option<f64> {
        self.sections.get(section_id).copied()
    }
}
