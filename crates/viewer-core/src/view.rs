//! Current page and zoom of one view.

use crate::geometry::{ViewTransform, Viewport};
use doc_model::PageSize;

/// Horizontal margin kept free by fit-to-width, in device pixels.
pub const FIT_WIDTH_MARGIN: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ZoomLimits {
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min, self.max)
    }

    pub fn contains(&self, zoom: f32) -> bool {
        zoom >= self.min && zoom <= self.max
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.25, max: 3.0, step: 0.1 }
    }
}

/// Rounds away accumulated float error from repeated stepping.
fn snap(zoom: f32) -> f32 {
    (zoom * 1000.0).round() / 1000.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    page_count: u32,
    current_page: u32,
    zoom: f32,
    limits: ZoomLimits,
    viewport: Option<Viewport>,
}

impl ViewState {
    pub fn new(page_count: u32, limits: ZoomLimits) -> Self {
        Self { page_count, current_page: 0, zoom: limits.clamp(1.0), limits, viewport: None }
    }

    /// Start at `zoom`, clamped into the limits.
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        if zoom.is_finite() {
            self.zoom = self.limits.clamp(zoom);
        }
        self
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Option<Viewport>) {
        self.viewport = viewport;
    }

    /// Placement of the current page, or `None` before a viewport is known.
    pub fn transform(&self, page: PageSize) -> Option<ViewTransform> {
        self.viewport.map(|viewport| ViewTransform::centered(viewport, page, self.zoom))
    }

    /// Move to `page`. Returns false, changing nothing, when out of range.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page >= self.page_count {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        match self.current_page.checked_add(1) {
            Some(page) => self.go_to(page),
            None => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.current_page.checked_sub(1) {
            Some(page) => self.go_to(page),
            None => false,
        }
    }

    /// Returns whether the zoom changed.
    pub fn zoom_in(&mut self) -> bool {
        self.apply_zoom(snap(self.zoom + self.limits.step))
    }

    pub fn zoom_out(&mut self) -> bool {
        self.apply_zoom(snap(self.zoom - self.limits.step))
    }

    /// Set an explicit zoom. Values outside the limits are refused.
    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        if !zoom.is_finite() || !self.limits.contains(zoom) {
            return false;
        }
        self.apply_zoom(zoom)
    }

    pub fn actual_size(&mut self) -> bool {
        self.set_zoom(1.0)
    }

    /// Zoom so `page_width` fills `viewport_width` minus the margin.
    pub fn fit_to_width(&mut self, viewport_width: f32, page_width: f32) -> bool {
        if page_width <= 0.0 || !viewport_width.is_finite() {
            return false;
        }
        self.apply_zoom((viewport_width - FIT_WIDTH_MARGIN) / page_width)
    }

    fn apply_zoom(&mut self, zoom: f32) -> bool {
        let zoom = self.limits.clamp(zoom);
        if (zoom - self.zoom).abs() < f32::EPSILON {
            return false;
        }
        log::debug!("zoom {:.3} -> {:.3}", self.zoom, zoom);
        self.zoom = zoom;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_to_is_bounds_checked() {
        let mut view = ViewState::new(3, ZoomLimits::default());

        assert!(view.go_to(2));
        assert_eq!(view.current_page(), 2);
        assert!(!view.go_to(3));
        assert_eq!(view.current_page(), 2);
        assert!(!view.next_page());
        assert!(view.previous_page());
        assert!(view.previous_page());
        assert!(!view.previous_page());
        assert_eq!(view.current_page(), 0);
    }

    #[test]
    fn zoom_in_stops_at_the_upper_bound() {
        let limits = ZoomLimits { min: 0.25, max: 1.3, step: 0.1 };
        let mut view = ViewState::new(1, limits);

        let changes: Vec<bool> = (0..5).map(|_| view.zoom_in()).collect();

        assert_eq!(view.zoom(), 1.3);
        assert_eq!(changes, vec![true, true, true, false, false]);
    }

    #[test]
    fn zoom_out_clamps_to_the_lower_bound() {
        let mut view = ViewState::new(1, ZoomLimits::default()).with_zoom(0.3);

        assert!(view.zoom_out());
        assert_eq!(view.zoom(), 0.25);
        assert!(!view.zoom_out());
    }

    #[test]
    fn set_zoom_refuses_values_outside_the_limits() {
        let mut view = ViewState::new(1, ZoomLimits::default());

        assert!(!view.set_zoom(5.0));
        assert!(!view.set_zoom(f32::NAN));
        assert!(view.set_zoom(2.0));
        assert_eq!(view.zoom(), 2.0);
        assert!(view.actual_size());
        assert_eq!(view.zoom(), 1.0);
    }

    #[test]
    fn fit_to_width_leaves_a_margin_and_clamps() {
        let mut view = ViewState::new(1, ZoomLimits::default());

        assert!(view.fit_to_width(1244.0, 612.0));
        assert!((view.zoom() - 2.0).abs() < 1e-6);

        assert!(view.fit_to_width(100_000.0, 612.0));
        assert_eq!(view.zoom(), 3.0);

        assert!(!view.fit_to_width(800.0, 0.0));
    }

    #[test]
    fn transform_requires_a_viewport() {
        let mut view = ViewState::new(1, ZoomLimits::default());
        assert!(view.transform(PageSize::default()).is_none());

        view.set_viewport(Some(Viewport::new(812.0, 600.0)));
        let transform = view.transform(PageSize::default()).expect("viewport is set");
        assert_eq!(transform.offset.x, 100.0);
        assert_eq!(transform.zoom, 1.0);
    }

    #[test]
    fn initial_zoom_is_clamped() {
        let view = ViewState::new(1, ZoomLimits::default()).with_zoom(10.0);
        assert_eq!(view.zoom(), 3.0);
    }
}
