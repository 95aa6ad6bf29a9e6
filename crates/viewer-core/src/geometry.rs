//! Conversion between device space (viewport pixels) and document space.

use doc_model::{PageCoordinate, PageSize};

/// Pointer hit radius in device pixels.
pub const HIT_TEST_RADIUS: f32 = 2.0;

/// Point in viewport pixels, origin at the viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DevicePoint {
    pub x: f32,
    pub y: f32,
}

impl DevicePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Size of the area the page is displayed in, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Placement of the current page inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Device position of the page's top-left corner.
    pub offset: DevicePoint,
    pub zoom: f32,
}

impl ViewTransform {
    pub fn new(offset: DevicePoint, zoom: f32) -> Self {
        Self { offset, zoom }
    }

    /// Transform for `page` rendered at `zoom` and centered in `viewport`.
    pub fn centered(viewport: Viewport, page: PageSize, zoom: f32) -> Self {
        let rendered = Viewport::new(page.width_pt * zoom, page.height_pt * zoom);
        Self { offset: page_offset(viewport, rendered), zoom }
    }

    #[inline]
    pub fn to_document(&self, device: DevicePoint) -> PageCoordinate {
        to_document(device, self.offset, self.zoom)
    }

    #[inline]
    pub fn to_device(&self, document: PageCoordinate) -> DevicePoint {
        to_device(document, self.offset, self.zoom)
    }

    /// [`HIT_TEST_RADIUS`] expressed in document units.
    #[inline]
    pub fn hit_tolerance(&self) -> f32 {
        document_tolerance(self.zoom)
    }
}

#[inline]
pub fn to_document(device: DevicePoint, offset: DevicePoint, zoom: f32) -> PageCoordinate {
    PageCoordinate::new((device.x - offset.x) / zoom, (device.y - offset.y) / zoom)
}

#[inline]
pub fn to_device(document: PageCoordinate, offset: DevicePoint, zoom: f32) -> DevicePoint {
    DevicePoint::new(document.x * zoom + offset.x, document.y * zoom + offset.y)
}

#[inline]
pub fn document_tolerance(zoom: f32) -> f32 {
    HIT_TEST_RADIUS / zoom
}

/// Offset that centers a rendered page inside the viewport. A page larger
/// than the viewport along an axis is pinned to that axis' origin.
pub fn page_offset(viewport: Viewport, rendered_page: Viewport) -> DevicePoint {
    DevicePoint::new(
        ((viewport.width - rendered_page.width) / 2.0).floor().max(0.0),
        ((viewport.height - rendered_page.height) / 2.0).floor().max(0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_device_round_trip() {
        let transform = ViewTransform::new(DevicePoint::new(37.0, 12.5), 1.7);
        let original = DevicePoint::new(412.25, 98.0);

        let back = transform.to_device(transform.to_document(original));

        assert!((back.x - original.x).abs() < 1e-3);
        assert!((back.y - original.y).abs() < 1e-3);
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-4 * a.abs().max(1.0)
    }

    #[test]
    fn round_trip_holds_across_the_zoom_range() {
        let limits = crate::view::ZoomLimits::default();
        let steps = ((limits.max - limits.min) / limits.step).round() as u32;
        let devices = [
            DevicePoint::new(0.0, 0.0),
            DevicePoint::new(37.0, 12.5),
            DevicePoint::new(412.25, 98.0),
            DevicePoint::new(999.5, 1333.0),
        ];
        let pages = [PageCoordinate::new(0.0, 0.0), PageCoordinate::new(611.9, 791.3)];

        for step in 0..=steps {
            let zoom = (limits.min + step as f32 * limits.step).min(limits.max);
            let transform = ViewTransform::new(DevicePoint::new(94.0, 7.0), zoom);

            for device in devices {
                let back = transform.to_device(transform.to_document(device));
                assert!(close(back.x, device.x) && close(back.y, device.y), "zoom {zoom}: {back:?}");
            }
            for page in pages {
                let back = transform.to_document(transform.to_device(page));
                assert!(close(back.x, page.x) && close(back.y, page.y), "zoom {zoom}: {back:?}");
            }
        }
    }

    #[test]
    fn zoom_scales_document_distances() {
        let point = to_document(DevicePoint::new(220.0, 120.0), DevicePoint::new(20.0, 20.0), 2.0);
        assert_eq!(point, PageCoordinate::new(100.0, 50.0));
    }

    #[test]
    fn tolerance_shrinks_as_zoom_grows() {
        assert_eq!(document_tolerance(1.0), 2.0);
        assert_eq!(document_tolerance(2.0), 1.0);
        assert_eq!(document_tolerance(0.5), 4.0);
    }

    #[test]
    fn page_is_centered_only_when_smaller_than_viewport() {
        let offset = page_offset(Viewport::new(800.0, 600.0), Viewport::new(612.0, 792.0));
        assert_eq!(offset, DevicePoint::new(94.0, 0.0));

        let transform =
            ViewTransform::centered(Viewport::new(1000.0, 1000.0), PageSize::new(400.0, 300.0), 2.0);
        assert_eq!(transform.offset, DevicePoint::new(100.0, 200.0));
    }
}
