//! Per-page annotation collections with dirty tracking.

use crate::annotation::{
    Annotation, AnnotationBody, AnnotationId, AnnotationPatch, AnnotationStyle, PageCoordinate,
};
use crate::error::Rejection;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct PageAnnotations {
    /// Insertion order is z-order: the last item is drawn on top.
    items: Vec<Annotation>,
    /// Last sequence handed out on this page. Never decreases.
    last_sequence: u32,
}

impl PageAnnotations {
    fn position(&self, id: AnnotationId) -> Option<usize> {
        self.items.iter().position(|annotation| annotation.id() == id)
    }
}

/// Annotations of one document, keyed by page.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    page_count: u32,
    pages: BTreeMap<u32, PageAnnotations>,
    has_unsaved_changes: bool,
}

impl AnnotationStore {
    pub fn new(page_count: u32) -> Self {
        Self { page_count, pages: BTreeMap::new(), has_unsaved_changes: false }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Validate and append an annotation to `page_index`.
    pub fn add(
        &mut self,
        page_index: u32,
        body: AnnotationBody,
        style: AnnotationStyle,
    ) -> Result<AnnotationId, Rejection> {
        self.check_page(page_index)?;
        let body = body.validated()?;

        let page = self.pages.entry(page_index).or_default();
        page.last_sequence += 1;
        let id = AnnotationId::new(page_index, page.last_sequence);
        let kind = body.kind();
        page.items.push(Annotation::new(id, body, style));
        self.has_unsaved_changes = true;

        log::debug!("added {kind} annotation {id}");
        Ok(id)
    }

    /// Merge `patch` into the annotation `id` on `page_index`.
    ///
    /// Returns false when the annotation is not on that page or the patch
    /// does not produce a valid annotation of the same kind. A patch that
    /// changes nothing succeeds without marking the store dirty.
    pub fn update(&mut self, page_index: u32, id: AnnotationId, patch: &AnnotationPatch) -> bool {
        let Some(page) = self.pages.get_mut(&page_index) else {
            return false;
        };
        let Some(index) = page.position(id) else {
            return false;
        };
        if patch.is_empty() {
            return true;
        }
        let Some(updated) = page.items[index].patched(patch) else {
            log::debug!("rejected patch for annotation {id}");
            return false;
        };
        if updated == page.items[index] {
            return true;
        }

        page.items[index] = updated;
        self.has_unsaved_changes = true;
        log::debug!("updated annotation {id}");
        true
    }

    pub fn delete(&mut self, page_index: u32, id: AnnotationId) -> bool {
        let Some(page) = self.pages.get_mut(&page_index) else {
            return false;
        };
        let Some(index) = page.position(id) else {
            return false;
        };

        page.items.remove(index);
        self.has_unsaved_changes = true;
        log::debug!("deleted annotation {id}");
        true
    }

    pub fn get(&self, page_index: u32, id: AnnotationId) -> Option<&Annotation> {
        let page = self.pages.get(&page_index)?;
        page.items.iter().find(|annotation| annotation.id() == id)
    }

    /// Annotations of a page in z-order. Empty for unknown pages.
    pub fn list(&self, page_index: u32) -> &[Annotation] {
        self.pages.get(&page_index).map(|page| page.items.as_slice()).unwrap_or(&[])
    }

    /// Topmost annotation on `page_index` touched by `point ± tolerance`.
    pub fn hit_test(
        &self,
        page_index: u32,
        point: &PageCoordinate,
        tolerance: f32,
    ) -> Option<&Annotation> {
        self.list(page_index).iter().rev().find(|annotation| annotation.hit_test(point, tolerance))
    }

    /// Every annotation, by page then z-order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.pages.values().flat_map(|page| page.items.iter())
    }

    pub fn len(&self) -> usize {
        self.pages.values().map(|page| page.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub(crate) fn mark_saved(&mut self) {
        self.has_unsaved_changes = false;
    }

    /// Replace the contents with previously saved annotations.
    ///
    /// Ids are kept as saved; each page's counter continues past its highest
    /// restored sequence. The store is clean afterwards. On error nothing is
    /// changed.
    pub fn restore(
        &mut self,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Result<(), Rejection> {
        let mut pages: BTreeMap<u32, PageAnnotations> = BTreeMap::new();

        for annotation in annotations {
            let id = annotation.id();
            if annotation.page_index() != id.page_index() {
                return Err(Rejection::PageMismatch { id, page: annotation.page_index() });
            }
            self.check_page(id.page_index())?;

            let body = annotation.body().clone().validated()?;
            let page = pages.entry(id.page_index()).or_default();
            if page.position(id).is_some() {
                return Err(Rejection::DuplicateId(id));
            }
            page.last_sequence = page.last_sequence.max(id.sequence());
            page.items.push(Annotation::new(id, body, annotation.style().clone()));
        }

        log::debug!(
            "restored {} annotation(s) across {} page(s)",
            pages.values().map(|page| page.items.len()).sum::<usize>(),
            pages.len()
        );
        self.pages = pages;
        self.has_unsaved_changes = false;
        Ok(())
    }

    fn check_page(&self, page_index: u32) -> Result<(), Rejection> {
        if page_index < self.page_count {
            Ok(())
        } else {
            Err(Rejection::PageOutOfRange { page: page_index, page_count: self.page_count })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Color, Rect, ShapeKind};

    fn highlight(x1: f32, y1: f32, x2: f32, y2: f32) -> AnnotationBody {
        AnnotationBody::Highlight { rect: Rect::new(x1, y1, x2, y2) }
    }

    #[test]
    fn undersized_rectangles_are_rejected_without_side_effects() {
        let mut store = AnnotationStore::new(3);

        let result = store.add(0, highlight(10.0, 10.0, 12.0, 50.0), AnnotationStyle::highlight());
        assert!(matches!(result, Err(Rejection::RectTooSmall { .. })));

        let shape = AnnotationBody::Shape {
            rect: Rect::new(10.0, 10.0, 60.0, 13.0),
            shape: ShapeKind::Rectangle,
        };
        let result = store.add(0, shape, AnnotationStyle::markup(Color::RED));
        assert!(matches!(result, Err(Rejection::RectTooSmall { .. })));

        assert!(store.is_empty());
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn drawings_need_two_points() {
        let mut store = AnnotationStore::new(1);
        let body = AnnotationBody::Drawing { points: vec![PageCoordinate::new(1.0, 1.0)] };

        assert_eq!(
            store.add(0, body, AnnotationStyle::markup(Color::RED)),
            Err(Rejection::TooFewPoints { count: 1 })
        );
        assert!(store.list(0).is_empty());
    }

    #[test]
    fn add_rejects_pages_out_of_range() {
        let mut store = AnnotationStore::new(2);
        let result = store.add(2, highlight(0.0, 0.0, 50.0, 50.0), AnnotationStyle::highlight());
        assert_eq!(result, Err(Rejection::PageOutOfRange { page: 2, page_count: 2 }));
    }

    #[test]
    fn add_then_get_round_trips_all_fields() {
        let mut store = AnnotationStore::new(2);
        let body = AnnotationBody::Text {
            position: PageCoordinate::new(40.0, 60.0),
            text: "Check this".into(),
        };
        let style = AnnotationStyle { font_size: 14.0, ..AnnotationStyle::text() };

        let id = store.add(1, body.clone(), style.clone()).expect("text should be accepted");
        let stored = store.get(1, id).expect("annotation should exist");

        assert_eq!(stored.id(), id);
        assert_eq!(stored.page_index(), 1);
        assert_eq!(stored.body(), &body);
        assert_eq!(stored.style(), &style);
        assert!(store.has_unsaved_changes());
        assert!(store.get(0, id).is_none());
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut store = AnnotationStore::new(1);
        let id = store
            .add(
                0,
                AnnotationBody::Comment { position: PageCoordinate::new(5.0, 5.0), text: "a".into() },
                AnnotationStyle::comment(),
            )
            .expect("comment should be accepted");

        assert!(store.update(0, id, &AnnotationPatch::position(PageCoordinate::new(70.0, 80.0))));

        let stored = store.get(0, id).expect("annotation should exist");
        assert_eq!(
            stored.body(),
            &AnnotationBody::Comment { position: PageCoordinate::new(70.0, 80.0), text: "a".into() }
        );
        assert_eq!(stored.style(), &AnnotationStyle::comment());
    }

    #[test]
    fn update_refuses_degenerate_results_and_unknown_ids() {
        let mut store = AnnotationStore::new(1);
        let id = store
            .add(0, highlight(0.0, 0.0, 50.0, 50.0), AnnotationStyle::highlight())
            .expect("highlight should be accepted");

        assert!(!store.update(0, id, &AnnotationPatch::rect(Rect::new(0.0, 0.0, 1.0, 1.0))));
        assert!(!store.update(0, AnnotationId::new(0, 99), &AnnotationPatch::default()));
        assert!(!store.update(1, id, &AnnotationPatch::default()));
        assert_eq!(
            store.get(0, id).map(|annotation| annotation.body().clone()),
            Some(highlight(0.0, 0.0, 50.0, 50.0))
        );
    }

    #[test]
    fn patches_that_change_nothing_leave_the_store_clean() {
        let mut store = AnnotationStore::new(1);
        let id = store
            .add(0, highlight(0.0, 0.0, 50.0, 50.0), AnnotationStyle::highlight())
            .expect("highlight should be accepted");
        store.mark_saved();

        assert!(store.update(0, id, &AnnotationPatch::default()));
        assert!(!store.has_unsaved_changes());

        let same_rect = AnnotationPatch::rect(Rect::new(50.0, 50.0, 0.0, 0.0));
        assert!(store.update(0, id, &same_rect));
        assert!(!store.has_unsaved_changes());

        assert!(store.update(0, id, &AnnotationPatch::default().with_color(Color::BLUE)));
        assert!(store.has_unsaved_changes());
    }

    #[test]
    fn delete_is_not_repeatable() {
        let mut store = AnnotationStore::new(1);
        let id = store
            .add(0, highlight(0.0, 0.0, 50.0, 50.0), AnnotationStyle::highlight())
            .expect("highlight should be accepted");

        assert!(store.delete(0, id));
        assert!(store.get(0, id).is_none());
        assert!(!store.delete(0, id));
    }

    #[test]
    fn sequences_are_not_reused_after_delete() {
        let mut store = AnnotationStore::new(1);
        let style = AnnotationStyle::highlight();
        let first = store.add(0, highlight(0.0, 0.0, 50.0, 50.0), style.clone()).expect("first");
        assert!(store.delete(0, first));
        let second = store.add(0, highlight(0.0, 0.0, 50.0, 50.0), style).expect("second");

        assert_ne!(first, second);
        assert_eq!(second.sequence(), 2);
    }

    #[test]
    fn hit_test_prefers_the_topmost_annotation() {
        let mut store = AnnotationStore::new(1);
        let style = AnnotationStyle::highlight();
        let below = store.add(0, highlight(0.0, 0.0, 100.0, 100.0), style.clone()).expect("below");
        let above = store.add(0, highlight(50.0, 50.0, 150.0, 150.0), style).expect("above");

        let point = PageCoordinate::new(75.0, 75.0);
        assert_eq!(store.hit_test(0, &point, 1.0).map(Annotation::id), Some(above));

        let point = PageCoordinate::new(10.0, 10.0);
        assert_eq!(store.hit_test(0, &point, 1.0).map(Annotation::id), Some(below));

        assert!(store.hit_test(0, &PageCoordinate::new(300.0, 300.0), 1.0).is_none());
    }

    #[test]
    fn list_of_unknown_page_is_empty() {
        let store = AnnotationStore::new(1);
        assert!(store.list(0).is_empty());
        assert!(store.list(42).is_empty());
    }

    #[test]
    fn restore_continues_sequences_and_leaves_store_clean() {
        let mut source = AnnotationStore::new(2);
        let style = AnnotationStyle::highlight();
        source.add(1, highlight(0.0, 0.0, 50.0, 50.0), style.clone()).expect("first");
        source.add(1, highlight(10.0, 10.0, 60.0, 60.0), style.clone()).expect("second");

        let mut restored = AnnotationStore::new(2);
        restored.restore(source.iter().cloned()).expect("restore should succeed");

        assert_eq!(restored.len(), 2);
        assert!(!restored.has_unsaved_changes());

        let next = restored.add(1, highlight(0.0, 0.0, 20.0, 20.0), style).expect("third");
        assert_eq!(next, AnnotationId::new(1, 3));
    }

    #[test]
    fn restore_rejects_duplicates_and_keeps_previous_contents() {
        let mut source = AnnotationStore::new(1);
        source
            .add(0, highlight(0.0, 0.0, 50.0, 50.0), AnnotationStyle::highlight())
            .expect("highlight");
        let saved: Vec<Annotation> = source.iter().cloned().collect();

        let mut store = AnnotationStore::new(1);
        let duplicated = saved.iter().cloned().chain(saved.iter().cloned());
        assert_eq!(store.restore(duplicated), Err(Rejection::DuplicateId(AnnotationId::new(0, 1))));
        assert!(store.is_empty());

        let mut smaller = AnnotationStore::new(0);
        assert!(matches!(smaller.restore(saved), Err(Rejection::PageOutOfRange { .. })));
    }
}
