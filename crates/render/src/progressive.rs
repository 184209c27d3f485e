//! Two-phase page rendering.
//!
//! Phase one renders the first few pages and is awaited before the
//! viewer widget exists, so the book opens with content already in it.
//! Phase two walks the remaining pages strictly in ascending order, one
//! rasterization per step, so the UI thread regains control between
//! pages and memory growth stays bounded.
//!
//! The two phases fail differently on purpose: a phase-one failure
//! aborts startup (there is nothing to show yet), while a phase-two
//! failure only costs that page — it is logged and the sequence moves
//! on, leaving a gap in the final list.

use crate::cancel::CancellationToken;
use flipbook_engine::{DocumentHandle, EngineError, PdfEngine, RenderRequest, RgbaImage};
use tracing::warn;

/// Pages rendered up front before the widget is constructed.
pub const INITIAL_PAGES: u32 = 4;

pub fn initial_page_count(total_pages: u32) -> u32 {
    total_pages.min(INITIAL_PAGES)
}

/// Result of the initial batch: images for pages `0..count` plus the
/// base page dimensions the widget is sized from (taken from the first
/// page).
#[derive(Debug)]
pub struct PageBatch {
    pub images: Vec<RgbaImage>,
    pub base_width: u32,
    pub base_height: u32,
}

/// Render pages `0..count` at `scale`. Any engine failure propagates
/// and no partial batch is returned.
pub fn render_initial_batch<E: PdfEngine>(
    engine: &E,
    handle: DocumentHandle,
    count: u32,
    scale: f32,
) -> Result<PageBatch, EngineError> {
    let mut images = Vec::with_capacity(count as usize);

    for page_index in 0..count {
        images.push(engine.render_page(handle, RenderRequest { page_index, scale })?);
    }

    let (base_width, base_height) =
        images.first().map(|image| (image.width(), image.height())).unwrap_or((600, 800));

    Ok(PageBatch { images, base_width, base_height })
}

/// A background-rendered page, tagged with its 0-based index.
#[derive(Debug)]
pub struct RenderedPage {
    pub page_index: u32,
    pub image: RgbaImage,
}

/// Lazy sequence over pages `from_page..page_count` in ascending order.
///
/// Each `next()` rasterizes until one page succeeds: failed pages are
/// logged and skipped, never retried. The sequence ends early if its
/// cancellation token fires.
pub struct RemainingPages<'a, E> {
    engine: &'a E,
    handle: DocumentHandle,
    next_page: u32,
    page_count: u32,
    scale: f32,
    cancel: CancellationToken,
}

impl<'a, E: PdfEngine> RemainingPages<'a, E> {
    pub fn new(
        engine: &'a E,
        handle: DocumentHandle,
        from_page: u32,
        page_count: u32,
        scale: f32,
    ) -> Self {
        Self {
            engine,
            handle,
            next_page: from_page,
            page_count,
            scale,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Pages not yet attempted.
    pub fn remaining(&self) -> u32 {
        self.page_count.saturating_sub(self.next_page)
    }

    /// Index the next `next()` call will attempt. Lets an embedder that
    /// renders one page per event-loop turn persist the position between
    /// turns.
    pub fn next_index(&self) -> u32 {
        self.next_page
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0 || self.cancel.is_cancelled()
    }
}

impl<E: PdfEngine> Iterator for RemainingPages<'_, E> {
    type Item = RenderedPage;

    fn next(&mut self) -> Option<RenderedPage> {
        while self.next_page < self.page_count {
            if self.cancel.is_cancelled() {
                return None;
            }

            let page_index = self.next_page;
            self.next_page += 1;

            match self
                .engine
                .render_page(self.handle, RenderRequest { page_index, scale: self.scale })
            {
                Ok(image) => return Some(RenderedPage { page_index, image }),
                Err(err) => {
                    warn!(page = page_index + 1, error = %err, "skipping page after render failure");
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipbook_engine::test_support::StubEngine;
    use flipbook_engine::OpenSource;

    fn open(engine: &mut StubEngine) -> DocumentHandle {
        engine.open(OpenSource::Bytes(Vec::new())).expect("stub open should succeed")
    }

    #[test]
    fn initial_batch_renders_requested_pages_with_base_dimensions() {
        let mut engine = StubEngine::with_pages(10).page_size_pt(600.0, 800.0);
        let handle = open(&mut engine);

        let batch =
            render_initial_batch(&engine, handle, 4, 1.5).expect("batch should render");

        assert_eq!(batch.images.len(), 4);
        assert_eq!(batch.base_width, 900);
        assert_eq!(batch.base_height, 1200);
        assert_eq!(engine.rendered_pages(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn initial_batch_failure_propagates_without_partial_result() {
        let mut engine = StubEngine::with_pages(10).failing_page(2);
        let handle = open(&mut engine);

        let err = render_initial_batch(&engine, handle, 4, 1.0)
            .expect_err("failing page should abort the batch");

        assert!(matches!(err, EngineError::Backend(_)));
        // Rendering stopped at the failing page.
        assert_eq!(engine.rendered_pages(), vec![0, 1, 2]);
    }

    #[test]
    fn remaining_pages_arrive_in_ascending_order() {
        let mut engine = StubEngine::with_pages(10);
        let handle = open(&mut engine);

        let indices: Vec<u32> = RemainingPages::new(&engine, handle, 4, 10, 1.0)
            .map(|page| page.page_index)
            .collect();

        assert_eq!(indices, vec![4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn failed_page_is_skipped_and_the_sequence_continues() {
        let mut engine = StubEngine::with_pages(10).failing_page(6);
        let handle = open(&mut engine);

        let indices: Vec<u32> = RemainingPages::new(&engine, handle, 4, 10, 1.0)
            .map(|page| page.page_index)
            .collect();

        assert_eq!(indices, vec![4, 5, 7, 8, 9]);
        // The failing page was attempted exactly once, in order.
        assert_eq!(engine.rendered_pages(), vec![4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn each_step_rasterizes_a_single_page() {
        let mut engine = StubEngine::with_pages(10);
        let handle = open(&mut engine);

        let mut pages = RemainingPages::new(&engine, handle, 4, 10, 1.0);
        let first = pages.next().expect("page 4 should render");

        assert_eq!(first.page_index, 4);
        assert_eq!(engine.rendered_pages(), vec![4]);
        assert_eq!(pages.remaining(), 5);
    }

    #[test]
    fn cancellation_stops_the_sequence() {
        let mut engine = StubEngine::with_pages(10);
        let handle = open(&mut engine);

        let cancel = CancellationToken::new();
        let mut pages =
            RemainingPages::new(&engine, handle, 4, 10, 1.0).with_cancellation(cancel.clone());

        assert!(pages.next().is_some());
        cancel.cancel();

        assert!(pages.next().is_none());
        assert!(pages.is_finished());
        assert_eq!(engine.rendered_pages(), vec![4]);
    }

    #[test]
    fn no_remaining_pages_when_the_batch_covered_the_document() {
        let mut engine = StubEngine::with_pages(3);
        let handle = open(&mut engine);

        let mut pages = RemainingPages::new(&engine, handle, 3, 3, 1.0);

        assert!(pages.is_finished());
        assert!(pages.next().is_none());
    }

    #[test]
    fn initial_page_count_is_capped_by_the_document() {
        assert_eq!(initial_page_count(10), 4);
        assert_eq!(initial_page_count(4), 4);
        assert_eq!(initial_page_count(2), 2);
        assert_eq!(initial_page_count(0), 0);
    }
}
