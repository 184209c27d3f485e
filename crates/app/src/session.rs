//! Glue between the document engine, the progressive renderer, and the
//! merge coordinator.
//!
//! A session owns the engine and the whole render pipeline; the UI layer
//! only calls [`Session::tick`] once per event-loop turn with the current
//! time and a viewer widget. Each tick forwards flip notifications,
//! rasterizes at most one background page, and applies a merge when the
//! coordinator says so.

use anyhow::{Context, Result};
use flipbook_core::{
    FlipView, FlipViewConfig, MergeCoordinator, MergePhase, MergePoll, NavButtons,
};
use flipbook_engine::{DocumentHandle, OpenSource, PdfEngine, RgbaImage};
use flipbook_render::{render_initial_batch, CancellationToken, RemainingPages};
use std::time::Instant;
use tracing::{debug, info};

pub struct Session<E: PdfEngine> {
    engine: E,
    handle: DocumentHandle,
    page_count: u32,
    next_page: u32,
    scale: f32,
    cancel: CancellationToken,
    coordinator: MergeCoordinator<RgbaImage>,
    config: FlipViewConfig,
}

impl<E: PdfEngine> Session<E> {
    /// Open the document and render the initial batch. Failures here
    /// abort the whole startup; there is nothing to show yet.
    pub fn open(
        mut engine: E,
        source: OpenSource,
        initial_pages: u32,
        scale: f32,
    ) -> Result<Self> {
        let handle = engine.open(source).context("failed to open document")?;
        let page_count = engine.page_count(handle)?;
        let batch_size = page_count.min(initial_pages.max(1));

        let batch = render_initial_batch(&engine, handle, batch_size, scale)
            .context("failed to render the initial page batch")?;

        info!(pages = page_count, batch = batch_size, "document opened");

        let config = FlipViewConfig::for_page(batch.base_width, batch.base_height);

        Ok(Self {
            engine,
            handle,
            page_count,
            next_page: batch_size,
            scale,
            cancel: CancellationToken::new(),
            coordinator: MergeCoordinator::new(batch.images),
            config,
        })
    }

    pub fn config(&self) -> &FlipViewConfig {
        &self.config
    }

    /// Total pages in the document (not all loaded yet).
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Pages currently in the live image list.
    pub fn loaded_pages(&self) -> usize {
        self.coordinator.pages().len()
    }

    /// Hand the initial batch to a freshly constructed widget.
    pub fn attach<V: FlipView<Image = RgbaImage>>(&self, view: &mut V) {
        view.load_images(self.coordinator.pages().to_vec());
    }

    /// One event-loop turn. Returns whether a merge was applied (and the
    /// widget image list reloaded).
    pub fn tick<V: FlipView<Image = RgbaImage>>(&mut self, view: &mut V, now: Instant) -> bool {
        for _ in 0..view.take_flip_events() {
            self.coordinator.on_flip(now);
        }

        if !self.background_done() {
            let mut pages = RemainingPages::new(
                &self.engine,
                self.handle,
                self.next_page,
                self.page_count,
                self.scale,
            )
            .with_cancellation(self.cancel.clone());

            if let Some(page) = pages.next() {
                self.coordinator.push_rendered(page.image, now);
            }
            self.next_page = pages.next_index();
        }

        match self.coordinator.poll(now) {
            MergePoll::Merged { appended } => {
                debug!(appended, total = self.coordinator.pages().len(), "merged background pages");
                view.replace_images(self.coordinator.pages());
                true
            }
            MergePoll::Quiet => false,
        }
    }

    /// All background pages attempted (or rendering cancelled).
    pub fn background_done(&self) -> bool {
        self.next_page >= self.page_count || self.cancel.is_cancelled()
    }

    /// Background done, buffer drained, coordinator idle: no further
    /// ticks will change anything until the next flip.
    pub fn is_settled(&self) -> bool {
        self.background_done()
            && self.coordinator.pending_len() == 0
            && self.coordinator.phase() == MergePhase::Idle
    }

    /// Wake-up point for callers that sleep between events.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.coordinator.next_deadline()
    }

    pub fn nav_buttons<V: FlipView<Image = RgbaImage>>(&self, view: &V) -> NavButtons {
        NavButtons::compute(view.current_page_index(), view.page_count())
    }

    /// Stop background rendering at the next page boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
