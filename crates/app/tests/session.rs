//! Drives a whole viewing session against a scripted engine, one tick at
//! a time, with the clock supplied by the test.

use flipbook_app::session::Session;
use flipbook_core::{FlipEdge, FlipView};
use flipbook_engine::test_support::StubEngine;
use flipbook_engine::{OpenSource, RgbaImage};
use std::time::{Duration, Instant};

#[derive(Default)]
struct RecordingView {
    images: Vec<RgbaImage>,
    load_calls: usize,
    replace_calls: usize,
    current: usize,
    pending_flips: usize,
}

impl FlipView for RecordingView {
    type Image = RgbaImage;

    fn load_images(&mut self, images: Vec<RgbaImage>) {
        self.images = images;
        self.load_calls += 1;
    }

    fn replace_images(&mut self, images: &[RgbaImage]) {
        self.images = images.to_vec();
        self.replace_calls += 1;
    }

    fn flip_to_page(&mut self, page_index: usize) {
        if page_index != self.current {
            self.current = page_index;
            self.pending_flips += 1;
        }
    }

    fn flip_next(&mut self, _edge: FlipEdge) {
        self.flip_to_page(self.current + 1);
    }

    fn flip_prev(&mut self, _edge: FlipEdge) {
        self.flip_to_page(self.current.saturating_sub(1));
    }

    fn current_page_index(&self) -> usize {
        self.current
    }

    fn page_count(&self) -> usize {
        self.images.len()
    }

    fn take_flip_events(&mut self) -> usize {
        std::mem::take(&mut self.pending_flips)
    }
}

fn open_session(engine: StubEngine) -> (Session<StubEngine>, RecordingView) {
    let session = Session::open(engine, OpenSource::Bytes(Vec::new()), 4, 1.0)
        .expect("session should open");
    let mut view = RecordingView::default();
    session.attach(&mut view);
    (session, view)
}

#[test]
fn ten_page_document_with_one_bad_page_settles_at_nine_images() {
    // Page 7 (index 6) fails to rasterize and is simply absent at the end.
    let (mut session, mut view) = open_session(StubEngine::with_pages(10).failing_page(6));

    assert_eq!(view.images.len(), 4);
    assert_eq!(view.load_calls, 1);
    assert_eq!(session.page_count(), 10);
    assert!(!session.background_done());

    let t0 = Instant::now();
    for step in 0..200u64 {
        session.tick(&mut view, t0 + Duration::from_millis(step * 10));
        if session.is_settled() {
            break;
        }
    }

    assert!(session.is_settled());
    assert_eq!(view.images.len(), 9);
    // All background pages arrived quietly, so one merge covered them all.
    assert_eq!(view.replace_calls, 1);
    assert_eq!(view.load_calls, 1);
}

#[test]
fn flip_during_load_defers_the_merge_past_the_settle_window() {
    let (mut session, mut view) = open_session(StubEngine::with_pages(10));

    let t0 = Instant::now();
    let at = |ms: u64| t0 + Duration::from_millis(ms);

    // First background page arrives and arms a merge for 250ms.
    assert!(!session.tick(&mut view, at(0)));

    // The user flips at 100ms; the armed merge must be cancelled.
    view.flip_next(FlipEdge::Bottom);
    assert!(!session.tick(&mut view, at(100)));

    // Nothing merges while the flip settles (100ms + 300ms).
    for ms in (120..=390).step_by(30) {
        assert!(
            !session.tick(&mut view, at(ms)),
            "merge fired at {ms}ms, inside the settle window"
        );
    }
    assert_eq!(view.replace_calls, 0);

    // Settled at 400ms; the merge re-arms then and fires 250ms later.
    assert!(!session.tick(&mut view, at(410)));
    assert!(!session.tick(&mut view, at(500)));
    assert!(session.tick(&mut view, at(700)));

    assert_eq!(view.replace_calls, 1);
    assert_eq!(view.images.len(), 10);
    assert!(session.is_settled());
}

#[test]
fn initial_batch_covering_the_document_needs_no_background_phase() {
    let (mut session, mut view) = open_session(StubEngine::with_pages(3));

    assert_eq!(view.images.len(), 3);
    assert!(session.background_done());
    assert!(session.is_settled());

    assert!(!session.tick(&mut view, Instant::now()));
    assert_eq!(view.replace_calls, 0);
}

#[test]
fn navigation_state_follows_the_current_page() {
    let (session, mut view) = open_session(StubEngine::with_pages(3));

    let nav = session.nav_buttons(&view);
    assert!(!nav.first_enabled && !nav.prev_enabled && nav.next_enabled);

    view.flip_next(FlipEdge::Bottom);
    view.flip_next(FlipEdge::Bottom);
    let nav = session.nav_buttons(&view);
    assert!(nav.first_enabled && nav.prev_enabled && !nav.next_enabled);
}
