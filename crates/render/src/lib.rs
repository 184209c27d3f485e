//! Progressive page rendering for the flipbook.
//!
//! Pages are rendered in two phases: an initial batch that is awaited
//! before the viewer widget is constructed, and a background sequence
//! that renders the rest one page at a time for the merge coordinator
//! to splice in.

pub mod cancel;
pub mod progressive;

pub use cancel::CancellationToken;
pub use progressive::{
    initial_page_count, render_initial_batch, PageBatch, RemainingPages, RenderedPage,
    INITIAL_PAGES,
};
