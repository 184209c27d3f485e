//! Viewer widget contract.
//!
//! The page-flip widget (animation physics, page layout) is an external
//! collaborator; this module pins down the seam the rest of the
//! workspace is written against, plus the explicit configuration
//! structure the widget is constructed with.

use std::time::Duration;

/// Which corner a flip animation starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipEdge {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeFit {
    /// Widget keeps the configured width/height.
    Fixed,
    /// Widget stretches with its container between the min/max bounds.
    Stretch,
}

/// Every option the widget recognizes and its effect. Defaults mirror the
/// viewer assembly: a stretching portrait book with shadows and an 800ms
/// flip.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipViewConfig {
    /// Base page width/height in pixels, from the first rendered page.
    pub width: u32,
    pub height: u32,
    pub size_fit: SizeFit,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    /// Draw a page shadow during flips.
    pub draw_shadow: bool,
    /// Duration of the flip animation.
    pub flipping_time: Duration,
    /// Single-page (portrait) layout instead of a two-page spread.
    pub use_portrait: bool,
    /// Recompute widget size when the container resizes.
    pub auto_size: bool,
    /// Peak opacity of the flip shadow, 0.0..=1.0.
    pub max_shadow_opacity: f32,
    /// Style the first page as a cover.
    pub show_cover: bool,
    /// Let touch devices scroll past the widget.
    pub mobile_scroll_support: bool,
    /// Clicking a page flips it (disabled while zoomed).
    pub flip_on_click: bool,
}

impl FlipViewConfig {
    /// Configuration for a book whose pages render at `width` x `height`.
    pub fn for_page(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            size_fit: SizeFit::Stretch,
            min_width: 300,
            max_width: 1600,
            min_height: 400,
            max_height: 1000,
            draw_shadow: true,
            flipping_time: Duration::from_millis(800),
            use_portrait: true,
            auto_size: true,
            max_shadow_opacity: 0.6,
            show_cover: true,
            mobile_scroll_support: true,
            flip_on_click: true,
        }
    }
}

/// The page-flip widget seam.
///
/// Image lists handed to the widget are index-aligned with page numbers
/// and must only ever be extended; `replace_images` must not disrupt an
/// animation already in progress.
pub trait FlipView {
    type Image: Clone;

    /// Initial image list, before the widget is first shown.
    fn load_images(&mut self, images: Vec<Self::Image>);

    /// Swap in a longer copy of the image list after a background merge.
    fn replace_images(&mut self, images: &[Self::Image]);

    fn flip_to_page(&mut self, page_index: usize);
    fn flip_next(&mut self, edge: FlipEdge);
    fn flip_prev(&mut self, edge: FlipEdge);

    fn current_page_index(&self) -> usize;
    fn page_count(&self) -> usize;

    /// Flip notifications since the last call; the embedder forwards
    /// these to the merge coordinator.
    fn take_flip_events(&mut self) -> usize;
}
