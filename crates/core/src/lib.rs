//! Pure viewer logic for the flipbook: the merge coordinator that splices
//! background-rendered pages into the live image list, the zoom/pan
//! controller, navigation button state, and the viewer-widget contract.
//!
//! Nothing in this crate touches a UI toolkit or a PDF library; everything
//! is driven by explicit timestamps and plain values so the invariants can
//! be tested directly.

pub mod flipview;
pub mod merge;
pub mod nav;
pub mod zoom;

pub use flipview::{FlipEdge, FlipView, FlipViewConfig, SizeFit};
pub use merge::{MergeCoordinator, MergePhase, MergePoll, FLIP_SETTLE, MERGE_SETTLE};
pub use nav::NavButtons;
pub use zoom::{Point, Size, ZoomPanController, MAX_ZOOM, MIN_ZOOM, TOGGLE_ZOOM, ZOOM_STEP};
