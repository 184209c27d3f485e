//! Zoom and drag-pan state for the flipbook wrapper.
//!
//! The zoomable container is always `zoom` times the viewport in each
//! dimension, so the scrollable range is `viewport * (zoom - 1)`. All
//! positions are in viewport-local pixels.

/// Lower zoom bound; at this level the view is unzoomed and unscrolled.
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 3.0;

/// Zoom change per wheel event.
pub const ZOOM_STEP: f32 = 0.1;

/// Level the zoom action toggles into from 1.0.
pub const TOGGLE_ZOOM: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    start: Point,
    start_scroll: Point,
}

#[derive(Debug)]
pub struct ZoomPanController {
    zoom: f32,
    scroll: Point,
    viewport: Size,
    drag: Option<DragState>,
}

impl ZoomPanController {
    pub fn new(viewport: Size) -> Self {
        Self { zoom: MIN_ZOOM, scroll: Point::default(), viewport, drag: None }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn scroll(&self) -> Point {
        self.scroll
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom > MIN_ZOOM
    }

    /// Size of the scaled content container.
    pub fn content_size(&self) -> Size {
        Size::new(self.viewport.width * self.zoom, self.viewport.height * self.zoom)
    }

    /// Call on viewport resize; keeps the scroll offset in range.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.clamp_scroll();
    }

    /// Wheel input: scrolling up zooms in, down zooms out, one step per
    /// event. The scroll offset is left alone (but kept in range), and
    /// returning to 1.0 resets it to the origin.
    pub fn wheel(&mut self, delta_y: f32) {
        let step = if delta_y < 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
        self.apply_zoom(self.zoom + step);
    }

    /// Zoom action: toggles between 1.0 and [`TOGGLE_ZOOM`]. When zooming
    /// in, the view is re-centered so `focal` (or the viewport center)
    /// keeps its fractional position within the scrollable content.
    pub fn toggle_zoom(&mut self, focal: Option<Point>) {
        if self.zoom <= MIN_ZOOM {
            let focal = focal.unwrap_or(Point::new(
                self.viewport.width / 2.0,
                self.viewport.height / 2.0,
            ));
            self.zoom_about(TOGGLE_ZOOM, focal);
        } else {
            self.apply_zoom(MIN_ZOOM);
        }
    }

    /// Double-click exits zoom. Returns whether the event was consumed;
    /// it never zooms in.
    pub fn double_click(&mut self) -> bool {
        if self.zoom > MIN_ZOOM {
            self.apply_zoom(MIN_ZOOM);
            true
        } else {
            false
        }
    }

    /// Start a drag-pan at `position`. Dragging is only available above
    /// 1.0 zoom and never starts on the navigation edge controls.
    /// Returns whether the drag was accepted.
    pub fn begin_drag(&mut self, position: Point, on_edge_control: bool) -> bool {
        if self.zoom <= MIN_ZOOM || on_edge_control {
            return false;
        }

        self.drag = Some(DragState { start: position, start_scroll: self.scroll });
        true
    }

    /// Pointer moved during a drag; moves scroll opposite to the pointer.
    pub fn drag_to(&mut self, position: Point) {
        let Some(drag) = self.drag else {
            return;
        };

        self.scroll = Point::new(
            drag.start_scroll.x - (position.x - drag.start.x),
            drag.start_scroll.y - (position.y - drag.start.y),
        );
        self.clamp_scroll();
    }

    /// Pointer released or left the viewport.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Zoom to `target` keeping the content point under `focal` fixed:
    /// the focal point's fractional position within the scrollable
    /// content is captured before the resize and restored after it.
    fn zoom_about(&mut self, target: f32, focal: Point) {
        let old_content = self.content_size();
        let fraction_x = (self.scroll.x + focal.x) / old_content.width;
        let fraction_y = (self.scroll.y + focal.y) / old_content.height;

        self.zoom = target.clamp(MIN_ZOOM, MAX_ZOOM);

        let new_content = self.content_size();
        self.scroll = Point::new(
            fraction_x * new_content.width - focal.x,
            fraction_y * new_content.height - focal.y,
        );
        self.clamp_scroll();
    }

    fn apply_zoom(&mut self, target: f32) {
        self.zoom = target.clamp(MIN_ZOOM, MAX_ZOOM);

        if self.zoom <= MIN_ZOOM {
            self.scroll = Point::default();
            self.end_drag();
        } else {
            self.clamp_scroll();
        }
    }

    fn clamp_scroll(&mut self) {
        let content = self.content_size();
        let max_x = (content.width - self.viewport.width).max(0.0);
        let max_y = (content.height - self.viewport.height).max(0.0);

        self.scroll.x = self.scroll.x.clamp(0.0, max_x);
        self.scroll.y = self.scroll.y.clamp(0.0, max_y);
    }
}
