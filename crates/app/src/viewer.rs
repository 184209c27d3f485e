//! The desktop viewer window.
//!
//! One `update` per frame: poll input, advance the session by one tick,
//! paint the toolbar and the book. The first frame only shows a spinner;
//! the document (and its initial page batch) is loaded on the frame
//! after, so the window is responsive while lopdf parses.

use crate::flip_widget::EguiFlipView;
use crate::session::Session;
use anyhow::Result;
use eframe::egui;
use flipbook_core::{FlipEdge, FlipView, NavButtons, Point, Size, ZoomPanController};
use flipbook_engine::{LopdfEngine, OpenSource};
use std::path::PathBuf;
use std::time::Instant;
use tracing::error;

#[derive(Debug, Clone)]
pub struct ViewerArgs {
    pub file: PathBuf,
    pub scale: f32,
    pub initial_pages: u32,
}

pub fn run(args: ViewerArgs) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Flipbook")
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([500.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Flipbook",
        options,
        Box::new(move |_cc| Ok(Box::new(FlipbookApp::new(args)))),
    )
    .map_err(|err| anyhow::anyhow!("viewer failed: {err}"))
}

/// Fraction of the book width on each side that acts as a flip control.
const EDGE_FRACTION: f32 = 0.18;

enum AppState {
    /// Spinner painted once before the blocking document load.
    Loading { args: ViewerArgs, painted: bool },
    Viewer(Box<ViewerState>),
    Failed { message: String },
}

pub struct FlipbookApp {
    state: AppState,
}

impl FlipbookApp {
    pub fn new(args: ViewerArgs) -> Self {
        Self { state: AppState::Loading { args, painted: false } }
    }

    fn load(args: &ViewerArgs) -> AppState {
        let source = OpenSource::Path(args.file.clone());
        match Session::open(LopdfEngine::new(), source, args.initial_pages, args.scale) {
            Ok(session) => {
                let mut view = EguiFlipView::new(session.config().clone());
                session.attach(&mut view);
                let nav = session.nav_buttons(&view);
                AppState::Viewer(Box::new(ViewerState {
                    session,
                    view,
                    zoom: ZoomPanController::new(Size::new(1100.0, 800.0)),
                    nav,
                }))
            }
            Err(err) => {
                error!(file = %args.file.display(), error = %err, "failed to open document");
                AppState::Failed { message: format!("{err:#}") }
            }
        }
    }
}

impl eframe::App for FlipbookApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match &mut self.state {
            AppState::Loading { args, painted } => {
                if *painted {
                    let loaded = Self::load(args);
                    self.state = loaded;
                    ctx.request_repaint();
                } else {
                    *painted = true;
                    egui::CentralPanel::default().show(ctx, |ui| {
                        ui.centered_and_justified(|ui| ui.spinner());
                    });
                    ctx.request_repaint();
                }
            }
            AppState::Viewer(state) => state.update(ctx),
            AppState::Failed { message } => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(ui.available_height() * 0.4);
                        ui.heading("Could not open document");
                        ui.label(message.as_str());
                    });
                });
            }
        }
    }
}

struct ViewerState {
    session: Session<LopdfEngine>,
    view: EguiFlipView,
    zoom: ZoomPanController,
    nav: NavButtons,
}

impl Drop for ViewerState {
    fn drop(&mut self) {
        self.session.cancel();
    }
}

impl ViewerState {
    fn update(&mut self, ctx: &egui::Context) {
        let now = Instant::now();

        self.toolbar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.book(ui);
        });

        if self.session.tick(&mut self.view, now) {
            self.nav = self.session.nav_buttons(&self.view);
        }

        // Keep frames coming while anything is still in motion; once
        // settled, wake up only for the next merge deadline.
        if !self.session.background_done() || self.view.is_flipping() {
            ctx.request_repaint();
        } else if let Some(deadline) = self.session.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.add_enabled(self.nav.first_enabled, egui::Button::new("⏮ First")).clicked()
                {
                    self.view.flip_to_page(0);
                    self.nav = self.session.nav_buttons(&self.view);
                }
                if ui.add_enabled(self.nav.prev_enabled, egui::Button::new("◀ Prev")).clicked() {
                    self.view.flip_prev(FlipEdge::Bottom);
                    self.nav = self.session.nav_buttons(&self.view);
                }
                if ui.add_enabled(self.nav.next_enabled, egui::Button::new("Next ▶")).clicked() {
                    self.view.flip_next(FlipEdge::Bottom);
                    self.nav = self.session.nav_buttons(&self.view);
                }

                ui.separator();

                let current = self.view.current_page_index() + 1;
                let total = self.session.page_count();
                if self.session.loaded_pages() < total as usize {
                    ui.label(format!(
                        "Page {current} of {total} ({} loaded)",
                        self.session.loaded_pages()
                    ));
                    ui.spinner();
                } else {
                    ui.label(format!("Page {current} of {total}"));
                }

                ui.separator();

                if ui.button("🔍 Zoom").clicked() {
                    self.zoom.toggle_zoom(None);
                }
                if self.zoom.is_zoomed() {
                    ui.label(format!("{:.0}%", self.zoom.zoom() * 100.0));
                }
            });
        });
    }

    fn book(&mut self, ui: &mut egui::Ui) {
        let viewport = ui.available_rect_before_wrap();
        self.zoom.set_viewport(Size::new(viewport.width(), viewport.height()));

        let response = ui.allocate_rect(viewport, egui::Sense::click_and_drag());

        let rect = self.book_rect(viewport);
        let in_edge = |pos: egui::Pos2| {
            rect.contains(pos)
                && ((pos.x - rect.left()) < rect.width() * EDGE_FRACTION
                    || (rect.right() - pos.x) < rect.width() * EDGE_FRACTION)
        };

        // Wheel zoom, browser sign convention: scrolling up zooms in.
        let scroll_delta = ui.ctx().input(|i| i.raw_scroll_delta.y);
        if response.hovered() && scroll_delta != 0.0 {
            self.zoom.wheel(-scroll_delta);
        }

        let local = |pos: egui::Pos2| Point::new(pos.x - viewport.left(), pos.y - viewport.top());

        if response.double_clicked() {
            self.zoom.double_click();
        } else if response.clicked() && !self.zoom.is_zoomed() {
            if let Some(pos) = response.interact_pointer_pos() {
                if in_edge(pos) || rect.contains(pos) {
                    let edge =
                        if pos.y > rect.center().y { FlipEdge::Bottom } else { FlipEdge::Top };
                    if pos.x < rect.center().x {
                        self.view.flip_prev(edge);
                    } else {
                        self.view.flip_next(edge);
                    }
                    self.nav = self.session.nav_buttons(&self.view);
                }
            }
        }

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.zoom.begin_drag(local(pos), in_edge(pos));
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.zoom.drag_to(local(pos));
            }
        }
        if response.drag_stopped() || !ui.ctx().input(|i| i.pointer.has_pointer()) {
            self.zoom.end_drag();
        }

        self.view.draw(ui, rect);

        if self.zoom.is_zoomed() {
            ui.ctx().set_cursor_icon(if self.zoom.is_dragging() {
                egui::CursorIcon::Grabbing
            } else {
                egui::CursorIcon::Grab
            });
        }
    }

    /// Book placement: fit the page aspect into the viewport, scale by
    /// the zoom factor, then offset by the scroll position.
    fn book_rect(&self, viewport: egui::Rect) -> egui::Rect {
        let config = self.session.config();
        let aspect = config.width.max(1) as f32 / config.height.max(1) as f32;

        let fit_height = (viewport.height() * 0.95).min(viewport.width() * 0.95 / aspect);
        let fit_width = fit_height * aspect;

        let size = egui::vec2(fit_width * self.zoom.zoom(), fit_height * self.zoom.zoom());
        let scroll = self.zoom.scroll();
        let extra = (self.zoom.content_size().width - viewport.width()).max(0.0);
        let extra_y = (self.zoom.content_size().height - viewport.height()).max(0.0);

        // Centered at 1x; at higher zoom the scroll offset shifts the
        // oversize content through the viewport.
        let center = viewport.center()
            + egui::vec2(extra / 2.0 - scroll.x, extra_y / 2.0 - scroll.y);

        egui::Rect::from_center_size(center, size)
    }
}
