//! egui-backed page-flip widget.
//!
//! Pages are uploaded to the GPU lazily the first time they are drawn;
//! the image list only ever grows between merges, so textures for
//! already-uploaded pages stay valid across `replace_images`.

use eframe::egui;
use flipbook_core::{FlipEdge, FlipView, FlipViewConfig};
use flipbook_engine::RgbaImage;
use std::collections::HashMap;
use std::time::Instant;

struct FlipAnimation {
    from: usize,
    started: Instant,
}

pub struct EguiFlipView {
    config: FlipViewConfig,
    images: Vec<RgbaImage>,
    textures: HashMap<usize, egui::TextureHandle>,
    current: usize,
    animation: Option<FlipAnimation>,
    flip_events: usize,
}

impl EguiFlipView {
    pub fn new(config: FlipViewConfig) -> Self {
        Self {
            config,
            images: Vec::new(),
            textures: HashMap::new(),
            current: 0,
            animation: None,
            flip_events: 0,
        }
    }

    pub fn is_flipping(&self) -> bool {
        self.animation.is_some()
    }

    /// Start a flip unless one is already in progress or the target is
    /// out of range.
    fn begin_flip(&mut self, target: usize) {
        if target == self.current || target >= self.images.len() || self.animation.is_some() {
            return;
        }
        self.animation = Some(FlipAnimation { from: self.current, started: Instant::now() });
        self.current = target;
        self.flip_events += 1;
    }

    fn texture(&mut self, ctx: &egui::Context, index: usize) -> Option<egui::TextureHandle> {
        if !self.textures.contains_key(&index) {
            let image = self.images.get(index)?;
            let color = egui::ColorImage::from_rgba_unmultiplied(
                [image.width() as usize, image.height() as usize],
                image.as_raw(),
            );
            let handle =
                ctx.load_texture(format!("page_{index}"), color, egui::TextureOptions::LINEAR);
            self.textures.insert(index, handle);
        }
        self.textures.get(&index).cloned()
    }

    /// Paint the current page (and the outgoing one while a flip runs)
    /// into `rect`.
    pub fn draw(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let ctx = ui.ctx().clone();
        let painter = ui.painter_at(rect);
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        let progress = self.animation.as_ref().map(|anim| {
            anim.started.elapsed().as_secs_f32() / self.config.flipping_time.as_secs_f32()
        });

        match progress {
            Some(t) if t < 1.0 => {
                let anim = match self.animation.as_ref() {
                    Some(anim) => anim,
                    None => return,
                };
                let forward = self.current > anim.from;
                let eased = 1.0 - (1.0 - t) * (1.0 - t);
                let shift = rect.width() * eased * if forward { 1.0 } else { -1.0 };
                let (from, to) = (anim.from, self.current);

                if let Some(texture) = self.texture(&ctx, from) {
                    painter.image(
                        texture.id(),
                        rect.translate(egui::vec2(-shift, 0.0)),
                        uv,
                        egui::Color32::WHITE,
                    );
                }
                if let Some(texture) = self.texture(&ctx, to) {
                    let incoming = rect.width() * if forward { 1.0 } else { -1.0 } - shift;
                    painter.image(
                        texture.id(),
                        rect.translate(egui::vec2(incoming, 0.0)),
                        uv,
                        egui::Color32::WHITE,
                    );
                }
                if self.config.draw_shadow {
                    let alpha = (self.config.max_shadow_opacity
                        * (1.0 - (2.0 * t - 1.0).abs())
                        * 255.0) as u8;
                    painter.rect_filled(
                        rect,
                        egui::CornerRadius::ZERO,
                        egui::Color32::from_black_alpha(alpha),
                    );
                }
                ctx.request_repaint();
            }
            _ => {
                self.animation = None;
                if let Some(texture) = self.texture(&ctx, self.current) {
                    painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
                }
            }
        }
    }
}

impl FlipView for EguiFlipView {
    type Image = RgbaImage;

    fn load_images(&mut self, images: Vec<RgbaImage>) {
        self.images = images;
        self.textures.clear();
        self.current = self.current.min(self.images.len().saturating_sub(1));
        self.animation = None;
    }

    fn replace_images(&mut self, images: &[RgbaImage]) {
        if images.len() >= self.images.len() {
            // Append-only merge: existing pages (and their textures) are
            // unchanged, so an in-flight animation keeps its frames.
            for image in &images[self.images.len()..] {
                self.images.push(image.clone());
            }
        } else {
            self.load_images(images.to_vec());
        }
    }

    fn flip_to_page(&mut self, page_index: usize) {
        self.begin_flip(page_index);
    }

    fn flip_next(&mut self, _edge: FlipEdge) {
        if self.current + 1 < self.images.len() {
            self.begin_flip(self.current + 1);
        }
    }

    fn flip_prev(&mut self, _edge: FlipEdge) {
        if self.current > 0 {
            self.begin_flip(self.current - 1);
        }
    }

    fn current_page_index(&self) -> usize {
        self.current
    }

    fn page_count(&self) -> usize {
        self.images.len()
    }

    fn take_flip_events(&mut self) -> usize {
        std::mem::take(&mut self.flip_events)
    }
}
