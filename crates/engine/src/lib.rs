//! Document collaborator for the flipbook viewer.
//!
//! The viewer never talks to a PDF library directly; it goes through the
//! [`PdfEngine`] trait, which exposes exactly what the flipbook needs:
//! open a document, ask for its page count, and rasterize one page at a
//! given scale. The default backend parses documents with `lopdf` and
//! renders placeholder bitmaps; the `pdfium` feature swaps in real
//! rasterization.

use image::{ImageBuffer, Rgba};
use lopdf::Document;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Opaque reference to an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Page dimensions in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// A single page rasterization request. Page indices are 0-based; the
/// 1-based numbering of the PDF itself stays inside the backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: u32,
    pub scale: f32,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self { page_index: 0, scale: 1.0 }
    }
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

/// The rasterization seam the rest of the workspace is written against.
pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError>;
    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, EngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, EngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError>;
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    page_sizes: Vec<PageSize>,
}

/// Default backend: page geometry from `lopdf`, placeholder bitmaps.
///
/// Rendering draws a bordered white sheet with a per-page tick row so
/// flipping through a document stays visually legible without a native
/// rasterizer on the machine.
#[derive(Debug, Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_sizes(bytes: &[u8]) -> Result<Vec<PageSize>, EngineError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(EngineError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    Some(PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
                })
                .unwrap_or(PageSize { width_pt: 612.0, height_pt: 792.0 });

            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(EngineError::Backend("document has no pages".to_owned()));
        }

        Ok(sizes)
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, EngineError> {
        self.docs.get(&handle).ok_or(EngineError::InvalidHandle(handle.raw()))
    }
}

impl PdfEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let page_sizes = Self::parse_sizes(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        self.docs.insert(handle, DocumentRecord { page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, EngineError> {
        let record = self.record(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(EngineError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, EngineError> {
        let page_size = self.page_size(handle, request.page_index)?;
        let scale = if request.scale <= 0.0 { 1.0 } else { request.scale };

        let width = (page_size.width_pt * scale).round().max(1.0) as u32;
        let height = (page_size.height_pt * scale).round().max(1.0) as u32;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        let border = Rgba([220, 220, 220, 255]);
        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, border);
                image.put_pixel(x, height - 1, border);
            }
            for y in 0..height {
                image.put_pixel(0, y, border);
                image.put_pixel(width - 1, y, border);
            }
        }

        // One tick per page number in the top margin, so flipped pages
        // are distinguishable when the placeholder backend is in use.
        let tick = Rgba([60, 60, 60, 255]);
        let tick_count = request.page_index + 1;
        for n in 0..tick_count {
            let x0 = 8 + n * 6;
            if x0 + 3 >= width || height < 16 {
                break;
            }
            for x in x0..x0 + 3 {
                for y in 8..12.min(height) {
                    image.put_pixel(x, y, tick);
                }
            }
        }

        Ok(image)
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(EngineError::InvalidHandle(handle.raw()))
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}

#[cfg(feature = "pdfium")]
pub mod pdfium_backend {
    use super::*;
    use pdfium_render::prelude as pdfium;
    use pdfium_render::prelude::Pdfium;

    /// Real rasterization through a system PDFium library.
    ///
    /// The `Pdfium` binding is leaked so loaded documents can carry the
    /// `'static` lifetime the binding API requires; the engine lives for
    /// the whole process in practice.
    pub struct PdfiumEngine {
        pdfium: &'static Pdfium,
        next_handle: u64,
        docs: HashMap<DocumentHandle, pdfium::PdfDocument<'static>>,
    }

    impl PdfiumEngine {
        pub fn from_system_library() -> Result<Self, EngineError> {
            let bindings = Pdfium::bind_to_system_library().map_err(|err| {
                EngineError::Backend(format!("failed to bind pdfium system library: {err}"))
            })?;

            Ok(Self {
                pdfium: Box::leak(Box::new(Pdfium::new(bindings))),
                next_handle: 0,
                docs: HashMap::new(),
            })
        }

        fn document(
            &self,
            handle: DocumentHandle,
        ) -> Result<&pdfium::PdfDocument<'static>, EngineError> {
            self.docs.get(&handle).ok_or(EngineError::InvalidHandle(handle.raw()))
        }
    }

    impl PdfEngine for PdfiumEngine {
        fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError> {
            let document = match source {
                OpenSource::Path(path) => self
                    .pdfium
                    .load_pdf_from_file(&path, None)
                    .map_err(|e| EngineError::Backend(e.to_string()))?,
                OpenSource::Bytes(bytes) => {
                    let data: &'static [u8] = Box::leak(bytes.into_boxed_slice());
                    self.pdfium
                        .load_pdf_from_byte_slice(data, None)
                        .map_err(|e| EngineError::Backend(e.to_string()))?
                }
            };

            self.next_handle += 1;
            let handle = DocumentHandle(self.next_handle);
            self.docs.insert(handle, document);

            Ok(handle)
        }

        fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError> {
            Ok(self.document(handle)?.pages().len() as u32)
        }

        fn page_size(
            &self,
            handle: DocumentHandle,
            page_index: u32,
        ) -> Result<PageSize, EngineError> {
            let document = self.document(handle)?;
            let page_count = document.pages().len() as u32;
            let page = document
                .pages()
                .get(page_index as u16)
                .map_err(|_| EngineError::PageOutOfRange { page: page_index, page_count })?;

            Ok(PageSize { width_pt: page.width().value, height_pt: page.height().value })
        }

        fn render_page(
            &self,
            handle: DocumentHandle,
            request: RenderRequest,
        ) -> Result<RgbaImage, EngineError> {
            let size = self.page_size(handle, request.page_index)?;
            let scale = if request.scale <= 0.0 { 1.0 } else { request.scale };

            let width = (size.width_pt * scale).round().max(1.0) as i32;
            let height = (size.height_pt * scale).round().max(1.0) as i32;

            let document = self.document(handle)?;
            let page_count = document.pages().len() as u32;
            let page = document.pages().get(request.page_index as u16).map_err(|_| {
                EngineError::PageOutOfRange { page: request.page_index, page_count }
            })?;

            let config = pdfium::PdfRenderConfig::new()
                .set_target_width(width)
                .set_target_height(height);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| EngineError::Backend(e.to_string()))?;

            let rgba = bitmap.as_rgba_bytes().to_vec();
            RgbaImage::from_raw(width as u32, height as u32, rgba)
                .ok_or_else(|| EngineError::Backend("pdfium bitmap size mismatch".to_owned()))
        }

        fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError> {
            self.docs
                .remove(&handle)
                .map(|_| ())
                .ok_or(EngineError::InvalidHandle(handle.raw()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Scriptable engine for tests: fixed page count and size, a set of
    /// page indices that fail to render, and a log of render calls.
    pub struct StubEngine {
        page_count: u32,
        page_size: PageSize,
        failing_pages: HashSet<u32>,
        opened: bool,
        render_log: Mutex<Vec<u32>>,
    }

    impl StubEngine {
        pub fn with_pages(page_count: u32) -> Self {
            Self {
                page_count,
                page_size: PageSize { width_pt: 600.0, height_pt: 800.0 },
                failing_pages: HashSet::new(),
                opened: false,
                render_log: Mutex::new(Vec::new()),
            }
        }

        pub fn page_size_pt(mut self, width_pt: f32, height_pt: f32) -> Self {
            self.page_size = PageSize { width_pt, height_pt };
            self
        }

        pub fn failing_page(mut self, page_index: u32) -> Self {
            self.failing_pages.insert(page_index);
            self
        }

        /// Page indices passed to `render_page`, in call order.
        pub fn rendered_pages(&self) -> Vec<u32> {
            self.render_log.lock().unwrap().clone()
        }
    }

    impl PdfEngine for StubEngine {
        fn open(&mut self, _source: OpenSource) -> Result<DocumentHandle, EngineError> {
            self.opened = true;
            Ok(DocumentHandle(1))
        }

        fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError> {
            if !self.opened {
                return Err(EngineError::InvalidHandle(handle.raw()));
            }
            Ok(self.page_count)
        }

        fn page_size(
            &self,
            handle: DocumentHandle,
            page_index: u32,
        ) -> Result<PageSize, EngineError> {
            if !self.opened {
                return Err(EngineError::InvalidHandle(handle.raw()));
            }
            if page_index >= self.page_count {
                return Err(EngineError::PageOutOfRange {
                    page: page_index,
                    page_count: self.page_count,
                });
            }
            Ok(self.page_size)
        }

        fn render_page(
            &self,
            handle: DocumentHandle,
            request: RenderRequest,
        ) -> Result<RgbaImage, EngineError> {
            let size = self.page_size(handle, request.page_index)?;
            self.render_log.lock().unwrap().push(request.page_index);

            if self.failing_pages.contains(&request.page_index) {
                return Err(EngineError::Backend(format!(
                    "scripted failure for page {}",
                    request.page_index
                )));
            }

            let scale = if request.scale <= 0.0 { 1.0 } else { request.scale };
            let width = (size.width_pt * scale).round().max(1.0) as u32;
            let height = (size.height_pt * scale).round().max(1.0) as u32;

            Ok(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
        }

        fn close(&mut self, _handle: DocumentHandle) -> Result<(), EngineError> {
            self.opened = false;
            Ok(())
        }
    }
}
