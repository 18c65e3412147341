//! Raster backend seam for the capture pipeline.
//!
//! The engine never owns pixels directly: composing and placeholder drawing
//! go through [`RasterBackend`], which a host supplies on top of whatever
//! surface API the page context offers. All coordinates at this seam are in
//! device pixels.

use futures::future::BoxFuture;

use crate::{Result, Viewport};

/// An axis-aligned rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// A solid color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Reported sizes of one root element (body or documentElement), in CSS px.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementExtent {
    pub scroll_width: f64,
    pub scroll_height: f64,
    pub offset_width: f64,
    pub offset_height: f64,
    pub client_width: f64,
    pub client_height: f64,
}

impl ElementExtent {
    fn max_width(&self) -> f64 {
        self.scroll_width.max(self.offset_width).max(self.client_width)
    }

    fn max_height(&self) -> f64 {
        self.scroll_height.max(self.offset_height).max(self.client_height)
    }
}

/// Geometry of the live document, as reported by the page context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentMetrics {
    pub viewport: Viewport,
    pub device_pixel_ratio: f64,
    pub body: ElementExtent,
    pub document: ElementExtent,
}

impl DocumentMetrics {
    /// Maximum reported document width in CSS px (never below the viewport).
    pub fn max_width(&self) -> f64 {
        self.body
            .max_width()
            .max(self.document.max_width())
            .max(self.viewport.width as f64)
    }

    /// Maximum reported document height in CSS px (never below the viewport).
    pub fn max_height(&self) -> f64 {
        self.body
            .max_height()
            .max(self.document.max_height())
            .max(self.viewport.height as f64)
    }
}

/// Capability surface the capture pipeline draws through.
///
/// `document_metrics` doubles as the liveness probe: an `Err` means there is
/// no page context at all, which is fatal for the calling capture operation.
pub trait RasterBackend: Send + Sync {
    /// A decoded tile image.
    type Image: Send;
    /// A mutable destination surface.
    type Surface: Send;

    /// Geometry of the live document, or an error when no document exists.
    fn document_metrics(&self) -> Result<DocumentMetrics>;

    /// Allocate a blank destination surface of the given device-pixel size.
    fn allocate(&self, width: u32, height: u32) -> Result<Self::Surface>;

    /// Decode a tile image from its reference (typically a data-URI).
    fn load_image(&self, reference: &str) -> BoxFuture<'_, Result<Self::Image>>;

    /// Draw `src` out of `image` into `dst` on the surface, scaling to fit.
    fn draw_region(
        &self,
        surface: &mut Self::Surface,
        image: &Self::Image,
        src: Region,
        dst: Region,
    ) -> Result<()>;

    /// Flood the surface with a solid color.
    fn fill(&self, surface: &mut Self::Surface, color: Rgba) -> Result<()>;

    /// Render one line of text centered on (x, y).
    fn draw_text(&self, surface: &mut Self::Surface, text: &str, x: f64, y: f64) -> Result<()>;

    /// Encode the surface as lossless PNG bytes.
    fn encode_png(&self, surface: &Self::Surface) -> Result<Vec<u8>>;
}
