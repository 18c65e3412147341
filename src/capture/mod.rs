//! Full-page capture: stitching viewport tiles into one bounded raster.
//!
//! The capture collaborator scrolls the page and hands back one tile per
//! viewport position; [`CaptureStitcher`] composes them into a single image
//! under hard platform raster limits (maximum total area and maximum single
//! dimension), degrading to a placeholder when capture is impossible.

pub mod raster;

use log::warn;

use crate::{Error, Result, Viewport};
use raster::{RasterBackend, Region, Rgba};

/// Background color of synthesized placeholder screenshots.
const PLACEHOLDER_FILL: Rgba = Rgba::new(240, 240, 242, 255);

/// One viewport-sized capture plus the scroll offset it was taken at.
///
/// Consumed once by the stitcher and discarded.
#[derive(Debug, Clone)]
pub struct CaptureTile {
    /// Backend-decodable image reference (typically a data-URI).
    pub image: String,
    /// Vertical scroll position the tile was captured at, CSS px.
    pub scroll_y: f64,
}

/// Hard raster limits of the target platform.
#[derive(Debug, Clone, Copy)]
pub struct RasterLimits {
    /// Maximum total pixel area of one surface.
    pub max_area: f64,
    /// Maximum single dimension of one surface.
    pub max_dimension: f64,
}

impl Default for RasterLimits {
    fn default() -> Self {
        Self {
            max_area: 16384.0 * 16384.0,
            max_dimension: 16384.0,
        }
    }
}

/// A composed page image.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Screenshot {
    /// Render as a `data:image/png;base64,` URI for embedding in a record.
    pub fn to_data_uri(&self) -> String {
        use base64::Engine as _;
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png_data)
        )
    }
}

/// Uniform downscale factor that keeps `raw_width x raw_height` inside the
/// limits. Preserves aspect ratio and never upscales.
pub fn compute_scale(raw_width: f64, raw_height: f64, limits: &RasterLimits) -> f64 {
    if raw_width <= 0.0 || raw_height <= 0.0 {
        return 1.0;
    }
    let area_scale = (limits.max_area / (raw_width * raw_height)).sqrt();
    let width_scale = limits.max_dimension / raw_width;
    let height_scale = limits.max_dimension / raw_height;
    1.0_f64.min(area_scale).min(width_scale).min(height_scale)
}

/// Composes capture tiles through a host-supplied raster backend.
pub struct CaptureStitcher<R: RasterBackend> {
    backend: R,
    limits: RasterLimits,
}

impl<R: RasterBackend> CaptureStitcher<R> {
    pub fn new(backend: R) -> Self {
        Self {
            backend,
            limits: RasterLimits::default(),
        }
    }

    pub fn with_limits(backend: R, limits: RasterLimits) -> Self {
        Self { backend, limits }
    }

    pub fn backend(&self) -> &R {
        &self.backend
    }

    /// Assemble one full-page image from viewport tiles.
    ///
    /// Tiles are drawn strictly in input order; a tile whose visible slice is
    /// not positive (past the end of the page) is skipped. An empty tile list
    /// yields a correctly-sized blank surface. A missing document context or
    /// a failed surface allocation is an error, never a silent blank output.
    pub async fn stitch(
        &self,
        tiles: &[CaptureTile],
        viewport: Viewport,
        total_height: f64,
        device_pixel_ratio: f64,
    ) -> Result<Screenshot> {
        self.backend.document_metrics()?;
        if device_pixel_ratio <= 0.0 {
            return Err(Error::ConfigError(format!(
                "device pixel ratio must be positive, got {}",
                device_pixel_ratio
            )));
        }

        let raw_width = viewport.width as f64 * device_pixel_ratio;
        let raw_height = total_height * device_pixel_ratio;
        let scale = compute_scale(raw_width, raw_height, &self.limits);

        let dest_width = ((raw_width * scale).round() as u32).max(1);
        let dest_height = ((raw_height * scale).round() as u32).max(1);
        let mut surface = self.backend.allocate(dest_width, dest_height)?;

        for tile in tiles {
            // Visible slice of this tile, clamped to the page end.
            let visible = (total_height - tile.scroll_y).min(viewport.height as f64);
            if visible <= 0.0 {
                continue;
            }
            let image = match self.backend.load_image(&tile.image).await {
                Ok(image) => image,
                Err(e) => {
                    warn!("Skipping tile at scroll {}: {}", tile.scroll_y, e);
                    continue;
                }
            };
            let src = Region::new(
                0.0,
                0.0,
                viewport.width as f64 * device_pixel_ratio,
                visible * device_pixel_ratio,
            );
            let dst = Region::new(
                0.0,
                (tile.scroll_y * device_pixel_ratio * scale).round(),
                (viewport.width as f64 * device_pixel_ratio * scale).round(),
                (visible * device_pixel_ratio * scale).round(),
            );
            self.backend.draw_region(&mut surface, &image, src, dst)?;
        }

        let png_data = self.backend.encode_png(&surface)?;
        Ok(Screenshot {
            width: dest_width,
            height: dest_height,
            png_data,
        })
    }

    /// Synthesize a flat-colored stand-in screenshot when capture is
    /// unavailable, sized to the document's maximum reported dimensions.
    ///
    /// Fails fast when no live document context exists.
    pub async fn placeholder(&self, message: &str, subtitle: &str) -> Result<Screenshot> {
        let metrics = self.backend.document_metrics()?;
        let dpr = metrics.device_pixel_ratio.max(1.0);

        let width = ((metrics.max_width() * dpr).round() as u32).max(1);
        let height = ((metrics.max_height() * dpr).round() as u32).max(1);
        let mut surface = self.backend.allocate(width, height)?;

        self.backend.fill(&mut surface, PLACEHOLDER_FILL)?;
        let center_x = width as f64 / 2.0;
        let center_y = height as f64 / 2.0;
        self.backend
            .draw_text(&mut surface, message, center_x, center_y - 24.0 * dpr)?;
        self.backend
            .draw_text(&mut surface, subtitle, center_x, center_y + 24.0 * dpr)?;

        let png_data = self.backend.encode_png(&surface)?;
        Ok(Screenshot {
            width,
            height,
            png_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_one_within_limits() {
        let limits = RasterLimits::default();
        assert_eq!(compute_scale(1280.0, 4000.0, &limits), 1.0);
        assert_eq!(compute_scale(1.0, 1.0, &limits), 1.0);
    }

    #[test]
    fn scale_caps_total_area() {
        let limits = RasterLimits {
            max_area: 10_000.0,
            max_dimension: 1_000_000.0,
        };
        let scale = compute_scale(1000.0, 1000.0, &limits);
        let area = (1000.0 * scale) * (1000.0 * scale);
        assert!(area <= limits.max_area * 1.0001);
        assert!(scale < 1.0);
    }

    #[test]
    fn scale_caps_single_dimension() {
        let limits = RasterLimits {
            max_area: f64::MAX,
            max_dimension: 100.0,
        };
        let scale = compute_scale(50.0, 400.0, &limits);
        assert!(400.0 * scale <= 100.0);
        // Aspect ratio is preserved by using one uniform factor.
        assert_eq!(scale, 0.25);
    }

    #[test]
    fn degenerate_sizes_do_not_divide_by_zero() {
        let limits = RasterLimits::default();
        assert_eq!(compute_scale(0.0, 100.0, &limits), 1.0);
        assert_eq!(compute_scale(-5.0, 100.0, &limits), 1.0);
    }

    #[test]
    fn data_uri_has_png_header() {
        let shot = Screenshot {
            width: 1,
            height: 1,
            png_data: vec![0x89, 0x50, 0x4e, 0x47],
        };
        assert!(shot.to_data_uri().starts_with("data:image/png;base64,"));
    }
}
