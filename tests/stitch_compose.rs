//! Composition tests for the capture stitcher, driven by a scripted raster
//! backend that records every drawing call instead of touching pixels.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use pagemark::capture::raster::{
    DocumentMetrics, ElementExtent, RasterBackend, Region, Rgba,
};
use pagemark::capture::{compute_scale, CaptureStitcher, CaptureTile, RasterLimits};
use pagemark::{Error, Result, Viewport};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Allocate(u32, u32),
    Draw { image: String, src: Region, dst: Region },
    Fill(Rgba),
    Text(String, f64, f64),
    Encode,
}

/// Backend that logs calls; images are just their reference strings.
struct ScriptedRaster {
    metrics: Option<DocumentMetrics>,
    log: Arc<Mutex<Vec<Call>>>,
    failing_image: Option<String>,
}

impl ScriptedRaster {
    fn new(metrics: Option<DocumentMetrics>) -> Self {
        Self {
            metrics,
            log: Arc::new(Mutex::new(Vec::new())),
            failing_image: None,
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }
}

impl RasterBackend for ScriptedRaster {
    type Image = String;
    type Surface = ();

    fn document_metrics(&self) -> Result<DocumentMetrics> {
        self.metrics
            .ok_or_else(|| Error::EnvironmentUnavailable("no document".to_string()))
    }

    fn allocate(&self, width: u32, height: u32) -> Result<()> {
        self.log.lock().unwrap().push(Call::Allocate(width, height));
        Ok(())
    }

    fn load_image(&self, reference: &str) -> BoxFuture<'_, Result<String>> {
        let reference = reference.to_string();
        Box::pin(async move {
            if self.failing_image.as_deref() == Some(reference.as_str()) {
                Err(Error::RasterError(format!("decode failed: {}", reference)))
            } else {
                Ok(reference)
            }
        })
    }

    fn draw_region(
        &self,
        _surface: &mut (),
        image: &String,
        src: Region,
        dst: Region,
    ) -> Result<()> {
        self.log.lock().unwrap().push(Call::Draw {
            image: image.clone(),
            src,
            dst,
        });
        Ok(())
    }

    fn fill(&self, _surface: &mut (), color: Rgba) -> Result<()> {
        self.log.lock().unwrap().push(Call::Fill(color));
        Ok(())
    }

    fn draw_text(&self, _surface: &mut (), text: &str, x: f64, y: f64) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(Call::Text(text.to_string(), x, y));
        Ok(())
    }

    fn encode_png(&self, _surface: &()) -> Result<Vec<u8>> {
        self.log.lock().unwrap().push(Call::Encode);
        Ok(vec![0x89, 0x50, 0x4e, 0x47])
    }
}

fn metrics(viewport: Viewport, dpr: f64) -> DocumentMetrics {
    DocumentMetrics {
        viewport,
        device_pixel_ratio: dpr,
        body: ElementExtent::default(),
        document: ElementExtent::default(),
    }
}

fn tiles(scrolls: &[f64]) -> Vec<CaptureTile> {
    scrolls
        .iter()
        .enumerate()
        .map(|(i, &scroll_y)| CaptureTile {
            image: format!("tile-{}", i),
            scroll_y,
        })
        .collect()
}

#[tokio::test]
async fn tiles_are_drawn_in_order_and_the_last_slice_is_clamped() {
    let viewport = Viewport { width: 200, height: 100 };
    let stitcher = CaptureStitcher::new(ScriptedRaster::new(Some(metrics(viewport, 1.0))));

    let shot = stitcher
        .stitch(&tiles(&[0.0, 100.0, 190.0]), viewport, 240.0, 1.0)
        .await
        .unwrap();
    assert_eq!((shot.width, shot.height), (200, 240));

    let draws: Vec<Call> = stitcher
        .backend()
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Draw { .. }))
        .collect();
    assert_eq!(draws.len(), 3);

    // Full first tile at the top.
    assert_eq!(
        draws[0],
        Call::Draw {
            image: "tile-0".to_string(),
            src: Region::new(0.0, 0.0, 200.0, 100.0),
            dst: Region::new(0.0, 0.0, 200.0, 100.0),
        }
    );
    // The third tile only contributes its top 50 px slice.
    assert_eq!(
        draws[2],
        Call::Draw {
            image: "tile-2".to_string(),
            src: Region::new(0.0, 0.0, 200.0, 50.0),
            dst: Region::new(0.0, 190.0, 200.0, 50.0),
        }
    );
}

#[tokio::test]
async fn tiles_past_the_page_end_are_skipped() {
    let viewport = Viewport { width: 200, height: 100 };
    let stitcher = CaptureStitcher::new(ScriptedRaster::new(Some(metrics(viewport, 1.0))));

    stitcher
        .stitch(&tiles(&[0.0, 240.0, 300.0]), viewport, 240.0, 1.0)
        .await
        .unwrap();

    let draws = stitcher
        .backend()
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Draw { .. }))
        .count();
    assert_eq!(draws, 1);
}

#[tokio::test]
async fn oversized_captures_are_scaled_within_limits() {
    let viewport = Viewport { width: 200, height: 100 };
    let limits = RasterLimits {
        max_area: 10_000.0,
        max_dimension: 1_000_000.0,
    };
    // Raw raster would be 200 x 200 = 40000 px; scale is exactly 0.5.
    assert_eq!(compute_scale(200.0, 200.0, &limits), 0.5);

    let stitcher = CaptureStitcher::with_limits(
        ScriptedRaster::new(Some(metrics(viewport, 1.0))),
        limits,
    );
    let shot = stitcher
        .stitch(&tiles(&[0.0, 100.0]), viewport, 200.0, 1.0)
        .await
        .unwrap();

    assert_eq!((shot.width, shot.height), (100, 100));
    assert!((shot.width as f64) * (shot.height as f64) <= limits.max_area);

    // The second tile lands at half its device offset.
    let calls = stitcher.backend().calls();
    let second = calls
        .iter()
        .rev()
        .find_map(|c| match c {
            Call::Draw { image, dst, .. } if image == "tile-1" => Some(*dst),
            _ => None,
        })
        .unwrap();
    assert_eq!(second.y, 50.0);
    assert_eq!(second.height, 50.0);
}

#[tokio::test]
async fn within_limits_nothing_is_scaled() {
    let viewport = Viewport { width: 120, height: 100 };
    let stitcher = CaptureStitcher::new(ScriptedRaster::new(Some(metrics(viewport, 2.0))));

    let shot = stitcher
        .stitch(&tiles(&[0.0, 100.0]), viewport, 240.0, 2.0)
        .await
        .unwrap();

    // Destination is the raw device-pixel size.
    assert_eq!((shot.width, shot.height), (240, 480));
    assert!(stitcher
        .backend()
        .calls()
        .contains(&Call::Allocate(240, 480)));
}

#[tokio::test]
async fn empty_tile_list_yields_a_blank_surface_of_the_right_size() {
    let viewport = Viewport { width: 200, height: 100 };
    let stitcher = CaptureStitcher::new(ScriptedRaster::new(Some(metrics(viewport, 1.0))));

    let shot = stitcher.stitch(&[], viewport, 240.0, 1.0).await.unwrap();

    assert_eq!((shot.width, shot.height), (200, 240));
    assert_eq!(shot.png_data[..4], [0x89, 0x50, 0x4e, 0x47]);
    let draws = stitcher
        .backend()
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Draw { .. }))
        .count();
    assert_eq!(draws, 0);
}

#[tokio::test]
async fn a_failed_tile_is_skipped_not_fatal() {
    let viewport = Viewport { width: 200, height: 100 };
    let mut backend = ScriptedRaster::new(Some(metrics(viewport, 1.0)));
    backend.failing_image = Some("tile-0".to_string());
    let stitcher = CaptureStitcher::new(backend);

    stitcher
        .stitch(&tiles(&[0.0, 100.0]), viewport, 200.0, 1.0)
        .await
        .unwrap();

    let drawn: Vec<String> = stitcher
        .backend()
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Draw { image, .. } => Some(image),
            _ => None,
        })
        .collect();
    assert_eq!(drawn, vec!["tile-1".to_string()]);
}

#[tokio::test]
async fn missing_document_context_is_fatal_never_blank() {
    let viewport = Viewport { width: 200, height: 100 };
    let stitcher = CaptureStitcher::new(ScriptedRaster::new(None));

    let err = stitcher
        .stitch(&tiles(&[0.0]), viewport, 100.0, 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EnvironmentUnavailable(_)));

    let err = stitcher.placeholder("Capture failed", "x").await.unwrap_err();
    assert!(matches!(err, Error::EnvironmentUnavailable(_)));
}

#[tokio::test]
async fn placeholder_is_sized_to_the_document_and_carries_both_lines() {
    let viewport = Viewport { width: 1280, height: 720 };
    let mut m = metrics(viewport, 2.0);
    m.body.scroll_height = 2000.0;
    m.body.scroll_width = 500.0;
    let stitcher = CaptureStitcher::new(ScriptedRaster::new(Some(m)));

    let shot = stitcher
        .placeholder("Screenshot unavailable", "Open the page to retry")
        .await
        .unwrap();

    // max(body, document, viewport) in CSS px, times dpr.
    assert_eq!((shot.width, shot.height), (2560, 4000));

    let calls = stitcher.backend().calls();
    assert!(matches!(calls[1], Call::Fill(_)));
    let texts: Vec<String> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Text(text, _, _) => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            "Screenshot unavailable".to_string(),
            "Open the page to retry".to_string()
        ]
    );
}
