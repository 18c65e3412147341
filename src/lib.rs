//! Pagemark Annotation Engine
//!
//! An in-page feedback-annotation engine: users drop markers on a live web
//! page, attach comments and categories, capture a visual record, and persist
//! it per origin. This crate is the session activation, capture, and
//! persistence core behind that overlay:
//!
//! - **Lifecycle**: mounts/unmounts the overlay UI exactly once despite
//!   concurrent enable/disable requests and slow asynchronous mounting
//! - **Capture**: composes viewport-sized tiles into one full-page image
//!   under hard raster limits, with a placeholder fallback
//! - **Retention**: prunes persisted annotation buckets on a time box and
//!   measures the storage quota
//! - **Keys**: deterministic hashed addressing of per-origin buckets
//!
//! The surrounding UI, the capture collaborator that scrolls the page, and
//! the storage backend are all consumed through traits; hosts supply them.
//!
//! # Example
//!
//! ```
//! use pagemark::{keys, annotation};
//! use serde_json::json;
//!
//! // Buckets are addressed by a hashed key, never the raw URL.
//! let key = keys::hashed_key("https://example.com/");
//! assert!(key.starts_with("v2:"));
//!
//! // Raw persisted data is normalized defensively on every read.
//! let records = annotation::normalize(&json!([
//!     {"id": "m1", "comment": "logo is cut off", "timestamp": 1700000000000.0},
//!     {"broken": true},
//! ]));
//! assert_eq!(records.len(), 1);
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

pub mod error;
pub use error::{Error, Result};

pub mod activation;
pub mod annotation;
pub mod capture;
pub mod keys;
pub mod lifecycle;
pub mod retention;
pub mod storage;

// Re-export the main engine types at the crate root for ergonomic use
pub use activation::{ActivationAction, ActivationFailure, ActivationOutcome};
pub use annotation::{Annotation, BoundingBox, Category};
pub use capture::{CaptureStitcher, CaptureTile, RasterLimits, Screenshot};
pub use lifecycle::{ToolbarHandle, ToolbarLifecycle, ToolbarMounter};
pub use retention::{QuotaStatus, RetentionConfig, RetentionManager};
pub use storage::{AnnotationStore, MemoryStore};

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
