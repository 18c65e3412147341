//! Retention and quota management for persisted annotation buckets.
//!
//! The persisted store is shared across the whole installation and has a hard
//! budget, so the engine periodically prunes expired annotations and reports
//! how close the store is to its quota. Each bucket is an independent unit of
//! update: a cleanup pass never holds a cross-bucket transaction, so it is
//! safe to interrupt between buckets but not atomic across the store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use serde_json::Value;

use crate::annotation::normalize;
use crate::keys::{annotations_prefix, LAST_CLEANUP_KEY};
use crate::storage::AnnotationStore;
use crate::{Error, Result};

/// Default storage budget: 10 MiB.
pub const DEFAULT_QUOTA_BYTES: u64 = 10 * 1024 * 1024;

/// Default warning threshold as a fraction of the quota.
pub const DEFAULT_WARN_RATIO: f64 = 0.80;

/// Default minimum spacing between cleanup passes.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default retention window for annotations.
pub const DEFAULT_RETENTION_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Tunable retention parameters. Defaults match production; tests shrink them.
#[derive(Debug, Clone, Copy)]
pub struct RetentionConfig {
    /// Total storage budget in bytes.
    pub quota_bytes: u64,
    /// Fraction of the quota at which a warning is reported.
    pub warn_ratio: f64,
    /// Minimum spacing between cleanup passes.
    pub cleanup_interval: Duration,
    /// Annotations older than this are pruned.
    pub retention_window: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            quota_bytes: DEFAULT_QUOTA_BYTES,
            warn_ratio: DEFAULT_WARN_RATIO,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            retention_window: DEFAULT_RETENTION_WINDOW,
        }
    }
}

/// Result of a quota measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaStatus {
    /// False once `bytes_used >= quota`.
    pub ok: bool,
    /// True in the [warn_ratio, 100%) band.
    pub warning: bool,
    pub bytes_used: u64,
    pub bytes_total: u64,
    pub percent_used: f64,
}

/// Time-boxed cleanup and quota measurement over the annotation store.
#[derive(Clone)]
pub struct RetentionManager {
    store: Arc<dyn AnnotationStore>,
    config: RetentionConfig,
}

impl RetentionManager {
    pub fn new(store: Arc<dyn AnnotationStore>, config: RetentionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// Timestamp below which annotations are considered expired right now.
    pub fn retention_cutoff(&self) -> u64 {
        crate::now_ms().saturating_sub(self.config.retention_window.as_millis() as u64)
    }

    /// Measure how much of the storage budget is in use.
    ///
    /// Bytes-used is the encoded length of the entire persisted snapshot,
    /// falling through three measurement strategies of decreasing accuracy.
    pub async fn check_storage_quota(&self) -> Result<QuotaStatus> {
        let snapshot = self.store.snapshot().await?;
        let bytes_used = measure_snapshot_bytes(&snapshot);
        let bytes_total = self.config.quota_bytes;
        let percent_used = if bytes_total == 0 {
            100.0
        } else {
            (bytes_used as f64 / bytes_total as f64) * 100.0
        };
        let ok = bytes_used < bytes_total;
        let warning = ok && percent_used >= self.config.warn_ratio * 100.0;
        Ok(QuotaStatus {
            ok,
            warning,
            bytes_used,
            bytes_total,
            percent_used,
        })
    }

    /// Prune every annotation bucket: drop buckets that normalize to empty,
    /// filter out annotations at or below `cutoff`, and rewrite a bucket only
    /// when filtering shortened it. Removals and rewrites are each batched
    /// into a single store call.
    pub async fn cleanup_expired(&self, cutoff: u64) -> Result<()> {
        let snapshot = self.store.snapshot().await?;
        let prefix = annotations_prefix();

        let mut removals: Vec<String> = Vec::new();
        let mut updates: Vec<(String, Value)> = Vec::new();

        for (key, value) in &snapshot {
            if !key.starts_with(&prefix) {
                continue;
            }
            let annotations = normalize(value);
            if annotations.is_empty() {
                removals.push(key.clone());
                continue;
            }
            let before = annotations.len();
            let live: Vec<_> = annotations
                .into_iter()
                .filter(|a| a.timestamp > cutoff as f64)
                .collect();
            if live.is_empty() {
                removals.push(key.clone());
            } else if live.len() != before {
                let serialized = serde_json::to_value(&live)
                    .map_err(|e| Error::StorageError(format!("bucket serialization: {}", e)))?;
                updates.push((key.clone(), serialized));
            }
        }

        if !removals.is_empty() {
            self.store.remove_many(removals).await?;
        }
        if !updates.is_empty() {
            self.store.set_many(updates).await?;
        }
        Ok(())
    }

    /// Run a cleanup pass if the interval has elapsed since the last one.
    ///
    /// The last-run timestamp is persisted and updated before the pass starts
    /// so a slow cleanup cannot trigger a re-entrant run; the pass itself is
    /// spawned and not awaited. Failures are logged, never propagated.
    pub async fn maybe_run_cleanup(&self) -> bool {
        let now = crate::now_ms();

        let last = match self.store.get(LAST_CLEANUP_KEY).await {
            Ok(value) => value.and_then(|v| v.as_u64()).unwrap_or(0),
            Err(e) => {
                warn!("Failed to read last-cleanup timestamp: {}", e);
                return false;
            }
        };
        if now.saturating_sub(last) < self.config.cleanup_interval.as_millis() as u64 {
            return false;
        }

        // Stamp first; a failed stamp means no run this time around.
        if let Err(e) = self.store.set(LAST_CLEANUP_KEY, Value::from(now)).await {
            warn!("Failed to record cleanup timestamp: {}", e);
            return false;
        }

        let manager = self.clone();
        let cutoff = now.saturating_sub(self.config.retention_window.as_millis() as u64);
        tokio::spawn(async move {
            if let Err(e) = manager.cleanup_expired(cutoff).await {
                warn!("Annotation cleanup failed: {}", e);
            }
        });
        true
    }
}

/// Encoded byte length of the snapshot. Prefers exact serde encoding, falls
/// back to per-entry string lengths, then to a raw character count.
fn measure_snapshot_bytes(snapshot: &BTreeMap<String, Value>) -> u64 {
    if let Ok(encoded) = serde_json::to_vec(snapshot) {
        return encoded.len() as u64;
    }
    if let Some(total) = snapshot.iter().try_fold(0u64, |acc, (key, value)| {
        let rendered = serde_json::to_string(value).ok()?;
        Some(acc + key.len() as u64 + rendered.len() as u64)
    }) {
        return total;
    }
    snapshot
        .iter()
        .map(|(key, value)| (key.chars().count() + value.to_string().chars().count()) as u64)
        .sum()
}
