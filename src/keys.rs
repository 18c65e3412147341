//! Storage key derivation.
//!
//! Persisted annotation buckets are keyed by page origin (or full URL when no
//! origin can be derived). To avoid writing raw identifying strings into the
//! key-value store, the hashed `v2` scheme addresses buckets by a 64-bit
//! FNV-1a digest instead. The hash is deterministic and non-cryptographic;
//! collisions are tolerated as a low-probability event, not defended against.

use url::Url;

/// Prefix for every key owned by this engine.
pub const APP_PREFIX: &str = "pagemark";

/// Key holding the timestamp of the last retention cleanup run.
pub const LAST_CLEANUP_KEY: &str = "pagemark:last-cleanup";

/// Version literal for the hashed key scheme.
pub const KEY_VERSION: &str = "v2";

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// 64-bit FNV-1a over the input's code points, with wraparound arithmetic.
pub fn fnv1a_64(input: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for ch in input.chars() {
        hash ^= ch as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hash an arbitrary string into a 16-character lowercase hex key.
pub fn hash_key(input: &str) -> String {
    hex::encode(fnv1a_64(input).to_be_bytes())
}

/// Extract the origin of a URL, falling back to the raw string when the
/// input does not parse or has no meaningful origin (e.g. `file:` URLs).
pub fn origin_of(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => {
            let origin = url.origin();
            if origin.is_tuple() {
                origin.ascii_serialization()
            } else {
                raw.to_string()
            }
        }
        Err(_) => raw.to_string(),
    }
}

/// Plain storage key for an origin's annotation bucket.
pub fn annotations_key(origin_or_url: &str) -> String {
    format!("{}:annotations:{}", APP_PREFIX, origin_or_url)
}

/// Prefix shared by all annotation bucket keys; cleanup iterates on this.
pub fn annotations_prefix() -> String {
    format!("{}:annotations:", APP_PREFIX)
}

/// Hashed (`v2`) storage key for an origin's annotation bucket.
pub fn hashed_key(origin_or_url: &str) -> String {
    format!("{}:{}", KEY_VERSION, hash_key(origin_or_url))
}
