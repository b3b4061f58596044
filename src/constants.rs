use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Extension every saved asset is written with.
pub const ASSET_EXTENSION: &str = "png";

/// Extensions recognised when scanning the asset root.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Directory under the asset root holding per-asset metadata sidecars.
pub const SIDECAR_DIR: &str = ".meta";

/// Eviction stops once usage falls to this share of the ceiling.
pub const EVICTION_TARGET_RATIO: f64 = 0.8;

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub static STORAGE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("storage id pattern is valid")
});
