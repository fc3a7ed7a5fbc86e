//! Core layer: pure transformations shared by the transfer engine.

use std::path::Path;
use std::time::Duration;

/// Make a filename safe for the output directory.
///
/// Strips directory components, replaces every character outside
/// `[A-Za-z0-9.-]` with `_`, and forces a `.mp3` suffix (checked
/// case-insensitively). The result never contains a path separator and
/// the function is idempotent.
pub fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !sanitized.to_ascii_lowercase().ends_with(".mp3") {
        sanitized.push_str(".mp3");
    }
    sanitized
}

/// Delay before the given attempt (1-indexed; the first retry is attempt 2).
///
/// Linear in the attempt number: `attempt * base`, saturating.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(attempt)
}
