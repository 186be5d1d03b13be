//! Path utilities for listing photo files.
//!
//! Maps file extensions to image content types and turns user-supplied
//! file names into fragments that are safe to embed in a storage key.

use std::path::Path;

/// Known image extensions and the content type each one maps to.
const IMAGE_CONTENT_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
];

/// Guess the content type of an image from its extension.
///
/// Returns `None` for unknown extensions or paths without one.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use rentpv_common::paths::image_content_type;
///
/// assert_eq!(image_content_type(Path::new("pool.webp")), Some("image/webp"));
/// assert_eq!(image_content_type(Path::new("README")), None);
/// ```
pub fn image_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    IMAGE_CONTENT_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, ct)| *ct)
}

/// Reduce a user-supplied file name to `[A-Za-z0-9._-]`.
///
/// Directory components are dropped, every other character becomes `_`,
/// and an empty result falls back to `photo`. Leading dots are stripped so
/// the fragment can never be `.` or `..`.
///
/// # Examples
///
/// ```
/// use rentpv_common::paths::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("Casa Azul (1).jpg"), "Casa_Azul__1_.jpg");
/// assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_file_name(""), "photo");
/// ```
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "photo".to_string()
    } else {
        cleaned.to_string()
    }
}
