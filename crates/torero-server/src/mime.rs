//! Extension to Content-Type lookup
//!
//! A fixed table, checked in order:
//!
//! | extension          | Content-Type                          |
//! |--------------------|---------------------------------------|
//! | `png`, `jpg`, `gif`| `image/<ext>`                         |
//! | `pdf`              | `application/pdf`                     |
//! | anything else      | `text/<ext>; charset=iso-8859-1`      |
//! | none               | `text/plain; charset=iso-8859-1`      |
//!
//! Matching is case-sensitive.

use std::path::Path;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "gif"];

/// Extension of the final path component, without the dot
///
/// Returns `""` for names without a dot and for dotfiles like `.profile`.
pub fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

/// Content-Type header value for an extension
pub fn content_type(extension: &str) -> String {
    if IMAGE_EXTENSIONS.contains(&extension) {
        format!("image/{}", extension)
    } else if extension == "pdf" {
        String::from("application/pdf")
    } else if extension.is_empty() {
        String::from("text/plain; charset=iso-8859-1")
    } else {
        format!("text/{}; charset=iso-8859-1", extension)
    }
}

/// Content-Type for a file path
pub fn content_type_for(path: &Path) -> String {
    content_type(extension_of(path))
}
