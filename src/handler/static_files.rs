//! Static file serving module
//!
//! Development-only lookup of files under a static root. Reads are synchronous
//! and happen inline during dispatch.

use crate::http::{mime, Response};
use crate::logger;
use std::fs;
use std::path::Path;

/// Serve `path` from `static_root` when it starts with `prefix`.
///
/// Returns `None` for paths outside the prefix, missing files, directories,
/// unreadable files, and anything that resolves outside the root.
pub fn serve(static_root: &str, prefix: &str, path: &str) -> Option<Response> {
    let relative_path = path.strip_prefix(prefix)?;
    let (content, content_type, charset) = load_from_directory(static_root, relative_path)?;

    Some(
        Response::new(content)
            .with_content_type(content_type)
            .with_charset(charset),
    )
}

/// Load a file below `static_dir`, with its content type and charset
pub fn load_from_directory(
    static_dir: &str,
    relative_path: &str,
) -> Option<(Vec<u8>, &'static str, Option<&'static str>)> {
    let file_path = Path::new(static_dir).join(relative_path.trim_start_matches('/'));

    // Security: ensure file_path is within static_dir
    let static_dir_canonical = match Path::new(static_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{static_dir}': {e}"
            ));
            return None;
        }
    };

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            relative_path,
            file_path_canonical.display()
        ));
        return None;
    }
    if !file_path_canonical.is_file() {
        return None;
    }

    let content = match fs::read(&file_path_canonical) {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path_canonical.display(),
                e
            ));
            return None;
        }
    };

    let (content_type, charset) =
        mime::get_content_type(file_path_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type, charset))
}
