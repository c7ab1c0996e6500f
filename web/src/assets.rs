use std::path::PathBuf;

use actix_files::Files;

/// Serves the roots at `/`, the first one holding the requested file wins.
/// Paths are percent-decoded and may not leave their root.
pub fn static_files(roots: &[PathBuf]) -> Option<Files> {
    roots.iter().rev().fold(None, |fallback, root| {
        let files = Files::new("/", root);
        Some(match fallback {
            Some(fallback) => files.default_handler(fallback),
            None => files,
        })
    })
}
