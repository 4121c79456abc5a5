use crate::error::{Error, Result};
use log::debug;
use std::path::PathBuf;
use walkdir::WalkDir;

/// File scanner for locating route handler files.
///
/// The `FileScanner` recursively walks a project directory and collects every
/// file whose name ends with the routing convention's filename marker
/// (`+server.ts` in a SvelteKit tree). Directories named `node_modules` and
/// hidden directories (those starting with `.`) are pruned; route files never
/// live there and descending into them dominates scan cost.
///
/// Traversal failures are scan-fatal: an unreadable root, a permission error
/// or a symlink loop aborts the pass rather than producing a partial file
/// set.
///
/// # Example
///
/// ```no_run
/// use openapi_from_routes::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-app"));
/// let files = scanner.scan("+server.ts").unwrap();
/// println!("Found {} route files", files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all files ending with `marker`.
    ///
    /// No ordering guarantee is made on the returned set; the route map is
    /// keyed by file path, so downstream consumers are order-independent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scan`] if the root directory or any entry under it
    /// cannot be traversed.
    pub fn scan(&self, marker: &str) -> Result<Vec<PathBuf>> {
        let mut route_files = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_node_modules = e.file_type().is_dir() && file_name == "node_modules";

                !is_hidden && !is_node_modules
            })
        {
            let entry = entry.map_err(|e| Error::Scan {
                root: self.root_path.clone(),
                source: e,
            })?;

            let path = entry.path();
            if path.is_file() && path.to_string_lossy().ends_with(marker) {
                debug!("Found route file: {}", path.display());
                route_files.push(path.to_path_buf());
            }
        }

        Ok(route_files)
    }
}
