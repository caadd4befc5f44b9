// Cross-platform file utilities

use std::path::{Path, PathBuf};

/// File utilities for cross-platform operations
pub struct FileUtils;

impl FileUtils {
    /// Collect test files under `path`, in path order.
    ///
    /// A file given directly is kept whatever its extension. Directories are
    /// walked for files with one of `extensions`, skipping hidden entries.
    pub fn collect_test_files(path: &Path, extensions: &[String]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        if path.is_file() {
            files.push(path.to_path_buf());
        } else if path.is_dir() {
            let walker = walkdir::WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    // Always include the root directory itself, even if it starts with '.'
                    if e.depth() == 0 {
                        return true;
                    }
                    !e.file_name().to_string_lossy().starts_with('.')
                });

            for entry in walker.flatten() {
                if entry.file_type().is_file() && Self::has_extension(entry.path(), extensions) {
                    files.push(entry.path().to_path_buf());
                }
            }
        }

        files
    }

    /// Check if file has one of the given extensions
    pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy())
            .is_some_and(|ext| extensions.iter().any(|e| e.trim_start_matches('.') == ext))
    }
}
