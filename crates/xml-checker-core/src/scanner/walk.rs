use crate::config::AppConfig;
use crate::error::Error;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{error, trace, warn};
use walkdir::{DirEntry, WalkDir};

pub fn compile_ignore_patterns(ignore_globs: &[String]) -> Result<Vec<Pattern>, Error> {
    ignore_globs
        .iter()
        .map(|glob| {
            Pattern::new(glob).map_err(|source| Error::Pattern {
                pattern: glob.clone(),
                source,
            })
        })
        .collect()
}

/// Depth-first walk of `root` yielding candidate files in visitation order.
///
/// Entries are sorted by file name within each directory so repeated walks
/// over an unchanged tree produce the same sequence. Ignored directories are
/// pruned with their whole subtree. Unreadable entries are logged and skipped.
pub fn candidates<'a>(
    root: &'a Path,
    config: &'a AppConfig,
    ignore_patterns: &'a [Pattern],
) -> impl Iterator<Item = PathBuf> + 'a {
    WalkDir::new(root)
        .follow_links(config.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| entry.depth() == 0 || !is_ignored(root, entry, ignore_patterns))
        .filter_map(|entry_result| match entry_result {
            Ok(entry) => Some(entry),
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                if let Some(ancestor) = err.loop_ancestor() {
                    warn!(
                        "Skipping symlink loop at {} (points back to {})",
                        path,
                        ancestor.display()
                    );
                } else {
                    error!("Error reading {}: {}", path, err);
                }
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir() && !entry.path().is_dir())
        .filter(move |entry| {
            let selected = has_candidate_extension(entry.path(), config);
            if !selected {
                trace!("Skipping {}", entry.path().display());
            }
            selected
        })
        .map(DirEntry::into_path)
}

/// True when the file name ends in `.<ext>` for a configured extension, ignoring case.
///
/// A file named just `.xml` has no extension as far as `Path` is concerned,
/// but is still selected.
pub fn has_candidate_extension(path: &Path, config: &AppConfig) -> bool {
    if let Some(ext) = path.extension() {
        return config.is_candidate_extension(ext);
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_prefix('.'))
        .is_some_and(|ext| config.is_candidate_extension(ext))
}

fn is_ignored(root: &Path, entry: &DirEntry, ignore_patterns: &[Pattern]) -> bool {
    let path = entry.path();
    let relative = path.strip_prefix(root).unwrap_or(path);
    let ignored = ignore_patterns.iter().any(|pattern| {
        pattern.matches_path(path)
            || pattern.matches_path(relative)
            || entry
                .file_name()
                .to_str()
                .is_some_and(|name| pattern.matches(name))
    });
    if ignored {
        trace!("Ignoring {}", path.display());
    }
    ignored
}
