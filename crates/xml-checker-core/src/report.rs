use crate::validator::FileCheckResult;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SUCCESS_MESSAGE: &str = "All XML files are well-formed.";
pub const BAD_FILES_HEADING: &str = "The following files are not well-formed:";

/// Aggregated outcome of scanning one directory tree.
///
/// Bad files are kept in the order the walk visited them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    root: PathBuf,
    checked_count: usize,
    bad_files: Vec<FileCheckResult>,
    duration: Duration,
}

impl ScanReport {
    pub(crate) fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            checked_count: 0,
            bad_files: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn record(&mut self, result: FileCheckResult) {
        self.checked_count += 1;
        if !result.well_formed() {
            self.bad_files.push(result);
        }
    }

    pub(crate) fn finish(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn checked_count(&self) -> usize {
        self.checked_count
    }

    pub fn bad_files(&self) -> &[FileCheckResult] {
        &self.bad_files
    }

    pub fn bad_paths(&self) -> impl Iterator<Item = &Path> {
        self.bad_files.iter().map(FileCheckResult::path)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// No malformed or unreadable files. Also true when nothing was checked.
    pub fn is_clean(&self) -> bool {
        self.bad_files.is_empty()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "{}", SUCCESS_MESSAGE);
        }
        writeln!(f)?;
        writeln!(f, "{}", BAD_FILES_HEADING)?;
        for path in self.bad_paths() {
            writeln!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{CheckFailure, Verdict};

    fn bad(path: &str) -> FileCheckResult {
        FileCheckResult::new(
            path,
            Verdict::NotWellFormed(CheckFailure::Malformed {
                message: "no element found".to_string(),
                line: 1,
                column: 1,
            }),
        )
    }

    #[test]
    fn test_empty_report_is_clean() {
        let report = ScanReport::new(Path::new("root"));
        assert!(report.is_clean());
        assert_eq!(report.checked_count(), 0);
        assert_eq!(report.to_string(), "All XML files are well-formed.\n");
    }

    #[test]
    fn test_record_keeps_only_bad_files_in_order() {
        let mut report = ScanReport::new(Path::new("root"));
        report.record(bad("root/z.xml"));
        report.record(FileCheckResult::new("root/good.xml", Verdict::WellFormed));
        report.record(bad("root/a.xml"));

        assert_eq!(report.checked_count(), 3);
        assert!(!report.is_clean());
        let paths: Vec<_> = report.bad_paths().collect();
        assert_eq!(paths, vec![Path::new("root/z.xml"), Path::new("root/a.xml")]);
        assert!(report.bad_files().iter().all(|r| r.diagnostic().is_some()));
        assert_eq!(
            report.to_string(),
            "\nThe following files are not well-formed:\nroot/z.xml\nroot/a.xml\n"
        );
    }
}
