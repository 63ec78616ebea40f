use crate::report::ScanReport;
use crate::validator::FileCheckResult;
use std::path::Path;

/// Trait for observing a scan as it runs.
///
/// The CLI implements this to print diagnostics as files are checked.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &Path) {}
    fn on_file_checked(&self, _result: &FileCheckResult) {}
    fn on_scan_complete(&self, _report: &ScanReport) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
