use crate::config::AppConfig;
use crate::error::Error;
use crate::progress::{ProgressReporter, SilentReporter};
use crate::report::ScanReport;
use crate::scanner;
use crate::validator;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

pub struct ScanEngine {
    config: AppConfig,
}

impl ScanEngine {
    pub fn new(mut config: AppConfig) -> Self {
        config.normalize();
        Self { config }
    }

    /// Check every candidate file under `root`, one at a time, in walk order.
    ///
    /// Per-file failures end up in the report; only a bad root or a bad
    /// ignore pattern makes this return an error.
    pub fn scan(&self, root: &Path, reporter: &dyn ProgressReporter) -> Result<ScanReport, Error> {
        if !root.is_dir() {
            return Err(Error::InvalidRoot(root.to_path_buf()));
        }
        let ignore_patterns = scanner::compile_ignore_patterns(&self.config.ignore_patterns)?;

        info!(
            "Scanning {} for {} files",
            root.display(),
            self.config.extensions.join(", ")
        );
        reporter.on_scan_start(root);
        let scan_start = Instant::now();

        let mut report = ScanReport::new(root);
        for path in scanner::candidates(root, &self.config, &ignore_patterns) {
            let result = validator::validate(&path);
            reporter.on_file_checked(&result);
            report.record(result);
        }
        report.finish(scan_start.elapsed());

        debug!(
            "Scan completed in {:.2}s: {} checked, {} not well-formed",
            report.duration().as_secs_f64(),
            report.checked_count(),
            report.bad_files().len(),
        );
        reporter.on_scan_complete(&report);

        Ok(report)
    }
}

/// Scan `root` with the default configuration and no progress output.
pub fn scan(root: &Path) -> Result<ScanReport, Error> {
    ScanEngine::new(AppConfig::default()).scan(root, &SilentReporter)
}
