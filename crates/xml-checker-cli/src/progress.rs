use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use xml_checker_core::report::{BAD_FILES_HEADING, SUCCESS_MESSAGE};
use xml_checker_core::{FileCheckResult, ProgressReporter, ScanReport};

/// CLI progress reporter: a spinner on stderr while scanning, with each
/// diagnostic printed to stdout as soon as its file has been checked.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(Option<&ProgressBar>)) {
        match self.bar.lock() {
            Ok(guard) => f(guard.as_ref()),
            Err(poisoned) => f(poisoned.into_inner().as_ref()),
        }
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, root: &Path) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(format!("Checking {}...", root.display()));
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_file_checked(&self, result: &FileCheckResult) {
        self.with_bar(|bar| {
            if let Some(diagnostic) = result.diagnostic() {
                let line = diagnostic.red().to_string();
                match bar {
                    Some(pb) => pb.suspend(|| println!("{}", line)),
                    None => println!("{}", line),
                }
            }
            if let Some(pb) = bar {
                pb.inc(1);
                pb.set_message(format!("Checked {} files", pb.position()));
            }
        });
    }

    fn on_scan_complete(&self, report: &ScanReport) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
        eprintln!(
            "  {} Scan complete: {} files checked in {:.2}s",
            "✓".green(),
            report.checked_count(),
            report.duration().as_secs_f64()
        );
    }
}

/// Print the end-of-scan summary: a success line, or the list of bad files.
pub fn print_summary(report: &ScanReport) {
    print!("{}", styled_summary(report));
}

/// The report's own rendering, with the success line and heading coloured.
fn styled_summary(report: &ScanReport) -> String {
    report
        .to_string()
        .lines()
        .map(|line| match line {
            SUCCESS_MESSAGE => line.green().to_string(),
            BAD_FILES_HEADING => line.red().bold().to_string(),
            _ => line.to_string(),
        })
        .fold(String::new(), |mut out, line| {
            out.push_str(&line);
            out.push('\n');
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_summary_matches_report_rendering() {
        colored::control::set_override(false);

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.xml"), "<root/>").unwrap();
        let clean = xml_checker_core::scan(dir.path()).unwrap();
        assert_eq!(styled_summary(&clean), clean.to_string());
        assert_eq!(styled_summary(&clean), "All XML files are well-formed.\n");

        fs::write(dir.path().join("bad.xml"), "<root><unclosed>").unwrap();
        let dirty = xml_checker_core::scan(dir.path()).unwrap();
        let summary = styled_summary(&dirty);
        assert_eq!(summary, dirty.to_string());
        assert!(summary.contains("The following files are not well-formed:"));
        assert!(summary.contains("bad.xml"));
    }
}
