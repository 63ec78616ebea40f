pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod validator;

pub use config::AppConfig;
pub use engine::{scan, ScanEngine};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use report::ScanReport;
pub use validator::{validate, CheckFailure, FileCheckResult, Verdict};
