mod commands;
mod logging;
mod picker;
mod progress;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use commands::Cli;
use dotenv::dotenv;
use picker::{DirectoryPicker, PromptPicker};
use progress::CliReporter;
use tracing::{error, info};
use xml_checker_core::config::{load_configuration, load_configuration_from};
use xml_checker_core::{AppConfig, Error, ScanEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let root = match resolve_directory(args.directory.clone(), &PromptPicker::new()) {
        Ok(Some(root)) => root,
        Ok(None) => {
            println!("No directory was selected.");
            return Ok(());
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    if let Err(err) = run_scan(&root, config) {
        error!("Error: {}", err);
        process::exit(1);
    }

    Ok(())
}

/// Use the directory argument if given, otherwise ask the picker.
/// Whatever is chosen must be an existing directory.
fn resolve_directory(
    argument: Option<PathBuf>,
    picker: &dyn DirectoryPicker,
) -> Result<Option<PathBuf>, Error> {
    let Some(directory) = argument.or_else(|| picker.pick_directory()) else {
        return Ok(None);
    };
    if !directory.is_dir() {
        return Err(Error::InvalidRoot(directory));
    }
    Ok(Some(directory))
}

fn build_config(args: &Cli) -> Result<AppConfig, Error> {
    let mut config = match &args.config {
        Some(path) => load_configuration_from(path)?,
        None => load_configuration()?,
    };

    config.ignore_patterns.extend(args.ignore.iter().cloned());
    if !args.extensions.is_empty() {
        config.extensions = args.extensions.clone();
    }
    config.follow_links |= args.follow_links;
    config.normalize();

    Ok(config)
}

fn run_scan(root: &Path, config: AppConfig) -> Result<(), Error> {
    let engine = ScanEngine::new(config);
    let reporter = CliReporter::new();
    let report = engine.scan(root, &reporter)?;

    progress::print_summary(&report);
    info!(
        "{} files checked, {} not well-formed",
        report.checked_count(),
        report.bad_files().len()
    );

    Ok(())
}
