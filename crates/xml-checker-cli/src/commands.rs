use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "xml-checker")]
#[command(about = "Validate XML well-formedness in a directory", long_about = None)]
pub struct Cli {
    /// Directory to scan (asks for one interactively if not provided)
    pub directory: Option<PathBuf>,

    /// Glob pattern for files or directories to skip; may be repeated
    #[arg(short, long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// File extension to check instead of `xml`; may be repeated
    #[arg(short, long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Follow symbolic links while walking the directory
    #[arg(long)]
    pub follow_links: bool,

    /// Read settings from this file instead of ./XmlChecker.toml
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
