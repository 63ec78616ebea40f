use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Strategy for obtaining a directory when none was given on the command line.
pub trait DirectoryPicker {
    /// `None` means the user chose nothing.
    fn pick_directory(&self) -> Option<PathBuf>;
}

/// Asks for a directory on the terminal.
pub struct PromptPicker {
    prompt: String,
}

impl PromptPicker {
    pub fn new() -> Self {
        Self {
            prompt: "Select Directory to Check XML Files".to_string(),
        }
    }
}

impl Default for PromptPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryPicker for PromptPicker {
    fn pick_directory(&self) -> Option<PathBuf> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        prompt_for_directory(&self.prompt, &mut stdin.lock(), &mut stdout).unwrap_or_else(|err| {
            tracing::warn!("Unable to read directory from terminal: {}", err);
            None
        })
    }
}

fn prompt_for_directory(
    prompt: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<Option<PathBuf>> {
    write!(output, "{} (leave empty to cancel): ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let answer = line.trim().trim_matches(|c| c == '"' || c == '\'');
    if answer.is_empty() {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(answer)))
    }
}
