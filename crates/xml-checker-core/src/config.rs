use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "XmlChecker";
pub const ENV_PREFIX: &str = "XML_CHECKER";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// File extensions (without the dot) selected for checking, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Glob patterns for files and directories to leave out of the scan.
    pub ignore_patterns: Vec<String>,
    pub follow_links: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            ignore_patterns: Vec::new(),
            follow_links: false,
        }
    }
}

/// Load `XmlChecker.toml` from the working directory, if present, layered
/// under `XML_CHECKER_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    build(
        ConfigFile::with_name(DEFAULT_CONFIG_NAME).required(false),
        environment(),
    )
}

/// Load configuration from an explicit file, which must exist.
pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    build(ConfigFile::from(path).required(true), environment())
}

/// `XML_CHECKER_EXTENSIONS` and `XML_CHECKER_IGNORE_PATTERNS` take
/// comma-separated lists; `XML_CHECKER_FOLLOW_LINKS` takes a bool.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("extensions")
        .with_list_parse_key("ignore_patterns")
}

fn build(
    file: ConfigFile<config::FileSourceFile, config::FileFormat>,
    environment: Environment,
) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()?;
    let mut config = builder.try_deserialize::<AppConfig>()?;
    config.normalize();
    Ok(config)
}

impl AppConfig {
    /// Strip leading dots and lowercase extensions; fall back to `xml` when empty.
    pub fn normalize(&mut self) {
        self.extensions = self
            .extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        let mut seen = HashSet::new();
        self.extensions.retain(|ext| seen.insert(ext.clone()));
        if self.extensions.is_empty() {
            self.extensions = AppConfig::default().extensions;
        }
    }

    pub fn is_candidate_extension(&self, ext: impl AsRef<OsStr>) -> bool {
        let ext = ext.as_ref();
        self.extensions
            .iter()
            .any(|wanted| ext.eq_ignore_ascii_case(wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_selects_xml_only() {
        let config = AppConfig::default();
        assert!(config.is_candidate_extension("xml"));
        assert!(config.is_candidate_extension("XML"));
        assert!(!config.is_candidate_extension("bak"));
        assert!(!config.follow_links);
    }

    #[test]
    fn test_normalize_extensions() {
        let mut config = AppConfig {
            extensions: vec![".XML".to_string(), "Svg".to_string(), "  ".to_string()],
            ..AppConfig::default()
        };
        config.normalize();
        assert_eq!(config.extensions, vec!["xml".to_string(), "svg".to_string()]);

        let mut repeated = AppConfig {
            extensions: vec!["xml".to_string(), "svg".to_string(), ".XML".to_string()],
            ..AppConfig::default()
        };
        repeated.normalize();
        assert_eq!(repeated.extensions, vec!["xml".to_string(), "svg".to_string()]);

        let mut empty = AppConfig {
            extensions: vec![],
            ..AppConfig::default()
        };
        empty.normalize();
        assert_eq!(empty.extensions, vec!["xml".to_string()]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checker.toml");
        fs::write(
            &path,
            "extensions = [\"xml\", \".xsd\"]\nignore_patterns = [\"**/target\"]\n",
        )
        .unwrap();

        let config = load_configuration_from(&path).unwrap();
        assert_eq!(config.extensions, vec!["xml".to_string(), "xsd".to_string()]);
        assert_eq!(config.ignore_patterns, vec!["**/target".to_string()]);
        assert!(!config.follow_links);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checker.toml");
        fs::write(&path, "extensions = [\"xml\"]\nfollow_links = false\n").unwrap();

        let mut vars = config::Map::new();
        vars.insert("XML_CHECKER_EXTENSIONS".to_string(), "svg,.XML".to_string());
        vars.insert(
            "XML_CHECKER_IGNORE_PATTERNS".to_string(),
            "vendor,*.bak".to_string(),
        );
        vars.insert("XML_CHECKER_FOLLOW_LINKS".to_string(), "true".to_string());

        let config = build(
            ConfigFile::from(path.as_path()).required(true),
            environment().source(Some(vars)),
        )
        .unwrap();
        assert_eq!(config.extensions, vec!["svg".to_string(), "xml".to_string()]);
        assert_eq!(
            config.ignore_patterns,
            vec!["vendor".to_string(), "*.bak".to_string()]
        );
        assert!(config.follow_links);
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(load_configuration_from(&dir.path().join("nope.toml")).is_err());
    }
}
