use crate::config::types::{parse_extensions, CliOverrides, CrawlConfig, FileConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory and in the home directory
pub const CONFIG_FILE_NAME: &str = ".site-harvest.toml";

/// Loads and parses a configuration file from the given path
///
/// # Returns
///
/// * `Ok(FileConfig)` - Successfully parsed configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Finds the configuration file to use
///
/// An explicit path wins; otherwise the project file in the working
/// directory is preferred over the user file in the home directory.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let project = PathBuf::from(CONFIG_FILE_NAME);
    if project.is_file() {
        return Some(project);
    }

    let user = std::env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))?;
    user.is_file().then_some(user)
}

/// Loads the optional configuration file, falling back to defaults
///
/// A missing or malformed file is logged and treated as empty; it never
/// aborts startup.
pub fn load_optional_config(explicit: Option<&Path>) -> FileConfig {
    let Some(path) = find_config_file(explicit) else {
        tracing::debug!("No configuration file found, using built-in defaults");
        return FileConfig::default();
    };

    match load_config(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            tracing::warn!("Error loading config from {}: {}", path.display(), e);
            FileConfig::default()
        }
    }
}

/// Merges command-line values, file values, and defaults into a run config
///
/// Precedence is command line, then config file, then built-in default.
/// The merged configuration is validated before it is returned.
pub fn resolve_config(
    start_url: &str,
    cli: &CliOverrides,
    file: &FileConfig,
) -> Result<CrawlConfig, ConfigError> {
    let mut config = CrawlConfig::new(start_url);

    if let Some(dir) = cli
        .output_dir
        .clone()
        .or_else(|| file.output_dir.as_ref().map(PathBuf::from))
    {
        config.output_dir = dir;
    }

    if let Some(max_pages) = cli.max_pages.or(file.max_pages) {
        config.max_pages = max_pages;
    }

    if let Some(secs) = cli.wait_time.or(file.wait_time) {
        config.wait_time = Duration::try_from_secs_f64(secs).map_err(|_| {
            ConfigError::Validation(format!(
                "wait_time must be a finite, non-negative number of seconds, got {}",
                secs
            ))
        })?;
    }

    if let Some(csv) = &cli.doc_extensions {
        config.doc_extensions = parse_extensions(csv);
    } else if let Some(list) = &file.doc_extensions {
        config.doc_extensions = list.normalized();
    }

    if let Some(max_concurrent) = cli.max_concurrent.or(file.max_concurrent) {
        config.max_concurrent = max_concurrent;
    }

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 fingerprint of the crawl-shaping configuration
///
/// Only the start URL and document extensions are covered; the page budget
/// and concurrency may change between resumed runs without invalidating
/// the checkpoint.
pub fn compute_config_fingerprint(config: &CrawlConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.start_url.as_bytes());
    hasher.update(b"\n");
    hasher.update(config.doc_extensions.join(",").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ExtensionList;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(
            r#"
output-dir = "./crawl"
max-pages = 50
wait-time = 1.5
doc-extensions = "pdf,csv"
max-concurrent = 3
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.output_dir.as_deref(), Some("./crawl"));
        assert_eq!(config.max_pages, Some(50));
        assert_eq!(config.wait_time, Some(1.5));
        assert_eq!(
            config.doc_extensions,
            Some(ExtensionList::Csv("pdf,csv".to_string()))
        );
        assert_eq!(config.max_concurrent, Some(3));
    }

    #[test]
    fn test_load_partial_config() {
        let file = create_temp_config("max-pages = 10\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.max_pages, Some(10));
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let file = create_temp_config("max-pages = \"lots\"");
        let config = load_optional_config(Some(file.path()));
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_falls_back_to_defaults() {
        let config = load_optional_config(Some(Path::new("/nonexistent/site-harvest.toml")));
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_cli_wins_over_file_wins_over_default() {
        let file = FileConfig {
            output_dir: Some("from-file".to_string()),
            max_pages: Some(20),
            wait_time: Some(2.0),
            doc_extensions: Some(ExtensionList::List(vec!["csv".to_string()])),
            max_concurrent: None,
        };
        let cli = CliOverrides {
            max_pages: Some(7),
            doc_extensions: Some("pdf".to_string()),
            ..Default::default()
        };

        let config = resolve_config("http://site.test/", &cli, &file).unwrap();

        assert_eq!(config.max_pages, 7);
        assert_eq!(config.doc_extensions, vec![".pdf".to_string()]);
        assert_eq!(config.output_dir, PathBuf::from("from-file"));
        assert_eq!(config.wait_time, Duration::from_secs(2));
        assert_eq!(config.max_concurrent, 5);
    }

    #[test]
    fn test_negative_wait_time_rejected() {
        let cli = CliOverrides {
            wait_time: Some(-1.0),
            ..Default::default()
        };
        let result = resolve_config("http://site.test/", &cli, &FileConfig::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_fingerprint_ignores_budget() {
        let a = CrawlConfig::new("http://site.test/");
        let mut b = a.clone();
        b.max_pages = 3;
        b.max_concurrent = 1;
        assert_eq!(compute_config_fingerprint(&a), compute_config_fingerprint(&b));
        assert_eq!(compute_config_fingerprint(&a).len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_start_url() {
        let a = CrawlConfig::new("http://site.test/");
        let b = CrawlConfig::new("http://other.test/");
        assert_ne!(compute_config_fingerprint(&a), compute_config_fingerprint(&b));
    }
}
