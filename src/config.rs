use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_DOWNLOAD_URL, DEFAULT_LIST_URL, DEFAULT_LOG_WINDOW, DEFAULT_RECORD_TO_PGN_CHUNK_SIZE,
    DEFAULT_ROW_READ_CHUNK_SIZE,
};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".puzzle-pgn")
}

#[derive(Debug, Deserialize)]
pub struct DatasetSettings {
    #[serde(default = "default_list_url")]
    pub list_url: String,
    #[serde(default = "default_download_url")]
    pub download_url: String,
    /// Local directory read instead of the hub.
    pub mirror: Option<PathBuf>,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            list_url: default_list_url(),
            download_url: default_download_url(),
            mirror: None,
        }
    }
}

fn default_list_url() -> String {
    DEFAULT_LIST_URL.to_string()
}

fn default_download_url() -> String {
    DEFAULT_DOWNLOAD_URL.to_string()
}

#[derive(Debug, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_row_read_chunk_size")]
    pub row_read_chunk_size: usize,
    #[serde(default = "default_record_to_pgn_chunk_size")]
    pub record_to_pgn_chunk_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            row_read_chunk_size: default_row_read_chunk_size(),
            record_to_pgn_chunk_size: default_record_to_pgn_chunk_size(),
        }
    }
}

fn default_row_read_chunk_size() -> usize {
    DEFAULT_ROW_READ_CHUNK_SIZE
}

fn default_record_to_pgn_chunk_size() -> usize {
    DEFAULT_RECORD_TO_PGN_CHUNK_SIZE
}

#[derive(Debug, Deserialize)]
pub struct LoggingSettings {
    /// Lines kept by the permanent diagnostic log.
    #[serde(default = "default_window")]
    pub window: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

fn default_window() -> usize {
    DEFAULT_LOG_WINDOW
}

pub fn parse_config_str(contents: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(contents).context("Failed to parse TOML config")?;
    validate_config(&config)?;
    Ok(config)
}

/// Read, parse and validate a config file. Relative paths in it are resolved
/// against the file's directory.
pub fn parse_config(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path)
        .context(format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config_str(&contents)?;

    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config.storage.dir = resolve_path(config_dir, &config.storage.dir);
    if let Some(mirror) = &config.dataset.mirror {
        config.dataset.mirror = Some(resolve_path(config_dir, mirror));
    }
    Ok(config)
}

pub fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.pipeline.row_read_chunk_size == 0 {
        return Err(anyhow!("Config error: pipeline.row_read_chunk_size must be > 0"));
    }
    if config.pipeline.record_to_pgn_chunk_size == 0 {
        return Err(anyhow!(
            "Config error: pipeline.record_to_pgn_chunk_size must be > 0"
        ));
    }
    if config.logging.window == 0 {
        return Err(anyhow!("Config error: logging.window must be > 0"));
    }
    Ok(())
}

pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_parse_valid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        let config_content = r#"
[storage]
dir = "cache"

[dataset]
mirror = "/srv/puzzles"

[pipeline]
row_read_chunk_size = 5000
"#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = parse_config(&config_path).unwrap();
        assert_eq!(config.storage.dir, dir.path().join("cache"));
        assert_eq!(config.dataset.mirror, Some(PathBuf::from("/srv/puzzles")));
        assert_eq!(config.dataset.list_url, DEFAULT_LIST_URL);
        assert_eq!(config.pipeline.row_read_chunk_size, 5000);
        assert_eq!(
            config.pipeline.record_to_pgn_chunk_size,
            DEFAULT_RECORD_TO_PGN_CHUNK_SIZE
        );
        assert_eq!(config.logging.window, DEFAULT_LOG_WINDOW);
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config.storage.dir, PathBuf::from(".puzzle-pgn"));
        assert!(config.dataset.mirror.is_none());
        assert_eq!(config.pipeline.row_read_chunk_size, DEFAULT_ROW_READ_CHUNK_SIZE);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(parse_config_str("[pipeline]\nrow_read_chunk_size = 0\n").is_err());
        assert!(parse_config_str("[pipeline]\nrecord_to_pgn_chunk_size = 0\n").is_err());
        assert!(parse_config_str("[logging]\nwindow = 0\n").is_err());
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(parse_config_str("[index]\nk = 64\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(parse_config(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/home/user");
        assert_eq!(
            resolve_path(base, Path::new("file.txt")),
            PathBuf::from("/home/user/file.txt")
        );
        assert_eq!(
            resolve_path(base, Path::new("/tmp/file.txt")),
            PathBuf::from("/tmp/file.txt")
        );
    }
}
