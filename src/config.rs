//! Configuration for data paths and the HTTP listener.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (--data-dir, serve --host/--port)
//! 2. Environment variables (ANNOTATOR_DATA_DIR, ANNOTATOR_HOST, ANNOTATOR_PORT)
//! 3. Config file (.annotator/config.yaml)
//! 4. Defaults (./data, 127.0.0.1:5000)
//!
//! Config file discovery:
//! - Searches current directory and parents for .annotator/config.yaml
//! - Paths in config file are relative to the project root (parent of .annotator/)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const LESSON_INDEX_FILE: &str = "lesson_index.json";
pub const SEGMENTS_FILE: &str = "segments_flattened.json";
pub const ANNOTATIONS_FILE: &str = "annotations.json";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Data directory (relative to project root)
    pub data_dir: Option<String>,
    /// Lesson index document (relative to data_dir)
    pub lesson_index: Option<String>,
    /// Flattened segments document (relative to data_dir)
    pub segments: Option<String>,
    /// Annotation store snapshot (relative to data_dir)
    pub annotations: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Resolved configuration with absolute or cwd-relative paths
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub lesson_index: PathBuf,
    pub segments: PathBuf,
    pub annotations: PathBuf,
    pub host: String,
    pub port: u16,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Default file names and listener, with all data under `data_dir`
    pub fn in_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            lesson_index: data_dir.join(LESSON_INDEX_FILE),
            segments: data_dir.join(SEGMENTS_FILE),
            annotations: data_dir.join(ANNOTATIONS_FILE),
            data_dir,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            config_file: None,
        }
    }

    /// Point every data file at a different directory, keeping file names
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        let rebase = |p: &Path| {
            data_dir.join(p.strip_prefix(&self.data_dir).unwrap_or(p))
        };
        self.lesson_index = rebase(&self.lesson_index);
        self.segments = rebase(&self.segments);
        self.annotations = rebase(&self.annotations);
        self.data_dir = data_dir;
        self
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".annotator").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base` or start with `~/`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Combine config file values, environment and defaults
fn resolve(
    config_file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let (config_path, file) = match config_file {
        Some((path, file)) => (Some(path), Some(file)),
        None => (None, None),
    };
    let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();
    let server = file.as_ref().map(|f| f.server.clone()).unwrap_or_default();

    // Project root is the parent of .annotator/
    let root = config_path
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));

    let data_dir = if let Some(env_dir) = env("ANNOTATOR_DATA_DIR") {
        PathBuf::from(env_dir)
    } else if let Some(ref dir) = paths.data_dir {
        resolve_path(root, dir)
    } else if config_path.is_some() {
        root.join(DEFAULT_DATA_DIR)
    } else {
        PathBuf::from(DEFAULT_DATA_DIR)
    };

    let file_in_data = |configured: &Option<String>, default: &str| {
        resolve_path(&data_dir, configured.as_deref().unwrap_or(default))
    };
    let lesson_index = file_in_data(&paths.lesson_index, LESSON_INDEX_FILE);
    let segments = file_in_data(&paths.segments, SEGMENTS_FILE);
    let annotations = file_in_data(&paths.annotations, ANNOTATIONS_FILE);

    let host = env("ANNOTATOR_HOST")
        .or(server.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = match env("ANNOTATOR_PORT") {
        Some(port) => port
            .parse()
            .with_context(|| format!("Invalid ANNOTATOR_PORT: {}", port))?,
        None => server.port.unwrap_or(DEFAULT_PORT),
    };

    Ok(ResolvedConfig {
        data_dir,
        lesson_index,
        segments,
        annotations,
        host,
        port,
        config_file: config_path,
    })
}

/// Load configuration from all sources except command-line flags
pub fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    let config_file = match find_config_file(&cwd) {
        Some(path) => {
            let file = load_config_file(&path)?;
            Some((path, file))
        }
        None => None,
    };

    resolve(config_file, |key| std::env::var(key).ok())
}
