//! Configuration management using the prefer crate for file discovery.
//!
//! Settings are layered: built-in defaults, then a config file (discovered
//! by prefer or given explicitly), then `DOCSEARCH_*` environment variables,
//! then command-line flags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ocr::{PopplerBackend, TesseractBackend, TextExtractor, DEFAULT_DPI};
use crate::upload::UploadSession;

/// Default maximum upload size (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Default bind address for `serve`.
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Default subdirectory of the document root that directory searches may touch.
const DEFAULT_SCAN_DIR: &str = "uploads";

/// Origins the browser front end is served from.
const DEFAULT_ALLOWED_ORIGINS: [&str; 6] = [
    "http://localhost",
    "http://localhost:80",
    "http://127.0.0.1",
    "http://127.0.0.1:80",
    "https://cloud-voy.com",
    "http://cmap.eastus.cloudapp.azure.com",
];

/// Application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Root that caller-supplied document paths are resolved under.
    pub document_root: PathBuf,
    /// Directory (relative to `document_root`) that directory searches must stay in.
    pub scan_dir: PathBuf,
    /// Where uploads are staged (None = system temp dir).
    pub upload_dir: Option<PathBuf>,
    /// CORS origins allowed by the server. Empty means permissive.
    pub allowed_origins: Vec<String>,
    /// Tesseract language.
    pub ocr_language: String,
    /// Rasterization DPI for OCR.
    pub ocr_dpi: u32,
    /// Maximum accepted request body size for uploads.
    pub max_upload_bytes: usize,
    /// Server bind address.
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("."),
            scan_dir: PathBuf::from(DEFAULT_SCAN_DIR),
            upload_dir: None,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ocr_language: "eng".to_string(),
            ocr_dpi: DEFAULT_DPI,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Settings {
    /// Create settings with a custom document root.
    pub fn with_document_root(document_root: PathBuf) -> Self {
        Self {
            document_root,
            ..Default::default()
        }
    }

    /// Build the text extractor described by these settings.
    pub fn text_extractor(&self) -> TextExtractor {
        TextExtractor::with_backends(
            Arc::new(PopplerBackend::new().with_dpi(self.ocr_dpi)),
            Arc::new(TesseractBackend::new().with_language(&self.ocr_language)),
        )
    }

    /// Build the upload staging area described by these settings.
    pub fn upload_session(&self) -> UploadSession {
        match &self.upload_dir {
            Some(dir) => UploadSession::in_dir(dir),
            None => UploadSession::new(),
        }
    }

    /// Apply `DOCSEARCH_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (environment, test maps).
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("DOCSEARCH_ROOT") {
            self.document_root = expand_path(&root);
        }
        if let Some(scan_dir) = lookup("DOCSEARCH_SCAN_DIR") {
            self.scan_dir = PathBuf::from(scan_dir);
        }
        if let Some(upload_dir) = lookup("DOCSEARCH_UPLOAD_DIR") {
            self.upload_dir = Some(expand_path(&upload_dir));
        }
        if let Some(origins) = lookup("DOCSEARCH_ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(lang) = lookup("DOCSEARCH_OCR_LANGUAGE") {
            self.ocr_language = lang;
        }
    }
}

/// OCR section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrFileConfig {
    /// Tesseract language (e.g. "eng", "deu+eng").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Rasterization DPI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    pub ocr: OcrFileConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults if no config file is found or it fails to parse.
    pub async fn load() -> Self {
        match prefer::load("docsearch").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let path = expand_path(path_str);
        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref root) = self.document_root {
            settings.document_root = self.resolve_path(root, base_dir);
        }
        if let Some(ref scan_dir) = self.scan_dir {
            settings.scan_dir = PathBuf::from(scan_dir);
        }
        if let Some(ref upload_dir) = self.upload_dir {
            settings.upload_dir = Some(self.resolve_path(upload_dir, base_dir));
        }
        if let Some(ref origins) = self.allowed_origins {
            settings.allowed_origins = origins.clone();
        }
        if let Some(ref lang) = self.ocr.language {
            settings.ocr_language = lang.clone();
        }
        if let Some(dpi) = self.ocr.dpi {
            settings.ocr_dpi = dpi;
        }
        if let Some(max) = self.max_upload_bytes {
            settings.max_upload_bytes = max;
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
    }
}

/// Load settings from defaults, the config file and the environment.
///
/// An explicit `config_path` must load; a discovered one that fails is
/// ignored with a warning.
pub async fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env_overrides();

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }
    Ok(settings)
}

fn expand_path(path_str: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path_str).as_ref())
}
