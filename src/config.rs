//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the project directory (next to the source and output trees) and is
//! optional: stock defaults are used for everything it does not set.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! templates = "template"      # Template directory (built-ins fill the gaps)
//! extensions = ["adoc"]       # Source file extensions
//! skip_marker = "xxxx"        # Files whose name contains this are drafts
//!
//! [images]
//! source = "posts/images"     # Relative to the source root
//! target = "images"           # Relative to the output root
//!
//! [renderer]
//! program = "asciidoctor"
//! attributes = ["data-uri"]   # Passed as `-a <attr>`
//! body = "html"               # "html" or "blocks"
//! structure = false           # Also parse DocBook blocks when body = "html"
//!
//! [processing]
//! max_processes = 4           # Max parallel renders (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [renderer]
//! attributes = ["data-uri", "icons=font"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Name of the config file looked up in the project directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory holding `page.html`, `post.html` and `index.html`.
    pub templates: String,
    /// File extensions (without the dot) treated as source documents.
    pub extensions: Vec<String>,
    /// Source files whose name contains this marker are skipped.
    pub skip_marker: String,
    /// Image asset directory copied into the output.
    pub images: ImagesConfig,
    /// External renderer invocation.
    pub renderer: RendererConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            templates: "template".to_string(),
            extensions: vec!["adoc".to_string()],
            skip_marker: "xxxx".to_string(),
            images: ImagesConfig::default(),
            renderer: RendererConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        if self.renderer.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "renderer.program must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Image asset directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Image directory, relative to the source root.
    pub source: String,
    /// Destination directory, relative to the output root.
    pub target: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            source: "posts/images".to_string(),
            target: "images".to_string(),
        }
    }
}

/// Where a page's body HTML comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodySource {
    /// The renderer's HTML backend output, used verbatim.
    #[default]
    Html,
    /// HTML built from the content blocks of the DocBook backend output.
    Blocks,
}

/// External renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    /// Renderer executable, looked up on `PATH` when not a path.
    pub program: String,
    /// Document attributes passed to every invocation.
    pub attributes: Vec<String>,
    /// Source of the page body.
    pub body: BodySource,
    /// Parse DocBook blocks even when the body comes from the HTML backend,
    /// making them available to templates as `blocks`.
    pub structure: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: "asciidoctor".to_string(),
            attributes: vec!["data-uri".to_string()],
            body: BodySource::Html,
            structure: false,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of documents rendered at once.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# adoc-site configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Template directory. page.html, post.html and index.html are looked up
# here first; built-in templates are used for any that are missing.
templates = "template"

# Extensions (without the dot) of source documents.
extensions = ["adoc"]

# Source files whose name contains this marker are treated as drafts
# and skipped.
skip_marker = "xxxx"

# ---------------------------------------------------------------------------
# Image assets
# ---------------------------------------------------------------------------
[images]
# Directory copied into the output, relative to the source root.
source = "posts/images"

# Destination, relative to the output root. Replaced on every build.
target = "images"

# ---------------------------------------------------------------------------
# Renderer
# ---------------------------------------------------------------------------
[renderer]
# asciidoctor executable.
program = "asciidoctor"

# Document attributes passed as -a <attr> on every invocation.
attributes = ["data-uri"]

# Where the page body comes from:
#   "html"   - asciidoctor's HTML output, used as is
#   "blocks" - titles, paragraphs and links read from the DocBook output
body = "html"

# Also read DocBook blocks when body = "html", exposing them to
# templates as `blocks`. Costs one extra renderer run per document.
structure = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum documents rendered in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
