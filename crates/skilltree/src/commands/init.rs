//! Implementation of the `init` command and the workspace configuration.
//!
//! A skilltree workspace is a directory containing `.skilltree/` with a
//! `config.yaml` and the `trees.jsonl` data file.

use crate::controller::ControllerSettings;
use crate::domain::Point;
use crate::error::{Error, Result};
use crate::layout::GridLayout;
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default tree id prefix if none specified
pub const DEFAULT_PREFIX: &str = "skill";

/// Name of the workspace directory
pub const SKILLTREE_DIR_NAME: &str = ".skilltree";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the trees data file
pub const TREES_FILE_NAME: &str = "trees.jsonl";

/// Minimum prefix length
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Maximum prefix length
pub const MAX_PREFIX_LENGTH: usize = 20;

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// `config.yaml` contents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkilltreeConfig {
    /// Tree ID prefix (e.g., "skill" for "skill-a3f8")
    #[serde(rename = "tree-prefix")]
    pub tree_prefix: String,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Auto-layout grid
    #[serde(default)]
    pub layout: GridLayout,

    /// Canvas defaults
    #[serde(default)]
    pub canvas: CanvasConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// `memory` (in-memory, persisted to `data_file`) or `ephemeral`
    /// (in-memory, never written)
    pub backend: String,

    /// Path to the data file, relative to the workspace root
    pub data_file: String,
}

impl StorageConfig {
    /// Resolve to a [`StorageBackend`] for a workspace rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unknown backend name.
    pub fn to_backend(&self, root: &Path) -> Result<StorageBackend> {
        match self.backend.as_str() {
            "memory" | "jsonl" => Ok(StorageBackend::Jsonl(root.join(&self.data_file))),
            "ephemeral" => Ok(StorageBackend::InMemory),
            other => Err(Error::Config(format!(
                "Unknown storage backend '{other}' (expected 'memory' or 'ephemeral')"
            ))),
        }
    }
}

/// Canvas configuration section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CanvasConfig {
    /// X of nodes created without a position
    pub default_x: f64,
    /// Y of nodes created without a position
    pub default_y: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        let position = ControllerSettings::default().default_position;
        Self {
            default_x: position.x,
            default_y: position.y,
        }
    }
}

impl SkilltreeConfig {
    /// Create a new configuration with the given prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            tree_prefix: prefix.to_string(),
            storage: StorageConfig {
                backend: "memory".to_string(),
                data_file: format!("{SKILLTREE_DIR_NAME}/{TREES_FILE_NAME}"),
            },
            layout: GridLayout::default(),
            canvas: CanvasConfig::default(),
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid YAML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Fails if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Controller tunables from the layout and canvas sections
    #[must_use]
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            layout: self.layout,
            default_position: Point::new(self.canvas.default_x, self.canvas.default_y),
        }
    }
}

impl Default for SkilltreeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// The created `.skilltree` directory
    pub skilltree_dir: PathBuf,
    /// The created config file
    pub config_file: PathBuf,
    /// The created (empty) data file
    pub trees_file: PathBuf,
    /// The prefix used for tree IDs
    pub prefix: String,
}

/// Validate a tree ID prefix: 2-20 ASCII alphanumerics.
///
/// Expects pre-trimmed input.
///
/// # Errors
///
/// Returns `Error::Config` describing the violated rule.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < MIN_PREFIX_LENGTH {
        return Err(Error::Config(format!(
            "Prefix must be at least {MIN_PREFIX_LENGTH} characters"
        )));
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(Error::Config(format!(
            "Prefix cannot exceed {MAX_PREFIX_LENGTH} characters"
        )));
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Config(
            "Prefix must contain only alphanumeric characters".to_string(),
        ));
    }

    Ok(())
}

/// Initialize a workspace in `base_dir`.
///
/// # Errors
///
/// Returns an error if `.skilltree/` already exists, the prefix is invalid,
/// or a file system operation fails.
pub async fn init(base_dir: &Path, prefix: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix)?;

    let skilltree_dir = base_dir.join(SKILLTREE_DIR_NAME);
    if skilltree_dir.exists() {
        return Err(Error::Config(format!(
            "Skilltree is already initialized in this directory. Found existing '{SKILLTREE_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&skilltree_dir).await?;

    let config_file = skilltree_dir.join(CONFIG_FILE_NAME);
    SkilltreeConfig::new(prefix).save(&config_file).await?;

    let trees_file = skilltree_dir.join(TREES_FILE_NAME);
    fs::write(&trees_file, "").await?;

    tracing::debug!(dir = %skilltree_dir.display(), prefix, "Initialized workspace");

    Ok(InitResult {
        skilltree_dir,
        config_file,
        trees_file,
        prefix: prefix.to_string(),
    })
}

/// Find the workspace root by searching up from `start_dir`.
///
/// Returns the directory containing `.skilltree/`, or `None` if none is
/// found within [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_skilltree_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(SKILLTREE_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
