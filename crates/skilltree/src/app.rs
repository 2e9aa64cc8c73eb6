//! Application context for CLI command execution.
//!
//! # Example
//!
//! ```no_run
//! use skilltree::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     println!("{} trees", app.storage().list_trees().await?.len());
//!     Ok(())
//! }
//! ```

use crate::commands::init::{
    CONFIG_FILE_NAME, SKILLTREE_DIR_NAME, SkilltreeConfig, find_skilltree_root,
};
use crate::controller::{ControllerSettings, GraphController};
use crate::domain::TreeId;
use crate::error::{Error, Result};
use crate::storage::{StorageBackend, TreeStorage, create_storage};
use std::path::{Path, PathBuf};

/// Opened workspace: configuration plus storage.
pub struct App {
    storage: Box<dyn TreeStorage>,
    skilltree_dir: PathBuf,
    config: SkilltreeConfig,
    backend: StorageBackend,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("skilltree_dir", &self.skilltree_dir)
            .field("prefix", &self.config.tree_prefix)
            .field("backend", &self.backend)
            .field("storage", &"<dyn TreeStorage>")
            .finish()
    }
}

impl App {
    /// Open the workspace containing `working_dir`.
    ///
    /// Searches up the directory tree for `.skilltree/`, loads its
    /// configuration and opens storage.
    ///
    /// # Errors
    ///
    /// Returns an error if no workspace is found, the configuration is
    /// invalid, or storage cannot be opened.
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_skilltree_root(working_dir).ok_or_else(|| {
            Error::Config(
                "Not a skilltree workspace (no .skilltree directory found). Run 'skilltree init' first"
                    .to_string(),
            )
        })?;

        let skilltree_dir = root_dir.join(SKILLTREE_DIR_NAME);
        let config = SkilltreeConfig::load(&skilltree_dir.join(CONFIG_FILE_NAME)).await?;

        let backend = config.storage.to_backend(&root_dir)?;
        let storage = create_storage(backend.clone(), config.tree_prefix.clone()).await?;

        Ok(Self {
            storage,
            skilltree_dir,
            config,
            backend,
        })
    }

    /// Mutable storage access
    pub fn storage_mut(&mut self) -> &mut dyn TreeStorage {
        self.storage.as_mut()
    }

    /// Storage access
    #[must_use]
    pub fn storage(&self) -> &dyn TreeStorage {
        self.storage.as_ref()
    }

    /// Tree ID prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.config.tree_prefix
    }

    /// The `.skilltree` directory
    #[must_use]
    pub fn skilltree_dir(&self) -> &Path {
        &self.skilltree_dir
    }

    /// Backing data file, if storage is persisted
    #[must_use]
    pub fn data_path(&self) -> Option<&Path> {
        self.backend.data_path()
    }

    /// Controller tunables from configuration
    #[must_use]
    pub fn controller_settings(&self) -> ControllerSettings {
        self.config.controller_settings()
    }

    /// Start an editing session on `tree_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::TreeNotFound` if the tree does not exist.
    pub async fn open_tree(&self, tree_id: &TreeId) -> Result<GraphController> {
        GraphController::load(self.storage(), tree_id, self.controller_settings()).await
    }

    /// Deliver a session's queued writes and persist them.
    ///
    /// # Errors
    ///
    /// Returns the first failing write or save error.
    pub async fn commit(&mut self, controller: &mut GraphController) -> Result<()> {
        controller.flush(self.storage.as_mut()).await?;
        self.save().await
    }

    /// Persist storage. Call after any mutating operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written.
    pub async fn save(&self) -> Result<()> {
        self.storage.save().await
    }
}
