//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::TreeService;
use crate::config::Settings;
use crate::domain::MoveObserver;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Snapshot loading, moving and validation
    pub tree: TreeService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let tree = TreeService::new(fs.clone(), settings.clone());

        Self { settings, fs, tree }
    }

    /// Create a service container whose moves are reported to `observer`.
    pub fn with_observer(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        observer: Arc<dyn MoveObserver>,
    ) -> Self {
        let settings = Arc::new(settings);
        let tree = TreeService::with_observer(fs.clone(), settings.clone(), observer);

        Self { settings, fs, tree }
    }
}
