use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::data::{DataError, DataLoader, Table};

/// Process-wide cache of loaded tables, keyed by source directory
///
/// Owned by the application and cloned into handler state. The lock is held
/// while a table loads, so each directory is parsed at most once until
/// [`TableCache::clear`] is called. Failed loads are not cached.
#[derive(Clone, Default)]
pub struct TableCache {
    tables: Arc<Mutex<HashMap<PathBuf, Arc<Table>>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip_all, fields(data_dir = %data_dir.display()))]
    pub async fn get_or_load(&self, data_dir: &Path) -> Result<Arc<Table>, DataError> {
        let mut tables = self.tables.lock().await;
        if let Some(table) = tables.get(data_dir) {
            debug!("Cache hit");
            return Ok(Arc::clone(table));
        }

        debug!("Cache miss, loading spreadsheet");
        let loader = DataLoader::new(data_dir);
        let table = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| DataError::Parse {
                path: data_dir.to_path_buf(),
                message: format!("Loader task failed: {e}"),
            })??;

        let table = Arc::new(table);
        tables.insert(data_dir.to_path_buf(), Arc::clone(&table));
        info!("Cached {} rows from {}", table.len(), table.source().display());
        Ok(table)
    }

    pub async fn contains(&self, data_dir: &Path) -> bool {
        self.tables.lock().await.contains_key(data_dir)
    }

    /// Drop every cached table; returns how many were removed
    pub async fn clear(&self) -> usize {
        let mut tables = self.tables.lock().await;
        let cleared = tables.len();
        tables.clear();
        info!("Cleared {} cached tables", cleared);
        cleared
    }
}
