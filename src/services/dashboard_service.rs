use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::aggregator::{summarize, AggregateError, Summary};
use crate::cache::TableCache;
use crate::data::{DataError, Table, TableView};
use crate::presenter::DashboardView;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Live-mode entry point: serves cached tables and their derived views
#[derive(Clone)]
pub struct DashboardService {
    data_dir: PathBuf,
    cache: TableCache,
}

impl DashboardService {
    pub fn new(data_dir: impl Into<PathBuf>, cache: TableCache) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache,
        }
    }

    /// The loaded table, parsed on first use and cached afterwards
    pub async fn table(&self) -> Result<Arc<Table>, ServiceError> {
        Ok(self.cache.get_or_load(&self.data_dir).await?)
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<Summary, ServiceError> {
        let table = self.table().await?;
        Ok(summarize(&table)?)
    }

    /// View model for the dashboard page
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardView, ServiceError> {
        let table = self.table().await?;
        let summary = summarize(&table)?;
        debug!(
            "Building dashboard view for {} observations",
            summary.observations.len()
        );
        Ok(DashboardView::build(&table, &summary))
    }

    /// Raw rows restricted to the selected columns (all columns when empty)
    #[instrument(skip(self))]
    pub async fn data_table(&self, columns: &[String]) -> Result<TableView, ServiceError> {
        let table = self.table().await?;
        Ok(table.select(columns)?)
    }

    /// The full table as CSV
    #[instrument(skip(self))]
    pub async fn csv_export(&self) -> Result<String, ServiceError> {
        let table = self.table().await?;
        Ok(table.to_csv()?)
    }

    pub async fn clear_cache(&self) -> usize {
        self.cache.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_service_reads_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("wacc.csv"),
            "Date,Equity,WACC\n2023-01-01,0.11,0.08\n2024-01-01,0.12,0.10\n",
        )
        .unwrap();

        let cache = TableCache::new();
        let service = DashboardService::new(dir.path(), cache.clone());

        let view = service.dashboard().await.unwrap();
        assert_eq!(view.headline.display, "0.1000");
        assert!(cache.contains(dir.path()).await);

        let selected = service.data_table(&["WACC".to_string()]).await.unwrap();
        assert_eq!(selected.columns, vec!["WACC"]);
        assert_eq!(selected.rows.len(), 2);

        let csv = service.csv_export().await.unwrap();
        assert!(csv.starts_with("Date,Equity,WACC\n"));

        assert_eq!(service.clear_cache().await, 1);
    }

    #[tokio::test]
    async fn test_service_surfaces_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let service = DashboardService::new(dir.path(), TableCache::new());

        let err = service.summary().await.unwrap_err();
        assert!(matches!(err, ServiceError::Data(DataError::NoDataFound { .. })));
    }
}
