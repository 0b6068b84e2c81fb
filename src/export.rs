use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

use crate::aggregator::{summarize, AggregateError, Summary, SummaryStats};
use crate::data::{DataError, DataLoader};

/// Default location of the JSON snapshot, relative to the working directory
pub const DEFAULT_EXPORT_PATH: &str = "static/data/dashboard_data.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dashboard JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Series in row order; a blank date cell is `null`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccValues {
    pub dates: Vec<Option<String>>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWacc {
    pub value: f64,
    pub date: String,
    pub previous: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyData {
    pub years: Vec<i32>,
    pub averages: Vec<f64>,
}

/// JSON document consumed by the pre-rendered dashboard
///
/// `yearly_data` is `null` when the date column could not be parsed; the
/// `dates` entries then carry the raw column text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticDashboard {
    pub wacc_values: WaccValues,
    pub current_wacc: CurrentWacc,
    pub summary_stats: SummaryStats,
    pub yearly_data: Option<YearlyData>,
}

impl StaticDashboard {
    pub fn from_summary(summary: &Summary) -> Self {
        Self {
            wacc_values: WaccValues {
                dates: summary
                    .observations
                    .iter()
                    .map(|o| (!o.label.is_empty()).then(|| o.label.clone()))
                    .collect(),
                values: summary.observations.iter().map(|o| o.value).collect(),
            },
            current_wacc: CurrentWacc {
                value: summary.current.value,
                date: summary.current.label.clone(),
                previous: summary.current.previous,
            },
            summary_stats: summary.stats.clone(),
            yearly_data: summary.yearly.as_ref().map(|y| YearlyData {
                years: y.years(),
                averages: y.averages(),
            }),
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the document, creating parent directories as needed
    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        let io_error = |source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, self.to_json()?).map_err(io_error)
    }

    pub fn read_from(path: &Path) -> Result<Self, ExportError> {
        let json = fs::read_to_string(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Load the spreadsheet from `data_dir`, summarize it and write the snapshot
#[instrument(skip_all, fields(data_dir = %data_dir.display(), output = %output.display()))]
pub fn generate_static_data(data_dir: &Path, output: &Path) -> Result<StaticDashboard, ExportError> {
    let table = DataLoader::new(data_dir).load()?;
    let summary = summarize(&table)?;
    let document = StaticDashboard::from_summary(&summary);

    document.write_to(output)?;
    info!(
        "Wrote {} observations to {}",
        document.wacc_values.values.len(),
        output.display()
    );

    Ok(document)
}
