use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("No spreadsheet files found in {}", dir.display())]
    NoDataFound { dir: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Expected at least 2 columns (date and value), found {found}")]
    ColumnLayout { found: usize },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Failed to encode CSV: {0}")]
    CsvEncode(String),
}
