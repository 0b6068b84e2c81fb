// ! Spreadsheet discovery, parsing and the in-memory table model

pub mod dates;
pub mod error;
pub mod loader;
pub mod table;

// Re-export commonly used items
pub use error::DataError;
pub use loader::{DataLoader, SPREADSHEET_EXTENSIONS};
pub use table::{Cell, DateCoercion, DateColumn, Table, TableView, ValueColumn};
