use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub mod csv;
pub mod markdown;

pub use self::csv::{save_report_to_csv, write_report};
pub use self::markdown::render;
