use thiserror::Error;

/// Failures that abort loading a transactions file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Missing columns in dataset: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
