//! Error types for the cc-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Failed to read scenario file: {path}")]
    ScenarioFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Scenario validation failed: {0}")]
    Validation(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cc-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<cc_project::ProjectError> for AppError {
    fn from(err: cc_project::ProjectError) -> Self {
        match err {
            cc_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Scenario(other.to_string()),
        }
    }
}

impl From<cc_project::ValidationError> for AppError {
    fn from(err: cc_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<cc_sim::SimError> for AppError {
    fn from(err: cc_sim::SimError) -> Self {
        match err {
            cc_sim::SimError::Config(e) => AppError::Validation(e.to_string()),
            other => AppError::Simulation(other.to_string()),
        }
    }
}

impl From<cc_results::ResultsError> for AppError {
    fn from(err: cc_results::ResultsError) -> Self {
        match err {
            cc_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Export(err.to_string())
    }
}
