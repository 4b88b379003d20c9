//! Errors surfaced by CLI commands.

use thiserror::Error;

use crate::error::{CorpusError, ErrorCategory, ServiceError, StoreError};
use crate::io::exit_code::ExitCode;
use crate::vector::VectorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Store(e) => Some(e.category()),
            Self::Corpus(e) => Some(e.category()),
            Self::Service(e) => Some(e.category()),
            Self::Vector(_) | Self::InvalidArgument(_) => Some(ErrorCategory::Input),
            Self::Config(_) => Some(ErrorCategory::Configuration),
            Self::Output(_) => None,
        }
    }

    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Store(e) | Self::Service(ServiceError::Store(e)) => e.status_code(),
            Self::Corpus(e) => e.status_code(),
            Self::Service(ServiceError::Classify(_)) | Self::Vector(_) => "INVALID_INPUT",
            Self::Service(e) => e.status_code(),
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Output(_) => "OUTPUT_ERROR",
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Store(e) | Self::Service(ServiceError::Store(e)) => ExitCode::from_store_error(e),
            Self::Output(_) => ExitCode::GeneralError,
            other => other
                .category()
                .map_or(ExitCode::GeneralError, ExitCode::from_category),
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Store(e) | Self::Service(ServiceError::Store(e)) => e.recovery_suggestions(),
            Self::Corpus(CorpusError::Read { .. }) => vec![
                "Encode the catalog printed by 'vecroute catalog' and save it as the corpus file",
                "Set classifier.corpus_path or pass --corpus",
            ],
            Self::Vector(VectorError::DimensionMismatch { .. })
            | Self::Service(ServiceError::Classify(VectorError::DimensionMismatch { .. })) => {
                vec!["Check store.dimension against the encoder output"]
            }
            Self::Service(ServiceError::DimensionConflict { .. }) => vec![
                "Re-encode the corpus with the encoder that filled the store",
                "Check store.dimension against the corpus file",
            ],
            Self::Config(_) => vec!["Run 'vecroute init --force' to regenerate the settings file"],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_category() {
        let err = CliError::from(VectorError::InvalidTopK);
        assert_eq!(err.exit_code(), ExitCode::InvalidInput);
        assert_eq!(err.status_code(), "INVALID_INPUT");

        let err = CliError::from(CorpusError::Empty);
        assert_eq!(err.exit_code(), ExitCode::ConfigError);

        let err = CliError::from(ServiceError::Store(StoreError::Cancelled));
        assert_eq!(err.exit_code(), ExitCode::Transient);
        assert_eq!(err.status_code(), "STORE_CANCELLED");

        let err = CliError::from(ServiceError::DimensionConflict { corpus: 3, store: 5 });
        assert_eq!(err.exit_code(), ExitCode::ConfigError);
        assert_eq!(err.status_code(), "DIMENSION_CONFLICT");
    }

    #[test]
    fn test_missing_corpus_has_suggestions() {
        let err = CliError::from(CorpusError::Read {
            path: "corpus.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert!(!err.recovery_suggestions().is_empty());
    }
}
