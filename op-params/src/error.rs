//! Error types for parameter loading, assignment and validation

use std::path::PathBuf;

use crate::types::ValidationRule;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parameter internal name is empty")]
    EmptyInternalName,

    #[error("parameter '{name}' cannot be assigned an empty value")]
    EmptyValue { name: String },

    #[error("parameter name '{0}' is undefined")]
    UnknownParameterName(String),

    #[error("parameter '{0}' is described more than once in the descriptor table")]
    DuplicateParameterName(String),

    #[error(
        "descriptor row has {actual} fields, expected {expected} (row: {row:?})"
    )]
    MalformedDescriptorTable {
        expected: usize,
        actual: usize,
        row: String,
    },

    #[error("value {value:?} in column {field} is not a validation rule (row: {row:?})")]
    InvalidValidationRule {
        value: String,
        field: String,
        row: String,
    },

    #[error("descriptor column '{0}' is undefined and unsupported")]
    UnknownDescriptorField(String),

    #[error("descriptor header {header:?} must name each of {expected} exactly once")]
    InvalidDescriptorHeader { header: String, expected: String },

    #[error("validation rule {rule} of parameter '{name}' is unsupported")]
    UnsupportedValidationRule { name: String, rule: ValidationRule },

    #[error(
        "default for parameter '{name}' has type {stored_type}, expected {expected_type} (value: {value})"
    )]
    DefaultTypeMismatch {
        name: String,
        stored_type: &'static str,
        expected_type: &'static str,
        value: String,
    },

    #[error("type information for parameter '{name}' cannot be found in {resource}")]
    MissingDescriptor { name: String, resource: String },

    #[error("parameter '{0}' has no value to validate")]
    ValueNotSet(String),

    #[error("default store lookup for '{name}' failed")]
    DefaultStore {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {origin}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Deployment errors come from a corrupted descriptor table, settings or
    /// string resource; everything else is a caller error.
    pub fn is_deployment_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedDescriptorTable { .. }
                | Self::InvalidValidationRule { .. }
                | Self::UnknownDescriptorField(_)
                | Self::InvalidDescriptorHeader { .. }
                | Self::DuplicateParameterName(_)
                | Self::MissingDescriptor { .. }
                | Self::DefaultTypeMismatch { .. }
                | Self::UnsupportedValidationRule { .. }
                | Self::Csv(_)
                | Self::Json { .. }
        )
    }
}
