/// Error type for loading and checking form definitions.
///
/// These are configuration problems detected before any value is validated.
/// Problems found while validating (a malformed pattern, an unknown custom
/// key) are reported as failed outcomes by the validator instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The document could not be parsed in the given format.
    #[error("invalid {format} config: {reason}")]
    Parse {
        format: &'static str,
        reason: String,
    },

    /// The document parsed but does not have the shape of a form definition.
    #[error("invalid form definition: {reason}")]
    InvalidShape { reason: String },

    /// A field has an empty name.
    #[error("field at position {index} has an empty name")]
    EmptyFieldName { index: usize },

    /// Two fields share the same name.
    #[error("duplicate field name `{name}`")]
    DuplicateField { name: String },
}

impl SchemaError {
    /// Broad error category for grouping in logs.
    #[must_use]
    pub fn category(&self) -> &str {
        match self {
            Self::Parse { .. } => "parse",
            Self::InvalidShape { .. } => "shape",
            Self::EmptyFieldName { .. } | Self::DuplicateField { .. } => "structure",
        }
    }

    /// Machine-readable error code for programmatic handling.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Parse { .. } => "SCHEMA_PARSE",
            Self::InvalidShape { .. } => "SCHEMA_SHAPE",
            Self::EmptyFieldName { .. } => "SCHEMA_EMPTY_NAME",
            Self::DuplicateField { .. } => "SCHEMA_DUPLICATE_FIELD",
        }
    }
}
