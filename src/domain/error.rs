//! Domain error types.

/// Top-level error type for klinetrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("data source error ({source_name}): {reason}")]
    DataSource { source_name: String, reason: String },

    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("insufficient history: have {have} rows, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("training failed: {reason}")]
    Training { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub fn data_source(source_name: impl Into<String>, reason: impl ToString) -> Self {
        TraderError::DataSource {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        TraderError::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn config_invalid(
        section: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TraderError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// True for the configuration family of errors.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            TraderError::ConfigParse { .. }
                | TraderError::ConfigMissing { .. }
                | TraderError::ConfigInvalid { .. }
        )
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::DataSource { .. } => 3,
            TraderError::MalformedInput { .. } => 4,
            TraderError::InsufficientHistory { .. } => 5,
            TraderError::Training { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
