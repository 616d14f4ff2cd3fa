//! Error types for postflow.
//!
//! Errors carry a stable code so agents driving the CLI can branch on the
//! failure kind without parsing the message. Structural defects found by the
//! validator are not errors: they are reported as data in
//! [`ValidationReport`](crate::workflow::ValidationReport).

use thiserror::Error;

/// Result type alias for postflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// postflow error types.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported CRM: {0}. Supported: hubspot, salesforce, attio")]
    UnsupportedCrm(String),

    #[error("{} required for {template} template", .parameters.join(" and "))]
    MissingParameter {
        template: String,
        parameters: Vec<String>,
    },

    #[error("Unknown template '{0}'")]
    TemplateNotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error code for agent parsing.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedCrm(_) => "UNSUPPORTED_CRM",
            Error::MissingParameter { .. } => "MISSING_PARAMETER",
            Error::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            Error::Parse(_) => "PARSE_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the caller supplied bad template parameters.
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedCrm(_) | Error::MissingParameter { .. } | Error::TemplateNotFound(_)
        )
    }

    /// Convert to agent-friendly JSON response.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        })
    }
}
