//! Error types for action primitives

use thiserror::Error;

use crate::driver::DriverError;

/// Failures raised while performing a primitive or one of its side effects
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Page driver rejected or failed the primitive
    #[error("{0}")]
    Driver(#[from] DriverError),

    /// Image download failed (network error or non-success status)
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    /// Writing to the file store failed
    #[error("file storage failed: {0}")]
    Storage(String),

    /// Neither direct assignment nor the file chooser accepted the upload
    #[error("upload failed: direct assignment ({direct}); file chooser ({chooser})")]
    UploadFailed { direct: String, chooser: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    pub fn download(url: impl Into<String>, reason: impl ToString) -> Self {
        ActionError::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Transport-level failures worth retrying by an outer caller
    pub fn is_transport(&self) -> bool {
        matches!(self, ActionError::Download { .. })
    }
}

impl From<std::io::Error> for ActionError {
    fn from(err: std::io::Error) -> Self {
        ActionError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverErrorKind;

    #[test]
    fn driver_errors_display_transparently() {
        let err: ActionError = DriverError::new(DriverErrorKind::Navigation)
            .with_hint("net::ERR_NAME_NOT_RESOLVED")
            .into();
        assert_eq!(
            err.to_string(),
            "navigation failed: net::ERR_NAME_NOT_RESOLVED"
        );
        assert!(!err.is_transport());
    }

    #[test]
    fn upload_message_names_both_paths() {
        let err = ActionError::UploadFailed {
            direct: "not a file input".into(),
            chooser: "file chooser did not open".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("direct assignment (not a file input)"));
        assert!(msg.contains("file chooser (file chooser did not open)"));
    }
}
