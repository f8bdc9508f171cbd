use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Process exited: {0}")]
    ProcessExited(String),

    #[error("Not attached to a process")]
    NotAttached,

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Pointer chain could not be resolved: {0}")]
    PointerUnresolved(String),

    #[error("No pointer chain configured for {0}")]
    PointerMissing(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid episode phase: expected {expected}, got {actual}")]
    InvalidPhase {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Input error: {0}")]
    Input(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Check if the target process is unreachable.
    ///
    /// These are the only errors that abort an episode.
    pub fn is_attach_failure(&self) -> bool {
        matches!(
            self,
            Error::ProcessNotFound(_)
                | Error::ProcessOpenFailed(_)
                | Error::ProcessExited(_)
                | Error::NotAttached
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_attach_failures() {
        assert!(Error::ProcessNotFound("game.exe".into()).is_attach_failure());
        assert!(Error::ProcessExited("game.exe".into()).is_attach_failure());
        assert!(Error::NotAttached.is_attach_failure());
        assert!(
            !Error::MemoryWriteFailed {
                address: 0x1000,
                message: "denied".into()
            }
            .is_attach_failure()
        );
        assert!(!Error::InvalidAction("7".into()).is_attach_failure());
    }

    #[test]
    fn test_memory_error_formats_address_as_hex() {
        let err = Error::MemoryReadFailed {
            address: 0x7FF6_1234,
            message: "partial copy".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read process memory at address 0x7ff61234: partial copy"
        );
    }
}
