use std::io;

// Represents errors that can occur within the platform layer.
#[derive(Debug)]
pub enum PlatformError {
    // Failure while setting up the platform layer or the components it hosts.
    InitializationFailed(String),
    // A `WindowId` that the platform layer does not know was used.
    InvalidHandle(String),
    // Reading input or writing output failed.
    Io(io::Error),
    // A requested operation could not be completed.
    OperationFailed(String),
}

impl From<io::Error> for PlatformError {
    fn from(err: io::Error) -> Self {
        PlatformError::Io(err)
    }
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::InitializationFailed(s) => write!(f, "Initialization Failed: {s}"),
            PlatformError::InvalidHandle(s) => write!(f, "Invalid Handle: {s}"),
            PlatformError::Io(e) => write!(f, "I/O Error: {e}"),
            PlatformError::OperationFailed(s) => write!(f, "Operation Failed: {s}"),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized `Result` type for platform layer operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
