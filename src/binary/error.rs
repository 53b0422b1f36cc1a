use std::fmt;
use std::path::PathBuf;

/// Errors raised while locating, launching or verifying the test runner binary.
#[derive(Debug)]
pub enum BinaryError {
    /// No binary was found at the configured path or in the cache.
    NotFound(String),

    /// The binary process could not be spawned.
    SpawnFailed(String),

    /// The binary exited unsuccessfully.
    ExitedWithFailure(i32),

    /// The smoke test did not echo the expected ping.
    SmokeTestFailed(String),

    /// The project directory could not be determined.
    NoProject(String),

    /// The verification state file is unreadable.
    InvalidState(String),

    /// An I/O error occurred.
    Io(std::io::Error),
}

impl fmt::Display for BinaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(
                f,
                "Cypress binary not found: {msg}. Set CYPRESS_RUN_BINARY or [binary] path in the config file"
            ),
            Self::SpawnFailed(msg) => write!(f, "Cypress binary failed to start: {msg}"),
            Self::ExitedWithFailure(code) => {
                write!(f, "Cypress binary exited with status {code}")
            }
            Self::SmokeTestFailed(msg) => write!(f, "Cypress verification failed: {msg}"),
            Self::NoProject(msg) => write!(f, "could not determine the project path: {msg}"),
            Self::InvalidState(msg) => write!(f, "invalid binary state file: {msg}"),
            Self::Io(e) => write!(f, "Cypress binary I/O error: {e}"),
        }
    }
}

impl std::error::Error for BinaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BinaryError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<BinaryError> for crate::error::AppError {
    fn from(e: BinaryError) -> Self {
        Self::general(e.to_string())
    }
}

impl BinaryError {
    pub(crate) fn missing(path: &std::path::Path) -> Self {
        Self::NotFound(format!("{} does not exist", path.display()))
    }

    pub(crate) fn not_cached(searched: &[PathBuf]) -> Self {
        let list = searched
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        if list.is_empty() {
            Self::NotFound("no cache location is known for this platform".into())
        } else {
            Self::NotFound(format!("searched {list}"))
        }
    }
}
