use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::BinaryError;

const STATE_FILE: &str = "binary_state.json";

/// Verification state persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryState {
    pub binary: PathBuf,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// `<state_dir>/binary_state.json`
#[must_use]
pub fn state_file_path(state_dir: &Path) -> PathBuf {
    state_dir.join(STATE_FILE)
}

/// Write the state file atomically (temp file, then rename).
///
/// # Errors
///
/// Returns `BinaryError::Io` on I/O failure.
pub fn write_state_to(path: &Path, state: &BinaryState) -> Result<(), BinaryError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(state)
        .map_err(|e| BinaryError::InvalidState(e.to_string()))?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read the state file. Returns `Ok(None)` if it does not exist.
///
/// # Errors
///
/// Returns `BinaryError::InvalidState` on malformed JSON, or
/// `BinaryError::Io` on other I/O errors.
pub fn read_state_from(path: &Path) -> Result<Option<BinaryState>, BinaryError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let state: BinaryState = serde_json::from_str(&contents)
                .map_err(|e| BinaryError::InvalidState(e.to_string()))?;
            Ok(Some(state))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BinaryError::Io(e)),
    }
}

/// Whether `binary` is recorded as verified. An unreadable state file counts
/// as unverified.
#[must_use]
pub fn is_verified(path: &Path, binary: &Path) -> bool {
    match read_state_from(path) {
        Ok(Some(state)) => state.verified && state.binary == binary,
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring binary state: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(binary: &str, verified: bool) -> BinaryState {
        BinaryState {
            binary: PathBuf::from(binary),
            verified,
            version: None,
        }
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_file_path(&dir.path().join("nested"));
        let written = BinaryState {
            version: Some("3.1.0".into()),
            ..state("/opt/Cypress", true)
        };
        write_state_to(&path, &written).unwrap();

        assert_eq!(read_state_from(&path).unwrap(), Some(written));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_file_path(dir.path());
        assert_eq!(read_state_from(&path).unwrap(), None);
        assert!(!is_verified(&path, Path::new("/opt/Cypress")));
    }

    #[test]
    fn invalid_json_is_reported_and_unverified() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_file_path(dir.path());
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            read_state_from(&path),
            Err(BinaryError::InvalidState(_))
        ));
        assert!(!is_verified(&path, Path::new("/opt/Cypress")));
    }

    #[test]
    fn verification_is_tied_to_the_binary_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_file_path(dir.path());
        write_state_to(&path, &state("/opt/Cypress", true)).unwrap();

        assert!(is_verified(&path, Path::new("/opt/Cypress")));
        assert!(!is_verified(&path, Path::new("/other/Cypress")));

        write_state_to(&path, &state("/opt/Cypress", false)).unwrap();
        assert!(!is_verified(&path, Path::new("/opt/Cypress")));
    }

    #[test]
    fn version_omitted_when_unknown() {
        let json = serde_json::to_value(state("/opt/Cypress", false)).unwrap();
        assert!(json.get("version").is_none());
        assert_eq!(json["verified"], false);
    }
}
