use std::path::{Path, PathBuf};

use super::BinaryError;

/// Environment variable relocating the binary cache.
pub const CACHE_FOLDER_ENV: &str = "CYPRESS_CACHE_FOLDER";

/// Find the test runner binary for `version`.
///
/// An explicit path (from `CYPRESS_RUN_BINARY` or the config file) must
/// exist; otherwise the platform cache is searched.
///
/// # Errors
///
/// Returns `BinaryError::NotFound` if no binary can be located.
pub fn find_binary(explicit: Option<&Path>, version: &str) -> Result<PathBuf, BinaryError> {
    let cache_root = std::env::var(CACHE_FOLDER_ENV)
        .ok()
        .map(PathBuf::from)
        .or_else(default_cache_root);
    let candidates = cache_root
        .map(|root| binary_candidates(&root, version))
        .unwrap_or_default();
    find_binary_from(explicit, &candidates)
}

/// Testable core of [`find_binary`]: the candidate list is passed in.
fn find_binary_from(explicit: Option<&Path>, candidates: &[PathBuf]) -> Result<PathBuf, BinaryError> {
    if let Some(p) = explicit {
        return if p.is_file() {
            Ok(p.to_path_buf())
        } else {
            Err(BinaryError::missing(p))
        };
    }

    candidates
        .iter()
        .find(|c| c.is_file())
        .cloned()
        .ok_or_else(|| BinaryError::not_cached(candidates))
}

fn default_cache_root() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        dirs::data_local_dir().map(|d| d.join("Cypress").join("Cache"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::cache_dir().map(|d| d.join("Cypress"))
    }
}

/// Executable locations inside `<cache_root>/<version>/` for the current platform.
fn binary_candidates(cache_root: &Path, version: &str) -> Vec<PathBuf> {
    let dir = cache_root.join(version);

    #[cfg(target_os = "macos")]
    {
        vec![dir.join("Cypress.app/Contents/MacOS/Cypress")]
    }

    #[cfg(target_os = "linux")]
    {
        vec![dir.join("Cypress").join("Cypress")]
    }

    #[cfg(target_os = "windows")]
    {
        vec![dir.join("Cypress").join("Cypress.exe")]
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        let _ = dir;
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_used_when_it_exists() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("Cypress");
        std::fs::write(&bin, "").unwrap();

        let found = find_binary_from(Some(&bin), &[]).unwrap();
        assert_eq!(found, bin);
    }

    #[test]
    fn missing_explicit_path_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let cached = dir.path().join("cached");
        std::fs::write(&cached, "").unwrap();

        let err = find_binary_from(Some(Path::new("/nonexistent/Cypress")), &[cached]).unwrap_err();
        assert!(matches!(err, BinaryError::NotFound(_)));
        assert!(err.to_string().contains("/nonexistent/Cypress"));
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let present = dir.path().join("present");
        std::fs::write(&present, "").unwrap();

        let found = find_binary_from(None, &[missing, present.clone()]).unwrap();
        assert_eq!(found, present);
    }

    #[test]
    fn directories_are_not_binaries() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_binary_from(None, &[dir.path().to_path_buf()]).unwrap_err();
        assert!(err.to_string().contains("searched"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_cache_layout() {
        let candidates = binary_candidates(Path::new("/cache/Cypress"), "3.1.0");
        assert_eq!(
            candidates,
            vec![PathBuf::from("/cache/Cypress/3.1.0/Cypress/Cypress")]
        );
    }
}
