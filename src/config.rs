use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "CYPRESS_CLI_CONFIG";

// ---------------------------------------------------------------------------
// Config structs (parsed from TOML)
// ---------------------------------------------------------------------------

/// Represents the parsed TOML config file. All fields optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub binary: BinaryConfig,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BinaryConfig {
    pub path: Option<String>,
    pub state_dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved config (all defaults filled in)
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ResolvedConfig {
    pub config_path: Option<PathBuf>,
    /// Explicit binary location; `None` means search the platform cache.
    pub binary_path: Option<PathBuf>,
    /// Where the binary verification state is recorded.
    pub state_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// Could not determine a state directory.
    NoStateDir,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStateDir => write!(f, "could not determine a state directory"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::AppError {
    fn from(e: ConfigError) -> Self {
        Self::general(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Config file search
// ---------------------------------------------------------------------------

/// Find the first config file that exists, checking locations in priority order.
///
/// Search order:
/// 1. `$CYPRESS_CLI_CONFIG`
/// 2. `./.cypress-cli.toml` (project-local)
/// 3. `<config_dir>/cypress-cli/config.toml` (XDG / platform config dir)
/// 4. `~/.cypress-cli.toml` (home directory fallback)
///
/// There is no flag for this: `-c/--config` belongs to the commands.
#[must_use]
pub fn find_config_file() -> Option<PathBuf> {
    find_config_file_with(std::env::var(CONFIG_ENV).ok())
}

/// Testable variant of [`find_config_file`] that accepts an explicit env value.
#[must_use]
pub fn find_config_file_with(env_config: Option<String>) -> Option<PathBuf> {
    if let Some(env_path) = env_config {
        let p = PathBuf::from(env_path);
        if p.exists() {
            return Some(p);
        }
    }

    let local = PathBuf::from(".cypress-cli.toml");
    if local.exists() {
        return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let xdg = config_dir.join("cypress-cli").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".cypress-cli.toml");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load and parse the config file, if any. Returns the file path and the parsed config.
#[must_use]
pub fn load_config() -> (Option<PathBuf>, ConfigFile) {
    let path = find_config_file();
    match &path {
        Some(p) => {
            let config = load_config_from(p);
            (path, config)
        }
        None => (None, ConfigFile::default()),
    }
}

/// Load and parse a config file from a specific path.
///
/// On read or parse errors, logs a warning and returns `ConfigFile::default()`.
#[must_use]
pub fn load_config_from(path: &Path) -> ConfigFile {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path),
        Err(e) => {
            tracing::warn!(path = %path.display(), "could not read config file: {e}");
            ConfigFile::default()
        }
    }
}

/// Parse TOML content into a `ConfigFile`.
///
/// Strict parsing first, to detect unknown keys; lenient parsing keeps the
/// known keys when the strict pass fails on unknown fields.
#[must_use]
pub fn parse_config(contents: &str, path: &Path) -> ConfigFile {
    match toml::from_str::<StrictConfigFile>(contents) {
        Ok(strict) => strict.into(),
        Err(strict_err) => match toml::from_str::<ConfigFile>(contents) {
            Ok(config) => {
                tracing::warn!(path = %path.display(), "unknown keys in config file: {strict_err}");
                config
            }
            Err(parse_err) => {
                tracing::warn!(path = %path.display(), "could not parse config file: {parse_err}");
                ConfigFile::default()
            }
        },
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StrictConfigFile {
    #[serde(default)]
    binary: StrictBinaryConfig,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StrictBinaryConfig {
    path: Option<String>,
    state_dir: Option<String>,
}

impl From<StrictConfigFile> for ConfigFile {
    fn from(s: StrictConfigFile) -> Self {
        Self {
            binary: BinaryConfig {
                path: s.binary.path,
                state_dir: s.binary.state_dir,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Config resolution
// ---------------------------------------------------------------------------

/// Environment variable overriding the binary location.
pub const RUN_BINARY_ENV: &str = "CYPRESS_RUN_BINARY";

/// Resolve a config file, applying `CYPRESS_RUN_BINARY` over `[binary] path`.
#[must_use]
pub fn resolve_config(file: &ConfigFile, config_path: Option<PathBuf>) -> ResolvedConfig {
    resolve_config_with(file, config_path, std::env::var(RUN_BINARY_ENV).ok())
}

/// Testable variant of [`resolve_config`] that accepts the env override.
#[must_use]
pub fn resolve_config_with(
    file: &ConfigFile,
    config_path: Option<PathBuf>,
    binary_env: Option<String>,
) -> ResolvedConfig {
    let binary_path = binary_env
        .filter(|p| !p.is_empty())
        .or_else(|| file.binary.path.clone())
        .map(PathBuf::from);

    ResolvedConfig {
        config_path,
        binary_path,
        state_dir: file
            .binary
            .state_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(default_state_dir),
    }
}

fn default_state_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("cypress-cli"))
}

impl ResolvedConfig {
    /// The state directory, or an error when none could be determined.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoStateDir` when neither the config nor the
    /// platform provides a cache directory.
    pub fn require_state_dir(&self) -> Result<&Path, ConfigError> {
        self.state_dir.as_deref().ok_or(ConfigError::NoStateDir)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
