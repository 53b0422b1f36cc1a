use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive string.
pub const LOG_ENV: &str = "CYPRESS_CLI_LOG";

const DEFAULT_DIRECTIVES: &str = "warn";

/// Install the stderr subscriber, filtered by `CYPRESS_CLI_LOG` (default `warn`).
pub fn init() {
    install(build_filter(std::env::var(LOG_ENV).ok().as_deref()));
}

/// Install the stderr subscriber at `error`, ignoring `CYPRESS_CLI_LOG`.
pub fn init_errors_only() {
    install(errors_only_filter());
}

fn install(filter: EnvFilter) {
    // A second call keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .compact()
        .try_init();
}

fn errors_only_filter() -> EnvFilter {
    EnvFilter::new("error")
}

fn build_filter(env_value: Option<&str>) -> EnvFilter {
    let directives = env_value
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES);
    EnvFilter::builder().parse_lossy(directives)
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn env_value_sets_level() {
        assert_eq!(
            build_filter(Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            build_filter(Some("error")).max_level_hint(),
            Some(LevelFilter::ERROR)
        );
    }

    #[test]
    fn blank_values_default_to_warn() {
        assert_eq!(build_filter(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            build_filter(Some("  ")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn errors_only_filter_keeps_error() {
        assert_eq!(
            errors_only_filter().max_level_hint(),
            Some(LevelFilter::ERROR)
        );
    }
}
