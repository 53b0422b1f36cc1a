//! Help text for every documented option, looked up by option key.

use std::fmt;

const DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "record",
        "records the run. sends test results, screenshots and videos to your Cypress Dashboard.",
    ),
    (
        "key",
        "your secret Record Key. you can omit this if you set a CYPRESS_RECORD_KEY environment variable.",
    ),
    ("spec", "runs a specific spec file. defaults to \"all\""),
    (
        "reporter",
        "runs a specific mocha reporter. pass a path to use a custom reporter. defaults to \"spec\"",
    ),
    (
        "reporterOptions",
        "options for the mocha reporter. defaults to \"null\"",
    ),
    (
        "port",
        "runs Cypress on a specific port. overrides any value in cypress.json.",
    ),
    (
        "env",
        "sets environment variables. separate multiple values with a comma. overrides any value in cypress.json or cypress.env.json",
    ),
    (
        "config",
        "sets configuration values. separate multiple values with a comma. overrides any value in cypress.json.",
    ),
    (
        "browser",
        "runs Cypress in the browser with the given name. note: using an external browser will not record a video.",
    ),
    ("detached", "runs Cypress application in detached mode"),
    ("project", "path to the project"),
];

/// An option was declared without registering its help text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionError {
    Missing(String),
}

impl fmt::Display for DescriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "Could not find description for: {key}"),
        }
    }
}

impl std::error::Error for DescriptionError {}

impl From<DescriptionError> for crate::error::AppError {
    fn from(e: DescriptionError) -> Self {
        Self::general(e.to_string())
    }
}

/// Look up the help text for `key`.
///
/// # Errors
///
/// Returns `DescriptionError::Missing` if no text is registered for `key`.
pub fn text(key: &str) -> Result<&'static str, DescriptionError> {
    lookup(DESCRIPTIONS, key)
}

fn lookup(
    table: &'static [(&'static str, &'static str)],
    key: &str,
) -> Result<&'static str, DescriptionError> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, text)| *text)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| DescriptionError::Missing(key.to_string()))
}
