//! Parsed option values and the allow-listed request handed to handlers.

use std::collections::BTreeMap;

use serde::Serialize;

/// Keys a [`NormalizedRequest`] may carry, in their wire spelling.
pub const ALLOWED_KEYS: [&str; 13] = [
    "spec",
    "reporter",
    "reporterOptions",
    "path",
    "destination",
    "port",
    "env",
    "cypressVersion",
    "config",
    "record",
    "key",
    "browser",
    "detached",
];

/// Opt-out switch coercion: only the exact literal `"false"` turns it off.
#[must_use]
pub fn coerce_false_default_true(raw: &str) -> bool {
    raw != "false"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    Bool(bool),
}

impl OptionValue {
    fn as_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }

    fn as_flag(&self) -> bool {
        match self {
            Self::Str(s) => coerce_false_default_true(s),
            Self::Bool(b) => *b,
        }
    }
}

/// Option values for one invocation, keyed by option key (e.g. `reporterOptions`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOptions {
    values: BTreeMap<String, OptionValue>,
}

impl ParsedOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) {
        self.values.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, OptionValue)> for ParsedOptions {
    fn from_iter<T: IntoIterator<Item = (K, OptionValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// The allow-listed subset of parsed options. Unset fields are omitted when
/// serialized, so the wire shape only ever contains keys the user supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cypress_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detached: Option<bool>,
}

/// Copy the allow-listed keys present in `parsed`; everything else is dropped.
#[must_use]
pub fn normalize(parsed: &ParsedOptions) -> NormalizedRequest {
    let text = |key: &str| parsed.get(key).map(OptionValue::as_text);
    let flag = |key: &str| parsed.get(key).map(OptionValue::as_flag);

    NormalizedRequest {
        spec: text("spec"),
        reporter: text("reporter"),
        reporter_options: text("reporterOptions"),
        path: text("path"),
        destination: text("destination"),
        port: text("port"),
        env: text("env"),
        cypress_version: text("cypressVersion"),
        config: text("config"),
        record: flag("record"),
        key: text("key"),
        browser: text("browser"),
        detached: flag("detached"),
    }
}
