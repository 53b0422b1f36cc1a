#![allow(clippy::doc_markdown)]

use std::convert::Infallible;
use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::descriptions::{self, DescriptionError};
use crate::error::AppError;
use crate::options::{OptionValue, ParsedOptions, coerce_false_default_true};

const BIN_NAME: &str = "cypress";

/// The fixed set of top-level commands, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    Version,
    Run,
    Open,
    Install,
    Verify,
}

impl CommandName {
    pub const ALL: [Self; 5] = [
        Self::Version,
        Self::Run,
        Self::Open,
        Self::Install,
        Self::Verify,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Run => "run",
            Self::Open => "open",
            Self::Install => "install",
            Self::Verify => "verify",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    fn about(self) -> &'static str {
        match self {
            Self::Version => "Prints Cypress version",
            Self::Run => "Runs Cypress Headlessly",
            Self::Open => "Opens Cypress normally, as a desktop application.",
            Self::Install => "Installs the Cypress executable matching this package's version",
            Self::Verify => "Verifies that Cypress is installed correctly and executable",
        }
    }

    fn usage(self) -> Option<&'static str> {
        match self {
            Self::Run => Some("cypress run [options]"),
            Self::Open => Some("cypress open [options]"),
            Self::Version | Self::Install | Self::Verify => None,
        }
    }

    /// Option schema for this command. Only `run` and `open` take flags.
    #[must_use]
    pub fn options(self) -> &'static [OptionSpec] {
        match self {
            Self::Run => RUN_OPTIONS,
            Self::Open => OPEN_OPTIONS,
            Self::Version | Self::Install | Self::Verify => &[],
        }
    }
}

/// Whether a flag must be followed by a value or may stand alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Required,
    Optional,
}

/// Declared shape of one flag. `key` doubles as the description key and the
/// parsed-options key.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub key: &'static str,
    pub short: Option<char>,
    pub long: &'static str,
    pub value_name: &'static str,
    pub arity: Arity,
    pub coerce: Option<fn(&str) -> bool>,
}

impl OptionSpec {
    const fn value(
        key: &'static str,
        short: Option<char>,
        long: &'static str,
        value_name: &'static str,
    ) -> Self {
        Self {
            key,
            short,
            long,
            value_name,
            arity: Arity::Required,
            coerce: None,
        }
    }

    const fn switch(key: &'static str, short: Option<char>, long: &'static str) -> Self {
        Self {
            key,
            short,
            long,
            value_name: "bool",
            arity: Arity::Optional,
            coerce: Some(coerce_false_default_true),
        }
    }
}

const RUN_OPTIONS: &[OptionSpec] = &[
    OptionSpec::switch("record", None, "record"),
    OptionSpec::value("key", Some('k'), "key", "record-key"),
    OptionSpec::value("spec", Some('s'), "spec", "spec"),
    OptionSpec::value("reporter", Some('r'), "reporter", "reporter"),
    OptionSpec::value(
        "reporterOptions",
        Some('o'),
        "reporter-options",
        "reporter-options",
    ),
    OptionSpec::value("port", Some('p'), "port", "port"),
    OptionSpec::value("env", Some('e'), "env", "env"),
    OptionSpec::value("config", Some('c'), "config", "config"),
    OptionSpec::value("browser", Some('b'), "browser", "browser-name"),
    OptionSpec::value("project", Some('P'), "project", "project-path"),
];

const OPEN_OPTIONS: &[OptionSpec] = &[
    OptionSpec::value("port", Some('p'), "port", "port"),
    OptionSpec::value("env", Some('e'), "env", "env"),
    OptionSpec::value("config", Some('c'), "config", "config"),
    OptionSpec::switch("detached", Some('d'), "detached"),
    OptionSpec::value("project", Some('P'), "project", "project-path"),
];

type Describe = fn(&str) -> Result<&'static str, DescriptionError>;

/// A selected command plus its coerced option values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: CommandName,
    pub options: ParsedOptions,
}

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Nothing to dispatch; show this help text.
    Help(String),
    Invoke(Invocation),
}

/// The immutable command tree, built once at startup.
#[derive(Debug, Clone)]
pub struct Registry {
    program: Command,
}

impl Registry {
    /// Declare every command and resolve all option descriptions.
    ///
    /// # Errors
    ///
    /// Returns `DescriptionError::Missing` if any declared option has no
    /// registered description.
    pub fn build() -> Result<Self, DescriptionError> {
        Self::build_with(descriptions::text)
    }

    fn build_with(describe: Describe) -> Result<Self, DescriptionError> {
        let mut program = Command::new(BIN_NAME)
            .bin_name(BIN_NAME)
            .about("Command-line launcher for the Cypress test runner")
            .disable_help_subcommand(true)
            .term_width(100);

        for name in CommandName::ALL {
            program = program.subcommand(build_command(name, describe)?);
        }

        Ok(Self { program })
    }

    /// The underlying command tree (used for man page generation).
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.program
    }

    /// Global help text.
    #[must_use]
    pub fn help(&self) -> String {
        self.program.clone().render_help().to_string()
    }

    /// Parse a full argument vector, `args[0]` being the program name.
    ///
    /// # Errors
    ///
    /// Returns a usage `AppError` for unknown commands (carrying the global
    /// help) and for flags the selected command does not accept.
    pub fn parse<I, T>(&self, args: I) -> Result<Parsed, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        tracing::debug!(?args, "cli starts with arguments");

        let Some(first) = args.get(1).map(|a| a.to_string_lossy().into_owned()) else {
            return Ok(Parsed::Help(self.help()));
        };
        let known = CommandName::from_name(&first);

        match self.program.clone().try_get_matches_from(args) {
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                Ok(Parsed::Help(e.render().to_string()))
            }
            Err(e) => match known {
                Some(_) => Err(AppError::usage(e.render().to_string())),
                None => Err(AppError::unknown_command(&first, self.help())),
            },
            Ok(matches) => {
                let selected = known.and_then(|command| {
                    matches
                        .subcommand_matches(command.as_str())
                        .map(|sub| (command, sub))
                });
                let Some((command, sub)) = selected else {
                    return Err(AppError::unknown_command(&first, self.help()));
                };
                tracing::debug!(command = command.as_str(), "command selected");
                Ok(Parsed::Invoke(Invocation {
                    command,
                    options: collect_options(command, sub),
                }))
            }
        }
    }
}

fn build_command(name: CommandName, describe: Describe) -> Result<Command, DescriptionError> {
    // A repeated flag keeps its last value.
    let mut command = Command::new(name.as_str())
        .about(name.about())
        .args_override_self(true);
    if let Some(usage) = name.usage() {
        command = command.override_usage(usage);
    }
    for spec in name.options() {
        command = command.arg(build_arg(spec, describe)?);
    }
    Ok(command)
}

fn build_arg(spec: &OptionSpec, describe: Describe) -> Result<Arg, DescriptionError> {
    let mut arg = Arg::new(spec.key)
        .long(spec.long)
        .value_name(spec.value_name)
        .help(describe(spec.key)?)
        .action(ArgAction::Set);

    if let Some(short) = spec.short {
        arg = arg.short(short);
    }

    arg = match spec.arity {
        Arity::Required => arg.num_args(1),
        Arity::Optional => arg.num_args(0..=1).default_missing_value("true"),
    };

    if let Some(coerce) = spec.coerce {
        arg = arg.value_parser(move |raw: &str| Ok::<bool, Infallible>(coerce(raw)));
    }

    Ok(arg)
}

fn collect_options(command: CommandName, matches: &ArgMatches) -> ParsedOptions {
    let mut parsed = ParsedOptions::new();
    for spec in command.options() {
        let value = if spec.coerce.is_some() {
            matches.get_one::<bool>(spec.key).copied().map(OptionValue::Bool)
        } else {
            matches
                .get_one::<String>(spec.key)
                .cloned()
                .map(OptionValue::Str)
        };
        if let Some(value) = value {
            parsed.insert(spec.key, value);
        }
    }
    parsed
}
