//! Hands a parsed invocation to its subsystem handler and turns the outcome
//! into an exit decision. Nothing here terminates the process; `main` does.

use std::ffi::OsString;
use std::fmt;

use async_trait::async_trait;

use crate::cli::{CommandName, Invocation, Parsed, Registry};
use crate::error::{AppError, ExitCode};
use crate::options::{NormalizedRequest, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOptions {
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    pub force: bool,
    pub welcome_message: bool,
}

/// Package and binary versions reported by `cypress version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    pub package: String,
    /// `None` when no binary is installed.
    pub binary: Option<String>,
}

impl fmt::Display for Versions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cypress package version: {}", self.package)?;
        write!(
            f,
            "Cypress binary version: {}",
            self.binary.as_deref().unwrap_or("not installed")
        )
    }
}

/// The subsystems a command is dispatched to.
#[async_trait]
pub trait Handlers: Send + Sync {
    async fn version(&self) -> Versions;

    /// Resolves with the exit code the process should adopt.
    async fn run(&self, request: NormalizedRequest) -> Result<i32, AppError>;

    async fn open(&self, request: NormalizedRequest) -> Result<(), AppError>;

    async fn install(&self, options: InstallOptions) -> Result<(), AppError>;

    async fn verify(&self, options: VerifyOptions) -> Result<(), AppError>;
}

/// How the process should end once a command settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Terminate with this status.
    Code(i32),
    /// Return from `main` without forcing a status.
    Natural,
}

impl Exit {
    #[must_use]
    pub fn code(self) -> Option<i32> {
        match self {
            Self::Code(code) => Some(code),
            Self::Natural => None,
        }
    }
}

/// Invoke the handler for `invocation` and wait for it to settle.
///
/// # Errors
///
/// Returns the handler's error unchanged; the caller reports it and exits 1.
pub async fn dispatch<H>(invocation: Invocation, handlers: &H) -> Result<Exit, AppError>
where
    H: Handlers + ?Sized,
{
    match invocation.command {
        CommandName::Version => {
            let versions = handlers.version().await;
            println!("{versions}");
            Ok(Exit::Code(ExitCode::Success as i32))
        }
        CommandName::Run => {
            let request = normalized(&invocation);
            handlers.run(request).await.map(Exit::Code)
        }
        CommandName::Open => {
            let request = normalized(&invocation);
            handlers.open(request).await.map(|()| Exit::Natural)
        }
        CommandName::Install => handlers
            .install(InstallOptions { force: true })
            .await
            .map(|()| Exit::Natural),
        CommandName::Verify => handlers
            .verify(VerifyOptions {
                force: true,
                welcome_message: false,
            })
            .await
            .map(|()| Exit::Natural),
    }
}

fn normalized(invocation: &Invocation) -> NormalizedRequest {
    let request = normalize(&invocation.options);
    tracing::debug!(
        command = invocation.command.as_str(),
        request = %serde_json::to_string(&request).unwrap_or_default(),
        "normalized options"
    );
    request
}

/// Build the registry, parse `args` and dispatch the selected command.
///
/// # Errors
///
/// Returns usage errors from parsing and handler failures from dispatch.
pub async fn launch<I, T, H>(args: I, handlers: &H) -> Result<Exit, AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    H: Handlers + ?Sized,
{
    let registry = Registry::build()?;
    match registry.parse(args)? {
        Parsed::Help(help) => {
            println!("{help}");
            Ok(Exit::Natural)
        }
        Parsed::Invoke(invocation) => dispatch(invocation, handlers).await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::options::{OptionValue, ParsedOptions};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Version,
        Run(NormalizedRequest),
        Open(NormalizedRequest),
        Install(InstallOptions),
        Verify(VerifyOptions),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
        fail: bool,
        run_code: i32,
    }

    impl Recorder {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn record(&self, call: Call) -> Result<(), AppError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(AppError::general("handler exploded"))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Handlers for Recorder {
        async fn version(&self) -> Versions {
            self.calls.lock().unwrap().push(Call::Version);
            Versions {
                package: "3.1.0".into(),
                binary: None,
            }
        }

        async fn run(&self, request: NormalizedRequest) -> Result<i32, AppError> {
            self.record(Call::Run(request)).map(|()| self.run_code)
        }

        async fn open(&self, request: NormalizedRequest) -> Result<(), AppError> {
            self.record(Call::Open(request))
        }

        async fn install(&self, options: InstallOptions) -> Result<(), AppError> {
            self.record(Call::Install(options))
        }

        async fn verify(&self, options: VerifyOptions) -> Result<(), AppError> {
            self.record(Call::Verify(options))
        }
    }

    fn invocation(command: CommandName, options: &[(&str, OptionValue)]) -> Invocation {
        Invocation {
            command,
            options: options.iter().cloned().collect::<ParsedOptions>(),
        }
    }

    #[tokio::test]
    async fn version_exits_zero() {
        let handlers = Recorder::default();
        let exit = dispatch(invocation(CommandName::Version, &[]), &handlers)
            .await
            .unwrap();
        assert_eq!(exit, Exit::Code(0));
        assert_eq!(handlers.calls(), vec![Call::Version]);
    }

    #[tokio::test]
    async fn run_adopts_handler_exit_code() {
        let handlers = Recorder {
            run_code: 3,
            ..Recorder::default()
        };
        let exit = dispatch(invocation(CommandName::Run, &[]), &handlers)
            .await
            .unwrap();
        assert_eq!(exit, Exit::Code(3));
        assert_eq!(exit.code(), Some(3));
    }

    #[tokio::test]
    async fn run_receives_only_allow_listed_keys() {
        let handlers = Recorder::default();
        let options = [
            ("spec", OptionValue::Str("a.test.js".into())),
            ("project", OptionValue::Str("/app".into())),
            ("record", OptionValue::Bool(false)),
        ];
        dispatch(invocation(CommandName::Run, &options), &handlers)
            .await
            .unwrap();
        let expected = NormalizedRequest {
            spec: Some("a.test.js".into()),
            record: Some(false),
            ..NormalizedRequest::default()
        };
        assert_eq!(handlers.calls(), vec![Call::Run(expected)]);
    }

    #[tokio::test]
    async fn open_success_does_not_force_an_exit() {
        let handlers = Recorder::default();
        let options = [("detached", OptionValue::Bool(true))];
        let exit = dispatch(invocation(CommandName::Open, &options), &handlers)
            .await
            .unwrap();
        assert_eq!(exit, Exit::Natural);
        assert_eq!(exit.code(), None);
        let Call::Open(request) = &handlers.calls()[0] else {
            panic!("expected open");
        };
        assert_eq!(request.detached, Some(true));
    }

    #[tokio::test]
    async fn install_and_verify_pass_fixed_options() {
        let handlers = Recorder::default();
        dispatch(invocation(CommandName::Install, &[]), &handlers)
            .await
            .unwrap();
        dispatch(invocation(CommandName::Verify, &[]), &handlers)
            .await
            .unwrap();
        assert_eq!(
            handlers.calls(),
            vec![
                Call::Install(InstallOptions { force: true }),
                Call::Verify(VerifyOptions {
                    force: true,
                    welcome_message: false,
                }),
            ]
        );
    }

    #[tokio::test]
    async fn handler_failure_is_returned_once() {
        for command in [
            CommandName::Run,
            CommandName::Open,
            CommandName::Install,
            CommandName::Verify,
        ] {
            let handlers = Recorder::failing();
            let err = dispatch(invocation(command, &[]), &handlers)
                .await
                .unwrap_err();
            assert_eq!(err.message, "handler exploded");
            assert_eq!(err.exit_status(), 1);
            assert_eq!(handlers.calls().len(), 1, "{command:?} called more than once");
        }
    }

    #[tokio::test]
    async fn launch_without_command_invokes_nothing() {
        let handlers = Recorder::default();
        let exit = launch(["cypress"], &handlers).await.unwrap();
        assert_eq!(exit, Exit::Natural);
        assert!(handlers.calls().is_empty());
    }

    #[tokio::test]
    async fn launch_rejects_unknown_command_before_dispatch() {
        let handlers = Recorder::default();
        let err = launch(["cypress", "bogus"], &handlers).await.unwrap_err();
        assert_eq!(err.exit_status(), 1);
        assert!(err.help.is_some());
        assert!(handlers.calls().is_empty());
    }

    #[test]
    fn versions_display_two_lines() {
        let versions = Versions {
            package: "3.1.0".into(),
            binary: Some("3.1.0".into()),
        };
        assert_eq!(
            versions.to_string(),
            "Cypress package version: 3.1.0\nCypress binary version: 3.1.0"
        );
        let missing = Versions {
            package: "3.1.0".into(),
            binary: None,
        };
        assert!(missing.to_string().ends_with("Cypress binary version: not installed"));
    }
}
