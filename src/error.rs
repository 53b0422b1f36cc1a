use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::GeneralError => write!(f, "general error"),
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub message: String,
    pub code: ExitCode,
    /// Help text to show alongside the message (usage errors only).
    pub help: Option<String>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    #[must_use]
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: ExitCode::GeneralError,
            help: None,
        }
    }

    #[must_use]
    pub fn unknown_command(command: &str, help: String) -> Self {
        Self {
            message: format!("Unknown command \"{command}\""),
            code: ExitCode::GeneralError,
            help: Some(help),
        }
    }

    /// A malformed invocation rejected by the argument parser. The rendered
    /// parser error already carries the relevant usage line.
    #[must_use]
    pub fn usage(rendered: String) -> Self {
        Self {
            message: rendered.trim_end().to_string(),
            code: ExitCode::GeneralError,
            help: None,
        }
    }

    /// Process exit status for this error.
    #[must_use]
    pub fn exit_status(&self) -> i32 {
        i32::from(self.code as u8)
    }

    pub fn print_stderr(&self) {
        eprintln!("{}", self.message);
        if let Some(help) = &self.help {
            println!("{help}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_display() {
        assert_eq!(ExitCode::Success.to_string(), "success");
        assert_eq!(ExitCode::GeneralError.to_string(), "general error");
    }

    #[test]
    fn app_error_display() {
        let err = AppError::general("binary missing");
        assert_eq!(err.to_string(), "general error: binary missing");
    }

    #[test]
    fn unknown_command_quotes_name_and_keeps_help() {
        let err = AppError::unknown_command("bogus", "Usage: cypress".into());
        assert_eq!(err.message, "Unknown command \"bogus\"");
        assert_eq!(err.help.as_deref(), Some("Usage: cypress"));
        assert_eq!(err.exit_status(), 1);
    }

    #[test]
    fn usage_error_trims_trailing_newlines() {
        let err = AppError::usage("error: unexpected argument '--nope'\n\n".into());
        assert_eq!(err.message, "error: unexpected argument '--nope'");
        assert!(err.help.is_none());
        assert!(matches!(err.code, ExitCode::GeneralError));
    }
}
