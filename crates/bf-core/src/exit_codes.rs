//! Exit codes for the bf-core CLI.
//!
//! Exit code ranges:
//! - 0: success
//! - 10-19: user/input errors (recoverable by user action)
//! - 20-29: internal and I/O errors

/// Exit codes for bf-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    // ========================================================================
    // User / Input Errors (10-19)
    // ========================================================================
    /// Invalid arguments or simulation parameters
    ArgsError = 10,

    /// Malformed input records
    InputError = 11,

    /// Not enough distinct weeks of history
    InsufficientHistory = 12,

    /// Configuration file missing or invalid
    ConfigError = 13,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// User/input errors (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Internal errors (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Error code name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::InsufficientHistory => "ERR_INSUFFICIENT_HISTORY",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&bf_common::Error> for ExitCode {
    fn from(err: &bf_common::Error) -> Self {
        use bf_common::Error;
        match err {
            Error::Config(_) | Error::InvalidConfig(_) => ExitCode::ConfigError,
            Error::InvalidRecord { .. } | Error::Ingest(_) => ExitCode::InputError,
            Error::InsufficientHistory { .. } => ExitCode::InsufficientHistory,
            Error::InvalidParameter(_) | Error::WorkBudgetExceeded { .. } => ExitCode::ArgsError,
            Error::InvalidRate { .. } | Error::Json(_) => ExitCode::InternalError,
            Error::Io(_) => ExitCode::IoError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
