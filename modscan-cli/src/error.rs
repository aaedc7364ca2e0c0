//! CLI-specific error types and exit code mapping

use modscan_core::error::ModscanError;
use modscan_module_scanner::ModuleScannerError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from modscan-core.
    #[error("{0}")]
    Core(#[from] ModscanError),

    /// Module scanner domain error.
    #[error("scan error: {0}")]
    Scan(String),

    /// The scan completed but classified suspicious modules.
    #[error("found {0} suspicious modules")]
    SuspiciousFound(usize),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 0    | Success                          |
    /// | 1    | General / command / scan error   |
    /// | 2    | Configuration error              |
    /// | 4    | Scan found suspicious modules    |
    /// | 10   | IO error                         |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Core(ModscanError::Config(_)) => 2,
            Self::SuspiciousFound(_) => 4,
            Self::Io(_) | Self::Core(ModscanError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) | Self::Scan(_) => 1,
        }
    }
}

impl From<ModuleScannerError> for CliError {
    fn from(e: ModuleScannerError) -> Self {
        match e {
            ModuleScannerError::Config { .. } => Self::Config(e.to_string()),
            _ => Self::Scan(e.to_string()),
        }
    }
}
