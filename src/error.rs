//! Error types for crossgo
//!
//! All modules use `CrossgoResult<T>` as their return type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for crossgo operations
pub type CrossgoResult<T> = Result<T, CrossgoError>;

/// Coarse classification of a failure, independent of the variant detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Execution environment unreachable or request incomplete
    Precondition,
    /// Source tree could not be resolved
    Resolution,
    /// Dependency cache could not be populated
    Cache,
    /// Build image could not be obtained
    Image,
    /// Build command failed or was cancelled
    Execution,
    /// Configuration file unreadable or invalid
    Config,
}

/// Orchestration step an error surfaced from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    CheckEnvironment,
    EnsureImage,
    PopulateCache,
    ResolveConfig,
    Execute,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CheckEnvironment => "checking container runtime",
            Self::EnsureImage => "preparing build image",
            Self::PopulateCache => "caching dependencies",
            Self::ResolveConfig => "resolving build configuration",
            Self::Execute => "cross compiling package",
        };
        write!(f, "{}", name)
    }
}

/// All errors that can occur in crossgo
#[derive(Error, Debug)]
pub enum CrossgoError {
    // Precondition errors
    #[error("Container runtime '{runtime}' is not usable: {reason}")]
    RuntimeUnavailable { runtime: String, reason: String },

    #[error("Go import path is not set")]
    SourceNotSet,

    // Resolution errors
    #[error("Requested path invalid: {path}: {reason}")]
    PathInvalid { path: PathBuf, reason: String },

    #[error("Failed to resolve import path of {path}: {reason}")]
    ImportPath { path: PathBuf, reason: String },

    #[error("No $GOPATH is set or forwarded to crossgo")]
    NoSearchRoot,

    // Cache errors
    #[error("Failed to create dependency cache {path}: {source}")]
    CacheDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to retrieve dependency {url}: {reason}")]
    DependencyFetch { url: String, reason: String },

    #[error("Failed to write dependency file {path}: {source}")]
    DependencyWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Image errors
    #[error("Image inspection failed: {image}: {reason}")]
    ImageInspect { image: String, reason: String },

    #[error("Image pull failed: {image}: {reason}")]
    ImagePull { image: String, reason: String },

    // Process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command {command} exited with {status}: {stderr}")]
    CommandExecution {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Build cancelled")]
    Cancelled,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed {step}: {source}")]
    Step {
        step: BuildStep,
        #[source]
        source: Box<CrossgoError>,
    },
}

impl CrossgoError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Wrap this error with the orchestration step it came from
    pub fn during(self, step: BuildStep) -> Self {
        Self::Step {
            step,
            source: Box::new(self),
        }
    }

    /// Classify the error, looking through step context
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RuntimeUnavailable { .. } | Self::SourceNotSet => ErrorKind::Precondition,
            Self::PathInvalid { .. } | Self::ImportPath { .. } | Self::NoSearchRoot => {
                ErrorKind::Resolution
            }
            Self::CacheDirCreate { .. }
            | Self::DependencyFetch { .. }
            | Self::DependencyWrite { .. } => ErrorKind::Cache,
            Self::ImageInspect { .. } | Self::ImagePull { .. } => ErrorKind::Image,
            Self::CommandFailed { .. } | Self::CommandExecution { .. } | Self::Cancelled => {
                ErrorKind::Execution
            }
            Self::ConfigInvalid { .. } => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Precondition,
            Self::Step { source, .. } => source.kind(),
        }
    }

    /// Whether the build was stopped by the caller
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Step { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RuntimeUnavailable { .. } => {
                Some("Install Docker (or set runtime.binary in the config) and make sure the daemon is running")
            }
            Self::NoSearchRoot => Some("Export GOPATH or add a go.mod to the package"),
            Self::SourceNotSet => Some("Pass the package path or import path to build"),
            Self::Step { source, .. } => source.hint(),
            _ => None,
        }
    }
}
