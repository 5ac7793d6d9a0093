//! Configuration errors.
//!
//! These are fatal at load time. Nothing inside the running controller
//! returns an error; runtime anomalies are logged and dropped instead.

use crate::{LspId, TunnelId};
use thiserror::Error;

/// Errors raised while loading configuration or parsing operator commands.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A tunnel was configured without any candidate path.
    #[error("{0} has no candidate paths")]
    EmptyCandidates(TunnelId),

    /// The same tunnel appears twice in the plan.
    #[error("{0} is configured more than once")]
    DuplicateTunnel(TunnelId),

    /// The same LSP appears twice within one tunnel.
    #[error("{lsp} appears more than once in {tunnel}")]
    DuplicateLsp {
        /// Tunnel containing the duplicate.
        tunnel: TunnelId,
        /// Duplicated path identifier.
        lsp: LspId,
    },

    /// Explicit preference values are not strictly increasing.
    #[error("candidate paths of {0} are not ordered by preference")]
    UnorderedCandidates(TunnelId),

    /// A path declares a session for a different tunnel than the one listing it.
    #[error("{lsp} is listed under {tunnel} but addresses {session}")]
    SessionMismatch {
        /// Tunnel listing the path.
        tunnel: TunnelId,
        /// Offending path.
        lsp: LspId,
        /// Tunnel named by the path's session.
        session: TunnelId,
    },

    /// Monitor raise/clear thresholds are inverted or out of range.
    #[error("monitor '{monitor}' has invalid thresholds: {detail}")]
    InvalidThresholds {
        /// Monitor name.
        monitor: String,
        /// What is wrong.
        detail: String,
    },

    /// Two monitors share a name.
    #[error("monitor '{0}' is configured more than once")]
    DuplicateMonitor(String),

    /// A sample references a monitor that is not configured.
    #[error("unknown monitor '{0}'")]
    UnknownMonitor(String),

    /// A command line was empty.
    #[error("empty command")]
    EmptyCommand,

    /// A command name is not recognised.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A required command argument is missing.
    #[error("{command} command requires {argument} argument")]
    MissingArgument {
        /// Command name.
        command: String,
        /// Missing argument key.
        argument: &'static str,
    },

    /// A command argument could not be parsed.
    #[error("invalid value for {argument}: {value}")]
    InvalidArgument {
        /// Argument key.
        argument: &'static str,
        /// Raw value.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}
