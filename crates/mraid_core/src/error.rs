//! Protocol error types

use thiserror::Error;

use crate::command::CommandName;

/// Errors raised while turning raw bridge input into typed commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MraidError {
    /// The payload used a command name this controller does not know
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A required parameter was absent
    #[error("{command}: missing parameter '{key}'")]
    MissingParameter { command: CommandName, key: String },

    /// A parameter could not be parsed
    #[error("{command}: invalid value '{value}' for parameter '{key}'")]
    InvalidParameter {
        command: CommandName,
        key: String,
        value: String,
    },
}

impl MraidError {
    /// The command the error belongs to, when known
    pub fn command(&self) -> Option<CommandName> {
        match self {
            MraidError::UnknownCommand(_) => None,
            MraidError::MissingParameter { command, .. }
            | MraidError::InvalidParameter { command, .. } => Some(*command),
        }
    }
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, MraidError>;
