//! Errors raised by the codec, the session and the role state machines.

use thiserror::Error;

use crate::opcode::Opcode;

/// Which side of the protocol raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The learning agent.
    Agent,
    /// The environment simulator.
    Environment,
    /// The experiment orchestrator.
    Experiment,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Agent => "agent",
            Role::Environment => "environment",
            Role::Experiment => "experiment",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`ProtocolError`].
///
/// None of these are retried internally. After any of them the session is
/// considered unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Socket connect, read or write failure.
    Transport,
    /// Unknown opcode, truncated stream, malformed field.
    Decoding,
    /// Reply opcode differs from the request opcode.
    Synchronization,
    /// A role received an opcode outside its accepted set.
    UnknownMessage,
    /// A domain handler failed.
    Domain,
    /// The session was used while not connected.
    Usage,
}

/// Errors of the protocol layer.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Socket read, write or connect failure.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    /// The stream ended in the middle of a field.
    #[error("stream ended while reading {field}")]
    Truncated {
        /// Field being read.
        field: &'static str,
    },
    /// A value outside the closed opcode set.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(i32),
    /// A vector header announced a negative element count.
    #[error("negative {field} count: {count}")]
    NegativeCount {
        /// Which of the three counts.
        field: &'static str,
        /// Value received.
        count: i32,
    },
    /// String bytes were not UTF-8.
    #[error("string payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// An outgoing payload is longer than the size field can express.
    #[error("payload of {0} bytes does not fit the int32 size field")]
    PayloadTooLarge(usize),
    /// The declared size disagrees with the bytes decoded (strict mode only).
    #[error("declared size {declared} does not match the {actual} payload bytes of {opcode}")]
    SizeMismatch {
        /// Opcode of the frame.
        opcode: Opcode,
        /// Size carried by the header.
        declared: i32,
        /// Payload bytes actually decoded.
        actual: u64,
    },
    /// The reply opcode is not the echo of the request opcode.
    #[error("synchronization lost: sent {expected}, peer replied {received}")]
    SynchronizationLost {
        /// Opcode of the request.
        expected: Opcode,
        /// Opcode of the reply.
        received: Opcode,
    },
    /// A role received an opcode it does not handle.
    #[error("{role}: unknown message {opcode}")]
    UnexpectedMessage {
        /// Role that received it.
        role: Role,
        /// Offending opcode.
        opcode: Opcode,
    },
    /// The domain object returned an error.
    #[error("{role} handler failed on {opcode}")]
    Handler {
        /// Role whose handler failed.
        role: Role,
        /// Request being handled.
        opcode: Opcode,
        /// Error returned by the domain object.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    /// Operation on a session that is closed or was never opened.
    #[error("session is not connected")]
    NotConnected,
}

impl ProtocolError {
    /// Classify this error into one of the protocol's failure kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::Io(_) => ErrorKind::Transport,
            ProtocolError::Truncated { .. }
            | ProtocolError::UnknownOpcode(_)
            | ProtocolError::NegativeCount { .. }
            | ProtocolError::InvalidUtf8(_)
            | ProtocolError::PayloadTooLarge(_)
            | ProtocolError::SizeMismatch { .. } => ErrorKind::Decoding,
            ProtocolError::SynchronizationLost { .. } => ErrorKind::Synchronization,
            ProtocolError::UnexpectedMessage { .. } => ErrorKind::UnknownMessage,
            ProtocolError::Handler { .. } => ErrorKind::Domain,
            ProtocolError::NotConnected => ErrorKind::Usage,
        }
    }

    pub(crate) fn handler(role: Role, opcode: Opcode, err: anyhow::Error) -> Self {
        ProtocolError::Handler {
            role,
            opcode,
            source: err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert_eq!(ProtocolError::from(io).kind(), ErrorKind::Transport);
        assert_eq!(ProtocolError::UnknownOpcode(99).kind(), ErrorKind::Decoding);
        assert_eq!(
            ProtocolError::SynchronizationLost {
                expected: Opcode::RLStep,
                received: Opcode::RLAgentEnd
            }
            .kind(),
            ErrorKind::Synchronization
        );
        assert_eq!(
            ProtocolError::UnexpectedMessage {
                role: Role::Agent,
                opcode: Opcode::EnvStep
            }
            .kind(),
            ErrorKind::UnknownMessage
        );
    }

    #[test]
    fn handler_keeps_the_domain_error_as_source() {
        let err = ProtocolError::handler(
            Role::Environment,
            Opcode::EnvStep,
            anyhow::anyhow!("physics exploded"),
        );
        assert_eq!(err.kind(), ErrorKind::Domain);
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "physics exploded");
    }
}
