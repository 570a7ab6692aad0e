//! Message kinds of the protocol, one sum type per direction and role.
//!
//! Each type implements [`WireMessage`], so adding a message kind is a new
//! variant plus its arms in `opcode`, `payload_size`, `write_payload` and
//! `read_payload`. Decoding an opcode the type does not carry fails with
//! [`ProtocolError::UnexpectedMessage`].

use std::io::{Read, Write};

use crate::codec::{FrameReader, FrameWriter, PayloadSize, WireMessage};
use crate::error::{ProtocolError, Role};
use crate::opcode::Opcode;

pub mod agent;
pub mod environment;
pub mod experiment;

pub use agent::{AgentReply, AgentRequest};
pub use environment::{EnvironmentReply, EnvironmentRequest};
pub use experiment::{ExperimentReply, ExperimentRequest};

/// One-shot frame a peer sends right after the TCP handshake to say which
/// role it plays. It has an empty payload and no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announce {
    /// Sent by the experiment orchestrator.
    Experiment,
    /// Sent by an agent.
    Agent,
    /// Sent by an environment.
    Environment,
}

impl WireMessage for Announce {
    fn opcode(&self) -> Opcode {
        match self {
            Announce::Experiment => Opcode::ExperimentConnection,
            Announce::Agent => Opcode::AgentConnection,
            Announce::Environment => Opcode::EnvironmentConnection,
        }
    }

    fn payload_size(&self) -> PayloadSize {
        PayloadSize::EMPTY
    }

    fn write_payload<W: Write>(&self, _writer: &mut FrameWriter<W>) {}

    fn read_payload<R: Read>(
        opcode: Opcode,
        _reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError> {
        match opcode {
            Opcode::ExperimentConnection => Ok(Announce::Experiment),
            Opcode::AgentConnection => Ok(Announce::Agent),
            Opcode::EnvironmentConnection => Ok(Announce::Environment),
            // whoever is listening is the coordinating party
            _ => Err(ProtocolError::UnexpectedMessage {
                role: Role::Experiment,
                opcode,
            }),
        }
    }
}
