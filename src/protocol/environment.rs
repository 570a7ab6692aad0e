//! Frames exchanged between the coordinating party and an environment.

use std::io::{Read, Write};

use crate::codec::{FrameReader, FrameWriter, PayloadSize, WireMessage};
use crate::error::{ProtocolError, Role};
use crate::opcode::Opcode;
use crate::types::{Action, Observation, StepResult};

/// A request an environment receives.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentRequest {
    /// Initialize and produce the task specification.
    Init,
    /// Produce the first observation of an episode.
    Start,
    /// Apply an action.
    Step {
        /// Action to apply.
        action: Action,
    },
    /// Release resources.
    Cleanup,
    /// Free-form text.
    Message {
        /// Text sent to the environment.
        text: String,
    },
    /// Leave the event loop. Never answered.
    Terminate,
}

impl WireMessage for EnvironmentRequest {
    fn opcode(&self) -> Opcode {
        match self {
            EnvironmentRequest::Init => Opcode::EnvInit,
            EnvironmentRequest::Start => Opcode::EnvStart,
            EnvironmentRequest::Step { .. } => Opcode::EnvStep,
            EnvironmentRequest::Cleanup => Opcode::EnvCleanup,
            EnvironmentRequest::Message { .. } => Opcode::EnvMessage,
            EnvironmentRequest::Terminate => Opcode::RLTerminate,
        }
    }

    fn payload_size(&self) -> PayloadSize {
        let size = PayloadSize::new();
        match self {
            EnvironmentRequest::Step { action } => size.vector(action),
            EnvironmentRequest::Message { text } => size.string(text),
            EnvironmentRequest::Init
            | EnvironmentRequest::Start
            | EnvironmentRequest::Cleanup
            | EnvironmentRequest::Terminate => size,
        }
    }

    fn write_payload<W: Write>(&self, writer: &mut FrameWriter<W>) {
        match self {
            EnvironmentRequest::Step { action } => {
                writer.write_vector(action);
            }
            EnvironmentRequest::Message { text } => {
                writer.write_string(text);
            }
            EnvironmentRequest::Init
            | EnvironmentRequest::Start
            | EnvironmentRequest::Cleanup
            | EnvironmentRequest::Terminate => {}
        }
    }

    fn read_payload<R: Read>(
        opcode: Opcode,
        reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError> {
        Ok(match opcode {
            Opcode::EnvInit => EnvironmentRequest::Init,
            Opcode::EnvStart => EnvironmentRequest::Start,
            Opcode::EnvStep => EnvironmentRequest::Step {
                action: reader.read_vector()?,
            },
            Opcode::EnvCleanup => EnvironmentRequest::Cleanup,
            Opcode::EnvMessage => EnvironmentRequest::Message {
                text: reader.read_string()?,
            },
            Opcode::RLTerminate => EnvironmentRequest::Terminate,
            _ => {
                return Err(ProtocolError::UnexpectedMessage {
                    role: Role::Environment,
                    opcode,
                })
            }
        })
    }
}

/// An environment's answer. Its opcode always echoes the request's.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentReply {
    /// The task specification produced by initialization.
    Init {
        /// Opaque task specification, carried verbatim.
        task_spec: String,
    },
    /// First observation of the episode.
    Start {
        /// Initial observation.
        observation: Observation,
    },
    /// Outcome of the action. Written as terminal, reward, observation.
    Step(StepResult),
    /// Cleanup done.
    Cleanup,
    /// Answer to a text message.
    Message {
        /// Reply text.
        text: String,
    },
}

impl WireMessage for EnvironmentReply {
    fn opcode(&self) -> Opcode {
        match self {
            EnvironmentReply::Init { .. } => Opcode::EnvInit,
            EnvironmentReply::Start { .. } => Opcode::EnvStart,
            EnvironmentReply::Step(_) => Opcode::EnvStep,
            EnvironmentReply::Cleanup => Opcode::EnvCleanup,
            EnvironmentReply::Message { .. } => Opcode::EnvMessage,
        }
    }

    fn payload_size(&self) -> PayloadSize {
        let size = PayloadSize::new();
        match self {
            EnvironmentReply::Init { task_spec } => size.string(task_spec),
            EnvironmentReply::Start { observation } => size.vector(observation),
            EnvironmentReply::Step(result) => size.boolean().float64().vector(&result.observation),
            EnvironmentReply::Cleanup => size,
            EnvironmentReply::Message { text } => size.string(text),
        }
    }

    fn write_payload<W: Write>(&self, writer: &mut FrameWriter<W>) {
        match self {
            EnvironmentReply::Init { task_spec } => {
                writer.write_string(task_spec);
            }
            EnvironmentReply::Start { observation } => {
                writer.write_vector(observation);
            }
            EnvironmentReply::Step(result) => {
                writer
                    .write_bool(result.terminal)
                    .write_f64(result.reward)
                    .write_vector(&result.observation);
            }
            EnvironmentReply::Cleanup => {}
            EnvironmentReply::Message { text } => {
                writer.write_string(text);
            }
        }
    }

    fn read_payload<R: Read>(
        opcode: Opcode,
        reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError> {
        Ok(match opcode {
            Opcode::EnvInit => EnvironmentReply::Init {
                task_spec: reader.read_string()?,
            },
            Opcode::EnvStart => EnvironmentReply::Start {
                observation: reader.read_vector()?,
            },
            Opcode::EnvStep => {
                let terminal = reader.read_bool()?;
                let reward = reader.read_f64()?;
                let observation = reader.read_vector()?;
                EnvironmentReply::Step(StepResult {
                    reward,
                    observation,
                    terminal,
                })
            }
            Opcode::EnvCleanup => EnvironmentReply::Cleanup,
            Opcode::EnvMessage => EnvironmentReply::Message {
                text: reader.read_string()?,
            },
            _ => {
                return Err(ProtocolError::UnexpectedMessage {
                    role: Role::Environment,
                    opcode,
                })
            }
        })
    }
}
