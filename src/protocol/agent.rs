//! Frames exchanged between the coordinating party and an agent.

use std::io::{Read, Write};

use crate::codec::{FrameReader, FrameWriter, PayloadSize, WireMessage};
use crate::error::{ProtocolError, Role};
use crate::opcode::Opcode;
use crate::types::{Action, Observation};

/// A request an agent receives.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentRequest {
    /// Initialize with the task specification string.
    Init {
        /// Opaque task specification, carried verbatim.
        task_spec: String,
    },
    /// First observation of an episode.
    Start {
        /// Initial observation.
        observation: Observation,
    },
    /// Reward for the previous action and the next observation.
    Step {
        /// Reward for the previous action.
        reward: f64,
        /// Next observation.
        observation: Observation,
    },
    /// Final reward of the episode.
    End {
        /// Final reward.
        reward: f64,
    },
    /// Release resources.
    Cleanup,
    /// Free-form text.
    Message {
        /// Text sent to the agent.
        text: String,
    },
    /// Leave the event loop. Never answered.
    Terminate,
}

impl WireMessage for AgentRequest {
    fn opcode(&self) -> Opcode {
        match self {
            AgentRequest::Init { .. } => Opcode::AgentInit,
            AgentRequest::Start { .. } => Opcode::AgentStart,
            AgentRequest::Step { .. } => Opcode::AgentStep,
            AgentRequest::End { .. } => Opcode::AgentEnd,
            AgentRequest::Cleanup => Opcode::AgentCleanup,
            AgentRequest::Message { .. } => Opcode::AgentMessage,
            AgentRequest::Terminate => Opcode::RLTerminate,
        }
    }

    fn payload_size(&self) -> PayloadSize {
        let size = PayloadSize::new();
        match self {
            AgentRequest::Init { task_spec } => size.string(task_spec),
            AgentRequest::Start { observation } => size.vector(observation),
            AgentRequest::Step { observation, .. } => size.float64().vector(observation),
            AgentRequest::End { .. } => size.float64(),
            AgentRequest::Message { text } => size.string(text),
            AgentRequest::Cleanup | AgentRequest::Terminate => size,
        }
    }

    fn write_payload<W: Write>(&self, writer: &mut FrameWriter<W>) {
        match self {
            AgentRequest::Init { task_spec } => {
                writer.write_string(task_spec);
            }
            AgentRequest::Start { observation } => {
                writer.write_vector(observation);
            }
            AgentRequest::Step {
                reward,
                observation,
            } => {
                writer.write_f64(*reward).write_vector(observation);
            }
            AgentRequest::End { reward } => {
                writer.write_f64(*reward);
            }
            AgentRequest::Message { text } => {
                writer.write_string(text);
            }
            AgentRequest::Cleanup | AgentRequest::Terminate => {}
        }
    }

    fn read_payload<R: Read>(
        opcode: Opcode,
        reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError> {
        Ok(match opcode {
            Opcode::AgentInit => AgentRequest::Init {
                task_spec: reader.read_string()?,
            },
            Opcode::AgentStart => AgentRequest::Start {
                observation: reader.read_vector()?,
            },
            Opcode::AgentStep => {
                let reward = reader.read_f64()?;
                let observation = reader.read_vector()?;
                AgentRequest::Step {
                    reward,
                    observation,
                }
            }
            Opcode::AgentEnd => AgentRequest::End {
                reward: reader.read_f64()?,
            },
            Opcode::AgentCleanup => AgentRequest::Cleanup,
            Opcode::AgentMessage => AgentRequest::Message {
                text: reader.read_string()?,
            },
            Opcode::RLTerminate => AgentRequest::Terminate,
            _ => {
                return Err(ProtocolError::UnexpectedMessage {
                    role: Role::Agent,
                    opcode,
                })
            }
        })
    }
}

/// An agent's answer. Its opcode always echoes the request's.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// Initialization done.
    Init,
    /// Action for the first observation.
    Start {
        /// Chosen action.
        action: Action,
    },
    /// Action for the next observation.
    Step {
        /// Chosen action.
        action: Action,
    },
    /// End of episode acknowledged.
    End,
    /// Cleanup done.
    Cleanup,
    /// Answer to a text message.
    Message {
        /// Reply text.
        text: String,
    },
}

impl WireMessage for AgentReply {
    fn opcode(&self) -> Opcode {
        match self {
            AgentReply::Init => Opcode::AgentInit,
            AgentReply::Start { .. } => Opcode::AgentStart,
            AgentReply::Step { .. } => Opcode::AgentStep,
            AgentReply::End => Opcode::AgentEnd,
            AgentReply::Cleanup => Opcode::AgentCleanup,
            AgentReply::Message { .. } => Opcode::AgentMessage,
        }
    }

    fn payload_size(&self) -> PayloadSize {
        let size = PayloadSize::new();
        match self {
            AgentReply::Start { action } | AgentReply::Step { action } => size.vector(action),
            AgentReply::Message { text } => size.string(text),
            AgentReply::Init | AgentReply::End | AgentReply::Cleanup => size,
        }
    }

    fn write_payload<W: Write>(&self, writer: &mut FrameWriter<W>) {
        match self {
            AgentReply::Start { action } | AgentReply::Step { action } => {
                writer.write_vector(action);
            }
            AgentReply::Message { text } => {
                writer.write_string(text);
            }
            AgentReply::Init | AgentReply::End | AgentReply::Cleanup => {}
        }
    }

    fn read_payload<R: Read>(
        opcode: Opcode,
        reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError> {
        Ok(match opcode {
            Opcode::AgentInit => AgentReply::Init,
            Opcode::AgentStart => AgentReply::Start {
                action: reader.read_vector()?,
            },
            Opcode::AgentStep => AgentReply::Step {
                action: reader.read_vector()?,
            },
            Opcode::AgentEnd => AgentReply::End,
            Opcode::AgentCleanup => AgentReply::Cleanup,
            Opcode::AgentMessage => AgentReply::Message {
                text: reader.read_string()?,
            },
            _ => {
                return Err(ProtocolError::UnexpectedMessage {
                    role: Role::Agent,
                    opcode,
                })
            }
        })
    }
}
