//! Frames exchanged between the experiment and the coordinating party.

use std::io::{Read, Write};

use crate::codec::{FrameReader, FrameWriter, PayloadSize, WireMessage};
use crate::error::{ProtocolError, Role};
use crate::opcode::Opcode;
use crate::types::{Action, Observation, StartResult, StepResult, StepResultWithAction};

/// A request issued by the experiment.
#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentRequest {
    /// Initialize agent and environment.
    Init,
    /// Start an episode.
    Start,
    /// Run one full step.
    Step,
    /// Clean up agent and environment.
    Cleanup,
    /// Query the return of the current episode.
    Return,
    /// Query the step counter.
    NumSteps,
    /// Query the episode counter.
    NumEpisodes,
    /// Run a whole episode.
    Episode {
        /// Step cutoff, `0` for none.
        max_steps: i32,
    },
    /// Text relayed to the agent.
    AgentMessage {
        /// Text for the agent.
        text: String,
    },
    /// Text relayed to the environment.
    EnvMessage {
        /// Text for the environment.
        text: String,
    },
    /// Drive the environment start.
    EnvStart,
    /// Drive one environment step.
    EnvStep {
        /// Action to apply.
        action: Action,
    },
    /// Drive the agent start.
    AgentStart {
        /// Initial observation for the agent.
        observation: Observation,
    },
    /// Drive one agent step.
    AgentStep {
        /// Reward for the previous action.
        reward: f64,
        /// Next observation.
        observation: Observation,
    },
    /// Drive the agent end.
    AgentEnd {
        /// Final reward.
        reward: f64,
    },
}

impl WireMessage for ExperimentRequest {
    fn opcode(&self) -> Opcode {
        match self {
            ExperimentRequest::Init => Opcode::RLInit,
            ExperimentRequest::Start => Opcode::RLStart,
            ExperimentRequest::Step => Opcode::RLStep,
            ExperimentRequest::Cleanup => Opcode::RLCleanup,
            ExperimentRequest::Return => Opcode::RLReturn,
            ExperimentRequest::NumSteps => Opcode::RLNumSteps,
            ExperimentRequest::NumEpisodes => Opcode::RLNumEpisodes,
            ExperimentRequest::Episode { .. } => Opcode::RLEpisode,
            ExperimentRequest::AgentMessage { .. } => Opcode::RLAgentMessage,
            ExperimentRequest::EnvMessage { .. } => Opcode::RLEnvMessage,
            ExperimentRequest::EnvStart => Opcode::RLEnvStart,
            ExperimentRequest::EnvStep { .. } => Opcode::RLEnvStep,
            ExperimentRequest::AgentStart { .. } => Opcode::RLAgentStart,
            ExperimentRequest::AgentStep { .. } => Opcode::RLAgentStep,
            ExperimentRequest::AgentEnd { .. } => Opcode::RLAgentEnd,
        }
    }

    fn payload_size(&self) -> PayloadSize {
        let size = PayloadSize::new();
        match self {
            ExperimentRequest::Episode { .. } => size.int32(),
            ExperimentRequest::AgentMessage { text } | ExperimentRequest::EnvMessage { text } => {
                size.string(text)
            }
            ExperimentRequest::EnvStep { action } => size.vector(action),
            ExperimentRequest::AgentStart { observation } => size.vector(observation),
            ExperimentRequest::AgentStep { observation, .. } => size.float64().vector(observation),
            ExperimentRequest::AgentEnd { .. } => size.float64(),
            ExperimentRequest::Init
            | ExperimentRequest::Start
            | ExperimentRequest::Step
            | ExperimentRequest::Cleanup
            | ExperimentRequest::Return
            | ExperimentRequest::NumSteps
            | ExperimentRequest::NumEpisodes
            | ExperimentRequest::EnvStart => size,
        }
    }

    fn write_payload<W: Write>(&self, writer: &mut FrameWriter<W>) {
        match self {
            ExperimentRequest::Episode { max_steps } => {
                writer.write_i32(*max_steps);
            }
            ExperimentRequest::AgentMessage { text } | ExperimentRequest::EnvMessage { text } => {
                writer.write_string(text);
            }
            ExperimentRequest::EnvStep { action } => {
                writer.write_vector(action);
            }
            ExperimentRequest::AgentStart { observation } => {
                writer.write_vector(observation);
            }
            ExperimentRequest::AgentStep {
                reward,
                observation,
            } => {
                writer.write_f64(*reward).write_vector(observation);
            }
            ExperimentRequest::AgentEnd { reward } => {
                writer.write_f64(*reward);
            }
            ExperimentRequest::Init
            | ExperimentRequest::Start
            | ExperimentRequest::Step
            | ExperimentRequest::Cleanup
            | ExperimentRequest::Return
            | ExperimentRequest::NumSteps
            | ExperimentRequest::NumEpisodes
            | ExperimentRequest::EnvStart => {}
        }
    }

    fn read_payload<R: Read>(
        opcode: Opcode,
        reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError> {
        Ok(match opcode {
            Opcode::RLInit => ExperimentRequest::Init,
            Opcode::RLStart => ExperimentRequest::Start,
            Opcode::RLStep => ExperimentRequest::Step,
            Opcode::RLCleanup => ExperimentRequest::Cleanup,
            Opcode::RLReturn => ExperimentRequest::Return,
            Opcode::RLNumSteps => ExperimentRequest::NumSteps,
            Opcode::RLNumEpisodes => ExperimentRequest::NumEpisodes,
            Opcode::RLEpisode => ExperimentRequest::Episode {
                max_steps: reader.read_i32()?,
            },
            Opcode::RLAgentMessage => ExperimentRequest::AgentMessage {
                text: reader.read_string()?,
            },
            Opcode::RLEnvMessage => ExperimentRequest::EnvMessage {
                text: reader.read_string()?,
            },
            Opcode::RLEnvStart => ExperimentRequest::EnvStart,
            Opcode::RLEnvStep => ExperimentRequest::EnvStep {
                action: reader.read_vector()?,
            },
            Opcode::RLAgentStart => ExperimentRequest::AgentStart {
                observation: reader.read_vector()?,
            },
            Opcode::RLAgentStep => {
                let reward = reader.read_f64()?;
                let observation = reader.read_vector()?;
                ExperimentRequest::AgentStep {
                    reward,
                    observation,
                }
            }
            Opcode::RLAgentEnd => ExperimentRequest::AgentEnd {
                reward: reader.read_f64()?,
            },
            _ => {
                return Err(ProtocolError::UnexpectedMessage {
                    role: Role::Experiment,
                    opcode,
                })
            }
        })
    }
}

/// A reply to an [`ExperimentRequest`], tagged with the same opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentReply {
    /// Task specification produced by the environment.
    Init {
        /// Opaque task specification.
        task_spec: String,
    },
    /// First observation and first action. Written observation, action.
    Start(StartResult),
    /// Full step. Written terminal, reward, observation, action.
    Step(StepResultWithAction),
    /// Cleanup done.
    Cleanup,
    /// Return of the current episode.
    Return {
        /// Accumulated reward.
        value: f64,
    },
    /// Steps taken so far.
    NumSteps {
        /// Step counter.
        steps: i32,
    },
    /// Episodes completed so far.
    NumEpisodes {
        /// Episode counter.
        episodes: i32,
    },
    /// A whole episode ran.
    Episode {
        /// Exit status of the episode.
        exit_status: i32,
    },
    /// The agent's answer.
    AgentMessage {
        /// Reply text.
        text: String,
    },
    /// The environment's answer.
    EnvMessage {
        /// Reply text.
        text: String,
    },
    /// The environment's first observation.
    EnvStart {
        /// Initial observation.
        observation: Observation,
    },
    /// One environment step. Written terminal, reward, observation.
    EnvStep(StepResult),
    /// The agent's first action.
    AgentStart {
        /// Chosen action.
        action: Action,
    },
    /// The agent's next action.
    AgentStep {
        /// Chosen action.
        action: Action,
    },
    /// End of episode acknowledged by the agent.
    AgentEnd,
}

impl WireMessage for ExperimentReply {
    fn opcode(&self) -> Opcode {
        match self {
            ExperimentReply::Init { .. } => Opcode::RLInit,
            ExperimentReply::Start(_) => Opcode::RLStart,
            ExperimentReply::Step(_) => Opcode::RLStep,
            ExperimentReply::Cleanup => Opcode::RLCleanup,
            ExperimentReply::Return { .. } => Opcode::RLReturn,
            ExperimentReply::NumSteps { .. } => Opcode::RLNumSteps,
            ExperimentReply::NumEpisodes { .. } => Opcode::RLNumEpisodes,
            ExperimentReply::Episode { .. } => Opcode::RLEpisode,
            ExperimentReply::AgentMessage { .. } => Opcode::RLAgentMessage,
            ExperimentReply::EnvMessage { .. } => Opcode::RLEnvMessage,
            ExperimentReply::EnvStart { .. } => Opcode::RLEnvStart,
            ExperimentReply::EnvStep(_) => Opcode::RLEnvStep,
            ExperimentReply::AgentStart { .. } => Opcode::RLAgentStart,
            ExperimentReply::AgentStep { .. } => Opcode::RLAgentStep,
            ExperimentReply::AgentEnd => Opcode::RLAgentEnd,
        }
    }

    fn payload_size(&self) -> PayloadSize {
        let size = PayloadSize::new();
        match self {
            ExperimentReply::Init { task_spec } => size.string(task_spec),
            ExperimentReply::Start(start) => size.vector(&start.observation).vector(&start.action),
            ExperimentReply::Step(step) => size
                .boolean()
                .float64()
                .vector(&step.observation)
                .vector(&step.action),
            ExperimentReply::Return { .. } => size.float64(),
            ExperimentReply::NumSteps { .. }
            | ExperimentReply::NumEpisodes { .. }
            | ExperimentReply::Episode { .. } => size.int32(),
            ExperimentReply::AgentMessage { text } | ExperimentReply::EnvMessage { text } => {
                size.string(text)
            }
            ExperimentReply::EnvStart { observation } => size.vector(observation),
            ExperimentReply::EnvStep(step) => size.boolean().float64().vector(&step.observation),
            ExperimentReply::AgentStart { action } | ExperimentReply::AgentStep { action } => {
                size.vector(action)
            }
            ExperimentReply::Cleanup | ExperimentReply::AgentEnd => size,
        }
    }

    fn write_payload<W: Write>(&self, writer: &mut FrameWriter<W>) {
        match self {
            ExperimentReply::Init { task_spec } => {
                writer.write_string(task_spec);
            }
            ExperimentReply::Start(start) => {
                writer
                    .write_vector(&start.observation)
                    .write_vector(&start.action);
            }
            ExperimentReply::Step(step) => {
                writer
                    .write_bool(step.terminal)
                    .write_f64(step.reward)
                    .write_vector(&step.observation)
                    .write_vector(&step.action);
            }
            ExperimentReply::Return { value } => {
                writer.write_f64(*value);
            }
            ExperimentReply::NumSteps { steps: n }
            | ExperimentReply::NumEpisodes { episodes: n }
            | ExperimentReply::Episode { exit_status: n } => {
                writer.write_i32(*n);
            }
            ExperimentReply::AgentMessage { text } | ExperimentReply::EnvMessage { text } => {
                writer.write_string(text);
            }
            ExperimentReply::EnvStart { observation } => {
                writer.write_vector(observation);
            }
            ExperimentReply::EnvStep(step) => {
                writer
                    .write_bool(step.terminal)
                    .write_f64(step.reward)
                    .write_vector(&step.observation);
            }
            ExperimentReply::AgentStart { action } | ExperimentReply::AgentStep { action } => {
                writer.write_vector(action);
            }
            ExperimentReply::Cleanup | ExperimentReply::AgentEnd => {}
        }
    }

    fn read_payload<R: Read>(
        opcode: Opcode,
        reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError> {
        Ok(match opcode {
            Opcode::RLInit => ExperimentReply::Init {
                task_spec: reader.read_string()?,
            },
            Opcode::RLStart => {
                let observation = reader.read_vector()?;
                let action = reader.read_vector()?;
                ExperimentReply::Start(StartResult {
                    observation,
                    action,
                })
            }
            Opcode::RLStep => {
                let terminal = reader.read_bool()?;
                let reward = reader.read_f64()?;
                let observation = reader.read_vector()?;
                let action = reader.read_vector()?;
                ExperimentReply::Step(StepResultWithAction {
                    reward,
                    observation,
                    terminal,
                    action,
                })
            }
            Opcode::RLCleanup => ExperimentReply::Cleanup,
            Opcode::RLReturn => ExperimentReply::Return {
                value: reader.read_f64()?,
            },
            Opcode::RLNumSteps => ExperimentReply::NumSteps {
                steps: reader.read_i32()?,
            },
            Opcode::RLNumEpisodes => ExperimentReply::NumEpisodes {
                episodes: reader.read_i32()?,
            },
            Opcode::RLEpisode => ExperimentReply::Episode {
                exit_status: reader.read_i32()?,
            },
            Opcode::RLAgentMessage => ExperimentReply::AgentMessage {
                text: reader.read_string()?,
            },
            Opcode::RLEnvMessage => ExperimentReply::EnvMessage {
                text: reader.read_string()?,
            },
            Opcode::RLEnvStart => ExperimentReply::EnvStart {
                observation: reader.read_vector()?,
            },
            Opcode::RLEnvStep => {
                let terminal = reader.read_bool()?;
                let reward = reader.read_f64()?;
                let observation = reader.read_vector()?;
                ExperimentReply::EnvStep(StepResult {
                    reward,
                    observation,
                    terminal,
                })
            }
            Opcode::RLAgentStart => ExperimentReply::AgentStart {
                action: reader.read_vector()?,
            },
            Opcode::RLAgentStep => ExperimentReply::AgentStep {
                action: reader.read_vector()?,
            },
            Opcode::RLAgentEnd => ExperimentReply::AgentEnd,
            _ => {
                return Err(ProtocolError::UnexpectedMessage {
                    role: Role::Experiment,
                    opcode,
                })
            }
        })
    }
}
