//! The closed set of message codes carried as the first field of every frame.

use std::fmt;

use crate::error::ProtocolError;

/// Integer tag identifying a message's meaning and payload shape.
///
/// Values are a stable wire contract shared with every other codec speaking
/// the protocol. `0` is not a member of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Opcode {
    /// Experiment announces itself after the TCP handshake.
    ExperimentConnection = 1,
    /// Agent announces itself after the TCP handshake.
    AgentConnection = 2,
    /// Environment announces itself after the TCP handshake.
    EnvironmentConnection = 3,

    /// Agent: initialize with a task specification.
    AgentInit = 4,
    /// Agent: first observation of an episode.
    AgentStart = 5,
    /// Agent: reward and next observation.
    AgentStep = 6,
    /// Agent: final reward of an episode.
    AgentEnd = 7,
    /// Agent: release resources.
    AgentCleanup = 8,
    /// Agent: free-form text exchange.
    AgentMessage = 10,

    /// Environment: initialize and produce a task specification.
    EnvInit = 11,
    /// Environment: produce the first observation of an episode.
    EnvStart = 12,
    /// Environment: apply an action.
    EnvStep = 13,
    /// Environment: release resources.
    EnvCleanup = 14,
    /// Environment: free-form text exchange.
    EnvMessage = 19,

    /// Experiment: initialize agent and environment.
    RLInit = 20,
    /// Experiment: start an episode.
    RLStart = 21,
    /// Experiment: run one full step.
    RLStep = 22,
    /// Experiment: clean up agent and environment.
    RLCleanup = 23,
    /// Experiment: query the accumulated return of the current episode.
    RLReturn = 24,
    /// Experiment: query the step counter.
    RLNumSteps = 25,
    /// Experiment: query the episode counter.
    RLNumEpisodes = 26,
    /// Experiment: run a whole episode.
    RLEpisode = 27,
    /// Experiment: message relayed to the agent.
    RLAgentMessage = 33,
    /// Experiment: message relayed to the environment.
    RLEnvMessage = 34,
    /// Sent to a role to end its event loop.
    RLTerminate = 35,
    /// Experiment drives the environment start directly.
    RLEnvStart = 36,
    /// Experiment drives one environment step directly.
    RLEnvStep = 37,
    /// Experiment drives the agent start directly.
    RLAgentStart = 38,
    /// Experiment drives one agent step directly.
    RLAgentStep = 39,
    /// Experiment drives the agent end directly.
    RLAgentEnd = 40,
}

impl Opcode {
    /// Every member of the set, in wire-value order.
    pub const ALL: [Opcode; 30] = [
        Opcode::ExperimentConnection,
        Opcode::AgentConnection,
        Opcode::EnvironmentConnection,
        Opcode::AgentInit,
        Opcode::AgentStart,
        Opcode::AgentStep,
        Opcode::AgentEnd,
        Opcode::AgentCleanup,
        Opcode::AgentMessage,
        Opcode::EnvInit,
        Opcode::EnvStart,
        Opcode::EnvStep,
        Opcode::EnvCleanup,
        Opcode::EnvMessage,
        Opcode::RLInit,
        Opcode::RLStart,
        Opcode::RLStep,
        Opcode::RLCleanup,
        Opcode::RLReturn,
        Opcode::RLNumSteps,
        Opcode::RLNumEpisodes,
        Opcode::RLEpisode,
        Opcode::RLAgentMessage,
        Opcode::RLEnvMessage,
        Opcode::RLTerminate,
        Opcode::RLEnvStart,
        Opcode::RLEnvStep,
        Opcode::RLAgentStart,
        Opcode::RLAgentStep,
        Opcode::RLAgentEnd,
    ];

    /// The value written on the wire.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for Opcode {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.code() == value)
            .ok_or(ProtocolError::UnknownOpcode(value))
    }
}

impl From<Opcode> for i32 {
    fn from(op: Opcode) -> i32 {
        op.code()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}
