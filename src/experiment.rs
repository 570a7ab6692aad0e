//! The experiment orchestrator: the active peer that drives runs by
//! request/reply exchanges with the coordinating party.
//!
//! Every operation sends one request and blocks for one reply whose opcode
//! must echo the request's. A mismatch yields
//! [`ProtocolError::SynchronizationLost`] without reading the reply's
//! payload. Any failure closes the connection; later operations fail with
//! [`ProtocolError::NotConnected`] until the next connect.

use std::net::TcpStream;

use tracing::{debug, error, instrument};

use crate::codec::{SizeCheck, WireMessage};
use crate::configuration::Configuration;
use crate::error::ProtocolError;
use crate::protocol::{Announce, ExperimentReply, ExperimentRequest};
use crate::session::Session;
use crate::types::{Action, Observation, StartResult, StepResult, StepResultWithAction};

/// Client handle held by an experiment program.
#[derive(Debug, Default)]
pub struct Experiment {
    session: Session,
}

impl Experiment {
    /// A handle that is not connected yet. Declared sizes are ignored.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that is not connected yet, with a declared-size policy.
    pub fn with_size_check(size_check: SizeCheck) -> Self {
        Experiment {
            session: Session::with_size_check(size_check),
        }
    }

    /// Connect to `host:port` and announce this peer as the experiment.
    #[instrument(skip(self))]
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), ProtocolError> {
        self.session.connect(host, port)?;
        if let Err(e) = self.session.announce(Announce::Experiment) {
            self.session.close();
            return Err(e);
        }
        Ok(())
    }

    /// Build a handle from a [`Configuration`] and connect it.
    pub fn connect_with(config: &Configuration) -> Result<Self, ProtocolError> {
        let mut experiment = Experiment::with_size_check(config.size_check());
        experiment.connect(&config.host, config.port)?;
        Ok(experiment)
    }

    /// Drive an already established connection. No announce frame is sent.
    pub fn accept(&mut self, stream: TcpStream) -> Result<(), ProtocolError> {
        self.session.accept(stream)
    }

    /// True while the connection is usable.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Release the connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.session.close();
    }

    fn exchange(&mut self, request: ExperimentRequest) -> Result<ExperimentReply, ProtocolError> {
        let opcode = request.opcode();
        debug!(%opcode, "exchange");
        let result = self
            .session
            .send(&request)
            .and_then(|()| self.session.expect_reply(opcode));
        if let Err(e) = &result {
            error!("{opcode} failed: {e}");
            self.session.close();
        }
        result
    }

    // A reply of the wrong variant can only come from a decoder bug, the
    // opcode has already been checked.
    fn mismatch(&mut self, request: &ExperimentRequest, reply: &ExperimentReply) -> ProtocolError {
        self.session.close();
        ProtocolError::SynchronizationLost {
            expected: request.opcode(),
            received: reply.opcode(),
        }
    }

    /// Initialize agent and environment. Returns the task specification.
    pub fn init(&mut self) -> Result<String, ProtocolError> {
        let request = ExperimentRequest::Init;
        match self.exchange(request.clone())? {
            ExperimentReply::Init { task_spec } => Ok(task_spec),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Start an episode. Returns the first observation and the first action.
    pub fn start(&mut self) -> Result<StartResult, ProtocolError> {
        let request = ExperimentRequest::Start;
        match self.exchange(request.clone())? {
            ExperimentReply::Start(result) => Ok(result),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Run one full step: environment step followed by agent step.
    pub fn step(&mut self) -> Result<StepResultWithAction, ProtocolError> {
        let request = ExperimentRequest::Step;
        match self.exchange(request.clone())? {
            ExperimentReply::Step(result) => Ok(result),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Clean up agent and environment.
    pub fn cleanup(&mut self) -> Result<(), ProtocolError> {
        let request = ExperimentRequest::Cleanup;
        match self.exchange(request.clone())? {
            ExperimentReply::Cleanup => Ok(()),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Send text to the agent and return its answer.
    pub fn agent_message(&mut self, text: &str) -> Result<String, ProtocolError> {
        let request = ExperimentRequest::AgentMessage {
            text: text.to_owned(),
        };
        match self.exchange(request.clone())? {
            ExperimentReply::AgentMessage { text } => Ok(text),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Send text to the environment and return its answer.
    pub fn env_message(&mut self, text: &str) -> Result<String, ProtocolError> {
        let request = ExperimentRequest::EnvMessage {
            text: text.to_owned(),
        };
        match self.exchange(request.clone())? {
            ExperimentReply::EnvMessage { text } => Ok(text),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Return accumulated over the current episode.
    pub fn return_value(&mut self) -> Result<f64, ProtocolError> {
        let request = ExperimentRequest::Return;
        match self.exchange(request.clone())? {
            ExperimentReply::Return { value } => Ok(value),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Steps taken so far.
    pub fn num_steps(&mut self) -> Result<i32, ProtocolError> {
        let request = ExperimentRequest::NumSteps;
        match self.exchange(request.clone())? {
            ExperimentReply::NumSteps { steps } => Ok(steps),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Episodes completed so far.
    pub fn num_episodes(&mut self) -> Result<i32, ProtocolError> {
        let request = ExperimentRequest::NumEpisodes;
        match self.exchange(request.clone())? {
            ExperimentReply::NumEpisodes { episodes } => Ok(episodes),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Run a whole episode, at most `max_steps` steps (`0` for no cutoff).
    /// Returns the episode's exit status.
    #[instrument(skip(self))]
    pub fn episode(&mut self, max_steps: i32) -> Result<i32, ProtocolError> {
        let request = ExperimentRequest::Episode { max_steps };
        match self.exchange(request.clone())? {
            ExperimentReply::Episode { exit_status } => Ok(exit_status),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Start the environment alone.
    pub fn env_start(&mut self) -> Result<Observation, ProtocolError> {
        let request = ExperimentRequest::EnvStart;
        match self.exchange(request.clone())? {
            ExperimentReply::EnvStart { observation } => Ok(observation),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Apply `action` to the environment alone.
    pub fn env_step(&mut self, action: &Action) -> Result<StepResult, ProtocolError> {
        let request = ExperimentRequest::EnvStep {
            action: action.clone(),
        };
        match self.exchange(request.clone())? {
            ExperimentReply::EnvStep(result) => Ok(result),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Start the agent alone with `observation`.
    pub fn agent_start(&mut self, observation: &Observation) -> Result<Action, ProtocolError> {
        let request = ExperimentRequest::AgentStart {
            observation: observation.clone(),
        };
        match self.exchange(request.clone())? {
            ExperimentReply::AgentStart { action } => Ok(action),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Step the agent alone.
    pub fn agent_step(
        &mut self,
        reward: f64,
        observation: &Observation,
    ) -> Result<Action, ProtocolError> {
        let request = ExperimentRequest::AgentStep {
            reward,
            observation: observation.clone(),
        };
        match self.exchange(request.clone())? {
            ExperimentReply::AgentStep { action } => Ok(action),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// End the agent's episode with a final reward.
    pub fn agent_end(&mut self, reward: f64) -> Result<(), ProtocolError> {
        let request = ExperimentRequest::AgentEnd { reward };
        match self.exchange(request.clone())? {
            ExperimentReply::AgentEnd => Ok(()),
            other => Err(self.mismatch(&request, &other)),
        }
    }

    /// Close the episode on the agent side. Same exchange as
    /// [`agent_end`](Self::agent_end).
    pub fn end_episode(&mut self, reward: f64) -> Result<(), ProtocolError> {
        self.agent_end(reward)
    }
}
