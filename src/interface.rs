//! Module defining traits that domain code implements to take part in an experiment

use crate::types::{Action, Observation, StepResult};

/// What a learning agent should implement.
///
/// Each method is called from the agent's event loop when the matching
/// request arrives. Returning an error aborts the loop and closes the
/// connection; nothing is sent back to the peer.
pub trait Agent {
    /// Receive the task specification, an opaque string produced by the
    /// environment.
    fn init(&mut self, task_spec: &str) -> anyhow::Result<()>;

    /// First observation of an episode. Returns the first action.
    fn start(&mut self, observation: Observation) -> anyhow::Result<Action>;

    /// Reward for the previous action and the next observation. Returns the
    /// next action.
    fn step(&mut self, reward: f64, observation: Observation) -> anyhow::Result<Action>;

    /// Final reward of the episode.
    fn end(&mut self, reward: f64) -> anyhow::Result<()>;

    /// Release whatever `init` acquired.
    fn cleanup(&mut self) -> anyhow::Result<()>;

    /// Answer a free-form text message.
    fn message(&mut self, message: &str) -> anyhow::Result<String>;
}

/// What an environment simulator should implement.
pub trait Environment {
    /// Initialize and return the task specification string.
    fn init(&mut self) -> anyhow::Result<String>;

    /// Reset to the start of an episode and return the first observation.
    fn start(&mut self) -> anyhow::Result<Observation>;

    /// Apply `action` and report reward, next observation and termination.
    fn step(&mut self, action: Action) -> anyhow::Result<StepResult>;

    /// Release whatever `init` acquired.
    fn cleanup(&mut self) -> anyhow::Result<()>;

    /// Answer a free-form text message.
    fn message(&mut self, message: &str) -> anyhow::Result<String>;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn init(&mut self, task_spec: &str) -> anyhow::Result<()> {
        (**self).init(task_spec)
    }

    fn start(&mut self, observation: Observation) -> anyhow::Result<Action> {
        (**self).start(observation)
    }

    fn step(&mut self, reward: f64, observation: Observation) -> anyhow::Result<Action> {
        (**self).step(reward, observation)
    }

    fn end(&mut self, reward: f64) -> anyhow::Result<()> {
        (**self).end(reward)
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        (**self).cleanup()
    }

    fn message(&mut self, message: &str) -> anyhow::Result<String> {
        (**self).message(message)
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn init(&mut self) -> anyhow::Result<String> {
        (**self).init()
    }

    fn start(&mut self) -> anyhow::Result<Observation> {
        (**self).start()
    }

    fn step(&mut self, action: Action) -> anyhow::Result<StepResult> {
        (**self).step(action)
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        (**self).cleanup()
    }

    fn message(&mut self, message: &str) -> anyhow::Result<String> {
        (**self).message(message)
    }
}
