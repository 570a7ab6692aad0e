//! Entry points that take a domain object and run it as a connected role.
//!
//! A loader wires a domain [`Agent`] or [`Environment`] to the coordinating
//! party named by a [`Configuration`]:
//!
//! 1. installs the file logger when `config.log` is set,
//! 2. connects to [`Configuration::address`] and announces the role,
//! 3. serves requests until `RLTerminate`,
//! 4. closes the connection on every path and hands the domain object back.
//!
//! # Example
//!
//! ```no_run
//! # use rlglue_codec::prelude::*;
//! # struct Random;
//! # impl Agent for Random {
//! #     fn init(&mut self, _task_spec: &str) -> anyhow::Result<()> { Ok(()) }
//! #     fn start(&mut self, _o: Observation) -> anyhow::Result<Action> { Ok(Action::from_ints([0])) }
//! #     fn step(&mut self, _r: f64, _o: Observation) -> anyhow::Result<Action> { Ok(Action::from_ints([0])) }
//! #     fn end(&mut self, _r: f64) -> anyhow::Result<()> { Ok(()) }
//! #     fn cleanup(&mut self) -> anyhow::Result<()> { Ok(()) }
//! #     fn message(&mut self, _m: &str) -> anyhow::Result<String> { Ok(String::new()) }
//! # }
//! fn main() -> anyhow::Result<()> {
//!     let loader = AgentLoader::new(Random, Configuration::from_env())?;
//!     let _agent = loader.run()?;
//!     Ok(())
//! }
//! ```

use anyhow::Context;
use tracing::{info, instrument, trace};

use crate::agent::AgentRole;
use crate::configuration::Configuration;
use crate::environment::EnvironmentRole;
use crate::interface::{Agent, Environment};
use crate::logger::init_logger;

/// Runs a domain [`Agent`] against the coordinating party.
pub struct AgentLoader<A: Agent> {
    agent: A,
    config: Configuration,
}

impl<A: Agent> AgentLoader<A> {
    /// Create a loader, installing the file logger if `config` asks for it.
    #[instrument(skip_all)]
    pub fn new(agent: A, config: Configuration) -> anyhow::Result<Self> {
        if config.log {
            init_logger()?;
        }
        trace!(?config);
        Ok(AgentLoader { agent, config })
    }

    /// Connect, serve until `RLTerminate`, close, and return the agent.
    #[instrument(skip_all, fields(address = %self.config.address()))]
    pub fn run(self) -> anyhow::Result<A> {
        let mut role = AgentRole::with_size_check(self.agent, self.config.size_check());
        role.connect(&self.config.host, self.config.port)
            .with_context(|| format!("could not connect agent to {}", self.config.address()))?;
        info!("agent connected");
        let outcome = role.run_event_loop();
        role.close();
        outcome.context("agent event loop failed")?;
        Ok(role.into_inner())
    }
}

/// Runs a domain [`Environment`] against the coordinating party.
pub struct EnvironmentLoader<E: Environment> {
    env: E,
    config: Configuration,
}

impl<E: Environment> EnvironmentLoader<E> {
    /// Create a loader, installing the file logger if `config` asks for it.
    #[instrument(skip_all)]
    pub fn new(env: E, config: Configuration) -> anyhow::Result<Self> {
        if config.log {
            init_logger()?;
        }
        trace!(?config);
        Ok(EnvironmentLoader { env, config })
    }

    /// Connect, serve until `RLTerminate`, close, and return the environment.
    #[instrument(skip_all, fields(address = %self.config.address()))]
    pub fn run(self) -> anyhow::Result<E> {
        let mut role = EnvironmentRole::with_size_check(self.env, self.config.size_check());
        role.connect(&self.config.host, self.config.port)
            .with_context(|| {
                format!("could not connect environment to {}", self.config.address())
            })?;
        info!("environment connected");
        let outcome = role.run_event_loop();
        role.close();
        outcome.context("environment event loop failed")?;
        Ok(role.into_inner())
    }
}
