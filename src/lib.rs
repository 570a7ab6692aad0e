//! # RL-Glue codec
//!
//! Binary wire codec and role state machines for RL-Glue style experiments, where an
//! agent, an environment and an experiment program run as separate processes and talk
//! to a coordinating party over TCP.
//!
//! It provides:
//! - A framed big-endian codec: [`FrameWriter`](crate::codec::FrameWriter),
//!   [`FrameReader`](crate::codec::FrameReader) and the [`WireMessage`](crate::codec::WireMessage)
//!   trait implemented by every message kind in [`protocol`]
//! - Passive role loops for agents ([`AgentRole`](crate::agent::AgentRole)) and environments
//!   ([`EnvironmentRole`](crate::environment::EnvironmentRole))
//! - The active orchestrator client ([`Experiment`](crate::experiment::Experiment))
//! - Loaders that connect a domain object using a [`Configuration`](crate::configuration::Configuration)
//!
//! Every frame is `opcode (i32) | payload size (i32) | payload`, all big-endian. Replies
//! carry the opcode of the request they answer; a mismatch is a
//! [`ProtocolError::SynchronizationLost`](crate::error::ProtocolError::SynchronizationLost).
//!
//! # Documentation Overview
//!
//! - Wire primitives and frame layout: [`codec`].
//! - Opcode values: [`opcode`].
//! - Message kinds per role: [`protocol`].
//! - Implementing a learning agent or a simulator: the [`Agent`](crate::interface::Agent) and
//!   [`Environment`](crate::interface::Environment) traits.
//! - Error classification: [`ProtocolError::kind`](crate::error::ProtocolError::kind).
//!
//! # Example Environment
//!
//! ```no_run
//! use rlglue_codec::prelude::*;
//!
//! struct Corridor {
//!     position: i32,
//! }
//!
//! impl Environment for Corridor {
//!     fn init(&mut self) -> anyhow::Result<String> {
//!         Ok("VERSION RL-Glue-3.0 PROBLEMTYPE episodic".to_owned())
//!     }
//!
//!     fn start(&mut self) -> anyhow::Result<Observation> {
//!         self.position = 0;
//!         Ok(Observation::from_ints([self.position]))
//!     }
//!
//!     fn step(&mut self, action: Action) -> anyhow::Result<StepResult> {
//!         self.position += action.ints.first().copied().unwrap_or(0);
//!         Ok(StepResult {
//!             reward: -1.0,
//!             observation: Observation::from_ints([self.position]),
//!             terminal: self.position >= 10,
//!         })
//!     }
//!
//!     fn cleanup(&mut self) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//!
//!     fn message(&mut self, _message: &str) -> anyhow::Result<String> {
//!         Ok(String::new())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Configuration::from_env();
//!     EnvironmentLoader::new(Corridor { position: 0 }, config)?.run()?;
//!     Ok(())
//! }
//! ```
//!
//! # Example Experiment
//!
//! ```no_run
//! use rlglue_codec::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut experiment = Experiment::connect_with(&Configuration::from_env())?;
//!     let task_spec = experiment.init()?;
//!     println!("task: {task_spec}");
//!
//!     for _ in 0..10 {
//!         experiment.episode(1000)?;
//!         println!(
//!             "return {} in {} steps",
//!             experiment.return_value()?,
//!             experiment.num_steps()?
//!         );
//!     }
//!
//!     experiment.cleanup()?;
//!     experiment.close();
//!     Ok(())
//! }
//! ```
#![warn(missing_docs)]

pub use anyhow;

pub mod agent;
pub mod codec;
pub mod configuration;
pub mod environment;
pub mod error;
pub mod experiment;
pub mod interface;
pub mod loader;
mod logger;
pub mod opcode;
pub mod protocol;
pub mod session;
pub mod types;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use rlglue_codec::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::AgentRole;
    pub use crate::configuration::Configuration;
    pub use crate::environment::EnvironmentRole;
    pub use crate::error::{ErrorKind, ProtocolError};
    pub use crate::experiment::Experiment;
    pub use crate::interface::{Agent, Environment};
    pub use crate::loader::{AgentLoader, EnvironmentLoader};
    pub use crate::session::RoleState;
    pub use crate::types::{
        AbstractVector, Action, Observation, StartResult, StepResult, StepResultWithAction,
    };
}
