//! Environment side of the protocol.

use std::net::TcpStream;

use tracing::{debug, error, info, instrument};

use crate::codec::{SizeCheck, WireMessage};
use crate::error::{ProtocolError, Role};
use crate::interface::Environment;
use crate::opcode::Opcode;
use crate::protocol::{Announce, EnvironmentReply, EnvironmentRequest};
use crate::session::{RoleState, Session};

/// Passive environment peer. Same loop as [`AgentRole`](crate::agent::AgentRole),
/// over the environment's message set.
#[derive(Debug)]
pub struct EnvironmentRole<E> {
    env: E,
    session: Session,
    state: RoleState,
    last_opcode: Option<Opcode>,
}

impl<E: Environment> EnvironmentRole<E> {
    /// Wrap a domain environment. Declared sizes of received frames are
    /// ignored.
    pub fn new(env: E) -> Self {
        Self::with_size_check(env, SizeCheck::Ignore)
    }

    /// Wrap a domain environment with an explicit declared-size policy.
    pub fn with_size_check(env: E, size_check: SizeCheck) -> Self {
        EnvironmentRole {
            env,
            session: Session::with_size_check(size_check),
            state: RoleState::Disconnected,
            last_opcode: None,
        }
    }

    /// Connect to `host:port` and announce this peer as an environment.
    #[instrument(skip(self))]
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), ProtocolError> {
        self.session.connect(host, port)?;
        if let Err(e) = self.session.announce(Announce::Environment) {
            self.session.close();
            return Err(e);
        }
        self.state = RoleState::Idle;
        Ok(())
    }

    /// Serve an already established connection without announcing.
    pub fn accept(&mut self, stream: TcpStream) -> Result<(), ProtocolError> {
        self.session.accept(stream)?;
        self.state = RoleState::Idle;
        Ok(())
    }

    /// Handle requests until `RLTerminate`. Any error closes the session.
    #[instrument(skip_all)]
    pub fn run_event_loop(&mut self) -> Result<(), ProtocolError> {
        let result = self.event_loop();
        if let Err(e) = &result {
            error!("environment event loop aborted: {e}");
            self.state = RoleState::Failed;
            self.session.close();
        } else {
            info!("environment terminated");
            self.state = RoleState::Terminated;
        }
        result
    }

    fn event_loop(&mut self) -> Result<(), ProtocolError> {
        loop {
            let header = self.session.receive_header()?;
            self.last_opcode = Some(header.opcode);
            let request: EnvironmentRequest = self.session.reader()?.read_body(&header)?;
            let opcode = request.opcode();

            if let Some(reply) = self.dispatch(request)? {
                self.session.send(&reply)?;
            }
            if opcode == Opcode::RLTerminate {
                return Ok(());
            }
        }
    }

    fn dispatch(
        &mut self,
        request: EnvironmentRequest,
    ) -> Result<Option<EnvironmentReply>, ProtocolError> {
        let opcode = request.opcode();
        debug!(%opcode, "dispatch");
        let fail = |e| ProtocolError::handler(Role::Environment, opcode, e);

        let reply = match request {
            EnvironmentRequest::Init => EnvironmentReply::Init {
                task_spec: self.env.init().map_err(fail)?,
            },
            EnvironmentRequest::Start => EnvironmentReply::Start {
                observation: self.env.start().map_err(fail)?,
            },
            EnvironmentRequest::Step { action } => {
                EnvironmentReply::Step(self.env.step(action).map_err(fail)?)
            }
            EnvironmentRequest::Cleanup => {
                self.env.cleanup().map_err(fail)?;
                EnvironmentReply::Cleanup
            }
            EnvironmentRequest::Message { text } => EnvironmentReply::Message {
                text: self.env.message(&text).map_err(fail)?,
            },
            EnvironmentRequest::Terminate => return Ok(None),
        };
        Ok(Some(reply))
    }

    /// Release the connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.session.close();
    }

    /// Where the event loop stands.
    pub fn state(&self) -> RoleState {
        self.state
    }

    /// Opcode of the most recently received frame.
    pub fn last_opcode(&self) -> Option<Opcode> {
        self.last_opcode
    }

    /// The domain environment.
    pub fn environment(&self) -> &E {
        &self.env
    }

    /// The domain environment, mutably.
    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Close the connection and hand the domain environment back.
    pub fn into_inner(mut self) -> E {
        self.session.close();
        self.env
    }
}
