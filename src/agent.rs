//! Agent side of the protocol: a receive, dispatch, reply loop around a
//! domain [`Agent`].

use std::net::TcpStream;

use tracing::{debug, error, info, instrument};

use crate::codec::{SizeCheck, WireMessage};
use crate::error::{ProtocolError, Role};
use crate::interface::Agent;
use crate::opcode::Opcode;
use crate::protocol::{AgentReply, AgentRequest, Announce};
use crate::session::{RoleState, Session};

/// Passive agent peer.
///
/// Blocks on the connection until a request arrives, hands it to the domain
/// agent and answers with a frame carrying the same opcode. `RLTerminate`
/// ends the loop without a handler call and without a reply.
#[derive(Debug)]
pub struct AgentRole<A> {
    agent: A,
    session: Session,
    state: RoleState,
    last_opcode: Option<Opcode>,
}

impl<A: Agent> AgentRole<A> {
    /// Wrap a domain agent. Declared sizes of received frames are ignored.
    pub fn new(agent: A) -> Self {
        Self::with_size_check(agent, SizeCheck::Ignore)
    }

    /// Wrap a domain agent with an explicit declared-size policy.
    pub fn with_size_check(agent: A, size_check: SizeCheck) -> Self {
        AgentRole {
            agent,
            session: Session::with_size_check(size_check),
            state: RoleState::Disconnected,
            last_opcode: None,
        }
    }

    /// Connect to `host:port` and announce this peer as an agent.
    #[instrument(skip(self))]
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), ProtocolError> {
        self.session.connect(host, port)?;
        if let Err(e) = self.session.announce(Announce::Agent) {
            self.session.close();
            return Err(e);
        }
        self.state = RoleState::Idle;
        Ok(())
    }

    /// Serve an already established connection. No announce frame is sent.
    pub fn accept(&mut self, stream: TcpStream) -> Result<(), ProtocolError> {
        self.session.accept(stream)?;
        self.state = RoleState::Idle;
        Ok(())
    }

    /// Handle requests until `RLTerminate`.
    ///
    /// Any error closes the session before it is returned.
    #[instrument(skip_all)]
    pub fn run_event_loop(&mut self) -> Result<(), ProtocolError> {
        let result = self.event_loop();
        match &result {
            Ok(()) => {
                info!("agent terminated");
                self.state = RoleState::Terminated;
            }
            Err(e) => {
                error!("agent event loop aborted: {e}");
                self.state = RoleState::Failed;
                self.session.close();
            }
        }
        result
    }

    fn event_loop(&mut self) -> Result<(), ProtocolError> {
        loop {
            let header = self.session.receive_header()?;
            self.last_opcode = Some(header.opcode);
            let request: AgentRequest = self.session.reader()?.read_body(&header)?;
            let opcode = request.opcode();

            if let Some(reply) = self.dispatch(request)? {
                self.session.send(&reply)?;
            }
            if opcode == Opcode::RLTerminate {
                return Ok(());
            }
        }
    }

    fn dispatch(&mut self, request: AgentRequest) -> Result<Option<AgentReply>, ProtocolError> {
        let opcode = request.opcode();
        debug!(%opcode, "dispatch");
        let fail = |e| ProtocolError::handler(Role::Agent, opcode, e);

        let reply = match request {
            AgentRequest::Init { task_spec } => {
                self.agent.init(&task_spec).map_err(fail)?;
                AgentReply::Init
            }
            AgentRequest::Start { observation } => AgentReply::Start {
                action: self.agent.start(observation).map_err(fail)?,
            },
            AgentRequest::Step {
                reward,
                observation,
            } => AgentReply::Step {
                action: self.agent.step(reward, observation).map_err(fail)?,
            },
            AgentRequest::End { reward } => {
                self.agent.end(reward).map_err(fail)?;
                AgentReply::End
            }
            AgentRequest::Cleanup => {
                self.agent.cleanup().map_err(fail)?;
                AgentReply::Cleanup
            }
            AgentRequest::Message { text } => AgentReply::Message {
                text: self.agent.message(&text).map_err(fail)?,
            },
            AgentRequest::Terminate => return Ok(None),
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

    /// The domain agent.
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// The domain agent, mutably.
    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    /// Close the connection and hand the domain agent back.
    pub fn into_inner(mut self) -> A {
        self.session.close();
        self.agent
    }
}
