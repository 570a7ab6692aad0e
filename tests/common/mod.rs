#![allow(dead_code)]

use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};

use rlglue_codec::codec::{FrameReader, FrameWriter, WireMessage};
use rlglue_codec::prelude::*;
use rlglue_codec::protocol::{
    AgentReply, AgentRequest, Announce, EnvironmentReply, EnvironmentRequest, ExperimentReply,
    ExperimentRequest,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Logs to the test harness output. Only the first call in a test binary
/// installs it.
pub fn init_test_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_test_writer()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn config_for(port: u16) -> Configuration {
    Configuration::new().with_host("127.0.0.1").with_port(port)
}

/// Listening side of the tests, standing in for the coordinating party.
pub struct Glue {
    listener: TcpListener,
}

impl Glue {
    pub fn bind() -> Self {
        Glue {
            listener: TcpListener::bind("127.0.0.1:0").unwrap(),
        }
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().unwrap().port()
    }

    /// Accept one connection and read its announce frame.
    pub fn accept(&self) -> Peer {
        let (stream, _) = self.listener.accept().unwrap();
        Peer::announced(stream)
    }
}

/// A connected peer seen from the glue.
pub struct Peer {
    pub role: Announce,
    reader: FrameReader<BufReader<TcpStream>>,
    writer: FrameWriter<TcpStream>,
}

impl Peer {
    fn announced(stream: TcpStream) -> Self {
        let mut reader = FrameReader::new(BufReader::new(stream.try_clone().unwrap()));
        let role = reader.receive().unwrap();
        Peer {
            role,
            reader,
            writer: FrameWriter::new(stream),
        }
    }

    pub fn send<M: WireMessage>(&mut self, msg: &M) {
        self.writer.send(msg).unwrap();
    }

    pub fn try_receive<M: WireMessage>(&mut self) -> Result<M, ProtocolError> {
        self.reader.receive()
    }

    pub fn receive<M: WireMessage>(&mut self) -> M {
        self.try_receive().unwrap()
    }

    /// Send `request` and read the reply echoing its opcode.
    pub fn request<Req: WireMessage, Rep: WireMessage>(
        &mut self,
        request: &Req,
    ) -> Result<Rep, ProtocolError> {
        self.writer.send(request)?;
        self.reader.expect_reply(request.opcode())
    }

    /// Bypass the codec, for malformed frames.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        let mut stream = self.writer.get_ref();
        stream.write_all(bytes).unwrap();
        stream.flush().unwrap();
    }
}

/// Minimal coordinating party: relays experiment requests to the agent and
/// the environment and keeps the episode counters.
pub struct Relay {
    experiment: Peer,
    agent: Peer,
    env: Peer,
    last_action: Action,
    total_reward: f64,
    steps: i32,
    episodes: i32,
}

impl Relay {
    /// Wait for the three roles, in any order.
    pub fn accept_all(glue: &Glue) -> Self {
        let (mut experiment, mut agent, mut env) = (None, None, None);
        for _ in 0..3 {
            let peer = glue.accept();
            match peer.role {
                Announce::Experiment => experiment = Some(peer),
                Announce::Agent => agent = Some(peer),
                Announce::Environment => env = Some(peer),
            }
        }
        Relay {
            experiment: experiment.expect("no experiment connected"),
            agent: agent.expect("no agent connected"),
            env: env.expect("no environment connected"),
            last_action: Action::default(),
            total_reward: 0.0,
            steps: 0,
            episodes: 0,
        }
    }

    /// Serve until the experiment hangs up, then terminate both roles.
    pub fn serve(mut self) -> Result<(), ProtocolError> {
        while let Ok(request) = self.experiment.try_receive::<ExperimentRequest>() {
            let reply = self.handle(request)?;
            self.experiment.send(&reply);
        }
        self.agent.send(&AgentRequest::Terminate);
        self.env.send(&EnvironmentRequest::Terminate);
        Ok(())
    }

    fn agent(&mut self, request: AgentRequest) -> Result<AgentReply, ProtocolError> {
        self.agent.request(&request)
    }

    fn env(&mut self, request: EnvironmentRequest) -> Result<EnvironmentReply, ProtocolError> {
        self.env.request(&request)
    }

    fn start(&mut self) -> Result<StartResult, ProtocolError> {
        let EnvironmentReply::Start { observation } = self.env(EnvironmentRequest::Start)? else {
            panic!("bad env start reply")
        };
        let AgentReply::Start { action } = self.agent(AgentRequest::Start {
            observation: observation.clone(),
        })?
        else {
            panic!("bad agent start reply")
        };
        self.steps = 0;
        self.total_reward = 0.0;
        self.last_action = action.clone();
        Ok(StartResult {
            observation,
            action,
        })
    }

    fn step(&mut self) -> Result<StepResultWithAction, ProtocolError> {
        let EnvironmentReply::Step(result) = self.env(EnvironmentRequest::Step {
            action: self.last_action.clone(),
        })?
        else {
            panic!("bad env step reply")
        };
        self.steps += 1;
        self.total_reward += result.reward;

        let action = if result.terminal {
            self.agent(AgentRequest::End {
                reward: result.reward,
            })?;
            self.episodes += 1;
            Action::default()
        } else {
            let AgentReply::Step { action } = self.agent(AgentRequest::Step {
                reward: result.reward,
                observation: result.observation.clone(),
            })?
            else {
                panic!("bad agent step reply")
            };
            self.last_action = action.clone();
            action
        };
        Ok(StepResultWithAction {
            reward: result.reward,
            observation: result.observation,
            terminal: result.terminal,
            action,
        })
    }

    fn handle(&mut self, request: ExperimentRequest) -> Result<ExperimentReply, ProtocolError> {
        Ok(match request {
            ExperimentRequest::Init => {
                let EnvironmentReply::Init { task_spec } = self.env(EnvironmentRequest::Init)?
                else {
                    panic!("bad env init reply")
                };
                self.agent(AgentRequest::Init {
                    task_spec: task_spec.clone(),
                })?;
                self.episodes = 0;
                ExperimentReply::Init { task_spec }
            }
            ExperimentRequest::Start => ExperimentReply::Start(self.start()?),
            ExperimentRequest::Step => ExperimentReply::Step(self.step()?),
            ExperimentRequest::Cleanup => {
                self.env(EnvironmentRequest::Cleanup)?;
                self.agent(AgentRequest::Cleanup)?;
                ExperimentReply::Cleanup
            }
            ExperimentRequest::Return => ExperimentReply::Return {
                value: self.total_reward,
            },
            ExperimentRequest::NumSteps => ExperimentReply::NumSteps { steps: self.steps },
            ExperimentRequest::NumEpisodes => ExperimentReply::NumEpisodes {
                episodes: self.episodes,
            },
            ExperimentRequest::Episode { max_steps } => {
                self.start()?;
                let mut terminal = false;
                while !terminal && (max_steps == 0 || self.steps < max_steps) {
                    terminal = self.step()?.terminal;
                }
                ExperimentReply::Episode {
                    exit_status: i32::from(terminal),
                }
            }
            ExperimentRequest::AgentMessage { text } => {
                let AgentReply::Message { text } = self.agent(AgentRequest::Message { text })?
                else {
                    panic!("bad agent message reply")
                };
                ExperimentReply::AgentMessage { text }
            }
            ExperimentRequest::EnvMessage { text } => {
                let EnvironmentReply::Message { text } =
                    self.env(EnvironmentRequest::Message { text })?
                else {
                    panic!("bad env message reply")
                };
                ExperimentReply::EnvMessage { text }
            }
            ExperimentRequest::EnvStart => {
                let EnvironmentReply::Start { observation } =
                    self.env(EnvironmentRequest::Start)?
                else {
                    panic!("bad env start reply")
                };
                ExperimentReply::EnvStart { observation }
            }
            ExperimentRequest::EnvStep { action } => {
                let EnvironmentReply::Step(result) =
                    self.env(EnvironmentRequest::Step { action })?
                else {
                    panic!("bad env step reply")
                };
                ExperimentReply::EnvStep(result)
            }
            ExperimentRequest::AgentStart { observation } => {
                let AgentReply::Start { action } =
                    self.agent(AgentRequest::Start { observation })?
                else {
                    panic!("bad agent start reply")
                };
                ExperimentReply::AgentStart { action }
            }
            ExperimentRequest::AgentStep {
                reward,
                observation,
            } => {
                let AgentReply::Step { action } = self.agent(AgentRequest::Step {
                    reward,
                    observation,
                })?
                else {
                    panic!("bad agent step reply")
                };
                ExperimentReply::AgentStep { action }
            }
            ExperimentRequest::AgentEnd { reward } => {
                self.agent(AgentRequest::End { reward })?;
                ExperimentReply::AgentEnd
            }
        })
    }
}

/// Always moves forward by one. Counts the calls it receives.
#[derive(Debug, Default)]
pub struct ForwardAgent {
    pub task_spec: Option<String>,
    pub starts: u32,
    pub steps: u32,
    pub ends: u32,
    pub last_reward: f64,
    pub messages: u32,
    pub cleaned: bool,
}

impl Agent for ForwardAgent {
    fn init(&mut self, task_spec: &str) -> anyhow::Result<()> {
        self.task_spec = Some(task_spec.to_owned());
        Ok(())
    }

    fn start(&mut self, _observation: Observation) -> anyhow::Result<Action> {
        self.starts += 1;
        Ok(Action::from_ints([1]))
    }

    fn step(&mut self, reward: f64, _observation: Observation) -> anyhow::Result<Action> {
        self.steps += 1;
        self.last_reward = reward;
        Ok(Action::from_ints([1]))
    }

    fn end(&mut self, reward: f64) -> anyhow::Result<()> {
        self.ends += 1;
        self.last_reward = reward;
        Ok(())
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        self.cleaned = true;
        Ok(())
    }

    fn message(&mut self, message: &str) -> anyhow::Result<String> {
        self.messages += 1;
        Ok(match message {
            "ping" => "pong".to_owned(),
            other => other.to_owned(),
        })
    }
}

/// One-dimensional corridor, terminal at `length`. Every step costs 1.
#[derive(Debug)]
pub struct Corridor {
    pub length: i32,
    pub position: i32,
    pub cleaned: bool,
}

impl Corridor {
    pub fn new(length: i32) -> Self {
        Corridor {
            length,
            position: 0,
            cleaned: false,
        }
    }
}

impl Environment for Corridor {
    fn init(&mut self) -> anyhow::Result<String> {
        Ok(format!("corridor length {}", self.length))
    }

    fn start(&mut self) -> anyhow::Result<Observation> {
        self.position = 0;
        Ok(Observation::from_ints([self.position]))
    }

    fn step(&mut self, action: Action) -> anyhow::Result<StepResult> {
        let Some(&delta) = action.ints.first() else {
            anyhow::bail!("action without a move")
        };
        self.position += delta;
        Ok(StepResult {
            reward: -1.0,
            observation: Observation::from_ints([self.position]),
            terminal: self.position >= self.length,
        })
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        self.cleaned = true;
        Ok(())
    }

    fn message(&mut self, _message: &str) -> anyhow::Result<String> {
        Ok(format!("position={}", self.position))
    }
}
