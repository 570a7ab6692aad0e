use std::thread;

use common::{config_for, init_test_logger, Corridor, ForwardAgent, Glue};
use rlglue_codec::opcode::Opcode;
use rlglue_codec::prelude::*;
use rlglue_codec::protocol::{
    AgentReply, AgentRequest, Announce, EnvironmentReply, EnvironmentRequest,
};

mod common;

#[test]
fn agent_answers_with_the_request_opcode() {
    init_test_logger();
    let glue = Glue::bind();
    let config = config_for(glue.port());
    let loader = thread::spawn(move || AgentLoader::new(ForwardAgent::default(), config)?.run());

    let mut peer = glue.accept();
    assert_eq!(peer.role, Announce::Agent);

    let reply: AgentReply = peer
        .request(&AgentRequest::Message {
            text: "ping".to_owned(),
        })
        .unwrap();
    assert_eq!(
        reply,
        AgentReply::Message {
            text: "pong".to_owned()
        }
    );

    let reply: AgentReply = peer
        .request(&AgentRequest::Init {
            task_spec: "VERSION RL-Glue-3.0".to_owned(),
        })
        .unwrap();
    assert_eq!(reply, AgentReply::Init);

    let reply: AgentReply = peer
        .request(&AgentRequest::Step {
            reward: 0.25,
            observation: Observation::from_reals([0.5]),
        })
        .unwrap();
    assert_eq!(
        reply,
        AgentReply::Step {
            action: Action::from_ints([1])
        }
    );

    peer.send(&AgentRequest::Terminate);
    let agent = loader.join().unwrap().unwrap();
    assert_eq!(agent.messages, 1);
    assert_eq!(agent.task_spec.as_deref(), Some("VERSION RL-Glue-3.0"));
    assert_eq!(agent.steps, 1);
    assert_eq!(agent.last_reward, 0.25);
}

#[test]
fn terminate_calls_no_handler_and_sends_no_reply() {
    let glue = Glue::bind();
    let port = glue.port();
    let role = thread::spawn(move || {
        let mut role = AgentRole::new(ForwardAgent::default());
        role.connect("127.0.0.1", port).unwrap();
        let outcome = role.run_event_loop();
        (outcome, role.state(), role.last_opcode(), role.into_inner())
    });

    let mut peer = glue.accept();
    peer.send(&AgentRequest::Terminate);

    let (outcome, state, last, agent) = role.join().unwrap();
    assert!(outcome.is_ok());
    assert_eq!(state, RoleState::Terminated);
    assert_eq!(last, Some(Opcode::RLTerminate));
    assert_eq!(agent.starts + agent.steps + agent.ends + agent.messages, 0);

    // the role hung up without writing anything
    assert!(peer.try_receive::<AgentReply>().is_err());
}

#[test]
fn unknown_opcode_fails_the_agent_loop() {
    let glue = Glue::bind();
    let port = glue.port();
    let role = thread::spawn(move || {
        let mut role = AgentRole::new(ForwardAgent::default());
        role.connect("127.0.0.1", port).unwrap();
        let outcome = role.run_event_loop();
        (outcome, role.state(), role.last_opcode())
    });

    let mut peer = glue.accept();
    // an environment request sent to the agent
    peer.send(&EnvironmentRequest::Step {
        action: Action::from_ints([1]),
    });

    let (outcome, state, last) = role.join().unwrap();
    let err = outcome.unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::UnexpectedMessage {
            opcode: Opcode::EnvStep,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::UnknownMessage);
    assert_eq!(state, RoleState::Failed);
    assert_eq!(last, Some(Opcode::EnvStep));
    assert!(peer.try_receive::<AgentReply>().is_err());
}

#[test]
fn environment_step_reply_is_terminal_reward_observation() {
    let glue = Glue::bind();
    let config = config_for(glue.port());
    let loader = thread::spawn(move || EnvironmentLoader::new(Corridor::new(1), config)?.run());

    let mut peer = glue.accept();
    assert_eq!(peer.role, Announce::Environment);

    let reply: EnvironmentReply = peer.request(&EnvironmentRequest::Init).unwrap();
    assert_eq!(
        reply,
        EnvironmentReply::Init {
            task_spec: "corridor length 1".to_owned()
        }
    );
    let reply: EnvironmentReply = peer.request(&EnvironmentRequest::Start).unwrap();
    assert_eq!(
        reply,
        EnvironmentReply::Start {
            observation: Observation::from_ints([0])
        }
    );
    let reply: EnvironmentReply = peer
        .request(&EnvironmentRequest::Step {
            action: Action::from_ints([1]),
        })
        .unwrap();
    assert_eq!(
        reply,
        EnvironmentReply::Step(StepResult {
            reward: -1.0,
            observation: Observation::from_ints([1]),
            terminal: true,
        })
    );
    let reply: EnvironmentReply = peer.request(&EnvironmentRequest::Cleanup).unwrap();
    assert_eq!(reply, EnvironmentReply::Cleanup);

    peer.send(&EnvironmentRequest::Terminate);
    let env = loader.join().unwrap().unwrap();
    assert!(env.cleaned);
    assert_eq!(env.position, 1);
}

#[test]
fn handler_error_closes_the_environment() {
    let glue = Glue::bind();
    let config = config_for(glue.port());
    let loader = thread::spawn(move || EnvironmentLoader::new(Corridor::new(5), config)?.run());

    let mut peer = glue.accept();
    // an empty action makes the corridor fail
    peer.send(&EnvironmentRequest::Step {
        action: Action::default(),
    });

    let err = loader.join().unwrap().unwrap_err();
    let protocol = err
        .downcast_ref::<ProtocolError>()
        .expect("protocol error in the chain");
    assert_eq!(protocol.kind(), ErrorKind::Domain);
    assert!(format!("{err:#}").contains("action without a move"));
    assert!(peer.try_receive::<EnvironmentReply>().is_err());
}

#[test]
fn loader_reports_an_unreachable_glue() {
    let port = Glue::bind().port();
    let err = AgentLoader::new(ForwardAgent::default(), config_for(port))
        .unwrap()
        .run()
        .unwrap_err();
    let protocol = err.downcast_ref::<ProtocolError>().unwrap();
    assert_eq!(protocol.kind(), ErrorKind::Transport);
}
