//! FSM unit tests

use platform_models::ServerStatus;
use specforge::deploy::fsm::{LifecycleEvent, ServerFsm};

#[test]
fn test_fsm_initial_state() {
    let fsm = ServerFsm::new();
    assert_eq!(fsm.state(), ServerStatus::Pending);
    assert!(fsm.error().is_none());
}

#[test]
fn test_fsm_deploy_success_flow() {
    let mut fsm = ServerFsm::new();

    // Pending -> Deploying
    fsm.process(LifecycleEvent::StartDeploy).unwrap();
    assert_eq!(fsm.state(), ServerStatus::Deploying);

    // Deploying -> Active
    fsm.process(LifecycleEvent::DeploySucceeded).unwrap();
    assert_eq!(fsm.state(), ServerStatus::Active);
}

#[test]
fn test_fsm_retry_after_failure() {
    let mut fsm = ServerFsm::new();

    fsm.process(LifecycleEvent::StartDeploy).unwrap();
    fsm.process(LifecycleEvent::DeployFailed("image build failed".to_string()))
        .unwrap();
    assert_eq!(fsm.state(), ServerStatus::Failed);
    assert_eq!(fsm.error(), Some("image build failed"));

    // failed is terminal for deployments
    assert!(fsm.process(LifecycleEvent::StartDeploy).is_err());

    // an administrative retry clears the error and starts over
    fsm.process(LifecycleEvent::Retry).unwrap();
    assert_eq!(fsm.state(), ServerStatus::Pending);
    assert!(fsm.error().is_none());
    fsm.process(LifecycleEvent::StartDeploy).unwrap();
    assert_eq!(fsm.state(), ServerStatus::Deploying);
}

#[test]
fn test_fsm_retry_only_from_failed() {
    for status in [
        ServerStatus::Pending,
        ServerStatus::Deploying,
        ServerStatus::Active,
        ServerStatus::Stopped,
    ] {
        let fsm = ServerFsm::from_status(status);
        assert!(!fsm.can(&LifecycleEvent::Retry), "{}", status);
    }
}

#[test]
fn test_fsm_generation_failure() {
    let mut fsm = ServerFsm::new();
    let status = fsm
        .process(LifecycleEvent::GenerationFailed("bad spec".to_string()))
        .unwrap();
    assert_eq!(status, ServerStatus::Failed);

    // generation failures only apply before deployment
    let mut deploying = ServerFsm::from_status(ServerStatus::Deploying);
    assert!(deploying
        .process(LifecycleEvent::GenerationFailed("late".to_string()))
        .is_err());
}

#[test]
fn test_fsm_cannot_start_twice() {
    for status in [
        ServerStatus::Deploying,
        ServerStatus::Active,
        ServerStatus::Failed,
        ServerStatus::Stopped,
    ] {
        let fsm = ServerFsm::from_status(status);
        assert!(!fsm.can(&LifecycleEvent::StartDeploy), "{}", status);
    }
    assert!(ServerFsm::new().can(&LifecycleEvent::StartDeploy));
}

#[test]
fn test_fsm_stop() {
    for status in [
        ServerStatus::Pending,
        ServerStatus::Active,
        ServerStatus::Failed,
    ] {
        let mut fsm = ServerFsm::from_status(status);
        assert_eq!(
            fsm.process(LifecycleEvent::Stop).unwrap(),
            ServerStatus::Stopped
        );
    }

    let mut stopped = ServerFsm::from_status(ServerStatus::Stopped);
    assert!(stopped.process(LifecycleEvent::Stop).is_err());
    let mut deploying = ServerFsm::from_status(ServerStatus::Deploying);
    assert!(deploying.process(LifecycleEvent::Stop).is_err());
}

#[test]
fn test_fsm_invalid_transitions() {
    let mut fsm = ServerFsm::new();

    // Can't succeed without deploying
    assert!(fsm.process(LifecycleEvent::DeploySucceeded).is_err());
    assert!(fsm
        .process(LifecycleEvent::DeployFailed("x".to_string()))
        .is_err());
    assert_eq!(fsm.state(), ServerStatus::Pending);
}
