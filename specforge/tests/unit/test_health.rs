//! Health checker and scheduler tests

use std::sync::Arc;
use std::time::Duration;

use platform_models::{EventStatus, EventType, NewServer, ServerRecord, ServerStatus};
use serde_json::json;
use specforge::deploy::{Orchestrator, SimulatedProvisioner};
use specforge::health::{CheckOutcome, HealthChecker, ProbeOutcome, ScriptedProbe, HEALTHY_UPTIME};
use specforge::store::{MemoryStore, ServerPatch, ServerStore};
use specforge::workers::health::{run, Options};
use tokio::sync::oneshot;

async fn server_with_status(store: &MemoryStore, status: ServerStatus) -> ServerRecord {
    let server = store
        .create_server(NewServer::new("Inventory", json!({"paths": {}})))
        .await
        .unwrap();
    store
        .update_server(
            &server.id,
            ServerPatch::new()
                .status(status)
                .uptime("100%")
                .last_health_check(chrono::Utc::now() - chrono::Duration::minutes(5))
                .add_requests(40),
        )
        .await
        .unwrap()
        .unwrap()
}

fn checker(store: Arc<MemoryStore>, outcomes: Vec<ProbeOutcome>) -> HealthChecker {
    HealthChecker::new(store, Arc::new(ScriptedProbe::new(outcomes)))
}

#[tokio::test]
async fn test_passing_check_updates_record() {
    let store = Arc::new(MemoryStore::new());
    let before = server_with_status(&store, ServerStatus::Active).await;
    let checker = checker(store.clone(), vec![ScriptedProbe::healthy(7)]);

    let outcome = checker.health_check(&before.id).await.unwrap();
    assert_eq!(outcome, CheckOutcome::Passed { requests_served: 7 });

    let after = store.get_server(&before.id).await.unwrap().unwrap();
    assert_eq!(after.request_count, 47);
    assert!(after.request_count >= before.request_count);
    assert_eq!(after.uptime, HEALTHY_UPTIME);
    assert!(after.last_health_check > before.last_health_check);

    let events = store.list_events(Some(&before.id)).await.unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].is(EventType::HealthCheck, EventStatus::Success));
    assert_eq!(events[0].message, "Health check passed");
    assert!(events[0].details["timestamp"].is_string());
}

#[tokio::test]
async fn test_degraded_check_leaves_record_untouched() {
    let store = Arc::new(MemoryStore::new());
    let before = server_with_status(&store, ServerStatus::Active).await;
    let checker = checker(store.clone(), vec![ScriptedProbe::degraded()]);

    let outcome = checker.health_check(&before.id).await.unwrap();
    assert!(matches!(outcome, CheckOutcome::Degraded { .. }));

    let after = store.get_server(&before.id).await.unwrap().unwrap();
    assert_eq!(after.request_count, before.request_count);
    assert_eq!(after.uptime, before.uptime);
    assert_eq!(after.last_health_check, before.last_health_check);

    let events = store.list_events(Some(&before.id)).await.unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].is(EventType::HealthCheck, EventStatus::Warning));
    assert_eq!(
        events[0].message,
        "Health check warning - high response time"
    );
    assert_eq!(events[0].details["responseTime"], "2.5s");
}

#[tokio::test]
async fn test_inactive_servers_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    for status in [
        ServerStatus::Pending,
        ServerStatus::Deploying,
        ServerStatus::Failed,
        ServerStatus::Stopped,
    ] {
        let before = server_with_status(&store, status).await;
        let checker = checker(store.clone(), vec![ScriptedProbe::healthy(5)]);

        let outcome = checker.health_check(&before.id).await.unwrap();
        assert_eq!(outcome, CheckOutcome::Skipped);

        let after = store.get_server(&before.id).await.unwrap().unwrap();
        assert_eq!(after, before);
    }
    assert_eq!(
        checker(store.clone(), vec![])
            .health_check("missing")
            .await
            .unwrap(),
        CheckOutcome::Skipped
    );
    assert!(store.list_events(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_check_all_active_only_probes_active() {
    let store = Arc::new(MemoryStore::new());
    let active = server_with_status(&store, ServerStatus::Active).await;
    let _pending = server_with_status(&store, ServerStatus::Pending).await;
    let probe = Arc::new(ScriptedProbe::new([
        ScriptedProbe::healthy(1),
        ScriptedProbe::healthy(1),
    ]));
    let checker = HealthChecker::new(store.clone(), probe.clone());

    let outcomes = checker.check_all_active().await.unwrap();
    assert_eq!(outcomes, vec![CheckOutcome::Passed { requests_served: 1 }]);
    assert_eq!(probe.remaining(), 1);

    let events = store.list_events(None).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].server_id, active.id);
}

#[tokio::test(start_paused = true)]
async fn test_check_during_deployment_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let server = store
        .create_server(NewServer::new("Inventory", json!({"paths": {}})))
        .await
        .unwrap();
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        Arc::new(SimulatedProvisioner::default()),
    ));
    let deployment = tokio::spawn({
        let orchestrator = orchestrator.clone();
        let id = server.id.clone();
        async move { orchestrator.deploy_server(&id).await }
    });

    // inside the first provisioning phase
    tokio::time::sleep(Duration::from_millis(500)).await;
    let during = store.get_server(&server.id).await.unwrap().unwrap();
    assert_eq!(during.status, ServerStatus::Deploying);

    let checker = checker(store.clone(), vec![ScriptedProbe::healthy(9)]);
    let outcome = checker.health_check(&server.id).await.unwrap();
    assert_eq!(outcome, CheckOutcome::Skipped);

    let after_check = store.get_server(&server.id).await.unwrap().unwrap();
    assert_eq!(after_check, during);
    let events = store.list_events(Some(&server.id)).await.unwrap();
    assert!(events.iter().all(|e| e.event_type != EventType::HealthCheck));

    let result = deployment.await.unwrap();
    assert!(result.success, "{:?}", result.error);
    let stored = store.get_server(&server.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ServerStatus::Active);
    assert_eq!(stored.request_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_worker_ticks_until_shutdown() {
    let store = Arc::new(MemoryStore::new());
    let server = server_with_status(&store, ServerStatus::Active).await;
    let checker = Arc::new(checker(
        store.clone(),
        vec![
            ScriptedProbe::healthy(2),
            ScriptedProbe::degraded(),
            ScriptedProbe::healthy(3),
        ],
    ));
    let options = Options {
        interval: Duration::from_secs(60),
        initial_delay: Duration::from_secs(5),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let worker = tokio::spawn({
        let checker = checker.clone();
        async move {
            run(
                &options,
                checker.as_ref(),
                tokio::time::sleep,
                Box::pin(async move {
                    let _ = shutdown_rx.await;
                }),
            )
            .await;
        }
    });

    // first round once the initial delay is over
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(store.list_events(Some(&server.id)).await.unwrap().len(), 1);

    // two more rounds, 60 and 120 seconds later
    tokio::time::sleep(Duration::from_secs(2 * 60)).await;
    let _ = shutdown_tx.send(());
    worker.await.unwrap();

    let after = store.get_server(&server.id).await.unwrap().unwrap();
    assert_eq!(after.request_count, 45);

    let events = store.list_events(Some(&server.id)).await.unwrap();
    assert_eq!(events.len(), 3);
    assert!(events[1].is(EventType::HealthCheck, EventStatus::Warning));
}

#[tokio::test(start_paused = true)]
async fn test_worker_stops_during_initial_delay() {
    let store = Arc::new(MemoryStore::new());
    let _server = server_with_status(&store, ServerStatus::Active).await;
    let checker = checker(store.clone(), vec![]);

    run(
        &Options::default(),
        &checker,
        tokio::time::sleep,
        Box::pin(async {}),
    )
    .await;

    assert!(store.list_events(None).await.unwrap().is_empty());
}
