//! Session controller against an in-process relay

mod common;

use std::time::Duration;

use common::{next_event, test_config, wait_for, FakeRelay, RelayConn};
use ovms_client::{
    Command, Message, ProgressEvent, SessionController, SessionError, SessionState,
};
use pretty_assertions::assert_eq;
use tokio::sync::broadcast::Receiver;

async fn connected(relay: &FakeRelay) -> (SessionController, RelayConn, Receiver<ProgressEvent>) {
    let controller = SessionController::new(test_config());
    let mut events = controller.subscribe();
    controller.start(relay.credentials()).await;

    let conn = relay.accept().await;
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::ConnectBegin("127.0.0.1".into())
    );
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::ConnectComplete("127.0.0.1".into())
    );
    assert_eq!(controller.state(), SessionState::Connected);
    (controller, conn, events)
}

#[tokio::test]
async fn test_status_update_is_applied() {
    let relay = FakeRelay::bind().await;
    let (controller, mut conn, mut events) = connected(&relay).await;
    let mut snapshots = controller.watch_telemetry();

    conn.send("MP-0 S80,K,230,16,charging,standard,250,230").await;

    match next_event(&mut events).await {
        ProgressEvent::Update(msg) => {
            assert_eq!(msg.code, 'S');
            assert_eq!(msg.params.len(), 8);
        }
        other => panic!("unexpected event {:?}", other),
    }
    snapshots.changed().await.unwrap();

    let record = controller.telemetry();
    assert_eq!(record.status.soc, 80.0);
    assert_eq!(record.status.charge_state, "charging");
    assert_eq!(record.status.range_estimated, 230.0);
    // Higher tiers were not covered
    assert_eq!(record.status.charge_state_code, 0);

    controller.stop().await;
}

#[tokio::test]
async fn test_reconnect_after_server_drop() {
    let relay = FakeRelay::bind().await;
    let (controller, mut conn, mut events) = connected(&relay).await;

    conn.send("MP-0 Z5").await;
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::Update(Message::new('Z', vec!["5".into()]))
    );
    assert_eq!(controller.telemetry().server.cars_connected, 5);

    drop(conn);

    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::Disconnect("127.0.0.1".into())
    );
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::ConnectBegin("127.0.0.1".into())
    );
    assert_eq!(controller.telemetry().server.cars_connected, 0);
    assert!(!controller.telemetry().server.paranoid);

    let _conn = relay.accept().await;
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::ConnectComplete("127.0.0.1".into())
    );

    controller.stop().await;
}

#[tokio::test]
async fn test_unsupported_command_is_not_sent() {
    let relay = FakeRelay::bind().await;
    let (controller, mut conn, mut events) = connected(&relay).await;

    assert!(matches!(
        controller.transmit_command(Command::Shell, "stat").await,
        Err(SessionError::CommandNotSupported(7))
    ));

    conn.send("MP-0 VC7,C20-22").await;
    wait_for(&mut events, |e| matches!(e, ProgressEvent::Update(m) if m.code == 'V')).await;

    controller
        .transmit_command(Command::Shell, "stat")
        .await
        .unwrap();
    controller.transmit_command(Command::Lock, "1234").await.unwrap();

    // Nothing was written for the rejected attempt
    assert_eq!(conn.recv().await.as_deref(), Some("MP-0 C7,stat"));
    assert_eq!(conn.recv().await.as_deref(), Some("MP-0 C20,1234"));

    controller.stop().await;
}

#[tokio::test]
async fn test_command_response_and_push() {
    let relay = FakeRelay::bind().await;
    let (controller, mut conn, mut events) = connected(&relay).await;

    conn.send("MP-0 c7,0,SOC 80%\rRange 250").await;
    conn.send("MP-0 PAVehicle alarm").await;

    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::Command("7,0,SOC 80%\rRange 250".into())
    );
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::Push("AVehicle alarm".into())
    );

    controller.stop().await;
}

#[tokio::test]
async fn test_protocol_violation_and_bad_field_keep_session() {
    let relay = FakeRelay::bind().await;
    let (controller, mut conn, mut events) = connected(&relay).await;

    conn.send("HELLO").await;
    conn.send("MP-0 Zmany").await;
    conn.send("MP-0 Z2").await;

    match next_event(&mut events).await {
        ProgressEvent::Error(text) => assert!(text.starts_with("Z MSG Invalid"), "{}", text),
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::Update(Message::new('Z', vec!["2".into()]))
    );
    assert_eq!(controller.state(), SessionState::Connected);

    controller.stop().await;
}

#[tokio::test]
async fn test_paranoid_mode() {
    let relay = FakeRelay::bind().await;
    let (controller, mut conn, mut events) = connected(&relay).await;

    conn.send("MP-0 ETparanoidtoken").await;
    let payload = RelayConn::paranoid_payload("paranoidtoken", "52.5,13.4");
    conn.send(&format!("MP-0 EML{}", payload)).await;

    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::Update(Message::new('E', vec!["Tparanoidtoken".into()]))
    );
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::Update(Message::new('L', vec!["52.5".into(), "13.4".into()]))
    );
    let record = controller.telemetry();
    assert!(record.server.paranoid);
    assert_eq!(record.location.latitude, 52.5);
    assert_eq!(record.location.longitude, 13.4);

    controller.stop().await;
}

#[tokio::test]
async fn test_stop_closes_connection() {
    let relay = FakeRelay::bind().await;
    let (controller, mut conn, mut events) = connected(&relay).await;

    controller.stop().await;
    assert_eq!(controller.state(), SessionState::Idle);
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::Disconnect("127.0.0.1".into())
    );
    assert_eq!(conn.recv().await, None);
    assert!(matches!(
        controller.ping().await,
        Err(SessionError::NotConnected)
    ));
}

#[tokio::test]
async fn test_restart_replaces_running_session() {
    let relay = FakeRelay::bind().await;
    let (controller, mut first, mut events) = connected(&relay).await;

    controller.start(relay.credentials()).await;
    assert_eq!(first.recv().await, None);

    let _second = relay.accept().await;
    wait_for(&mut events, |e| matches!(e, ProgressEvent::ConnectComplete(_))).await;
    assert_eq!(controller.state(), SessionState::Connected);

    controller.stop().await;
}

#[tokio::test]
async fn test_bad_server_digest_retries() {
    let relay = FakeRelay::bind().await;
    let controller = SessionController::new(common::test_config());
    let mut events = controller.subscribe();
    controller.start(relay.credentials()).await;

    relay.accept_with_bad_digest().await;
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::ConnectBegin("127.0.0.1".into())
    );
    match next_event(&mut events).await {
        ProgressEvent::Error(text) => assert!(text.contains("digest"), "{}", text),
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::Disconnect("127.0.0.1".into())
    );
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::ConnectBegin("127.0.0.1".into())
    );

    let _conn = relay.accept().await;
    assert_eq!(
        next_event(&mut events).await,
        ProgressEvent::ConnectComplete("127.0.0.1".into())
    );

    controller.stop().await;
}

#[tokio::test]
async fn test_keepalive_ping() {
    let relay = FakeRelay::bind().await;
    let mut config = test_config();
    config.ping_interval_secs = 1;
    let controller = SessionController::new(config);
    controller.start(relay.credentials()).await;
    let mut conn = relay.accept().await;

    let line = tokio::time::timeout(Duration::from_secs(4), conn.recv())
        .await
        .unwrap();
    assert_eq!(line.as_deref(), Some("MP-0 A"));

    controller.stop().await;
}
