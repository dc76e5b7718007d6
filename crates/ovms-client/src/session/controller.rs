//! Session controller: one background loop per started session

use std::sync::Arc;
use std::time::Duration;

use ovms_core::{Message, TelemetryRecord};
use parking_lot::RwLock;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{ProgressEvent, SessionState};
use crate::codec::ProtocolCodec;
use crate::config::{Credentials, SessionConfig};
use crate::error::SessionError;
use crate::transport::{LineWriter, TransportError, TransportSession};

/// State shared between the controller handle and its loop task
struct Shared {
    config: SessionConfig,
    state: RwLock<SessionState>,
    writer: RwLock<Option<Arc<LineWriter>>>,
    events: broadcast::Sender<ProgressEvent>,
    telemetry: watch::Sender<TelemetryRecord>,
}

impl Shared {
    fn emit(&self, event: ProgressEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }

    fn reset_server(&self) {
        self.telemetry.send_modify(|record| record.reset_server());
    }

    /// Decode one line and publish the result
    fn handle_line(&self, codec: &mut ProtocolCodec, line: &str) {
        let was_paranoid = codec.is_paranoid();
        let decoded = codec.decode(line);
        if !was_paranoid && codec.is_paranoid() {
            self.telemetry.send_modify(|record| record.server.paranoid = true);
        }

        match decoded {
            Ok(msg) => self.dispatch(msg),
            Err(e) => warn!(error = %e, "Dropping inbound line"),
        }
    }

    fn dispatch(&self, msg: Message) {
        let mut result = Ok(());
        self.telemetry.send_modify(|record| result = record.apply(&msg));
        match result {
            Ok(()) => self.emit(ProgressEvent::for_message(&msg)),
            Err(e) => {
                error!(code = %msg.code, error = %e, "Failed to decode message");
                self.emit(ProgressEvent::Error(e.to_string()));
            }
        }
    }
}

struct RunningLoop {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Aborts the wrapped task when dropped
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum Exit {
    Stopped,
    Retry,
}

/// Owns the connect / receive / reconnect loop for one vehicle
///
/// Construct one per vehicle session. Observers subscribe to progress
/// events and telemetry snapshots; both survive reconnects.
pub struct SessionController {
    shared: Arc<Shared>,
    gate: Mutex<Option<RunningLoop>>,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (telemetry, _) = watch::channel(TelemetryRecord::default());
        Self {
            shared: Arc::new(Shared {
                config,
                state: RwLock::new(SessionState::Idle),
                writer: RwLock::new(None),
                events,
                telemetry,
            }),
            gate: Mutex::new(None),
        }
    }

    /// Start the session loop, stopping any running one first
    ///
    /// Returns once the loop is spawned; progress is reported as events.
    pub async fn start(&self, credentials: Credentials) {
        let mut running = self.gate.lock().await;
        if let Some(previous) = running.take() {
            self.shutdown(previous).await;
        }

        self.shared.reset_server();
        self.shared.set_state(SessionState::Connecting);

        let (stop_tx, stop_rx) = watch::channel(false);
        let shared = self.shared.clone();
        let handle = tokio::spawn(run_loop(shared, credentials, stop_rx));
        *running = Some(RunningLoop { stop_tx, handle });
    }

    /// Stop the session loop and wait until it has fully unwound
    pub async fn stop(&self) {
        let mut running = self.gate.lock().await;
        if let Some(previous) = running.take() {
            self.shutdown(previous).await;
        }
        self.shared.set_state(SessionState::Idle);
    }

    async fn shutdown(&self, running: RunningLoop) {
        let _ = running.stop_tx.send(true);
        if let Err(e) = running.handle.await {
            warn!(error = %e, "Session loop ended abnormally");
        }
        self.shared.set_state(SessionState::Idle);
        info!("Session stopped");
    }

    /// Send a command to the vehicle
    ///
    /// Codes the vehicle has not announced in its capability table are
    /// rejected without touching the connection.
    pub async fn transmit_command(
        &self,
        code: impl Into<u8>,
        text: &str,
    ) -> Result<(), SessionError> {
        let code = code.into();
        if text.contains(['\r', '\n']) {
            return Err(SessionError::InvalidCommandText);
        }
        if !self.shared.telemetry.borrow().supports(code) {
            return Err(SessionError::CommandNotSupported(code));
        }

        let line = ProtocolCodec::encode(&Message::command(code, text));
        self.transmit(&line).await
    }

    /// Send a keep-alive ping outside the regular schedule
    pub async fn ping(&self) -> Result<(), SessionError> {
        self.transmit(&ProtocolCodec::encode(&Message::bare('A'))).await
    }

    async fn transmit(&self, line: &str) -> Result<(), SessionError> {
        let writer = self
            .shared
            .writer
            .read()
            .clone()
            .ok_or(SessionError::NotConnected)?;
        writer.transmit_line(line).await?;
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.shared.events.subscribe()
    }

    /// Current telemetry snapshot
    pub fn telemetry(&self) -> TelemetryRecord {
        self.shared.telemetry.borrow().clone()
    }

    /// Receiver notified after every applied message
    pub fn watch_telemetry(&self) -> watch::Receiver<TelemetryRecord> {
        self.shared.telemetry.subscribe()
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(running) = self.gate.get_mut().take() {
            running.handle.abort();
        }
    }
}

/// Resolves once a stop has been requested or the controller is gone
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

async fn run_loop(shared: Arc<Shared>, credentials: Credentials, mut stop: watch::Receiver<bool>) {
    let host = credentials.host.clone();
    let mut failures: u32 = 0;

    loop {
        shared.reset_server();
        shared.set_state(SessionState::Connecting);
        shared.emit(ProgressEvent::ConnectBegin(host.clone()));

        let attempt = tokio::select! {
            result = TransportSession::connect(&credentials, &shared.config) => Some(result),
            _ = stop_requested(&mut stop) => None,
        };

        let exit = match attempt {
            None => Exit::Stopped,
            Some(Ok(transport)) => {
                failures = 0;
                run_connected(&shared, &credentials, transport, &mut stop).await
            }
            Some(Err(e)) => {
                failures = failures.saturating_add(1);
                warn!(%host, failures, error = %e, "Connection attempt failed");
                shared.emit(ProgressEvent::Error(e.to_string()));
                shared.emit(ProgressEvent::Disconnect(host.clone()));

                let delay = shared.config.reconnect.delay(failures);
                debug!(?delay, "Waiting before reconnect");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => Exit::Retry,
                    _ = stop_requested(&mut stop) => Exit::Stopped,
                }
            }
        };

        if matches!(exit, Exit::Stopped) {
            break;
        }
    }

    shared.set_state(SessionState::Idle);
}

/// Receive until the connection drops or a stop is requested, then tear down
async fn run_connected(
    shared: &Shared,
    credentials: &Credentials,
    mut transport: TransportSession,
    stop: &mut watch::Receiver<bool>,
) -> Exit {
    let host = transport.host().to_string();
    let writer = transport.writer();
    *shared.writer.write() = Some(writer.clone());
    shared.set_state(SessionState::Connected);
    info!(%host, "Connected to relay server");

    let ping = spawn_ping(writer, shared.config.ping_interval());
    shared.emit(ProgressEvent::ConnectComplete(host.clone()));

    let mut codec = ProtocolCodec::new(credentials.server_password.as_str());
    let exit = loop {
        let received = tokio::select! {
            line = transport.receive_line() => Some(line),
            _ = stop_requested(stop) => None,
        };
        match received {
            None => break Exit::Stopped,
            Some(Ok(line)) => shared.handle_line(&mut codec, &line),
            Some(Err(TransportError::ConnectionClosed)) => {
                info!(%host, "Connection closed by server");
                break Exit::Retry;
            }
            Some(Err(e)) => {
                warn!(%host, error = %e, "Connection lost");
                break Exit::Retry;
            }
        }
    };

    drop(ping);
    *shared.writer.write() = None;
    transport.disconnect().await;
    shared.reset_server();
    if matches!(exit, Exit::Retry) {
        shared.set_state(SessionState::Connecting);
    }
    shared.emit(ProgressEvent::Disconnect(host));
    exit
}

fn spawn_ping(writer: Arc<LineWriter>, interval: Duration) -> Option<TaskGuard> {
    if interval.is_zero() {
        return None;
    }
    let line = ProtocolCodec::encode(&Message::bare('A'));
    let handle = tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.tick().await; // skip first

        loop {
            timer.tick().await;
            debug!("Sending ping");
            if let Err(e) = writer.transmit_line(&line).await {
                error!(error = %e, "Ping failed");
                break;
            }
        }
    });
    Some(TaskGuard(handle))
}
