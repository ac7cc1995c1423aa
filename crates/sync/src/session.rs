//! The session task.
//!
//! One tokio task per project room. It owns the channel and the connection
//! machine, and talks to the editor owner over two unbounded channels:
//! [`SyncHandle`] in, [`SessionEvent`] out. Nothing here touches the
//! document.

use std::pin::pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use splice_common::clock::Throttle;
use splice_common::config::SyncConfig;
use splice_model::Millis;

use crate::connection::{ConnectionMachine, ConnectionState};
use crate::protocol::{self, ClientMessage, ServerMessage};
use crate::transport::{Channel, Connector};

/// What the session reports to the editor owner.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged {
        state: ConnectionState,
        /// Set when the session stopped retrying.
        gave_up: bool,
    },
    Message(ServerMessage),
}

#[derive(Debug)]
enum SessionCommand {
    Send(ClientMessage),
    Cursor(Millis),
    Disconnect,
}

/// Cheap, cloneable sender into a running session.
///
/// Every method is fire-and-forget. Frames queued while the channel is down
/// are dropped, not replayed after reconnect.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    commands: Option<mpsc::UnboundedSender<SessionCommand>>,
}

impl SyncHandle {
    /// A handle with no session behind it. Everything sent is discarded.
    pub fn detached() -> Self {
        Self { commands: None }
    }

    pub fn is_attached(&self) -> bool {
        self.commands
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    pub fn send(&self, message: ClientMessage) -> bool {
        self.command(SessionCommand::Send(message))
    }

    /// Playhead position. Rate limited by the session.
    pub fn cursor(&self, time: Millis) -> bool {
        self.command(SessionCommand::Cursor(time))
    }

    pub fn disconnect(&self) {
        self.command(SessionCommand::Disconnect);
    }

    fn command(&self, command: SessionCommand) -> bool {
        match &self.commands {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }
}

pub struct SyncSession;

impl SyncSession {
    /// Start a session task. It connects immediately.
    pub fn spawn(
        connector: Arc<dyn Connector>,
        config: SyncConfig,
    ) -> (
        SyncHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
        JoinHandle<()>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(connector, config, command_rx, event_tx));
        (
            SyncHandle {
                commands: Some(command_tx),
            },
            event_rx,
            task,
        )
    }
}

enum ChannelEnd {
    /// Closed locally on request.
    Disconnected,
    /// Remote close or transport failure.
    Lost,
}

struct Driver {
    config: SyncConfig,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    machine: ConnectionMachine,
    cursor_throttle: Throttle,
}

async fn run(
    connector: Arc<dyn Connector>,
    config: SyncConfig,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let mut driver = Driver {
        machine: ConnectionMachine::from_config(&config),
        cursor_throttle: Throttle::new(config.cursor_throttle()),
        config,
        commands,
        events,
    };
    driver.run(connector.as_ref()).await;
    tracing::debug!("Sync session finished");
}

impl Driver {
    async fn run(&mut self, connector: &dyn Connector) {
        loop {
            self.machine.connect();
            self.emit_state();

            match connector.connect().await {
                Ok(mut channel) => {
                    self.machine.opened();
                    self.cursor_throttle.reset();
                    self.emit_state();
                    tracing::info!(url = %self.config.url, "Sync channel open");

                    if let ChannelEnd::Disconnected = self.drive(channel.as_mut()).await {
                        self.machine.disconnect();
                        self.machine.closed();
                        self.emit_state();
                        return;
                    }
                    tracing::warn!("Sync channel lost");
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt = self.machine.attempts(), "Sync connect failed");
                }
            }

            let Some(delay) = self.machine.closed_unexpectedly() else {
                self.emit_state();
                return;
            };
            self.emit_state();
            tracing::info!(?delay, attempt = self.machine.attempts(), "Reconnecting");

            if !self.wait_for_retry(delay).await {
                self.machine.disconnect();
                self.emit_state();
                return;
            }
        }
    }

    /// Sleep before a retry. Returns `false` if a disconnect arrived first.
    async fn wait_for_retry(&mut self, delay: std::time::Duration) -> bool {
        let mut sleep = pin!(tokio::time::sleep(delay));
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Disconnect) | None => return false,
                    Some(other) => tracing::debug!(?other, "Dropping frame while offline"),
                },
            }
        }
    }

    /// Pump one open channel until it ends.
    async fn drive(&mut self, channel: &mut dyn Channel) -> ChannelEnd {
        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval());
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if !send_frame(channel, &ClientMessage::Heartbeat).await {
                        return ChannelEnd::Lost;
                    }
                }
                frame = channel.recv() => match frame {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Sync receive failed");
                        return ChannelEnd::Lost;
                    }
                    None => return ChannelEnd::Lost,
                },
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Send(message)) => {
                        if !send_frame(channel, &message).await {
                            return ChannelEnd::Lost;
                        }
                    }
                    Some(SessionCommand::Cursor(time)) => {
                        let now = tokio::time::Instant::now().into_std();
                        if self.cursor_throttle.should_fire(now) {
                            let message = ClientMessage::Cursor { current_time: time };
                            if !send_frame(channel, &message).await {
                                return ChannelEnd::Lost;
                            }
                        }
                    }
                    Some(SessionCommand::Disconnect) | None => {
                        channel.close().await;
                        return ChannelEnd::Disconnected;
                    }
                },
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match protocol::decode(text) {
            Ok(message) => {
                tracing::trace!(?message, "Inbound frame");
                let _ = self.events.send(SessionEvent::Message(message));
            }
            Err(e) => tracing::warn!(error = %e, "Dropping inbound frame"),
        }
    }

    fn emit_state(&self) {
        let _ = self.events.send(SessionEvent::StateChanged {
            state: self.machine.state(),
            gave_up: self.machine.gave_up(),
        });
    }
}

/// Returns `false` when the channel is gone. Encoding failures only drop
/// the frame.
async fn send_frame(channel: &mut dyn Channel, message: &ClientMessage) -> bool {
    let frame = match message.encode() {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, kind = message.kind(), "Dropping unencodable frame");
            return true;
        }
    };
    match channel.send(frame).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, kind = message.kind(), "Sync send failed");
            false
        }
    }
}
