//! The paired wallet session.
//!
//! One actor task owns the session and is the only writer of its state.
//! Connect, revoke, on-demand checks and the periodic liveness check all run
//! through the actor's command loop, so they are applied one at a time.
//! Everyone else reads a `watch` snapshot.
//!
//! Commands queue behind whatever network call the actor is awaiting. A
//! liveness check is cut off after one liveness interval and counts as
//! failed, so a `lease` never waits longer than that behind a slow check.
//! `connect` is bounded by the HTTP client's request timeout.

use super::events::{self, SessionEvent};
use crate::guard::{GuardApi, GuardError, Result, Session};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{interval, timeout, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Lifecycle of the single wallet session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected(Session),
    Revoking,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Connected(session) => Some(&session.address),
            _ => None,
        }
    }
}

/// The current session plus the token that stops work started under it
#[derive(Debug, Clone)]
pub struct SessionLease {
    pub session: Session,
    pub cancel: CancellationToken,
}

enum Command {
    Connect {
        code: String,
        reply: oneshot::Sender<Result<Session>>,
    },
    Revoke {
        reply: oneshot::Sender<Result<()>>,
    },
    Check {
        reply: oneshot::Sender<Result<()>>,
    },
    Lease {
        reply: oneshot::Sender<Result<SessionLease>>,
    },
}

/// Cloneable handle to the session actor
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Spawn the session actor. It runs until `shutdown` fires or every
    /// handle is dropped.
    pub fn spawn(
        api: Arc<dyn GuardApi>,
        liveness_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        let (commands, rx) = mpsc::channel(32);
        let (state_tx, state) = watch::channel(SessionState::Disconnected);
        let events = events::channel();

        let actor = SessionActor {
            api,
            state: state_tx,
            events: events.clone(),
            current: None,
            shutdown: shutdown.clone(),
            check_timeout: liveness_interval,
        };
        tokio::spawn(actor.run(rx, liveness_interval, shutdown));

        Self {
            commands,
            state,
            events,
        }
    }

    /// Pair with a wallet using a guard code
    pub async fn connect(&self, code: &str) -> Result<Session> {
        let code = code.trim();
        if code.is_empty() {
            return Err(GuardError::InputMissing);
        }
        let (reply, rx) = oneshot::channel();
        self.send(Command::Connect {
            code: code.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| actor_gone())?
    }

    /// Revoke the session server-side and tear it down locally
    pub async fn revoke(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Revoke { reply }).await?;
        rx.await.map_err(|_| actor_gone())?
    }

    /// Run a liveness check now; a failed check tears the session down
    pub async fn check(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Check { reply }).await?;
        rx.await.map_err(|_| actor_gone())?
    }

    /// Borrow the current session for one action
    pub async fn lease(&self) -> Result<SessionLease> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Lease { reply }).await?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).await.map_err(|_| actor_gone())
    }
}

fn actor_gone() -> GuardError {
    GuardError::ActionFailure {
        action: "session".to_string(),
        reason: "session manager has stopped".to_string(),
    }
}

struct SessionActor {
    api: Arc<dyn GuardApi>,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    current: Option<SessionLease>,
    shutdown: CancellationToken,
    check_timeout: Duration,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        liveness_interval: Duration,
        shutdown: CancellationToken,
    ) {
        let mut ticker = liveness_ticker(liveness_interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    let was_connected = self.current.is_some();
                    self.handle(command).await;
                    if !was_connected && self.current.is_some() {
                        ticker.reset();
                    }
                }
                _ = ticker.tick(), if self.current.is_some() => {
                    if let Err(e) = self.check().await {
                        tracing::debug!("Periodic session check failed: {}", e);
                    }
                }
            }
        }

        self.teardown("shutdown");
        tracing::debug!("Session actor stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Connect { code, reply } => {
                let _ = reply.send(self.connect(&code).await);
            }
            Command::Revoke { reply } => {
                let _ = reply.send(self.revoke().await);
            }
            Command::Check { reply } => {
                let _ = reply.send(self.check().await);
            }
            Command::Lease { reply } => {
                let lease = self.current.clone().ok_or(GuardError::NotConnected);
                let _ = reply.send(lease);
            }
        }
    }

    async fn connect(&mut self, code: &str) -> Result<Session> {
        if self.current.is_some() {
            return Err(GuardError::AlreadyConnected);
        }

        self.publish(SessionState::Connecting);
        match self.api.add_request(code).await {
            Ok(session) => {
                self.current = Some(SessionLease {
                    session: session.clone(),
                    cancel: self.shutdown.child_token(),
                });
                self.publish(SessionState::Connected(session.clone()));
                events::publish(
                    &self.events,
                    SessionEvent::Connected {
                        address: session.address.clone(),
                    },
                );
                tracing::info!("Connected to wallet {}", session.address);
                Ok(session)
            }
            Err(e) => {
                self.publish(SessionState::Disconnected);
                tracing::warn!("Failed to connect to Altura Guard: {}", e);
                Err(GuardError::ConnectFailure(e.to_string()))
            }
        }
    }

    async fn revoke(&mut self) -> Result<()> {
        let Some(lease) = self.current.take() else {
            return Err(GuardError::NotConnected);
        };

        self.publish(SessionState::Revoking);
        lease.cancel.cancel();

        let result = self.api.revoke_session(&lease.session.token).await;
        self.publish(SessionState::Disconnected);
        events::publish(
            &self.events,
            SessionEvent::Revoked {
                address: lease.session.address,
            },
        );

        result.map_err(|e| {
            tracing::warn!("Server-side revoke failed, session dropped locally: {}", e);
            GuardError::ActionFailure {
                action: "revoke".to_string(),
                reason: e.to_string(),
            }
        })
    }

    async fn check(&mut self) -> Result<()> {
        let token = match &self.current {
            Some(lease) => lease.session.token.clone(),
            None => return Err(GuardError::NotConnected),
        };

        let result = match timeout(self.check_timeout, self.api.check_session(&token)).await {
            Ok(result) => result,
            Err(_) => {
                self.teardown("liveness check timed out");
                return Err(GuardError::CheckFailed(format!(
                    "no answer within {:?}",
                    self.check_timeout
                )));
            }
        };

        match result {
            Ok(()) => Ok(()),
            Err(GuardError::Status {
                status: 401 | 403, ..
            }) => {
                self.teardown("session expired");
                Err(GuardError::SessionExpired)
            }
            Err(e) => {
                self.teardown("liveness check failed");
                Err(GuardError::CheckFailed(e.to_string()))
            }
        }
    }

    /// Drop the session locally without telling the server
    fn teardown(&mut self, reason: &str) {
        if let Some(lease) = self.current.take() {
            lease.cancel.cancel();
            self.publish(SessionState::Disconnected);
            tracing::warn!(
                "Session for {} cleared: {}",
                lease.session.address,
                reason
            );
            events::publish(
                &self.events,
                SessionEvent::Cleared {
                    address: lease.session.address,
                    reason: reason.to_string(),
                },
            );
        }
    }

    fn publish(&self, state: SessionState) {
        self.state.send_replace(state);
    }
}

fn liveness_ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
