//! Drivelink - Link Session Manager
//!
//! Owns the lifecycle of one logical link to the device: opening the
//! transport, reading the greeting, negotiating V1/V2, pumping commands
//! out and acknowledgements in, and tearing everything down exactly once
//! on any session-ending condition.
//!
//! # State machine
//!
//! ```text
//! Idle ──connect──▶ Connecting ──open ok──▶ AwaitingGreeting
//!                       │                        │
//!                   open failed             greeting line
//!                       │                        │
//!                       │                        ▼
//!                       │                 Active(V1 | V2)
//!                       │                        │
//!                       │    fatal NAK / EOF / write failure / disconnect
//!                       │                        │
//!                       ▼                        ▼
//!                     Closed ◀────────────────────
//! ```
//!
//! `disconnect` is legal from any state; from a live state it lands in
//! `Closed`, otherwise it is a silent no-op. `connect` is accepted from
//! `Idle` and `Closed` only.
//!
//! # Concurrency
//!
//! Each session runs two tasks: a reader (greeting + acknowledgement
//! loop) and a single writer. Callers never touch the stream: [`send`]
//! publishes the latest drive pair into a [`watch`] channel and the
//! writer drains it, so a slow link coalesces intermediate values
//! instead of queueing them. The writer assigns sequence numbers at
//! encode time, which keeps them strictly increasing by one per written
//! line no matter how many published values were coalesced.
//!
//! A session epoch counter guards teardown: tasks from a previous
//! session that wake up late compare their epoch against the current one
//! and touch nothing.
//!
//! [`send`]: LinkSession::send

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};

use crate::core::{KEEPALIVE_INTERVAL, LinkError, Transport};
use crate::protocol::{
    AckReply, encode_ping, encode_v1, encode_v2, parse_ack_or_nak, parse_server_hello,
};

/// Negotiated protocol version for an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// Plaintext commands, no acknowledgements.
    V1,
    /// Authenticated commands with per-session nonce and HMAC tags.
    V2,
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Never connected; `connect` is accepted.
    Idle,
    /// Transport open in flight.
    Connecting,
    /// Transport open, waiting for the device's first line.
    AwaitingGreeting,
    /// Session established at the given version.
    Active(ProtocolVersion),
    /// Session over, by any cause (fatal NAK, EOF, write failure, open
    /// failure, explicit disconnect); `connect` is accepted.
    Closed,
}

/// Events published by the session and controller layers.
///
/// Delivered over an unbounded channel so producers never block; the
/// consumer is expected to be a UI loop that drains promptly.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Human-readable status line for display.
    Status(String),
    /// Session established.
    Connected {
        /// Version negotiated from the greeting.
        version: ProtocolVersion,
    },
    /// Session ended, by any cause.
    Disconnected,
    /// Latest drive pair pushed toward the device, for display.
    PowerReadout {
        /// Left track power in [-1, 1].
        left: f32,
        /// Right track power in [-1, 1].
        right: f32,
    },
}

/// Session parameters.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Shared secret for V2 authentication tags.
    pub secret: String,
    /// Idle interval after which the writer emits a PING2 (V2 only).
    pub keepalive: Duration,
}

impl LinkConfig {
    /// Config with the default keepalive interval.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            keepalive: KEEPALIVE_INTERVAL,
        }
    }
}

/// State shared between the session handle and its tasks.
struct Shared {
    state: Mutex<LinkState>,
    nonce: Mutex<Option<String>>,
    epoch: AtomicU64,
    command_tx: Mutex<Option<watch::Sender<Option<(f32, f32)>>>>,
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            state: Mutex::new(LinkState::Idle),
            nonce: Mutex::new(None),
            epoch: AtomicU64::new(0),
            command_tx: Mutex::new(None),
            shutdown_tx: Mutex::new(None),
        }
    }
}

/// Lock helper that shrugs off poisoning: a panicked task holding one
/// of these mutexes leaves only plain data behind, never a broken
/// invariant the next holder could trip over.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn state(&self) -> LinkState {
        *lock(&self.state)
    }

    fn set_state(&self, next: LinkState) {
        *lock(&self.state) = next;
    }

    /// End the session started at `epoch` exactly once.
    ///
    /// No-op if a newer session has started or this one already ended;
    /// otherwise moves to `final_state`, drops the channels (waking both
    /// tasks), clears the nonce, and emits [`LinkEvent::Disconnected`].
    fn teardown(
        &self,
        epoch: u64,
        final_state: LinkState,
        events: &mpsc::UnboundedSender<LinkEvent>,
    ) {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        {
            let mut state = lock(&self.state);
            if matches!(*state, LinkState::Idle | LinkState::Closed) {
                return;
            }
            *state = final_state;
        }
        lock(&self.nonce).take();
        lock(&self.command_tx).take();
        lock(&self.shutdown_tx).take();
        let _ = events.send(LinkEvent::Disconnected);
    }
}

/// Handle to the link session manager.
///
/// Cheap to share behind an `Arc` if multiple components need it; all
/// methods take `&self`.
pub struct LinkSession<T: Transport> {
    transport: Arc<T>,
    config: LinkConfig,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<LinkEvent>,
}

impl<T: Transport> LinkSession<T> {
    /// Create a session manager and the event stream it publishes to.
    pub fn new(transport: T, config: LinkConfig) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        (
            Self {
                transport: Arc::new(transport),
                config,
                shared,
                events,
            },
            rx,
        )
    }

    /// Current session state.
    pub fn state(&self) -> LinkState {
        self.shared.state()
    }

    /// A clone of the event sender, for co-publishers such as the
    /// drive controller.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<LinkEvent> {
        self.events.clone()
    }

    /// Start a connection attempt to `target`.
    ///
    /// Returns immediately after spawning the session tasks; progress is
    /// reported through the event stream. Must be called within a tokio
    /// runtime. Fails with [`LinkError::AlreadyConnecting`] unless the
    /// state is `Idle` or `Closed`.
    pub fn connect(&self, target: &str) -> Result<(), LinkError> {
        {
            let mut state = lock(&self.shared.state);
            if !matches!(*state, LinkState::Idle | LinkState::Closed) {
                return Err(LinkError::AlreadyConnecting);
            }
            *state = LinkState::Connecting;
        }
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let (command_tx, command_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        *lock(&self.shared.command_tx) = Some(command_tx);
        *lock(&self.shared.shutdown_tx) = Some(shutdown_tx);

        tracing::debug!(%target, epoch, "starting connection attempt");
        let _ = self
            .events
            .send(LinkEvent::Status(format!("Connecting to {target}")));

        tokio::spawn(run_session(
            Arc::clone(&self.transport),
            target.to_string(),
            self.config.clone(),
            Arc::clone(&self.shared),
            self.events.clone(),
            command_rx,
            shutdown_rx,
            epoch,
        ));
        Ok(())
    }

    /// Publish a drive pair toward the device.
    ///
    /// Latest-wins: if the writer is behind, intermediate values are
    /// coalesced and only the most recent pair reaches the wire. Fails
    /// with [`LinkError::NotConnected`] unless the session is active.
    pub fn send(&self, left: f32, right: f32) -> Result<(), LinkError> {
        if !matches!(self.shared.state(), LinkState::Active(_)) {
            return Err(LinkError::NotConnected);
        }
        match lock(&self.shared.command_tx).as_ref() {
            Some(tx) if tx.send(Some((left, right))).is_ok() => Ok(()),
            _ => Err(LinkError::NotConnected),
        }
    }

    /// Publish an all-stop pair.
    pub fn send_stop(&self) -> Result<(), LinkError> {
        self.send(0.0, 0.0)
    }

    /// Tear down any session or connection attempt.
    ///
    /// Idempotent and safe to call in any state; when nothing is live it
    /// emits no events and leaves the state untouched.
    pub fn disconnect(&self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        let was_live = {
            let mut state = lock(&self.shared.state);
            let live = !matches!(*state, LinkState::Idle | LinkState::Closed);
            if live {
                *state = LinkState::Closed;
            }
            live
        };
        lock(&self.shared.nonce).take();
        lock(&self.shared.command_tx).take();
        lock(&self.shared.shutdown_tx).take();
        if was_live {
            tracing::debug!("session disconnected by caller");
            let _ = self.events.send(LinkEvent::Status("Disconnected".into()));
            let _ = self.events.send(LinkEvent::Disconnected);
        }
    }
}

/// End the session started at `epoch` because of `err`, with the
/// status line the cause maps to.
fn session_failed(
    shared: &Shared,
    epoch: u64,
    events: &mpsc::UnboundedSender<LinkEvent>,
    err: LinkError,
    final_state: LinkState,
) {
    tracing::warn!(error = %err, "session ended");
    let status = match &err {
        LinkError::TransportOpen(msg) => format!("Connection failed: {msg}"),
        LinkError::Authentication { .. } => "Authentication error, disconnecting".to_string(),
        _ => "Connection lost".to_string(),
    };
    let _ = events.send(LinkEvent::Status(status));
    shared.teardown(epoch, final_state, events);
}

/// Milliseconds since the Unix epoch, for V2 timestamps.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// One session from transport open to teardown. Spawned by `connect`.
#[allow(clippy::too_many_arguments)]
async fn run_session<T: Transport>(
    transport: Arc<T>,
    target: String,
    config: LinkConfig,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<LinkEvent>,
    command_rx: watch::Receiver<Option<(f32, f32)>>,
    mut shutdown_rx: watch::Receiver<bool>,
    epoch: u64,
) {
    let (mut reader, writer) = match transport.open(&target).await {
        Ok(halves) => halves,
        Err(e) => {
            session_failed(
                &shared,
                epoch,
                &events,
                LinkError::TransportOpen(e.to_string()),
                LinkState::Closed,
            );
            return;
        }
    };
    transport.cancel_discovery();

    if shared.epoch.load(Ordering::SeqCst) != epoch {
        // Caller disconnected while the open was in flight.
        return;
    }
    shared.set_state(LinkState::AwaitingGreeting);

    let mut line = String::new();
    let greeting = tokio::select! {
        res = reader.read_line(&mut line) => res,
        _ = shutdown_rx.changed() => return,
    };
    match greeting {
        Ok(0) => {
            let _ = events.send(LinkEvent::Status("Disconnected".into()));
            shared.teardown(epoch, LinkState::Closed, &events);
            return;
        }
        Ok(_) => {}
        Err(e) => {
            session_failed(&shared, epoch, &events, LinkError::Io(e), LinkState::Closed);
            return;
        }
    }

    let hello = parse_server_hello(&line);
    // V1 devices send no greeting; a first line that is not a valid V2
    // greeting was just device chatter and has been consumed.
    let auth = if hello.is_authenticated() {
        hello.nonce_hex.clone()
    } else {
        None
    };
    if shared.epoch.load(Ordering::SeqCst) != epoch {
        // Caller disconnected while the greeting was in flight.
        return;
    }
    let version = if auth.is_some() {
        *lock(&shared.nonce) = auth.clone();
        ProtocolVersion::V2
    } else {
        ProtocolVersion::V1
    };
    shared.set_state(LinkState::Active(version));
    tracing::info!(?version, "session established");
    let _ = events.send(LinkEvent::Status(
        match version {
            ProtocolVersion::V2 => "Connected (V2)",
            ProtocolVersion::V1 => "Connected (V1)",
        }
        .to_string(),
    ));
    let _ = events.send(LinkEvent::Connected { version });

    tokio::spawn(run_writer(
        writer,
        auth,
        config,
        Arc::clone(&shared),
        events.clone(),
        command_rx,
        shutdown_rx.clone(),
        epoch,
    ));

    // Acknowledgement loop (V2) / drain loop (V1).
    loop {
        line.clear();
        let res = tokio::select! {
            res = reader.read_line(&mut line) => res,
            _ = shutdown_rx.changed() => break,
        };
        match res {
            Ok(0) => {
                let _ = events.send(LinkEvent::Status("Disconnected".into()));
                shared.teardown(epoch, LinkState::Closed, &events);
                break;
            }
            Ok(_) => {
                if version == ProtocolVersion::V1 {
                    continue;
                }
                match parse_ack_or_nak(&line) {
                    Some(AckReply::Ack { seq }) => tracing::trace!(seq, "command acknowledged"),
                    Some(AckReply::Nak { seq, code }) if code.is_fatal() => {
                        tracing::warn!(seq, %code, "fatal rejection, closing session");
                        session_failed(
                            &shared,
                            epoch,
                            &events,
                            LinkError::Authentication {
                                code: code.to_string(),
                            },
                            LinkState::Closed,
                        );
                        break;
                    }
                    Some(AckReply::Nak { seq, code }) => {
                        tracing::warn!(seq, %code, "command rejected, ignoring");
                    }
                    None => tracing::trace!(line = line.trim(), "ignoring unrecognized line"),
                }
            }
            Err(e) => {
                session_failed(&shared, epoch, &events, LinkError::Io(e), LinkState::Closed);
                break;
            }
        }
    }
}

/// Single writer for one session: drains the latest published drive
/// pair, injects keepalives on idle, and assigns sequence numbers at
/// encode time starting from 1.
///
/// `auth` is the session nonce when the session is V2; `None` selects
/// the plaintext V1 encoding and disables keepalives.
#[allow(clippy::too_many_arguments)]
async fn run_writer<W: AsyncWrite + Unpin>(
    mut writer: W,
    auth: Option<String>,
    config: LinkConfig,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<LinkEvent>,
    mut command_rx: watch::Receiver<Option<(f32, f32)>>,
    mut shutdown_rx: watch::Receiver<bool>,
    epoch: u64,
) {
    let mut seq: u64 = 1;
    let mut last_write = tokio::time::Instant::now();
    // The keepalive arm is enabled only for authenticated sessions, so
    // the empty fallback nonce can never reach the wire.
    let keepalive_enabled = auth.is_some();
    let ping_nonce = auth.clone().unwrap_or_default();

    loop {
        let keepalive_at = last_write + config.keepalive;
        let line = tokio::select! {
            changed = command_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some((left, right)) = *command_rx.borrow_and_update() else {
                    continue;
                };
                match &auth {
                    Some(nonce) => encode_v2(left, right, seq, now_ms(), nonce, &config.secret),
                    None => encode_v1(left, right, seq),
                }
            }
            _ = tokio::time::sleep_until(keepalive_at), if keepalive_enabled => {
                encode_ping(seq, now_ms(), &ping_nonce, &config.secret)
            }
            _ = shutdown_rx.changed() => break,
        };

        let write = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        };
        match write.await {
            Ok(()) => {
                tracing::trace!(seq, "line written");
                seq += 1;
                last_write = tokio::time::Instant::now();
            }
            Err(e) => {
                session_failed(
                    &shared,
                    epoch,
                    &events,
                    LinkError::Write(e),
                    LinkState::Closed,
                );
                break;
            }
        }
    }
}
