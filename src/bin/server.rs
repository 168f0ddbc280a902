use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use maze_chase_server::config::ServerConfig;
use maze_chase_server::constants::CLIENT_QUEUE_CAPACITY;
use maze_chase_server::engine::GameEngine;
use maze_chase_server::levels::MazeRepository;
use maze_chase_server::server_protocol::{parse_client_message, ParsedClientMessage};
use maze_chase_server::types::{Audience, ClientId, Outbound, ServerEvent};
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Close code sent to a client evicted for falling behind.
const CLOSE_POLICY_VIOLATION: u16 = 1008;

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

/// Everything the handlers share. The mutex around it is the only writer
/// gate: each tick or client event runs to completion while holding it.
struct ServerState {
    clients: HashMap<ClientId, ClientContext>,
    engine: GameEngine,
}

impl ServerState {
    fn new(engine: GameEngine) -> Self {
        Self {
            clients: HashMap::new(),
            engine,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    let levels = MazeRepository::load_dir(&config.maze_dir, config.level_count)
        .with_context(|| format!("failed to load levels from {}", config.maze_dir.display()))?;
    let engine = GameEngine::new(levels);

    let exit = engine.state().exit_position;
    info!(
        levels = engine.level_count(),
        exit = %exit,
        cell = ?engine.state().maze.get(exit),
        "initial exit"
    );

    let state = Arc::new(Mutex::new(ServerState::new(engine)));
    start_periodic(state.clone(), config.drift_interval(), |engine| {
        engine.drift_exit();
    });
    start_periodic(state.clone(), config.pursuit_interval(), |engine| {
        engine.advance_pursuers();
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/state", get(state_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir(config.static_dir.as_deref()) {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static client");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static client root not found; serving websocket and api only");
        app
    };

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!(port = config.port, "listening");
    axum::serve(listener, app)
        .await
        .context("server runtime failed")?;
    Ok(())
}

fn resolve_static_dir(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.join("index.html").is_file() {
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "configured static dir has no index.html");
    }

    let candidates = [PathBuf::from("client/dist"), PathBuf::from("dist")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn state_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(json!({
        "generatedAtIso": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "state": guard.engine.view(),
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(CLIENT_QUEUE_CAPACITY);

    {
        let mut guard = state.lock().await;
        // The registry holds the only sender, so eviction ends the writer.
        guard.clients.insert(client_id.clone(), ClientContext { tx });
        guard.engine.connect(&client_id);
        flush_outbox(&mut guard);
    }
    info!(client = %client_id, "client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        let registered = match message {
            Message::Text(raw) => handle_client_message(&state, &client_id, raw.as_str()).await,
            Message::Binary(raw) => match std::str::from_utf8(&raw) {
                Ok(text) => handle_client_message(&state, &client_id, text).await,
                Err(_) => {
                    debug!(client = %client_id, "ignoring non-utf8 frame");
                    true
                }
            },
            Message::Close(_) => break,
            _ => true,
        };
        if !registered {
            debug!(client = %client_id, "client was evicted; closing reader");
            break;
        }
    }

    {
        let mut guard = state.lock().await;
        disconnect_client_internal(&mut guard, &client_id);
    }
    info!(client = %client_id, "client disconnected");
    let _ = writer.await;
}

/// Applies one inbound frame. Returns `false` once the client is no longer
/// registered, in which case the frame is dropped.
async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) -> bool {
    let mut guard = state.lock().await;
    if !guard.clients.contains_key(client_id) {
        return false;
    }
    let Some(message) = parse_client_message(raw) else {
        debug!(client = client_id, "ignoring malformed message");
        return true;
    };

    match message {
        ParsedClientMessage::JoinAs { role } => guard.engine.join_as(client_id, &role),
        ParsedClientMessage::LeaveRole { role } => {
            guard.engine.leave_role(client_id, role.as_deref())
        }
        ParsedClientMessage::Move { direction } => guard.engine.handle_move(client_id, direction),
        ParsedClientMessage::AdminSetMaze { maze_index } => {
            guard.engine.admin_set_maze(client_id, maze_index)
        }
        ParsedClientMessage::RestartFirstMaze => guard.engine.restart_first_maze(),
    }
    flush_outbox(&mut guard);
    true
}

fn start_periodic(state: SharedState, period: Duration, work: fn(&mut GameEngine)) {
    tokio::spawn(async move {
        let mut interval = cadence(period);
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            work(&mut guard.engine);
            flush_outbox(&mut guard);
        }
    });
}

/// First tick lands one full period after start, then every `period`.
fn cadence(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

fn queue_policy(event: &ServerEvent) -> QueuePolicy {
    match event {
        ServerEvent::GameState(_) => QueuePolicy::DropOnFull,
        _ => QueuePolicy::DisconnectOnFull,
    }
}

/// Delivers everything the engine queued, in order.
fn flush_outbox(state: &mut ServerState) {
    for Outbound { audience, event } in state.engine.drain_outbox() {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "failed to serialize outbound event");
                continue;
            }
        };
        let policy = queue_policy(&event);
        match audience {
            Audience::All => broadcast(state, &payload, policy),
            Audience::Client(client_id) => send_to_client(state, &client_id, &payload, policy),
        }
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, payload: &str, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(payload.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        warn!(client = client_id, "client queue full; disconnecting");
        disconnect_client_internal(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, payload: &str, policy: QueuePolicy) {
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        let sent = client
            .tx
            .try_send(OutboundMessage::Text(payload.to_string()))
            .is_ok();
        if !sent && policy == QueuePolicy::DisconnectOnFull {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        warn!(client = %client_id, "client queue full; disconnecting");
        disconnect_client_internal(state, &client_id);
    }
}

/// Forgets the client and frees its role. A close frame is queued when there
/// is room; either way dropping the sender ends the writer task.
fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    if let Some(client) = state.clients.remove(client_id) {
        let _ = client.tx.try_send(OutboundMessage::Close {
            code: CLOSE_POLICY_VIOLATION,
            reason: "disconnected".to_string(),
        });
    }
    state.engine.disconnect(client_id);
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
