use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use maze_chase_server::constants::TICK_MS;
use maze_chase_server::server_protocol::{
    error_message, parse_client_message, pong_message, state_message, welcome_message,
    ParsedClientMessage,
};
use maze_chase_server::server_utils::{parse_limit, sanitize_user_id, ServerConfig};
use maze_chase_server::session::{ChannelSink, GameSession};
use maze_chase_server::stats_store::StatsStore;
use maze_chase_server::ticker::TickLoop;
use maze_chase_server::types::{Phase, SessionReport};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const REPORT_QUEUE_CAPACITY: usize = 256;
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type SharedStore = Arc<Mutex<StatsStore>>;
type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Clone)]
struct AppState {
    store: SharedStore,
    reports: mpsc::Sender<SessionReport>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    user: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let store = Arc::new(Mutex::new(StatsStore::new(config.stats_db_path.clone())));
    let (reports_tx, reports_rx) = mpsc::channel(REPORT_QUEUE_CAPACITY);
    tokio::spawn(run_report_writer(store.clone(), reports_rx));

    let state = AppState {
        store,
        reports: reports_tx,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/profile/{user_id}", get(profile_handler))
        .route("/api/leaderboard", get(leaderboard_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir(config.static_dir.as_ref()) {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found; only the API and websocket are served");
        app
    };

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        port = config.port,
        stats = %config.stats_db_path.display(),
        "listening"
    );
    axum::serve(listener, app).await
}

fn resolve_static_dir(configured: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.join("index.html").is_file() {
            return Some(path.clone());
        }
        warn!(root = %path.display(), "STATIC_DIR has no index.html");
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("static")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn run_report_writer(store: SharedStore, mut rx: mpsc::Receiver<SessionReport>) {
    while let Some(report) = rx.recv().await {
        let mut guard = store.lock().await;
        match guard.record(&report) {
            Ok(()) => info!(
                user = %report.user_id,
                score = report.score,
                level = report.level,
                "session report stored"
            ),
            Err(error) => warn!(user = %report.user_id, %error, "failed to store session report"),
        }
    }
    debug!("report writer stopped");
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let Some(user_id) = sanitize_user_id(Some(&user_id)) else {
        return (StatusCode::BAD_REQUEST, Json(error_message("invalid user id"))).into_response();
    };
    let guard = state.store.lock().await;
    Json(guard.profile(&user_id, parse_limit(query.limit.as_deref()))).into_response()
}

async fn leaderboard_handler(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> impl IntoResponse {
    let guard = state.store.lock().await;
    Json(guard.leaderboard(parse_limit(query.limit.as_deref())))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    let user_id = sanitize_user_id(query.user.as_deref());
    ws.on_upgrade(move |socket| handle_socket(state, socket, user_id))
}

async fn handle_socket(state: AppState, socket: WebSocket, user_id: Option<String>) {
    let connection_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    info!(connection_id, user = ?user_id, "client connected");

    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_QUEUE_CAPACITY);
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

    let sink = ChannelSink::new(state.reports.clone());
    let session: SharedSession = Arc::new(Mutex::new(GameSession::new(
        user_id.clone(),
        Some(Box::new(sink)),
    )));
    let mut ticker = TickLoop::new();

    {
        let mut guard = session.lock().await;
        send_json(
            &tx,
            &welcome_message(&guard.state().get_world_init()),
            QueuePolicy::DisconnectOnFull,
        );
        send_json(
            &tx,
            &state_message(&guard.build_snapshot(true)),
            QueuePolicy::DisconnectOnFull,
        );
    }

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };
        let raw = match message {
            Message::Text(raw) => raw.to_string(),
            Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    send_json(
                        &tx,
                        &error_message("invalid utf8 message"),
                        QueuePolicy::DisconnectOnFull,
                    );
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };

        let Some(parsed) = parse_client_message(&raw) else {
            send_json(
                &tx,
                &error_message("invalid message"),
                QueuePolicy::DisconnectOnFull,
            );
            continue;
        };

        match parsed {
            ParsedClientMessage::Ping { t } => {
                send_json(&tx, &pong_message(t), QueuePolicy::DisconnectOnFull);
            }
            ParsedClientMessage::Stop => {
                ticker.cancel();
                session.lock().await.stop();
                let _ = tx
                    .send(OutboundMessage::Close {
                        code: 1000,
                        reason: "stopped".to_string(),
                    })
                    .await;
                break;
            }
            other => {
                let Some(command) = other.as_command() else {
                    continue;
                };
                let (previous, phase) = {
                    let mut guard = session.lock().await;
                    let previous = guard.phase();
                    let phase = guard.command(command);
                    send_json(
                        &tx,
                        &state_message(&guard.build_snapshot(true)),
                        QueuePolicy::DropOnFull,
                    );
                    (previous, phase)
                };
                sync_ticker(&mut ticker, previous, phase, &session, &tx);
            }
        }
    }

    ticker.cancel();
    session.lock().await.stop();
    info!(connection_id, user = ?user_id, "client disconnected");
    drop(tx);
    let _ = writer.await;
}

/// Keeps exactly one tick loop alive while the run is in the running phase. Entering
/// running from any other phase always re-arms, since a loop that just returned
/// `false` may not have finished yet.
fn sync_ticker(
    ticker: &mut TickLoop,
    previous: Phase,
    phase: Phase,
    session: &SharedSession,
    tx: &mpsc::Sender<OutboundMessage>,
) {
    if phase != Phase::Running {
        ticker.cancel();
        return;
    }
    if previous == Phase::Running && ticker.is_armed() {
        return;
    }

    let session = session.clone();
    let tx = tx.clone();
    ticker.arm(Duration::from_millis(TICK_MS), move || {
        let session = session.clone();
        let tx = tx.clone();
        async move {
            let mut guard = session.lock().await;
            let phase = guard.tick();
            let snapshot = guard.build_snapshot(true);
            drop(guard);
            send_json(&tx, &state_message(&snapshot), QueuePolicy::DropOnFull);
            phase == Phase::Running
        }
    });
}

fn send_json(tx: &mpsc::Sender<OutboundMessage>, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    match tx.try_send(OutboundMessage::Text(payload)) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => match policy {
            QueuePolicy::DropOnFull => debug!("outbound queue full; dropping state frame"),
            QueuePolicy::DisconnectOnFull => {
                warn!("outbound queue full; closing connection");
                let _ = tx.try_send(OutboundMessage::Close {
                    code: 1013,
                    reason: "outbound queue overflow".to_string(),
                });
            }
        },
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}
