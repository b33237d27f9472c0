//! WebSocket Game Server
//!
//! Async WebSocket server for the match. One task per connection reads
//! commands, one writer task per connection drains its outbound queue, and
//! a single ticker advances the match and broadcasts the result.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::game::config::MatchConfig;
use crate::game::state::Seat;
use crate::network::protocol::{parse_join_name, ClientMessage};
use crate::network::session::{MatchSession, SharedSession};

/// Outbound frames a slow client may have queued before it is dropped.
const CLIENT_QUEUE_DEPTH: usize = 64;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_address: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Maximum concurrent connections, players and spectators alike
    pub max_connections: usize,
    /// Fixed seed for the match RNG; random when `None`
    pub rng_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 5050,
            max_connections: 64,
            rng_seed: None,
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            if let Ok(parsed) = addr.parse() {
                config.bind_address = parsed;
            } else {
                warn!("Invalid BIND_ADDRESS '{}', using default", addr);
            }
        }

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(parsed) if parsed > 0 => config.port = parsed,
                Ok(_) => warn!("PORT must be > 0, using default"),
                Err(_) => warn!("Invalid PORT '{}', using default", port),
            }
        }

        if let Ok(max) = std::env::var("MAX_CONNECTIONS") {
            match max.parse::<usize>() {
                Ok(parsed) if parsed > 0 => config.max_connections = parsed,
                Ok(_) => warn!("MAX_CONNECTIONS must be > 0, using default"),
                Err(_) => warn!("Invalid MAX_CONNECTIONS '{}', using default", max),
            }
        }

        if let Ok(seed) = std::env::var("RNG_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                config.rng_seed = Some(parsed);
            } else {
                warn!("Invalid RNG_SEED '{}', using a random seed", seed);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be at least 1".to_string());
        }
        Ok(())
    }

    /// Socket address to listen on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Configuration rejected by `validate`.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// A client that finished the join handshake.
struct ConnectedClient {
    /// Assigned unique name
    name: String,
    /// Whether the name holds a seat in the world
    seated: bool,
    /// Outbound queue drained by the writer task
    sender: mpsc::Sender<String>,
}

type Clients = Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>;

// =============================================================================
// SERVER
// =============================================================================

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// The match.
    session: SharedSession,
    /// Connected clients.
    clients: Clients,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server. The match seed comes from the config, or
    /// from `rand` when none is set.
    pub fn new(config: ServerConfig, match_config: MatchConfig) -> Self {
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            session: MatchSession::new(match_config, seed).into_shared(),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        self.config.validate().map_err(GameServerError::Config)?;
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let ticker_handle = tokio::spawn(Self::run_ticker(
            self.session.clone(),
            self.clients.clone(),
            self.shutdown_tx.subscribe(),
        ));

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        ticker_handle.abort();
        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let session = self.session.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<String>(CLIENT_QUEUE_DEPTH);

            // Spawn message sender task
            let mut sender_task = tokio::spawn(async move {
                while let Some(text) = msg_rx.recv().await {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // The first text frame is the join request
            let requested = loop {
                tokio::select! {
                    msg = ws_receiver.next() => match msg {
                        Some(Ok(Message::Text(text))) => break Some(parse_join_name(&text)),
                        Some(Ok(Message::Close(_))) | None => break None,
                        Some(Err(e)) => {
                            warn!("WebSocket error for {} before join: {}", addr, e);
                            break None;
                        }
                        _ => {}
                    },
                    _ = shutdown_rx.recv() => break None,
                }
            };
            let Some(requested) = requested else {
                sender_task.abort();
                debug!("Client {} left before joining", addr);
                return;
            };

            let (name, seat) = session.lock().await.join(&requested, Instant::now());
            let seated = seat != Seat::Full;

            // The assigned name goes out before any broadcast can be queued
            if msg_tx.send(name.clone()).await.is_err() {
                if seated {
                    session.lock().await.leave(&name);
                }
                return;
            }
            clients.write().await.insert(
                addr,
                ConnectedClient {
                    name: name.clone(),
                    seated,
                    sender: msg_tx,
                },
            );

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                Self::handle_text(&session, &name, seated, &text).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    // Writer stopped: socket failed or the ticker dropped us
                    _ = &mut sender_task => break,
                    _ = shutdown_rx.recv() => break,
                }
            }

            // Cleanup
            sender_task.abort();
            Self::disconnect(&session, &clients, addr).await;
            info!("Client {} cleaned up", addr);
        });
    }

    /// Parse and apply one frame from a joined client. Malformed frames
    /// are logged and dropped; spectators cannot issue commands.
    async fn handle_text(session: &SharedSession, name: &str, seated: bool, text: &str) {
        let command = match ClientMessage::from_json(text) {
            Ok(m) => m.into_command(name),
            Err(e) => {
                warn!("Invalid message from {}: {}", name, e);
                return;
            }
        };
        if !seated {
            debug!("Ignoring command from spectator {}", name);
            return;
        }

        let result = session.lock().await.apply(command, Instant::now());
        if let Err(e) = result {
            debug!("Command from {} not applied: {}", name, e);
        }
    }

    /// Forget a client and free its seat. Safe to call twice.
    async fn disconnect(session: &SharedSession, clients: &Clients, addr: SocketAddr) {
        let removed = clients.write().await.remove(&addr);
        if let Some(client) = removed {
            if client.seated {
                session.lock().await.leave(&client.name);
            }
        }
    }

    /// Advance the match and broadcast, at the interval the world asks for.
    async fn run_ticker(
        session: SharedSession,
        clients: Clients,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            let (message, interval) = {
                let mut s = session.lock().await;
                let message = s.advance(Instant::now());
                (message, s.tick_interval())
            };

            match message.to_json() {
                Ok(text) => Self::broadcast(&session, &clients, text).await,
                Err(e) => error!("Failed to serialize message: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown_rx.recv() => break,
            }
        }
    }

    /// Queue `text` for every joined client. A client whose queue is full
    /// or closed is disconnected; the others still get the message.
    async fn broadcast(session: &SharedSession, clients: &Clients, text: String) {
        let failed: Vec<SocketAddr> = {
            let clients = clients.read().await;
            clients
                .iter()
                .filter(|(_, client)| client.sender.try_send(text.clone()).is_err())
                .map(|(addr, _)| *addr)
                .collect()
        };

        for addr in failed {
            warn!("Send to {} failed, dropping client", addr);
            Self::disconnect(session, clients, addr).await;
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Handle to the match, for inspection.
    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }
}
