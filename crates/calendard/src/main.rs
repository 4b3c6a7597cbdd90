use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use calendar_core::campaign::CampaignBook;
use calendar_core::io::setup::{build_campaign, CampaignFile};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

mod api;

#[derive(Parser, Debug)]
#[command(name = "calendard", about = "Campaign calendar daemon")]
struct Args {
    /// Campaign JSON documents to preload; may be repeated.
    #[arg(long = "campaign-file", value_name = "PATH")]
    campaign_files: Vec<PathBuf>,

    /// Address to bind (defaults to 127.0.0.1).
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on for HTTP and WebSocket clients.
    #[arg(long, default_value_t = 8788)]
    port: u16,

    /// Capacity of the change-notification channel.
    #[arg(long, default_value_t = 128)]
    notify_capacity: usize,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub book: Arc<Mutex<CampaignBook>>,
    pub tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(book: CampaignBook, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<String>(capacity.max(1));
        Self {
            book: Arc::new(Mutex::new(book)),
            tx,
        }
    }
}

fn load_book(args: &Args) -> Result<CampaignBook> {
    let mut book = CampaignBook::new();
    for path in &args.campaign_files {
        let file = CampaignFile::load_from_path(path)
            .with_context(|| format!("failed to load campaign from {:?}", path))?;
        let campaign = build_campaign(file)?;
        book.insert(campaign)
            .with_context(|| format!("failed to register campaign from {:?}", path))?;
    }
    Ok(book)
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/campaigns/:id", post(api::initialize))
        .route("/campaigns/:id/state", get(api::get_state))
        .route("/campaigns/:id/config", get(api::get_config).put(api::reconfigure))
        .route("/campaigns/:id/advance", post(api::advance))
        .route("/campaigns/:id/year", put(api::set_year))
        .route("/campaigns/:id/weather", post(api::generate_weather))
        .route(
            "/campaigns/:id/events",
            get(api::events_on).post(api::create_event),
        )
        .route(
            "/campaigns/:id/events/:event_id",
            put(api::update_event).delete(api::delete_event),
        )
        .route("/campaigns/:id/agenda", get(api::month_agenda))
        .route("/stream", get(ws_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let book = load_book(&args)?;
    info!(campaigns = ?book.ids(), "campaign book ready");
    let state = AppState::new(book, args.notify_capacity);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.bind, args.port))?;

    info!(%addr, "starting calendard");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| async move { handle_socket(socket, state.tx.subscribe()).await })
}

async fn handle_socket(mut socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    loop {
        match rx.recv().await {
            Ok(line) => {
                if socket.send(Message::Text(line)).await.is_err() {
                    error!("websocket client disconnected");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "websocket client lagging; notifications dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
