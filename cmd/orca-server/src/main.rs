//! orca-server: menu service answering with orca envelopes.
//!
//! Usage:
//!     ./target/release/orca-server [--port 8080] [--host 0.0.0.0] [--log debug] [--no-seed]
//!
//! Try:
//!     curl -s http://127.0.0.1:8080/menus/system:menu
//!     curl -s http://127.0.0.1:8080/menus/ghost

mod config;
mod error;
mod menu;
mod routes;
mod wire;

use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use orca_error::{codes, Registry};
use orca_response::Responder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ServerConfig;
use crate::menu::MenuStore;
use crate::routes::App;
use crate::wire::Parsed;

pub use crate::error::ServerError;

#[derive(Default)]
struct Stats {
    accepts: AtomicU64,
    requests: AtomicU64,
    responses: AtomicU64,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
    errors: AtomicU64,
}

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse_lossy(filter),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = match ServerConfig::from_env().and_then(|cfg| cfg.with_args(std::env::args().skip(1))) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("orca-server: {}", err);
            return ExitCode::from(2);
        }
    };
    init_tracing(&cfg.log_filter);

    match run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "orca-server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: ServerConfig) -> Result<(), ServerError> {
    let registry = Registry::new();
    codes::bootstrap(&registry)?;
    debug!(codes = registry.len(), "code table loaded\n{}", registry.markdown());

    let menus = if cfg.seed { MenuStore::seeded()? } else { MenuStore::new() };
    let app = Arc::new(App::new(Responder::new(Arc::new(registry)), menus));

    let addr = cfg.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, menus = app.menus().len(), "listening");

    let stats = Arc::new(Stats::default());
    if cfg.stats_secs > 0 {
        tokio::spawn(report_stats(Arc::clone(&stats), cfg.stats_secs));
    }

    let max_request = cfg.max_request;
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    stats.accepts.fetch_add(1, Ordering::Relaxed);
                    debug!(%peer, "accepted");
                    tokio::spawn(handle_client(stream, Arc::clone(&app), Arc::clone(&stats), max_request));
                }
                Err(err) => warn!(error = %err, "accept failed"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                return Ok(());
            }
        }
    }
}

async fn report_stats(stats: Arc<Stats>, secs: u64) {
    let start = Instant::now();
    let mut interval = tokio::time::interval(Duration::from_secs(secs));
    loop {
        interval.tick().await;
        let elapsed = start.elapsed().as_secs_f64();
        let resp = stats.responses.load(Ordering::Relaxed);
        let rps = if elapsed > 0.0 { resp as f64 / elapsed } else { 0.0 };
        info!(
            accepts = stats.accepts.load(Ordering::Relaxed),
            req = stats.requests.load(Ordering::Relaxed),
            resp,
            rps = rps as u64,
            bytes_in = stats.bytes_in.load(Ordering::Relaxed),
            bytes_out = stats.bytes_out.load(Ordering::Relaxed),
            err = stats.errors.load(Ordering::Relaxed),
            "stats"
        );
    }
}

async fn handle_client(mut stream: TcpStream, app: Arc<App>, stats: Arc<Stats>, max_request: usize) {
    let _ = stream.set_nodelay(true);

    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    loop {
        // Serve everything already buffered before reading again.
        let (response, keep_alive) = match wire::parse_request(&buf, max_request) {
            Ok(Parsed::Complete(req, used)) => {
                stats.requests.fetch_add(1, Ordering::Relaxed);
                buf.drain(..used);
                let keep_alive = wire::keep_alive(&req);
                let resp = app.handle(&req);
                debug!(method = %req.method(), uri = %req.uri(), status = resp.status().as_u16(), "served");
                (wire::encode_response(&resp, keep_alive), keep_alive)
            }
            Ok(Parsed::Partial) => {
                let n = match stream.read(&mut chunk).await {
                    Ok(0) => return,
                    Ok(n) => n,
                    Err(err) => {
                        stats.errors.fetch_add(1, Ordering::Relaxed);
                        debug!(error = %err, "read failed");
                        return;
                    }
                };
                stats.bytes_in.fetch_add(n as u64, Ordering::Relaxed);
                buf.extend_from_slice(&chunk[..n]);
                continue;
            }
            Err(err) => {
                stats.errors.fetch_add(1, Ordering::Relaxed);
                let resp = app.reject(err);
                (wire::encode_response(&resp, false), false)
            }
        };

        match stream.write_all(&response).await {
            Ok(()) => {
                stats.bytes_out.fetch_add(response.len() as u64, Ordering::Relaxed);
                stats.responses.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                stats.errors.fetch_add(1, Ordering::Relaxed);
                debug!(error = %err, "write failed");
                return;
            }
        }

        if !keep_alive {
            let _ = stream.shutdown().await;
            return;
        }
    }
}
