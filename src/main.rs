use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

mod api;
mod config;
mod handler;
mod http;
mod logger;
mod storage;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if wants_help() {
        print_usage();
        return Ok(());
    }

    let cfg = config::Config::load_from("config")?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

fn wants_help() -> bool {
    std::env::args()
        .nth(1)
        .is_some_and(|arg| matches!(arg.as_str(), "-h" | "--help" | "help"))
}

fn print_usage() {
    println!(
        "\
Usage Analytics Dashboard Server

Usage:
    dashboard_server              Start the server
    dashboard_server -h           Show this help message

Configuration is read from config.toml (optional) and SERVER_*
environment variables. Defaults bind http://127.0.0.1:8081.

Endpoints:
    GET  /<path>                  Static dashboard assets
    POST /api/upload              Multipart upload (fields: file, type)
    GET  /api/files/<type>        JSON listing of uploaded files

Uploaded data is stored under data/usage/ (.json, .jsonl) and
data/users/ (.csv); both directories are created at startup."
    );
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;

    // Directory bootstrap happens before the listener starts accepting
    storage::ensure_layout(Path::new(&cfg.storage.data_dir))?;
    logger::log_data_dirs_ready(&cfg.storage.data_dir);

    let listener = match create_reusable_listener(addr) {
        Ok(listener) => listener,
        Err(e) => {
            logger::log_bind_failed(&addr, &e);
            return Err(e.into());
        }
    };

    let config = Arc::new(cfg);
    logger::log_server_start(&addr, &config);

    run_server(listener, config).await
}

/// Accept connections until a shutdown signal arrives
async fn run_server(
    listener: TcpListener,
    config: Arc<config::Config>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        handle_connection(stream, peer_addr, Arc::clone(&config));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                logger::log_shutdown();
                return Ok(());
            }
        }
    }
}

/// Handle a single connection in a spawned task
///
/// Wraps the stream for hyper, serves HTTP/1.1 with keep-alive, and bounds
/// the whole exchange with the configured request timeout.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    config: Arc<config::Config>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_duration =
            std::time::Duration::from_secs(config.performance.request_timeout);

        let mut builder = http1::Builder::new();
        if config.performance.keep_alive_timeout > 0 {
            builder.keep_alive(true);
        }

        let service_config = Arc::clone(&config);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, peer_addr, Arc::clone(&service_config))
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_warning(&format!(
                "Connection timeout after {} seconds",
                timeout_duration.as_secs()
            )),
        }
    });
}

/// Wait for SIGINT or SIGTERM (Unix)
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
    let mut sigint =
        signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
        std::future::pending::<()>().await;
    }
}

/// Create a `TcpListener` with `SO_REUSEADDR` enabled
///
/// Lets the dev server rebind its port immediately after a restart while
/// the previous socket is still in TIME_WAIT.
fn create_reusable_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
