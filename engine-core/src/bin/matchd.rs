//! `matchd` — the connection listener and process entry point: binds
//! the listen socket, installs signal handling, and hands each accepted
//! connection to its own `ConnectionWorker` thread.

use clap::Parser;
use engine_core::prelude::*;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

/// Sole positional argument is the Unix-domain socket path; `-v` raises
/// the tracing filter for local debugging. No environment variables
/// are consulted.
#[derive(Parser, Debug)]
#[command(name = "matchd", about = "Concurrent limit-order matching engine")]
struct Args {
    /// Filesystem path of the Unix-domain socket to listen on.
    socket_path: PathBuf,

    /// Raise the tracing filter (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args.socket_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("matchd: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Binds the listen socket, installs the `SIGINT`/`SIGTERM` handler,
/// then accepts connections forever, handing each one to its own
/// `ConnectionWorker` thread — one OS thread per connection, no shared
/// event loop.
fn run(socket_path: &Path) -> Result<(), StartupError> {
    if socket_path.exists() {
        let _ = std::fs::remove_file(socket_path);
    }

    let listener = UnixListener::bind(socket_path).map_err(|source| StartupError::Bind {
        path: socket_path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %socket_path.display(), "listening");

    let cleanup_path = socket_path.to_path_buf();
    ctrlc::set_handler(move || {
        tracing::info!("signal received, shutting down");
        let _ = std::fs::remove_file(&cleanup_path);
        std::process::exit(0);
    })
    .expect("failed to install signal handler");

    let global = GlobalBook::new();
    let clock = Clock::new();
    let sink = StdoutSink::new();

    thread::scope(|scope| {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to accept connection");
                    continue;
                }
            };
            let global = &global;
            let clock = &clock;
            let sink = &sink;
            scope.spawn(move || {
                let worker = ConnectionWorker::new(global, clock, sink);
                if let Err(err) = worker.run(stream) {
                    tracing::warn!(error = %err, "connection terminated");
                }
            });
        }
    });

    Ok(())
}
