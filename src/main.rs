use std::io;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use claude_costbar::cli::Args;
use claude_costbar::display::{DisplaySink, JsonSink, TerminalSink};
use claude_costbar::locale::Lang;
use claude_costbar::refresh::RefreshLoop;
use claude_costbar::usage::CcusageCommand;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug);

    let lang = args.resolve_lang();
    let source = CcusageCommand::new(args.command.clone());
    info!(command = %source.program(), ?lang, "starting");

    if args.json {
        serve(&args, source, JsonSink::new(io::stdout()), lang).await
    } else {
        serve(&args, source, TerminalSink::new(io::stdout()), lang).await
    }
}

async fn serve<D: DisplaySink>(
    args: &Args,
    source: CcusageCommand,
    sink: D,
    lang: Lang,
) -> Result<()> {
    let mut refresh = RefreshLoop::new(source, sink, lang, args.period());
    if args.once {
        refresh.tick().await.context("render status")?;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_quit().await;
        let _ = shutdown_tx.send(true);
    });

    refresh.run(shutdown_rx).await.context("refresh loop")
}

/// Ctrl-C, or SIGTERM on unix.
async fn wait_for_quit() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("quit requested");
}

fn setup_logging(debug: bool) {
    // stdout belongs to the status output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("claude_costbar=debug")
        } else {
            EnvFilter::new("claude_costbar=info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}
