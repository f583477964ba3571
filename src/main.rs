use clap::Parser;
use gitbridge::{AppResult, Config, GitVersion, Server, SseTransport, StdioTransport, Transport, logging};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Git operations exposed as JSON-RPC tools over stdio or SSE
#[derive(Parser, Debug)]
#[command(name = "gitbridge", version, about)]
struct Args {
    /// Serve over HTTP/SSE instead of stdio
    #[arg(long)]
    sse: bool,

    /// Port for the SSE listener
    #[arg(long)]
    port: Option<u16>,

    /// Address for the SSE listener
    #[arg(long)]
    bind: Option<String>,

    /// Config file path (must exist when given)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Args::parse()).await {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> AppResult<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    logging::init(&config.logging.level);

    let tools = config.tool_context();
    let version = GitVersion::validate(&tools.runner).await?;
    info!(%version, "git detected");

    let server = Server::new(tools);

    let transport: Arc<dyn Transport> = if args.sse {
        let sse = SseTransport::bind(config.listen_addr()?, config.sse_options()).await?;
        info!(addr = %sse.local_addr(), "listening for SSE clients");
        Arc::new(sse)
    } else {
        info!("serving on stdio");
        Arc::new(StdioTransport::stdio())
    };

    let outcome = tokio::select! {
        result = server.run(Arc::clone(&transport)) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            Ok(())
        }
    };

    transport.close().await;
    outcome?;
    Ok(())
}
