//! Serving the language server over stdio or TCP

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tower_lsp::{LspService, Server};

use crate::server::WislLspServer;

/// Command-line arguments for `wisl-lsp`
#[derive(Debug, Clone, Parser)]
#[command(name = "wisl-lsp", version, about = "WISL language server")]
pub struct ServeArgs {
    /// Serve over TCP instead of stdio
    #[arg(long)]
    pub tcp: bool,

    /// Port for TCP mode
    #[arg(long, default_value_t = 9257)]
    pub port: u16,

    /// Bind address for TCP mode
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Log filter, e.g. `debug` or `wisl_lsp=trace`
    #[arg(long, env = "WISL_LSP_LOG", default_value = "info")]
    pub log: String,

    /// Serve over stdio (the default; accepted for editor compatibility)
    #[arg(long, conflicts_with = "tcp")]
    pub stdio: bool,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            tcp: false,
            port: 9257,
            host: "127.0.0.1".to_string(),
            log: "info".to_string(),
            stdio: false,
        }
    }
}

impl ServeArgs {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Serve until the client disconnects (stdio) or forever (TCP)
pub async fn serve(args: ServeArgs) -> Result<()> {
    if args.tcp {
        serve_tcp(args).await
    } else {
        serve_stdio().await
    }
}

async fn serve_stdio() -> Result<()> {
    tracing::info!("starting WISL LSP server (stdio)");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(WislLspServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

async fn serve_tcp(args: ServeArgs) -> Result<()> {
    let addr = args.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "WISL LSP server listening");

    loop {
        let (stream, client_addr) = listener.accept().await?;
        tracing::info!(%client_addr, "client connected");

        let (read, write) = tokio::io::split(stream);
        let (service, socket) = LspService::new(WislLspServer::new);

        tokio::spawn(async move {
            Server::new(read, write, socket).serve(service).await;
            tracing::info!(%client_addr, "client disconnected");
        });
    }
}
