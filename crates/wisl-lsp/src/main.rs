//! WISL Language Server Protocol (LSP) server
//!
//! Runs the external WISL analyzer on open documents and reports its
//! diagnostics and code lenses to editors such as VSCode.

use anyhow::Result;
use clap::Parser;
use wisl_lsp::logging;
use wisl_lsp::transport::{self, ServeArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServeArgs::parse();
    logging::init(&args.log)?;

    transport::serve(args).await
}
