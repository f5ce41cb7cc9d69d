//! http-multi binary entrypoint

use clap::Parser;
use http_multi::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli.run().await {
        // Fatal: configuration error or a sink write failure.
        tracing::error!(error = %err, "exiting");
        eprintln!("http-multi: {err:#}");
        std::process::exit(1);
    }
}
