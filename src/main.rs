mod benchmarks;
mod catalog;
mod cli;
mod client;
mod config;
mod error;
mod export;
mod form;
mod logging;
mod model;
mod notify;
mod orchestrator;
mod render;
mod tabs;
#[cfg(test)]
mod test_support;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_headless = args.is_headless();

    match cli::run(args).await {
        Ok(true) => {
            // Explicitly exit with code 0 on success, especially for headless modes
            if is_headless {
                std::process::exit(0);
            }
            Ok(())
        }
        // The failure itself was already printed with the result.
        Ok(false) => std::process::exit(1),
        Err(e) => Err(e),
    }
}
