use clap::Parser;
use precompress::cli::Cli;
use std::process::ExitCode;

/// Exit status for configuration and setup failures
const SETUP_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.run().await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(SETUP_FAILURE)
        }
    }
}
