use crate::logging::LogLevel;
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

pub mod config;
pub mod run;

#[derive(Parser)]
#[command(
    name = "precompress",
    version = env!("CARGO_PKG_VERSION"),
    about = "Pre-compress static assets with gzip, brotli and zstd in parallel",
    long_about = "precompress finds files matching a glob, keeps the ones whose content type \
                  benefits from compression, and writes .gz/.br/.zst siblings next to them \
                  using a fixed-size pool of worker threads."
)]
pub struct Cli {
    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory", global = true)]
    pub directory: Option<String>,

    /// Increase verbosity (debug logging)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress everything but errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress every eligible file matching a glob
    Run(run::RunArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Dispatch the subcommand, returning the process exit code
    pub async fn run(self) -> Result<u8> {
        // Change directory if specified
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("Cannot change directory to {dir}"))?;
        }

        let verbosity = self.verbosity();
        match self.command {
            Some(Commands::Run(args)) => run::execute(args, self.config.as_deref(), verbosity).await,
            Some(Commands::Config(args)) => config::execute(args, self.config.as_deref(), verbosity).await,
            None => {
                Cli::command().print_help()?;
                Ok(0)
            }
        }
    }

    /// Log level implied by -v/-q, if either was given
    fn verbosity(&self) -> Option<LogLevel> {
        if self.verbose > 0 {
            Some(LogLevel::Debug)
        } else if self.quiet {
            Some(LogLevel::Error)
        } else {
            None
        }
    }
}
