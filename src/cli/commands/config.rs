use crate::config::PrecompressConfig;
use crate::logging::{self, LogLevel};
use crate::request::CompressionRequest;
use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
    /// Check that the merged configuration can drive a run
    Validate,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

pub async fn execute(args: ConfigArgs, custom_config: Option<&str>, verbosity: Option<LogLevel>) -> Result<u8> {
    let config = PrecompressConfig::load_with(custom_config, None::<()>)
        .context("Failed to load configuration")?;
    let mut settings = config.settings().context("Failed to parse configuration")?;
    logging::init(verbosity.unwrap_or(settings.log_level));

    match args.command {
        ConfigCommand::Show { format } => {
            let rendered = match format {
                ConfigFormat::Toml => toml::to_string_pretty(&settings).context("Failed to render TOML")?,
                ConfigFormat::Json => {
                    serde_json::to_string_pretty(&config.get_full_config()?).context("Failed to render JSON")?
                }
            };
            println!("{}", rendered.trim_end());
        }
        ConfigCommand::Validate => {
            let has_glob = settings.glob.is_some();
            if !has_glob {
                // Checked on its own; the rest can still be validated
                settings.glob = Some("**/*".to_string());
            }
            let request = CompressionRequest::from_settings(&settings).context("Invalid configuration")?;

            println!("Configuration is valid");
            println!("  algorithms: {}", request.describe());
            if has_glob {
                println!("  glob: {}", request.glob);
            } else {
                println!("  glob: not set, pass one to `precompress run`");
            }
        }
    }

    Ok(0)
}
