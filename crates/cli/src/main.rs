use clap::Parser;
use tracing_subscriber::EnvFilter;

use cd_cli::cli::context::ChatContext;
use cd_cli::cli::{Cli, Command, ConfigCommand};
use cd_domain::config::LoggingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Version) = cli.command {
        println!("chatdesk {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (config, config_path) = cd_cli::cli::load_config()?;
    init_cli_tracing(&config.logging, cli.log_json);

    match cli.command {
        // Default to chat when no subcommand is given.
        None => {
            let ctx = ChatContext::open(&config, cli.ephemeral)?;
            cd_cli::cli::chat::chat(ctx, None).await
        }
        Some(Command::Chat { customer }) => {
            let ctx = ChatContext::open(&config, cli.ephemeral)?;
            cd_cli::cli::chat::chat(ctx, customer).await
        }
        Some(Command::Send {
            message,
            customer,
            json,
        }) => {
            let ctx = ChatContext::open(&config, cli.ephemeral)?;
            let ok = cd_cli::cli::send::send(&ctx, &message, customer.as_deref(), json).await?;
            if !ok {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::History { raw, json }) => {
            let ctx = ChatContext::open(&config, cli.ephemeral)?;
            cd_cli::cli::history::history(&ctx, raw, json)
        }
        Some(Command::Clear) => {
            let ctx = ChatContext::open(&config, cli.ephemeral)?;
            cd_cli::cli::history::clear(&ctx);
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let valid = cd_cli::cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => cd_cli::cli::config::show(&config),
        Some(Command::Version) => Ok(()),
    }
}

/// Initialize tracing for CLI commands.
///
/// Logs go to stderr so they never mix with conversation output.
/// `RUST_LOG` wins over the configured filter.
fn init_cli_tracing(logging: &LoggingConfig, force_json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if force_json || logging.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
