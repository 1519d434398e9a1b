pub mod chat;
pub mod config;
pub mod context;
pub mod history;
pub mod render;
pub mod send;

use clap::{Parser, Subcommand};

/// ChatDesk: a terminal client for the banking assistant.
#[derive(Debug, Parser)]
#[command(name = "chatdesk", version, about)]
pub struct Cli {
    /// Write diagnostics to stderr as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Keep session state in memory only for this run.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the interactive chat (default when no subcommand is given).
    Chat {
        /// Act as this customer instead of the stored selection.
        #[arg(long)]
        customer: Option<String>,
    },
    /// Send a single message and print the reply.
    Send {
        /// The message to send.
        message: String,
        /// Act as this customer instead of the stored selection.
        #[arg(long)]
        customer: Option<String>,
        /// Print the reply as JSON instead of rendered text.
        #[arg(long)]
        json: bool,
    },
    /// Print the conversation of the current session.
    History {
        /// Show structured replies as pretty JSON.
        #[arg(long)]
        raw: bool,
        /// Dump the stored message log as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete the conversation of the current session.
    Clear,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CHATDESK_CONFIG";

/// Load the configuration from the path specified by `CHATDESK_CONFIG`
/// (or `chatdesk.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.
///
/// A missing file yields the defaults.  `CHATDESK_CHAT_API` overrides the
/// endpoint either way.
///
/// [`Config`]: cd_domain::config::Config
pub fn load_config() -> anyhow::Result<(cd_domain::config::Config, String)> {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "chatdesk.toml".into());

    let mut config: cd_domain::config::Config =
        if std::path::Path::new(&config_path).exists() {
            let raw = std::fs::read_to_string(&config_path)
                .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
            toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
        } else {
            cd_domain::config::Config::default()
        };
    config.api = config.api.with_env_override();

    Ok((config, config_path))
}
