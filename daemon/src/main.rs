//! unqgate daemon: runs the verification gate or dispatches one command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;

use unqgate_groups::DiscordGuildClient;
use unqgate_ledger::{SidecarClient, SidecarConfig};
use unqgate_node::{init_logging, CommandRequest, GateNode, LogFormat, NodeConfig, ShutdownController};
use unqgate_store_lmdb::environment::DEFAULT_MAP_SIZE;
use unqgate_store_lmdb::LmdbStore;
use unqgate_types::SystemClock;

#[derive(Parser)]
#[command(name = "unqgate-daemon", about = "Unique Network holder verification gate")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "UNQGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB store.
    #[arg(long, env = "UNQGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Base URL of the Substrate sidecar.
    #[arg(long, env = "UNQGATE_LEDGER_ENDPOINT")]
    ledger_endpoint: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "UNQGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Discord server (guild) id. Overrides `discord.guild_id`.
    #[arg(long, env = "DISCORD_GUILD_ID")]
    guild_id: Option<String>,

    /// Discord bot token.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    discord_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the gate until SIGINT/SIGTERM.
    Run,
    /// Dispatch one command and print the reply.
    Exec {
        /// Command name, e.g. "verify" or "sync-role".
        name: String,

        /// Subject (Discord user id) issuing the command.
        #[arg(long)]
        subject: String,

        /// Command arguments as key=value, repeatable.
        #[arg(long = "arg", value_parser = parse_key_val)]
        args: Vec<(String, String)>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            NodeConfig::from_toml_file(&path)
                .with_context(|| format!("loading config from {path}"))?
        }
        None => NodeConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(endpoint) = &cli.ledger_endpoint {
        config.ledger.endpoint = endpoint.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(guild) = &cli.guild_id {
        config.discord.guild_id = guild.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_node(config: NodeConfig, token: Option<&str>) -> anyhow::Result<GateNode> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        bail!("a Discord bot token is required (--discord-token or DISCORD_TOKEN)");
    };

    let store = LmdbStore::open(&config.data_dir, DEFAULT_MAP_SIZE)
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;

    let ledger = SidecarClient::new(SidecarConfig {
        endpoint: config.ledger.endpoint.clone(),
        inventory_endpoint: config.ledger.inventory_endpoint.clone(),
        request_timeout: Duration::from_secs(config.ledger.request_timeout_secs),
        connect_timeout: Duration::from_secs(config.ledger.connect_timeout_secs),
        ss58_prefix: Some(config.ledger.ss58_prefix),
    });

    let membership = DiscordGuildClient::with_api_base(
        token,
        &config.discord.api_base,
        Duration::from_secs(config.discord.request_timeout_secs),
    );

    let node = GateNode::new(
        config,
        Arc::new(store),
        Arc::new(ledger),
        Arc::new(membership),
        Arc::new(SystemClock),
    )?;
    Ok(node)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format.parse::<LogFormat>()?, &config.log_level)?;

    match cli.command {
        Command::Run => {
            tracing::info!(
                data_dir = %config.data_dir.display(),
                ledger = %config.ledger.endpoint,
                guild = %config.discord.guild_id,
                "starting unqgate"
            );
            let mut node = build_node(config, cli.discord_token.as_deref())?;
            let shutdown = ShutdownController::new();
            node.start(&shutdown);

            shutdown.wait_for_signal().await;
            tracing::info!("shutdown signal received, stopping background tasks");
            node.join().await;

            match node.metrics.encode() {
                Ok(text) => tracing::debug!(metrics = %text, "final metrics"),
                Err(e) => tracing::warn!(error = %e, "could not encode metrics"),
            }
            tracing::info!("unqgate exited cleanly");
        }
        Command::Exec {
            name,
            subject,
            args,
        } => {
            let node = build_node(config, cli.discord_token.as_deref())?;
            let mut request = CommandRequest::new(name, subject);
            for (key, value) in &args {
                request = request.with_arg(key.clone(), value);
            }
            let reply = node.dispatch(&request).await;
            println!("{reply}");
            if !reply.ok {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_arguments() {
        assert_eq!(
            parse_key_val("address=unq=x").unwrap(),
            ("address".to_string(), "unq=x".to_string())
        );
        assert!(parse_key_val("address").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn cli_parses_exec() {
        let cli = Cli::try_parse_from([
            "unqgate-daemon",
            "--data-dir",
            "/tmp/gate",
            "--guild-id",
            "4242",
            "exec",
            "verify",
            "--subject",
            "42",
            "--arg",
            "address=unqAlice",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/gate"));
        assert_eq!(config.discord.guild_id, "4242");
        match cli.command {
            Command::Exec { name, subject, args } => {
                assert_eq!(name, "verify");
                assert_eq!(subject, "42");
                assert_eq!(args, vec![("address".to_string(), "unqAlice".to_string())]);
            }
            Command::Run => panic!("expected exec"),
        }
    }
}
