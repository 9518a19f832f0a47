use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use glados_core::config::{
    ClientConfig, SessionSettings, DEFAULT_DATABASE_URL, DEFAULT_DEBUG_CHANNEL_NAME,
    DEFAULT_MANIFEST_PATH, DEFAULT_TRIGGER_PORT,
};

mod server;

const TOKEN_ENV_VAR: &str = "SLACK_TOKEN";

#[derive(Parser, Debug, Clone)]
#[command(name = "glados")]
#[command(author, version, about = "GLaDOS - plugin-routing Slack bot")]
struct Args {
    /// Only listen and post in the debug channel; log every inbound frame.
    #[arg(long, default_value = "false")]
    debug: bool,

    /// Plugin manifest (JSON, key order is dispatch priority).
    #[arg(long, default_value = DEFAULT_MANIFEST_PATH)]
    manifest: PathBuf,

    /// SQLite URL for the bot's memory.
    #[arg(long, default_value = DEFAULT_DATABASE_URL)]
    db_path: String,

    /// Name of the channel debug mode is confined to.
    #[arg(long, default_value = DEFAULT_DEBUG_CHANNEL_NAME)]
    debug_channel: String,

    /// Read the token from here when SLACK_TOKEN is unset.
    #[arg(long, default_value = ".slack-token")]
    token_file: PathBuf,

    /// Local port for `POST /async/{plugin}` triggers.
    #[arg(long, default_value_t = DEFAULT_TRIGGER_PORT)]
    trigger_port: u16,

    /// Don't start the trigger endpoint at all.
    #[arg(long, default_value = "false")]
    no_trigger: bool,
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let directive = if debug { "glados=debug" } else { "glados=info" };
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).context("Failed to set global subscriber")
}

fn load_token(token_file: &Path) -> anyhow::Result<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }
    let raw = fs::read_to_string(token_file).with_context(|| {
        format!(
            "No {TOKEN_ENV_VAR} set and could not read token file {}",
            token_file.display()
        )
    })?;
    let token = raw.trim();
    anyhow::ensure!(!token.is_empty(), "Token file {} is empty", token_file.display());
    Ok(token.to_string())
}

fn build_config(args: &Args, token: String) -> ClientConfig {
    let mut config = ClientConfig::new(token);
    config.manifest_path = args.manifest.clone();
    config.database_url = args.db_path.clone();
    config.session = SessionSettings {
        debug_channel_name: args.debug_channel.clone(),
        debug_mode: args.debug,
    };
    config.trigger_port = (!args.no_trigger).then_some(args.trigger_port);
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.debug)?;
    info!(
        "GLaDOS starting. debug={}, manifest={:?}, db={}",
        args.debug, args.manifest, args.db_path
    );

    let token = load_token(&args.token_file)?;
    let config = build_config(&args, token);

    if let Err(e) = server::run_bot(config).await {
        error!("Bot error: {}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["glados"]);
        let config = build_config(&args, "xoxb".into());
        assert_eq!(config.manifest_path, PathBuf::from("plugins.json"));
        assert_eq!(config.database_url, "sqlite://memory.db");
        assert_eq!(config.session.debug_channel_name, "aperture-science");
        assert!(!config.debug_mode());
        assert_eq!(config.trigger_port, Some(9393));
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "glados",
            "--debug",
            "--manifest",
            "conf/plugins.json",
            "--debug-channel",
            "test-chamber",
            "--no-trigger",
        ]);
        let config = build_config(&args, "xoxb".into());
        assert!(config.debug_mode());
        assert_eq!(config.manifest_path, PathBuf::from("conf/plugins.json"));
        assert_eq!(config.session.debug_channel_name, "test-chamber");
        assert_eq!(config.trigger_port, None);
    }

    #[test]
    fn test_token_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".slack-token");
        fs::write(&path, "  xoxb-from-file \n").unwrap();
        if std::env::var(TOKEN_ENV_VAR).is_err() {
            assert_eq!(load_token(&path).unwrap(), "xoxb-from-file");
        }
    }

    #[test]
    fn test_empty_token_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".slack-token");
        fs::write(&path, "\n").unwrap();
        if std::env::var(TOKEN_ENV_VAR).is_err() {
            assert!(load_token(&path).is_err());
            assert!(load_token(&dir.path().join("missing")).is_err());
        }
    }
}
