use std::env;
use std::time::Duration;

use git_version::git_version;
use log::{debug, info};
use tokio::runtime::Runtime;
use twilight_http::Client as HttpClient;
use twilight_model::id::ChannelId;

use crate::cleanup::{AuditLogger, CleanupEngine, JsonLinesSink};
use crate::core::{logging, BotConfig, Sweeper};
use crate::error::StartupError;

mod cleanup;
mod commands;
mod core;
mod error;
mod parser;
mod utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_VERSION: &str = git_version!(fallback = "unknown");

fn main() -> Result<(), StartupError> {
    let runtime = Runtime::new()?;

    runtime.block_on(async move { real_main().await })?;

    runtime.shutdown_timeout(Duration::from_secs(90));
    Ok(())
}

async fn real_main() -> Result<(), StartupError> {
    // Read config file
    let config_file = env::args().nth(1).unwrap_or_else(|| String::from("config.toml"));
    let config = BotConfig::new(&config_file)?;

    if let Err(e) = logging::initialize(&config.logging) {
        eprintln!("{}", e);
        return Err(e);
    }

    info!("Sweeper v{} ({}) starting!", VERSION, GIT_VERSION);
    debug!("Loaded config file {}", config_file);

    let http = HttpClient::new(&config.tokens.discord);
    // Validate token and figure out who we are
    let user = http.current_user().await?;
    info!(
        "Token validated, connecting to discord as {}#{}",
        user.name, user.discriminator
    );

    if let Some(channel_id) = config.logging.channel {
        logging::initialize_discord_logging(http.clone(), ChannelId(channel_id));
    }

    let audit_sink = JsonLinesSink::open(&config.cleanup.audit_log)?;
    info!("Writing audit records to {}", audit_sink.path().display());
    let cleanup = CleanupEngine::new(config.cleanup.settings(), AuditLogger::new().with_sink(audit_sink));

    sweeper_important!("Starting Sweeper v{}", VERSION);

    if let Err(e) = Sweeper::run(&config, http, user, cleanup).await {
        sweeper_error!("Failed to start the bot: {}", e);
        return Err(e);
    }

    info!("Sweeper shut down");
    Ok(())
}
