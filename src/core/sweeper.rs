use std::sync::Arc;

use futures_util::StreamExt;
use log::debug;
use tokio::sync::watch;
use twilight_gateway::{Cluster, Event};
use twilight_http::Client as HttpClient;
use twilight_model::gateway::Intents;
use twilight_model::user::CurrentUser;

use crate::cleanup::CleanupEngine;
use crate::commands::ROOT_NODE;
use crate::core::handlers::{commands, general};
use crate::core::{BotConfig, BotContext};
use crate::error::StartupError;
use crate::{sweeper_error, sweeper_important};

pub struct Sweeper;

impl Sweeper {
    pub async fn run(
        config: &BotConfig,
        http: HttpClient,
        bot_user: CurrentUser,
        cleanup: CleanupEngine,
    ) -> Result<(), StartupError> {
        let context = Arc::new(BotContext::new(
            http,
            bot_user,
            &config.commands.prefixes,
            ROOT_NODE.command_names(),
            cleanup,
        ));

        let (shutdown_sender, mut shutdown) = watch::channel(false);
        ctrlc::set_handler(move || {
            let _ = shutdown_sender.send(true);
        })?;

        let intents = Intents::GUILD_MESSAGES | Intents::DIRECT_MESSAGES;
        let cluster = Cluster::new(config.tokens.discord.clone(), intents).await?;

        sweeper_important!("The cluster is going online!");
        let cluster_spawn = cluster.clone();
        tokio::spawn(async move {
            cluster_spawn.up().await;
        });

        let mut bot_events = cluster.events();
        loop {
            tokio::select! {
                event = bot_events.next() => match event {
                    // handled on their own, confirmations wait for later events
                    Some((shard_id, event)) => {
                        tokio::spawn(handle_event(shard_id, event, context.clone()));
                    }
                    None => break,
                },
                _ = shutdown.changed() => {
                    sweeper_important!("Shutdown requested, disconnecting from the gateway");
                    break;
                }
            }
        }

        context.reply_waiters.close();
        cluster.down();
        Ok(())
    }
}

async fn handle_event(shard_id: u64, event: Event, ctx: Arc<BotContext>) {
    debug!("Got a {:?} event on shard {}", event.kind(), shard_id);
    general::handle_event(shard_id, &event);

    if let Err(e) = commands::handle_event(&event, ctx).await {
        sweeper_error!("Failed to handle an event on shard {}: {}", shard_id, e);
    }
}
