use std::sync::Arc;

use log::trace;
use twilight_gateway::Event;

use crate::core::BotContext;
use crate::error::EventHandlerError;
use crate::parser::Parser;

pub async fn handle_event(event: &Event, ctx: Arc<BotContext>) -> Result<(), EventHandlerError> {
    match event {
        Event::MessageCreate(msg) if !msg.author.bot => {
            trace!("Received a message from {}, saying {}", msg.author.name, msg.content);

            // answers to pending questions are never commands
            if ctx.reply_waiters.offer(msg.channel_id, msg.author.id, &msg.content) {
                trace!("Message {} was a reply someone was waiting for", msg.id);
                return Ok(());
            }

            if let Some(prefix) = ctx.find_prefix(&msg.content) {
                Parser::figure_it_out(prefix, &msg.0, ctx.clone()).await?;
            }
        }
        _ => (),
    }

    Ok(())
}
