use std::sync::Arc;

use twilight_model::channel::Message;
use twilight_model::guild::Permissions;
use twilight_model::id::{ChannelId, MessageId};
use twilight_model::user::User;

use crate::cleanup::{Actor, HistoryMessage, Identity};
use crate::commands::meta::nodes::CommandNode;
use crate::core::BotContext;
use crate::error::CommandResult;
use crate::parser::Parser;

pub struct CommandMessage {
    pub id: MessageId,
    pub content: String,
    pub author: User,
    pub channel_id: ChannelId,
}

impl From<&Message> for CommandMessage {
    fn from(message: &Message) -> Self {
        CommandMessage {
            id: message.id,
            content: message.content.clone(),
            author: message.author.clone(),
            channel_id: message.channel_id,
        }
    }
}

impl CommandMessage {
    /// The message as it shows up in the channel history.
    pub fn as_history(&self) -> HistoryMessage {
        HistoryMessage::from_parts(self.id, self.channel_id, self.author.id, self.content.clone())
    }
}

/// Everything a command handler gets to work with.
pub struct CommandContext {
    pub bot_context: Arc<BotContext>,
    pub message: CommandMessage,
    pub parser: Parser,
    /// What the bot may do in the channel the command was used in.
    pub bot_permissions: Permissions,
    pub node: Arc<CommandNode>,
}

impl CommandContext {
    pub fn new(
        bot_context: Arc<BotContext>,
        message: CommandMessage,
        parser: Parser,
        bot_permissions: Permissions,
        node: Arc<CommandNode>,
    ) -> Self {
        CommandContext {
            bot_context,
            message,
            parser,
            bot_permissions,
            node,
        }
    }

    /// The bot as it acts in this channel.
    pub fn identity(&self) -> Identity {
        let bot_user = &self.bot_context.bot_user;
        Identity {
            user_id: bot_user.id,
            is_bot_account: bot_user.bot,
            channel_permissions: self.bot_permissions,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.message.author.id,
            name: format!("{}#{}", self.message.author.name, self.message.author.discriminator),
        }
    }

    /// Whether the bot itself ran this command, as happens on user accounts.
    pub fn invoked_by_self(&self) -> bool {
        self.bot_context.is_own(self.message.author.id)
    }

    pub async fn reply(&self, content: impl Into<String>) -> CommandResult {
        self.bot_context
            .http
            .create_message(self.message.channel_id)
            .content(content)?
            .await?;

        Ok(())
    }
}
