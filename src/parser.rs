use std::sync::Arc;

use log::{debug, info, trace};
use twilight_model::channel::Message;
use twilight_model::guild::Permissions;
use twilight_model::id::{MessageId, UserId};

use crate::commands::meta::nodes::CommandNode;
use crate::commands::ROOT_NODE;
use crate::core::permissions::{dm_permissions, fetch_channel_permissions};
use crate::core::{BotContext, CommandContext, CommandMessage};
use crate::error::{CommandError, EventHandlerError, ParseError};
use crate::sweeper_error;
use crate::utils::matchers;

#[derive(Debug, Clone)]
pub struct Parser {
    pub parts: Vec<String>,
    pub index: usize,
}

impl Parser {
    pub fn new(content: &str) -> Self {
        let temp = content.split_whitespace().collect::<Vec<&str>>();
        let mut parts = vec![];
        let mut index = 0;
        while index < temp.len() {
            let mut part = temp[index].to_string();
            index += 1;
            if part.starts_with('"') && (part.len() == 1 || !part.ends_with('"')) {
                let mut new_part = part.clone();
                let mut new_index = index;
                while new_index < temp.len() {
                    new_part += " ";
                    new_part += temp[new_index];
                    new_index += 1;
                    if new_part.ends_with('"') {
                        index = new_index;
                        part = new_part.clone();
                        break;
                    }
                }
            }
            if part.len() >= 2 {
                if let Some(new_part) = part.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
                    part = new_part.to_string();
                }
            }

            parts.push(part);
        }
        Parser { parts, index: 0 }
    }

    pub fn get_command(&mut self) -> Vec<Arc<CommandNode>> {
        let mut nodes = vec![];
        let mut to_search = &ROOT_NODE.all_commands;
        while self.index < self.parts.len() {
            let target = &self.parts[self.index];

            match to_search.get(target) {
                Some(node) => {
                    to_search = &node.sub_nodes;
                    debug!("Found a command node: {}", node.name);
                    self.index += 1;
                    nodes.push(node.clone());
                }
                None => break,
            }
        }
        nodes
    }

    pub async fn figure_it_out(
        prefix: &str,
        message: &Message,
        ctx: Arc<BotContext>,
    ) -> Result<(), EventHandlerError> {
        //Create parser to process message
        let mut parser = Parser::new(&message.content[prefix.len()..]);
        trace!("Parser processing message: {:?}", &message.content);

        //parse the message to get the nodes
        let command_nodes = parser.get_command();

        //Do we even have a node to execute?
        let node = match command_nodes.last() {
            Some(node) => node.clone(),
            None => return Ok(()),
        };

        let name = command_nodes
            .iter()
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let channel_id = message.channel_id;

        let result = match prepare(&ctx, message, &node).await {
            Ok(bot_permissions) => {
                let context = CommandContext::new(
                    ctx.clone(),
                    CommandMessage::from(message),
                    parser,
                    bot_permissions,
                    node.clone(),
                );
                match &node.handler {
                    Some(handler) => handler(context).await,
                    None => context.reply(node.help_text()).await,
                }
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                debug!("{} ({}) ran the {} command in {}", message.author.name, message.author.id, name, channel_id);
                Ok(())
            }
            Err(e) => {
                match &e {
                    CommandError::OtherFailure(failure) => {
                        sweeper_error!("The {} command failed in {}: {}", name, channel_id, failure)
                    }
                    _ => info!("{} ({}) tried to run the {} command: {}", message.author.name, message.author.id, name, e),
                }
                ctx.http
                    .create_message(channel_id)
                    .content(e.to_string())
                    .map_err(|failure| EventHandlerError::Command(failure.into()))?
                    .await?;
                Ok(())
            }
        }
    }

    /// Returns the next part of a message if the end of the
    /// message hasn't yet been reached.
    pub fn get_next(&mut self) -> Result<&str, ParseError> {
        if self.index != self.parts.len() {
            let result = &self.parts[self.index];
            self.index += 1;
            Ok(result)
        } else {
            Err(ParseError::MissingArgument)
        }
    }

    pub fn has_next(&self) -> bool {
        self.index < self.parts.len()
    }

    pub fn get_number(&mut self) -> Result<usize, ParseError> {
        self.get_next()?
            .parse::<usize>()
            .map_err(|_| ParseError::WrongArgumentType(String::from("number")))
    }

    /// Parses what comes next as a user mention or raw user id.
    pub fn get_user_id(&mut self) -> Result<UserId, ParseError> {
        let input = self.get_next()?;
        match matchers::get_mention(input) {
            Some(uid) => Ok(UserId(uid)),
            None => input
                .parse::<u64>()
                .map(UserId)
                .map_err(|_| ParseError::InvalidUserID(input.to_string())),
        }
    }

    pub fn get_message_id(&mut self) -> Result<MessageId, ParseError> {
        self.get_next()?
            .parse::<u64>()
            .map(MessageId)
            .map_err(|_| ParseError::WrongArgumentType(String::from("message id")))
    }
}

/// Checks the node's requirements, returns the bot's permissions in the channel when they are met.
async fn prepare(ctx: &BotContext, message: &Message, node: &CommandNode) -> Result<Permissions, CommandError> {
    let guild_id = match message.guild_id {
        Some(guild_id) => guild_id,
        None if node.guild_only => return Err(CommandError::NoDM),
        None => {
            if !ctx.is_own(message.author.id) {
                check_author(node.author_permissions, dm_permissions())?;
            }
            return Ok(dm_permissions());
        }
    };

    let bot_permissions = fetch_channel_permissions(&ctx.http, guild_id, message.channel_id, ctx.bot_user.id).await?;
    if !bot_permissions.contains(node.bot_permissions) {
        return Err(CommandError::MissingBotPermissions);
    }

    // the account the bot runs on owns it, no moderator check for that one
    if !node.author_permissions.is_empty() && !ctx.is_own(message.author.id) {
        let author_permissions =
            fetch_channel_permissions(&ctx.http, guild_id, message.channel_id, message.author.id).await?;
        check_author(node.author_permissions, author_permissions)?;
    }

    Ok(bot_permissions)
}

fn check_author(required: Permissions, granted: Permissions) -> Result<(), CommandError> {
    if granted.contains(required) {
        Ok(())
    } else {
        Err(CommandError::InvalidPermissions)
    }
}
