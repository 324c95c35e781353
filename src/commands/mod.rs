use std::collections::HashMap;

use lazy_static::lazy_static;
use twilight_model::guild::Permissions;

use crate::commands::meta::nodes::RootNode;
use crate::{command, command_with_subcommands_and_handler};

mod cleanup;
pub mod meta;

lazy_static! {
    pub static ref ROOT_NODE: RootNode = {
        let commandlist = vec![command_with_subcommands_and_handler!(
            "cleanup",
            cleanup::cleanup,
            "cleanup <subcommand>",
            "Deletes messages.",
            command!(
                "text",
                cleanup::text,
                Permissions::MANAGE_MESSAGES,
                Permissions::MANAGE_MESSAGES,
                true,
                "cleanup text \"<text>\" <number>",
                "Deletes the last X messages containing the text, remember to use double quotes."
            ),
            command!(
                "user",
                cleanup::user,
                Permissions::MANAGE_MESSAGES,
                Permissions::MANAGE_MESSAGES,
                true,
                "cleanup user <user> <number>",
                "Deletes the last X messages from a user, given as mention or id."
            ),
            command!(
                "after",
                cleanup::after,
                Permissions::MANAGE_MESSAGES,
                Permissions::MANAGE_MESSAGES,
                true,
                "cleanup after <message id>",
                "Deletes all messages after the given message. Only works on bot accounts."
            ),
            command!(
                "messages",
                cleanup::messages,
                Permissions::MANAGE_MESSAGES,
                Permissions::MANAGE_MESSAGES,
                true,
                "cleanup messages <number>",
                "Deletes the last X messages."
            ),
            command!(
                "bot",
                cleanup::bot,
                Permissions::MANAGE_MESSAGES,
                Permissions::MANAGE_MESSAGES,
                true,
                "cleanup bot <number>",
                "Deletes command messages and messages from the bot."
            ),
            command!(
                "self",
                cleanup::cleanup_self,
                Permissions::empty(),
                Permissions::MANAGE_MESSAGES,
                false,
                "cleanup self <number> [pattern]",
                "Deletes messages sent by the bot, optionally only those containing the pattern. Wrap it in r( and ) to use a regex."
            )
        )];

        let mut commands = HashMap::new();

        for command in commandlist {
            commands.insert(command.name.clone(), command);
        }

        RootNode { all_commands: commands }
    };
}
