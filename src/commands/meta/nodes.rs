use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use twilight_model::guild::Permissions;

use crate::core::CommandContext;
use crate::error::CommandResult;

pub type CommandResultOuter = Pin<Box<dyn Future<Output = CommandResult> + Send>>;
pub type CommandHandler = Box<dyn Fn(CommandContext) -> CommandResultOuter + Send + Sync>;

pub struct RootNode {
    pub all_commands: HashMap<String, Arc<CommandNode>>,
}

impl RootNode {
    /// Every name a command can be invoked by.
    pub fn command_names(&self) -> Vec<String> {
        self.all_commands.keys().cloned().collect()
    }
}

pub struct CommandNode {
    pub name: String,
    pub handler: Option<CommandHandler>,
    pub sub_nodes: HashMap<String, Arc<CommandNode>>,
    pub node_list: Vec<Arc<CommandNode>>,
    /// What the bot needs in the channel before this can run.
    pub bot_permissions: Permissions,
    /// What the author needs in the channel before this can run.
    pub author_permissions: Permissions,
    pub guild_only: bool,
    pub usage: &'static str,
    pub help: &'static str,
}

impl CommandNode {
    pub fn help_text(&self) -> String {
        let mut out = format!("``{}``: {}", self.usage, self.help);
        if !self.node_list.is_empty() {
            out += "\n\n**Subcommands**";
            for node in &self.node_list {
                out += &format!("\n``{}``: {}", node.usage, node.help);
            }
        }
        out
    }
}
