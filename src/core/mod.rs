pub use bot_config::BotConfig;
pub use bot_context::BotContext;
pub use command_context::{CommandContext, CommandMessage};
pub use reply_waiters::ReplyWaiters;
pub use sweeper::Sweeper;
pub use transport::TwilightChannel;

pub mod bot_config;
mod bot_context;
mod command_context;
mod handlers;
pub mod logging;
pub mod permissions;
mod reply_waiters;
mod sweeper;
pub mod transport;
