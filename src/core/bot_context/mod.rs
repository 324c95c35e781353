use twilight_http::Client as HttpClient;
use twilight_model::id::UserId;
use twilight_model::user::CurrentUser;

use crate::cleanup::{CleanupEngine, CommandMatcher, RetryingTransport};
use crate::core::{ReplyWaiters, TwilightChannel};

pub struct BotContext {
    pub http: HttpClient,
    pub bot_user: CurrentUser,
    pub reply_waiters: ReplyWaiters,
    pub cleanup: CleanupEngine,
    /// Configured prefixes plus both mention forms, longest first.
    prefixes: Vec<String>,
    command_matcher: CommandMatcher,
}

impl BotContext {
    pub fn new<C>(
        http: HttpClient,
        bot_user: CurrentUser,
        prefixes: &[String],
        command_names: C,
        cleanup: CleanupEngine,
    ) -> Self
    where
        C: IntoIterator<Item = String>,
    {
        let prefixes = all_prefixes(bot_user.id, prefixes);
        let command_matcher = CommandMatcher::new(prefixes.clone(), command_names);
        BotContext {
            http,
            bot_user,
            reply_waiters: ReplyWaiters::new(),
            cleanup,
            prefixes,
            command_matcher,
        }
    }

    /// Returns if a message was sent by us.
    pub fn is_own(&self, user_id: UserId) -> bool {
        self.bot_user.id == user_id
    }

    /// The prefix this message starts with, if it's addressed to us at all.
    pub fn find_prefix(&self, content: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|prefix| content.starts_with(prefix.as_str()))
            .map(String::as_str)
    }

    pub fn command_matcher(&self) -> &CommandMatcher {
        &self.command_matcher
    }

    /// Discord as the cleanup engine sees it, with rate limits waited out.
    pub fn channel(&self) -> RetryingTransport<TwilightChannel<'_>> {
        RetryingTransport::new(
            TwilightChannel::new(&self.http, &self.reply_waiters),
            self.cleanup.settings().retry,
        )
    }
}

fn all_prefixes(bot_id: UserId, configured: &[String]) -> Vec<String> {
    let mut prefixes: Vec<String> = configured.iter().filter(|p| !p.is_empty()).cloned().collect();
    prefixes.push(format!("<@{}>", bot_id));
    prefixes.push(format!("<@!{}>", bot_id));
    prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    prefixes.dedup();
    prefixes
}
