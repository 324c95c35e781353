use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use twilight_model::id::{MessageId, UserId};

use crate::cleanup::HistoryMessage;

/// Messages older than this can not be bulk deleted anymore.
pub const ELIGIBILITY_WINDOW_DAYS: i64 = 14;

/// What a cleanup is looking for in a message.
#[derive(Debug, Clone)]
pub enum Criterion {
    Everything,
    /// The content contains this text.
    Substring(String),
    /// The content matches this pattern, starting at the first character.
    Pattern(Regex),
    AuthorEquals(UserId),
    /// The message was sent by the bot itself.
    IsBotAuthor(UserId),
    IsCommandInvocation(CommandMatcher),
    AnyOf(Vec<Criterion>),
    AllOf(Vec<Criterion>),
}

impl Criterion {
    /// Builds a [`Criterion::Pattern`] that only matches from the start of the content.
    pub fn pattern(raw: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{})", raw)).map(Criterion::Pattern)
    }

    pub fn matches(&self, message: &HistoryMessage) -> bool {
        match self {
            Criterion::Everything => true,
            Criterion::Substring(text) => message.content.contains(text.as_str()),
            Criterion::Pattern(pattern) => pattern.is_match(&message.content),
            Criterion::AuthorEquals(user_id) => message.author_id == *user_id,
            Criterion::IsBotAuthor(bot_id) => message.author_id == *bot_id,
            Criterion::IsCommandInvocation(matcher) => matcher.is_invocation(&message.content),
            Criterion::AnyOf(criteria) => criteria.iter().any(|c| c.matches(message)),
            Criterion::AllOf(criteria) => criteria.iter().all(|c| c.matches(message)),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Everything => write!(f, "any message"),
            Criterion::Substring(text) => write!(f, "containing '{}'", text),
            Criterion::Pattern(pattern) => write!(f, "matching /{}/", pattern.as_str()),
            Criterion::AuthorEquals(user_id) => write!(f, "made by {}", user_id),
            Criterion::IsBotAuthor(_) => write!(f, "sent by the bot"),
            Criterion::IsCommandInvocation(_) => write!(f, "command messages"),
            Criterion::AnyOf(criteria) => join(f, criteria, " or "),
            Criterion::AllOf(criteria) => join(f, criteria, " and "),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, criteria: &[Criterion], separator: &str) -> fmt::Result {
    for (i, criterion) in criteria.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", criterion)?;
    }
    Ok(())
}

/// Recognizes messages that invoke one of the bot's commands.
#[derive(Debug, Clone)]
pub struct CommandMatcher {
    /// Longest first, so `!!` wins over `!`.
    prefixes: Vec<String>,
    commands: HashSet<String>,
}

impl CommandMatcher {
    pub fn new<P, C>(prefixes: P, commands: C) -> Self
    where
        P: IntoIterator<Item = String>,
        C: IntoIterator<Item = String>,
    {
        let mut prefixes: Vec<String> = prefixes.into_iter().filter(|p| !p.is_empty()).collect();
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        prefixes.dedup();

        CommandMatcher {
            prefixes,
            commands: commands.into_iter().collect(),
        }
    }

    pub fn is_invocation(&self, content: &str) -> bool {
        match self.prefixes.iter().find(|prefix| content.starts_with(prefix.as_str())) {
            Some(prefix) => {
                let name = content[prefix.len()..].split(' ').next().unwrap_or_default();
                self.commands.contains(name)
            }
            None => false,
        }
    }
}

/// The age limit, measured from the moment the cleanup was requested.
#[derive(Debug, Clone, Copy)]
pub struct AgeWindow {
    reference: DateTime<Utc>,
    window: Duration,
}

impl AgeWindow {
    pub fn new(reference: DateTime<Utc>, window: Duration) -> Self {
        AgeWindow { reference, window }
    }

    /// The platform's bulk deletion window, counted back from `reference`.
    pub fn bulk_deletable(reference: DateTime<Utc>) -> Self {
        AgeWindow::new(reference, Duration::days(ELIGIBILITY_WINDOW_DAYS))
    }

    pub fn admits(&self, message: &HistoryMessage) -> bool {
        message.age(self.reference) < self.window
    }
}

/// The outcome of checking a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Delete,
    Skip,
    OutsideWindow,
}

/// A criterion combined with the mandatory age window.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    criterion: Criterion,
    window: AgeWindow,
    trigger: Option<MessageId>,
}

impl EligibilityFilter {
    pub fn new(criterion: Criterion, window: AgeWindow) -> Self {
        EligibilityFilter {
            criterion,
            window,
            trigger: None,
        }
    }

    /// Always admit the message that triggered the cleanup when it shows up in the scanned history.
    pub fn admitting(mut self, trigger: MessageId) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn criterion(&self) -> &Criterion {
        &self.criterion
    }

    pub fn evaluate(&self, message: &HistoryMessage) -> Verdict {
        if !self.window.admits(message) {
            Verdict::OutsideWindow
        } else if self.trigger == Some(message.id) || self.criterion.matches(message) {
            Verdict::Delete
        } else {
            Verdict::Skip
        }
    }
}
