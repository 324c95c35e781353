use std::time::Duration;
use std::{error, fmt, io};

use twilight_gateway::cluster::ClusterStartError;
use twilight_http::request::channel::message::create_message::CreateMessageError;
use twilight_model::id::{ChannelId, MessageId};

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug)]
pub enum StartupError {
    NoConfig,
    InvalidConfig(toml::de::Error),
    NoLoggingSpec,
    Twilight(twilight_http::Error),
    ClusterStart(ClusterStartError),
    ShutdownHook(ctrlc::Error),
    Audit(AuditError),
    Io(io::Error),
}

impl error::Error for StartupError {}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::NoConfig => write!(f, "Unable to locate the config file"),
            StartupError::InvalidConfig(e) => write!(f, "Unable to load the config file: {}", e),
            StartupError::NoLoggingSpec => write!(f, "Problem with the log spec"),
            StartupError::Twilight(e) => write!(f, "Twilight error during startup, unable to continue: {}", e),
            StartupError::ClusterStart(e) => write!(f, "The cluster failed to start: {}", e),
            StartupError::ShutdownHook(e) => write!(f, "Unable to listen for shutdown signals: {}", e),
            StartupError::Audit(e) => write!(f, "Unable to open the audit log: {}", e),
            StartupError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

/// Failures reported by the chat platform while reading or deleting messages.
#[derive(Debug)]
pub enum TransportError {
    /// We lack the access needed for this.
    Forbidden,
    NotFound,
    /// Only surfaces once the http client gave up retrying.
    RateLimited { retry_after: Option<Duration> },
    Twilight(twilight_http::Error),
    Failed(String),
}

impl error::Error for TransportError {}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Forbidden => write!(f, "Missing access"),
            TransportError::NotFound => write!(f, "Unknown message"),
            TransportError::RateLimited { retry_after: Some(wait) } => {
                write!(f, "Rate limited, retry after {}ms", wait.as_millis())
            }
            TransportError::RateLimited { retry_after: None } => write!(f, "Rate limited"),
            TransportError::Twilight(e) => write!(f, "Failed to interact with the discord api: {}", e),
            TransportError::Failed(e) => write!(f, "{}", e),
        }
    }
}

/// Why a cleanup didn't (fully) happen, worded for the person who asked for it.
#[derive(Debug)]
pub enum CleanupError {
    ChannelUnavailable(ChannelId),
    InsufficientPrivilege,
    RateLimited { retry_after: Option<Duration> },
    PartialDeletionFailure { removed: usize, total: usize },
    ConfirmationDeclined,
    ConfirmationTimedOut,
    UnknownMessage(MessageId),
    Transport(TransportError),
}

impl error::Error for CleanupError {}

impl fmt::Display for CleanupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupError::ChannelUnavailable(channel) => {
                write!(f, "I am unable to read the message history of <#{}>!", channel)
            }
            CleanupError::InsufficientPrivilege => write!(
                f,
                "This command can only be used on bots with bot accounts that can manage messages here."
            ),
            CleanupError::RateLimited { .. } => write!(
                f,
                "Discord kept rate limiting this cleanup, please try again in a little while."
            ),
            CleanupError::PartialDeletionFailure { removed, total } => write!(
                f,
                "Something went wrong while deleting, only {} of {} messages were removed.",
                removed, total
            ),
            CleanupError::ConfirmationDeclined => write!(f, "Cancelled."),
            CleanupError::ConfirmationTimedOut => write!(f, "No answer received in time, cancelled."),
            CleanupError::UnknownMessage(_) => write!(f, "Message not found."),
            CleanupError::Transport(e) => write!(f, "Unable to complete the cleanup: {}", e),
        }
    }
}

#[derive(Debug)]
pub enum AuditError {
    Io(io::Error),
    Serializing(serde_json::Error),
    Poisoned,
}

impl error::Error for AuditError {}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditError::Io(e) => write!(f, "Failed to write the audit record: {}", e),
            AuditError::Serializing(e) => write!(f, "Failed to serialize the audit record: {}", e),
            AuditError::Poisoned => write!(f, "The audit log is unusable after an earlier panic"),
        }
    }
}

#[derive(Debug)]
pub enum ParseError {
    MissingArgument,
    WrongArgumentType(String),
    InvalidUserID(String),
    InvalidPattern(String),
}

impl error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingArgument => write!(f, "You are missing one or more required arguments"),
            ParseError::WrongArgumentType(expected) => write!(
                f,
                "The wrong type was provided! Expected a {}, but got something else!",
                expected
            ),
            ParseError::InvalidUserID(raw) => write!(f, "``{}`` is not a valid discord user or userid", raw),
            ParseError::InvalidPattern(e) => write!(f, "That pattern is not a valid regex: {}", e),
        }
    }
}

#[derive(Debug)]
pub enum CommandError {
    NoDM,
    InvalidPermissions,
    MissingBotPermissions,
    ParseError(ParseError),
    Cleanup(CleanupError),
    OtherFailure(OtherFailure),
}

impl error::Error for CommandError {}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NoDM => write!(f, "You can not use this command in DMs"),
            CommandError::InvalidPermissions => write!(f, "You don't have the permissions to run this command!"),
            CommandError::MissingBotPermissions => {
                write!(f, "I need the Manage Messages permission in this channel to do that!")
            }
            CommandError::ParseError(e) => write!(f, "Failed to parse the command arguments!\n``{}``", e),
            CommandError::Cleanup(e) => write!(f, "{}", e),
            CommandError::OtherFailure(_) => write!(f, "Unexpected error while executing the command, please report this on the support server if it keeps happening"),
        }
    }
}

#[derive(Debug)]
pub enum OtherFailure {
    TwilightHttp(twilight_http::Error),
    CreateMessage(CreateMessageError),
    Transport(TransportError),
}

impl error::Error for OtherFailure {}

impl fmt::Display for OtherFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OtherFailure::TwilightHttp(e) => write!(f, "Something when wrong interacting with the discord api: {}", e),
            OtherFailure::CreateMessage(e) => write!(f, "Failed to create message: {}", e),
            OtherFailure::Transport(e) => write!(f, "Transport failure: {}", e),
        }
    }
}

#[derive(Debug)]
pub enum EventHandlerError {
    Command(CommandError),
    Twilight(twilight_http::Error),
}

impl error::Error for EventHandlerError {}

impl fmt::Display for EventHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventHandlerError::Command(e) => write!(f, "Command failed: {}", e),
            EventHandlerError::Twilight(e) => write!(f, "Failed to interact with the discord api: {}", e),
        }
    }
}

impl From<twilight_http::Error> for StartupError {
    fn from(e: twilight_http::Error) -> Self {
        StartupError::Twilight(e)
    }
}

impl From<ClusterStartError> for StartupError {
    fn from(e: ClusterStartError) -> Self {
        StartupError::ClusterStart(e)
    }
}

impl From<ctrlc::Error> for StartupError {
    fn from(e: ctrlc::Error) -> Self {
        StartupError::ShutdownHook(e)
    }
}

impl From<AuditError> for StartupError {
    fn from(e: AuditError) -> Self {
        StartupError::Audit(e)
    }
}

impl From<io::Error> for StartupError {
    fn from(e: io::Error) -> Self {
        StartupError::Io(e)
    }
}

impl From<twilight_http::Error> for TransportError {
    fn from(e: twilight_http::Error) -> Self {
        TransportError::Twilight(e)
    }
}

impl From<TransportError> for CleanupError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::RateLimited { retry_after } => CleanupError::RateLimited { retry_after },
            e => CleanupError::Transport(e),
        }
    }
}

impl From<io::Error> for AuditError {
    fn from(e: io::Error) -> Self {
        AuditError::Io(e)
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(e: serde_json::Error) -> Self {
        AuditError::Serializing(e)
    }
}

impl From<ParseError> for CommandError {
    fn from(e: ParseError) -> Self {
        CommandError::ParseError(e)
    }
}

impl From<CleanupError> for CommandError {
    fn from(e: CleanupError) -> Self {
        CommandError::Cleanup(e)
    }
}

impl From<OtherFailure> for CommandError {
    fn from(e: OtherFailure) -> Self {
        CommandError::OtherFailure(e)
    }
}

impl From<twilight_http::Error> for CommandError {
    fn from(e: twilight_http::Error) -> Self {
        CommandError::OtherFailure(OtherFailure::TwilightHttp(e))
    }
}

impl From<CreateMessageError> for CommandError {
    fn from(e: CreateMessageError) -> Self {
        CommandError::OtherFailure(OtherFailure::CreateMessage(e))
    }
}

impl From<TransportError> for CommandError {
    fn from(e: TransportError) -> Self {
        CommandError::OtherFailure(OtherFailure::Transport(e))
    }
}

impl From<CommandError> for EventHandlerError {
    fn from(e: CommandError) -> Self {
        EventHandlerError::Command(e)
    }
}

impl From<twilight_http::Error> for EventHandlerError {
    fn from(e: twilight_http::Error) -> Self {
        EventHandlerError::Twilight(e)
    }
}
