use log::info;

use crate::cleanup::{Criterion, DeletionRequest, ExecutionCapability};
use crate::core::CommandContext;
use crate::error::{CleanupError, CommandResult, ParseError};

/// Shows the subcommands when no subcommand was given.
pub async fn cleanup(ctx: CommandContext) -> CommandResult {
    ctx.reply(ctx.node.help_text()).await
}

pub async fn text(mut ctx: CommandContext) -> CommandResult {
    let text = ctx.parser.get_next()?.to_string();
    let number = ctx.parser.get_number()?;

    let request = history_request(&ctx, number, Criterion::Substring(text));
    run(&ctx, request).await
}

pub async fn user(mut ctx: CommandContext) -> CommandResult {
    let user_id = ctx.parser.get_user_id()?;
    let number = ctx.parser.get_number()?;

    let request = history_request(&ctx, number, Criterion::AuthorEquals(user_id));
    run(&ctx, request).await
}

pub async fn after(mut ctx: CommandContext) -> CommandResult {
    let message_id = ctx.parser.get_message_id()?;

    // without bulk deletion there is no point in even looking for the message
    if ExecutionCapability::for_identity(&ctx.identity()) != ExecutionCapability::PrivilegedBulk {
        return Err(CleanupError::InsufficientPrivilege.into());
    }

    let anchor = ctx
        .bot_context
        .http
        .message(ctx.message.channel_id, message_id)
        .await?
        .ok_or(CleanupError::UnknownMessage(message_id))?;

    let settings = ctx.bot_context.cleanup.settings();
    let request = DeletionRequest::new(
        ctx.message.channel_id,
        0,
        Criterion::Everything,
        ctx.message.as_history().created_at,
    )
    .page_size(settings.page_size)
    .after(anchor.id)
    .requiring_bulk();
    run(&ctx, request).await
}

pub async fn messages(mut ctx: CommandContext) -> CommandResult {
    let number = ctx.parser.get_number()?;

    let request = history_request(&ctx, number, Criterion::Everything);
    run(&ctx, request).await
}

pub async fn bot(mut ctx: CommandContext) -> CommandResult {
    let number = ctx.parser.get_number()?;

    let criterion = Criterion::AnyOf(vec![
        Criterion::IsBotAuthor(ctx.bot_context.bot_user.id),
        Criterion::IsCommandInvocation(ctx.bot_context.command_matcher().clone()),
    ]);
    let request = history_request(&ctx, number, criterion);
    run(&ctx, request).await
}

pub async fn cleanup_self(mut ctx: CommandContext) -> CommandResult {
    let number = ctx.parser.get_number()?;
    let pattern = if ctx.parser.has_next() {
        Some(ctx.parser.get_next()?.to_string())
    } else {
        None
    };

    let own_messages = Criterion::IsBotAuthor(ctx.bot_context.bot_user.id);
    let criterion = match pattern.as_deref().map(content_criterion).transpose()? {
        Some(content) => Criterion::AllOf(vec![own_messages, content]),
        None => own_messages,
    };

    let mut request = history_request(&ctx, number, criterion);
    // on user accounts the command message itself goes as well
    if ctx.invoked_by_self() {
        request = request.with_trailing(ctx.message.as_history());
    }
    run(&ctx, request).await
}

/// `r(...)` is a regex that has to match from the start, anything else is plain text to look for.
fn content_criterion(raw: &str) -> Result<Criterion, ParseError> {
    if raw.len() > 2 && raw.starts_with("r(") && raw.ends_with(')') {
        Criterion::pattern(&raw[1..]).map_err(|e| ParseError::InvalidPattern(e.to_string()))
    } else {
        Ok(Criterion::Substring(raw.to_string()))
    }
}

/// A request scanning back from the command message, which is swept along when seen.
fn history_request(ctx: &CommandContext, number: usize, criterion: Criterion) -> DeletionRequest {
    let trigger = ctx.message.as_history();
    DeletionRequest::new(ctx.message.channel_id, number, criterion, trigger.created_at)
        .page_size(ctx.bot_context.cleanup.settings().page_size)
        .before(trigger.id)
        .admitting(trigger.id)
}

async fn run(ctx: &CommandContext, request: DeletionRequest) -> CommandResult {
    let channel = ctx.bot_context.channel();
    let outcome = ctx
        .bot_context
        .cleanup
        .run(&channel, &ctx.actor(), &ctx.identity(), request)
        .await?;

    info!(
        "Cleanup for {} removed {} messages ({} matched) using the {} strategy",
        ctx.message.author.id,
        outcome.report.removed,
        outcome.matched,
        outcome.report.executor.name()
    );
    ctx.reply(format!("Deleted {} messages.", outcome.report.removed)).await
}
